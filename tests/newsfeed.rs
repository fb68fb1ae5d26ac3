use newsfeed::{Error, IndexedPriorityQueue, NewsFeed, PriorityQueue, Staleness};
use std::collections::hash_map::RandomState;
use std::collections::BTreeSet;

fn scenario_feed() -> NewsFeed {
    let mut feed: NewsFeed = NewsFeed::new();
    feed.enqueue("Flash".into(), "story of a fast dude".into(), 1)
        .unwrap();
    feed.enqueue("J".into(), "JJJ story".into(), 2).unwrap();
    feed.enqueue("K".into(), "KKK story".into(), 3).unwrap();
    feed.enqueue("L".into(), "LLL story".into(), -1).unwrap();
    feed
}

#[test]
fn reweighted_headline_drops_behind_the_rest() {
    let mut feed = scenario_feed();
    feed.reweight("L", 4).expect("L is enqueued");

    let h = feed.peek().expect("non-empty").clone();
    assert_eq!(h, "Flash");
    assert_eq!(feed.get(&h).unwrap(), "story of a fast dude");
    assert_eq!(feed.weight(&h), Ok(1));
    feed.dequeue().unwrap();
    assert!(!feed.is_empty());

    let h = feed.peek().unwrap().clone();
    assert_eq!(h, "J");
    assert_eq!(feed.get(&h).unwrap(), "JJJ story");
    assert_eq!(feed.weight(&h), Ok(2));
    feed.dequeue().unwrap();
    assert!(!feed.is_empty());

    assert_eq!(feed.peek().unwrap(), "K");
    assert_eq!(feed.weight("K"), Ok(3));
    feed.dequeue().unwrap();

    assert_eq!(feed.peek().unwrap(), "L");
    assert_eq!(feed.weight("L"), Ok(4));
    feed.dequeue().unwrap();
    assert!(feed.is_empty());
}

#[test]
fn story_survives_heap_reordering() {
    let mut feed = scenario_feed();
    feed.reweight("L", 4).unwrap();
    feed.reweight("Flash", 10).unwrap();
    feed.reweight("Flash", -10).unwrap();
    assert_eq!(feed.get("Flash").unwrap(), "story of a fast dude");
}

#[test]
fn fresh_feed_is_empty() {
    let mut feed: NewsFeed = NewsFeed::new();
    assert!(feed.is_empty());
    assert_eq!(feed.peek(), Err(Error::EmptyQueue));
    assert_eq!(feed.dequeue(), Err(Error::EmptyQueue));
}

#[test]
fn lookups_of_unknown_headlines_fail() {
    let mut feed = scenario_feed();
    assert_eq!(feed.get("nope"), Err(Error::NotFound));
    assert_eq!(feed.weight("nope"), Err(Error::NotFound));
    assert_eq!(feed.reweight("nope", 0), Err(Error::NotFound));
    assert!(!feed.contains("nope"));
}

#[test]
fn iteration_covers_enqueued_headlines_only() {
    let mut feed = scenario_feed();
    feed.dequeue().unwrap(); // L at -1
    let seen: BTreeSet<&str> = feed.iter().map(String::as_str).collect();
    assert_eq!(seen, BTreeSet::from(["Flash", "J", "K"]));
    assert_eq!((&feed).into_iter().count(), feed.len());
}

#[test]
fn peek_stream_is_non_decreasing() {
    let mut feed: NewsFeed<RandomState> = NewsFeed::with_hasher(RandomState::new());
    let weights: Vec<Staleness> = (0..500).map(|i| (i * 7919 % 257) - 128).collect();
    for (i, w) in weights.iter().enumerate() {
        feed.enqueue(format!("h{i}"), String::new(), *w).unwrap();
    }
    for i in (0..500).step_by(3) {
        let h = format!("h{i}");
        let w = feed.weight(&h).unwrap();
        feed.reweight(&h, -w).unwrap();
    }

    let mut prev = Staleness::MIN;
    let mut count = 0;
    while let Ok(h) = feed.peek() {
        let w = feed.weight(h).unwrap();
        assert!(prev <= w, "{prev} then {w}");
        prev = w;
        feed.dequeue().unwrap();
        count += 1;
    }
    assert_eq!(count, 500);
}

#[test]
fn generic_queue_with_other_types() {
    let mut q: IndexedPriorityQueue<u64, &str, (u8, u8)> = IndexedPriorityQueue::new();
    q.enqueue(1, "low", (2, 0)).unwrap();
    q.enqueue(2, "high", (1, 9)).unwrap();
    q.enqueue(3, "mid", (1, 10)).unwrap();
    assert_eq!(q.dequeue(), Ok((2, "high", (1, 9))));
    q.reweight(&1u64, (0, 0)).unwrap();
    assert_eq!(q.dequeue(), Ok((1, "low", (0, 0))));
    assert_eq!(q.dequeue(), Ok((3, "mid", (1, 10))));
}

fn drain_headlines<Q>(q: &mut Q) -> Vec<Q::Key>
where
    Q: PriorityQueue,
{
    let mut out = vec![];
    while let Ok((k, _, _)) = q.dequeue() {
        out.push(k);
    }
    out
}

#[test]
fn usable_through_priority_queue_trait() {
    let mut feed = scenario_feed();
    assert_eq!(drain_headlines(&mut feed), vec!["L", "Flash", "J", "K"]);
    assert!(PriorityQueue::is_empty(&feed));
}
