//! Debug-only probe guard.
//!
//! A `ProbeHashMap` calls into user code (`K: Eq`, the hash builder)
//! while it walks a probe chain. If that code calls back into the same
//! map, the nested call would observe a table that is half-way through
//! a mutation. In debug builds the guard records which operation is
//! running and panics on nested entry, naming both operations. In
//! release builds it is a zero-sized no-op.

use core::cell::Cell;
use core::marker::PhantomData;

/// Per-map tracker. Public entry points start with
/// `let _g = self.guard.enter("op");`.
#[derive(Debug)]
pub(crate) struct ProbeGuard {
    #[cfg(debug_assertions)]
    active: Cell<Option<&'static str>>,
    // Single-threaded: keep the owning map !Sync.
    _nosync: PhantomData<Cell<()>>,
}

impl ProbeGuard {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(None),
            _nosync: PhantomData,
        }
    }

    /// Mark `op` as running. Panics in debug builds if another operation
    /// on the same map has not finished yet.
    #[inline]
    pub(crate) fn enter(&self, op: &'static str) -> Entered<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(outer) = self.active.get() {
                panic!("reentrant call to ProbeHashMap::{op} while {outer} is probing");
            }
            self.active.set(Some(op));
            return Entered { owner: self };
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = op;
            return Entered {
                _owner: PhantomData,
            };
        }
    }
}

impl Default for ProbeGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ProbeGuard {
    // A cloned map starts idle regardless of the source's state.
    fn clone(&self) -> Self {
        Self::new()
    }
}

/// RAII marker returned by [`ProbeGuard::enter`]; clears the running
/// operation on drop.
pub(crate) struct Entered<'a> {
    #[cfg(debug_assertions)]
    owner: &'a ProbeGuard,
    #[cfg(not(debug_assertions))]
    _owner: PhantomData<&'a ProbeGuard>,
}

impl Drop for Entered<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            debug_assert!(self.owner.active.get().is_some());
            self.owner.active.set(None);
        }
    }
}
