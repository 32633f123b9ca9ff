//! Shared, re-entrancy-checked handles onto a funnel.
//!
//! `Funnel` methods take `&mut self`, so a reducer or effect cannot reach its
//! own funnel through a plain reference. Code that needs to (an effect that
//! re-submits work, a reducer that cancels on a sentinel) goes through
//! `SharedFunnel`, which turns such nested access into
//! `FunnelError::Reentrant` instead of corrupting the timer slots. The
//! rejected operation leaves the funnel untouched; the outer one carries on.

use std::cell::{RefCell, RefMut};
use std::rc::{Rc, Weak};
use std::time::Instant;

use crate::error::{FunnelError, Result};
use crate::funnel::{Funnel, FunnelPhase};

/// Cloneable single-threaded handle to one funnel.
pub struct SharedFunnel<A, R> {
    inner: Rc<RefCell<Funnel<A, R>>>,
}

/// Non-owning counterpart of `SharedFunnel`, for capture inside the funnel's
/// own reducer or effect without creating a reference cycle.
pub struct WeakFunnel<A, R> {
    inner: Weak<RefCell<Funnel<A, R>>>,
}

impl<A, R> Clone for SharedFunnel<A, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A, R> Clone for WeakFunnel<A, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<A, R> From<Funnel<A, R>> for SharedFunnel<A, R> {
    fn from(funnel: Funnel<A, R>) -> Self {
        Self::new(funnel)
    }
}

impl<A, R> SharedFunnel<A, R> {
    pub fn new(funnel: Funnel<A, R>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(funnel)),
        }
    }

    pub fn downgrade(&self) -> WeakFunnel<A, R> {
        WeakFunnel {
            inner: Rc::downgrade(&self.inner),
        }
    }

    fn enter(&self, op: &'static str) -> Result<RefMut<'_, Funnel<A, R>>> {
        self.inner.try_borrow_mut().map_err(|_| {
            tracing::warn!(op, "re-entrant funnel access rejected");
            eyre::Report::new(FunnelError::Reentrant { op })
        })
    }

    pub fn call(&self, args: A) -> Result<()> {
        self.enter("call")?.call(args)
    }

    pub fn cancel(&self) -> Result<()> {
        self.enter("cancel")?.cancel();
        Ok(())
    }

    pub fn flush(&self) -> Result<()> {
        self.enter("flush")?.flush()
    }

    pub fn fire_due(&self) -> Result<usize> {
        self.enter("fire_due")?.fire_due()
    }

    pub fn is_idle(&self) -> Result<bool> {
        Ok(self.enter("is_idle")?.is_idle())
    }

    pub fn phase(&self) -> Result<FunnelPhase> {
        Ok(self.enter("phase")?.phase())
    }

    pub fn next_deadline(&self) -> Result<Option<Instant>> {
        Ok(self.enter("next_deadline")?.next_deadline())
    }

    pub fn invocations(&self) -> Result<u64> {
        Ok(self.enter("invocations")?.invocations())
    }
}

impl<A, R> WeakFunnel<A, R> {
    /// Upgrade to a strong handle; `FunnelError::Dropped` once the funnel is gone.
    pub fn upgrade(&self) -> Result<SharedFunnel<A, R>> {
        self.inner
            .upgrade()
            .map(|inner| SharedFunnel { inner })
            .ok_or_else(|| eyre::Report::new(FunnelError::Dropped))
    }
}
