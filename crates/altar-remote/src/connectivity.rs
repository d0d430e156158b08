//! Network reachability as reported by the host environment.
//!
//! Checked synchronously before any I/O.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Source of the current reachability state
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Host that never reports being offline
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOnline;

impl Connectivity for AlwaysOnline {
    #[inline]
    fn is_online(&self) -> bool {
        true
    }
}

/// Reachability flag flipped by the host (e.g. on OS network events)
#[derive(Debug)]
pub struct ConnectivityFlag {
    online: AtomicBool,
}

impl ConnectivityFlag {
    #[must_use]
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl Default for ConnectivityFlag {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Connectivity for ConnectivityFlag {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

impl<C: Connectivity + ?Sized> Connectivity for Arc<C> {
    fn is_online(&self) -> bool {
        (**self).is_online()
    }
}
