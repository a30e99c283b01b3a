//! Guarded, reentrant access to the one [`HardwareState`] of a process.
//!
//! The manager is constructed by the composition root and shared by `Arc`.
//! Nothing here is global: tests build as many independent managers as they
//! like.

use crate::error::HardwareError;
use crate::state::HardwareState;
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use std::cell::{Ref, RefCell, RefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use tracing::{debug, trace};

/// Capability to take guarded access to a hardware state.
///
/// Collaborators such as the [`Serializer`](crate::serializer::Serializer)
/// depend on this rather than on a concrete manager.
pub trait AcquireState: Send + Sync {
    /// Blocks until the calling thread holds the state. A thread that already
    /// holds it gets a nested guard immediately.
    fn acquire(&self) -> StateGuard<'_>;

    /// Point-in-time copy of the whole aggregate, taken under the guard.
    ///
    /// # Errors
    ///
    /// `InvalidState` when called while this thread holds a mutable borrow.
    fn snapshot_copy(&self) -> Result<HardwareState, HardwareError> {
        Ok(self.acquire().state()?.clone())
    }
}

/// Owner of the hardware state. The state is built on first acquisition.
#[derive(Debug, Default)]
pub struct StateManager {
    state: OnceLock<ReentrantMutex<RefCell<HardwareState>>>,
    acquisitions: AtomicU64,
}

impl StateManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Manager whose state is already built from `state`.
    pub fn with_state(state: HardwareState) -> Self {
        let manager = Self::new();
        // A fresh OnceLock is always empty, so this cannot lose the value.
        let _ = manager.state.set(ReentrantMutex::new(RefCell::new(state)));
        manager
    }

    pub fn is_initialized(&self) -> bool {
        self.state.get().is_some()
    }

    /// Total guards handed out, nested ones included.
    pub fn acquisitions(&self) -> u64 {
        self.acquisitions.load(Ordering::Relaxed)
    }

    fn cell(&self) -> &ReentrantMutex<RefCell<HardwareState>> {
        self.state.get_or_init(|| {
            debug!("constructing hardware state");
            ReentrantMutex::new(RefCell::new(HardwareState::new()))
        })
    }
}

impl AcquireState for StateManager {
    fn acquire(&self) -> StateGuard<'_> {
        let guard = self.cell().lock();
        let count = self.acquisitions.fetch_add(1, Ordering::Relaxed) + 1;
        trace!(acquisitions = count, "hardware state acquired");
        StateGuard { guard }
    }
}

/// Scoped access to the hardware state. The lock is released when the
/// outermost guard on the thread is dropped.
///
/// Nested guards on one thread share a single `RefCell`. A borrow that would
/// overlap a live mutable borrow, e.g. a serializer pass run from inside a
/// `with_mut` closure, returns [`HardwareError::InvalidState`] instead of
/// panicking.
pub struct StateGuard<'a> {
    guard: ReentrantMutexGuard<'a, RefCell<HardwareState>>,
}

fn already_borrowed() -> HardwareError {
    HardwareError::InvalidState("hardware state is already mutably borrowed on this thread")
}

impl StateGuard<'_> {
    /// # Errors
    ///
    /// `InvalidState` while a mutable borrow is live on this thread.
    pub fn state(&self) -> Result<Ref<'_, HardwareState>, HardwareError> {
        self.guard.try_borrow().map_err(|_| already_borrowed())
    }

    /// # Errors
    ///
    /// `InvalidState` while any other borrow is live on this thread.
    pub fn state_mut(&self) -> Result<RefMut<'_, HardwareState>, HardwareError> {
        self.guard.try_borrow_mut().map_err(|_| already_borrowed())
    }

    /// Runs `f` against the state, keeping the borrow to the closure.
    ///
    /// # Errors
    ///
    /// Same as [`StateGuard::state`]; `f` is not run.
    pub fn with<R>(&self, f: impl FnOnce(&HardwareState) -> R) -> Result<R, HardwareError> {
        Ok(f(&*self.state()?))
    }

    /// # Errors
    ///
    /// Same as [`StateGuard::state_mut`]; `f` is not run.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut HardwareState) -> R) -> Result<R, HardwareError> {
        Ok(f(&mut *self.state_mut()?))
    }
}

impl core::fmt::Debug for StateGuard<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StateGuard").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Channel;
    use crate::registers::PwmHeader;

    #[test]
    fn test_lazy_initialization() {
        let manager = StateManager::new();
        assert!(!manager.is_initialized());
        assert_eq!(manager.acquisitions(), 0);

        drop(manager.acquire());
        assert!(manager.is_initialized());
        assert_eq!(manager.acquisitions(), 1);
    }

    #[test]
    fn test_same_instance_across_acquisitions() {
        let manager = StateManager::new();
        let header = PwmHeader::new(3).unwrap();
        manager
            .acquire()
            .with_mut(|s| s.pwm_mut().set_hdr_duty_cycle(header, 777))
            .unwrap();
        assert_eq!(manager.acquire().state().unwrap().pwm().hdr_duty_cycle(header), 777);
    }

    #[test]
    fn test_nested_acquire_on_same_thread() {
        let manager = StateManager::new();
        let outer = manager.acquire();
        outer.with_mut(|s| s.set_user_button(false)).unwrap();
        {
            let inner = manager.acquire();
            assert!(!inner.state().unwrap().user_button());
            inner.with_mut(|s| s.set_user_button(true)).unwrap();
        }
        assert!(outer.state().unwrap().user_button());
        assert_eq!(manager.acquisitions(), 2);
    }

    #[test]
    fn test_borrow_inside_closure_is_an_error() {
        let manager = StateManager::new();
        let copied = manager
            .acquire()
            .with_mut(|s| {
                s.set_user_button(false);
                manager.snapshot_copy()
            })
            .unwrap();
        assert!(matches!(copied, Err(HardwareError::InvalidState(_))));

        // the failed borrow left the lock and the write intact
        assert!(!manager.snapshot_copy().unwrap().user_button());
        assert_eq!(manager.acquisitions(), 3);
    }

    #[test]
    fn test_with_state_skips_lazy_build() {
        let mut state = HardwareState::new();
        state.set_user_button(false);
        let manager = StateManager::with_state(state);
        assert!(manager.is_initialized());
        assert!(!manager.snapshot_copy().unwrap().user_button());
    }
}
