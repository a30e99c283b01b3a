//! Network communication block: the reference number the robot program
//! registered with the driver-station layer and the hook it wants run when
//! that layer signals an occurrence (new control data, for instance).

use std::fmt;
use std::sync::Arc;

/// Called with the registered reference number on every occurrence.
pub type OccurHook = Arc<dyn Fn(u32) + Send + Sync>;

#[derive(Clone, Default)]
pub struct NetComm {
    ref_num: u32,
    occur: Option<OccurHook>,
}

impl NetComm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ref_num(&self) -> u32 {
        self.ref_num
    }

    pub fn set_ref_num(&mut self, ref_num: u32) {
        self.ref_num = ref_num;
    }

    /// Installs the occurrence hook, replacing any previous one.
    pub fn set_occur_hook(&mut self, hook: impl Fn(u32) + Send + Sync + 'static) {
        self.occur = Some(Arc::new(hook));
    }

    pub fn clear_occur_hook(&mut self) {
        self.occur = None;
    }

    pub fn has_occur_hook(&self) -> bool {
        self.occur.is_some()
    }

    /// Signals an occurrence. Runs the hook with the reference number and
    /// reports whether one was installed.
    ///
    /// The hook runs while the caller holds the hardware state, so it must
    /// not borrow the state itself.
    pub fn occur(&self) -> bool {
        match &self.occur {
            Some(hook) => {
                hook(self.ref_num);
                true
            }
            None => false,
        }
    }
}

// Copies of the aggregate share one hook; two blocks are equal when they
// carry the same reference number and the same hook instance.
impl PartialEq for NetComm {
    fn eq(&self, other: &Self) -> bool {
        let same_hook = match (&self.occur, &other.occur) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        self.ref_num == other.ref_num && same_hook
    }
}

impl fmt::Debug for NetComm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetComm")
            .field("ref_num", &self.ref_num)
            .field("occur", &self.occur.as_ref().map(|_| "hook"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_occur_without_hook() {
        let net_comm = NetComm::new();
        assert_eq!(net_comm.ref_num(), 0);
        assert!(!net_comm.has_occur_hook());
        assert!(!net_comm.occur());
    }

    #[test]
    fn test_occur_passes_ref_num() {
        let seen = Arc::new(AtomicU32::new(0));
        let mut net_comm = NetComm::new();
        net_comm.set_ref_num(42);
        {
            let seen = Arc::clone(&seen);
            net_comm.set_occur_hook(move |ref_num| {
                seen.store(ref_num, Ordering::SeqCst);
            });
        }

        assert!(net_comm.occur());
        assert_eq!(seen.load(Ordering::SeqCst), 42);

        net_comm.clear_occur_hook();
        assert!(!net_comm.occur());
    }

    #[test]
    fn test_copies_share_the_hook() {
        let mut net_comm = NetComm::new();
        net_comm.set_occur_hook(|_| {});
        let copy = net_comm.clone();
        assert_eq!(copy, net_comm);

        let mut other = NetComm::new();
        other.set_occur_hook(|_| {});
        assert_ne!(other, net_comm);
    }
}
