use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Single-flight gate for full scans
///
/// Only one [`ScanPermit`] exists at a time. The flag clears when the permit is
/// dropped, which also happens when the task holding it panics.
#[derive(Debug, Clone, Default)]
pub struct ScanGuard {
    running: Arc<AtomicBool>,
}

#[derive(Debug)]
pub struct ScanPermit {
    running: Arc<AtomicBool>,
}

impl ScanGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the permit, or None while another scan holds it
    pub fn try_acquire(&self) -> Option<ScanPermit> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ScanPermit {
                running: Arc::clone(&self.running),
            })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Drop for ScanPermit {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}
