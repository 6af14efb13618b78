//! Process-wide serialization of hardware-claiming operations.
//!
//! Scans that claim an interface or the SDR dongle cannot overlap.
//! Acquisition never blocks: a second caller gets a busy error
//! immediately instead of queueing behind a two-minute scan.

use ssa_common::{Error, OperationResult};
use std::sync::{Mutex, MutexGuard, TryLockError};
use tracing::debug;

/// Operations that must hold the gate while they run.
pub const EXCLUSIVE_OPERATIONS: &[&str] = &[
    "nmap_scan",
    "handshake_capture",
    "deauth_attack",
    "start_sdr",
    "spectrum_scan",
    "kill_internet",
];

pub fn is_exclusive(operation: &str) -> bool {
    EXCLUSIVE_OPERATIONS.contains(&operation)
}

#[derive(Debug, Default)]
pub struct ExclusiveGate {
    lock: Mutex<()>,
}

/// Held for the duration of an exclusive operation.
pub struct GateGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

impl ExclusiveGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to claim the gate without waiting.
    pub fn try_acquire(&self) -> Option<GateGuard<'_>> {
        match self.lock.try_lock() {
            Ok(guard) => Some(GateGuard { _guard: guard }),
            Err(TryLockError::WouldBlock) => None,
            // A panic while holding the gate means the hardware state is
            // unknown; treat the gate as permanently busy rather than
            // pretending the claim is clean.
            Err(TryLockError::Poisoned(_)) => None,
        }
    }

    /// Run a closure under the gate, or produce a busy error result.
    pub fn run_exclusive<F>(&self, operation: &str, f: F) -> OperationResult
    where
        F: FnOnce() -> OperationResult,
    {
        match self.try_acquire() {
            Some(_guard) => f(),
            None => {
                debug!(operation, "exclusive gate busy");
                OperationResult::from_error(&Error::Busy {
                    operation: operation.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc};

    #[test]
    fn test_second_acquire_fails_while_held() {
        let gate = ExclusiveGate::new();
        let guard = gate.try_acquire().unwrap();
        assert!(gate.try_acquire().is_none());
        drop(guard);
        assert!(gate.try_acquire().is_some());
    }

    #[test]
    fn test_run_exclusive_returns_busy_result() {
        let gate = ExclusiveGate::new();
        let _guard = gate.try_acquire().unwrap();
        let result = gate.run_exclusive("nmap_scan", || {
            OperationResult::hardware(json!({"should": "not run"}))
        });
        assert!(result.is_error());
        assert!(result.error_message().unwrap().contains("busy"));
    }

    #[test]
    fn test_concurrent_claims_one_winner() {
        let gate = Arc::new(ExclusiveGate::new());
        let running = Arc::new(AtomicUsize::new(0));
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let (started_tx, started_rx) = mpsc::channel::<()>();

        let holder = {
            let gate = Arc::clone(&gate);
            let running = Arc::clone(&running);
            std::thread::spawn(move || {
                gate.run_exclusive("spectrum_scan", || {
                    running.fetch_add(1, Ordering::SeqCst);
                    started_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                    OperationResult::hardware(json!({}))
                })
            })
        };

        started_rx.recv().unwrap();
        let contender = gate.run_exclusive("start_sdr", || {
            running.fetch_add(1, Ordering::SeqCst);
            OperationResult::hardware(json!({}))
        });
        assert!(contender.is_error());
        assert_eq!(running.load(Ordering::SeqCst), 1);

        release_tx.send(()).unwrap();
        assert!(!holder.join().unwrap().is_error());
    }

    #[test]
    fn test_exclusive_catalog() {
        assert!(is_exclusive("nmap_scan"));
        assert!(is_exclusive("kill_internet"));
        assert!(!is_exclusive("wifi_scan"));
        assert!(!is_exclusive("geolocate_ip"));
    }
}
