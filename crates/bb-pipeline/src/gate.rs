use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Non-queuing admission gate: at most one permit exists at a time.
#[derive(Debug, Clone, Default)]
pub struct ReadyGate {
    busy: Arc<AtomicBool>,
}

impl ReadyGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the single permit if nobody holds it.
    ///
    /// The check and the claim are one compare-and-swap, so two concurrent
    /// callers can never both succeed.
    pub fn try_acquire(&self) -> Option<GatePermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| GatePermit {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_ready(&self) -> bool {
        !self.busy.load(Ordering::Acquire)
    }
}

/// Proof of admission. Dropping it reopens the gate.
#[derive(Debug)]
pub struct GatePermit {
    busy: Arc<AtomicBool>,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use super::ReadyGate;

    #[test]
    fn single_permit_until_dropped() {
        let gate = ReadyGate::new();
        assert!(gate.is_ready());

        let permit = gate.try_acquire().expect("gate starts open");
        assert!(!gate.is_ready());
        assert!(gate.try_acquire().is_none());
        assert!(gate.clone().try_acquire().is_none());

        drop(permit);
        assert!(gate.is_ready());
        assert!(gate.try_acquire().is_some());
    }

    #[test]
    fn concurrent_callers_get_one_permit() {
        let gate = ReadyGate::new();
        let barrier = Barrier::new(8);
        let winners = AtomicUsize::new(0);

        thread::scope(|s| {
            let mut permits = Vec::new();
            for _ in 0..8 {
                permits.push(s.spawn(|| {
                    barrier.wait();
                    let permit = gate.try_acquire();
                    if permit.is_some() {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                    permit
                }));
            }
            let held: Vec<_> = permits
                .into_iter()
                .filter_map(|h| h.join().expect("thread ran"))
                .collect();
            assert_eq!(held.len(), 1);
        });

        assert_eq!(winners.load(Ordering::SeqCst), 1);
        assert!(gate.is_ready());
    }
}
