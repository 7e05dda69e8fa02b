//! Single-flight guard for frame rendering.

use std::sync::atomic::{AtomicU8, Ordering};

const IDLE: u8 = 0;
const RENDERING: u8 = 1;
const REDRAW_PENDING: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Idle,
    Rendering,
    /// Rendering, and another pass was requested meanwhile.
    RedrawPending,
}

/// Allows at most one frame in flight.
///
/// There is no queue: a caller that loses the race does nothing, and the
/// next push renders the latest data anyway. A caller that must not be lost
/// can instead ask the permit holder for one more pass with
/// [`RenderGate::request_redraw`]; any number of such requests coalesce.
#[derive(Debug, Default)]
pub struct RenderGate {
    state: AtomicU8,
}

impl RenderGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves `Idle -> Rendering`, or returns `None` if a frame is in flight.
    pub fn try_acquire(&self) -> Option<RenderPermit<'_>> {
        self.state
            .compare_exchange(IDLE, RENDERING, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RenderPermit {
                gate: self,
                released: false,
            })
    }

    /// Asks the current permit holder to render once more before releasing.
    ///
    /// Returns `false` if the gate is idle, in which case the caller should
    /// try to acquire it instead.
    pub fn request_redraw(&self) -> bool {
        match self.state.compare_exchange(
            RENDERING,
            REDRAW_PENDING,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => true,
            Err(current) => current == REDRAW_PENDING,
        }
    }

    pub fn state(&self) -> GateState {
        match self.state.load(Ordering::Acquire) {
            IDLE => GateState::Idle,
            REDRAW_PENDING => GateState::RedrawPending,
            _ => GateState::Rendering,
        }
    }
}

/// Proof of holding the gate. Releases it on drop, discarding any pending
/// redraw request.
#[must_use = "the gate is released as soon as the permit is dropped"]
#[derive(Debug)]
pub struct RenderPermit<'g> {
    gate: &'g RenderGate,
    released: bool,
}

impl RenderPermit<'_> {
    /// Releases the gate, unless a redraw was requested while this permit
    /// was held. In that case the request is consumed and the permit is
    /// handed back for another pass.
    pub fn finish(mut self) -> Option<Self> {
        match self.gate.state.compare_exchange(
            RENDERING,
            IDLE,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                self.released = true;
                None
            }
            Err(_) => {
                // Only the holder moves the gate out of REDRAW_PENDING.
                self.gate.state.store(RENDERING, Ordering::Release);
                Some(self)
            }
        }
    }
}

impl Drop for RenderPermit<'_> {
    fn drop(&mut self) {
        if !self.released {
            self.gate.state.store(IDLE, Ordering::Release);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn test_second_acquire_fails_until_release() {
        let gate = RenderGate::new();
        let permit = gate.try_acquire();
        assert!(permit.is_some());
        assert_eq!(gate.state(), GateState::Rendering);
        assert!(gate.try_acquire().is_none());

        drop(permit);
        assert_eq!(gate.state(), GateState::Idle);
        assert!(gate.try_acquire().is_some());
    }

    #[test]
    fn test_redraw_requests_coalesce_into_one_pass() {
        let gate = RenderGate::new();
        assert!(!gate.request_redraw(), "idle gate has no holder to ask");

        let permit = gate.try_acquire().unwrap();
        assert!(gate.request_redraw());
        assert!(gate.request_redraw());
        assert_eq!(gate.state(), GateState::RedrawPending);
        assert!(gate.try_acquire().is_none());

        let permit = permit.finish().expect("one more pass was requested");
        assert_eq!(gate.state(), GateState::Rendering);
        assert!(permit.finish().is_none());
        assert_eq!(gate.state(), GateState::Idle);
    }

    #[test]
    fn test_dropped_permit_discards_pending_redraw() {
        let gate = RenderGate::new();
        let permit = gate.try_acquire().unwrap();
        assert!(gate.request_redraw());
        drop(permit);
        assert_eq!(gate.state(), GateState::Idle);
    }

    #[test]
    fn test_only_one_thread_holds_the_gate() {
        let gate = Arc::new(RenderGate::new());
        let holders = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = Arc::clone(&gate);
                let holders = Arc::clone(&holders);
                std::thread::spawn(move || {
                    for _ in 0..10_000 {
                        if let Some(_permit) = gate.try_acquire() {
                            let inside = holders.fetch_add(1, Ordering::SeqCst);
                            assert_eq!(inside, 0, "two permits alive at once");
                            holders.fetch_sub(1, Ordering::SeqCst);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(gate.state(), GateState::Idle);
    }
}
