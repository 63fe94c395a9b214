//! Readiness state machine shared by every orchestrator.
//!
//! The register is read from HAL notification callbacks running on arbitrary
//! threads, so it is a plain atomic. No transition table is enforced here.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::{audit_log, info_log};

/// Global orchestration state.
///
/// Ordered: `NotReady < Ready < Work < Pause`. Orchestrators compare against
/// `Ready` to decide whether they may touch the HAL at all.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OrchState {
    /// Waiting for the linecard to report ACTIVE.
    NotReady = 0,
    /// Linecard active; the linecard object may be created.
    Ready = 1,
    /// Linecard created; every object orchestrator may run.
    Work = 2,
    /// Linecard went INACTIVE after having been active.
    Pause = 3,
}

impl OrchState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => OrchState::Ready,
            2 => OrchState::Work,
            3 => OrchState::Pause,
            _ => OrchState::NotReady,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrchState::NotReady => "not_ready",
            OrchState::Ready => "ready",
            OrchState::Work => "work",
            OrchState::Pause => "pause",
        }
    }
}

impl fmt::Display for OrchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lock-free holder of the current [`OrchState`].
#[derive(Debug)]
pub struct OrchFsm {
    state: AtomicU8,
}

impl OrchFsm {
    pub fn new(initial: OrchState) -> Self {
        Self {
            state: AtomicU8::new(initial as u8),
        }
    }

    pub fn get(&self) -> OrchState {
        OrchState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn set(&self, state: OrchState) {
        let previous = OrchState::from_u8(self.state.swap(state as u8, Ordering::AcqRel));
        if previous == state {
            return;
        }
        info_log!("OrchFsm", "Orch state {} -> {}", previous, state);

        let record = AuditRecord::new(AuditCategory::SystemLifecycle, "OrchFsm", "state_transition")
            .with_outcome(AuditOutcome::Success)
            .with_details(serde_json::json!({
                "from": previous.as_str(),
                "to": state.as_str(),
            }));
        audit_log!(record);
    }

    /// True once the linecard object exists and the FSM is not paused.
    pub fn is_working(&self) -> bool {
        self.get() == OrchState::Work
    }
}

impl Default for OrchFsm {
    fn default() -> Self {
        Self::new(OrchState::NotReady)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_state_ordering() {
        assert!(OrchState::NotReady < OrchState::Ready);
        assert!(OrchState::Ready < OrchState::Work);
        assert!(OrchState::Work < OrchState::Pause);
    }

    #[test]
    fn test_set_and_get() {
        let fsm = OrchFsm::default();
        assert_eq!(fsm.get(), OrchState::NotReady);
        fsm.set(OrchState::Ready);
        assert_eq!(fsm.get(), OrchState::Ready);
        fsm.set(OrchState::Work);
        assert!(fsm.is_working());
        fsm.set(OrchState::Pause);
        assert_eq!(fsm.get().as_str(), "pause");
    }

    #[test]
    fn test_set_from_other_thread() {
        let fsm = Arc::new(OrchFsm::new(OrchState::Ready));
        let remote = Arc::clone(&fsm);
        std::thread::spawn(move || remote.set(OrchState::Work))
            .join()
            .unwrap();
        assert_eq!(fsm.get(), OrchState::Work);
    }
}
