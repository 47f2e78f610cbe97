//! Health state machine.

use crate::gate::AckGate;
use offgrid_core::ports::MessageHandler;
use offgrid_core::{HealthState, LinkState, MonitorMessage, ProbeOutcome};
use tracing::debug;

/// Derives online/offline from probe outcomes and decides when to notify.
///
/// A transition is emitted only when the derived state differs from the last
/// one emitted, and only while no earlier transition awaits an `ack`.
/// Withheld transitions are not queued; the next probe re-derives them.
#[derive(Debug, Default)]
pub struct HealthMonitor {
    state: HealthState,
    last_emitted: Option<LinkState>,
    gate: AckGate,
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one probe outcome. Returns the transition to send, if any.
    pub fn observe(&mut self, outcome: &ProbeOutcome) -> Option<LinkState> {
        let derived = outcome.link_state();
        self.state = derived.into();

        if self.last_emitted == Some(derived) {
            return None;
        }

        if self.gate.is_outstanding() {
            debug!(state = %derived, "Transition withheld until acknowledged");
            return None;
        }

        self.last_emitted = Some(derived);
        self.gate.arm();
        Some(derived)
    }

    pub(crate) fn state(&self) -> HealthState {
        self.state
    }

    pub(crate) fn awaiting_ack(&self) -> bool {
        self.gate.is_outstanding()
    }
}

impl MessageHandler for HealthMonitor {
    fn on_message(&mut self, message: MonitorMessage) {
        match message {
            MonitorMessage::Ack => self.gate.release(),
            other => debug!(message = ?other, "Ignoring message"),
        }
    }
}
