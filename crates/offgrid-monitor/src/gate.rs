//! Outstanding-notification flag.

/// Set while a transition has been sent and not yet acknowledged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AckGate {
    outstanding: bool,
}

impl AckGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_outstanding(&self) -> bool {
        self.outstanding
    }

    /// Mark a notification as in flight.
    pub fn arm(&mut self) {
        self.outstanding = true;
    }

    /// Clear the flag after an acknowledgment.
    pub fn release(&mut self) {
        self.outstanding = false;
    }
}
