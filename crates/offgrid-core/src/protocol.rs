//! Health monitor state and the monitor/bridge message protocol.

use serde::{Deserialize, Serialize};

/// Messages exchanged between the health monitor and the foreground bridge.
///
/// Wire shape is `{"type": "online"}`, `{"type": "offline"}` or `{"type": "ack"}`.
/// Any other `type` decodes to [`MonitorMessage::Unknown`] and is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MonitorMessage {
    Online,
    Offline,
    Ack,
    #[serde(other)]
    Unknown,
}

impl MonitorMessage {
    /// Decode a text frame. Malformed input and unknown types yield `None`.
    pub fn parse(text: &str) -> Option<Self> {
        match serde_json::from_str::<MonitorMessage>(text) {
            Ok(MonitorMessage::Unknown) | Err(_) => None,
            Ok(msg) => Some(msg),
        }
    }

    pub fn to_json(&self) -> String {
        match self {
            MonitorMessage::Online => r#"{"type":"online"}"#,
            MonitorMessage::Offline => r#"{"type":"offline"}"#,
            MonitorMessage::Ack => r#"{"type":"ack"}"#,
            MonitorMessage::Unknown => r#"{"type":"unknown"}"#,
        }
        .to_string()
    }

    /// The link state carried by a transition message.
    pub fn link_state(&self) -> Option<LinkState> {
        match self {
            MonitorMessage::Online => Some(LinkState::Online),
            MonitorMessage::Offline => Some(LinkState::Offline),
            _ => None,
        }
    }
}

/// The binary state carried by a transition event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkState {
    Online,
    Offline,
}

impl From<LinkState> for MonitorMessage {
    fn from(state: LinkState) -> Self {
        match state {
            LinkState::Online => MonitorMessage::Online,
            LinkState::Offline => MonitorMessage::Offline,
        }
    }
}

impl std::fmt::Display for LinkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkState::Online => write!(f, "online"),
            LinkState::Offline => write!(f, "offline"),
        }
    }
}

/// State derived by the health monitor. `Unknown` is only ever the initial state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    #[default]
    Unknown,
    Online,
    Offline,
}

impl HealthState {
    pub fn link(&self) -> Option<LinkState> {
        match self {
            HealthState::Unknown => None,
            HealthState::Online => Some(LinkState::Online),
            HealthState::Offline => Some(LinkState::Offline),
        }
    }
}

impl From<LinkState> for HealthState {
    fn from(state: LinkState) -> Self {
        match state {
            LinkState::Online => HealthState::Online,
            LinkState::Offline => HealthState::Offline,
        }
    }
}

/// Result of one liveness probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Healthy,
    Unhealthy { reason: String },
}

impl ProbeOutcome {
    pub fn link_state(&self) -> LinkState {
        match self {
            ProbeOutcome::Healthy => LinkState::Online,
            ProbeOutcome::Unhealthy { .. } => LinkState::Offline,
        }
    }
}
