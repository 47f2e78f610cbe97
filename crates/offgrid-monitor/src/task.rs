//! Scheduled probe loop and the bridge channel.

use crate::monitor::HealthMonitor;
use offgrid_core::ports::{LivenessProbe, MessageHandler};
use offgrid_core::{LinkState, MonitorMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_millis(2500);

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Delay between the end of one probe and the start of the next.
    pub interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_PROBE_INTERVAL,
        }
    }
}

/// Foreground end of the monitor channel.
#[derive(Debug)]
pub struct BridgeEndpoint {
    events: mpsc::UnboundedReceiver<MonitorMessage>,
    inbox: mpsc::UnboundedSender<MonitorMessage>,
}

impl BridgeEndpoint {
    /// Next transition from the monitor. `None` once the monitor is gone.
    pub async fn recv(&mut self) -> Option<MonitorMessage> {
        self.events.recv().await
    }

    pub fn try_recv(&mut self) -> Option<MonitorMessage> {
        self.events.try_recv().ok()
    }

    /// Confirm the last transition was handled.
    pub fn acknowledge(&self) {
        self.send(MonitorMessage::Ack);
    }

    /// Relay a message from the foreground transport as-is.
    pub fn send(&self, message: MonitorMessage) {
        if self.inbox.send(message).is_err() {
            debug!("Health monitor stopped, dropping message");
        }
    }
}

/// The monitor's execution unit: a state machine, a probe, and its channel ends.
pub struct MonitorTask {
    monitor: HealthMonitor,
    probe: Arc<dyn LivenessProbe>,
    interval: Duration,
    events: mpsc::UnboundedSender<MonitorMessage>,
    inbox: mpsc::UnboundedReceiver<MonitorMessage>,
    inbox_open: bool,
}

impl MonitorTask {
    pub fn new(probe: Arc<dyn LivenessProbe>, config: MonitorConfig) -> (Self, BridgeEndpoint) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();

        let task = Self {
            monitor: HealthMonitor::new(),
            probe,
            interval: config.interval,
            events: events_tx,
            inbox: inbox_rx,
            inbox_open: true,
        };
        let endpoint = BridgeEndpoint {
            events: events_rx,
            inbox: inbox_tx,
        };

        (task, endpoint)
    }

    /// Run one cycle: apply queued messages, probe once, emit if due.
    pub async fn step(&mut self) -> Option<LinkState> {
        self.drain_inbox();
        let outcome = self.probe.probe().await;
        // Acks that arrived while the probe was in flight count for this cycle.
        self.drain_inbox();

        let transition = self.monitor.observe(&outcome)?;
        info!(state = %transition, "Link state changed");
        if self.events.send(transition.into()).is_err() {
            debug!("Foreground bridge closed, transition not delivered");
        }
        Some(transition)
    }

    fn drain_inbox(&mut self) {
        while let Ok(message) = self.inbox.try_recv() {
            self.monitor.on_message(message);
        }
    }

    /// Probe forever, one probe at a time, until `shutdown` flips or its sender drops.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            "Starting health monitor"
        );

        loop {
            tokio::select! {
                _ = self.step() => {}
                _ = shutdown.changed() => break,
            }

            let pause = tokio::time::sleep(self.interval);
            tokio::pin!(pause);

            loop {
                tokio::select! {
                    _ = &mut pause => break,
                    message = self.inbox.recv(), if self.inbox_open => match message {
                        Some(message) => self.monitor.on_message(message),
                        None => self.inbox_open = false,
                    },
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            info!("Health monitor shutting down");
                            return;
                        }
                    }
                }
            }
        }

        info!("Health monitor shutting down");
    }

    /// Start the loop on the runtime.
    pub fn spawn(self) -> MonitorHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(self.run(shutdown_rx));
        MonitorHandle {
            shutdown: shutdown_tx,
            join,
        }
    }
}

/// Cancellation handle for a spawned monitor. Dropping it also stops the loop.
pub struct MonitorHandle {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl MonitorHandle {
    /// Stop the loop and wait for it to exit.
    pub async fn cancel(self) {
        let _ = self.shutdown.send(true);
        let _ = self.join.await;
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}
