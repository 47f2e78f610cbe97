//! Monitor loop and handshake behaviour.

use async_trait::async_trait;
use offgrid_core::ports::LivenessProbe;
use offgrid_core::{LinkState, MonitorMessage, ProbeOutcome};
use offgrid_monitor::{HttpProbe, MonitorConfig, MonitorTask};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Replays a fixed script of outcomes, then repeats the last one.
struct ScriptedProbe {
    script: Mutex<VecDeque<ProbeOutcome>>,
    last: Mutex<ProbeOutcome>,
    started: Mutex<Vec<Instant>>,
}

impl ScriptedProbe {
    fn new(script: Vec<ProbeOutcome>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(ProbeOutcome::Healthy),
            started: Mutex::new(Vec::new()),
        })
    }

    fn push(&self, outcome: ProbeOutcome) {
        self.script.lock().unwrap().push_back(outcome);
    }

    fn started(&self) -> Vec<Instant> {
        self.started.lock().unwrap().clone()
    }
}

#[async_trait]
impl LivenessProbe for ScriptedProbe {
    async fn probe(&self) -> ProbeOutcome {
        self.started.lock().unwrap().push(Instant::now());
        let next = self.script.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        if let Some(next) = next {
            *last = next;
        }
        last.clone()
    }
}

fn up() -> ProbeOutcome {
    ProbeOutcome::Healthy
}

fn down() -> ProbeOutcome {
    ProbeOutcome::Unhealthy {
        reason: "connection refused".to_string(),
    }
}

#[tokio::test]
async fn test_only_changes_are_emitted() {
    let probe = ScriptedProbe::new(vec![up(), up(), up()]);
    let (mut task, mut bridge) = MonitorTask::new(probe, MonitorConfig::default());

    assert_eq!(task.step().await, Some(LinkState::Online));
    bridge.acknowledge();
    assert_eq!(task.step().await, None);
    assert_eq!(task.step().await, None);

    assert_eq!(bridge.try_recv(), Some(MonitorMessage::Online));
    assert_eq!(bridge.try_recv(), None);
}

#[tokio::test]
async fn test_unacknowledged_transition_blocks_the_next() {
    let probe = ScriptedProbe::new(vec![down(), down(), down(), up(), up(), up()]);
    let (mut task, mut bridge) = MonitorTask::new(probe, MonitorConfig::default());

    assert_eq!(task.step().await, Some(LinkState::Offline));
    assert_eq!(task.step().await, None);
    assert_eq!(task.step().await, None);
    assert_eq!(bridge.try_recv(), Some(MonitorMessage::Offline));

    // Link is back, but the offline notice was never acknowledged.
    assert_eq!(task.step().await, None);
    assert_eq!(task.step().await, None);
    assert_eq!(bridge.try_recv(), None);

    bridge.acknowledge();
    assert_eq!(task.step().await, Some(LinkState::Online));
    assert_eq!(bridge.try_recv(), Some(MonitorMessage::Online));
    assert_eq!(bridge.try_recv(), None);
}

#[tokio::test]
async fn test_flapping_link_without_ack_emits_once() {
    let mut script = Vec::new();
    for i in 0..20 {
        script.push(if i % 2 == 0 { down() } else { up() });
    }
    let probe = ScriptedProbe::new(script);
    let (mut task, mut bridge) = MonitorTask::new(probe, MonitorConfig::default());

    for _ in 0..20 {
        task.step().await;
    }

    assert_eq!(bridge.try_recv(), Some(MonitorMessage::Offline));
    assert_eq!(bridge.try_recv(), None);
}

#[tokio::test]
async fn test_acknowledged_flapping_alternates() {
    let probe = ScriptedProbe::new(vec![up(), down(), down(), up(), down()]);
    let (mut task, mut bridge) = MonitorTask::new(probe, MonitorConfig::default());

    let mut received = Vec::new();
    for _ in 0..5 {
        task.step().await;
        if let Some(message) = bridge.try_recv() {
            received.push(message);
            bridge.acknowledge();
        }
    }

    assert_eq!(
        received,
        vec![
            MonitorMessage::Online,
            MonitorMessage::Offline,
            MonitorMessage::Online,
            MonitorMessage::Offline,
        ]
    );
    for pair in received.windows(2) {
        assert_ne!(pair[0], pair[1]);
    }
}

#[tokio::test]
async fn test_ack_for_same_state_produces_nothing() {
    let probe = ScriptedProbe::new(vec![down(), up(), down()]);
    let (mut task, mut bridge) = MonitorTask::new(probe, MonitorConfig::default());

    task.step().await;
    task.step().await;
    bridge.acknowledge();
    assert_eq!(task.step().await, None);

    assert_eq!(bridge.try_recv(), Some(MonitorMessage::Offline));
    assert_eq!(bridge.try_recv(), None);
}

#[tokio::test]
async fn test_unrecognized_messages_do_not_release_gate() {
    let probe = ScriptedProbe::new(vec![down(), up()]);
    let (mut task, bridge) = MonitorTask::new(probe, MonitorConfig::default());

    task.step().await;
    bridge.send(MonitorMessage::Unknown);
    bridge.send(MonitorMessage::Online);
    assert_eq!(task.step().await, None);
}

#[tokio::test(start_paused = true)]
async fn test_spawned_loop_delivers_and_waits_for_ack() {
    let probe = ScriptedProbe::new(vec![down(), down(), down(), up()]);
    let (task, mut bridge) = MonitorTask::new(probe.clone(), MonitorConfig::default());
    let handle = task.spawn();

    assert_eq!(bridge.recv().await, Some(MonitorMessage::Offline));

    // Let several cycles run with the notice outstanding.
    tokio::time::sleep(Duration::from_secs(15)).await;
    assert_eq!(bridge.try_recv(), None);

    bridge.acknowledge();
    assert_eq!(bridge.recv().await, Some(MonitorMessage::Online));

    handle.cancel().await;
    assert!(probe.started().len() >= 5);
}

#[tokio::test(start_paused = true)]
async fn test_probes_are_spaced_by_interval() {
    let probe = ScriptedProbe::new(vec![up()]);
    let config = MonitorConfig {
        interval: Duration::from_millis(2500),
    };
    let (task, _bridge) = MonitorTask::new(probe.clone(), config);
    let handle = task.spawn();

    tokio::time::sleep(Duration::from_millis(10_100)).await;
    handle.cancel().await;

    let started = probe.started();
    assert_eq!(started.len(), 5);
    for pair in started.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_millis(2500));
    }
}

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_probing() {
    let probe = ScriptedProbe::new(vec![up()]);
    let (task, _bridge) = MonitorTask::new(probe.clone(), MonitorConfig::default());
    let handle = task.spawn();

    tokio::time::sleep(Duration::from_secs(3)).await;
    handle.cancel().await;
    let probes = probe.started().len();

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(probe.started().len(), probes);
}

#[tokio::test(start_paused = true)]
async fn test_late_probe_script_changes_are_picked_up() {
    let probe = ScriptedProbe::new(vec![up()]);
    let (task, mut bridge) = MonitorTask::new(probe.clone(), MonitorConfig::default());
    let handle = task.spawn();

    assert_eq!(bridge.recv().await, Some(MonitorMessage::Online));
    bridge.acknowledge();
    probe.push(down());

    assert_eq!(bridge.recv().await, Some(MonitorMessage::Offline));
    handle.cancel().await;
}

#[tokio::test]
async fn test_http_probe_reports_health() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"Status":"ok"}"#))
        .mount(&server)
        .await;

    let origin = Url::parse(&server.uri()).unwrap();
    let probe = HttpProbe::for_origin(&origin, "/health").unwrap();
    assert_eq!(probe.probe().await, ProbeOutcome::Healthy);
}

#[tokio::test]
async fn test_http_probe_non_success_is_unhealthy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let origin = Url::parse(&server.uri()).unwrap();
    let probe = HttpProbe::for_origin(&origin, "/health").unwrap();
    assert_eq!(probe.probe().await.link_state(), LinkState::Offline);
}

#[tokio::test]
async fn test_http_probe_unreachable_is_unhealthy() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let origin = Url::parse(&format!("http://{}", addr)).unwrap();
    let probe = HttpProbe::for_origin(&origin, "/health").unwrap();
    assert!(matches!(probe.probe().await, ProbeOutcome::Unhealthy { .. }));
}

#[tokio::test]
async fn test_http_probe_times_out_on_hung_origin() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;

    let origin = Url::parse(&server.uri()).unwrap();
    let probe = HttpProbe::for_origin(&origin, "/health")
        .unwrap()
        .with_timeout(Some(Duration::from_millis(200)))
        .unwrap();

    let outcome = tokio::time::timeout(Duration::from_secs(5), probe.probe())
        .await
        .expect("probe should give up on its own");
    assert!(matches!(outcome, ProbeOutcome::Unhealthy { .. }));
}
