//! Event delivery against mock receivers.

use std::sync::Arc;
use std::time::Duration;

use request_shield::config::{GraylogConfig, QRadarConfig, SplunkConfig, WebhookConfig};
use request_shield::delivery::{EventType, NotifyOutcome, SinkEvent, WebhookNotifier};
use request_shield::lifecycle::Shutdown;
use request_shield::siem::{
    GraylogSink, QRadarSink, SecuritySink, SiemDispatcher, SinkError, SplunkSink,
};
use tokio::net::UdpSocket;

mod common;

fn webhook_config(url: String, retry_attempts: u32) -> WebhookConfig {
    WebhookConfig {
        enabled: true,
        url: Some(url),
        retry_attempts,
        base_delay_ms: 10,
        timeout_secs: 2,
        ..WebhookConfig::default()
    }
}

fn blocked_event() -> SinkEvent {
    SinkEvent::new(EventType::IpBlocked, "6.6.6.6", "/admin", "GET", "Access Denied (High Risk IP)")
        .with_metadata("status_code", 403)
}

#[tokio::test]
async fn test_webhook_retries_until_success() {
    let receiver = common::start_recording_receiver(|i| if i < 2 { 500 } else { 200 }).await;
    let shutdown = Shutdown::new();
    let notifier = WebhookNotifier::from_config(&webhook_config(receiver.url("/hook"), 3), &shutdown).unwrap();

    assert_eq!(notifier.notify(blocked_event()), NotifyOutcome::Queued);

    let requests = receiver.wait_for(3, Duration::from_secs(5)).await;
    assert_eq!(requests.len(), 3);
    let body = requests[2].json();
    assert_eq!(body["event"], "IP_BLOCKED");
    assert_eq!(body["ip"], "6.6.6.6");
    assert_eq!(body["metadata"]["status_code"], 403);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(receiver.requests().len(), 3);
}

#[tokio::test]
async fn test_webhook_gives_up_after_retry_attempts() {
    let receiver = common::start_recording_receiver(|_| 503).await;
    let shutdown = Shutdown::new();
    let notifier = WebhookNotifier::from_config(&webhook_config(receiver.url("/hook"), 2), &shutdown).unwrap();

    notifier.notify(blocked_event());
    receiver.wait_for(2, Duration::from_secs(5)).await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(receiver.requests().len(), 2);
}

#[tokio::test]
async fn test_webhook_filters_unlisted_events() {
    let receiver = common::start_recording_receiver(|_| 200).await;
    let shutdown = Shutdown::new();
    let notifier = WebhookNotifier::from_config(&webhook_config(receiver.url("/hook"), 1), &shutdown).unwrap();

    let audit = SinkEvent::new(EventType::AuditLog, "10.0.0.0", "/", "GET", "GET / 200");
    assert_eq!(notifier.notify(audit), NotifyOutcome::Filtered);
    assert_eq!(notifier.notify(blocked_event()), NotifyOutcome::Queued);

    let requests = receiver.wait_for(1, Duration::from_secs(5)).await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].json()["event"], "IP_BLOCKED");
}

#[tokio::test]
async fn test_webhook_stops_on_shutdown() {
    let receiver = common::start_recording_receiver(|_| 200).await;
    let shutdown = Shutdown::new();
    let notifier = WebhookNotifier::from_config(&webhook_config(receiver.url("/hook"), 1), &shutdown).unwrap();

    shutdown.trigger();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(notifier.notify(blocked_event()), NotifyOutcome::Dropped);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(receiver.requests().is_empty());
}

#[tokio::test]
async fn test_splunk_sends_hec_envelope() {
    let receiver = common::start_recording_receiver(|_| 200).await;
    let sink = SplunkSink::new(
        SplunkConfig {
            enabled: true,
            url: Some(receiver.url("/services/collector/event")),
            token: Some("hec-token".into()),
            ..SplunkConfig::default()
        },
        reqwest::Client::new(),
    );

    sink.send(&blocked_event()).await.unwrap();

    let requests = receiver.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].head.starts_with("POST /services/collector/event"));
    assert_eq!(requests[0].header("authorization").as_deref(), Some("Splunk hec-token"));
    let body = requests[0].json();
    assert_eq!(body["sourcetype"], "_json");
    assert_eq!(body["index"], "main");
    assert_eq!(body["event"]["event_type"], "IP_BLOCKED");
}

#[tokio::test]
async fn test_graylog_accepts_only_200_and_202() {
    let accepted = common::start_recording_receiver(|_| 202).await;
    let sink = GraylogSink::new(
        GraylogConfig {
            enabled: true,
            url: Some(accepted.url("/gelf")),
            ..GraylogConfig::default()
        },
        reqwest::Client::new(),
    );
    sink.send(&blocked_event()).await.unwrap();
    let body = accepted.requests()[0].json();
    assert_eq!(body["version"], "1.1");
    assert_eq!(body["_ip"], "6.6.6.6");

    let created = common::start_recording_receiver(|_| 201).await;
    let sink = GraylogSink::new(
        GraylogConfig {
            enabled: true,
            url: Some(created.url("/gelf")),
            ..GraylogConfig::default()
        },
        reqwest::Client::new(),
    );
    let err = sink.send(&blocked_event()).await.unwrap_err();
    assert!(matches!(err, SinkError::Status { status: 201, .. }));
}

#[tokio::test]
async fn test_qradar_sends_cef_datagram() {
    let collector = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = collector.local_addr().unwrap().port();
    let sink = QRadarSink::new(QRadarConfig {
        enabled: true,
        host: Some("127.0.0.1".into()),
        port,
        ..QRadarConfig::default()
    });

    sink.send(&blocked_event()).await.unwrap();

    let mut buf = [0u8; 2048];
    let (n, _) = tokio::time::timeout(Duration::from_secs(2), collector.recv_from(&mut buf))
        .await
        .unwrap()
        .unwrap();
    let line = String::from_utf8_lossy(&buf[..n]);
    assert!(line.starts_with("<131>CEF:0|RequestShield|Shield|"), "{line}");
    assert!(line.contains("|IP_BLOCKED|"));
    assert!(line.contains("src=6.6.6.6"));
    assert!(line.contains("cs1=403"));
}

#[tokio::test]
async fn test_qradar_sends_to_ipv6_collector() {
    let Ok(collector) = UdpSocket::bind("[::1]:0").await else {
        return;
    };
    let port = collector.local_addr().unwrap().port();
    let sink = QRadarSink::new(QRadarConfig {
        enabled: true,
        host: Some("::1".into()),
        port,
        ..QRadarConfig::default()
    });

    sink.send(&blocked_event()).await.unwrap();

    let mut buf = [0u8; 2048];
    let (n, _) = tokio::time::timeout(Duration::from_secs(2), collector.recv_from(&mut buf))
        .await
        .unwrap()
        .unwrap();
    assert!(String::from_utf8_lossy(&buf[..n]).contains("|IP_BLOCKED|"));
}

#[tokio::test]
async fn test_dispatcher_survives_failing_sink() {
    let healthy = common::start_recording_receiver(|_| 200).await;
    let failing = common::start_recording_receiver(|_| 500).await;

    let splunk_config = |url: String| SplunkConfig {
        enabled: true,
        url: Some(url),
        token: Some("t".into()),
        ..SplunkConfig::default()
    };
    let ok: Arc<dyn SecuritySink> = Arc::new(SplunkSink::new(
        splunk_config(healthy.url("/hec")),
        reqwest::Client::new(),
    ));
    let broken: Arc<dyn SecuritySink> = Arc::new(SplunkSink::new(
        splunk_config(failing.url("/hec")),
        reqwest::Client::new(),
    ));
    let dispatcher = SiemDispatcher::new(vec![broken, ok], Duration::from_secs(2));

    assert_eq!(dispatcher.dispatch(&blocked_event()).await, 1);
    assert_eq!(healthy.requests().len(), 1);
    assert_eq!(failing.requests().len(), 1);
}
