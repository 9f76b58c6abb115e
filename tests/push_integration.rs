use chrono::{TimeZone, Utc};
use metric_push::application::exporter::{Exporter, ExporterOptions};
use metric_push::config::TargetConfig;
use metric_push::domain::metrics::{Kind, Metric, Store};
use metric_push::domain::ports::NetworkKind;
use metric_push::infrastructure::formats::LineFormat;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, UdpSocket};
use tokio_test::assert_ok;

const UPDATED_AT: i64 = 1_700_000_000;

async fn requests_store() -> Arc<Store> {
    let store = Arc::new(Store::new());
    let metric = Arc::new(Metric::new(
        "requests",
        "web",
        Kind::Counter,
        vec!["region".to_string()],
    ));
    let at = Utc.timestamp_opt(UPDATED_AT, 0).unwrap();
    assert_ok!(metric.set_at(&["us"], 5, at).await);
    assert_ok!(metric.set_at(&["eu"], 3, at).await);
    store.add(metric).await;
    store
}

fn exporter(store: Arc<Store>) -> Exporter {
    Exporter::new(ExporterOptions {
        store: Some(store),
        hostname: Some("gunstar".to_string()),
        write_deadline: Duration::from_secs(2),
        ..ExporterOptions::default()
    })
    .expect("exporter")
}

/// Accept one connection and return everything sent on it
fn collect_tcp(listener: TcpListener) -> tokio::task::JoinHandle<String> {
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = String::new();
        socket.read_to_string(&mut received).await.unwrap();
        received
    })
}

#[tokio::test]
async fn test_graphite_and_statsd_receive_every_series() {
    let graphite = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let graphite_addr = graphite.local_addr().unwrap().to_string();
    let graphite_rx = collect_tcp(graphite);

    let statsd = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let statsd_addr = statsd.local_addr().unwrap().to_string();

    let mut exporter = exporter(requests_store().await);
    assert!(exporter.register_target(
        &TargetConfig::new(LineFormat::Graphite, graphite_addr).with_prefix("prod.")
    ));
    assert!(exporter.register_target(&TargetConfig::new(LineFormat::Statsd, statsd_addr)));

    exporter.push_metrics().await;

    assert_eq!(
        graphite_rx.await.unwrap(),
        "prod.web.requests.region.eu 3 1700000000\nprod.web.requests.region.us 5 1700000000\n"
    );

    let mut buf = [0u8; 512];
    let mut datagrams = Vec::new();
    for _ in 0..2 {
        let n = statsd.recv(&mut buf).await.unwrap();
        datagrams.push(String::from_utf8_lossy(&buf[..n]).to_string());
    }
    assert_eq!(
        datagrams,
        vec!["web.requests.region.eu:3|c", "web.requests.region.us:5|c"]
    );

    for target in exporter.status().targets {
        assert_eq!(target.export_total, 2, "{}", target.name);
        assert_eq!(target.export_success, 2, "{}", target.name);
    }
}

#[tokio::test]
async fn test_unreachable_target_does_not_block_the_next() {
    let closed = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let closed_addr = closed.local_addr().unwrap().to_string();
    drop(closed);

    let graphite = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let graphite_addr = graphite.local_addr().unwrap().to_string();
    let graphite_rx = collect_tcp(graphite);

    let mut exporter = exporter(requests_store().await);
    let mut down = TargetConfig::new(LineFormat::Graphite, closed_addr);
    down.name = Some("down".to_string());
    exporter.register_target(&down);
    exporter.register_target(&TargetConfig::new(LineFormat::Graphite, graphite_addr));

    exporter.push_metrics().await;

    assert_eq!(graphite_rx.await.unwrap().lines().count(), 2);
    let status = exporter.status();
    assert_eq!(status.targets[0].name, "down");
    assert_eq!(status.targets[0].export_total, 0);
    assert_eq!(status.targets[1].export_success, 2);
}

#[tokio::test]
async fn test_stalled_peer_fails_at_write_deadline() {
    // Enough data to fill the socket buffers of a peer that never reads
    let store = Arc::new(Store::new());
    let metric = Arc::new(Metric::new(
        "payload",
        "web",
        Kind::Gauge,
        vec!["id".to_string()],
    ));
    let padding = "x".repeat(64 * 1024);
    let at = Utc.timestamp_opt(UPDATED_AT, 0).unwrap();
    for i in 0..400 {
        let id = format!("{:03}{}", i, padding);
        assert_ok!(metric.set_at(&[id.as_str()], i, at).await);
    }
    store.add(metric).await;

    let stalled = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let stalled_addr = stalled.local_addr().unwrap().to_string();
    let (release, held) = tokio::sync::oneshot::channel::<()>();
    let holder = tokio::spawn(async move {
        let (_socket, _) = stalled.accept().await.unwrap();
        let _ = held.await;
    });

    let graphite = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let graphite_addr = graphite.local_addr().unwrap().to_string();
    let graphite_rx = collect_tcp(graphite);

    let deadline = Duration::from_millis(300);
    let mut exporter = Exporter::new(ExporterOptions {
        store: Some(store),
        hostname: Some("gunstar".to_string()),
        write_deadline: deadline,
        ..ExporterOptions::default()
    })
    .expect("exporter");
    let mut stalled_target = TargetConfig::new(LineFormat::Graphite, stalled_addr);
    stalled_target.name = Some("stalled".to_string());
    assert!(exporter.register_target(&stalled_target));
    assert!(exporter.register_target(&TargetConfig::new(LineFormat::Graphite, graphite_addr)));

    let started = std::time::Instant::now();
    exporter.push_metrics().await;
    let elapsed = started.elapsed();

    assert!(elapsed >= deadline, "returned after {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(5), "returned after {:?}", elapsed);
    assert_eq!(graphite_rx.await.unwrap().lines().count(), 400);

    let status = exporter.status();
    assert_eq!(status.targets[0].name, "stalled");
    assert!(status.targets[0].export_total > 0);
    assert!(status.targets[0].export_success < status.targets[0].export_total);
    assert_eq!(status.targets[1].export_total, 400);
    assert_eq!(status.targets[1].export_success, 400);

    let _ = release.send(());
    assert_ok!(holder.await);
}

#[tokio::test]
async fn test_statsd_over_tcp_is_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();

    let mut exporter = exporter(requests_store().await);
    let mut statsd = TargetConfig::new(LineFormat::Statsd, address);
    statsd.network = Some(NetworkKind::Tcp);
    assert!(!exporter.register_target(&statsd));
    assert!(exporter.targets().is_empty());
    assert!(Arc::new(exporter).start_metric_push().is_none());
}

#[cfg(unix)]
#[tokio::test]
async fn test_collectd_over_unix_socket() {
    use tokio::net::UnixListener;

    let path = std::env::temp_dir().join(format!(
        "metric-push-collectd-{}-{}.sock",
        std::process::id(),
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    let listener = UnixListener::bind(&path).unwrap();
    let rx = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = String::new();
        socket.read_to_string(&mut received).await.unwrap();
        received
    });

    let mut exporter = exporter(requests_store().await);
    exporter.register_target(&TargetConfig::new(
        LineFormat::Collectd,
        path.to_string_lossy().to_string(),
    ));
    exporter.push_metrics().await;

    let received = rx.await.unwrap();
    let _ = std::fs::remove_file(&path);
    assert_eq!(
        received,
        "PUTVAL \"gunstar/metric_push-web/counter-requests-region-eu\" interval=60 1700000000:3\n\
         PUTVAL \"gunstar/metric_push-web/counter-requests-region-us\" interval=60 1700000000:5\n"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_push_while_producer_mutates_store() {
    let store = requests_store().await;
    let metric = store.read().await.get("requests")[0].clone();

    let producer = tokio::spawn(async move {
        for i in 0..500 {
            let region = format!("r{}", i % 20);
            metric.increment_by(&[region.as_str()], 1).await.unwrap();
            tokio::task::yield_now().await;
        }
    });

    let statsd = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let statsd_addr = statsd.local_addr().unwrap().to_string();
    let drain = tokio::spawn(async move {
        let mut buf = [0u8; 512];
        while statsd.recv(&mut buf).await.is_ok() {}
    });

    let mut exporter = exporter(store);
    exporter.register_target(&TargetConfig::new(LineFormat::Statsd, statsd_addr));

    let pushes = async {
        for _ in 0..20 {
            exporter.push_metrics().await;
            tokio::task::yield_now().await;
        }
    };
    assert_ok!(tokio::time::timeout(Duration::from_secs(10), pushes).await);
    assert_ok!(producer.await);
    drain.abort();

    let target = &exporter.status().targets[0];
    assert!(target.export_total > 0);
    assert_eq!(target.export_total, target.export_success);
}
