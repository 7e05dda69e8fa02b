//! End-to-end checks through the public monitor API: events in, statistics
//! and presented frames out.

use std::sync::Arc;
use std::time::{Duration, Instant};

use netpulse::render::{GateState, PADDING_SENTINEL};
use netpulse::util::SharedMockTimeSource;
use netpulse::{Config, FrameOutcome, MemorySurface, StatisticsSnapshot, TrafficMonitor};

type MockMonitor = TrafficMonitor<MemorySurface, SharedMockTimeSource>;

fn mock_monitor(config: &Config) -> (MockMonitor, SharedMockTimeSource) {
    let ts = SharedMockTimeSource::new(Instant::now());
    (
        TrafficMonitor::with_time_source("integration", config, ts.clone()),
        ts,
    )
}

#[test_log::test]
fn constant_rate_feed_drives_chart() {
    let (monitor, ts) = mock_monitor(&Config::default());
    let surface = Arc::new(MemorySurface::new().with_row_padding(32));
    monitor.on_surface_created(Arc::clone(&surface), 140, 60);

    monitor.record_event(1000.0).unwrap();
    let mut last = StatisticsSnapshot::default();
    for _ in 0..10 {
        ts.advance_time(Duration::from_millis(100));
        last = monitor.record_event(1000.0).unwrap();
        assert!((last.instant_kbps - 78.125).abs() < 1e-9);
        monitor.push_sample(last.instant_kbps).unwrap();
    }

    assert!((last.max_kbps - 78.125).abs() < 1e-9);
    assert!(last.jitter < 1e-9);
    assert_eq!(last.total_bytes, 11_000);
    assert_eq!(surface.stats().submissions, 10);

    let frame = surface.front_buffer().unwrap();
    for y in 0..frame.height {
        assert!(frame.padding(y).iter().all(|b| *b == PADDING_SENTINEL));
    }
    // 78.125 on a 0..120 scale: the line sits at y = 60 - 60 * 78.125 / 120.
    let line_y = (60.0 - 60.0 * 78.125 / 120.0) as u32;
    assert_eq!(frame.pixel(70, line_y), [0x00, 0x7D, 0xFF, 0xFF]);
    assert_eq!(frame.pixel(70, 2), [0xFF, 0xFF, 0xFF, 0xFF]);
}

#[test_log::test]
fn history_keeps_latest_samples_only() {
    let (monitor, _) = mock_monitor(&Config::default());
    for value in 1..=20 {
        monitor.push_sample(value as f64).unwrap();
    }
    let expected: Vec<f64> = (6..=20).map(|v| v as f64).collect();
    assert_eq!(monitor.samples().snapshot(), expected);

    monitor.clear_samples();
    assert!(monitor.samples().is_empty());
}

#[test_log::test]
fn surface_lifecycle_round_trip() {
    let (monitor, _) = mock_monitor(&Config::default());
    let surface = Arc::new(MemorySurface::new());
    monitor.push_sample(10.0).unwrap();
    monitor.push_sample(20.0).unwrap();

    monitor.on_surface_created(Arc::clone(&surface), 64, 32);
    assert_eq!(
        monitor.on_surface_resized(Arc::clone(&surface), 48, 48),
        FrameOutcome::Presented { waveform: true }
    );
    let frame = surface.front_buffer().unwrap();
    assert_eq!((frame.width, frame.height), (48, 48));

    monitor.on_surface_destroyed(&surface);
    assert_eq!(monitor.push_sample(30.0).unwrap(), FrameOutcome::NoSurface);
    assert_eq!(surface.stats().submissions, 1);

    let replacement = Arc::new(MemorySurface::new());
    monitor.on_surface_created(Arc::clone(&replacement), 16, 16);
    assert!(matches!(
        monitor.push_sample(40.0).unwrap(),
        FrameOutcome::Presented { .. }
    ));
}

#[test_log::test]
fn configured_capacity_is_used() -> testresult::TestResult {
    let dir = tempfile::tempdir()?;
    std::fs::write(
        dir.path().join("config.toml"),
        "[chart]\nhistory_capacity = 4\n\n[analyzer]\ndebounce_ms = 10\n",
    )?;
    let config = netpulse::ConfigArgs {
        config_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    }
    .build()?;

    let (monitor, ts) = mock_monitor(&config);
    for value in 0..10 {
        monitor.push_sample(value as f64)?;
    }
    assert_eq!(monitor.samples().snapshot(), vec![6.0, 7.0, 8.0, 9.0]);

    monitor.record_event(0.0)?;
    ts.advance_time(Duration::from_millis(20));
    let snapshot = monitor.record_event(1024.0)?;
    assert!((snapshot.instant_kbps - 400.0).abs() < 1e-9);
    Ok(())
}

#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn concurrent_producers_and_renders() {
    let monitor = Arc::new(TrafficMonitor::<MemorySurface>::new(
        "concurrent",
        &Config::default(),
    ));
    let surface = Arc::new(MemorySurface::new().with_row_padding(8));
    monitor.on_surface_created(Arc::clone(&surface), 96, 48);

    const TASKS: usize = 8;
    const EVENTS: usize = 200;

    let handles: Vec<_> = (0..TASKS)
        .map(|task| {
            let monitor = Arc::clone(&monitor);
            tokio::spawn(async move {
                let mut presented = 0usize;
                let mut busy = 0usize;
                for i in 0..EVENTS {
                    monitor.record_event(100.0).unwrap();
                    match monitor.push_sample((task * EVENTS + i) as f64).unwrap() {
                        FrameOutcome::Presented { .. } => presented += 1,
                        FrameOutcome::Busy => busy += 1,
                        other => panic!("unexpected outcome {other:?}"),
                    }
                    if i % 16 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
                (presented, busy)
            })
        })
        .collect();

    let mut presented = 0;
    let mut busy = 0;
    for handle in handles {
        let (p, b) = handle.await.unwrap();
        presented += p;
        busy += b;
    }

    assert_eq!(presented + busy, TASKS * EVENTS);
    assert_eq!(surface.stats().submissions, presented);
    assert_eq!(surface.stats().aborts, 0);
    assert_eq!(monitor.controller().renderer().gate().state(), GateState::Idle);
    assert!(monitor.samples().len() <= netpulse::chart::DEFAULT_HISTORY_CAPACITY);

    let snapshot = monitor.record_event(0.0).unwrap();
    assert_eq!(snapshot.total_bytes, (TASKS * EVENTS * 100) as u64);
}
