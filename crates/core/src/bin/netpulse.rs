use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use netpulse::config::{set_logger, ConfigArgs};
use netpulse::{FrameOutcome, MemorySurface, StatisticsSnapshot, TrafficMonitor};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Feeds a simulated download into a traffic monitor and renders the chart
/// into an in-memory surface.
#[derive(Parser, Debug)]
#[command(name = "netpulse", version)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[arg(long, default_value_t = 480)]
    width: u32,

    #[arg(long, default_value_t = 240)]
    height: u32,

    /// Extra bytes the simulated compositor adds to every row.
    #[arg(long, default_value_t = 64)]
    row_padding: usize,

    /// How long to run, in seconds.
    #[arg(long, default_value_t = 10)]
    duration_secs: u64,

    /// Average simulated link speed, in kbit/s.
    #[arg(long, default_value_t = 800.0)]
    mean_kbps: f64,

    /// Resize the surface every this many seconds; 0 disables resizing.
    #[arg(long, default_value_t = 4)]
    resize_every_secs: u64,

    /// Print every chart sample's statistics as a JSON line on stdout.
    #[arg(long)]
    json: bool,

    /// Write the last presented frame to this PNG file.
    #[arg(long)]
    png: Option<PathBuf>,

    /// Seed for the simulated traffic.
    #[arg(long)]
    seed: Option<u64>,
}

const PACKET_INTERVAL: Duration = Duration::from_millis(20);
const SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

type Monitor = TrafficMonitor<MemorySurface>;

/// Produces bursty packet sizes around the requested mean rate.
async fn feed_traffic(
    monitor: Arc<Monitor>,
    latest: Arc<parking_lot::Mutex<StatisticsSnapshot>>,
    mean_kbps: f64,
    mut rng: SmallRng,
) {
    let mean_bytes = mean_kbps * 1024.0 / 8.0 * PACKET_INTERVAL.as_secs_f64();
    let mut interval = tokio::time::interval(PACKET_INTERVAL);
    loop {
        interval.tick().await;
        let factor = if rng.gen_bool(0.05) {
            rng.gen_range(2.0..4.0)
        } else {
            rng.gen_range(0.3..1.3)
        };
        match monitor.record_event((mean_bytes * factor).round()) {
            Ok(snapshot) => *latest.lock() = snapshot,
            Err(error) => tracing::warn!(%error, "Discarded simulated event"),
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli
        .config
        .clone()
        .build()
        .context("loading configuration")?;
    set_logger(Some(config.log_level));
    tracing::debug!(?config, "Configuration loaded");

    let monitor = Arc::new(Monitor::new("netpulse-demo", &config));
    let surface = Arc::new(MemorySurface::new().with_row_padding(cli.row_padding));
    monitor.on_surface_created(Arc::clone(&surface), cli.width, cli.height);

    let rng = match cli.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };
    let latest = Arc::new(parking_lot::Mutex::new(StatisticsSnapshot::default()));
    let feeder = tokio::spawn(feed_traffic(
        Arc::clone(&monitor),
        Arc::clone(&latest),
        cli.mean_kbps,
        rng,
    ));

    let mut samples = tokio::time::interval(SAMPLE_INTERVAL);
    let deadline = tokio::time::sleep(Duration::from_secs(cli.duration_secs));
    tokio::pin!(deadline);
    let resize_period = Duration::from_secs(cli.resize_every_secs.max(1));
    let mut resizes = tokio::time::interval_at(tokio::time::Instant::now() + resize_period, resize_period);
    let mut wide = true;
    let mut presented = 0usize;
    let mut dropped = 0usize;

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = samples.tick() => {
                let snapshot = *latest.lock();
                if cli.json {
                    println!("{}", serde_json::to_string(&snapshot)?);
                }
                tracing::debug!(
                    instant_kbps = snapshot.instant_kbps,
                    avg_kbps = snapshot.avg_kbps,
                    jitter = snapshot.jitter,
                    "Chart sample"
                );
                match monitor.push_sample(snapshot.instant_kbps)? {
                    FrameOutcome::Presented { .. } => presented += 1,
                    FrameOutcome::Busy => dropped += 1,
                    FrameOutcome::Deferred | FrameOutcome::NoSurface | FrameOutcome::Failed => {}
                }
            }
            _ = resizes.tick(), if cli.resize_every_secs > 0 => {
                wide = !wide;
                let (width, height) = if wide {
                    (cli.width, cli.height)
                } else {
                    (cli.width * 3 / 4, cli.height * 4 / 3)
                };
                if let FrameOutcome::Deferred =
                    monitor.on_surface_resized(Arc::clone(&surface), width, height)
                {
                    tracing::debug!(width, height, "Resize render deferred to the frame in flight");
                }
            }
        }
    }

    feeder.abort();
    let last = *latest.lock();
    tracing::info!(
        presented,
        dropped,
        total_bytes = last.total_bytes,
        max_kbps = last.max_kbps,
        min_kbps = last.min_kbps,
        avg_kbps = last.avg_kbps,
        jitter = last.jitter,
        "Simulation finished"
    );

    if let Some(path) = cli.png.as_deref() {
        write_png(&surface, path)?;
    }
    monitor.on_surface_destroyed(&surface);
    Ok(())
}

#[cfg(feature = "png")]
fn write_png(surface: &MemorySurface, path: &std::path::Path) -> anyhow::Result<()> {
    let frame = surface
        .front_buffer()
        .context("no frame was presented")?;
    let size = tiny_skia::IntSize::from_wh(frame.width, frame.height)
        .context("presented frame has no area")?;
    let pixmap = tiny_skia::Pixmap::from_vec(frame.packed(), size)
        .context("presented frame does not match its size")?;
    pixmap
        .save_png(path)
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), "Final frame written");
    Ok(())
}

#[cfg(not(feature = "png"))]
fn write_png(_surface: &MemorySurface, _path: &std::path::Path) -> anyhow::Result<()> {
    anyhow::bail!("built without the `png` feature")
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;
    rt.block_on(run(cli))
}
