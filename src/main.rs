use anyhow::{Context, Result};
use clap::Parser;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use spinner_widget::config::{self, parse_color};
use spinner_widget::wayland::{AppState, ShmBuffer};
use spinner_widget::{ProgressIndicator, SpinnerConfig};

#[derive(Parser)]
#[command(name = "progress-spinner")]
#[command(about = "Animated ring-of-circles loading spinner overlay", long_about = None)]
struct Cli {
    /// Side length of the spinner square in pixels
    #[arg(long)]
    side: Option<u32>,

    /// Horizontal offset of the spinner within the overlay
    #[arg(long)]
    x: Option<u32>,

    /// Vertical offset of the spinner within the overlay
    #[arg(long)]
    y: Option<u32>,

    /// Animation frame rate
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=240))]
    fps: Option<u32>,

    /// Rotation slots per full cycle
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=360))]
    positions: Option<u32>,

    /// Circle color as #RRGGBB
    #[arg(long)]
    circle_color: Option<String>,

    /// Background color as #RRGGBB
    #[arg(long)]
    background_color: Option<String>,

    /// Exit after this many seconds (runs until killed when omitted)
    #[arg(long)]
    duration: Option<u64>,
}

fn init_tracing() {
    let log_level =
        std::env::var("SPINNER_LOG").unwrap_or_else(|_| "info".to_string()).to_lowercase();

    let filter = match log_level.as_str() {
        "silent" | "error" => tracing::Level::ERROR,
        "warning" | "warn" => tracing::Level::WARN,
        "info" => tracing::Level::INFO,
        "debug" => tracing::Level::DEBUG,
        "verbose" | "trace" => tracing::Level::TRACE,
        _ => tracing::Level::INFO,
    };

    tracing_subscriber::fmt().with_max_level(filter).init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let file = config::load_config();

    // CLI flags override the config file
    let side = cli.side.unwrap_or(file.window.side_length).max(1);
    let x = cli.x.map(|v| v as i32).unwrap_or(file.window.x).max(0);
    let y = cli.y.map(|v| v as i32).unwrap_or(file.window.y).max(0);

    let spinner_config = SpinnerConfig {
        circle_color: parse_color(
            cli.circle_color.as_deref().unwrap_or(&file.spinner.circle_color),
        )?,
        background_color: parse_color(
            cli.background_color.as_deref().unwrap_or(&file.spinner.background_color),
        )?,
        position_count: cli
            .positions
            .map(|v| v as usize)
            .unwrap_or(file.spinner.position_count),
        frames_per_second: cli.fps.unwrap_or(file.spinner.frames_per_second),
    };

    let overlay_width = side + 2 * x as u32;
    let overlay_height = side + 2 * y as u32;

    let (mut app, conn, mut event_queue) = AppState::new()?;
    let qh = event_queue.handle();

    app.create_layer_surface(&qh, overlay_width, overlay_height);
    event_queue.roundtrip(&mut app).context("initial roundtrip failed")?;

    let configure_deadline = Instant::now() + Duration::from_secs(5);
    while !app.configured {
        event_queue.blocking_dispatch(&mut app).context("wayland dispatch failed")?;
        if Instant::now() > configure_deadline {
            warn!("compositor never configured the overlay, continuing anyway");
            break;
        }
    }

    // the parent holds a plain background frame; the spinner paints itself
    let parent = app.parent_surface().context("overlay surface missing")?.clone();
    let mut parent_buffer = ShmBuffer::new(app.shm(), &qh, overlay_width, overlay_height)?;
    parent_buffer.fill(spinner_config.background_color)?;
    parent.attach(Some(parent_buffer.wl_buffer()), 0, 0);
    parent.damage_buffer(0, 0, overlay_width as i32, overlay_height as i32);

    let mut spinner = ProgressIndicator::new(&app, &qh, &parent, spinner_config)?;
    spinner.set_position(x, y, side)?;
    spinner.start()?;
    spinner.paint()?;
    // subsurface position and stacking apply on the parent's commit
    parent.commit();
    conn.flush()?;

    info!(side, x, y, "spinner running");

    let started = Instant::now();
    loop {
        event_queue.dispatch_pending(&mut app).context("wayland dispatch failed")?;

        if app.context.is_none() {
            info!("overlay closed by the compositor");
            break;
        }

        if spinner.pump() {
            spinner.paint()?;
        }
        conn.flush()?;

        if let Some(secs) = cli.duration {
            if started.elapsed() >= Duration::from_secs(secs) {
                info!("run duration elapsed");
                break;
            }
        }

        std::thread::sleep(Duration::from_millis(5));
    }

    parent_buffer.destroy();
    Ok(())
}
