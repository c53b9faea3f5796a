use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use humantime::format_duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use flipbook::config::Configuration;
use flipbook::events::{ScrollPosition, WheelGesture};
use flipbook::gallery::GalleryContext;
use flipbook::probe::{DirectorySource, ImageSource};
use flipbook::surface::{LogSurface, Surface};
use flipbook::tasks::{loop_gallery, one_shot_gallery, scroll_gallery, sticky};

#[derive(Debug, Parser)]
#[command(
    name = "flipbook",
    version,
    about = "headless scroll, loop and one-shot image galleries"
)]
struct Args {
    /// Path to YAML config
    #[arg(value_name = "CONFIG", default_value = "flipbook.yaml")]
    config: PathBuf,
    /// Resolve image references against this directory instead of `image-root`
    #[arg(long = "image-root", value_name = "DIR")]
    image_root: Option<PathBuf>,
    /// Print each gallery's discovered sequence and exit
    #[arg(long = "probe-only")]
    probe_only: bool,
}

/// One line of simulated page input read from stdin.
#[derive(Debug, PartialEq)]
enum InputCommand {
    Wheel(f64),
    Visible(f32),
    Scroll(ScrollPosition),
}

fn parse_command(line: &str) -> Result<Option<InputCommand>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let mut number = |name: &str| -> Result<f64> {
        words
            .next()
            .with_context(|| format!("{verb}: missing {name}"))?
            .parse::<f64>()
            .with_context(|| format!("{verb}: {name} is not a number"))
    };
    let command = match verb {
        "wheel" => InputCommand::Wheel(number("delta")?),
        "visible" => InputCommand::Visible(number("ratio")? as f32),
        "scroll" => InputCommand::Scroll(ScrollPosition {
            trigger_top: number("top")?,
            viewport_height: number("height")?,
        }),
        other => bail!("unknown command {other:?} (expected wheel, visible or scroll)"),
    };
    Ok(Some(command))
}

#[tokio::main]
async fn main() -> Result<()> {
    // init tracing (RUST_LOG controls level, default = info)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let Args {
        config,
        image_root,
        probe_only,
    } = Args::parse();

    let mut cfg = if config.exists() {
        Configuration::from_yaml_file(&config)
            .with_context(|| format!("failed to load configuration from {}", config.display()))?
    } else {
        tracing::info!("{} not found; using defaults", config.display());
        Configuration::default()
    };
    if let Some(root) = image_root {
        cfg.image_root = root;
    }
    let cfg = cfg.validated().context("invalid configuration values")?;
    tracing::info!(
        root = %cfg.image_root.display(),
        frame_period = %format_duration(cfg.frame_period),
        "configuration loaded"
    );

    let source: Arc<dyn ImageSource> = Arc::new(DirectorySource::new(&cfg.image_root));

    if probe_only {
        return run_probe_only(&cfg, source).await;
    }

    let scroll_surface: Arc<dyn Surface> = Arc::new(LogSurface::new("scroll"));
    let loop_surface: Arc<dyn Surface> = Arc::new(LogSurface::new("loop"));
    let one_shot_surface: Arc<dyn Surface> = Arc::new(LogSurface::new("one-shot"));

    let (wheel_tx, wheel_rx) = mpsc::channel::<WheelGesture>(32);
    let (visibility_tx, visibility_rx) = watch::channel(0.0_f32);
    let (scroll_tx, scroll_rx) = watch::channel(ScrollPosition::default());

    let cancel = CancellationToken::new();

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            tracing::info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    let mut tasks = JoinSet::new();

    tasks.spawn({
        let cfg = cfg.scroll_gallery.clone();
        let ctx = GalleryContext::new(Arc::clone(&source), Arc::clone(&scroll_surface));
        let cancel = cancel.clone();
        async move {
            scroll_gallery::run(cfg, ctx, wheel_rx, cancel)
                .await
                .context("scroll gallery task failed")
        }
    });

    tasks.spawn({
        let frame_period = cfg.frame_period;
        let cfg = cfg.loop_gallery.clone();
        let ctx = GalleryContext::new(Arc::clone(&source), loop_surface);
        let cancel = cancel.clone();
        async move {
            loop_gallery::run(cfg, frame_period, ctx, cancel)
                .await
                .context("loop gallery task failed")
        }
    });

    tasks.spawn({
        let frame_period = cfg.frame_period;
        let cfg = cfg.one_shot_gallery.clone();
        let ctx = GalleryContext::new(Arc::clone(&source), one_shot_surface);
        let cancel = cancel.clone();
        async move {
            one_shot_gallery::run(cfg, frame_period, ctx, visibility_rx, cancel)
                .await
                .context("one-shot gallery task failed")
        }
    });

    tasks.spawn({
        let cancel = cancel.clone();
        async move {
            sticky::run(scroll_surface, scroll_rx, cancel)
                .await
                .context("sticky coordinator task failed")
        }
    });

    // Stdin drives the simulated page. EOF only shuts down an interactive session.
    tasks.spawn({
        let cancel = cancel.clone();
        let inputs = PageInputs {
            wheel: wheel_tx,
            visibility: visibility_tx,
            scroll: scroll_tx,
        };
        let shutdown_on_eof = io::stdin().is_terminal();
        async move {
            drive_input(tokio::io::stdin(), inputs, shutdown_on_eof, cancel)
                .await
                .context("stdin input task failed")
        }
    });

    while let Some(res) = tasks.join_next().await {
        match res {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::error!("{err:?}");
                cancel.cancel();
            }
            Err(err) => {
                tracing::error!("task join error: {err}");
                cancel.cancel();
            }
        }
    }
    Ok(())
}

/// Senders the simulated page feeds.
struct PageInputs {
    wheel: mpsc::Sender<WheelGesture>,     // Input -> ScrollGallery
    visibility: watch::Sender<f32>,        // Input -> OneShotGallery
    scroll: watch::Sender<ScrollPosition>, // Input -> Sticky
}

/// Forwards input commands read from `reader` to the galleries.
///
/// At EOF the session is cancelled when `shutdown_on_eof` is set; otherwise
/// the senders stay open until cancellation so the galleries keep running.
async fn drive_input<R>(
    reader: R,
    inputs: PageInputs,
    shutdown_on_eof: bool,
    cancel: CancellationToken,
) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            line = lines.next_line() => line.context("reading stdin")?,
        };
        let Some(line) = line else {
            break;
        };
        match parse_command(&line) {
            Ok(Some(InputCommand::Wheel(delta_y))) => {
                let (gesture, reply) = WheelGesture::with_reply(delta_y);
                if inputs.wheel.send(gesture).await.is_err() {
                    tracing::warn!("scroll gallery is gone; dropping wheel input");
                    continue;
                }
                if let Ok(disposition) = reply.await {
                    tracing::info!(delta_y, ?disposition, "wheel");
                }
            }
            Ok(Some(InputCommand::Visible(ratio))) => {
                let _ = inputs.visibility.send(ratio);
            }
            Ok(Some(InputCommand::Scroll(position))) => {
                let _ = inputs.scroll.send(position);
            }
            Ok(None) => {}
            Err(err) => tracing::warn!("{err:#}"),
        }
    }

    if shutdown_on_eof {
        tracing::info!("stdin closed; initiating shutdown");
        cancel.cancel();
    } else {
        tracing::debug!("stdin closed; galleries keep running until ctrl-c");
        cancel.cancelled().await;
    }
    Ok(())
}

async fn run_probe_only(cfg: &Configuration, source: Arc<dyn ImageSource>) -> Result<()> {
    let surface: Arc<dyn Surface> = Arc::new(LogSurface::new("probe"));
    let ctx = GalleryContext::new(source, surface);
    for prefix in [
        &cfg.scroll_gallery.prefix,
        &cfg.loop_gallery.prefix,
        &cfg.one_shot_gallery.prefix,
    ] {
        let sequence = ctx.discover(prefix).await;
        println!("{prefix}: {} image(s)", sequence.len());
        for reference in sequence.iter() {
            println!("  {reference}");
        }
    }
    Ok(())
}
