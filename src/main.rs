#![warn(clippy::all, rust_2018_idioms)]

use std::path::PathBuf;

use clap::Parser;
use detection_replay::config::ViewerConfig;
use detection_replay::frame_source::source_from_config;
use tracing::error;
use tracing::info;

/// Replays per-frame object detections on a 2D canvas.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// TOML configuration file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory or http(s) URL holding the frame records.
    #[arg(long)]
    base_path: Option<String>,

    /// Sequence name used to build record file names.
    #[arg(long)]
    sequence: Option<String>,

    #[arg(long)]
    start_frame: Option<u32>,

    #[arg(long)]
    end_frame: Option<u32>,

    /// Playback rate in frames per second.
    #[arg(long)]
    frame_rate: Option<f64>,
}

impl Args {
    fn into_config(self) -> Result<ViewerConfig, detection_replay::error::ConfigError> {
        let mut config = match &self.config {
            Some(path) => ViewerConfig::load(path)?,
            None => ViewerConfig::default(),
        };
        if let Some(base_path) = self.base_path {
            config.source.base_path = base_path;
        }
        if let Some(sequence) = self.sequence {
            config.source.sequence_name = sequence;
        }
        if let Some(start_frame) = self.start_frame {
            config.playback.start_frame = start_frame;
        }
        if let Some(end_frame) = self.end_frame {
            config.playback.end_frame = end_frame;
        }
        if let Some(frame_rate) = self.frame_rate {
            config.playback.frame_rate = frame_rate;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> eframe::Result<()> {
    #[cfg(feature = "logging")]
    let _guard = {
        use tracing_appender::rolling::Rotation;
        use tracing_subscriber::EnvFilter;
        use tracing_subscriber::Layer;
        use tracing_subscriber::fmt;
        use tracing_subscriber::fmt::time::LocalTime;
        use tracing_subscriber::prelude::*;

        let file_appender = tracing_appender::rolling::Builder::new()
            .rotation(Rotation::HOURLY)
            .max_log_files(1)
            .filename_prefix("detection_replay.log")
            .build(".")
            .expect("failed to build file appender");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = tracing_subscriber::registry()
            .with(fmt::Layer::new().pretty().with_ansi(true).with_filter(filter()))
            .with(
                fmt::Layer::new()
                    .with_writer(non_blocking)
                    .with_timer(LocalTime::rfc_3339())
                    .with_ansi(false)
                    .with_filter(filter()),
            );
        tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
        guard
    };

    let args = Args::parse();
    let config = match args.into_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {e}");
            return Err(eframe::Error::AppCreation(Box::new(e)));
        }
    };
    let registry = match config.registry() {
        Ok(registry) => registry,
        Err(e) => {
            error!("Invalid object types: {e}");
            return Err(eframe::Error::AppCreation(Box::new(e)));
        }
    };
    let source = match source_from_config(&config.source) {
        Ok(source) => source,
        Err(e) => {
            error!("Cannot open frame source: {e}");
            return Err(eframe::Error::AppCreation(Box::new(e)));
        }
    };
    info!(
        base_path = %config.source.base_path,
        sequence = %config.source.sequence_name,
        start = config.playback.start_frame,
        end = config.playback.end_frame,
        "Starting replay"
    );

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0])
            .with_title(format!("{} v{}", detection_replay::APP_NAME, env!("CARGO_PKG_VERSION"))),
        ..Default::default()
    };

    eframe::run_native(
        detection_replay::APP_NAME,
        native_options,
        Box::new(|cc| Ok(Box::new(detection_replay::ReplayViewerApp::new(cc, config, registry, source)))),
    )
}
