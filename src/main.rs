// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use qr_scanner::backends::camera::PipeWireCamera;
use qr_scanner::clipboard::SystemClipboard;
use qr_scanner::config::Config;
use qr_scanner::constants::app;
use qr_scanner::decoder::RqrrDecoder;
use qr_scanner::scanner::ScanController;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::info;

mod cli;

#[derive(Parser)]
#[command(name = "qr-scanner")]
#[command(about = "Scan QR codes from a camera or an image file")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    /// Camera device path to use (from 'qr-scanner list')
    #[arg(long, global = true)]
    camera: Option<String>,

    /// Scan loop refresh rate in Hz
    #[arg(long, global = true)]
    refresh_rate: Option<u32>,

    /// Keep --camera and --refresh-rate as the new defaults
    #[arg(long, global = true)]
    save_config: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List,

    /// Decode a QR code from an image file
    Decode {
        /// Image file to scan
        file: PathBuf,
    },

    /// Scan with the camera until a QR code is found
    Scan,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // The terminal UI owns the screen, so its logs go to a file
    init_logging(cli.command.is_none());

    let mut config = Config::load();
    if let Some(camera) = cli.camera {
        config.camera_path = Some(camera);
    }
    if let Some(rate) = cli.refresh_rate {
        config.refresh_rate_hz = rate;
    }
    if cli.save_config {
        let path = config.save()?;
        info!(path = %path.display(), "Saved config");
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match cli.command {
        None => {
            runtime.block_on(qr_scanner::terminal::run(
                build_controller(&config),
                config.refresh_period(),
            ))?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::List) => cli::list_cameras(&config),
        Some(Commands::Decode { file }) => cli::decode_file(&config, &file),
        Some(Commands::Scan) => runtime.block_on(cli::scan_camera(&config)),
    }
}

/// Controller wired to the system camera, decoder and clipboard
pub(crate) fn build_controller(config: &Config) -> ScanController {
    ScanController::new(
        Box::new(PipeWireCamera::new()),
        Box::new(RqrrDecoder::with_max_dimension(config.max_decode_dimension)),
        Box::new(SystemClipboard::new()),
    )
    .with_constraints(config.capture_constraints())
}

fn init_logging(to_file: bool) {
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=qr_scanner=debug, RUST_LOG=info
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    if !to_file {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .init();
        return;
    }

    match open_log_file() {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(true)
            .with_level(true)
            .init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::sink)
            .init(),
    }
}

fn open_log_file() -> Option<std::fs::File> {
    let dir = dirs::cache_dir()?.join(app::DIR_NAME);
    std::fs::create_dir_all(&dir).ok()?;
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(app::LOG_FILE))
        .ok()
}
