// SPDX-License-Identifier: GPL-3.0-only

//! Headless commands
//!
//! - Listing available cameras
//! - Decoding an image file
//! - Scanning with the camera until a code is found

use crate::build_controller;
use qr_scanner::config::Config;
use qr_scanner::errors::ScanError;
use qr_scanner::file_input::SelectedFile;
use qr_scanner::scanner::{CancelFlag, ScanOutcome, UiState, run_until_settled};
use std::path::Path;
use std::process::ExitCode;
use tracing::info;

/// Exit code for a scan stopped with Ctrl+C
const EXIT_CANCELLED: u8 = 130;

/// List all available cameras, marking the one a scan would open
pub fn list_cameras(config: &Config) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut controller = build_controller(config);
    let cameras = controller.cameras();

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(ExitCode::SUCCESS);
    }

    let preferred = controller
        .constraints()
        .select(&cameras)
        .map(|device| device.path.clone());

    println!("Available cameras:");
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        let marker = if preferred.as_deref() == Some(camera.path.as_str()) {
            '*'
        } else {
            ' '
        };
        println!("{} [{}] {}", marker, index, camera.name);
        println!("      Location: {}  Path: {}", camera.location, camera.path);
    }
    println!();
    println!("* preferred for facing '{}'", config.facing);

    Ok(ExitCode::SUCCESS)
}

/// Decode one image file and print the text
pub fn decode_file(config: &Config, path: &Path) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut controller = build_controller(config);

    if controller.process_file(SelectedFile::from_path(path)).is_ok() {
        controller.tick();
    }

    Ok(match controller.state() {
        UiState::ResultShown(result) => {
            println!("{}", result.text);
            ExitCode::SUCCESS
        }
        UiState::ErrorShown(err) => report_error(err),
        other => {
            eprintln!("Unexpected scanner state: {}", other.name());
            ExitCode::FAILURE
        }
    })
}

/// Scan with the camera until a code is found or Ctrl+C is pressed
pub async fn scan_camera(config: &Config) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut controller = build_controller(config);

    if let Err(err) = controller.start_camera() {
        return Ok(report_error(&err));
    }
    eprintln!("Scanning... point the camera at a QR code (Ctrl+C to stop)");

    let cancel = CancelFlag::new();
    let signal_flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received");
            signal_flag.cancel();
        }
    });

    Ok(
        match run_until_settled(&mut controller, config.refresh_period(), &cancel).await {
            ScanOutcome::Found(result) => {
                println!("{}", result.text);
                ExitCode::SUCCESS
            }
            ScanOutcome::Failed(err) => report_error(&err),
            ScanOutcome::Cancelled => {
                eprintln!("Scan cancelled");
                ExitCode::from(EXIT_CANCELLED)
            }
        },
    )
}

fn report_error(err: &ScanError) -> ExitCode {
    eprintln!("{}", err.user_message());
    eprintln!("  {}", err);
    ExitCode::FAILURE
}
