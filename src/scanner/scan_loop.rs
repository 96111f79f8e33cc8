// SPDX-License-Identifier: GPL-3.0-only

//! Refresh-driven scan loop for headless use

use super::controller::{ScanController, TickOutcome};
use super::types::{ScanResult, UiState};
use crate::errors::ScanError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Shared stop request, checked once per loop iteration
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// How a scan loop ended
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Found(ScanResult),
    Failed(ScanError),
    Cancelled,
}

/// Tick the controller once per refresh period until the scan settles
///
/// The cancel flag is checked at the top of every iteration; a decode already
/// running finishes first. Cancelling releases the camera before returning.
pub async fn run_until_settled(
    controller: &mut ScanController,
    refresh: Duration,
    cancel: &CancelFlag,
) -> ScanOutcome {
    let mut ticker = tokio::time::interval(refresh);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut ticks = 0u64;
    let mut misses = 0u64;

    loop {
        if cancel.is_cancelled() {
            info!(ticks, misses, "Scan cancelled");
            controller.cancel();
            return ScanOutcome::Cancelled;
        }
        if !controller.state().is_scanning() {
            break;
        }

        ticker.tick().await;
        ticks += 1;

        if controller.tick() == TickOutcome::Missed {
            misses += 1;
        }
    }

    debug!(ticks, misses, state = controller.state().name(), "Scan loop settled");

    match controller.state() {
        UiState::ResultShown(result) => ScanOutcome::Found(result.clone()),
        UiState::ErrorShown(err) => ScanOutcome::Failed(err.clone()),
        _ => ScanOutcome::Cancelled,
    }
}
