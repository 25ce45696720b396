//! Process-wide shutdown flag shared by the event loop, the playlist driver
//! and the Ctrl-C handler.

use anyhow::{Context, Result, bail};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tracing::warn;

#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn check_cancelled(&self, stage: &'static str) -> Result<()> {
        if self.is_cancelled() {
            bail!("run cancelled during {stage}");
        }
        Ok(())
    }

    /// Cancel on Ctrl-C, then run `on_cancel` to wake whoever is waiting.
    pub fn cancel_on_ctrlc<F>(&self, on_cancel: F) -> Result<()>
    where
        F: Fn() + Send + 'static,
    {
        let token = self.clone();
        ctrlc::set_handler(move || {
            warn!("Interrupt received; shutting down");
            token.cancel();
            on_cancel();
        })
        .context("Failed to install Ctrl-C handler")
    }
}
