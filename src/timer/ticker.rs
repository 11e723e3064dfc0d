//! Cancellable repeating display refresh.
//!
//! The tracker never polls. A presentation layer that wants a live clock owns a
//! `DisplayTicker` and reads the derived elapsed time from inside `on_tick`.
//! The callback must only read state.

use std::time::Duration;

use log::debug;
use tokio::{
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::settings::TrackerSettings;

pub struct DisplayTicker {
    interval: Duration,
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl DisplayTicker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            handle: None,
            cancel_token: None,
        }
    }

    /// Ticker running at the configured display refresh interval.
    pub fn from_settings(settings: &TrackerSettings) -> Self {
        Self::new(settings.tick_interval())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start ticking, replacing any previously scheduled ticker so that at
    /// most one is ever active. Fires once immediately, then every interval.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<F>(&mut self, mut on_tick: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.cancel();

        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();
        let period = self.interval;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    _ = token_clone.cancelled() => break,
                    _ = interval.tick() => on_tick(),
                }
            }
        });

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        debug!("Display ticker started ({}ms)", period.as_millis());
    }

    pub fn cancel(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("Display ticker cancelled");
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for DisplayTicker {
    fn drop(&mut self) {
        self.cancel();
    }
}
