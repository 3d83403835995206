//! A sliding-window request throttle.
use std::{collections::VecDeque, time::Duration};

use tokio::time::{sleep_until, Instant};
use tracing::trace;

const WINDOW: Duration = Duration::from_secs(1);

/// Allows at most `limit` dispatches in any rolling one-second window.
#[derive(Debug)]
pub(crate) struct Throttle {
    limit: usize,
    dispatched: VecDeque<Instant>,
}

impl Throttle {
    /// A limit of `0` disables throttling.
    pub(crate) fn new(requests_per_second: u32) -> Self {
        let limit = requests_per_second as usize;
        Self {
            limit,
            dispatched: VecDeque::with_capacity(limit),
        }
    }

    /// Wait until another request may be dispatched, and record its dispatch.
    pub(crate) async fn acquire(&mut self) {
        if self.limit == 0 {
            return;
        }
        let now = Instant::now();
        while self
            .dispatched
            .front()
            .is_some_and(|oldest| now.duration_since(*oldest) >= WINDOW)
        {
            self.dispatched.pop_front();
        }
        if self.dispatched.len() >= self.limit {
            if let Some(oldest) = self.dispatched.pop_front() {
                let until = oldest + WINDOW;
                trace!(wait_ms = until.saturating_duration_since(now).as_millis() as u64, "Throttling request");
                sleep_until(until).await;
            }
        }
        self.dispatched.push_back(Instant::now());
    }
}
