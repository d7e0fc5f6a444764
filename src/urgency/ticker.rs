use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::clock::Clock;
use crate::urgency::{Countdown, countdown};

pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// Shortest period [`CountdownTicker::with_period`] will tick at.
pub const MIN_TICK: Duration = Duration::from_millis(1);

/// Live countdown for one visible deadline.
///
/// Re-evaluates the urgency and remaining-time label once per tick and
/// publishes the latest value. The periodic task ends on [`stop`] or when the
/// ticker is dropped.
///
/// [`stop`]: CountdownTicker::stop
pub struct CountdownTicker {
    rx: watch::Receiver<Countdown>,
    task: Option<JoinHandle<()>>,
}

impl CountdownTicker {
    /// Starts ticking every [`DEFAULT_TICK`]. Must be called inside a tokio runtime.
    pub fn start(due_date: DateTime<Utc>, clock: Arc<dyn Clock>) -> Self {
        Self::with_period(due_date, clock, DEFAULT_TICK)
    }

    /// Starts ticking every `period`. A period below [`MIN_TICK`] (including
    /// zero) is raised to [`MIN_TICK`], since the interval timer cannot run at
    /// a zero period.
    pub fn with_period(due_date: DateTime<Utc>, clock: Arc<dyn Clock>, period: Duration) -> Self {
        let period = period.max(MIN_TICK);
        let (tx, rx) = watch::channel(countdown(due_date, clock.now()));

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;

                let next = countdown(due_date, clock.now());
                // only wake subscribers when the label or level moved
                tx.send_if_modified(|current| {
                    if *current == next {
                        false
                    } else {
                        *current = next;
                        true
                    }
                });
            }
        });

        Self {
            rx,
            task: Some(task),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Countdown> {
        self.rx.clone()
    }

    pub fn current(&self) -> Countdown {
        self.rx.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Cancels the periodic task and waits for it to wind down.
    pub async fn stop(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for CountdownTicker {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
