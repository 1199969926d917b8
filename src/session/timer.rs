//! One-second tick schedulers for the countdown and elapsed clocks.
//!
//! Both are cooperative tokio tasks feeding ticks into the session event
//! queue. Dropping the handle aborts the task, so phase membership is the
//! cancellation scope: the runtime holds the timer for exactly as long as
//! the phase that expects its ticks, and a straggler tick that races the
//! drop is ignored by the state machine anyway.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use super::machine::SessionEvent;

const TICK: Duration = Duration::from_secs(1);

/// Emits one `CountdownTick` per second for a fixed count, then stops
/// itself. The tick that drives the count to 0 is the one the machine
/// consumes into the recording transition.
pub struct CountdownTimer {
    handle: JoinHandle<()>,
}

impl CountdownTimer {
    pub fn spawn(count: u32, events: UnboundedSender<SessionEvent>) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = interval(TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first interval tick completes immediately; the countdown
            // starts one full second after scheduling.
            ticker.tick().await;
            for _ in 0..count {
                ticker.tick().await;
                if events.send(SessionEvent::CountdownTick).is_err() {
                    break;
                }
            }
        });
        Self { handle }
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Emits one `ElapsedTick` per second indefinitely while recording.
/// Cancelled by dropping the handle when the stop transition runs.
pub struct ElapsedTimer {
    handle: JoinHandle<()>,
}

impl ElapsedTimer {
    pub fn spawn(events: UnboundedSender<SessionEvent>) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = interval(TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if events.send(SessionEvent::ElapsedTick).is_err() {
                    break;
                }
            }
        });
        Self { handle }
    }
}

impl Drop for ElapsedTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
