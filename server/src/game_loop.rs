//! Fixed-period scheduler that drives the simulation.

use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

/// Invokes a tick callback at a fixed wall-clock period until stopped.
///
/// Ticks never overlap: the callback runs to completion before the next
/// period is awaited. If a tick overruns its period, the following tick
/// starts immediately and later ticks are spaced a full period from it —
/// overruns are never compensated with a burst of catch-up ticks.
pub struct GameLoop {
    period: Duration,
    running: Arc<AtomicBool>,
}

/// Cloneable handle for stopping a [`GameLoop`] from another task.
#[derive(Clone)]
pub struct GameLoopHandle {
    running: Arc<AtomicBool>,
}

impl GameLoopHandle {
    /// Requests a stop. The in-flight tick, if any, completes; the callback
    /// is never invoked again afterwards.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl GameLoop {
    pub fn new(ms_per_frame: u64) -> Self {
        GameLoop {
            period: Duration::from_millis(ms_per_frame),
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn handle(&self) -> GameLoopHandle {
        GameLoopHandle {
            running: Arc::clone(&self.running),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Runs the loop, invoking `on_tick` once per period, until stopped.
    pub async fn run<F: FnMut()>(&self, mut on_tick: F) {
        let mut timer = interval(self.period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // A tokio interval fires immediately on its first tick.
        timer.tick().await;

        while self.running.load(Ordering::SeqCst) {
            on_tick();
            timer.tick().await;
        }

        info!("Game loop stopped");
    }
}
