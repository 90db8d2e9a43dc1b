//! Frame scheduling - what decides when the next iteration runs
//!
//! The loop never calls a timer or vsync primitive directly. It awaits a
//! [`FrameScheduler`], which the host backs with whatever per-frame signal
//! it has.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{interval, Interval, MissedTickBehavior};

/// Source of "draw the next frame now" signals
#[async_trait]
pub trait FrameScheduler: Send {
    /// Wait for the next frame signal. `false` once the host stops signalling.
    async fn next_frame(&mut self) -> bool;
}

/// Fixed-rate scheduler. Late ticks are skipped, never bunched.
pub struct IntervalScheduler {
    interval: Interval,
}

impl IntervalScheduler {
    pub fn new(period: Duration) -> Self {
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        IntervalScheduler { interval }
    }
}

#[async_trait]
impl FrameScheduler for IntervalScheduler {
    async fn next_frame(&mut self) -> bool {
        self.interval.tick().await;
        true
    }
}

/// Ticks pushed by the host (vsync callback, test harness)
pub struct ChannelScheduler {
    rx: mpsc::Receiver<()>,
}

/// Host-side handle for a [`ChannelScheduler`]
#[derive(Clone)]
pub struct FrameTicker {
    tx: mpsc::Sender<()>,
}

impl ChannelScheduler {
    pub fn new(buffer: usize) -> (FrameTicker, ChannelScheduler) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (FrameTicker { tx }, ChannelScheduler { rx })
    }
}

#[async_trait]
impl FrameScheduler for ChannelScheduler {
    async fn next_frame(&mut self) -> bool {
        self.rx.recv().await.is_some()
    }
}

impl FrameTicker {
    /// Signal one frame. `false` if the scheduler is gone.
    pub async fn tick(&self) -> bool {
        self.tx.send(()).await.is_ok()
    }

    /// Signal one frame without waiting. `false` if full or closed.
    pub fn try_tick(&self) -> bool {
        self.tx.try_send(()).is_ok()
    }
}

/// Stops after a fixed number of frames
pub struct BoundedScheduler<S> {
    inner: S,
    remaining: u64,
}

impl<S: FrameScheduler> BoundedScheduler<S> {
    pub fn new(inner: S, frames: u64) -> Self {
        BoundedScheduler {
            inner,
            remaining: frames,
        }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

#[async_trait]
impl<S: FrameScheduler> FrameScheduler for BoundedScheduler<S> {
    async fn next_frame(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        if !self.inner.next_frame().await {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

/// Drive a [`FrameTicker`] from a background tokio task at a fixed rate.
/// The task ends when the scheduler side is dropped.
pub fn spawn_ticker(period: Duration, buffer: usize) -> ChannelScheduler {
    let (ticker, scheduler) = ChannelScheduler::new(buffer);

    tokio::spawn(async move {
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            if !ticker.tick().await {
                break; // Scheduler dropped
            }
        }
        tracing::debug!("Frame ticker stopped");
    });

    scheduler
}
