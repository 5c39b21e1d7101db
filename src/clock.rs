//! Frame clock: the periodic animation tick source
//!
//! The clock runs on its own named thread and delivers ticks through a
//! caller-supplied callback; the engine uses that callback to marshal the
//! tick onto its owning event loop, so the timer thread itself never touches
//! shared state. Cancellation is synchronous: stopping joins the timer
//! thread, so once `stop()` returns no tick from that clock can fire again.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use log::{debug, warn};

/// Tick interval used when configuration supplies a zero or invalid rate.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Owned token for one running periodic clock.
///
/// Dropping the handle signals the timer thread and waits for it to exit,
/// which is what makes a stop-then-start sequence race-free: the old clock
/// is provably dead before the new one is spawned.
struct TimerHandle {
    stop_tx: mpsc::Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        // The thread may already have observed a disconnect; both sends and
        // joins are best-effort here.
        let _ = self.stop_tx.send(());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Cancellable fixed-rate tick source.
///
/// At most one timer thread is live per clock: `start` always releases the
/// previous handle first. The first tick fires immediately, matching a
/// fixed-rate schedule with zero initial delay.
pub struct FrameClock {
    handle: Option<TimerHandle>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self { handle: None }
    }

    /// Begin ticking at `interval`, replacing any running clock. The
    /// previous clock is fully stopped before the new one starts. Intervals
    /// of zero fall back to [`DEFAULT_TICK_INTERVAL`].
    pub fn start<F>(&mut self, interval: Duration, on_tick: F)
    where
        F: Fn() + Send + 'static,
    {
        self.stop();

        let interval = if interval.is_zero() {
            warn!(
                "⏱️ Invalid tick interval, falling back to {:?}",
                DEFAULT_TICK_INTERVAL
            );
            DEFAULT_TICK_INTERVAL
        } else {
            interval
        };

        let (stop_tx, stop_rx) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("colorburst-clock".into())
            .spawn(move || loop {
                on_tick();
                match stop_rx.recv_timeout(interval) {
                    Err(mpsc::RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                }
            })
            .ok();

        if thread.is_none() {
            warn!("⏱️ Failed to spawn clock thread; animation will not tick");
            return;
        }

        debug!("⏱️ Frame clock started at {:?}", interval);
        self.handle = Some(TimerHandle { stop_tx, thread });
    }

    /// Cancel the running clock and wait for its thread to exit. Idempotent;
    /// safe to call from any lifecycle transition.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            drop(handle);
            debug!("⏱️ Frame clock stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for FrameClock {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_clock(interval: Duration) -> (FrameClock, Arc<AtomicUsize>) {
        let mut clock = FrameClock::new();
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        clock.start(interval, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (clock, ticks)
    }

    #[test]
    #[serial]
    fn ticks_at_roughly_the_configured_cadence() {
        let (mut clock, ticks) = counting_clock(Duration::from_millis(20));
        thread::sleep(Duration::from_millis(150));
        clock.stop();

        // Immediate first tick plus ~7 interval ticks; generous bounds to
        // tolerate scheduler jitter on loaded machines.
        let count = ticks.load(Ordering::SeqCst);
        assert!(count >= 3, "expected at least 3 ticks, got {count}");
        assert!(count <= 12, "expected at most 12 ticks, got {count}");
    }

    #[test]
    #[serial]
    fn no_ticks_after_stop() {
        let (mut clock, ticks) = counting_clock(Duration::from_millis(10));
        thread::sleep(Duration::from_millis(50));
        clock.stop();

        let frozen = ticks.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(60));
        assert_eq!(ticks.load(Ordering::SeqCst), frozen);
    }

    #[test]
    #[serial]
    fn restart_replaces_the_previous_clock() {
        let mut clock = FrameClock::new();
        let fast = Arc::new(AtomicUsize::new(0));
        let slow = Arc::new(AtomicUsize::new(0));

        let counter = fast.clone();
        clock.start(Duration::from_millis(5), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let counter = slow.clone();
        clock.start(Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        // The fast clock is confirmed dead by the time start() returned.
        let fast_frozen = fast.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(60));
        clock.stop();

        assert_eq!(fast.load(Ordering::SeqCst), fast_frozen);
        assert!(slow.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn stop_is_idempotent() {
        let mut clock = FrameClock::new();
        clock.stop();
        clock.stop();
        assert!(!clock.is_running());

        let (mut clock, _ticks) = counting_clock(Duration::from_millis(10));
        assert!(clock.is_running());
        clock.stop();
        clock.stop();
        assert!(!clock.is_running());
    }

    #[test]
    #[serial]
    fn zero_interval_falls_back_to_default() {
        let (mut clock, ticks) = counting_clock(Duration::ZERO);
        assert!(clock.is_running());

        // The immediate first tick proves the clock is alive at the
        // fallback interval rather than spinning.
        thread::sleep(Duration::from_millis(30));
        clock.stop();
        let count = ticks.load(Ordering::SeqCst);
        assert!(count >= 1);
        assert!(count <= 2, "fallback interval not applied, got {count} ticks");
    }
}
