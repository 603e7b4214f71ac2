use anyhow::{ensure, Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::debug;

/// One animation frame is due.
pub struct Tick;

/// Periodic frame timer running on its own thread.
///
/// The thread never touches animation state; it only posts `Tick` messages
/// over the channel, and the UI thread drains them. Dropping the timer stops
/// the thread and joins it.
pub struct FrameTimer {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl FrameTimer {
    /// Spawns the timer at an interval of 1000 / `frames_per_second` ms.
    pub fn spawn(frames_per_second: u32) -> Result<(Self, Receiver<Tick>)> {
        ensure!(
            (1..=1000).contains(&frames_per_second),
            "frame rate {frames_per_second} outside 1..=1000"
        );
        let interval = Duration::from_millis(u64::from(1000 / frames_per_second));

        let stop = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel();

        let flag = stop.clone();
        let thread = std::thread::Builder::new()
            .name("spinner-frame-timer".into())
            .spawn(move || {
                let sleeper = spin_sleep::SpinSleeper::default();
                while !flag.load(Ordering::Relaxed) {
                    sleeper.sleep(interval);
                    if tx.send(Tick).is_err() {
                        break;
                    }
                }
                debug!("frame timer thread exiting");
            })
            .context("failed to spawn frame timer thread")?;

        Ok((Self { stop, thread: Some(thread) }, rx))
    }
}

impl Drop for FrameTimer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
