// src/metrics.rs

//! Resource sampling for the runtime child process.
//!
//! Peak RSS is sampled with `sysinfo` while the child runs. It only feeds log
//! events; it never reaches the output document. Sampling is best-effort:
//! short spikes between samples are missed and an uninspectable PID yields
//! `None`.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};
use std::thread;
use std::time::Duration;

use sysinfo::{Pid, System};

/// Interval between RSS samples.
pub const SAMPLE_EVERY: Duration = Duration::from_millis(20);

/// Samples the peak resident set size of one process on a helper thread.
pub struct MemoryTracker {
    stop: Arc<AtomicBool>,
    peak_kb: Arc<AtomicU64>,
    handle: Option<thread::JoinHandle<()>>,
}

impl MemoryTracker {
    pub fn start(pid: u32, sample_every: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let peak_kb = Arc::new(AtomicU64::new(0));

        let handle = {
            let stop = Arc::clone(&stop);
            let peak_kb = Arc::clone(&peak_kb);
            thread::spawn(move || {
                let pid = Pid::from_u32(pid);
                let mut system = System::new();

                while !stop.load(Ordering::Relaxed) {
                    if !system.refresh_process(pid) {
                        break;
                    }
                    let Some(process) = system.process(pid) else {
                        break;
                    };
                    peak_kb.fetch_max(process.memory() / 1024, Ordering::Relaxed);
                    thread::sleep(sample_every);
                }
            })
        };

        Self {
            stop,
            peak_kb,
            handle: Some(handle),
        }
    }

    /// Stop sampling and return the peak RSS in KB, if any sample was taken.
    pub fn stop_and_take(mut self) -> Option<u64> {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        match self.peak_kb.load(Ordering::Relaxed) {
            0 => None,
            kb => Some(kb),
        }
    }
}
