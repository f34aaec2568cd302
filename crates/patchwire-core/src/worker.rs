//! Background jobs with superseding.
//!
//! [`BackgroundJob`] runs closures on short-lived worker threads and returns
//! results over a channel. Every submission bumps a generation counter;
//! [`poll`](BackgroundJob::poll) never blocks and silently drops results
//! from older generations. Submitting again is therefore the cancellation
//! mechanism: the superseded job runs to completion but its result is
//! discarded.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use crossbeam_channel::{Receiver, Sender, unbounded};

/// Producer of superseding background results of type `T`.
pub struct BackgroundJob<T> {
    generation: Arc<AtomicU64>,
    tx: Sender<(u64, T)>,
    rx: Receiver<(u64, T)>,
}

impl<T: Send + 'static> BackgroundJob<T> {
    /// Creates a job slot with no work in flight.
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            generation: Arc::new(AtomicU64::new(0)),
            tx,
            rx,
        }
    }

    /// Current generation; zero before the first submission.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Runs `work` on a new thread named `name`, superseding earlier jobs.
    ///
    /// Returns the generation assigned to this job.
    pub fn submit<F>(&self, name: &str, work: F) -> std::io::Result<u64>
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let current = Arc::clone(&self.generation);
        let tx = self.tx.clone();
        thread::Builder::new().name(name.to_string()).spawn(move || {
            let result = work();
            if current.load(Ordering::Acquire) == generation {
                // The receiver lives as long as the job; a send error means it is gone.
                let _ = tx.send((generation, result));
            } else {
                tracing::debug!("background job {generation} superseded, discarding result");
            }
        })?;
        Ok(generation)
    }

    /// Supersedes any job in flight without starting a new one.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Returns the latest current-generation result, if one has landed.
    ///
    /// Never blocks.
    pub fn poll(&self) -> Option<T> {
        let current = self.generation();
        let mut latest = None;
        while let Ok((generation, result)) = self.rx.try_recv() {
            if generation == current {
                latest = Some(result);
            }
        }
        latest
    }

    /// Blocks until the current job's result lands. Test and offline use only.
    pub fn wait(&self) -> Option<T> {
        let current = self.generation();
        while let Ok((generation, result)) = self.rx.recv() {
            if generation == current {
                return Some(result);
            }
        }
        None
    }
}

impl<T: Send + 'static> Default for BackgroundJob<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_result_lands() {
        let job = BackgroundJob::new();
        let generation = job.submit("test-job", || 41 + 1).unwrap();
        assert_eq!(generation, 1);
        assert_eq!(job.wait(), Some(42));
        assert_eq!(job.poll(), None);
    }

    #[test]
    fn test_superseded_result_discarded() {
        let job = BackgroundJob::new();
        let (gate_tx, gate_rx) = crossbeam_channel::bounded::<()>(0);
        job.submit("slow", move || {
            let _ = gate_rx.recv_timeout(Duration::from_secs(5));
            "old"
        })
        .unwrap();
        job.submit("fast", || "new").unwrap();
        assert_eq!(job.wait(), Some("new"));
        let _ = gate_tx.send(());
        thread::sleep(Duration::from_millis(20));
        assert_eq!(job.poll(), None);
    }

    #[test]
    fn test_cancel() {
        let job = BackgroundJob::new();
        let (gate_tx, gate_rx) = crossbeam_channel::bounded::<()>(0);
        job.submit("cancelled", move || {
            let _ = gate_rx.recv_timeout(Duration::from_secs(5));
            1
        })
        .unwrap();
        job.cancel();
        let _ = gate_tx.send(());
        thread::sleep(Duration::from_millis(20));
        assert_eq!(job.poll(), None);
    }
}
