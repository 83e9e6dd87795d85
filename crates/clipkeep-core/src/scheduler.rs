use crate::engine::{PassSummary, RetentionEngine};
use crate::error::Error;
use crate::progress::ProgressReporter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info};

enum Signal {
    Trigger,
    Shutdown,
}

/// Runs eviction passes on a dedicated thread: once at start, then on every
/// interval tick or external trigger. Triggers that pile up while a pass is
/// running collapse into a single follow-up pass.
pub struct Scheduler;

pub struct SchedulerHandle {
    tx: Sender<Signal>,
    cancel_token: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl Scheduler {
    pub fn spawn(
        engine: Arc<RetentionEngine>,
        interval: Duration,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Result<SchedulerHandle, Error> {
        Self::spawn_with(engine, interval, reporter, |_| {})
    }

    /// Like [`Scheduler::spawn`], calling `on_pass` with each completed summary.
    pub fn spawn_with<F>(
        engine: Arc<RetentionEngine>,
        interval: Duration,
        reporter: Arc<dyn ProgressReporter>,
        on_pass: F,
    ) -> Result<SchedulerHandle, Error>
    where
        F: Fn(&PassSummary) + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Signal>();
        let cancel_token = engine.cancel_token();

        let worker = thread::Builder::new()
            .name("clipkeep-retention".to_string())
            .spawn(move || {
                info!("Retention scheduler started, interval {:?}", interval);
                loop {
                    match engine.run_pass(reporter.as_ref()) {
                        Ok(summary) => on_pass(&summary),
                        Err(Error::Cancelled) => break,
                        Err(Error::PassInProgress) => debug!("Pass already running, skipping"),
                        Err(e) => error!("Retention pass failed: {}", e),
                    }

                    if !wait_for_next(&rx, interval) {
                        break;
                    }
                }
                info!("Retention scheduler stopped");
            })?;

        Ok(SchedulerHandle {
            tx,
            cancel_token,
            worker: Some(worker),
        })
    }
}

/// Block until the next pass is due. Returns false on shutdown.
fn wait_for_next(rx: &mpsc::Receiver<Signal>, interval: Duration) -> bool {
    match rx.recv_timeout(interval) {
        Ok(Signal::Trigger) | Err(RecvTimeoutError::Timeout) => {}
        Ok(Signal::Shutdown) | Err(RecvTimeoutError::Disconnected) => return false,
    }
    // Coalesce triggers that arrived meanwhile, without swallowing a shutdown.
    loop {
        match rx.try_recv() {
            Ok(Signal::Trigger) => continue,
            Ok(Signal::Shutdown) | Err(TryRecvError::Disconnected) => return false,
            Err(TryRecvError::Empty) => return true,
        }
    }
}

impl SchedulerHandle {
    /// Ask for a pass now, e.g. on a disk-pressure alert. Returns false if the
    /// scheduler has already stopped.
    pub fn trigger(&self) -> bool {
        self.tx.send(Signal::Trigger).is_ok()
    }

    /// Cancel any running pass between files and wait for the worker to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.cancel_token.store(true, Ordering::SeqCst);
        let _ = self.tx.send(Signal::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Retention scheduler thread panicked");
            }
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
