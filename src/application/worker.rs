//! Background worker for non-blocking attribution runs.
//!
//! Attribution is many re-scorings per request; running it on the caller's
//! thread would block cheap scoring traffic. The worker moves the sampling
//! to a dedicated thread and reports progress over a channel.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::application::explain::ExplainService;
use crate::domain::{AttributionEntry, PatientRecord};
use crate::ports::Classifier;

/// Progress updates from the attribution worker.
#[derive(Debug, Clone)]
pub enum ExplainProgress {
    /// Sampling started
    Sampling,
    /// Attribution complete with sorted entries
    Complete(Vec<AttributionEntry>),
    /// Error occurred during sampling
    Error(String),
}

/// Handle to a running attribution worker.
pub struct ExplainWorkerHandle {
    /// Receiver for progress updates
    pub progress_rx: Receiver<ExplainProgress>,
    /// Thread handle (for joining)
    _handle: JoinHandle<()>,
}

impl ExplainWorkerHandle {
    /// Try to receive the next progress update (non-blocking).
    #[must_use]
    pub fn try_recv(&self) -> Option<ExplainProgress> {
        self.progress_rx.try_recv().ok()
    }

    /// Block until the worker finishes, returning its terminal update.
    #[must_use]
    pub fn wait(self) -> Option<ExplainProgress> {
        let mut last = None;
        while let Ok(progress) = self.progress_rx.recv() {
            let terminal = matches!(
                progress,
                ExplainProgress::Complete(_) | ExplainProgress::Error(_)
            );
            last = Some(progress);
            if terminal {
                break;
            }
        }
        last
    }
}

/// Attribution worker that runs permutation sampling in background.
pub struct ExplainWorker;

impl ExplainWorker {
    /// Spawn a background attribution task.
    ///
    /// Returns a handle to receive progress updates.
    pub fn spawn<C>(service: Arc<ExplainService<C>>, record: PatientRecord) -> ExplainWorkerHandle
    where
        C: Classifier + 'static,
    {
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            Self::run_with_progress(service, record, tx);
        });

        ExplainWorkerHandle {
            progress_rx: rx,
            _handle: handle,
        }
    }

    fn run_with_progress<C>(
        service: Arc<ExplainService<C>>,
        record: PatientRecord,
        tx: Sender<ExplainProgress>,
    ) where
        C: Classifier + 'static,
    {
        let _ = tx.send(ExplainProgress::Sampling);

        match service.explain(&record) {
            Ok(entries) => {
                let _ = tx.send(ExplainProgress::Complete(entries));
            }
            Err(e) => {
                let _ = tx.send(ExplainProgress::Error(e.to_string()));
            }
        }
    }
}
