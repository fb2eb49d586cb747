//! Background loader for dashboard snapshots.
//!
//! Warehouse reads can be slow; the loader runs them off the UI thread and
//! reports back over a channel so the TUI keeps redrawing.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::application::{ComparisonService, DashboardSnapshot};
use crate::domain::MetricChoice;
use crate::ports::CohortSource;

/// Progress updates from the loader.
#[derive(Debug, Clone)]
pub enum LoadProgress {
    /// Query submitted to the source
    Loading,
    /// Snapshot computed
    Complete(Box<DashboardSnapshot>),
    /// Load failed; nothing partial is delivered
    Error(String),
}

/// Handle to a running load.
pub struct LoadWorkerHandle {
    /// Metric the load was started for
    pub metric: MetricChoice,
    progress_rx: Receiver<LoadProgress>,
    _handle: JoinHandle<()>,
}

impl LoadWorkerHandle {
    /// Try to receive the next progress update (non-blocking).
    ///
    /// A worker that went away without reporting a result (it panicked)
    /// shows up as [`LoadProgress::Error`].
    #[must_use]
    pub fn try_recv(&self) -> Option<LoadProgress> {
        match self.progress_rx.try_recv() {
            Ok(progress) => Some(progress),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                tracing::error!("Load worker for {} exited without a result", self.metric.label());
                Some(LoadProgress::Error(
                    "Dashboard load stopped unexpectedly".to_string(),
                ))
            }
        }
    }
}

/// Loader that computes a snapshot in the background.
pub struct LoadWorker;

impl LoadWorker {
    /// Spawn a background load for `metric`.
    pub fn spawn<S>(service: Arc<ComparisonService<S>>, metric: MetricChoice) -> LoadWorkerHandle
    where
        S: CohortSource + 'static,
    {
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            Self::run_load(&service, metric, &tx);
        });

        LoadWorkerHandle {
            metric,
            progress_rx: rx,
            _handle: handle,
        }
    }

    fn run_load<S>(service: &ComparisonService<S>, metric: MetricChoice, tx: &Sender<LoadProgress>)
    where
        S: CohortSource,
    {
        let _ = tx.send(LoadProgress::Loading);

        match service.load_snapshot(metric) {
            Ok(snapshot) => {
                let _ = tx.send(LoadProgress::Complete(Box::new(snapshot)));
            }
            Err(e) => {
                tracing::error!("Dashboard load failed: {}", e);
                let _ = tx.send(LoadProgress::Error(e.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryCohort;
    use crate::domain::PatientRecord;
    use crate::ports::ExecutionMode;
    use std::time::{Duration, Instant};

    fn wait_for_result(handle: &LoadWorkerHandle) -> LoadProgress {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            match handle.try_recv() {
                Some(LoadProgress::Loading) => {}
                Some(done) => return done,
                None => {
                    assert!(Instant::now() < deadline, "Loader timed out");
                    thread::sleep(Duration::from_millis(5));
                }
            }
        }
    }

    #[test]
    fn test_worker_delivers_snapshot() {
        let source = MemoryCohort::new(vec![
            PatientRecord::new(60.0, 0, 0, 1.0, 140.0),
            PatientRecord::new(80.0, 1, 0, 2.0, 130.0),
        ]);
        let service = Arc::new(ComparisonService::new(Arc::new(source), ExecutionMode::Eager));

        let handle = LoadWorker::spawn(service, MetricChoice::SerumSodium);
        assert_eq!(handle.metric, MetricChoice::SerumSodium);

        match wait_for_result(&handle) {
            LoadProgress::Complete(snapshot) => {
                assert_eq!(snapshot.metrics.total_patients, 2);
                assert_eq!(snapshot.distribution.metric, MetricChoice::SerumSodium);
            }
            other => panic!("Unexpected progress: {other:?}"),
        }
    }

    /// Source whose reads panic, taking the worker thread down.
    struct PanickingCohort;

    impl CohortSource for PanickingCohort {
        type Error = std::convert::Infallible;

        fn describe(&self) -> String {
            "panicking".to_string()
        }

        fn materialize(&self) -> Result<Vec<PatientRecord>, Self::Error> {
            panic!("connection dropped mid-read");
        }
    }

    #[test]
    fn test_worker_panic_reported_as_error() {
        let service = Arc::new(ComparisonService::new(
            Arc::new(PanickingCohort),
            ExecutionMode::Eager,
        ));

        let handle = LoadWorker::spawn(service, MetricChoice::Age);
        match wait_for_result(&handle) {
            LoadProgress::Error(message) => assert!(message.contains("stopped unexpectedly")),
            other => panic!("Unexpected progress: {other:?}"),
        }
    }

    #[test]
    fn test_worker_reports_error() {
        let service = Arc::new(ComparisonService::new(
            Arc::new(MemoryCohort::default()),
            ExecutionMode::Eager,
        ));

        let handle = LoadWorker::spawn(service, MetricChoice::Age);
        assert!(matches!(wait_for_result(&handle), LoadProgress::Error(_)));
    }
}
