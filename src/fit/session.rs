//! Background fit sessions.
//!
//! A session owns a worker thread running the search and a channel the
//! host drains for progress. Cancellation is cooperative: the host raises
//! a shared flag and the worker notices it at the next outer iteration,
//! so the final event still carries the best point found.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;

use crate::data::ObservedData;
use crate::error::{Result, WellTestError};
use crate::fit::config::FitConfig;
use crate::fit::optimizer::{FitOutcome, FitSnapshot, LevenbergMarquardt};
use crate::model::ForwardModel;
use crate::parameters::FitParameter;

/// Progress stream of a running session.
#[derive(Debug)]
pub enum FitEvent {
    /// An accepted step (or the final high-accuracy evaluation).
    Iteration(FitSnapshot),
    /// The search finished; always the last event sent.
    Finished(Result<FitOutcome>),
}

/// A fit running on its own thread.
pub struct FitSession {
    stop: Arc<AtomicBool>,
    events: Receiver<FitEvent>,
    handle: Option<JoinHandle<()>>,
}

impl FitSession {
    /// Start a search in the background with the given inputs.
    pub fn spawn(
        model: ForwardModel,
        table: Vec<FitParameter>,
        observed: ObservedData,
        config: FitConfig,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel();
        let flag = Arc::clone(&stop);
        let handle = std::thread::spawn(move || {
            run_worker(model, table, observed, config, flag, tx);
        });
        Self {
            stop,
            events: rx,
            handle: Some(handle),
        }
    }

    /// Ask the worker to stop at the next outer iteration.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// The event stream. Iterate (or `try_recv`) to drive a UI; the
    /// stream ends after [`FitEvent::Finished`].
    pub fn events(&self) -> &Receiver<FitEvent> {
        &self.events
    }

    /// Drain remaining events and return the final outcome.
    pub fn wait(mut self) -> Result<FitOutcome> {
        let mut outcome = None;
        for event in self.events.iter() {
            if let FitEvent::Finished(result) = event {
                outcome = Some(result);
            }
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                return Err(WellTestError::Other("fit worker panicked".to_string()));
            }
        }
        outcome.unwrap_or_else(|| {
            Err(WellTestError::Other(
                "fit worker ended without a result".to_string(),
            ))
        })
    }
}

impl Drop for FitSession {
    fn drop(&mut self) {
        // A dropped session must not leave the worker grinding.
        self.stop.store(true, Ordering::Relaxed);
    }
}

fn run_worker(
    model: ForwardModel,
    table: Vec<FitParameter>,
    observed: ObservedData,
    config: FitConfig,
    stop: Arc<AtomicBool>,
    tx: Sender<FitEvent>,
) {
    let search = LevenbergMarquardt::new(config);
    let progress = tx.clone();
    let result = search.fit(&model, &table, &observed, &stop, |snapshot| {
        // A host that has gone away just stops listening.
        let _ = progress.send(FitEvent::Iteration(snapshot));
    });
    let _ = tx.send(FitEvent::Finished(result));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelVariant, OuterBoundary, StorageModel};

    fn quick_inputs() -> (ForwardModel, Vec<FitParameter>, ObservedData) {
        let variant = ModelVariant::new(OuterBoundary::Infinite, StorageModel::Constant);
        let model = ForwardModel::new(variant);
        let mut table = variant.default_parameters();
        for p in table.iter_mut() {
            match p.name.as_str() {
                "nf" => p.value = 1.0,
                "gamaD" => p.value = 0.0,
                _ => {}
            }
        }
        let params = crate::parameters::ParameterSet::from_parameters(&table);
        let time: Vec<f64> = (0..8).map(|i| 10f64.powf(-1.0 + 0.4 * i as f64)).collect();
        let curve = model
            .evaluate(&params, &time, crate::model::Precision::Fast)
            .unwrap();
        let observed = ObservedData::new(
            time.clone(),
            curve.pressure.clone(),
            time,
            curve.derivative,
        )
        .unwrap();
        (model, table, observed)
    }

    #[test]
    fn test_session_finishes_and_reports_outcome() {
        let (model, table, observed) = quick_inputs();
        // Nothing varies, so the session converges on the spot.
        let session = FitSession::spawn(model, table, observed, FitConfig::default());
        let outcome = session.wait().unwrap();
        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.stop_reason, crate::fit::StopReason::Converged);
    }

    #[test]
    fn test_finished_is_last_event() {
        let (model, table, observed) = quick_inputs();
        let session = FitSession::spawn(model, table, observed, FitConfig::default());
        let events: Vec<FitEvent> = session.events().iter().collect();
        assert!(!events.is_empty());
        assert!(matches!(events.last(), Some(FitEvent::Finished(Ok(_)))));
        for event in &events[..events.len() - 1] {
            assert!(matches!(event, FitEvent::Iteration(_)));
        }
    }
}
