use super::{area_job, copper, rect};
use copperkit_camtools::{geometry, run_clearing, RunStatus};
use copperkit_core::{CancellationToken, ProgressSink};
use std::sync::Mutex;

#[derive(Default)]
struct Recorder {
    percents: Mutex<Vec<u8>>,
    statuses: Mutex<Vec<String>>,
    previews: Mutex<usize>,
}

impl ProgressSink for Recorder {
    fn percent(&self, value: u8) {
        self.percents.lock().unwrap().push(value);
    }

    fn status(&self, message: &str) {
        self.statuses.lock().unwrap().push(message.to_string());
    }

    fn preview(&self, _tool_id: u64, paths: &[Vec<(f64, f64)>]) {
        assert!(!paths.is_empty());
        *self.previews.lock().unwrap() += 1;
    }
}

#[test]
fn test_progress_reaches_completion() {
    let objects = copper("top", vec![rect(4.0, 4.0, 6.0, 6.0)]);
    let job = area_job(vec![rect(0.0, 0.0, 10.0, 10.0)], &[1.0]);
    let sink = Recorder::default();
    let outcome = run_clearing(&job, &objects, &CancellationToken::new(), &sink);
    assert!(outcome.is_done());

    let percents = sink.percents.lock().unwrap();
    assert_eq!(percents.last(), Some(&100));
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    let statuses = sink.statuses.lock().unwrap();
    assert_eq!(statuses.last().map(String::as_str), Some("Clearing done"));
    assert_eq!(*sink.previews.lock().unwrap(), 0);
}

#[test]
fn test_progressive_mode_sends_previews() {
    let objects = copper("top", vec![rect(4.0, 4.0, 6.0, 6.0)]);
    let mut job = area_job(
        vec![rect(0.0, 0.0, 10.0, 10.0), rect(20.0, 0.0, 30.0, 10.0)],
        &[1.0],
    );
    job.progressive = true;
    let sink = Recorder::default();
    let outcome = run_clearing(&job, &objects, &CancellationToken::new(), &sink);
    assert!(outcome.is_done());
    assert_eq!(*sink.previews.lock().unwrap(), 2);
}

/// Cancels the run from inside the first progress report.
struct CancelOnFirstPercent {
    cancel: CancellationToken,
    percents: Mutex<usize>,
}

impl ProgressSink for CancelOnFirstPercent {
    fn percent(&self, _value: u8) {
        *self.percents.lock().unwrap() += 1;
        self.cancel.cancel();
    }

    fn status(&self, _message: &str) {}
}

#[test]
fn test_cancel_mid_run_discards_partial_results() {
    let objects = copper("top", vec![rect(4.0, 4.0, 6.0, 6.0)]);
    let job = area_job(
        vec![
            rect(0.0, 0.0, 10.0, 10.0),
            rect(20.0, 0.0, 30.0, 10.0),
            rect(40.0, 0.0, 50.0, 10.0),
        ],
        &[2.0, 0.5],
    );
    let cancel = CancellationToken::new();
    let sink = CancelOnFirstPercent {
        cancel: cancel.clone(),
        percents: Mutex::new(0),
    };

    let outcome = run_clearing(&job, &objects, &cancel, &sink);
    assert_eq!(outcome.status, RunStatus::Cancelled);
    assert!(outcome.tools.is_empty());
    assert!(geometry::is_empty(&outcome.solid_geometry));
    // the first polygon of the first tool finished, nothing after it started
    assert_eq!(*sink.percents.lock().unwrap(), 1);
    assert!(cancel.is_cancelled());
}
