use super::{area_job, copper, rect, tools};
use copperkit_camtools::{geometry, run_clearing, RunStatus};
use copperkit_core::{CancellationToken, NullProgress, OperationKind, ParamOverrides};

/// Two pads leave a 2.5 wide channel that only the small tool fits in.
fn channel_board() -> copperkit_camtools::ObjectStore {
    copper(
        "top",
        vec![rect(15.0, 0.0, 25.0, 8.75), rect(15.0, 11.25, 25.0, 20.0)],
    )
}

#[test]
fn test_rest_machining_reaches_the_channel() {
    let objects = channel_board();
    let mut job = area_job(vec![rect(0.0, 0.0, 40.0, 20.0)], &[6.0, 1.0]);
    job.rest_machining = true;
    let outcome = run_clearing(&job, &objects, &CancellationToken::new(), &NullProgress);
    assert_eq!(outcome.status, RunStatus::Done);
    assert!(!outcome.not_cleared);
    assert_eq!(outcome.tools.len(), 2);

    let channel = geometry::to_multi(rect(16.0, 9.0, 24.0, 11.0));
    let covered = geometry::area(&geometry::intersection(&outcome.solid_geometry, &channel));
    assert!(covered > 16.0 * 0.99, "channel covered {}", covered);
}

#[test]
fn test_rest_clears_at_least_as_much_as_single_pass() {
    let objects = channel_board();
    let mut job = area_job(vec![rect(0.0, 0.0, 40.0, 20.0)], &[6.0, 1.0]);
    let single = run_clearing(&job, &objects, &CancellationToken::new(), &NullProgress);
    job.rest_machining = true;
    let rest = run_clearing(&job, &objects, &CancellationToken::new(), &NullProgress);
    assert!(single.is_done() && rest.is_done());
    assert!(rest.cleared_area() >= single.cleared_area() * 0.99);
}

#[test]
fn test_rest_tools_run_largest_first() {
    let objects = channel_board();
    // table order smallest first; rest machining ignores it
    let mut job = area_job(vec![rect(0.0, 0.0, 40.0, 20.0)], &[1.0, 6.0]);
    job.rest_machining = true;
    let outcome = run_clearing(&job, &objects, &CancellationToken::new(), &NullProgress);
    assert!(outcome.is_done());
    let big = outcome
        .tools
        .values()
        .find(|r| r.tool.diameter == 6.0)
        .unwrap();
    let small = outcome
        .tools
        .values()
        .find(|r| r.tool.diameter == 1.0)
        .unwrap();
    // the big tool had the open field; the small one only the leftovers
    assert!(geometry::area(&big.cleared) > geometry::area(&small.cleared));
}

#[test]
fn test_too_narrow_for_every_tool() {
    let objects = copper(
        "top",
        vec![rect(15.0, 0.0, 25.0, 9.8), rect(15.0, 10.2, 25.0, 20.0)],
    );
    let mut job = area_job(vec![rect(0.0, 0.0, 40.0, 20.0)], &[6.0, 1.0]);
    job.rest_machining = true;
    let outcome = run_clearing(&job, &objects, &CancellationToken::new(), &NullProgress);
    assert!(outcome.is_done());
    assert!(outcome.not_cleared);
    assert!(outcome.uncleared_count >= 1);
}

#[test]
fn test_isolation_only_job_leaves_nothing_uncleared() {
    let objects = copper("top", vec![rect(13.0, 13.0, 17.0, 17.0)]);
    let isolation = ParamOverrides {
        operation: Some(OperationKind::Isolation),
        ..Default::default()
    };
    let mut job = area_job(vec![rect(0.0, 0.0, 30.0, 30.0)], &[]);
    job.tools = tools(&[1.0], &isolation);

    for rest_machining in [false, true] {
        job.rest_machining = rest_machining;
        let outcome = run_clearing(&job, &objects, &CancellationToken::new(), &NullProgress);
        assert_eq!(outcome.status, RunStatus::Done, "rest {}", rest_machining);
        assert_eq!(outcome.tools.len(), 1);
        assert!(!outcome.not_cleared, "rest {}", rest_machining);
        assert_eq!(outcome.uncleared_count, 0);
    }
}
