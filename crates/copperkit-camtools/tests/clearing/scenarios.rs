use super::{area_job, copper, rect};
use copperkit_camtools::{
    compute_empty, geometry, run_clearing, ClearingError, ClearingJob, ReferenceMode, RunStatus,
};
use copperkit_core::{
    CancellationToken, ClearingMethod, NullProgress, OperationKind, ParamOverrides, ToolCatalog,
    ToolOrder, ToolShape,
};

#[test]
fn test_area_selection_with_rest_machining() {
    let objects = copper("top", vec![rect(30.0, 30.0, 50.0, 50.0)]);
    let mut job = area_job(vec![rect(0.0, 0.0, 100.0, 100.0)], &[10.0, 2.0]);
    job.rest_machining = true;

    let outcome = run_clearing(&job, &objects, &CancellationToken::new(), &NullProgress);
    assert_eq!(outcome.status, RunStatus::Done);
    assert!(!outcome.not_cleared);
    assert_eq!(outcome.output_name, "ncc_top");

    // 100 x 100 board minus the 20 x 20 pad, less the corner fillets
    let area = outcome.cleared_area();
    assert!(area > 9600.0 * 0.99, "cleared {}", area);
    assert!(area < 9600.0 + 1e-3, "cleared {}", area);
}

#[test]
fn test_broken_isolation_is_a_warning() {
    let objects = copper(
        "top",
        vec![rect(2.0, 2.0, 6.0, 6.0), rect(30.0, 30.0, 34.0, 34.0)],
    );
    let isolation = ParamOverrides {
        operation: Some(OperationKind::Isolation),
        ..Default::default()
    };
    let mut catalog = ToolCatalog::default();
    catalog.add_tool(5.0, ToolShape::Flat, &isolation).unwrap();
    catalog
        .add_tool(1.0, ToolShape::Flat, &ParamOverrides::default())
        .unwrap();
    let job_tools = catalog.snapshot(ToolOrder::Table);
    let mut job = ClearingJob::new("ncc", "top", job_tools);
    job.reference_mode = ReferenceMode::SelfTarget;
    job.margin = 3.0;

    let outcome = run_clearing(&job, &objects, &CancellationToken::new(), &NullProgress);
    assert_eq!(outcome.status, RunStatus::Done);
    assert_eq!(outcome.warnings, 1);
    assert_eq!(outcome.tools.len(), 2);
}

#[test]
fn test_disjoint_area_shapes() {
    let objects = copper("top", vec![rect(4.0, 4.0, 6.0, 6.0)]);
    let mut job = area_job(
        vec![rect(0.0, 0.0, 10.0, 10.0), rect(20.0, 0.0, 30.0, 10.0)],
        &[1.0],
    );
    job.margin = 1.0;
    let outcome = run_clearing(&job, &objects, &CancellationToken::new(), &NullProgress);
    assert_eq!(outcome.status, RunStatus::Done);
    assert_eq!(outcome.solid_geometry.0.len(), 2);
}

#[test]
fn test_no_tools_fails_before_target_lookup() {
    let objects = copper("top", vec![rect(0.0, 0.0, 1.0, 1.0)]);
    let job = ClearingJob::new("ncc", "missing", Vec::new());
    let outcome = run_clearing(&job, &objects, &CancellationToken::new(), &NullProgress);
    assert_eq!(
        outcome.status,
        RunStatus::Failed(ClearingError::NoGeometryProduced)
    );
}

#[test]
fn test_missing_reference_object() {
    let objects = copper("top", vec![rect(0.0, 0.0, 1.0, 1.0)]);
    let mut job = area_job(Vec::new(), &[1.0]);
    job.reference_mode = ReferenceMode::Reference;
    job.reference = Some("outline".to_string());
    let outcome = run_clearing(&job, &objects, &CancellationToken::new(), &NullProgress);
    match outcome.status {
        RunStatus::Failed(err) => assert!(err.is_reference_error()),
        other => panic!("unexpected status {:?}", other),
    }
}

#[test]
fn test_fully_covered_boundary() {
    let objects = copper("top", vec![rect(0.0, 0.0, 10.0, 10.0)]);
    let job = area_job(vec![rect(2.0, 2.0, 8.0, 8.0)], &[1.0]);
    let outcome = run_clearing(&job, &objects, &CancellationToken::new(), &NullProgress);
    assert!(matches!(
        outcome.status,
        RunStatus::Failed(ClearingError::EmptyExtent(_))
    ));
}

#[test]
fn test_cancelled_before_start() {
    let objects = copper("top", vec![rect(4.0, 4.0, 6.0, 6.0)]);
    let job = area_job(vec![rect(0.0, 0.0, 10.0, 10.0)], &[1.0]);
    let cancel = CancellationToken::new();
    cancel.cancel();
    let outcome = run_clearing(&job, &objects, &cancel, &NullProgress);
    assert_eq!(outcome.status, RunStatus::Cancelled);
    assert!(outcome.tools.is_empty());
    assert!(geometry::is_empty(&outcome.solid_geometry));
}

#[test]
fn test_every_method_produces_paths() {
    let objects = copper("top", vec![rect(8.0, 8.0, 12.0, 12.0)]);
    for method in ClearingMethod::all() {
        let mut job = area_job(vec![rect(0.0, 0.0, 20.0, 20.0)], &[1.0]);
        job.tools[0].params.method = *method;
        let outcome = run_clearing(&job, &objects, &CancellationToken::new(), &NullProgress);
        assert_eq!(outcome.status, RunStatus::Done, "method {}", method);
        let result = outcome.tools.values().next().unwrap();
        assert!(!result.paths.is_empty(), "method {}", method);
    }
}

#[test]
fn test_parallel_matches_serial() {
    let objects = copper("top", vec![rect(9.0, 0.0, 11.0, 20.0)]);
    let mut job = area_job(vec![rect(0.0, 0.0, 20.0, 20.0)], &[2.0, 0.5]);
    let serial = run_clearing(&job, &objects, &CancellationToken::new(), &NullProgress);
    job.parallel = true;
    let parallel = run_clearing(&job, &objects, &CancellationToken::new(), &NullProgress);
    assert_eq!(serial.status, RunStatus::Done);
    assert_eq!(serial.tools, parallel.tools);
}

#[test]
fn test_empty_area_is_stable() {
    let region = geometry::to_multi(rect(0.0, 0.0, 30.0, 30.0));
    let protected = geometry::to_multi(rect(10.0, 10.0, 20.0, 20.0));
    let first = compute_empty(&region, &protected, &[], None).unwrap();
    let second = compute_empty(&region, &protected, &[], None).unwrap();
    assert_eq!(first.area, second.area);
    assert!((geometry::area(&first.area) - 800.0).abs() < 1e-6);
}
