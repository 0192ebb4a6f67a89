use copperkit_core::data::tools::vshape_diameter;
use copperkit_core::*;

fn flat(cat: &mut ToolCatalog, d: f64) -> ToolId {
    cat.add_tool(d, ToolShape::Flat, &ParamOverrides::default())
        .unwrap()
}

#[test]
fn test_rejected_mutation_leaves_catalog_unchanged() {
    let mut cat = ToolCatalog::default();
    let a = flat(&mut cat, 1.0);
    flat(&mut cat, 0.5);
    let before = cat.snapshot(ToolOrder::Table);

    assert!(matches!(
        cat.add_tool(0.5, ToolShape::Ball, &ParamOverrides::default()),
        Err(ToolError::DuplicateDiameter { .. })
    ));
    assert!(cat.edit_diameter(a, 0.5).is_err());
    assert!(cat
        .apply_params_to_all(&ClearingParams {
            overlap: -0.1,
            ..Default::default()
        })
        .is_err());

    assert_eq!(cat.snapshot(ToolOrder::Table), before);
}

#[test]
fn test_unknown_tool_reported() {
    let mut cat = ToolCatalog::default();
    let a = flat(&mut cat, 1.0);
    cat.remove_tool(a).unwrap();

    let err = cat.edit_diameter(a, 2.0).unwrap_err();
    assert_eq!(err, ToolError::UnknownTool { id: a.value() });
    assert!(cat.remove_tool(a).is_none());
}

#[test]
fn test_catalog_precision_follows_decimals() {
    let mut coarse = ToolCatalog::new(ClearingParams::default(), 2);
    flat(&mut coarse, 0.501);
    assert!(coarse
        .add_tool(0.499, ToolShape::Flat, &ParamOverrides::default())
        .is_err());

    let mut fine = ToolCatalog::new(ClearingParams::default(), 4);
    flat(&mut fine, 0.501);
    flat(&mut fine, 0.499);
    assert_eq!(fine.len(), 2);
}

#[test]
fn test_snapshot_is_detached_from_catalog() {
    let mut cat = ToolCatalog::default();
    let a = flat(&mut cat, 1.0);
    let snap = cat.snapshot(ToolOrder::Descending);

    cat.edit_diameter(a, 3.0).unwrap();
    assert_eq!(snap[0].diameter, 1.0);
    assert_eq!(cat.get(a).unwrap().diameter, 3.0);
}

#[test]
fn test_tool_step_uses_overlap() {
    let mut cat = ToolCatalog::default();
    let id = cat
        .add_tool(
            2.0,
            ToolShape::Flat,
            &ParamOverrides {
                overlap: Some(0.25),
                ..Default::default()
            },
        )
        .unwrap();
    let tool = cat.get(id).unwrap();
    assert!((tool.step() - 1.5).abs() < 1e-12);
    assert!((tool.radius() - 1.0).abs() < 1e-12);
}

#[test]
fn test_vshape_width_grows_with_depth() {
    let shallow = vshape_diameter(0.1, 30.0, -0.05);
    let deep = vshape_diameter(0.1, 30.0, -0.2);
    assert!(deep > shallow);
    assert!(shallow > 0.1);
}

#[test]
fn test_catalog_serializes() {
    let mut cat = ToolCatalog::default();
    flat(&mut cat, 1.0);
    let json = serde_json::to_string(&cat).unwrap();
    let back: ToolCatalog = serde_json::from_str(&json).unwrap();
    assert_eq!(back.tools(), cat.tools());
}
