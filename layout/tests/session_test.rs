use mechanet_core::config::{AppConfig, LayoutConfig, SessionConfig};
use mechanet_core::error::{ErrorCode, MechanetError};
use mechanet_core::model::{BoundaryDirection, VariantKey};
use mechanet_core::Catalog;
use mechanet_layout::{
    LayoutError, LayoutSession, ModuleVisibility, RecordingListener, SelectionEvent, ViewState,
};
use std::sync::Arc;

fn session() -> LayoutSession {
    LayoutSession::new(Catalog::bundled().unwrap(), LayoutConfig::default())
}

#[test]
fn test_repeated_layout_is_served_from_cache() {
    let mut session = session();

    let first = session.layout();
    let second = session.layout();

    assert!(Arc::ptr_eq(&first, &second));
    let metrics = session.metrics().layout;
    assert_eq!(metrics.requests, 2);
    assert_eq!(metrics.recomputes, 1);
    assert_eq!(metrics.hit_rate, 0.5);
    assert_eq!(metrics.recompute_latency.samples, 1);
}

#[test]
fn test_visibility_change_recomputes_layout() {
    let mut session = session();
    let before = session.layout();

    session
        .set_module_visibility("tau", ModuleVisibility::Off)
        .unwrap();
    let after = session.layout();

    assert!(!Arc::ptr_eq(&before, &after));
    assert!(after.nodes.nodes.iter().all(|node| node.module != "tau"));
    assert!(after.nodes.pseudo_node("tau").is_some());

    session
        .set_module_visibility("tau", ModuleVisibility::On)
        .unwrap();
    assert!(Arc::ptr_eq(&before, &session.layout()));
}

#[test]
fn test_disabled_cache_always_recomputes() {
    let session_config = SessionConfig {
        cache_entries: 0,
        ..SessionConfig::default()
    };
    let mut session = LayoutSession::with_session_config(
        Catalog::bundled().unwrap(),
        LayoutConfig::default(),
        &session_config,
    );

    let first = session.layout();
    let second = session.layout();

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(first, second);
    assert_eq!(session.metrics().layout.hit_rate, 0.0);
}

#[test]
fn test_unknown_module_is_rejected() {
    let mut session = session();
    let err = session
        .set_module_visibility("spleen", ModuleVisibility::Off)
        .unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::NotFound);
    assert_eq!(session.view(), ViewState::default());
}

#[test]
fn test_toggle_expansion_adds_variant_children() {
    let mut session = session();
    assert!(session.layout().nodes.variant_nodes.is_empty());

    assert!(session.toggle_expansion(BoundaryDirection::Output));
    let expanded = session.layout();
    assert!(!expanded.nodes.variant_nodes.is_empty());
    assert!(expanded
        .nodes
        .variant_nodes
        .iter()
        .all(|child| child.key.node_id == "cognition"));

    assert!(!session.toggle_expansion(BoundaryDirection::Output));
    assert!(session.layout().nodes.variant_nodes.is_empty());
}

#[test]
fn test_selection_highlights_owner_and_its_edges() {
    let mut session = session();
    let key = VariantKey::new("anti_amyloid_mab", "high_dose");

    session.select_variant(key.clone()).unwrap();
    let layout = session.layout();

    let owner = layout
        .nodes
        .nodes
        .iter()
        .find(|node| node.id == "anti_amyloid_mab")
        .unwrap();
    assert!(owner.highlighted);
    assert!(layout
        .edges
        .edges
        .iter()
        .filter(|edge| edge.source == "anti_amyloid_mab")
        .all(|edge| edge.highlighted));
    assert_eq!(session.view().selection.selected, Some(key));
}

#[test]
fn test_unrelated_interaction_ends_hover() {
    let listener = Arc::new(RecordingListener::default());
    let mut session = session();
    session.subscribe(listener.clone());
    let key = VariantKey::new("bace_inhibitor", "full");

    session.hover_variant(key.clone()).unwrap();
    session
        .set_module_visibility("vascular", ModuleVisibility::Partial)
        .unwrap();

    assert!(session.view().selection.hovered.is_none());
    assert_eq!(
        listener.events(),
        vec![
            SelectionEvent::HoverStarted { key: key.clone() },
            SelectionEvent::HoverEnded { key },
        ]
    );
}

#[test]
fn test_with_view_validates_and_applies_selection() {
    let raw = r#"{
        "modules": { "lysosomal": "off" },
        "selection": { "selected": { "node_id": "exercise", "variant_id": "moderate" } },
        "expand_inputs": true
    }"#;
    let view = ViewState::parse_json(raw).unwrap();
    let session = session().with_view(view).unwrap();

    let current = session.view();
    assert_eq!(current.visibility("lysosomal"), ModuleVisibility::Off);
    assert_eq!(
        current.selection.selected,
        Some(VariantKey::new("exercise", "moderate"))
    );

    let bad = ViewState::default().with_visibility("spleen", ModuleVisibility::Off);
    assert!(matches!(session_with(bad), Err(LayoutError::View(_))));
}

fn session_with(view: ViewState) -> Result<LayoutSession, LayoutError> {
    session().with_view(view)
}

#[test]
fn test_drug_pathway_stats_record_traversals() {
    let session = session();

    let stats = session.drug_pathway_stats("verubecestat").unwrap();
    assert!(stats.downstream_reach > 0);
    assert_eq!(session.metrics().traversal.runs, 1);

    let err = session.drug_pathway_stats("aspirin").unwrap_err();
    assert!(matches!(err, LayoutError::UnknownDrug(ref id) if id == "aspirin"));
    assert_eq!(err.error_code(), ErrorCode::NotFound);
}

#[test]
fn test_from_app_config_reports_missing_catalog_dir() {
    let mut app = AppConfig::default();
    let mut session = LayoutSession::from_app_config(&app).unwrap();
    assert!(!session.layout().nodes.nodes.is_empty());

    app.catalog.dir = Some("/nonexistent/mechanet-catalog".to_string());
    let err = LayoutSession::from_app_config(&app).err().unwrap();
    assert!(matches!(err, LayoutError::Catalog(_)));
    assert_eq!(err.error_code(), ErrorCode::NotFound);
}
