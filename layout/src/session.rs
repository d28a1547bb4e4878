use crate::cache::LayoutCache;
use crate::convert::NodeConversion;
use crate::edges::EdgeConversion;
use crate::error::LayoutError;
use crate::selection::{SelectionController, SelectionListener};
use crate::view::{ModuleVisibility, ViewError, ViewState};
use mechanet_core::config::{AppConfig, LayoutConfig, SessionConfig};
use mechanet_core::metrics::{MetricsCollector, MetricsSnapshot};
use mechanet_core::model::{BoundaryDirection, VariantKey};
use mechanet_core::Catalog;
use mechanet_graph::{compute_pathway_stats, AdjacencyGraph, PathwayConfig, PathwayStats};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphLayout {
    pub nodes: NodeConversion,
    pub edges: EdgeConversion,
}

/// UI-facing state holder: recomputes the layout whenever the view changes.
pub struct LayoutSession {
    catalog: Arc<Catalog>,
    graph: AdjacencyGraph,
    config: LayoutConfig,
    view: ViewState,
    selection: SelectionController,
    cache: LayoutCache<GraphLayout>,
    metrics: MetricsCollector,
}

impl LayoutSession {
    pub fn new(catalog: Arc<Catalog>, config: LayoutConfig) -> Self {
        Self::with_session_config(catalog, config, &SessionConfig::default())
    }

    pub fn with_session_config(
        catalog: Arc<Catalog>,
        config: LayoutConfig,
        session: &SessionConfig,
    ) -> Self {
        Self {
            graph: AdjacencyGraph::from_catalog(&catalog),
            selection: SelectionController::new(catalog.clone()),
            catalog,
            config,
            view: ViewState::default(),
            cache: LayoutCache::new(session.cache_entries),
            metrics: MetricsCollector::new(session.metrics_history),
        }
    }

    /// Builds a session from loaded configuration, reading the catalog
    /// directory when one is configured.
    pub fn from_app_config(app: &AppConfig) -> Result<Self, LayoutError> {
        let catalog = match &app.catalog.dir {
            Some(dir) => Arc::new(Catalog::from_dir(dir)?),
            None => Catalog::bundled()?,
        };
        Ok(Self::with_session_config(
            catalog,
            app.layout.clone(),
            &app.session,
        ))
    }

    /// Replaces the whole view after validating it against the catalog.
    pub fn with_view(mut self, view: ViewState) -> Result<Self, LayoutError> {
        view.validate(&self.catalog)?;
        match &view.selection.selected {
            Some(key) => self.selection.select(key.clone())?,
            None => self.selection.clear_selection(),
        }
        if let Some(key) = &view.selection.hovered {
            self.selection.hover(key.clone())?;
        }
        self.view = view;
        Ok(self)
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn subscribe(&mut self, listener: Arc<dyn SelectionListener>) {
        self.selection.subscribe(listener);
    }

    /// The view the next layout is computed from.
    pub fn view(&self) -> ViewState {
        let mut view = self.view.clone();
        view.selection = self.selection.state().clone();
        view
    }

    pub fn set_module_visibility(
        &mut self,
        module_id: &str,
        visibility: ModuleVisibility,
    ) -> Result<(), LayoutError> {
        if self.catalog.module(module_id).is_none() {
            return Err(ViewError::UnknownModule(module_id.to_string()).into());
        }
        self.selection.interact();
        self.view.set_visibility(module_id, visibility);
        Ok(())
    }

    /// Flips the expansion flag for one boundary direction and returns the new value.
    pub fn toggle_expansion(&mut self, direction: BoundaryDirection) -> bool {
        self.selection.interact();
        let flag = match direction {
            BoundaryDirection::Input => &mut self.view.expand_inputs,
            BoundaryDirection::Output => &mut self.view.expand_outputs,
        };
        *flag = !*flag;
        *flag
    }

    pub fn select_variant(&mut self, key: VariantKey) -> Result<(), LayoutError> {
        Ok(self.selection.select(key)?)
    }

    pub fn hover_variant(&mut self, key: VariantKey) -> Result<(), LayoutError> {
        Ok(self.selection.hover(key)?)
    }

    pub fn unhover_variant(&mut self, key: &VariantKey) {
        self.selection.unhover(key);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear_selection();
    }

    /// Current layout, served from cache when an identical view was laid out before.
    pub fn layout(&mut self) -> Arc<GraphLayout> {
        let start = Instant::now();
        let view = self.view();
        let fingerprint = match view.fingerprint(&self.config) {
            Ok(fingerprint) => Some(fingerprint),
            Err(err) => {
                tracing::warn!(error = %err, "layout cache bypassed");
                None
            }
        };

        if let Some(hit) = fingerprint.as_deref().and_then(|key| self.cache.lookup(key)) {
            self.metrics
                .record_layout(start.elapsed().as_micros() as u64, true);
            return hit;
        }

        let layout = Arc::new(crate::layout(&self.catalog, &view, &self.config));
        if let Some(fingerprint) = fingerprint {
            self.cache.insert(fingerprint, layout.clone());
        }
        let elapsed = start.elapsed().as_micros() as u64;
        self.metrics.record_layout(elapsed, false);
        tracing::debug!(
            latency_us = elapsed,
            nodes = layout.nodes.nodes.len(),
            edges = layout.edges.edges.len(),
            "layout recomputed"
        );
        layout
    }

    pub fn pathway_stats(&self, config: &PathwayConfig) -> PathwayStats {
        let stats = compute_pathway_stats(&self.graph, &self.catalog, config);
        self.metrics
            .record_traversal(stats.downstream_reach + stats.upstream_reach);
        stats
    }

    pub fn drug_pathway_stats(&self, drug_id: &str) -> Result<PathwayStats, LayoutError> {
        let drug = self
            .catalog
            .drug(drug_id)
            .ok_or_else(|| LayoutError::UnknownDrug(drug_id.to_string()))?;
        Ok(self.pathway_stats(&PathwayConfig::for_drug(drug)))
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
