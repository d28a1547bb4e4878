//! Static reference data: the mechanistic network and the drug library.
//!
//! The bundled catalog is embedded at compile time and parsed once per
//! process. Hand-authored catalogs can be loaded from JSON or a directory.

use crate::error::{ErrorCode, MechanetError};
use crate::model::{
    BoundaryVariant, DrugEntry, MechanisticEdge, MechanisticNode, NodeModule, VariantKey,
    PSEUDO_PREFIX, WAYPOINT_PREFIX,
};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

const BUNDLED_NETWORK: &str = include_str!("../data/network.json");
const BUNDLED_DRUGS: &str = include_str!("../data/drugs.json");

static BUNDLED: OnceLock<Result<Arc<Catalog>, CatalogError>> = OnceLock::new();

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("failed to parse {file}: {message}")]
    Parse { file: String, message: String },
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },
    #[error("duplicate module id: {0}")]
    DuplicateModule(String),
    #[error("duplicate node id: {0}")]
    DuplicateNode(String),
    #[error("duplicate edge id: {0}")]
    DuplicateEdge(String),
    #[error("duplicate drug id: {0}")]
    DuplicateDrug(String),
    #[error("duplicate variant {variant_id} on node {node_id}")]
    DuplicateVariant { node_id: String, variant_id: String },
    #[error("node {node_id} references unknown module {module_id}")]
    UnknownModule { node_id: String, module_id: String },
    #[error("node {0} declares variants but is not a boundary node")]
    VariantsOnNonBoundary(String),
    #[error("id {0} uses a reserved prefix")]
    ReservedId(String),
}

impl MechanetError for CatalogError {
    fn error_code(&self) -> ErrorCode {
        match self {
            CatalogError::Io { .. } => ErrorCode::NotFound,
            _ => ErrorCode::InvalidArgument,
        }
    }
}

#[derive(Debug, Deserialize)]
struct NetworkDocument {
    #[serde(default)]
    modules: Vec<NodeModule>,
    #[serde(default)]
    nodes: Vec<MechanisticNode>,
    #[serde(default)]
    edges: Vec<MechanisticEdge>,
}

/// Immutable, validated node/edge/module/drug tables with id lookups.
#[derive(Debug, Clone)]
pub struct Catalog {
    modules: Vec<NodeModule>,
    nodes: Vec<MechanisticNode>,
    edges: Vec<MechanisticEdge>,
    drugs: Vec<DrugEntry>,
    module_index: BTreeMap<String, usize>,
    node_index: BTreeMap<String, usize>,
    edge_index: BTreeMap<String, usize>,
    drug_index: BTreeMap<String, usize>,
    module_members: BTreeMap<String, Vec<String>>,
}

impl Catalog {
    /// The catalog shipped with the crate, shared across callers.
    pub fn bundled() -> Result<Arc<Catalog>, CatalogError> {
        BUNDLED
            .get_or_init(|| Catalog::from_json(BUNDLED_NETWORK, BUNDLED_DRUGS).map(Arc::new))
            .clone()
    }

    pub fn from_json(network: &str, drugs: &str) -> Result<Self, CatalogError> {
        let document: NetworkDocument =
            serde_json::from_str(network).map_err(|err| CatalogError::Parse {
                file: "network.json".to_string(),
                message: err.to_string(),
            })?;
        let drugs: Vec<DrugEntry> =
            serde_json::from_str(drugs).map_err(|err| CatalogError::Parse {
                file: "drugs.json".to_string(),
                message: err.to_string(),
            })?;

        Self::new(document.modules, document.nodes, document.edges, drugs)
    }

    /// Loads `network.json` and `drugs.json` from `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let dir = dir.as_ref();
        let network = read_file(&dir.join("network.json"))?;
        let drugs = read_file(&dir.join("drugs.json"))?;
        Self::from_json(&network, &drugs)
    }

    pub fn new(
        modules: Vec<NodeModule>,
        nodes: Vec<MechanisticNode>,
        edges: Vec<MechanisticEdge>,
        drugs: Vec<DrugEntry>,
    ) -> Result<Self, CatalogError> {
        let mut module_index = BTreeMap::new();
        for (idx, module) in modules.iter().enumerate() {
            ensure_unreserved(&module.id)?;
            if module_index.insert(module.id.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateModule(module.id.clone()));
            }
        }

        let mut node_index = BTreeMap::new();
        let mut module_members: BTreeMap<String, Vec<String>> = modules
            .iter()
            .map(|module| (module.id.clone(), Vec::new()))
            .collect();
        for (idx, node) in nodes.iter().enumerate() {
            ensure_unreserved(&node.id)?;
            if node_index.insert(node.id.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateNode(node.id.clone()));
            }
            let Some(members) = module_members.get_mut(&node.module) else {
                return Err(CatalogError::UnknownModule {
                    node_id: node.id.clone(),
                    module_id: node.module.clone(),
                });
            };
            members.push(node.id.clone());
            validate_variants(node)?;
        }
        for members in module_members.values_mut() {
            members.sort();
        }

        let mut edge_index = BTreeMap::new();
        for (idx, edge) in edges.iter().enumerate() {
            ensure_unreserved(&edge.id)?;
            if edge_index.insert(edge.id.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateEdge(edge.id.clone()));
            }
        }

        let mut drug_index = BTreeMap::new();
        for (idx, drug) in drugs.iter().enumerate() {
            if drug_index.insert(drug.id.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateDrug(drug.id.clone()));
            }
        }

        tracing::debug!(
            modules = modules.len(),
            nodes = nodes.len(),
            edges = edges.len(),
            drugs = drugs.len(),
            "catalog loaded"
        );

        Ok(Self {
            modules,
            nodes,
            edges,
            drugs,
            module_index,
            node_index,
            edge_index,
            drug_index,
            module_members,
        })
    }

    pub fn modules(&self) -> &[NodeModule] {
        &self.modules
    }

    pub fn nodes(&self) -> &[MechanisticNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[MechanisticEdge] {
        &self.edges
    }

    pub fn drugs(&self) -> &[DrugEntry] {
        &self.drugs
    }

    pub fn node(&self, id: &str) -> Option<&MechanisticNode> {
        self.node_index.get(id).map(|idx| &self.nodes[*idx])
    }

    pub fn edge(&self, id: &str) -> Option<&MechanisticEdge> {
        self.edge_index.get(id).and_then(|idx| self.edges.get(*idx))
    }

    pub fn module(&self, id: &str) -> Option<&NodeModule> {
        self.module_index.get(id).map(|idx| &self.modules[*idx])
    }

    pub fn drug(&self, id: &str) -> Option<&DrugEntry> {
        self.drug_index.get(id).map(|idx| &self.drugs[*idx])
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    /// Member node ids of a module, ascending.
    pub fn module_members(&self, module_id: &str) -> &[String] {
        self.module_members
            .get(module_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Resolves a variant only when it hangs off a boundary node.
    pub fn variant(&self, key: &VariantKey) -> Option<&BoundaryVariant> {
        self.node(&key.node_id)
            .filter(|node| node.is_boundary())
            .and_then(|node| node.variant(&key.variant_id))
    }
}

fn read_file(path: &Path) -> Result<String, CatalogError> {
    std::fs::read_to_string(path).map_err(|err| CatalogError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    })
}

fn ensure_unreserved(id: &str) -> Result<(), CatalogError> {
    if id.starts_with(PSEUDO_PREFIX) || id.starts_with(WAYPOINT_PREFIX) {
        return Err(CatalogError::ReservedId(id.to_string()));
    }
    Ok(())
}

fn validate_variants(node: &MechanisticNode) -> Result<(), CatalogError> {
    if node.variants.is_empty() {
        return Ok(());
    }
    if !node.is_boundary() {
        return Err(CatalogError::VariantsOnNonBoundary(node.id.clone()));
    }
    let mut seen = BTreeSet::new();
    for variant in &node.variants {
        if !seen.insert(variant.id.as_str()) {
            return Err(CatalogError::DuplicateVariant {
                node_id: node.id.clone(),
                variant_id: variant.id.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        BoundaryDirection, EdgeRelation, EffectDirection, EffectMagnitude, NodeCategory,
    };

    fn modules() -> Vec<NodeModule> {
        vec![NodeModule::new("amyloid", "Amyloid Processing")]
    }

    fn dose(id: &str) -> BoundaryVariant {
        BoundaryVariant {
            id: id.into(),
            label: id.to_uppercase(),
            effect: EffectDirection::Decreases,
            magnitude: EffectMagnitude::Moderate,
            evidence: Vec::new(),
        }
    }

    fn stock(id: &str) -> MechanisticNode {
        MechanisticNode::new(id, id.to_uppercase(), NodeCategory::Stock, "amyloid")
    }

    #[test]
    fn bundled_catalog_loads_once() {
        let first = Catalog::bundled().unwrap();
        let second = Catalog::bundled().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(!first.nodes().is_empty());
        assert!(!first.drugs().is_empty());
    }

    #[test]
    fn rejects_unknown_module() {
        let nodes = vec![MechanisticNode::new("tau", "Tau", NodeCategory::Stock, "tauopathy")];
        let err = Catalog::new(modules(), nodes, Vec::new(), Vec::new()).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownModule { .. }));
    }

    #[test]
    fn rejects_reserved_prefix() {
        let nodes = vec![MechanisticNode::new(
            "pseudo:amyloid",
            "Fake",
            NodeCategory::State,
            "amyloid",
        )];
        let err = Catalog::new(modules(), nodes, Vec::new(), Vec::new()).unwrap_err();
        assert_eq!(err, CatalogError::ReservedId("pseudo:amyloid".into()));
    }

    #[test]
    fn keeps_edges_with_unknown_endpoints() {
        let nodes = vec![MechanisticNode::new("abeta", "Abeta", NodeCategory::Stock, "amyloid")];
        let edges = vec![MechanisticEdge::new("e1", "abeta", "ghost", EdgeRelation::Increases)];
        let catalog = Catalog::new(modules(), nodes, edges, Vec::new()).unwrap();
        assert_eq!(catalog.edges().len(), 1);
        assert_eq!(catalog.edge("e1").map(|edge| edge.target.as_str()), Some("ghost"));
        assert!(catalog.edge("e2").is_none());
        assert!(!catalog.contains_node("ghost"));
    }

    #[test]
    fn members_are_sorted() {
        let nodes = vec![
            MechanisticNode::new("b", "B", NodeCategory::Stock, "amyloid"),
            MechanisticNode::new("a", "A", NodeCategory::Stock, "amyloid"),
        ];
        let catalog = Catalog::new(modules(), nodes, Vec::new(), Vec::new()).unwrap();
        assert_eq!(catalog.module_members("amyloid"), ["a", "b"]);
        assert!(catalog.module_members("missing").is_empty());
    }

    #[test]
    fn rejects_duplicate_node_and_edge_ids() {
        let err = Catalog::new(modules(), vec![stock("abeta"), stock("abeta")], Vec::new(), Vec::new())
            .unwrap_err();
        assert_eq!(err, CatalogError::DuplicateNode("abeta".into()));

        let edges = vec![
            MechanisticEdge::new("e1", "abeta", "plaque", EdgeRelation::ConvertsTo),
            MechanisticEdge::new("e1", "plaque", "abeta", EdgeRelation::Decreases),
        ];
        let err = Catalog::new(modules(), vec![stock("abeta"), stock("plaque")], edges, Vec::new())
            .unwrap_err();
        assert_eq!(err, CatalogError::DuplicateEdge("e1".into()));
        assert_eq!(err.error_code(), ErrorCode::InvalidArgument);
    }

    #[test]
    fn rejects_duplicate_module_and_drug_ids() {
        let mut twice = modules();
        twice.extend(modules());
        let err = Catalog::new(twice, Vec::new(), Vec::new(), Vec::new()).unwrap_err();
        assert_eq!(err, CatalogError::DuplicateModule("amyloid".into()));

        let network = r#"{"modules":[{"id":"amyloid","label":"Amyloid"}]}"#;
        let drugs = r#"[
            {"id":"lecanemab","name":"Lecanemab","drug_type":"antibody","status":"approved"},
            {"id":"lecanemab","name":"Leqembi","drug_type":"antibody","status":"approved"}
        ]"#;
        let err = Catalog::from_json(network, drugs).unwrap_err();
        assert_eq!(err, CatalogError::DuplicateDrug("lecanemab".into()));
    }

    #[test]
    fn rejects_duplicate_variant_on_boundary_node() {
        let node = MechanisticNode::boundary("mab", "Antibody", "amyloid", BoundaryDirection::Input)
            .with_variant(dose("low"))
            .with_variant(dose("low"));
        let err = Catalog::new(modules(), vec![node], Vec::new(), Vec::new()).unwrap_err();
        assert_eq!(
            err,
            CatalogError::DuplicateVariant {
                node_id: "mab".into(),
                variant_id: "low".into(),
            }
        );
    }

    #[test]
    fn rejects_variants_on_internal_node() {
        let node = stock("abeta").with_variant(dose("low"));
        let err = Catalog::new(modules(), vec![node], Vec::new(), Vec::new()).unwrap_err();
        assert_eq!(err, CatalogError::VariantsOnNonBoundary("abeta".into()));
    }

    #[test]
    fn resolves_variants_of_boundary_nodes_only() {
        let node = MechanisticNode::boundary("mab", "Antibody", "amyloid", BoundaryDirection::Input)
            .with_variant(dose("low"))
            .with_variant(dose("high"));
        let catalog = Catalog::new(modules(), vec![node, stock("abeta")], Vec::new(), Vec::new())
            .unwrap();
        assert!(catalog.variant(&VariantKey::new("mab", "high")).is_some());
        assert!(catalog.variant(&VariantKey::new("mab", "medium")).is_none());
        assert!(catalog.variant(&VariantKey::new("abeta", "high")).is_none());
    }

    #[test]
    fn from_dir_reads_both_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("network.json"),
            r#"{"modules":[{"id":"amyloid","label":"Amyloid"}],
                "nodes":[{"id":"abeta","label":"Abeta","category":"STOCK","module":"amyloid"}]}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("drugs.json"), "[]").unwrap();

        let catalog = Catalog::from_dir(dir.path()).unwrap();
        assert!(catalog.contains_node("abeta"));

        let err = Catalog::from_dir(dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
        assert_eq!(err.error_code(), ErrorCode::NotFound);
    }
}
