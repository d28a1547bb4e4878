use serde::{Deserialize, Serialize};

pub type NodeId = String;
pub type ModuleId = String;
pub type EdgeId = String;

/// Id prefix reserved for synthesized module stand-ins.
pub const PSEUDO_PREFIX: &str = "pseudo:";
/// Id prefix reserved for routing waypoints.
pub const WAYPOINT_PREFIX: &str = "waypoint:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeCategory {
    Stock,
    State,
    Boundary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeRole {
    RateLimiter,
    TherapeuticTarget,
    Biomarker,
    FeedbackHub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryDirection {
    Input,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectDirection {
    Increases,
    Decreases,
    Modulates,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectMagnitude {
    Weak,
    Moderate,
    Strong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeRelation {
    Increases,
    Decreases,
    Regulates,
    ConvertsTo,
    Transports,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologyRef {
    pub ontology: String,
    pub accession: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Citation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pmid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default)]
    pub note: String,
}

/// A selectable alternative of a boundary node, e.g. a dose level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryVariant {
    pub id: String,
    pub label: String,
    pub effect: EffectDirection,
    pub magnitude: EffectMagnitude,
    #[serde(default)]
    pub evidence: Vec<Citation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MechanisticNode {
    pub id: NodeId,
    pub label: String,
    pub category: NodeCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    pub module: ModuleId,
    #[serde(default)]
    pub references: Vec<OntologyRef>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mechanism: Option<String>,
    #[serde(default)]
    pub roles: Vec<NodeRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary: Option<BoundaryDirection>,
    #[serde(default)]
    pub variants: Vec<BoundaryVariant>,
}

impl MechanisticNode {
    pub fn new(
        id: impl Into<NodeId>,
        label: impl Into<String>,
        category: NodeCategory,
        module: impl Into<ModuleId>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            category,
            subtype: None,
            module: module.into(),
            references: Vec::new(),
            description: String::new(),
            mechanism: None,
            roles: Vec::new(),
            boundary: None,
            variants: Vec::new(),
        }
    }

    pub fn boundary(
        id: impl Into<NodeId>,
        label: impl Into<String>,
        module: impl Into<ModuleId>,
        direction: BoundaryDirection,
    ) -> Self {
        let mut node = Self::new(id, label, NodeCategory::Boundary, module);
        node.boundary = Some(direction);
        node
    }

    pub fn with_variant(mut self, variant: BoundaryVariant) -> Self {
        self.variants.push(variant);
        self
    }

    pub fn is_boundary(&self) -> bool {
        self.category == NodeCategory::Boundary
    }

    pub fn variant(&self, variant_id: &str) -> Option<&BoundaryVariant> {
        self.variants.iter().find(|variant| variant.id == variant_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MechanisticEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub relation: EdgeRelation,
    #[serde(default)]
    pub evidence: Vec<Citation>,
}

impl MechanisticEdge {
    pub fn new(
        id: impl Into<EdgeId>,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
        relation: EdgeRelation,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            relation,
            evidence: Vec::new(),
        }
    }
}

/// Unit of visibility toggling, e.g. "Lysosomal Pathology".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeModule {
    pub id: ModuleId,
    pub label: String,
    #[serde(default)]
    pub description: String,
}

impl NodeModule {
    pub fn new(id: impl Into<ModuleId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrugType {
    SmallMolecule,
    Antibody,
    GeneTherapy,
    Supplement,
    Device,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegulatoryStatus {
    Approved,
    Phase3,
    Phase2,
    Phase1,
    Preclinical,
    Withdrawn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugEntry {
    pub id: String,
    pub name: String,
    pub drug_type: DrugType,
    pub status: RegulatoryStatus,
    #[serde(default)]
    pub mechanism: String,
    /// Node ids the drug acts on; pathway traversal starts here.
    #[serde(default)]
    pub targets: Vec<NodeId>,
}

/// Identifies one variant of one boundary node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VariantKey {
    pub node_id: NodeId,
    pub variant_id: String,
}

impl VariantKey {
    pub fn new(node_id: impl Into<NodeId>, variant_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            variant_id: variant_id.into(),
        }
    }
}

impl std::fmt::Display for VariantKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.node_id, self.variant_id)
    }
}
