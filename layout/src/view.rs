use mechanet_core::config::LayoutConfig;
use mechanet_core::error::{ErrorCode, MechanetError};
use mechanet_core::model::{ModuleId, VariantKey};
use mechanet_core::Catalog;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModuleVisibility {
    #[default]
    On,
    Partial,
    Off,
}

impl ModuleVisibility {
    pub fn is_rendered(self) -> bool {
        self != ModuleVisibility::Off
    }
}

/// Currently selected and hovered boundary variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
pub struct VariantSelection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<VariantKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hovered: Option<VariantKey>,
}

impl VariantSelection {
    pub fn is_selected(&self, key: &VariantKey) -> bool {
        self.selected.as_ref() == Some(key)
    }

    pub fn is_hovered(&self, key: &VariantKey) -> bool {
        self.hovered.as_ref() == Some(key)
    }

    /// True when `node_id` owns the selected or hovered variant.
    pub fn touches_node(&self, node_id: &str) -> bool {
        [&self.selected, &self.hovered]
            .into_iter()
            .flatten()
            .any(|key| key.node_id == node_id)
    }
}

/// Everything the layout depends on besides the catalog and spacing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
pub struct ViewState {
    /// Modules not listed here are `on`.
    #[serde(default)]
    pub modules: BTreeMap<ModuleId, ModuleVisibility>,
    #[serde(default)]
    pub selection: VariantSelection,
    #[serde(default)]
    pub expand_inputs: bool,
    #[serde(default)]
    pub expand_outputs: bool,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ViewError {
    #[error("unknown module: {0}")]
    UnknownModule(String),
    #[error("unknown boundary variant: {0}")]
    UnknownVariant(VariantKey),
    #[error("invalid view state: {0}")]
    Malformed(String),
    #[error("cannot fingerprint view: {0}")]
    Fingerprint(String),
}

impl MechanetError for ViewError {
    fn error_code(&self) -> ErrorCode {
        match self {
            ViewError::UnknownModule(_) | ViewError::UnknownVariant(_) => ErrorCode::NotFound,
            ViewError::Malformed(_) => ErrorCode::InvalidArgument,
            ViewError::Fingerprint(_) => ErrorCode::Internal,
        }
    }
}

impl ViewState {
    pub fn parse_json(raw: &str) -> Result<Self, ViewError> {
        serde_json::from_str(raw).map_err(|err| ViewError::Malformed(err.to_string()))
    }

    pub fn validate(&self, catalog: &Catalog) -> Result<(), ViewError> {
        if let Some(module_id) = self
            .modules
            .keys()
            .find(|module_id| catalog.module(module_id).is_none())
        {
            return Err(ViewError::UnknownModule(module_id.clone()));
        }
        for key in [&self.selection.selected, &self.selection.hovered]
            .into_iter()
            .flatten()
        {
            if catalog.variant(key).is_none() {
                return Err(ViewError::UnknownVariant(key.clone()));
            }
        }
        Ok(())
    }

    pub fn visibility(&self, module_id: &str) -> ModuleVisibility {
        self.modules.get(module_id).copied().unwrap_or_default()
    }

    pub fn set_visibility(&mut self, module_id: impl Into<ModuleId>, visibility: ModuleVisibility) {
        self.modules.insert(module_id.into(), visibility);
    }

    pub fn with_visibility(
        mut self,
        module_id: impl Into<ModuleId>,
        visibility: ModuleVisibility,
    ) -> Self {
        self.set_visibility(module_id, visibility);
        self
    }

    /// Drops entries equal to the default so equivalent views compare equal.
    pub fn normalized(&self) -> Self {
        let mut view = self.clone();
        view.modules
            .retain(|_, visibility| *visibility != ModuleVisibility::On);
        view
    }

    /// Hex SHA-256 over the normalized view and the spacing it is laid out with.
    pub fn fingerprint(&self, config: &LayoutConfig) -> Result<String, ViewError> {
        let encode = |err: serde_json::Error| ViewError::Fingerprint(err.to_string());
        let view = serde_json::to_vec(&self.normalized()).map_err(encode)?;
        let config = serde_json::to_vec(config).map_err(encode)?;

        let mut hasher = Sha256::new();
        hasher.update(b"view");
        hasher.update(view);
        hasher.update(b"config");
        hasher.update(config);
        Ok(format!("{:x}", hasher.finalize()))
    }
}
