use crate::selection::SelectionError;
use crate::view::ViewError;
use mechanet_core::error::{ErrorCode, MechanetError};
use mechanet_core::CatalogError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("view error: {0}")]
    View(#[from] ViewError),
    #[error("selection error: {0}")]
    Selection(#[from] SelectionError),
    #[error("unknown drug: {0}")]
    UnknownDrug(String),
}

impl MechanetError for LayoutError {
    fn error_code(&self) -> ErrorCode {
        match self {
            LayoutError::Catalog(err) => err.error_code(),
            LayoutError::View(err) => err.error_code(),
            LayoutError::Selection(err) => err.error_code(),
            LayoutError::UnknownDrug(_) => ErrorCode::NotFound,
        }
    }
}
