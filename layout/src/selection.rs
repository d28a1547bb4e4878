//! Boundary variant selection shared by the graph and the side panel.
//!
//! One selection at a time, last write wins. Hover is transient: selecting,
//! clearing or any unrelated interaction drops it.

use crate::view::VariantSelection;
use mechanet_core::error::{ErrorCode, MechanetError};
use mechanet_core::model::VariantKey;
use mechanet_core::Catalog;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionEvent {
    Selected { key: VariantKey },
    Cleared,
    HoverStarted { key: VariantKey },
    HoverEnded { key: VariantKey },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("unknown boundary variant: {0}")]
    UnknownVariant(VariantKey),
}

impl MechanetError for SelectionError {
    fn error_code(&self) -> ErrorCode {
        match self {
            SelectionError::UnknownVariant(_) => ErrorCode::NotFound,
        }
    }
}

pub trait SelectionListener: Send + Sync {
    fn on_selection_change(&self, event: &SelectionEvent, state: &VariantSelection);
}

/// Keeps every event it receives; handy for panels that replay history and for tests.
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<SelectionEvent>>,
}

impl RecordingListener {
    pub fn events(&self) -> Vec<SelectionEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SelectionListener for RecordingListener {
    fn on_selection_change(&self, event: &SelectionEvent, _state: &VariantSelection) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

pub struct SelectionController {
    catalog: Arc<Catalog>,
    state: VariantSelection,
    listeners: Vec<Arc<dyn SelectionListener>>,
}

impl SelectionController {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            state: VariantSelection::default(),
            listeners: Vec::new(),
        }
    }

    pub fn with_listener(mut self, listener: Arc<dyn SelectionListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn subscribe(&mut self, listener: Arc<dyn SelectionListener>) {
        self.listeners.push(listener);
    }

    pub fn state(&self) -> &VariantSelection {
        &self.state
    }

    pub fn selected(&self) -> Option<&VariantKey> {
        self.state.selected.as_ref()
    }

    pub fn hovered(&self) -> Option<&VariantKey> {
        self.state.hovered.as_ref()
    }

    pub fn select(&mut self, key: VariantKey) -> Result<(), SelectionError> {
        self.ensure_known(&key)?;
        self.end_hover();
        if self.state.selected.as_ref() == Some(&key) {
            return Ok(());
        }
        self.state.selected = Some(key.clone());
        self.emit(SelectionEvent::Selected { key });
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.end_hover();
        if self.state.selected.take().is_some() {
            self.emit(SelectionEvent::Cleared);
        }
    }

    pub fn hover(&mut self, key: VariantKey) -> Result<(), SelectionError> {
        self.ensure_known(&key)?;
        if self.state.hovered.as_ref() == Some(&key) {
            return Ok(());
        }
        self.end_hover();
        self.state.hovered = Some(key.clone());
        self.emit(SelectionEvent::HoverStarted { key });
        Ok(())
    }

    /// Ends hover only if `key` is still the hovered variant.
    pub fn unhover(&mut self, key: &VariantKey) {
        if self.state.hovered.as_ref() == Some(key) {
            self.end_hover();
        }
    }

    /// Any interaction unrelated to variants.
    pub fn interact(&mut self) {
        self.end_hover();
    }

    fn end_hover(&mut self) {
        if let Some(key) = self.state.hovered.take() {
            self.emit(SelectionEvent::HoverEnded { key });
        }
    }

    fn ensure_known(&self, key: &VariantKey) -> Result<(), SelectionError> {
        if self.catalog.variant(key).is_none() {
            return Err(SelectionError::UnknownVariant(key.clone()));
        }
        Ok(())
    }

    fn emit(&self, event: SelectionEvent) {
        tracing::debug!(?event, "selection changed");
        for listener in &self.listeners {
            listener.on_selection_change(&event, &self.state);
        }
    }
}
