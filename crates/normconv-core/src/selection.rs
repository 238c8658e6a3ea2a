//! Which assessment tools the clinician picked for this child.

use serde::{Deserialize, Serialize};

use crate::models::{is_tool_active, ToolId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    #[serde(rename = "selectedTools", default)]
    selected: Vec<ToolId>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selected tools in the order they were picked.
    pub fn selected(&self) -> &[ToolId] {
        &self.selected
    }

    pub fn is_selected(&self, tool: ToolId) -> bool {
        self.selected.contains(&tool)
    }

    /// Add `tool` if not already selected. Returns whether it was added.
    pub fn add(&mut self, tool: ToolId) -> bool {
        if self.is_selected(tool) {
            return false;
        }
        self.selected.push(tool);
        true
    }

    /// Returns whether `tool` was selected.
    pub fn remove(&mut self, tool: ToolId) -> bool {
        let before = self.selected.len();
        self.selected.retain(|t| *t != tool);
        self.selected.len() != before
    }

    /// Flip `tool`'s selection. Returns the new state.
    pub fn toggle(&mut self, tool: ToolId) -> bool {
        if !self.remove(tool) {
            self.selected.push(tool);
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// First selected tool; score entry opens on it.
    pub fn first(&self) -> Option<ToolId> {
        self.selected.first().copied()
    }

    /// Selected tools the scoring service supports, in selection order.
    pub fn active(&self) -> Vec<ToolId> {
        self.selected
            .iter()
            .copied()
            .filter(|tool| is_tool_active(*tool))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent_and_ordered() {
        let mut selection = SelectionState::new();
        assert!(selection.add(ToolId::Pres));
        assert!(selection.add(ToolId::Selsi));
        assert!(!selection.add(ToolId::Pres));
        assert_eq!(selection.selected(), &[ToolId::Pres, ToolId::Selsi]);
        assert_eq!(selection.first(), Some(ToolId::Pres));
    }

    #[test]
    fn test_toggle_and_remove() {
        let mut selection = SelectionState::new();
        assert!(selection.toggle(ToolId::Selsi));
        assert!(selection.is_selected(ToolId::Selsi));
        assert!(!selection.toggle(ToolId::Selsi));
        assert!(selection.is_empty());
        assert!(!selection.remove(ToolId::Selsi));
    }

    #[test]
    fn test_active_filters_inactive_tools() {
        let mut selection = SelectionState::new();
        selection.add(ToolId::Pres);
        selection.add(ToolId::Selsi);
        assert_eq!(selection.active(), vec![ToolId::Selsi]);
        selection.clear();
        assert!(selection.active().is_empty());
        assert_eq!(selection.first(), None);
    }
}
