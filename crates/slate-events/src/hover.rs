//! Hover-path tracking for mouseenter/mouseleave derivation.
//!
//! The host pump hit-tests each pointer move, hands the resulting ancestor
//! path here, and dispatches enter/leave events for the differences.

use slate_dom::NodeId;
use std::collections::HashSet;
use tracing::debug;

/// Tracks which elements the pointer is currently over.
#[derive(Debug, Default)]
pub struct HoverTracker {
    /// Currently hovered elements (from root to deepest).
    hovered_path: Vec<NodeId>,
    /// Set view of the path for membership checks.
    hover_set: HashSet<NodeId>,
}

impl HoverTracker {
    /// Create a new hover tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update hover state with a new path (root to deepest).
    /// Returns (elements_entered, elements_left).
    pub fn update(&mut self, new_path: Vec<NodeId>) -> (Vec<NodeId>, Vec<NodeId>) {
        let old_set: HashSet<_> = self.hovered_path.iter().cloned().collect();
        let new_set: HashSet<_> = new_path.iter().cloned().collect();

        // Elements that were hovered but no longer are
        let left: Vec<_> = self
            .hovered_path
            .iter()
            .filter(|n| !new_set.contains(n))
            .cloned()
            .collect();

        // Elements that are now hovered but weren't before
        let entered: Vec<_> = new_path
            .iter()
            .filter(|n| !old_set.contains(n))
            .cloned()
            .collect();

        self.hovered_path = new_path;
        self.hover_set = new_set;

        if !entered.is_empty() || !left.is_empty() {
            debug!(
                entered = entered.len(),
                left = left.len(),
                "hover path changed"
            );
        }

        (entered, left)
    }

    /// Check if an element is hovered.
    pub fn is_hovered(&self, node_id: NodeId) -> bool {
        self.hover_set.contains(&node_id)
    }

    /// Get the current hover path.
    pub fn hover_path(&self) -> &[NodeId] {
        &self.hovered_path
    }

    /// Clear all hover state.
    pub fn clear(&mut self) {
        self.hovered_path.clear();
        self.hover_set.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_and_leave_diffing() {
        let mut tracker = HoverTracker::new();

        let (entered, left) = tracker.update(vec![NodeId::new(1), NodeId::new(2)]);
        assert_eq!(entered, vec![NodeId::new(1), NodeId::new(2)]);
        assert!(left.is_empty());

        // Move deeper under the same ancestor.
        let (entered, left) = tracker.update(vec![NodeId::new(1), NodeId::new(3)]);
        assert_eq!(entered, vec![NodeId::new(3)]);
        assert_eq!(left, vec![NodeId::new(2)]);

        assert!(tracker.is_hovered(NodeId::new(1)));
        assert!(!tracker.is_hovered(NodeId::new(2)));
    }

    #[test]
    fn test_clear() {
        let mut tracker = HoverTracker::new();
        tracker.update(vec![NodeId::new(1)]);
        tracker.clear();
        assert!(tracker.hover_path().is_empty());
        assert!(!tracker.is_hovered(NodeId::new(1)));
    }
}
