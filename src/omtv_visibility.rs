// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Visibility Engine
///
/// A node's classification depends only on its own label, its orphan flag
/// and the classification of its nearest classified ancestor, so a localized
/// recompute may start at any node and stop as soon as a state is unchanged.

use crate::omt_types::{Element, ElementKind, NodeId, Visibility};
use crate::omtd_document::MenuDocument;

/// Classification of a single node given its ancestor's state
///
/// Returns None for actions, options and option blocks.
pub fn classify(element: &Element, orphaned: bool, ancestor: Option<Visibility>) -> Option<Visibility> {
    let kind = element.kind();
    if !kind.is_classified() {
        return None;
    }

    let state = match ancestor {
        Some(a) if a.is_orphan_related() => Visibility::InvisibleDescendantOfInvisibleOrphanedMenu,
        Some(a) if !a.is_visible() => Visibility::InvisibleDescendantOfInvisibleMenu,
        _ if orphaned => Visibility::InvisibleOrphanedMenu,
        _ if kind != ElementKind::Separator && element.label().is_none() => Visibility::InvisibleNoLabel,
        _ => Visibility::Visible,
    };
    Some(state)
}

impl MenuDocument {
    /// State handed down to the children of `id`
    fn inherited_state(&self, id: NodeId) -> Option<Visibility> {
        let node = self.node(id)?;
        match node.visibility {
            Some(v) => Some(v),
            None => node.parent.and_then(|p| self.inherited_state(p)),
        }
    }

    /// Ancestor state for `id` as seen from its current position
    pub(crate) fn ancestor_state(&self, id: NodeId) -> Option<Visibility> {
        self.parent(id).and_then(|p| self.inherited_state(p))
    }

    /// Walk the whole tree once
    pub fn recompute_visibility(&mut self) {
        let toplevel: Vec<NodeId> = self.toplevel().to_vec();
        for id in toplevel {
            self.propagate(id, None, true);
        }
    }

    /// Recompute `id` and its descendants unconditionally
    pub fn recompute_subtree(&mut self, id: NodeId) {
        let ancestor = self.ancestor_state(id);
        self.propagate(id, ancestor, true);
    }

    /// Recompute `id` and descend only while states keep changing
    ///
    /// Returns the number of nodes whose state changed.
    pub fn recompute_from(&mut self, id: NodeId) -> usize {
        let ancestor = self.ancestor_state(id);
        self.propagate(id, ancestor, false)
    }

    fn propagate(&mut self, id: NodeId, ancestor: Option<Visibility>, force: bool) -> usize {
        let Some(node) = self.node(id) else {
            return 0;
        };
        let new_state = classify(&node.element, node.orphaned, ancestor);
        let changed = node.visibility != new_state;
        let children: Vec<NodeId> = node.children.clone();

        if let Some(node) = self.node_mut(id) {
            node.visibility = new_state;
        }

        let mut count = usize::from(changed);
        if changed || force {
            // Unclassified nodes pass their ancestor's state through
            let handed_down = new_state.or(ancestor);
            for child in children {
                count += self.propagate(child, handed_down, force);
            }
        }
        count
    }
}
