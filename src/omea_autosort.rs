// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Option Auto-Sort
/// Canonical ordering of Execute and startupnotify children
///
/// A selection pass that swaps each wanted kind into the next free slot. Only
/// the two swapped nodes change position, so the node a UI had selected keeps
/// its identity across the sort.

use crate::omt_types::NodeId;
use crate::omtd_document::MenuDocument;
use crate::omtg_grammar::canonical_order;

impl MenuDocument {
    /// Reorder the option children of `parent` into canonical order
    ///
    /// Returns true if anything moved. Parents without a canonical order are
    /// left alone.
    pub fn auto_sort_options(&mut self, parent: NodeId) -> bool {
        let Some(order) = self.kind(parent).and_then(canonical_order) else {
            return false;
        };
        let mut kinds: Vec<_> = self.children(parent).iter().filter_map(|c| self.kind(*c)).collect();
        let Some(children) = self.node_mut(parent).map(|n| &mut n.children) else {
            return false;
        };

        let mut next = 0;
        let mut swapped = false;
        for wanted in order {
            let Some(found) = (next..kinds.len()).find(|i| kinds[*i] == *wanted) else {
                continue;
            };
            if found != next {
                children.swap(next, found);
                kinds.swap(next, found);
                swapped = true;
            }
            next += 1;
        }

        if swapped {
            log::debug!("EDIT: sorted options of {}", parent);
        }
        swapped
    }

    /// Sort every Execute action and startupnotify block; returns how many changed
    pub fn auto_sort_all(&mut self) -> usize {
        let parents: Vec<NodeId> = self
            .preorder()
            .into_iter()
            .map(|(id, _)| id)
            .filter(|id| self.kind(*id).and_then(canonical_order).is_some())
            .collect();

        parents.into_iter().filter(|p| self.auto_sort_options(*p)).count()
    }
}
