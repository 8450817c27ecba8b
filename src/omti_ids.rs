// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Menu Identifier Registry
/// Tracks every menu / pipe menu id in a document, orphans included

use std::collections::HashMap;

use crate::omer_error::DuplicateId;
use crate::omt_types::NodeId;

/// Id that may never be used by a regular menu
pub const ROOT_MENU_ID: &str = "root-menu";

#[derive(Debug, Clone, Default)]
pub struct IdRegistry {
    ids: HashMap<String, NodeId>,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Err if `id` is reserved or already taken
    pub fn check_available(&self, id: &str) -> Result<(), DuplicateId> {
        if id == ROOT_MENU_ID || self.ids.contains_key(id) {
            return Err(DuplicateId(id.to_string()));
        }
        Ok(())
    }

    pub fn register_id(&mut self, id: &str, node: NodeId) -> Result<(), DuplicateId> {
        self.check_available(id)?;
        self.ids.insert(id.to_string(), node);
        Ok(())
    }

    /// Returns the node that held the id, if any
    pub fn release_id(&mut self, id: &str) -> Option<NodeId> {
        self.ids.remove(id)
    }

    /// Move `old` to `new` for the same node; leaves the registry unchanged on error
    pub fn rename(&mut self, old: &str, new: &str) -> Result<(), DuplicateId> {
        if old == new {
            return Ok(());
        }
        self.check_available(new)?;
        if let Some(node) = self.ids.remove(old) {
            self.ids.insert(new.to_string(), node);
        }
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    pub fn lookup(&self, id: &str) -> Option<NodeId> {
        self.ids.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// First free id of the form `{prefix}{n}`, n starting at 1
    pub fn suggest(&self, prefix: &str) -> String {
        let mut n = 1usize;
        loop {
            let candidate = format!("{}{}", prefix, n);
            if !self.contains(&candidate) && candidate != ROOT_MENU_ID {
                return candidate;
            }
            n += 1;
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.keys().map(String::as_str)
    }
}
