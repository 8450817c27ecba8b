// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Menu Document Tree
///
/// Arena of nodes addressed by stable [`NodeId`]s. Each node owns the ordered
/// list of its children; the parent link is informational only. The implicit
/// root-menu level is the `toplevel` list, which also holds orphaned menus.
///
/// Mutations live in sibling modules (`omee_edit`, `omtv_visibility`,
/// `omea_autosort`); this module provides storage and structural queries.

use std::fs;

use crate::omt_types::{Container, Element, ElementKind, IconStatus, NodeId, Visibility};
use crate::omti_ids::IdRegistry;

// ============================================================================
// SECTION 1: Node storage
// ============================================================================

#[derive(Debug, Clone)]
pub struct MenuNode {
    pub(crate) element: Element,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// None for actions and options
    pub(crate) visibility: Option<Visibility>,
    /// Toplevel menu declared outside the root menu and never referenced there
    pub(crate) orphaned: bool,
}

impl MenuNode {
    fn new(element: Element, parent: Option<NodeId>) -> Self {
        MenuNode {
            element,
            parent,
            children: Vec::new(),
            visibility: None,
            orphaned: false,
        }
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn kind(&self) -> ElementKind {
        self.element.kind()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn visibility(&self) -> Option<Visibility> {
        self.visibility
    }

    pub fn is_orphaned(&self) -> bool {
        self.orphaned
    }
}

/// Informational classifications for the host UI; never errors
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub orphaned_menus: Vec<String>,
    pub missing_labels: Vec<NodeId>,
    pub deprecated_conversions: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MenuDocument {
    nodes: Vec<Option<MenuNode>>,
    toplevel: Vec<NodeId>,
    pub(crate) ids: IdRegistry,
    pub(crate) autosort: bool,
    pub(crate) deprecated_conversions: bool,
}

// ============================================================================
// SECTION 2: Arena primitives (crate-internal)
// ============================================================================

impl MenuDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn alloc(&mut self, element: Element) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(MenuNode::new(element, None)));
        id
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut MenuNode> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub(crate) fn child_list_mut(&mut self, parent: Option<NodeId>) -> Option<&mut Vec<NodeId>> {
        match parent {
            None => Some(&mut self.toplevel),
            Some(p) => self.node_mut(p).map(|n| &mut n.children),
        }
    }

    /// Link a detached node under `parent` at `index` (caller validated both)
    pub(crate) fn attach(&mut self, parent: Option<NodeId>, index: usize, id: NodeId) {
        if let Some(list) = self.child_list_mut(parent) {
            let index = index.min(list.len());
            list.insert(index, id);
        }
        if let Some(node) = self.node_mut(id) {
            node.parent = parent;
        }
    }

    /// Unlink a node from its parent's child list; returns its former index
    pub(crate) fn detach(&mut self, id: NodeId) -> Option<usize> {
        let parent = self.node(id)?.parent;
        let list = self.child_list_mut(parent)?;
        let index = list.iter().position(|c| *c == id)?;
        list.remove(index);
        Some(index)
    }

    /// Drop a detached subtree from the arena; returns the menu ids it released
    pub(crate) fn free_subtree(&mut self, id: NodeId) -> Vec<String> {
        let mut released = Vec::new();
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let Some(node) = self.nodes.get_mut(current.0).and_then(Option::take) else {
                continue;
            };
            if let Some(menu_id) = node.element.menu_id() {
                self.ids.release_id(menu_id);
                released.push(menu_id.to_string());
            }
            pending.extend(node.children.iter().rev().copied());
        }
        released
    }
}

// ============================================================================
// SECTION 3: Structural queries
// ============================================================================

impl MenuDocument {
    pub fn node(&self, id: NodeId) -> Option<&MenuNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.node(id).map(|n| &n.element)
    }

    pub fn kind(&self, id: NodeId) -> Option<ElementKind> {
        self.node(id).map(MenuNode::kind)
    }

    pub fn visibility(&self, id: NodeId) -> Option<Visibility> {
        self.node(id).and_then(|n| n.visibility)
    }

    pub fn toplevel(&self) -> &[NodeId] {
        &self.toplevel
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Children of `parent`, where None is the root-menu level
    pub fn child_list(&self, parent: Option<NodeId>) -> &[NodeId] {
        match parent {
            None => &self.toplevel,
            Some(p) => self.children(p),
        }
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.node(id)?.parent;
        self.child_list(parent).iter().position(|c| *c == id)
    }

    /// Toplevel nodes have depth 0
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).len()
    }

    /// Nearest ancestor first
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(p) = current {
            out.push(p);
            current = self.parent(p);
        }
        out
    }

    /// Preorder, excluding `id` itself
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut pending: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = pending.pop() {
            out.push(current);
            pending.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    pub fn is_ancestor(&self, ancestor: NodeId, of: NodeId) -> bool {
        self.ancestors(of).contains(&ancestor)
    }

    /// Whole tree in document order with depths
    pub fn preorder(&self) -> Vec<(NodeId, usize)> {
        let mut out = Vec::new();
        let mut pending: Vec<(NodeId, usize)> = self.toplevel.iter().rev().map(|id| (*id, 0)).collect();
        while let Some((current, depth)) = pending.pop() {
            out.push((current, depth));
            pending.extend(self.children(current).iter().rev().map(|c| (*c, depth + 1)));
        }
        out
    }

    /// Grammar slot described by `parent`; None if the parent does not exist
    pub fn container_of(&self, parent: Option<NodeId>) -> Option<Container> {
        match parent {
            None => Some(Container::RootMenu),
            Some(p) => self.kind(p).map(Container::Node),
        }
    }

    /// Kinds of the children of `parent`, leaving out `excluding`
    pub fn sibling_kinds(&self, parent: Option<NodeId>, excluding: Option<NodeId>) -> Vec<ElementKind> {
        self.child_list(parent)
            .iter()
            .filter(|c| Some(**c) != excluding)
            .filter_map(|c| self.kind(*c))
            .collect()
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.toplevel.is_empty()
    }

    pub fn ids(&self) -> &IdRegistry {
        &self.ids
    }

    pub fn find_menu(&self, id: &str) -> Option<NodeId> {
        self.ids.lookup(id)
    }

    /// (depth, element, orphaned) in document order, icon status normalized
    pub fn structure(&self) -> Vec<(usize, Element, bool)> {
        self.preorder()
            .into_iter()
            .filter_map(|(id, depth)| {
                self.node(id).map(|n| (depth, n.element.normalized(), n.orphaned))
            })
            .collect()
    }
}

// ============================================================================
// SECTION 4: Diagnostics, settings and icons
// ============================================================================

impl MenuDocument {
    pub fn autosort_enabled(&self) -> bool {
        self.autosort
    }

    pub fn set_autosort(&mut self, enabled: bool) {
        self.autosort = enabled;
    }

    pub fn orphaned_menus(&self) -> Vec<NodeId> {
        self.toplevel
            .iter()
            .copied()
            .filter(|id| self.node(*id).map(|n| n.orphaned).unwrap_or(false))
            .collect()
    }

    /// Menus and items without a label, in document order
    pub fn missing_labels(&self) -> Vec<NodeId> {
        self.preorder()
            .into_iter()
            .filter(|(id, _)| {
                self.node(*id)
                    .map(|n| {
                        matches!(n.kind(), ElementKind::Menu | ElementKind::PipeMenu | ElementKind::Item)
                            && n.element.label().is_none()
                    })
                    .unwrap_or(false)
            })
            .map(|(id, _)| id)
            .collect()
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            orphaned_menus: self
                .orphaned_menus()
                .into_iter()
                .filter_map(|id| self.element(id).and_then(Element::menu_id).map(str::to_string))
                .collect(),
            missing_labels: self.missing_labels(),
            deprecated_conversions: self.deprecated_conversions,
        }
    }

    /// Probe every icon path on disk and record validity and modification time
    ///
    /// Invalid icons are kept verbatim. Returns the number of invalid icons.
    pub fn refresh_icon_status(&mut self) -> usize {
        let mut invalid = 0;
        for slot in self.nodes.iter_mut().flatten() {
            let Some(Some(icon)) = slot.element.icon_mut() else {
                continue;
            };
            match fs::metadata(&icon.path) {
                Ok(meta) if meta.is_file() => {
                    icon.status = IconStatus::Valid;
                    icon.modified = meta.modified().ok();
                }
                _ => {
                    log::warn!("ICON: invalid icon path '{}'", icon.path);
                    icon.status = IconStatus::Invalid;
                    icon.modified = None;
                    invalid += 1;
                }
            }
        }
        invalid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::omt_types::{ActionKind, IconRef, OptionKey};

    fn sample() -> (MenuDocument, NodeId, NodeId, NodeId, NodeId) {
        let mut doc = MenuDocument::new();
        let menu = doc.alloc(Element::menu("apps", Some("Apps")));
        doc.attach(None, 0, menu);
        let item = doc.alloc(Element::item(Some("Term")));
        doc.attach(Some(menu), 0, item);
        let action = doc.alloc(Element::action(ActionKind::Execute));
        doc.attach(Some(item), 0, action);
        let command = doc.alloc(Element::option(OptionKey::Command, Some("xterm")));
        doc.attach(Some(action), 0, command);
        (doc, menu, item, action, command)
    }

    #[test]
    fn test_depth_and_ancestors() {
        let (doc, menu, item, action, command) = sample();
        assert_eq!(doc.depth(menu), 0);
        assert_eq!(doc.depth(command), 3);
        assert_eq!(doc.ancestors(command), vec![action, item, menu]);
        assert!(doc.is_ancestor(menu, command));
        assert!(!doc.is_ancestor(command, menu));
    }

    #[test]
    fn test_descendants_preorder() {
        let (doc, menu, item, action, command) = sample();
        assert_eq!(doc.descendants(menu), vec![item, action, command]);
        assert_eq!(
            doc.preorder(),
            vec![(menu, 0), (item, 1), (action, 2), (command, 3)]
        );
    }

    #[test]
    fn test_detach_and_free() {
        let (mut doc, menu, item, _, command) = sample();
        doc.ids.register_id("apps", menu).unwrap();

        assert_eq!(doc.detach(item), Some(0));
        assert_eq!(doc.child_count(menu), 0);
        assert!(doc.free_subtree(item).is_empty());
        assert!(!doc.contains(command));

        doc.detach(menu);
        assert_eq!(doc.free_subtree(menu), vec!["apps".to_string()]);
        assert!(!doc.ids().contains("apps"));
        assert_eq!(doc.len(), 0);
    }

    #[test]
    fn test_missing_icon_marked_invalid() {
        let mut doc = MenuDocument::new();
        let item = doc.alloc(Element::Item {
            label: Some("x".to_string()),
            icon: Some(IconRef::new("/nonexistent/icon.png")),
        });
        doc.attach(None, 0, item);

        assert_eq!(doc.refresh_icon_status(), 1);
        let icon = doc.element(item).and_then(Element::icon).unwrap();
        assert_eq!(icon.status, IconStatus::Invalid);
        assert_eq!(icon.path, "/nonexistent/icon.png");
    }
}
