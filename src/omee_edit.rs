// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Structural Editor
///
/// Every operation validates fully before touching the tree; a rejected call
/// leaves the document exactly as it was. Successful operations finish with
/// the visibility recompute (and auto-sort, when enabled) they imply.

use crate::omer_error::{EditError, MoveError};
use crate::omt_types::{Container, Element, IconRef, NodeId};
use crate::omtd_document::MenuDocument;
use crate::omtg_grammar::{canonical_order, check_placement};

/// Prefix for identifiers handed out to copied menus
const COPY_ID_PREFIX: &str = "menu";

// ============================================================================
// SECTION 1: Insert / delete
// ============================================================================

impl MenuDocument {
    /// Insert `element` as a new leaf under `parent` (None is the root menu)
    pub fn insert(&mut self, parent: Option<NodeId>, index: usize, element: Element) -> Result<NodeId, EditError> {
        let container = self.edit_container(parent)?;
        let max = self.insert_limit(parent, None);
        if index > max {
            return Err(EditError::InvalidIndex { index, max });
        }
        check_placement(container, &self.sibling_kinds(parent, None), &element)?;

        let menu_id = element.menu_id().map(str::to_string);
        if let Some(id) = &menu_id {
            self.ids.check_available(id)?;
        }

        let kind = element.kind();
        let node = self.alloc(element);
        if let Some(id) = &menu_id {
            self.ids.register_id(id, node)?;
        }
        self.attach(parent, index, node);
        self.recompute_subtree(node);
        self.autosort_after_edit(parent);

        log::debug!("EDIT: inserted {} {} under {}", kind, node, describe(parent));
        Ok(node)
    }

    /// Remove `node` and its whole subtree; returns the menu ids released
    pub fn delete(&mut self, node: NodeId) -> Result<Vec<String>, EditError> {
        if !self.contains(node) {
            return Err(EditError::NoSuchNode(node));
        }
        self.detach(node);
        let released = self.free_subtree(node);
        log::debug!("EDIT: deleted {} (released {} ids)", node, released.len());
        Ok(released)
    }

    fn edit_container(&self, parent: Option<NodeId>) -> Result<Container, EditError> {
        match parent {
            Some(p) => self.container_of(parent).ok_or(EditError::NoSuchNode(p)),
            None => Ok(Container::RootMenu),
        }
    }

    /// Highest index a new entry may take under `parent`
    ///
    /// At the root level orphans always follow the root menu entries (they are
    /// written before the root menu), so new entries go in front of them.
    fn insert_limit(&self, parent: Option<NodeId>, excluding: Option<NodeId>) -> usize {
        let others = self.child_list(parent).iter().filter(|c| Some(**c) != excluding);
        match parent {
            Some(_) => others.count(),
            None => others.filter(|c| !self.is_orphan(**c)).count(),
        }
    }

    fn is_orphan(&self, id: NodeId) -> bool {
        self.node(id).map(|n| n.is_orphaned()).unwrap_or(false)
    }

    fn autosort_after_edit(&mut self, parent: Option<NodeId>) {
        let Some(p) = parent else {
            return;
        };
        let sortable = self.kind(p).and_then(canonical_order).is_some();
        if self.autosort && sortable {
            self.auto_sort_options(p);
        }
    }
}

fn describe(parent: Option<NodeId>) -> String {
    match parent {
        Some(p) => p.to_string(),
        None => "root menu".to_string(),
    }
}

// ============================================================================
// SECTION 2: Move
// ============================================================================

impl MenuDocument {
    /// Relocate `node` with its subtree
    ///
    /// `new_index` addresses the destination's child list with `node` already
    /// removed from it. Returns the first violated rule.
    pub fn move_node(&mut self, node: NodeId, new_parent: Option<NodeId>, new_index: usize) -> Result<(), MoveError> {
        let element = self.element(node).cloned().ok_or(MoveError::NoSuchNode(node))?;
        let container = match new_parent {
            Some(p) => self.container_of(new_parent).ok_or(MoveError::NoSuchNode(p))?,
            None => Container::RootMenu,
        };

        if let Some(p) = new_parent {
            if p == node || self.is_ancestor(node, p) {
                return Err(MoveError::Cycle);
            }
        }

        check_placement(container, &self.sibling_kinds(new_parent, Some(node)), &element)?;

        let old_parent = self.parent(node);
        let stays_put = old_parent == new_parent && self.index_in_parent(node) == Some(new_index);
        if self.autosort && old_parent == new_parent && !stays_put {
            if let Some(p) = new_parent {
                if self.kind(p).and_then(canonical_order).is_some() {
                    return Err(MoveError::AutosortReorder);
                }
            }
        }

        let max = if new_parent.is_none() && self.is_orphan(node) {
            // Orphans keep to the tail of the root level
            if new_index < self.insert_limit(None, Some(node)) {
                return Err(MoveError::OrphanPlacement);
            }
            self.toplevel().len() - 1
        } else {
            self.insert_limit(new_parent, Some(node))
        };
        if new_index > max {
            return Err(MoveError::InvalidIndex { index: new_index, max });
        }

        self.detach(node);
        self.attach(new_parent, new_index, node);
        if new_parent.is_some() {
            if let Some(n) = self.node_mut(node) {
                n.orphaned = false;
            }
        }

        let changed = self.recompute_from(node);
        self.autosort_after_edit(new_parent);

        log::debug!(
            "EDIT: moved {} under {} at {} ({} visibility changes)",
            node,
            describe(new_parent),
            new_index,
            changed
        );
        Ok(())
    }
}

// ============================================================================
// SECTION 3: Attribute edits
// ============================================================================

impl MenuDocument {
    pub fn set_label(&mut self, node: NodeId, label: Option<&str>) -> Result<(), EditError> {
        let n = self.node_mut(node).ok_or(EditError::NoSuchNode(node))?;
        let kind = n.element.kind();
        let slot = n.element.label_mut().ok_or(EditError::NotApplicable(kind))?;
        *slot = label.map(str::to_string);
        self.recompute_from(node);
        Ok(())
    }

    /// Rename a menu or pipe menu through the registry
    pub fn set_menu_id(&mut self, node: NodeId, new_id: &str) -> Result<(), EditError> {
        let element = self.element(node).ok_or(EditError::NoSuchNode(node))?;
        let kind = element.kind();
        let old_id = element.menu_id().ok_or(EditError::NotApplicable(kind))?.to_string();

        self.ids.rename(&old_id, new_id)?;
        if let Some(n) = self.node_mut(node) {
            match &mut n.element {
                Element::Menu { id, .. } | Element::PipeMenu { id, .. } => *id = new_id.to_string(),
                _ => {}
            }
        }
        log::debug!("EDIT: renamed menu '{}' to '{}'", old_id, new_id);
        Ok(())
    }

    /// Pipe menu command line
    pub fn set_execute(&mut self, node: NodeId, command: Option<&str>) -> Result<(), EditError> {
        let n = self.node_mut(node).ok_or(EditError::NoSuchNode(node))?;
        match &mut n.element {
            Element::PipeMenu { execute, .. } => {
                *execute = command.map(str::to_string);
                Ok(())
            }
            other => Err(EditError::NotApplicable(other.kind())),
        }
    }

    /// Option text; prompt values are constrained only when placed, not here
    pub fn set_option_value(&mut self, node: NodeId, new_value: Option<&str>) -> Result<(), EditError> {
        let n = self.node_mut(node).ok_or(EditError::NoSuchNode(node))?;
        match &mut n.element {
            Element::Option { value, .. } => {
                *value = new_value.map(str::to_string);
                Ok(())
            }
            other => Err(EditError::NotApplicable(other.kind())),
        }
    }

    /// Replace the icon path; the new icon starts out unchecked
    pub fn set_icon(&mut self, node: NodeId, path: Option<&str>) -> Result<(), EditError> {
        let n = self.node_mut(node).ok_or(EditError::NoSuchNode(node))?;
        let kind = n.element.kind();
        let slot = n.element.icon_mut().ok_or(EditError::NotApplicable(kind))?;
        *slot = path.map(IconRef::new);
        Ok(())
    }
}

// ============================================================================
// SECTION 4: Copy and orphan integration
// ============================================================================

impl MenuDocument {
    /// Deep-copy `node` under `new_parent`; copied menus get fresh ids
    pub fn copy_subtree(&mut self, node: NodeId, new_parent: Option<NodeId>, index: usize) -> Result<NodeId, EditError> {
        let root_element = self.element(node).cloned().ok_or(EditError::NoSuchNode(node))?;
        let container = self.edit_container(new_parent)?;
        let max = self.insert_limit(new_parent, None);
        if index > max {
            return Err(EditError::InvalidIndex { index, max });
        }
        check_placement(container, &self.sibling_kinds(new_parent, None), &root_element)?;

        // Snapshot before allocating so copying into the own subtree terminates
        let mut snapshot: Vec<(NodeId, Element)> = vec![(node, root_element)];
        for d in self.descendants(node) {
            if let Some(element) = self.element(d) {
                snapshot.push((d, element.clone()));
            }
        }

        let mut mapping: Vec<(NodeId, NodeId)> = Vec::with_capacity(snapshot.len());
        for (original, mut element) in snapshot {
            if let Element::Menu { id, .. } | Element::PipeMenu { id, .. } = &mut element {
                *id = self.ids.suggest(COPY_ID_PREFIX);
            }
            let fresh_id = element.menu_id().map(str::to_string);
            let copy = self.alloc(element);
            if let Some(id) = fresh_id {
                self.ids.register_id(&id, copy)?;
            }

            if original == node {
                self.attach(new_parent, index, copy);
            } else {
                let parent_copy = self
                    .parent(original)
                    .and_then(|p| mapping.iter().find(|(o, _)| *o == p).map(|(_, c)| *c));
                if let Some(pc) = parent_copy {
                    let at = self.child_count(pc);
                    self.attach(Some(pc), at, copy);
                }
            }
            mapping.push((original, copy));
        }

        let Some(&(_, copy_root)) = mapping.first() else {
            return Err(EditError::NoSuchNode(node));
        };
        self.recompute_subtree(copy_root);
        self.autosort_after_edit(new_parent);

        log::debug!("EDIT: copied {} to {} ({} nodes)", node, copy_root, mapping.len());
        Ok(copy_root)
    }

    /// Make every orphaned toplevel menu a regular root-menu entry
    ///
    /// Returns the number of menus integrated.
    pub fn integrate_orphans(&mut self) -> usize {
        let orphans = self.orphaned_menus();
        for id in &orphans {
            if let Some(n) = self.node_mut(*id) {
                n.orphaned = false;
            }
            self.recompute_subtree(*id);
        }
        if !orphans.is_empty() {
            log::info!("EDIT: integrated {} orphaned menus into the root menu", orphans.len());
        }
        orphans.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::omer_error::DuplicateId;
    use crate::omt_types::{ActionKind, ElementKind, OptionKey, Visibility};
    use crate::omtg_grammar::{all_kinds, is_legal_child};
    use proptest::prelude::*;

    /// apps(Apps) > [term(item) > Execute > command, sub(Sub) > leaf(item)]
    fn sample() -> (MenuDocument, NodeId, NodeId, NodeId, NodeId) {
        let mut doc = MenuDocument::new();
        let apps = doc.insert(None, 0, Element::menu("apps", Some("Apps"))).unwrap();
        let term = doc.insert(Some(apps), 0, Element::item(Some("Term"))).unwrap();
        let exec = doc.insert(Some(term), 0, Element::action(ActionKind::Execute)).unwrap();
        doc.insert(Some(exec), 0, Element::option(OptionKey::Command, Some("xterm"))).unwrap();
        let sub = doc.insert(Some(apps), 1, Element::menu("sub", Some("Sub"))).unwrap();
        let leaf = doc.insert(Some(sub), 0, Element::item(Some("Leaf"))).unwrap();
        (doc, apps, sub, leaf, exec)
    }

    #[test]
    fn test_insert_rejects_illegal_child() {
        let (mut doc, apps, _, _, exec) = sample();
        let err = doc.insert(Some(apps), 0, Element::OptionBlock).unwrap_err();
        assert_eq!(
            err,
            EditError::IllegalChild { parent: Container::Node(ElementKind::Menu), child: ElementKind::StartupNotify }
        );
        let err = doc.insert(Some(exec), 0, Element::option(OptionKey::Command, None)).unwrap_err();
        assert!(matches!(err, EditError::Cardinality { .. }));
    }

    #[test]
    fn test_insert_duplicate_id_leaves_tree_unchanged() {
        let (mut doc, apps, ..) = sample();
        let before = doc.structure();
        let err = doc.insert(Some(apps), 0, Element::menu("sub", None)).unwrap_err();
        assert_eq!(err, EditError::DuplicateId(DuplicateId("sub".to_string())));
        assert_eq!(doc.structure(), before);

        assert!(doc.insert(None, 0, Element::menu("root-menu", None)).is_err());
    }

    #[test]
    fn test_insert_invalid_index() {
        let (mut doc, apps, ..) = sample();
        let err = doc.insert(Some(apps), 5, Element::separator(None)).unwrap_err();
        assert_eq!(err, EditError::InvalidIndex { index: 5, max: 2 });
    }

    #[test]
    fn test_delete_releases_ids() {
        let (mut doc, apps, sub, leaf, _) = sample();
        let released = doc.delete(apps).unwrap();
        assert_eq!(released, vec!["apps".to_string(), "sub".to_string()]);
        assert!(!doc.contains(sub));
        assert!(!doc.contains(leaf));
        assert!(doc.ids().is_empty());
        assert_eq!(doc.delete(apps), Err(EditError::NoSuchNode(apps)));

        // Released ids are free again
        assert!(doc.insert(None, 0, Element::menu("sub", Some("Sub"))).is_ok());
    }

    #[test]
    fn test_move_into_own_descendant_is_cycle() {
        let (mut doc, apps, sub, ..) = sample();
        let before = doc.structure();
        assert_eq!(doc.move_node(apps, Some(sub), 0), Err(MoveError::Cycle));
        assert_eq!(doc.move_node(apps, Some(apps), 0), Err(MoveError::Cycle));
        assert_eq!(doc.structure(), before);
    }

    #[test]
    fn test_move_prompt_into_exit() {
        let mut doc = MenuDocument::new();
        let item = doc.insert(None, 0, Element::item(Some("Run"))).unwrap();
        let exec = doc.insert(Some(item), 0, Element::action(ActionKind::Execute)).unwrap();
        let prompt = doc.insert(Some(exec), 0, Element::option(OptionKey::Prompt, Some("Sure?"))).unwrap();
        let quit = doc.insert(None, 1, Element::item(Some("Quit"))).unwrap();
        let exit = doc.insert(Some(quit), 0, Element::action(ActionKind::Exit)).unwrap();

        assert_eq!(doc.move_node(prompt, Some(exit), 0), Err(MoveError::PromptValue));

        doc.set_option_value(prompt, Some("yes")).unwrap();
        assert_eq!(doc.move_node(prompt, Some(exit), 0), Ok(()));
        assert_eq!(doc.children(exit), &[prompt]);
        assert!(doc.children(exec).is_empty());
    }

    #[test]
    fn test_move_rejects_second_option_of_same_key() {
        let mut doc = MenuDocument::new();
        let a = doc.insert(None, 0, Element::item(Some("a"))).unwrap();
        let exec_a = doc.insert(Some(a), 0, Element::action(ActionKind::Execute)).unwrap();
        let cmd_a = doc.insert(Some(exec_a), 0, Element::option(OptionKey::Command, Some("a"))).unwrap();
        let b = doc.insert(None, 1, Element::item(Some("b"))).unwrap();
        let exec_b = doc.insert(Some(b), 0, Element::action(ActionKind::Execute)).unwrap();
        doc.insert(Some(exec_b), 0, Element::option(OptionKey::Command, Some("b"))).unwrap();

        assert!(matches!(doc.move_node(cmd_a, Some(exec_b), 0), Err(MoveError::Cardinality { .. })));

        // Same physical node is not a second option
        assert_eq!(doc.move_node(cmd_a, Some(exec_a), 0), Ok(()));
    }

    #[test]
    fn test_move_reorder_inside_sorted_parent() {
        let mut doc = MenuDocument::new();
        doc.set_autosort(true);
        let item = doc.insert(None, 0, Element::item(Some("x"))).unwrap();
        let exec = doc.insert(Some(item), 0, Element::action(ActionKind::Execute)).unwrap();
        let cmd = doc.insert(Some(exec), 0, Element::option(OptionKey::Command, Some("x"))).unwrap();
        let prompt = doc.insert(Some(exec), 1, Element::option(OptionKey::Prompt, Some("go?"))).unwrap();

        // Insert already put the prompt first
        assert_eq!(doc.children(exec), &[prompt, cmd]);
        assert_eq!(doc.move_node(cmd, Some(exec), 0), Err(MoveError::AutosortReorder));

        doc.set_autosort(false);
        assert_eq!(doc.move_node(cmd, Some(exec), 0), Ok(()));
        assert_eq!(doc.children(exec), &[cmd, prompt]);
    }

    #[test]
    fn test_move_recomputes_visibility() {
        let mut doc = MenuDocument::new();
        let hidden = doc.insert(None, 0, Element::menu("hidden", None)).unwrap();
        let shown = doc.insert(None, 1, Element::menu("shown", Some("Shown"))).unwrap();
        let sub = doc.insert(Some(shown), 0, Element::menu("sub", Some("Sub"))).unwrap();
        let leaf = doc.insert(Some(sub), 0, Element::item(Some("leaf"))).unwrap();
        assert_eq!(doc.visibility(leaf), Some(Visibility::Visible));

        doc.move_node(sub, Some(hidden), 0).unwrap();
        assert_eq!(doc.visibility(sub), Some(Visibility::InvisibleDescendantOfInvisibleMenu));
        assert_eq!(doc.visibility(leaf), Some(Visibility::InvisibleDescendantOfInvisibleMenu));

        doc.move_node(sub, None, 0).unwrap();
        assert_eq!(doc.toplevel()[0], sub);
        assert_eq!(doc.visibility(leaf), Some(Visibility::Visible));
    }

    #[test]
    fn test_move_invalid_index() {
        let (mut doc, apps, sub, ..) = sample();
        assert_eq!(
            doc.move_node(sub, Some(apps), 2),
            Err(MoveError::InvalidIndex { index: 2, max: 1 })
        );
        assert_eq!(doc.move_node(sub, Some(apps), 0), Ok(()));
        assert_eq!(doc.index_in_parent(sub), Some(0));
    }

    #[test]
    fn test_set_label_updates_descendants() {
        let (mut doc, apps, _, leaf, exec) = sample();
        doc.set_label(apps, None).unwrap();
        assert_eq!(doc.visibility(apps), Some(Visibility::InvisibleNoLabel));
        assert_eq!(doc.visibility(leaf), Some(Visibility::InvisibleDescendantOfInvisibleMenu));
        assert!(doc.missing_labels().contains(&apps));

        doc.set_label(apps, Some("Apps")).unwrap();
        assert_eq!(doc.visibility(leaf), Some(Visibility::Visible));

        assert_eq!(
            doc.set_label(exec, Some("x")),
            Err(EditError::NotApplicable(ElementKind::Action(ActionKind::Execute)))
        );
    }

    #[test]
    fn test_set_menu_id() {
        let (mut doc, apps, sub, ..) = sample();
        assert!(matches!(doc.set_menu_id(apps, "sub"), Err(EditError::DuplicateId(_))));
        assert_eq!(doc.element(apps).and_then(Element::menu_id), Some("apps"));

        doc.set_menu_id(apps, "applications").unwrap();
        assert_eq!(doc.find_menu("applications"), Some(apps));
        assert_eq!(doc.find_menu("apps"), None);
        assert_eq!(doc.find_menu("sub"), Some(sub));
    }

    #[test]
    fn test_set_execute_and_icon() {
        let mut doc = MenuDocument::new();
        let pipe = doc.insert(None, 0, Element::pipe_menu("gen", Some("Gen"), Some("a"))).unwrap();
        let item = doc.insert(None, 1, Element::item(Some("x"))).unwrap();

        doc.set_execute(pipe, Some("obmenu-gen")).unwrap();
        assert!(matches!(doc.set_execute(item, Some("x")), Err(EditError::NotApplicable(_))));

        doc.set_icon(item, Some("/usr/share/icons/x.png")).unwrap();
        assert_eq!(
            doc.element(item).and_then(Element::icon).map(|i| i.path.as_str()),
            Some("/usr/share/icons/x.png")
        );

        match doc.element(pipe) {
            Some(Element::PipeMenu { execute, .. }) => assert_eq!(execute.as_deref(), Some("obmenu-gen")),
            other => panic!("unexpected element {:?}", other),
        }
    }

    #[test]
    fn test_copy_subtree_gets_fresh_ids() {
        let (mut doc, apps, sub, ..) = sample();
        let copy = doc.copy_subtree(apps, None, 1).unwrap();

        assert_eq!(doc.toplevel(), &[apps, copy]);
        assert_eq!(doc.descendants(copy).len(), doc.descendants(apps).len());
        assert_eq!(doc.element(copy).and_then(Element::menu_id), Some("menu1"));
        assert_eq!(doc.ids().len(), 4);
        assert_eq!(doc.find_menu("sub"), Some(sub));
        assert_eq!(doc.visibility(copy), Some(Visibility::Visible));
    }

    #[test]
    fn test_copy_into_own_subtree() {
        let (mut doc, apps, sub, ..) = sample();
        let before = doc.descendants(apps).len();
        let copy = doc.copy_subtree(apps, Some(sub), 0).unwrap();
        assert_eq!(doc.parent(copy), Some(sub));
        assert_eq!(doc.descendants(copy).len(), before);
    }

    #[test]
    fn test_integrate_orphans() {
        let xml = r#"<openbox_menu>
<menu id="lost" label="Lost"><item label="x"/></menu>
<menu id="root-menu"><item label="y"/></menu>
</openbox_menu>"#;
        let mut doc = MenuDocument::from_xml(xml).unwrap();
        let lost = doc.find_menu("lost").unwrap();
        assert_eq!(doc.visibility(lost), Some(Visibility::InvisibleOrphanedMenu));

        assert_eq!(doc.integrate_orphans(), 1);
        assert_eq!(doc.visibility(lost), Some(Visibility::Visible));
        assert!(doc.diagnostics().orphaned_menus.is_empty());
        assert_eq!(doc.integrate_orphans(), 0);
    }

    const WITH_ORPHAN: &str = r#"<openbox_menu>
<menu id="O" label="Orphan"><item label="o"/></menu>
<menu id="root-menu"><item label="a"/><item label="b"/></menu>
</openbox_menu>"#;

    #[test]
    fn test_root_insert_stays_before_orphans() {
        let mut doc = MenuDocument::from_xml(WITH_ORPHAN).unwrap();
        let end = doc.toplevel().len();
        assert_eq!(
            doc.insert(None, end, Element::item(Some("new"))),
            Err(EditError::InvalidIndex { index: 3, max: 2 })
        );

        let new = doc.insert(None, 2, Element::item(Some("new"))).unwrap();
        assert_eq!(doc.index_in_parent(new), Some(2));
        let copy = doc.copy_subtree(new, None, 4);
        assert_eq!(copy, Err(EditError::InvalidIndex { index: 4, max: 3 }));

        let reloaded = MenuDocument::from_xml(&doc.to_xml()).unwrap();
        assert_eq!(reloaded.structure(), doc.structure());
    }

    #[test]
    fn test_root_moves_respect_orphan_tail() {
        let mut doc = MenuDocument::from_xml(WITH_ORPHAN).unwrap();
        let (a, orphan) = (doc.toplevel()[0], doc.find_menu("O").unwrap());

        assert_eq!(doc.move_node(a, None, 2), Err(MoveError::InvalidIndex { index: 2, max: 1 }));
        assert_eq!(doc.move_node(orphan, None, 0), Err(MoveError::OrphanPlacement));
        assert_eq!(doc.move_node(orphan, None, 2), Ok(()));
        assert_eq!(doc.move_node(a, None, 1), Ok(()));
        assert!(doc.node(orphan).unwrap().is_orphaned());

        let reloaded = MenuDocument::from_xml(&doc.to_xml()).unwrap();
        assert_eq!(reloaded.structure(), doc.structure());
    }

    #[test]
    fn test_move_in_place_inside_sorted_parent() {
        let mut doc = MenuDocument::new();
        doc.set_autosort(true);
        let item = doc.insert(None, 0, Element::item(Some("x"))).unwrap();
        let exec = doc.insert(Some(item), 0, Element::action(ActionKind::Execute)).unwrap();
        let cmd = doc.insert(Some(exec), 0, Element::option(OptionKey::Command, Some("x"))).unwrap();

        assert_eq!(doc.move_node(cmd, Some(exec), 0), Ok(()));
        assert_eq!(doc.children(exec), &[cmd]);
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    fn element_for(kind: ElementKind, n: usize, labelled: bool) -> Element {
        let label = if labelled { Some("L") } else { None };
        match kind {
            ElementKind::Menu => Element::menu(format!("m{}", n), label),
            ElementKind::PipeMenu => Element::pipe_menu(format!("p{}", n), label, Some("gen")),
            ElementKind::Item => Element::item(label),
            ElementKind::Separator => Element::separator(label),
            ElementKind::Action(a) => Element::action(a),
            ElementKind::Option(k) => Element::option(k, Some("yes")),
            ElementKind::StartupNotify => Element::OptionBlock,
        }
    }

    fn pick_parent(doc: &MenuDocument, choice: usize) -> Option<NodeId> {
        let nodes = doc.preorder();
        let slot = choice % (nodes.len() + 1);
        if slot == 0 {
            None
        } else {
            Some(nodes[slot - 1].0)
        }
    }

    fn naive_visible(doc: &MenuDocument, id: NodeId) -> bool {
        let chain = std::iter::once(id).chain(doc.ancestors(id));
        chain
            .filter_map(|n| doc.node(n))
            .filter(|n| n.kind().is_classified())
            .all(|n| !n.is_orphaned() && (n.kind() == ElementKind::Separator || n.element().label().is_some()))
    }

    proptest! {
        #[test]
        fn prop_grammar_closure(ops in proptest::collection::vec((0usize..64, 0usize..16, 0usize..4, any::<bool>()), 0..60)) {
            let kinds = all_kinds();
            let mut doc = MenuDocument::new();
            for (n, (p, k, i, labelled)) in ops.into_iter().enumerate() {
                let parent = pick_parent(&doc, p);
                let kind = kinds[k % kinds.len()];
                let container = doc.container_of(parent).unwrap();
                let index = i.min(doc.child_list(parent).len());
                let result = doc.insert(parent, index, element_for(kind, n, labelled));
                if !is_legal_child(container, kind) {
                    let rejected = matches!(result, Err(EditError::IllegalChild { .. }));
                    prop_assert!(rejected);
                }
            }
            for (id, _) in doc.preorder() {
                let container = doc.container_of(doc.parent(id)).unwrap();
                prop_assert!(is_legal_child(container, doc.kind(id).unwrap()));
            }
        }

        #[test]
        fn prop_ids_stay_unique(ops in proptest::collection::vec((0u8..3, 0usize..64, 0usize..8), 0..60)) {
            let mut doc = MenuDocument::new();
            for (op, pick, name) in ops {
                let target = pick_parent(&doc, pick);
                match op {
                    0 => {
                        let parent = target.filter(|t| doc.kind(*t) == Some(ElementKind::Menu));
                        let _ = doc.insert(parent, 0, Element::menu(format!("id{}", name), Some("M")));
                    }
                    1 => {
                        if let Some(t) = target {
                            let _ = doc.delete(t);
                        }
                    }
                    _ => {
                        if let Some(t) = target {
                            let _ = doc.set_menu_id(t, &format!("id{}", name));
                        }
                    }
                }
            }
            let mut seen = std::collections::HashSet::new();
            for (id, _) in doc.preorder() {
                if let Some(menu_id) = doc.element(id).and_then(Element::menu_id) {
                    prop_assert!(seen.insert(menu_id.to_string()));
                    prop_assert_eq!(doc.find_menu(menu_id), Some(id));
                }
            }
            prop_assert_eq!(seen.len(), doc.ids().len());
        }

        #[test]
        fn prop_visibility_matches_full_recompute(
            build in proptest::collection::vec((0usize..64, 0usize..3, any::<bool>()), 1..30),
            edits in proptest::collection::vec((0u8..2, 0usize..64, 0usize..64, any::<bool>()), 0..30),
        ) {
            let structural = [ElementKind::Menu, ElementKind::Item, ElementKind::Separator];
            let mut doc = MenuDocument::new();
            for (n, (p, k, labelled)) in build.into_iter().enumerate() {
                let parent = pick_parent(&doc, p).filter(|t| doc.kind(*t) == Some(ElementKind::Menu));
                let _ = doc.insert(parent, 0, element_for(structural[k], n, labelled));
            }
            for (op, a, b, labelled) in edits {
                let Some(node) = pick_parent(&doc, a) else { continue };
                if op == 0 {
                    let _ = doc.set_label(node, if labelled { Some("x") } else { None });
                } else {
                    let target = pick_parent(&doc, b);
                    let _ = doc.move_node(node, target, 0);
                }
            }

            let mut fresh = doc.clone();
            fresh.recompute_visibility();
            for (id, _) in doc.preorder() {
                prop_assert_eq!(doc.visibility(id), fresh.visibility(id));
                if let Some(state) = doc.visibility(id) {
                    prop_assert_eq!(state.is_visible(), naive_visible(&doc, id));
                }
            }
        }
    }
}
