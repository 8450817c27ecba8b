// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Menu File Loader - XML Parsing Module
///
/// Two stages:
/// - an event-driven quick_xml scan that validates grammar and attributes
///   inline and appends one build record per accepted element
/// - tree construction from the flat record list, which places menus
///   declared before the root menu, resolves references to them from inside
///   the root menu, and moves the unreferenced ones (orphans) to the end
///
/// Everything after the root menu's closing tag is ignored, as Openbox does.

use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::omer_error::ParseError;
use crate::omt_types::{ActionKind, Container, Element, ElementKind, IconRef, NodeId, OptionKey};
use crate::omtd_document::MenuDocument;
use crate::omtg_grammar::{check_placement, prompt_value_ok};
use crate::omti_ids::ROOT_MENU_ID;

// ============================================================================
// SECTION 1: Vocabulary
// ============================================================================

const DOCUMENT_TAG: &str = "openbox_menu";

/// Deprecated synonym of <command>, normalized on load
const DEPRECATED_EXECUTE_TAG: &str = "execute";

lazy_static! {
    /// Attributes each element accepts; anything else is a parse error
    static ref ELEMENT_ATTRIBUTES: HashMap<&'static str, &'static [&'static str]> = {
        let mut m: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
        m.insert("menu", &["id", "label", "icon", "execute"]);
        m.insert("item", &["label", "icon"]);
        m.insert("separator", &["label"]);
        m.insert("action", &["name"]);
        m.insert("startupnotify", &[]);
        m.insert(DEPRECATED_EXECUTE_TAG, &[]);
        for key in OptionKey::ALL {
            m.insert(key.tag(), &[]);
        }
        m
    };
}

// ============================================================================
// SECTION 2: Parse-time structures (discarded after tree construction)
// ============================================================================

struct BuildRecord {
    element: Element,
    /// Tree depth; both pre-root menus and root-menu children sit at 0
    depth: usize,
    in_root: bool,
    line: usize,
}

enum Frame {
    Document,
    RootMenu,
    Node {
        kind: ElementKind,
        record: usize,
        children: Vec<ElementKind>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum RootState {
    NotSeen,
    Open,
    Closed,
}

struct Scanner {
    line_starts: Vec<usize>,
    records: Vec<BuildRecord>,
    frames: Vec<Frame>,
    root: RootState,
    deprecated_conversions: bool,
}

/// Byte offsets at which each line starts
fn line_starts_of(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (i, b) in text.as_bytes().iter().enumerate() {
        if *b == b'\n' {
            starts.push(i + 1);
        }
    }
    starts
}

// ============================================================================
// SECTION 3: Event scan (builds records)
// ============================================================================

impl Scanner {
    fn new(xml: &str) -> Self {
        Scanner {
            line_starts: line_starts_of(xml),
            records: Vec::new(),
            frames: Vec::new(),
            root: RootState::NotSeen,
            deprecated_conversions: false,
        }
    }

    /// 1-based line of the byte just before `pos`
    fn line_at(&self, pos: usize) -> usize {
        let pos = pos.saturating_sub(1);
        self.line_starts.partition_point(|&s| s <= pos).max(1)
    }

    fn node_depth(&self) -> usize {
        self.frames.iter().filter(|f| matches!(f, Frame::Node { .. })).count()
    }

    fn read_attributes(e: &BytesStart, tag: &str, line: usize) -> Result<Vec<(String, String)>, ParseError> {
        let allowed = ELEMENT_ATTRIBUTES.get(tag).copied();
        let mut out = Vec::new();

        for attr in e.attributes() {
            let attr = attr.map_err(|err| match err {
                AttrError::Duplicated(..) => ParseError::new(line, format!("duplicate attribute in <{}>", tag)),
                other => ParseError::new(line, format!("attribute error in <{}>: {}", tag, other)),
            })?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();

            // Document element: namespace declarations and the like pass through
            if let Some(allowed) = allowed {
                if !allowed.contains(&key.as_str()) {
                    return Err(ParseError::new(line, format!("unknown attribute '{}' in <{}>", key, tag)));
                }
            }

            let value = attr
                .unescape_value()
                .map_err(|err| ParseError::new(line, format!("invalid value for '{}': {}", key, err)))?
                .into_owned();
            out.push((key, value));
        }

        Ok(out)
    }

    fn open(&mut self, e: &BytesStart, line: usize) -> Result<(), ParseError> {
        let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();

        match self.frames.last() {
            None => {
                if tag != DOCUMENT_TAG {
                    return Err(ParseError::new(
                        line,
                        format!("document element must be <{}>, found <{}>", DOCUMENT_TAG, tag),
                    ));
                }
                Self::read_attributes(e, &tag, line)?;
                self.frames.push(Frame::Document);
                return Ok(());
            }
            Some(Frame::Document) if tag != "menu" => {
                return Err(ParseError::new(line, format!("<{}> outside of a menu", tag)));
            }
            _ => {}
        }

        if !ELEMENT_ATTRIBUTES.contains_key(tag.as_str()) {
            return Err(ParseError::new(line, format!("unknown element <{}>", tag)));
        }
        let attrs = Self::read_attributes(e, &tag, line)?;
        let attr = |name: &str| attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone());

        if tag == "menu" && attr("id").as_deref() == Some(ROOT_MENU_ID) {
            return self.open_root_menu(line);
        }

        let element = match tag.as_str() {
            "menu" => {
                let id = attr("id").ok_or_else(|| ParseError::new(line, "menu without an id"))?;
                let label = attr("label");
                let icon = attr("icon").map(IconRef::new);
                match attr("execute") {
                    Some(execute) => Element::PipeMenu { id, label, execute: Some(execute), icon },
                    None => Element::Menu { id, label, icon },
                }
            }
            "item" => Element::Item {
                label: attr("label"),
                icon: attr("icon").map(IconRef::new),
            },
            "separator" => Element::Separator { label: attr("label") },
            "action" => {
                let name = attr("name").ok_or_else(|| ParseError::new(line, "action without a name"))?;
                let kind = ActionKind::parse(&name)
                    .ok_or_else(|| ParseError::new(line, format!("unknown action '{}'", name)))?;
                Element::Action { name: kind }
            }
            "startupnotify" => Element::OptionBlock,
            DEPRECATED_EXECUTE_TAG => {
                log::debug!("LOAD: line {} converting deprecated <execute> to <command>", line);
                self.deprecated_conversions = true;
                Element::Option { key: OptionKey::Command, value: None }
            }
            other => {
                let key = OptionKey::ALL
                    .iter()
                    .copied()
                    .find(|k| k.tag() == other)
                    .ok_or_else(|| ParseError::new(line, format!("unknown element <{}>", other)))?;
                Element::Option { key, value: None }
            }
        };

        let depth = self.node_depth();
        let in_root = self.root == RootState::Open;
        let kind = element.kind();

        match self.frames.last_mut() {
            Some(Frame::Document) => {
                // Pre-root toplevel: only (pipe) menus, by the tag check above
            }
            Some(Frame::RootMenu) => {
                check_placement(Container::RootMenu, &[], &element)
                    .map_err(|v| ParseError::new(line, v.to_string()))?;
            }
            Some(Frame::Node { kind: parent, children, .. }) => {
                check_placement(Container::Node(*parent), children.as_slice(), &element)
                    .map_err(|v| ParseError::new(line, v.to_string()))?;
                children.push(kind);
            }
            None => {}
        }

        self.records.push(BuildRecord { element, depth, in_root, line });
        self.frames.push(Frame::Node {
            kind,
            record: self.records.len() - 1,
            children: Vec::new(),
        });
        Ok(())
    }

    fn open_root_menu(&mut self, line: usize) -> Result<(), ParseError> {
        if self.root != RootState::NotSeen {
            return Err(ParseError::new(line, "second root-menu"));
        }
        if !matches!(self.frames.last(), Some(Frame::Document)) {
            return Err(ParseError::new(line, format!("root-menu must be a direct child of <{}>", DOCUMENT_TAG)));
        }
        self.root = RootState::Open;
        self.frames.push(Frame::RootMenu);
        Ok(())
    }

    /// Returns true once the root menu has been closed
    fn close(&mut self, line: usize) -> Result<bool, ParseError> {
        match self.frames.pop() {
            Some(Frame::RootMenu) => {
                self.root = RootState::Closed;
                Ok(true)
            }
            Some(Frame::Document) => Err(ParseError::new(line, "no root-menu found")),
            Some(Frame::Node { kind: ElementKind::Option(OptionKey::Prompt), record, .. }) => {
                let parent = match self.frames.last() {
                    Some(Frame::Node { kind, .. }) => Container::Node(*kind),
                    _ => Container::RootMenu,
                };
                if !prompt_value_ok(parent, &self.records[record].element) {
                    return Err(ParseError::new(
                        line,
                        "prompt value must be 'yes' or 'no' inside an Exit or SessionLogout action",
                    ));
                }
                Ok(false)
            }
            _ => Ok(false),
        }
    }

    fn text(&mut self, text: &str, line: usize) {
        match self.frames.last() {
            Some(Frame::Node { kind: ElementKind::Option(_), record, .. }) => {
                if let Element::Option { value, .. } = &mut self.records[*record].element {
                    value.get_or_insert_with(String::new).push_str(text);
                }
            }
            _ => {
                if !text.trim().is_empty() {
                    log::debug!("LOAD: line {} ignoring stray text '{}'", line, text.trim());
                }
            }
        }
    }

    fn scan(mut self, xml: &str) -> Result<Self, ParseError> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut buf = Vec::new();

        loop {
            let event = reader.read_event_into(&mut buf);
            let line = self.line_at(reader.buffer_position());

            match event {
                Ok(Event::Start(ref e)) => self.open(e, line)?,
                Ok(Event::Empty(ref e)) => {
                    self.open(e, line)?;
                    if self.close(line)? {
                        break;
                    }
                }
                Ok(Event::End(_)) => {
                    if self.close(line)? {
                        break;
                    }
                }
                Ok(Event::Text(ref e)) => {
                    let text = e
                        .unescape()
                        .map_err(|err| ParseError::new(line, format!("XML parse error: {}", err)))?;
                    self.text(&text, line);
                }
                Ok(Event::CData(e)) => {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    self.text(&text, line);
                }
                Ok(Event::Eof) => {
                    return Err(match self.root {
                        RootState::NotSeen => ParseError::new(line, "no root-menu found"),
                        _ => ParseError::new(line, "unexpected end of file"),
                    });
                }
                Err(e) => {
                    return Err(ParseError::new(line, format!("XML parse error: {}", e)));
                }
                _ => {}
            }
            buf.clear();
        }

        Ok(self)
    }
}

// ============================================================================
// SECTION 4: Tree construction (records → document)
// ============================================================================

fn build(records: Vec<BuildRecord>) -> Result<MenuDocument, ParseError> {
    let mut doc = MenuDocument::new();

    // Menus declared before the root menu, in declaration order
    let mut pre_root: Vec<NodeId> = Vec::new();
    let mut referenced: HashSet<NodeId> = HashSet::new();
    let mut root_order: Vec<NodeId> = Vec::new();
    let mut parents: Vec<NodeId> = Vec::new();
    // Depth of the last reference seen; references may not carry content
    let mut reference_depth: Option<usize> = None;

    for record in records {
        if let Some(ref_depth) = reference_depth {
            if record.depth > ref_depth {
                return Err(ParseError::new(
                    record.line,
                    "a reference to a menu defined outside the root menu cannot have content",
                ));
            }
            reference_depth = None;
        }
        parents.truncate(record.depth);

        if record.depth == 0 && record.in_root {
            if let Some(existing) = resolve_reference(&doc, &pre_root, &record) {
                if !referenced.insert(existing) {
                    let id = record.element.menu_id().unwrap_or_default();
                    return Err(ParseError::new(record.line, format!("menu '{}' referenced twice", id)));
                }
                merge_reference(&mut doc, existing, record.element);
                log::debug!("LOAD: line {} resolved reference to toplevel menu", record.line);
                root_order.push(existing);
                parents.push(existing);
                reference_depth = Some(0);
                continue;
            }
        } else if record.in_root && resolve_reference(&doc, &pre_root, &record).is_some() {
            return Err(ParseError::new(
                record.line,
                "references to pre-declared menus are only supported directly inside the root menu",
            ));
        }

        let line = record.line;
        let depth = record.depth;
        let menu_id = record.element.menu_id().map(str::to_string);
        let node = doc.alloc(record.element);
        if let Some(id) = menu_id {
            doc.ids
                .register_id(&id, node)
                .map_err(|e| ParseError::new(line, e.to_string()))?;
        }

        if depth == 0 {
            if record.in_root {
                root_order.push(node);
            } else {
                pre_root.push(node);
            }
        } else {
            let parent = parents
                .last()
                .copied()
                .ok_or_else(|| ParseError::new(line, "element without a parent"))?;
            let index = doc.child_count(parent);
            doc.attach(Some(parent), index, node);
        }
        parents.push(node);
    }

    // Root-menu order first, then orphans in declaration order
    for node in root_order {
        let index = doc.toplevel().len();
        doc.attach(None, index, node);
    }
    for node in pre_root {
        if referenced.contains(&node) {
            continue;
        }
        if let Some(n) = doc.node_mut(node) {
            n.orphaned = true;
        }
        let index = doc.toplevel().len();
        doc.attach(None, index, node);
    }

    Ok(doc)
}

/// Pre-root toplevel menu that a root-menu child refers to by id
fn resolve_reference(doc: &MenuDocument, pre_root: &[NodeId], record: &BuildRecord) -> Option<NodeId> {
    let id = record.element.menu_id()?;
    let existing = doc.find_menu(id)?;
    pre_root.contains(&existing).then_some(existing)
}

/// Fold attributes of a reference into the referenced menu where it has none
fn merge_reference(doc: &mut MenuDocument, existing: NodeId, reference: Element) {
    let Some(node) = doc.node_mut(existing) else {
        return;
    };
    if let (Some(label), Some(ref_label)) = (node.element.label_mut(), reference.label()) {
        if label.is_none() {
            *label = Some(ref_label.to_string());
        }
    }
    if let (Some(icon), Some(ref_icon)) = (node.element.icon_mut(), reference.icon()) {
        if icon.is_none() {
            *icon = Some(ref_icon.clone());
        }
    }
}

// ============================================================================
// SECTION 5: Public entry points
// ============================================================================

impl MenuDocument {
    /// Parse an Openbox menu document
    pub fn from_xml(xml: &str) -> Result<Self, ParseError> {
        let scanner = Scanner::new(xml).scan(xml)?;
        let deprecated = scanner.deprecated_conversions;

        let mut doc = build(scanner.records)?;
        doc.deprecated_conversions = deprecated;
        doc.recompute_visibility();

        let diagnostics = doc.diagnostics();
        for id in &diagnostics.orphaned_menus {
            log::warn!("LOAD: menu '{}' is defined but not used inside the root menu", id);
        }
        if !diagnostics.missing_labels.is_empty() {
            log::warn!("LOAD: {} menus/items have no label", diagnostics.missing_labels.len());
        }
        if diagnostics.deprecated_conversions {
            log::warn!("LOAD: deprecated <execute> options were converted to <command>");
        }
        log::info!("LOAD: {} nodes, {} toplevel", doc.len(), doc.toplevel().len());

        Ok(doc)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ParseError> {
        let xml = std::str::from_utf8(bytes).map_err(|e| {
            let line = bytes[..e.valid_up_to()].iter().filter(|b| **b == b'\n').count() + 1;
            ParseError::new(line, "file is not valid UTF-8")
        })?;
        Self::from_xml(xml)
    }
}

/// Parse raw file contents into a document
pub fn load(bytes: &[u8]) -> Result<MenuDocument, ParseError> {
    MenuDocument::from_bytes(bytes)
}
