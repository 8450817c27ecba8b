// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Menu File Serializer
///
/// Two depth-first passes over the toplevel sequence:
/// - pass 1 writes every orphaned toplevel menu as a standalone block
/// - pass 2 writes the synthetic root-menu wrapper and everything else
///
/// Closing tags are derived from the previous node and the depth delta to the
/// next node rather than from a stack of open tags: when the walk steps back
/// up, the ancestors of the previous node between the two depths are closed
/// innermost first. The root-menu wrapper exists only in the output, so its
/// level is an indentation offset and never part of the depth arithmetic.

use quick_xml::escape::escape;

use crate::omt_types::{Element, NodeId};
use crate::omtd_document::MenuDocument;
use crate::omti_ids::ROOT_MENU_ID;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const MENU_NAMESPACE: &str = "http://openbox.org/3.4/menu";
const ROOT_MENU_LABEL: &str = "Openbox 3";

struct Emitter<'a> {
    doc: &'a MenuDocument,
    out: String,
    /// Last node written and its tree depth
    prev: Option<(NodeId, usize)>,
    /// Extra tabs for the current pass (document element, root-menu wrapper)
    indent_offset: usize,
}

impl<'a> Emitter<'a> {
    fn new(doc: &'a MenuDocument) -> Self {
        Emitter {
            doc,
            out: String::new(),
            prev: None,
            indent_offset: 0,
        }
    }

    fn line(&mut self, depth: usize, text: &str) {
        for _ in 0..depth + self.indent_offset {
            self.out.push('\t');
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    /// Close every ancestor of the previous node at or below `depth`
    fn close_to(&mut self, depth: usize) {
        let Some((prev, prev_depth)) = self.prev else {
            return;
        };
        if depth > prev_depth {
            // Stepping into the previous node's children
            return;
        }
        let closers = prev_depth - depth;
        let ancestors = self.doc.ancestors(prev);
        for (k, ancestor) in ancestors.into_iter().take(closers).enumerate() {
            if let Some(kind) = self.doc.kind(ancestor) {
                let closing = format!("</{}>", kind.tag());
                self.line(prev_depth - 1 - k, &closing);
            }
        }
    }

    fn emit(&mut self, id: NodeId, depth: usize) {
        let Some(node) = self.doc.node(id) else {
            return;
        };
        self.close_to(depth);

        let has_children = !node.children().is_empty();
        let tag = open_tag(node.element(), has_children);
        self.line(depth, &tag);
        self.prev = Some((id, depth));
    }

    /// Write a subtree in preorder
    fn emit_subtree(&mut self, root: NodeId) {
        self.emit(root, 0);
        for descendant in self.doc.descendants(root) {
            let depth = self.doc.depth(descendant);
            self.emit(descendant, depth);
        }
    }

    fn finish_pass(&mut self) {
        self.close_to(0);
        self.prev = None;
    }
}

fn is_xml_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Option text the reader would trim or drop goes out as CDATA
fn option_text(value: &str) -> String {
    if value.is_empty() || value.trim_matches(is_xml_whitespace) != value {
        format!("<![CDATA[{}]]>", value.replace("]]>", "]]]]><![CDATA[>"))
    } else {
        escape(value).into_owned()
    }
}

fn attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape(value));
    out.push('"');
}

fn open_tag(element: &Element, has_children: bool) -> String {
    let tag = element.kind().tag();
    let mut out = format!("<{}", tag);

    match element {
        Element::Menu { id, label, icon } => {
            attribute(&mut out, "id", id);
            if let Some(label) = label {
                attribute(&mut out, "label", label);
            }
            if let Some(icon) = icon {
                attribute(&mut out, "icon", &icon.path);
            }
        }
        Element::PipeMenu { id, label, execute, icon } => {
            attribute(&mut out, "id", id);
            if let Some(label) = label {
                attribute(&mut out, "label", label);
            }
            if let Some(icon) = icon {
                attribute(&mut out, "icon", &icon.path);
            }
            // Without execute it would read back as a plain menu
            attribute(&mut out, "execute", execute.as_deref().unwrap_or(""));
        }
        Element::Item { label, icon } => {
            if let Some(label) = label {
                attribute(&mut out, "label", label);
            }
            if let Some(icon) = icon {
                attribute(&mut out, "icon", &icon.path);
            }
        }
        Element::Separator { label } => {
            if let Some(label) = label {
                attribute(&mut out, "label", label);
            }
        }
        Element::Action { name } => attribute(&mut out, "name", name.as_str()),
        Element::Option { value, .. } => {
            return match value {
                Some(v) => format!("<{}>{}</{}>", tag, option_text(v), tag),
                None => format!("<{}/>", tag),
            };
        }
        Element::OptionBlock => {}
    }

    if has_children {
        out.push('>');
    } else {
        out.push_str("/>");
    }
    out
}

/// Render a document as Openbox menu XML
pub fn serialize(doc: &MenuDocument) -> String {
    let mut emitter = Emitter::new(doc);

    emitter.out.push_str(XML_DECLARATION);
    emitter.out.push('\n');
    emitter.line(0, &format!("<openbox_menu xmlns=\"{}\">", MENU_NAMESPACE));

    // Pass 1: orphans, standalone
    emitter.indent_offset = 1;
    let orphans = doc.orphaned_menus();
    for id in &orphans {
        emitter.emit_subtree(*id);
    }
    emitter.finish_pass();

    // Pass 2: root-menu wrapper and its content
    emitter.line(0, &format!("<menu id=\"{}\" label=\"{}\">", ROOT_MENU_ID, ROOT_MENU_LABEL));
    emitter.indent_offset = 2;
    for id in doc.toplevel() {
        if !orphans.contains(id) {
            emitter.emit_subtree(*id);
        }
    }
    emitter.finish_pass();
    emitter.indent_offset = 1;
    emitter.line(0, "</menu>");

    emitter.indent_offset = 0;
    emitter.line(0, "</openbox_menu>");

    log::debug!("SAVE: serialized {} nodes", doc.len());
    emitter.out
}

impl MenuDocument {
    pub fn to_xml(&self) -> String {
        serialize(self)
    }
}
