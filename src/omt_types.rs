// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Menu Document Types
///
/// Element variants, kind tags and per-node metadata shared by the loader,
/// the serializer and the structural editor.

use std::fmt;
use std::time::SystemTime;

// ============================================================================
// SECTION 1: Node identity
// ============================================================================

/// Stable index of a node inside a document arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// SECTION 2: Actions and options
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Execute,
    Exit,
    Reconfigure,
    Restart,
    SessionLogout,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        ActionKind::Execute,
        ActionKind::Exit,
        ActionKind::Reconfigure,
        ActionKind::Restart,
        ActionKind::SessionLogout,
    ];

    /// Canonical spelling written to disk
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Execute => "Execute",
            ActionKind::Exit => "Exit",
            ActionKind::Reconfigure => "Reconfigure",
            ActionKind::Restart => "Restart",
            ActionKind::SessionLogout => "SessionLogout",
        }
    }

    /// Openbox matches action names case-insensitively
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.as_str().eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKey {
    Prompt,
    Command,
    Enabled,
    Name,
    WmClass,
    Icon,
}

impl OptionKey {
    pub const ALL: [OptionKey; 6] = [
        OptionKey::Prompt,
        OptionKey::Command,
        OptionKey::Enabled,
        OptionKey::Name,
        OptionKey::WmClass,
        OptionKey::Icon,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            OptionKey::Prompt => "prompt",
            OptionKey::Command => "command",
            OptionKey::Enabled => "enabled",
            OptionKey::Name => "name",
            OptionKey::WmClass => "wmclass",
            OptionKey::Icon => "icon",
        }
    }

    /// True for the four suboptions that live inside a startupnotify block
    pub fn is_startupnotify_option(self) -> bool {
        matches!(self, OptionKey::Enabled | OptionKey::Name | OptionKey::WmClass | OptionKey::Icon)
    }
}

// ============================================================================
// SECTION 3: Icon reference
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconStatus {
    /// Not yet probed (fresh from the loader or the editor)
    Unchecked,
    Valid,
    /// Path is kept verbatim; the menu stays editable
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconRef {
    pub path: String,
    pub status: IconStatus,
    pub modified: Option<SystemTime>,
}

impl IconRef {
    pub fn new(path: impl Into<String>) -> Self {
        IconRef {
            path: path.into(),
            status: IconStatus::Unchecked,
            modified: None,
        }
    }

    /// Same path with status fields reset (status is recomputed, never persisted)
    pub fn normalized(&self) -> Self {
        IconRef::new(self.path.clone())
    }
}

// ============================================================================
// SECTION 4: Elements
// ============================================================================

/// Payload of a single tree node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Menu {
        id: String,
        label: Option<String>,
        icon: Option<IconRef>,
    },
    PipeMenu {
        id: String,
        label: Option<String>,
        execute: Option<String>,
        icon: Option<IconRef>,
    },
    Item {
        label: Option<String>,
        icon: Option<IconRef>,
    },
    Separator {
        label: Option<String>,
    },
    Action {
        name: ActionKind,
    },
    Option {
        key: OptionKey,
        value: Option<String>,
    },
    /// startupnotify container
    OptionBlock,
}

impl Element {
    pub fn menu(id: impl Into<String>, label: Option<&str>) -> Self {
        Element::Menu {
            id: id.into(),
            label: label.map(str::to_string),
            icon: None,
        }
    }

    pub fn pipe_menu(id: impl Into<String>, label: Option<&str>, execute: Option<&str>) -> Self {
        Element::PipeMenu {
            id: id.into(),
            label: label.map(str::to_string),
            execute: execute.map(str::to_string),
            icon: None,
        }
    }

    pub fn item(label: Option<&str>) -> Self {
        Element::Item { label: label.map(str::to_string), icon: None }
    }

    pub fn separator(label: Option<&str>) -> Self {
        Element::Separator { label: label.map(str::to_string) }
    }

    pub fn action(name: ActionKind) -> Self {
        Element::Action { name }
    }

    pub fn option(key: OptionKey, value: Option<&str>) -> Self {
        Element::Option { key, value: value.map(str::to_string) }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Menu { .. } => ElementKind::Menu,
            Element::PipeMenu { .. } => ElementKind::PipeMenu,
            Element::Item { .. } => ElementKind::Item,
            Element::Separator { .. } => ElementKind::Separator,
            Element::Action { name } => ElementKind::Action(*name),
            Element::Option { key, .. } => ElementKind::Option(*key),
            Element::OptionBlock => ElementKind::StartupNotify,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Element::Menu { label, .. }
            | Element::PipeMenu { label, .. }
            | Element::Item { label, .. }
            | Element::Separator { label } => label.as_deref(),
            _ => None,
        }
    }

    pub fn menu_id(&self) -> Option<&str> {
        match self {
            Element::Menu { id, .. } | Element::PipeMenu { id, .. } => Some(id),
            _ => None,
        }
    }

    pub fn icon(&self) -> Option<&IconRef> {
        match self {
            Element::Menu { icon, .. } | Element::PipeMenu { icon, .. } | Element::Item { icon, .. } => {
                icon.as_ref()
            }
            _ => None,
        }
    }

    pub(crate) fn icon_mut(&mut self) -> Option<&mut Option<IconRef>> {
        match self {
            Element::Menu { icon, .. } | Element::PipeMenu { icon, .. } | Element::Item { icon, .. } => {
                Some(icon)
            }
            _ => None,
        }
    }

    pub(crate) fn label_mut(&mut self) -> Option<&mut Option<String>> {
        match self {
            Element::Menu { label, .. }
            | Element::PipeMenu { label, .. }
            | Element::Item { label, .. }
            | Element::Separator { label } => Some(label),
            _ => None,
        }
    }

    /// Copy with icon status reset, for structural comparison
    pub fn normalized(&self) -> Self {
        let mut copy = self.clone();
        if let Some(Some(icon)) = copy.icon_mut() {
            *icon = icon.normalized();
        }
        copy
    }
}

/// Discriminant of an [`Element`], used by the grammar table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Menu,
    PipeMenu,
    Item,
    Separator,
    Action(ActionKind),
    Option(OptionKey),
    StartupNotify,
}

impl ElementKind {
    /// Kinds that carry a visibility classification
    pub fn is_classified(self) -> bool {
        matches!(self, ElementKind::Menu | ElementKind::PipeMenu | ElementKind::Item | ElementKind::Separator)
    }

    pub fn is_menu(self) -> bool {
        matches!(self, ElementKind::Menu | ElementKind::PipeMenu)
    }

    /// XML tag this kind is written as
    pub fn tag(self) -> &'static str {
        match self {
            ElementKind::Menu | ElementKind::PipeMenu => "menu",
            ElementKind::Item => "item",
            ElementKind::Separator => "separator",
            ElementKind::Action(_) => "action",
            ElementKind::Option(key) => key.tag(),
            ElementKind::StartupNotify => "startupnotify",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::PipeMenu => write!(f, "pipe menu"),
            ElementKind::Action(a) => write!(f, "action '{}'", a.as_str()),
            ElementKind::Option(key) => write!(f, "option '{}'", key.tag()),
            other => write!(f, "{}", other.tag()),
        }
    }
}

/// Where a node may be placed: the implicit root-menu level or under a node kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Container {
    RootMenu,
    Node(ElementKind),
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Container::RootMenu => write!(f, "root menu"),
            Container::Node(kind) => write!(f, "{}", kind),
        }
    }
}

// ============================================================================
// SECTION 5: Visibility
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Visible,
    /// Menu or item without a label
    InvisibleNoLabel,
    InvisibleDescendantOfInvisibleMenu,
    /// Toplevel menu defined but never referenced inside the root menu
    InvisibleOrphanedMenu,
    InvisibleDescendantOfInvisibleOrphanedMenu,
}

impl Visibility {
    pub fn is_visible(self) -> bool {
        self == Visibility::Visible
    }

    pub fn is_orphan_related(self) -> bool {
        matches!(
            self,
            Visibility::InvisibleOrphanedMenu | Visibility::InvisibleDescendantOfInvisibleOrphanedMenu
        )
    }
}
