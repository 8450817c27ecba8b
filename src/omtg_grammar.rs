// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Menu Grammar
/// Fixed table of legal parent → child kinds and per-parent cardinality
///
/// Consulted by the loader (inline validation) and the structural editor
/// (insert/move/copy). The table is not configurable.

use crate::omer_error::Violation;
use crate::omt_types::{ActionKind, Container, Element, ElementKind, OptionKey};

// ============================================================================
// SECTION 1: Canonical option order
// ============================================================================

pub const EXECUTE_ORDER: [ElementKind; 3] = [
    ElementKind::Option(OptionKey::Prompt),
    ElementKind::Option(OptionKey::Command),
    ElementKind::StartupNotify,
];

pub const STARTUPNOTIFY_ORDER: [ElementKind; 4] = [
    ElementKind::Option(OptionKey::Enabled),
    ElementKind::Option(OptionKey::Name),
    ElementKind::Option(OptionKey::WmClass),
    ElementKind::Option(OptionKey::Icon),
];

/// Storage/display order of option children, for parents that have one
pub fn canonical_order(parent: ElementKind) -> Option<&'static [ElementKind]> {
    match parent {
        ElementKind::Action(ActionKind::Execute) => Some(&EXECUTE_ORDER),
        ElementKind::StartupNotify => Some(&STARTUPNOTIFY_ORDER),
        _ => None,
    }
}

// ============================================================================
// SECTION 2: Legal children
// ============================================================================

pub fn is_legal_child(parent: Container, child: ElementKind) -> bool {
    use ElementKind as K;

    match parent {
        Container::RootMenu | Container::Node(K::Menu) => {
            matches!(child, K::Menu | K::PipeMenu | K::Item | K::Separator)
        }
        Container::Node(K::Item) => matches!(child, K::Action(_)),
        Container::Node(K::Action(ActionKind::Execute)) => matches!(
            child,
            K::Option(OptionKey::Prompt) | K::Option(OptionKey::Command) | K::StartupNotify
        ),
        Container::Node(K::Action(ActionKind::Exit))
        | Container::Node(K::Action(ActionKind::SessionLogout)) => {
            child == K::Option(OptionKey::Prompt)
        }
        Container::Node(K::Action(ActionKind::Restart)) => child == K::Option(OptionKey::Command),
        Container::Node(K::StartupNotify) => {
            matches!(child, K::Option(key) if key.is_startupnotify_option())
        }
        Container::Node(K::Action(ActionKind::Reconfigure))
        | Container::Node(K::PipeMenu)
        | Container::Node(K::Separator)
        | Container::Node(K::Option(_)) => false,
    }
}

// ============================================================================
// SECTION 3: Cardinality
// ============================================================================

/// Whether adding `new_child` next to `siblings` stays within the per-parent limits
///
/// Items hold at most one action; every option parent holds at most one child
/// of each kind. Menus and the root menu are unbounded.
pub fn cardinality_ok(parent: Container, siblings: &[ElementKind], new_child: ElementKind) -> bool {
    match parent {
        Container::RootMenu | Container::Node(ElementKind::Menu) => true,
        Container::Node(ElementKind::Item) => {
            !siblings.iter().any(|k| matches!(k, ElementKind::Action(_)))
        }
        Container::Node(_) => !siblings.contains(&new_child),
    }
}

/// Exit and SessionLogout constrain their prompt to a boolean-like value
pub fn prompt_value_ok(parent: Container, child: &Element) -> bool {
    let constrained = matches!(
        parent,
        Container::Node(ElementKind::Action(ActionKind::Exit))
            | Container::Node(ElementKind::Action(ActionKind::SessionLogout))
    );
    match child {
        Element::Option { key: OptionKey::Prompt, value: Some(v) } if constrained => {
            v == "yes" || v == "no"
        }
        _ => true,
    }
}

/// Full placement check used by insert, move and copy
///
/// `siblings` must not contain the node being placed.
pub fn check_placement(parent: Container, siblings: &[ElementKind], child: &Element) -> Result<(), Violation> {
    let kind = child.kind();
    if !is_legal_child(parent, kind) {
        return Err(Violation::IllegalChild { parent, child: kind });
    }
    if !cardinality_ok(parent, siblings, kind) {
        return Err(Violation::Cardinality { parent, child: kind });
    }
    if !prompt_value_ok(parent, child) {
        return Err(Violation::PromptValue);
    }
    Ok(())
}

/// Every kind the grammar knows about, for exhaustive checks and generators
pub fn all_kinds() -> Vec<ElementKind> {
    let mut kinds = vec![
        ElementKind::Menu,
        ElementKind::PipeMenu,
        ElementKind::Item,
        ElementKind::Separator,
        ElementKind::StartupNotify,
    ];
    kinds.extend(ActionKind::ALL.iter().map(|a| ElementKind::Action(*a)));
    kinds.extend(OptionKey::ALL.iter().map(|k| ElementKind::Option(*k)));
    kinds
}
