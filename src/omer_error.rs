// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Error taxonomy for loading, editing and saving menu documents

use thiserror::Error;

use crate::omt_types::{Container, ElementKind, NodeId};

/// Fatal to a load; the partially built tree is discarded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        ParseError { line, message: message.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("menu id '{0}' is already in use")]
pub struct DuplicateId(pub String);

/// Rejected move; the tree is left unchanged
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("no such node: {0}")]
    NoSuchNode(NodeId),

    #[error("a menu cannot be moved into its own subtree")]
    Cycle,

    #[error("{child} is not allowed inside {parent}")]
    IllegalChild { parent: Container, child: ElementKind },

    #[error("{parent} already has {child}")]
    Cardinality { parent: Container, child: ElementKind },

    #[error("prompt value must be 'yes' or 'no' inside an Exit or SessionLogout action")]
    PromptValue,

    #[error("options are ordered automatically while auto-sort is enabled")]
    AutosortReorder,

    #[error("orphaned menus stay after the root menu entries; integrate them first")]
    OrphanPlacement,

    #[error("index {index} out of range (max {max})")]
    InvalidIndex { index: usize, max: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("no such node: {0}")]
    NoSuchNode(NodeId),

    #[error("{child} is not allowed inside {parent}")]
    IllegalChild { parent: Container, child: ElementKind },

    #[error("{parent} already has {child}")]
    Cardinality { parent: Container, child: ElementKind },

    #[error("prompt value must be 'yes' or 'no' inside an Exit or SessionLogout action")]
    PromptValue,

    #[error("index {index} out of range (max {max})")]
    InvalidIndex { index: usize, max: usize },

    #[error(transparent)]
    DuplicateId(#[from] DuplicateId),

    #[error("operation does not apply to {0}")]
    NotApplicable(ElementKind),
}

/// Grammar or cardinality rule broken by a proposed placement
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("{child} is not allowed inside {parent}")]
    IllegalChild { parent: Container, child: ElementKind },

    #[error("{parent} already has {child}")]
    Cardinality { parent: Container, child: ElementKind },

    #[error("prompt value must be 'yes' or 'no' inside an Exit or SessionLogout action")]
    PromptValue,
}

impl From<Violation> for MoveError {
    fn from(v: Violation) -> Self {
        match v {
            Violation::IllegalChild { parent, child } => MoveError::IllegalChild { parent, child },
            Violation::Cardinality { parent, child } => MoveError::Cardinality { parent, child },
            Violation::PromptValue => MoveError::PromptValue,
        }
    }
}

impl From<Violation> for EditError {
    fn from(v: Violation) -> Self {
        match v {
            Violation::IllegalChild { parent, child } => EditError::IllegalChild { parent, child },
            Violation::Cardinality { parent, child } => EditError::Cardinality { parent, child },
            Violation::PromptValue => EditError::PromptValue,
        }
    }
}

/// Path-based load/save failures
#[derive(Debug, Error)]
pub enum MenuFileError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}
