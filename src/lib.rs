// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

//! Openbox menu document core: load, validate, edit and save menu.xml

// Document model
pub mod omt_types;
pub mod omer_error;
pub mod omtg_grammar;
pub mod omti_ids;
pub mod omtd_document;
pub mod omtv_visibility;

// File format
pub mod omfl_load;
pub mod omfs_save;
pub mod omfc_config;

// Editing
pub mod omee_edit;
pub mod omea_autosort;

pub use omer_error::{DuplicateId, EditError, MenuFileError, MoveError, ParseError};
pub use omfc_config::{backup_existing, ensure_default_menu, load_menu, menu_path, save_menu, MenuConfig};
pub use omfl_load::load;
pub use omfs_save::serialize;
pub use omt_types::{ActionKind, Element, ElementKind, IconRef, IconStatus, NodeId, OptionKey, Visibility};
pub use omtd_document::{Diagnostics, MenuDocument, MenuNode};
pub use omti_ids::IdRegistry;
