// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Menu File Configuration I/O
/// Handles menu file path resolution, archiving, and load/save
///
/// Responsibilities:
/// - Menu file path resolution (~/.config/openbox/menu.xml)
/// - Deployment of the embedded default menu when none exists
/// - Archiving of the previous menu before overwrite (menu.xml.NNNNN)
/// - Path-based load (with icon probing) and atomic save

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::omer_error::MenuFileError;
use crate::omtd_document::MenuDocument;

// ============================================================================
// SECTION 1: Embedded default menu
// ============================================================================

const DEFAULT_MENU_XML: &str = include_str!("../menu.default.xml");

/// First archive suffix tried; later archives count upward
const ARCHIVE_SUFFIX_START: u32 = 10000;

/// Get embedded default menu content
pub fn default_menu_xml() -> &'static str {
    DEFAULT_MENU_XML
}

// ============================================================================
// SECTION 2: Path resolution and settings
// ============================================================================

/// Resolve the standard menu file path
pub fn menu_path() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".config");
    path.push("openbox");
    path.push("menu.xml");
    path
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuConfig {
    pub menu_path: PathBuf,
    /// Archive the previous file before each save
    pub create_backup: bool,
    /// Keep Execute and startupnotify children in canonical order
    pub autosort_options: bool,
}

impl Default for MenuConfig {
    fn default() -> Self {
        MenuConfig {
            menu_path: menu_path(),
            create_backup: true,
            autosort_options: true,
        }
    }
}

// ============================================================================
// SECTION 3: Deployment and archiving
// ============================================================================

/// Write the embedded default menu if `path` does not exist yet
///
/// Returns true when a file was deployed.
pub fn ensure_default_menu(path: &Path) -> Result<bool, io::Error> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, DEFAULT_MENU_XML)?;
    log::info!("CONFIG: deployed embedded default to {}", path.display());
    Ok(true)
}

/// First `<name>.NNNNN` beside `path` that does not exist, from 10000
fn next_archive_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "menu.xml".to_string());

    let mut suffix = ARCHIVE_SUFFIX_START;
    loop {
        let candidate = path.with_file_name(format!("{}.{}", name, suffix));
        if !candidate.exists() {
            return candidate;
        }
        suffix += 1;
    }
}

/// Rename an existing file to `<name>.NNNNN`, first free suffix from 10000
///
/// Returns the archive path, or None if there was nothing to archive.
pub fn archive_existing(path: &Path) -> Result<Option<PathBuf>, io::Error> {
    if !path.exists() {
        return Ok(None);
    }
    let archive_path = next_archive_path(path);
    fs::rename(path, &archive_path)?;
    log::info!("CONFIG: archived {} -> {}", path.display(), archive_path.display());
    Ok(Some(archive_path))
}

/// Copy an existing file to `<name>.NNNNN`, leaving the original in place
pub fn backup_existing(path: &Path) -> Result<Option<PathBuf>, io::Error> {
    if !path.exists() {
        return Ok(None);
    }
    let backup_path = next_archive_path(path);
    if let Err(e) = fs::copy(path, &backup_path) {
        let _ = fs::remove_file(&backup_path);
        return Err(e);
    }
    log::info!("CONFIG: backed up {} -> {}", path.display(), backup_path.display());
    Ok(Some(backup_path))
}

// ============================================================================
// SECTION 4: Menu file I/O
// ============================================================================

/// Load and validate a menu file, probing its icons
pub fn load_menu(path: &Path, config: &MenuConfig) -> Result<MenuDocument, MenuFileError> {
    let bytes = fs::read(path)?;
    let mut doc = MenuDocument::from_bytes(&bytes)?;
    doc.set_autosort(config.autosort_options);

    let invalid = doc.refresh_icon_status();
    if invalid > 0 {
        log::warn!("CONFIG: {} icons in {} could not be found", invalid, path.display());
    }
    Ok(doc)
}

/// Serialize `doc` to `path` through a sibling temp file
///
/// The previous file is copied to `<name>.NNNNN` first when backups are
/// enabled. It stays at `path` until the final rename replaces it, so a
/// failed save leaves it untouched.
pub fn save_menu(doc: &MenuDocument, path: &Path, config: &MenuConfig) -> Result<(), MenuFileError> {
    let xml = doc.to_xml();

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "menu.xml".to_string());
    let temp_path = path.with_file_name(format!(".{}.tmp", name));

    if let Err(e) = fs::write(&temp_path, xml.as_bytes()) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    if config.create_backup {
        if let Err(e) = backup_existing(path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }
    log::info!("SAVE: wrote {} nodes to {}", doc.len(), path.display());
    Ok(())
}
