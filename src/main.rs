// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// obmenu-check: validate an Openbox menu file and report diagnostics
///
/// Usage: obmenu-check [--normalize] [--no-backup] [PATH]

use std::path::PathBuf;
use std::process::ExitCode;

use obmenu_core::{ensure_default_menu, load_menu, save_menu, MenuConfig, MenuDocument, MenuFileError};

const USAGE: &str = "usage: obmenu-check [--normalize] [--no-backup] [PATH]";

#[derive(Debug, PartialEq, Eq)]
struct Options {
    normalize: bool,
    backup: bool,
    path: Option<PathBuf>,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Options, String> {
    let mut options = Options { normalize: false, backup: true, path: None };

    for arg in args {
        match arg.as_str() {
            "--normalize" => options.normalize = true,
            "--no-backup" => options.backup = false,
            flag if flag.starts_with("--") => return Err(format!("unknown option '{}'", flag)),
            path => {
                if options.path.is_some() {
                    return Err("more than one menu file given".to_string());
                }
                options.path = Some(PathBuf::from(path));
            }
        }
    }
    Ok(options)
}

fn report(doc: &MenuDocument) {
    let diagnostics = doc.diagnostics();

    println!("{} nodes, {} toplevel entries", doc.len(), doc.toplevel().len());
    for id in &diagnostics.orphaned_menus {
        println!("orphaned menu: {}", id);
    }
    for node in &diagnostics.missing_labels {
        let kind = doc.kind(*node).map(|k| k.to_string()).unwrap_or_default();
        println!("missing label: {} {} at depth {}", kind, node, doc.depth(*node));
    }
    if diagnostics.deprecated_conversions {
        println!("deprecated <execute> options converted to <command>");
    }
}

fn run(options: Options) -> Result<(), MenuFileError> {
    let config = MenuConfig { create_backup: options.backup, ..MenuConfig::default() };

    let path = match options.path {
        Some(path) => path,
        None => {
            ensure_default_menu(&config.menu_path)?;
            config.menu_path.clone()
        }
    };

    let mut doc = load_menu(&path, &config)?;
    report(&doc);

    if options.normalize {
        let sorted = doc.auto_sort_all();
        log::info!("CHECK: {} option lists reordered", sorted);
        save_menu(&doc, &path, &config)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let options = match parse_args(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("obmenu-check: {}\n{}", e, USAGE);
            return ExitCode::from(2);
        }
    };

    match run(options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("obmenu-check: {}", e);
            ExitCode::FAILURE
        }
    }
}
