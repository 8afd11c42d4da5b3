// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dryad-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dryad and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Dryad CLI entrypoint.
//!
//! By default this runs the interactive editor on the workspace directory.
//! `--export` prints the current markup to stdout and exits; `--import <file>`
//! replaces the workspace document from a markup file and exits.

use std::error::Error;
use std::fs;

use dryad::format::xml::{export_xml, import_xml};
use dryad::store::{SnapshotFolder, WriteDurability};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [<workspace-dir>] [--durable-writes]\n  {program} [--workspace <dir>] [--durable-writes]\n  {program} [<workspace-dir>] --export\n  {program} [<workspace-dir>] --import <file>\n\nThe default mode runs the interactive editor on the workspace directory\n(current working directory if omitted). The document snapshot lives in\n`dryad-document.json`; exports are written to `generated.xml`.\n\n--export prints the current markup to stdout and exits.\n--import <file> replaces the workspace document from a markup file and exits.\n--durable-writes opts into slower, best-effort durable persistence (fsync/sync where supported)."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    workspace_dir: Option<String>,
    durable_writes: bool,
    export: bool,
    import: Option<String>,
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--workspace" => {
                if options.workspace_dir.is_some() {
                    return Err(());
                }
                let dir = args.next().ok_or(())?;
                options.workspace_dir = Some(dir);
            }
            "--durable-writes" => {
                if options.durable_writes {
                    return Err(());
                }
                options.durable_writes = true;
            }
            "--export" => {
                if options.export {
                    return Err(());
                }
                options.export = true;
            }
            "--import" => {
                if options.import.is_some() {
                    return Err(());
                }
                let file = args.next().ok_or(())?;
                options.import = Some(file);
            }
            _ if arg.starts_with('-') => return Err(()),
            _ => {
                if options.workspace_dir.is_some() {
                    return Err(());
                }
                options.workspace_dir = Some(arg);
            }
        }
    }

    if options.export && options.import.is_some() {
        return Err(());
    }

    Ok(options)
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "dryad".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        let dir = options.workspace_dir.unwrap_or_else(|| ".".to_owned());
        let folder = if options.durable_writes {
            SnapshotFolder::new(dir).with_durability(WriteDurability::Durable)
        } else {
            SnapshotFolder::new(dir)
        };

        if let Some(file) = options.import {
            let text = fs::read_to_string(&file)?;
            match import_xml(&text) {
                Ok(forest) => {
                    folder.save_forest(&forest)?;
                    eprintln!("dryad: imported {} nodes from {file}", forest.node_count());
                    return Ok(());
                }
                Err(err) => {
                    eprintln!("dryad: import failed: {err}");
                    std::process::exit(1);
                }
            }
        }

        let loaded = folder.load_or_init_forest()?;
        if let Some(err) = loaded.recovered_from {
            eprintln!("dryad: snapshot was unreadable, reset to the bootstrap document: {err}");
        }

        if options.export {
            print!("{}", export_xml(&loaded.forest));
            return Ok(());
        }

        dryad::tui::run(loaded.forest, folder)?;
        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("dryad: {err}");
        std::process::exit(1);
    }
}
