//! The `twixt` command line: check documents and print diagnostics.

use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use lsp_types::DiagnosticSeverity;

use crate::config::Settings;
use crate::definitions::{CompiledDefinitions, MacroDefTable};
use crate::diagnostics::diagnostics;

#[derive(Parser, Debug)]
#[command(name = "twixt", about = "Macro analysis for Twee-style markup", version)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan and validate documents, printing diagnostics.
    Check {
        /// Documents to check (.twee / .tw).
        files: Vec<PathBuf>,
        /// Macro definitions file (.json or .yaml).
        #[arg(long)]
        definitions: Option<PathBuf>,
    },
}

/// Runs the CLI; the returned code is the process exit status.
pub fn run() -> anyhow::Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Command::Check { files, definitions } => check(files, definitions),
    }
}

fn load_definitions(path: Option<&PathBuf>) -> anyhow::Result<MacroDefTable> {
    let Some(path) = path else {
        return Ok(MacroDefTable::new());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading definitions from {}", path.display()))?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => MacroDefTable::from_json(&text),
        Some("yaml") | Some("yml") => MacroDefTable::from_yaml(&text),
        other => Err(anyhow!(
            "unsupported definitions extension {other:?}; expected json or yaml"
        )),
    }
}

fn check(files: Vec<PathBuf>, definitions_path: Option<PathBuf>) -> anyhow::Result<i32> {
    let settings = std::env::current_dir()
        .ok()
        .and_then(|dir| Settings::new(&dir).ok())
        .unwrap_or_default();

    let table = load_definitions(definitions_path.as_ref())?;
    let definitions = CompiledDefinitions::new(table);

    let mut any_errors = false;
    for file in &files {
        let text = std::fs::read_to_string(file)
            .with_context(|| format!("reading {}", file.display()))?;

        for diag in diagnostics(&text, &definitions, &settings) {
            let severity = if diag.severity == Some(DiagnosticSeverity::ERROR) {
                any_errors = true;
                "error"
            } else if diag.severity == Some(DiagnosticSeverity::WARNING) {
                "warning"
            } else {
                "info"
            };
            let code = match &diag.code {
                Some(lsp_types::NumberOrString::Number(n)) => n.to_string(),
                Some(lsp_types::NumberOrString::String(s)) => s.clone(),
                None => String::new(),
            };
            println!(
                "{}:{}:{} {} [{}] {}",
                file.display(),
                diag.range.start.line + 1,
                diag.range.start.character + 1,
                severity,
                code,
                diag.message
            );
        }
    }

    Ok(if any_errors { 1 } else { 0 })
}
