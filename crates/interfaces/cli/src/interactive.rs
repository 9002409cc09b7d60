use std::io;
use std::io::{IsTerminal, Write};
use std::path::Path;

use anyhow::Result;
use clap::Parser;

use cablecalc_catalog::{CatalogSources, Session};
use cablecalc_config::AppConfig;

use crate::{Commands, dispatch};

#[derive(Debug, Parser)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: Commands,
}

/// Line-oriented loop that keeps one session across commands.
///
/// The session is reused between lines and resolved again only after a
/// command persisted a change.
pub(crate) fn run_shell(config: &AppConfig, config_path: &Path, sources: &CatalogSources) -> Result<()> {
    let mut session = Session::open(sources);
    let prompt = io::stdin().is_terminal();
    if prompt {
        println!(
            "cablecalc shell: {} connectors from {}. Type 'help' for commands, 'exit' to leave.",
            session.catalog().len(),
            session.origin()
        );
    }

    // No long-lived stdin lock: `delete` reads its confirmation from stdin.
    let mut buffer = String::new();
    loop {
        if prompt {
            print!("cablecalc> ");
            io::stdout().flush()?;
        }
        buffer.clear();
        if io::stdin().read_line(&mut buffer)? == 0 {
            break;
        }
        let line = buffer.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }

        let parsed = match ShellLine::try_parse_from(split_words(line)) {
            Ok(parsed) => parsed,
            Err(err) => {
                // Help and usage errors render their own text.
                let _ = err.print();
                continue;
            }
        };

        if let Err(err) = dispatch(parsed.command, config, config_path, sources, &mut session) {
            eprintln!("error: {err}");
        }
        if session.refresh(sources) {
            tracing::debug!(
                entries = session.catalog().len(),
                origin = %session.origin(),
                "session catalog reloaded"
            );
        }
    }
    Ok(())
}

/// Whitespace split that keeps double-quoted runs together, so names with
/// spaces can be typed as `"N 50 OHM"`.
fn split_words(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut started = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                started = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if started {
                    words.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            c => {
                current.push(c);
                started = true;
            }
        }
    }
    if started {
        words.push(current);
    }
    words
}
