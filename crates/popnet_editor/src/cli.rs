// SPDX-License-Identifier: MIT OR Apache-2.0
//! `popnet` command line.

use crate::project::{load_document, read_document, save_document, ProjectSettings, Result};
use clap::{Parser, Subcommand};
use popnet_graph::Pop;
use std::io::Write;
use std::path::PathBuf;

/// POP patch-panel tools
#[derive(Debug, Parser)]
#[command(name = "popnet", about = "Inspect and create POP connection documents", version)]
pub struct Cli {
    /// Directory holding `popnet.ron`
    #[arg(long = "project-dir", global = true, default_value = ".")]
    pub project_dir: PathBuf,

    /// What to do
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print active DIO ports with their OLT labels.
    Report {
        /// Document to read
        path: PathBuf,
    },

    /// List invariant violations in a stored document.
    Check {
        /// Document to read
        path: PathBuf,
    },

    /// Write an empty document.
    New {
        /// Document to write
        path: PathBuf,

        /// POP name
        #[arg(long, default_value = "Untitled")]
        name: String,
    },
}

/// Run a parsed command line. Returns `false` when the document failed
/// its checks.
pub fn run(cli: Cli, settings: &ProjectSettings, out: &mut impl Write) -> Result<bool> {
    match cli.command {
        Commands::Report { path } => {
            let (pop, _) = load_document(&path)?;
            write_report(&pop, out)?;
            Ok(true)
        }
        Commands::Check { path } => {
            let pop = read_document(&path)?;
            let violations = pop.validate();
            for violation in &violations {
                writeln!(out, "{violation}")?;
            }
            writeln!(out, "{} violation(s) in {}", violations.len(), path.display())?;
            Ok(violations.is_empty())
        }
        Commands::New { path, name } => {
            let pop = settings.new_document(name);
            save_document(&path, &pop)?;
            writeln!(out, "Created {} ({})", path.display(), pop.id)?;
            Ok(true)
        }
    }
}

fn write_report(pop: &Pop, out: &mut impl Write) -> std::io::Result<()> {
    let reach = pop.reachability();
    writeln!(
        out,
        "{}: {} OLT(s), {} DIO(s), {} cable(s), {} connection(s)",
        pop.name,
        pop.olts().count(),
        pop.dios().count(),
        pop.cables().count(),
        pop.graph().len()
    )?;

    for dio in pop.dios() {
        let active: Vec<_> = dio
            .port_ids
            .iter()
            .filter_map(|port| reach.olt_label(port).map(|label| (port, label)))
            .collect();
        writeln!(out, "{} ({} / {} active)", dio.name, active.len(), dio.port_count)?;
        for (port, label) in active {
            writeln!(out, "  {port}: {label}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use popnet_graph::{Dio, Olt, OltStructure, PortRef, StandardPalette};

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["popnet", "new", "room.json", "--name", "Central"]).unwrap();
        match cli.command {
            Commands::New { path, name } => {
                assert_eq!(path, PathBuf::from("room.json"));
                assert_eq!(name, "Central");
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.project_dir, PathBuf::from("."));
    }

    #[test]
    fn test_report_lists_active_ports() {
        let mut pop = Pop::new("Central");
        pop.add_olt(Olt::with_id("olt1", "OLT1", OltStructure::uniform(1, 4)))
            .unwrap();
        pop.add_dio(Dio::with_id("dioA", "DIO A", 12)).unwrap();
        pop.connect_olt_to_port(
            &PortRef::olt("olt1", 1, 2),
            &PortRef::dio("dioA", 3),
            &StandardPalette,
        );

        let mut out = Vec::new();
        write_report(&pop, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("DIO A (1 / 12 active)"));
        assert!(text.contains("  dioA-p-3: OLT1: S1 / P2"));
    }
}
