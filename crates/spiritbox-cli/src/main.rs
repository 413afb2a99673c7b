//! spiritbox CLI - Command line interface for sealed file containment

use clap::{Parser, Subcommand};
use serde::Serialize;
use spiritbox_core::config::default_label;
use spiritbox_core::{isolate_file_with, ContainmentConfig, ContainmentSession, IsolationReport};
use std::collections::HashSet;
use std::ffi::OsStr;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "spiritbox")]
#[command(author, version, about = "Freeze file contents in sealed in-memory files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Isolate files into sealed memfds, optionally exporting read-only copies
    Isolate {
        /// Files to isolate
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// memfd label (defaults to SPIRITBOX_LABEL env var or spiritbox_capture)
        #[arg(short, long)]
        label: Option<String>,

        /// Export each capture to this directory under its original file name
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// fsync exported files
        #[arg(long)]
        sync: bool,

        /// Print a JSON report instead of text
        #[arg(long)]
        json: bool,
    },

    /// Isolate a file and print its size and seals
    Inspect {
        /// File to inspect
        source: PathBuf,

        /// memfd label (defaults to SPIRITBOX_LABEL env var or spiritbox_capture)
        #[arg(short, long)]
        label: Option<String>,
    },
}

#[derive(Serialize)]
struct SourceReport {
    source: PathBuf,
    #[serde(flatten)]
    isolation: IsolationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    exported_to: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    export_error: Option<String>,
}

impl SourceReport {
    const fn ok(&self) -> bool {
        self.isolation.success && self.export_error.is_none()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("spiritbox=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Isolate {
            sources,
            label,
            out_dir,
            sync,
            json,
        } => {
            let config = ContainmentConfig::builder()
                .label(label.unwrap_or_else(default_label))
                .sync_on_export(sync)
                .build();

            let mut session = ContainmentSession::new(config);
            let destinations = export_destinations(&sources, out_dir.as_deref());
            let reports: Vec<SourceReport> = sources
                .iter()
                .zip(&destinations)
                .map(|(source, dest)| isolate_one(&mut session, source, dest.as_deref()))
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                for report in &reports {
                    print_report(report);
                }
            }

            session.teardown()?;

            let failed = reports.iter().filter(|r| !r.ok()).count();
            if failed > 0 {
                return Err(format!("{failed} of {} sources failed", reports.len()).into());
            }
        }

        Commands::Inspect { source, label } => {
            let config = ContainmentConfig::builder()
                .label(label.unwrap_or_else(default_label))
                .build();

            let isolation = isolate_file_with(&source, &config.label, &config)?;
            let fd = isolation.handle.as_raw_fd();
            let path = isolation.handle.proc_path();
            let seals = isolation.handle.seals();
            isolation.handle.dispose()?;

            let mut seals: Vec<String> = seals?.iter().map(|seal| format!("{seal:?}")).collect();
            seals.sort();

            println!("source: {}", source.display());
            println!("label:  {}", config.label);
            println!("fd:     {fd}");
            println!("path:   {}", path.display());
            println!("size:   {} bytes", isolation.size);
            println!("seals:  {}", seals.join(", "));
        }
    }

    Ok(())
}

fn isolate_one(session: &mut ContainmentSession, source: &Path, destination: Option<&Path>) -> SourceReport {
    let isolation = match session.isolate(source) {
        Ok(capture) => IsolationReport::captured(capture),
        Err(e) => {
            tracing::error!(source = %source.display(), "isolation failed: {}", e);
            return SourceReport {
                source: source.to_path_buf(),
                isolation: IsolationReport::failed(&e),
                exported_to: None,
                export_error: None,
            };
        }
    };

    let mut report = SourceReport {
        source: source.to_path_buf(),
        isolation,
        exported_to: None,
        export_error: None,
    };

    if let Some(destination) = destination {
        match session.export(session.len() - 1, destination) {
            Ok(_) => report.exported_to = Some(destination.to_path_buf()),
            Err(e) => {
                tracing::error!(destination = %destination.display(), "export failed: {}", e);
                report.export_error = Some(e.to_string());
            }
        }
    }

    report
}

/// One export path per source under `out_dir`, named after the source file.
///
/// Sources sharing a file name get `.1`, `.2`, ... suffixes so no two
/// exports in one run target the same path.
fn export_destinations(sources: &[PathBuf], out_dir: Option<&Path>) -> Vec<Option<PathBuf>> {
    let Some(dir) = out_dir else {
        return vec![None; sources.len()];
    };

    let mut taken = HashSet::new();
    sources
        .iter()
        .map(|source| {
            let name = source.file_name().unwrap_or_else(|| OsStr::new("capture"));
            let mut candidate = name.to_os_string();
            let mut suffix = 0u32;
            while !taken.insert(candidate.clone()) {
                suffix += 1;
                candidate = name.to_os_string();
                candidate.push(format!(".{suffix}"));
            }
            Some(dir.join(candidate))
        })
        .collect()
}

fn print_report(report: &SourceReport) {
    let source = report.source.display();
    if !report.isolation.success {
        println!("{source}: FAILED {}", report.isolation.message);
        return;
    }

    println!(
        "{source}: sealed in fd {} ({} bytes)",
        report.isolation.fd, report.isolation.size
    );
    if let Some(dest) = &report.exported_to {
        println!("  exported to {} (r--r--r--)", dest.display());
    }
    if let Some(err) = &report.export_error {
        println!("  export FAILED {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_file_names_get_suffixes() {
        let sources = [
            PathBuf::from("a/x.txt"),
            PathBuf::from("b/x.txt"),
            PathBuf::from("c/y.txt"),
            PathBuf::from("d/x.txt"),
        ];

        let destinations = export_destinations(&sources, Some(Path::new("/out")));

        assert_eq!(
            destinations,
            vec![
                Some(PathBuf::from("/out/x.txt")),
                Some(PathBuf::from("/out/x.txt.1")),
                Some(PathBuf::from("/out/y.txt")),
                Some(PathBuf::from("/out/x.txt.2")),
            ]
        );
    }

    #[test]
    fn suffix_skips_names_already_used() {
        let sources = [
            PathBuf::from("a/x.txt.1"),
            PathBuf::from("b/x.txt"),
            PathBuf::from("c/x.txt"),
        ];

        let destinations = export_destinations(&sources, Some(Path::new("/out")));

        assert_eq!(destinations[2], Some(PathBuf::from("/out/x.txt.2")));
    }

    #[test]
    fn no_out_dir_means_no_exports() {
        let sources = [PathBuf::from("x"), PathBuf::from("y")];
        assert_eq!(export_destinations(&sources, None), vec![None, None]);
    }
}
