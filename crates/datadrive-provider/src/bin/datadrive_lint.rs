use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use datadrive_provider::{DataSourceManifest, ManifestIssue};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "datadrive-lint", about = "Validate data source manifests")]
struct Cli {
    /// Manifest files to check.
    #[arg(required = true)]
    manifests: Vec<PathBuf>,

    /// Also require every referenced data file to exist, relative to its manifest.
    #[arg(long)]
    check_files: bool,

    /// Print a machine-readable report instead of text.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct Report {
    manifest: String,
    issues: Vec<ManifestIssue>,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut reports = Vec::with_capacity(cli.manifests.len());
    for path in &cli.manifests {
        let issues = lint(path, cli.check_files)?;
        reports.push(Report {
            manifest: path.display().to_string(),
            issues,
        });
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            if report.issues.is_empty() {
                println!("{}: ok", report.manifest);
            }
            for issue in &report.issues {
                println!("{}: {issue}", report.manifest);
            }
        }
    }

    let failed = reports.iter().any(|r| !r.issues.is_empty());
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn lint(path: &Path, check_files: bool) -> Result<Vec<ManifestIssue>> {
    let manifest = DataSourceManifest::load(path)
        .with_context(|| format!("failed to load manifest {}", path.display()))?;

    let mut issues = match manifest.validate() {
        Ok(()) => Vec::new(),
        Err(err) => err.into_issues(),
    };

    if check_files {
        let base = path.parent();
        for (idx, source) in manifest.sources.iter().enumerate() {
            if let Some(file) = source.file_path(base) {
                if !file.is_file() {
                    issues.push(ManifestIssue::new(
                        format!("sources[{idx}]"),
                        format!("data file `{}` does not exist", file.display()),
                    ));
                }
            }
        }
    }

    Ok(issues)
}
