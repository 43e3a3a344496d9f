// src/extract/identify.rs

//! File-type identification of an extracted tree

use crate::error::{Error, Result};
use crate::extract::process;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;
use std::time::Duration;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Paths handed to the identifier per invocation
const BATCH_SIZE: usize = 512;

/// Type description of one extracted file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifiedFile {
    /// Path as installed, e.g. `/usr/bin/foo`
    pub path: String,
    pub description: String,
}

/// External tool producing `path: description` lines
pub trait FileIdentifier: Send + Sync {
    /// Describe `paths`, given relative to `workdir` as `./a/b`
    fn identify(&self, workdir: &Path, paths: &[String], timeout: Duration) -> Result<String>;
}

/// The `file(1)` command
#[derive(Debug, Clone, Copy, Default)]
pub struct FileCommand;

impl FileIdentifier for FileCommand {
    fn identify(&self, workdir: &Path, paths: &[String], timeout: Duration) -> Result<String> {
        let mut cmd = Command::new("file");
        cmd.arg("--").args(paths).current_dir(workdir);

        let captured = process::run_captured(&mut cmd, "file", timeout)?
            .ok_or(Error::IdentificationTimeout(timeout))?;

        if !captured.status.success() {
            debug!("file exited with {}", captured.status);
        }

        Ok(captured.stdout)
    }
}

/// Identify every regular file under `workdir`
pub fn identify_all(
    identifier: &dyn FileIdentifier,
    workdir: &Path,
    timeout: Duration,
) -> Result<Vec<IdentifiedFile>> {
    let paths = regular_files(workdir);
    let mut identified = Vec::with_capacity(paths.len());

    for batch in paths.chunks(BATCH_SIZE) {
        let output = identifier.identify(workdir, batch, timeout)?;
        identified.extend(parse_identify_output(&output, batch));
    }

    info!(
        "Identified {} of {} files under {}",
        identified.len(),
        paths.len(),
        workdir.display()
    );

    Ok(identified)
}

/// Parse `./path: description` lines for the `paths` that were asked about
///
/// A line belongs to the longest requested path it starts with, so names
/// containing `:` survive. Anything else is skipped.
pub fn parse_identify_output(output: &str, paths: &[String]) -> Vec<IdentifiedFile> {
    output
        .lines()
        .filter_map(|line| {
            let (path, description) = paths
                .iter()
                .filter_map(|path| {
                    let rest = line.strip_prefix(path.as_str())?.strip_prefix(':')?;
                    Some((path, rest))
                })
                .max_by_key(|(path, _)| path.len())?;

            Some(IdentifiedFile {
                path: path.strip_prefix('.').unwrap_or(path).to_string(),
                description: description.trim_start().to_string(),
            })
        })
        .collect()
}

/// Regular files (symlinks excluded) as sorted `./relative` paths
fn regular_files(workdir: &Path) -> Vec<String> {
    let mut paths = Vec::new();

    for entry in WalkDir::new(workdir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(workdir) else {
            continue;
        };
        match relative.to_str() {
            Some(relative) => paths.push(format!("./{}", relative)),
            None => debug!("Skipping non-UTF-8 path {}", relative.display()),
        }
    }

    paths
}
