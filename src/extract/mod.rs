// src/extract/mod.rs

//! On-demand extraction of a package's file tree
//!
//! A package is unpacked at most once into `<base>/<package file>.<pid>`
//! by an external archive tool. The tree is removed on `cleanup()` or when
//! the owning `Extraction` is dropped.

pub mod identify;
pub mod process;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
#[cfg(unix)]
use walkdir::WalkDir;

pub use identify::{FileCommand, FileIdentifier, IdentifiedFile};

/// Default limit for unpacking a package
pub const DEFAULT_EXTRACT_TIMEOUT: Duration = Duration::from_secs(300);

/// Default limit for one identification batch
pub const DEFAULT_IDENTIFY_TIMEOUT: Duration = Duration::from_secs(120);

/// Upper bound on `.N` suffixes tried when the pid-based name is taken
const MAX_DIR_ATTEMPTS: u32 = 1024;

/// Outcome reported by an archive tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolStatus {
    Success,
    /// The tool ran but reported failure; the tree may be incomplete
    Failed(String),
}

/// Non-fatal extraction problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionWarning {
    pub package: PathBuf,
    pub message: String,
}

impl fmt::Display for ExtractionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.package.display(), self.message)
    }
}

/// External program that unpacks a package's payload into a directory
pub trait ArchiveTool: Send + Sync {
    fn unpack(&self, package: &Path, target: &Path, timeout: Duration) -> Result<ToolStatus>;
}

/// `rpm2cpio <package> | cpio -id`, run inside the target directory
#[derive(Debug, Clone, Copy, Default)]
pub struct Rpm2Cpio;

impl ArchiveTool for Rpm2Cpio {
    fn unpack(&self, package: &Path, target: &Path, timeout: Duration) -> Result<ToolStatus> {
        // cpio runs in `target`, so a relative package path must be resolved first
        let package = fs::canonicalize(package)?;

        let mut rpm2cpio = process::spawn(
            Command::new("rpm2cpio")
                .arg(&package)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::null()),
            "rpm2cpio",
        )?;

        let payload = rpm2cpio.stdout.take().ok_or_else(|| Error::Tool {
            tool: "rpm2cpio".to_string(),
            source: io::Error::other("payload pipe not available"),
        })?;

        let cpio = process::spawn(
            Command::new("cpio")
                .args(["-id", "--quiet"])
                .current_dir(target)
                .stdin(Stdio::from(payload))
                .stdout(Stdio::null())
                .stderr(Stdio::null()),
            "cpio",
        );

        let cpio = match cpio {
            Ok(child) => child,
            Err(e) => {
                let _ = rpm2cpio.kill();
                let _ = rpm2cpio.wait();
                return Err(e);
            }
        };

        let mut children = [rpm2cpio, cpio];
        let statuses = process::wait_all(&mut children, timeout)?
            .ok_or(Error::ExtractionTimeout(timeout))?;

        let failures: Vec<String> = ["rpm2cpio", "cpio"]
            .iter()
            .zip(&statuses)
            .filter(|(_, status)| !status.success())
            .map(|(tool, status)| format!("{} exited with {}", tool, status))
            .collect();

        if failures.is_empty() {
            Ok(ToolStatus::Success)
        } else {
            Ok(ToolStatus::Failed(failures.join("; ")))
        }
    }
}

/// External tools and time limits used by a package handle
#[derive(Clone)]
pub struct Options {
    pub extract_timeout: Duration,
    pub identify_timeout: Duration,
    pub archive_tool: Arc<dyn ArchiveTool>,
    pub identifier: Arc<dyn FileIdentifier>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            extract_timeout: DEFAULT_EXTRACT_TIMEOUT,
            identify_timeout: DEFAULT_IDENTIFY_TIMEOUT,
            archive_tool: Arc::new(Rpm2Cpio),
            identifier: Arc::new(FileCommand),
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("extract_timeout", &self.extract_timeout)
            .field("identify_timeout", &self.identify_timeout)
            .finish_non_exhaustive()
    }
}

/// Where a handle's extracted tree is in its life
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionState {
    NotExtracted,
    Extracted {
        dir: PathBuf,
        warnings: Vec<ExtractionWarning>,
    },
    /// The tree was removed; it is never recreated
    Disposed,
}

/// Owner of one package's working directory
pub struct Extraction {
    package_path: PathBuf,
    base_dir: PathBuf,
    tool: Arc<dyn ArchiveTool>,
    timeout: Duration,
    state: ExtractionState,
}

impl Extraction {
    pub fn new(
        package_path: impl Into<PathBuf>,
        base_dir: impl Into<PathBuf>,
        tool: Arc<dyn ArchiveTool>,
        timeout: Duration,
    ) -> Self {
        Self {
            package_path: package_path.into(),
            base_dir: base_dir.into(),
            tool,
            timeout,
            state: ExtractionState::NotExtracted,
        }
    }

    pub fn state(&self) -> &ExtractionState {
        &self.state
    }

    /// Extracted directory, if extraction has happened
    pub fn dir(&self) -> Option<&Path> {
        match &self.state {
            ExtractionState::Extracted { dir, .. } => Some(dir.as_path()),
            _ => None,
        }
    }

    pub fn warnings(&self) -> &[ExtractionWarning] {
        match &self.state {
            ExtractionState::Extracted { warnings, .. } => warnings.as_slice(),
            _ => &[],
        }
    }

    /// Unpack the package unless already done; returns the working directory
    pub fn ensure_extracted(&mut self) -> Result<&Path> {
        if self.state == ExtractionState::NotExtracted {
            self.state = self.extract()?;
        }

        match &self.state {
            ExtractionState::Extracted { dir, .. } => Ok(dir.as_path()),
            _ => Err(Error::Disposed),
        }
    }

    fn extract(&self) -> Result<ExtractionState> {
        let is_dir = fs::metadata(&self.base_dir)
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            warn!("Unable to access dir {}", self.base_dir.display());
            return Err(Error::Path(self.base_dir.clone()));
        }

        let dir = create_work_dir(&self.base_dir, &self.package_path)?;
        info!(
            "Extracting {} into {}",
            self.package_path.display(),
            dir.display()
        );

        let status = match self.tool.unpack(&self.package_path, &dir, self.timeout) {
            Ok(status) => status,
            Err(e) => {
                remove_tree(&dir);
                return Err(e);
            }
        };

        let mut warnings = Vec::new();
        if let ToolStatus::Failed(message) = status {
            warn!(
                "Extraction of {} reported failure: {}",
                self.package_path.display(),
                message
            );
            warnings.push(ExtractionWarning {
                package: self.package_path.clone(),
                message,
            });
        }

        Ok(ExtractionState::Extracted { dir, warnings })
    }

    /// Remove the extracted tree; no-op unless extracted
    ///
    /// Removal failures are logged, never returned.
    pub fn cleanup(&mut self) {
        if let ExtractionState::Extracted { dir, .. } = &self.state {
            info!("Removing extracted tree {}", dir.display());
            remove_tree(dir);
            self.state = ExtractionState::Disposed;
        }
    }
}

impl Drop for Extraction {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Create `<base>/<file name>.<pid>`, adding `.N` if a sibling handle in
/// this process already holds that name
fn create_work_dir(base_dir: &Path, package_path: &Path) -> Result<PathBuf> {
    let file_name = package_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "package".to_string());
    let stem = format!("{}.{}", file_name, std::process::id());

    let mut candidate = base_dir.join(&stem);
    let mut attempt = 0;
    loop {
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && attempt < MAX_DIR_ATTEMPTS => {
                attempt += 1;
                candidate = base_dir.join(format!("{}.{}", stem, attempt));
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn remove_tree(dir: &Path) {
    grant_access(dir);
    if let Err(e) = fs::remove_dir_all(dir) {
        warn!("Failed to remove {}: {}", dir.display(), e);
    }
}

/// Give the owner rwx on every directory below `root` so entries can be
/// listed and unlinked
#[cfg(unix)]
fn grant_access(root: &Path) {
    open_dir(root);

    for entry in WalkDir::new(root).min_depth(1) {
        match entry {
            Ok(entry) if entry.file_type().is_dir() => open_dir(entry.path()),
            Ok(_) => {}
            // Listed before its mode was fixed; walk it again
            Err(e) => match e.path() {
                Some(dir) if dir != root && is_real_dir(dir) => grant_access(dir),
                _ => debug!("Skipping {} during cleanup: {}", root.display(), e),
            },
        }
    }
}

#[cfg(unix)]
fn open_dir(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    let Ok(meta) = fs::symlink_metadata(path) else {
        return;
    };
    if !meta.is_dir() {
        return;
    }

    let mut perms = meta.permissions();
    if perms.mode() & 0o700 != 0o700 {
        perms.set_mode(perms.mode() | 0o700);
        if let Err(e) = fs::set_permissions(path, perms) {
            debug!("chmod {} failed: {}", path.display(), e);
        }
    }
}

#[cfg(unix)]
fn is_real_dir(path: &Path) -> bool {
    fs::symlink_metadata(path).map(|m| m.is_dir()).unwrap_or(false)
}

#[cfg(not(unix))]
fn grant_access(_path: &Path) {}
