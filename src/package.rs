// src/package.rs

//! Package handle
//!
//! One `Package` per package file. The header is read once at
//! construction; every derived view is computed on first access and kept
//! for the lifetime of the handle.

use crate::error::{Error, Result};
use crate::extract::identify::{self, IdentifiedFile};
use crate::extract::{Extraction, ExtractionWarning, Options};
use crate::metadata::{deps, files, Dependencies, Dependency, FileRecord, FileTable};
use crate::packages::{HeaderSource, RpmHeader, Tag};
use crate::search;
use once_cell::unsync::OnceCell;
use regex::bytes::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read-only view of one package
pub struct Package {
    path: PathBuf,
    name: String,
    is_source: bool,
    header: Box<dyn HeaderSource + Send>,
    options: Options,
    dependencies: OnceCell<Dependencies>,
    file_table: OnceCell<FileTable>,
    extraction: Extraction,
    files_info: Option<Vec<IdentifiedFile>>,
}

impl Package {
    /// Open an RPM file; extracted trees go below `base_dir`
    pub fn open(path: impl AsRef<Path>, base_dir: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, base_dir, Options::default())
    }

    pub fn open_with(
        path: impl AsRef<Path>,
        base_dir: impl AsRef<Path>,
        options: Options,
    ) -> Result<Self> {
        let header = RpmHeader::open(path.as_ref())?;
        Self::from_header(header, path, base_dir, options)
    }

    /// Build a handle over any header source
    ///
    /// `path` is still the file handed to the archive tool on extraction.
    pub fn from_header<H>(
        header: H,
        path: impl AsRef<Path>,
        base_dir: impl AsRef<Path>,
        options: Options,
    ) -> Result<Self>
    where
        H: HeaderSource + Send + 'static,
    {
        let path = path.as_ref().to_path_buf();

        let name = header
            .strings(Tag::Name)
            .into_first()
            .ok_or_else(|| Error::Format(format!("{}: header has no package name", path.display())))?;

        // Binary packages record the source package they were built from
        let is_source = header.strings(Tag::SourceRpm).is_empty();

        debug!("Opened package {} from {}", name, path.display());

        let extraction = Extraction::new(
            path.clone(),
            base_dir.as_ref(),
            options.archive_tool.clone(),
            options.extract_timeout,
        );

        Ok(Self {
            path,
            name,
            is_source,
            header: Box::new(header),
            options,
            dependencies: OnceCell::new(),
            file_table: OnceCell::new(),
            extraction,
            files_info: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_source(&self) -> bool {
        self.is_source
    }

    /// Raw tag access
    pub fn header(&self) -> &dyn HeaderSource {
        self.header.as_ref()
    }

    pub fn dependencies(&self) -> Result<&Dependencies> {
        self.dependencies
            .get_or_try_init(|| deps::decode(self.header.as_ref()))
    }

    pub fn requires(&self) -> Result<&[Dependency]> {
        Ok(self.dependencies()?.requires.as_slice())
    }

    pub fn prereq(&self) -> Result<&[Dependency]> {
        Ok(self.dependencies()?.prereq.as_slice())
    }

    pub fn conflicts(&self) -> Result<&[Dependency]> {
        Ok(self.dependencies()?.conflicts.as_slice())
    }

    pub fn provides(&self) -> Result<&[Dependency]> {
        Ok(self.dependencies()?.provides.as_slice())
    }

    pub fn file_table(&self) -> Result<&FileTable> {
        self.file_table
            .get_or_try_init(|| files::build(self.header.as_ref()))
    }

    /// Path to (mode, owner, group, link target) records
    pub fn files(&self) -> Result<&BTreeMap<String, FileRecord>> {
        Ok(&self.file_table()?.files)
    }

    pub fn config_files(&self) -> Result<&[String]> {
        Ok(self.file_table()?.config.as_slice())
    }

    pub fn doc_files(&self) -> Result<&[String]> {
        Ok(self.file_table()?.doc.as_slice())
    }

    pub fn ghost_files(&self) -> Result<&[String]> {
        Ok(self.file_table()?.ghost.as_slice())
    }

    pub fn plain_files(&self) -> Result<&[String]> {
        Ok(self.file_table()?.plain.as_slice())
    }

    /// Directory holding the extracted tree, extracting on first call
    pub fn dir_name(&mut self) -> Result<&Path> {
        self.extraction.ensure_extracted()
    }

    /// Problems reported while extracting; empty before extraction
    pub fn extraction_warnings(&self) -> &[ExtractionWarning] {
        self.extraction.warnings()
    }

    /// File-type description of every extracted regular file
    pub fn files_info(&mut self) -> Result<&[IdentifiedFile]> {
        if self.files_info.is_none() {
            let dir = self.extraction.ensure_extracted()?.to_path_buf();
            let info = identify::identify_all(
                self.options.identifier.as_ref(),
                &dir,
                self.options.identify_timeout,
            )?;
            self.files_info = Some(info);
        }

        Ok(self.files_info.as_deref().unwrap_or_default())
    }

    /// Packaged paths whose extracted content matches `pattern`
    ///
    /// Ghost files and anything that did not make it to disk are skipped.
    pub fn grep(&mut self, pattern: &str) -> Result<Vec<String>> {
        let regex = Regex::new(pattern)?;
        let dir = self.extraction.ensure_extracted()?.to_path_buf();

        let mut matches = Vec::new();
        for path in self.files()?.keys() {
            let on_disk = dir.join(path.trim_start_matches('/'));
            let is_file = std::fs::symlink_metadata(&on_disk)
                .map(|m| m.is_file())
                .unwrap_or(false);
            if is_file && search::grep(&regex, &on_disk)? {
                matches.push(path.clone());
            }
        }

        Ok(matches)
    }

    /// Remove the extracted tree, if any; also done on drop
    pub fn cleanup(&mut self) {
        self.extraction.cleanup();
    }
}
