// src/metadata/files.rs

//! File table reconstruction and classification

use crate::error::{Error, Result};
use crate::packages::traits::{HeaderSource, Tag};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// RPMFILE_* bits of a file flag word
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileFlags(u32);

impl FileFlags {
    pub const CONFIG: FileFlags = FileFlags(1 << 0);
    pub const DOC: FileFlags = FileFlags(1 << 1);
    pub const DONOTUSE: FileFlags = FileFlags(1 << 2);
    pub const MISSINGOK: FileFlags = FileFlags(1 << 3);
    pub const NOREPLACE: FileFlags = FileFlags(1 << 4);
    pub const SPECFILE: FileFlags = FileFlags(1 << 5);
    pub const GHOST: FileFlags = FileFlags(1 << 6);
    pub const LICENSE: FileFlags = FileFlags(1 << 7);
    pub const README: FileFlags = FileFlags(1 << 8);

    pub const fn from_bits(bits: u32) -> Self {
        FileFlags(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: FileFlags) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    /// Category of the file; the first matching bit wins
    pub fn class(self) -> FileClass {
        if self.contains(Self::CONFIG) {
            FileClass::Config
        } else if self.contains(Self::DOC) {
            FileClass::Doc
        } else if self.contains(Self::GHOST) {
            FileClass::Ghost
        } else {
            FileClass::Plain
        }
    }
}

impl From<u32> for FileFlags {
    fn from(bits: u32) -> Self {
        FileFlags(bits)
    }
}

/// Exclusive category of a packaged file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileClass {
    Config,
    Doc,
    Ghost,
    Plain,
}

/// Metadata about a file within a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,
    pub mode: u32,
    pub owner: String,
    pub group: String,
    /// Symlink target, empty for anything else
    pub link_target: String,
    pub flags: FileFlags,
    pub class: FileClass,
}

/// Every file of a package, keyed by path, plus the per-class path lists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTable {
    pub files: BTreeMap<String, FileRecord>,
    pub config: Vec<String>,
    pub doc: Vec<String>,
    pub ghost: Vec<String>,
    pub plain: Vec<String>,
}

impl FileTable {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&FileRecord> {
        self.files.get(path)
    }

    fn insert(&mut self, record: FileRecord) {
        let list = match record.class {
            FileClass::Config => &mut self.config,
            FileClass::Doc => &mut self.doc,
            FileClass::Ghost => &mut self.ghost,
            FileClass::Plain => &mut self.plain,
        };
        list.push(record.path.clone());
        self.files.insert(record.path.clone(), record);
    }
}

/// Build the file table from whichever path schema the header carries
pub fn build(header: &dyn HeaderSource) -> Result<FileTable> {
    let paths = resolve_paths(header)?;
    let mut table = FileTable::default();

    if paths.is_empty() {
        return Ok(table);
    }

    let count = paths.len();
    let flags = column(header.integers(Tag::FileFlags).into_list(), count, Tag::FileFlags)?;
    let modes = column(header.integers(Tag::FileModes).into_list(), count, Tag::FileModes)?;
    let owners = column(header.strings(Tag::FileUserName).into_list(), count, Tag::FileUserName)?;
    let groups = column(header.strings(Tag::FileGroupName).into_list(), count, Tag::FileGroupName)?;
    let links = column(header.strings(Tag::FileLinkTos).into_list(), count, Tag::FileLinkTos)?;

    for (idx, path) in paths.into_iter().enumerate() {
        let flags = FileFlags::from(flags[idx]);
        table.insert(FileRecord {
            path,
            mode: modes[idx],
            owner: owners[idx].clone(),
            group: groups[idx].clone(),
            link_target: links[idx].clone(),
            flags,
            class: flags.class(),
        });
    }

    debug!(
        "Built file table: {} files ({} config, {} doc, {} ghost)",
        table.len(),
        table.config.len(),
        table.doc.len(),
        table.ghost.len()
    );

    Ok(table)
}

/// Full path list: the legacy flat tag if non-empty, otherwise
/// `dirnames[dirindexes[i]] + basenames[i]`
pub fn resolve_paths(header: &dyn HeaderSource) -> Result<Vec<String>> {
    let legacy = header.strings(Tag::OldFileNames).into_list();
    if !legacy.is_empty() {
        return Ok(legacy);
    }

    let basenames = header.strings(Tag::BaseNames).into_list();
    if basenames.is_empty() {
        return Ok(Vec::new());
    }

    let dirnames = header.strings(Tag::DirNames).into_list();
    let dirindexes = header.integers(Tag::DirIndexes).into_list();

    if dirindexes.len() != basenames.len() {
        return Err(Error::DecodingDefect(format!(
            "{} basenames but {} dir indexes",
            basenames.len(),
            dirindexes.len()
        )));
    }

    basenames
        .into_iter()
        .zip(dirindexes)
        .map(|(base, dir_idx)| {
            let dir = dirnames.get(dir_idx as usize).ok_or_else(|| {
                Error::DecodingDefect(format!(
                    "dir index {} out of range ({} dirnames) for {}",
                    dir_idx,
                    dirnames.len(),
                    base
                ))
            })?;
            Ok(format!("{}{}", dir, base))
        })
        .collect()
}

/// Per-file metadata column; absent means defaults, present must match
fn column<T: Clone + Default>(values: Vec<T>, count: usize, tag: Tag) -> Result<Vec<T>> {
    if values.is_empty() {
        return Ok(vec![T::default(); count]);
    }
    if values.len() != count {
        return Err(Error::DecodingDefect(format!(
            "{:?} has {} entries for {} files",
            tag,
            values.len(),
            count
        )));
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packages::MemoryHeader;
    use std::collections::HashSet;

    fn legacy_header(paths: &[&str], flags: &[u32]) -> MemoryHeader {
        let n = paths.len();
        MemoryHeader::new()
            .with_strings(Tag::OldFileNames, paths.iter().copied())
            .with_integers(Tag::FileFlags, flags.iter().copied())
            .with_integers(Tag::FileModes, std::iter::repeat_n(0o100644, n))
            .with_strings(Tag::FileUserName, std::iter::repeat_n("root", n))
            .with_strings(Tag::FileGroupName, std::iter::repeat_n("root", n))
            .with_strings(Tag::FileLinkTos, std::iter::repeat_n("", n))
    }

    #[test]
    fn test_zero_files() {
        let table = build(&MemoryHeader::new()).unwrap();

        assert!(table.is_empty());
        assert!(table.config.is_empty());
        assert!(table.doc.is_empty());
        assert!(table.ghost.is_empty());
    }

    #[test]
    fn test_empty_legacy_and_no_triplet() {
        let header = MemoryHeader::new().with_strings(Tag::OldFileNames, Vec::<String>::new());
        assert!(build(&header).unwrap().is_empty());
    }

    #[test]
    fn test_triplet_reconstruction() {
        let header = MemoryHeader::new()
            .with_strings(Tag::BaseNames, ["a", "b"])
            .with_strings(Tag::DirNames, ["/x/", "/y/"])
            .with_integers(Tag::DirIndexes, [0, 1]);

        assert_eq!(resolve_paths(&header).unwrap(), vec!["/x/a", "/y/b"]);
    }

    #[test]
    fn test_scalar_dirindex() {
        let header = MemoryHeader::new()
            .with_strings(Tag::BaseNames, ["bash"])
            .with_strings(Tag::DirNames, ["/bin/"])
            .with_integer(Tag::DirIndexes, 0);

        assert_eq!(resolve_paths(&header).unwrap(), vec!["/bin/bash"]);
    }

    #[test]
    fn test_legacy_takes_precedence() {
        let header = MemoryHeader::new()
            .with_strings(Tag::OldFileNames, ["/old/path"])
            .with_strings(Tag::BaseNames, ["a", "b"])
            .with_strings(Tag::DirNames, ["/x/", "/y/"])
            .with_integers(Tag::DirIndexes, [0, 1]);

        assert_eq!(resolve_paths(&header).unwrap(), vec!["/old/path"]);
    }

    #[test]
    fn test_dir_index_out_of_range() {
        let header = MemoryHeader::new()
            .with_strings(Tag::BaseNames, ["a"])
            .with_strings(Tag::DirNames, ["/x/"])
            .with_integers(Tag::DirIndexes, [3]);

        assert!(matches!(resolve_paths(&header), Err(Error::DecodingDefect(_))));
    }

    #[test]
    fn test_classification_priority() {
        let header = legacy_header(
            &["/etc/foo.conf", "/usr/share/doc/foo/README", "/var/log/foo.log", "/usr/bin/foo", "/etc/both"],
            &[1, 2, 64, 0, 1 | 2 | 64],
        );

        let table = build(&header).unwrap();

        assert_eq!(table.config, vec!["/etc/foo.conf", "/etc/both"]);
        assert_eq!(table.doc, vec!["/usr/share/doc/foo/README"]);
        assert_eq!(table.ghost, vec!["/var/log/foo.log"]);
        assert_eq!(table.plain, vec!["/usr/bin/foo"]);
        assert_eq!(table.get("/etc/both").unwrap().class, FileClass::Config);
    }

    #[test]
    fn test_classes_partition_files() {
        let header = legacy_header(
            &["/a", "/b", "/c", "/d", "/e", "/f"],
            &[3, 66, 64, 0, 256, 1 | 64],
        );

        let table = build(&header).unwrap();

        let mut seen = HashSet::new();
        for path in table.config.iter().chain(&table.doc).chain(&table.ghost).chain(&table.plain) {
            assert!(seen.insert(path.clone()), "{} classified twice", path);
        }
        let keys: HashSet<String> = table.files.keys().cloned().collect();
        assert_eq!(seen, keys);
    }

    #[test]
    fn test_record_fields() {
        let header = MemoryHeader::new()
            .with_strings(Tag::BaseNames, ["sh"])
            .with_strings(Tag::DirNames, ["/bin/"])
            .with_integers(Tag::DirIndexes, [0])
            .with_integers(Tag::FileFlags, [0])
            .with_integers(Tag::FileModes, [0o120777])
            .with_strings(Tag::FileUserName, ["root"])
            .with_strings(Tag::FileGroupName, ["wheel"])
            .with_strings(Tag::FileLinkTos, ["bash"]);

        let table = build(&header).unwrap();
        let record = table.get("/bin/sh").unwrap();

        assert_eq!(record.mode, 0o120777);
        assert_eq!(record.owner, "root");
        assert_eq!(record.group, "wheel");
        assert_eq!(record.link_target, "bash");
        assert_eq!(record.class, FileClass::Plain);
    }

    #[test]
    fn test_absent_metadata_defaults() {
        let header = MemoryHeader::new().with_strings(Tag::OldFileNames, ["/opt/x"]);

        let table = build(&header).unwrap();
        let record = table.get("/opt/x").unwrap();

        assert_eq!(record.mode, 0);
        assert!(record.owner.is_empty());
        assert_eq!(table.plain, vec!["/opt/x"]);
    }

    #[test]
    fn test_metadata_length_mismatch() {
        let header = MemoryHeader::new()
            .with_strings(Tag::OldFileNames, ["/a", "/b"])
            .with_integers(Tag::FileModes, [0o644]);

        assert!(matches!(build(&header), Err(Error::DecodingDefect(_))));
    }

    #[test]
    fn test_build_is_idempotent() {
        let header = legacy_header(&["/etc/a", "/usr/b"], &[1, 0]);
        assert_eq!(build(&header).unwrap(), build(&header).unwrap());
    }
}
