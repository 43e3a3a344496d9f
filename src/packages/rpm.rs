// src/packages/rpm.rs

//! RPM header source backed by the `rpm` crate

use crate::error::{Error, Result};
use crate::packages::traits::{HeaderSource, Tag, TagValue};
use rpm::{IndexTag, PackageMetadata};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Parsed header of an RPM file
///
/// Only the lead and headers are read; the payload stays on disk until
/// extraction is requested.
pub struct RpmHeader {
    metadata: PackageMetadata,
}

impl RpmHeader {
    /// Open and parse the headers of an RPM package
    pub fn open(path: &Path) -> Result<Self> {
        debug!("Parsing RPM header: {}", path.display());

        let file = File::open(path)
            .map_err(|e| Error::Format(format!("Failed to open RPM file {}: {}", path.display(), e)))?;

        let mut buf_reader = BufReader::new(file);

        let metadata = PackageMetadata::parse(&mut buf_reader)
            .map_err(|e| Error::Format(format!("Failed to parse RPM {}: {}", path.display(), e)))?;

        Ok(Self { metadata })
    }

    fn index_tag(tag: Tag) -> IndexTag {
        match tag {
            Tag::Name => IndexTag::RPMTAG_NAME,
            Tag::SourceRpm => IndexTag::RPMTAG_SOURCERPM,
            Tag::FileFlags => IndexTag::RPMTAG_FILEFLAGS,
            Tag::FileModes => IndexTag::RPMTAG_FILEMODES,
            Tag::FileUserName => IndexTag::RPMTAG_FILEUSERNAME,
            Tag::FileGroupName => IndexTag::RPMTAG_FILEGROUPNAME,
            Tag::FileLinkTos => IndexTag::RPMTAG_FILELINKTOS,
            Tag::OldFileNames => IndexTag::RPMTAG_OLDFILENAMES,
            Tag::BaseNames => IndexTag::RPMTAG_BASENAMES,
            Tag::DirNames => IndexTag::RPMTAG_DIRNAMES,
            Tag::DirIndexes => IndexTag::RPMTAG_DIRINDEXES,
            Tag::RequireName => IndexTag::RPMTAG_REQUIRENAME,
            Tag::RequireVersion => IndexTag::RPMTAG_REQUIREVERSION,
            Tag::RequireFlags => IndexTag::RPMTAG_REQUIREFLAGS,
            Tag::ConflictName => IndexTag::RPMTAG_CONFLICTNAME,
            Tag::ConflictVersion => IndexTag::RPMTAG_CONFLICTVERSION,
            Tag::ConflictFlags => IndexTag::RPMTAG_CONFLICTFLAGS,
            Tag::ProvideName => IndexTag::RPMTAG_PROVIDENAME,
            Tag::ProvideVersion => IndexTag::RPMTAG_PROVIDEVERSION,
            Tag::ProvideFlags => IndexTag::RPMTAG_PROVIDEFLAGS,
        }
    }
}

impl HeaderSource for RpmHeader {
    fn strings(&self, tag: Tag) -> TagValue<String> {
        let header = &self.metadata.header;
        let index_tag = Self::index_tag(tag);

        if !header.entry_is_present(index_tag) {
            return TagValue::Absent;
        }

        // Array tags first, then the plain and i18n string types
        if let Ok(values) = header.get_entry_data_as_string_array(index_tag) {
            return TagValue::List(values.to_vec());
        }
        if let Ok(value) = header.get_entry_data_as_string(index_tag) {
            return TagValue::Scalar(value.to_string());
        }
        if let Ok(value) = header.get_entry_data_as_i18n_string(index_tag) {
            return TagValue::Scalar(value.to_string());
        }

        debug!("Tag {:?} is present but not string-typed", tag);
        TagValue::Absent
    }

    fn integers(&self, tag: Tag) -> TagValue<u32> {
        let header = &self.metadata.header;
        let index_tag = Self::index_tag(tag);

        if !header.entry_is_present(index_tag) {
            return TagValue::Absent;
        }

        if let Ok(values) = header.get_entry_data_as_u32_array(index_tag) {
            return TagValue::List(values);
        }
        // File modes are stored as INT16
        if let Ok(values) = header.get_entry_data_as_u16_array(index_tag) {
            return TagValue::List(values.into_iter().map(u32::from).collect());
        }

        debug!("Tag {:?} is present but not integer-typed", tag);
        TagValue::Absent
    }
}
