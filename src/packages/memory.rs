// src/packages/memory.rs

//! In-memory header source

use crate::packages::traits::{HeaderSource, Tag, TagValue};
use std::collections::HashMap;

/// Header assembled from already-decoded tag values
///
/// Useful for callers that obtained tags elsewhere (repository metadata,
/// a database) and for exercising the decoders without a package file.
#[derive(Debug, Clone, Default)]
pub struct MemoryHeader {
    strings: HashMap<Tag, TagValue<String>>,
    integers: HashMap<Tag, TagValue<u32>>,
}

impl MemoryHeader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a string-array tag
    pub fn with_strings<I, S>(mut self, tag: Tag, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.strings.insert(tag, TagValue::List(values));
        self
    }

    /// Set a bare string tag
    pub fn with_string(mut self, tag: Tag, value: impl Into<String>) -> Self {
        self.strings.insert(tag, TagValue::Scalar(value.into()));
        self
    }

    /// Set an integer-array tag
    pub fn with_integers(mut self, tag: Tag, values: impl IntoIterator<Item = u32>) -> Self {
        self.integers
            .insert(tag, TagValue::List(values.into_iter().collect()));
        self
    }

    /// Set a bare integer tag
    pub fn with_integer(mut self, tag: Tag, value: u32) -> Self {
        self.integers.insert(tag, TagValue::Scalar(value));
        self
    }
}

impl HeaderSource for MemoryHeader {
    fn strings(&self, tag: Tag) -> TagValue<String> {
        self.strings.get(&tag).cloned().unwrap_or_default()
    }

    fn integers(&self, tag: Tag) -> TagValue<u32> {
        self.integers.get(&tag).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_tags_are_absent() {
        let header = MemoryHeader::new();
        assert!(header.strings(Tag::Name).is_absent());
        assert!(header.integers(Tag::FileModes).is_absent());
    }

    #[test]
    fn test_scalar_and_list_shapes_preserved() {
        let header = MemoryHeader::new()
            .with_string(Tag::Name, "bash")
            .with_integer(Tag::RequireFlags, 8)
            .with_strings(Tag::RequireName, ["glibc"]);

        assert_eq!(header.strings(Tag::Name), TagValue::Scalar("bash".to_string()));
        assert_eq!(header.integers(Tag::RequireFlags), TagValue::Scalar(8));
        assert_eq!(
            header.strings(Tag::RequireName),
            TagValue::List(vec!["glibc".to_string()])
        );
    }
}
