// src/packages/traits.rs

//! Common traits for header sources

/// Header tags the decoders read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tag {
    Name,
    SourceRpm,
    FileFlags,
    FileModes,
    FileUserName,
    FileGroupName,
    FileLinkTos,
    /// Flat path list used by packages built before rpm 3.0.4
    OldFileNames,
    BaseNames,
    DirNames,
    DirIndexes,
    RequireName,
    RequireVersion,
    RequireFlags,
    ConflictName,
    ConflictVersion,
    ConflictFlags,
    ProvideName,
    ProvideVersion,
    ProvideFlags,
}

/// A tag value as stored in a header
///
/// Array tags holding a single element may come back as a bare `Scalar`;
/// use [`TagValue::into_list`] before indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValue<T> {
    Absent,
    Scalar(T),
    List(Vec<T>),
}

impl<T> Default for TagValue<T> {
    fn default() -> Self {
        TagValue::Absent
    }
}

impl<T> TagValue<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, TagValue::Absent)
    }

    /// True for `Absent` and for an empty list
    pub fn is_empty(&self) -> bool {
        match self {
            TagValue::Absent => true,
            TagValue::Scalar(_) => false,
            TagValue::List(values) => values.is_empty(),
        }
    }

    /// Normalize to a list: `Absent` is empty, a scalar is a one-element list
    pub fn into_list(self) -> Vec<T> {
        match self {
            TagValue::Absent => Vec::new(),
            TagValue::Scalar(value) => vec![value],
            TagValue::List(values) => values,
        }
    }

    /// First element, whichever shape the value has
    pub fn into_first(self) -> Option<T> {
        self.into_list().into_iter().next()
    }
}

impl<T> From<Option<T>> for TagValue<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(TagValue::Absent, TagValue::Scalar)
    }
}

impl<T> From<Vec<T>> for TagValue<T> {
    fn from(values: Vec<T>) -> Self {
        TagValue::List(values)
    }
}

/// Read access to a package header, queried by tag
pub trait HeaderSource {
    /// String or string-array tag
    fn strings(&self, tag: Tag) -> TagValue<String>;

    /// Integer or integer-array tag (16-bit values are widened)
    fn integers(&self, tag: Tag) -> TagValue<u32>;
}
