// src/metadata/mod.rs

//! Pure decoders over a header source
//!
//! Nothing here touches the filesystem; `Package` calls each decoder at
//! most once and keeps the result.

pub mod deps;
pub mod files;

pub use deps::{Dependencies, Dependency, SenseFlags};
pub use files::{FileClass, FileFlags, FileRecord, FileTable};
