// src/packages/mod.rs

//! Header sources for rpmprobe
//!
//! This module provides access to package header tags. Decoders only see
//! the `HeaderSource` trait, so the same code runs against a parsed RPM
//! file or an in-memory tag set.

pub mod memory;
pub mod rpm;
pub mod traits;

pub use memory::MemoryHeader;
pub use self::rpm::RpmHeader;
pub use traits::{HeaderSource, Tag, TagValue};
