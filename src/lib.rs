// src/lib.rs

//! rpmprobe
//!
//! Read-only introspection of RPM packages for linters, auditors and
//! dependency tools.
//!
//! # Architecture
//!
//! - Header sources: tag values pulled from a parsed header (`packages`)
//! - Decoders: dependency relations and the classified file table (`metadata`)
//! - Extraction: on-demand unpacking and file-type identification (`extract`)
//! - `Package`: one handle per package file, memoizing every view

pub mod extract;
mod error;
pub mod metadata;
pub mod package;
pub mod packages;
pub mod search;

pub use error::{Error, Result};
pub use package::Package;
