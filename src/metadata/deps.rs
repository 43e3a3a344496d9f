// src/metadata/deps.rs

//! Dependency decoding
//!
//! Each relation family is stored as three parallel arrays (names,
//! versions, flags). Requires carrying the pre-install bit are routed to
//! a separate `prereq` list.

use crate::error::{Error, Result};
use crate::packages::traits::{HeaderSource, Tag};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// RPMSENSE_* bits of a dependency flag word
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SenseFlags(u32);

impl SenseFlags {
    pub const ANY: SenseFlags = SenseFlags(0);
    pub const LESS: SenseFlags = SenseFlags(1 << 1);
    pub const GREATER: SenseFlags = SenseFlags(1 << 2);
    pub const EQUAL: SenseFlags = SenseFlags(1 << 3);
    pub const PREREQ: SenseFlags = SenseFlags(1 << 6);
    pub const INTERP: SenseFlags = SenseFlags(1 << 8);
    pub const SCRIPT_PRE: SenseFlags = SenseFlags(1 << 9);
    pub const SCRIPT_POST: SenseFlags = SenseFlags(1 << 10);
    pub const RPMLIB: SenseFlags = SenseFlags(1 << 24);

    const SENSE_MASK: u32 = Self::LESS.0 | Self::GREATER.0 | Self::EQUAL.0;

    pub const fn from_bits(bits: u32) -> Self {
        SenseFlags(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: SenseFlags) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    #[must_use]
    pub const fn without(self, other: SenseFlags) -> Self {
        SenseFlags(self.0 & !other.0)
    }

    /// Comparison operator encoded in the sense bits, if any
    pub fn operator(self) -> Option<&'static str> {
        let less = self.contains(Self::LESS);
        let greater = self.contains(Self::GREATER);
        let equal = self.contains(Self::EQUAL);

        match (less, greater, equal) {
            (true, false, false) => Some("<"),
            (true, false, true) => Some("<="),
            (false, false, true) => Some("="),
            (false, true, true) => Some(">="),
            (false, true, false) => Some(">"),
            _ if self.0 & Self::SENSE_MASK == 0 => None,
            // LESS|GREATER is not a valid sense, show it raw
            _ => Some("?"),
        }
    }
}

impl From<u32> for SenseFlags {
    fn from(bits: u32) -> Self {
        SenseFlags(bits)
    }
}

/// A single dependency relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    /// Version constraint, empty when unversioned
    pub version: String,
    pub flags: SenseFlags,
}

impl Dependency {
    pub fn new(name: impl Into<String>, version: impl Into<String>, flags: SenseFlags) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            flags,
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.flags.operator() {
            Some(op) if !self.version.is_empty() => write!(f, "{} {} {}", self.name, op, self.version),
            _ => write!(f, "{}", self.name),
        }
    }
}

/// All relation lists of a package
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependencies {
    pub requires: Vec<Dependency>,
    /// Requires that must be satisfied before installation starts
    pub prereq: Vec<Dependency>,
    pub conflicts: Vec<Dependency>,
    pub provides: Vec<Dependency>,
}

/// Decode the require, conflict and provide families
pub fn decode(header: &dyn HeaderSource) -> Result<Dependencies> {
    let mut deps = Dependencies::default();

    for dep in decode_family(header, Tag::RequireName, Tag::RequireVersion, Tag::RequireFlags)? {
        if dep.flags.contains(SenseFlags::PREREQ) {
            deps.prereq.push(Dependency {
                flags: dep.flags.without(SenseFlags::PREREQ),
                ..dep
            });
        } else {
            deps.requires.push(dep);
        }
    }

    deps.conflicts = decode_family(header, Tag::ConflictName, Tag::ConflictVersion, Tag::ConflictFlags)?;
    deps.provides = decode_family(header, Tag::ProvideName, Tag::ProvideVersion, Tag::ProvideFlags)?;

    debug!(
        "Decoded dependencies: {} requires, {} prereq, {} conflicts, {} provides",
        deps.requires.len(),
        deps.prereq.len(),
        deps.conflicts.len(),
        deps.provides.len()
    );

    Ok(deps)
}

fn decode_family(
    header: &dyn HeaderSource,
    name_tag: Tag,
    version_tag: Tag,
    flags_tag: Tag,
) -> Result<Vec<Dependency>> {
    let versions = header.strings(version_tag).into_list();
    if versions.is_empty() {
        return Ok(Vec::new());
    }

    let names = header.strings(name_tag).into_list();
    let flags = header.integers(flags_tag).into_list();

    if names.len() != versions.len() || flags.len() != versions.len() {
        return Err(Error::DecodingDefect(format!(
            "{:?}/{:?}/{:?} lengths differ: {} names, {} versions, {} flags",
            name_tag,
            version_tag,
            flags_tag,
            names.len(),
            versions.len(),
            flags.len()
        )));
    }

    Ok(names
        .into_iter()
        .zip(versions)
        .zip(flags)
        .map(|((name, version), flags)| Dependency {
            name,
            version,
            flags: SenseFlags::from(flags),
        })
        .collect())
}
