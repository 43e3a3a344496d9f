// src/search.rs

//! Regular-expression search over extracted files

use crate::error::Result;
use regex::bytes::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// True if any line of the file at `path` matches `regex`
///
/// Lines are matched as raw bytes, so binary files are searched too.
pub fn grep(regex: &Regex, path: &Path) -> Result<bool> {
    let reader = BufReader::new(File::open(path)?);

    for line in reader.split(b'\n') {
        if regex.is_match(&line?) {
            return Ok(true);
        }
    }

    Ok(false)
}

/// Compile `pattern` and search `path` with it
pub fn grep_pattern(pattern: &str, path: &Path) -> Result<bool> {
    let regex = Regex::new(pattern)?;
    grep(&regex, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_grep_finds_match() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "#!/bin/sh\nexec /usr/local/bin/foo \"$@\"\n").unwrap();

        assert!(grep_pattern(r"/usr/local/", file.path()).unwrap());
        assert!(!grep_pattern(r"^python", file.path()).unwrap());
    }

    #[test]
    fn test_grep_binary_content() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"\x7fELF\x00\x01/tmp/build-root\x00\xff").unwrap();

        assert!(grep_pattern(r"build-root", file.path()).unwrap());
    }

    #[test]
    fn test_grep_missing_file() {
        let result = grep_pattern("x", Path::new("/nonexistent/file"));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_invalid_pattern() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let result = grep_pattern("(unclosed", file.path());
        assert!(matches!(result, Err(Error::Pattern(_))));
    }
}
