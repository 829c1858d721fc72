//! Filesystem/input abstraction (spec.md §6, SPEC_FULL §6.3), grounded on
//! `CFile::toLines`: physical lines are yielded without a terminating
//! newline.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// A source of physical lines, decoupling the core from `std::fs`
/// directly so it can be driven from an in-memory buffer in tests.
pub trait LineSource {
    fn lines(&mut self) -> io::Result<Vec<String>>;
}

/// Reads physical lines from a real file.
pub struct FsLineSource {
    path: String,
}

impl FsLineSource {
    pub fn new(path: impl Into<String>) -> Self {
        FsLineSource { path: path.into() }
    }
}

impl LineSource for FsLineSource {
    fn lines(&mut self) -> io::Result<Vec<String>> {
        let file = File::open(&self.path)?;
        BufReader::new(file).lines().collect()
    }
}

/// Reads physical lines from standard input, for `-stdin`.
pub struct StdinLineSource;

impl LineSource for StdinLineSource {
    fn lines(&mut self) -> io::Result<Vec<String>> {
        io::stdin().lock().lines().collect()
    }
}

/// Reads physical lines from an in-memory string, for tests and for
/// embedders that already have source text loaded.
pub struct StringLineSource {
    text: String,
}

impl StringLineSource {
    pub fn new(text: impl Into<String>) -> Self {
        StringLineSource { text: text.into() }
    }
}

impl LineSource for StringLineSource {
    fn lines(&mut self) -> io::Result<Vec<String>> {
        Ok(self.text.lines().map(str::to_string).collect())
    }
}

/// The §6 `exists(path) -> bool` filesystem-contract probe. Used by
/// `include::FsIncludeResolver` for every step of its directory search
/// rather than calling `Path::exists` ad hoc.
pub fn exists(path: &str) -> bool {
    Path::new(path).exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_source_splits_on_newlines_without_terminators() {
        let mut src = StringLineSource::new("a\nb\nc");
        let lines = src.lines().unwrap();
        assert_eq!(lines, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
    }
}
