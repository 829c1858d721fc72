//! `#include` resolution (spec.md §4.8, SPEC_FULL §6.4), grounded on
//! `CPrePro::get_include_file`'s four-step search order.

use crate::io;
use std::fs;
use std::path::{Path, PathBuf};

/// Where a resolved include file came from. Only `System`-resolved files
/// are eligible to be skipped by `-skip_std` (SPEC_FULL §6.4) — a literal
/// or user-directory match never is, matching `original_source`'s `std`
/// bool, which only steps 3/4 of the search set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeOrigin {
    Literal,
    UserDir,
    System,
}

#[derive(Debug, Clone)]
pub struct ResolvedInclude {
    pub path: PathBuf,
    pub origin: IncludeOrigin,
}

/// Abstracts filesystem access so the core can be tested without touching
/// disk and so embedders can supply an in-memory include universe.
pub trait IncludeResolver {
    fn resolve(&self, name: &str) -> Option<ResolvedInclude>;
    fn read_to_string(&self, path: &Path) -> std::io::Result<String>;
}

/// Real filesystem-backed resolver, directory search order grounded in
/// `get_include_file`:
///
/// 1. `name` itself, if it exists as given;
/// 2. each user include directory (`-Idir`), in the order they were added;
/// 3. each system include directory, in the order they were added;
/// 4. `/usr/include/<name>` as a final fallback.
pub struct FsIncludeResolver {
    pub user_dirs: Vec<PathBuf>,
    pub system_dirs: Vec<PathBuf>,
}

impl FsIncludeResolver {
    pub fn new() -> Self {
        FsIncludeResolver {
            user_dirs: Vec::new(),
            system_dirs: Vec::new(),
        }
    }

    pub fn add_user_dir(&mut self, dir: impl Into<PathBuf>) {
        self.user_dirs.push(dir.into());
    }

    pub fn add_system_dir(&mut self, dir: impl Into<PathBuf>) {
        self.system_dirs.push(dir.into());
    }
}

impl Default for FsIncludeResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Probe a candidate path through the §6 filesystem contract
/// (`io::exists`) rather than calling `Path::exists` directly, so the
/// existence probe stays a single seam. Non-UTF-8 paths (rare for include
/// names) fall back to `Path::exists`.
fn path_exists(path: &Path) -> bool {
    match path.to_str() {
        Some(s) => io::exists(s),
        None => path.exists(),
    }
}

impl IncludeResolver for FsIncludeResolver {
    fn resolve(&self, name: &str) -> Option<ResolvedInclude> {
        let literal = Path::new(name);
        if path_exists(&literal) {
            return Some(ResolvedInclude {
                path: literal.to_path_buf(),
                origin: IncludeOrigin::Literal,
            });
        }
        for dir in &self.user_dirs {
            let candidate = dir.join(name);
            if path_exists(&candidate) {
                return Some(ResolvedInclude {
                    path: candidate,
                    origin: IncludeOrigin::UserDir,
                });
            }
        }
        for dir in &self.system_dirs {
            let candidate = dir.join(name);
            if path_exists(&candidate) {
                return Some(ResolvedInclude {
                    path: candidate,
                    origin: IncludeOrigin::System,
                });
            }
        }
        let fallback = Path::new("/usr/include").join(name);
        if path_exists(&fallback) {
            return Some(ResolvedInclude {
                path: fallback,
                origin: IncludeOrigin::System,
            });
        }
        None
    }

    fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        fs::read_to_string(path)
    }
}

/// Tree of include relationships built while processing, printed by
/// `-list_includes` (SPEC_FULL §9), grounded in `original_source`'s
/// `Include`/`Includes` and `terminate()`'s depth-first print.
#[derive(Debug, Clone)]
pub struct IncludeNode {
    pub filename: String,
    pub children: Vec<IncludeNode>,
}

impl IncludeNode {
    pub fn new(filename: impl Into<String>) -> Self {
        IncludeNode {
            filename: filename.into(),
            children: Vec::new(),
        }
    }

    pub fn add_child(&mut self, filename: impl Into<String>) -> &mut IncludeNode {
        self.children.push(IncludeNode::new(filename));
        self.children.last_mut().expect("just pushed")
    }

    /// Render the tree depth-first, two spaces per level, matching the
    /// original's indented listing.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&self.filename);
        out.push('\n');
        for child in &self.children {
            child.render_into(out, depth + 1);
        }
    }
}
