//! Comment stripping (spec.md §4.3), grounded on `CPrePro::remove_comments`.
//!
//! Block-comment state (`in_block_comment`) is carried across logical
//! lines by [`Stripper`] so that a `/* ... */` spanning several lines is
//! handled correctly on non-directive lines. On a directive line the state
//! is forced to `false` on entry and reset to `false` on exit — directives
//! cannot open or continue a block comment (spec.md §4.4, §9).
//!
//! Unlike the teacher's re-lexing approach, string and character literals
//! are tracked so a comment opener that appears inside one is not treated
//! as a comment — this resolves spec.md §9's open question in favor of the
//! recommended, non-buggy behavior.
//!
//! `//` stripping is gated behind `cpp_comments` (spec.md §4.3: "only when
//! C++-mode is enabled"), grounded on `CPrePro.cpp`'s `#ifdef CPP_SUPPORT`
//! guard around the `//` branch of `remove_comments` — `original_source`
//! itself `#define`s `CPP_SUPPORT 1` unconditionally at the top of the
//! file, so the shipped binary always has it on; `cpp_comments` defaults
//! to `true` to match that compiled-in default while still giving an
//! embedder a config toggle to turn it off for strict-C90 input.

/// Stateful comment stripper, one instance per input stream.
pub struct Stripper {
    in_block_comment: bool,
    cpp_comments: bool,
}

impl Default for Stripper {
    fn default() -> Self {
        Stripper {
            in_block_comment: false,
            cpp_comments: true,
        }
    }
}

impl Stripper {
    pub fn new() -> Self {
        Self::default()
    }

    /// A stripper with `//` line-comment stripping explicitly toggled
    /// (spec.md §4.3's "C++-mode").
    pub fn with_cpp_comments(cpp_comments: bool) -> Self {
        Stripper {
            in_block_comment: false,
            cpp_comments,
        }
    }

    /// Strip comments from one logical line.
    ///
    /// `is_directive` forces the in-block-comment state to `false` for the
    /// duration of this call (directives cannot appear inside, or open, a
    /// block comment) and restores it to `false` afterward.
    pub fn strip(&mut self, line: &str, is_directive: bool) -> String {
        let mut in_comment = if is_directive {
            false
        } else {
            self.in_block_comment
        };

        let mut out = String::with_capacity(line.len());
        let mut in_string = false;
        let mut quote = '\0';
        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            let next = chars.get(i + 1).copied();

            if in_comment {
                if c == '*' && next == Some('/') {
                    in_comment = false;
                    i += 2;
                } else {
                    i += 1;
                }
                continue;
            }

            if in_string {
                out.push(c);
                if c == '\\' {
                    if let Some(n) = next {
                        out.push(n);
                        i += 2;
                        continue;
                    }
                } else if c == quote {
                    in_string = false;
                }
                i += 1;
                continue;
            }

            if c == '"' || c == '\'' {
                in_string = true;
                quote = c;
                out.push(c);
                i += 1;
            } else if c == '/' && next == Some('*') {
                in_comment = true;
                i += 2;
            } else if self.cpp_comments && c == '/' && next == Some('/') {
                break;
            } else {
                out.push(c);
                i += 1;
            }
        }

        if is_directive {
            self.in_block_comment = false;
        } else {
            self.in_block_comment = in_comment;
        }

        out
    }

    /// Whether a logical line starting with this state is inside an open
    /// block comment (used by the directive classifier: such a line's
    /// leading `#`, if any, is not a directive).
    pub fn in_block_comment(&self) -> bool {
        self.in_block_comment
    }
}
