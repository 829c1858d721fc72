//! Line splicing (spec.md §4.1): physical lines ending in an unescaped
//! `\` are joined into a single logical line, carrying the line number of
//! the *last* physical line consumed.

/// One logical line: its text (trigraph-translated, continuations joined)
/// and the 1-based physical line number it ends on.
pub struct LogicalLine {
    pub text: String,
    pub line_number: usize,
}

/// Splice a sequence of trigraph-translated physical lines into logical
/// lines. `lines` must already have trigraph translation applied to each
/// entry (spec.md §4.1: trigraph translation precedes splicing).
pub fn splice<'a, I>(lines: I) -> Vec<LogicalLine>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = Vec::new();
    let mut pending = String::new();
    let mut joining = false;
    let mut physical_no = 0usize;

    for raw in lines {
        physical_no += 1;
        if let Some(stripped) = raw.strip_suffix('\\') {
            pending.push_str(stripped);
            joining = true;
        } else {
            pending.push_str(raw);
            out.push(LogicalLine {
                text: std::mem::take(&mut pending),
                line_number: physical_no,
            });
            joining = false;
        }
    }

    // Unterminated trailing continuation: emit what we have.
    if joining {
        out.push(LogicalLine {
            text: pending,
            line_number: physical_no,
        });
    }

    out
}
