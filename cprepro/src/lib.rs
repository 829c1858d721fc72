#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

//! A C-style source preprocessor: directive interpreter and macro
//! expander.
//!
//! The core (this crate) is a pure, synchronous text transform. It reaches
//! the outside world only through three narrow traits — [`expr::ExpressionEvaluator`],
//! [`io::LineSource`], and [`include::IncludeResolver`] — plus a
//! [`diagnostics::DiagnosticSink`] for reporting problems that never stop
//! processing. [`driver::Driver`] is the entry point; everything else is a
//! building block it composes.

pub mod comment;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod expand;
pub mod expr;
pub mod include;
pub mod io;
pub mod line;
pub mod macro_table;
pub mod token;
pub mod trigraph;

pub use config::PreprocessorConfig;
pub use driver::Driver;
pub use error::PreprocessError;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::StringLineSource;

    /// A small end-to-end pass exercising splicing, trigraphs, comments,
    /// conditionals, and expansion together — the kind of whole-pipeline
    /// smoke test that belongs at the crate root rather than in any one
    /// module's unit tests.
    #[test]
    fn full_pipeline_smoke_test() {
        let source = concat!(
            "??=define MAX(a, b) \\\n",
            "    ((a) > (b) ? (a) : (b))\n",
            "/* top of file */\n",
            "#ifdef MAX\n",
            "int best = MAX(3, 7);\n",
            "#else\n",
            "int best = 0;\n",
            "#endif\n",
        );
        let mut driver = Driver::new(PreprocessorConfig::new());
        let mut src = StringLineSource::new(source);
        let out = driver.process("smoke.c", &mut src).unwrap();
        assert_eq!(out, "\nint best = ((3) > (7) ? (3) : (7));\n");
    }

    #[test]
    fn predefined_macro_and_undef_roundtrip() {
        let cfg = PreprocessorConfig::new().with_define("VERSION", "3");
        let mut driver = Driver::new(cfg);
        let mut src = StringLineSource::new("VERSION\n#undef VERSION\nVERSION\n");
        let out = driver.process("v.c", &mut src).unwrap();
        assert_eq!(out, "3\nVERSION\n");
    }
}
