//! The directive interpreter: ties line splicing, trigraph translation,
//! comment stripping, the conditional stack, the macro table, and the
//! expander into a single pass over one input stream, recursing into
//! `#include`d files (spec.md §4.4, §4.10).
//!
//! Per the error-handling design (SPEC_FULL §7), no directive-level
//! problem stops processing: [`Driver::process`] only returns `Err` for
//! the two genuinely process-level failures — the input can't be read, or
//! include nesting exceeds [`MAX_INCLUDE_DEPTH`]. Everything else goes
//! through the configured [`DiagnosticSink`] and processing continues.

use crate::comment::Stripper;
use crate::config::PreprocessorConfig;
use crate::context::ConditionalStack;
use crate::diagnostics::{DiagnosticSink, StderrDiagnostics};
use crate::error::PreprocessError;
use crate::expand::Expander;
use crate::expr::{DefaultExpressionEvaluator, EvalOutcome, ExpressionEvaluator};
use crate::include::{FsIncludeResolver, IncludeNode, IncludeOrigin, IncludeResolver};
use crate::io::LineSource;
use crate::line;
use crate::macro_table::{DefineOutcome, Macro, MacroTable};
use crate::token::{is_identifier_continue, is_identifier_start, tokenize_line, tokens_to_string, trim_token_whitespace, Token};
use crate::trigraph;

/// Backstop against runaway `#include` recursion. Nothing here detects a
/// cycle directly (spec.md §4.8 relies on header guards, same as
/// `original_source`); this just bounds how deep that recursion can go.
pub const MAX_INCLUDE_DEPTH: usize = 200;

pub struct Driver {
    config: PreprocessorConfig,
    macros: MacroTable,
    evaluator: Box<dyn ExpressionEvaluator>,
    resolver: Box<dyn IncludeResolver>,
    diagnostics: Box<dyn DiagnosticSink>,
    include_tree: Option<IncludeNode>,
}

impl Driver {
    /// Build a driver with the default, filesystem-backed collaborators.
    /// `-D` predefinitions from `config` are installed immediately.
    pub fn new(config: PreprocessorConfig) -> Self {
        let mut resolver = FsIncludeResolver::new();
        for dir in &config.user_include_dirs {
            resolver.add_user_dir(dir.clone());
        }
        for dir in &config.system_include_dirs {
            resolver.add_system_dir(dir.clone());
        }
        Self::with_collaborators(
            config,
            Box::new(DefaultExpressionEvaluator),
            Box::new(resolver),
            Box::new(StderrDiagnostics),
        )
    }

    /// Build a driver with explicit collaborators — the seam embedders
    /// and tests use to swap in a stub evaluator, an in-memory include
    /// universe, or a recording diagnostic sink.
    pub fn with_collaborators(
        config: PreprocessorConfig,
        evaluator: Box<dyn ExpressionEvaluator>,
        resolver: Box<dyn IncludeResolver>,
        diagnostics: Box<dyn DiagnosticSink>,
    ) -> Self {
        let mut macros = MacroTable::new();
        for (name, value) in &config.defines {
            let body = normalize_body(tokenize_line(value));
            macros.define(name.clone(), Macro::object_like(body));
        }
        Driver {
            config,
            macros,
            evaluator,
            resolver,
            diagnostics,
            include_tree: None,
        }
    }

    /// The include tree built by the most recent `process` call, for
    /// `-list_includes` (SPEC_FULL §9). `None` until `process` has run.
    pub fn include_tree(&self) -> Option<&IncludeNode> {
        self.include_tree.as_ref()
    }

    /// Process one input stream to completion, recursing into any
    /// `#include`s it names, and return the preprocessed text.
    pub fn process(&mut self, file_name: &str, source: &mut dyn LineSource) -> Result<String, PreprocessError> {
        let raw_lines = source.lines().map_err(|e| PreprocessError::InputUnavailable {
            path: file_name.to_string(),
            reason: e.to_string(),
        })?;
        let mut root = IncludeNode::new(file_name.to_string());
        let mut out = String::new();
        self.process_file(file_name, &raw_lines, 0, &mut root, &mut out)?;
        self.include_tree = Some(root);
        Ok(out)
    }

    fn process_file(
        &mut self,
        file_name: &str,
        raw_lines: &[String],
        depth: usize,
        node: &mut IncludeNode,
        out: &mut String,
    ) -> Result<(), PreprocessError> {
        if depth > MAX_INCLUDE_DEPTH {
            return Err(PreprocessError::IncludeDepthExceeded {
                path: file_name.to_string(),
                limit: MAX_INCLUDE_DEPTH,
            });
        }
        if self.config.debug {
            eprintln!("entering {file_name}");
        }
        if self.config.echo {
            for raw in raw_lines {
                eprintln!("{raw}");
            }
        }

        let translated: Vec<String> = raw_lines.iter().map(|l| trigraph::translate(l)).collect();
        let logical = line::splice(translated.iter().map(String::as_str));

        let mut stripper = Stripper::with_cpp_comments(self.config.cpp_comments);
        let mut conditional = ConditionalStack::new();
        let mut last_line_no = 0usize;

        for ll in &logical {
            last_line_no = ll.line_number;
            let looks_like_directive = ll.text.trim_start().starts_with('#') && !stripper.in_block_comment();
            let stripped = stripper.strip(&ll.text, looks_like_directive);

            if looks_like_directive {
                let directive_text = stripped.trim_start();
                self.handle_directive(file_name, ll.line_number, directive_text, &mut conditional, node, depth, out)?;
            } else if conditional.is_active() {
                let tokens = tokenize_line(&stripped);
                let expanded = Expander::new(&self.macros).expand(&tokens);
                self.emit(out, &tokens_to_string(&expanded));
            }
        }

        if !conditional.is_balanced() {
            self.diagnostics.report(file_name, last_line_no, "unterminated conditional directive");
        }

        Ok(())
    }

    fn handle_directive(
        &mut self,
        file_name: &str,
        line_no: usize,
        text: &str,
        conditional: &mut ConditionalStack,
        node: &mut IncludeNode,
        depth: usize,
        out: &mut String,
    ) -> Result<(), PreprocessError> {
        let rest = text.strip_prefix('#').unwrap_or(text).trim_start();
        let (keyword, arg) = split_identifier(rest);
        let active = conditional.is_active();

        match keyword {
            "define" if active => self.handle_define(file_name, line_no, arg),
            "undef" if active => self.handle_undef(arg),
            "include" if active => self.handle_include(file_name, line_no, arg, node, depth, out)?,
            "if" => {
                let cond = self.evaluate_condition(arg, active);
                conditional.push_if(cond);
            }
            "ifdef" => {
                let cond = active && self.macros.is_defined(arg.trim());
                conditional.push_if(cond);
            }
            "ifndef" => {
                let cond = active && !self.macros.is_defined(arg.trim());
                conditional.push_if(cond);
            }
            "elif" => {
                let cond = self.evaluate_condition(arg, conditional.parent_active());
                if !conditional.elif(cond) {
                    self.diagnostics.report(file_name, line_no, "#elif without matching #if");
                }
            }
            "else" => {
                if !conditional.else_branch() {
                    self.diagnostics.report(file_name, line_no, "#else without matching #if");
                }
            }
            "endif" => {
                if !conditional.endif() {
                    self.diagnostics.report(file_name, line_no, "#endif without matching #if");
                }
            }
            "error" if active => {
                self.diagnostics.report(file_name, line_no, &format!("#error {}", arg.trim()));
            }
            "warning" if active => {
                self.diagnostics.report(file_name, line_no, &format!("#warning {}", arg.trim()));
            }
            "pragma" | "" => {}
            _ if active => {
                self.diagnostics.report(file_name, line_no, &format!("unknown directive '#{keyword}'"));
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_define(&mut self, file_name: &str, line_no: usize, arg: &str) {
        let trimmed = arg.trim_start();
        let (name, rest) = split_identifier(trimmed);
        if name.is_empty() {
            self.diagnostics.report(file_name, line_no, "#define missing macro name");
            return;
        }

        let outcome = if let Some(after_paren) = rest.strip_prefix('(') {
            match after_paren.find(')') {
                Some(close) => {
                    let params_str = &after_paren[..close];
                    let params: Vec<String> = if params_str.trim().is_empty() {
                        Vec::new()
                    } else {
                        params_str.split(',').map(|p| p.trim().to_string()).collect()
                    };
                    if params.iter().any(|p| p.is_empty() || !p.chars().next().is_some_and(is_identifier_start)) {
                        self.diagnostics
                            .report(file_name, line_no, &format!("#define {name}: malformed parameter list"));
                        return;
                    }
                    let body = normalize_body(tokenize_line(after_paren[close + 1..].trim_start()));
                    self.macros.define(name.to_string(), Macro::function_like(params, body))
                }
                None => {
                    self.diagnostics
                        .report(file_name, line_no, &format!("#define {name}: unterminated parameter list"));
                    return;
                }
            }
        } else {
            let body = normalize_body(tokenize_line(rest.trim_start()));
            self.macros.define(name.to_string(), Macro::object_like(body))
        };

        if let DefineOutcome::ConflictingRedefinition = outcome {
            self.diagnostics.report(file_name, line_no, &format!("'{name}' redefined"));
        }
        if self.config.debug {
            eprintln!("#define {name} - {file_name}:{line_no}");
        }
    }

    fn handle_undef(&mut self, arg: &str) {
        let name = arg.trim();
        if !name.is_empty() {
            self.macros.undef(name);
        }
    }

    fn handle_include(
        &mut self,
        file_name: &str,
        line_no: usize,
        arg: &str,
        node: &mut IncludeNode,
        depth: usize,
        out: &mut String,
    ) -> Result<(), PreprocessError> {
        // spec.md §4.8 step 1: expand the argument as a preprocessor line
        // first, so `#include MACRO` works the same as a literal
        // `#include "file.h"` (grounded on `CPrePro.cpp`'s
        // `replace_defines(data, true)` call in `process_include_command`).
        let tokens = tokenize_line(arg);
        let with_defined_resolved = self.resolve_defined(&tokens);
        let expanded = Expander::new(&self.macros).expand(&with_defined_resolved);
        let expanded_text = tokens_to_string(&expanded);
        let trimmed = expanded_text.trim();

        let name = match matching_delimited(trimmed) {
            Some(name) => name,
            None => {
                self.diagnostics
                    .report(file_name, line_no, &format!("malformed #include: '{trimmed}'"));
                return Ok(());
            }
        };

        match self.resolver.resolve(name) {
            None => {
                self.diagnostics
                    .report(file_name, line_no, &format!("include file '{name}' not found"));
            }
            Some(resolved) => {
                if self.config.skip_std && matches!(resolved.origin, IncludeOrigin::System) {
                    node.add_child(format!("{name} (skipped)"));
                    return Ok(());
                }
                match self.resolver.read_to_string(&resolved.path) {
                    Err(e) => {
                        self.diagnostics
                            .report(file_name, line_no, &format!("cannot read include file '{name}': {e}"));
                    }
                    Ok(content) => {
                        let child = node.add_child(name.to_string());
                        let lines: Vec<String> = content.lines().map(str::to_string).collect();
                        self.process_file(name, &lines, depth + 1, child, out)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Evaluate a `#if`/`#elif` condition: resolve `defined(...)`/`defined
    /// X` first (never macro-expanded), expand what remains, then delegate
    /// to the configured evaluator. Never evaluated when `active` is
    /// false — an inactive region's conditions are skipped, not just
    /// their output (spec.md §4.7).
    fn evaluate_condition(&mut self, arg: &str, active: bool) -> bool {
        if !active {
            return false;
        }
        let tokens = tokenize_line(arg);
        let with_defined_resolved = self.resolve_defined(&tokens);
        let expanded = Expander::new(&self.macros).expand(&with_defined_resolved);
        let text = tokens_to_string(&trim_token_whitespace(expanded));
        match self.evaluator.evaluate(text.trim()) {
            EvalOutcome::Integer(n) => n != 0,
            EvalOutcome::Failure => false,
        }
    }

    fn resolve_defined(&self, tokens: &[Token]) -> Vec<Token> {
        let mut out = Vec::with_capacity(tokens.len());
        let mut i = 0;
        while i < tokens.len() {
            if matches!(&tokens[i], Token::Identifier(name) if name == "defined") {
                if let Some((target, next)) = parse_defined_operand(tokens, i + 1) {
                    let value = if self.macros.is_defined(&target) { "1" } else { "0" };
                    out.push(Token::Other(value.to_string()));
                    i = next;
                    continue;
                }
            }
            out.push(tokens[i].clone());
            i += 1;
        }
        out
    }

    fn emit(&mut self, out: &mut String, text: &str) {
        if self.config.quiet {
            return;
        }
        if self.config.no_blank_lines && text.trim().is_empty() {
            return;
        }
        out.push_str(text);
        out.push('\n');
    }
}

/// An empty replacement text is normalized to the literal `1` (spec.md §3,
/// §4.6) — `#define FLAG` behaves the same as `#define FLAG 1`.
fn normalize_body(body: Vec<Token>) -> Vec<Token> {
    let trimmed = trim_token_whitespace(body);
    if trimmed.is_empty() {
        tokenize_line("1")
    } else {
        trimmed
    }
}

/// Parse a `#include` argument's file-name portion: the first non-space
/// character selects the opening delimiter (`"` or `<`) and the *matching*
/// terminator (`"` or `>` respectively) closes it — anything after the
/// terminator, such as a trailing comment remnant, is ignored rather than
/// making the line malformed (spec.md §4.8 step 2).
fn matching_delimited(s: &str) -> Option<&str> {
    let (open_idx, open) = s.char_indices().find(|&(_, c)| !c.is_whitespace())?;
    let close = match open {
        '"' => '"',
        '<' => '>',
        _ => return None,
    };
    let after_open = &s[open_idx + open.len_utf8()..];
    let end = after_open.find(close)?;
    Some(&after_open[..end])
}

fn split_identifier(s: &str) -> (&str, &str) {
    let mut end = 0;
    for (i, c) in s.char_indices() {
        let ok = if i == 0 { is_identifier_start(c) } else { is_identifier_continue(c) };
        if !ok {
            break;
        }
        end = i + c.len_utf8();
    }
    (&s[..end], &s[end..])
}

fn skip_ws(tokens: &[Token], mut idx: usize) -> usize {
    while idx < tokens.len() && tokens[idx].is_whitespace() {
        idx += 1;
    }
    idx
}

/// Parse the operand of `defined` starting at `idx`: either `(NAME)` or a
/// bare `NAME`. Returns the macro name and the index just past the
/// operand, or `None` if the form doesn't match.
fn parse_defined_operand(tokens: &[Token], idx: usize) -> Option<(String, usize)> {
    let idx = skip_ws(tokens, idx);
    if matches!(tokens.get(idx), Some(Token::Other(s)) if s == "(") {
        let name_idx = skip_ws(tokens, idx + 1);
        if let Some(Token::Identifier(name)) = tokens.get(name_idx) {
            let close_idx = skip_ws(tokens, name_idx + 1);
            if matches!(tokens.get(close_idx), Some(Token::Other(s)) if s == ")") {
                return Some((name.clone(), close_idx + 1));
            }
        }
        None
    } else if let Some(Token::Identifier(name)) = tokens.get(idx) {
        Some((name.clone(), idx + 1))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingDiagnostics;
    use crate::include::ResolvedInclude;
    use crate::io::StringLineSource;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    struct MapResolver {
        files: HashMap<String, String>,
    }

    impl IncludeResolver for MapResolver {
        fn resolve(&self, name: &str) -> Option<ResolvedInclude> {
            if self.files.contains_key(name) {
                Some(ResolvedInclude {
                    path: PathBuf::from(name),
                    origin: IncludeOrigin::UserDir,
                })
            } else {
                None
            }
        }

        fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
            self.files
                .get(path.to_str().unwrap_or_default())
                .cloned()
                .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "not found"))
        }
    }

    fn driver(config: PreprocessorConfig) -> Driver {
        Driver::with_collaborators(
            config,
            Box::new(DefaultExpressionEvaluator),
            Box::new(MapResolver { files: HashMap::new() }),
            Box::new(StderrDiagnostics),
        )
    }

    fn driver_with_includes(config: PreprocessorConfig, files: HashMap<String, String>) -> Driver {
        Driver::with_collaborators(
            config,
            Box::new(DefaultExpressionEvaluator),
            Box::new(MapResolver { files }),
            Box::new(StderrDiagnostics),
        )
    }

    #[test]
    fn expands_object_and_function_macros_end_to_end() {
        let mut d = driver(PreprocessorConfig::new());
        let mut src = StringLineSource::new("#define SIZE 10\n#define ADD(a, b) ((a) + (b))\nint x[SIZE] = ADD(1, 2);\n");
        let out = d.process("t.c", &mut src).unwrap();
        assert_eq!(out, "int x[10] = ((1) + (2));\n");
    }

    #[test]
    fn stringize_escapes_embedded_quotes() {
        let mut d = driver(PreprocessorConfig::new());
        let mut src = StringLineSource::new("#define STR(x) #x\nchar *s = STR(say \"hi\");\n");
        let out = d.process("t.c", &mut src).unwrap();
        assert_eq!(out, "char *s = \"say \\\"hi\\\"\";\n");
    }

    #[test]
    fn token_paste_triggers_rescan() {
        let mut d = driver(PreprocessorConfig::new());
        let mut src = StringLineSource::new("#define FOOBAR hit\n#define CAT(a, b) a##b\nCAT(FOO, BAR)\n");
        let out = d.process("t.c", &mut src).unwrap();
        assert_eq!(out, "hit\n");
    }

    #[test]
    fn ifdef_else_selects_branch() {
        let mut d = driver(PreprocessorConfig::new());
        let mut src = StringLineSource::new("#define FEATURE\n#ifdef FEATURE\nyes\n#else\nno\n#endif\n");
        let out = d.process("t.c", &mut src).unwrap();
        assert_eq!(out, "yes\n");
    }

    #[test]
    fn defined_with_predefine_flag() {
        let cfg = PreprocessorConfig::new().with_define("DEBUG_MODE", "1");
        let mut d = driver(cfg);
        let mut src = StringLineSource::new("#if defined(DEBUG_MODE)\non\n#else\noff\n#endif\n");
        let out = d.process("t.c", &mut src).unwrap();
        assert_eq!(out, "on\n");
    }

    #[test]
    fn self_referencing_macro_does_not_loop() {
        let mut d = driver(PreprocessorConfig::new());
        let mut src = StringLineSource::new("#define X (1 + X)\nX\n");
        let out = d.process("t.c", &mut src).unwrap();
        assert_eq!(out, "(1 + X)\n");
    }

    #[test]
    fn block_comment_spanning_lines_is_removed() {
        let mut d = driver(PreprocessorConfig::new());
        let mut src = StringLineSource::new("int a; /* start\nstill comment\nend */ int b;\n");
        let out = d.process("t.c", &mut src).unwrap();
        assert_eq!(out, "int a; \n\n int b;\n");
    }

    #[test]
    fn include_pulls_in_child_file_content() {
        let mut files = HashMap::new();
        files.insert("greet.h".to_string(), "#define GREETING hi\n".to_string());
        let mut d = driver_with_includes(PreprocessorConfig::new(), files);
        let mut src = StringLineSource::new("#include \"greet.h\"\nGREETING\n");
        let out = d.process("t.c", &mut src).unwrap();
        assert_eq!(out, "hi\n");
        let tree = d.include_tree().unwrap();
        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].filename, "greet.h");
    }

    #[test]
    fn include_argument_naming_a_macro_is_expanded_first() {
        let mut files = HashMap::new();
        files.insert("greet.h".to_string(), "#define GREETING hi\n".to_string());
        let mut d = driver_with_includes(PreprocessorConfig::new(), files);
        let mut src = StringLineSource::new("#define HDR \"greet.h\"\n#include HDR\nGREETING\n");
        let out = d.process("t.c", &mut src).unwrap();
        assert_eq!(out, "hi\n");
    }

    #[test]
    fn include_with_trailing_content_after_terminator_still_resolves() {
        let mut files = HashMap::new();
        files.insert("greet.h".to_string(), "#define GREETING hi\n".to_string());
        let mut d = driver_with_includes(PreprocessorConfig::new(), files);
        let mut src = StringLineSource::new("#include <greet.h> extra junk\nGREETING\n");
        let out = d.process("t.c", &mut src).unwrap();
        assert_eq!(out, "hi\n");
    }

    #[test]
    fn include_missing_quote_or_angle_is_reported_but_not_fatal() {
        let mut d = Driver::with_collaborators(
            PreprocessorConfig::new(),
            Box::new(DefaultExpressionEvaluator),
            Box::new(MapResolver { files: HashMap::new() }),
            Box::new(RecordingDiagnostics::default()),
        );
        let mut src = StringLineSource::new("#include greet.h\nafter\n");
        let out = d.process("t.c", &mut src).unwrap();
        assert_eq!(out, "after\n");
    }

    #[test]
    fn malformed_directive_is_reported_but_processing_continues() {
        let mut d = Driver::with_collaborators(
            PreprocessorConfig::new(),
            Box::new(DefaultExpressionEvaluator),
            Box::new(MapResolver { files: HashMap::new() }),
            Box::new(RecordingDiagnostics::default()),
        );
        let mut src = StringLineSource::new("#define\nafter\n");
        let out = d.process("t.c", &mut src).unwrap();
        assert_eq!(out, "after\n");
    }

    #[test]
    fn orphan_endif_is_reported_not_fatal() {
        let mut d = driver(PreprocessorConfig::new());
        let mut src = StringLineSource::new("#endif\nkeep going\n");
        let out = d.process("t.c", &mut src).unwrap();
        assert_eq!(out, "keep going\n");
    }

    #[test]
    fn error_directive_does_not_abort_processing() {
        let mut d = driver(PreprocessorConfig::new());
        let mut src = StringLineSource::new("#error boom\nstill here\n");
        let out = d.process("t.c", &mut src).unwrap();
        assert_eq!(out, "still here\n");
    }

    #[test]
    fn no_blank_lines_flag_drops_empty_output_lines() {
        let cfg = PreprocessorConfig::new().no_blank_lines(true);
        let mut d = driver(cfg);
        let mut src = StringLineSource::new("a;\n\nb;\n");
        let out = d.process("t.c", &mut src).unwrap();
        assert_eq!(out, "a;\nb;\n");
    }

    #[test]
    fn quiet_flag_suppresses_output() {
        let cfg = PreprocessorConfig::new().quiet(true);
        let mut d = driver(cfg);
        let mut src = StringLineSource::new("a;\nb;\n");
        let out = d.process("t.c", &mut src).unwrap();
        assert_eq!(out, "");
    }

    #[test]
    fn empty_replacement_normalizes_to_one() {
        let mut d = driver(PreprocessorConfig::new());
        let mut src = StringLineSource::new("#define FLAG\nFLAG\n");
        let out = d.process("t.c", &mut src).unwrap();
        assert_eq!(out, "1\n");
    }

    #[test]
    fn predefine_without_value_normalizes_to_one() {
        let cfg = PreprocessorConfig::new().with_define("FLAG", "");
        let mut d = driver(cfg);
        let mut src = StringLineSource::new("FLAG\n");
        let out = d.process("t.c", &mut src).unwrap();
        assert_eq!(out, "1\n");
    }

    #[test]
    fn bare_hash_line_is_silently_skipped() {
        let mut d = Driver::with_collaborators(
            PreprocessorConfig::new(),
            Box::new(DefaultExpressionEvaluator),
            Box::new(MapResolver { files: HashMap::new() }),
            Box::new(RecordingDiagnostics::default()),
        );
        let mut src = StringLineSource::new("#\nkeep going\n");
        let out = d.process("t.c", &mut src).unwrap();
        assert_eq!(out, "keep going\n");
    }
}
