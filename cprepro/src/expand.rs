//! Macro expansion (spec.md §4.9), grounded on `driver.rs`'s
//! `disabled_macros`-as-blocked-set design: a macro name is pushed onto the
//! blocked set before its replacement is rescanned and popped afterward, so
//! the macro's own name appearing in its own expansion is left untouched
//! rather than looping forever. Recursion is additionally bounded by a
//! depth limit as a backstop independent of the blocked-set mechanism.

use crate::macro_table::MacroTable;
use crate::token::{apply_token_pasting, tokens_to_string, trim_token_whitespace, Token};
use std::collections::HashSet;

/// Default recursion depth cap, matching the order of magnitude
/// `original_source` tolerates before its own stack would unwind;
/// reaching it stops further expansion of the offending fragment rather
/// than aborting the whole preprocessing run.
pub const DEFAULT_MAX_DEPTH: usize = 200;

pub struct Expander<'a> {
    macros: &'a MacroTable,
    max_depth: usize,
}

impl<'a> Expander<'a> {
    pub fn new(macros: &'a MacroTable) -> Self {
        Expander {
            macros,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(macros: &'a MacroTable, max_depth: usize) -> Self {
        Expander { macros, max_depth }
    }

    /// Expand a token sequence to a fixed point.
    pub fn expand(&self, tokens: &[Token]) -> Vec<Token> {
        let mut disabled = HashSet::new();
        self.expand_with(tokens, &mut disabled, 0)
    }

    fn expand_with(&self, tokens: &[Token], disabled: &mut HashSet<String>, depth: usize) -> Vec<Token> {
        if depth > self.max_depth {
            return tokens.to_vec();
        }

        let mut out = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            let expand_here = match &tokens[i] {
                Token::Identifier(name) => self.macros.is_defined(name) && !disabled.contains(name),
                _ => false,
            };

            if !expand_here {
                out.push(tokens[i].clone());
                i += 1;
                continue;
            }

            let name = match &tokens[i] {
                Token::Identifier(name) => name.clone(),
                _ => unreachable!(),
            };
            let mac = self.macros.get(&name).expect("checked is_defined above");

            if !mac.is_function_like() {
                let body = mac.body.clone();
                disabled.insert(name.clone());
                let rescanned = self.expand_with(&body, disabled, depth + 1);
                disabled.remove(&name);
                out.extend(rescanned);
                i += 1;
                continue;
            }

            // Function-like: only an invocation (name immediately followed,
            // modulo whitespace, by '(') is expanded; a bare mention is left
            // as an ordinary identifier.
            let mut j = i + 1;
            while j < tokens.len() && tokens[j].is_whitespace() {
                j += 1;
            }
            let is_invocation = matches!(tokens.get(j), Some(Token::Other(s)) if s == "(");
            if !is_invocation {
                out.push(tokens[i].clone());
                i += 1;
                continue;
            }

            match parse_args(tokens, j) {
                Some((args, end)) => {
                    let params = mac.params.clone().expect("function-like macro has params");
                    let arity_matches = args.len() == params.len()
                        || (params.is_empty() && args.len() == 1 && args[0].is_empty());
                    if !arity_matches {
                        // Argument-count mismatch: the driver reports this as
                        // a diagnostic; the expander itself just leaves the
                        // call unexpanded.
                        out.push(tokens[i].clone());
                        i += 1;
                        continue;
                    }
                    let substituted = substitute(&mac.body, &params, &args, self, disabled, depth);
                    disabled.insert(name.clone());
                    let rescanned = self.expand_with(&substituted, disabled, depth + 1);
                    disabled.remove(&name);
                    out.extend(rescanned);
                    i = end;
                }
                None => {
                    // Unterminated argument list: leave untouched.
                    out.push(tokens[i].clone());
                    i += 1;
                }
            }
        }
        out
    }
}

/// Parse a parenthesized, comma-separated argument list starting at the
/// `(` token found at `open_idx`. Returns the per-argument token slices
/// (whitespace-trimmed) and the index just past the matching `)`, or
/// `None` if the list is unterminated. Nested parentheses are tracked so a
/// comma inside a nested call is not mistaken for an argument separator.
fn parse_args(tokens: &[Token], open_idx: usize) -> Option<(Vec<Vec<Token>>, usize)> {
    let mut depth = 1usize;
    let mut args: Vec<Vec<Token>> = vec![Vec::new()];
    let mut i = open_idx + 1;
    while i < tokens.len() {
        match &tokens[i] {
            Token::Other(s) if s == "(" => {
                depth += 1;
                args.last_mut().expect("always at least one arg bucket").push(tokens[i].clone());
            }
            Token::Other(s) if s == ")" => {
                depth -= 1;
                if depth == 0 {
                    let trimmed = args.into_iter().map(trim_token_whitespace).collect();
                    return Some((trimmed, i + 1));
                }
                args.last_mut().expect("always at least one arg bucket").push(tokens[i].clone());
            }
            Token::Other(s) if s == "," && depth == 1 => {
                args.push(Vec::new());
            }
            _ => {
                args.last_mut().expect("always at least one arg bucket").push(tokens[i].clone());
            }
        }
        i += 1;
    }
    None
}

fn next_non_ws(tokens: &[Token], mut idx: usize) -> Option<&Token> {
    while idx < tokens.len() && tokens[idx].is_whitespace() {
        idx += 1;
    }
    tokens.get(idx)
}

fn prev_non_ws(tokens: &[Token], idx: usize) -> Option<&Token> {
    if idx == 0 {
        return None;
    }
    let mut idx = idx - 1;
    loop {
        if !tokens[idx].is_whitespace() {
            return Some(&tokens[idx]);
        }
        if idx == 0 {
            return None;
        }
        idx -= 1;
    }
}

fn is_hash_hash(tok: &Token) -> bool {
    matches!(tok, Token::Other(s) if s.trim() == "##")
}

fn is_hash(tok: &Token) -> bool {
    matches!(tok, Token::Other(s) if s.trim() == "#")
}

/// Collapse interior whitespace runs to a single space and drop leading
/// and trailing whitespace, matching the stringize operator's whitespace
/// rule.
fn normalize_whitespace(tokens: Vec<Token>) -> Vec<Token> {
    let trimmed = trim_token_whitespace(tokens);
    let mut out = Vec::with_capacity(trimmed.len());
    for t in trimmed {
        if t.is_whitespace() {
            if out.last().is_some_and(Token::is_whitespace) {
                continue;
            }
            out.push(Token::Other(" ".to_string()));
        } else {
            out.push(t);
        }
    }
    out
}

/// Render an (unexpanded) argument as the quoted string literal the `#`
/// operator produces: backslashes and double quotes are escaped, internal
/// whitespace is collapsed.
fn stringize(arg_tokens: &[Token]) -> String {
    let normalized = normalize_whitespace(arg_tokens.to_vec());
    let inner = tokens_to_string(&normalized);
    let escaped = inner.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// Substitute parameters into a macro body, applying `#` stringize and
/// leaving `##` operands unexpanded for the subsequent paste pass.
/// Arguments substituted anywhere else are macro-expanded first (the
/// standard rule: operands of `#`/`##` are the only ones exempted).
fn substitute(
    body: &[Token],
    params: &[String],
    args: &[Vec<Token>],
    expander: &Expander,
    disabled: &HashSet<String>,
    depth: usize,
) -> Vec<Token> {
    let mut result = Vec::new();
    let mut i = 0;
    while i < body.len() {
        if is_hash(&body[i]) {
            let mut j = i + 1;
            while j < body.len() && body[j].is_whitespace() {
                j += 1;
            }
            if let Some(Token::Identifier(name)) = body.get(j) {
                if let Some(idx) = params.iter().position(|p| p == name) {
                    result.push(Token::StringLiteral(stringize(&args[idx])));
                    i = j + 1;
                    continue;
                }
            }
        }

        if let Token::Identifier(name) = &body[i] {
            if let Some(idx) = params.iter().position(|p| p == name) {
                let is_paste_operand =
                    matches!(next_non_ws(body, i + 1), Some(t) if is_hash_hash(t))
                        || matches!(prev_non_ws(body, i), Some(t) if is_hash_hash(t));
                if is_paste_operand {
                    result.extend(args[idx].clone());
                } else {
                    let mut scratch = disabled.clone();
                    result.extend(expander.expand_with(&args[idx], &mut scratch, depth + 1));
                }
                i += 1;
                continue;
            }
        }

        result.push(body[i].clone());
        i += 1;
    }

    apply_token_pasting(&result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macro_table::Macro;
    use crate::token::tokenize_line;

    fn expand_str(macros: &MacroTable, input: &str) -> String {
        let tokens = tokenize_line(input);
        let expander = Expander::new(macros);
        tokens_to_string(&expander.expand(&tokens))
    }

    #[test]
    fn object_macro_expands() {
        let mut macros = MacroTable::new();
        macros.define("MAX".into(), Macro::object_like(tokenize_line("100")));
        assert_eq!(expand_str(&macros, "x = MAX;"), "x = 100;");
    }

    #[test]
    fn function_macro_substitutes_arguments() {
        let mut macros = MacroTable::new();
        macros.define(
            "ADD".into(),
            Macro::function_like(vec!["a".into(), "b".into()], tokenize_line("((a) + (b))")),
        );
        assert_eq!(expand_str(&macros, "ADD(1, 2)"), "((1) + (2))");
    }

    #[test]
    fn function_macro_handles_nested_parens_in_argument() {
        let mut macros = MacroTable::new();
        macros.define(
            "IDENT".into(),
            Macro::function_like(vec!["x".into()], tokenize_line("x")),
        );
        assert_eq!(expand_str(&macros, "IDENT(f(1, 2))"), "f(1, 2)");
    }

    #[test]
    fn bare_mention_of_function_macro_is_untouched() {
        let mut macros = MacroTable::new();
        macros.define(
            "F".into(),
            Macro::function_like(vec!["x".into()], tokenize_line("x")),
        );
        assert_eq!(expand_str(&macros, "&F"), "&F");
    }

    #[test]
    fn stringize_escapes_quotes_and_backslashes() {
        let mut macros = MacroTable::new();
        macros.define(
            "STR".into(),
            Macro::function_like(vec!["x".into()], tokenize_line("#x")),
        );
        assert_eq!(
            expand_str(&macros, r#"STR(a "b" \n)"#),
            r#""a \"b\" \\n""#
        );
    }

    #[test]
    fn token_paste_forms_new_identifier_and_is_rescanned() {
        let mut macros = MacroTable::new();
        macros.define("FOOBAR".into(), Macro::object_like(tokenize_line("42")));
        macros.define(
            "CAT".into(),
            Macro::function_like(vec!["a".into(), "b".into()], tokenize_line("a##b")),
        );
        assert_eq!(expand_str(&macros, "CAT(FOO,BAR)"), "42");
    }

    #[test]
    fn self_reference_is_not_re_expanded() {
        let mut macros = MacroTable::new();
        macros.define("X".into(), Macro::object_like(tokenize_line("(1 + X)")));
        assert_eq!(expand_str(&macros, "X"), "(1 + X)");
    }

    #[test]
    fn function_macro_self_reference_through_recursive_call_is_suppressed() {
        let mut macros = MacroTable::new();
        macros.define(
            "REC".into(),
            Macro::function_like(vec!["n".into()], tokenize_line("REC(n)")),
        );
        assert_eq!(expand_str(&macros, "REC(1)"), "REC(1)");
    }

    #[test]
    fn paste_operand_is_not_expanded_before_pasting() {
        let mut macros = MacroTable::new();
        macros.define("A".into(), Macro::object_like(tokenize_line("should_not_appear")));
        macros.define(
            "CAT".into(),
            Macro::function_like(vec!["x".into()], tokenize_line("x##_suffix")),
        );
        assert_eq!(expand_str(&macros, "CAT(A)"), "A_suffix");
    }
}
