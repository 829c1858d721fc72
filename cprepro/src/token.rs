//! Lexical representation of a logical line's text.
//!
//! `tokenize_line` is a single left-to-right pass that classifies runs of
//! characters as identifiers, string/character literals, or "everything
//! else" (operators, punctuation, whitespace runs). It is not a
//! standards-compliant C tokenizer — numbers, for instance, are not a
//! distinct token kind — only enough structure for the expander to find
//! identifier boundaries and literal regions without re-scanning.

/// Whether `c` can start an identifier.
pub const fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Whether `c` can continue an identifier already started.
pub const fn is_identifier_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// One lexical unit of a logical line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    /// A maximal run of `[A-Za-z_][A-Za-z0-9_]*`.
    Identifier(String),
    /// A `"..."` region, including the delimiting quotes, with backslash
    /// escapes preserved verbatim.
    StringLiteral(String),
    /// A `'...'` region, including the delimiting quotes.
    CharLiteral(String),
    /// Anything else: operators, punctuation, or a run of whitespace.
    Other(String),
}

impl Token {
    /// The raw text this token was lexed from.
    pub fn text(&self) -> &str {
        match self {
            Token::Identifier(s) | Token::StringLiteral(s) | Token::CharLiteral(s) | Token::Other(s) => s,
        }
    }

    /// Whether this token is a run of whitespace.
    pub fn is_whitespace(&self) -> bool {
        matches!(self, Token::Other(s) if !s.is_empty() && s.chars().all(char::is_whitespace))
    }
}

/// Tokenize one logical line.
///
/// String and character literal regions are scanned to their unescaped
/// closing quote (or end of input, if unterminated) so that identifier
/// scanning is suppressed inside them, per the expander's scanning rule.
pub fn tokenize_line(line: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if is_identifier_start(c) {
            let mut s = String::new();
            while let Some(&c2) = chars.peek() {
                if is_identifier_continue(c2) {
                    s.push(c2);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Identifier(s));
        } else if c == '"' || c == '\'' {
            let quote = c;
            let mut s = String::new();
            s.push(quote);
            chars.next();
            while let Some(c2) = chars.next() {
                s.push(c2);
                if c2 == '\\' {
                    if let Some(c3) = chars.next() {
                        s.push(c3);
                    }
                } else if c2 == quote {
                    break;
                }
            }
            if quote == '"' {
                tokens.push(Token::StringLiteral(s));
            } else {
                tokens.push(Token::CharLiteral(s));
            }
        } else if c.is_whitespace() {
            let mut s = String::new();
            while let Some(&c2) = chars.peek() {
                if c2.is_whitespace() {
                    s.push(c2);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Other(s));
        } else {
            chars.next();
            if c == '#' && chars.peek() == Some(&'#') {
                chars.next();
                tokens.push(Token::Other("##".to_string()));
            } else {
                tokens.push(Token::Other(c.to_string()));
            }
        }
    }

    tokens
}

/// Render tokens back to their original text.
pub fn tokens_to_string(tokens: &[Token]) -> String {
    let len: usize = tokens.iter().map(|t| t.text().len()).sum();
    let mut out = String::with_capacity(len);
    for t in tokens {
        out.push_str(t.text());
    }
    out
}

/// Drop leading and trailing whitespace tokens from a token sequence.
pub fn trim_token_whitespace(mut tokens: Vec<Token>) -> Vec<Token> {
    let mut start = 0;
    while start < tokens.len() && tokens[start].is_whitespace() {
        start += 1;
    }
    let mut end = tokens.len();
    while end > start && tokens[end - 1].is_whitespace() {
        end -= 1;
    }
    tokens.drain(end..);
    tokens.drain(0..start);
    tokens
}

/// Concatenate two tokens for `##`. The result is an identifier only if
/// both operands are identifiers; otherwise it is an opaque `Other` run.
fn concatenate(left: &Token, right: &Token) -> Token {
    let joined = format!("{}{}", left.text(), right.text());
    match (left, right) {
        (Token::Identifier(_), Token::Identifier(_)) => Token::Identifier(joined),
        _ => Token::Other(joined),
    }
}

/// Apply every `##` occurrence in a fragment: whitespace on both sides is
/// dropped along with the operator, and the two flanking tokens are
/// textually concatenated. Does not recurse into the result — the caller
/// rescans it through the expander, which is what may re-identify it as a
/// macro invocation.
pub fn apply_token_pasting(tokens: &[Token]) -> Vec<Token> {
    let mut result: Vec<Token> = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let is_paste = matches!(&tokens[i], Token::Other(s) if s.trim() == "##");
        if is_paste {
            while result.last().is_some_and(Token::is_whitespace) {
                result.pop();
            }
            let mut next = i + 1;
            while next < tokens.len() && tokens[next].is_whitespace() {
                next += 1;
            }
            if let (Some(prev), true) = (result.pop(), next < tokens.len()) {
                result.push(concatenate(&prev, &tokens[next]));
                i = next + 1;
                continue;
            }
            // No token on one side: drop the operator, keep scanning (mirrors
            // the original's "if can't find, treat as normal token" fallback
            // only when nothing was poppable; otherwise we already consumed it).
            i += 1;
            continue;
        }
        result.push(tokens[i].clone());
        i += 1;
    }
    result
}
