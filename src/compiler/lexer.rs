//! Token scanner for component sources (JavaScript with JSX).
//!
//! Only as much structure as the import/export passes need: identifiers,
//! strings, comments and brackets. Anything unrecognized becomes an
//! `Unknown` token, so scanning never fails.

use logos::Logos;
use std::ops::Range;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    #[regex(r"[ \t\r\f]+")]
    Whitespace,
    #[token("\n")]
    Newline,
    #[regex(r"//[^\n]*")]
    LineComment,
    #[token("/*", block_comment)]
    BlockComment,
    // Single-line only, so a stray apostrophe in JSX text cannot swallow the file.
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    #[regex(r"'([^'\\\n]|\\.)*'")]
    Str,
    #[regex(r"`([^`\\]|\\(.|\n))*`")]
    Template,
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*")]
    Ident,
    #[regex(r"[0-9][0-9A-Za-z_.]*")]
    Number,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token("*")]
    Star,
    #[token(".")]
    Dot,
    #[regex(r"[\[\]<>=+\-/%!&|^~?:@#]")]
    Punct,
    /// A `/.../flags` literal; only produced where an operand is expected.
    Regex,
    Unknown,
}

/// Skips to the closing `*/`. An unterminated comment runs to the end of the
/// input and lexes as an error.
fn block_comment(lex: &mut logos::Lexer<TokenKind>) -> bool {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            true
        }
        None => {
            lex.bump(lex.remainder().len());
            false
        }
    }
}

impl TokenKind {
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::Newline | TokenKind::LineComment | TokenKind::BlockComment
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
    /// Bracket nesting (`{` and `(`) before this token.
    pub depth: u32,
    /// A newline separates this token from the previous significant one.
    pub line_start: bool,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.clone()]
    }

    pub fn is_ident(&self, source: &str, word: &str) -> bool {
        self.kind == TokenKind::Ident && self.text(source) == word
    }
}

/// Significant (non-trivia) tokens of `source`, with nesting depth.
pub fn significant_tokens(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut depth: u32 = 0;
    let mut line_start = true;
    let mut lexer = TokenKind::lexer(source);

    while let Some(result) = lexer.next() {
        let mut kind = result.unwrap_or(TokenKind::Unknown);
        let mut span = lexer.span();

        if kind == TokenKind::Punct && &source[span.clone()] == "/" && expects_operand(tokens.last(), source) {
            if let Some(len) = regex_literal_len(lexer.remainder()) {
                lexer.bump(len);
                kind = TokenKind::Regex;
                span = lexer.span();
            }
        }

        if kind.is_trivia() {
            if kind == TokenKind::Newline || source[span].contains('\n') {
                line_start = true;
            }
            continue;
        }

        if matches!(kind, TokenKind::RBrace | TokenKind::RParen) {
            depth = depth.saturating_sub(1);
        }
        tokens.push(Token {
            kind,
            span,
            depth,
            line_start,
        });
        if matches!(kind, TokenKind::LBrace | TokenKind::LParen) {
            depth += 1;
        }
        line_start = false;
    }

    tokens
}

const OPERAND_KEYWORDS: &[&str] = &[
    "return", "typeof", "case", "yield", "await", "void", "delete", "in", "of", "instanceof",
];

/// Whether a `/` after `prev` starts a regex literal rather than a division.
/// `}` is left out: in JSX it usually precedes `/>`.
fn expects_operand(prev: Option<&Token>, source: &str) -> bool {
    let Some(prev) = prev else {
        return true;
    };
    match prev.kind {
        TokenKind::LParen | TokenKind::LBrace | TokenKind::Comma | TokenKind::Semi => true,
        TokenKind::Punct => matches!(prev.text(source), "=" | ":" | "[" | "!" | "&" | "|" | "?"),
        TokenKind::Ident => OPERAND_KEYWORDS.contains(&prev.text(source)),
        _ => false,
    }
}

/// Length of a regex literal's body, closing slash and flags, given the text
/// after its opening slash. `None` if the line ends first.
fn regex_literal_len(rest: &str) -> Option<usize> {
    let mut in_class = false;
    let mut chars = rest.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\n' | '\r' => return None,
            '\\' => match chars.next() {
                None | Some((_, '\n' | '\r')) => return None,
                Some(_) => {}
            },
            '[' => in_class = true,
            ']' => in_class = false,
            '/' if !in_class => {
                let body = i + 1;
                let flags = rest[body..]
                    .find(|c: char| !c.is_ascii_alphanumeric())
                    .unwrap_or(rest.len() - body);
                return Some(body + flags);
            }
            _ => {}
        }
    }
    None
}

/// The text between the quotes of a string token.
pub fn unquote(literal: &str) -> &str {
    if literal.len() >= 2 {
        &literal[1..literal.len() - 1]
    } else {
        literal
    }
}

/// Byte-range replacements applied to a source in one pass.
#[derive(Debug, Default)]
pub struct Splices {
    edits: Vec<(Range<usize>, String)>,
}

impl Splices {
    pub fn replace(&mut self, span: Range<usize>, replacement: impl Into<String>) {
        self.edits.push((span, replacement.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Applies all edits; spans must not overlap.
    pub fn apply(mut self, source: &str) -> String {
        self.edits.sort_by_key(|(span, _)| span.start);
        let mut out = String::with_capacity(source.len());
        let mut cursor = 0;
        for (span, replacement) in self.edits {
            out.push_str(&source[cursor..span.start]);
            out.push_str(&replacement);
            cursor = span.end;
        }
        out.push_str(&source[cursor..]);
        out
    }
}
