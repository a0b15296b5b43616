//! Finds the component's default export and strips the `export` syntax.

use super::lexer::{significant_tokens, Splices, Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultExport {
    pub source: String,
    /// Bound name of the default export, if one of the supported forms was found.
    pub name: Option<String>,
}

const RESERVED: &[&str] = &[
    "function", "class", "async", "await", "new", "this", "null", "true", "false", "typeof",
    "void", "delete", "yield", "let", "const", "var", "return", "if", "else", "for", "while",
];

/// Handles the first top-level `export default`:
///
/// * `export default [async] function [*] Name` and `export default class Name`
///   keep the declaration and drop `export default`;
/// * `export default Name;` is removed entirely.
///
/// Any other shape (arrow functions, anonymous declarations, expressions)
/// leaves the source untouched with no captured name.
pub fn extract_default_export(source: &str) -> DefaultExport {
    let tokens = significant_tokens(source);

    let found = tokens.windows(2).position(|pair| {
        pair[0].depth == 0 && pair[0].is_ident(source, "export") && pair[1].is_ident(source, "default")
    });
    let Some(at) = found else {
        return unchanged(source);
    };

    let export = &tokens[at];
    let rest = &tokens[at + 2..];
    let mut splices = Splices::default();

    let name = match declaration_name(rest, source) {
        Some((declaration, name)) => {
            splices.replace(export.span.start..declaration.span.start, "");
            name
        }
        None => match bare_identifier(rest, source) {
            Some((last, name)) => {
                splices.replace(export.span.start..last.span.end, "");
                name
            }
            None => return unchanged(source),
        },
    };

    DefaultExport {
        source: splices.apply(source),
        name: Some(name),
    }
}

fn unchanged(source: &str) -> DefaultExport {
    DefaultExport {
        source: source.to_string(),
        name: None,
    }
}

/// `[async] function [*] Name` or `class Name`; returns the first token of the
/// declaration and the name.
fn declaration_name<'a>(rest: &'a [Token], source: &str) -> Option<(&'a Token, String)> {
    let first = rest.first()?;
    let mut i = 0;

    if first.is_ident(source, "async") {
        i += 1;
    }
    let keyword = rest.get(i)?;
    if keyword.is_ident(source, "function") {
        i += 1;
        if rest.get(i)?.kind == TokenKind::Star {
            i += 1;
        }
    } else if i == 0 && keyword.is_ident(source, "class") {
        i += 1;
    } else {
        return None;
    }

    let name = rest.get(i)?;
    if name.kind != TokenKind::Ident || RESERVED.contains(&name.text(source)) || name.is_ident(source, "extends") {
        return None;
    }
    Some((first, name.text(source).to_string()))
}

/// `Name` followed by `;`, end of input, or a line break that ends the
/// statement; returns the last token of the statement and the name.
fn bare_identifier<'a>(rest: &'a [Token], source: &str) -> Option<(&'a Token, String)> {
    let ident = rest.first()?;
    if ident.kind != TokenKind::Ident || RESERVED.contains(&ident.text(source)) {
        return None;
    }
    let name = ident.text(source).to_string();

    match rest.get(1) {
        None => Some((ident, name)),
        Some(next) if next.kind == TokenKind::Semi => Some((next, name)),
        Some(next) if next.line_start && !continues_expression(next, source) => Some((ident, name)),
        Some(_) => None,
    }
}

/// Tokens that extend the previous line's expression, so no semicolon is
/// inserted before them.
fn continues_expression(token: &Token, source: &str) -> bool {
    match token.kind {
        TokenKind::Dot
        | TokenKind::LParen
        | TokenKind::Template
        | TokenKind::Regex
        | TokenKind::Star
        | TokenKind::Comma => true,
        TokenKind::Punct => !matches!(token.text(source), "!" | "~" | "@" | "#" | "]"),
        TokenKind::Ident => matches!(token.text(source), "in" | "instanceof"),
        _ => false,
    }
}
