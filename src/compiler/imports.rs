//! Rewrites top-level `import` declarations into destructures of capability
//! namespaces: `import { A, B as C } from "x"` becomes
//! `const { A, B: C } = <namespace for "x">;`.

use super::lexer::{significant_tokens, unquote, Splices, Token, TokenKind};
use super::CompileError;
use crate::registry::NamespaceRegistry;
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// A binding that was skipped while rewriting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportWarning {
    pub specifier: String,
    pub binding: String,
    pub reason: &'static str,
}

impl fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "skipped `{}` from \"{}\": {}", self.binding, self.specifier, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub source: String,
    pub warnings: Vec<ImportWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct NamedBinding {
    /// Exported name, already quoted if it came from a string literal.
    imported: String,
    local: String,
}

impl NamedBinding {
    fn property(&self) -> String {
        if self.imported == self.local {
            self.local.clone()
        } else {
            format!("{}: {}", self.imported, self.local)
        }
    }
}

/// Rewrites every top-level import in `source`.
pub fn rewrite_imports(source: &str, registry: &NamespaceRegistry) -> Result<Rewrite, CompileError> {
    let tokens = significant_tokens(source);
    let mut splices = Splices::default();
    let mut warnings = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        if !starts_import(&tokens, i, source) {
            i += 1;
            continue;
        }

        let statement = ImportStatement::parse(&tokens, i, source)?;
        for (binding, reason) in &statement.skipped {
            let warning = ImportWarning {
                specifier: statement.specifier.clone(),
                binding: binding.clone(),
                reason: *reason,
            };
            warn!(specifier = %warning.specifier, binding = %warning.binding, "{}", reason);
            warnings.push(warning);
        }

        let replacement = if statement.named.is_empty() {
            debug!(specifier = %statement.specifier, "Dropping import without named bindings");
            String::new()
        } else {
            let resolved = registry.resolve(&statement.specifier);
            let properties: Vec<String> = statement.named.iter().map(NamedBinding::property).collect();
            format!("const {{ {} }} = {};", properties.join(", "), resolved.binding())
        };

        let span = tokens[i].span.start..tokens[statement.end].span.end;
        splices.replace(span, replacement);
        i = statement.end + 1;
    }

    let source = if splices.is_empty() {
        source.to_string()
    } else {
        splices.apply(source)
    };
    Ok(Rewrite { source, warnings })
}

/// `import` at the top level that is not `import(...)` or `import.meta`.
fn starts_import(tokens: &[Token], i: usize, source: &str) -> bool {
    let token = &tokens[i];
    if token.depth != 0 || !token.is_ident(source, "import") {
        return false;
    }
    if i > 0 && tokens[i - 1].kind == TokenKind::Dot {
        return false;
    }
    !matches!(
        tokens.get(i + 1).map(|t| t.kind),
        Some(TokenKind::LParen) | Some(TokenKind::Dot)
    )
}

struct ImportStatement {
    specifier: String,
    named: Vec<NamedBinding>,
    skipped: Vec<(String, &'static str)>,
    /// Index of the last token of the statement.
    end: usize,
}

impl ImportStatement {
    fn parse(tokens: &[Token], start: usize, source: &str) -> Result<Self, CompileError> {
        let mut cursor = Cursor {
            tokens,
            source,
            pos: start + 1,
            start,
        };
        let mut named = Vec::new();
        let mut skipped = Vec::new();

        // `import "x";` has no clause at all.
        if cursor.peek_kind() != Some(TokenKind::Str) {
            loop {
                match cursor.peek_kind() {
                    Some(TokenKind::LBrace) => {
                        cursor.pos += 1;
                        named.extend(cursor.named_bindings()?);
                    }
                    Some(TokenKind::Star) => {
                        cursor.pos += 1;
                        cursor.expect_word("as")?;
                        let local = cursor.expect_ident("namespace binding name")?;
                        skipped.push((format!("* as {}", local), "namespace imports are not supported"));
                    }
                    Some(TokenKind::Ident) if !cursor.at_word("from") => {
                        let local = cursor.expect_ident("default binding name")?;
                        skipped.push((local, "default imports are not supported"));
                    }
                    _ => return Err(cursor.error("expected an import clause")),
                }

                if cursor.peek_kind() == Some(TokenKind::Comma) {
                    cursor.pos += 1;
                    continue;
                }
                break;
            }
            cursor.expect_word("from")?;
        }

        let specifier = match cursor.peek() {
            Some(token) if token.kind == TokenKind::Str => {
                cursor.pos += 1;
                unquote(token.text(source)).to_string()
            }
            _ => return Err(cursor.error("expected a module specifier string")),
        };

        let mut end = cursor.pos - 1;
        if cursor.peek_kind() == Some(TokenKind::Semi) {
            end = cursor.pos;
        }

        Ok(Self {
            specifier,
            named,
            skipped,
            end,
        })
    }
}

struct Cursor<'a> {
    tokens: &'a [Token],
    source: &'a str,
    pos: usize,
    start: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|token| token.kind)
    }

    fn at_word(&self, word: &str) -> bool {
        self.peek().is_some_and(|token| token.is_ident(self.source, word))
    }

    fn expect_word(&mut self, word: &str) -> Result<(), CompileError> {
        if self.at_word(word) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected `{}`", word)))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<String, CompileError> {
        match self.peek() {
            Some(token) if token.kind == TokenKind::Ident => {
                self.pos += 1;
                Ok(token.text(self.source).to_string())
            }
            _ => Err(self.error(&format!("expected {}", what))),
        }
    }

    /// `{ a, b as c, "d-e" as f, }`, positioned just after the `{`.
    fn named_bindings(&mut self) -> Result<Vec<NamedBinding>, CompileError> {
        let mut bindings = Vec::new();
        loop {
            let Some(token) = self.peek() else {
                return Err(self.error("unterminated import list"));
            };
            match token.kind {
                TokenKind::RBrace => {
                    self.pos += 1;
                    return Ok(bindings);
                }
                TokenKind::Ident | TokenKind::Str => {
                    self.pos += 1;
                    let imported = token.text(self.source).to_string();
                    let local = if self.at_word("as") {
                        self.pos += 1;
                        self.expect_ident("local binding name")?
                    } else if token.kind == TokenKind::Str {
                        return Err(self.error("a quoted import name needs `as <name>`"));
                    } else {
                        imported.clone()
                    };
                    bindings.push(NamedBinding { imported, local });
                }
                _ => return Err(self.error("import binding is not a plain name")),
            }

            match self.peek_kind() {
                Some(TokenKind::Comma) => self.pos += 1,
                Some(TokenKind::RBrace) => {}
                _ => return Err(self.error("expected `,` or `}` in import list")),
            }
        }
    }

    fn error(&self, reason: &str) -> CompileError {
        let from = self.tokens[self.start].span.start;
        let to = self
            .tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(from, |token| token.span.end);
        CompileError::UnresolvableImport {
            statement: self.source[from..to.max(from)].to_string(),
            reason: reason.to_string(),
        }
    }
}
