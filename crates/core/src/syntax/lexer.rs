//! Tokenizer for the config source language

use super::{Span, SyntaxError};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Num(f64),
    Str(String),
    Template(Vec<RawTemplatePart>),
    Punct(&'static str),
    Eof,
}

/// Raw pieces of a template literal. Interpolated expressions are kept as
/// source text and re-tokenized by the parser, with absolute offsets so
/// their spans still point into the surrounding file.
#[derive(Debug, Clone, PartialEq)]
pub enum RawTemplatePart {
    Text(String),
    Expr {
        src: String,
        offset: usize,
        line: u32,
    },
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub line: u32,
}

/// Multi-character punctuators, longest first so prefixes never shadow them.
const PUNCTUATORS: &[&str] = &[
    "===", "!==", "=>", "==", "!=", "<=", ">=", "&&", "||", "(", ")", "[", "]", "{", "}", ",", ";",
    ":", ".", "=", "+", "-", "*", "/", "%", "!", "<", ">", "|",
];

pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
    tokenize_at(source, 0, 1)
}

/// Tokenize a slice that starts `offset` bytes into (and on `line` of) the
/// surrounding file, keeping all spans absolute.
pub fn tokenize_at(source: &str, offset: usize, line: u32) -> Result<Vec<Token>, SyntaxError> {
    let mut lexer = Lexer {
        src: source,
        pos: 0,
        offset,
        line,
    };
    lexer.run()
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    offset: usize,
    line: u32,
}

impl<'a> Lexer<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.src[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(message, self.line)
    }

    fn run(&mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia()?;
            let start = self.pos;
            let line = self.line;
            let Some(c) = self.peek() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    span: Span::new(self.offset + self.pos, self.offset + self.pos),
                    line,
                });
                return Ok(tokens);
            };

            let kind = if c.is_ascii_alphabetic() || c == '_' || c == '$' {
                self.lex_ident()
            } else if c.is_ascii_digit() {
                self.lex_number()?
            } else if c == '"' || c == '\'' {
                self.lex_string(c)?
            } else if c == '`' {
                self.lex_template()?
            } else {
                self.lex_punct()?
            };

            tokens.push(Token {
                kind,
                span: Span::new(self.offset + start, self.offset + self.pos),
                line,
            });
        }
    }

    fn skip_trivia(&mut self) -> Result<(), SyntaxError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek_second() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.peek_second() == Some('*') => {
                    self.bump();
                    self.bump();
                    loop {
                        match self.peek() {
                            Some('*') if self.peek_second() == Some('/') => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            Some(_) => {
                                self.bump();
                            }
                            None => return Err(self.error("unterminated block comment")),
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn lex_ident(&mut self) -> TokenKind {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                self.bump();
            } else {
                break;
            }
        }
        TokenKind::Ident(self.src[start..self.pos].to_string())
    }

    fn lex_number(&mut self) -> Result<TokenKind, SyntaxError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.bump();
            } else {
                break;
            }
        }
        if self.peek() == Some('.') && self.peek_second().map_or(false, |c| c.is_ascii_digit()) {
            self.bump();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    self.bump();
                } else {
                    break;
                }
            }
        }
        let text = &self.src[start..self.pos];
        let value = text
            .parse::<f64>()
            .map_err(|_| self.error(format!("invalid number literal '{}'", text)))?;
        Ok(TokenKind::Num(value))
    }

    fn lex_string(&mut self, quote: char) -> Result<TokenKind, SyntaxError> {
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(TokenKind::Str(value)),
                Some('\\') => {
                    let escaped = self
                        .bump()
                        .ok_or_else(|| self.error("unterminated string literal"))?;
                    value.push(unescape(escaped));
                }
                Some('\n') | None => return Err(self.error("unterminated string literal")),
                Some(c) => value.push(c),
            }
        }
    }

    fn lex_template(&mut self) -> Result<TokenKind, SyntaxError> {
        self.bump();
        let mut parts = Vec::new();
        let mut text = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated template literal")),
                Some('`') => {
                    self.bump();
                    if !text.is_empty() {
                        parts.push(RawTemplatePart::Text(text));
                    }
                    return Ok(TokenKind::Template(parts));
                }
                Some('\\') => {
                    self.bump();
                    let escaped = self
                        .bump()
                        .ok_or_else(|| self.error("unterminated template literal"))?;
                    text.push(unescape(escaped));
                }
                Some('$') if self.peek_second() == Some('{') => {
                    if !text.is_empty() {
                        parts.push(RawTemplatePart::Text(std::mem::take(&mut text)));
                    }
                    self.bump();
                    self.bump();
                    let expr_start = self.pos;
                    let expr_line = self.line;
                    let mut depth = 1usize;
                    loop {
                        match self.peek() {
                            None => return Err(self.error("unterminated template expression")),
                            Some('{') => {
                                depth += 1;
                                self.bump();
                            }
                            Some('}') => {
                                depth -= 1;
                                if depth == 0 {
                                    break;
                                }
                                self.bump();
                            }
                            Some(_) => {
                                self.bump();
                            }
                        }
                    }
                    let src = self.src[expr_start..self.pos].to_string();
                    parts.push(RawTemplatePart::Expr {
                        src,
                        offset: self.offset + expr_start,
                        line: expr_line,
                    });
                    self.bump();
                }
                Some(c) => {
                    text.push(c);
                    self.bump();
                }
            }
        }
    }

    fn lex_punct(&mut self) -> Result<TokenKind, SyntaxError> {
        for p in PUNCTUATORS {
            if self.src[self.pos..].starts_with(p) {
                for _ in 0..p.chars().count() {
                    self.bump();
                }
                return Ok(TokenKind::Punct(p));
            }
        }
        let c = self.peek().unwrap_or('\0');
        Err(self.error(format!("unexpected character '{}'", c)))
    }
}

fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_call_statement() {
        let tokens = tokenize(r#"task("build", () => {});"#).expect("lexes");
        let idents: Vec<_> = tokens
            .iter()
            .filter_map(|t| match &t.kind {
                TokenKind::Ident(name) => Some(name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(idents, vec!["task"]);
        assert!(matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)));
    }

    #[test]
    fn skips_line_and_block_comments() {
        let tokens = tokenize("// hi\n/* there */ 42").expect("lexes");
        assert!(matches!(tokens[0].kind, TokenKind::Num(n) if n == 42.0));
    }

    #[test]
    fn spans_are_byte_ranges_into_the_source() {
        let src = "  command";
        let tokens = tokenize(src).expect("lexes");
        assert_eq!(tokens[0].span.slice(src), "command");
    }

    #[test]
    fn template_literals_keep_interpolation_offsets() {
        let src = "`a ${name} b`";
        let tokens = tokenize(src).expect("lexes");
        match &tokens[0].kind {
            TokenKind::Template(parts) => {
                assert_eq!(parts.len(), 3);
                match &parts[1] {
                    RawTemplatePart::Expr { src: expr, offset, .. } => {
                        assert_eq!(expr, "name");
                        assert_eq!(*offset, 5);
                    }
                    other => panic!("expected expression part, got {:?}", other),
                }
            }
            other => panic!("expected template token, got {:?}", other),
        }
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(tokenize("\"oops").is_err());
    }
}
