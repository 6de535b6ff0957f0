//! Tokenizer for Lathe source text

use super::error::{SyntaxError, SyntaxErrorKind};
use std::fmt;

/// Token kinds
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Number(f64),
    Str(String),

    // Keywords
    Use,
    Include,
    Module,
    Function,
    True,
    False,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Semicolon,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Bang,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    NotEq,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(name) => write!(f, "identifier '{}'", name),
            TokenKind::Number(n) => write!(f, "number {}", n),
            TokenKind::Str(s) => write!(f, "string {:?}", s),
            TokenKind::Use => write!(f, "'use'"),
            TokenKind::Include => write!(f, "'include'"),
            TokenKind::Module => write!(f, "'module'"),
            TokenKind::Function => write!(f, "'function'"),
            TokenKind::True => write!(f, "'true'"),
            TokenKind::False => write!(f, "'false'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::LBrace => write!(f, "'{{'"),
            TokenKind::RBrace => write!(f, "'}}'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Semicolon => write!(f, "';'"),
            TokenKind::Assign => write!(f, "'='"),
            TokenKind::Plus => write!(f, "'+'"),
            TokenKind::Minus => write!(f, "'-'"),
            TokenKind::Star => write!(f, "'*'"),
            TokenKind::Slash => write!(f, "'/'"),
            TokenKind::Bang => write!(f, "'!'"),
            TokenKind::Lt => write!(f, "'<'"),
            TokenKind::Le => write!(f, "'<='"),
            TokenKind::Gt => write!(f, "'>'"),
            TokenKind::Ge => write!(f, "'>='"),
            TokenKind::EqEq => write!(f, "'=='"),
            TokenKind::NotEq => write!(f, "'!='"),
        }
    }
}

/// A token with its 1-based source position
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

/// Scan `source` into a token list, collecting recoverable scan errors.
///
/// Unknown characters and malformed literals are recorded and skipped so
/// the parser still sees the rest of the file.
pub fn scan(source: &str) -> (Vec<Token>, Vec<SyntaxError>) {
    Scanner::new(source).run()
}

struct Scanner<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
    errors: Vec<SyntaxError>,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn run(mut self) -> (Vec<Token>, Vec<SyntaxError>) {
        while let Some(&c) = self.chars.peek() {
            let line = self.line;
            let column = self.column;
            match c {
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                }
                '/' => {
                    self.advance();
                    match self.chars.peek() {
                        Some('/') => self.skip_line_comment(),
                        Some('*') => self.skip_block_comment(line, column),
                        _ => self.push(TokenKind::Slash, line, column),
                    }
                }
                '"' => self.scan_string(line, column),
                c if c.is_ascii_digit() => self.scan_number(line, column),
                c if c.is_ascii_alphabetic() || c == '_' || c == '$' => {
                    self.scan_ident(line, column)
                }
                _ => self.scan_punct(line, column),
            }
        }
        (self.tokens, self.errors)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn push(&mut self, kind: TokenKind, line: usize, column: usize) {
        self.tokens.push(Token { kind, line, column });
    }

    fn error(&mut self, kind: SyntaxErrorKind, line: usize, column: usize) {
        self.errors.push(SyntaxError::at(kind, line, column));
    }

    fn skip_line_comment(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn skip_block_comment(&mut self, line: usize, column: usize) {
        self.advance(); // consume '*'
        loop {
            match self.advance() {
                Some('*') if self.chars.peek() == Some(&'/') => {
                    self.advance();
                    return;
                }
                Some(_) => {}
                None => {
                    self.error(SyntaxErrorKind::UnterminatedComment, line, column);
                    return;
                }
            }
        }
    }

    fn scan_string(&mut self, line: usize, column: usize) {
        self.advance(); // opening quote
        let mut value = String::new();
        loop {
            match self.advance() {
                Some('"') => {
                    self.push(TokenKind::Str(value), line, column);
                    return;
                }
                Some('\\') => match self.advance() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('"') => value.push('"'),
                    Some('\\') => value.push('\\'),
                    Some(other) => value.push(other),
                    None => {
                        self.error(SyntaxErrorKind::UnterminatedString, line, column);
                        return;
                    }
                },
                Some('\n') | None => {
                    self.error(SyntaxErrorKind::UnterminatedString, line, column);
                    return;
                }
                Some(c) => value.push(c),
            }
        }
    }

    fn scan_number(&mut self, line: usize, column: usize) {
        let mut text = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() || c == '.' {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        match text.parse::<f64>() {
            Ok(n) => self.push(TokenKind::Number(n), line, column),
            Err(_) => self.error(SyntaxErrorKind::InvalidNumber(text), line, column),
        }
    }

    fn scan_ident(&mut self, line: usize, column: usize) {
        let mut text = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let kind = match text.as_str() {
            "use" => TokenKind::Use,
            "include" => TokenKind::Include,
            "module" => TokenKind::Module,
            "function" => TokenKind::Function,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            _ => TokenKind::Ident(text),
        };
        self.push(kind, line, column);
    }

    fn scan_punct(&mut self, line: usize, column: usize) {
        let c = match self.advance() {
            Some(c) => c,
            None => return,
        };
        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '=' => {
                if self.chars.peek() == Some(&'=') {
                    self.advance();
                    TokenKind::EqEq
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                if self.chars.peek() == Some(&'=') {
                    self.advance();
                    TokenKind::NotEq
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                if self.chars.peek() == Some(&'=') {
                    self.advance();
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.chars.peek() == Some(&'=') {
                    self.advance();
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            other => {
                self.error(SyntaxErrorKind::UnexpectedCharacter(other), line, column);
                return;
            }
        };
        self.push(kind, line, column);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, errors) = scan(source);
        assert!(errors.is_empty(), "unexpected scan errors: {:?}", errors);
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_scan_reference_statement() {
        assert_eq!(
            kinds("include \"lib.lathe\";"),
            vec![
                TokenKind::Include,
                TokenKind::Str("lib.lathe".to_string()),
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn test_scan_assignment() {
        assert_eq!(
            kinds("r = 2.5;"),
            vec![
                TokenKind::Ident("r".to_string()),
                TokenKind::Assign,
                TokenKind::Number(2.5),
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn test_scan_positions() {
        let (tokens, _) = scan("a = 1;\nb = 2;");
        let b = tokens
            .iter()
            .find(|t| t.kind == TokenKind::Ident("b".to_string()))
            .unwrap();
        assert_eq!((b.line, b.column), (2, 1));
    }

    #[test]
    fn test_scan_comments_skipped() {
        assert_eq!(
            kinds("// line\n/* block\nstill block */ module"),
            vec![TokenKind::Module]
        );
    }

    #[test]
    fn test_scan_two_char_operators() {
        assert_eq!(
            kinds("<= >= == != < >"),
            vec![
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::Lt,
                TokenKind::Gt,
            ]
        );
    }

    #[test]
    fn test_unterminated_string_is_recoverable() {
        let (tokens, errors) = scan("s = \"oops\nnext = 1;");
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0].kind,
            SyntaxErrorKind::UnterminatedString
        ));
        // Scanning continued on the next line
        assert!(tokens
            .iter()
            .any(|t| t.kind == TokenKind::Ident("next".to_string())));
    }

    #[test]
    fn test_unexpected_character_is_recoverable() {
        let (tokens, errors) = scan("a = 1; @ b = 2;");
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0].kind,
            SyntaxErrorKind::UnexpectedCharacter('@')
        ));
        assert!(tokens
            .iter()
            .any(|t| t.kind == TokenKind::Ident("b".to_string())));
    }
}
