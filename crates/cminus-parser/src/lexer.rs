//! Concrete scanner (component A′): turns source text into the full
//! [`Token`] vector the parser consumes. Eager (not streaming), since the
//! parser never needs more than one token of lookahead -- there is nothing
//! to gain from incremental scanning.

use cminus_core::{Token, TokenType};
use std::collections::HashMap;

pub struct Lexer<'a> {
    source: &'a [u8],
    start: usize,
    current: usize,
    line: u32,
    col: u32,
    /// Column at which the current token started; captured separately
    /// from `col` because escapes/multi-char operators advance `col` past
    /// the token's first character before `add_token` is called.
    start_col: u32,
    keywords: HashMap<&'static str, TokenType>,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut keywords = HashMap::new();
        keywords.insert("for", TokenType::KeyFor);
        keywords.insert("while", TokenType::KeyWhile);
        keywords.insert("if", TokenType::KeyIf);
        keywords.insert("else", TokenType::KeyElse);
        keywords.insert("void", TokenType::KeyVoid);
        keywords.insert("int", TokenType::KeyInt);
        keywords.insert("char", TokenType::KeyChar);
        keywords.insert("double", TokenType::KeyDouble);
        keywords.insert("return", TokenType::KeyReturn);

        Lexer {
            source: source.as_bytes(),
            start: 0,
            current: 0,
            line: 1,
            col: 1,
            start_col: 1,
            keywords,
            tokens: Vec::new(),
        }
    }

    pub fn scan(mut self) -> Vec<Token> {
        loop {
            self.skip_trivia();
            if self.is_at_end() {
                break;
            }
            self.start = self.current;
            self.start_col = self.col;
            self.scan_one();
        }
        self.tokens
            .push(Token::new(TokenType::EndOfFile, "", self.line, self.col));
        self.tokens
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> u8 {
        let c = self.source[self.current];
        self.current += 1;
        self.col += 1;
        c
    }

    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.source[self.current]
        }
    }

    fn peek_next(&self) -> u8 {
        if self.current + 1 >= self.source.len() {
            0
        } else {
            self.source[self.current + 1]
        }
    }

    fn matches(&mut self, expected: u8) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            return false;
        }
        self.current += 1;
        self.col += 1;
        true
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                b' ' | b'\t' => {
                    self.advance();
                }
                b'\n' => {
                    self.current += 1;
                    self.line += 1;
                    self.col = 1;
                }
                b'/' if self.current + 1 < self.source.len() && self.source[self.current + 1] == b'/' => {
                    while self.peek() != b'\n' && !self.is_at_end() {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn add_token(&mut self, kind: TokenType) {
        let text = std::str::from_utf8(&self.source[self.start..self.current])
            .unwrap_or("")
            .to_string();
        self.tokens.push(Token::new(kind, text, self.line, self.start_col));
    }

    fn add_token_text(&mut self, kind: TokenType, text: String) {
        self.tokens.push(Token::new(kind, text, self.line, self.start_col));
    }

    fn scan_one(&mut self) {
        let c = self.advance();
        match c {
            b'+' => {
                if self.matches(b'+') {
                    self.add_token(TokenType::Inc);
                } else if self.matches(b'=') {
                    self.add_token(TokenType::IncAssign);
                } else {
                    self.add_token(TokenType::Plus);
                }
            }
            b'-' => {
                if self.matches(b'-') {
                    self.add_token(TokenType::Dec);
                } else if self.matches(b'=') {
                    self.add_token(TokenType::MinusAssign);
                } else {
                    self.add_token(TokenType::Minus);
                }
            }
            b'*' => self.add_token(TokenType::Mult),
            b'/' => self.add_token(TokenType::Div),
            b'%' => self.add_token(TokenType::Mod),
            b'[' => self.add_token(TokenType::LBracket),
            b']' => self.add_token(TokenType::RBracket),
            b'(' => self.add_token(TokenType::LParen),
            b')' => self.add_token(TokenType::RParen),
            b'{' => self.add_token(TokenType::LBrace),
            b'}' => self.add_token(TokenType::RBrace),
            b';' => self.add_token(TokenType::SemiColon),
            b',' => self.add_token(TokenType::Comma),
            b'&' => {
                if self.matches(b'&') {
                    self.add_token(TokenType::And);
                } else {
                    self.add_token(TokenType::Addr);
                }
            }
            b'|' => {
                if self.matches(b'|') {
                    self.add_token(TokenType::Or);
                } else {
                    self.add_token(TokenType::Unknown);
                }
            }
            b'!' => {
                if self.matches(b'=') {
                    self.add_token(TokenType::NotEqual);
                } else {
                    self.add_token(TokenType::Not);
                }
            }
            b'=' => {
                if self.matches(b'=') {
                    self.add_token(TokenType::EqualTo);
                } else {
                    self.add_token(TokenType::Assign);
                }
            }
            b'<' => {
                if self.matches(b'=') {
                    self.add_token(TokenType::LThanOrEq);
                } else {
                    self.add_token(TokenType::LessThan);
                }
            }
            b'>' => {
                if self.matches(b'=') {
                    self.add_token(TokenType::GThanOrEq);
                } else {
                    self.add_token(TokenType::GreaterThan);
                }
            }
            b'"' => self.string(),
            b'\'' => self.character(),
            _ => {
                if c.is_ascii_digit() {
                    self.number();
                } else if c.is_ascii_alphabetic() || c == b'_' {
                    self.identifier();
                } else {
                    self.add_token(TokenType::Unknown);
                }
            }
        }
    }

    fn identifier(&mut self) {
        while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
            self.advance();
        }
        let text = std::str::from_utf8(&self.source[self.start..self.current]).unwrap_or("");
        match self.keywords.get(text) {
            Some(&kind) => self.add_token(kind),
            None => self.add_token(TokenType::Identifier),
        }
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
            self.add_token(TokenType::DoubleLit);
        } else {
            self.add_token(TokenType::IntLit);
        }
    }

    /// Decodes the fixed escape set `\n \t \0 \' \"` at scan time so later
    /// passes see already-unescaped bytes (this is what makes two
    /// differently-spelled literals with the same decoded meaning intern
    /// to the same record).
    fn decode_escape(c: u8) -> Option<u8> {
        match c {
            b'n' => Some(b'\n'),
            b't' => Some(b'\t'),
            b'0' => Some(0),
            b'\'' => Some(b'\''),
            b'"' => Some(b'"'),
            _ => None,
        }
    }

    fn string(&mut self) {
        let mut decoded = Vec::new();
        loop {
            if self.is_at_end() || self.peek() == b'\n' {
                self.add_token(TokenType::Unknown);
                return;
            }
            if self.peek() == b'"' {
                break;
            }
            if self.peek() == b'\\' {
                self.advance();
                match Self::decode_escape(self.peek()) {
                    Some(byte) => {
                        decoded.push(byte);
                        self.advance();
                    }
                    None => {
                        self.add_token(TokenType::Unknown);
                        return;
                    }
                }
            } else {
                decoded.push(self.advance());
            }
        }
        self.advance(); // closing quote
        let text = String::from_utf8_lossy(&decoded).into_owned();
        self.add_token_text(TokenType::StringLit, text);
    }

    fn character(&mut self) {
        let byte = if self.peek() == b'\\' {
            self.advance();
            match Self::decode_escape(self.peek()) {
                Some(b) => {
                    self.advance();
                    b
                }
                None => {
                    self.add_token(TokenType::Unknown);
                    return;
                }
            }
        } else if self.is_at_end() || self.peek() == b'\'' {
            self.add_token(TokenType::Unknown);
            return;
        } else {
            self.advance()
        };
        if self.peek() != b'\'' {
            self.add_token(TokenType::Unknown);
            return;
        }
        self.advance(); // closing quote
        self.add_token_text(TokenType::CharLit, (byte as char).to_string());
    }
}

/// Convenience entry point matching the `scanTokens` driving loop.
pub fn scan(source: &str) -> Vec<Token> {
    Lexer::new(source).scan()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenType> {
        scan(src).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn skips_whitespace_and_line_comments() {
        assert_eq!(
            kinds("  // a comment\n\tint"),
            vec![TokenType::KeyInt, TokenType::EndOfFile]
        );
    }

    #[test]
    fn multi_char_operators_take_priority() {
        assert_eq!(
            kinds("+= -= ++ -- == != <= >= && ||"),
            vec![
                TokenType::IncAssign,
                TokenType::MinusAssign,
                TokenType::Inc,
                TokenType::Dec,
                TokenType::EqualTo,
                TokenType::NotEqual,
                TokenType::LThanOrEq,
                TokenType::GThanOrEq,
                TokenType::And,
                TokenType::Or,
                TokenType::EndOfFile,
            ]
        );
    }

    #[test]
    fn number_rejects_trailing_dot() {
        let toks = scan("5. 3");
        assert_eq!(toks[0].kind, TokenType::IntLit);
        assert_eq!(toks[0].text, "5");
    }

    #[test]
    fn identifier_vs_keyword() {
        assert_eq!(kinds("for forward"), vec![TokenType::KeyFor, TokenType::Identifier, TokenType::EndOfFile]);
    }

    #[test]
    fn string_literal_decodes_escapes() {
        let toks = scan("\"a\\nb\"");
        assert_eq!(toks[0].kind, TokenType::StringLit);
        assert_eq!(toks[0].text, "a\nb");
    }

    #[test]
    fn unterminated_string_is_unknown() {
        let toks = scan("\"abc");
        assert_eq!(toks[0].kind, TokenType::Unknown);
    }

    #[test]
    fn char_literal_decodes_escape() {
        let toks = scan("'\\n'");
        assert_eq!(toks[0].kind, TokenType::CharLit);
        assert_eq!(toks[0].text, "\n");
    }

    #[test]
    fn positions_track_line_and_column() {
        let toks = scan("int\nx");
        assert_eq!((toks[0].line, toks[0].col), (1, 1));
        assert_eq!((toks[1].line, toks[1].col), (2, 1));
    }
}
