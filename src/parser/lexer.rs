//! Very small hand-written lexer for contract sources.
//!
//! The lexer only breaks the raw text into `Token`s; keywords such as
//! `export`, `ledger` or `circuit` come out as plain `Ident`s and are
//! interpreted by the statement scanner.
//
//  Lexical items:
//
//      Ident    ::= [A-Za-z_][A-Za-z0-9_]*
//      Number   ::= [0-9]+
//      Str      ::= '"' .*? '"'          (backslash escapes the next char)
//      Comment  ::= '//' .* EOL          (kept, used as descriptions)
//      Range    ::= '..'
//      Punct    ::= any other single character
//
//  Whitespace and block comments are discarded. Lexing never fails: an
//  unterminated string or block comment simply runs to end of input.

use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Ident(String),
    Number(String),
    Str(String),
    Comment(String),
    Range,
    Punct(char),
}

impl Token {
    pub fn is_punct(&self, c: char) -> bool {
        matches!(self, Token::Punct(p) if *p == c)
    }

    pub fn is_ident(&self, name: &str) -> bool {
        matches!(self, Token::Ident(id) if id == name)
    }

    /// Source spelling used when re-assembling type expressions.
    pub fn text(&self) -> String {
        match self {
            Token::Ident(s) | Token::Number(s) => s.clone(),
            Token::Str(s) => format!("\"{s}\""),
            Token::Comment(_) => String::new(),
            Token::Range => "..".to_string(),
            Token::Punct(c) => c.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            chars: src.chars().peekable(),
        }
    }

    fn next_char(&mut self) -> Option<char> {
        self.chars.next()
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn consume_while<F: Fn(char) -> bool>(&mut self, pred: F, buf: &mut String) {
        while let Some(c) = self.peek_char() {
            if pred(c) {
                buf.push(c);
                self.next_char();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self, first: char) -> String {
        let mut id = String::new();
        id.push(first);
        self.consume_while(|c| c.is_ascii_alphanumeric() || c == '_', &mut id);
        id
    }

    fn read_number(&mut self, first: char) -> String {
        let mut num = String::new();
        num.push(first);
        self.consume_while(|c| c.is_ascii_digit(), &mut num);
        num
    }

    fn read_string(&mut self) -> String {
        let mut txt = String::new();
        while let Some(c) = self.next_char() {
            match c {
                '"' => break,
                '\\' => {
                    if let Some(escaped) = self.next_char() {
                        txt.push(escaped);
                    }
                }
                c => txt.push(c),
            }
        }
        txt
    }

    fn read_line_comment(&mut self) -> String {
        let mut txt = String::new();
        self.consume_while(|c| c != '\n', &mut txt);
        txt.trim_start_matches('/').trim().to_string()
    }

    fn skip_block_comment(&mut self) {
        let mut prev = '\0';
        while let Some(c) = self.next_char() {
            if prev == '*' && c == '/' {
                return;
            }
            prev = c;
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            while let Some(c) = self.peek_char() {
                if c.is_whitespace() {
                    self.next_char();
                } else {
                    break;
                }
            }

            let ch = self.next_char()?;

            let tok = match ch {
                '/' => match self.peek_char() {
                    Some('/') => {
                        self.next_char();
                        Token::Comment(self.read_line_comment())
                    }
                    Some('*') => {
                        self.next_char();
                        self.skip_block_comment();
                        continue;
                    }
                    _ => Token::Punct('/'),
                },
                '"' => Token::Str(self.read_string()),
                '.' if self.peek_char() == Some('.') => {
                    self.next_char();
                    Token::Range
                }
                c if c.is_ascii_digit() => Token::Number(self.read_number(c)),
                c if c.is_ascii_alphabetic() || c == '_' => Token::Ident(self.read_identifier(c)),
                c => Token::Punct(c),
            };

            return Some(tok);
        }
    }
}
