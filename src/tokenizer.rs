use std::fmt;

use crate::types::{ShellError, ShellResult};

pub const DEFAULT_MAX_TOKENS: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(String),      // Command name, argument or file name
    Pipe,              // |
    RedirectOut,       // >
    RedirectAppend,    // >>
    RedirectIn,        // <
    DupStderrToStdout, // 2>&1
    And,               // &&
    Background,        // &
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(w) => f.write_str(w),
            Token::Pipe => f.write_str("|"),
            Token::RedirectOut => f.write_str(">"),
            Token::RedirectAppend => f.write_str(">>"),
            Token::RedirectIn => f.write_str("<"),
            Token::DupStderrToStdout => f.write_str("2>&1"),
            Token::And => f.write_str("&&"),
            Token::Background => f.write_str("&"),
        }
    }
}

fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

fn is_operator_char(c: char) -> bool {
    matches!(c, '>' | '<' | '|' | '&')
}

/// Splits one input line into words and operators.
///
/// Boundary rules, checked in this order at the start of every token:
/// 1. `2>&1` is an operator wherever it appears, even glued to a word.
/// 2. `>>` is the append operator only when followed by a separator or the
///    end of the line. Otherwise it starts a word (`>>out`) that the
///    redirection resolver rejects later.
/// 3. `&&` is a single operator.
/// 4. `>`, `<`, `|` and `&` are single-character operators anywhere; they
///    end a word in progress, so `ls>out` lexes as `ls`, `>`, `out`.
///
/// Everything else accumulates into a word up to the next separator or
/// operator. The lexer is consumed as it goes; lex the line again to
/// revisit it.
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn skip_separators(&mut self) {
        while let Some(c) = self.rest().chars().next() {
            if !is_separator(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    pub fn next_token(&mut self) -> Option<Token> {
        self.skip_separators();
        let rest = self.rest();
        let first = rest.chars().next()?;

        if rest.starts_with("2>&1") {
            self.pos += 4;
            return Some(Token::DupStderrToStdout);
        }
        if let Some(after) = rest.strip_prefix(">>") {
            self.pos += 2;
            if after.chars().next().map_or(true, is_separator) {
                return Some(Token::RedirectAppend);
            }
            return Some(Token::Word(format!(">>{}", self.read_word())));
        }
        if rest.starts_with("&&") {
            self.pos += 2;
            return Some(Token::And);
        }

        let token = match first {
            '>' => Token::RedirectOut,
            '<' => Token::RedirectIn,
            '|' => Token::Pipe,
            '&' => Token::Background,
            _ => return Some(Token::Word(self.read_word())),
        };
        self.pos += 1;
        Some(token)
    }

    fn read_word(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.rest().chars().next() {
            if is_separator(c) || is_operator_char(c) || self.rest().starts_with("2>&1") {
                break;
            }
            self.pos += c.len_utf8();
        }
        self.input[start..self.pos].to_string()
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}

/// Lexes a whole line, refusing lines with more than `limit` tokens.
pub fn tokenize(input: &str, limit: usize) -> ShellResult<Vec<Token>> {
    let mut tokens = Vec::new();
    for token in Lexer::new(input) {
        if tokens.len() == limit {
            return Err(ShellError::TooManyTokens(limit));
        }
        tokens.push(token);
    }
    Ok(tokens)
}
