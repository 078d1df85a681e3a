// rsas - an interpreter for a subset of the SAS language.
// Copyright (C) 2026 Free Software Foundation, Inc.
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <http://www.gnu.org/licenses/>.

//! Lexical analysis.
//!
//! The lexer is a single pass over the source with one character of lookahead
//! (two for distinguishing a `*` comment from multiplication).  It skips
//! whitespace and all three SAS comment forms, resolves reserved words
//! case-insensitively, and switches into a raw line-oriented mode between
//! `datalines;` and the `;` line that terminates the data.
//!
//! Lexical problems do not abort the scan.  They are reported as
//! [Diagnostic]s and the lexer resynchronizes so that the parser still sees
//! as much of the program as possible.

pub mod token;

pub use token::{Token, TokenKind};

use crate::message::{Diagnostic, Point, Severity};

/// Splits `source` into tokens.
///
/// The returned token sequence is always terminated by a [TokenKind::Eof]
/// token.  Problems encountered along the way are returned as diagnostics;
/// errors among them mean some input was dropped or repaired.
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    Lexer::new(source).run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    col: u32,

    /// True at the start of the buffer and right after a `;`, where a `*`
    /// starts a comment rather than a multiplication.
    stmt_start: bool,

    /// Set when a DATALINES keyword has been emitted and its `;` has not.
    datalines_pending: bool,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
            stmt_start: true,
            datalines_pending: false,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_second(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn point(&self) -> Point {
        Point::new(self.line, self.col)
    }

    fn run(mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();
        let mut diagnostics = Vec::new();

        loop {
            self.skip_blank_and_comments(&mut diagnostics);

            let start_line = self.line;
            let start_col = self.col;
            let Some(c) = self.peek() else {
                tokens.push(Token::new(TokenKind::Eof, "", start_line, start_col));
                break;
            };

            let token = if c == '\'' || c == '"' {
                self.lex_string(&mut diagnostics)
            } else if c.is_ascii_digit() {
                self.lex_number()
            } else if c.is_ascii_alphabetic() || c == '_' {
                self.lex_word()
            } else {
                match self.lex_punct() {
                    Some(token) => token,
                    None => {
                        diagnostics.push(Diagnostic::at(
                            Severity::Error,
                            Point::new(start_line, start_col),
                            format!("Unexpected character {c:?} in input."),
                        ));
                        continue;
                    }
                }
            };

            self.stmt_start = token.kind == TokenKind::Semicolon;
            let enter_datalines = self.datalines_pending && token.kind == TokenKind::Semicolon;
            self.datalines_pending = token.kind == TokenKind::Datalines;
            tokens.push(token);

            if enter_datalines {
                self.lex_datalines(&mut tokens, &mut diagnostics);
                self.stmt_start = true;
            }
        }

        (tokens, diagnostics)
    }

    /// Skips whitespace, `/* */` comments, `*`-at-statement-position
    /// comments, and `%*` comments.
    fn skip_blank_and_comments(&mut self, diagnostics: &mut Vec<Diagnostic>) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek_second() == Some('*') => {
                    let start = self.point();
                    self.bump();
                    self.bump();
                    if !self.skip_to_comment_close() {
                        diagnostics.push(Diagnostic::at(
                            Severity::Warning,
                            start,
                            "Comment is not terminated by `*/`; it extends to the end of the \
                             input."
                                .to_string(),
                        ));
                    }
                }
                Some('*') if self.stmt_start => {
                    self.skip_to_semicolon();
                }
                Some('%') if self.peek_second() == Some('*') => {
                    self.skip_to_semicolon();
                }
                _ => return,
            }
        }
    }

    /// Consumes up to and including the closing `*/`.  Returns false if the
    /// comment runs to the end of the input instead.
    fn skip_to_comment_close(&mut self) -> bool {
        while let Some(c) = self.bump() {
            if c == '*' && self.peek() == Some('/') {
                self.bump();
                return true;
            }
        }
        false
    }

    /// Consumes up to and including the next `;`, for `*` and `%*` comments.
    fn skip_to_semicolon(&mut self) {
        while let Some(c) = self.bump() {
            if c == ';' {
                return;
            }
        }
    }

    fn lex_string(&mut self, diagnostics: &mut Vec<Diagnostic>) -> Token {
        let start_line = self.line;
        let start_col = self.col;
        let quote = self.bump().unwrap();

        let mut text = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => {
                    if self.peek() == Some(quote) {
                        // A doubled delimiter stands for one literal
                        // delimiter character.
                        self.bump();
                        text.push(quote);
                    } else {
                        break;
                    }
                }
                Some(c) => text.push(c),
                None => {
                    diagnostics.push(Diagnostic::at(
                        Severity::Error,
                        Point::new(start_line, start_col),
                        "Unterminated string constant.".to_string(),
                    ));
                    break;
                }
            }
        }
        Token::new(TokenKind::StringLiteral, text, start_line, start_col)
    }

    /// `[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?`
    fn lex_number(&mut self) -> Token {
        let start_line = self.line;
        let start_col = self.col;
        let mut text = String::new();

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }

        if self.peek() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
            text.push('.');
            self.bump();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    text.push(c);
                    self.bump();
                } else {
                    break;
                }
            }
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            // Only take the exponent if digits (after an optional sign)
            // actually follow; otherwise `1e` is a number and an identifier.
            let after_sign = match self.peek_second() {
                Some('+' | '-') => self.chars.get(self.pos + 2).copied(),
                other => other,
            };
            if after_sign.is_some_and(|c| c.is_ascii_digit()) {
                text.push(self.bump().unwrap());
                if matches!(self.peek(), Some('+' | '-')) {
                    text.push(self.bump().unwrap());
                }
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        text.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
            }
        }

        Token::new(TokenKind::Number, text, start_line, start_col)
    }

    /// `[A-Za-z_][A-Za-z_0-9]*`, then a case-insensitive reserved word check.
    fn lex_word(&mut self) -> Token {
        let start_line = self.line;
        let start_col = self.col;
        let mut text = String::new();

        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }

        let kind = TokenKind::keyword(&text).unwrap_or(TokenKind::Identifier);
        Token::new(kind, text, start_line, start_col)
    }

    /// Operators and punctuation.  Two-character operators are matched
    /// greedily before their one-character prefixes.
    fn lex_punct(&mut self) -> Option<Token> {
        let start_line = self.line;
        let start_col = self.col;
        let c = self.peek()?;

        let two = match (c, self.peek_second()) {
            ('<', Some('=')) => Some(TokenKind::Le),
            ('>', Some('=')) => Some(TokenKind::Ge),
            ('=', Some('=')) => Some(TokenKind::EqEq),
            ('!', Some('=')) => Some(TokenKind::Ne),
            ('*', Some('*')) => Some(TokenKind::Power),
            _ => None,
        };
        if let Some(kind) = two {
            let mut text = String::new();
            text.push(self.bump().unwrap());
            text.push(self.bump().unwrap());
            return Some(Token::new(kind, text, start_line, start_col));
        }

        let kind = match c {
            '=' => TokenKind::Equals,
            ';' => TokenKind::Semicolon,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '$' => TokenKind::Dollar,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            '&' => TokenKind::Amp,
            '|' => TokenKind::Pipe,
            _ => {
                self.bump();
                return None;
            }
        };
        self.bump();
        Some(Token::new(kind, c, start_line, start_col))
    }

    /// Raw line mode between `datalines;` and the line holding only `;`.
    fn lex_datalines(&mut self, tokens: &mut Vec<Token>, diagnostics: &mut Vec<Diagnostic>) {
        let start = self.point();

        // The data begins on the next line.
        while let Some(c) = self.bump() {
            if c == '\n' {
                break;
            }
        }

        loop {
            if self.peek().is_none() {
                diagnostics.push(Diagnostic::at(
                    Severity::Error,
                    start,
                    "DATALINES data is not terminated by a `;` line.".to_string(),
                ));
                return;
            }

            let line_no = self.line;
            let col = self.col;
            let mut text = String::new();
            while let Some(c) = self.peek() {
                if c == '\n' {
                    break;
                }
                text.push(c);
                self.bump();
            }
            self.bump(); // The newline, if any.

            let trimmed = text.trim();
            if trimmed == ";" {
                tokens.push(Token::new(TokenKind::Semicolon, ";", line_no, col));
                return;
            }
            if !trimmed.is_empty() {
                tokens.push(Token::new(TokenKind::DatalinesLine, trimmed, line_no, col));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{tokenize, TokenKind};
    use crate::message::Severity;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, diagnostics) = tokenize(source);
        assert!(diagnostics.is_empty(), "unexpected: {diagnostics:?}");
        tokens.into_iter().map(|token| token.kind).collect()
    }

    #[test]
    fn simple_data_step() {
        use TokenKind::*;
        assert_eq!(
            kinds("data a; a = 10; output; run;"),
            vec![
                Data, Identifier, Semicolon, Identifier, Equals, Number, Semicolon, Output,
                Semicolon, Run, Semicolon, Eof
            ]
        );
    }

    #[test]
    fn keywords_any_case() {
        use TokenKind::*;
        assert_eq!(
            kinds("DATA a; SET b; RUN;"),
            vec![Data, Identifier, Semicolon, Set, Identifier, Semicolon, Run, Semicolon, Eof]
        );
    }

    #[test]
    fn numbers() {
        let (tokens, _) = tokenize("x = 3.14 10 2e3 1.5e-2;");
        let numbers: Vec<f64> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Number)
            .map(|t| t.number().unwrap())
            .collect();
        assert_eq!(numbers, vec![3.14, 10.0, 2000.0, 0.015]);
    }

    #[test]
    fn string_quote_doubling() {
        let (tokens, diagnostics) = tokenize("a = 'it''s'; b = \"say \"\"hi\"\"\";");
        assert!(diagnostics.is_empty());
        let strings: Vec<&str> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::StringLiteral)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(strings, vec!["it's", "say \"hi\""]);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let (_, diagnostics) = tokenize("a = 'oops");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Error);
    }

    #[test]
    fn block_comment_skipped() {
        use TokenKind::*;
        assert_eq!(
            kinds("x = /* not = this */ 1;"),
            vec![Identifier, Equals, Number, Semicolon, Eof]
        );
    }

    #[test]
    fn unterminated_block_comment_warns() {
        let (tokens, diagnostics) = tokenize("x = 1; /* trailing");
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn star_comment_only_at_statement_start() {
        use TokenKind::*;
        // The first `*` begins a comment; the second is multiplication.
        assert_eq!(
            kinds("* a comment, gone; x = 2 * 3;"),
            vec![Identifier, Equals, Number, Star, Number, Semicolon, Eof]
        );
    }

    #[test]
    fn macro_style_comment() {
        use TokenKind::*;
        assert_eq!(kinds("%* gone; run;"), vec![Run, Semicolon, Eof]);
    }

    #[test]
    fn two_char_operators_greedy() {
        use TokenKind::*;
        assert_eq!(
            kinds("a <= b >= c == d != e ** f;"),
            vec![
                Identifier, Le, Identifier, Ge, Identifier, EqEq, Identifier, Ne, Identifier,
                Power, Identifier, Semicolon, Eof
            ]
        );
    }

    #[test]
    fn datalines_raw_mode() {
        let (tokens, diagnostics) = tokenize(
            "data employees; input name $ age; datalines;\njohn 23\nmary 30\n;\nrun;",
        );
        assert!(diagnostics.is_empty());
        let lines: Vec<&str> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::DatalinesLine)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(lines, vec!["john 23", "mary 30"]);
        // The `run` after the terminating `;` is lexed normally again.
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Run));
    }

    #[test]
    fn positions_are_one_based() {
        let (tokens, _) = tokenize("data a;\n  x = 1;");
        assert_eq!((tokens[0].line, tokens[0].col), (1, 1));
        let x = tokens.iter().find(|t| t.text == "x").unwrap();
        assert_eq!((x.line, x.col), (2, 3));
    }
}
