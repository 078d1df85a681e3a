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

//! Recursive-descent parsing.
//!
//! The parser works with one token of lookahead.  A syntax error inside a
//! DATA or PROC step abandons that step: the parser records a diagnostic,
//! consumes tokens up to the next `;` and then up to the next `run;`, and
//! resumes with the following top-level statement.

use thiserror::Error as ThisError;

use crate::{
    ast::{
        AssignTarget, BinaryOp, DataStep, DoLoop, DoSpec, Expr, Literal, MeansStat, ProcFreq,
        ProcMeans, ProcPrint, ProcSort, ProcStep, Program, Statement, UnaryOp,
    },
    lex::{Token, TokenKind},
    message::{Diagnostic, Point, Severity},
};

/// A syntax error, with the position of the offending token.
#[derive(Clone, Debug, PartialEq, ThisError)]
#[error("{text}")]
pub struct ParseError {
    pub text: String,
    pub location: Point,
}

impl ParseError {
    fn new(text: impl Into<String>, location: Point) -> Self {
        Self {
            text: text.into(),
            location,
        }
    }
}

impl From<ParseError> for Diagnostic {
    fn from(error: ParseError) -> Self {
        Diagnostic::at(Severity::Error, error.location, error.text)
    }
}

type ParseResult<T> = Result<T, ParseError>;

/// Parses a token sequence into a [Program].
///
/// Syntax errors never abort the parse; they are returned as diagnostics and
/// the statements that did parse are returned in the program.
pub fn parse(mut tokens: Vec<Token>) -> (Program, Vec<Diagnostic>) {
    if tokens.is_empty() {
        tokens.push(Token::new(TokenKind::Eof, "", 1, 1));
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        diagnostics: Vec::new(),
    };
    let program = parser.parse_program();
    (program, parser.diagnostics)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn at_eof(&self) -> bool {
        self.kind() == TokenKind::Eof
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.kind() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.kind() == kind {
            Ok(self.advance())
        } else {
            let found = self.peek();
            Err(ParseError::new(
                format!("Expected {}, found {}.", kind.describe(), found.kind.describe()),
                found.point(),
            ))
        }
    }

    fn expect_identifier(&mut self, what: &str) -> ParseResult<Token> {
        if self.kind() == TokenKind::Identifier {
            Ok(self.advance())
        } else {
            let found = self.peek();
            Err(ParseError::new(
                format!("Expected {what}, found {}.", found.kind.describe()),
                found.point(),
            ))
        }
    }

    /// Error recovery inside a step: skip past the next `;`, then past the
    /// next `run;`.
    fn synchronize_step(&mut self) {
        while !self.at_eof() && self.kind() != TokenKind::Semicolon {
            self.advance();
        }
        self.eat(TokenKind::Semicolon);
        while !self.at_eof() && self.kind() != TokenKind::Run {
            self.advance();
        }
        if self.eat(TokenKind::Run) {
            self.eat(TokenKind::Semicolon);
        }
    }

    /// Error recovery at the top level: skip past the next `;`.
    fn synchronize_statement(&mut self) {
        while !self.at_eof() && self.kind() != TokenKind::Semicolon {
            self.advance();
        }
        self.eat(TokenKind::Semicolon);
    }

    fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();
        while !self.at_eof() {
            match self.kind() {
                // Stray separators and `run;` without a step are harmless.
                TokenKind::Semicolon => {
                    self.advance();
                }
                TokenKind::Run => {
                    self.advance();
                    self.eat(TokenKind::Semicolon);
                }
                TokenKind::Data => match self.parse_data_step() {
                    Ok(step) => statements.push(Statement::DataStep(step)),
                    Err(error) => {
                        self.diagnostics.push(error.into());
                        self.synchronize_step();
                    }
                },
                TokenKind::Proc => match self.parse_proc() {
                    Ok(step) => statements.push(Statement::Proc(step)),
                    Err(error) => {
                        self.diagnostics.push(error.into());
                        self.synchronize_step();
                    }
                },
                TokenKind::Libname => match self.parse_libname() {
                    Ok(statement) => statements.push(statement),
                    Err(error) => {
                        self.diagnostics.push(error.into());
                        self.synchronize_statement();
                    }
                },
                TokenKind::Options => match self.parse_options() {
                    Ok(statement) => statements.push(statement),
                    Err(error) => {
                        self.diagnostics.push(error.into());
                        self.synchronize_statement();
                    }
                },
                TokenKind::Title => match self.parse_title() {
                    Ok(statement) => statements.push(statement),
                    Err(error) => {
                        self.diagnostics.push(error.into());
                        self.synchronize_statement();
                    }
                },
                _ => {
                    let point = self.peek().point();
                    let text = format!(
                        "{} is not valid at the start of a statement.",
                        self.peek().kind.describe()
                    );
                    self.diagnostics.push(Diagnostic::at(Severity::Error, point, text));
                    self.synchronize_statement();
                }
            }
        }
        Program { statements }
    }

    /// `LIBREF.NAME` or a bare `NAME` (which the catalog resolves to WORK).
    fn parse_dataset_name(&mut self) -> ParseResult<String> {
        let first = self.expect_identifier("a dataset name")?;
        if self.eat(TokenKind::Dot) {
            let second = self.expect_identifier("a dataset name after `.`")?;
            Ok(format!("{}.{}", first.text, second.text))
        } else {
            Ok(first.text)
        }
    }

    fn parse_data_step(&mut self) -> ParseResult<DataStep> {
        let location = self.expect(TokenKind::Data)?.point();
        let output = self.parse_dataset_name()?;
        self.expect(TokenKind::Semicolon)?;

        let mut input = None;
        let mut body = Vec::new();
        loop {
            match self.kind() {
                TokenKind::Run => {
                    self.advance();
                    self.expect(TokenKind::Semicolon)?;
                    break;
                }
                TokenKind::Eof => {
                    return Err(ParseError::new(
                        "DATA step is not terminated by RUN;.",
                        self.peek().point(),
                    ));
                }
                TokenKind::Set => {
                    self.advance();
                    input = Some(self.parse_dataset_name()?);
                    self.expect(TokenKind::Semicolon)?;
                }
                _ => body.push(self.parse_step_statement()?),
            }
        }

        Ok(DataStep {
            output,
            input,
            body,
            location,
        })
    }

    /// One statement inside a DATA step body.
    fn parse_step_statement(&mut self) -> ParseResult<Statement> {
        match self.kind() {
            TokenKind::If => self.parse_if(),
            TokenKind::Do => Ok(Statement::DoLoop(self.parse_do()?)),
            TokenKind::Output => {
                self.advance();
                self.expect(TokenKind::Semicolon)?;
                Ok(Statement::Output)
            }
            TokenKind::Drop => {
                self.advance();
                Ok(Statement::Drop(self.parse_name_list()?))
            }
            TokenKind::Keep => {
                self.advance();
                Ok(Statement::Keep(self.parse_name_list()?))
            }
            TokenKind::Retain => self.parse_retain(),
            TokenKind::Array => self.parse_array(),
            TokenKind::Merge => {
                self.advance();
                let mut datasets = Vec::new();
                while self.kind() == TokenKind::Identifier {
                    datasets.push(self.parse_dataset_name()?);
                }
                self.expect(TokenKind::Semicolon)?;
                if datasets.is_empty() {
                    return Err(ParseError::new(
                        "MERGE requires at least one dataset name.",
                        self.peek().point(),
                    ));
                }
                Ok(Statement::Merge(datasets))
            }
            TokenKind::By => {
                self.advance();
                Ok(Statement::By(self.parse_name_list()?))
            }
            TokenKind::Input => self.parse_input(),
            TokenKind::Datalines => self.parse_datalines(),
            TokenKind::Identifier => self.parse_assignment(),
            TokenKind::End => {
                let found = self.peek();
                Err(ParseError::new(
                    "END without a matching DO.",
                    found.point(),
                ))
            }
            _ => {
                let found = self.peek();
                Err(ParseError::new(
                    format!("{} cannot start a statement here.", found.kind.describe()),
                    found.point(),
                ))
            }
        }
    }

    /// `v1 v2 … ;`
    fn parse_name_list(&mut self) -> ParseResult<Vec<String>> {
        let mut names = Vec::new();
        while self.kind() == TokenKind::Identifier {
            names.push(self.advance().text);
        }
        self.expect(TokenKind::Semicolon)?;
        if names.is_empty() {
            return Err(ParseError::new(
                "Expected at least one variable name.",
                self.peek().point(),
            ));
        }
        Ok(names)
    }

    /// `retain v1 [init1] v2 [init2] … ;`
    fn parse_retain(&mut self) -> ParseResult<Statement> {
        self.expect(TokenKind::Retain)?;
        let mut vars = Vec::new();
        while self.kind() == TokenKind::Identifier {
            let name = self.advance().text;
            let initial = self.parse_optional_literal();
            vars.push((name, initial));
        }
        self.expect(TokenKind::Semicolon)?;
        if vars.is_empty() {
            return Err(ParseError::new(
                "RETAIN requires at least one variable name.",
                self.peek().point(),
            ));
        }
        Ok(Statement::Retain(vars))
    }

    fn parse_optional_literal(&mut self) -> Option<Literal> {
        match self.kind() {
            TokenKind::Number => {
                let token = self.advance();
                Some(Literal::Number(token.number().unwrap_or(0.0)))
            }
            TokenKind::Minus if self.tokens[self.pos + 1].kind == TokenKind::Number => {
                self.advance();
                let token = self.advance();
                Some(Literal::Number(-token.number().unwrap_or(0.0)))
            }
            TokenKind::StringLiteral => Some(Literal::String(self.advance().text)),
            _ => None,
        }
    }

    /// `array NAME[n] v1 v2 … ;` — `{}` and `()` are accepted as index
    /// brackets too.
    fn parse_array(&mut self) -> ParseResult<Statement> {
        self.expect(TokenKind::Array)?;
        let name = self.expect_identifier("an array name")?.text;

        let close = match self.kind() {
            TokenKind::LBracket => TokenKind::RBracket,
            TokenKind::LBrace => TokenKind::RBrace,
            TokenKind::LParen => TokenKind::RParen,
            _ => {
                let found = self.peek();
                return Err(ParseError::new(
                    format!("Expected `[` after array name, found {}.", found.kind.describe()),
                    found.point(),
                ));
            }
        };
        self.advance();
        let size_token = self.expect(TokenKind::Number)?;
        let size = size_token.number().unwrap_or(0.0);
        if size < 1.0 || size.fract() != 0.0 {
            return Err(ParseError::new(
                format!("Array size must be a positive integer, not {}.", size_token.text),
                size_token.point(),
            ));
        }
        self.expect(close)?;

        let vars = self.parse_name_list()?;
        Ok(Statement::Array {
            name,
            size: size as usize,
            vars,
        })
    }

    /// `input v1 [$] v2 [$] … ;`
    fn parse_input(&mut self) -> ParseResult<Statement> {
        self.expect(TokenKind::Input)?;
        let mut vars = Vec::new();
        while self.kind() == TokenKind::Identifier {
            let name = self.advance().text;
            let is_character = self.eat(TokenKind::Dollar);
            vars.push((name, is_character));
        }
        self.expect(TokenKind::Semicolon)?;
        if vars.is_empty() {
            return Err(ParseError::new(
                "INPUT requires at least one variable name.",
                self.peek().point(),
            ));
        }
        Ok(Statement::Input(vars))
    }

    /// `datalines;` followed by raw lines and the terminating `;` line, both
    /// already prepared by the lexer.
    fn parse_datalines(&mut self) -> ParseResult<Statement> {
        self.expect(TokenKind::Datalines)?;
        self.expect(TokenKind::Semicolon)?;
        let mut lines = Vec::new();
        while self.kind() == TokenKind::DatalinesLine {
            lines.push(self.advance().text);
        }
        self.expect(TokenKind::Semicolon)?;
        Ok(Statement::Datalines(lines))
    }

    /// `name = expr;` or `name[index] = expr;`
    fn parse_assignment(&mut self) -> ParseResult<Statement> {
        let name = self.expect_identifier("a variable name")?.text;

        let target = match self.kind() {
            TokenKind::LBracket | TokenKind::LBrace => {
                let close = if self.kind() == TokenKind::LBracket {
                    TokenKind::RBracket
                } else {
                    TokenKind::RBrace
                };
                self.advance();
                let index = self.parse_expr()?;
                self.expect(close)?;
                AssignTarget::ArrayElement { array: name, index }
            }
            _ => AssignTarget::Variable(name),
        };

        self.expect(TokenKind::Equals)?;
        let expr = self.parse_expr()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(Statement::Assignment { target, expr })
    }

    /// `if cond then …; [else if cond then …;]* [else …;]`
    fn parse_if(&mut self) -> ParseResult<Statement> {
        self.expect(TokenKind::If)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::Then)?;
        let then_body = self.parse_branch_body()?;

        let mut else_ifs = Vec::new();
        let mut else_body = None;
        while self.eat(TokenKind::Else) {
            if self.eat(TokenKind::If) {
                let cond = self.parse_expr()?;
                self.expect(TokenKind::Then)?;
                let body = self.parse_branch_body()?;
                else_ifs.push((cond, body));
            } else {
                else_body = Some(self.parse_branch_body()?);
                break;
            }
        }

        Ok(Statement::IfThenElse {
            cond,
            then_body,
            else_ifs,
            else_body,
        })
    }

    /// The consequent of a THEN or ELSE: a `do; … end;` block's contents, or
    /// a single statement.
    fn parse_branch_body(&mut self) -> ParseResult<Vec<Statement>> {
        if self.kind() == TokenKind::Do {
            let do_loop = self.parse_do()?;
            match do_loop.spec {
                DoSpec::Block => Ok(do_loop.body),
                _ => Ok(vec![Statement::DoLoop(do_loop)]),
            }
        } else {
            Ok(vec![self.parse_step_statement()?])
        }
    }

    /// `do …; body end;` in its block, iterative, while, and until forms.
    fn parse_do(&mut self) -> ParseResult<DoLoop> {
        self.expect(TokenKind::Do)?;

        let spec = match self.kind() {
            TokenKind::Semicolon => {
                self.advance();
                DoSpec::Block
            }
            TokenKind::While => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                let cond = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                self.expect(TokenKind::Semicolon)?;
                DoSpec::While(cond)
            }
            TokenKind::Until => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                let cond = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                self.expect(TokenKind::Semicolon)?;
                DoSpec::Until(cond)
            }
            _ => {
                let var = self.expect_identifier("a loop variable")?.text;
                self.expect(TokenKind::Equals)?;
                let start = self.parse_expr()?;
                self.expect(TokenKind::To)?;
                let end = self.parse_expr()?;
                let by = if self.eat(TokenKind::By) {
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                self.expect(TokenKind::Semicolon)?;
                DoSpec::Iterative {
                    var,
                    start,
                    end,
                    by,
                }
            }
        };

        let mut body = Vec::new();
        loop {
            match self.kind() {
                TokenKind::End => {
                    self.advance();
                    self.expect(TokenKind::Semicolon)?;
                    break;
                }
                TokenKind::Eof | TokenKind::Run => {
                    return Err(ParseError::new(
                        "DO is not terminated by END;.",
                        self.peek().point(),
                    ));
                }
                _ => body.push(self.parse_step_statement()?),
            }
        }

        Ok(DoLoop { spec, body })
    }

    fn parse_libname(&mut self) -> ParseResult<Statement> {
        self.expect(TokenKind::Libname)?;
        let libref = self.expect_identifier("a libref")?.text;
        let path = self.expect(TokenKind::StringLiteral)?.text;
        self.expect(TokenKind::Semicolon)?;
        Ok(Statement::Libname { libref, path })
    }

    /// `options key=value … ;` — a bare key is recorded with an empty value.
    fn parse_options(&mut self) -> ParseResult<Statement> {
        self.expect(TokenKind::Options)?;
        let mut pairs = Vec::new();
        while self.kind() == TokenKind::Identifier {
            let key = self.advance().text;
            let value = if self.eat(TokenKind::Equals) {
                self.advance().text
            } else {
                String::new()
            };
            pairs.push((key, value));
        }
        self.expect(TokenKind::Semicolon)?;
        Ok(Statement::Options(pairs))
    }

    fn parse_title(&mut self) -> ParseResult<Statement> {
        self.expect(TokenKind::Title)?;
        let text = self.expect(TokenKind::StringLiteral)?.text;
        self.expect(TokenKind::Semicolon)?;
        Ok(Statement::Title(text))
    }

    /// `proc NAME …; … run;` — dispatch on the procedure name.
    fn parse_proc(&mut self) -> ParseResult<ProcStep> {
        self.expect(TokenKind::Proc)?;
        match self.kind() {
            TokenKind::Sort => self.parse_proc_sort(),
            TokenKind::Print => self.parse_proc_print(),
            TokenKind::Means => self.parse_proc_means(),
            TokenKind::Freq => self.parse_proc_freq(),
            _ => {
                let found = self.peek();
                Err(ParseError::new(
                    format!("Procedure {} is not supported.", found.text.to_uppercase()),
                    found.point(),
                ))
            }
        }
    }

    /// `data=NAME` — the DATA keyword doubles as an option name here.
    fn parse_data_option(&mut self) -> ParseResult<String> {
        self.expect(TokenKind::Data)?;
        self.expect(TokenKind::Equals)?;
        self.parse_dataset_name()
    }

    fn expect_run(&mut self) -> ParseResult<()> {
        self.expect(TokenKind::Run)?;
        self.expect(TokenKind::Semicolon)?;
        Ok(())
    }

    fn parse_proc_sort(&mut self) -> ParseResult<ProcStep> {
        self.expect(TokenKind::Sort)?;
        let mut input = None;
        let mut output = None;
        let mut nodupkey = false;
        let mut duplicates = false;
        loop {
            match self.kind() {
                TokenKind::Data => input = Some(self.parse_data_option()?),
                TokenKind::Out => {
                    self.advance();
                    self.expect(TokenKind::Equals)?;
                    output = Some(self.parse_dataset_name()?);
                }
                TokenKind::Nodupkey => {
                    self.advance();
                    nodupkey = true;
                }
                TokenKind::Duplicates => {
                    self.advance();
                    duplicates = true;
                }
                _ => break,
            }
        }
        self.expect(TokenKind::Semicolon)?;

        let Some(input) = input else {
            return Err(ParseError::new(
                "PROC SORT requires DATA=.",
                self.peek().point(),
            ));
        };

        let mut by = Vec::new();
        let mut where_clause = None;
        loop {
            match self.kind() {
                TokenKind::By => {
                    self.advance();
                    by = self.parse_name_list()?;
                }
                TokenKind::Where => {
                    self.advance();
                    where_clause = Some(self.parse_expr()?);
                    self.expect(TokenKind::Semicolon)?;
                }
                _ => break,
            }
        }
        self.expect_run()?;

        if by.is_empty() {
            return Err(ParseError::new(
                "PROC SORT requires a BY statement.",
                self.peek().point(),
            ));
        }

        Ok(ProcStep::Sort(ProcSort {
            input,
            output,
            by,
            nodupkey,
            duplicates,
            where_clause,
        }))
    }

    fn parse_proc_print(&mut self) -> ParseResult<ProcStep> {
        self.expect(TokenKind::Print)?;
        let mut data = None;
        let mut obs = None;
        let mut noobs = false;
        loop {
            match self.kind() {
                TokenKind::Data => {
                    let name = self.parse_data_option()?;
                    // Dataset option `(obs=N)` limits the observations shown.
                    if self.eat(TokenKind::LParen) {
                        self.expect(TokenKind::Obs)?;
                        self.expect(TokenKind::Equals)?;
                        let n = self.expect(TokenKind::Number)?;
                        obs = Some(n.number().unwrap_or(0.0) as usize);
                        self.expect(TokenKind::RParen)?;
                    }
                    data = Some(name);
                }
                TokenKind::Obs => {
                    self.advance();
                    self.expect(TokenKind::Equals)?;
                    let n = self.expect(TokenKind::Number)?;
                    obs = Some(n.number().unwrap_or(0.0) as usize);
                }
                TokenKind::Noobs => {
                    self.advance();
                    noobs = true;
                }
                TokenKind::Label => {
                    // Accepted for compatibility; labels are shown as-is.
                    self.advance();
                }
                _ => break,
            }
        }
        self.expect(TokenKind::Semicolon)?;

        let Some(data) = data else {
            return Err(ParseError::new(
                "PROC PRINT requires DATA=.",
                self.peek().point(),
            ));
        };

        let mut vars = None;
        while self.kind() == TokenKind::Var {
            self.advance();
            vars = Some(self.parse_name_list()?);
        }
        self.expect_run()?;

        Ok(ProcStep::Print(ProcPrint {
            data,
            obs,
            vars,
            noobs,
        }))
    }

    fn parse_proc_means(&mut self) -> ParseResult<ProcStep> {
        self.expect(TokenKind::Means)?;
        let mut data = None;
        let mut stats = Vec::new();
        loop {
            match self.kind() {
                TokenKind::Data => data = Some(self.parse_data_option()?),
                TokenKind::Identifier => {
                    let token = self.advance();
                    let stat = match token.text.to_ascii_lowercase().as_str() {
                        "n" => MeansStat::N,
                        "mean" => MeansStat::Mean,
                        "min" => MeansStat::Min,
                        "max" => MeansStat::Max,
                        "std" => MeansStat::Std,
                        _ => {
                            return Err(ParseError::new(
                                format!("{} is not a recognized statistic.", token.text),
                                token.point(),
                            ));
                        }
                    };
                    if !stats.contains(&stat) {
                        stats.push(stat);
                    }
                }
                _ => break,
            }
        }
        self.expect(TokenKind::Semicolon)?;

        let Some(data) = data else {
            return Err(ParseError::new(
                "PROC MEANS requires DATA=.",
                self.peek().point(),
            ));
        };

        let mut vars = Vec::new();
        while self.kind() == TokenKind::Var {
            self.advance();
            vars = self.parse_name_list()?;
        }
        self.expect_run()?;

        if stats.is_empty() {
            stats = MeansStat::default_set();
        }
        Ok(ProcStep::Means(ProcMeans { data, vars, stats }))
    }

    fn parse_proc_freq(&mut self) -> ParseResult<ProcStep> {
        self.expect(TokenKind::Freq)?;
        let mut data = None;
        while self.kind() == TokenKind::Data {
            data = Some(self.parse_data_option()?);
        }
        self.expect(TokenKind::Semicolon)?;

        let Some(data) = data else {
            return Err(ParseError::new(
                "PROC FREQ requires DATA=.",
                self.peek().point(),
            ));
        };

        let mut tables = Vec::new();
        while self.kind() == TokenKind::Tables {
            self.advance();
            tables = self.parse_name_list()?;
        }
        self.expect_run()?;

        if tables.is_empty() {
            return Err(ParseError::new(
                "PROC FREQ requires a TABLES statement.",
                self.peek().point(),
            ));
        }
        Ok(ProcStep::Freq(ProcFreq { data, tables }))
    }

    // Expressions, lowest precedence first.

    fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_and()?;
        while matches!(self.kind(), TokenKind::Or | TokenKind::Pipe) {
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Binary {
                op: BinaryOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_equality()?;
        while matches!(self.kind(), TokenKind::And | TokenKind::Amp) {
            self.advance();
            let right = self.parse_equality()?;
            left = Expr::Binary {
                op: BinaryOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    /// `==` and `!=`; a bare `=` in expression position is equality too.
    fn parse_equality(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.kind() {
                TokenKind::EqEq | TokenKind::Equals => BinaryOp::Eq,
                TokenKind::Ne => BinaryOp::Ne,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.kind() {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Le => BinaryOp::Le,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::Ge => BinaryOp::Ge,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        match self.kind() {
            TokenKind::Minus => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                })
            }
            TokenKind::Not => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                })
            }
            _ => self.parse_power(),
        }
    }

    /// `**` is right-associative and binds tighter than unary minus.
    fn parse_power(&mut self) -> ParseResult<Expr> {
        let base = self.parse_primary()?;
        if self.kind() == TokenKind::Power {
            self.advance();
            let exponent = self.parse_unary()?;
            Ok(Expr::Binary {
                op: BinaryOp::Pow,
                left: Box::new(base),
                right: Box::new(exponent),
            })
        } else {
            Ok(base)
        }
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        match self.kind() {
            TokenKind::Number => {
                let token = self.advance();
                Ok(Expr::Number(token.number().unwrap_or(0.0)))
            }
            TokenKind::StringLiteral => Ok(Expr::String(self.advance().text)),
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::Identifier => {
                let name = self.advance().text;
                match self.kind() {
                    TokenKind::LParen => {
                        self.advance();
                        let mut args = Vec::new();
                        if self.kind() != TokenKind::RParen {
                            loop {
                                args.push(self.parse_expr()?);
                                if !self.eat(TokenKind::Comma) {
                                    break;
                                }
                            }
                        }
                        self.expect(TokenKind::RParen)?;
                        Ok(Expr::FunctionCall { name, args })
                    }
                    TokenKind::LBracket | TokenKind::LBrace => {
                        let close = if self.kind() == TokenKind::LBracket {
                            TokenKind::RBracket
                        } else {
                            TokenKind::RBrace
                        };
                        self.advance();
                        let index = self.parse_expr()?;
                        self.expect(close)?;
                        Ok(Expr::ArrayElement {
                            array: name,
                            index: Box::new(index),
                        })
                    }
                    _ => Ok(Expr::Variable(name)),
                }
            }
            _ => {
                let found = self.peek();
                Err(ParseError::new(
                    format!("Expected an expression, found {}.", found.kind.describe()),
                    found.point(),
                ))
            }
        }
    }
}
