//! Minimal line-oriented front end. It feeds the passes with
//! [`ParsedStatement`]s and can be swapped for a grammar-based parser through
//! the [`FrontEnd`] trait.

use crate::diag::{ErrorKind, ErrorRecord};
use crate::literal;
use crate::statement::{op_first, strip_comment, tokens, ParsedStatement};

pub trait FrontEnd {
    fn parse(&self, source: &str) -> Vec<ParsedStatement>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LineReader;

impl LineReader {
    pub fn new() -> Self {
        LineReader
    }
}

impl FrontEnd for LineReader {
    fn parse(&self, source: &str) -> Vec<ParsedStatement> {
        source
            .lines()
            .enumerate()
            .map(|(i, text)| read_line(i + 1, text))
            .collect()
    }
}

fn column(text: &str, byte_offset: usize) -> usize {
    text.get(..byte_offset).map_or(0, |s| s.chars().count()) + 1
}

fn allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || c.is_whitespace() || "#@=+,*'_-".contains(c)
}

/// First lexical problem in the code part of a line.
fn lexical_error(code: &str) -> Option<(usize, String)> {
    let mut open: Option<usize> = None;
    for (i, c) in code.char_indices() {
        if c == '\'' {
            open = if open.is_some() { None } else { Some(i) };
        } else if open.is_none() && !allowed(c) {
            return Some((i, format!("unexpected character '{c}'")));
        }
    }
    open.map(|i| (i, "unterminated quoted constant".to_string()))
}

/// Parse one physical line. `line` is 1-based.
pub fn read_line(line: usize, text: &str) -> ParsedStatement {
    let mut stmt = ParsedStatement::new(line).source(text);
    let (code, comment) = strip_comment(text);
    if let Some(c) = comment.map(str::trim).filter(|c| !c.is_empty()) {
        stmt = stmt.comment(c);
    }

    if let Some((off, msg)) = lexical_error(code) {
        return stmt.error(ErrorRecord::new(line, column(text, off), msg, ErrorKind::Lexical));
    }

    let toks = tokens(code);
    if toks.is_empty() {
        return stmt;
    }

    let mut rest = toks.as_slice();
    if !code.starts_with(char::is_whitespace) {
        let words: Vec<&str> = toks.iter().map(|&(_, t)| t).collect();
        if !op_first(&words) {
            stmt = stmt.label(words[0]);
            rest = &toks[1..];
        }
    }

    let Some(((op_off, op), operand_toks)) = rest.split_first() else {
        return stmt;
    };
    stmt = stmt.op(op);
    if *op == "+" {
        stmt = stmt.error(ErrorRecord::new(
            line,
            column(text, *op_off),
            "missing mnemonic after '+'",
            ErrorKind::Syntactic,
        ));
    }

    if let Some((operand_off, _)) = operand_toks.first() {
        let operand: String = operand_toks.iter().map(|(_, t)| *t).collect();
        if operand.contains(',')
            && !literal::is_quoted_constant(&operand)
            && operand.split(',').any(|part| part.is_empty())
        {
            stmt = stmt.error(ErrorRecord::new(
                line,
                column(text, *operand_off),
                format!("empty operand in '{operand}'"),
                ErrorKind::Syntactic,
            ));
        }
        stmt = stmt.operand(&operand);
    }
    stmt
}
