use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::catalog::Format;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorKind {
    Lexical,
    Syntactic,
    Semantic,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Lexical => "lexical",
            ErrorKind::Syntactic => "syntactic",
            ErrorKind::Semantic => "semantic",
        })
    }
}

/// One diagnostic. `column` is 1-based, 0 when unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub line: usize,
    pub column: usize,
    pub message: String,
    pub kind: ErrorKind,
}

impl ErrorRecord {
    pub fn new(line: usize, column: usize, message: impl Into<String>, kind: ErrorKind) -> Self {
        Self { line, column, message: message.into(), kind }
    }

    pub fn semantic(line: usize, err: &SemanticError) -> Self {
        Self::new(line, 0, err.to_string(), ErrorKind::Semantic)
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.column > 0 {
            write!(f, "line {}:{}: {} error: {}", self.line, self.column, self.kind, self.message)
        } else {
            write!(f, "line {}: {} error: {}", self.line, self.kind, self.message)
        }
    }
}

/// Every semantic condition either pass can detect.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SemanticError {
    #[error("duplicate label '{0}'")]
    DuplicateLabel(String),
    #[error("undefined symbol '{0}'")]
    UndefinedSymbol(String),
    #[error("unknown instruction '{0}'")]
    UnknownInstruction(String),
    #[error("format 1 instruction '{0}' takes no operand")]
    Format1Operand(String),
    #[error("'+' prefix is not allowed on format {format} instruction '{mnemonic}'")]
    IllegalExtended { mnemonic: String, format: Format },
    #[error("'+' prefix is not allowed on directive '{0}'")]
    ExtendedDirective(String),
    #[error("invalid register '{0}' (valid: A, X, L, B, S, T, F, PC, SW)")]
    InvalidRegister(String),
    #[error("invalid SVC number '{0}' (0..15)")]
    InvalidSvc(String),
    #[error("invalid shift count '{0}' (1..16)")]
    InvalidShift(String),
    #[error("missing operand for '{0}'")]
    MissingOperand(String),
    #[error("immediate value {0} out of range for format 3 (0..4095); use format 4")]
    ImmediateOutOfRange(i64),
    #[error("displacement out of range for both PC-relative ({pc}) and BASE-relative ({base}); use format 4")]
    DisplacementOutOfRange { pc: i64, base: i64 },
    #[error("displacement {0} out of range for PC-relative and BASE not defined")]
    BaseNotDefined(i64),
    #[error("symbol not defined: '{0}'")]
    SymbolNotDefined(String),
    #[error("invalid BYTE operand '{0}'")]
    InvalidByte(String),
    #[error("invalid WORD operand '{0}'")]
    InvalidWord(String),
    #[error("statement after END")]
    AfterEnd,
    #[error("START must be the first statement")]
    MisplacedStart,
    #[error("missing END directive")]
    MissingEnd,
    #[error("unsupported directive '{0}'")]
    UnsupportedDirective(String),
}

/// Combine diagnostic lists, dropping repeats of the same (line, message) and
/// ordering by (line, column). The first occurrence wins.
pub fn merge<'a, I>(sources: I) -> Vec<ErrorRecord>
where
    I: IntoIterator<Item = &'a [ErrorRecord]>,
{
    let mut seen: HashSet<(usize, String)> = HashSet::new();
    let mut out: Vec<ErrorRecord> = Vec::new();
    for list in sources {
        for e in list {
            if seen.insert((e.line, e.message.clone())) {
                out.push(e.clone());
            }
        }
    }
    // stable: equal keys keep source order
    out.sort_by_key(|e| (e.line, e.column));
    out
}

/// Join per-line error texts the way listings show them.
pub fn join_errors(a: &str, b: &str) -> String {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => String::new(),
        (true, false) => b.to_string(),
        (false, true) => a.to_string(),
        (false, false) => format!("{a}; {b}"),
    }
}
