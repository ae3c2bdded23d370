//! Pass 1: location counter, symbol table, format/addressing-mode
//! classification and per-line gating.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::{self, AddrMode, Directive, Format, InstrDesc, Lookup};
use crate::diag::{join_errors, ErrorRecord, SemanticError};
use crate::literal::{self, ByteConst};
use crate::statement::{fallback_split, ParsedStatement};
use crate::symtab::SymbolTable;

/// One listing row. `address` is `None` only for comment lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntermediateLine {
    pub listing: usize,
    pub line: usize,
    pub address: Option<u32>,
    pub label: String,
    pub operation: String,
    pub operand: String,
    pub comment: String,
    pub format: Format,
    pub mode: AddrMode,
    pub increment: u32,
    /// Resolved BASE address or EQU value, for display.
    pub value: Option<u32>,
    pub error: String,
}

impl IntermediateLine {
    pub fn has_error(&self) -> bool {
        !self.error.trim().is_empty()
    }

    pub fn is_comment(&self) -> bool {
        self.address.is_none()
    }

    /// Operation without the format-4 `+`.
    pub fn mnemonic(&self) -> &str {
        self.operation.trim().trim_start_matches('+')
    }

    pub fn append_error(&mut self, msg: &str) {
        self.error = join_errors(&self.error, msg);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramMetadata {
    pub name: String,
    pub start_address: u32,
    pub final_counter: u32,
    pub length: u32,
    pub base_value: Option<u32>,
    pub base_operand: Option<String>,
    /// True once END (or the end of input) finalized the fields above.
    pub finalized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    NotStarted,
    Running,
    Ended,
}

/// Mutable pass-1 state, threaded through [`Pass1::process`].
#[derive(Debug, Clone, Default)]
pub struct State {
    pub location_counter: u32,
    pub phase: Phase,
    pub base_value: Option<u32>,
    pub meta: ProgramMetadata,
}

/// Tagged classification of one statement.
#[derive(Debug, Clone, Copy)]
pub enum Class<'a> {
    Instr {
        desc: &'static InstrDesc,
        format: Format,
        mode: AddrMode,
        extended: bool,
    },
    Dir { dir: Directive, extended: bool },
    Unknown { mnemonic: &'a str },
    /// Label with no operation.
    Bare,
}

impl Class<'_> {
    pub fn format(&self) -> Format {
        match self {
            Class::Instr { format, .. } => *format,
            _ => Format::None,
        }
    }

    pub fn mode(&self) -> AddrMode {
        match self {
            Class::Instr { mode, .. } => *mode,
            _ => AddrMode::None,
        }
    }

    fn directive(&self) -> Option<Directive> {
        match self {
            Class::Dir { dir, .. } => Some(*dir),
            _ => None,
        }
    }
}

/// Addressing mode of a format-3/4 operand.
pub fn addressing_mode(operand: &str) -> AddrMode {
    let t = operand.trim();
    if t.is_empty() {
        AddrMode::None
    } else if t.starts_with('#') {
        AddrMode::Immediate
    } else if t.starts_with('@') {
        AddrMode::Indirect
    } else if has_index_suffix(t) {
        AddrMode::Indexed
    } else {
        AddrMode::Simple
    }
}

pub(crate) fn has_index_suffix(operand: &str) -> bool {
    operand
        .split_once(',')
        .is_some_and(|(_, ix)| ix.trim().eq_ignore_ascii_case("X"))
}

/// Classify `(operation, operand)` into format and addressing mode.
pub fn classify<'a>(operation: Option<&'a str>, operand: Option<&str>) -> Class<'a> {
    let Some(op) = operation.map(str::trim) else {
        return Class::Bare;
    };
    let (extended, bare) = match op.strip_prefix('+') {
        Some(rest) => (true, rest.trim()),
        None => (false, op),
    };
    match catalog::lookup(bare) {
        Lookup::Directive(dir) => Class::Dir { dir, extended },
        Lookup::Unknown => Class::Unknown { mnemonic: bare },
        Lookup::Instruction(desc) => {
            let format = match desc.format {
                Format::Three if extended => Format::Four,
                f => f,
            };
            let mode = match format {
                Format::Three | Format::Four if desc.mnemonic == "RSUB" => AddrMode::Simple,
                Format::Three | Format::Four => addressing_mode(operand.unwrap_or("")),
                _ => AddrMode::None,
            };
            Class::Instr { desc, format, mode, extended }
        }
    }
}

/// Errors that cancel a line's layout effects.
fn gating_error(class: &Class<'_>, operand: Option<&str>) -> Option<SemanticError> {
    match *class {
        Class::Instr { desc, extended: true, .. } if matches!(desc.format, Format::One | Format::Two) => {
            Some(SemanticError::IllegalExtended { mnemonic: desc.mnemonic.to_string(), format: desc.format })
        }
        Class::Instr { desc, .. } if desc.format == Format::One && operand.is_some() => {
            Some(SemanticError::Format1Operand(desc.mnemonic.to_string()))
        }
        Class::Dir { dir, extended: true } => Some(SemanticError::ExtendedDirective(dir.name().to_string())),
        _ => None,
    }
}

/// Size of a line in bytes. Unknown mnemonics count as 3 and carry an error.
fn increment(class: &Class<'_>, operand: Option<&str>) -> (u32, Option<SemanticError>) {
    let count = || literal::parse_value(operand.unwrap_or("")).clamp(0, u32::MAX as i64) as u32;
    match *class {
        Class::Instr { format, .. } => (format.width(), None),
        Class::Dir { dir, .. } => match dir {
            Directive::Byte => (operand.and_then(ByteConst::parse).map_or(1, |c| c.len()), None),
            Directive::Word => (3, None),
            Directive::Resb => (count(), None),
            Directive::Resw => (count().saturating_mul(3), None),
            Directive::Org | Directive::Csect => {
                (0, Some(SemanticError::UnsupportedDirective(dir.name().to_string())))
            }
            _ => (0, None),
        },
        Class::Unknown { mnemonic } => (3, Some(SemanticError::UnknownInstruction(mnemonic.to_string()))),
        Class::Bare => (0, None),
    }
}

fn is_symbol_token(tok: &str) -> bool {
    tok.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
        && !literal::is_quoted_constant(tok)
        && literal::parse_numeric(tok).is_none()
}

/// Names an operand refers to, after prefixes and the index suffix are gone.
fn referenced_names<'a>(class: &Class<'_>, operand: &'a str) -> Vec<&'a str> {
    let parts: Vec<&str> = match class {
        Class::Instr { desc, format: Format::Three | Format::Four, .. } if desc.mnemonic != "RSUB" => {
            operand.split(',').take(1).collect()
        }
        Class::Instr { format: Format::Two, .. } => operand.split(',').collect(),
        Class::Dir { dir: Directive::Byte | Directive::Start, .. } => Vec::new(),
        Class::Dir { .. } => operand.split(',').collect(),
        _ => Vec::new(),
    };
    parts
        .into_iter()
        .map(literal::strip_prefixes)
        .filter(|t| is_symbol_token(t))
        .collect()
}

/// Everything pass 1 hands to pass 2 and to presentation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pass1Output {
    pub symbols: SymbolTable,
    pub lines: Vec<IntermediateLine>,
    pub meta: ProgramMetadata,
    pub errors: Vec<ErrorRecord>,
}

#[derive(Debug, Default)]
pub struct Pass1 {
    state: State,
    symbols: SymbolTable,
    lines: Vec<IntermediateLine>,
    errors: Vec<ErrorRecord>,
    /// (name, source line) in order of appearance.
    referenced: Vec<(String, usize)>,
    last_line: usize,
}

impl Pass1 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run(stmts: &[ParsedStatement]) -> Pass1Output {
        let mut p = Pass1::new();
        for s in stmts {
            p.process(s);
        }
        p.finish()
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    fn record(&mut self, line: usize, err: &SemanticError) -> String {
        warn!(line, "{err}");
        self.errors.push(ErrorRecord::semantic(line, err));
        err.to_string()
    }

    fn new_line(&self, stmt: &ParsedStatement, class: &Class<'_>) -> IntermediateLine {
        IntermediateLine {
            listing: self.lines.len() + 1,
            line: stmt.line,
            address: Some(self.state.location_counter),
            label: stmt.label_text().unwrap_or_default().to_string(),
            operation: stmt.operation_text().unwrap_or_default().to_string(),
            operand: stmt.operand_text().unwrap_or_default().to_string(),
            comment: stmt.comment_text().unwrap_or_default().to_string(),
            format: class.format(),
            mode: class.mode(),
            ..IntermediateLine::default()
        }
    }

    fn begin_implicitly(&mut self) {
        if self.state.phase == Phase::NotStarted {
            debug!("no START; counter begins at 0");
            self.state.location_counter = 0;
            self.state.meta.start_address = 0;
            self.state.phase = Phase::Running;
        }
    }

    /// List a line without touching the symbol table or the counter.
    fn push_gated(&mut self, mut line: IntermediateLine, err: &SemanticError) {
        let msg = self.record(line.line, err);
        line.append_error(&msg);
        line.increment = 0;
        self.lines.push(line);
    }

    pub fn process(&mut self, stmt: &ParsedStatement) {
        self.last_line = self.last_line.max(stmt.line);
        if stmt.is_blank() {
            return;
        }
        if stmt.is_comment_only() {
            self.lines.push(IntermediateLine {
                listing: self.lines.len() + 1,
                line: stmt.line,
                comment: stmt.comment_text().unwrap_or_default().to_string(),
                ..IntermediateLine::default()
            });
            return;
        }
        if stmt.has_front_end_error() {
            self.front_end_line(stmt);
            return;
        }

        let label = stmt.label_text();
        let operand = stmt.operand_text();
        let class = classify(stmt.operation_text(), operand);

        if self.state.phase == Phase::Ended {
            let line = self.new_line(stmt, &class);
            self.push_gated(line, &SemanticError::AfterEnd);
            return;
        }

        let mut line = self.new_line(stmt, &class);

        if class.directive() == Some(Directive::Start) {
            if self.state.phase == Phase::NotStarted {
                self.start(label, operand, line);
                return;
            }
            let msg = self.record(stmt.line, &SemanticError::MisplacedStart);
            line.append_error(&msg);
        }

        self.begin_implicitly();
        line.address = Some(self.state.location_counter);

        if let Some(err) = gating_error(&class, operand) {
            self.push_gated(line, &err);
            return;
        }

        if class.directive() == Some(Directive::Base) {
            let resolved = operand.and_then(|o| self.symbols.get(o));
            self.state.base_value = resolved;
            self.state.meta.base_value = resolved;
            self.state.meta.base_operand = operand.map(str::to_string);
            line.value = resolved;
        }

        if let Some(name) = label {
            let value = match class.directive() {
                Some(Directive::Equ) => self.equ_value(operand),
                _ => self.state.location_counter,
            };
            if class.directive() == Some(Directive::Equ) {
                line.value = Some(value);
            }
            if self.symbols.try_insert(name, value).is_some() {
                let msg = self.record(stmt.line, &SemanticError::DuplicateLabel(name.to_string()));
                line.append_error(&msg);
            }
        }

        let (inc, err) = increment(&class, operand);
        if let Some(err) = err {
            let msg = self.record(stmt.line, &err);
            line.append_error(&msg);
        }
        line.increment = inc;

        if let Some(o) = operand {
            for name in referenced_names(&class, o) {
                let entry = (name.to_ascii_uppercase(), stmt.line);
                if !self.referenced.contains(&entry) {
                    self.referenced.push(entry);
                }
            }
        }

        debug!(line = stmt.line, address = self.state.location_counter, increment = inc, "assigned");
        self.lines.push(line);

        if class.directive() == Some(Directive::End) {
            self.end();
            return;
        }
        self.state.location_counter = self.state.location_counter.wrapping_add(inc);
    }

    fn start(&mut self, label: Option<&str>, operand: Option<&str>, mut line: IntermediateLine) {
        let addr = operand
            .and_then(literal::parse_address)
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(0);
        let meta = &mut self.state.meta;
        meta.name = label.unwrap_or("NONAME").to_string();
        meta.start_address = addr;
        self.state.location_counter = addr;
        self.state.phase = Phase::Running;
        debug!(name = %meta.name, start = addr, "START");
        line.address = Some(addr);
        self.lines.push(line);
    }

    fn equ_value(&self, operand: Option<&str>) -> u32 {
        let here = self.state.location_counter;
        match operand.map(str::trim) {
            Some("*") | None => here,
            Some(o) => match literal::parse_numeric(o) {
                Some(v) => u32::try_from(v).unwrap_or(here),
                None => self.symbols.get(o).unwrap_or(here),
            },
        }
    }

    /// Lines the front end rejected: fields come from the raw text, nothing
    /// is defined and neither the counter nor the phase moves.
    fn front_end_line(&mut self, stmt: &ParsedStatement) {
        let fields = if stmt.source.trim().is_empty() {
            None
        } else {
            Some(fallback_split(&stmt.source))
        };
        let (label, operation, operand) = match fields {
            Some(f) => (f.label, f.operation, f.operand),
            None => (
                stmt.label_text().map(str::to_string),
                stmt.operation_text().map(str::to_string),
                stmt.operand_text().map(str::to_string),
            ),
        };
        let (format, mode) = {
            let class = classify(operation.as_deref(), operand.as_deref());
            (class.format(), class.mode())
        };
        let mut line = IntermediateLine {
            listing: self.lines.len() + 1,
            line: stmt.line,
            address: Some(self.state.location_counter),
            label: label.unwrap_or_default(),
            operation: operation.unwrap_or_default(),
            operand: operand.unwrap_or_default(),
            comment: stmt.comment_text().unwrap_or_default().to_string(),
            format,
            mode,
            ..IntermediateLine::default()
        };
        for e in &stmt.errors {
            warn!(line = e.line, "{}", e.message);
            line.append_error(&e.message);
            self.errors.push(e.clone());
        }
        self.lines.push(line);
    }

    fn end(&mut self) {
        let s = &mut self.state;
        s.meta.final_counter = s.location_counter;
        s.meta.length = s.location_counter.saturating_sub(s.meta.start_address);
        s.meta.finalized = true;
        s.phase = Phase::Ended;
        debug!(length = s.meta.length, "END");
        self.check_undefined();
    }

    fn check_undefined(&mut self) {
        let undefined: Vec<(String, usize)> = self
            .referenced
            .iter()
            .filter(|(name, _)| !self.symbols.contains(name) && !catalog::is_register(name))
            .cloned()
            .collect();
        for (name, line) in undefined {
            self.record(line, &SemanticError::UndefinedSymbol(name));
        }
    }

    pub fn finish(mut self) -> Pass1Output {
        if self.state.phase == Phase::Running {
            let line = self.last_line;
            self.record(line, &SemanticError::MissingEnd);
            self.end();
        }
        Pass1Output {
            symbols: self.symbols,
            lines: self.lines,
            meta: self.state.meta,
            errors: self.errors,
        }
    }
}
