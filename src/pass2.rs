//! Pass 2: object code generation over the finished intermediate listing.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::catalog::{self, AddrMode, Directive, Format, InstrDesc, Lookup};
use crate::diag::{ErrorRecord, SemanticError};
use crate::literal::{self, ByteConst};
use crate::pass1::{has_index_suffix, IntermediateLine};
use crate::symtab::SymbolTable;

bitflags! {
/// Addressing bits of a format 3/4 word, in their order within the
/// 6 bits following the opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nixbpe: u8 {
const N = 1 << 5; // indirect
const I = 1 << 4; // immediate
const X = 1 << 3; // indexed
const B = 1 << 2; // base-relative
const P = 1 << 1; // pc-relative
const E = 1 << 0; // extended (format 4)
}
}

impl Nixbpe {
    pub fn for_mode(mode: AddrMode) -> Nixbpe {
        match mode {
            AddrMode::Immediate => Nixbpe::I,
            AddrMode::Indirect => Nixbpe::N,
            AddrMode::Indexed => Nixbpe::N | Nixbpe::I | Nixbpe::X,
            AddrMode::Simple | AddrMode::None => Nixbpe::N | Nixbpe::I,
        }
    }

    fn ni(self) -> u32 {
        (self.bits() >> 4) as u32
    }

    fn xbpe(self) -> u32 {
        (self.bits() & 0x0F) as u32
    }
}

pub const PC_RANGE: std::ops::RangeInclusive<i64> = -2048..=2047;
pub const BASE_RANGE: std::ops::RangeInclusive<i64> = 0..=4095;
/// Unsigned 12-bit immediate of a format-3 word.
pub const IMM_RANGE: std::ops::RangeInclusive<i64> = 0..=4095;

pub fn pack_format3(opcode: u8, flags: Nixbpe, disp: i64) -> String {
    let byte0 = (opcode & 0xFC) as u32 | flags.ni();
    let word = byte0 << 16 | flags.xbpe() << 12 | (disp & 0xFFF) as u32;
    format!("{word:06X}")
}

pub fn pack_format4(opcode: u8, flags: Nixbpe, addr: i64) -> String {
    let byte0 = (opcode & 0xFC) as u32 | flags.ni();
    let word = byte0 << 24 | (flags | Nixbpe::E).xbpe() << 20 | (addr & 0xF_FFFF) as u32;
    format!("{word:08X}")
}

/// Object code for one listing row. `error` is the full error text of the
/// row: the pass-1 error when it was passed through, otherwise pass 2's own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectCodeLine {
    pub listing: usize,
    pub object_code: String,
    pub error: String,
}

impl ObjectCodeLine {
    pub fn has_code(&self) -> bool {
        !self.object_code.is_empty() && !self.is_placeholder()
    }

    pub fn is_placeholder(&self) -> bool {
        self.object_code.starts_with('?')
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pass2Output {
    pub lines: Vec<ObjectCodeLine>,
    pub errors: Vec<ErrorRecord>,
}

/// Operand text with prefixes and any `,X` suffix removed.
fn target_text(operand: &str) -> &str {
    let t = operand.trim();
    let t = if has_index_suffix(t) {
        t.split_once(',').map_or(t, |(head, _)| head)
    } else {
        t
    };
    literal::strip_prefixes(t)
}

fn register(name: &str) -> Result<u32, SemanticError> {
    catalog::register(name)
        .map(u32::from)
        .ok_or_else(|| SemanticError::InvalidRegister(name.trim().to_string()))
}

pub fn encode_format2(desc: &InstrDesc, operand: &str) -> Result<String, SemanticError> {
    let operand = operand.trim();
    if operand.is_empty() {
        return Err(SemanticError::MissingOperand(desc.mnemonic.to_string()));
    }
    let parts: Vec<&str> = operand.split(',').map(str::trim).collect();
    let first = parts[0];
    let second = || {
        parts
            .get(1)
            .copied()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SemanticError::MissingOperand(desc.mnemonic.to_string()))
    };
    let (r1, r2) = match desc.mnemonic {
        "SVC" => {
            let n = literal::parse_numeric(first)
                .filter(|n| (0..=15).contains(n))
                .ok_or_else(|| SemanticError::InvalidSvc(first.to_string()))?;
            (n as u32, 0)
        }
        "CLEAR" | "TIXR" => (register(first)?, 0),
        "SHIFTL" | "SHIFTR" => {
            let r1 = register(first)?;
            let count = second()?;
            let n = literal::parse_numeric(count)
                .filter(|n| (1..=16).contains(n))
                .ok_or_else(|| SemanticError::InvalidShift(count.to_string()))?;
            (r1, (n - 1) as u32)
        }
        _ => (register(first)?, register(second()?)?),
    };
    let word = (desc.opcode as u32) << 8 | r1 << 4 | r2;
    Ok(format!("{word:04X}"))
}

pub struct Pass2<'a> {
    symbols: &'a SymbolTable,
    base: Option<u32>,
    errors: Vec<ErrorRecord>,
}

impl<'a> Pass2<'a> {
    pub fn new(symbols: &'a SymbolTable) -> Self {
        Self { symbols, base: None, errors: Vec::new() }
    }

    pub fn run(symbols: &SymbolTable, lines: &[IntermediateLine]) -> Pass2Output {
        let mut p = Pass2::new(symbols);
        let lines = lines.iter().map(|l| p.encode(l)).collect();
        Pass2Output { lines, errors: p.errors }
    }

    /// Base register value currently in effect.
    pub fn base(&self) -> Option<u32> {
        self.base
    }

    pub fn errors(&self) -> &[ErrorRecord] {
        &self.errors
    }

    pub fn encode(&mut self, line: &IntermediateLine) -> ObjectCodeLine {
        let mut out = ObjectCodeLine { listing: line.listing, ..ObjectCodeLine::default() };
        if line.is_comment() || line.has_error() || line.operation.trim().is_empty() {
            out.error = line.error.clone();
            return out;
        }
        let result = match catalog::lookup(line.mnemonic()) {
            Lookup::Directive(dir) => self.directive(dir, line),
            Lookup::Unknown => Err(SemanticError::UnknownInstruction(line.mnemonic().to_string())),
            Lookup::Instruction(desc) => match line.format {
                Format::One => Ok(format!("{:02X}", desc.opcode)),
                Format::Two => encode_format2(desc, &line.operand),
                Format::Three => self.format3(desc, line),
                Format::Four => self.format4(desc, line),
                Format::None => Ok(String::new()),
            },
        };
        match result {
            Ok(code) => {
                debug!(line = line.line, address = ?line.address, code = %code, "encoded");
                out.object_code = code;
            }
            Err(err) => {
                warn!(line = line.line, "{err}");
                out.object_code = match line.format {
                    Format::None => "?".repeat(line.increment as usize * 2),
                    f => f.placeholder(),
                };
                out.error = err.to_string();
                self.errors.push(ErrorRecord::semantic(line.line, &err));
            }
        }
        out
    }

    fn directive(&mut self, dir: Directive, line: &IntermediateLine) -> Result<String, SemanticError> {
        let operand = line.operand.trim();
        match dir {
            Directive::Byte => ByteConst::parse(operand)
                .and_then(|c| c.object_code())
                .ok_or_else(|| SemanticError::InvalidByte(operand.to_string())),
            Directive::Word => {
                let v = literal::parse_numeric(operand)
                    .or_else(|| self.symbols.get(operand).map(i64::from))
                    .ok_or_else(|| SemanticError::InvalidWord(operand.to_string()))?;
                Ok(format!("{:06X}", v & 0xFF_FFFF))
            }
            Directive::Base => {
                let resolved = self
                    .symbols
                    .get(operand)
                    .or_else(|| literal::parse_numeric(operand).and_then(|v| u32::try_from(v).ok()));
                if resolved.is_some() {
                    self.base = resolved;
                }
                trace!(base = ?self.base, "BASE");
                Ok(String::new())
            }
            Directive::Nobase => {
                self.base = None;
                Ok(String::new())
            }
            _ => Ok(String::new()),
        }
    }

    /// Numeric operand, else the address of a symbol.
    fn resolve(&self, text: &str) -> Result<i64, SemanticError> {
        literal::parse_numeric(text)
            .or_else(|| self.symbols.get(text).map(i64::from))
            .ok_or_else(|| SemanticError::SymbolNotDefined(text.to_string()))
    }

    fn format3(&self, desc: &InstrDesc, line: &IntermediateLine) -> Result<String, SemanticError> {
        if desc.mnemonic == "RSUB" {
            return Ok(pack_format3(desc.opcode, Nixbpe::N | Nixbpe::I, 0));
        }
        if line.operand.trim().is_empty() {
            return Err(SemanticError::MissingOperand(desc.mnemonic.to_string()));
        }
        let mut flags = Nixbpe::for_mode(line.mode);
        let text = target_text(&line.operand);

        if line.mode == AddrMode::Immediate {
            if let Some(v) = literal::parse_numeric(text) {
                if !IMM_RANGE.contains(&v) {
                    return Err(SemanticError::ImmediateOutOfRange(v));
                }
                return Ok(pack_format3(desc.opcode, flags, v));
            }
        }

        let target = self.resolve(text)?;
        let pc = line.address.unwrap_or(0) as i64 + line.increment as i64;
        let pc_disp = target - pc;
        if PC_RANGE.contains(&pc_disp) {
            trace!(line = line.line, disp = pc_disp, "pc-relative");
            flags |= Nixbpe::P;
            return Ok(pack_format3(desc.opcode, flags, pc_disp));
        }
        let Some(base) = self.base else {
            return Err(SemanticError::BaseNotDefined(pc_disp));
        };
        let base_disp = target - base as i64;
        if BASE_RANGE.contains(&base_disp) {
            trace!(line = line.line, disp = base_disp, "base-relative");
            flags |= Nixbpe::B;
            return Ok(pack_format3(desc.opcode, flags, base_disp));
        }
        Err(SemanticError::DisplacementOutOfRange { pc: pc_disp, base: base_disp })
    }

    fn format4(&self, desc: &InstrDesc, line: &IntermediateLine) -> Result<String, SemanticError> {
        if desc.mnemonic == "RSUB" {
            return Ok(pack_format4(desc.opcode, Nixbpe::N | Nixbpe::I, 0));
        }
        if line.operand.trim().is_empty() {
            return Err(SemanticError::MissingOperand(desc.mnemonic.to_string()));
        }
        let flags = Nixbpe::for_mode(line.mode);
        let addr = self.resolve(target_text(&line.operand))?;
        Ok(pack_format4(desc.opcode, flags, addr))
    }
}
