//! Static SIC/XE tables: opcodes with their base format, directive names and the
//! register file. Everything here is immutable and lookups are case-insensitive.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Encoding format of a line as resolved by pass 1. `None` covers directives,
/// comments and anything that produces no instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Format {
    #[default]
    None,
    One,
    Two,
    Three,
    Four,
}

impl Format {
    pub fn as_u8(self) -> u8 {
        match self {
            Format::None => 0,
            Format::One => 1,
            Format::Two => 2,
            Format::Three => 3,
            Format::Four => 4,
        }
    }

    /// Size in bytes of one instruction of this format.
    pub fn width(self) -> u32 {
        self.as_u8() as u32
    }

    /// `?` marker emitted in place of object code when encoding fails.
    pub fn placeholder(self) -> String {
        "?".repeat(self.width() as usize * 2)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AddrMode {
    #[default]
    None,
    Immediate,
    Indirect,
    Indexed,
    Simple,
}

impl AddrMode {
    pub fn name(self) -> &'static str {
        match self {
            AddrMode::None => "-",
            AddrMode::Immediate => "immediate",
            AddrMode::Indirect => "indirect",
            AddrMode::Indexed => "indexed",
            AddrMode::Simple => "simple",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InstrDesc {
    pub mnemonic: &'static str,
    pub opcode: u8,
    /// Base format; format-3 entries may also be assembled as format 4.
    pub format: Format,
}

const fn op(mnemonic: &'static str, opcode: u8, format: Format) -> InstrDesc {
    InstrDesc { mnemonic, opcode, format }
}

pub const TABLE: &[InstrDesc] = &[
    // format 1
    op("FIX", 0xC4, Format::One),
    op("FLOAT", 0xC0, Format::One),
    op("HIO", 0xF4, Format::One),
    op("NORM", 0xC8, Format::One),
    op("SIO", 0xF0, Format::One),
    op("TIO", 0xF8, Format::One),
    // format 2
    op("ADDR", 0x90, Format::Two),
    op("CLEAR", 0xB4, Format::Two),
    op("COMPR", 0xA0, Format::Two),
    op("DIVR", 0x9C, Format::Two),
    op("MULR", 0x98, Format::Two),
    op("RMO", 0xAC, Format::Two),
    op("SHIFTL", 0xA4, Format::Two),
    op("SHIFTR", 0xA8, Format::Two),
    op("SUBR", 0x94, Format::Two),
    op("SVC", 0xB0, Format::Two),
    op("TIXR", 0xB8, Format::Two),
    // format 3/4
    op("ADD", 0x18, Format::Three),
    op("ADDF", 0x58, Format::Three),
    op("AND", 0x40, Format::Three),
    op("COMP", 0x28, Format::Three),
    op("COMPF", 0x88, Format::Three),
    op("DIV", 0x24, Format::Three),
    op("DIVF", 0x64, Format::Three),
    op("J", 0x3C, Format::Three),
    op("JEQ", 0x30, Format::Three),
    op("JGT", 0x34, Format::Three),
    op("JLT", 0x38, Format::Three),
    op("JSUB", 0x48, Format::Three),
    op("LDA", 0x00, Format::Three),
    op("LDB", 0x68, Format::Three),
    op("LDCH", 0x50, Format::Three),
    op("LDF", 0x70, Format::Three),
    op("LDL", 0x08, Format::Three),
    op("LDS", 0x6C, Format::Three),
    op("LDT", 0x74, Format::Three),
    op("LDX", 0x04, Format::Three),
    op("LPS", 0xD0, Format::Three),
    op("MUL", 0x20, Format::Three),
    op("MULF", 0x60, Format::Three),
    op("OR", 0x44, Format::Three),
    op("RD", 0xD8, Format::Three),
    op("RSUB", 0x4C, Format::Three),
    op("SSK", 0xEC, Format::Three),
    op("STA", 0x0C, Format::Three),
    op("STB", 0x78, Format::Three),
    op("STCH", 0x54, Format::Three),
    op("STF", 0x80, Format::Three),
    op("STI", 0xD4, Format::Three),
    op("STL", 0x14, Format::Three),
    op("STS", 0x7C, Format::Three),
    op("STSW", 0xE8, Format::Three),
    op("STT", 0x84, Format::Three),
    op("STX", 0x10, Format::Three),
    op("SUB", 0x1C, Format::Three),
    op("SUBF", 0x5C, Format::Three),
    op("TD", 0xE0, Format::Three),
    op("TIX", 0x2C, Format::Three),
    op("WD", 0xDC, Format::Three),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Directive {
    Start,
    End,
    Byte,
    Word,
    Resb,
    Resw,
    Base,
    Nobase,
    Ltorg,
    Equ,
    Org,
    Csect,
}

const DIRECTIVES: &[(&str, Directive)] = &[
    ("START", Directive::Start),
    ("END", Directive::End),
    ("BYTE", Directive::Byte),
    ("WORD", Directive::Word),
    ("RESB", Directive::Resb),
    ("RESW", Directive::Resw),
    ("BASE", Directive::Base),
    ("NOBASE", Directive::Nobase),
    ("LTORG", Directive::Ltorg),
    ("EQU", Directive::Equ),
    ("ORG", Directive::Org),
    ("CSECT", Directive::Csect),
];

impl Directive {
    pub fn name(self) -> &'static str {
        DIRECTIVES
            .iter()
            .find(|(_, d)| *d == self)
            .map(|(n, _)| *n)
            .unwrap_or("?")
    }
}

const REGISTERS: &[(&str, u8)] = &[
    ("A", 0),
    ("X", 1),
    ("L", 2),
    ("B", 3),
    ("S", 4),
    ("T", 5),
    ("F", 6),
    ("PC", 8),
    ("CP", 8), // alias for PC
    ("SW", 9),
];

/// Result of looking a mnemonic up in the catalog.
#[derive(Debug, Clone, Copy)]
pub enum Lookup {
    Instruction(&'static InstrDesc),
    Directive(Directive),
    Unknown,
}

pub fn instruction(mnemonic: &str) -> Option<&'static InstrDesc> {
    TABLE.iter().find(|d| d.mnemonic.eq_ignore_ascii_case(mnemonic))
}

pub fn directive(name: &str) -> Option<Directive> {
    DIRECTIVES
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, d)| *d)
}

/// Classify a bare mnemonic (no `+` prefix).
pub fn lookup(mnemonic: &str) -> Lookup {
    if let Some(d) = directive(mnemonic) {
        Lookup::Directive(d)
    } else if let Some(i) = instruction(mnemonic) {
        Lookup::Instruction(i)
    } else {
        Lookup::Unknown
    }
}

/// True for anything the catalog knows, with or without a `+` prefix.
pub fn is_known(mnemonic: &str) -> bool {
    !matches!(lookup(mnemonic.strip_prefix('+').unwrap_or(mnemonic)), Lookup::Unknown)
}

pub fn register(name: &str) -> Option<u8> {
    let name = name.trim();
    REGISTERS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, r)| *r)
}

pub fn is_register(name: &str) -> bool {
    register(name).is_some()
}
