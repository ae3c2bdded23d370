//! Text rendering of an [`Assembly`].

use std::fmt::Write as _;

use crate::catalog::Format;
use crate::pass1::{IntermediateLine, ProgramMetadata};
use crate::pass2::ObjectCodeLine;
use crate::symtab::SymbolTable;
use crate::Assembly;

pub fn fmt_line(line: &IntermediateLine, obj: &ObjectCodeLine) -> String {
    let Some(addr) = line.address else {
        return format!("{:>4}      . {}", line.listing, line.comment);
    };
    let format = match line.format {
        Format::None => "-".to_string(),
        f => f.to_string(),
    };
    let mut s = format!(
        "{:>4}  {:04X}  {:<8} {:<8} {:<16} {} {:<9} {:<8}",
        line.listing,
        addr,
        line.label,
        line.operation,
        line.operand,
        format,
        line.mode.name(),
        obj.object_code,
    );
    if !obj.error.is_empty() {
        let _ = write!(s, " ! {}", obj.error);
    }
    s.trim_end().to_string()
}

pub fn fmt_symbol_table(symbols: &SymbolTable) -> String {
    let mut s = String::from("SYMBOL    ADDRESS\n");
    for sym in symbols.by_address() {
        let _ = writeln!(s, "{:<10}{:04X}", sym.name, sym.address);
    }
    s
}

pub fn fmt_program(meta: &ProgramMetadata) -> String {
    let mut s = format!(
        "PROGRAM {}  START {:04X}  LENGTH {:04X}",
        meta.name, meta.start_address, meta.length
    );
    if let Some(base) = meta.base_value {
        let _ = write!(s, "  BASE {base:04X}");
    }
    s
}

/// Full text report: header, listing, symbol table and diagnostics.
pub fn report(asm: &Assembly) -> String {
    let mut s = fmt_program(&asm.metadata);
    s.push_str("\n\n");
    for (line, obj) in asm.rows() {
        s.push_str(&fmt_line(line, obj));
        s.push('\n');
    }
    s.push('\n');
    s.push_str(&fmt_symbol_table(&asm.symbols));
    if !asm.diagnostics.is_empty() {
        let _ = writeln!(s, "\n{} error(s)", asm.diagnostics.len());
        for e in &asm.diagnostics {
            let _ = writeln!(s, "{e}");
        }
    }
    s
}
