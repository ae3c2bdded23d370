pub mod catalog;
pub mod diag;
pub mod frontend;
pub mod listing;
pub mod literal;
pub mod pass1;
pub mod pass2;
pub mod statement;
pub mod symtab;

use serde::{Deserialize, Serialize};

pub use diag::{ErrorKind, ErrorRecord, SemanticError};
pub use frontend::{FrontEnd, LineReader};
pub use pass1::{IntermediateLine, Pass1, ProgramMetadata};
pub use pass2::{ObjectCodeLine, Pass2};
pub use statement::ParsedStatement;
pub use symtab::SymbolTable;

/// Result of a full two-pass run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assembly {
    pub metadata: ProgramMetadata,
    pub symbols: SymbolTable,
    pub lines: Vec<IntermediateLine>,
    /// 1:1 with `lines`.
    pub object_lines: Vec<ObjectCodeLine>,
    pub diagnostics: Vec<ErrorRecord>,
}

impl Assembly {
    pub fn is_valid(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = (&IntermediateLine, &ObjectCodeLine)> {
        self.lines.iter().zip(&self.object_lines)
    }

    /// Object code of every line, in listing order, as bytes.
    pub fn object_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for obj in self.object_lines.iter().filter(|o| o.has_code()) {
            let hex = if obj.object_code.len() % 2 == 1 {
                format!("0{}", obj.object_code)
            } else {
                obj.object_code.clone()
            };
            out.extend(
                hex.as_bytes()
                    .chunks(2)
                    .filter_map(|pair| std::str::from_utf8(pair).ok())
                    .filter_map(|pair| u8::from_str_radix(pair, 16).ok()),
            );
        }
        out
    }
}

/// Run pass 1 then pass 2 over already parsed statements.
pub fn assemble(stmts: &[ParsedStatement]) -> Assembly {
    let p1 = Pass1::run(stmts);
    let p2 = Pass2::run(&p1.symbols, &p1.lines);
    let diagnostics = diag::merge([p1.errors.as_slice(), p2.errors.as_slice()]);
    Assembly {
        metadata: p1.meta,
        symbols: p1.symbols,
        lines: p1.lines,
        object_lines: p2.lines,
        diagnostics,
    }
}

/// Parse `source` with [`LineReader`] and assemble it.
pub fn assemble_source(source: &str) -> Assembly {
    assemble(&LineReader.parse(source))
}
