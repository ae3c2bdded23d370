use pretty_assertions::assert_eq;

use sicxe_rs::{assemble_source, Assembly};

const MINIMAL: &str = "\
PROG START 1000
FIRST LDA  #5
      STA  RESULT
RESULT RESW 1
      END  FIRST
";

fn codes(asm: &Assembly) -> Vec<&str> {
    asm.object_lines.iter().map(|o| o.object_code.as_str()).collect()
}

fn messages(asm: &Assembly) -> Vec<(usize, &str)> {
    asm.diagnostics.iter().map(|e| (e.line, e.message.as_str())).collect()
}

#[test]
fn minimal_program() {
    let asm = assemble_source(MINIMAL);
    assert!(asm.is_valid(), "{:?}", asm.diagnostics);

    let syms: Vec<(&str, u32)> = asm.symbols.by_address().into_iter().map(|s| (s.name.as_str(), s.address)).collect();
    assert_eq!(syms, vec![("FIRST", 0x1000), ("RESULT", 0x1006)]);

    let addrs: Vec<Option<u32>> = asm.lines.iter().map(|l| l.address).collect();
    assert_eq!(addrs, vec![Some(0x1000), Some(0x1000), Some(0x1003), Some(0x1006), Some(0x1009)]);

    assert_eq!(codes(&asm), vec!["", "010005", "0F2000", "", ""]);
    assert_eq!(asm.metadata.name, "PROG");
    assert_eq!(asm.metadata.start_address, 0x1000);
    assert_eq!(asm.metadata.length, 9);
    assert_eq!(asm.object_bytes(), vec![0x01, 0x00, 0x05, 0x0F, 0x20, 0x00]);
}

#[test]
fn loop_with_index_and_extended_call() {
    let src = "\
SUM     START   0
FIRST   CLEAR   X
        LDA     #3
LOOP    ADD     TABLE,X
        TIX     COUNT
        JLT     LOOP
       +JSUB    SUB1
        STA     TOTAL
        RSUB
TABLE   WORD    5
COUNT   WORD    1
TOTAL   RESW    1
SUB1    RSUB
        END     FIRST
";
    let asm = assemble_source(src);
    assert!(asm.is_valid(), "{:?}", asm.diagnostics);
    assert_eq!(
        codes(&asm),
        vec![
            "", "B410", "010003", "1BA010", "2F2010", "3B2FF7", "4B100021", "0F2009", "4F0000", "000005",
            "000001", "", "4F0000", "",
        ]
    );
    assert_eq!(asm.symbols.get("TABLE"), Some(0x18));
    assert_eq!(asm.symbols.get("sub1"), Some(0x21));
    assert_eq!(asm.metadata.length, 0x24);
}

#[test]
fn pc_relative_boundary_without_base() {
    let src = "\
      START 0
      J     FAR
      RESB  2048
FAR   RSUB
      END
";
    let asm = assemble_source(src);
    assert_eq!(asm.object_lines[1].object_code, "??????");
    assert_eq!(
        messages(&asm),
        vec![(2, "displacement 2048 out of range for PC-relative and BASE not defined")]
    );
}

#[test]
fn pc_relative_upper_edge_fits() {
    let src = "\
      START 0
      J     FAR
      RESB  2047
FAR   RSUB
      END
";
    let asm = assemble_source(src);
    assert!(asm.is_valid(), "{:?}", asm.diagnostics);
    assert_eq!(asm.object_lines[1].object_code, "3F27FF");
}

#[test]
fn base_relative_upper_edge() {
    let src = "\
      START 0
      BASE  ANCHOR
      J     FAR
ANCHOR RESB 4095
FAR   RSUB
      END
";
    let asm = assemble_source(src);
    assert!(asm.is_valid(), "{:?}", asm.diagnostics);
    assert_eq!(asm.object_lines[2].object_code, "3F4FFF");
}

#[test]
fn out_of_range_for_both_modes() {
    let src = "\
      START 0
      BASE  ANCHOR
      J     FAR
ANCHOR RESB 4096
FAR   RSUB
      END
";
    let asm = assemble_source(src);
    assert_eq!(asm.object_lines[2].object_code, "??????");
    assert_eq!(
        messages(&asm),
        vec![(
            3,
            "displacement out of range for both PC-relative (4096) and BASE-relative (4096); use format 4"
        )]
    );
}

#[test]
fn format1_with_operand_is_gated() {
    let src = "\
      START 0
      FIX   5
      FIX
      END
";
    let asm = assemble_source(src);
    assert_eq!(asm.lines[1].address, Some(0));
    assert_eq!(asm.lines[1].increment, 0);
    assert_eq!(asm.lines[2].address, Some(0));
    assert_eq!(codes(&asm), vec!["", "", "C4", ""]);
    assert_eq!(asm.metadata.length, 1);
    assert_eq!(messages(&asm), vec![(2, "format 1 instruction 'FIX' takes no operand")]);
}

#[test]
fn undefined_symbol_in_format4() {
    let src = "\
      START 0
     +LDA   BIGVAL
      END
";
    let asm = assemble_source(src);
    assert_eq!(asm.lines[1].increment, 4);
    assert_eq!(asm.object_lines[1].object_code, "????????");
    assert_eq!(
        messages(&asm),
        vec![(2, "undefined symbol 'BIGVAL'"), (2, "symbol not defined: 'BIGVAL'")]
    );
    assert!(!asm.is_valid());
}

#[test]
fn deterministic() {
    let a = assemble_source(MINIMAL);
    let b = assemble_source(MINIMAL);
    assert_eq!(a, b);
}

#[test]
fn json_round_trip_of_report() {
    let asm = assemble_source(MINIMAL);
    let json = serde_json::to_string_pretty(&asm).unwrap();
    let back: Assembly = serde_json::from_str(&json).unwrap();
    assert_eq!(back, asm);
}
