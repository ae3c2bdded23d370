use pretty_assertions::assert_eq;

use sicxe_rs::catalog::{AddrMode, Format};
use sicxe_rs::pass1::{addressing_mode, classify, Pass1, Phase};
use sicxe_rs::{ErrorKind, ErrorRecord, ParsedStatement};

fn st(line: usize) -> ParsedStatement {
    ParsedStatement::new(line)
}

fn messages(errors: &[ErrorRecord]) -> Vec<(usize, &str)> {
    errors.iter().map(|e| (e.line, e.message.as_str())).collect()
}

#[test]
fn duplicate_label_keeps_first_and_layout() {
    let out = Pass1::run(&[
        st(1).label("P").op("START").operand("100"),
        st(2).label("A").op("LDA").operand("B"),
        st(3).label("a").op("STA").operand("B"),
        st(4).label("B").op("WORD").operand("1"),
        st(5).op("END"),
    ]);
    assert_eq!(out.symbols.get("A"), Some(0x100));
    assert_eq!(out.symbols.get("B"), Some(0x106));
    assert_eq!(out.symbols.len(), 2);
    assert_eq!(out.lines[2].address, Some(0x103));
    assert_eq!(out.lines[2].increment, 3);
    assert_eq!(out.lines[2].error, "duplicate label 'a'");
    assert_eq!(out.meta.length, 9);
    assert_eq!(messages(&out.errors), vec![(3, "duplicate label 'a'")]);
}

#[test]
fn start_label_is_program_name_only() {
    let out = Pass1::run(&[st(1).label("COPY").op("START").operand("1000"), st(2).op("END")]);
    assert_eq!(out.meta.name, "COPY");
    assert_eq!(out.meta.start_address, 0x1000);
    assert!(!out.symbols.contains("COPY"));
    assert!(out.meta.finalized);
}

#[test]
fn implicit_start_at_zero() {
    let out = Pass1::run(&[st(1).label("X1").op("LDA").operand("#1"), st(2).op("END")]);
    assert!(out.errors.is_empty());
    assert_eq!(out.lines[0].address, Some(0));
    assert_eq!(out.meta.name, "");
    assert_eq!(out.meta.start_address, 0);
    assert_eq!(out.meta.length, 3);
}

#[test]
fn comments_and_blank_lines() {
    let out = Pass1::run(&[
        st(1).comment("header"),
        st(2),
        st(3).op("RSUB"),
        st(4).op("END"),
    ]);
    assert_eq!(out.lines.len(), 3);
    assert_eq!(out.lines[0].address, None);
    assert_eq!(out.lines[0].comment, "header");
    let listing: Vec<(usize, usize)> = out.lines.iter().map(|l| (l.listing, l.line)).collect();
    assert_eq!(listing, vec![(1, 1), (2, 3), (3, 4)]);
}

#[test]
fn increments_by_kind() {
    let out = Pass1::run(&[
        st(1).op("START").operand("0"),
        st(2).op("BYTE").operand("C'EOF'"),
        st(3).op("BYTE").operand("X'F1'"),
        st(4).op("BYTE").operand("X'ABC'"),
        st(5).op("WORD").operand("7"),
        st(6).op("RESB").operand("10"),
        st(7).op("RESW").operand("2"),
        st(8).op("BASE").operand("0"),
        st(9).op("FIX"),
        st(10).op("CLEAR").operand("A"),
        st(11).op("+JSUB").operand("0"),
        st(12).op("LDA").operand("0"),
        st(13).op("END"),
    ]);
    let inc: Vec<u32> = out.lines.iter().map(|l| l.increment).collect();
    assert_eq!(inc, vec![0, 3, 1, 2, 3, 10, 6, 0, 1, 2, 4, 3, 0]);
    assert_eq!(out.meta.length, 35);
    assert!(out.errors.is_empty(), "{:?}", out.errors);
}

#[test]
fn unknown_mnemonic_counts_three() {
    let out = Pass1::run(&[st(1).op("FOO").operand("1"), st(2).op("RSUB"), st(3).op("END")]);
    assert_eq!(out.lines[0].increment, 3);
    assert_eq!(out.lines[1].address, Some(3));
    assert_eq!(messages(&out.errors), vec![(1, "unknown instruction 'FOO'")]);
}

#[test]
fn extended_prefix_on_format2_is_gated() {
    let out = Pass1::run(&[
        st(1).label("L1").op("+CLEAR").operand("A"),
        st(2).label("L2").op("RSUB"),
        st(3).op("END"),
    ]);
    assert!(!out.symbols.contains("L1"));
    assert_eq!(out.symbols.get("L2"), Some(0));
    assert_eq!(out.lines[0].increment, 0);
    assert_eq!(
        messages(&out.errors),
        vec![(1, "'+' prefix is not allowed on format 2 instruction 'CLEAR'")]
    );
}

#[test]
fn front_end_error_uses_raw_text() {
    let out = Pass1::run(&[
        st(1)
            .source("BAD  LDA  %X")
            .error(ErrorRecord::new(1, 11, "unexpected character '%'", ErrorKind::Lexical)),
        st(2).label("NEXT").op("RSUB"),
        st(3).op("END"),
    ]);
    let bad = &out.lines[0];
    assert_eq!((bad.label.as_str(), bad.operation.as_str(), bad.operand.as_str()), ("BAD", "LDA", "%X"));
    assert_eq!(bad.address, Some(0));
    assert_eq!(bad.increment, 0);
    assert_eq!(bad.error, "unexpected character '%'");
    assert!(!out.symbols.contains("BAD"));
    assert_eq!(out.symbols.get("NEXT"), Some(0));
    assert_eq!(out.errors[0].kind, ErrorKind::Lexical);
    assert_eq!(out.errors[0].column, 11);
}

#[test]
fn statements_after_end_are_gated() {
    let out = Pass1::run(&[
        st(1).op("RSUB"),
        st(2).op("END"),
        st(3).label("LATE").op("RSUB"),
    ]);
    assert!(!out.symbols.contains("LATE"));
    assert_eq!(out.meta.length, 3);
    assert_eq!(out.lines[2].address, Some(3));
    assert_eq!(messages(&out.errors), vec![(3, "statement after END")]);
}

#[test]
fn missing_end_still_finalizes() {
    let out = Pass1::run(&[
        st(1).op("START").operand("10"),
        st(2).op("LDA").operand("NOWHERE"),
        st(4).op("RSUB"),
    ]);
    assert_eq!(out.meta.length, 6);
    assert_eq!(out.meta.final_counter, 0x16);
    assert_eq!(
        messages(&out.errors),
        vec![(4, "missing END directive"), (2, "undefined symbol 'NOWHERE'")]
    );
}

#[test]
fn undefined_reported_per_referencing_line() {
    let out = Pass1::run(&[
        st(1).op("LDA").operand("GHOST"),
        st(2).op("STA").operand("@ghost"),
        st(3).op("COMPR").operand("A,S"),
        st(4).op("LDX").operand("#0"),
        st(5).op("END"),
    ]);
    assert_eq!(
        messages(&out.errors),
        vec![(1, "undefined symbol 'GHOST'"), (2, "undefined symbol 'GHOST'")]
    );
}

#[test]
fn second_start_is_reported() {
    let out = Pass1::run(&[
        st(1).op("START").operand("0"),
        st(2).op("RSUB"),
        st(3).op("START").operand("100"),
        st(4).op("RSUB"),
        st(5).op("END"),
    ]);
    assert_eq!(out.lines[3].address, Some(3));
    assert_eq!(out.meta.start_address, 0);
    assert_eq!(messages(&out.errors), vec![(3, "START must be the first statement")]);
}

#[test]
fn equ_binds_value() {
    let out = Pass1::run(&[
        st(1).op("START").operand("0"),
        st(2).label("MAXLEN").op("EQU").operand("4096"),
        st(3).label("HERE").op("EQU").operand("*"),
        st(4).op("RSUB"),
        st(5).label("ALIAS").op("EQU").operand("MAXLEN"),
        st(6).op("END"),
    ]);
    assert_eq!(out.symbols.get("MAXLEN"), Some(4096));
    assert_eq!(out.symbols.get("HERE"), Some(0));
    assert_eq!(out.symbols.get("ALIAS"), Some(4096));
    assert_eq!(out.lines[1].value, Some(4096));
    assert_eq!(out.lines[1].increment, 0);
    assert!(out.errors.is_empty());
}

#[test]
fn base_resolves_known_symbol() {
    let out = Pass1::run(&[
        st(1).op("START").operand("0"),
        st(2).label("HERE").op("RSUB"),
        st(3).op("BASE").operand("HERE"),
        st(4).op("BASE").operand("LATER"),
        st(5).label("LATER").op("RSUB"),
        st(6).op("END"),
    ]);
    assert_eq!(out.lines[2].value, Some(0));
    assert_eq!(out.lines[3].value, None);
    assert_eq!(out.meta.base_operand.as_deref(), Some("LATER"));
    assert!(out.errors.is_empty());
}

#[test]
fn classification() {
    assert_eq!(addressing_mode("#5"), AddrMode::Immediate);
    assert_eq!(addressing_mode("@PTR"), AddrMode::Indirect);
    assert_eq!(addressing_mode("BUF, x"), AddrMode::Indexed);
    assert_eq!(addressing_mode("BUF"), AddrMode::Simple);
    assert_eq!(addressing_mode(""), AddrMode::None);

    let c = classify(Some("+lda"), Some("#5"));
    assert_eq!((c.format(), c.mode()), (Format::Four, AddrMode::Immediate));
    let c = classify(Some("RSUB"), None);
    assert_eq!((c.format(), c.mode()), (Format::Three, AddrMode::Simple));
    let c = classify(Some("ADDR"), Some("A,S"));
    assert_eq!((c.format(), c.mode()), (Format::Two, AddrMode::None));
    let c = classify(Some("WORD"), Some("#1"));
    assert_eq!((c.format(), c.mode()), (Format::None, AddrMode::None));
}

#[test]
fn state_tracks_phase() {
    let mut p = Pass1::new();
    assert_eq!(p.state().phase, Phase::NotStarted);
    p.process(&st(1).op("START").operand("20"));
    assert_eq!(p.state().phase, Phase::Running);
    assert_eq!(p.state().location_counter, 0x20);
    p.process(&st(2).op("+JSUB").operand("0"));
    assert_eq!(p.state().location_counter, 0x24);
    p.process(&st(3).op("END"));
    assert_eq!(p.state().phase, Phase::Ended);
    assert_eq!(p.state().meta.length, 4);
}

#[test]
fn rejected_line_before_start_keeps_layout() {
    let asm = sicxe_rs::assemble_source("BAD$ LINE\nPROG START 1000\nFIRST LDA #5\n END FIRST\n");
    assert_eq!(asm.metadata.name, "PROG");
    assert_eq!(asm.metadata.start_address, 0x1000);
    assert_eq!(asm.symbols.get("FIRST"), Some(0x1000));
    assert_eq!(asm.metadata.length, 3);
    assert_eq!(asm.lines[0].address, Some(0));
    let msgs: Vec<&str> = asm.diagnostics.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(msgs, vec!["unexpected character '$'"]);
}

#[test]
fn rejected_op_first_line_lists_operation() {
    let out = Pass1::run(&[
        st(1)
            .source("LDA BUF%")
            .error(ErrorRecord::new(1, 8, "unexpected character '%'", ErrorKind::Lexical)),
        st(2).op("END"),
    ]);
    let l = &out.lines[0];
    assert_eq!((l.label.as_str(), l.operation.as_str(), l.operand.as_str()), ("", "LDA", "BUF%"));
}

#[test]
fn line_errors_accumulate() {
    let out = Pass1::run(&[
        st(1).op("START").operand("0"),
        st(2).label("A").op("RSUB"),
        st(3).label("A").op("ORG").operand("0"),
        st(4).op("END"),
    ]);
    assert_eq!(out.lines[2].error, "duplicate label 'A'; unsupported directive 'ORG'");
}
