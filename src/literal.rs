//! Operand literal parsing shared by both passes.
//!
//! Accepted numeric spellings: decimal (`4096`, `-3`), hex with a trailing `H`
//! (`1000H`, must start with a decimal digit so symbols like `LENGTH` are not
//! mistaken for numbers), hex with a leading `0x`, and `X'..'` constants.

/// Drop the `#`, `@` and `=` operand prefixes.
pub fn strip_prefixes(text: &str) -> &str {
    text.trim().trim_start_matches(['#', '@', '=']).trim()
}

pub fn parse_numeric(text: &str) -> Option<i64> {
    let t = strip_prefixes(text);
    if t.is_empty() {
        return None;
    }
    if let Some(hex) = t.strip_suffix(['H', 'h']) {
        if hex.starts_with(|c: char| c.is_ascii_digit()) {
            return i64::from_str_radix(hex, 16).ok();
        }
    }
    if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok();
    }
    if let Some(ByteConst::Hex(digits)) = ByteConst::parse(t) {
        return i64::from_str_radix(&digits, 16).ok();
    }
    t.parse::<i64>().ok()
}

/// Like [`parse_numeric`] but a failed parse is 0.
pub fn parse_value(text: &str) -> i64 {
    parse_numeric(text).unwrap_or(0)
}

/// START operands are addresses and conventionally written in bare hex
/// (`START 1000` is 0x1000). The explicit spellings are honoured first.
pub fn parse_address(text: &str) -> Option<i64> {
    let t = strip_prefixes(text);
    if t.is_empty() {
        return None;
    }
    if t.ends_with(['H', 'h']) || t.starts_with("0x") || t.starts_with("0X") || ByteConst::parse(t).is_some() {
        return parse_numeric(t);
    }
    if t.chars().all(|c| c.is_ascii_hexdigit()) {
        return i64::from_str_radix(t, 16).ok();
    }
    None
}

/// `C'..'` and `X'..'` constants as used by BYTE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ByteConst {
    Chars(String),
    Hex(String),
}

impl ByteConst {
    pub fn parse(text: &str) -> Option<ByteConst> {
        let t = text.trim();
        if t.len() < 3 || !t.ends_with('\'') {
            return None;
        }
        let (Some(kind), Some(body)) = (t.get(..2), t.get(2..t.len() - 1)) else {
            return None;
        };
        if kind.eq_ignore_ascii_case("C'") {
            Some(ByteConst::Chars(body.to_string()))
        } else if kind.eq_ignore_ascii_case("X'") {
            Some(ByteConst::Hex(body.to_string()))
        } else {
            None
        }
    }

    /// Bytes reserved for this constant.
    pub fn len(&self) -> u32 {
        match self {
            ByteConst::Chars(s) => s.len() as u32,
            ByteConst::Hex(h) => (h.len() as u32 + 1) / 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hex object code, or `None` if an `X'..'` body holds a non-hex digit.
    pub fn object_code(&self) -> Option<String> {
        match self {
            ByteConst::Chars(s) => Some(s.bytes().map(|b| format!("{b:02X}")).collect()),
            ByteConst::Hex(h) => {
                if h.is_empty() || !h.chars().all(|c| c.is_ascii_hexdigit()) {
                    return None;
                }
                Some(h.to_ascii_uppercase())
            }
        }
    }
}

/// True for tokens that are quoted constants rather than names.
pub fn is_quoted_constant(token: &str) -> bool {
    let t = token.trim();
    t.get(..2)
        .is_some_and(|k| k.eq_ignore_ascii_case("C'") || k.eq_ignore_ascii_case("X'"))
}
