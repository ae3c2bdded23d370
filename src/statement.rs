use serde::{Deserialize, Serialize};

use crate::catalog;
use crate::diag::ErrorRecord;

/// One physical source line as delivered by a front end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedStatement {
    /// 1-based source line number.
    pub line: usize,
    pub label: Option<String>,
    /// Mnemonic or directive, including a leading `+` for format 4.
    pub operation: Option<String>,
    pub operand: Option<String>,
    pub comment: Option<String>,
    /// Raw line text, used when the structured fields cannot be trusted.
    pub source: String,
    /// Lexical/syntactic errors the front end found on this line.
    pub errors: Vec<ErrorRecord>,
}

impl ParsedStatement {
    pub fn new(line: usize) -> Self {
        Self { line, ..Self::default() }
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn op(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn operand(mut self, operand: &str) -> Self {
        self.operand = Some(operand.to_string());
        self
    }

    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }

    pub fn source(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }

    pub fn error(mut self, err: ErrorRecord) -> Self {
        self.errors.push(err);
        self
    }

    pub fn label_text(&self) -> Option<&str> {
        non_empty(&self.label)
    }

    pub fn operation_text(&self) -> Option<&str> {
        non_empty(&self.operation)
    }

    pub fn operand_text(&self) -> Option<&str> {
        non_empty(&self.operand)
    }

    pub fn comment_text(&self) -> Option<&str> {
        non_empty(&self.comment)
    }

    pub fn has_front_end_error(&self) -> bool {
        !self.errors.is_empty()
    }

    fn has_fields(&self) -> bool {
        self.label_text().is_some() || self.operation_text().is_some() || self.operand_text().is_some()
    }

    /// Nothing at all on the line.
    pub fn is_blank(&self) -> bool {
        !self.has_fields() && self.comment_text().is_none() && !self.has_front_end_error()
    }

    pub fn is_comment_only(&self) -> bool {
        !self.has_fields() && self.comment_text().is_some() && !self.has_front_end_error()
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Split `text` at the first comment delimiter (`.`, `;` or `//`) that is not
/// inside a quoted constant. Returns the code part and the comment body.
pub fn strip_comment(text: &str) -> (&str, Option<&str>) {
    let mut in_quote = false;
    let bytes = text.as_bytes();
    for (i, c) in text.char_indices() {
        match c {
            '\'' => in_quote = !in_quote,
            '.' | ';' if !in_quote => return (&text[..i], Some(&text[i + 1..])),
            '/' if !in_quote && bytes.get(i + 1) == Some(&b'/') => {
                return (&text[..i], Some(&text[i + 2..]))
            }
            _ => {}
        }
    }
    (text, None)
}

/// Whitespace-separated tokens with their byte offsets. A quoted section
/// (`C'A B'`) never splits.
pub fn tokens(code: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut start: Option<usize> = None;
    let mut in_quote = false;
    for (i, c) in code.char_indices() {
        if c == '\'' {
            in_quote = !in_quote;
        }
        if c.is_whitespace() && !in_quote {
            if let Some(s) = start.take() {
                out.push((s, &code[s..i]));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        out.push((s, &code[s..]));
    }
    out
}

/// True when the first token is an operation rather than a label.
pub fn op_first(toks: &[&str]) -> bool {
    toks.first().is_some_and(|first| catalog::is_known(first))
        && toks.get(1).map_or(true, |second| !catalog::is_known(second))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    pub label: Option<String>,
    pub operation: Option<String>,
    pub operand: Option<String>,
}

/// Best-effort positional split used only for lines the front end rejected:
/// comment stripped, then `[label] operation operand...` by whitespace, where
/// a line starting with whitespace has no label, and neither has one that
/// starts with a known mnemonic followed by something that is not one.
pub fn fallback_split(source: &str) -> Fields {
    let (code, _) = strip_comment(source);
    let toks: Vec<&str> = tokens(code).into_iter().map(|(_, t)| t).collect();
    let labelled = !code.starts_with(char::is_whitespace) && !op_first(&toks);
    let (label, rest) = match toks.split_first() {
        Some((first, rest)) if labelled => (Some(first.to_string()), rest),
        _ => (None, toks.as_slice()),
    };
    let operation = rest.first().map(|s| s.to_string());
    let operand = rest.get(1..).filter(|r| !r.is_empty()).map(|r| r.concat());
    Fields { label, operation, operand }
}
