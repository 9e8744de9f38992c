//! # IR Opcodes
//!
//! The intermediate representation for receipt output: a flat sequence of
//! formatting intents that can be inspected in tests and compiled to
//! ESC/POS bytes.
//!
//! ```text
//! Lines → IR (inspectable) → Codegen → Bytes
//! ```

use crate::protocol::commands::DrawerPin;
use crate::protocol::text::{Alignment, FontSize, TextStyle};

/// IR opcodes - one formatting intent each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    // ========== Printer Control ==========
    /// Initialize printer (ESC @) and select the text code page.
    Init,

    /// Full cut, optionally feeding `feed` lines first.
    Cut { feed: u8 },

    /// Feed paper by whole lines.
    Feed { lines: u8 },

    /// Pulse the cash drawer connector.
    DrawerKick(DrawerPin),

    // ========== Style Changes ==========
    SetAlign(Alignment),
    SetBold(bool),
    SetFont(FontSize),

    /// Bold off, normal font, left align.
    ResetStyle,

    // ========== Content ==========
    /// Text payload (no trailing newline).
    Text(String),

    /// Line feed.
    Newline,
}

/// A sequence of ops.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub ops: Vec<Op>,
}

impl Program {
    /// Create an empty program.
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Create a program with an initial Init op.
    pub fn with_init() -> Self {
        Self {
            ops: vec![Op::Init],
        }
    }

    /// Add an op to the program.
    pub fn push(&mut self, op: Op) {
        self.ops.push(op);
    }

    /// Add multiple ops to the program.
    pub fn extend(&mut self, ops: impl IntoIterator<Item = Op>) {
        self.ops.extend(ops);
    }

    /// Append one styled text run followed by a line feed.
    ///
    /// Any non-neutral style is always followed by `ResetStyle`, so a bold
    /// header never bleeds into the next line even when the caller only
    /// asked for one attribute.
    pub fn styled_line(&mut self, text: &str, style: TextStyle) -> &mut Self {
        if style.align != Alignment::Left {
            self.push(Op::SetAlign(style.align));
        }
        if style.bold {
            self.push(Op::SetBold(true));
        }
        if style.size != FontSize::Normal {
            self.push(Op::SetFont(style.size));
        }
        if !text.is_empty() {
            self.push(Op::Text(text.to_string()));
        }
        self.push(Op::Newline);
        if !style.is_neutral() {
            self.push(Op::ResetStyle);
        }
        self
    }

    /// Get the number of ops in the program.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Check if the program is empty.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Iterate over ops.
    pub fn iter(&self) -> impl Iterator<Item = &Op> {
        self.ops.iter()
    }
}

impl FromIterator<Op> for Program {
    fn from_iter<T: IntoIterator<Item = Op>>(iter: T) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Program {
    type Item = Op;
    type IntoIter = std::vec::IntoIter<Op>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_with_init() {
        let program = Program::with_init();
        assert_eq!(program.len(), 1);
        assert_eq!(program.ops[0], Op::Init);
    }

    #[test]
    fn test_plain_line_has_no_style_ops() {
        let mut program = Program::new();
        program.styled_line("hello", TextStyle::new());
        assert_eq!(
            program.ops,
            vec![Op::Text("hello".into()), Op::Newline]
        );
    }

    #[test]
    fn test_single_style_still_resets() {
        let mut program = Program::new();
        program.styled_line("TOTAL", TextStyle::new().bold());
        assert_eq!(
            program.ops,
            vec![
                Op::SetBold(true),
                Op::Text("TOTAL".into()),
                Op::Newline,
                Op::ResetStyle,
            ]
        );
    }

    #[test]
    fn test_empty_text_still_feeds() {
        let mut program = Program::new();
        program.styled_line("", TextStyle::new());
        assert_eq!(program.ops, vec![Op::Newline]);
    }
}
