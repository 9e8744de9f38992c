//! # Intermediate Representation (IR)
//!
//! The command encoder. Formatting intents are collected as a list of
//! [`Op`]s and compiled to ESC/POS bytes in one pass.
//!
//! ```text
//! ┌──────────────┐     ┌─────────────┐     ┌──────────┐
//! │ layout Lines │ ──► │     IR      │ ──► │ Codegen  │
//! │ (formatter)  │     │  (Vec<Op>)  │     │ (bytes)  │
//! └──────────────┘     └─────────────┘     └──────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use posprint::ir::{Op, Program};
//! use posprint::protocol::text::TextStyle;
//!
//! let mut program = Program::with_init();
//! program.styled_line("HELLO", TextStyle::new().center().bold());
//! program.push(Op::Cut { feed: 3 });
//!
//! let bytes = program.to_bytes();
//! assert_eq!(&bytes[..2], &[0x1B, 0x40]);
//! ```

mod codegen;
mod ops;

pub use ops::*;
