//! # Code Generation
//!
//! Converts IR programs to ESC/POS bytes.

use super::ops::{Op, Program};
use crate::protocol::{commands, encoding, text};

impl Program {
    /// Compile the IR program to ESC/POS bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();

        for op in &self.ops {
            match op {
                // ===== Printer Control =====
                Op::Init => {
                    out.extend(commands::init());
                    out.extend(commands::code_page(commands::CODE_PAGE_WPC1252));
                }
                Op::Cut { feed } => {
                    if *feed > 0 {
                        out.extend(commands::cut_feed(*feed));
                    } else {
                        out.extend(commands::cut_full());
                    }
                }
                Op::Feed { lines } => {
                    out.extend(commands::feed_lines(*lines));
                }
                Op::DrawerKick(pin) => {
                    out.extend(commands::drawer_kick(*pin));
                }

                // ===== Style Changes =====
                Op::SetAlign(align) => {
                    out.extend(text::align(*align));
                }
                Op::SetBold(enabled) => {
                    if *enabled {
                        out.extend(text::bold_on());
                    } else {
                        out.extend(text::bold_off());
                    }
                }
                Op::SetFont(size) => {
                    out.extend(text::font_size(*size));
                }
                Op::ResetStyle => {
                    out.extend(text::TextStyle::reset());
                }

                // ===== Content =====
                Op::Text(s) => {
                    out.extend(encoding::encode(s));
                }
                Op::Newline => {
                    out.extend(commands::line_feed());
                }
            }
        }

        out
    }
}
