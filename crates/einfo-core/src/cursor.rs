//! Cursor movement sequences used by the indicator placer.
//!
//! | Sequence | Bytes | Effect |
//! |----------|-------|--------|
//! | DECSC | `ESC 7` | save cursor position |
//! | DECRC | `ESC 8` | restore the saved position |
//! | CUP | `CSI row ; col H` | move to an absolute position |
//! | CHA | `CSI col G` | move to an absolute column on the current row |
//!
//! All coordinates are 1-based, matching what the terminal reports via CPR.

use std::io::{self, Write};

use crate::cpr::CursorPosition;

/// DEC cursor save (DECSC): `ESC 7`
pub const DEC_SAVE: &[u8] = b"\x1b7";

/// DEC cursor restore (DECRC): `ESC 8`
pub const DEC_RESTORE: &[u8] = b"\x1b8";

/// Save the cursor position with DECSC.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn save<W: Write + ?Sized>(writer: &mut W) -> io::Result<()> {
    writer.write_all(DEC_SAVE)
}

/// Return to the position saved by [`save`] with DECRC.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn restore<W: Write + ?Sized>(writer: &mut W) -> io::Result<()> {
    writer.write_all(DEC_RESTORE)
}

/// Move to `position` with CUP.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn move_to<W: Write + ?Sized>(writer: &mut W, position: CursorPosition) -> io::Result<()> {
    write!(writer, "\x1b[{};{}H", position.row, position.col)
}

/// Move to column `col` of the current row with CHA.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn move_to_column<W: Write + ?Sized>(writer: &mut W, col: u16) -> io::Result<()> {
    write!(writer, "\x1b[{}G", col.max(1))
}

/// Whether `bytes` contains any positioning sequence emitted by this module.
#[must_use]
pub fn contains_positioning(bytes: &[u8]) -> bool {
    bytes.windows(2).any(|w| w == DEC_SAVE || w == DEC_RESTORE)
        || bytes.windows(2).enumerate().any(|(i, w)| {
            w == b"\x1b["
                && bytes[i + 2..]
                    .iter()
                    .find(|b| !(b.is_ascii_digit() || **b == b';'))
                    .is_some_and(|&b| b == b'G' || b == b'H')
        })
}
