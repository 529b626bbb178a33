//! Message and indicator colors.
//!
//! Colors are bold foreground tones emitted through crossterm. When color is
//! disabled the text is written verbatim, so plain output never carries escape
//! bytes.

use std::io::{self, Write};

use crossterm::queue;
use crossterm::style::{Attribute, Color, Print, SetAttribute, SetForegroundColor};

/// Semantic color roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Informational star, `ok` status.
    Good,
    /// Warning star.
    Warn,
    /// Error star, `!!` status.
    Bad,
    /// Indicator brackets.
    Bracket,
}

impl Tone {
    const fn color(self) -> Color {
        match self {
            Self::Good => Color::Green,
            Self::Warn => Color::Yellow,
            Self::Bad => Color::Red,
            Self::Bracket => Color::Blue,
        }
    }
}

/// Writes text in a [`Tone`] when enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    #[must_use]
    pub const fn plain() -> Self {
        Self::new(false)
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Write `text` in `tone`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the output fails.
    pub fn paint<W: Write>(&self, writer: &mut W, tone: Tone, text: &str) -> io::Result<()> {
        if !self.enabled {
            return writer.write_all(text.as_bytes());
        }
        queue!(
            writer,
            SetAttribute(Attribute::Bold),
            SetForegroundColor(tone.color()),
            Print(text),
            SetAttribute(Attribute::Reset)
        )
    }
}
