//! Raw-mode session guard for cursor position queries.
//!
//! # Lifecycle Guarantees
//!
//! 1. **Attributes are saved before anything changes** - [`RawTtySession::enter`]
//!    reads the current attributes first and fails without touching the
//!    terminal if it cannot.
//!
//! 2. **Restore happens exactly once** - the saved attributes are taken out of
//!    the session when restored, so an explicit [`RawTtySession::restore`]
//!    followed by `Drop` reapplies them only once. A failed restore is not
//!    retried.
//!
//! 3. **No leaked state on any exit path** - success, parse failure, timeout,
//!    interrupt, `?` propagation and panic unwinding all pass through `Drop`.
//!
//! # Query Mode
//!
//! | Setting | Value |
//! |---------|-------|
//! | `ECHO`, `ECHOE`, `ECHOK`, `ECHONL` | cleared |
//! | `ICANON` | cleared |
//! | `VMIN` | 1 |
//! | `VTIME` | inter-byte timeout in deciseconds |
//!
//! `read` therefore blocks until one byte arrives, then returns after the
//! inter-byte silence.

use std::fmt;
use std::io;

use crate::cancel::CancelToken;
use crate::error::{CprError, SettingsAction};

/// Outcome of a single cancellable read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recv {
    /// `n` bytes were read into the buffer.
    Data(usize),
    /// The cancel token fired before data arrived.
    Cancelled,
    /// The terminal reported end of file.
    Closed,
}

/// A terminal that can be switched into query mode and read with cancellation.
pub trait TtyDevice {
    /// Saved terminal attributes.
    type Attributes: Clone + fmt::Debug;

    /// Read the current attributes.
    fn attributes(&self) -> io::Result<Self::Attributes>;

    /// Apply attributes immediately.
    fn set_attributes(&mut self, attrs: &Self::Attributes) -> io::Result<()>;

    /// Derive query-mode attributes from `saved`.
    fn query_mode(&self, saved: &Self::Attributes, inter_byte_deciseconds: u8)
    -> Self::Attributes;

    /// Drop input received but not yet read.
    fn discard_input(&mut self) -> io::Result<()>;

    /// Write and flush `bytes`.
    fn send(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Block until data arrives or `cancel` fires.
    fn recv(&mut self, buf: &mut [u8], cancel: &CancelToken) -> io::Result<Recv>;

    /// A token whose cancellation interrupts a blocked [`recv`](Self::recv).
    fn cancel_token(&self) -> CancelToken {
        CancelToken::new()
    }
}

/// A terminal switched into query mode, restored on drop.
pub struct RawTtySession<'d, D: TtyDevice> {
    device: &'d mut D,
    saved: Option<D::Attributes>,
}

impl<D: TtyDevice> fmt::Debug for RawTtySession<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawTtySession")
            .field("saved", &self.saved)
            .finish_non_exhaustive()
    }
}

impl<'d, D: TtyDevice> RawTtySession<'d, D> {
    /// Save the attributes of `device` and switch it into query mode.
    ///
    /// # Errors
    ///
    /// Returns [`CprError::TerminalSettings`] if saving or applying fails. When
    /// applying fails the saved attributes are reapplied before returning.
    pub fn enter(device: &'d mut D, inter_byte_deciseconds: u8) -> Result<Self, CprError> {
        let saved = device
            .attributes()
            .map_err(|err| CprError::settings(SettingsAction::Save, err))?;
        let raw = device.query_mode(&saved, inter_byte_deciseconds);
        let mut session = Self {
            device,
            saved: Some(saved),
        };
        session
            .device
            .set_attributes(&raw)
            .map_err(|err| CprError::settings(SettingsAction::Apply, err))?;
        #[cfg(feature = "tracing")]
        tracing::trace!(inter_byte_deciseconds, "tty query mode entered");
        Ok(session)
    }

    /// The device in query mode.
    pub fn device(&mut self) -> &mut D {
        &mut *self.device
    }

    /// Whether the saved attributes have already been reapplied.
    #[must_use]
    pub fn is_restored(&self) -> bool {
        self.saved.is_none()
    }

    /// Reapply the saved attributes. Later calls do nothing.
    ///
    /// # Errors
    ///
    /// Returns [`CprError::TerminalSettings`] if the attributes cannot be
    /// reapplied. The attempt is not repeated on drop.
    pub fn restore(&mut self) -> Result<(), CprError> {
        let Some(saved) = self.saved.take() else {
            return Ok(());
        };
        self.device
            .set_attributes(&saved)
            .map_err(|err| CprError::settings(SettingsAction::Restore, err))?;
        #[cfg(feature = "tracing")]
        tracing::trace!("tty attributes restored");
        Ok(())
    }
}

impl<D: TtyDevice> Drop for RawTtySession<'_, D> {
    fn drop(&mut self) {
        if let Err(_err) = self.restore() {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %_err, "tty restore failed during drop");
        }
    }
}
