//! Scripted terminals for unit tests.

use std::collections::VecDeque;
use std::io;
use std::thread;
use std::time::{Duration, Instant};

use crate::cancel::CancelToken;
use crate::capability::{Dimensions, TerminalProbe};
use crate::cpr::CursorPosition;
use crate::error::CprError;
use crate::tty_session::{Recv, TtyDevice};

/// Minimal stand-in for termios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeAttrs {
    pub canonical: bool,
    pub echo: bool,
    pub vtime: u8,
}

impl FakeAttrs {
    pub fn cooked() -> Self {
        Self {
            canonical: true,
            echo: true,
            vtime: 0,
        }
    }

    pub fn query(vtime: u8) -> Self {
        Self {
            canonical: false,
            echo: false,
            vtime,
        }
    }
}

/// One scripted answer to `recv`.
#[derive(Debug, Clone)]
pub enum Step {
    Bytes(Vec<u8>),
    Close,
    Fail(io::ErrorKind),
}

/// A terminal that replays a script; once the script runs out it stays silent
/// until the cancel token fires.
#[derive(Debug)]
pub struct FakeTty {
    pub current: FakeAttrs,
    pub applied: Vec<FakeAttrs>,
    pub restore_attempts: usize,
    pub sent: Vec<u8>,
    pub discards: usize,
    pub reads: usize,
    pub fail_get: bool,
    pub fail_apply_query: bool,
    pub fail_restore: bool,
    pub fail_flush: bool,
    pub token: CancelToken,
    script: VecDeque<Step>,
}

impl FakeTty {
    pub fn silent() -> Self {
        Self::scripted(Vec::new())
    }

    pub fn scripted(steps: Vec<Step>) -> Self {
        Self {
            current: FakeAttrs::cooked(),
            applied: Vec::new(),
            restore_attempts: 0,
            sent: Vec::new(),
            discards: 0,
            reads: 0,
            fail_get: false,
            fail_apply_query: false,
            fail_restore: false,
            fail_flush: false,
            token: CancelToken::new(),
            script: steps.into(),
        }
    }

    pub fn replying(chunks: &[&[u8]]) -> Self {
        Self::scripted(chunks.iter().map(|c| Step::Bytes(c.to_vec())).collect())
    }

    /// Successful reapplications of the original attributes.
    pub fn restores(&self) -> usize {
        self.applied.iter().filter(|a| a.canonical).count()
    }
}

impl TtyDevice for FakeTty {
    type Attributes = FakeAttrs;

    fn attributes(&self) -> io::Result<FakeAttrs> {
        if self.fail_get {
            return Err(io::Error::other("tcgetattr failed"));
        }
        Ok(self.current.clone())
    }

    fn set_attributes(&mut self, attrs: &FakeAttrs) -> io::Result<()> {
        if attrs.canonical {
            self.restore_attempts += 1;
            if self.fail_restore {
                return Err(io::Error::other("tcsetattr failed"));
            }
        } else if self.fail_apply_query {
            return Err(io::Error::other("tcsetattr failed"));
        }
        self.applied.push(attrs.clone());
        self.current = attrs.clone();
        Ok(())
    }

    fn query_mode(&self, _saved: &FakeAttrs, inter_byte_deciseconds: u8) -> FakeAttrs {
        FakeAttrs::query(inter_byte_deciseconds)
    }

    fn discard_input(&mut self) -> io::Result<()> {
        if self.fail_flush {
            return Err(io::Error::other("tcflush failed"));
        }
        self.discards += 1;
        Ok(())
    }

    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.sent.extend_from_slice(bytes);
        Ok(())
    }

    fn recv(&mut self, buf: &mut [u8], cancel: &CancelToken) -> io::Result<Recv> {
        self.reads += 1;
        if cancel.is_cancelled() {
            return Ok(Recv::Cancelled);
        }
        match self.script.pop_front() {
            Some(Step::Bytes(mut bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                if n < bytes.len() {
                    self.script.push_front(Step::Bytes(bytes.split_off(n)));
                }
                Ok(Recv::Data(n))
            }
            Some(Step::Close) => Ok(Recv::Closed),
            Some(Step::Fail(kind)) => Err(io::Error::from(kind)),
            None => {
                let start = Instant::now();
                while !cancel.is_cancelled() {
                    if start.elapsed() > Duration::from_secs(5) {
                        return Ok(Recv::Closed);
                    }
                    thread::sleep(Duration::from_millis(1));
                }
                Ok(Recv::Cancelled)
            }
        }
    }

    fn cancel_token(&self) -> CancelToken {
        self.token.clone()
    }
}

/// A probe with settable answers that counts how often it is asked.
#[derive(Debug, Default)]
pub struct ScriptedProbe {
    pub terminal: bool,
    pub stderr_terminal: bool,
    pub dimensions: Option<Dimensions>,
    pub cursors: VecDeque<CursorPosition>,
    pub dimension_calls: usize,
    pub cursor_calls: usize,
}

impl ScriptedProbe {
    pub fn not_a_terminal() -> Self {
        Self::default()
    }

    pub fn smart(rows: u16, cols: u16) -> Self {
        Self {
            terminal: true,
            stderr_terminal: true,
            dimensions: Dimensions::new(rows, cols),
            ..Self::default()
        }
    }

    pub fn with_cursors(mut self, cursors: &[(u16, u16)]) -> Self {
        self.cursors = cursors
            .iter()
            .filter_map(|&(row, col)| CursorPosition::new(row, col))
            .collect();
        self
    }
}

impl TerminalProbe for ScriptedProbe {
    fn is_terminal(&self) -> bool {
        self.terminal
    }

    fn is_stderr_terminal(&self) -> bool {
        self.stderr_terminal
    }

    fn dimensions(&mut self) -> io::Result<Dimensions> {
        self.dimension_calls += 1;
        self.dimensions
            .ok_or_else(|| io::Error::other("window size unavailable"))
    }

    fn cursor_position(&mut self) -> Result<CursorPosition, CprError> {
        self.cursor_calls += 1;
        self.cursors.pop_front().ok_or(CprError::NoReply)
    }
}
