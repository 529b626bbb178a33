//! The terminal on standard input, readable with cancellation.
//!
//! Reads wait in `poll(2)` on two descriptors: the tty and the read end of a
//! socket pair used as a self-pipe. Cancelling the device's token writes one
//! byte into the pipe, as do the optional `SIGINT`/`SIGTERM` handlers installed
//! by [`StdinTty::with_signal_routing`]. Handlers only set a flag and poke the
//! pipe; the terminal is restored by the reader after `poll` returns.

use std::fs::File;
use std::io::{self, IsTerminal, Read, Write};
use std::os::fd::AsFd;
use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use einfo_core::cancel::{CancelReason, CancelToken};
use einfo_core::tty_session::{Recv, TtyDevice};
use einfo_core::CprError;
use nix::errno::Errno;
use nix::poll::{PollFd, PollFlags, PollTimeout};
use nix::sys::termios::{self, FlushArg, LocalFlags, SetArg, SpecialCharacterIndices, Termios};
use signal_hook::SigId;
use signal_hook::consts::signal::{SIGINT, SIGTERM};

/// A duplicate of stdin known to be a terminal.
#[derive(Debug)]
pub struct StdinTty {
    tty: File,
    wake_rx: UnixStream,
    wake_tx: UnixStream,
    token: CancelToken,
    interrupted: Arc<AtomicBool>,
    signal_ids: Vec<SigId>,
}

impl StdinTty {
    /// Duplicate stdin and prepare the wake pipe.
    ///
    /// # Errors
    ///
    /// - [`CprError::NotATerminal`] if stdin is not a terminal.
    /// - [`CprError::Open`] if stdin cannot be duplicated.
    /// - [`CprError::Timer`] if the wake pipe cannot be created.
    pub fn open() -> Result<Self, CprError> {
        let stdin = io::stdin();
        if !stdin.is_terminal() {
            return Err(CprError::NotATerminal);
        }
        let tty = File::from(stdin.as_fd().try_clone_to_owned().map_err(CprError::Open)?);

        let (wake_tx, wake_rx) = UnixStream::pair().map_err(CprError::Timer)?;
        wake_tx.set_nonblocking(true).map_err(CprError::Timer)?;
        wake_rx.set_nonblocking(true).map_err(CprError::Timer)?;
        let poke = wake_tx.try_clone().map_err(CprError::Timer)?;
        let token = CancelToken::with_waker(move || {
            let _ = (&poke).write(&[1]);
        });

        Ok(Self {
            tty,
            wake_rx,
            wake_tx,
            token,
            interrupted: Arc::new(AtomicBool::new(false)),
            signal_ids: Vec::new(),
        })
    }

    /// Let `SIGINT` and `SIGTERM` cancel a pending read.
    ///
    /// The handlers stay installed until the device is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`CprError::Timer`] if a handler cannot be registered.
    pub fn with_signal_routing(mut self) -> Result<Self, CprError> {
        for signal in [SIGINT, SIGTERM] {
            let flag = signal_hook::flag::register(signal, Arc::clone(&self.interrupted))
                .map_err(CprError::Timer)?;
            self.signal_ids.push(flag);
            let pipe = self.wake_tx.try_clone().map_err(CprError::Timer)?;
            let poke = signal_hook::low_level::pipe::register(signal, pipe)
                .map_err(CprError::Timer)?;
            self.signal_ids.push(poke);
        }
        tracing::trace!("signal routing installed for cpr query");
        Ok(self)
    }

    fn drain_wake_pipe(&self) {
        let mut sink = [0u8; 16];
        while matches!((&self.wake_rx).read(&mut sink), Ok(n) if n > 0) {}
    }

    /// Wait for input on the tty or the wake pipe.
    fn wait(&self) -> io::Result<(bool, bool)> {
        let mut fds = [
            PollFd::new(self.tty.as_fd(), PollFlags::POLLIN),
            PollFd::new(self.wake_rx.as_fd(), PollFlags::POLLIN),
        ];
        match nix::poll::poll(&mut fds, PollTimeout::NONE) {
            Ok(_) => {}
            Err(Errno::EINTR) => return Ok((false, false)),
            Err(err) => return Err(err.into()),
        }
        let ready = |fd: &PollFd<'_>| {
            fd.revents().is_some_and(|r| {
                r.intersects(PollFlags::POLLIN | PollFlags::POLLHUP | PollFlags::POLLERR)
            })
        };
        Ok((ready(&fds[0]), ready(&fds[1])))
    }
}

impl Drop for StdinTty {
    fn drop(&mut self) {
        for id in self.signal_ids.drain(..) {
            signal_hook::low_level::unregister(id);
        }
    }
}

impl TtyDevice for StdinTty {
    type Attributes = Termios;

    fn attributes(&self) -> io::Result<Termios> {
        termios::tcgetattr(&self.tty).map_err(io::Error::from)
    }

    fn set_attributes(&mut self, attrs: &Termios) -> io::Result<()> {
        termios::tcsetattr(&self.tty, SetArg::TCSANOW, attrs).map_err(io::Error::from)
    }

    fn query_mode(&self, saved: &Termios, inter_byte_deciseconds: u8) -> Termios {
        let mut raw = saved.clone();
        raw.local_flags.remove(
            LocalFlags::ECHO
                | LocalFlags::ECHOE
                | LocalFlags::ECHOK
                | LocalFlags::ECHONL
                | LocalFlags::ICANON,
        );
        raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
        raw.control_chars[SpecialCharacterIndices::VTIME as usize] = inter_byte_deciseconds;
        raw
    }

    fn discard_input(&mut self) -> io::Result<()> {
        termios::tcflush(&self.tty, FlushArg::TCIFLUSH).map_err(io::Error::from)
    }

    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.tty.write_all(bytes)?;
        self.tty.flush()
    }

    fn recv(&mut self, buf: &mut [u8], cancel: &CancelToken) -> io::Result<Recv> {
        loop {
            if self.interrupted.load(Ordering::Acquire) {
                cancel.cancel(CancelReason::Interrupt);
            }
            if cancel.is_cancelled() {
                return Ok(Recv::Cancelled);
            }

            let (tty_ready, woken) = self.wait()?;
            if woken {
                self.drain_wake_pipe();
                continue;
            }
            if !tty_ready {
                continue;
            }
            match self.tty.read(buf) {
                Ok(0) => return Ok(Recv::Closed),
                Ok(n) => return Ok(Recv::Data(n)),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }
    }

    fn cancel_token(&self) -> CancelToken {
        self.token.clone()
    }
}
