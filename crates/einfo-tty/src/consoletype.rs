//! Classify the terminal on stdin as a virtual console, serial line or pty.
//!
//! The device name from `ttyname(3)` decides first:
//!
//! | Name (after `/dev/`) | Class |
//! |----------------------|-------|
//! | `ttyS*`, `cuaa*` | serial |
//! | `pts/*`, `ttyp*` | pty |
//! | other `tty*` | vt |
//!
//! When the name is unavailable or unrecognised, Linux falls back to the device
//! number: majors 3 and 136 through 143 are ptys, the kernel console devices
//! are vts, and any other character device is treated as serial.

use std::fmt;

/// Terminal class, with the program's exit status as discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleType {
    Vt = 0,
    Serial = 1,
    Pty = 2,
    Unknown = 3,
}

impl ConsoleType {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Vt => "vt",
            Self::Serial => "serial",
            Self::Pty => "pty",
            Self::Unknown => "unknown",
        }
    }

    /// Exit status reported for this class.
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ConsoleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify a tty path such as `/dev/pts/3`.
#[must_use]
pub fn classify_name(path: &str) -> ConsoleType {
    let name = path.strip_prefix("/dev/").unwrap_or(path);
    if name.starts_with("ttyS") || name.starts_with("cuaa") {
        ConsoleType::Serial
    } else if name.starts_with("pts/") || name.starts_with("ttyp") {
        ConsoleType::Pty
    } else if name.starts_with("tty") {
        ConsoleType::Vt
    } else {
        ConsoleType::Unknown
    }
}

/// Classify a character device by its Linux major and minor numbers.
#[must_use]
pub fn classify_device(major: u32, minor: u32) -> ConsoleType {
    match (major, minor) {
        (3 | 136..=143, _) => ConsoleType::Pty,
        (4, 0..=63) | (5, 1) => ConsoleType::Vt,
        _ => ConsoleType::Serial,
    }
}

/// Classify standard input.
#[cfg(unix)]
#[must_use]
pub fn detect() -> ConsoleType {
    let stdin = std::io::stdin();
    let by_name = nix::unistd::ttyname(&stdin)
        .map(|path| classify_name(&path.to_string_lossy()))
        .unwrap_or(ConsoleType::Unknown);
    tracing::debug!(class = by_name.name(), "classified stdin by name");
    if by_name != ConsoleType::Unknown {
        return by_name;
    }
    detect_by_device()
}

#[cfg(target_os = "linux")]
fn detect_by_device() -> ConsoleType {
    use std::os::fd::AsFd;
    use std::os::unix::fs::{FileTypeExt, MetadataExt};

    let metadata = std::io::stdin()
        .as_fd()
        .try_clone_to_owned()
        .map(std::fs::File::from)
        .and_then(|file| file.metadata());
    match metadata {
        Ok(meta) if meta.file_type().is_char_device() => {
            let rdev = meta.rdev();
            let class = classify_device(rustix::fs::major(rdev), rustix::fs::minor(rdev));
            tracing::debug!(rdev, class = class.name(), "classified stdin by device number");
            class
        }
        _ => ConsoleType::Unknown,
    }
}

#[cfg(all(unix, not(target_os = "linux")))]
fn detect_by_device() -> ConsoleType {
    ConsoleType::Unknown
}
