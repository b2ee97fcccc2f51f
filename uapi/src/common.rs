// SPDX-FileCopyrightText: 2025 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::fmt;
use std::io::{self, Read, Write};

/// The socket path a device registers at unless configured otherwise.
pub const DEFAULT_PATH: &str = "/run/gpioblink/led.sock";

/// The ioctl type shared by all gpioblink commands.
pub const IOCTL_MAGIC: u8 = 0xEF;

#[repr(u8)]
enum Ioctl {
    Stop = 1,
    Start = 2,
    SetPeriod = 3,
}

/// Stop toggling the LED.
pub const STOP: u32 = nix::request_code_none!(IOCTL_MAGIC, Ioctl::Stop as u8) as u32;

/// Resume toggling the LED at the current period.
pub const START: u32 = nix::request_code_none!(IOCTL_MAGIC, Ioctl::Start as u8) as u32;

/// Set the toggle period, in milliseconds, and resume toggling.
pub const SET_PERIOD: u32 = nix::request_code_none!(IOCTL_MAGIC, Ioctl::SetPeriod as u8) as u32;

/// The number of bytes in a command code.
pub const CODE_SIZE: usize = 4;

/// The number of bytes in a command argument.
pub const ARG_SIZE: usize = 4;

/// The number of bytes in a reply.
pub const STATUS_SIZE: usize = 4;

/// The commands understood by the device.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Command {
    /// Cancel the toggle timer.
    Stop,
    /// Arm the toggle timer with the current period.
    Start,
    /// Store a new period and rearm the toggle timer with it.
    SetPeriod,
}

impl Command {
    /// The code identifying the command on the wire.
    pub const fn code(self) -> u32 {
        match self {
            Command::Stop => STOP,
            Command::Start => START,
            Command::SetPeriod => SET_PERIOD,
        }
    }

    /// The number of argument bytes following the command code.
    pub const fn arg_size(self) -> usize {
        match self {
            Command::SetPeriod => ARG_SIZE,
            _ => 0,
        }
    }

    /// Identify the command for a code, if it is one of ours.
    pub fn from_code(code: u32) -> Option<Command> {
        match code {
            STOP => Some(Command::Stop),
            START => Some(Command::Start),
            SET_PERIOD => Some(Command::SetPeriod),
            _ => None,
        }
    }
}

impl TryFrom<u32> for Command {
    type Error = Error;

    fn try_from(code: u32) -> std::result::Result<Self, Self::Error> {
        Command::from_code(code).ok_or(Error::UnknownCommand(code))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::Stop => "stop",
            Command::Start => "start",
            Command::SetPeriod => "set_period",
        };
        write!(f, "{}", name)
    }
}

/// The reply to a request.
///
/// Zero indicates success, otherwise the negated errno describing the failure.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Status(i32);

impl Status {
    /// The request succeeded.
    pub const OK: Status = Status(0);

    /// A failure described by the given errno.
    pub fn from_errno(errno: i32) -> Status {
        Status(-errno.abs())
    }

    /// The raw status word.
    pub fn raw(&self) -> i32 {
        self.0
    }

    /// The errno describing the failure, or None if the request succeeded.
    pub fn errno(&self) -> Option<i32> {
        match self.0 {
            0 => None,
            s => Some(-s),
        }
    }

    /// Convert the status into the outcome of the request.
    pub fn into_result(self) -> Result<()> {
        match self.errno() {
            None => Ok(()),
            Some(errno) => Err(Error::Device(io::Error::from_raw_os_error(errno))),
        }
    }
}

impl From<i32> for Status {
    fn from(raw: i32) -> Self {
        Status(raw)
    }
}

fn read_word<R: Read>(r: &mut R) -> io::Result<[u8; 4]> {
    let mut buf = [0; 4];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

/// Read a command code.
pub fn read_code<R: Read>(r: &mut R) -> Result<u32> {
    Ok(u32::from_ne_bytes(read_word(r)?))
}

/// Read a command argument.
pub fn read_arg<R: Read>(r: &mut R) -> Result<i32> {
    Ok(i32::from_ne_bytes(read_word(r)?))
}

/// Read the reply to a request.
pub fn read_status<R: Read>(r: &mut R) -> Result<Status> {
    Ok(Status(i32::from_ne_bytes(read_word(r)?)))
}

/// Write a request.
///
/// The code and argument are sent as one write so a request is never split
/// across writes by the client.
pub fn write_request<W: Write>(w: &mut W, code: u32, arg: Option<i32>) -> Result<()> {
    let mut buf = [0; CODE_SIZE + ARG_SIZE];
    buf[..CODE_SIZE].copy_from_slice(&code.to_ne_bytes());
    let len = match arg {
        Some(arg) => {
            buf[CODE_SIZE..].copy_from_slice(&arg.to_ne_bytes());
            CODE_SIZE + ARG_SIZE
        }
        None => CODE_SIZE,
    };
    w.write_all(&buf[..len])?;
    Ok(())
}

/// Write the reply to a request.
pub fn write_status<W: Write>(w: &mut W, status: Status) -> Result<()> {
    w.write_all(&status.0.to_ne_bytes())?;
    Ok(())
}

/// The result returned by [`gpioblink_uapi`] functions.
///
/// [`gpioblink_uapi`]: crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by [`gpioblink_uapi`] functions.
///
/// [`gpioblink_uapi`]: crate
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An error returned from an underlying system call.
    #[error(transparent)]
    Os(#[from] io::Error),

    /// The code does not identify a gpioblink command.
    #[error("unknown command code {0:#x}")]
    UnknownCommand(u32),

    /// The device rejected the request.
    #[error("device returned: {0}")]
    Device(#[source] io::Error),
}

impl Error {
    /// The errno best describing the error.
    pub fn errno(&self) -> i32 {
        match self {
            Error::Os(e) | Error::Device(e) => e.raw_os_error().unwrap_or(libc::EIO),
            Error::UnknownCommand(_) => libc::ENOTTY,
        }
    }
}
