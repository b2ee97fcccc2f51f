// SPDX-FileCopyrightText: 2025 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A thin but safe Rust layer around the gpioblink device command protocol.
//!
//! Commands are identified by ioctl style codes, `_IO(0xEF, nr)`, so they
//! cannot be mistaken for an unrelated command family.
//!
//! A request is the 32-bit command code, followed by a 32-bit signed
//! argument for those commands that take one.
//! Every request is answered with a 32-bit [`Status`].
//! All words are in host byte order as the client and device always share
//! a host.

pub(crate) mod common;

pub use common::{
    read_arg, read_code, read_status, write_request, write_status, Command, Error, Result,
    Status, ARG_SIZE, CODE_SIZE, DEFAULT_PATH, IOCTL_MAGIC, SET_PERIOD, START, STATUS_SIZE, STOP,
};

/// A blocking client for the device socket.
pub mod client;

pub use client::Client;
