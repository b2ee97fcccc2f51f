// SPDX-FileCopyrightText: 2025 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::command::CommandProcessor;
use crate::uapi::{self, Command, Status, CODE_SIZE};
use crate::Result;
use embedded_hal::digital::OutputPin;
use mio::event::Event;
use mio::net::{UnixListener, UnixStream};
use mio::{Events, Interest, Poll, Token, Waker};
use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const LISTENER: Token = Token(0);
const WAKER: Token = Token(1);
const FIRST_CLIENT: usize = 2;

// reading from a connection stops while either buffer is full, leaving
// further requests queued in the socket
const RX_LIMIT: usize = 4096;
const TX_LIMIT: usize = 4096;

/// Serves requests from any number of client connections, one request at a
/// time, until shut down.
#[derive(Debug)]
pub struct Server {
    poll: Poll,
    waker: Arc<Waker>,
    stopping: Arc<AtomicBool>,
    conns: HashMap<Token, Connection>,
    next_token: usize,
}

/// Stops a [`Server`] from another thread, such as a signal handler.
#[derive(Clone, Debug)]
pub struct ShutdownHandle {
    waker: Arc<Waker>,
    stopping: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Request the server return from [`Server::serve`].
    ///
    /// Requests already received are completed first.
    pub fn shutdown(&self) -> Result<()> {
        self.stopping.store(true, Ordering::Release);
        self.waker.wake()?;
        Ok(())
    }
}

impl Server {
    /// Create a server accepting connections on the `listener`.
    pub fn new(listener: &mut UnixListener) -> Result<Server> {
        let poll = Poll::new()?;
        poll.registry()
            .register(listener, LISTENER, Interest::READABLE)?;
        let waker = Arc::new(Waker::new(poll.registry(), WAKER)?);
        Ok(Server {
            poll,
            waker,
            stopping: Arc::new(AtomicBool::new(false)),
            conns: HashMap::new(),
            next_token: FIRST_CLIENT,
        })
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            waker: self.waker.clone(),
            stopping: self.stopping.clone(),
        }
    }

    /// Serve requests until shut down via a [`ShutdownHandle`].
    ///
    /// Errors on individual connections drop the connection and do not
    /// stop the server.
    pub fn serve<P: OutputPin>(
        &mut self,
        listener: &UnixListener,
        processor: &CommandProcessor<P>,
    ) -> Result<()> {
        let mut events = Events::with_capacity(64);
        loop {
            if self.stopping.load(Ordering::Acquire) {
                log::info!("shutting down with {} connections", self.conns.len());
                self.conns.clear();
                return Ok(());
            }
            if let Err(e) = self.poll.poll(&mut events, None) {
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(e.into());
            }
            for event in &events {
                match event.token() {
                    LISTENER => self.accept(listener),
                    WAKER => {}
                    token => self.handle(token, event, processor),
                }
            }
        }
    }

    fn accept(&mut self, listener: &UnixListener) {
        loop {
            match listener.accept() {
                Ok((mut stream, _)) => {
                    let token = Token(self.next_token);
                    self.next_token += 1;
                    if let Err(e) = self.poll.registry().register(
                        &mut stream,
                        token,
                        Interest::READABLE | Interest::WRITABLE,
                    ) {
                        log::warn!("failed to register connection: {}", e);
                        continue;
                    }
                    log::debug!("client {} connected", token.0);
                    self.conns.insert(token, Connection::new(stream));
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    log::warn!("failed to accept connection: {}", e);
                    return;
                }
            }
        }
    }

    fn handle<P: OutputPin>(
        &mut self,
        token: Token,
        event: &Event,
        processor: &CommandProcessor<P>,
    ) {
        let Some(conn) = self.conns.get_mut(&token) else {
            return;
        };
        if event.is_readable() || event.is_read_closed() {
            conn.readable = true;
        }
        let res = conn.pump(processor);
        if let Err(e) = &res {
            log::debug!("client {} failed: {}", token.0, e);
        }
        if res.is_err() || conn.is_done() {
            if let Some(mut conn) = self.conns.remove(&token) {
                _ = self.poll.registry().deregister(&mut conn.stream);
            }
            log::debug!("client {} disconnected", token.0);
        }
    }
}

#[derive(Debug)]
struct Connection {
    stream: UnixStream,
    rx: Vec<u8>,
    tx: Vec<u8>,
    // data may be waiting in the socket
    readable: bool,
    eof: bool,
}

impl Connection {
    fn new(stream: UnixStream) -> Connection {
        Connection {
            stream,
            rx: Vec::new(),
            tx: Vec::new(),
            readable: false,
            eof: false,
        }
    }

    // serve requests until blocked on the socket or the peer
    fn pump<P: OutputPin>(&mut self, processor: &CommandProcessor<P>) -> io::Result<()> {
        loop {
            self.dispatch(processor);
            self.flush()?;
            if self.tx.len() >= TX_LIMIT {
                // resumed when the peer reads and the socket is writable
                return Ok(());
            }
            if self.eof || !self.readable {
                return Ok(());
            }
            self.fill()?;
        }
    }

    // read until rx is full or the socket is drained
    fn fill(&mut self) -> io::Result<()> {
        let mut buf = [0; 256];
        while self.rx.len() < RX_LIMIT {
            let len = buf.len().min(RX_LIMIT - self.rx.len());
            match self.stream.read(&mut buf[..len]) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(());
                }
                Ok(n) => self.rx.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    self.readable = false;
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    // process the complete requests in rx, and any truncated by eof,
    // until tx is full
    fn dispatch<P: OutputPin>(&mut self, processor: &CommandProcessor<P>) {
        let mut consumed = 0;
        while consumed < self.rx.len() && self.tx.len() < TX_LIMIT {
            let mut frame = &self.rx[consumed..];
            let Ok(code) = uapi::read_code(&mut frame) else {
                if self.eof {
                    self.tx
                        .extend_from_slice(&Status::from_errno(libc::EIO).raw().to_ne_bytes());
                    consumed = self.rx.len();
                }
                break;
            };
            let arg_size = Command::from_code(code).map_or(0, Command::arg_size);
            if frame.len() < arg_size && !self.eof {
                break;
            }
            let arg_size = arg_size.min(frame.len());
            let status = processor.reply(code, &mut &frame[..arg_size]);
            self.tx.extend_from_slice(&status.raw().to_ne_bytes());
            consumed += CODE_SIZE + arg_size;
        }
        self.rx.drain(..consumed);
    }

    fn flush(&mut self) -> io::Result<()> {
        while !self.tx.is_empty() {
            match self.stream.write(&self.tx) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => {
                    self.tx.drain(..n);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn is_done(&self) -> bool {
        self.eof && self.rx.is_empty() && self.tx.is_empty()
    }
}
