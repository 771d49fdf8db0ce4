//! Request/response exchange over the serial line.
//!
//! One exchange writes a request, then repeatedly sleeps, drains whatever the
//! port has buffered and feeds the accumulated bytes to the AT or OBEX
//! classifier until the verdict is terminal.

use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, trace};

use crate::events::{PacketDirection, SyncEvent, SyncObserver};
use crate::protocol::at::{self, AtCommand, AtError, AtOutcome, AtRequest};
use crate::protocol::frame::FrameError;
use crate::protocol::response::ResponseCode;
use crate::session::Timings;
use crate::state::{ObexVerdict, TransferOperation, classify};
use crate::transport::{SerialTransport, TransportError};

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("Device reported an OBEX command error: {code:?}")]
    Device { code: ResponseCode },

    #[error("Device answered ERROR to {command}")]
    AtCommand { command: AtCommand },

    #[error("Malformed OBEX frame: declared {declared} bytes, received {actual}")]
    MalformedFrame { declared: usize, actual: usize },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Encoding(#[from] AtError),

    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// How long to sleep between polls, and whether an empty poll is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitPolicy {
    /// Default cadence for the request class; empty polls are skipped.
    #[default]
    Poll,
    /// Fixed delay; the buffer is classified on every turn, even when empty.
    Settle(Duration),
}

/// A request ready for the wire.
#[derive(Debug, Clone)]
pub enum Request {
    At(AtRequest),
    Obex {
        frame: Vec<u8>,
        operation: TransferOperation,
    },
}

impl Request {
    pub fn obex(frame: Vec<u8>, operation: TransferOperation) -> Self {
        Request::Obex { frame, operation }
    }

    fn bytes(&self) -> &[u8] {
        match self {
            Request::At(req) => req.bytes(),
            Request::Obex { frame, .. } => frame,
        }
    }
}

/// Terminal outcome of a successful exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// An upload chunk was accepted.
    Acknowledged,
    /// AT payload, or the concatenated OBEX body fragments.
    Complete(Vec<u8>),
}

impl Completion {
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Completion::Acknowledged => Vec::new(),
            Completion::Complete(bytes) => bytes,
        }
    }
}

/// Drives exchanges over a borrowed transport.
pub struct Transceiver<'a, T: SerialTransport, O: SyncObserver> {
    transport: ObservableTransport<'a, T, O>,
    timings: &'a Timings,
}

impl<'a, T: SerialTransport, O: SyncObserver> Transceiver<'a, T, O> {
    pub fn new(transport: &'a T, observer: &'a O, timings: &'a Timings) -> Self {
        Self {
            transport: ObservableTransport {
                inner: transport,
                observer,
            },
            timings,
        }
    }

    pub fn timings(&self) -> &Timings {
        self.timings
    }

    /// Forward an event to the session observer.
    pub fn emit(&self, event: SyncEvent) {
        self.transport.observer.on_event(&event);
    }

    /// Send an AT command and return its payload.
    pub fn at(&self, request: AtRequest, wait: WaitPolicy) -> Result<Vec<u8>, ExchangeError> {
        self.exchange(&Request::At(request), wait)
            .map(Completion::into_bytes)
    }

    /// Format and send a command that takes no arguments.
    pub fn command(&self, command: AtCommand, wait: WaitPolicy) -> Result<Vec<u8>, ExchangeError> {
        self.at(AtRequest::new(command)?, wait)
    }

    /// Send an OBEX request using the default poll cadence.
    pub fn obex(
        &self,
        frame: Vec<u8>,
        operation: TransferOperation,
    ) -> Result<Completion, ExchangeError> {
        self.exchange(&Request::obex(frame, operation), WaitPolicy::Poll)
    }

    /// Run one request/response exchange to a terminal verdict.
    pub fn exchange(&self, request: &Request, wait: WaitPolicy) -> Result<Completion, ExchangeError> {
        let delay = match wait {
            WaitPolicy::Settle(d) => d,
            WaitPolicy::Poll => match request {
                Request::At(_) => self.timings.after_invoke(),
                Request::Obex { .. } => self.timings.obex_poll(),
            },
        };

        if let Request::At(req) = request {
            debug!(command = ?req.command(), "AT exchange");
        }
        self.transport.write(request.bytes())?;

        let mut buffer: Vec<u8> = Vec::new();
        let mut results: Vec<Vec<u8>> = Vec::new();

        loop {
            thread::sleep(delay);

            let available = self.transport.bytes_available()?;
            if available == 0 && wait == WaitPolicy::Poll {
                continue;
            }
            if available > 0 {
                buffer.extend(self.transport.read(available)?);
            }

            match request {
                Request::At(req) => match at::classify(&buffer, req) {
                    AtOutcome::Incomplete => {
                        trace!(buffered = buffer.len(), "Incomplete AT response");
                    }
                    AtOutcome::Success(payload) => return Ok(Completion::Complete(payload)),
                    AtOutcome::Error => {
                        return Err(ExchangeError::AtCommand {
                            command: req.command(),
                        });
                    }
                },
                Request::Obex { operation, .. } => {
                    match classify(&buffer, *operation, &mut results) {
                        ObexVerdict::Incomplete => {}
                        ObexVerdict::Malformed { declared, actual } => {
                            return Err(ExchangeError::MalformedFrame { declared, actual });
                        }
                        ObexVerdict::DeviceError(code) => {
                            return Err(ExchangeError::Device { code });
                        }
                        ObexVerdict::ContinueExchange { follow_up } => {
                            self.transport.write(&follow_up)?;
                            buffer.clear();
                        }
                        ObexVerdict::ChunkAcknowledged => return Ok(Completion::Acknowledged),
                        ObexVerdict::Complete => {
                            return Ok(Completion::Complete(results.concat()));
                        }
                    }
                }
            }
        }
    }
}

/// Transport wrapper that emits packet events.
struct ObservableTransport<'a, T: SerialTransport, O: SyncObserver> {
    inner: &'a T,
    observer: &'a O,
}

impl<'a, T: SerialTransport, O: SyncObserver> SerialTransport for ObservableTransport<'a, T, O> {
    fn write(&self, data: &[u8]) -> Result<usize, TransportError> {
        let res = self.inner.write(data);
        if res.is_ok() {
            self.observer.on_event(&SyncEvent::Packet {
                direction: PacketDirection::Tx,
                data: data.to_vec(),
            });
        }
        res
    }

    fn bytes_available(&self) -> Result<usize, TransportError> {
        self.inner.bytes_available()
    }

    fn read(&self, len: usize) -> Result<Vec<u8>, TransportError> {
        let res = self.inner.read(len);
        if let Ok(data) = &res
            && !data.is_empty()
        {
            self.observer.on_event(&SyncEvent::Packet {
                direction: PacketDirection::Rx,
                data: data.clone(),
            });
        }
        res
    }

    fn name(&self) -> String {
        self.inner.name()
    }
}
