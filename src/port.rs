// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Component G: the port contract every transport implements, plus the
// channel factory that dispatches to a concrete transport by kind.

use crate::error::{IpcError, Result};
use crate::metadata::MetaData;

/// The send half of a channel (§4.1).
pub trait SendPort: Send {
    /// Idempotent; must be called before any `send`.
    fn start(&mut self) -> Result<()>;

    /// Transfer one message. Blocks if the transport is full. Fails with
    /// `PayloadTooLarge` if `elsize*total_size > nbytes`.
    fn send(&mut self, meta: &MetaData, payload: &[u8]) -> Result<()>;

    /// Idempotent; marks this port closed.
    fn join(&mut self) -> Result<()>;
}

/// The receive half of a channel (§4.1).
pub trait RecvPort: Send {
    /// Idempotent; must be called before any `recv`/`peek`/`probe`.
    fn start(&mut self) -> Result<()>;

    /// Blocks until a message is available or the port is joined.
    fn recv(&mut self) -> Result<(MetaData, Vec<u8>)>;

    /// Returns a copy of the next message without consuming it.
    fn peek(&mut self) -> Result<(MetaData, Vec<u8>)>;

    /// `true` iff a `recv` would not block at this instant. Advisory.
    fn probe(&self) -> Result<bool>;

    /// Idempotent; marks this port closed. Pending `recv`s return or error
    /// within a bounded time.
    fn join(&mut self) -> Result<()>;
}

/// Transport kind selectable through the channel factory (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Shmem,
    PubSub(PubSubTransport),
    Rpc,
}

/// The concrete middleware/socket family backing a publish/subscribe
/// channel (§4.4). `Shm` stays in-host; `Udpv4`/`Tcpv6` are real socket
/// transports reusing the §3 metadata wire format for framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PubSubTransport {
    Shm,
    Udpv4,
    Tcpv6,
}

/// Endpoint names and transport-specific options passed to `GetChannel`.
#[derive(Debug, Clone)]
pub struct ChannelOpts {
    pub src_name: String,
    pub dst_name: String,
    /// `host:port` for `Udpv4`/`Tcpv6`; ignored for other kinds.
    pub bind_addr: Option<String>,
}

impl ChannelOpts {
    pub fn new(src_name: impl Into<String>, dst_name: impl Into<String>) -> Self {
        Self {
            src_name: src_name.into(),
            dst_name: dst_name.into(),
            bind_addr: None,
        }
    }

    pub fn with_bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = Some(addr.into());
        self
    }
}

/// One allocated channel: a send port and a receive port sharing one
/// underlying transport resource.
pub struct Channel {
    pub send: Box<dyn SendPort>,
    pub recv: Box<dyn RecvPort>,
}

/// Allocate a channel of the given `kind`. Rejects `capacity == 0`.
/// `Shmem` with `capacity == 1` dispatches to the blocking single-slot ring
/// path (no behavioural difference from the caller's point of view beyond
/// simpler internal index arithmetic — see `ring::SemRing`).
pub fn get_channel(
    registry: &crate::registry::ResourceRegistry,
    shm: &crate::registry::ShmManager,
    kind: ChannelKind,
    capacity: usize,
    nbytes: usize,
    opts: ChannelOpts,
) -> Result<Channel> {
    if capacity == 0 {
        return Err(IpcError::resource_exhausted("capacity must be >= 1"));
    }

    match kind {
        ChannelKind::Shmem => crate::channels::shmem::build(registry, shm, capacity, nbytes),
        ChannelKind::PubSub(transport) => {
            crate::channels::pubsub::build(registry, shm, transport, capacity, nbytes, opts)
        }
        ChannelKind::Rpc => crate::channels::rpc::build(capacity, nbytes, opts),
    }
}
