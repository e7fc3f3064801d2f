// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Component D: binds one ring buffer (component B) to a send port and a
// receive port. `capacity == 1` uses the same ring; the "blocking
// single-slot" simplification named in §4.6 lives entirely in `ring::SemRing`
// (modulo-1 index arithmetic is a no-op), so there is no separate type here.

use std::sync::Arc;

use crate::error::{IpcError, Result};
use crate::metadata::MetaData;
use crate::port::{Channel, RecvPort, SendPort};
use crate::registry::{ResourceRegistry, ShmManager};

pub struct ShmemSendPort {
    ring: Arc<crate::ring::SemRing>,
    started: bool,
    closed: bool,
}

pub struct ShmemRecvPort {
    ring: Arc<crate::ring::SemRing>,
    started: bool,
    closed: bool,
}

impl SendPort for ShmemSendPort {
    fn start(&mut self) -> Result<()> {
        self.started = true;
        Ok(())
    }

    fn send(&mut self, meta: &MetaData, payload: &[u8]) -> Result<()> {
        if self.closed {
            return Err(IpcError::ChannelClosed);
        }
        self.ring.store(meta, payload)
    }

    fn join(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

impl RecvPort for ShmemRecvPort {
    fn start(&mut self) -> Result<()> {
        self.started = true;
        Ok(())
    }

    fn recv(&mut self) -> Result<(MetaData, Vec<u8>)> {
        if self.closed {
            return Err(IpcError::ChannelClosed);
        }
        let msg = self.ring.block_load()?;
        Ok((msg.meta, msg.payload))
    }

    fn peek(&mut self) -> Result<(MetaData, Vec<u8>)> {
        if self.closed {
            return Err(IpcError::ChannelClosed);
        }
        let msg = self.ring.peek()?;
        Ok((msg.meta, msg.payload))
    }

    fn probe(&self) -> Result<bool> {
        if self.closed {
            return Ok(false);
        }
        self.ring.try_probe()
    }

    fn join(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

pub fn build(
    registry: &ResourceRegistry,
    shm: &ShmManager,
    capacity: usize,
    nbytes: usize,
) -> Result<Channel> {
    let resources = shm.alloc_channel_shared_memory(registry, nbytes, capacity)?;
    let ring = Arc::new(resources.ring);

    Ok(Channel {
        send: Box::new(ShmemSendPort {
            ring: Arc::clone(&ring),
            started: false,
            closed: false,
        }),
        recv: Box::new(ShmemRecvPort {
            ring,
            started: false,
            closed: false,
        }),
    })
}
