// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Component E: the port contract over a topic-based transport. Many-to-many
// fan-out on one channel is an explicit non-goal (§1), so every sub-kind
// here is structurally a single publisher talking to a single subscriber —
// `Shm` reduces to the same ring `channels::shmem` builds, reached through
// topic-shaped naming instead of caller-chosen shared-memory sizing; the
// socket sub-kinds are real, minimal framed transports over `std::net`
// rather than a third-party middleware integration (the middleware itself
// is named as an external collaborator in §1, out of scope for this crate).

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream, UdpSocket};
use std::sync::{Arc, Mutex};

use crate::error::{IpcError, Result};
use crate::metadata::{Message, MetaData, HEADER_WIRE_SIZE};
use crate::port::{Channel, ChannelOpts, PubSubTransport, RecvPort, SendPort};
use crate::registry::{ResourceRegistry, ShmManager};

fn encode_frame(meta: &MetaData, payload: &[u8]) -> Vec<u8> {
    Message::new(*meta, payload.to_vec()).encode()
}

fn decode_frame(buf: &[u8]) -> Result<(MetaData, Vec<u8>)> {
    let msg = Message::decode(buf)?;
    Ok((msg.meta, msg.payload))
}

// ---------------------------------------------------------------------------
// Shm sub-kind: delegate straight to the component-B ring.
// ---------------------------------------------------------------------------

fn build_shm(
    registry: &ResourceRegistry,
    shm: &ShmManager,
    capacity: usize,
    nbytes: usize,
) -> Result<Channel> {
    crate::channels::shmem::build(registry, shm, capacity, nbytes)
}

// ---------------------------------------------------------------------------
// UDPv4 sub-kind: best-effort datagram framing, one datagram per message.
// ---------------------------------------------------------------------------

pub struct UdpSendPort {
    socket: UdpSocket,
    nbytes: usize,
    closed: bool,
}

pub struct UdpRecvPort {
    socket: UdpSocket,
    closed: bool,
}

impl SendPort for UdpSendPort {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn send(&mut self, meta: &MetaData, payload: &[u8]) -> Result<()> {
        if self.closed {
            return Err(IpcError::ChannelClosed);
        }
        if payload.len() > self.nbytes {
            return Err(IpcError::PayloadTooLarge {
                actual: payload.len(),
                limit: self.nbytes,
            });
        }
        let frame = encode_frame(meta, payload);
        self.socket
            .send(&frame)
            .map_err(|e| IpcError::transport_failure(format!("udp send: {e}")))?;
        Ok(())
    }

    fn join(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

impl RecvPort for UdpRecvPort {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn recv(&mut self) -> Result<(MetaData, Vec<u8>)> {
        if self.closed {
            return Err(IpcError::ChannelClosed);
        }
        let mut buf = vec![0u8; HEADER_WIRE_SIZE + (1 << 20)];
        let n = self
            .socket
            .recv(&mut buf)
            .map_err(|e| IpcError::transport_failure(format!("udp recv: {e}")))?;
        decode_frame(&buf[..n])
    }

    fn peek(&mut self) -> Result<(MetaData, Vec<u8>)> {
        if self.closed {
            return Err(IpcError::ChannelClosed);
        }
        let mut buf = vec![0u8; HEADER_WIRE_SIZE + (1 << 20)];
        let n = self
            .socket
            .peek(&mut buf)
            .map_err(|e| IpcError::transport_failure(format!("udp peek: {e}")))?;
        decode_frame(&buf[..n])
    }

    fn probe(&self) -> Result<bool> {
        if self.closed {
            return Ok(false);
        }
        self.socket
            .set_nonblocking(true)
            .map_err(|e| IpcError::transport_failure(format!("udp probe: {e}")))?;
        let mut buf = [0u8; 1];
        let ready = match self.socket.peek(&mut buf) {
            Ok(_) => true,
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => false,
            Err(e) => return Err(IpcError::transport_failure(format!("udp probe: {e}"))),
        };
        self.socket
            .set_nonblocking(false)
            .map_err(|e| IpcError::transport_failure(format!("udp probe: {e}")))?;
        Ok(ready)
    }

    fn join(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

fn build_udpv4(nbytes: usize, opts: ChannelOpts) -> Result<Channel> {
    let bind_addr = opts.bind_addr.unwrap_or_else(|| "127.0.0.1:0".to_owned());
    let send_socket = UdpSocket::bind("0.0.0.0:0")
        .map_err(|e| IpcError::resource_exhausted(format!("udp send bind: {e}")))?;
    let recv_socket = UdpSocket::bind(&bind_addr)
        .map_err(|e| IpcError::resource_exhausted(format!("udp recv bind: {e}")))?;
    let peer = recv_socket
        .local_addr()
        .map_err(|e| IpcError::resource_exhausted(format!("udp local_addr: {e}")))?;
    send_socket
        .connect(peer)
        .map_err(|e| IpcError::resource_exhausted(format!("udp connect: {e}")))?;

    Ok(Channel {
        send: Box::new(UdpSendPort {
            socket: send_socket,
            nbytes,
            closed: false,
        }),
        recv: Box::new(UdpRecvPort {
            socket: recv_socket,
            closed: false,
        }),
    })
}

// ---------------------------------------------------------------------------
// TCPv6 sub-kind: one persistent stream, length-framed via the §3 header.
// ---------------------------------------------------------------------------

pub struct TcpSendPort {
    stream: Arc<Mutex<TcpStream>>,
    nbytes: usize,
    closed: bool,
}

pub struct TcpRecvPort {
    stream: Arc<Mutex<TcpStream>>,
    closed: bool,
}

impl SendPort for TcpSendPort {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn send(&mut self, meta: &MetaData, payload: &[u8]) -> Result<()> {
        if self.closed {
            return Err(IpcError::ChannelClosed);
        }
        if payload.len() > self.nbytes {
            return Err(IpcError::PayloadTooLarge {
                actual: payload.len(),
                limit: self.nbytes,
            });
        }
        let frame = encode_frame(meta, payload);
        let mut stream = self.stream.lock().unwrap();
        stream
            .write_all(&(frame.len() as u64).to_le_bytes())
            .and_then(|_| stream.write_all(&frame))
            .map_err(|e| IpcError::transport_failure(format!("tcp send: {e}")))
    }

    fn join(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

impl RecvPort for TcpRecvPort {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn recv(&mut self) -> Result<(MetaData, Vec<u8>)> {
        if self.closed {
            return Err(IpcError::ChannelClosed);
        }
        let mut stream = self.stream.lock().unwrap();
        let mut len_buf = [0u8; 8];
        stream
            .read_exact(&mut len_buf)
            .map_err(|e| IpcError::transport_failure(format!("tcp recv len: {e}")))?;
        let len = u64::from_le_bytes(len_buf) as usize;
        let mut frame = vec![0u8; len];
        stream
            .read_exact(&mut frame)
            .map_err(|e| IpcError::transport_failure(format!("tcp recv body: {e}")))?;
        decode_frame(&frame)
    }

    fn peek(&mut self) -> Result<(MetaData, Vec<u8>)> {
        // No persistent peek-ahead buffer is kept; a stream that has not
        // been read from yet can still be peeked via `TcpStream::peek`.
        if self.closed {
            return Err(IpcError::ChannelClosed);
        }
        let stream = self.stream.lock().unwrap();
        let mut probe = [0u8; 8];
        stream
            .peek(&mut probe)
            .map_err(|e| IpcError::transport_failure(format!("tcp peek len: {e}")))?;
        let len = u64::from_le_bytes(probe) as usize;
        let mut frame = vec![0u8; 8 + len];
        let n = stream
            .peek(&mut frame)
            .map_err(|e| IpcError::transport_failure(format!("tcp peek body: {e}")))?;
        if n < 8 + len {
            return Err(IpcError::transport_failure("tcp peek: short read"));
        }
        decode_frame(&frame[8..])
    }

    fn probe(&self) -> Result<bool> {
        if self.closed {
            return Ok(false);
        }
        let stream = self.stream.lock().unwrap();
        stream
            .set_nonblocking(true)
            .map_err(|e| IpcError::transport_failure(format!("tcp probe: {e}")))?;
        let mut buf = [0u8; 1];
        let ready = match stream.peek(&mut buf) {
            Ok(0) => false,
            Ok(_) => true,
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => false,
            Err(e) => return Err(IpcError::transport_failure(format!("tcp probe: {e}"))),
        };
        stream
            .set_nonblocking(false)
            .map_err(|e| IpcError::transport_failure(format!("tcp probe: {e}")))?;
        Ok(ready)
    }

    fn join(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

fn build_tcpv6(nbytes: usize, opts: ChannelOpts) -> Result<Channel> {
    let bind_addr = opts.bind_addr.unwrap_or_else(|| "[::1]:0".to_owned());
    let listener = TcpListener::bind(&bind_addr)
        .map_err(|e| IpcError::resource_exhausted(format!("tcp listen: {e}")))?;
    let local = listener
        .local_addr()
        .map_err(|e| IpcError::resource_exhausted(format!("tcp local_addr: {e}")))?;

    let connector = std::thread::spawn(move || TcpStream::connect(local));
    let (accepted, _) = listener
        .accept()
        .map_err(|e| IpcError::resource_exhausted(format!("tcp accept: {e}")))?;
    let connected = connector
        .join()
        .map_err(|_| IpcError::resource_exhausted("tcp connect thread panicked"))?
        .map_err(|e| IpcError::resource_exhausted(format!("tcp connect: {e}")))?;

    Ok(Channel {
        send: Box::new(TcpSendPort {
            stream: Arc::new(Mutex::new(connected)),
            nbytes,
            closed: false,
        }),
        recv: Box::new(TcpRecvPort {
            stream: Arc::new(Mutex::new(accepted)),
            closed: false,
        }),
    })
}

pub fn build(
    registry: &ResourceRegistry,
    shm: &ShmManager,
    transport: PubSubTransport,
    capacity: usize,
    nbytes: usize,
    opts: ChannelOpts,
) -> Result<Channel> {
    match transport {
        PubSubTransport::Shm => build_shm(registry, shm, capacity, nbytes),
        PubSubTransport::Udpv4 => build_udpv4(nbytes, opts),
        PubSubTransport::Tcpv6 => build_tcpv6(nbytes, opts),
    }
}
