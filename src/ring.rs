// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Component B: single-producer/single-consumer ring buffer over a shared
// byte region, slot accounting done entirely by two named POSIX counting
// semaphores (`req` counts filled slots, `ack` counts free slots).

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{IpcError, Result};
use crate::metadata::{Message, MetaData, HEADER_WIRE_SIZE};
use crate::sem::IpcSemaphore;

/// A fixed-capacity SPSC ring living in a region of exactly
/// `capacity * (HEADER_WIRE_SIZE + nbytes)` bytes starting at `base`.
///
/// `capacity == 1` is the "blocking single-slot" variant named in the port
/// factory (§4.6): the same code path handles it since index arithmetic
/// modulo 1 is always zero, so there is nothing extra to special-case.
pub struct SemRing {
    base: *mut u8,
    capacity: usize,
    nbytes: usize,
    req: IpcSemaphore,
    ack: IpcSemaphore,
    idx_send: AtomicUsize,
    idx_recv: AtomicUsize,
}

// Safety: `base` points into a region that outlives the ring (owned by the
// shared-memory manager) and is only ever dereferenced at the producer's
// `idx_send` slot or the consumer's `idx_recv` slot, which never overlap.
unsafe impl Send for SemRing {}
unsafe impl Sync for SemRing {}

impl SemRing {
    fn slot_size(&self) -> usize {
        HEADER_WIRE_SIZE + self.nbytes
    }

    /// Construct a ring over a pre-existing mapped region. `req`/`ack` must
    /// already be opened with the conventional initial values (0 and
    /// `capacity` respectively) by the shared-memory manager.
    pub fn new(base: *mut u8, capacity: usize, nbytes: usize, req: IpcSemaphore, ack: IpcSemaphore) -> Self {
        assert!(capacity >= 1, "capacity must be at least 1");
        Self {
            base,
            capacity,
            nbytes,
            req,
            ack,
            idx_send: AtomicUsize::new(0),
            idx_recv: AtomicUsize::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn nbytes(&self) -> usize {
        self.nbytes
    }

    /// # Safety
    /// `idx` must be `< capacity`; the returned slice aliases the shared region.
    unsafe fn slot_mut(&self, idx: usize) -> &mut [u8] {
        let off = idx * self.slot_size();
        std::slice::from_raw_parts_mut(self.base.add(off), self.slot_size())
    }

    unsafe fn slot(&self, idx: usize) -> &[u8] {
        let off = idx * self.slot_size();
        std::slice::from_raw_parts(self.base.add(off), self.slot_size())
    }

    /// Producer protocol (§4.2): wait for a free slot, serialise `meta` +
    /// `payload`, advance `idx_send`, publish. Rejects oversized payloads
    /// with `PayloadTooLarge` before touching the semaphores or the slot —
    /// the free-slot accounting is left untouched on this path.
    pub fn store(&self, meta: &MetaData, payload: &[u8]) -> Result<()> {
        let needed = meta.payload_len();
        if needed > self.nbytes || payload.len() > self.nbytes {
            return Err(IpcError::PayloadTooLarge {
                actual: payload.len().max(needed),
                limit: self.nbytes,
            });
        }

        self.ack.wait(None)?;

        let idx = self.idx_send.load(Ordering::Relaxed);
        let slot = unsafe { self.slot_mut(idx) };
        let mut hdr = [0u8; HEADER_WIRE_SIZE];
        meta.encode_header(&mut hdr);
        slot[..HEADER_WIRE_SIZE].copy_from_slice(&hdr);
        slot[HEADER_WIRE_SIZE..HEADER_WIRE_SIZE + payload.len()].copy_from_slice(payload);

        self.idx_send.store((idx + 1) % self.capacity, Ordering::Relaxed);
        self.req.post(1)?;
        Ok(())
    }

    /// Consumer blocking protocol: wait for a filled slot, copy it out into
    /// an owned `Message`, advance `idx_recv`, release the slot.
    pub fn block_load(&self) -> Result<Message> {
        self.req.wait(None)?;
        let msg = self.read_current_recv_slot();
        let idx = self.idx_recv.load(Ordering::Relaxed);
        self.idx_recv.store((idx + 1) % self.capacity, Ordering::Relaxed);
        self.ack.post(1)?;
        Ok(msg)
    }

    /// Consumer non-blocking protocol. Returns `Ok(None)` without touching
    /// indices if no slot is filled.
    pub fn load(&self) -> Result<Option<Message>> {
        if !self.req.try_wait()? {
            return Ok(None);
        }
        let msg = self.read_current_recv_slot();
        let idx = self.idx_recv.load(Ordering::Relaxed);
        self.idx_recv.store((idx + 1) % self.capacity, Ordering::Relaxed);
        self.ack.post(1)?;
        Ok(Some(msg))
    }

    /// Advisory: would a `block_load` succeed immediately? Authoritative for
    /// the owning consumer in the SPSC discipline.
    pub fn try_probe(&self) -> Result<bool> {
        if self.req.try_wait()? {
            self.req.post(1)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Read the next message without consuming it (§9 Open Question,
    /// resolved): `sem_wait(req)` to ensure a slot is present, read the
    /// slot contents directly, then `sem_post(req)` to restore the count
    /// so a subsequent real `block_load`/`load` still observes it.
    pub fn peek(&self) -> Result<Message> {
        self.req.wait(None)?;
        let msg = self.read_current_recv_slot();
        self.req.post(1)?;
        Ok(msg)
    }

    fn read_current_recv_slot(&self) -> Message {
        let idx = self.idx_recv.load(Ordering::Relaxed);
        let slot = unsafe { self.slot(idx) };
        let mut hdr = [0u8; HEADER_WIRE_SIZE];
        hdr.copy_from_slice(&slot[..HEADER_WIRE_SIZE]);
        let meta = MetaData::decode_header(&hdr);
        let len = meta.payload_len().min(self.nbytes);
        let payload = slot[HEADER_WIRE_SIZE..HEADER_WIRE_SIZE + len].to_vec();
        Message { meta, payload }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::DType;

    fn make_ring(capacity: usize, nbytes: usize) -> (SemRing, Vec<u8>) {
        let slot_size = HEADER_WIRE_SIZE + nbytes;
        let mut backing = vec![0u8; slot_size * capacity];
        let base = backing.as_mut_ptr();
        let suffix: u64 = {
            use std::sync::atomic::{AtomicU64, Ordering as Ord};
            static COUNTER: AtomicU64 = AtomicU64::new(0);
            COUNTER.fetch_add(1, Ord::Relaxed)
        };
        let req = IpcSemaphore::open(
            &format!("ring_test_req_{}_{}", std::process::id(), suffix),
            0,
        )
        .unwrap();
        let ack = IpcSemaphore::open(
            &format!("ring_test_ack_{}_{}", std::process::id(), suffix),
            capacity as u32,
        )
        .unwrap();
        (SemRing::new(base, capacity, nbytes, req, ack), backing)
    }

    #[test]
    fn store_then_block_load_round_trips() {
        let (ring, _backing) = make_ring(4, 64);
        let meta = MetaData::new(DType::Int32, 4, &[3], &[4]);
        ring.store(&meta, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]).unwrap();
        let msg = ring.block_load().unwrap();
        assert_eq!(msg.meta, meta);
        assert_eq!(msg.payload, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
    }

    #[test]
    fn oversized_payload_is_rejected_without_touching_slots() {
        let (ring, _backing) = make_ring(2, 8);
        let meta = MetaData::new(DType::UInt8, 1, &[16], &[1]);
        let err = ring.store(&meta, &[0u8; 16]).unwrap_err();
        assert!(matches!(err, IpcError::PayloadTooLarge { .. }));
        assert!(!ring.try_probe().unwrap());
    }

    #[test]
    fn load_on_empty_ring_returns_none_without_blocking() {
        let (ring, _backing) = make_ring(2, 8);
        assert!(ring.load().unwrap().is_none());
    }

    #[test]
    fn peek_does_not_consume() {
        let (ring, _backing) = make_ring(2, 8);
        let meta = MetaData::new(DType::UInt8, 1, &[4], &[1]);
        ring.store(&meta, &[9, 9, 9, 9]).unwrap();
        let peeked = ring.peek().unwrap();
        assert_eq!(peeked.payload, vec![9, 9, 9, 9]);
        let loaded = ring.block_load().unwrap();
        assert_eq!(loaded.payload, vec![9, 9, 9, 9]);
        assert!(ring.load().unwrap().is_none());
    }

    #[test]
    fn single_slot_ring_wraps_at_capacity_one() {
        let (ring, _backing) = make_ring(1, 8);
        let meta = MetaData::new(DType::UInt8, 1, &[2], &[1]);
        ring.store(&meta, &[1, 2]).unwrap();
        let msg = ring.block_load().unwrap();
        assert_eq!(msg.payload, vec![1, 2]);
        ring.store(&meta, &[3, 4]).unwrap();
        let msg = ring.block_load().unwrap();
        assert_eq!(msg.payload, vec![3, 4]);
    }
}
