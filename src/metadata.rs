// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Component A: the fixed-layout metadata record accompanying every message,
// and its bit-exact wire encoding (external interfaces, wire layout table).
//
// Wire layout (little-endian, 120-byte header):
//   offset size field
//    0      8  nd
//    8      8  type
//   16      8  elsize
//   24      8  total_size
//   32     40  dims[5]        (int64 each)
//   72     40  strides[5]     (int64 each)
//  112      8  payload-ptr    (not serialised; recomputed locally)
//  120    ...  payload bytes

use crate::error::{IpcError, Result};

pub const MAX_DIMS: usize = 5;
pub const HEADER_WIRE_SIZE: usize = 112;

/// Element type tag. The closed set mirrors the array dtypes the original
/// language bindings support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i64)]
pub enum DType {
    Bool = 0,
    Int8 = 1,
    Int16 = 2,
    Int32 = 3,
    Int64 = 4,
    UInt8 = 5,
    UInt16 = 6,
    UInt32 = 7,
    UInt64 = 8,
    Float32 = 9,
    Float64 = 10,
    Complex64 = 11,
    Complex128 = 12,
}

impl DType {
    pub fn from_tag(tag: i64) -> Option<Self> {
        Some(match tag {
            0 => DType::Bool,
            1 => DType::Int8,
            2 => DType::Int16,
            3 => DType::Int32,
            4 => DType::Int64,
            5 => DType::UInt8,
            6 => DType::UInt16,
            7 => DType::UInt32,
            8 => DType::UInt64,
            9 => DType::Float32,
            10 => DType::Float64,
            11 => DType::Complex64,
            12 => DType::Complex128,
            _ => return None,
        })
    }

    /// Natural element size in bytes for this type (callers may still set a
    /// different `elsize` explicitly; this is only a convenience default).
    pub fn natural_elsize(self) -> usize {
        match self {
            DType::Bool | DType::Int8 | DType::UInt8 => 1,
            DType::Int16 | DType::UInt16 => 2,
            DType::Int32 | DType::UInt32 | DType::Float32 => 4,
            DType::Int64 | DType::UInt64 | DType::Float64 | DType::Complex64 => 8,
            DType::Complex128 => 16,
        }
    }
}

/// Fixed-size header describing one message payload (component A).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetaData {
    pub nd: i64,
    pub dtype: i64,
    pub elsize: i64,
    pub total_size: i64,
    pub dims: [i64; MAX_DIMS],
    pub strides: [i64; MAX_DIMS],
}

impl MetaData {
    /// Build a metadata record, computing `total_size` from `dims[0..nd]`.
    ///
    /// # Panics
    /// Panics if `nd` is 0 or greater than `MAX_DIMS`.
    pub fn new(dtype: DType, elsize: usize, dims: &[i64], strides: &[i64]) -> Self {
        let nd = dims.len();
        assert!((1..=MAX_DIMS).contains(&nd), "nd must be in 1..=MAX_DIMS");
        assert_eq!(dims.len(), strides.len());

        let mut dims_arr = [0i64; MAX_DIMS];
        let mut strides_arr = [0i64; MAX_DIMS];
        dims_arr[..nd].copy_from_slice(dims);
        strides_arr[..nd].copy_from_slice(strides);

        let total_size: i64 = dims.iter().product();

        Self {
            nd: nd as i64,
            dtype: dtype as i64,
            elsize: elsize as i64,
            total_size,
            dims: dims_arr,
            strides: strides_arr,
        }
    }

    /// Total payload size in bytes implied by this header (`elsize * total_size`).
    pub fn payload_len(&self) -> usize {
        (self.elsize.max(0) as usize).saturating_mul(self.total_size.max(0) as usize)
    }

    /// Checks the `total_size == product(dims[0..nd])` invariant (§3).
    pub fn check_invariant(&self) -> Result<()> {
        if !(1..=MAX_DIMS as i64).contains(&self.nd) {
            return Err(IpcError::TransportFailure(format!(
                "nd {} out of range 1..={}",
                self.nd, MAX_DIMS
            )));
        }
        let product: i64 = self.dims[..self.nd as usize].iter().product();
        if product != self.total_size {
            return Err(IpcError::TransportFailure(format!(
                "total_size {} does not match product of dims {}",
                self.total_size, product
            )));
        }
        Ok(())
    }

    /// Serialise the first 112 bytes of the wire layout (header only, no payload).
    pub fn encode_header(&self, out: &mut [u8; HEADER_WIRE_SIZE]) {
        out[0..8].copy_from_slice(&self.nd.to_le_bytes());
        out[8..16].copy_from_slice(&self.dtype.to_le_bytes());
        out[16..24].copy_from_slice(&self.elsize.to_le_bytes());
        out[24..32].copy_from_slice(&self.total_size.to_le_bytes());
        for i in 0..MAX_DIMS {
            let off = 32 + i * 8;
            out[off..off + 8].copy_from_slice(&self.dims[i].to_le_bytes());
        }
        for i in 0..MAX_DIMS {
            let off = 72 + i * 8;
            out[off..off + 8].copy_from_slice(&self.strides[i].to_le_bytes());
        }
    }

    /// Parse the first 112 bytes of the wire layout into a `MetaData`.
    pub fn decode_header(buf: &[u8; HEADER_WIRE_SIZE]) -> Self {
        let mut i64_at = |off: usize| -> i64 {
            i64::from_le_bytes(buf[off..off + 8].try_into().unwrap())
        };
        let nd = i64_at(0);
        let dtype = i64_at(8);
        let elsize = i64_at(16);
        let total_size = i64_at(24);
        let mut dims = [0i64; MAX_DIMS];
        let mut strides = [0i64; MAX_DIMS];
        for i in 0..MAX_DIMS {
            dims[i] = i64_at(32 + i * 8);
            strides[i] = i64_at(72 + i * 8);
        }
        Self { nd, dtype, elsize, total_size, dims, strides }
    }

    /// A zeroed sentinel record (`total_size == 0`), used on shutdown paths
    /// that must hand back *some* record plus an out-of-band closed flag
    /// (§9, RPC `Front`/`Recv` shutdown decision).
    pub fn sentinel() -> Self {
        Self { nd: 0, dtype: 0, elsize: 0, total_size: 0, dims: [0; MAX_DIMS], strides: [0; MAX_DIMS] }
    }

    pub fn is_sentinel(&self) -> bool {
        self.total_size == 0
    }
}

/// One decoded message: header plus an owned, heap-allocated payload.
#[derive(Debug, Clone)]
pub struct Message {
    pub meta: MetaData,
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(meta: MetaData, payload: Vec<u8>) -> Self {
        Self { meta, payload }
    }

    /// Encode header + payload into a single contiguous buffer
    /// (`HEADER_WIRE_SIZE` bytes of header followed by the payload bytes).
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_WIRE_SIZE + self.payload.len());
        let mut hdr = [0u8; HEADER_WIRE_SIZE];
        self.meta.encode_header(&mut hdr);
        out.extend_from_slice(&hdr);
        out.extend_from_slice(&self.payload);
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_WIRE_SIZE {
            return Err(IpcError::TransportFailure("buffer shorter than header".into()));
        }
        let mut hdr = [0u8; HEADER_WIRE_SIZE];
        hdr.copy_from_slice(&buf[..HEADER_WIRE_SIZE]);
        let meta = MetaData::decode_header(&hdr);
        let want = meta.payload_len();
        let have = buf.len() - HEADER_WIRE_SIZE;
        if have < want {
            return Err(IpcError::TransportFailure(format!(
                "truncated payload: need {want} bytes, have {have}"
            )));
        }
        let payload = buf[HEADER_WIRE_SIZE..HEADER_WIRE_SIZE + want].to_vec();
        Ok(Self { meta, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_every_dtype() {
        let dtypes = [
            DType::Bool, DType::Int8, DType::Int16, DType::Int32, DType::Int64,
            DType::UInt8, DType::UInt16, DType::UInt32, DType::UInt64,
            DType::Float32, DType::Float64, DType::Complex64, DType::Complex128,
        ];
        for dt in dtypes {
            let elsize = dt.natural_elsize();
            let meta = MetaData::new(dt, elsize, &[4], &[elsize as i64]);
            let payload: Vec<u8> = (0..meta.payload_len() as u8).collect();
            let msg = Message::new(meta, payload.clone());
            let encoded = msg.encode();
            let decoded = Message::decode(&encoded).unwrap();
            assert_eq!(decoded.meta, meta);
            assert_eq!(decoded.payload, payload);
        }
    }

    #[test]
    fn invariant_rejects_mismatched_total_size() {
        let mut meta = MetaData::new(DType::Int64, 8, &[2, 3], &[24, 8]);
        meta.total_size = 5;
        assert!(meta.check_invariant().is_err());
    }

    #[test]
    fn sentinel_has_zero_total_size() {
        let s = MetaData::sentinel();
        assert!(s.is_sentinel());
        let real = MetaData::new(DType::Int64, 8, &[1], &[8]);
        assert!(!real.is_sentinel());
    }
}
