// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Component C: the shared-memory manager, plus the process manager's
// teardown ledger (`ResourceRegistry`). Only the creating process may ever
// unlink a name; every other process just maps/unmaps and detaches.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::error::{IpcError, Result};
use crate::metadata::HEADER_WIRE_SIZE;
use crate::platform::{ShmMode, ShmRegion};
use crate::ring::SemRing;
use crate::sem::IpcSemaphore;

/// Generates process-unique resource name suffixes. Not globally random —
/// pid + a monotonic counter is sufficient uniqueness for names that live
/// only as long as one process tree's shared-memory segments.
fn unique_suffix() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    ((std::process::id() as u64) << 32) | n
}

/// A stack of teardown closures, drained in reverse order of registration.
///
/// Re-architected from the original's singleton-with-destructor-order
/// design: the process manager owns one `ResourceRegistry`; every
/// allocation (shared region, semaphore, RPC URL) pushes a closer here.
/// `drain()` must run exactly once, only in the manager's owning process.
#[derive(Default)]
pub struct ResourceRegistry {
    closers: Mutex<Vec<Box<dyn FnOnce() + Send>>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, closer: impl FnOnce() + Send + 'static) {
        self.closers.lock().unwrap().push(Box::new(closer));
    }

    /// Run every registered closer in reverse registration order, then clear
    /// the ledger. Idempotent: a second call is a no-op.
    pub fn drain(&self) {
        let mut closers = self.closers.lock().unwrap();
        while let Some(closer) = closers.pop() {
            closer();
        }
    }
}

/// One shared-memory-backed channel's resources: the mapped region plus its
/// two named semaphores, bundled as a ready-to-use ring.
pub struct ChannelResources {
    pub ring: SemRing,
    region_name: String,
    req_name: String,
    ack_name: String,
}

/// Process-wide registry of shm segments and named semaphores (component C).
///
/// Holds the region/semaphore names it allocated so `delete_all` can unlink
/// them; does not itself track raw fds or mapped addresses as separate maps
/// since `ShmRegion`/`IpcSemaphore` already own that state — the manager's
/// job is solely to remember *which names this process created* and to
/// unlink them exactly once.
pub struct ShmManager {
    created_names: Mutex<Vec<(String, String, String)>>, // (region, req, ack)
}

impl ShmManager {
    pub fn new() -> Self {
        Self {
            created_names: Mutex::new(Vec::new()),
        }
    }

    /// Allocate a new shared-memory ring of `capacity` slots, each holding
    /// up to `nbytes` of payload (§4.3 `AllocChannelSharedMemory`).
    ///
    /// Registers closers on `registry` that munmap the region and close
    /// (but do not unlink) the semaphores — unlinking happens only via
    /// `delete_all`, called once by the owning process.
    pub fn alloc_channel_shared_memory(
        &self,
        registry: &ResourceRegistry,
        nbytes: usize,
        capacity: usize,
    ) -> Result<ChannelResources> {
        if capacity == 0 {
            return Err(IpcError::resource_exhausted("capacity must be >= 1"));
        }

        let suffix = unique_suffix();
        let region_name = format!("shm{suffix:x}");
        let req_name = format!("req{suffix:x}");
        let ack_name = format!("ack{suffix:x}");

        let slot_size = HEADER_WIRE_SIZE + nbytes;
        let region = ShmRegion::acquire(&region_name, slot_size * capacity, ShmMode::Create)
            .map_err(|e| IpcError::resource_exhausted(format!("shm region: {e}")))?;
        let base = region.as_mut_ptr();

        let req = IpcSemaphore::open(&req_name, 0)?;
        let ack = IpcSemaphore::open(&ack_name, capacity as u32)?;

        self.created_names.lock().unwrap().push((
            region_name.clone(),
            req_name.clone(),
            ack_name.clone(),
        ));

        // `region` must stay mapped for the ring's lifetime; leak it into the
        // registry's closer so drop order is explicit rather than implicit.
        registry.register(move || drop(region));

        let ring = SemRing::new(base, capacity, nbytes, req, ack);

        Ok(ChannelResources {
            ring,
            region_name,
            req_name,
            ack_name,
        })
    }

    /// Unmap every region, unlink each name, close and unlink each
    /// semaphore (§4.3 `DeleteAllSharedMemory`). Must run exactly once, in
    /// the creating process only — children must never call this.
    pub fn delete_all_shared_memory(&self) {
        let names = std::mem::take(&mut *self.created_names.lock().unwrap());
        for (region_name, req_name, ack_name) in names {
            ShmRegion::unlink_by_name_static(&region_name);
            IpcSemaphore::clear_storage(&req_name);
            IpcSemaphore::clear_storage(&ack_name);
        }
    }
}

impl Default for ShmManager {
    fn default() -> Self {
        Self::new()
    }
}

// `ShmRegion` exposes only instance `unlink()`; a by-name static helper lives
// here rather than on the platform type, since only the manager should ever
// call it.
trait ShmRegionExt {
    fn unlink_by_name_static(name: &str);
}

impl ShmRegionExt for ShmRegion {
    fn unlink_by_name_static(name: &str) {
        #[cfg(unix)]
        {
            let posix_name = crate::shm_name::make_shm_name(name);
            if let Ok(c_name) = std::ffi::CString::new(posix_name.as_bytes()) {
                unsafe { libc::shm_unlink(c_name.as_ptr()) };
            }
        }
        #[cfg(windows)]
        {
            // Pagefile-backed; nothing to unlink by name.
            let _ = name;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_then_delete_all_round_trips() {
        let registry = ResourceRegistry::new();
        let mgr = ShmManager::new();
        let resources = mgr.alloc_channel_shared_memory(&registry, 32, 4).unwrap();
        assert_eq!(resources.ring.capacity(), 4);
        mgr.delete_all_shared_memory();
        registry.drain();
    }

    #[test]
    fn rejects_zero_capacity() {
        let registry = ResourceRegistry::new();
        let mgr = ShmManager::new();
        assert!(mgr.alloc_channel_shared_memory(&registry, 32, 0).is_err());
    }
}
