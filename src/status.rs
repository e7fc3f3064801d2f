// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Status table (S): a shared-memory region of single-byte actor status
// slots. Each slot is single-writer (the actor itself while running, the
// process manager only after it has observed the actor as terminated).

use std::sync::atomic::{AtomicU8, Ordering};

use crate::error::{IpcError, Result};
use crate::platform::{ShmMode, ShmRegion};

/// One actor's lifecycle state, stored as a single byte per slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ActorStatus {
    Running = 0,
    Stopped = 1,
    Paused = 2,
    Terminated = 3,
    Error = 4,
}

impl ActorStatus {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => ActorStatus::Running,
            1 => ActorStatus::Stopped,
            2 => ActorStatus::Paused,
            3 => ActorStatus::Terminated,
            _ => ActorStatus::Error,
        }
    }
}

/// A shared-memory region of `N` status slots, one per actor (§3 `Status
/// table`). Backed by a plain byte array of `AtomicU8`; no locking is
/// needed since each slot has exactly one writer at a time.
pub struct StatusTable {
    region: ShmRegion,
    capacity: usize,
}

impl StatusTable {
    /// Create a fresh status table with room for `capacity` actors.
    pub fn create(name: &str, capacity: usize) -> Result<Self> {
        let region = ShmRegion::acquire(name, capacity.max(1), ShmMode::Create)
            .map_err(|e| IpcError::resource_exhausted(format!("status table: {e}")))?;
        for i in 0..capacity {
            unsafe { Self::slot_atomic(&region, i).store(ActorStatus::Running as u8, Ordering::Release) };
        }
        Ok(Self { region, capacity })
    }

    unsafe fn slot_atomic(region: &ShmRegion, idx: usize) -> &AtomicU8 {
        &*(region.as_mut_ptr().add(idx) as *const AtomicU8)
    }

    fn check_index(&self, idx: usize) -> Result<()> {
        if idx >= self.capacity {
            return Err(IpcError::fatal(format!(
                "status slot {idx} out of range (capacity {})",
                self.capacity
            )));
        }
        Ok(())
    }

    pub fn set(&self, idx: usize, status: ActorStatus) -> Result<()> {
        self.check_index(idx)?;
        unsafe { Self::slot_atomic(&self.region, idx).store(status as u8, Ordering::Release) };
        Ok(())
    }

    pub fn get(&self, idx: usize) -> Result<ActorStatus> {
        self.check_index(idx)?;
        let v = unsafe { Self::slot_atomic(&self.region, idx).load(Ordering::Acquire) };
        Ok(ActorStatus::from_u8(v))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Remove the backing shared memory. Only the owning process manager
    /// calls this, as part of `Cleanup`.
    pub fn unlink(&self) {
        self.region.unlink();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_slots_start_running_and_transition() {
        let table = StatusTable::create("status_table_test_basic", 4).unwrap();
        assert_eq!(table.get(0).unwrap(), ActorStatus::Running);
        table.set(0, ActorStatus::Terminated).unwrap();
        assert_eq!(table.get(0).unwrap(), ActorStatus::Terminated);
        table.unlink();
    }

    #[test]
    fn out_of_range_slot_is_fatal() {
        let table = StatusTable::create("status_table_test_range", 2).unwrap();
        assert!(table.get(5).is_err());
        table.unlink();
    }
}
