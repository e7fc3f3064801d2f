// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Cross-platform named counting semaphore.
// Delegates to platform::PlatformSemaphore (POSIX sem_open or Win32 CreateSemaphoreW).

use std::io;

use crate::platform::PlatformSemaphore;

/// A named, inter-process counting semaphore.
///
/// The ring buffer uses a pair of these — `req` (filled slots, initial 0) and
/// `ack` (free slots, initial capacity) — to block producers and consumers
/// without polling.
pub struct IpcSemaphore {
    inner: PlatformSemaphore,
    name: String,
}

impl IpcSemaphore {
    /// Open (or create) a named semaphore with the given initial count.
    pub fn open(name: &str, initial: u32) -> io::Result<Self> {
        let inner = PlatformSemaphore::open(name, initial)?;
        Ok(Self {
            inner,
            name: name.to_owned(),
        })
    }

    /// Decrement the count, blocking at most `timeout_ms` milliseconds.
    /// `None` blocks indefinitely. Returns `Ok(false)` on timeout.
    pub fn wait(&self, timeout_ms: Option<u64>) -> io::Result<bool> {
        match timeout_ms {
            None => self.inner.wait().map(|_| true),
            Some(ms) => self.inner.wait_timeout(ms),
        }
    }

    /// Decrement without blocking; `Ok(false)` if the count is currently 0.
    pub fn try_wait(&self) -> io::Result<bool> {
        self.inner.try_wait()
    }

    /// Increment the count by `count`, waking that many waiters if blocked.
    pub fn post(&self, count: u32) -> io::Result<()> {
        for _ in 0..count {
            self.inner.post()?;
        }
        Ok(())
    }

    pub fn value(&self) -> io::Result<i32> {
        self.inner.value()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Remove the backing storage for a named semaphore (static helper).
    pub fn clear_storage(name: &str) {
        PlatformSemaphore::unlink_by_name(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    fn unique_name(prefix: &str) -> String {
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        format!("{prefix}_semtest_{}_{n}", std::process::id())
    }

    #[test]
    fn open_with_initial_count_and_wait_post_round_trip() {
        let name = unique_name("open");
        IpcSemaphore::clear_storage(&name);
        let sem = IpcSemaphore::open(&name, 1).expect("open");
        assert!(sem.wait(Some(10)).expect("wait"));
        sem.post(1).expect("post");
        assert!(sem.wait(Some(10)).expect("wait again"));
    }

    #[test]
    fn wait_on_empty_semaphore_times_out() {
        let name = unique_name("timeout");
        IpcSemaphore::clear_storage(&name);
        let sem = IpcSemaphore::open(&name, 0).expect("open");
        assert!(!sem.wait(Some(30)).expect("wait"));
    }

    #[test]
    fn post_with_count_allows_that_many_waits() {
        let name = unique_name("post_count");
        IpcSemaphore::clear_storage(&name);
        let sem = IpcSemaphore::open(&name, 0).expect("open");
        sem.post(3).expect("post 3");
        for _ in 0..3 {
            assert!(sem.wait(Some(10)).expect("wait"));
        }
        assert!(!sem.wait(Some(10)).expect("empty"));
    }
}
