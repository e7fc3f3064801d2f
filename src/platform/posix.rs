// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// POSIX implementation of named semaphores and raw shared memory regions.
// Binary-compatible with cpp-ipc/src/libipc/platform/posix/shm_posix.cpp.

use std::ffi::CString;
use std::io;
use std::ptr;

use crate::shm_name;

/// Open mode flags for shared memory regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShmMode {
    Create,
    Open,
    CreateOrOpen,
}

// ---------------------------------------------------------------------------
// PlatformSemaphore — POSIX named counting semaphore (sem_open family).
// Used by the ring buffer to gate filled/free slot counts across processes.
// ---------------------------------------------------------------------------

pub struct PlatformSemaphore {
    sem: *mut libc::sem_t,
    name: String,
}

unsafe impl Send for PlatformSemaphore {}
unsafe impl Sync for PlatformSemaphore {}

impl PlatformSemaphore {
    /// Open (or create) a named semaphore with the given initial value.
    /// Reuses an already-existing semaphore as-is, ignoring `initial` in
    /// that case.
    pub fn open(name: &str, initial: u32) -> io::Result<Self> {
        let posix_name = shm_name::make_shm_name(name);
        let c_name = CString::new(posix_name.as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let sem = unsafe {
            libc::sem_open(
                c_name.as_ptr(),
                libc::O_CREAT,
                0o666 as libc::c_uint,
                initial,
            )
        };

        if sem == libc::SEM_FAILED {
            return Err(io::Error::last_os_error());
        }

        Ok(Self {
            sem: sem as *mut libc::sem_t,
            name: posix_name,
        })
    }

    /// Block until the semaphore can be decremented.
    pub fn wait(&self) -> io::Result<()> {
        loop {
            let ret = unsafe { libc::sem_wait(self.sem) };
            if ret == 0 {
                return Ok(());
            }
            let e = io::Error::last_os_error();
            if e.raw_os_error() != Some(libc::EINTR) {
                return Err(e);
            }
        }
    }

    /// Decrement without blocking. Returns `Ok(false)` if the semaphore is at 0.
    pub fn try_wait(&self) -> io::Result<bool> {
        loop {
            let ret = unsafe { libc::sem_trywait(self.sem) };
            if ret == 0 {
                return Ok(true);
            }
            let e = io::Error::last_os_error();
            match e.raw_os_error() {
                Some(libc::EAGAIN) => return Ok(false),
                Some(libc::EINTR) => continue,
                _ => return Err(e),
            }
        }
    }

    /// Decrement, blocking at most `timeout_ms` milliseconds.
    pub fn wait_timeout(&self, timeout_ms: u64) -> io::Result<bool> {
        #[cfg(target_os = "macos")]
        {
            // macOS lacks sem_timedwait — emulate via try_wait polling.
            let deadline = std::time::Instant::now() + std::time::Duration::from_millis(timeout_ms);
            let mut k = 0u32;
            loop {
                if self.try_wait()? {
                    return Ok(true);
                }
                if std::time::Instant::now() >= deadline {
                    return Ok(false);
                }
                crate::spin_lock::adaptive_yield_pub(&mut k);
            }
        }
        #[cfg(not(target_os = "macos"))]
        {
            let mut ts: libc::timespec = unsafe { std::mem::zeroed() };
            unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, &mut ts) };
            let ns_total = ts.tv_nsec as u64 + (timeout_ms % 1000) * 1_000_000;
            ts.tv_sec +=
                (timeout_ms / 1000) as libc::time_t + (ns_total / 1_000_000_000) as libc::time_t;
            ts.tv_nsec = (ns_total % 1_000_000_000) as libc::c_long;
            loop {
                let ret = unsafe { libc::sem_timedwait(self.sem, &ts) };
                if ret == 0 {
                    return Ok(true);
                }
                let e = io::Error::last_os_error();
                match e.raw_os_error() {
                    Some(libc::ETIMEDOUT) => return Ok(false),
                    Some(libc::EINTR) => continue,
                    _ => return Err(e),
                }
            }
        }
    }

    /// Increment the semaphore, waking one waiter if any are blocked.
    pub fn post(&self) -> io::Result<()> {
        let ret = unsafe { libc::sem_post(self.sem) };
        if ret != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Current semaphore value. Racy by nature; used only for diagnostics.
    pub fn value(&self) -> io::Result<i32> {
        let mut v: libc::c_int = 0;
        let ret = unsafe { libc::sem_getvalue(self.sem, &mut v) };
        if ret != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(v)
    }

    /// Remove the named semaphore so no further process can `sem_open` it.
    pub fn unlink(&self) {
        if let Ok(c_name) = CString::new(self.name.as_bytes()) {
            unsafe { libc::sem_unlink(c_name.as_ptr()) };
        }
    }

    pub fn unlink_by_name(name: &str) {
        let posix_name = shm_name::make_shm_name(name);
        if let Ok(c_name) = CString::new(posix_name.as_bytes()) {
            unsafe { libc::sem_unlink(c_name.as_ptr()) };
        }
    }
}

impl Drop for PlatformSemaphore {
    fn drop(&mut self) {
        unsafe { libc::sem_close(self.sem) };
    }
}

// ---------------------------------------------------------------------------
// ShmRegion — raw, non-refcounted shared memory mapping.
//
// Never auto-unlinks on drop: ownership of the backing name is tracked
// explicitly by `crate::registry::ShmManager`, which is the only code
// permitted to call `unlink()`. Every other holder only maps and unmaps.
// This matches the requirement that only the creating process removes
// shared-memory objects; children just detach.
// ---------------------------------------------------------------------------

pub struct ShmRegion {
    mem: *mut u8,
    size: usize,
    name: String,
}

unsafe impl Send for ShmRegion {}
unsafe impl Sync for ShmRegion {}

impl ShmRegion {
    pub fn acquire(name: &str, size: usize, mode: ShmMode) -> io::Result<Self> {
        if name.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "name is empty"));
        }
        if size == 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "size is 0"));
        }

        let posix_name = shm_name::make_shm_name(name);
        let c_name = CString::new(posix_name.as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let perms: libc::mode_t = 0o666;

        let (fd, need_truncate) = match mode {
            ShmMode::Create => {
                let f = unsafe {
                    libc::shm_open(
                        c_name.as_ptr(),
                        libc::O_RDWR | libc::O_CREAT | libc::O_EXCL,
                        perms as libc::c_uint,
                    )
                };
                if f == -1 {
                    return Err(io::Error::last_os_error());
                }
                (f, true)
            }
            ShmMode::Open => {
                let f =
                    unsafe { libc::shm_open(c_name.as_ptr(), libc::O_RDWR, perms as libc::c_uint) };
                if f == -1 {
                    return Err(io::Error::last_os_error());
                }
                (f, false)
            }
            ShmMode::CreateOrOpen => {
                let f = unsafe {
                    libc::shm_open(
                        c_name.as_ptr(),
                        libc::O_RDWR | libc::O_CREAT | libc::O_EXCL,
                        perms as libc::c_uint,
                    )
                };
                if f != -1 {
                    (f, true)
                } else {
                    let e = io::Error::last_os_error();
                    if e.raw_os_error() != Some(libc::EEXIST) {
                        return Err(e);
                    }
                    let f2 = unsafe {
                        libc::shm_open(c_name.as_ptr(), libc::O_RDWR, perms as libc::c_uint)
                    };
                    if f2 == -1 {
                        return Err(io::Error::last_os_error());
                    }
                    (f2, false)
                }
            }
        };

        unsafe { libc::fchmod(fd, perms) };

        if need_truncate {
            let ret = unsafe { libc::ftruncate(fd, size as libc::off_t) };
            if ret != 0 {
                let err = io::Error::last_os_error();
                unsafe { libc::close(fd) };
                return Err(err);
            }
        }

        let mem = unsafe {
            libc::mmap(
                ptr::null_mut(),
                size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                fd,
                0,
            )
        };
        unsafe { libc::close(fd) };

        if mem == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }

        Ok(Self {
            mem: mem as *mut u8,
            size,
            name: posix_name,
        })
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.mem
    }

    pub fn as_mut_ptr(&self) -> *mut u8 {
        self.mem
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Explicitly remove the backing name. Only the owning `ShmManager`
    /// should call this (typically exactly once, from the creating process).
    pub fn unlink(&self) {
        if let Ok(c_name) = CString::new(self.name.as_bytes()) {
            unsafe { libc::shm_unlink(c_name.as_ptr()) };
        }
    }
}

impl Drop for ShmRegion {
    fn drop(&mut self) {
        if !self.mem.is_null() {
            unsafe { libc::munmap(self.mem as *mut libc::c_void, self.size) };
        }
    }
}
