// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Windows implementation of named semaphores and raw shared memory regions.
// Binary-compatible with cpp-ipc/src/libipc/platform/win/shm_win.cpp.

use std::io;
use std::ptr;

/// Open mode flags for shared memory regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShmMode {
    Create,
    Open,
    CreateOrOpen,
}

/// Encode a name as a null-terminated wide string for Win32 APIs.
fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

// ---------------------------------------------------------------------------
// PlatformSemaphore — Windows named semaphore.
// ---------------------------------------------------------------------------

pub struct PlatformSemaphore {
    handle: windows_sys::Win32::Foundation::HANDLE,
}

unsafe impl Send for PlatformSemaphore {}
unsafe impl Sync for PlatformSemaphore {}

impl PlatformSemaphore {
    pub fn open(name: &str, initial: u32) -> io::Result<Self> {
        use windows_sys::Win32::System::Threading::CreateSemaphoreW;

        let wide_name = to_wide(name);
        let handle = unsafe {
            CreateSemaphoreW(ptr::null(), initial as i32, i32::MAX, wide_name.as_ptr())
        };
        if handle == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Self { handle })
    }

    pub fn wait(&self) -> io::Result<()> {
        use windows_sys::Win32::System::Threading::{WaitForSingleObject, INFINITE};

        let ret = unsafe { WaitForSingleObject(self.handle, INFINITE) };
        if ret == windows_sys::Win32::Foundation::WAIT_OBJECT_0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    pub fn try_wait(&self) -> io::Result<bool> {
        use windows_sys::Win32::System::Threading::WaitForSingleObject;

        let ret = unsafe { WaitForSingleObject(self.handle, 0) };
        match ret {
            windows_sys::Win32::Foundation::WAIT_OBJECT_0 => Ok(true),
            windows_sys::Win32::Foundation::WAIT_TIMEOUT => Ok(false),
            _ => Err(io::Error::last_os_error()),
        }
    }

    pub fn wait_timeout(&self, timeout_ms: u64) -> io::Result<bool> {
        use windows_sys::Win32::System::Threading::WaitForSingleObject;

        let ret = unsafe { WaitForSingleObject(self.handle, timeout_ms as u32) };
        match ret {
            windows_sys::Win32::Foundation::WAIT_OBJECT_0 => Ok(true),
            windows_sys::Win32::Foundation::WAIT_TIMEOUT => Ok(false),
            _ => Err(io::Error::last_os_error()),
        }
    }

    pub fn post(&self) -> io::Result<()> {
        use windows_sys::Win32::System::Threading::ReleaseSemaphore;

        if unsafe { ReleaseSemaphore(self.handle, 1, ptr::null_mut()) } == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    pub fn unlink(&self) {
        // Windows semaphores are reclaimed when the last handle closes.
    }

    pub fn unlink_by_name(_name: &str) {
        // No-op on Windows.
    }
}

impl Drop for PlatformSemaphore {
    fn drop(&mut self) {
        use windows_sys::Win32::Foundation::CloseHandle;
        if self.handle != 0 {
            unsafe { CloseHandle(self.handle) };
        }
    }
}

// ---------------------------------------------------------------------------
// ShmRegion — raw, non-refcounted shared memory mapping. Ownership of the
// backing name is tracked explicitly by `crate::registry::ShmManager`; this
// type only maps/unmaps, it never auto-reclaims on drop.
// ---------------------------------------------------------------------------

pub struct ShmRegion {
    handle: windows_sys::Win32::Foundation::HANDLE,
    mem: *mut u8,
    size: usize,
    name: String,
}

unsafe impl Send for ShmRegion {}
unsafe impl Sync for ShmRegion {}

impl ShmRegion {
    pub fn acquire(name: &str, size: usize, mode: ShmMode) -> io::Result<Self> {
        use windows_sys::Win32::Foundation::*;
        use windows_sys::Win32::System::Memory::*;

        if name.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "name is empty"));
        }
        if size == 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "size is 0"));
        }

        let wide_name = to_wide(name);

        let handle = if mode == ShmMode::Open {
            unsafe { OpenFileMappingW(FILE_MAP_ALL_ACCESS, FALSE, wide_name.as_ptr()) }
        } else {
            let h = unsafe {
                CreateFileMappingW(
                    INVALID_HANDLE_VALUE,
                    ptr::null(),
                    PAGE_READWRITE | SEC_COMMIT,
                    0,
                    size as u32,
                    wide_name.as_ptr(),
                )
            };
            let err = unsafe { GetLastError() };
            if mode == ShmMode::Create && err == ERROR_ALREADY_EXISTS {
                if h != 0 {
                    unsafe { CloseHandle(h) };
                }
                return Err(io::Error::new(io::ErrorKind::AlreadyExists, "shm already exists"));
            }
            h
        };
        if handle == 0 {
            return Err(io::Error::last_os_error());
        }

        let mem = unsafe { MapViewOfFile(handle, FILE_MAP_ALL_ACCESS, 0, 0, size) };
        if mem.is_null() {
            let e = io::Error::last_os_error();
            unsafe { CloseHandle(handle) };
            return Err(e);
        }

        Ok(Self {
            handle,
            mem: mem as *mut u8,
            size,
            name: name.to_owned(),
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

    pub fn unlink(&self) {
        // Pagefile-backed mappings vanish once every handle is closed;
        // there is nothing further to unlink by name.
    }
}

impl Drop for ShmRegion {
    fn drop(&mut self) {
        use windows_sys::Win32::Foundation::CloseHandle;
        use windows_sys::Win32::System::Memory::UnmapViewOfFile;

        if !self.mem.is_null() {
            unsafe { UnmapViewOfFile(self.mem as *const _) };
        }
        if self.handle != 0 {
            unsafe { CloseHandle(self.handle) };
        }
    }
}
