// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Error taxonomy for channel transports, the shared-memory manager, and the
// process/actor lifecycle.

use std::fmt;

/// Errors produced by ports, channels, the shared-memory manager, and the
/// process manager.
#[derive(thiserror::Error, Debug)]
pub enum IpcError {
    /// Shared-memory allocation, semaphore creation, or port binding failed.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// A `Send` payload exceeds the channel's per-slot `nbytes`.
    #[error("payload too large: {actual} bytes exceeds slot capacity {limit} bytes")]
    PayloadTooLarge { actual: usize, limit: usize },

    /// `Send`/`Recv` was attempted on a port that has been joined.
    #[error("channel closed")]
    ChannelClosed,

    /// A transient transport error; the caller may retry.
    #[error("transport failure: {0}")]
    TransportFailure(String),

    /// A singleton invariant was violated. Callers should treat this as
    /// unrecoverable; the process manager aborts the process on this variant.
    #[error("fatal: {0}")]
    Fatal(String),

    /// Underlying OS call failed (syscall wrapper for shm/semaphore/process APIs).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl IpcError {
    pub fn resource_exhausted(msg: impl fmt::Display) -> Self {
        Self::ResourceExhausted(msg.to_string())
    }

    pub fn transport_failure(msg: impl fmt::Display) -> Self {
        Self::TransportFailure(msg.to_string())
    }

    pub fn fatal(msg: impl fmt::Display) -> Self {
        Self::Fatal(msg.to_string())
    }

    /// Whether this error should terminate the process immediately (§7).
    pub fn is_fatal(&self) -> bool {
        matches!(self, IpcError::Fatal(_))
    }
}

pub type Result<T> = std::result::Result<T, IpcError>;

/// Escalates a `Fatal` error to an immediate process abort (§7, §10.2);
/// every other variant passes through untouched.
pub trait FatalCheck<T> {
    fn check_fatal(self) -> Result<T>;
}

impl<T> FatalCheck<T> for Result<T> {
    fn check_fatal(self) -> Result<T> {
        if let Err(ref e) = self {
            if e.is_fatal() {
                log::error!("{e}");
                std::process::abort();
            }
        }
        self
    }
}
