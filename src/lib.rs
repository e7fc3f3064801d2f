// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Shared-memory, publish/subscribe, and RPC channel transports for a forked
// multi-actor runtime. Every transport presents the same send/receive port
// contract (`port::SendPort`/`port::RecvPort`); the process manager builds
// actors, supervises their lifecycle, and owns teardown of every shared OS
// resource a channel allocates.

pub mod shm_name;

mod platform;

mod spin_lock;

pub mod error;
pub use error::{IpcError, Result};

pub mod config;
pub use config::RuntimeConfig;

pub mod sem;
pub use sem::IpcSemaphore;

pub mod metadata;
pub use metadata::{DType, Message, MetaData};

pub mod registry;
pub use registry::{ChannelResources, ResourceRegistry, ShmManager};

pub mod ring;
pub use ring::SemRing;

pub mod status;
pub use status::{ActorStatus, StatusTable};

#[cfg(unix)]
pub mod actor;
#[cfg(unix)]
pub use actor::Actor;

pub mod port;
pub use port::{Channel, ChannelKind, ChannelOpts, PubSubTransport, RecvPort, SendPort};

pub mod channels;

#[cfg(unix)]
pub mod manager;
#[cfg(unix)]
pub use manager::ProcessManager;

pub mod selector;
pub use selector::{Action, ArrivalNotifier};
