// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Component I: the process manager. Builds actors, supervises their
// lifecycle, and owns every transport's teardown through a
// `ResourceRegistry` (§9 re-architecture away from the original's
// destructor-order singleton).
//
// Unix-only: actors are `fork()`-based (see `actor.rs`), which has no
// Windows equivalent that can carry a Rust closure across the process
// boundary. The channel/port/registry layers this type wraps are all
// cross-platform on their own.

use std::sync::Mutex;

use crate::actor::Actor;
use crate::channels::rpc::RpcUrlPool;
use crate::config::RuntimeConfig;
use crate::error::{FatalCheck, Result};
use crate::port::{Channel, ChannelKind, ChannelOpts};
use crate::registry::{ResourceRegistry, ShmManager};
use crate::status::{ActorStatus, StatusTable};

/// Owns the shared-memory manager, the RPC URL pool, the status table, and
/// every actor and port allocated through it. `Cleanup` is the only code
/// path permitted to unlink shared resources — it must run exactly once, in
/// this process.
pub struct ProcessManager {
    registry: ResourceRegistry,
    shm: ShmManager,
    rpc_pool: RpcUrlPool,
    rpc_urls: Mutex<Vec<String>>,
    status: StatusTable,
    actors: Mutex<Vec<Actor>>,
    ports: Mutex<Vec<Box<dyn PortJoinable>>>,
}

/// Type-erased join handle so `Cleanup` can walk every allocated port
/// regardless of which transport produced it.
trait PortJoinable: Send {
    fn join(&mut self) -> Result<()>;
}

struct JoinableSend(Box<dyn crate::port::SendPort>);
struct JoinableRecv(Box<dyn crate::port::RecvPort>);

impl PortJoinable for JoinableSend {
    fn join(&mut self) -> Result<()> {
        self.0.join()
    }
}

impl PortJoinable for JoinableRecv {
    fn join(&mut self) -> Result<()> {
        self.0.join()
    }
}

impl ProcessManager {
    pub fn new(status_table_name: &str, max_actors: usize) -> Result<Self> {
        let config = RuntimeConfig::from_env();
        Ok(Self {
            registry: ResourceRegistry::new(),
            shm: ShmManager::new(),
            rpc_pool: RpcUrlPool::new(&config),
            rpc_urls: Mutex::new(Vec::new()),
            status: StatusTable::create(status_table_name, max_actors)?,
            actors: Mutex::new(Vec::new()),
            ports: Mutex::new(Vec::new()),
        })
    }

    /// Allocate a channel through the factory (§4.6), tracking both ports
    /// for `Cleanup` to join later.
    pub fn get_channel(
        &self,
        kind: ChannelKind,
        capacity: usize,
        nbytes: usize,
        opts: ChannelOpts,
    ) -> Result<Channel> {
        if matches!(kind, ChannelKind::Rpc) {
            // RPC allocates its own URL from this manager's pool rather than
            // a module-local default, so `Cleanup` has something to release.
            let url = opts.bind_addr.clone().unwrap_or_else(|| self.rpc_pool.allocate());
            self.rpc_urls.lock().unwrap().push(url.clone());
            crate::port::get_channel(
                &self.registry,
                &self.shm,
                kind,
                capacity,
                nbytes,
                opts.with_bind_addr(url),
            )
        } else {
            crate::port::get_channel(&self.registry, &self.shm, kind, capacity, nbytes, opts)
        }
    }

    /// `BuildActor(closure)` (§4.7): reserve a status slot, fork, run
    /// `closure` in the child.
    pub fn build_actor<F>(&self, closure: F) -> Result<usize>
    where
        F: FnOnce() + 'static,
    {
        let mut actors = self.actors.lock().unwrap();
        let slot = actors.len();
        let actor = Actor::build(&self.status, slot, closure)?;
        actors.push(actor);
        Ok(slot)
    }

    /// Graceful stop: `SIGTERM` every actor not yet terminated, then wait.
    pub fn stop(&self) -> Result<()> {
        let actors = self.actors.lock().unwrap();
        for actor in actors.iter() {
            if self.status.get(actor.slot()).check_fatal()? != ActorStatus::Terminated {
                actor.stop(&self.status)?;
            }
        }
        for actor in actors.iter() {
            if self.status.get(actor.slot()).check_fatal()? != ActorStatus::Terminated {
                actor.join(&self.status)?;
            }
        }
        Ok(())
    }

    /// Immediate stop: `SIGKILL` every actor, skipping the graceful signal.
    pub fn force_stop(&self) -> Result<()> {
        let actors = self.actors.lock().unwrap();
        for actor in actors.iter() {
            actor.force_stop(&self.status)?;
        }
        for actor in actors.iter() {
            actor.join(&self.status)?;
        }
        Ok(())
    }

    /// `Cleanup(full)` (§4.7): join every port, then release every
    /// shared-memory segment/semaphore and RPC URL. Must run only in this
    /// manager's owning process; children must never call this.
    pub fn cleanup(&self, full: bool) -> Result<()> {
        let mut ports = self.ports.lock().unwrap();
        for port in ports.iter_mut() {
            port.join()?;
        }
        ports.clear();

        if full {
            self.shm.delete_all_shared_memory();
            self.registry.drain();
            for url in self.rpc_urls.lock().unwrap().drain(..) {
                self.rpc_pool.release(&url);
            }
            self.status.unlink();
        }
        Ok(())
    }

    pub fn track_send_port(&self, port: Box<dyn crate::port::SendPort>) {
        self.ports.lock().unwrap().push(Box::new(JoinableSend(port)));
    }

    pub fn track_recv_port(&self, port: Box<dyn crate::port::RecvPort>) {
        self.ports.lock().unwrap().push(Box::new(JoinableRecv(port)));
    }

    pub fn status(&self) -> &StatusTable {
        &self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{ChannelKind, ChannelOpts};

    #[test]
    fn shmem_channel_round_trips_through_manager() {
        let mgr = ProcessManager::new("manager_test_status", 4).unwrap();
        let mut channel = mgr
            .get_channel(ChannelKind::Shmem, 4, 64, ChannelOpts::new("a", "b"))
            .unwrap();
        channel.send.start().unwrap();
        channel.recv.start().unwrap();

        let meta = crate::metadata::MetaData::new(crate::metadata::DType::UInt8, 1, &[3], &[1]);
        channel.send.send(&meta, &[1, 2, 3]).unwrap();
        let (got_meta, payload) = channel.recv.recv().unwrap();
        assert_eq!(got_meta, meta);
        assert_eq!(payload, vec![1, 2, 3]);

        mgr.track_send_port(channel.send);
        mgr.track_recv_port(channel.recv);
        mgr.cleanup(true).unwrap();
    }
}
