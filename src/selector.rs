// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Component J: waits on several receive ports, returning the first ready.
// Grounded on the original `Selector`'s observer/condvar discipline: scan
// the action list in order under a lock, and if nothing is ready yet, wait
// on a single condition variable that any watched port's arrival broadcasts.

use std::sync::{Arc, Condvar, Mutex};

use crate::error::Result;
use crate::port::RecvPort;

/// A broadcast hook a transport can call whenever a message arrives, so the
/// selector's waiter wakes up instead of polling. Transports that can't
/// cheaply hook an arrival event may omit registering one — the selector
/// still re-scans on every spurious wakeup and falls back to a bounded
/// sleep between scans.
#[derive(Clone, Default)]
pub struct ArrivalNotifier {
    inner: Arc<(Mutex<()>, Condvar)>,
}

impl ArrivalNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called by a transport (or anything producing messages) when state
    /// that might make a port ready has changed.
    pub fn notify(&self) {
        let _guard = self.inner.0.lock().unwrap();
        self.inner.1.notify_all();
    }

    fn wait_timeout(&self, timeout: std::time::Duration) {
        let guard = self.inner.0.lock().unwrap();
        let _ = self.inner.1.wait_timeout(guard, timeout);
    }
}

/// One `(receive port, on-ready callback)` pair passed to `select`.
pub struct Action<'a, T> {
    pub port: &'a mut dyn RecvPort,
    pub on_ready: Box<dyn FnOnce(&mut dyn RecvPort) -> Result<T> + 'a>,
}

/// Scan `actions` in order; the first port whose `probe()` reports ready
/// has its `on_ready` callback invoked and that result returned. Ties are
/// broken by list order — first match wins. Spurious wakeups are tolerated
/// (the scan simply repeats); there is no starvation guarantee across
/// actions given repeated calls. Ownership of `actions` is consumed so the
/// winning pair can be taken out of the list by index without needing `T:
/// Default` placeholders for the rest.
pub fn select<T>(mut actions: Vec<Action<'_, T>>, notifier: &ArrivalNotifier) -> Result<T> {
    loop {
        let mut ready_idx = None;
        for (i, action) in actions.iter_mut().enumerate() {
            if action.port.probe()? {
                ready_idx = Some(i);
                break;
            }
        }
        if let Some(i) = ready_idx {
            let Action { port, on_ready } = actions.remove(i);
            return on_ready(port);
        }
        notifier.wait_timeout(std::time::Duration::from_millis(50));
    }
}
