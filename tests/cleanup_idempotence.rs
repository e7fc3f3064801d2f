// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// §8 scenario 4: allocate a channel, join both ports, run Cleanup, then run
// Cleanup again. The second call must not error and must not attempt to
// unlink anything twice.

use actor_ipc::manager::ProcessManager;
use actor_ipc::port::{ChannelKind, ChannelOpts};

#[test]
fn cleanup_twice_is_a_no_op_the_second_time() {
    let mgr = ProcessManager::new("cleanup_status", 1).unwrap();
    let channel = mgr
        .get_channel(ChannelKind::Shmem, 2, 16, ChannelOpts::new("cl_tx", "cl_rx"))
        .unwrap();

    let mut send = channel.send;
    let mut recv = channel.recv;
    send.start().unwrap();
    recv.start().unwrap();
    send.join().unwrap();
    recv.join().unwrap();

    mgr.track_send_port(send);
    mgr.track_recv_port(recv);

    mgr.cleanup(true).unwrap();
    mgr.cleanup(true).unwrap();
}
