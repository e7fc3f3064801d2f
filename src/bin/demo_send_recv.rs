// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Rust port of demo/send_recv/main.cpp, adapted to the fork-based actor
// model: the process manager allocates one shared-memory channel, forks an
// actor to hold the send half, and main holds the receive half directly.
// This is §8 scenario 1 (single-process ping) run continuously instead of
// a fixed ten iterations.
//
// Usage: demo_send_recv [size] [count] [interval_ms]

use std::env;
use std::time::Duration;

use actor_ipc::manager::ProcessManager;
use actor_ipc::metadata::{DType, MetaData};
use actor_ipc::port::{ChannelKind, ChannelOpts};

fn main() {
    let _ = env_logger::try_init();

    let args: Vec<String> = env::args().collect();
    let size: usize = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(4096);
    let count: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(10);
    let interval_ms: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(200);

    let mgr = ProcessManager::new("demo_send_recv_status", 1).expect("process manager");
    let channel = mgr
        .get_channel(
            ChannelKind::Shmem,
            8,
            size,
            ChannelOpts::new("send_recv_tx", "send_recv_rx"),
        )
        .expect("allocate channel");

    let mut send = channel.send;
    let mut recv = channel.recv;

    mgr.build_actor(move || {
        let _ = env_logger::try_init();
        send.start().expect("sender start");
        let buffer = vec![b'A'; size];
        for i in 0..count {
            let meta = MetaData::new(DType::UInt8, 1, &[size as i64], &[1]);
            send.send(&meta, &buffer).expect("send");
            println!("send #{i}: {size} bytes");
            std::thread::sleep(Duration::from_millis(interval_ms));
        }
        send.join().expect("sender join");
    })
    .expect("build sender actor");

    recv.start().expect("receiver start");
    for i in 0..count {
        let (meta, payload) = recv.recv().expect("recv");
        println!("recv #{i}: {} bytes (nd={})", payload.len(), meta.nd);
    }
    recv.join().expect("receiver join");
    mgr.track_recv_port(recv);

    mgr.stop().expect("stop actors");
    mgr.cleanup(true).expect("cleanup");
}
