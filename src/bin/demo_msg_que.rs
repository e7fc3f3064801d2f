// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Rust port of demo/msg_que/main.cpp, adapted to a single forked
// producer/consumer pair over one shared-memory channel (many-to-many
// broadcast on one channel is an explicit non-goal, so the original
// multi-consumer `ipc::route` does not carry over). The producer actor
// sends random-sized messages as fast as the ring's back-pressure allows;
// main consumes them and prints measured throughput once a second, the
// same reporting cadence the original used.
//
// Usage: demo_msg_que [seconds]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use actor_ipc::manager::ProcessManager;
use actor_ipc::metadata::{DType, MetaData};
use actor_ipc::port::{ChannelKind, ChannelOpts};

const MIN_SZ: usize = 128;
const MAX_SZ: usize = 1024 * 16;

fn str_of_size(sz: usize) -> String {
    if sz > 1024 * 1024 {
        format!("{} MB", sz / (1024 * 1024))
    } else if sz > 1024 {
        format!("{} KB", sz / 1024)
    } else {
        format!("{sz} bytes")
    }
}

fn main() {
    let _ = env_logger::try_init();

    let seconds: u64 = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(5);

    println!(
        "demo_msg_que: start [{} - {}]...",
        str_of_size(MIN_SZ),
        str_of_size(MAX_SZ)
    );

    let mgr = ProcessManager::new("demo_msg_que_status", 1).expect("process manager");
    let channel = mgr
        .get_channel(
            ChannelKind::Shmem,
            64,
            MAX_SZ,
            ChannelOpts::new("msg_que_tx", "msg_que_rx"),
        )
        .expect("allocate channel");

    let mut send = channel.send;
    let mut recv = channel.recv;

    mgr.build_actor(move || {
        let _ = env_logger::try_init();
        send.start().expect("sender start");

        // Simple LCG for fast pseudo-random sizes without external deps.
        let mut rng_state: u64 = 0xdeadbeef_cafebabe;
        let buf = vec![0u8; MAX_SZ];
        let deadline = Instant::now() + Duration::from_secs(seconds);

        while Instant::now() < deadline {
            rng_state = rng_state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let sz = MIN_SZ + (rng_state >> 32) as usize % (MAX_SZ - MIN_SZ + 1);
            let meta = MetaData::new(DType::UInt8, 1, &[sz as i64], &[1]);
            send.send(&meta, &buf[..sz]).expect("send");
        }

        send.send(&MetaData::sentinel(), &[]).expect("send quit");
        send.join().expect("sender join");
    })
    .expect("build producer actor");

    recv.start().expect("receiver start");
    let counter = Arc::new(AtomicUsize::new(0));
    let done = Arc::new(std::sync::atomic::AtomicBool::new(false));

    let counting = {
        let counter = Arc::clone(&counter);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            while !done.load(Ordering::Acquire) {
                thread::sleep(Duration::from_secs(1));
                let bytes = counter.swap(0, Ordering::Relaxed);
                println!("{}/s", str_of_size(bytes));
            }
        })
    };

    loop {
        let (meta, payload) = recv.recv().expect("recv");
        if meta.is_sentinel() {
            break;
        }
        counter.fetch_add(payload.len(), Ordering::Relaxed);
    }

    done.store(true, Ordering::Release);
    counting.join().expect("counting thread");

    recv.join().expect("receiver join");
    mgr.track_recv_port(recv);

    println!("demo_msg_que: quit...");
    mgr.stop().expect("stop actors");
    mgr.cleanup(true).expect("cleanup");
}
