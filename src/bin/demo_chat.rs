// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Rust port of demo/chat/main.cpp, adapted away from the original's
// multi-consumer broadcast (many-to-many fan-out on one channel is an
// explicit non-goal) to a hub topology: each forked client actor gets its
// own private shared-memory channel back to main, and main multiplexes
// them with the selector (component J), printing each client's lines as
// they arrive and demonstrating first-match fairness across clients.
//
// Usage: demo_chat [num_clients] [lines_per_client]

use std::env;
use std::time::Duration;

use actor_ipc::manager::ProcessManager;
use actor_ipc::metadata::{DType, MetaData};
use actor_ipc::port::{ChannelKind, ChannelOpts, RecvPort};
use actor_ipc::selector::{select, Action, ArrivalNotifier};

fn main() {
    let _ = env_logger::try_init();

    let args: Vec<String> = env::args().collect();
    let num_clients: usize = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(3);
    let lines: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(4);

    let mgr = ProcessManager::new("demo_chat_status", num_clients).expect("process manager");

    let mut recvs: Vec<(usize, Box<dyn RecvPort>)> = Vec::with_capacity(num_clients);
    for id in 0..num_clients {
        let opts = ChannelOpts::new(format!("chat_tx_{id}"), format!("chat_rx_{id}"));
        let channel = mgr
            .get_channel(ChannelKind::Shmem, 4, 256, opts)
            .expect("allocate client channel");

        let mut send = channel.send;
        mgr.build_actor(move || {
            let _ = env_logger::try_init();
            send.start().expect("client start");
            for line in 0..lines {
                let text = format!("c{id}> message {line}");
                let meta = MetaData::new(DType::UInt8, 1, &[text.len() as i64], &[1]);
                send.send(&meta, text.as_bytes()).expect("client send");
                std::thread::sleep(Duration::from_millis(50 + (id as u64) * 10));
            }
            send.send(&MetaData::sentinel(), &[]).expect("client quit");
            send.join().expect("client join");
        })
        .expect("build client actor");

        let mut recv = channel.recv;
        recv.start().expect("recv start");
        recvs.push((id, recv));
    }

    let notifier = ArrivalNotifier::new();
    while !recvs.is_empty() {
        let actions: Vec<Action<'_, (usize, MetaData, Vec<u8>)>> = recvs
            .iter_mut()
            .map(|(id, port)| {
                let id = *id;
                Action {
                    port: port.as_mut(),
                    on_ready: Box::new(move |p| {
                        let (meta, payload) = p.recv()?;
                        Ok((id, meta, payload))
                    }),
                }
            })
            .collect();

        let (id, meta, payload) = select(actions, &notifier).expect("select");
        if meta.is_sentinel() {
            println!("c{id} has left the chat");
            let pos = recvs.iter().position(|(cid, _)| *cid == id).unwrap();
            let (_, mut recv) = recvs.remove(pos);
            recv.join().expect("recv join");
            mgr.track_recv_port(recv);
        } else {
            println!("{}", String::from_utf8_lossy(&payload));
        }
    }

    mgr.stop().expect("stop actors");
    mgr.cleanup(true).expect("cleanup");
}
