// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// §8 scenario 1: one sender and one receiver in a single process, sending
// ten monotonically increasing payloads over a capacity-5 ring.

use actor_ipc::metadata::{DType, MetaData};
use actor_ipc::port::{get_channel, ChannelKind, ChannelOpts};
use actor_ipc::registry::{ResourceRegistry, ShmManager};

#[test]
fn ping_pong_is_fifo_and_monotone() {
    let registry = ResourceRegistry::new();
    let shm = ShmManager::new();
    let mut channel = get_channel(
        &registry,
        &shm,
        ChannelKind::Shmem,
        5,
        8,
        ChannelOpts::new("ping_tx", "ping_rx"),
    )
    .unwrap();
    channel.send.start().unwrap();
    channel.recv.start().unwrap();

    let mut value = 1i64;
    for _ in 0..10 {
        let meta = MetaData::new(DType::Int64, 8, &[1], &[8]);
        channel.send.send(&meta, &value.to_le_bytes()).unwrap();

        let (got_meta, payload) = channel.recv.recv().unwrap();
        assert_eq!(got_meta, meta);
        let got = i64::from_le_bytes(payload.try_into().unwrap());
        assert_eq!(got, value);

        value += 1;
    }

    channel.send.join().unwrap();
    channel.recv.join().unwrap();
    shm.delete_all_shared_memory();
    registry.drain();
}
