// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// §8 scenario 2: four SHMEM channels (mp→a1, a1→a2, a2→a1, a1→mp) wired
// between two forked actors and main. Each round, actor1 increments
// element 0 and forwards to actor2, actor2 increments and returns,
// actor1 increments once more and returns to main. After 1000 rounds the
// cumulative effect of three increments per round must show through.

#![cfg(unix)]

use actor_ipc::manager::ProcessManager;
use actor_ipc::metadata::{DType, MetaData};
use actor_ipc::port::{ChannelKind, ChannelOpts};

const ROUNDS: i64 = 1000;
const LEN: usize = 10000;
const NBYTES: usize = LEN * 8;

fn bump_first_element(payload: &mut [u8]) {
    let mut v = i64::from_le_bytes(payload[0..8].try_into().unwrap());
    v += 1;
    payload[0..8].copy_from_slice(&v.to_le_bytes());
}

#[test]
fn relay_applies_three_increments_per_round() {
    let mgr = ProcessManager::new("relay_status", 2).unwrap();

    let mp_a1 = mgr
        .get_channel(ChannelKind::Shmem, 128, NBYTES, ChannelOpts::new("mp", "a1"))
        .unwrap();
    let a1_a2 = mgr
        .get_channel(ChannelKind::Shmem, 128, NBYTES, ChannelOpts::new("a1", "a2"))
        .unwrap();
    let a2_a1 = mgr
        .get_channel(ChannelKind::Shmem, 128, NBYTES, ChannelOpts::new("a2", "a1"))
        .unwrap();
    let a1_mp = mgr
        .get_channel(ChannelKind::Shmem, 128, NBYTES, ChannelOpts::new("a1", "mp"))
        .unwrap();

    let mut mp_send = mp_a1.send;
    let mut mp_recv = a1_mp.recv;

    let mut a1_recv_from_mp = mp_a1.recv;
    let mut a1_send_to_a2 = a1_a2.send;
    let mut a1_recv_from_a2 = a2_a1.recv;
    let mut a1_send_to_mp = a1_mp.send;

    let mut a2_recv_from_a1 = a1_a2.recv;
    let mut a2_send_to_a1 = a2_a1.send;

    mgr.build_actor(move || {
        a2_recv_from_a1.start().unwrap();
        a2_send_to_a1.start().unwrap();
        for _ in 0..ROUNDS {
            let (meta, mut payload) = a2_recv_from_a1.recv().unwrap();
            bump_first_element(&mut payload);
            a2_send_to_a1.send(&meta, &payload).unwrap();
        }
        a2_recv_from_a1.join().unwrap();
        a2_send_to_a1.join().unwrap();
    })
    .unwrap();

    mgr.build_actor(move || {
        a1_recv_from_mp.start().unwrap();
        a1_send_to_a2.start().unwrap();
        a1_recv_from_a2.start().unwrap();
        a1_send_to_mp.start().unwrap();
        for _ in 0..ROUNDS {
            let (meta, mut payload) = a1_recv_from_mp.recv().unwrap();
            bump_first_element(&mut payload);
            a1_send_to_a2.send(&meta, &payload).unwrap();

            let (meta2, mut payload2) = a1_recv_from_a2.recv().unwrap();
            bump_first_element(&mut payload2);
            a1_send_to_mp.send(&meta2, &payload2).unwrap();
        }
        a1_recv_from_mp.join().unwrap();
        a1_send_to_a2.join().unwrap();
        a1_recv_from_a2.join().unwrap();
        a1_send_to_mp.join().unwrap();
    })
    .unwrap();

    mp_send.start().unwrap();
    mp_recv.start().unwrap();

    let dims = [LEN as i64];
    let strides = [8i64];
    let mut base = vec![0i64; LEN];
    for slot in base.iter_mut().take(10) {
        *slot = 1;
    }

    let mut last_payload = Vec::new();
    for _ in 0..ROUNDS {
        let meta = MetaData::new(DType::Int64, 8, &dims, &strides);
        let bytes: Vec<u8> = base.iter().flat_map(|v| v.to_le_bytes()).collect();
        mp_send.send(&meta, &bytes).unwrap();

        let (_, payload) = mp_recv.recv().unwrap();
        last_payload = payload;
        base = last_payload
            .chunks_exact(8)
            .map(|c| i64::from_le_bytes(c.try_into().unwrap()))
            .collect();
    }

    let final_first = i64::from_le_bytes(last_payload[0..8].try_into().unwrap());
    assert_eq!(final_first, 1 + ROUNDS * 3);

    mp_send.join().unwrap();
    mp_recv.join().unwrap();
    mgr.stop().unwrap();
    mgr.cleanup(true).unwrap();
}
