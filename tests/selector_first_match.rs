// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// §8 scenario 5: two receive ports, one already holding a message. Select
// must return that port's result regardless of list order or whether the
// other port becomes ready later.

use actor_ipc::metadata::{DType, MetaData};
use actor_ipc::port::{get_channel, ChannelKind, ChannelOpts};
use actor_ipc::registry::{ResourceRegistry, ShmManager};
use actor_ipc::selector::{select, Action, ArrivalNotifier};

#[test]
fn select_returns_the_pre_loaded_port_first() {
    let registry = ResourceRegistry::new();
    let shm = ShmManager::new();

    let mut chan_a = get_channel(
        &registry,
        &shm,
        ChannelKind::Shmem,
        2,
        32,
        ChannelOpts::new("sel_a_tx", "sel_a_rx"),
    )
    .unwrap();
    let mut chan_b = get_channel(
        &registry,
        &shm,
        ChannelKind::Shmem,
        2,
        32,
        ChannelOpts::new("sel_b_tx", "sel_b_rx"),
    )
    .unwrap();
    chan_a.send.start().unwrap();
    chan_a.recv.start().unwrap();
    chan_b.send.start().unwrap();
    chan_b.recv.start().unwrap();

    let meta = MetaData::new(DType::UInt8, 1, &[1], &[1]);
    chan_b.send.send(&meta, &[42]).unwrap();

    let notifier = ArrivalNotifier::new();
    let actions = vec![
        Action {
            port: chan_a.recv.as_mut(),
            on_ready: Box::new(|_| -> actor_ipc::error::Result<&'static str> { Ok("a") }),
        },
        Action {
            port: chan_b.recv.as_mut(),
            on_ready: Box::new(|p| {
                p.recv()?;
                Ok("b")
            }),
        },
    ];

    let winner = select(actions, &notifier).unwrap();
    assert_eq!(winner, "b");

    chan_a.send.join().unwrap();
    chan_a.recv.join().unwrap();
    chan_b.send.join().unwrap();
    chan_b.recv.join().unwrap();
    shm.delete_all_shared_memory();
    registry.drain();
}
