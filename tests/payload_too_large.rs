// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// §8 scenario 6 / §9 resolved open question: a payload whose elsize*total_size
// exceeds the channel's nbytes is rejected with PayloadTooLarge, and the
// slot accounting is left untouched so a subsequent valid send still lands.

use actor_ipc::error::IpcError;
use actor_ipc::metadata::{DType, MetaData};
use actor_ipc::port::{get_channel, ChannelKind, ChannelOpts};
use actor_ipc::registry::{ResourceRegistry, ShmManager};

#[test]
fn oversized_send_is_rejected_and_channel_stays_usable() {
    let registry = ResourceRegistry::new();
    let shm = ShmManager::new();
    let mut channel = get_channel(
        &registry,
        &shm,
        ChannelKind::Shmem,
        2,
        64,
        ChannelOpts::new("big_tx", "big_rx"),
    )
    .unwrap();
    channel.send.start().unwrap();
    channel.recv.start().unwrap();

    let oversized = MetaData::new(DType::UInt8, 1, &[128], &[1]);
    let err = channel.send.send(&oversized, &[0u8; 128]).unwrap_err();
    assert!(matches!(
        err,
        IpcError::PayloadTooLarge { actual: 128, limit: 64 }
    ));

    let fits = MetaData::new(DType::UInt8, 1, &[4], &[1]);
    channel.send.send(&fits, &[1, 2, 3, 4]).unwrap();
    let (got_meta, payload) = channel.recv.recv().unwrap();
    assert_eq!(got_meta, fits);
    assert_eq!(payload, vec![1, 2, 3, 4]);

    channel.send.join().unwrap();
    channel.recv.join().unwrap();
    shm.delete_all_shared_memory();
    registry.drain();
}
