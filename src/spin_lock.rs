// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Port of cpp-ipc/include/libipc/rw_lock.h (spin_lock class).
// Lock-free spin lock with adaptive backoff: pause → yield → sleep.

/// Adaptive backoff matching the C++ `ipc::yield(k)` function.
///
/// - k < 4:  busy spin (do nothing)
/// - k < 16: CPU pause hint
/// - k < 32: thread yield
/// - k >= 32: sleep 1ms
#[inline]
fn adaptive_yield(k: &mut u32) {
    if *k < 4 {
        // busy spin
    } else if *k < 16 {
        std::hint::spin_loop();
    } else if *k < 32 {
        std::thread::yield_now();
    } else {
        std::thread::sleep(std::time::Duration::from_millis(1));
        return;
    }
    *k += 1;
}

/// Public (crate-internal) access to the adaptive yield for other modules.
#[inline]
pub(crate) fn adaptive_yield_pub(k: &mut u32) {
    adaptive_yield(k);
}
