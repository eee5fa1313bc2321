//! Channel-based diff delivery.
//!
//! The diff runs on tokio's blocking pool and feeds a bounded channel. The
//! consumer cancels by dropping or closing its receiver; the producer checks
//! before computing each change and stops at the next one. There is no
//! built-in timeout; wrap the receiver in `tokio::time::timeout` and drop it
//! to give up.

use arbor_value::{Struct, ValueResult};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::change::ValueChanged;
use crate::config::DiffConfig;
use crate::struct_diff::StructDiff;

/// Receiving end of a diff stream.
pub type DiffReceiver = mpsc::Receiver<ValueResult<ValueChanged>>;

/// Start diffing `new` against `old` in the background.
///
/// Returns the change receiver and a handle resolving to the number of
/// changes the producer handed to the channel. An error item is the last
/// item sent. Must be called from within a tokio runtime.
pub fn spawn_diff(new: Struct, old: Struct, config: &DiffConfig) -> (DiffReceiver, JoinHandle<usize>) {
    let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
    let handle = tokio::task::spawn_blocking(move || {
        let mut sent = 0;
        let mut changes = StructDiff::new(&new, &old);
        loop {
            if tx.is_closed() {
                debug!(sent, "diff consumer went away, stopping");
                break;
            }
            let Some(change) = changes.next() else {
                break;
            };
            let failed = change.is_err();
            if tx.blocking_send(change).is_err() {
                debug!(sent, "diff consumer went away, stopping");
                break;
            }
            sent += 1;
            if failed {
                break;
            }
        }
        sent
    });
    (rx, handle)
}
