//! Settling: wait until freshly allocated cells are visible by id.
//!
//! Hosts propagate creations lazily. Instead of a fixed delay every cell is
//! re-fetched by id, with a short sleep between polls, until the host
//! reports it. The fetched value replaces whatever the allocator recorded.

use std::thread;
use std::time::Duration;

use log::{debug, trace, warn};

use crate::entities::{CellKey, CellTable};
use crate::host::StateHost;

/// Polling budget.
#[derive(Debug, Clone, Copy)]
pub struct SettlePolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for SettlePolicy {
    fn default() -> Self {
        Self {
            attempts: 20,
            interval: Duration::from_millis(25),
        }
    }
}

/// Poll every cell in `table` until visible. Cells that never settle are
/// removed from the table and returned.
pub fn settle_cells<H: StateHost + ?Sized>(host: &H, table: &mut CellTable, policy: SettlePolicy) -> Vec<CellKey> {
    let mut dropped = Vec::new();

    for key in table.keys() {
        let Some(record) = table.get_mut(&key) else { continue };
        let mut visible = false;

        for attempt in 0..policy.attempts.max(1) {
            match host.cell_by_id(&record.id) {
                Ok(Some(info)) => {
                    trace!("Cell {} visible after {} polls", record.name, attempt + 1);
                    record.value = info.value;
                    record.cell_type = info.cell_type;
                    visible = true;
                    break;
                }
                Ok(None) => {}
                Err(e) => debug!("Polling cell {}: {}", record.name, e),
            }
            if attempt + 1 < policy.attempts && !policy.interval.is_zero() {
                thread::sleep(policy.interval);
            }
        }

        if !visible {
            warn!(
                "Cell {} not visible after {} polls, dropping it from this run",
                record.name, policy.attempts
            );
            table.remove(&key);
            dropped.push(key);
        }
    }
    dropped
}
