//! Same-timestamp FIFO buckets and the pro-rata allocator.

use crate::engine::entry::{OrderEntry, OrderEntryStore};
use crate::engine::execution::{Allocation, Execution};
use crate::engine::order::OrderId;
use std::collections::VecDeque;

/// Orders on one side, at one price, sharing an arrival timestamp.
///
/// Entries are held in arrival order as id handles into the owning
/// product's [`OrderEntryStore`]. `volume` tracks the sum of the entries'
/// open quantities; `count` tracks how many entries are still live.
#[derive(Debug, Clone)]
pub struct TimeOrderQueue {
    time: f64,
    entries: VecDeque<OrderId>,
    volume: u64,
    count: u64,
}

impl TimeOrderQueue {
    /// Creates an empty bucket for the given arrival timestamp.
    pub fn new(time: f64) -> Self {
        TimeOrderQueue {
            time,
            entries: VecDeque::new(),
            volume: 0,
            count: 0,
        }
    }

    /// The bucket's arrival timestamp.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Sum of the open quantities of the bucket's entries.
    pub fn volume(&self) -> u64 {
        self.volume
    }

    /// Number of live entries (open quantity above zero).
    pub fn count(&self) -> u64 {
        self.count
    }

    /// `true` when the bucket holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The bucket's entry ids in arrival order.
    pub fn entry_ids(&self) -> impl Iterator<Item = &OrderId> {
        self.entries.iter()
    }

    /// Appends `entry` to the bucket.
    pub fn push(&mut self, entry: &OrderEntry) {
        self.volume += entry.remaining();
        self.count += 1;
        self.entries.push_back(entry.order_id().clone());
    }

    /// Cancels `entry`, deducting its open quantity from the bucket.
    ///
    /// Stats are adjusted before the entry is zeroed.
    pub fn cancel(&mut self, entry: &mut OrderEntry) {
        self.volume -= entry.remaining();
        self.count -= 1;
        entry.cancel();
    }

    /// Matches this bucket (bid side) against `ask_queue`.
    ///
    /// The batch quantity is the smaller of the two volumes; it is pro-rata
    /// allocated on each side and the two allocation lists are walked in
    /// parallel, trading `min` quantities and advancing whichever cursor
    /// was exhausted.
    pub fn execute(
        &mut self,
        ask_queue: &mut TimeOrderQueue,
        entries: &mut OrderEntryStore,
    ) -> Vec<Execution> {
        let sum_quantity = self.volume.min(ask_queue.volume);
        if sum_quantity == 0 {
            return Vec::new();
        }

        let bid_allocations = self.allocate(sum_quantity, entries);
        let ask_allocations = ask_queue.allocate(sum_quantity, entries);

        let mut executions = Vec::new();
        let mut b = 0;
        let mut a = 0;
        let mut bid_quantity = bid_allocations[0].quantity;
        let mut ask_quantity = ask_allocations[0].quantity;

        while b < bid_allocations.len() && a < ask_allocations.len() {
            let traded = bid_quantity.min(ask_quantity);

            let bid_fill = entries
                .get_mut(&bid_allocations[b].order_id)
                .expect("allocated bid entry must be indexed")
                .fill(traded);
            let ask_fill = entries
                .get_mut(&ask_allocations[a].order_id)
                .expect("allocated ask entry must be indexed")
                .fill(traded);

            if bid_fill.completes_order() {
                self.count -= 1;
            }
            if ask_fill.completes_order() {
                ask_queue.count -= 1;
            }

            self.volume -= traded;
            ask_queue.volume -= traded;
            bid_quantity -= traded;
            ask_quantity -= traded;

            executions.push(Execution::new(traded, bid_fill, ask_fill));

            if bid_quantity == 0 {
                b += 1;
                if b < bid_allocations.len() {
                    bid_quantity = bid_allocations[b].quantity;
                }
            }
            if ask_quantity == 0 {
                a += 1;
                if a < ask_allocations.len() {
                    ask_quantity = ask_allocations[a].quantity;
                }
            }
        }

        executions
    }

    /// Splits `sum_quantity` across the live entries proportionally to
    /// their open quantities.
    ///
    /// Fractional shares are rounded half-to-even; any difference to the
    /// target is settled one unit at a time, adding from the front of the
    /// bucket or subtracting from the back.
    pub fn allocate(&self, sum_quantity: u64, entries: &OrderEntryStore) -> Vec<Allocation> {
        assert!(
            self.volume > 0 || sum_quantity == 0,
            "cannot allocate from an exhausted bucket"
        );

        let unit = sum_quantity as f64 / self.volume as f64;
        let mut allocations: Vec<Allocation> = self
            .entries
            .iter()
            .filter_map(|id| entries.get(id))
            .filter(|entry| entry.remaining() > 0)
            .map(|entry| Allocation {
                order_id: entry.order_id().clone(),
                quantity: (entry.remaining() as f64 * unit).round_ties_even() as u64,
            })
            .collect();

        let mut current: u64 = allocations.iter().map(|a| a.quantity).sum();

        while current != sum_quantity {
            if current < sum_quantity {
                for allocation in allocations.iter_mut() {
                    if current == sum_quantity {
                        break;
                    }
                    allocation.quantity += 1;
                    current += 1;
                }
            } else {
                for allocation in allocations.iter_mut().rev() {
                    if current == sum_quantity {
                        break;
                    }
                    if allocation.quantity == 0 {
                        continue;
                    }
                    allocation.quantity -= 1;
                    current -= 1;
                }
            }
        }

        allocations
    }
}
