// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Worker regions
//!
//! A [`WorkerHandle`] is the capability to mutate one thread's routing store.
//! [`TargetTable::parallel`] hands one handle to each worker of the table's
//! pool; the handles borrow disjoint stores, so workers fill their stores
//! concurrently without locks.

use std::sync::Mutex;

use crate::error::{Result, RoutingError};
use crate::store::RoutingStore;
use crate::table::{TableStats, TargetTable};
use crate::target_data::{decode_slots, TargetData};
use crate::topology::ConstructionFeed;

/// Exclusive access to the routing store of one worker thread
pub struct WorkerHandle<'a> {
    store: &'a mut RoutingStore,
    num_ranks: u32,
    allow_lid_bound_shrink: bool,
}

impl<'a> WorkerHandle<'a> {
    pub(crate) fn new(store: &'a mut RoutingStore, num_ranks: u32, allow_lid_bound_shrink: bool) -> Self {
        Self {
            store,
            num_ranks,
            allow_lid_bound_shrink,
        }
    }

    /// Thread owning the store behind this handle
    pub fn thread_id(&self) -> usize {
        self.store.thread()
    }

    pub fn store(&self) -> &RoutingStore {
        self.store
    }

    fn check_owner(&self, thread_id: usize) -> Result<()> {
        let owner = self.store.thread();
        if thread_id != owner {
            return Err(RoutingError::ForeignThread {
                caller: thread_id,
                owner,
            });
        }
        Ok(())
    }

    fn check_rank(&self, rank: u32) -> Result<()> {
        if rank >= self.num_ranks {
            return Err(RoutingError::RankOutOfRange {
                rank,
                num_ranks: self.num_ranks,
            });
        }
        Ok(())
    }

    pub fn prepare(&mut self, thread_id: usize, max_lid_bound: usize) -> Result<()> {
        self.check_owner(thread_id)?;
        self.store.prepare(max_lid_bound, self.allow_lid_bound_shrink)
    }

    pub fn add_target(&mut self, thread_id: usize, rank: u32, data: &TargetData) -> Result<()> {
        self.check_owner(thread_id)?;
        self.check_rank(rank)?;
        self.store.add_target(rank, data)
    }

    /// Decodes and validates every record of `bytes` before inserting any,
    /// so a rejected buffer inserts nothing.
    pub fn add_encoded_targets(&mut self, thread_id: usize, rank: u32, bytes: &[u8]) -> Result<usize> {
        self.check_owner(thread_id)?;
        self.check_rank(rank)?;
        let records = decode_slots(bytes)?.collect::<Result<Vec<_>>>()?;
        for data in &records {
            self.store.check_record(rank, data)?;
        }
        for data in &records {
            self.store.add_target(rank, data)?;
        }
        Ok(records.len())
    }

    pub fn compress_secondary_send_buffer_pos(&mut self, thread_id: usize) -> Result<()> {
        self.check_owner(thread_id)?;
        self.store.compress_secondary_send_buffer_pos()
    }
}

impl TargetTable {
    /// Runs `op` once on every worker of the table's pool.
    ///
    /// Pool thread `i` always receives the handle of store `i`. Every worker
    /// runs to completion; results come back in thread order and the error of
    /// the lowest failing thread is returned.
    pub fn parallel<F, R>(&mut self, op: F) -> Result<Vec<R>>
    where
        F: Fn(&mut WorkerHandle<'_>) -> Result<R> + Sync,
        R: Send,
    {
        let (pool, stores, num_ranks, allow_lid_bound_shrink) = self.parts_mut()?;
        let num_threads = stores.len();
        // each slot is taken exactly once, by the pool thread with its index
        let slots: Vec<Mutex<Option<&mut RoutingStore>>> =
            stores.iter_mut().map(|store| Mutex::new(Some(store))).collect();

        let results = pool.broadcast(|ctx| {
            let thread = ctx.index();
            let store = slots
                .get(thread)
                .and_then(|slot| slot.lock().ok())
                .and_then(|mut slot| slot.take());
            match store {
                Some(store) => {
                    let mut worker = WorkerHandle::new(store, num_ranks, allow_lid_bound_shrink);
                    op(&mut worker)
                }
                None => Err(RoutingError::UnknownThread {
                    thread,
                    num_threads,
                }),
            }
        });
        results.into_iter().collect()
    }

    /// Prepares every store, drains `feed`, and compresses, all in one
    /// worker region.
    pub fn run_construction_phase<F>(&mut self, max_lid_bound: usize, feed: &F) -> Result<TableStats>
    where
        F: ConstructionFeed + Sync + ?Sized,
    {
        let per_thread = self.parallel(|worker| {
            let thread_id = worker.thread_id();
            worker.prepare(thread_id, max_lid_bound)?;
            for (rank, data) in feed.records(thread_id) {
                worker.add_target(thread_id, rank, &data)?;
            }
            worker.compress_secondary_send_buffer_pos(thread_id)?;
            Ok(worker.store().stats())
        })?;

        let stats = TableStats::from_stores(per_thread);
        self.log_phase_summary(&stats);
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{TablePhase, TableSettings};
    use crate::topology::StaticTopology;

    fn table(num_threads: usize) -> TargetTable {
        let mut table = TargetTable::new(TableSettings::default()).unwrap();
        table
            .initialize(&StaticTopology::new(num_threads, 2, 0).unwrap())
            .unwrap();
        table
    }

    #[test]
    fn test_foreign_thread_write_rejected() {
        let mut table = table(2);
        let results = table
            .parallel(|worker| {
                let own = worker.thread_id();
                worker.prepare(own, 2)?;
                let other = 1 - own;
                let rejected = worker.add_target(other, 0, &TargetData::primary(0, 0, 0, 0));
                Ok(rejected)
            })
            .unwrap();

        assert_eq!(
            results,
            vec![
                Err(RoutingError::ForeignThread { caller: 1, owner: 0 }),
                Err(RoutingError::ForeignThread { caller: 0, owner: 1 }),
            ]
        );
        assert_eq!(table.stats().num_targets, 0);
    }

    #[test]
    fn test_foreign_compress_rejected() {
        let mut table = table(1);
        let result = table.parallel(|worker| worker.compress_secondary_send_buffer_pos(5));
        assert_eq!(
            result,
            Err(RoutingError::ForeignThread { caller: 5, owner: 0 })
        );
    }

    #[test]
    fn test_parallel_returns_results_in_thread_order() {
        let mut table = table(4);
        let ids = table.parallel(|worker| Ok(worker.thread_id())).unwrap();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_parallel_requires_initialized_table() {
        let mut table = TargetTable::new(TableSettings::default()).unwrap();
        assert_eq!(
            table.parallel(|_| Ok(())),
            Err(RoutingError::NotInitialized)
        );
    }

    #[test]
    fn test_malformed_buffer_inserts_nothing() {
        let mut table = table(1);
        table.prepare(0, 4).unwrap();

        let mut buffer = Vec::new();
        buffer.extend_from_slice(TargetData::primary(1, 0, 0, 2).to_wire().unwrap().as_bytes());
        let mut bad = [0u8; 12];
        bad[3] = 0xc0;
        buffer.extend_from_slice(&bad);

        assert_eq!(
            table.add_encoded_targets(0, 0, &buffer),
            Err(RoutingError::InvalidDiscriminator(3))
        );
        assert!(table.primary_targets(0, 1).unwrap().is_empty());
    }

    #[test]
    fn test_out_of_range_record_inserts_nothing() {
        let mut table = table(1);
        table.prepare(0, 2).unwrap();

        // both slots decode; the secondary LID sits on the primary-only slot
        let mut buffer = Vec::new();
        buffer.extend_from_slice(TargetData::primary(1, 0, 0, 2).to_wire().unwrap().as_bytes());
        buffer.extend_from_slice(TargetData::secondary(2, 5).to_wire().unwrap().as_bytes());

        assert_eq!(
            table.add_encoded_targets(0, 0, &buffer),
            Err(RoutingError::LidOutOfRange {
                thread: 0,
                lid: 2,
                slots: 2,
                side: crate::error::TargetSide::Secondary
            })
        );
        assert!(table.primary_targets(0, 1).unwrap().is_empty());
        assert_eq!(table.store(0).unwrap().phase(), crate::store::StorePhase::Prepared);
    }

    #[test]
    fn test_construction_phase_from_feed() {
        let mut table = table(2);
        let feed = vec![
            vec![
                (1, TargetData::primary(0, 1, 2, 10)),
                (0, TargetData::secondary(1, 8)),
                (0, TargetData::secondary(1, 4)),
                (0, TargetData::secondary(1, 8)),
            ],
            vec![(0, TargetData::primary(2, 0, 0, 11))],
        ];

        let stats = table.run_construction_phase(3, &feed).unwrap();
        assert_eq!(stats.num_targets, 2);
        assert_eq!(stats.num_secondary_send_buffer_pos, 2);
        assert_eq!(table.phase(), TablePhase::Ready);
        assert_eq!(table.secondary_send_buffer_pos(0, 1).unwrap(), &[4, 8]);
        assert_eq!(table.primary_targets(0, 0).unwrap()[0].rank(), 1);
        assert_eq!(table.primary_targets(1, 2).unwrap()[0].lcid(), 11);
    }
}
