//! Bounded read cache for account snapshots
//!
//! Entries expire `ttl` after insertion and the least recently used entry is
//! evicted once `capacity` is exceeded. The cache sits beside the write path:
//! the engine and the state machine never consult it, they only notify it
//! through [`MutationListener`] so stale snapshots are dropped.
//!
//! Every invalidation bumps a generation counter. A reader that fills the
//! cache after a store read captures the generation first and inserts with
//! [`AccountCache::put_if_fresh`], so a snapshot read before a concurrent
//! write is never stored after that write's invalidation.

use crate::core::traits::MutationListener;
use crate::types::{Account, AccountId};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Entry {
    account: Account,
    inserted_at: Instant,
    last_used: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<AccountId, Entry>,
    // last_used tick -> id, oldest first
    recency: BTreeMap<u64, AccountId>,
    tick: u64,
    generation: u64,
}

impl CacheState {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn remove(&mut self, id: &AccountId) -> Option<Entry> {
        let entry = self.entries.remove(id)?;
        self.recency.remove(&entry.last_used);
        Some(entry)
    }

    fn insert(&mut self, account: Account, capacity: usize) {
        self.remove(&account.id);

        let tick = self.next_tick();
        self.recency.insert(tick, account.id.clone());
        self.entries.insert(
            account.id.clone(),
            Entry {
                account,
                inserted_at: Instant::now(),
                last_used: tick,
            },
        );

        while self.entries.len() > capacity {
            let Some((_, oldest)) = self.recency.pop_first() else {
                break;
            };
            self.entries.remove(&oldest);
        }
    }
}

/// LRU + TTL cache of account snapshots
#[derive(Debug)]
pub struct AccountCache {
    capacity: usize,
    ttl: Duration,
    state: Mutex<CacheState>,
}

impl AccountCache {
    /// Create a cache
    ///
    /// A capacity of zero disables caching; a zero `ttl` expires entries
    /// immediately.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        AccountCache {
            capacity,
            ttl,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Fetch a live snapshot, marking it as recently used
    pub fn get(&self, id: &AccountId) -> Option<Account> {
        let mut state = self.state.lock();

        let expired = state
            .entries
            .get(id)
            .map(|entry| entry.inserted_at.elapsed() >= self.ttl)?;
        if expired {
            state.remove(id);
            return None;
        }

        let tick = state.next_tick();
        let entry = state.entries.get_mut(id)?;
        let previous = std::mem::replace(&mut entry.last_used, tick);
        let account = entry.account.clone();

        state.recency.remove(&previous);
        state.recency.insert(tick, id.clone());
        Some(account)
    }

    /// Insert or refresh a snapshot
    pub fn put(&self, account: Account) {
        if self.capacity == 0 {
            return;
        }

        self.state.lock().insert(account, self.capacity);
    }

    /// Current invalidation generation
    ///
    /// Capture it before reading the store and pass it to
    /// [`AccountCache::put_if_fresh`].
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// Insert a snapshot unless an invalidation happened since `generation`
    ///
    /// # Returns
    ///
    /// `true` if the snapshot was stored.
    pub fn put_if_fresh(&self, account: Account, generation: u64) -> bool {
        if self.capacity == 0 {
            return false;
        }

        let mut state = self.state.lock();
        if state.generation != generation {
            return false;
        }
        state.insert(account, self.capacity);
        true
    }

    /// Drop the snapshot of one account
    pub fn invalidate(&self, id: &AccountId) {
        let mut state = self.state.lock();
        state.generation += 1;
        state.remove(id);
    }

    /// Drop every snapshot
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.generation += 1;
        state.entries.clear();
        state.recency.clear();
    }

    /// Drop expired snapshots, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let mut state = self.state.lock();
        let expired: Vec<AccountId> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.inserted_at.elapsed() >= self.ttl)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            state.remove(id);
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MutationListener for AccountCache {
    fn accounts_changed(&self, accounts: &[&AccountId]) {
        let mut state = self.state.lock();
        state.generation += 1;
        for id in accounts {
            state.remove(id);
        }
    }
}
