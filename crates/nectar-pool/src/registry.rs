//! Stake registry: the live [`StakeRecord`]s keyed by token id.
//!
//! Purely a record store; the aggregate counters live in
//! [`PoolState`](nectar_core::types::PoolState) and are maintained by the
//! pool engine alongside every insert and remove.

use std::collections::HashMap;

use nectar_core::types::{AccountId, StakeRecord, TokenId};

/// In-memory map of live stakes.
#[derive(Debug, Clone, Default)]
pub struct StakeRegistry {
    records: HashMap<TokenId, StakeRecord>,
}

impl StakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the live record for a token.
    pub fn get(&self, id: TokenId) -> Option<&StakeRecord> {
        self.records.get(&id)
    }

    /// Whether a live record exists for the token.
    pub fn contains(&self, id: TokenId) -> bool {
        self.records.contains_key(&id)
    }

    /// Insert or replace a record.
    pub fn insert(&mut self, record: StakeRecord) {
        self.records.insert(record.token_id, record);
    }

    /// Remove a record, returning it if present.
    pub fn remove(&mut self, id: TokenId) -> Option<StakeRecord> {
        self.records.remove(&id)
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over all live records, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &StakeRecord> {
        self.records.values()
    }

    /// Token ids currently staked by `owner`, sorted for stable output.
    pub fn tokens_of(&self, owner: &AccountId) -> Vec<TokenId> {
        let mut ids: Vec<TokenId> = self
            .records
            .values()
            .filter(|rec| rec.owner == *owner)
            .map(|rec| rec.token_id)
            .collect();
        ids.sort();
        ids
    }
}
