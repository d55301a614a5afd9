// Change-notification subscriptions
// Tracks which list entries route their field changes into re-evaluation

use std::collections::BTreeSet;

/// Set of subscribed keys with idempotent subscribe / unsubscribe
#[derive(Debug, Clone)]
pub struct ChangeSubscriptions<K: Ord + Copy> {
    subscriptions: BTreeSet<K>,
}

impl<K: Ord + Copy> Default for ChangeSubscriptions<K> {
    fn default() -> Self {
        Self {
            subscriptions: BTreeSet::new(),
        }
    }
}

impl<K: Ord + Copy> ChangeSubscriptions<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `key` if not already subscribed; true if added
    pub fn subscribe(&mut self, key: K) -> bool {
        self.subscriptions.insert(key)
    }

    /// Unsubscribe `key` if subscribed; true if removed
    pub fn unsubscribe(&mut self, key: K) -> bool {
        self.subscriptions.remove(&key)
    }

    /// Drop every subscription, returning the keys that were subscribed
    pub fn unsubscribe_all(&mut self) -> Vec<K> {
        std::mem::take(&mut self.subscriptions).into_iter().collect()
    }

    pub fn is_subscribed(&self, key: K) -> bool {
        self.subscriptions.contains(&key)
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}
