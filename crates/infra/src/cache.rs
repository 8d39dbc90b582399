//! Bounded read cache with explicit invalidation.
//!
//! The write path (reconciliation engine) invalidates entries after each
//! store write commits; the read path populates entries on miss. Eviction is
//! least-recently-used and never affects correctness — an evicted entry just
//! falls through to the underlying store.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::Mutex;

use wareflow_core::{MovementId, ProductId, WarehouseId};
use wareflow_movements::{Movement, WarehouseStock};

/// Fixed-capacity map with least-recently-used eviction.
///
/// Both reads and writes count as a use. Not thread-safe on its own;
/// `ReadCache` wraps each instance in a mutex.
#[derive(Debug)]
pub struct LruCache<K, V> {
    capacity: usize,
    map: HashMap<K, V>,
    order: VecDeque<K>,
}

impl<K, V> LruCache<K, V>
where
    K: Clone + Eq + Hash,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            map: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn get(&mut self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let value = self.map.get(key).cloned()?;
        self.touch(key);
        Some(value)
    }

    pub fn insert(&mut self, key: K, value: V) {
        if self.map.insert(key.clone(), value).is_some() {
            self.touch(&key);
            return;
        }
        self.order.push_back(key);
        if self.map.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.map.remove(&oldest);
            }
        }
    }

    pub fn remove(&mut self, key: &K) {
        if self.map.remove(key).is_some() {
            if let Some(pos) = self.order.iter().position(|k| k == key) {
                self.order.remove(pos);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn touch(&mut self, key: &K) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        self.order.push_back(key.clone());
    }
}

/// Memoization layer in front of the two stores.
///
/// A poisoned lock degrades to cache misses rather than failing reads.
#[derive(Debug)]
pub struct ReadCache {
    stocks: Mutex<LruCache<(WarehouseId, ProductId), WarehouseStock>>,
    movements: Mutex<LruCache<MovementId, Movement>>,
}

impl ReadCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            stocks: Mutex::new(LruCache::new(capacity)),
            movements: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get_stock(
        &self,
        warehouse_id: &WarehouseId,
        product_id: &ProductId,
    ) -> Option<WarehouseStock> {
        let mut cache = self.stocks.lock().ok()?;
        cache.get(&(warehouse_id.clone(), product_id.clone()))
    }

    pub fn put_stock(&self, stock: WarehouseStock) {
        if let Ok(mut cache) = self.stocks.lock() {
            cache.insert(
                (stock.warehouse_id.clone(), stock.product_id.clone()),
                stock,
            );
        }
    }

    pub fn invalidate_stock(&self, warehouse_id: &WarehouseId, product_id: &ProductId) {
        if let Ok(mut cache) = self.stocks.lock() {
            cache.remove(&(warehouse_id.clone(), product_id.clone()));
        }
    }

    pub fn get_movement(&self, movement_id: &MovementId) -> Option<Movement> {
        let mut cache = self.movements.lock().ok()?;
        cache.get(movement_id)
    }

    pub fn put_movement(&self, movement: Movement) {
        if let Ok(mut cache) = self.movements.lock() {
            cache.insert(movement.movement_id.clone(), movement);
        }
    }

    pub fn invalidate_movement(&self, movement_id: &MovementId) {
        if let Ok(mut cache) = self.movements.lock() {
            cache.remove(movement_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lru_evicts_least_recently_used() {
        let mut cache = LruCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);

        // Touch "a" so "b" becomes the eviction candidate.
        assert_eq!(cache.get(&"a"), Some(1));
        cache.insert("c", 3);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"b"), None);
        assert_eq!(cache.get(&"a"), Some(1));
        assert_eq!(cache.get(&"c"), Some(3));
    }

    #[test]
    fn reinsert_updates_value_without_growing() {
        let mut cache = LruCache::new(2);
        cache.insert("a", 1);
        cache.insert("a", 10);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"a"), Some(10));
    }

    #[test]
    fn remove_drops_the_entry() {
        let mut cache = LruCache::new(2);
        cache.insert("a", 1);
        cache.remove(&"a");
        assert!(cache.is_empty());
        assert_eq!(cache.get(&"a"), None);
    }

    #[test]
    fn invalidated_stock_entry_misses() {
        use wareflow_movements::WarehouseStock;

        let cache = ReadCache::new(8);
        let w = WarehouseId::new("WH-1").unwrap();
        let p = ProductId::new("PROD-1").unwrap();

        cache.put_stock(WarehouseStock {
            warehouse_id: w.clone(),
            product_id: p.clone(),
            quantity: 100,
        });
        assert!(cache.get_stock(&w, &p).is_some());

        cache.invalidate_stock(&w, &p);
        assert!(cache.get_stock(&w, &p).is_none());
    }
}
