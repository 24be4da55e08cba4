//! Inventory contract and the in-memory store.
//!
//! The dispatcher validates orders against the store before creating a task
//! and reserves the ordered quantity at that moment; stock tasks add their
//! quantity when the robot drops it on the shelf.

use std::sync::{Mutex, MutexGuard};

use rustc_hash::FxHashMap;

use wf_core::{GridPos, ProductId};

use crate::{DispatchError, DispatchResult};

/// Product quantities and shelf locations.
///
/// # Thread safety
///
/// Called from the dispatcher and from robot threads (stock tasks), so every
/// method takes `&self`.  Each call must be atomic on its own.
pub trait InventoryStore: Send + Sync {
    /// Current quantity, or `None` for an unknown product.
    fn quantity(&self, product: ProductId) -> Option<u32>;

    /// Shelf cell the product is stored on.
    fn location_of(&self, product: ProductId) -> Option<GridPos>;

    /// Add `amount`; returns the new quantity.
    fn increase_quantity(&self, product: ProductId, amount: u32) -> DispatchResult<u32>;

    /// Remove `amount` if that much is in stock; returns the new quantity.
    fn decrease_quantity(&self, product: ProductId, amount: u32) -> DispatchResult<u32>;
}

#[derive(Copy, Clone, Debug)]
struct Entry {
    location: GridPos,
    quantity: u32,
}

/// A `Mutex`-guarded map from product to shelf and quantity.
#[derive(Default)]
pub struct MemoryInventory {
    entries: Mutex<FxHashMap<ProductId, Entry>>,
}

impl MemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_product(self, product: ProductId, location: GridPos, quantity: u32) -> Self {
        self.insert(product, location, quantity);
        self
    }

    /// Register `product` on `location`, replacing any previous entry.
    pub fn insert(&self, product: ProductId, location: GridPos, quantity: u32) {
        self.lock().insert(product, Entry { location, quantity });
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// All products with their quantity, ordered by id.
    pub fn snapshot(&self) -> Vec<(ProductId, u32)> {
        let mut all: Vec<_> = self.lock().iter().map(|(&p, e)| (p, e.quantity)).collect();
        all.sort_unstable();
        all
    }

    fn lock(&self) -> MutexGuard<'_, FxHashMap<ProductId, Entry>> {
        self.entries.lock().expect("inventory mutex poisoned")
    }
}

impl InventoryStore for MemoryInventory {
    fn quantity(&self, product: ProductId) -> Option<u32> {
        self.lock().get(&product).map(|e| e.quantity)
    }

    fn location_of(&self, product: ProductId) -> Option<GridPos> {
        self.lock().get(&product).map(|e| e.location)
    }

    fn increase_quantity(&self, product: ProductId, amount: u32) -> DispatchResult<u32> {
        let mut entries = self.lock();
        let entry = entries.get_mut(&product).ok_or(DispatchError::UnknownProduct(product))?;
        entry.quantity = entry
            .quantity
            .checked_add(amount)
            .ok_or(DispatchError::QuantityOverflow { product })?;
        Ok(entry.quantity)
    }

    fn decrease_quantity(&self, product: ProductId, amount: u32) -> DispatchResult<u32> {
        let mut entries = self.lock();
        let entry = entries.get_mut(&product).ok_or(DispatchError::UnknownProduct(product))?;
        if entry.quantity < amount {
            return Err(DispatchError::InsufficientStock {
                product,
                requested: amount,
                available: entry.quantity,
            });
        }
        entry.quantity -= amount;
        Ok(entry.quantity)
    }
}
