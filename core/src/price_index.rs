//! Product id -> unit price, built once from the product table.

use crate::{csv_table::ProductRow, types::ProductId};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct PriceIndex {
    prices: HashMap<ProductId, f32>,
}

impl PriceIndex {
    /// First occurrence of an id wins; later duplicates are discarded.
    pub fn build<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a ProductRow>,
    {
        let mut prices = HashMap::new();
        for row in rows {
            if prices.contains_key(&row.id) {
                log::debug!("Duplicate price for product {} ('{}') ignored", row.id, row.name);
                continue;
            }
            prices.insert(row.id, row.price);
        }
        Self { prices }
    }

    pub fn get(&self, id: ProductId) -> Option<f32> {
        self.prices.get(&id).copied()
    }

    /// Price for `id`, or 0 when unknown.
    pub fn lookup(&self, id: ProductId) -> f32 {
        self.get(id).unwrap_or(0.0)
    }

    pub fn len(&self) -> usize { self.prices.len() }
    pub fn is_empty(&self) -> bool { self.prices.is_empty() }
}
