// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only catalog snapshot with price filtering and pagination.
//!
//! The snapshot lives behind an [`ArcSwap`], so dialog tasks read it without
//! locking and a reload swaps it atomically.

use std::sync::Arc;

use arc_swap::ArcSwap;
use flowershop_core::types::{CatalogItem, Category, CategoryId, ItemId, PriceBracket};
use flowershop_core::{FlowerError, StorageAdapter};
use rust_decimal::Decimal;
use tracing::info;

/// Categories and items as of the last load.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    categories: Vec<Category>,
    items: Vec<CatalogItem>,
}

impl CatalogSnapshot {
    pub fn new(categories: Vec<Category>, items: Vec<CatalogItem>) -> Self {
        Self { categories, items }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn item(&self, id: ItemId) -> Option<&CatalogItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Items of one occasion whose price falls in `bracket`, in catalog order.
    pub fn filter(&self, occasion: CategoryId, bracket: PriceBracket) -> Vec<CatalogItem> {
        self.items
            .iter()
            .filter(|i| i.category_id == occasion && in_bracket(i.price, bracket))
            .cloned()
            .collect()
    }
}

/// Whether `price` lies in the bracket's `(lower, upper]` range.
pub fn in_bracket(price: Decimal, bracket: PriceBracket) -> bool {
    let (lower, upper) = bracket.bounds();
    lower.is_none_or(|l| price > l) && upper.is_none_or(|u| price <= u)
}

/// Shared, reloadable catalog.
pub struct Catalog {
    snapshot: ArcSwap<CatalogSnapshot>,
}

impl Catalog {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(snapshot),
        }
    }

    /// Load categories and items from storage.
    pub async fn load(storage: &dyn StorageAdapter) -> Result<Self, FlowerError> {
        let catalog = Self::new(CatalogSnapshot::default());
        catalog.reload(storage).await?;
        Ok(catalog)
    }

    /// Replace the snapshot with the current storage contents.
    pub async fn reload(&self, storage: &dyn StorageAdapter) -> Result<(), FlowerError> {
        let categories = storage.list_categories().await?;
        let items = storage.list_items().await?;
        info!(
            categories = categories.len(),
            items = items.len(),
            "catalog loaded"
        );
        self.snapshot
            .store(Arc::new(CatalogSnapshot::new(categories, items)));
        Ok(())
    }

    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.snapshot.load_full()
    }
}

/// One page of a filtered listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// The requested page number (1-based).
    pub page: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn in_range(&self) -> bool {
        self.page >= 1 && self.page <= self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.in_range() && self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.in_range() && self.page < self.total_pages
    }
}

/// Slice out page `page` (1-based). Out-of-range pages, including 0, are
/// empty rather than an error.
pub fn paginate<T: Clone>(items: &[T], page: u32, page_size: u32) -> Page<T> {
    let page_size = page_size.max(1) as usize;
    let total_pages = items.len().div_ceil(page_size) as u32;
    let items = if page >= 1 && page <= total_pages {
        let start = (page as usize - 1) * page_size;
        let end = (start + page_size).min(items.len());
        items[start..end].to_vec()
    } else {
        Vec::new()
    };
    Page {
        items,
        page,
        total_pages,
    }
}
