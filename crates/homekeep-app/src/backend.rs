// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;

use crate::{HouseId, MaintenanceItem, MaintenanceItemId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("load maintenance items for house {house_id}: {detail}")]
pub struct RetrievalError {
    pub house_id: HouseId,
    pub detail: String,
}

impl RetrievalError {
    pub fn new(house_id: HouseId, detail: impl Into<String>) -> Self {
        Self {
            house_id,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("maintenance item {0} not found -- refresh the list and retry")]
    NotFound(MaintenanceItemId),
    #[error("maintenance item title is required -- enter a title and retry")]
    EmptyTitle,
    #[error("save maintenance item: {0}")]
    Save(String),
    #[error("delete maintenance item {id}: {detail}")]
    Delete {
        id: MaintenanceItemId,
        detail: String,
    },
}

/// Storage seam for maintenance items. Every call is independent; nothing
/// is batched into a transaction.
pub trait MaintenanceBackend {
    fn fetch_items(&mut self, house_id: HouseId) -> Result<Vec<MaintenanceItem>, RetrievalError>;

    /// Inserts when `item.id` is `None`, otherwise updates the row with that
    /// id. Returns the id of the stored row.
    fn save_item(&mut self, item: &MaintenanceItem) -> Result<MaintenanceItemId, PersistenceError>;

    fn delete_item(&mut self, id: MaintenanceItemId) -> Result<(), PersistenceError>;
}
