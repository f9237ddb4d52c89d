// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::OffsetDateTime;

use crate::{MaintenanceItem, MaintenanceStatus};

impl MaintenanceItem {
    /// Flips between Completed and Pending, stamping `updated_at`.
    pub fn toggle_complete(mut self, now: OffsetDateTime) -> Self {
        if self.status.is_completed() {
            self.status = MaintenanceStatus::Pending;
            self.completed_at = None;
        } else {
            self.status = MaintenanceStatus::Completed;
            self.completed_at = Some(now);
        }
        self.updated_at = now;
        self
    }

    /// One-way completion. An existing completion stamp is kept so repeated
    /// calls only move `updated_at`.
    pub fn mark_complete(mut self, now: OffsetDateTime) -> Self {
        if !self.status.is_completed() || self.completed_at.is_none() {
            self.completed_at = Some(now);
        }
        self.status = MaintenanceStatus::Completed;
        self.updated_at = now;
        self
    }

    /// Moves to `status` the way a form edit does: the completion stamp is
    /// set on entering Completed and cleared on leaving it.
    pub fn with_status(mut self, status: MaintenanceStatus, now: OffsetDateTime) -> Self {
        match (self.status.is_completed(), status.is_completed()) {
            (false, true) => self.completed_at = Some(now),
            (true, false) => self.completed_at = None,
            (true, true) if self.completed_at.is_none() => self.completed_at = Some(now),
            _ => {}
        }
        self.status = status;
        self
    }

    pub fn is_overdue(&self, now: OffsetDateTime) -> bool {
        match self.due_date {
            Some(due_date) => !self.status.is_completed() && due_date < now.date(),
            None => false,
        }
    }
}

pub fn toggle_complete(item: MaintenanceItem, now: OffsetDateTime) -> MaintenanceItem {
    item.toggle_complete(now)
}

pub fn mark_complete(item: MaintenanceItem, now: OffsetDateTime) -> MaintenanceItem {
    item.mark_complete(now)
}

pub fn is_overdue(item: &MaintenanceItem, now: OffsetDateTime) -> bool {
    item.is_overdue(now)
}

/// Overdue items, earliest due date first.
pub fn overdue(items: &[MaintenanceItem], now: OffsetDateTime) -> Vec<&MaintenanceItem> {
    let mut overdue: Vec<&MaintenanceItem> =
        items.iter().filter(|item| item.is_overdue(now)).collect();
    overdue.sort_by_key(|item| item.due_date);
    overdue
}
