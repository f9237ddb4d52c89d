// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow, bail};
use time::{Date, OffsetDateTime};

use crate::validation::normalize_optional_text;
use crate::{
    HouseSystem, MaintenanceCategory, MaintenanceItem, MaintenancePriority, MaintenanceStatus,
    Session,
};

/// Editable working copy of a maintenance item. Text fields hold raw input;
/// blank optional text becomes absent when the item is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaintenanceDraft {
    pub title: String,
    pub description: String,
    pub category: MaintenanceCategory,
    pub priority: MaintenancePriority,
    pub status: MaintenanceStatus,
    pub due_date: Option<Date>,
    pub related_system: Option<HouseSystem>,
    pub notes: String,
}

impl Default for MaintenanceDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            category: MaintenanceCategory::Routine,
            priority: MaintenancePriority::Medium,
            status: MaintenanceStatus::Pending,
            due_date: None,
            related_system: None,
            notes: String::new(),
        }
    }
}

impl MaintenanceDraft {
    pub fn from_item(item: &MaintenanceItem) -> Self {
        Self {
            title: item.title.clone(),
            description: item.description.clone().unwrap_or_default(),
            category: item.category,
            priority: item.priority,
            status: item.status,
            due_date: item.due_date,
            related_system: item.related_system,
            notes: item.notes.clone().unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            bail!("maintenance item title is required -- enter a title and retry");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit(Box<MaintenanceItem>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemEditor {
    mode: EditorMode,
    pub draft: MaintenanceDraft,
    saving: bool,
    error: Option<String>,
}

impl ItemEditor {
    pub fn create() -> Self {
        Self::with_draft(EditorMode::Create, MaintenanceDraft::default())
    }

    pub fn edit(item: MaintenanceItem) -> Self {
        let draft = MaintenanceDraft::from_item(&item);
        Self::with_draft(EditorMode::Edit(Box::new(item)), draft)
    }

    fn with_draft(mode: EditorMode, draft: MaintenanceDraft) -> Self {
        Self {
            mode,
            draft,
            saving: false,
            error: None,
        }
    }

    pub fn mode(&self) -> &EditorMode {
        &self.mode
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Save stays disabled while a save is in flight or the title is blank.
    pub fn can_save(&self) -> bool {
        !self.saving && self.draft.validate().is_ok()
    }

    /// Produces the item to persist. New items take their house and author
    /// from the session; edits keep the original identity and creation data.
    pub fn build(&self, session: &Session, now: OffsetDateTime) -> Result<MaintenanceItem> {
        self.draft.validate()?;
        let draft = &self.draft;

        match &self.mode {
            EditorMode::Create => {
                let house_id = session
                    .house_id
                    .ok_or_else(|| anyhow!("no house selected -- choose a house and retry"))?;
                Ok(MaintenanceItem {
                    id: None,
                    house_id,
                    title: draft.title.clone(),
                    description: normalize_optional_text(&draft.description),
                    category: draft.category,
                    priority: draft.priority,
                    status: draft.status,
                    due_date: draft.due_date,
                    related_system: draft.related_system,
                    notes: normalize_optional_text(&draft.notes),
                    created_by: session.user_id,
                    created_at: now,
                    updated_at: now,
                    completed_at: draft.status.is_completed().then_some(now),
                })
            }
            EditorMode::Edit(original) => {
                let mut item = MaintenanceItem {
                    title: draft.title.clone(),
                    description: normalize_optional_text(&draft.description),
                    category: draft.category,
                    priority: draft.priority,
                    due_date: draft.due_date,
                    related_system: draft.related_system,
                    notes: normalize_optional_text(&draft.notes),
                    ..original.as_ref().clone()
                }
                .with_status(draft.status, now);
                item.updated_at = now;
                Ok(item)
            }
        }
    }

    pub(crate) fn begin_save(&mut self) {
        self.saving = true;
        self.error = None;
    }

    pub(crate) fn finish_save(&mut self, error: Option<String>) {
        self.saving = false;
        self.error = error;
    }
}
