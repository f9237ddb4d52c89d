// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{HouseId, MaintenanceItemId, PersistenceError, StatusFilter, UserId};

/// Who is acting and on which house.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub house_id: Option<HouseId>,
    pub user_id: UserId,
}

impl Session {
    pub const fn new(house_id: Option<HouseId>, user_id: UserId) -> Self {
        Self { house_id, user_id }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sheet {
    #[default]
    Hidden,
    NewItem,
    Detail(MaintenanceItemId),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListUiState {
    pub filter: StatusFilter,
    pub sheet: Sheet,
    pub status_line: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListCommand {
    SetFilter(StatusFilter),
    OpenNewItem,
    OpenDetail(MaintenanceItemId),
    CloseSheet,
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEvent {
    FilterChanged(StatusFilter),
    SheetChanged(Sheet),
    StatusUpdated(String),
    StatusCleared,
    LoadStarted(HouseId),
    Loaded { house_id: HouseId, count: usize },
    LoadFailed(String),
    SaveBlocked(String),
    Saved(MaintenanceItemId),
    SaveFailed(PersistenceError),
    ReloadRequested,
}

impl ListEvent {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::LoadFailed(_) | Self::SaveBlocked(_) | Self::SaveFailed(_)
        )
    }
}

impl ListUiState {
    pub fn dispatch(&mut self, command: ListCommand) -> Vec<ListEvent> {
        match command {
            ListCommand::SetFilter(filter) => self.set_filter(filter),
            ListCommand::OpenNewItem => self.set_sheet(Sheet::NewItem),
            ListCommand::OpenDetail(id) => self.set_sheet(Sheet::Detail(id)),
            ListCommand::CloseSheet => self.set_sheet(Sheet::Hidden),
            ListCommand::ClearStatus => {
                self.status_line = None;
                vec![ListEvent::StatusCleared]
            }
        }
    }

    pub(crate) fn set_status(&mut self, message: impl Into<String>) -> ListEvent {
        let message = message.into();
        self.status_line = Some(message.clone());
        ListEvent::StatusUpdated(message)
    }

    fn set_filter(&mut self, filter: StatusFilter) -> Vec<ListEvent> {
        if self.filter == filter {
            return Vec::new();
        }
        self.filter = filter;
        vec![ListEvent::FilterChanged(filter)]
    }

    fn set_sheet(&mut self, sheet: Sheet) -> Vec<ListEvent> {
        self.sheet = sheet;
        vec![ListEvent::SheetChanged(sheet)]
    }
}
