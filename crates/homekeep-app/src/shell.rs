// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::{
    HouseId, ItemEditor, ListCommand, ListEvent, ListUiState, MaintenanceBackend,
    MaintenanceItem, MaintenanceItemId, PersistenceError, RetrievalError, Session, Sheet,
    StatusFilter, visible,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListIndicator {
    Loading,
    Empty,
    Populated,
}

/// Ticket for an in-flight load. Only the most recent ticket is accepted
/// by [`MaintenanceList::finish_load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadRequest {
    house_id: HouseId,
    generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub id: MaintenanceItemId,
    pub result: Result<(), PersistenceError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeleteReport {
    pub outcomes: Vec<DeleteOutcome>,
    pub events: Vec<ListEvent>,
}

impl DeleteReport {
    pub fn deleted(&self) -> Vec<MaintenanceItemId> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.result.is_ok())
            .map(|outcome| outcome.id)
            .collect()
    }

    pub fn failures(&self) -> Vec<(MaintenanceItemId, &PersistenceError)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().err().map(|err| (outcome.id, err)))
            .collect()
    }

    pub fn reload_requested(&self) -> bool {
        self.events.contains(&ListEvent::ReloadRequested)
    }
}

/// Owns the item list for one house view. Loads replace the list
/// wholesale; mutations never touch it and ask the caller to reload.
#[derive(Debug, Clone, Default)]
pub struct MaintenanceList {
    items: Vec<MaintenanceItem>,
    ui: ListUiState,
    in_flight: Option<LoadRequest>,
    generation: u64,
    load_error: Option<String>,
}

impl MaintenanceList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[MaintenanceItem] {
        &self.items
    }

    pub fn ui(&self) -> &ListUiState {
        &self.ui
    }

    pub fn filter(&self) -> StatusFilter {
        self.ui.filter
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn can_refresh(&self) -> bool {
        !self.is_loading()
    }

    pub fn dispatch(&mut self, command: ListCommand) -> Vec<ListEvent> {
        self.ui.dispatch(command)
    }

    pub fn visible(&self) -> Vec<&MaintenanceItem> {
        visible(&self.items, self.ui.filter)
    }

    pub fn indicator(&self) -> ListIndicator {
        if self.is_loading() {
            ListIndicator::Loading
        } else if self.visible().is_empty() {
            ListIndicator::Empty
        } else {
            ListIndicator::Populated
        }
    }

    pub fn find(&self, id: MaintenanceItemId) -> Option<&MaintenanceItem> {
        self.items.iter().find(|item| item.id == Some(id))
    }

    pub fn overdue_count(&self, now: OffsetDateTime) -> usize {
        self.items.iter().filter(|item| item.is_overdue(now)).count()
    }

    /// Begins a load for the session's house. Returns `None` when no house
    /// is selected or a load is already running.
    pub fn start_load(&mut self, session: &Session) -> Option<LoadRequest> {
        let house_id = session.house_id?;
        if self.in_flight.is_some() {
            debug!(house_id = %house_id, "load already in flight; ignoring refresh");
            return None;
        }
        self.generation += 1;
        let request = LoadRequest {
            house_id,
            generation: self.generation,
        };
        self.in_flight = Some(request);
        Some(request)
    }

    pub fn finish_load(
        &mut self,
        request: LoadRequest,
        result: Result<Vec<MaintenanceItem>, RetrievalError>,
    ) -> Vec<ListEvent> {
        if self.in_flight != Some(request) {
            debug!(
                house_id = %request.house_id,
                generation = request.generation,
                "dropping superseded load response"
            );
            return Vec::new();
        }
        self.in_flight = None;

        match result {
            Ok(items) => {
                let count = items.len();
                info!(house_id = %request.house_id, count, "loaded maintenance items");
                self.items = items;
                self.load_error = None;
                vec![ListEvent::Loaded {
                    house_id: request.house_id,
                    count,
                }]
            }
            Err(error) => {
                warn!(house_id = %request.house_id, error = %error, "maintenance load failed");
                let message = error.to_string();
                self.items.clear();
                self.load_error = Some(message.clone());
                vec![
                    ListEvent::LoadFailed(message.clone()),
                    self.ui.set_status(message),
                ]
            }
        }
    }

    /// Fetches and replaces the list. A missing house is a no-op.
    pub fn refresh<B>(&mut self, backend: &mut B, session: &Session) -> Vec<ListEvent>
    where
        B: MaintenanceBackend + ?Sized,
    {
        let Some(request) = self.start_load(session) else {
            return Vec::new();
        };
        let mut events = vec![ListEvent::LoadStarted(request.house_id)];
        let result = backend.fetch_items(request.house_id);
        events.extend(self.finish_load(request, result));
        events
    }

    /// Persists the editor's working copy. Blank titles never reach the
    /// backend; a failed save leaves the editor open and ready to retry.
    pub fn save<B>(
        &mut self,
        backend: &mut B,
        editor: &mut ItemEditor,
        session: &Session,
        now: OffsetDateTime,
    ) -> Vec<ListEvent>
    where
        B: MaintenanceBackend + ?Sized,
    {
        if editor.is_saving() {
            return Vec::new();
        }
        let item = match editor.build(session, now) {
            Ok(item) => item,
            Err(error) => {
                let message = error.to_string();
                editor.finish_save(Some(message.clone()));
                return vec![ListEvent::SaveBlocked(message)];
            }
        };

        editor.begin_save();
        match backend.save_item(&item) {
            Ok(id) => {
                info!(item_id = %id, title = item.title.as_str(), "saved maintenance item");
                editor.finish_save(None);
                self.ui.sheet = Sheet::Hidden;
                vec![
                    ListEvent::Saved(id),
                    ListEvent::SheetChanged(Sheet::Hidden),
                    ListEvent::ReloadRequested,
                ]
            }
            Err(error) => {
                warn!(title = item.title.as_str(), error = %error, "save maintenance item failed");
                editor.finish_save(Some(error.to_string()));
                vec![ListEvent::SaveFailed(error)]
            }
        }
    }

    pub fn toggle_complete<B>(
        &mut self,
        backend: &mut B,
        id: MaintenanceItemId,
        now: OffsetDateTime,
    ) -> Vec<ListEvent>
    where
        B: MaintenanceBackend + ?Sized,
    {
        self.persist_transition(backend, id, |item| item.toggle_complete(now))
    }

    pub fn mark_complete<B>(
        &mut self,
        backend: &mut B,
        id: MaintenanceItemId,
        now: OffsetDateTime,
    ) -> Vec<ListEvent>
    where
        B: MaintenanceBackend + ?Sized,
    {
        self.persist_transition(backend, id, |item| item.mark_complete(now))
    }

    /// Deletes each id in order. Ids missing from the loaded list are
    /// recorded as not found without reaching the backend. A failure is
    /// logged and recorded, and the remaining ids are still attempted. Any
    /// attempted batch asks for a reload, even when every delete failed.
    pub fn delete<B>(&mut self, backend: &mut B, ids: &[MaintenanceItemId]) -> DeleteReport
    where
        B: MaintenanceBackend + ?Sized,
    {
        let mut report = DeleteReport::default();
        if ids.is_empty() {
            return report;
        }
        for &id in ids {
            let result = if self.find(id).is_some() {
                backend.delete_item(id)
            } else {
                Err(PersistenceError::NotFound(id))
            };
            match &result {
                Ok(()) => info!(item_id = %id, "deleted maintenance item"),
                Err(error) => {
                    warn!(item_id = %id, error = %error, "delete maintenance item failed")
                }
            }
            report.outcomes.push(DeleteOutcome { id, result });
        }

        if let Sheet::Detail(open) = self.ui.sheet
            && report.deleted().contains(&open)
        {
            self.ui.sheet = Sheet::Hidden;
            report.events.push(ListEvent::SheetChanged(Sheet::Hidden));
        }
        let failed = report.failures().len();
        if failed > 0 {
            let status = self
                .ui
                .set_status(format!("{failed} of {} deletes failed", ids.len()));
            report.events.push(status);
        }
        report.events.push(ListEvent::ReloadRequested);
        report
    }

    fn persist_transition<B, F>(
        &mut self,
        backend: &mut B,
        id: MaintenanceItemId,
        transition: F,
    ) -> Vec<ListEvent>
    where
        B: MaintenanceBackend + ?Sized,
        F: FnOnce(MaintenanceItem) -> MaintenanceItem,
    {
        let Some(current) = self.find(id).cloned() else {
            let error = PersistenceError::NotFound(id);
            warn!(item_id = %id, "status change for item missing from the list");
            return vec![ListEvent::SaveFailed(error)];
        };

        let updated = transition(current);
        match backend.save_item(&updated) {
            Ok(saved) => {
                info!(
                    item_id = %saved,
                    status = updated.status.as_str(),
                    "updated maintenance status"
                );
                vec![ListEvent::Saved(saved), ListEvent::ReloadRequested]
            }
            Err(error) => {
                warn!(item_id = %id, error = %error, "status change failed");
                vec![ListEvent::SaveFailed(error)]
            }
        }
    }
}
