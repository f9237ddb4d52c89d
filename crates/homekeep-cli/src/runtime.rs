// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow, bail};
use homekeep_app::validation::{self, ValidationResult};
use homekeep_app::{
    HouseId, HouseSystem, ItemEditor, ListCommand, ListEvent, MaintenanceCategory,
    MaintenanceDraft, MaintenanceItemId, MaintenanceList, MaintenancePriority, MaintenanceStatus,
    Session, StatusFilter, overdue,
};
use homekeep_db::Store;
use std::fmt::Write as _;
use time::OffsetDateTime;

use crate::render::{self, Style};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Houses,
    AddHouse(String),
    List {
        filter: Option<StatusFilter>,
        json: bool,
    },
    Show {
        id: MaintenanceItemId,
        json: bool,
    },
    Add(ItemFields),
    Edit {
        id: MaintenanceItemId,
        fields: ItemFields,
    },
    Toggle(MaintenanceItemId),
    Complete(MaintenanceItemId),
    Delete {
        ids: Vec<MaintenanceItemId>,
        confirmed: bool,
    },
    Overdue {
        json: bool,
    },
}

/// Raw field flags from `add` and `edit`. `None` leaves the draft value
/// alone; an empty string clears optional fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub due: Option<String>,
    pub system: Option<String>,
    pub notes: Option<String>,
}

impl ItemFields {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn apply(&self, draft: &mut MaintenanceDraft) -> Result<()> {
        if let Some(title) = &self.title {
            draft.title = title.trim().to_owned();
        }
        if let Some(description) = &self.description {
            draft.description = description.clone();
        }
        if let Some(notes) = &self.notes {
            draft.notes = notes.clone();
        }
        if let Some(raw) = &self.category {
            draft.category = choice(
                raw,
                "--category",
                validation::parse_category,
                MaintenanceCategory::ALL.map(MaintenanceCategory::as_str),
            )?;
        }
        if let Some(raw) = &self.priority {
            draft.priority = choice(
                raw,
                "--priority",
                validation::parse_priority,
                MaintenancePriority::ALL.map(MaintenancePriority::as_str),
            )?;
        }
        if let Some(raw) = &self.status {
            draft.status = choice(
                raw,
                "--status",
                validation::parse_status,
                MaintenanceStatus::ALL.map(MaintenanceStatus::as_str),
            )?;
        }
        if let Some(raw) = &self.due {
            draft.due_date = validation::parse_optional_date(raw)
                .map_err(|error| anyhow!("invalid --due {raw:?}: {error}"))?;
        }
        if let Some(raw) = &self.system {
            draft.related_system = choice(
                raw,
                "--system",
                validation::parse_optional_system,
                HouseSystem::ALL.map(HouseSystem::as_str),
            )?;
        }
        Ok(())
    }
}

pub fn parse_filter(raw: &str) -> Result<StatusFilter> {
    choice(
        raw,
        "--filter",
        validation::parse_filter,
        StatusFilter::ALL.map(StatusFilter::as_str),
    )
}

fn choice<T, const N: usize>(
    raw: &str,
    flag: &str,
    parse: fn(&str) -> ValidationResult<T>,
    keys: [&str; N],
) -> Result<T> {
    parse(raw).map_err(|error| {
        anyhow!(
            "{error} {raw:?} for {flag}; expected one of: {}",
            keys.join(", ")
        )
    })
}

/// Runs one command against the store through the list shell and returns
/// the text to print.
pub struct Runtime {
    store: Store,
    session: Session,
    list: MaintenanceList,
    style: Style,
}

impl Runtime {
    pub fn new(store: Store, session: Session, style: Style) -> Self {
        Self {
            store,
            session,
            list: MaintenanceList::new(),
            style,
        }
    }

    #[cfg(test)]
    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn execute(&mut self, command: &Command, now: OffsetDateTime) -> Result<String> {
        tracing::debug!(?command, house_id = ?self.session.house_id, "running command");
        match command {
            Command::Houses => Ok(render::house_rows(&self.store.list_houses()?)),
            Command::AddHouse(name) => {
                let id = self.store.create_house(name)?;
                Ok(format!("added house {id}\n"))
            }
            Command::List { filter, json } => self.list_items(*filter, *json, now),
            Command::Show { id, json } => {
                self.load()?;
                let item = self.require_item(*id)?;
                if *json {
                    Ok(format!("{}\n", render::json(item)?))
                } else {
                    Ok(render::item_detail(item, now))
                }
            }
            Command::Add(fields) => {
                let mut editor = ItemEditor::create();
                fields.apply(&mut editor.draft)?;
                self.list.dispatch(ListCommand::OpenNewItem);
                let id = self.save(&mut editor, now)?;
                Ok(format!("added item {id}\n"))
            }
            Command::Edit { id, fields } => {
                if fields.is_empty() {
                    bail!("nothing to change -- pass at least one field flag such as --title");
                }
                self.load()?;
                let mut editor = ItemEditor::edit(self.require_item(*id)?.clone());
                fields.apply(&mut editor.draft)?;
                self.list.dispatch(ListCommand::OpenDetail(*id));
                let saved = self.save(&mut editor, now)?;
                Ok(format!("updated item {saved}\n"))
            }
            Command::Toggle(id) => {
                self.load()?;
                let events = self.list.toggle_complete(&mut self.store, *id, now);
                self.finish_mutation(&events)?;
                Ok(self.status_line(*id))
            }
            Command::Complete(id) => {
                self.load()?;
                let events = self.list.mark_complete(&mut self.store, *id, now);
                self.finish_mutation(&events)?;
                Ok(self.status_line(*id))
            }
            Command::Delete { ids, confirmed } => self.delete(ids, *confirmed),
            Command::Overdue { json } => {
                self.load()?;
                let items = overdue(self.list.items(), now);
                if *json {
                    return Ok(format!("{}\n", render::json(&items)?));
                }
                if items.is_empty() {
                    return Ok("nothing overdue\n".to_owned());
                }
                let mut out = String::new();
                for item in items {
                    let _ = writeln!(out, "{}", render::item_row(item, now, self.style));
                }
                Ok(out)
            }
        }
    }

    fn list_items(
        &mut self,
        filter: Option<StatusFilter>,
        json: bool,
        now: OffsetDateTime,
    ) -> Result<String> {
        let house_id = self.load()?;
        self.list
            .dispatch(ListCommand::SetFilter(filter.unwrap_or_default()));
        let visible = self.list.visible();
        if json {
            return Ok(format!("{}\n", render::json(&visible)?));
        }

        let house = self.store.get_house(house_id)?;
        let mut out = format!(
            "{}: {} of {} items ({}), {} overdue\n",
            house.name,
            visible.len(),
            self.list.items().len(),
            self.list.filter().label(),
            self.list.overdue_count(now)
        );
        out.push_str(&render::item_list(
            &visible,
            self.list.indicator(),
            self.list.filter(),
            now,
            self.style,
        ));
        Ok(out)
    }

    fn delete(&mut self, ids: &[MaintenanceItemId], confirmed: bool) -> Result<String> {
        if ids.is_empty() {
            bail!("delete needs at least one item id");
        }
        if !confirmed {
            bail!(
                "refusing to delete {} item(s) without confirmation -- rerun with --yes",
                ids.len()
            );
        }

        self.load()?;
        let report = self.list.delete(&mut self.store, ids);
        if report.reload_requested() {
            self.load()?;
        }

        let deleted = report.deleted();
        let failures = report.failures();
        if failures.is_empty() {
            return Ok(format!("deleted {} item(s)\n", deleted.len()));
        }

        let details = failures
            .iter()
            .map(|(_, error)| error.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        bail!(
            "deleted {} of {} item(s); {}",
            deleted.len(),
            ids.len(),
            details
        )
    }

    fn save(&mut self, editor: &mut ItemEditor, now: OffsetDateTime) -> Result<MaintenanceItemId> {
        let events = self.list.save(&mut self.store, editor, &self.session, now);
        self.finish_mutation(&events)?;
        events
            .iter()
            .find_map(|event| match event {
                ListEvent::Saved(id) => Some(*id),
                _ => None,
            })
            .ok_or_else(|| anyhow!("save finished without an item id"))
    }

    /// Surfaces the first failure, then reloads when the shell asked for it.
    fn finish_mutation(&mut self, events: &[ListEvent]) -> Result<()> {
        for event in events {
            match event {
                ListEvent::SaveBlocked(message) => bail!("{message}"),
                ListEvent::SaveFailed(error) => return Err(anyhow!(error.clone())),
                _ => {}
            }
        }
        if events.contains(&ListEvent::ReloadRequested) {
            self.load()?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<HouseId> {
        let house_id = self.session.house_id.ok_or_else(|| {
            anyhow!("no house selected -- pass --house <id> or set [household].house_id in the config")
        })?;
        let events = self.list.refresh(&mut self.store, &self.session);
        for event in events {
            if let ListEvent::LoadFailed(message) = event {
                return Err(
                    anyhow!(message).context(format!("list maintenance items for house {house_id}"))
                );
            }
        }
        Ok(house_id)
    }

    fn require_item(&self, id: MaintenanceItemId) -> Result<&homekeep_app::MaintenanceItem> {
        self.list.find(id).ok_or_else(|| {
            anyhow!(
                "maintenance item {id} not found in this house -- run `homekeep list --filter all` to see ids"
            )
        })
    }

    fn status_line(&self, id: MaintenanceItemId) -> String {
        match self.list.find(id) {
            Some(item) => format!("item {id} is now {}\n", item.status.label()),
            None => format!("item {id} updated\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Command, ItemFields, Runtime, parse_filter};
    use crate::render::Style;
    use anyhow::Result;
    use homekeep_app::{
        HouseSystem, MaintenanceCategory, MaintenanceDraft, MaintenanceItem, MaintenanceItemId,
        MaintenancePriority, MaintenanceStatus, Session, StatusFilter, UserId,
    };
    use homekeep_db::Store;
    use time::macros::{date, datetime};

    fn runtime() -> Result<Runtime> {
        let store = Store::open_memory()?;
        store.bootstrap()?;
        let house_id = store.create_house("Maple Street")?;
        let session = Session::new(Some(house_id), UserId::new(5));
        Ok(Runtime::new(store, session, Style::PLAIN))
    }

    fn add(runtime: &mut Runtime, title: &str, due: Option<&str>) -> Result<()> {
        runtime.execute(
            &Command::Add(ItemFields {
                title: Some(title.to_owned()),
                due: due.map(str::to_owned),
                ..ItemFields::default()
            }),
            datetime!(2025-05-01 09:00 UTC),
        )?;
        Ok(())
    }

    #[test]
    fn fields_apply_and_clear() -> Result<()> {
        let mut draft = MaintenanceDraft {
            related_system: Some(HouseSystem::Roof),
            due_date: Some(date!(2025 - 01 - 01)),
            ..MaintenanceDraft::default()
        };
        ItemFields {
            priority: Some("Urgent".to_owned()),
            status: Some("in-progress".to_owned()),
            system: Some(String::new()),
            due: Some(" ".to_owned()),
            ..ItemFields::default()
        }
        .apply(&mut draft)?;

        assert_eq!(draft.priority, MaintenancePriority::Urgent);
        assert_eq!(draft.status, MaintenanceStatus::InProgress);
        assert_eq!(draft.related_system, None);
        assert_eq!(draft.due_date, None);
        Ok(())
    }

    #[test]
    fn unknown_choice_lists_valid_keys() {
        let error = ItemFields {
            category: Some("gardening".to_owned()),
            ..ItemFields::default()
        }
        .apply(&mut MaintenanceDraft::default())
        .expect_err("unknown category should fail");
        let message = error.to_string();
        assert!(message.contains("--category"));
        assert!(message.contains("seasonal"));

        assert!(parse_filter("bogus").is_err());
        assert_eq!(parse_filter("ALL").ok(), Some(StatusFilter::All));
    }

    #[test]
    fn add_then_list_shows_pending_items() -> Result<()> {
        let mut runtime = runtime()?;
        add(&mut runtime, "Replace HVAC filter", Some("2025-01-01"))?;
        add(&mut runtime, "Clean gutters", None)?;

        let out = runtime.execute(
            &Command::List {
                filter: None,
                json: false,
            },
            datetime!(2025-06-01 00:00 UTC),
        )?;
        assert!(out.starts_with("Maple Street: 2 of 2 items (Pending), 1 overdue"));
        assert!(out.contains("Replace HVAC filter"));
        assert!(out.contains("OVERDUE"));
        Ok(())
    }

    #[test]
    fn add_with_blank_title_is_blocked() -> Result<()> {
        let mut runtime = runtime()?;
        let error = runtime
            .execute(
                &Command::Add(ItemFields {
                    title: Some("   ".to_owned()),
                    ..ItemFields::default()
                }),
                datetime!(2025-05-01 09:00 UTC),
            )
            .expect_err("blank title should fail");
        assert!(error.to_string().contains("title is required"));
        assert_eq!(runtime.store().list_houses()?.len(), 1);
        Ok(())
    }

    #[test]
    fn toggle_then_complete_filters_move_item() -> Result<()> {
        let mut runtime = runtime()?;
        add(&mut runtime, "Test smoke detectors", None)?;
        let id = MaintenanceItemId::new(1);

        let out = runtime.execute(&Command::Toggle(id), datetime!(2025-05-02 09:00 UTC))?;
        assert_eq!(out, "item 1 is now Completed\n");

        let completed = runtime.execute(
            &Command::List {
                filter: Some(StatusFilter::Completed),
                json: false,
            },
            datetime!(2025-05-02 10:00 UTC),
        )?;
        assert!(completed.contains("Test smoke detectors"));

        let out = runtime.execute(&Command::Toggle(id), datetime!(2025-05-03 09:00 UTC))?;
        assert_eq!(out, "item 1 is now Pending\n");
        let out = runtime.execute(&Command::Complete(id), datetime!(2025-05-04 09:00 UTC))?;
        assert_eq!(out, "item 1 is now Completed\n");
        Ok(())
    }

    #[test]
    fn edit_clears_optional_fields() -> Result<()> {
        let mut runtime = runtime()?;
        runtime.execute(
            &Command::Add(ItemFields {
                title: Some("Clean gutters".to_owned()),
                description: Some("front and back".to_owned()),
                system: Some("roof".to_owned()),
                ..ItemFields::default()
            }),
            datetime!(2025-05-01 09:00 UTC),
        )?;

        let id = MaintenanceItemId::new(1);
        runtime.execute(
            &Command::Edit {
                id,
                fields: ItemFields {
                    description: Some(String::new()),
                    system: Some(String::new()),
                    ..ItemFields::default()
                },
            },
            datetime!(2025-05-05 09:00 UTC),
        )?;

        let item = runtime.store().get_maintenance_item(id)?;
        assert_eq!(item.description, None);
        assert_eq!(item.related_system, None);
        assert_eq!(item.updated_at, datetime!(2025-05-05 09:00 UTC));
        assert_eq!(item.created_by, UserId::new(5));
        Ok(())
    }

    #[test]
    fn delete_requires_confirmation_and_reports_failures() -> Result<()> {
        let mut runtime = runtime()?;
        add(&mut runtime, "A", None)?;
        add(&mut runtime, "B", None)?;

        let ids = vec![MaintenanceItemId::new(1), MaintenanceItemId::new(2)];
        let error = runtime
            .execute(
                &Command::Delete {
                    ids: ids.clone(),
                    confirmed: false,
                },
                datetime!(2025-05-05 09:00 UTC),
            )
            .expect_err("unconfirmed delete should fail");
        assert!(error.to_string().contains("--yes"));

        let error = runtime
            .execute(
                &Command::Delete {
                    ids: vec![
                        MaintenanceItemId::new(1),
                        MaintenanceItemId::new(99),
                        MaintenanceItemId::new(2),
                    ],
                    confirmed: true,
                },
                datetime!(2025-05-05 09:00 UTC),
            )
            .expect_err("missing id should be reported");
        assert!(error.to_string().contains("deleted 2 of 3"));
        let house_id = runtime.store().list_houses()?[0].id;
        assert!(runtime.store().list_maintenance_items(house_id)?.is_empty());
        Ok(())
    }

    #[test]
    fn delete_leaves_other_houses_alone() -> Result<()> {
        let mut runtime = runtime()?;
        let other_house = runtime.store().create_house("Lake Cabin")?;
        let created_at = datetime!(2025-05-01 09:00 UTC);
        let foreign = runtime.store().create_maintenance_item(&MaintenanceItem {
            id: None,
            house_id: other_house,
            title: "Winterize dock".to_owned(),
            description: None,
            category: MaintenanceCategory::Seasonal,
            priority: MaintenancePriority::Medium,
            status: MaintenanceStatus::Pending,
            due_date: None,
            related_system: None,
            notes: None,
            created_by: UserId::new(5),
            created_at,
            updated_at: created_at,
            completed_at: None,
        })?;

        let error = runtime
            .execute(
                &Command::Delete {
                    ids: vec![foreign],
                    confirmed: true,
                },
                datetime!(2025-05-05 09:00 UTC),
            )
            .expect_err("item from another house should not be deleted");
        assert!(error.to_string().contains("deleted 0 of 1"));
        assert!(error.to_string().contains("not found"));
        assert_eq!(runtime.store().list_maintenance_items(other_house)?.len(), 1);
        Ok(())
    }

    #[test]
    fn overdue_report_and_show() -> Result<()> {
        let mut runtime = runtime()?;
        add(&mut runtime, "Replace HVAC filter", Some("2025-01-01"))?;
        add(&mut runtime, "Clean gutters", Some("2025-12-01"))?;
        let now = datetime!(2025-06-01 00:00 UTC);

        let out = runtime.execute(&Command::Overdue { json: false }, now)?;
        assert!(out.contains("Replace HVAC filter"));
        assert!(!out.contains("Clean gutters"));

        let detail = runtime.execute(
            &Command::Show {
                id: MaintenanceItemId::new(2),
                json: true,
            },
            now,
        )?;
        assert!(detail.contains("\"title\": \"Clean gutters\""));

        let error = runtime
            .execute(
                &Command::Show {
                    id: MaintenanceItemId::new(50),
                    json: false,
                },
                now,
            )
            .expect_err("unknown id should fail");
        assert!(error.to_string().contains("list --filter all"));
        Ok(())
    }

    #[test]
    fn item_commands_need_a_house() -> Result<()> {
        let store = Store::open_memory()?;
        store.bootstrap()?;
        let mut runtime = Runtime::new(store, Session::new(None, UserId::new(1)), Style::PLAIN);

        let error = runtime
            .execute(
                &Command::List {
                    filter: None,
                    json: false,
                },
                datetime!(2025-06-01 00:00 UTC),
            )
            .expect_err("no house should fail");
        assert!(error.to_string().contains("--house"));

        let out = runtime.execute(
            &Command::AddHouse("Lake Cabin".to_owned()),
            datetime!(2025-06-01 00:00 UTC),
        )?;
        assert_eq!(out, "added house 1\n");
        Ok(())
    }
}
