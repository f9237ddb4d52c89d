// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use homekeep_app::validation::format_date;
use homekeep_app::{House, ListIndicator, MaintenanceItem, StatusFilter};
use serde::Serialize;
use std::fmt::Write as _;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const OVERDUE_MARKER: &str = "OVERDUE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub color: bool,
}

impl Style {
    pub const PLAIN: Self = Self { color: false };

    fn paint(self, code: u8, text: &str) -> String {
        if self.color {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_owned()
        }
    }
}

pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("encode JSON output")
}

pub fn house_rows(houses: &[House]) -> String {
    if houses.is_empty() {
        return "no houses yet -- run `homekeep add-house <name>`\n".to_owned();
    }
    let mut out = String::new();
    for house in houses {
        let _ = writeln!(out, "{:>4}  {}", house.id, house.name);
    }
    out
}

pub fn item_row(item: &MaintenanceItem, now: OffsetDateTime, style: Style) -> String {
    let id = item
        .id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_owned());
    let check = if item.status.is_completed() {
        "[x]"
    } else {
        "[ ]"
    };
    let priority = style.paint(
        item.priority.color().ansi_code(),
        &format!("{:<6}", item.priority.label()),
    );
    let due = match item.due_date {
        Some(date) => format!("due {}", format_date(Some(date))),
        None => "no due date".to_owned(),
    };

    let mut row = format!(
        "{id:>4}  {check} {priority}  {:<10}  {}  ({due})",
        item.category.label(),
        item.title
    );
    if item.is_overdue(now) {
        row.push_str("  ");
        row.push_str(&style.paint(31, OVERDUE_MARKER));
    }
    row
}

pub fn item_list(
    items: &[&MaintenanceItem],
    indicator: ListIndicator,
    filter: StatusFilter,
    now: OffsetDateTime,
    style: Style,
) -> String {
    match indicator {
        ListIndicator::Loading => "loading...\n".to_owned(),
        ListIndicator::Empty => match filter {
            StatusFilter::Pending => "nothing pending -- all caught up\n".to_owned(),
            StatusFilter::Completed => "no completed items yet\n".to_owned(),
            StatusFilter::All => {
                "no maintenance items -- run `homekeep add --title <title>`\n".to_owned()
            }
        },
        ListIndicator::Populated => {
            let mut out = String::new();
            for item in items {
                let _ = writeln!(out, "{}", item_row(item, now, style));
            }
            out
        }
    }
}

pub fn item_detail(item: &MaintenanceItem, now: OffsetDateTime) -> String {
    let mut out = String::new();
    let id = item
        .id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "(unsaved)".to_owned());

    let _ = writeln!(out, "{}", item.title);
    let _ = writeln!(out, "  id:          {id}");
    let _ = writeln!(
        out,
        "  category:    {} ({})",
        item.category.label(),
        item.category.icon()
    );
    let _ = writeln!(
        out,
        "  priority:    {} ({})",
        item.priority.label(),
        item.priority.color().as_str()
    );
    let _ = writeln!(out, "  status:      {}", item.status.label());
    let due = if item.due_date.is_some() {
        format_date(item.due_date)
    } else {
        "-".to_owned()
    };
    if item.is_overdue(now) {
        let _ = writeln!(out, "  due:         {due} ({OVERDUE_MARKER})");
    } else {
        let _ = writeln!(out, "  due:         {due}");
    }
    let _ = writeln!(
        out,
        "  system:      {}",
        item.related_system.map_or("-", |system| system.label())
    );
    if let Some(description) = &item.description {
        let _ = writeln!(out, "  description: {description}");
    }
    if let Some(notes) = &item.notes {
        let _ = writeln!(out, "  notes:       {notes}");
    }
    let _ = writeln!(out, "  created by:  user {}", item.created_by);
    let _ = writeln!(out, "  created:     {}", timestamp(item.created_at));
    let _ = writeln!(out, "  updated:     {}", timestamp(item.updated_at));
    if let Some(completed_at) = item.completed_at {
        let _ = writeln!(out, "  completed:   {}", timestamp(completed_at));
    }
    out
}

fn timestamp(value: OffsetDateTime) -> String {
    value.format(&Rfc3339).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::{Style, item_detail, item_list, item_row, json};
    use anyhow::Result;
    use homekeep_app::{
        HouseId, ListIndicator, MaintenanceCategory, MaintenanceItem, MaintenanceItemId,
        MaintenancePriority, MaintenanceStatus, StatusFilter, UserId,
    };
    use time::macros::{date, datetime};

    fn item() -> MaintenanceItem {
        MaintenanceItem {
            id: Some(MaintenanceItemId::new(3)),
            house_id: HouseId::new(1),
            title: "Replace HVAC filter".to_owned(),
            description: None,
            category: MaintenanceCategory::Routine,
            priority: MaintenancePriority::Urgent,
            status: MaintenanceStatus::Pending,
            due_date: Some(date!(2025 - 01 - 01)),
            related_system: None,
            notes: Some("20x25x1".to_owned()),
            created_by: UserId::new(1),
            created_at: datetime!(2024-12-01 00:00 UTC),
            updated_at: datetime!(2024-12-01 00:00 UTC),
            completed_at: None,
        }
    }

    #[test]
    fn overdue_rows_are_marked() {
        let row = item_row(&item(), datetime!(2025-06-01 00:00 UTC), Style::PLAIN);
        assert!(row.contains("Replace HVAC filter"));
        assert!(row.contains("due 2025-01-01"));
        assert!(row.ends_with("OVERDUE"));

        let on_time = item_row(&item(), datetime!(2024-12-15 00:00 UTC), Style::PLAIN);
        assert!(!on_time.contains("OVERDUE"));
    }

    #[test]
    fn color_wraps_priority() {
        let row = item_row(
            &item(),
            datetime!(2024-12-15 00:00 UTC),
            Style { color: true },
        );
        assert!(row.contains("\x1b[31mUrgent"));
    }

    #[test]
    fn empty_list_message_depends_on_filter() {
        let now = datetime!(2025-06-01 00:00 UTC);
        let pending = item_list(&[], ListIndicator::Empty, StatusFilter::Pending, now, Style::PLAIN);
        assert!(pending.contains("nothing pending"));
        let all = item_list(&[], ListIndicator::Empty, StatusFilter::All, now, Style::PLAIN);
        assert!(all.contains("homekeep add"));
    }

    #[test]
    fn detail_lists_optional_fields_only_when_present() {
        let detail = item_detail(&item(), datetime!(2025-06-01 00:00 UTC));
        assert!(detail.contains("notes:       20x25x1"));
        assert!(!detail.contains("description:"));
        assert!(detail.contains("system:      -"));
        assert!(detail.contains("(OVERDUE)"));
    }

    #[test]
    fn json_uses_stable_keys() -> Result<()> {
        let encoded = json(&item())?;
        assert!(encoded.contains("\"priority\": \"urgent\""));
        assert!(encoded.contains("\"due_date\": \"2025-01-01\""));
        assert!(encoded.contains("\"completed_at\": null"));
        Ok(())
    }
}
