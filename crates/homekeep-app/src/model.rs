// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::ids::*;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    Pending,
    InProgress,
    Completed,
}

impl MaintenanceStatus {
    pub const ALL: [Self; 3] = [Self::Pending, Self::InProgress, Self::Completed];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        }
    }

    pub const fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenancePriority {
    Urgent,
    High,
    Medium,
    Low,
}

impl MaintenancePriority {
    pub const ALL: [Self; 4] = [Self::Urgent, Self::High, Self::Medium, Self::Low];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "urgent" => Some(Self::Urgent),
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Urgent => "Urgent",
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    pub const fn color(self) -> SeverityColor {
        match self {
            Self::Urgent => SeverityColor::Red,
            Self::High => SeverityColor::Orange,
            Self::Medium => SeverityColor::Yellow,
            Self::Low => SeverityColor::Green,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityColor {
    Red,
    Orange,
    Yellow,
    Green,
}

impl SeverityColor {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Orange => "orange",
            Self::Yellow => "yellow",
            Self::Green => "green",
        }
    }

    /// ANSI SGR foreground code for terminal emphasis.
    pub const fn ansi_code(self) -> u8 {
        match self {
            Self::Red => 31,
            Self::Orange => 91,
            Self::Yellow => 33,
            Self::Green => 32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceCategory {
    Routine,
    Seasonal,
    Repair,
    Inspection,
    Cleaning,
    Safety,
    Upgrade,
    Other,
}

impl MaintenanceCategory {
    pub const ALL: [Self; 8] = [
        Self::Routine,
        Self::Seasonal,
        Self::Repair,
        Self::Inspection,
        Self::Cleaning,
        Self::Safety,
        Self::Upgrade,
        Self::Other,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Routine => "routine",
            Self::Seasonal => "seasonal",
            Self::Repair => "repair",
            Self::Inspection => "inspection",
            Self::Cleaning => "cleaning",
            Self::Safety => "safety",
            Self::Upgrade => "upgrade",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "routine" => Some(Self::Routine),
            "seasonal" => Some(Self::Seasonal),
            "repair" => Some(Self::Repair),
            "inspection" => Some(Self::Inspection),
            "cleaning" => Some(Self::Cleaning),
            "safety" => Some(Self::Safety),
            "upgrade" => Some(Self::Upgrade),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Routine => "Routine",
            Self::Seasonal => "Seasonal",
            Self::Repair => "Repair",
            Self::Inspection => "Inspection",
            Self::Cleaning => "Cleaning",
            Self::Safety => "Safety",
            Self::Upgrade => "Upgrade",
            Self::Other => "Other",
        }
    }

    /// Symbol name shown next to the row title.
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Routine => "arrow.clockwise",
            Self::Seasonal => "leaf",
            Self::Repair => "wrench.and.screwdriver",
            Self::Inspection => "magnifyingglass",
            Self::Cleaning => "sparkles",
            Self::Safety => "shield.checkered",
            Self::Upgrade => "arrow.up.circle",
            Self::Other => "ellipsis.circle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HouseSystem {
    Hvac,
    Plumbing,
    Electrical,
    Roof,
    Foundation,
    Appliances,
    Exterior,
    Interior,
    Landscaping,
    Security,
}

impl HouseSystem {
    pub const ALL: [Self; 10] = [
        Self::Hvac,
        Self::Plumbing,
        Self::Electrical,
        Self::Roof,
        Self::Foundation,
        Self::Appliances,
        Self::Exterior,
        Self::Interior,
        Self::Landscaping,
        Self::Security,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hvac => "hvac",
            Self::Plumbing => "plumbing",
            Self::Electrical => "electrical",
            Self::Roof => "roof",
            Self::Foundation => "foundation",
            Self::Appliances => "appliances",
            Self::Exterior => "exterior",
            Self::Interior => "interior",
            Self::Landscaping => "landscaping",
            Self::Security => "security",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "hvac" => Some(Self::Hvac),
            "plumbing" => Some(Self::Plumbing),
            "electrical" => Some(Self::Electrical),
            "roof" => Some(Self::Roof),
            "foundation" => Some(Self::Foundation),
            "appliances" => Some(Self::Appliances),
            "exterior" => Some(Self::Exterior),
            "interior" => Some(Self::Interior),
            "landscaping" => Some(Self::Landscaping),
            "security" => Some(Self::Security),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Hvac => "HVAC",
            Self::Plumbing => "Plumbing",
            Self::Electrical => "Electrical",
            Self::Roof => "Roof",
            Self::Foundation => "Foundation",
            Self::Appliances => "Appliances",
            Self::Exterior => "Exterior",
            Self::Interior => "Interior",
            Self::Landscaping => "Landscaping",
            Self::Security => "Security",
        }
    }
}

/// Three-way status filter applied to the loaded item list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    Pending,
    Completed,
    All,
}

impl StatusFilter {
    pub const ALL: [Self; 3] = [Self::Pending, Self::Completed, Self::All];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::All => "all",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Completed => "Completed",
            Self::All => "All",
        }
    }

    pub const fn admits(self, status: MaintenanceStatus) -> bool {
        match self {
            Self::Pending => matches!(
                status,
                MaintenanceStatus::Pending | MaintenanceStatus::InProgress
            ),
            Self::Completed => matches!(status, MaintenanceStatus::Completed),
            Self::All => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct House {
    pub id: HouseId,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceItem {
    pub id: Option<MaintenanceItemId>,
    pub house_id: HouseId,
    pub title: String,
    pub description: Option<String>,
    pub category: MaintenanceCategory,
    pub priority: MaintenancePriority,
    pub status: MaintenanceStatus,
    #[serde(with = "iso_date::option")]
    pub due_date: Option<Date>,
    pub related_system: Option<HouseSystem>,
    pub notes: Option<String>,
    pub created_by: UserId,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
}

impl MaintenanceItem {
    /// Whether the completion stamp agrees with the status.
    pub fn completion_is_consistent(&self) -> bool {
        self.completed_at.is_some() == self.status.is_completed()
    }
}

/// Keeps the visible subset in received order.
pub fn visible(items: &[MaintenanceItem], filter: StatusFilter) -> Vec<&MaintenanceItem> {
    items
        .iter()
        .filter(|item| filter.admits(item.status))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        HouseSystem, MaintenanceCategory, MaintenanceItem, MaintenancePriority,
        MaintenanceStatus, SeverityColor, StatusFilter, visible,
    };
    use crate::{HouseId, MaintenanceItemId, UserId};
    use time::OffsetDateTime;

    fn item(id: i64, status: MaintenanceStatus) -> MaintenanceItem {
        MaintenanceItem {
            id: Some(MaintenanceItemId::new(id)),
            house_id: HouseId::new(1),
            title: format!("task {id}"),
            description: None,
            category: MaintenanceCategory::Routine,
            priority: MaintenancePriority::Medium,
            status,
            due_date: None,
            related_system: None,
            notes: None,
            created_by: UserId::new(1),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
            completed_at: status
                .is_completed()
                .then_some(OffsetDateTime::UNIX_EPOCH),
        }
    }

    fn ids(items: &[&MaintenanceItem]) -> Vec<i64> {
        items
            .iter()
            .filter_map(|item| item.id.map(MaintenanceItemId::get))
            .collect()
    }

    #[test]
    fn enum_keys_parse_back() {
        for status in MaintenanceStatus::ALL {
            assert_eq!(MaintenanceStatus::parse(status.as_str()), Some(status));
        }
        for priority in MaintenancePriority::ALL {
            assert_eq!(MaintenancePriority::parse(priority.as_str()), Some(priority));
        }
        for category in MaintenanceCategory::ALL {
            assert_eq!(MaintenanceCategory::parse(category.as_str()), Some(category));
        }
        for system in HouseSystem::ALL {
            assert_eq!(HouseSystem::parse(system.as_str()), Some(system));
        }
        for filter in StatusFilter::ALL {
            assert_eq!(StatusFilter::parse(filter.as_str()), Some(filter));
        }
        assert_eq!(MaintenanceStatus::parse("done"), None);
    }

    #[test]
    fn priority_colors_follow_severity() {
        assert_eq!(MaintenancePriority::Urgent.color(), SeverityColor::Red);
        assert_eq!(MaintenancePriority::High.color(), SeverityColor::Orange);
        assert_eq!(MaintenancePriority::Medium.color(), SeverityColor::Yellow);
        assert_eq!(MaintenancePriority::Low.color(), SeverityColor::Green);
    }

    #[test]
    fn pending_filter_includes_in_progress() {
        let items = vec![
            item(1, MaintenanceStatus::Completed),
            item(2, MaintenanceStatus::InProgress),
            item(3, MaintenanceStatus::Pending),
        ];
        assert_eq!(ids(&visible(&items, StatusFilter::Pending)), vec![2, 3]);
        assert_eq!(ids(&visible(&items, StatusFilter::Completed)), vec![1]);
        assert_eq!(ids(&visible(&items, StatusFilter::All)), vec![1, 2, 3]);
    }

    #[test]
    fn pending_and_completed_partition_all() {
        let items = vec![
            item(1, MaintenanceStatus::Pending),
            item(2, MaintenanceStatus::Completed),
            item(3, MaintenanceStatus::InProgress),
            item(4, MaintenanceStatus::Completed),
            item(5, MaintenanceStatus::Pending),
        ];
        let pending = ids(&visible(&items, StatusFilter::Pending));
        let completed = ids(&visible(&items, StatusFilter::Completed));
        let mut union = pending.clone();
        union.extend(&completed);
        union.sort_unstable();

        assert!(pending.iter().all(|id| !completed.contains(id)));
        assert_eq!(union, ids(&visible(&items, StatusFilter::All)));
    }

    #[test]
    fn filtering_is_idempotent() {
        let items = vec![
            item(1, MaintenanceStatus::Pending),
            item(2, MaintenanceStatus::Completed),
        ];
        let first = ids(&visible(&items, StatusFilter::Pending));
        let second = ids(&visible(&items, StatusFilter::Pending));
        assert_eq!(first, second);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn default_filter_is_pending() {
        assert_eq!(StatusFilter::default(), StatusFilter::Pending);
    }
}
