// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use homekeep_app::{
    HouseId, HouseSystem, MaintenanceBackend, MaintenanceCategory, MaintenanceItem,
    MaintenanceItemId, MaintenancePriority, MaintenanceStatus, PersistenceError, RetrievalError,
    UserId,
};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

const NOTES: [&str; 8] = [
    "Parts are on the garage shelf",
    "Check the manual before starting",
    "Last done by the previous owner",
    "Needs a second person",
    "Buy supplies first",
    "Vendor quoted last spring",
    "Do this before the first frost",
    "Take photos for insurance",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Seeded generator of plausible maintenance items.
#[derive(Debug, Clone)]
pub struct HomeFaker {
    rng: DeterministicRng,
}

impl HomeFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn maintenance_item(&mut self, house_id: HouseId, created_by: UserId) -> MaintenanceItem {
        let category = MaintenanceCategory::ALL[self.rng.int_n(MaintenanceCategory::ALL.len())];
        self.maintenance_item_in(house_id, created_by, category)
    }

    pub fn maintenance_item_in(
        &mut self,
        house_id: HouseId,
        created_by: UserId,
        category: MaintenanceCategory,
    ) -> MaintenanceItem {
        let (title, system) = pick_task(category, self.rng.int_n(2));
        let priority = MaintenancePriority::ALL[self.rng.int_n(MaintenancePriority::ALL.len())];
        let status = MaintenanceStatus::ALL[self.rng.int_n(MaintenanceStatus::ALL.len())];

        let created_at = reference_now() - Duration::days(self.int_range_i64(30, 365));
        let updated_at = created_at + Duration::days(self.int_range_i64(0, 20));
        let due_date = (self.int_range_i64(1, 10) <= 7).then(|| {
            (reference_now() + Duration::days(self.int_range_i64(-120, 180))).date()
        });
        let notes = self
            .rng
            .bool()
            .then(|| NOTES[self.rng.int_n(NOTES.len())].to_owned());

        MaintenanceItem {
            id: None,
            house_id,
            title: title.to_owned(),
            description: None,
            category,
            priority,
            status,
            due_date,
            related_system: system,
            notes,
            created_by,
            created_at,
            updated_at,
            completed_at: status.is_completed().then_some(updated_at),
        }
    }

    fn int_range_i64(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Fetch(HouseId),
    Save(Option<MaintenanceItemId>),
    Delete(MaintenanceItemId),
}

/// In-memory collaborator with failure injection and a call log.
#[derive(Debug, Clone, Default)]
pub struct ScriptedBackend {
    items: BTreeMap<MaintenanceItemId, MaintenanceItem>,
    next_id: i64,
    fail_fetch: Option<String>,
    fail_save: Option<String>,
    fail_delete: BTreeSet<MaintenanceItemId>,
    calls: Vec<BackendCall>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores items as-is, assigning ids to the ones that lack them.
    pub fn with_items(items: impl IntoIterator<Item = MaintenanceItem>) -> Self {
        let mut backend = Self::new();
        for item in items {
            backend.insert(item);
        }
        backend
    }

    pub fn insert(&mut self, mut item: MaintenanceItem) -> MaintenanceItemId {
        let id = match item.id {
            Some(id) => {
                self.next_id = self.next_id.max(id.get());
                id
            }
            None => self.allocate_id(),
        };
        item.id = Some(id);
        self.items.insert(id, item);
        id
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn fail_fetch(&mut self, detail: impl Into<String>) {
        self.fail_fetch = Some(detail.into());
    }

    pub fn fail_save(&mut self, detail: impl Into<String>) {
        self.fail_save = Some(detail.into());
    }

    pub fn fail_delete_of(&mut self, id: MaintenanceItemId) {
        self.fail_delete.insert(id);
    }

    pub fn heal(&mut self) {
        self.fail_fetch = None;
        self.fail_save = None;
        self.fail_delete.clear();
    }

    fn allocate_id(&mut self) -> MaintenanceItemId {
        self.next_id += 1;
        MaintenanceItemId::new(self.next_id)
    }
}

impl MaintenanceBackend for ScriptedBackend {
    fn fetch_items(&mut self, house_id: HouseId) -> Result<Vec<MaintenanceItem>, RetrievalError> {
        self.calls.push(BackendCall::Fetch(house_id));
        if let Some(detail) = &self.fail_fetch {
            return Err(RetrievalError::new(house_id, detail.clone()));
        }
        Ok(self
            .items
            .values()
            .filter(|item| item.house_id == house_id)
            .cloned()
            .collect())
    }

    fn save_item(&mut self, item: &MaintenanceItem) -> Result<MaintenanceItemId, PersistenceError> {
        self.calls.push(BackendCall::Save(item.id));
        if let Some(detail) = &self.fail_save {
            return Err(PersistenceError::Save(detail.clone()));
        }
        if item.title.trim().is_empty() {
            return Err(PersistenceError::EmptyTitle);
        }
        if let Some(id) = item.id
            && !self.items.contains_key(&id)
        {
            return Err(PersistenceError::NotFound(id));
        }
        Ok(self.insert(item.clone()))
    }

    fn delete_item(&mut self, id: MaintenanceItemId) -> Result<(), PersistenceError> {
        self.calls.push(BackendCall::Delete(id));
        if self.fail_delete.contains(&id) {
            return Err(PersistenceError::Delete {
                id,
                detail: "scripted failure".to_owned(),
            });
        }
        self.items
            .remove(&id)
            .map(|_| ())
            .ok_or(PersistenceError::NotFound(id))
    }
}

/// A pending item with every optional field empty.
pub fn sample_item(house_id: HouseId, title: &str) -> MaintenanceItem {
    MaintenanceItem {
        id: None,
        house_id,
        title: title.to_owned(),
        description: None,
        category: MaintenanceCategory::Routine,
        priority: MaintenancePriority::Medium,
        status: MaintenanceStatus::Pending,
        due_date: None,
        related_system: None,
        notes: None,
        created_by: UserId::new(1),
        created_at: reference_now(),
        updated_at: reference_now(),
        completed_at: None,
    }
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("homekeep.db");
    Ok((dir, db_path))
}

/// Fixed clock for generated data: 2026-01-01 00:00 UTC.
pub fn reference_now() -> OffsetDateTime {
    datetime!(2026-01-01 00:00 UTC)
}

fn pick_task(category: MaintenanceCategory, index: usize) -> (&'static str, Option<HouseSystem>) {
    let options: [(&str, Option<HouseSystem>); 2] = match category {
        MaintenanceCategory::Routine => [
            ("Replace HVAC filter", Some(HouseSystem::Hvac)),
            ("Test GFCI outlets", Some(HouseSystem::Electrical)),
        ],
        MaintenanceCategory::Seasonal => [
            ("Clean gutters", Some(HouseSystem::Roof)),
            ("Winterize outdoor spigots", Some(HouseSystem::Plumbing)),
        ],
        MaintenanceCategory::Repair => [
            ("Fix leaky kitchen faucet", Some(HouseSystem::Plumbing)),
            ("Patch drywall in hallway", Some(HouseSystem::Interior)),
        ],
        MaintenanceCategory::Inspection => [
            ("Inspect foundation cracks", Some(HouseSystem::Foundation)),
            ("Check attic for leaks", Some(HouseSystem::Roof)),
        ],
        MaintenanceCategory::Cleaning => [
            ("Vacuum refrigerator coils", Some(HouseSystem::Appliances)),
            ("Clean dryer vent", Some(HouseSystem::Appliances)),
        ],
        MaintenanceCategory::Safety => [
            ("Replace smoke detector batteries", Some(HouseSystem::Security)),
            ("Test CO detectors", Some(HouseSystem::Security)),
        ],
        MaintenanceCategory::Upgrade => [
            ("Install smart thermostat", Some(HouseSystem::Hvac)),
            ("Add exterior motion lights", Some(HouseSystem::Exterior)),
        ],
        MaintenanceCategory::Other => [
            ("Sort garage storage", None),
            ("Reseed lawn", Some(HouseSystem::Landscaping)),
        ],
    };
    options[index % options.len()]
}
