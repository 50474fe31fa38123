//! Shared test doubles and sample data.
//!
//! `InMemoryLocationRepo` behaves like the real stores (level/parent filter,
//! name ordering) and adds what scenario tests need: call counters, injected
//! failures, and gates that hold a listing until released.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use roomcraft_domain::{Location, LocationId, LocationLevel, LocationName};
use tokio::sync::Notify;

use crate::infrastructure::clock::FixedClock;
use crate::infrastructure::ports::{LocationRepo, RepoError};

pub fn fixed_now() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).single().expect("valid timestamp")
}

pub fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(fixed_now()))
}

pub fn location(name: &str, level: LocationLevel, parent: Option<&Location>) -> Location {
    Location::new(
        LocationName::new(name).expect("valid name"),
        level,
        parent.map(|p| p.id),
        fixed_now(),
    )
}

/// Key for gating or failing a listing: `(level, parent)`.
type ListKey = (LocationLevel, Option<LocationId>);

#[derive(Default)]
pub struct InMemoryLocationRepo {
    rows: Mutex<Vec<Location>>,
    list_calls: AtomicUsize,
    get_calls: AtomicUsize,
    failing_levels: Mutex<HashMap<LocationLevel, String>>,
    failing_gets: Mutex<Option<String>>,
    gates: Mutex<HashMap<ListKey, Arc<Notify>>>,
    get_gates: Mutex<HashMap<LocationId, Arc<Notify>>>,
}

impl InMemoryLocationRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: impl IntoIterator<Item = Location>) -> Self {
        let repo = Self::new();
        for row in rows {
            repo.insert(row);
        }
        repo
    }

    /// Insert or replace a row without going through the port.
    pub fn insert(&self, location: Location) {
        let mut rows = self.rows.lock().expect("rows lock");
        rows.retain(|l| l.id != location.id);
        rows.push(location);
    }

    pub fn len(&self) -> usize {
        self.rows.lock().expect("rows lock").len()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    /// Every listing at `level` fails with `message` until [`Self::recover`].
    pub fn fail_level(&self, level: LocationLevel, message: &str) {
        self.failing_levels
            .lock()
            .expect("fail lock")
            .insert(level, message.to_string());
    }

    pub fn fail_gets(&self, message: &str) {
        *self.failing_gets.lock().expect("fail lock") = Some(message.to_string());
    }

    pub fn recover(&self) {
        self.failing_levels.lock().expect("fail lock").clear();
        *self.failing_gets.lock().expect("fail lock") = None;
    }

    /// Hold listings of `level` under `parent` until the returned handle is notified.
    pub fn gate(&self, level: LocationLevel, parent: Option<LocationId>) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates
            .lock()
            .expect("gate lock")
            .insert((level, parent), notify.clone());
        notify
    }

    /// Hold point lookups of `id` until the returned handle is notified.
    pub fn gate_get(&self, id: LocationId) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.get_gates
            .lock()
            .expect("gate lock")
            .insert(id, notify.clone());
        notify
    }

    fn gate_for(&self, key: &ListKey) -> Option<Arc<Notify>> {
        self.gates.lock().expect("gate lock").get(key).cloned()
    }
}

#[async_trait]
impl LocationRepo for InMemoryLocationRepo {
    async fn get_location(&self, id: LocationId) -> Result<Option<Location>, RepoError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.get_gates.lock().expect("gate lock").get(&id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(message) = self.failing_gets.lock().expect("fail lock").clone() {
            return Err(RepoError::database("get_location", message));
        }
        let rows = self.rows.lock().expect("rows lock");
        Ok(rows.iter().find(|l| l.id == id).cloned())
    }

    async fn list_locations(
        &self,
        level: LocationLevel,
        parent_id: Option<LocationId>,
    ) -> Result<Vec<Location>, RepoError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate_for(&(level, parent_id));
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(message) = self
            .failing_levels
            .lock()
            .expect("fail lock")
            .get(&level)
            .cloned()
        {
            return Err(RepoError::database("list_locations", message));
        }

        let rows = self.rows.lock().expect("rows lock");
        let mut found: Vec<Location> = rows
            .iter()
            .filter(|l| l.level == level)
            .filter(|l| parent_id.map_or(true, |p| l.parent_id == Some(p)))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    async fn save_location(&self, location: &Location) -> Result<(), RepoError> {
        self.insert(location.clone());
        Ok(())
    }
}

/// Two countries with a full chain under the first.
///
/// ```text
/// USA ── California ── Los Angeles ── Downtown
///    └── Texas
/// Canada ── Ontario ── Toronto
/// ```
pub struct SampleTree {
    pub usa: Location,
    pub california: Location,
    pub los_angeles: Location,
    pub downtown: Location,
    pub texas: Location,
    pub canada: Location,
    pub ontario: Location,
    pub toronto: Location,
}

impl SampleTree {
    pub fn build() -> Self {
        let usa = location("USA", LocationLevel::Country, None);
        let california = location("California", LocationLevel::State, Some(&usa));
        let los_angeles = location("Los Angeles", LocationLevel::City, Some(&california));
        let downtown = location("Downtown", LocationLevel::Locality, Some(&los_angeles));
        let texas = location("Texas", LocationLevel::State, Some(&usa));
        let canada = location("Canada", LocationLevel::Country, None);
        let ontario = location("Ontario", LocationLevel::State, Some(&canada));
        let toronto = location("Toronto", LocationLevel::City, Some(&ontario));
        Self {
            usa,
            california,
            los_angeles,
            downtown,
            texas,
            canada,
            ontario,
            toronto,
        }
    }

    pub fn rows(&self) -> Vec<Location> {
        vec![
            self.usa.clone(),
            self.california.clone(),
            self.los_angeles.clone(),
            self.downtown.clone(),
            self.texas.clone(),
            self.canada.clone(),
            self.ontario.clone(),
            self.toronto.clone(),
        ]
    }

    pub fn repo(&self) -> Arc<InMemoryLocationRepo> {
        Arc::new(InMemoryLocationRepo::with_rows(self.rows()))
    }
}
