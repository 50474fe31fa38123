//! Cascading location selector.
//!
//! Owns the four selection slots and the option list of each dropdown.
//! Option loads run without holding the state lock; every load carries a
//! ticket and its result is applied only if the ticket is still current.

use std::fmt;
use std::sync::Arc;

use futures_util::future::join_all;
use roomcraft_domain::{
    DomainError, Location as DomainLocation, LocationId, LocationLevel, LocationSelection,
};
use tokio::sync::Mutex;

use super::resolve_hierarchy::{HierarchyError, ResolveHierarchy};
use crate::entities::Location;
use crate::infrastructure::ports::RepoError;

/// Receives the id of every completed locality selection.
pub type ChangeHandler = Arc<dyn Fn(LocationId) + Send + Sync>;

const LEVEL_COUNT: usize = LocationLevel::ALL.len();

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropdownState {
    /// Parent slot empty.
    Disabled,
    Loading,
    /// Options, possibly empty.
    Ready(Vec<DomainLocation>),
    Failed(String),
}

impl DropdownState {
    pub fn options(&self) -> Option<&[DomainLocation]> {
        match self {
            Self::Ready(options) => Some(options),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// What happened to one option load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    Failed,
    /// The selection moved on while the load was in flight.
    Discarded,
}

/// Result of a hierarchy back-fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackfillOutcome {
    Applied(LocationSelection),
    /// A manual selection happened first; nothing was applied.
    Superseded,
}

#[derive(Debug, thiserror::Error)]
pub enum SelectorError {
    #[error("Location selector has been torn down")]
    TornDown,
    #[error("Invalid selection: {0}")]
    InvalidSelection(#[from] DomainError),
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
    #[error("Location lookup failed: {0}")]
    QueryFailure(#[from] RepoError),
}

/// Point-in-time view of a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorSnapshot {
    pub selection: LocationSelection,
    dropdowns: [DropdownState; LEVEL_COUNT],
    /// Message from the last failed back-fill.
    pub init_error: Option<String>,
}

impl SelectorSnapshot {
    pub fn dropdown(&self, level: LocationLevel) -> &DropdownState {
        &self.dropdowns[level.depth()]
    }

    /// Names of the ready options at `level`; empty otherwise.
    pub fn option_names(&self, level: LocationLevel) -> Vec<String> {
        self.dropdown(level)
            .options()
            .unwrap_or_default()
            .iter()
            .map(|l| l.name.as_str().to_string())
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
struct LoadTicket {
    level: LocationLevel,
    parent: Option<LocationId>,
    generation: u64,
}

struct SelectorState {
    selection: LocationSelection,
    dropdowns: [DropdownState; LEVEL_COUNT],
    generations: [u64; LEVEL_COUNT],
    /// Bumped on every change to `selection`.
    selection_epoch: u64,
    init_error: Option<String>,
    torn_down: bool,
}

impl SelectorState {
    fn new() -> Self {
        Self {
            selection: LocationSelection::default(),
            dropdowns: std::array::from_fn(|_| DropdownState::Disabled),
            generations: [0; LEVEL_COUNT],
            selection_epoch: 0,
            init_error: None,
            torn_down: false,
        }
    }

    fn ensure_live(&self) -> Result<(), SelectorError> {
        if self.torn_down {
            Err(SelectorError::TornDown)
        } else {
            Ok(())
        }
    }

    /// Supersede any in-flight load for `level` and, if the level is usable,
    /// mark it loading and hand out the ticket for the new load.
    fn begin_load(&mut self, level: LocationLevel) -> Option<LoadTicket> {
        let depth = level.depth();
        self.generations[depth] += 1;

        if !self.selection.is_enabled(level) {
            self.dropdowns[depth] = DropdownState::Disabled;
            return None;
        }
        self.dropdowns[depth] = DropdownState::Loading;
        Some(LoadTicket {
            level,
            parent: self.selection.parent_for(level),
            generation: self.generations[depth],
        })
    }

    fn is_current(&self, ticket: &LoadTicket) -> bool {
        !self.torn_down
            && self.generations[ticket.level.depth()] == ticket.generation
            && self.selection.parent_for(ticket.level) == ticket.parent
    }

    fn apply_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<DomainLocation>, RepoError>,
    ) -> LoadOutcome {
        if !self.is_current(&ticket) {
            tracing::trace!(
                level = %ticket.level,
                parent_id = ?ticket.parent,
                "Stale location options dropped"
            );
            return LoadOutcome::Discarded;
        }

        let depth = ticket.level.depth();
        match result {
            Ok(options) => {
                self.dropdowns[depth] = DropdownState::Ready(options);
                LoadOutcome::Loaded
            }
            Err(e) => {
                tracing::warn!(level = %ticket.level, error = %e, "Failed to load location options");
                self.dropdowns[depth] = DropdownState::Failed(e.to_string());
                LoadOutcome::Failed
            }
        }
    }

    fn snapshot(&self) -> SelectorSnapshot {
        SelectorSnapshot {
            selection: self.selection,
            dropdowns: self.dropdowns.clone(),
            init_error: self.init_error.clone(),
        }
    }
}

struct Inner {
    location: Arc<Location>,
    resolver: Arc<ResolveHierarchy>,
    on_change: Option<ChangeHandler>,
    state: Mutex<SelectorState>,
}

/// One cascading country/state/city/locality picker.
///
/// Clones share state. Independent selectors never interact.
#[derive(Clone)]
pub struct LocationSelector {
    inner: Arc<Inner>,
}

impl fmt::Debug for LocationSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationSelector").finish_non_exhaustive()
    }
}

impl LocationSelector {
    pub fn new(location: Arc<Location>, resolver: Arc<ResolveHierarchy>) -> Self {
        Self::build(location, resolver, None)
    }

    pub fn with_on_change(
        location: Arc<Location>,
        resolver: Arc<ResolveHierarchy>,
        on_change: ChangeHandler,
    ) -> Self {
        Self::build(location, resolver, Some(on_change))
    }

    fn build(
        location: Arc<Location>,
        resolver: Arc<ResolveHierarchy>,
        on_change: Option<ChangeHandler>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                location,
                resolver,
                on_change,
                state: Mutex::new(SelectorState::new()),
            }),
        }
    }

    /// Load country options and, when `initial` is given, back-fill every
    /// slot from its hierarchy.
    pub async fn mount(
        &self,
        initial: Option<LocationId>,
    ) -> Result<Option<BackfillOutcome>, SelectorError> {
        let ticket = {
            let mut state = self.inner.state.lock().await;
            state.ensure_live()?;
            state.begin_load(LocationLevel::Country)
        };

        let countries = async {
            if let Some(ticket) = ticket {
                self.run_load(ticket, false).await;
            }
        };
        match initial {
            None => {
                countries.await;
                Ok(None)
            }
            Some(id) => {
                let (_, backfill) = tokio::join!(countries, self.initialize_from(id));
                backfill.map(Some)
            }
        }
    }

    /// Apply a user choice at `level`. `None` clears the slot.
    ///
    /// A chosen id must be one of the options for `level` under the current
    /// parent. Returns the outcome of the dependent level's option load, if
    /// one was started.
    pub async fn select_level(
        &self,
        level: LocationLevel,
        id: Option<LocationId>,
    ) -> Result<Option<LoadOutcome>, SelectorError> {
        let checked_parent = match id {
            Some(id) => Some(self.check_choice(level, id).await?),
            None => None,
        };

        let (ticket, notify) = {
            let mut state = self.inner.state.lock().await;
            state.ensure_live()?;
            if let Some(parent) = checked_parent {
                if state.selection.parent_for(level) != parent {
                    return Err(DomainError::invalid_state_transition(format!(
                        "the {} selection changed while {} was being checked",
                        level.parent().map(|p| p.as_str()).unwrap_or("parent"),
                        level
                    ))
                    .into());
                }
            }
            state.selection.select(level, id)?;
            state.selection_epoch += 1;
            state.init_error = None;

            let mut ticket = None;
            for deeper in level.descendants() {
                let started = state.begin_load(deeper);
                ticket = ticket.or(started);
            }
            let notify = match (level, id) {
                (LocationLevel::Locality, Some(id)) => Some(id),
                _ => None,
            };
            (ticket, notify)
        };

        tracing::debug!(level = %level, location_id = ?id, "Location level selected");
        if let (Some(handler), Some(id)) = (&self.inner.on_change, notify) {
            handler(id);
        }

        match ticket {
            Some(ticket) => Ok(Some(self.run_load(ticket, false).await)),
            None => Ok(None),
        }
    }

    /// Verify `id` against the ready options of `level`, or with a point
    /// lookup when they are not loaded. Returns the parent it was checked
    /// against.
    async fn check_choice(
        &self,
        level: LocationLevel,
        id: LocationId,
    ) -> Result<Option<LocationId>, SelectorError> {
        let (selection, parent) = {
            let state = self.inner.state.lock().await;
            state.ensure_live()?;
            let selection = state.selection;
            selection.ensure_enabled(level)?;
            let parent = selection.parent_for(level);
            if let Some(options) = state.dropdowns[level.depth()].options() {
                return match options.iter().find(|o| o.id == id) {
                    Some(option) => {
                        selection.check_candidate(level, option)?;
                        Ok(parent)
                    }
                    None => Err(DomainError::invalid_state_transition(format!(
                        "{} is not a {} option for the current selection",
                        id, level
                    ))
                    .into()),
                };
            }
            (selection, parent)
        };

        let candidate = self.inner.location.get(id).await?.ok_or_else(|| {
            DomainError::invalid_state_transition(format!("{} does not exist", id))
        })?;
        selection.check_candidate(level, &candidate)?;
        Ok(parent)
    }

    /// Populate every slot from the hierarchy of `id` in one step.
    ///
    /// On failure the selection is left empty and the error is recorded in
    /// the snapshot. A back-fill overtaken by a manual selection is dropped.
    pub async fn initialize_from(&self, id: LocationId) -> Result<BackfillOutcome, SelectorError> {
        let epoch = {
            let state = self.inner.state.lock().await;
            state.ensure_live()?;
            state.selection_epoch
        };

        let resolved = self
            .inner
            .resolver
            .execute(Some(id))
            .await
            .and_then(|hierarchy| hierarchy.ok_or(HierarchyError::NotFound(id)))
            .and_then(|hierarchy| {
                LocationSelection::from_hierarchy(&hierarchy)
                    .map_err(|e| HierarchyError::corruption(id, e.to_string()))
            });

        let tickets = {
            let mut state = self.inner.state.lock().await;
            state.ensure_live()?;
            if state.selection_epoch != epoch {
                tracing::trace!(location_id = %id, "Hierarchy back-fill superseded");
                return Ok(BackfillOutcome::Superseded);
            }
            state.selection_epoch += 1;

            match resolved {
                Ok(selection) => {
                    state.selection = selection;
                    state.init_error = None;
                    LocationLevel::Country
                        .descendants()
                        .filter_map(|level| state.begin_load(level))
                        .collect::<Vec<_>>()
                }
                Err(e) => {
                    tracing::warn!(location_id = %id, error = %e, "Hierarchy back-fill failed");
                    state.selection.clear();
                    state.init_error = Some(e.to_string());
                    for level in LocationLevel::Country.descendants() {
                        state.begin_load(level);
                    }
                    return Err(e.into());
                }
            }
        };

        join_all(tickets.into_iter().map(|t| self.run_load(t, false))).await;

        let selection = self.inner.state.lock().await.selection;
        tracing::debug!(location_id = %id, "Hierarchy back-fill applied");
        Ok(BackfillOutcome::Applied(selection))
    }

    /// Re-run the option load for `level`, bypassing the cache.
    pub async fn retry(&self, level: LocationLevel) -> Result<Option<LoadOutcome>, SelectorError> {
        let ticket = {
            let mut state = self.inner.state.lock().await;
            state.ensure_live()?;
            state.begin_load(level)
        };
        match ticket {
            Some(ticket) => Ok(Some(self.run_load(ticket, true).await)),
            None => Ok(None),
        }
    }

    pub async fn snapshot(&self) -> SelectorSnapshot {
        self.inner.state.lock().await.snapshot()
    }

    pub async fn selection(&self) -> LocationSelection {
        self.inner.state.lock().await.selection
    }

    /// Stop all further state changes. In-flight loads finish but are dropped.
    pub async fn teardown(&self) {
        let mut state = self.inner.state.lock().await;
        if !state.torn_down {
            state.torn_down = true;
            tracing::debug!("Location selector torn down");
        }
    }

    async fn run_load(&self, ticket: LoadTicket, bypass_cache: bool) -> LoadOutcome {
        let location = &self.inner.location;
        let result = if bypass_cache {
            location.refetch_locations(ticket.level, ticket.parent).await
        } else {
            location.fetch_locations(ticket.level, ticket.parent).await
        };
        self.inner.state.lock().await.apply_load(ticket, result)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use super::*;
    use crate::test_fixtures::{location, InMemoryLocationRepo, SampleTree};

    fn selector_over(repo: Arc<InMemoryLocationRepo>) -> LocationSelector {
        let location = Arc::new(Location::uncached(repo));
        let resolver = Arc::new(ResolveHierarchy::new(location.clone()));
        LocationSelector::new(location, resolver)
    }

    fn recording_selector(
        repo: Arc<InMemoryLocationRepo>,
    ) -> (LocationSelector, Arc<StdMutex<Vec<LocationId>>>) {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = seen.clone();
        let location = Arc::new(Location::uncached(repo));
        let resolver = Arc::new(ResolveHierarchy::new(location.clone()));
        let selector = LocationSelector::with_on_change(
            location,
            resolver,
            Arc::new(move |id| sink.lock().expect("lock").push(id)),
        );
        (selector, seen)
    }

    async fn wait_for(mut condition: impl FnMut() -> bool) {
        while !condition() {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn mount_without_initial_loads_countries_only() {
        let tree = SampleTree::build();
        let selector = selector_over(tree.repo());

        let outcome = selector.mount(None).await.expect("mount");
        assert!(outcome.is_none());

        let snapshot = selector.snapshot().await;
        assert!(snapshot.selection.is_empty());
        assert_eq!(snapshot.option_names(LocationLevel::Country), vec!["Canada", "USA"]);
        assert_eq!(snapshot.dropdown(LocationLevel::State), &DropdownState::Disabled);
        assert_eq!(snapshot.dropdown(LocationLevel::Locality), &DropdownState::Disabled);
    }

    #[tokio::test]
    async fn mount_with_locality_backfills_every_slot() {
        let tree = SampleTree::build();
        let (selector, seen) = recording_selector(tree.repo());

        let outcome = selector
            .mount(Some(tree.downtown.id))
            .await
            .expect("mount")
            .expect("backfill ran");

        let expected = LocationSelection {
            country: Some(tree.usa.id),
            state: Some(tree.california.id),
            city: Some(tree.los_angeles.id),
            locality: Some(tree.downtown.id),
        };
        assert_eq!(outcome, BackfillOutcome::Applied(expected));

        let snapshot = selector.snapshot().await;
        assert_eq!(snapshot.selection, expected);
        assert_eq!(snapshot.option_names(LocationLevel::Country), vec!["Canada", "USA"]);
        assert_eq!(snapshot.option_names(LocationLevel::State), vec!["California", "Texas"]);
        assert_eq!(snapshot.option_names(LocationLevel::City), vec!["Los Angeles"]);
        assert_eq!(snapshot.option_names(LocationLevel::Locality), vec!["Downtown"]);
        assert!(snapshot.init_error.is_none());
        // Back-fill is not a user selection.
        assert!(seen.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn selecting_a_state_clears_deeper_slots() {
        let tree = SampleTree::build();
        let selector = selector_over(tree.repo());
        selector.mount(Some(tree.downtown.id)).await.expect("mount");

        let outcome = selector
            .select_level(LocationLevel::State, Some(tree.texas.id))
            .await
            .expect("select");
        assert_eq!(outcome, Some(LoadOutcome::Loaded));

        let snapshot = selector.snapshot().await;
        assert_eq!(snapshot.selection.country, Some(tree.usa.id));
        assert_eq!(snapshot.selection.state, Some(tree.texas.id));
        assert_eq!(snapshot.selection.city, None);
        assert_eq!(snapshot.selection.locality, None);
        assert_eq!(snapshot.dropdown(LocationLevel::City), &DropdownState::Ready(vec![]));
        assert_eq!(snapshot.dropdown(LocationLevel::Locality), &DropdownState::Disabled);
    }

    #[tokio::test]
    async fn every_selection_empties_strictly_deeper_slots() {
        let tree = SampleTree::build();
        let selector = selector_over(tree.repo());

        for level in LocationLevel::ALL {
            selector.mount(Some(tree.downtown.id)).await.expect("mount");
            let current = selector.selection().await.get(level);
            selector.select_level(level, current).await.expect("select");

            let selection = selector.selection().await;
            for deeper in level.descendants() {
                assert_eq!(selection.get(deeper), None, "{} after selecting {}", deeper, level);
            }
            assert!(selection.is_contiguous());
        }
    }

    #[tokio::test]
    async fn clearing_country_disables_all_dependents() {
        let tree = SampleTree::build();
        let selector = selector_over(tree.repo());
        selector.mount(Some(tree.downtown.id)).await.expect("mount");

        let outcome = selector
            .select_level(LocationLevel::Country, None)
            .await
            .expect("clear");
        assert_eq!(outcome, None);

        let snapshot = selector.snapshot().await;
        assert!(snapshot.selection.is_empty());
        for level in LocationLevel::Country.descendants() {
            assert_eq!(snapshot.dropdown(level), &DropdownState::Disabled);
        }
        assert!(snapshot.dropdown(LocationLevel::Country).options().is_some());
    }

    #[tokio::test]
    async fn selecting_below_an_empty_parent_is_rejected() {
        let tree = SampleTree::build();
        let selector = selector_over(tree.repo());
        selector.mount(None).await.expect("mount");

        let err = selector
            .select_level(LocationLevel::City, Some(tree.los_angeles.id))
            .await
            .expect_err("no state selected");
        assert!(matches!(err, SelectorError::InvalidSelection(_)));
        assert!(selector.selection().await.is_empty());
    }

    #[tokio::test]
    async fn state_from_another_country_is_rejected() {
        let tree = SampleTree::build();
        let (selector, seen) = recording_selector(tree.repo());
        selector.mount(None).await.expect("mount");
        selector
            .select_level(LocationLevel::Country, Some(tree.canada.id))
            .await
            .expect("country");

        let err = selector
            .select_level(LocationLevel::State, Some(tree.california.id))
            .await
            .expect_err("california is not in canada");
        assert!(matches!(err, SelectorError::InvalidSelection(_)));

        let snapshot = selector.snapshot().await;
        assert_eq!(snapshot.selection.country, Some(tree.canada.id));
        assert_eq!(snapshot.selection.state, None);
        assert_eq!(snapshot.option_names(LocationLevel::State), vec!["Ontario"]);

        let err = selector
            .select_level(LocationLevel::Locality, Some(tree.downtown.id))
            .await
            .expect_err("no city selected");
        assert!(matches!(err, SelectorError::InvalidSelection(_)));
        assert!(seen.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn id_of_another_level_is_rejected() {
        let tree = SampleTree::build();
        let selector = selector_over(tree.repo());
        selector.mount(None).await.expect("mount");

        let err = selector
            .select_level(LocationLevel::Country, Some(tree.downtown.id))
            .await
            .expect_err("locality is not a country");
        assert!(matches!(err, SelectorError::InvalidSelection(_)));
        assert!(selector.selection().await.is_empty());
    }

    #[tokio::test]
    async fn unloaded_options_are_checked_with_a_lookup() {
        let tree = SampleTree::build();
        let repo = tree.repo();
        let selector = selector_over(repo.clone());
        selector.mount(None).await.expect("mount");

        repo.fail_level(LocationLevel::State, "backend unavailable");
        let outcome = selector
            .select_level(LocationLevel::Country, Some(tree.usa.id))
            .await
            .expect("country");
        assert_eq!(outcome, Some(LoadOutcome::Failed));

        let gets_before = repo.get_calls();
        selector
            .select_level(LocationLevel::State, Some(tree.california.id))
            .await
            .expect("california is in usa");
        assert_eq!(repo.get_calls(), gets_before + 1);

        let err = selector
            .select_level(LocationLevel::State, Some(tree.ontario.id))
            .await
            .expect_err("ontario is not in usa");
        assert!(matches!(err, SelectorError::InvalidSelection(_)));
        assert_eq!(selector.selection().await.state, Some(tree.california.id));
    }

    #[tokio::test]
    async fn manual_selection_clears_backfill_error() {
        let tree = SampleTree::build();
        let repo = tree.repo();
        let selector = selector_over(repo.clone());

        repo.fail_gets("connection refused");
        selector
            .mount(Some(tree.downtown.id))
            .await
            .expect_err("backfill fails");
        assert!(selector.snapshot().await.init_error.is_some());

        selector
            .select_level(LocationLevel::Country, Some(tree.canada.id))
            .await
            .expect("country");
        let snapshot = selector.snapshot().await;
        assert!(snapshot.init_error.is_none());
        assert_eq!(snapshot.selection.country, Some(tree.canada.id));
    }

    #[tokio::test]
    async fn on_change_fires_once_per_locality_selection() {
        let tree = SampleTree::build();
        let (selector, seen) = recording_selector(tree.repo());
        selector.mount(None).await.expect("mount");

        selector
            .select_level(LocationLevel::Country, Some(tree.usa.id))
            .await
            .expect("country");
        selector
            .select_level(LocationLevel::State, Some(tree.california.id))
            .await
            .expect("state");
        selector
            .select_level(LocationLevel::City, Some(tree.los_angeles.id))
            .await
            .expect("city");
        assert!(seen.lock().expect("lock").is_empty());

        let outcome = selector
            .select_level(LocationLevel::Locality, Some(tree.downtown.id))
            .await
            .expect("locality");
        assert_eq!(outcome, None);
        assert_eq!(*seen.lock().expect("lock"), vec![tree.downtown.id]);

        selector
            .select_level(LocationLevel::Locality, None)
            .await
            .expect("clear locality");
        assert_eq!(seen.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn stale_state_options_never_overwrite_newer_parent() {
        let tree = SampleTree::build();
        let repo = tree.repo();
        let usa_gate = repo.gate(LocationLevel::State, Some(tree.usa.id));
        let selector = selector_over(repo.clone());
        selector.mount(None).await.expect("mount");
        let calls_before = repo.list_calls();

        let slow = selector.clone();
        let usa = tree.usa.id;
        let usa_pick = tokio::spawn(async move {
            slow.select_level(LocationLevel::Country, Some(usa)).await
        });
        wait_for(|| repo.list_calls() > calls_before).await;

        let canada_outcome = selector
            .select_level(LocationLevel::Country, Some(tree.canada.id))
            .await
            .expect("canada");
        assert_eq!(canada_outcome, Some(LoadOutcome::Loaded));

        usa_gate.notify_one();
        let usa_outcome = usa_pick.await.expect("join").expect("usa");
        assert_eq!(usa_outcome, Some(LoadOutcome::Discarded));

        let snapshot = selector.snapshot().await;
        assert_eq!(snapshot.selection.country, Some(tree.canada.id));
        assert_eq!(snapshot.option_names(LocationLevel::State), vec!["Ontario"]);
    }

    #[tokio::test]
    async fn failed_child_load_leaves_parent_options_intact() {
        let tree = SampleTree::build();
        let repo = tree.repo();
        let selector = selector_over(repo.clone());
        selector.mount(None).await.expect("mount");
        selector
            .select_level(LocationLevel::Country, Some(tree.usa.id))
            .await
            .expect("country");

        repo.fail_level(LocationLevel::City, "backend unavailable");
        let outcome = selector
            .select_level(LocationLevel::State, Some(tree.california.id))
            .await
            .expect("state");
        assert_eq!(outcome, Some(LoadOutcome::Failed));

        let snapshot = selector.snapshot().await;
        assert!(matches!(
            snapshot.dropdown(LocationLevel::City),
            DropdownState::Failed(message) if message.contains("backend unavailable")
        ));
        assert_eq!(snapshot.option_names(LocationLevel::State), vec!["California", "Texas"]);
    }

    #[tokio::test]
    async fn retry_refetches_a_failed_level() {
        let tree = SampleTree::build();
        let repo = tree.repo();
        let location = Arc::new(Location::new(repo.clone(), Duration::from_secs(60)));
        let resolver = Arc::new(ResolveHierarchy::new(location.clone()));
        let selector = LocationSelector::new(location, resolver);

        repo.fail_level(LocationLevel::Country, "timeout");
        selector.mount(None).await.expect("mount");
        assert!(matches!(
            selector.snapshot().await.dropdown(LocationLevel::Country),
            DropdownState::Failed(_)
        ));

        repo.recover();
        let outcome = selector.retry(LocationLevel::Country).await.expect("retry");
        assert_eq!(outcome, Some(LoadOutcome::Loaded));
        assert_eq!(
            selector.snapshot().await.option_names(LocationLevel::Country),
            vec!["Canada", "USA"]
        );
    }

    #[tokio::test]
    async fn retry_on_disabled_level_is_a_no_op() {
        let tree = SampleTree::build();
        let selector = selector_over(tree.repo());
        selector.mount(None).await.expect("mount");

        let outcome = selector.retry(LocationLevel::City).await.expect("retry");
        assert_eq!(outcome, None);
    }

    #[tokio::test]
    async fn failed_backfill_leaves_selection_empty() {
        let tree = SampleTree::build();
        let repo = tree.repo();
        let selector = selector_over(repo.clone());
        selector.mount(None).await.expect("mount");
        selector
            .select_level(LocationLevel::Country, Some(tree.canada.id))
            .await
            .expect("country");

        repo.fail_gets("connection refused");
        let err = selector
            .initialize_from(tree.downtown.id)
            .await
            .expect_err("lookup fails");
        assert!(matches!(
            err,
            SelectorError::Hierarchy(HierarchyError::QueryFailure(_))
        ));

        let snapshot = selector.snapshot().await;
        assert!(snapshot.selection.is_empty());
        assert!(snapshot
            .init_error
            .as_deref()
            .is_some_and(|m| m.contains("connection refused")));
        assert_eq!(snapshot.dropdown(LocationLevel::State), &DropdownState::Disabled);
    }

    #[tokio::test]
    async fn inconsistent_chain_is_corruption_and_empties_selection() {
        let usa = location("USA", LocationLevel::Country, None);
        // Locality hanging directly off a country.
        let stray = location("Stray", LocationLevel::Locality, Some(&usa));
        let repo = Arc::new(InMemoryLocationRepo::with_rows([usa, stray.clone()]));
        let selector = selector_over(repo);

        let err = selector
            .mount(Some(stray.id))
            .await
            .expect_err("corrupt chain");
        assert!(matches!(
            err,
            SelectorError::Hierarchy(HierarchyError::Corruption { .. })
        ));
        let snapshot = selector.snapshot().await;
        assert!(snapshot.selection.is_empty());
        assert!(snapshot.init_error.is_some());
    }

    #[tokio::test]
    async fn backfill_overtaken_by_manual_selection_is_dropped() {
        let tree = SampleTree::build();
        let repo = tree.repo();
        let gate = repo.gate_get(tree.downtown.id);
        let selector = selector_over(repo.clone());
        selector.mount(None).await.expect("mount");

        let background = selector.clone();
        let downtown = tree.downtown.id;
        let backfill = tokio::spawn(async move { background.initialize_from(downtown).await });
        wait_for(|| repo.get_calls() > 0).await;

        selector
            .select_level(LocationLevel::Country, Some(tree.canada.id))
            .await
            .expect("manual");
        gate.notify_one();

        let outcome = backfill.await.expect("join").expect("backfill");
        assert_eq!(outcome, BackfillOutcome::Superseded);
        let selection = selector.selection().await;
        assert_eq!(selection.country, Some(tree.canada.id));
        assert_eq!(selection.state, None);
    }

    #[tokio::test]
    async fn teardown_freezes_state() {
        let tree = SampleTree::build();
        let repo = tree.repo();
        let gate = repo.gate(LocationLevel::State, Some(tree.usa.id));
        let selector = selector_over(repo.clone());
        selector.mount(None).await.expect("mount");
        let calls_before = repo.list_calls();

        let pending = selector.clone();
        let usa = tree.usa.id;
        let in_flight = tokio::spawn(async move {
            pending.select_level(LocationLevel::Country, Some(usa)).await
        });
        wait_for(|| repo.list_calls() > calls_before).await;

        selector.teardown().await;
        gate.notify_one();

        let outcome = in_flight.await.expect("join").expect("started before teardown");
        assert_eq!(outcome, Some(LoadOutcome::Discarded));
        assert!(selector
            .snapshot()
            .await
            .dropdown(LocationLevel::State)
            .is_loading());

        let err = selector
            .select_level(LocationLevel::Country, Some(tree.canada.id))
            .await
            .expect_err("torn down");
        assert!(matches!(err, SelectorError::TornDown));
        assert!(matches!(
            selector.retry(LocationLevel::Country).await,
            Err(SelectorError::TornDown)
        ));
    }

    #[tokio::test]
    async fn selectors_do_not_share_state() {
        let tree = SampleTree::build();
        let repo = tree.repo();
        let first = selector_over(repo.clone());
        let second = selector_over(repo);
        first.mount(None).await.expect("mount");
        second.mount(None).await.expect("mount");

        first
            .select_level(LocationLevel::Country, Some(tree.usa.id))
            .await
            .expect("select");
        assert!(second.selection().await.is_empty());
    }

    #[tokio::test]
    async fn change_handler_can_count_selections() {
        let tree = SampleTree::build();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let location = Arc::new(Location::uncached(tree.repo()));
        let resolver = Arc::new(ResolveHierarchy::new(location.clone()));
        let selector = LocationSelector::with_on_change(
            location,
            resolver,
            Arc::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        selector.mount(Some(tree.downtown.id)).await.expect("mount");

        selector
            .select_level(LocationLevel::Locality, Some(tree.downtown.id))
            .await
            .expect("reselect");
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
