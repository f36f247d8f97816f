use std::sync::{Arc, PoisonError, RwLock};

use log::{debug, info};

use crate::data::aggregate::{aggregate, Aggregate};
use crate::data::filter::{filtered_indices, FilterCriteria, Selection, SelectionOptions};
use crate::data::model::{LineNumber, Record, RecordSet};
use crate::data::normalize::{normalize_with, MalformedTableError, TableLayout};
use crate::data::raw::RawTable;
use crate::data::resolve::resolve_identities;

// ---------------------------------------------------------------------------
// Snapshot – immutable result of normalizing one raw table
// ---------------------------------------------------------------------------

/// Normalized and resolved views of one raw table. Shared read-only between
/// queries; never mutated after construction.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Content fingerprint of the raw table this was built from.
    pub fingerprint: u64,
    /// Output of the normalizer, before fill-down.
    pub normalized: RecordSet,
    /// Fill-down applied; this is what filters run against.
    pub resolved: RecordSet,
    /// Choices for the line and supervisor controls.
    pub options: SelectionOptions,
}

impl Snapshot {
    pub fn build(raw: &RawTable, layout: TableLayout) -> Result<Self, MalformedTableError> {
        layout.validate()?;
        // An empty table is what a failed fetch produces: no data, not malformed.
        let normalized = if raw.is_empty() {
            RecordSet::default()
        } else {
            normalize_with(raw, layout)?
        };
        let resolved = resolve_identities(&normalized);
        let options = SelectionOptions::from_records(&resolved);
        Ok(Snapshot {
            fingerprint: raw.fingerprint(),
            normalized,
            resolved,
            options,
        })
    }

    /// No usable rows in the source.
    pub fn has_data(&self) -> bool {
        !self.resolved.is_empty()
    }
}

// ---------------------------------------------------------------------------
// SnapshotCache – read-through cache keyed by raw table content
// ---------------------------------------------------------------------------

/// Holds the most recent snapshot. Safe to share between threads; a raw table
/// with different content always replaces the entry.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    layout: TableLayout,
    entry: RwLock<Option<Arc<Snapshot>>>,
}

impl SnapshotCache {
    pub fn new(layout: TableLayout) -> Self {
        SnapshotCache {
            layout,
            entry: RwLock::new(None),
        }
    }

    /// Return the cached snapshot for `raw`, building it on a miss.
    pub fn get_or_build(&self, raw: &RawTable) -> Result<Arc<Snapshot>, MalformedTableError> {
        let fingerprint = raw.fingerprint();

        if let Some(hit) = self.lookup(fingerprint) {
            debug!("Snapshot cache hit ({fingerprint:016x})");
            return Ok(hit);
        }

        debug!("Snapshot cache miss ({fingerprint:016x})");
        let snapshot = Arc::new(Snapshot::build(raw, self.layout)?);
        info!(
            "Built snapshot: {} records, {} lines, {} supervisors",
            snapshot.resolved.len(),
            snapshot.options.lines.len(),
            snapshot.options.spvs.len()
        );

        let mut entry = self.entry.write().unwrap_or_else(PoisonError::into_inner);
        *entry = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// The cached snapshot, if it was built from content with this fingerprint.
    pub fn lookup(&self, fingerprint: u64) -> Option<Arc<Snapshot>> {
        let entry = self.entry.read().unwrap_or_else(PoisonError::into_inner);
        entry
            .as_ref()
            .filter(|s| s.fingerprint == fingerprint)
            .cloned()
    }

    /// Drop the cached entry, e.g. when the source is known to have changed.
    pub fn invalidate(&self) {
        let mut entry = self.entry.write().unwrap_or_else(PoisonError::into_inner);
        *entry = None;
    }
}

// ---------------------------------------------------------------------------
// View – what the presentation layer should show
// ---------------------------------------------------------------------------

/// The three user-visible outcomes of a query.
#[derive(Debug, Clone, PartialEq)]
pub enum View<'a> {
    /// Source unavailable or it produced no usable rows.
    NoData,
    /// Data is loaded but the current criteria match nothing.
    NoMatch,
    Matched {
        records: Vec<&'a Record>,
        aggregate: Aggregate,
    },
}

// ---------------------------------------------------------------------------
// Dashboard state
// ---------------------------------------------------------------------------

/// Query state, independent of rendering.
#[derive(Debug, Default)]
pub struct DashboardState {
    /// Current snapshot (None until a table has been loaded).
    pub snapshot: Option<Arc<Snapshot>>,

    /// Active criteria.
    pub criteria: FilterCriteria,

    /// Indices into `snapshot.resolved` passing the criteria (cached).
    pub visible_indices: Vec<usize>,

    /// Status / error message for the UI.
    pub status_message: Option<String>,
}

impl DashboardState {
    /// Load a raw table through the cache. Criteria are kept; selections that
    /// no longer exist in the new data are reset to "any".
    pub fn load(
        &mut self,
        cache: &SnapshotCache,
        raw: &RawTable,
    ) -> Result<(), MalformedTableError> {
        match cache.get_or_build(raw) {
            Ok(snapshot) => {
                self.set_snapshot(snapshot);
                Ok(())
            }
            Err(err) => {
                self.snapshot = None;
                self.visible_indices.clear();
                self.status_message = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Install an already built snapshot and refilter.
    pub fn set_snapshot(&mut self, snapshot: Arc<Snapshot>) {
        if let Selection::Only(line) = &self.criteria.line {
            if !snapshot.options.lines.contains(line) {
                self.criteria.line = Selection::Any;
            }
        }
        if let Selection::Only(spv) = &self.criteria.spv {
            if !snapshot.options.spvs.contains(spv) {
                self.criteria.spv = Selection::Any;
            }
        }

        self.status_message = (!snapshot.has_data()).then(|| "No data available".to_string());
        self.snapshot = Some(snapshot);
        self.refilter();
    }

    /// Recompute `visible_indices` after a criteria change.
    pub fn refilter(&mut self) {
        self.visible_indices = match &self.snapshot {
            Some(snapshot) => filtered_indices(&snapshot.resolved, &self.criteria),
            None => Vec::new(),
        };
    }

    pub fn set_name_query(&mut self, query: &str) {
        self.criteria.name_substring = query.to_string();
        self.refilter();
    }

    pub fn set_id_query(&mut self, query: &str) {
        self.criteria.id_substring = query.to_string();
        self.refilter();
    }

    pub fn select_line(&mut self, line: Selection<LineNumber>) {
        self.criteria.line = line;
        self.refilter();
    }

    pub fn select_spv(&mut self, spv: Selection<String>) {
        self.criteria.spv = spv;
        self.refilter();
    }

    /// Reset every criterion to "not constraining".
    pub fn clear_filters(&mut self) {
        self.criteria = FilterCriteria::default();
        self.refilter();
    }

    /// Records currently passing the criteria, in source order.
    pub fn visible_records(&self) -> Vec<&Record> {
        match &self.snapshot {
            Some(snapshot) => self
                .visible_indices
                .iter()
                .filter_map(|&i| snapshot.resolved.records.get(i))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Classify the current state for display.
    pub fn view(&self) -> View<'_> {
        let has_data = self.snapshot.as_ref().is_some_and(|s| s.has_data());
        if !has_data {
            return View::NoData;
        }

        let records = self.visible_records();
        if records.is_empty() {
            return View::NoMatch;
        }

        View::Matched {
            aggregate: aggregate(records.iter().copied()),
            records,
        }
    }
}
