use std::collections::BTreeSet;

use super::model::{LineNumber, Record, RecordSet};

// ---------------------------------------------------------------------------
// Filter criteria
// ---------------------------------------------------------------------------

/// A single-choice selection control: either everything, or one exact value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<T> {
    Any,
    Only(T),
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Selection::Any
    }
}

impl<T: PartialEq> Selection<T> {
    pub fn accepts(&self, value: Option<&T>) -> bool {
        match self {
            Selection::Any => true,
            Selection::Only(wanted) => value == Some(wanted),
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Selection::Any)
    }
}

/// Independent, optional criteria; all supplied ones must hold.
/// Empty substrings and [`Selection::Any`] do not constrain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Case-insensitive partial match on the operator name.
    pub name_substring: String,
    /// Case-insensitive partial match on the operator ID.
    pub id_substring: String,
    pub line: Selection<LineNumber>,
    pub spv: Selection<String>,
}

/// One independent condition over a record.
pub type Predicate<'a> = Box<dyn Fn(&Record) -> bool + 'a>;

impl FilterCriteria {
    /// True when no field constrains the result.
    pub fn is_unconstrained(&self) -> bool {
        self.name_substring.trim().is_empty()
            && self.id_substring.trim().is_empty()
            && self.line.is_any()
            && self.spv.is_any()
    }

    /// The active conditions, one per constraining field.
    pub fn predicates(&self) -> Vec<Predicate<'_>> {
        let mut predicates: Vec<Predicate<'_>> = Vec::new();

        if let Some(needle) = lowered(&self.name_substring) {
            predicates.push(Box::new(move |r: &Record| {
                contains_ignore_case(r.operator_name.as_deref(), &needle)
            }));
        }
        if let Some(needle) = lowered(&self.id_substring) {
            predicates.push(Box::new(move |r: &Record| {
                contains_ignore_case(r.operator_id.as_deref(), &needle)
            }));
        }
        if !self.line.is_any() {
            let line = &self.line;
            predicates.push(Box::new(move |r: &Record| {
                line.accepts(r.line_number().as_ref())
            }));
        }
        if !self.spv.is_any() {
            let spv = &self.spv;
            predicates.push(Box::new(move |r: &Record| spv.accepts(r.spv.as_ref())));
        }

        predicates
    }
}

fn lowered(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
}

/// A blank field never contains a non-empty needle.
fn contains_ignore_case(haystack: Option<&str>, needle_lower: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(needle_lower))
}

// ---------------------------------------------------------------------------
// Filter engine
// ---------------------------------------------------------------------------

/// Indices of records passing all active criteria, in source order.
pub fn filtered_indices(set: &RecordSet, criteria: &FilterCriteria) -> Vec<usize> {
    let predicates = criteria.predicates();
    set.records
        .iter()
        .enumerate()
        .filter(|(_, record)| predicates.iter().all(|p| p(*record)))
        .map(|(i, _)| i)
        .collect()
}

/// The matching subset as a new set. Expects a resolved set, so that merged
/// identity cells have been filled in before they are compared.
pub fn filter(set: &RecordSet, criteria: &FilterCriteria) -> RecordSet {
    let records = filtered_indices(set, criteria)
        .into_iter()
        .map(|i| set.records[i].clone())
        .collect();
    RecordSet::new(records, set.columns.clone())
}

// ---------------------------------------------------------------------------
// Selection options for the line / supervisor controls
// ---------------------------------------------------------------------------

/// Sorted, de-duplicated choices for the single-select controls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionOptions {
    pub lines: Vec<LineNumber>,
    pub spvs: Vec<String>,
}

impl SelectionOptions {
    /// Build from a resolved set. Unknown lines and blank supervisors are left out.
    pub fn from_records(set: &RecordSet) -> Self {
        SelectionOptions {
            lines: distinct_lines(set),
            spvs: distinct_spvs(set),
        }
    }
}

pub fn distinct_lines(set: &RecordSet) -> Vec<LineNumber> {
    set.iter()
        .filter_map(Record::line_number)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn distinct_spvs(set: &RecordSet) -> Vec<String> {
    set.iter()
        .filter_map(|r| r.spv.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
