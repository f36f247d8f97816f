use super::model::{IdentityField, Record, RecordSet};

/// Last non-empty value seen for each identity field during the scan.
#[derive(Debug, Default)]
struct LastSeen([Option<String>; 6]);

impl LastSeen {
    /// Fill `record`'s blank identity fields from earlier rows, and remember
    /// the ones it does carry.
    fn apply(&mut self, record: &mut Record) {
        for field in IdentityField::ALL {
            let slot = record.identity_mut(field);
            let last = &mut self.0[field.index()];
            if slot.is_some() {
                last.clone_from(slot);
            } else {
                slot.clone_from(last);
            }
        }
    }
}

/// Reconstruct values lost to merged cells.
///
/// Each of `Building`, `SPV`, `Line`, `OperatorName`, `OperatorID` and
/// `FinalGrade` is filled independently from the nearest preceding record that
/// has a value for it. Leading records with nothing above them stay blank.
/// The input set is left untouched; a new set is returned.
pub fn resolve_identities(set: &RecordSet) -> RecordSet {
    let (records, _) = set.records.iter().fold(
        (Vec::with_capacity(set.len()), LastSeen::default()),
        |(mut out, mut last), record| {
            let mut record = record.clone();
            last.apply(&mut record);
            out.push(record);
            (out, last)
        },
    );

    RecordSet::new(records, set.columns.clone())
}
