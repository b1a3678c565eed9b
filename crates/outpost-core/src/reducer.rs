use outpost_domain::{EntityRecord, RecordId};

use crate::error::CoreError;

/// The local half of a mutation, applied only after the remote call succeeded.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalEffect<R: EntityRecord> {
    /// A record the store just created.
    Append(R),
    /// The same partial update the store accepted.
    Patch { id: RecordId, patch: R::Patch },
}

impl<R: EntityRecord> LocalEffect<R> {
    pub fn record_id(&self) -> &RecordId {
        match self {
            Self::Append(record) => record.id(),
            Self::Patch { id, .. } => id,
        }
    }
}

/// Applies `effect` to the in-memory collection. A patch for an unknown id
/// leaves the collection untouched.
pub fn apply_effect<R: EntityRecord>(
    records: &mut Vec<R>,
    effect: LocalEffect<R>,
) -> Result<(), CoreError> {
    match effect {
        LocalEffect::Append(record) => {
            if let Some(existing) = records.iter_mut().find(|item| item.id() == record.id()) {
                *existing = record;
            } else {
                records.push(record);
            }
            Ok(())
        }
        LocalEffect::Patch { id, patch } => {
            let Some(record) = records.iter_mut().find(|item| *item.id() == id) else {
                return Err(CoreError::NotFound {
                    entity: R::ENTITY,
                    id,
                });
            };
            record.apply_patch(&patch);
            Ok(())
        }
    }
}
