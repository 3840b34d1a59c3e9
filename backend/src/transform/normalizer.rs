//! Record normalizer: trims one raw row and applies the missing-value policy.
//!
//! Every declared field is required. A row is either fully populated after
//! trimming or it is rejected; there are no optional fields.

use crate::models::{RawRecord, Record, RejectReason};

/// Normalize one raw row.
///
/// 1. Reject with [`RejectReason::EmptyRow`] when no value is non-blank.
/// 2. Trim every field name and value; a missing value becomes `""`.
/// 3. Reject with [`RejectReason::MissingRequiredField`] when any trimmed
///    value is empty.
///
/// Field order is preserved. If two names collide after trimming, the later
/// value replaces the earlier one in the earlier position.
pub fn normalize_record(raw: &RawRecord) -> Result<Record, RejectReason> {
    let has_content = raw
        .iter()
        .any(|(_, value)| value.is_some_and(|v| !v.trim().is_empty()));
    if !has_content {
        return Err(RejectReason::EmptyRow);
    }

    let mut fields: Vec<(String, String)> = Vec::with_capacity(raw.len());
    for (name, value) in raw.iter() {
        let name = name.trim();
        let value = value.map(str::trim).unwrap_or_default().to_string();

        match fields.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => fields.push((name.to_string(), value)),
        }
    }

    if let Some((name, _)) = fields.iter().find(|(_, v)| v.is_empty()) {
        return Err(RejectReason::MissingRequiredField {
            field: name.clone(),
        });
    }

    Ok(Record::from_normalized(fields))
}
