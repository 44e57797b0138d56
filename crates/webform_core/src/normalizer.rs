//! Reshaping of per-value legacy rows into per-submission records.

use std::collections::BTreeMap;

use crate::models::{RawSubmissionRow, SubmissionMetadata, SubmissionRecord};
use crate::report::Reporter;

/// Group raw value rows into one record per submission.
///
/// `submission_ids` are the submissions selected for this batch (already
/// past the watermark and limited). Rows for other submissions are ignored.
/// A selected submission without any value rows is dropped with a notice.
/// Records come out in ascending submission id order.
pub fn normalize_submissions<R: Reporter + ?Sized>(
    submission_ids: &[i64],
    rows: impl IntoIterator<Item = RawSubmissionRow>,
    report: &mut R,
) -> Vec<SubmissionRecord> {
    let mut grouped: BTreeMap<i64, SubmissionRecord> = BTreeMap::new();
    for row in rows {
        let record = grouped
            .entry(row.sid)
            .or_insert_with(|| SubmissionRecord {
                legacy_submission_id: row.sid,
                values: BTreeMap::new(),
                metadata: SubmissionMetadata {
                    uid: row.uid,
                    remote_addr: row.remote_addr.clone(),
                    submitted: row.submitted,
                },
            });
        record.values.insert(row.form_key, row.data);
    }

    let mut ids = submission_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();

    ids.into_iter()
        .filter_map(|sid| match grouped.remove(&sid) {
            Some(record) if !record.values.is_empty() => Some(record),
            _ => {
                report.warn(&format!(
                    "Legacy submission {sid} has no submitted data; ignoring it"
                ));
                None
            }
        })
        .collect()
}
