//! Windowed Aggregation Query (C7): sums per-cell counters across a sliding
//! window of contiguous one-minute buckets.

use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Duration as ChronoDuration, Utc};

use crate::stream::aggregator::bucket_key;
use crate::store::Store;

/// The `W` contiguous minute keys ending at (and including) `end`'s minute,
/// oldest first.
fn minute_keys(end: DateTime<Utc>, window_minutes: i64) -> Vec<String> {
    let end_minute = end - ChronoDuration::seconds(end.timestamp() % 60);
    (0..window_minutes)
        .rev()
        .map(|offset| (end_minute - ChronoDuration::minutes(offset)).format("%Y-%m-%dT%H:%M").to_string())
        .collect()
}

/// Sums `prefix` at `resolution` over the last `window_minutes` minutes
/// ending at `end`. A minute bucket absent from the store (never written,
/// or evicted) contributes zero rather than failing the query.
pub async fn windowed_counts(
    store: &Store,
    prefix: &str,
    resolution: u8,
    window_minutes: i64,
    end: DateTime<Utc>,
) -> Result<HashMap<String, i64>> {
    let keys: Vec<String> = minute_keys(end, window_minutes)
        .into_iter()
        .map(|minute| bucket_key(prefix, &minute, resolution))
        .collect();

    let buckets = store.read_buckets(&keys).await?;

    let mut totals: HashMap<String, i64> = HashMap::new();
    for bucket in buckets {
        for (cell_id, count) in bucket {
            *totals.entry(cell_id).or_insert(0) += count;
        }
    }
    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn minute_keys_are_contiguous_and_ordered() {
        let end = Utc.with_ymd_and_hms(2024, 5, 1, 12, 34, 42).unwrap();
        let keys = minute_keys(end, 3);
        assert_eq!(
            keys,
            vec!["2024-05-01T12:32", "2024-05-01T12:33", "2024-05-01T12:34"]
        );
    }
}
