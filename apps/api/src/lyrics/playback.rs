//! Position lookup over a lyric's timing entries.

use crate::models::lyric::TimingEntry;

/// Index of the line playing at `position_ms`.
///
/// The active line is the last entry that has started by `position_ms` and
/// whose successor has not. Before the first entry, or with no entries,
/// nothing is active. The final line stays active past its own duration.
pub fn active_line(entries: &[TimingEntry], position_ms: i64) -> Option<usize> {
    (0..entries.len()).rev().find(|&index| {
        entries[index].start_time <= position_ms
            && entries
                .get(index + 1)
                .map_or(true, |next| next.start_time > position_ms)
    })
}
