//! Missing-day computation over day-id bitmaps.
//!
//! A row covers the half-open day range `[start_date, max(end_date, start_date + 1))`,
//! so a daily row (`end = start + 1`) covers its start day, a weekly row
//! (`end = start + 7`) covers seven days, and a same-day row still covers one.

use chrono::NaiveDate;
use roaring::RoaringBitmap;

use crate::dates::{DateSpan, day_from_id, day_id};

/// Day ids of `window` covered by `rows` (`(start_date, end_date)` pairs).
pub fn covered_days(rows: &[(NaiveDate, NaiveDate)], window: DateSpan) -> RoaringBitmap {
    let lo = day_id(window.start());
    let hi = day_id(window.end());
    let mut rb = RoaringBitmap::new();
    for &(start, end) in rows {
        let s = day_id(start.max(window.start()));
        // last covered day of the row, inclusive
        let last = if end > start { end.pred_opt().unwrap_or(start) } else { start };
        if last < window.start() || start > window.end() {
            continue;
        }
        let e = day_id(last.min(window.end()));
        rb.insert_range(s.max(lo)..=e.min(hi));
    }
    rb
}

/// Days of `window` absent from `covered`, coalesced into inclusive spans.
pub fn missing_spans(covered: &RoaringBitmap, window: DateSpan) -> Vec<DateSpan> {
    let mut full = RoaringBitmap::new();
    full.insert_range(day_id(window.start())..=day_id(window.end()));
    let missing = &full - covered;
    coalesce_runs(&missing)
}

fn coalesce_runs(rb: &RoaringBitmap) -> Vec<DateSpan> {
    let mut out = Vec::new();
    let mut it = rb.iter();
    if let Some(mut run_start) = it.next() {
        let mut prev = run_start;
        for x in it {
            if x == prev + 1 {
                prev = x;
                continue;
            }
            out.push(run_span(run_start, prev));
            run_start = x;
            prev = x;
        }
        out.push(run_span(run_start, prev));
    }
    out
}

fn run_span(first: u32, last: u32) -> DateSpan {
    // ids come from an ascending iterator, so first <= last
    DateSpan::new(day_from_id(first), day_from_id(last)).unwrap_or(DateSpan::day(day_from_id(first)))
}
