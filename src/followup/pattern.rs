//! Visit-pattern analysis for a single patient's history.

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDateTime, Timelike, Weekday};
use uuid::Uuid;

use crate::models::Visit;

use super::types::{PatternOutcome, ServiceCount, VisitPattern};

/// Weekday buckets indexed 0 = Sunday .. 6 = Saturday.
const WEEKDAYS: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// Whole days from `earlier` to `later`, truncated toward zero.
pub fn days_between(later: NaiveDateTime, earlier: NaiveDateTime) -> i64 {
    (later - earlier).num_days()
}

/// Computes the visit pattern, or `InsufficientData` below two visits.
/// Input order does not matter; visits are sorted here.
pub fn analyze_visits(patient_id: Uuid, mut visits: Vec<Visit>, top_limit: usize) -> PatternOutcome {
    if visits.len() < 2 {
        return PatternOutcome::InsufficientData {
            total_visits: visits.len(),
        };
    }

    visits.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));

    let intervals = visit_intervals(&visits);
    let average_interval_days = intervals.iter().sum::<i64>() as f64 / intervals.len() as f64;

    let first_visit = visits[0].timestamp;
    let last_visit = visits[visits.len() - 1].timestamp;
    let projected_next_visit = last_visit + Duration::days(average_interval_days.round() as i64);

    let weekday_hist = histogram::<7>(visits.iter().map(|v| {
        v.timestamp.weekday().num_days_from_sunday() as usize
    }));
    let hour_hist = histogram::<24>(visits.iter().map(|v| v.timestamp.hour() as usize));

    PatternOutcome::Pattern(VisitPattern {
        patient_id,
        total_visits: visits.len(),
        first_visit,
        last_visit,
        intervals,
        average_interval_days,
        top_services: rank_services(&visits, top_limit),
        preferred_weekdays: modes(&weekday_hist).into_iter().map(|i| WEEKDAYS[i]).collect(),
        preferred_hours: modes(&hour_hist).into_iter().map(|h| h as u32).collect(),
        projected_next_visit,
    })
}

/// Gaps between adjacent visits. Expects ascending order.
fn visit_intervals(sorted: &[Visit]) -> Vec<i64> {
    sorted
        .windows(2)
        .map(|pair| days_between(pair[1].timestamp, pair[0].timestamp))
        .collect()
}

/// Services by visit count, descending, capped at `limit`. Equal counts keep
/// the service booked first ahead. Expects ascending order.
fn rank_services(sorted: &[Visit], limit: usize) -> Vec<ServiceCount> {
    // service_id -> (first position, name, count)
    let mut tally: HashMap<Uuid, (usize, &str, u32)> = HashMap::new();
    for (pos, visit) in sorted.iter().enumerate() {
        tally
            .entry(visit.service_id)
            .or_insert((pos, visit.service_name.as_str(), 0))
            .2 += 1;
    }

    let mut ranked: Vec<(Uuid, (usize, &str, u32))> = tally.into_iter().collect();
    ranked.sort_by(|(_, a), (_, b)| b.2.cmp(&a.2).then_with(|| a.0.cmp(&b.0)));

    ranked
        .into_iter()
        .take(limit)
        .map(|(service_id, (_, name, count))| ServiceCount {
            service_id,
            name: name.to_string(),
            count,
        })
        .collect()
}

fn histogram<const N: usize>(buckets: impl Iterator<Item = usize>) -> [u32; N] {
    let mut hist = [0u32; N];
    for b in buckets {
        hist[b] += 1;
    }
    hist
}

/// Every bucket index holding the maximum. Ties are all kept.
fn modes(hist: &[u32]) -> Vec<usize> {
    let max = hist.iter().copied().max().unwrap_or(0);
    if max == 0 {
        return Vec::new();
    }
    hist.iter()
        .enumerate()
        .filter(|&(_, &count)| count == max)
        .map(|(i, _)| i)
        .collect()
}
