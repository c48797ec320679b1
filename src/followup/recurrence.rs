//! Recurring-patient classification over per-patient visit counts.

use std::collections::HashMap;

use uuid::Uuid;

/// Patients with at least `min_visits` visits, most visits first.
/// Equal counts resolve by patient id ascending.
pub fn rank_recurring(counts: &HashMap<Uuid, u32>, min_visits: u32) -> Vec<(Uuid, u32)> {
    let mut ranked: Vec<(Uuid, u32)> = counts
        .iter()
        .filter(|(_, &count)| count >= min_visits)
        .map(|(&id, &count)| (id, count))
        .collect();

    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}
