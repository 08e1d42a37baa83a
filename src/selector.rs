//! Keep/discard decisions over a set of retention tiers

use crate::tier::Tier;
use chrono::{DateTime, Utc};

/// Tiers ordered by age, oldest threshold first. The input is left untouched.
pub fn by_age_descending(tiers: &[Tier]) -> Vec<&Tier> {
    let mut ordered: Vec<&Tier> = tiers.iter().collect();
    ordered.sort_by(|a, b| b.age.cmp(&a.age));
    ordered
}

/// The tier whose rule decides the fate of `t`: the one with the largest age
/// threshold whose window contains `t`.
pub fn governing_tier<'a>(
    t: DateTime<Utc>,
    now: DateTime<Utc>,
    tiers: &'a [Tier],
) -> Option<&'a Tier> {
    by_age_descending(tiers)
        .into_iter()
        .find(|tier| tier.in_window(t, now))
}

/// Whether a backup taken at `t` survives the policy at `now`.
///
/// Backups younger than every tier's age are always kept.
pub fn keep(t: DateTime<Utc>, now: DateTime<Utc>, tiers: &[Tier]) -> bool {
    governing_tier(t, now, tiers).is_none_or(|tier| tier.matches(t))
}
