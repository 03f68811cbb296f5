use chrono::NaiveDate;

use crate::item::VocabItem;
use crate::ladder::{self, Difficulty, ReviewOutcome};

/// Stand-in overdue value for never-reviewed items, large enough to
/// dominate the priority blend so unseen words always sort first.
const UNSEEN_OVERDUE_DAYS: f64 = 1.0e6;

pub fn is_due(item: &VocabItem, today: NaiveDate) -> bool {
    let Some(last) = item.last_review else {
        return true; // never reviewed
    };
    let interval = ladder::current_interval_days(item.last_review, today);
    (today - last).num_days() >= interval
}

pub fn overdue_days(item: &VocabItem, today: NaiveDate) -> f64 {
    let Some(last) = item.last_review else {
        return UNSEEN_OVERDUE_DAYS;
    };
    let interval = ladder::current_interval_days(item.last_review, today);
    ((today - last).num_days() - interval).max(0) as f64
}

/// Lower score = higher priority; callers sort ascending. Blends how
/// overdue the item is with how weak it is and how often it was missed.
pub fn priority_score(item: &VocabItem, today: NaiveDate) -> f64 {
    let mastery_factor = 1.0 - item.mastery;
    let error_factor = (item.error_count as f64 * 0.1).min(1.0);
    -(overdue_days(item, today) * 0.5 + mastery_factor * 0.3 + error_factor * 0.2)
}

/// Indices of due items, most urgent first, truncated to `limit`.
pub fn select_due(pool: &[VocabItem], today: NaiveDate, limit: usize) -> Vec<usize> {
    if limit == 0 {
        return Vec::new();
    }
    let mut due: Vec<usize> = (0..pool.len())
        .filter(|&i| is_due(&pool[i], today))
        .collect();
    due.sort_by(|&a, &b| {
        priority_score(&pool[a], today)
            .total_cmp(&priority_score(&pool[b], today))
            .then(pool[a].mastery.total_cmp(&pool[b].mastery)) // lower mastery first
            .then(overdue_days(&pool[b], today).total_cmp(&overdue_days(&pool[a], today)))
    });
    due.truncate(limit);
    due
}

/// Applies one review outcome to an item: mastery delta with diminishing
/// returns near the top, error count, success-rate moving average, and the
/// review date. This is the only mutator of item state. Applying the same
/// outcome twice double-counts; the caller must apply each exactly once.
///
/// Returns the suggested number of days until the next review.
pub fn record_outcome(item: &mut VocabItem, outcome: &ReviewOutcome, today: NaiveDate) -> i64 {
    let current = ladder::current_interval_days(item.last_review, today);
    let next = ladder::next_interval_days(
        current,
        outcome.was_correct,
        outcome.response_latency,
        item.mastery,
    );

    let base = base_change(outcome.difficulty, outcome.was_correct);
    let delta = if outcome.was_correct && item.mastery > 0.7 {
        base * (1.0 - item.mastery) // diminishing returns near full mastery
    } else {
        base
    };
    item.mastery = (item.mastery + delta).clamp(0.0, 1.0);

    if !outcome.was_correct {
        item.error_count += 1;
    }

    const WEIGHT: f64 = 0.1;
    item.success_rate = if outcome.was_correct {
        item.success_rate + WEIGHT * (1.0 - item.success_rate)
    } else {
        item.success_rate * (1.0 - WEIGHT)
    };
    item.success_rate = item.success_rate.clamp(0.0, 1.0);

    item.last_review = Some(today);
    next
}

fn base_change(difficulty: Difficulty, was_correct: bool) -> f64 {
    match (difficulty, was_correct) {
        (Difficulty::Easy, true) => 0.15,
        (Difficulty::Easy, false) => -0.05,
        (Difficulty::Medium, true) => 0.10,
        (Difficulty::Medium, false) => -0.10,
        (Difficulty::Hard, true) => 0.05,
        (Difficulty::Hard, false) => -0.15,
    }
}
