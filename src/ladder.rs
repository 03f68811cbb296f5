// Interval ladder: the discrete retention scale and its transition rule.
// The ladder index is never persisted; it is re-derived from elapsed time,
// so the scale can be re-tiered between releases without migrating items.

use chrono::NaiveDate;
use std::time::Duration;

/// Retention intervals in days. An item climbs this ladder on correct
/// reviews and slides back down on misses.
pub const LADDER: [i64; 7] = [1, 3, 7, 14, 30, 60, 120];

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn from_u8(n: u8) -> Option<Difficulty> {
        match n {
            1 => Some(Difficulty::Easy),
            2 => Some(Difficulty::Medium),
            3 => Some(Difficulty::Hard),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// One graded answer, fed back into the mastery update. Not persisted.
pub struct ReviewOutcome {
    pub was_correct: bool,
    pub response_latency: Duration,
    pub difficulty: Difficulty,
}

/// The rung the item currently sits on, reconstructed from elapsed days:
/// the smallest rung >= days since last review, or the top rung once the
/// item has coasted past the whole ladder. Never-reviewed items start at
/// the first rung.
pub fn current_interval_days(last_review: Option<NaiveDate>, today: NaiveDate) -> i64 {
    let Some(last) = last_review else {
        return LADDER[0];
    };
    let elapsed = (today - last).num_days().max(0);
    LADDER
        .iter()
        .copied()
        .find(|&rung| rung >= elapsed)
        .unwrap_or(LADDER[LADDER.len() - 1])
}

/// Next interval after a review: move the index up or down the ladder,
/// two rungs at the mastery extremes, then nudge by response speed.
pub fn next_interval_days(
    current: i64,
    was_correct: bool,
    latency: Duration,
    mastery: f64,
) -> i64 {
    let index = LADDER.iter().position(|&rung| rung == current).unwrap_or(0);

    let index = if was_correct {
        let step = if mastery > 0.8 { 2 } else { 1 };
        (index + step).min(LADDER.len() - 1)
    } else {
        let step = if mastery < 0.3 { 2 } else { 1 };
        index.saturating_sub(step)
    };

    let adjusted = index as i64 + latency_adjustment(latency);
    let index = adjusted.clamp(0, LADDER.len() as i64 - 1) as usize;
    LADDER[index]
}

fn latency_adjustment(latency: Duration) -> i64 {
    match latency.as_secs() {
        0..=2 => 1,  // fast recall, stretch the interval
        3..=7 => 0,
        8..=14 => -1,
        _ => -2, // very slow, bring the word back sooner
    }
}
