use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet, VecDeque};

use crate::analysis::{self, TaskLog};
use crate::item::{Category, VocabItem};
use crate::ladder::Difficulty;

/// Fixed per-item review cost used to size a session.
pub const MINUTES_PER_ITEM: i64 = 2;

/// Share of a session reserved for weak-area remediation.
const WEAK_AREA_SHARE: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    NewWords,
    Learning,
    Review,
    Mixed,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::NewWords => "new_words",
            SessionType::Learning => "learning",
            SessionType::Review => "review",
            SessionType::Mixed => "mixed",
        }
    }
}

/// One bounded review plan. Discarding it has no side effects; item state
/// only changes when outcomes are recorded.
#[derive(Debug, serde::Serialize)]
pub struct ReviewSession {
    pub date: NaiveDate,
    pub words: Vec<String>,
    pub estimated_duration_minutes: i64,
    pub session_type: SessionType,
    /// Parallel to `words`: the intended challenge per position, trending
    /// harder across the session but gentle on low-mastery items.
    pub difficulty_progression: Vec<Difficulty>,
}

/// Builds a session for the given time budget: 70% weak-area remediation,
/// 30% steady curriculum progression, interleaved across difficulty tiers.
/// An empty result is a valid "nothing to review" outcome, not an error.
pub fn build_session(
    pool: &[VocabItem],
    log: &[TaskLog],
    today: NaiveDate,
    available_minutes: i64,
) -> ReviewSession {
    let max_items = (available_minutes / MINUTES_PER_ITEM).max(1) as usize;
    let week = analysis::current_week(log);
    let weak = analysis::weak_areas(log);

    let weak_target = (max_items as f64 * WEAK_AREA_SHARE) as usize;
    let general_target = max_items - weak_target;

    let mut picked = weak_area_fill(pool, &weak, weak_target, week);
    let chosen: HashSet<&str> = picked.iter().map(|item| item.word.as_str()).collect();
    picked.extend(general_fill(pool, general_target, week, &chosen));
    picked.truncate(max_items);

    let ordered = interleave(picked);
    let session_type = classify(&ordered);
    let difficulty_progression = progression(&ordered);

    ReviewSession {
        date: today,
        estimated_duration_minutes: ordered.len() as i64 * MINUTES_PER_ITEM,
        session_type,
        difficulty_progression,
        words: ordered.into_iter().map(|item| item.word.clone()).collect(),
    }
}

/// Items from weak categories, lowest mastery first, allocated across
/// categories in proportion to their error rates. Rounding can overshoot
/// a category's share; the final truncation absorbs it.
fn weak_area_fill<'a>(
    pool: &'a [VocabItem],
    weak: &BTreeMap<Category, f64>,
    target: usize,
    week: u32,
) -> Vec<&'a VocabItem> {
    if weak.is_empty() || target == 0 {
        return Vec::new();
    }
    let rate_sum: f64 = weak.values().sum();

    let mut picked = Vec::new();
    for (&category, &rate) in weak {
        let mut candidates: Vec<&VocabItem> = pool
            .iter()
            .filter(|item| {
                item.category == category && item.week <= week && item.mastery < 0.8
            })
            .collect();
        candidates.sort_by(|a, b| a.mastery.total_cmp(&b.mastery));

        let share = (target as f64 * rate / rate_sum).ceil() as usize;
        picked.extend(candidates.into_iter().take(share));
    }
    picked.truncate(target);
    picked
}

/// Steady curriculum progression: earliest week, then easiest tier, then
/// lowest mastery. Fully mastered words are done and stay out.
fn general_fill<'a>(
    pool: &'a [VocabItem],
    target: usize,
    week: u32,
    exclude: &HashSet<&str>,
) -> Vec<&'a VocabItem> {
    let mut candidates: Vec<&VocabItem> = pool
        .iter()
        .filter(|item| {
            item.week <= week && item.mastery < 1.0 && !exclude.contains(item.word.as_str())
        })
        .collect();
    candidates.sort_by(|a, b| {
        a.week
            .cmp(&b.week)
            .then(a.tier.cmp(&b.tier))
            .then(a.mastery.total_cmp(&b.mastery))
    });
    candidates.truncate(target);
    candidates
}

/// Round-robin across difficulty-tier groups so consecutive items are not
/// clustered by raw difficulty.
fn interleave(items: Vec<&VocabItem>) -> Vec<&VocabItem> {
    let mut groups: BTreeMap<u8, VecDeque<&VocabItem>> = BTreeMap::new();
    for item in items {
        groups.entry(item.tier).or_default().push_back(item);
    }

    let mut ordered = Vec::new();
    while groups.values().any(|group| !group.is_empty()) {
        for group in groups.values_mut() {
            if let Some(item) = group.pop_front() {
                ordered.push(item);
            }
        }
    }
    ordered
}

fn classify(items: &[&VocabItem]) -> SessionType {
    if items.is_empty() {
        return SessionType::Mixed;
    }
    let cutoff = items.len() as f64 * 0.6;
    let new_words = items.iter().filter(|item| item.mastery < 0.3).count() as f64;
    let learning = items
        .iter()
        .filter(|item| (0.3..=0.7).contains(&item.mastery))
        .count() as f64;
    let review = items.iter().filter(|item| item.mastery > 0.7).count() as f64;

    if new_words > cutoff {
        SessionType::NewWords
    } else if learning > cutoff {
        SessionType::Learning
    } else if review > cutoff {
        SessionType::Review
    } else {
        SessionType::Mixed
    }
}

fn progression(items: &[&VocabItem]) -> Vec<Difficulty> {
    let len = items.len() as f64;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let ratio = i as f64 / len;
            if ratio < 0.3 || item.mastery < 0.3 {
                Difficulty::Easy
            } else if ratio < 0.7 || item.mastery < 0.7 {
                Difficulty::Medium
            } else {
                Difficulty::Hard
            }
        })
        .collect()
}
