use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::Path;

use crate::item::{Category, VocabItem};

/// One entry from the performance log, chronological in file order.
/// The scheduler reads this log; it never writes it.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TaskLog {
    pub date: Option<NaiveDate>,
    pub category: Category,
    pub correct: bool,
    pub seconds: u64,
}

/// Error-rate cut above which a category counts as a weak area.
pub const WEAK_AREA_THRESHOLD: f64 = 0.3;

/// Per-category error rates over the whole log, keeping only categories
/// strictly above the threshold. Absence downstream means "not currently
/// weak". Empty log yields an empty map.
pub fn weak_areas(log: &[TaskLog]) -> BTreeMap<Category, f64> {
    let mut counts: BTreeMap<Category, (u32, u32)> = BTreeMap::new();
    for entry in log {
        let (total, incorrect) = counts.entry(entry.category).or_insert((0, 0));
        *total += 1;
        if !entry.correct {
            *incorrect += 1;
        }
    }
    counts
        .into_iter()
        .filter_map(|(category, (total, incorrect))| {
            let rate = incorrect as f64 / total as f64;
            (rate > WEAK_AREA_THRESHOLD).then_some((category, rate))
        })
        .collect()
}

/// Curriculum week implied by how much the learner has logged so far,
/// one week per ten entries, clamped to the 30-week plan.
pub fn current_week(log: &[TaskLog]) -> u32 {
    ((log.len() / 10) as u32).clamp(1, 30)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct StudyLoadRecommendation {
    pub new_words_per_day: u32,
    pub review_words_per_day: u32,
    pub max_daily_words: u32,
    pub session_length_minutes: u32,
}

/// Daily load sizing from the recent trend: streak plus average accuracy
/// over the last ten entries, split 30% new / 70% review.
pub fn recommend_study_load(log: &[TaskLog], current_streak: u32) -> StudyLoadRecommendation {
    let recent = &log[log.len().saturating_sub(10)..];
    let avg_accuracy = if recent.is_empty() {
        0.5
    } else {
        recent.iter().filter(|entry| entry.correct).count() as f64 / recent.len() as f64
    };

    let base_load: u32 = if current_streak > 14 && avg_accuracy > 0.8 {
        20
    } else if current_streak > 7 && avg_accuracy > 0.7 {
        15
    } else if avg_accuracy > 0.6 {
        12
    } else {
        8 // struggling, reduce load
    };

    StudyLoadRecommendation {
        new_words_per_day: (base_load as f64 * 0.3) as u32,
        review_words_per_day: (base_load as f64 * 0.7) as u32,
        max_daily_words: base_load,
        session_length_minutes: if base_load > 15 {
            25
        } else if base_load > 10 {
            20
        } else {
            15
        },
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoolStats {
    pub total: usize,
    pub mastered: usize,
    pub learning: usize,
    pub new_words: usize,
    pub by_category: BTreeMap<Category, usize>,
    pub average_mastery: f64,
}

pub fn pool_stats(pool: &[VocabItem]) -> PoolStats {
    let mut by_category = BTreeMap::new();
    for item in pool {
        *by_category.entry(item.category).or_insert(0) += 1;
    }
    let average_mastery = if pool.is_empty() {
        0.0
    } else {
        pool.iter().map(|item| item.mastery).sum::<f64>() / pool.len() as f64
    };
    PoolStats {
        total: pool.len(),
        mastered: pool.iter().filter(|item| item.mastery >= 0.8).count(),
        learning: pool
            .iter()
            .filter(|item| item.mastery >= 0.3 && item.mastery < 0.8)
            .count(),
        new_words: pool.iter().filter(|item| item.mastery < 0.3).count(),
        by_category,
        average_mastery,
    }
}

/// Reads a performance log from CSV: `date,category,correct,seconds`.
/// Category labels go through the canonical mapping table.
pub fn load_log_csv(path: &Path) -> Result<Vec<TaskLog>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| format!("failed to open {}: {}", path.display(), e))?;

    let mut entries = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| format!("CSV parse error in {}: {}", path.display(), e))?;
        let field = |i: usize| record.get(i).unwrap_or("").trim().to_string();

        entries.push(TaskLog {
            date: NaiveDate::parse_from_str(&field(0), "%Y-%m-%d").ok(),
            category: Category::from_label(&field(1)),
            correct: matches!(field(2).to_lowercase().as_str(), "true" | "1" | "y" | "yes"),
            seconds: field(3).parse().unwrap_or(0),
        });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(category: Category, correct: bool) -> TaskLog {
        TaskLog {
            date: None,
            category,
            correct,
            seconds: 30,
        }
    }

    fn entries(category: Category, correct: usize, incorrect: usize) -> Vec<TaskLog> {
        let mut log = Vec::new();
        log.extend((0..correct).map(|_| entry(category, true)));
        log.extend((0..incorrect).map(|_| entry(category, false)));
        log
    }

    #[test]
    fn empty_log_flags_nothing() {
        assert!(weak_areas(&[]).is_empty());
    }

    #[test]
    fn threshold_is_strictly_above_30_percent() {
        // Exactly 30% incorrect stays below the cut.
        let log = entries(Category::GrammarFocused, 7, 3);
        assert!(weak_areas(&log).is_empty());

        // 31 of 100 crosses it.
        let log = entries(Category::GrammarFocused, 69, 31);
        let weak = weak_areas(&log);
        assert!((weak[&Category::GrammarFocused] - 0.31).abs() < 1e-9);
    }

    #[test]
    fn categories_are_rated_independently() {
        let mut log = entries(Category::GrammarFocused, 1, 9);
        log.extend(entries(Category::Everyday, 9, 1));
        let weak = weak_areas(&log);
        assert_eq!(weak.len(), 1);
        assert!((weak[&Category::GrammarFocused] - 0.9).abs() < 1e-9);
    }

    #[test]
    fn current_week_grows_with_the_log_and_clamps() {
        assert_eq!(current_week(&[]), 1);
        assert_eq!(current_week(&entries(Category::Academic, 5, 0)), 1);
        assert_eq!(current_week(&entries(Category::Academic, 25, 0)), 2);
        assert_eq!(current_week(&entries(Category::Academic, 400, 0)), 30);
    }

    #[test]
    fn study_load_tiers() {
        let strong = entries(Category::Academic, 9, 1); // 0.9 accuracy
        let load = recommend_study_load(&strong, 15);
        assert_eq!(load.max_daily_words, 20);
        assert_eq!(load.new_words_per_day, 6);
        assert_eq!(load.review_words_per_day, 14);
        assert_eq!(load.session_length_minutes, 25);

        let good = entries(Category::Academic, 8, 2); // 0.8 accuracy
        let load = recommend_study_load(&good, 10);
        assert_eq!(load.max_daily_words, 15);
        assert_eq!(load.session_length_minutes, 20);

        let average = entries(Category::Academic, 7, 3); // 0.7 accuracy, no streak
        let load = recommend_study_load(&average, 0);
        assert_eq!(load.max_daily_words, 12);
        assert_eq!(load.session_length_minutes, 20);

        let struggling = entries(Category::Academic, 4, 6);
        let load = recommend_study_load(&struggling, 20);
        assert_eq!(load.max_daily_words, 8);
        assert_eq!(load.session_length_minutes, 15);
    }

    #[test]
    fn study_load_uses_only_the_last_ten_entries() {
        // Old failures followed by a perfect recent run.
        let mut log = entries(Category::Academic, 0, 20);
        log.extend(entries(Category::Academic, 10, 0));
        let load = recommend_study_load(&log, 15);
        assert_eq!(load.max_daily_words, 20);
    }

    #[test]
    fn empty_log_recommendation_is_conservative() {
        let load = recommend_study_load(&[], 20);
        // Accuracy defaults to 0.5, which lands in the lowest tier.
        assert_eq!(load.max_daily_words, 8);
        assert_eq!(load.new_words_per_day, 2);
        assert_eq!(load.review_words_per_day, 5);
    }

    #[test]
    fn pool_stats_buckets_and_average() {
        let mut items = Vec::new();
        for (word, mastery) in [("a", 0.1), ("b", 0.5), ("c", 0.9)] {
            items.push(VocabItem {
                word: word.to_string(),
                meaning: String::new(),
                category: Category::Everyday,
                tier: 1,
                week: 1,
                mastery,
                error_count: 0,
                success_rate: 0.0,
                last_review: None,
            });
        }
        let stats = pool_stats(&items);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.new_words, 1);
        assert_eq!(stats.learning, 1);
        assert_eq!(stats.mastered, 1);
        assert_eq!(stats.by_category[&Category::Everyday], 3);
        assert!((stats.average_mastery - 0.5).abs() < 1e-9);
    }

    #[test]
    fn pool_stats_empty_pool() {
        let stats = pool_stats(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.average_mastery, 0.0);
    }

    #[test]
    fn log_csv_parses_labels_and_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        std::fs::write(
            &path,
            "date,category,correct,seconds\n\
             2025-06-01,grammar,true,12\n\
             2025-06-01,okuma,0,45\n\
             ,kelime,y,\n",
        )
        .unwrap();
        let log = load_log_csv(&path).unwrap();
        assert_eq!(log.len(), 3);
        assert_eq!(log[0].category, Category::GrammarFocused);
        assert!(log[0].correct);
        assert_eq!(log[0].seconds, 12);
        assert_eq!(log[1].category, Category::Academic);
        assert!(!log[1].correct);
        assert_eq!(log[2].category, Category::ExamSpecific);
        assert!(log[2].correct);
        assert!(log[2].date.is_none());
        assert_eq!(log[2].seconds, 0);
    }
}
