use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Canonical topic category for both vocabulary items and performance-log
/// entries. Free-text labels are mapped once, at ingestion; the scheduling
/// core never inspects strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    GrammarFocused,
    Academic,
    Everyday,
    ExamSpecific,
}

impl Category {
    /// Maps the labels produced by log sources (English and Turkish).
    /// Unknown labels default to Academic.
    pub fn from_label(label: &str) -> Category {
        match label.trim().to_lowercase().as_str() {
            "grammar" | "gramer" | "grammar_focused" => Category::GrammarFocused,
            "reading" | "okuma" | "academic" => Category::Academic,
            "listening" | "dinleme" | "everyday" => Category::Everyday,
            "vocabulary" | "vocab" | "kelime" | "exam" | "practice" | "mock" | "exam_specific" => {
                Category::ExamSpecific
            }
            _ => Category::Academic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::GrammarFocused => "grammar_focused",
            Category::Academic => "academic",
            Category::Everyday => "everyday",
            Category::ExamSpecific => "exam_specific",
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct VocabItem {
    pub word: String,
    pub meaning: String,
    #[serde(default = "default_category")]
    pub category: Category,
    /// Intrinsic difficulty tier, independent of mastery.
    #[serde(default = "default_tier")]
    pub tier: u8,
    /// Curriculum week the word is introduced; gates eligibility.
    #[serde(default = "default_week")]
    pub week: u32,
    #[serde(default)]
    pub mastery: f64,
    #[serde(default)]
    pub error_count: u32,
    #[serde(default)]
    pub success_rate: f64,
    #[serde(default)]
    pub last_review: Option<NaiveDate>,
}

fn default_category() -> Category {
    Category::Academic
}

fn default_tier() -> u8 {
    1
}

fn default_week() -> u32 {
    1
}

fn clamp_ranges(item: &mut VocabItem) {
    item.mastery = item.mastery.clamp(0.0, 1.0);
    item.success_rate = item.success_rate.clamp(0.0, 1.0);
}

fn parse_optional_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
    }
}

fn get_field(record: &csv::StringRecord, index: usize) -> String {
    record.get(index).unwrap_or("").to_string()
}

pub fn load_csv(path: &Path) -> Result<Vec<VocabItem>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| format!("failed to open {}: {}", path.display(), e))?;

    let mut items = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| format!("CSV parse error in {}: {}", path.display(), e))?;

        let word = get_field(&record, 0).trim().to_string();
        if word.is_empty() {
            continue;
        }

        let mut item = VocabItem {
            word,
            meaning: get_field(&record, 1),
            category: Category::from_label(&get_field(&record, 2)),
            tier: get_field(&record, 3).trim().parse().unwrap_or(1),
            week: get_field(&record, 4).trim().parse().unwrap_or(1),
            mastery: get_field(&record, 5).trim().parse().unwrap_or(0.0),
            error_count: get_field(&record, 6).trim().parse().unwrap_or(0),
            success_rate: get_field(&record, 7).trim().parse().unwrap_or(0.0),
            last_review: parse_optional_date(&get_field(&record, 8)),
        };
        clamp_ranges(&mut item);
        items.push(item);
    }
    Ok(items)
}

pub fn save_csv(path: &Path, items: &[VocabItem]) -> Result<(), String> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| format!("failed to write {}: {}", path.display(), e))?;

    writer
        .write_record([
            "word",
            "meaning",
            "category",
            "tier",
            "week",
            "mastery",
            "errors",
            "success_rate",
            "last_review",
        ])
        .map_err(|e| format!("write error: {e}"))?;

    for item in items {
        writer
            .write_record([
                &item.word,
                &item.meaning,
                &item.category.as_str().to_string(),
                &item.tier.to_string(),
                &item.week.to_string(),
                &format!("{:.3}", item.mastery),
                &item.error_count.to_string(),
                &format!("{:.3}", item.success_rate),
                &item
                    .last_review
                    .map_or(String::new(), |d| d.format("%Y-%m-%d").to_string()),
            ])
            .map_err(|e| format!("write error: {e}"))?;
    }

    writer.flush().map_err(|e| format!("flush error: {e}"))?;
    Ok(())
}

pub fn load_json(path: &Path) -> Result<Vec<VocabItem>, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to open {}: {}", path.display(), e))?;
    let mut items: Vec<VocabItem> = serde_json::from_str(&text)
        .map_err(|e| format!("JSON parse error in {}: {}", path.display(), e))?;
    for item in &mut items {
        clamp_ranges(item);
    }
    Ok(items)
}

pub fn save_json(path: &Path, items: &[VocabItem]) -> Result<(), String> {
    let text = serde_json::to_string_pretty(items).map_err(|e| format!("JSON error: {e}"))?;
    std::fs::write(path, text).map_err(|e| format!("failed to write {}: {}", path.display(), e))
}

pub fn load_pool(path: &Path) -> Result<Vec<VocabItem>, String> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => load_json(path),
        _ => load_csv(path),
    }
}

pub fn save_pool(path: &Path, items: &[VocabItem]) -> Result<(), String> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => save_json(path, items),
        _ => save_csv(path, items),
    }
}

pub fn discover_files(paths: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for p in paths {
        let path = PathBuf::from(p);
        if path.is_dir() {
            collect_pool_recursive(&path, &mut files);
        } else if is_pool_file(&path) {
            files.push(path);
        }
    }
    files
}

fn is_pool_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("csv") | Some("json")
    )
}

fn collect_pool_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_pool_recursive(&path, files);
        } else if is_pool_file(&path) {
            files.push(path);
        }
    }
}
