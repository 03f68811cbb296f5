use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use swot::ladder::ReviewOutcome;
use swot::{analysis, item, schedule, session};

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: swot <command> [args...]");
        eprintln!("Commands:");
        eprintln!("  drill <paths...> [-t MINUTES] [-l LOG.csv] [-s STREAK]  Review words in the terminal");
        eprintln!("  due <paths...> [-n LIMIT]                               List words due for review");
        eprintln!("  stats <paths...>                                        Show pool statistics");
        eprintln!("  plan <LOG.csv> [-s STREAK]                              Recommend a daily study load");
        std::process::exit(1);
    }

    match args[1].as_str() {
        "drill" => drill(&args[2..]),
        "due" => due(&args[2..]),
        "stats" => stats(&args[2..]),
        "plan" => plan(&args[2..]),
        _ => {
            eprintln!("Unknown command: {}", args[1]);
            eprintln!("Commands: drill, due, stats, plan");
            std::process::exit(1);
        }
    }
}

struct Flags {
    paths: Vec<String>,
    minutes: Option<i64>,
    log_path: Option<PathBuf>,
    streak: u32,
    limit: usize,
}

fn parse_flags(args: &[String]) -> Flags {
    let mut flags = Flags {
        paths: Vec::new(),
        minutes: None,
        log_path: None,
        streak: 0,
        limit: 20,
    };
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-t" => {
                flags.minutes = Some(parse_or_die(flag_value(args, i), "minutes"));
                i += 2;
            }
            "-l" => {
                flags.log_path = Some(PathBuf::from(flag_value(args, i)));
                i += 2;
            }
            "-s" => {
                flags.streak = parse_or_die(flag_value(args, i), "streak");
                i += 2;
            }
            "-n" => {
                flags.limit = parse_or_die(flag_value(args, i), "limit");
                i += 2;
            }
            _ => {
                flags.paths.push(args[i].clone());
                i += 1;
            }
        }
    }
    flags
}

fn flag_value<'a>(args: &'a [String], i: usize) -> &'a str {
    args.get(i + 1).map(String::as_str).unwrap_or_else(|| {
        eprintln!("Missing value for {}", args[i]);
        std::process::exit(1);
    })
}

fn parse_or_die<T: std::str::FromStr>(value: &str, what: &str) -> T {
    value.parse().unwrap_or_else(|_| {
        eprintln!("Invalid {what}: {value}");
        std::process::exit(1);
    })
}

fn load_pools(paths: &[String]) -> (Vec<item::VocabItem>, Vec<PathBuf>) {
    let files = item::discover_files(paths);
    if files.is_empty() {
        eprintln!("No pool files found.");
        std::process::exit(1);
    }

    // Track the source file per item so updates can be saved back.
    let mut pool = Vec::new();
    let mut sources = Vec::new();
    for file in &files {
        match item::load_pool(file) {
            Ok(items) => {
                for loaded in items {
                    sources.push(file.clone());
                    pool.push(loaded);
                }
            }
            Err(e) => {
                eprintln!("Warning: {e}");
            }
        }
    }

    if pool.is_empty() {
        eprintln!("No words found.");
        std::process::exit(1);
    }
    (pool, sources)
}

fn load_log(path: Option<&PathBuf>) -> Vec<analysis::TaskLog> {
    let Some(path) = path else {
        return Vec::new();
    };
    match analysis::load_log_csv(path) {
        Ok(log) => log,
        Err(e) => {
            eprintln!("Warning: {e}");
            Vec::new()
        }
    }
}

fn drill(args: &[String]) {
    if args.is_empty() {
        eprintln!("Usage: swot drill <paths...> [-t MINUTES] [-l LOG.csv] [-s STREAK]");
        std::process::exit(1);
    }
    let flags = parse_flags(args);
    let (mut pool, sources) = load_pools(&flags.paths);
    let log = load_log(flags.log_path.as_ref());
    let today = chrono::Local::now().date_naive();

    let minutes = flags.minutes.unwrap_or_else(|| {
        let load = analysis::recommend_study_load(&log, flags.streak);
        println!(
            "No time budget given; using the recommended {} minutes.",
            load.session_length_minutes
        );
        load.session_length_minutes as i64
    });

    let plan = session::build_session(&pool, &log, today, minutes);
    if plan.words.is_empty() {
        println!("Nothing to review today.");
        return;
    }

    println!(
        "{} session: {} words, about {} minutes.\n",
        plan.session_type.as_str(),
        plan.words.len(),
        plan.estimated_duration_minutes
    );

    let mut correct = 0u32;
    let mut missed = 0u32;
    let stdin = io::stdin();
    let mut stdin = stdin.lock();

    for (i, word) in plan.words.iter().enumerate() {
        let Some(index) = pool.iter().position(|item| &item.word == word) else {
            continue;
        };
        let difficulty = plan.difficulty_progression[i];

        println!(
            "[{}/{}] {} ({})",
            i + 1,
            plan.words.len(),
            pool[index].category.as_str(),
            difficulty.as_str()
        );
        println!();
        println!("{word}");
        println!();

        print!("Press Enter to reveal...");
        io::stdout().flush().unwrap();
        let mut buf = String::new();
        stdin.read_line(&mut buf).unwrap();

        println!("{}", pool[index].meaning);
        println!();

        let revealed_at = Instant::now();
        let was_correct = loop {
            print!("Did you know it? (y/n): ");
            io::stdout().flush().unwrap();
            buf.clear();
            stdin.read_line(&mut buf).unwrap();
            match buf.trim().to_lowercase().as_str() {
                "y" | "yes" => break true,
                "n" | "no" => break false,
                _ => println!("Please answer y or n."),
            }
        };
        let latency: Duration = revealed_at.elapsed();

        if was_correct {
            correct += 1;
        } else {
            missed += 1;
        }

        let outcome = ReviewOutcome {
            was_correct,
            response_latency: latency,
            difficulty,
        };
        let next = schedule::record_outcome(&mut pool[index], &outcome, today);
        println!("Next review in {next} days.\n");
    }

    save_pools(&pool, &sources);

    println!("Session complete!");
    println!("  Correct: {correct}, Missed: {missed}");
}

fn save_pools(pool: &[item::VocabItem], sources: &[PathBuf]) {
    let mut by_file: HashMap<PathBuf, Vec<usize>> = HashMap::new();
    for (i, source) in sources.iter().enumerate() {
        by_file.entry(source.clone()).or_default().push(i);
    }

    for (path, indices) in &by_file {
        let items: Vec<item::VocabItem> = indices.iter().map(|&i| pool[i].clone()).collect();
        if let Err(e) = item::save_pool(path, &items) {
            eprintln!("Error saving {}: {e}", path.display());
        }
    }
}

fn due(args: &[String]) {
    if args.is_empty() {
        eprintln!("Usage: swot due <paths...> [-n LIMIT]");
        std::process::exit(1);
    }
    let flags = parse_flags(args);
    let (pool, _) = load_pools(&flags.paths);
    let today = chrono::Local::now().date_naive();

    let due = schedule::select_due(&pool, today, flags.limit);
    if due.is_empty() {
        println!("No words due for review.");
        return;
    }

    println!("{} words due:", due.len());
    for index in due {
        let word = &pool[index];
        let when = if word.last_review.is_none() {
            "never reviewed".to_string()
        } else {
            format!("{:.0} days overdue", schedule::overdue_days(word, today))
        };
        println!(
            "  {} [{}] mastery {:.2}, {}",
            word.word,
            word.category.as_str(),
            word.mastery,
            when
        );
    }
}

fn stats(args: &[String]) {
    if args.is_empty() {
        eprintln!("Usage: swot stats <paths...>");
        std::process::exit(1);
    }
    let flags = parse_flags(args);
    let (pool, _) = load_pools(&flags.paths);
    let stats = analysis::pool_stats(&pool);

    println!("Words: {}", stats.total);
    println!(
        "  new: {}, learning: {}, mastered: {}",
        stats.new_words, stats.learning, stats.mastered
    );
    println!("  average mastery: {:.2}", stats.average_mastery);
    println!("By category:");
    for (category, count) in &stats.by_category {
        println!("  {}: {}", category.as_str(), count);
    }
}

fn plan(args: &[String]) {
    if args.is_empty() {
        eprintln!("Usage: swot plan <LOG.csv> [-s STREAK]");
        std::process::exit(1);
    }
    let flags = parse_flags(args);
    let Some(path) = flags.paths.first() else {
        eprintln!("Usage: swot plan <LOG.csv> [-s STREAK]");
        std::process::exit(1);
    };
    let log = match analysis::load_log_csv(&PathBuf::from(path)) {
        Ok(log) => log,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let load = analysis::recommend_study_load(&log, flags.streak);
    println!("Recommended daily load:");
    println!("  new words: {}", load.new_words_per_day);
    println!("  review words: {}", load.review_words_per_day);
    println!("  max words: {}", load.max_daily_words);
    println!("  session length: {} minutes", load.session_length_minutes);
}
