/**
 * Functions and data structures for recording the learner's quiz results: the history
 * of finished quizzes, cumulative per-category accuracy, and per-module progress.
 */
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use super::adaptive;
use super::bank::{Category, Question};
use super::common::QuestionId;
use super::sampling::Blueprint;
use super::storage::{keys, load_or_default, save_best_effort, Storage};


/// Number of quizzes kept in the history, newest first.
pub const HISTORY_MAX: usize = 50;


/// Correct and total answers in one category.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryStat {
    pub correct: u32,
    pub total: u32,
}


impl CategoryStat {
    /// `None` if the category has never been attempted.
    pub fn accuracy(&self) -> Option<f64> {
        if self.total > 0 {
            Some(f64::from(self.correct) / f64::from(self.total))
        } else {
            None
        }
    }

    fn add(&mut self, other: &CategoryStat) {
        self.correct += other.correct;
        self.total += other.total;
    }
}


/// Represents the results of taking a quiz on a particular occasion.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizHistoryItem {
    pub timestamp: DateTime<Utc>,
    pub total_questions: u32,
    pub correct_count: u32,
    /// Rounded to the nearest whole percent.
    pub percentage: u32,
    #[serde(default)]
    pub per_category: BTreeMap<Category, CategoryStat>,
    #[serde(default)]
    pub flagged_count: u32,
}


#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ModuleProgress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub percent: u8,
}


/// A finished quiz, as handed to `PerformanceStore::append_quiz_result`.
#[derive(Debug, Clone)]
pub struct QuizRecord<'q> {
    pub questions: Vec<&'q Question>,
    /// The option chosen for each question, parallel to `questions`. Unanswered
    /// questions count as incorrect.
    pub answers: Vec<Option<usize>>,
    pub flagged: Vec<QuestionId>,
    pub finished_at: DateTime<Utc>,
}


impl<'q> QuizRecord<'q> {
    pub fn new(questions: Vec<&'q Question>, answers: Vec<Option<usize>>, flagged: Vec<QuestionId>) -> Self {
        QuizRecord { questions, answers, flagged, finished_at: Utc::now() }
    }

    /// Pairs of question and whether it was answered correctly.
    pub fn marked(&self) -> impl Iterator<Item = (&'q Question, bool)> + '_ {
        self.questions.iter().enumerate().map(move |(i, q)| {
            let correct = match self.answers.get(i) {
                Some(Some(choice)) => q.is_correct(*choice),
                _ => false,
            };
            (*q, correct)
        })
    }

    pub fn total(&self) -> u32 {
        self.questions.len() as u32
    }

    pub fn correct(&self) -> u32 {
        self.marked().filter(|(_, correct)| *correct).count() as u32
    }

    pub fn per_category(&self) -> BTreeMap<Category, CategoryStat> {
        let mut breakdown: BTreeMap<Category, CategoryStat> = BTreeMap::new();
        for (q, correct) in self.marked() {
            let stat = breakdown.entry(q.category).or_insert_with(CategoryStat::default);
            stat.total += 1;
            if correct {
                stat.correct += 1;
            }
        }
        breakdown
    }
}


/// Return `correct` out of `total` as a whole percentage, or 0 if `total` is 0.
pub fn percentage(correct: u32, total: u32) -> u32 {
    if total == 0 {
        0
    } else {
        (100.0 * f64::from(correct) / f64::from(total)).round() as u32
    }
}


#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    /// Number of quizzes in the retained history.
    pub attempts: usize,
    /// Unweighted mean of the history's percentages.
    pub avg_score: f64,
    pub recent_score: Option<u32>,
}


#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSnapshot {
    pub summary: PerformanceSummary,
    pub category_stats: BTreeMap<Category, CategoryStat>,
    pub module_progress: BTreeMap<String, ModuleProgress>,
    pub recent_quizzes: Vec<QuizHistoryItem>,
}


pub struct PerformanceStore<S: Storage> {
    storage: S,
}


impl<S: Storage> PerformanceStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Merge a finished quiz into the cumulative category stats and prepend it to the
    /// history, keeping only the newest `HISTORY_MAX` entries.
    pub fn append_quiz_result(&self, record: &QuizRecord) -> QuizHistoryItem {
        let breakdown = record.per_category();

        let mut stats = self.category_stats();
        for (category, delta) in breakdown.iter() {
            stats.entry(*category).or_insert_with(CategoryStat::default).add(delta);
        }

        let total = record.total();
        let correct = record.correct();
        let item = QuizHistoryItem {
            timestamp: record.finished_at,
            total_questions: total,
            correct_count: correct,
            percentage: percentage(correct, total),
            per_category: breakdown,
            flagged_count: record.flagged.len() as u32,
        };

        let mut history = self.history();
        history.insert(0, item.clone());
        history.truncate(HISTORY_MAX);

        save_best_effort(&self.storage, keys::CATEGORY_STATS, &stats);
        save_best_effort(&self.storage, keys::QUIZ_HISTORY, &history);
        info!("recorded quiz: {}/{} ({}%)", correct, total, item.percentage);
        item
    }

    /// Record progress on a study module. Progress never goes down: the stored value is
    /// the best percentage seen so far. Returns the stored percentage.
    pub fn record_module_progress(&self, module_id: &str, percent: f64, name: Option<&str>) -> u8 {
        let clamped = if percent.is_nan() { 0.0 } else { percent.max(0.0).min(100.0) };
        let next = clamped.round() as u8;

        let mut modules = self.module_progress();
        let entry = modules.entry(module_id.to_string()).or_insert_with(ModuleProgress::default);
        entry.percent = entry.percent.max(next);
        if let Some(name) = name {
            entry.name = Some(name.to_string());
        }
        let stored = entry.percent;

        save_best_effort(&self.storage, keys::MODULE_PROGRESS, &modules);
        stored
    }

    pub fn get_performance_snapshot(&self) -> PerformanceSnapshot {
        let history = self.history();
        let avg_score = if history.is_empty() {
            0.0
        } else {
            let sum: f64 = history.iter().map(|h| f64::from(h.percentage)).sum();
            sum / history.len() as f64
        };

        PerformanceSnapshot {
            summary: PerformanceSummary {
                attempts: history.len(),
                avg_score,
                recent_score: history.first().map(|h| h.percentage),
            },
            category_stats: self.category_stats(),
            module_progress: self.module_progress(),
            recent_quizzes: history,
        }
    }

    /// Bias `base` toward the learner's weak categories.
    pub fn adaptive_weights(&self, base: &Blueprint, boost: f64) -> Blueprint {
        adaptive::build_adaptive_weights(base, &self.category_stats(), boost)
    }

    pub fn category_stats(&self) -> BTreeMap<Category, CategoryStat> {
        load_or_default(&self.storage, keys::CATEGORY_STATS)
    }

    pub fn history(&self) -> Vec<QuizHistoryItem> {
        load_or_default(&self.storage, keys::QUIZ_HISTORY)
    }

    pub fn module_progress(&self) -> BTreeMap<String, ModuleProgress> {
        load_or_default(&self.storage, keys::MODULE_PROGRESS)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use super::super::bank::Difficulty;
    use super::super::storage::MemoryStorage;

    #[test]
    fn category_stats_accumulate() {
        let storage = MemoryStorage::new();
        let store = PerformanceStore::new(&storage);
        let questions = questions(Category::Alertness, 5);

        store.append_quiz_result(&record(&questions, 3));
        store.append_quiz_result(&record(&questions, 1));

        let stats = store.category_stats();
        assert_eq!(stats[&Category::Alertness], CategoryStat { correct: 4, total: 10 });
    }

    #[test]
    fn history_is_capped_newest_first() {
        let storage = MemoryStorage::new();
        let store = PerformanceStore::new(&storage);
        let questions = questions(Category::Attitude, 60);

        for i in 0..60 {
            store.append_quiz_result(&record(&questions[..i + 1], i));
        }

        let history = store.history();
        assert_eq!(history.len(), HISTORY_MAX);
        assert_eq!(history[0].total_questions, 60);
        assert_eq!(history[49].total_questions, 11);
    }

    #[test]
    fn history_item_has_breakdown() {
        let storage = MemoryStorage::new();
        let store = PerformanceStore::new(&storage);
        let mut qs = questions(Category::Alertness, 2);
        qs.extend(questions(Category::MotorwayRules, 2).into_iter().map(|mut q| {
            q.id += 100;
            q
        }));
        let refs: Vec<&Question> = qs.iter().collect();
        let record = QuizRecord::new(refs, vec![Some(0), Some(1), None, Some(0)], vec![100]);

        let item = store.append_quiz_result(&record);
        assert_eq!(item.correct_count, 2);
        assert_eq!(item.percentage, 50);
        assert_eq!(item.flagged_count, 1);
        assert_eq!(item.per_category[&Category::Alertness], CategoryStat { correct: 1, total: 2 });
        assert_eq!(item.per_category[&Category::MotorwayRules], CategoryStat { correct: 1, total: 2 });
    }

    #[test]
    fn module_progress_only_increases() {
        let storage = MemoryStorage::new();
        let store = PerformanceStore::new(&storage);

        assert_eq!(store.record_module_progress("signs", 40.0, Some("Road signs")), 40);
        assert_eq!(store.record_module_progress("signs", 20.0, None), 40);
        assert_eq!(store.record_module_progress("signs", 150.0, None), 100);
        assert_eq!(store.record_module_progress("other", -5.0, None), 0);
        assert_eq!(store.record_module_progress("other", 33.6, None), 34);

        let modules = store.module_progress();
        assert_eq!(modules["signs"].percent, 100);
        assert_eq!(modules["signs"].name.as_deref(), Some("Road signs"));
        assert_eq!(modules["other"].percent, 34);
    }

    #[test]
    fn snapshot_summarizes_history() {
        let storage = MemoryStorage::new();
        let store = PerformanceStore::new(&storage);
        let empty = store.get_performance_snapshot();
        assert_eq!(empty.summary.attempts, 0);
        assert_eq!(empty.summary.recent_score, None);
        assert_eq!(empty.summary.avg_score, 0.0);

        let short = questions(Category::Alertness, 2);
        let long = questions(Category::Alertness, 10);
        store.append_quiz_result(&record(&short, 2));
        store.append_quiz_result(&record(&long, 5));

        let snapshot = store.get_performance_snapshot();
        assert_eq!(snapshot.summary.attempts, 2);
        assert_eq!(snapshot.summary.recent_score, Some(50));
        // Unweighted: (100 + 50) / 2, not 7 / 12.
        assert!((snapshot.summary.avg_score - 75.0).abs() < 1e-9);
        assert_eq!(snapshot.recent_quizzes.len(), 2);
        assert_eq!(snapshot.category_stats[&Category::Alertness].total, 12);
    }

    #[test]
    fn corrupted_history_reads_as_empty() {
        let storage = MemoryStorage::new();
        storage.set(keys::QUIZ_HISTORY, "{\"oops\": true}").unwrap();
        storage.set(keys::CATEGORY_STATS, "[]").unwrap();
        let store = PerformanceStore::new(&storage);

        let snapshot = store.get_performance_snapshot();
        assert_eq!(snapshot.summary.attempts, 0);
        assert!(snapshot.category_stats.is_empty());

        let questions = questions(Category::Alertness, 1);
        store.append_quiz_result(&record(&questions, 1));
        assert_eq!(store.history().len(), 1);
    }

    /// A record where the first `correct` questions were answered correctly.
    fn record(questions: &[Question], correct: usize) -> QuizRecord {
        let refs: Vec<&Question> = questions.iter().collect();
        let answers = (0..questions.len())
            .map(|i| if i < correct { Some(0) } else { Some(1) })
            .collect();
        QuizRecord::new(refs, answers, Vec::new())
    }

    fn questions(category: Category, n: u32) -> Vec<Question> {
        (0..n)
            .map(|id| Question {
                id,
                category,
                difficulty: Difficulty::Med,
                text: format!("Question {}", id),
                options: vec![String::from("Right"), String::from("Wrong")],
                answer: 0,
                explanation: String::new(),
            })
            .collect()
    }
}
