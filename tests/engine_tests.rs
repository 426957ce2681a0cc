use std::collections::HashSet;
use std::fs;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

use mastery::rotation::AVOID_SET_MAX;
use mastery::sampling::{sample_category_quiz, sample_mistakes_mixed, sample_mock};
use mastery::storage::keys;
use mastery::{
    Category, CategoryOptions, Difficulty, JsonFileStorage, MockOptions, PerformanceStore,
    Question, QuestionBank, QuestionId, QuizSession, RotationLedger, SqliteStorage, Storage,
};


#[test]
fn mock_tests_rotate_through_the_bank_with_json_storage() {
    let dir = TempDir::new().unwrap();
    let storage = JsonFileStorage::open(dir.path()).unwrap();
    mock_tests_rotate_through_the_bank(&storage);
}


#[test]
fn mock_tests_rotate_through_the_bank_with_sqlite_storage() {
    let dir = TempDir::new().unwrap();
    let storage = SqliteStorage::open(&dir.path().join("mastery.sqlite3")).unwrap();
    mock_tests_rotate_through_the_bank(&storage);
}


fn mock_tests_rotate_through_the_bank<S: Storage>(storage: &S) {
    let bank = bank(10);
    let ledger = RotationLedger::new(storage);
    let opts = MockOptions::default();
    let mut rng = StdRng::seed_from_u64(7);

    let first = sample_mock(bank.questions(), &ledger, &opts, &mut rng);
    let second = sample_mock(bank.questions(), &ledger, &opts, &mut rng);
    assert_eq!(first.len(), 50);
    assert_eq!(second.len(), 50);
    assert_eq!(unique_ids(&first).len(), 50);
    assert_eq!(unique_ids(&second).len(), 50);
    assert!(unique_ids(&first).is_disjoint(&unique_ids(&second)));
    assert_eq!(ledger.get_avoid_set().len(), 100);

    // Only 40 questions have not been seen, so the third test has to repeat some.
    let third = sample_mock(bank.questions(), &ledger, &opts, &mut rng);
    assert_eq!(unique_ids(&third).len(), 50);
    assert!(ledger.get_avoid_set().len() <= AVOID_SET_MAX);
}


#[test]
fn finished_quiz_survives_reopening_json_storage() {
    let dir = TempDir::new().unwrap();
    let bank = bank(4);
    let wrong_ids = {
        let storage = JsonFileStorage::open(dir.path()).unwrap();
        take_quiz_answering_every_third_wrong(&bank, &storage)
    };

    let storage = JsonFileStorage::open(dir.path()).unwrap();
    check_recorded_quiz(&bank, &storage, &wrong_ids);
}


#[test]
fn finished_quiz_survives_reopening_sqlite_storage() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mastery.sqlite3");
    let bank = bank(4);
    let wrong_ids = {
        let storage = SqliteStorage::open(&path).unwrap();
        take_quiz_answering_every_third_wrong(&bank, &storage)
    };

    let storage = SqliteStorage::open(&path).unwrap();
    check_recorded_quiz(&bank, &storage, &wrong_ids);
}


fn take_quiz_answering_every_third_wrong<S: Storage>(
    bank: &QuestionBank, storage: &S
) -> Vec<QuestionId> {
    let ledger = RotationLedger::new(storage);
    let store = PerformanceStore::new(storage);
    let mut rng = StdRng::seed_from_u64(11);
    let opts = MockOptions { length: 30, ..MockOptions::default() };

    let questions = sample_mock(bank.questions(), &ledger, &opts, &mut rng);
    assert_eq!(questions.len(), 30);
    let mut session = QuizSession::new(questions).with_module("mock", Some("Mock tests"));

    let mut wrong_ids = Vec::new();
    for i in 0..session.len() {
        let question = session.questions()[i];
        if i % 3 == 0 {
            wrong_ids.push(question.id);
            session.answer(i, question.answer + 1, &ledger).unwrap();
        } else {
            session.answer(i, question.answer, &ledger).unwrap();
        }
    }

    let outcome = session.finish(&ledger, &store);
    assert_eq!(outcome.item.total_questions, 30);
    assert_eq!(outcome.item.correct_count, 20);
    assert_eq!(outcome.item.percentage, 67);
    assert!(!outcome.passed);
    wrong_ids
}


fn check_recorded_quiz<S: Storage>(bank: &QuestionBank, storage: &S, wrong_ids: &[QuestionId]) {
    let ledger = RotationLedger::new(storage);
    let store = PerformanceStore::new(storage);

    let snapshot = store.get_performance_snapshot();
    assert_eq!(snapshot.summary.attempts, 1);
    assert_eq!(snapshot.summary.recent_score, Some(67));
    assert!((snapshot.summary.avg_score - 67.0).abs() < 1e-9);
    let answered: u32 = snapshot.category_stats.values().map(|s| s.total).sum();
    assert_eq!(answered, 30);
    assert_eq!(snapshot.module_progress["mock"].percent, 67);
    assert_eq!(snapshot.module_progress["mock"].name.as_deref(), Some("Mock tests"));

    assert_eq!(ledger.get_avoid_set().len(), 30);
    assert_eq!(ledger.sr_queue().len(), 30);

    // The most recent mistake comes first.
    let mut expected = wrong_ids.to_vec();
    expected.reverse();
    assert_eq!(ledger.recent_wrongs(), expected);

    let mut rng = StdRng::seed_from_u64(3);
    let retake = sample_mistakes_mixed(bank.questions(), &ledger, 100, &mut rng);
    let mut retake_ids: Vec<QuestionId> = retake.iter().map(|q| q.id).collect();
    retake_ids.sort();
    let mut wrong_sorted = wrong_ids.to_vec();
    wrong_sorted.sort();
    assert_eq!(retake_ids, wrong_sorted);
    assert!(ledger.recent_wrongs().is_empty());
}


#[test]
fn corrupted_records_read_as_empty() {
    let dir = TempDir::new().unwrap();
    for key in &[keys::QUIZ_HISTORY, keys::CATEGORY_STATS, keys::AVOID_IDS, keys::RECENT_WRONGS] {
        fs::write(dir.path().join(format!("{}.json", key)), "{not json").unwrap();
    }
    let storage = JsonFileStorage::open(dir.path()).unwrap();
    let ledger = RotationLedger::new(&storage);
    let store = PerformanceStore::new(&storage);

    assert!(ledger.get_avoid_set().is_empty());
    assert!(ledger.recent_wrongs().is_empty());
    assert_eq!(store.get_performance_snapshot().summary.attempts, 0);

    // Writing over a corrupted record replaces it.
    ledger.push_to_avoid_set(&[1, 2, 3], AVOID_SET_MAX);
    ledger.push_recent_wrongs(&[4], 10);
    assert_eq!(ledger.get_avoid_set().len(), 3);
    assert_eq!(ledger.recent_wrongs(), vec![4]);
}


#[test]
fn weak_categories_get_more_mock_questions() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let bank = bank(20);
    let store = PerformanceStore::new(&storage);

    // Every category is answered perfectly apart from motorway rules.
    let questions: Vec<&Question> = bank.questions().iter().collect();
    let mut session = QuizSession::new(questions);
    let ledger = RotationLedger::new(&storage);
    for i in 0..session.len() {
        let question = session.questions()[i];
        let choice = if question.category == Category::MotorwayRules {
            question.answer + 1
        } else {
            question.answer
        };
        session.answer(i, choice, &ledger).unwrap();
    }
    session.finish(&ledger, &store);

    let base = MockOptions::default().blueprint;
    let weights = store.adaptive_weights(&base, 1.0);
    let weak = weights.weight(Category::MotorwayRules);
    for category in Category::ALL.iter().filter(|c| **c != Category::MotorwayRules) {
        assert!(weak > weights.weight(*category));
    }
    assert!((weights.total() - 1.0).abs() < 1e-9);
}


#[test]
fn category_quiz_keeps_to_its_category() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let bank = bank(6);
    let ledger = RotationLedger::new(&storage);
    let opts = CategoryOptions::default();
    let mut rng = StdRng::seed_from_u64(5);

    // A missed question from another category stays queued.
    ledger.push_recent_wrongs(&[id_for(Category::Alertness, 0), id_for(Category::Incidents, 1)], 100);

    let quiz = sample_category_quiz(bank.questions(), Category::Incidents, &ledger, &opts, &mut rng);
    assert_eq!(quiz.len(), 6);
    assert!(quiz.iter().all(|q| q.category == Category::Incidents));
    assert_eq!(ledger.recent_wrongs(), vec![id_for(Category::Alertness, 0)]);
}


/// A bank with `per_category` questions in every category.
fn bank(per_category: u32) -> QuestionBank {
    let mut questions = Vec::new();
    for category in Category::ALL.iter() {
        for i in 0..per_category {
            let difficulty = match i % 3 {
                0 => Difficulty::Easy,
                1 => Difficulty::Med,
                _ => Difficulty::Hard,
            };
            questions.push(Question {
                id: id_for(*category, i),
                category: *category,
                difficulty,
                text: format!("{} question {}", category, i),
                options: vec![
                    String::from("A"),
                    String::from("B"),
                    String::from("C"),
                    String::from("D"),
                ],
                answer: (i % 3) as usize,
                explanation: String::new(),
            });
        }
    }
    QuestionBank::from_questions(questions).unwrap()
}


fn id_for(category: Category, i: u32) -> QuestionId {
    let position = Category::ALL.iter().position(|c| *c == category).unwrap() as u32;
    position * 1000 + i
}


fn unique_ids(questions: &[&Question]) -> HashSet<QuestionId> {
    questions.iter().map(|q| q.id).collect()
}
