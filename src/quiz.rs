/**
 * A quiz in progress: the questions chosen by a sampler, the learner's answers so far,
 * and the bookkeeping that has to happen when an answer is given and when the quiz ends.
 */
use std::collections::BTreeSet;

use chrono::Utc;

use super::bank::Question;
use super::common::{EngineError, QuestionId, Result};
use super::persistence::{PerformanceStore, QuizHistoryItem, QuizRecord};
use super::rotation::{RotationLedger, RECENT_WRONGS_MAX};
use super::storage::Storage;


/// The DVSA pass mark: 43 correct out of 50.
pub const PASS_MARK: (u32, u32) = (43, 50);


#[derive(Debug, Clone, PartialEq)]
pub struct QuizOutcome {
    pub item: QuizHistoryItem,
    pub passed: bool,
}


#[derive(Debug)]
pub struct QuizSession<'q> {
    questions: Vec<&'q Question>,
    answers: Vec<Option<usize>>,
    flagged: BTreeSet<QuestionId>,
    module: Option<(String, Option<String>)>,
}


impl<'q> QuizSession<'q> {
    pub fn new(questions: Vec<&'q Question>) -> Self {
        let answers = vec![None; questions.len()];
        QuizSession { questions, answers, flagged: BTreeSet::new(), module: None }
    }

    /// Credit the final score to a study module when the quiz finishes.
    pub fn with_module(mut self, module_id: &str, name: Option<&str>) -> Self {
        self.module = Some((module_id.to_string(), name.map(String::from)));
        self
    }

    pub fn questions(&self) -> &[&'q Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn answer_for(&self, index: usize) -> Option<usize> {
        self.answers.get(index).cloned().flatten()
    }

    pub fn is_flagged(&self, index: usize) -> bool {
        self.questions
            .get(index)
            .map(|q| self.flagged.contains(&q.id))
            .unwrap_or(false)
    }

    /// Record `choice` for the question at `index` and reschedule it in the ledger.
    /// Returns whether the answer was correct.
    pub fn answer<S: Storage>(
        &mut self, index: usize, choice: usize, ledger: &RotationLedger<S>
    ) -> Result<bool> {
        let question = *self.questions.get(index).ok_or(EngineError::NoSuchQuestion(index))?;
        let correct = question.is_correct(choice);
        self.answers[index] = Some(choice);
        ledger.schedule_after_answer(question.id, correct);
        Ok(correct)
    }

    /// Flag or unflag the question at `index` for review. Returns the new state.
    pub fn toggle_flag(&mut self, index: usize) -> Result<bool> {
        let id = self.questions.get(index).ok_or(EngineError::NoSuchQuestion(index))?.id;
        if self.flagged.remove(&id) {
            Ok(false)
        } else {
            self.flagged.insert(id);
            Ok(true)
        }
    }

    /// Drop every question from `len` onwards, e.g. when the learner stops early.
    pub fn truncate(&mut self, len: usize) {
        for q in self.questions.iter().skip(len) {
            self.flagged.remove(&q.id);
        }
        self.questions.truncate(len);
        self.answers.truncate(len);
    }

    /// Finish the quiz: queue the missed questions for replay, then save the result.
    pub fn finish<S, T>(self, ledger: &RotationLedger<S>, store: &PerformanceStore<T>) -> QuizOutcome
    where
        S: Storage,
        T: Storage,
    {
        let record = QuizRecord {
            questions: self.questions,
            answers: self.answers,
            flagged: self.flagged.into_iter().collect(),
            finished_at: Utc::now(),
        };

        let wrongs: Vec<QuestionId> = record
            .marked()
            .filter(|(_, correct)| !*correct)
            .map(|(q, _)| q.id)
            .collect();
        if !wrongs.is_empty() {
            ledger.push_recent_wrongs(&wrongs, RECENT_WRONGS_MAX);
        }

        let item = store.append_quiz_result(&record);
        if let Some((module_id, name)) = self.module {
            store.record_module_progress(&module_id, f64::from(item.percentage), name.as_deref());
        }

        let passed = is_pass(item.correct_count, item.total_questions);
        QuizOutcome { item, passed }
    }
}


/// Return `true` if `correct` out of `total` meets the pass mark, scaled to the length
/// of the quiz.
pub fn is_pass(correct: u32, total: u32) -> bool {
    total > 0 && correct * PASS_MARK.1 >= PASS_MARK.0 * total
}
