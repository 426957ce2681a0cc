/**
 * Choose the questions for a quiz.
 *
 * A mock test is filled in priority order:
 *
 *   1. questions the learner recently got wrong
 *   2. questions whose spaced-repetition interval has elapsed
 *   3. fresh questions, spread across categories according to a blueprint and across
 *      difficulties according to a difficulty mix
 *
 * Questions served recently (the ledger's avoid set) are skipped in step 3 unless there
 * is nothing else left to ask. Every question served is pushed into the avoid set before
 * the sampler returns.
 */
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

use super::bank::{Category, Difficulty, Question};
use super::common::QuestionId;
use super::rotation::{RotationLedger, AVOID_SET_MAX};
use super::storage::Storage;


/// Number of questions in the DVSA car theory test.
pub const MOCK_TEST_LENGTH: usize = 50;


/// Target share of a quiz for each category. Weights are expected to sum to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Blueprint {
    weights: BTreeMap<Category, f64>,
}


impl Blueprint {
    pub fn new(weights: BTreeMap<Category, f64>) -> Self {
        Self { weights }
    }

    /// Equal weight for all fourteen categories.
    pub fn uniform() -> Self {
        let share = 1.0 / Category::ALL.len() as f64;
        Self::new(Category::ALL.iter().map(|c| (*c, share)).collect())
    }

    pub fn from_pairs(pairs: &[(Category, f64)]) -> Self {
        Self::new(pairs.iter().cloned().collect())
    }

    pub fn weight(&self, category: Category) -> f64 {
        self.weights.get(&category).cloned().unwrap_or(0.0)
    }

    pub fn weights(&self) -> &BTreeMap<Category, f64> {
        &self.weights
    }

    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }
}


impl Default for Blueprint {
    fn default() -> Self {
        Blueprint::uniform()
    }
}


/// Share of each difficulty within a category's allocation. `hard` only documents the
/// intent: the hard share is whatever is left after rounding the other two.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyMix {
    pub easy: f64,
    pub med: f64,
    pub hard: f64,
}


impl Default for DifficultyMix {
    fn default() -> Self {
        DifficultyMix { easy: 0.3, med: 0.5, hard: 0.2 }
    }
}


#[derive(Debug, Clone)]
pub struct MockOptions {
    pub length: usize,
    pub blueprint: Blueprint,
    pub difficulty_mix: DifficultyMix,
    /// Maximum number of due spaced-repetition questions to include.
    pub include_sr: usize,
    /// Maximum number of recently missed questions to include.
    pub include_recent_wrongs: usize,
}


impl Default for MockOptions {
    fn default() -> Self {
        MockOptions {
            length: MOCK_TEST_LENGTH,
            blueprint: Blueprint::default(),
            difficulty_mix: DifficultyMix::default(),
            include_sr: 5,
            include_recent_wrongs: 5,
        }
    }
}


#[derive(Debug, Clone)]
pub struct CategoryOptions {
    pub length: usize,
    pub difficulty_mix: DifficultyMix,
    pub include_sr: usize,
    pub include_recent_wrongs: usize,
}


impl Default for CategoryOptions {
    fn default() -> Self {
        CategoryOptions {
            length: 10,
            difficulty_mix: DifficultyMix::default(),
            include_sr: 3,
            include_recent_wrongs: 3,
        }
    }
}


/// Sample a mock test from `questions`.
///
/// The result has no repeated ids and contains `min(opts.length, questions.len())`
/// questions. Recent wrongs and due items taken from the ledger are consumed.
pub fn sample_mock<'a, S, R>(
    questions: &'a [Question],
    ledger: &RotationLedger<S>,
    opts: &MockOptions,
    rng: &mut R,
) -> Vec<&'a Question>
where
    S: Storage,
    R: Rng,
{
    let avoid = ledger.get_avoid_set();
    let by_id: HashMap<QuestionId, &Question> = questions.iter().map(|q| (q.id, q)).collect();
    let mut picker = Picker::new(opts.length);

    let wrongs = ledger.pop_recent_wrongs(opts.include_recent_wrongs.min(opts.length));
    picker.take_ids(&wrongs, &by_id);

    let sr_room = opts.include_sr.min(opts.length - picker.len());
    let due = ledger.pop_due_sr_items(sr_room);
    picker.take_ids(&due, &by_id);
    debug!("mock test: {} recent wrongs, {} due items", wrongs.len(), due.len());

    let remaining = picker.unchosen(questions.iter(), &avoid);
    let targets = category_targets(&opts.blueprint, opts.length - picker.len(), rng);

    let mut by_category: BTreeMap<Category, Vec<&Question>> = BTreeMap::new();
    for q in remaining.into_iter() {
        by_category.entry(q.category).or_insert_with(Vec::new).push(q);
    }
    for (category, need) in targets.iter() {
        if let Some(pool) = by_category.get(category) {
            let drawn = draw_by_difficulty(pool, *need, &opts.difficulty_mix, rng);
            picker.take_all(drawn);
        }
    }

    pad_and_finish(picker, questions, &avoid, ledger, rng)
}


/// Sample a quiz from a single category.
pub fn sample_category_quiz<'a, S, R>(
    questions: &'a [Question],
    category: Category,
    ledger: &RotationLedger<S>,
    opts: &CategoryOptions,
    rng: &mut R,
) -> Vec<&'a Question>
where
    S: Storage,
    R: Rng,
{
    let pool: Vec<&Question> = questions.iter().filter(|q| q.category == category).collect();
    let pool_ids: Vec<QuestionId> = pool.iter().map(|q| q.id).collect();
    let by_id: HashMap<QuestionId, &Question> = pool.iter().map(|q| (q.id, *q)).collect();
    let avoid = ledger.get_avoid_set();
    let mut picker = Picker::new(opts.length);

    let wrongs = ledger.take_recent_wrongs_from_pool(
        &pool_ids, opts.include_recent_wrongs.min(opts.length));
    picker.take_ids(&wrongs, &by_id);

    let sr_room = opts.include_sr.min(opts.length - picker.len());
    let due = ledger.take_due_sr_items_from_pool(&pool_ids, sr_room);
    picker.take_ids(&due, &by_id);

    let remaining = picker.unchosen(pool.iter().cloned(), &avoid);
    let need = opts.length - picker.len();
    let drawn = draw_by_difficulty(&remaining, need, &opts.difficulty_mix, rng);
    picker.take_all(drawn);

    pad_and_finish_from(picker, &pool, &avoid, ledger, rng)
}


/// Return only recently missed questions from `category`, shuffled. The returned ids are
/// removed from the recent-wrong queue.
pub fn sample_mistakes_only_category<'a, S, R>(
    questions: &'a [Question],
    category: Category,
    ledger: &RotationLedger<S>,
    max: usize,
    rng: &mut R,
) -> Vec<&'a Question>
where
    S: Storage,
    R: Rng,
{
    let pool_ids: Vec<QuestionId> = questions
        .iter()
        .filter(|q| q.category == category)
        .map(|q| q.id)
        .collect();
    let ids = ledger.take_recent_wrongs_from_pool(&pool_ids, max);
    lookup_shuffled(questions, &ids, rng)
}


/// Return recently missed questions from any category, shuffled. Ids that are no longer
/// in the bank are consumed and dropped.
pub fn sample_mistakes_mixed<'a, S, R>(
    questions: &'a [Question],
    ledger: &RotationLedger<S>,
    max: usize,
    rng: &mut R,
) -> Vec<&'a Question>
where
    S: Storage,
    R: Rng,
{
    let ids = ledger.pop_recent_wrongs(max);
    lookup_shuffled(questions, &ids, rng)
}


fn lookup_shuffled<'a, R>(questions: &'a [Question], ids: &[QuestionId], rng: &mut R) -> Vec<&'a Question>
where
    R: Rng,
{
    let by_id: HashMap<QuestionId, &Question> = questions.iter().map(|q| (q.id, q)).collect();
    let mut seen = HashSet::new();
    let mut chosen: Vec<&Question> = ids
        .iter()
        .filter(|id| seen.insert(**id))
        .filter_map(|id| by_id.get(id).cloned())
        .collect();
    chosen.shuffle(rng);
    chosen
}


/// Turn blueprint weights into integer per-category targets that sum to exactly
/// `length`.
///
/// Weights are normalized first; a blueprint whose positive weights sum to zero or to
/// something non-finite is treated as uniform over its categories. Each category gets
/// the floor of its quota, and the seats left over go to the largest remainders (ties
/// broken at random). Any drift left by floating-point error is corrected one step at a
/// time by a bounded loop that never drives a target below zero.
pub fn category_targets<R>(blueprint: &Blueprint, length: usize, rng: &mut R) -> BTreeMap<Category, usize>
where
    R: Rng,
{
    let weights = blueprint.weights();
    if weights.is_empty() {
        return BTreeMap::new();
    }

    let total: f64 = weights.values().map(|w| w.max(0.0)).sum();
    let uniform = !(total.is_finite() && total > 0.0);
    let mut quotas: Vec<(Category, f64)> = weights
        .iter()
        .map(|(c, w)| {
            let share = if uniform { 1.0 / weights.len() as f64 } else { w.max(0.0) / total };
            let quota = share * length as f64;
            (*c, if quota.is_finite() { quota.min(length as f64) } else { 0.0 })
        })
        .collect();

    let mut targets: BTreeMap<Category, usize> =
        quotas.iter().map(|(c, q)| (*c, q.floor() as usize)).collect();

    // Largest remainders first; the shuffle decides ties.
    let floored: usize = targets.values().sum();
    quotas.shuffle(rng);
    quotas.sort_by(|a, b| {
        (b.1 - b.1.floor())
            .partial_cmp(&(a.1 - a.1.floor()))
            .unwrap_or(Ordering::Equal)
    });
    for (c, _) in quotas.iter().take(length.saturating_sub(floored)) {
        *targets.entry(*c).or_insert(0) += 1;
    }

    let categories: Vec<Category> = targets.keys().cloned().collect();
    let guard = 4 * (length + categories.len());
    for _ in 0..guard {
        let sum: usize = targets.values().sum();
        if sum == length {
            break;
        }
        if sum < length {
            let c = categories[rng.gen_range(0..categories.len())];
            *targets.entry(c).or_insert(0) += 1;
        } else {
            let eligible: Vec<Category> = categories
                .iter()
                .cloned()
                .filter(|c| targets[c] > 0)
                .collect();
            let c = eligible[rng.gen_range(0..eligible.len())];
            if let Some(t) = targets.get_mut(&c) {
                *t -= 1;
            }
        }
    }
    targets
}


/// Draw `need` questions from `pool`, split by difficulty.
///
/// Easy and medium get `round(need * ratio)` each and hard takes the remainder, so hard
/// absorbs the rounding error. If a difficulty runs short, the gap is filled from the
/// category's other difficulties.
fn draw_by_difficulty<'a, R>(
    pool: &[&'a Question],
    need: usize,
    mix: &DifficultyMix,
    rng: &mut R,
) -> Vec<&'a Question>
where
    R: Rng,
{
    if need == 0 || pool.is_empty() {
        return Vec::new();
    }

    let mut easy: Vec<&Question> = Vec::new();
    let mut med: Vec<&Question> = Vec::new();
    let mut hard: Vec<&Question> = Vec::new();
    for q in pool.iter() {
        match q.difficulty {
            Difficulty::Easy => easy.push(*q),
            Difficulty::Med => med.push(*q),
            Difficulty::Hard => hard.push(*q),
        }
    }
    easy.shuffle(rng);
    med.shuffle(rng);
    hard.shuffle(rng);

    let easy_want = ((need as f64) * mix.easy.max(0.0)).round() as usize;
    let med_want = ((need as f64) * mix.med.max(0.0)).round() as usize;
    let easy_want = easy_want.min(need);
    let med_want = med_want.min(need - easy_want);
    let hard_want = need - easy_want - med_want;

    let mut drawn = Vec::with_capacity(need);
    take_front(&mut easy, easy_want, &mut drawn);
    take_front(&mut med, med_want, &mut drawn);
    take_front(&mut hard, hard_want, &mut drawn);

    let mut leftovers: Vec<&Question> = easy.into_iter().chain(med).chain(hard).collect();
    leftovers.shuffle(rng);
    let short = need - drawn.len();
    drawn.extend(leftovers.into_iter().take(short));
    drawn
}


fn take_front<'a>(bucket: &mut Vec<&'a Question>, want: usize, into: &mut Vec<&'a Question>) {
    let n = want.min(bucket.len());
    into.extend(bucket.drain(..n));
}


/// Tracks chosen questions in order and guarantees no id is chosen twice.
struct Picker<'a> {
    length: usize,
    chosen: Vec<&'a Question>,
    ids: HashSet<QuestionId>,
}


impl<'a> Picker<'a> {
    fn new(length: usize) -> Self {
        Picker { length, chosen: Vec::new(), ids: HashSet::new() }
    }

    fn len(&self) -> usize {
        self.chosen.len()
    }

    fn is_full(&self) -> bool {
        self.chosen.len() >= self.length
    }

    fn take(&mut self, q: &'a Question) {
        if !self.is_full() && self.ids.insert(q.id) {
            self.chosen.push(q);
        }
    }

    fn take_all(&mut self, questions: Vec<&'a Question>) {
        for q in questions.into_iter() {
            self.take(q);
        }
    }

    fn take_ids(&mut self, ids: &[QuestionId], by_id: &HashMap<QuestionId, &'a Question>) {
        for id in ids.iter() {
            if let Some(q) = by_id.get(id) {
                self.take(*q);
            }
        }
    }

    fn unchosen<I>(&self, questions: I, avoid: &HashSet<QuestionId>) -> Vec<&'a Question>
    where
        I: Iterator<Item = &'a Question>,
    {
        questions
            .filter(|q| !self.ids.contains(&q.id) && !avoid.contains(&q.id))
            .collect()
    }
}


fn pad_and_finish<'a, S, R>(
    picker: Picker<'a>,
    questions: &'a [Question],
    avoid: &HashSet<QuestionId>,
    ledger: &RotationLedger<S>,
    rng: &mut R,
) -> Vec<&'a Question>
where
    S: Storage,
    R: Rng,
{
    let all: Vec<&'a Question> = questions.iter().collect();
    pad_and_finish_from(picker, &all, avoid, ledger, rng)
}


/// Top the quiz up to its length, preferring questions outside the avoid set, then
/// shuffle it and record every chosen id in the avoid set.
fn pad_and_finish_from<'a, S, R>(
    mut picker: Picker<'a>,
    pool: &[&'a Question],
    avoid: &HashSet<QuestionId>,
    ledger: &RotationLedger<S>,
    rng: &mut R,
) -> Vec<&'a Question>
where
    S: Storage,
    R: Rng,
{
    if !picker.is_full() {
        let mut fresh: Vec<&'a Question> = Vec::new();
        let mut stale: Vec<&'a Question> = Vec::new();
        for q in pool.iter() {
            if picker.ids.contains(&q.id) {
                continue;
            }
            if avoid.contains(&q.id) {
                stale.push(*q);
            } else {
                fresh.push(*q);
            }
        }
        fresh.shuffle(rng);
        stale.shuffle(rng);
        let before = picker.len();
        picker.take_all(fresh);
        picker.take_all(stale);
        if picker.len() > before {
            debug!("padded quiz with {} extra questions", picker.len() - before);
        }
    }

    let mut chosen = picker.chosen;
    chosen.shuffle(rng);
    chosen.truncate(picker.length);

    let ids: Vec<QuestionId> = chosen.iter().map(|q| q.id).collect();
    ledger.push_to_avoid_set(&ids, AVOID_SET_MAX);
    chosen
}
