/**
 * The rotation ledger decides which questions should come back soon and which should
 * stay away for a while.
 *
 * It keeps three structures:
 *
 *   - the avoid list: ids served recently, oldest first, newest last
 *   - the spaced-repetition queue: ids with the time they next become due
 *   - the recent-wrong queue: ids answered incorrectly, most recent first
 *
 * Note that the avoid list and the recent-wrong queue have opposite orientations.
 */
use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::QuestionId;
use super::storage::{keys, load_or_default, save_best_effort, Storage};


pub const AVOID_SET_MAX: usize = 400;
pub const RECENT_WRONGS_MAX: usize = 100;
pub const SR_QUEUE_MAX: usize = 1000;
/// How long a correctly answered question stays out of the due queue.
pub const CORRECT_INTERVAL_DAYS: u32 = 21;
pub const DAY_MS: i64 = 86_400_000;


#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SrItem {
    pub id: QuestionId,
    /// Milliseconds since the Unix epoch.
    pub next_due: i64,
    pub interval_days: u32,
}


pub struct RotationLedger<S: Storage> {
    storage: S,
}


impl<S: Storage> RotationLedger<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn get_avoid_set(&self) -> HashSet<QuestionId> {
        self.load_avoid_list().into_iter().collect()
    }

    /// Add `ids` to the avoid list and keep only the newest `max` entries.
    ///
    /// An id that is already present moves to the newest position, so the ids just
    /// pushed are always the last to be evicted.
    pub fn push_to_avoid_set(&self, ids: &[QuestionId], max: usize) {
        let mut list = self.load_avoid_list();
        for id in ids.iter() {
            if let Some(pos) = list.iter().position(|x| x == id) {
                list.remove(pos);
            }
            list.push_back(*id);
        }
        while list.len() > max {
            list.pop_front();
        }
        save_best_effort(&self.storage, keys::AVOID_IDS, &list);
    }

    pub fn upsert_sr_item(&self, id: QuestionId, interval_days: u32) {
        self.upsert_sr_item_at(id, interval_days, Utc::now())
    }

    pub fn upsert_sr_item_at(&self, id: QuestionId, interval_days: u32, now: DateTime<Utc>) {
        let mut queue = self.sr_queue();
        queue.retain(|item| item.id != id);
        queue.push(SrItem {
            id,
            next_due: now.timestamp_millis() + i64::from(interval_days) * DAY_MS,
            interval_days,
        });
        if queue.len() > SR_QUEUE_MAX {
            let excess = queue.len() - SR_QUEUE_MAX;
            queue.drain(..excess);
        }
        save_best_effort(&self.storage, keys::SR_QUEUE, &queue);
    }

    /// Remove and return up to `max` ids that are due.
    pub fn pop_due_sr_items(&self, max: usize) -> Vec<QuestionId> {
        self.pop_due_sr_items_at(max, Utc::now())
    }

    pub fn pop_due_sr_items_at(&self, max: usize, now: DateTime<Utc>) -> Vec<QuestionId> {
        self.take_due_matching(max, now, |_| true)
    }

    /// Like `pop_due_sr_items`, but only ids in `pool` are taken. Due items outside the
    /// pool stay in the queue.
    pub fn take_due_sr_items_from_pool(&self, pool: &[QuestionId], max: usize) -> Vec<QuestionId> {
        self.take_due_sr_items_from_pool_at(pool, max, Utc::now())
    }

    pub fn take_due_sr_items_from_pool_at(
        &self, pool: &[QuestionId], max: usize, now: DateTime<Utc>
    ) -> Vec<QuestionId> {
        let pool: HashSet<QuestionId> = pool.iter().cloned().collect();
        self.take_due_matching(max, now, |id| pool.contains(&id))
    }

    fn take_due_matching<F>(&self, max: usize, now: DateTime<Utc>, matches: F) -> Vec<QuestionId>
    where
        F: Fn(QuestionId) -> bool,
    {
        let queue = self.sr_queue();
        if queue.is_empty() || max == 0 {
            return Vec::new();
        }

        let now = now.timestamp_millis();
        let mut taken = Vec::new();
        let mut remaining = Vec::with_capacity(queue.len());
        for item in queue.into_iter() {
            if taken.len() < max && item.next_due <= now && matches(item.id) {
                taken.push(item.id);
            } else {
                remaining.push(item);
            }
        }

        if !taken.is_empty() {
            save_best_effort(&self.storage, keys::SR_QUEUE, &remaining);
        }
        taken
    }

    /// Record a batch of wrong answers, most recent first.
    ///
    /// The batch is reversed and placed in front of the existing queue, so the last id
    /// of the batch ends up first. Existing entries for the same ids are dropped.
    pub fn push_recent_wrongs(&self, ids: &[QuestionId], max: usize) {
        let existing = self.recent_wrongs();
        let mut seen = HashSet::new();
        let mut queue = Vec::with_capacity(ids.len() + existing.len());
        for id in ids.iter().rev().chain(existing.iter()) {
            if seen.insert(*id) {
                queue.push(*id);
            }
        }
        queue.truncate(max);
        save_best_effort(&self.storage, keys::RECENT_WRONGS, &queue);
    }

    /// Remove and return up to `max` ids from the front of the recent-wrong queue.
    pub fn pop_recent_wrongs(&self, max: usize) -> Vec<QuestionId> {
        let mut queue = self.recent_wrongs();
        if queue.is_empty() || max == 0 {
            return Vec::new();
        }
        let n = max.min(queue.len());
        let taken: Vec<QuestionId> = queue.drain(..n).collect();
        save_best_effort(&self.storage, keys::RECENT_WRONGS, &queue);
        taken
    }

    /// Like `pop_recent_wrongs`, but only ids in `pool` are taken. The rest of the queue
    /// keeps its order.
    pub fn take_recent_wrongs_from_pool(&self, pool: &[QuestionId], max: usize) -> Vec<QuestionId> {
        let queue = self.recent_wrongs();
        if queue.is_empty() || max == 0 {
            return Vec::new();
        }

        let pool: HashSet<QuestionId> = pool.iter().cloned().collect();
        let mut taken = Vec::new();
        let mut remaining = Vec::with_capacity(queue.len());
        for id in queue.into_iter() {
            if taken.len() < max && pool.contains(&id) {
                taken.push(id);
            } else {
                remaining.push(id);
            }
        }

        if !taken.is_empty() {
            save_best_effort(&self.storage, keys::RECENT_WRONGS, &remaining);
        }
        taken
    }

    pub fn schedule_after_answer(&self, id: QuestionId, is_correct: bool) {
        self.schedule_after_answer_at(id, is_correct, Utc::now())
    }

    pub fn schedule_after_answer_at(&self, id: QuestionId, is_correct: bool, now: DateTime<Utc>) {
        let interval = if is_correct { CORRECT_INTERVAL_DAYS } else { 0 };
        self.upsert_sr_item_at(id, interval, now);
    }

    pub fn sr_queue(&self) -> Vec<SrItem> {
        load_or_default(&self.storage, keys::SR_QUEUE)
    }

    pub fn recent_wrongs(&self) -> Vec<QuestionId> {
        load_or_default(&self.storage, keys::RECENT_WRONGS)
    }

    fn load_avoid_list(&self) -> VecDeque<QuestionId> {
        load_or_default(&self.storage, keys::AVOID_IDS)
    }
}
