/**
 * Question rotation and adaptive sampling for UK driving-theory practice.
 *
 * The usual flow for one quiz:
 *
 *   1. Bias a blueprint toward weak categories (`PerformanceStore::adaptive_weights`).
 *   2. Sample questions (`sampling::sample_mock` and friends), which consults and updates
 *      the `RotationLedger`.
 *   3. Record answers in a `QuizSession`, then `finish` it to update the ledger and the
 *      `PerformanceStore`.
 *
 * Both the ledger and the store are generic over a `Storage` backend and can share one
 * by reference.
 */
pub mod adaptive;
pub mod bank;
pub mod common;
pub mod persistence;
pub mod quiz;
pub mod rotation;
pub mod sampling;
pub mod storage;

pub use bank::{Category, Difficulty, Question, QuestionBank};
pub use common::{EngineError, QuestionId, Result};
pub use persistence::{PerformanceSnapshot, PerformanceStore, QuizRecord};
pub use quiz::{QuizOutcome, QuizSession};
pub use rotation::RotationLedger;
pub use sampling::{Blueprint, CategoryOptions, DifficultyMix, MockOptions};
pub use storage::{JsonFileStorage, MemoryStorage, SqliteStorage, Storage};
