/**
 * Practise for the UK driving theory test from the command line.
 */
#[macro_use]
mod iohelper;
mod options;
mod ui;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use colored::*;
use log::debug;
use rand::thread_rng;
use structopt::StructOpt;

use mastery::adaptive::DEFAULT_BOOST;
use mastery::common::{is_broken_pipe, EngineError, Result};
use mastery::sampling::{
    sample_category_quiz, sample_mistakes_mixed, sample_mistakes_only_category, sample_mock,
};
use mastery::{
    Category, CategoryOptions, JsonFileStorage, MockOptions, PerformanceStore, QuestionBank,
    QuizSession, RotationLedger, SqliteStorage, Storage,
};

use options::{Backend, Command, CountOptions, Options, ProgressOptions, StatsOptions, TakeOptions};
use ui::{CmdUI, Response};


const APP_DIR_NAME: &str = "driving_mastery";
const SQLITE_FILE_NAME: &str = "mastery.sqlite3";
const DEFAULT_MISTAKES: usize = 20;


fn main() {
    env_logger::init();
    let options = Options::from_args();

    if options.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = run(options) {
        if !is_broken_pipe(&e) {
            eprintln!("{}: {}", "Error".red(), e);
            ::std::process::exit(2);
        }
    }
}


fn run(options: Options) -> Result<()> {
    let dir = require_data_dir(options.directory.as_ref())?;
    debug!("data directory {} with {} backend", dir.display(), options.backend);

    let storage: Box<dyn Storage> = match options.backend {
        Backend::Json => Box::new(JsonFileStorage::open(&dir)?),
        Backend::Sqlite => {
            let mut path = dir.clone();
            path.push(SQLITE_FILE_NAME);
            Box::new(SqliteStorage::open(&path)?)
        },
    };

    match options.cmd {
        Command::Take(options) => main_take(storage.as_ref(), &dir, options),
        Command::Stats(options) => main_stats(storage.as_ref(), options),
        Command::Count(options) => main_count(&dir, options),
        Command::Progress(options) => main_progress(storage.as_ref(), options),
    }
}


/// The main function for the `take` subcommand.
fn main_take(storage: &dyn Storage, dir: &Path, options: TakeOptions) -> Result<()> {
    let bank = QuestionBank::load(&bank_path(dir, options.bank.as_ref()))?;
    let category = parse_category(options.category.as_ref())?;
    let ledger = RotationLedger::new(storage);
    let store = PerformanceStore::new(storage);
    let mut rng = thread_rng();

    let questions = if options.mistakes {
        let max = options.num_to_ask.unwrap_or(DEFAULT_MISTAKES);
        match category {
            Some(category) => {
                sample_mistakes_only_category(bank.questions(), category, &ledger, max, &mut rng)
            },
            None => sample_mistakes_mixed(bank.questions(), &ledger, max, &mut rng),
        }
    } else if let Some(category) = category {
        let mut opts = CategoryOptions::default();
        if let Some(n) = options.num_to_ask {
            opts.length = n;
        }
        sample_category_quiz(bank.questions(), category, &ledger, &opts, &mut rng)
    } else {
        let mut opts = MockOptions::default();
        if let Some(n) = options.num_to_ask {
            opts.length = n;
        }
        if !options.no_adaptive {
            opts.blueprint = store.adaptive_weights(&opts.blueprint, DEFAULT_BOOST);
        }
        sample_mock(bank.questions(), &ledger, &opts, &mut rng)
    };

    if questions.is_empty() {
        return Err(EngineError::EmptyQuiz);
    }

    let mut session = QuizSession::new(questions);
    if let Some(module) = options.module.as_ref() {
        session = session.with_module(module, None);
    }

    let mut ui = CmdUI::new(session.len());
    let asked = ask_questions(&mut ui, &mut session, &ledger)?;
    session.truncate(asked);
    if session.is_empty() {
        return Ok(());
    }

    let outcome = session.finish(&ledger, &store);
    ui.results(&outcome)
}


/// Ask each question in turn. Returns how many questions were asked before the learner
/// finished or interrupted the quiz.
fn ask_questions<S: Storage>(
    ui: &mut CmdUI, session: &mut QuizSession, ledger: &RotationLedger<S>
) -> Result<usize> {
    let mut index = 0;
    while index < session.len() {
        let question = session.questions()[index];
        ui.question(index + 1, question, session.is_flagged(index))?;
        match ui.response(question.options.len()) {
            Ok(Some(Response::Choice(choice))) => {
                if session.answer(index, choice, ledger)? {
                    ui.correct()?;
                } else {
                    ui.incorrect(question)?;
                }
            },
            Ok(Some(Response::Flag)) => {
                if session.toggle_flag(index)? {
                    ui.status("Flagged for review.")?;
                } else {
                    ui.status("Flag removed.")?;
                }
                // Ask the same question again.
                continue;
            },
            Ok(None) => {
                ui.skipped(question)?;
            },
            Err(EngineError::ReadlineInterrupted) => {
                break;
            },
            Err(e) => {
                return Err(e);
            },
        }
        index += 1;
    }
    Ok(index)
}


/// The main function for the `stats` subcommand.
fn main_stats(storage: &dyn Storage, options: StatsOptions) -> Result<()> {
    let store = PerformanceStore::new(storage);
    ui::print_snapshot(&store.get_performance_snapshot(), options.num_recent)
}


/// The main function for the `count` subcommand.
fn main_count(dir: &Path, options: CountOptions) -> Result<()> {
    let bank = QuestionBank::load(&bank_path(dir, options.bank.as_ref()))?;
    if let Some(category) = parse_category(options.category.as_ref())? {
        my_println!("{}", bank.in_category(category).len())?;
    } else {
        for (category, count) in bank.count_by_category().iter() {
            my_println!("{:<40} {:>4}", category.name(), count)?;
        }
        my_println!("{:<40} {:>4}", "Total", bank.len())?;
    }
    Ok(())
}


/// The main function for the `progress` subcommand.
fn main_progress(storage: &dyn Storage, options: ProgressOptions) -> Result<()> {
    let store = PerformanceStore::new(storage);
    let stored = store.record_module_progress(
        &options.module, options.percent, options.name.as_deref());
    my_println!("Progress for '{}': {}%", options.module, stored)
}


fn parse_category(name: Option<&String>) -> Result<Option<Category>> {
    match name {
        Some(name) => Category::from_name(name)
            .map(Some)
            .ok_or_else(|| EngineError::UnknownCategory(name.clone())),
        None => Ok(None),
    }
}


fn bank_path(dir: &Path, bank: Option<&PathBuf>) -> PathBuf {
    match bank {
        Some(path) => path.clone(),
        None => {
            let mut path = dir.to_path_buf();
            path.push("bank.json");
            path
        },
    }
}


/// Return the path to the data directory, creating it if it doesn't exist.
fn require_data_dir(directory: Option<&PathBuf>) -> Result<PathBuf> {
    let dirpath = match directory {
        Some(dir) => dir.clone(),
        None => {
            let mut dirpath = dirs::data_dir()
                .ok_or_else(|| EngineError::CannotMakeDataDir(PathBuf::from(APP_DIR_NAME)))?;
            dirpath.push(APP_DIR_NAME);
            dirpath
        },
    };
    if !dirpath.exists() {
        fs::create_dir_all(&dirpath).or(Err(EngineError::CannotMakeDataDir(dirpath.clone())))?;
    }
    Ok(dirpath)
}
