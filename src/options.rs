/**
 * Command-line options for the `mastery` binary.
 */
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use structopt::StructOpt;


/// Holds the command-line configuration for the application.
#[derive(StructOpt)]
#[structopt(name = "mastery", about = "Practise for the UK driving theory test.")]
pub struct Options {
    /// Keep results and the question bank in a particular directory.
    #[structopt(short = "d", long = "directory", env = "MASTERY_DIR")]
    pub directory: Option<PathBuf>,
    /// Where to store results: 'json' (one file per record) or 'sqlite'.
    #[structopt(long = "backend", default_value = "json")]
    pub backend: Backend,
    /// Do not emit colorized output.
    #[structopt(long = "no-color")]
    pub no_color: bool,
    #[structopt(subcommand)]
    pub cmd: Command,
}

#[derive(StructOpt)]
pub enum Command {
    /// Take a quiz.
    #[structopt(name = "take")]
    Take(TakeOptions),
    /// Show scores, category accuracy and module progress.
    #[structopt(name = "stats")]
    Stats(StatsOptions),
    /// Count the questions in the bank.
    #[structopt(name = "count")]
    Count(CountOptions),
    /// Record progress on a study module.
    #[structopt(name = "progress")]
    Progress(ProgressOptions),
}

#[derive(StructOpt)]
pub struct TakeOptions {
    /// Path to the question bank. Defaults to 'bank.json' in the data directory.
    #[structopt(long = "bank")]
    pub bank: Option<PathBuf>,
    /// Limit the total number of questions.
    #[structopt(short = "n")]
    pub num_to_ask: Option<usize>,
    /// Only ask questions from one category.
    #[structopt(long = "category")]
    pub category: Option<String>,
    /// Only ask questions that were recently answered incorrectly.
    #[structopt(long = "mistakes")]
    pub mistakes: bool,
    /// Use the plain blueprint instead of favouring weak categories.
    #[structopt(long = "no-adaptive")]
    pub no_adaptive: bool,
    /// Credit the score to a study module.
    #[structopt(long = "module")]
    pub module: Option<String>,
}

#[derive(StructOpt)]
pub struct StatsOptions {
    /// Number of recent quizzes to list.
    #[structopt(short = "n", default_value = "5")]
    pub num_recent: usize,
}

#[derive(StructOpt)]
pub struct CountOptions {
    /// Path to the question bank. Defaults to 'bank.json' in the data directory.
    #[structopt(long = "bank")]
    pub bank: Option<PathBuf>,
    /// Only count one category.
    #[structopt(long = "category")]
    pub category: Option<String>,
}

#[derive(StructOpt)]
pub struct ProgressOptions {
    /// Identifier of the module.
    pub module: String,
    /// Percentage completed, from 0 to 100.
    pub percent: f64,
    /// Display name of the module.
    #[structopt(long = "name")]
    pub name: Option<String>,
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Json,
    Sqlite,
}


impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Backend::Json),
            "sqlite" => Ok(Backend::Sqlite),
            _ => Err(format!("unknown backend '{}' (expected 'json' or 'sqlite')", s)),
        }
    }
}


impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Backend::Json => write!(f, "json"),
            Backend::Sqlite => write!(f, "sqlite"),
        }
    }
}
