/**
 * Definitions shared by several modules, such as `EngineError` and the question id type.
 */
use std::error;
use std::fmt;
use std::io;
use std::path::PathBuf;

use super::storage::StorageError;


/// Identifier of a question in the question bank.
pub type QuestionId = u32;

pub type Result<T> = ::std::result::Result<T, EngineError>;


#[derive(Debug)]
pub enum EngineError {
    /// For when the question bank file does not exist.
    BankNotFound(PathBuf),
    /// The question bank parsed, but its contents are inconsistent.
    InvalidBank(String),
    /// For when the user names a category that is not one of the DVSA categories.
    UnknownCategory(String),
    /// For when a question index is out of range for the current quiz.
    NoSuchQuestion(usize),
    CannotMakeDataDir(PathBuf),
    EmptyQuiz,
    ReadlineInterrupted,
    Json(serde_json::Error),
    Io(io::Error),
    Storage(StorageError),
}


impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            EngineError::BankNotFound(ref path) => {
                write!(f, "could not find question bank at '{}'", path.to_string_lossy())
            },
            EngineError::InvalidBank(ref message) => {
                write!(f, "invalid question bank ({})", message)
            },
            EngineError::UnknownCategory(ref name) => {
                write!(f, "unknown category '{}'", name)
            },
            EngineError::NoSuchQuestion(index) => {
                write!(f, "no question at position {}", index)
            },
            EngineError::CannotMakeDataDir(ref path) => {
                write!(f, "unable to create data directory '{}'", path.to_string_lossy())
            },
            EngineError::EmptyQuiz => {
                write!(f, "no questions found")
            },
            EngineError::ReadlineInterrupted => {
                Ok(())
            },
            EngineError::Json(ref err) => {
                write!(f, "could not parse JSON ({})", err)
            },
            EngineError::Io(ref err) => {
                write!(f, "IO error ({})", err)
            },
            EngineError::Storage(ref err) => {
                write!(f, "storage error ({})", err)
            },
        }
    }
}


impl error::Error for EngineError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            EngineError::Json(ref err) => Some(err),
            EngineError::Io(ref err) => Some(err),
            EngineError::Storage(ref err) => Some(err),
            _ => None,
        }
    }
}


impl From<io::Error> for EngineError {
    fn from(err: io::Error) -> Self {
        EngineError::Io(err)
    }
}


impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Json(err)
    }
}


impl From<StorageError> for EngineError {
    fn from(err: StorageError) -> Self {
        EngineError::Storage(err)
    }
}


/// Return `true` if the error was caused by writing to a closed pipe, e.g. when the
/// output of the command is piped into `head`.
pub fn is_broken_pipe(e: &EngineError) -> bool {
    if let EngineError::Io(e) = e {
        if let io::ErrorKind::BrokenPipe = e.kind() {
            return true;
        }
    }
    false
}
