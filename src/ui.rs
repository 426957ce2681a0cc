/**
 * The command-line user interface for taking quizzes and reviewing results.
 */
use std::io::Write;

use colored::*;

use mastery::common::{EngineError, Result};
use mastery::persistence::PerformanceSnapshot;
use mastery::quiz::PASS_MARK;
use mastery::{Question, QuizOutcome};

use super::iohelper::{index_to_letter, letter_to_index, prettyprint, prettyprint_colored, prompt};


/// What the learner typed in response to a question.
pub enum Response {
    Choice(usize),
    Flag,
}


pub struct CmdUI {
    total: usize,
}


impl CmdUI {
    pub fn new(total: usize) -> Self {
        Self { total }
    }

    pub fn question(&mut self, number: usize, question: &Question, flagged: bool) -> Result<()> {
        my_print!("\n")?;
        let prefix = format!("  ({}/{}) ", number, self.total);
        prettyprint_colored(&question.text, &prefix, None, Some(Color::Cyan))?;
        let mut tag = format!("[{}]", question.category);
        if flagged {
            tag.push_str(" [flagged]");
        }
        prettyprint_colored(&tag, &" ".repeat(prefix.len()), Some(Color::BrightBlack), None)?;
        my_print!("\n")?;
        for (i, option) in question.options.iter().enumerate() {
            let prefix = format!("    ({}) ", index_to_letter(i));
            prettyprint(option, &prefix)?;
        }
        Ok(())
    }

    /// Prompt until the learner enters an option letter or `!flag`. `Ok(None)` means
    /// the question was skipped.
    pub fn response(&mut self, count: usize) -> Result<Option<Response>> {
        loop {
            let line = match prompt("> ")? {
                Some(line) => line,
                None => return Ok(None),
            };
            if line == "!flag" {
                return Ok(Some(Response::Flag));
            }
            if let Some(index) = letter_to_index(&line, count) {
                return Ok(Some(Response::Choice(index)));
            }
            self.status("Please enter a letter.")?;
        }
    }

    pub fn correct(&mut self) -> Result<()> {
        prettyprint(&format!("{}", "Correct!".green()), "")
    }

    pub fn incorrect(&mut self, question: &Question) -> Result<()> {
        let message = match question.correct_option() {
            Some(option) => {
                format!("{} The correct answer was {}.", "Incorrect.".red(), option.green())
            },
            None => format!("{}", "Incorrect.".red()),
        };
        prettyprint(&message, "")?;
        self.explanation(question)
    }

    pub fn skipped(&mut self, question: &Question) -> Result<()> {
        let message = match question.correct_option() {
            Some(option) => format!("Skipped. The correct answer was {}.", option),
            None => String::from("Skipped."),
        };
        prettyprint(&message, "")?;
        self.explanation(question)
    }

    fn explanation(&mut self, question: &Question) -> Result<()> {
        if !question.explanation.is_empty() {
            prettyprint_colored(&question.explanation, "  ", Some(Color::BrightBlue), None)?;
        }
        Ok(())
    }

    pub fn status(&mut self, text: &str) -> Result<()> {
        my_println!("{}", text)
    }

    pub fn results(&mut self, outcome: &QuizOutcome) -> Result<()> {
        let item = &outcome.item;
        let score = format!("{}%", item.percentage);

        my_print!("\n\n")?;
        my_print!("{}", "Score: ".white())?;
        my_print!("{}", score.cyan())?;
        my_println!(
            "{}",
            format!(" ({} out of {} correct)", item.correct_count, item.total_questions).white()
        )?;
        if item.flagged_count > 0 {
            my_println!("  {} flagged for review", item.flagged_count)?;
        }
        for (category, stat) in item.per_category.iter() {
            my_println!("  {:<40} {:>3}/{:<3}", category.name(), stat.correct, stat.total)?;
        }

        if outcome.passed {
            my_println!("{}", "Pass".bright_green())
        } else {
            my_println!(
                "{} (the pass mark is {} out of {})",
                "Not passed".red(),
                PASS_MARK.0,
                PASS_MARK.1
            )
        }
    }
}


/// Print a performance snapshot, listing at most `num_recent` recent quizzes.
pub fn print_snapshot(snapshot: &PerformanceSnapshot, num_recent: usize) -> Result<()> {
    let summary = &snapshot.summary;
    if summary.attempts == 0 {
        my_println!("No quizzes have been recorded yet.")?;
    } else {
        my_println!("Quizzes taken: {}", summary.attempts)?;
        my_println!("Average score: {:.1}%", summary.avg_score)?;
        if let Some(recent) = summary.recent_score {
            my_println!("Most recent:   {}%", recent)?;
        }
    }

    if !snapshot.category_stats.is_empty() {
        my_println!("\nCategory accuracy:")?;
        for (category, stat) in snapshot.category_stats.iter() {
            let accuracy = stat.accuracy().map(|a| a * 100.0).unwrap_or(0.0);
            let line = format!(
                "  {:<40} {:>4}/{:<4} {:>5.1}%",
                category.name(), stat.correct, stat.total, accuracy
            );
            if accuracy < 75.0 {
                my_println!("{}", line.red())?;
            } else {
                my_println!("{}", line)?;
            }
        }
    }

    if !snapshot.module_progress.is_empty() {
        my_println!("\nModules:")?;
        for (id, progress) in snapshot.module_progress.iter() {
            let label = match &progress.name {
                Some(name) => format!("{} ({})", id, name),
                None => id.clone(),
            };
            my_println!("  {:<40} {:>3}%", label, progress.percent)?;
        }
    }

    if summary.attempts > 0 && num_recent > 0 {
        my_println!("\nRecent quizzes:")?;
        for item in snapshot.recent_quizzes.iter().take(num_recent) {
            my_println!(
                "  {}  {:>3}/{:<3} {:>3}%",
                item.timestamp.format("%Y-%m-%d %H:%M"),
                item.correct_count,
                item.total_questions,
                item.percentage
            )?;
        }
    }
    Ok(())
}
