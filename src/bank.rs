/**
 * The question bank: the immutable set of theory-test questions that every quiz is
 * drawn from.
 */
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use super::common::{EngineError, QuestionId, Result};


/// The fourteen DVSA topic categories of the car theory test.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    #[serde(rename = "Alertness")]
    Alertness,
    #[serde(rename = "Attitude")]
    Attitude,
    #[serde(rename = "Safety and your vehicle")]
    SafetyAndYourVehicle,
    #[serde(rename = "Safety margins")]
    SafetyMargins,
    #[serde(rename = "Hazard awareness")]
    HazardAwareness,
    #[serde(rename = "Vulnerable road users")]
    VulnerableRoadUsers,
    #[serde(rename = "Other types of vehicle")]
    OtherTypesOfVehicle,
    #[serde(rename = "Vehicle handling")]
    VehicleHandling,
    #[serde(rename = "Motorway rules")]
    MotorwayRules,
    #[serde(rename = "Rules of the road")]
    RulesOfTheRoad,
    #[serde(rename = "Road and traffic signs")]
    RoadAndTrafficSigns,
    #[serde(rename = "Essential documents")]
    EssentialDocuments,
    #[serde(rename = "Incidents, accidents and emergencies")]
    Incidents,
    #[serde(rename = "Vehicle loading")]
    VehicleLoading,
}


impl Category {
    pub const ALL: [Category; 14] = [
        Category::Alertness,
        Category::Attitude,
        Category::SafetyAndYourVehicle,
        Category::SafetyMargins,
        Category::HazardAwareness,
        Category::VulnerableRoadUsers,
        Category::OtherTypesOfVehicle,
        Category::VehicleHandling,
        Category::MotorwayRules,
        Category::RulesOfTheRoad,
        Category::RoadAndTrafficSigns,
        Category::EssentialDocuments,
        Category::Incidents,
        Category::VehicleLoading,
    ];

    /// The DVSA display name, which is also the serialized form.
    pub fn name(self) -> &'static str {
        match self {
            Category::Alertness => "Alertness",
            Category::Attitude => "Attitude",
            Category::SafetyAndYourVehicle => "Safety and your vehicle",
            Category::SafetyMargins => "Safety margins",
            Category::HazardAwareness => "Hazard awareness",
            Category::VulnerableRoadUsers => "Vulnerable road users",
            Category::OtherTypesOfVehicle => "Other types of vehicle",
            Category::VehicleHandling => "Vehicle handling",
            Category::MotorwayRules => "Motorway rules",
            Category::RulesOfTheRoad => "Rules of the road",
            Category::RoadAndTrafficSigns => "Road and traffic signs",
            Category::EssentialDocuments => "Essential documents",
            Category::Incidents => "Incidents, accidents and emergencies",
            Category::VehicleLoading => "Vehicle loading",
        }
    }

    /// Look up a category by display name or hyphenated slug, ignoring case, e.g.
    /// "Safety margins", "safety-margins" and "SAFETY MARGINS" are all accepted.
    pub fn from_name(name: &str) -> Option<Category> {
        let wanted = normalize(name);
        Category::ALL.iter().cloned().find(|c| normalize(c.name()) == wanted)
    }
}


impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}


fn normalize(name: &str) -> String {
    name.trim()
        .nfc()
        .collect::<String>()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-')
        .map(|c| if c == '-' { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}


#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Med,
    Hard,
}


impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Med
    }
}


/// Represents a multiple-choice question.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Question {
    pub id: QuestionId,
    pub category: Category,
    /// Questions without a difficulty in the bank file are treated as `Med`.
    #[serde(default)]
    pub difficulty: Difficulty,
    pub text: String,
    pub options: Vec<String>,
    /// Index into `options` of the correct answer.
    pub answer: usize,
    #[serde(default)]
    pub explanation: String,
}


impl Question {
    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.answer
    }

    /// The text of the correct option, or `None` if `answer` is out of range.
    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.answer).map(String::as_str)
    }
}


#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<Question>,
}


impl QuestionBank {
    /// Load a bank from a JSON file containing an array of questions.
    pub fn load(path: &Path) -> Result<QuestionBank> {
        if !path.exists() {
            return Err(EngineError::BankNotFound(path.to_path_buf()));
        }
        let data = fs::read_to_string(path)?;
        let questions: Vec<Question> = serde_json::from_str(&data)?;
        QuestionBank::from_questions(questions)
    }

    pub fn from_questions(questions: Vec<Question>) -> Result<QuestionBank> {
        let mut seen = HashSet::new();
        for q in questions.iter() {
            if !seen.insert(q.id) {
                return Err(EngineError::InvalidBank(format!("duplicate question id {}", q.id)));
            }
            if q.options.len() < 2 {
                return Err(EngineError::InvalidBank(
                    format!("question {} has fewer than two options", q.id)));
            }
            if q.answer >= q.options.len() {
                return Err(EngineError::InvalidBank(
                    format!("question {} has answer {} out of range", q.id, q.answer)));
            }
        }
        Ok(QuestionBank { questions })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn in_category(&self, category: Category) -> Vec<&Question> {
        self.questions.iter().filter(|q| q.category == category).collect()
    }

    pub fn count_by_category(&self) -> BTreeMap<Category, usize> {
        let mut counts = BTreeMap::new();
        for q in self.questions.iter() {
            *counts.entry(q.category).or_insert(0) += 1;
        }
        counts
    }
}
