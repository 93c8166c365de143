//! Placement quiz — fixed question bank, answer parsing, scoring and
//! recommendation tiers.

pub mod questions;

use serde::{Deserialize, Serialize};

use crate::catalog::Course;

pub use questions::{QUESTION_BANK, QuizQuestion};

/// Number of options every question offers.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// Coarse skill level derived from the quiz score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Beginner,
    Intermediate,
    Advanced,
}

impl Tier {
    /// Score ≤ 3 → Beginner, ≤ 7 → Intermediate, otherwise Advanced.
    pub fn from_score(score: u32) -> Self {
        match score {
            0..=3 => Self::Beginner,
            4..=7 => Self::Intermediate,
            _ => Self::Advanced,
        }
    }

    /// Canonical label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
        }
    }

    /// Label shown to users.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Beginner => "Начальный",
            Self::Intermediate => "Средний",
            Self::Advanced => "Продвинутый",
        }
    }

    /// Whether a course level label names this tier. Case-insensitive; the
    /// English and Russian labels are both accepted.
    pub fn matches_level(&self, level: &str) -> bool {
        let level = level.trim().to_lowercase();
        level == self.label().to_lowercase() || level == self.display_name().to_lowercase()
    }

    /// Catalog courses for this tier, in catalog order.
    pub fn recommend<'a>(&self, courses: &'a [Course]) -> Vec<&'a Course> {
        courses
            .iter()
            .filter(|c| self.matches_level(&c.level))
            .collect()
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Parse an answer into a 0-based option index. Only `1`..=`4` are accepted.
pub fn parse_answer(text: &str) -> Option<usize> {
    let n: usize = text.trim().parse().ok()?;
    (1..=OPTIONS_PER_QUESTION).contains(&n).then(|| n - 1)
}

/// Outcome of feeding one answer to the quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Input was not an option number; nothing changed.
    Rejected,
    /// Answer recorded; `index` is the next question to present.
    Next { index: usize },
    /// Answer recorded and the bank is exhausted.
    Finished { score: u32 },
}

/// Quiz progress of one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizProgress {
    /// Index of the question currently presented. In `0..=bank length`.
    pub index: usize,
    /// Correct answers so far. Never exceeds `index`.
    pub score: u32,
    pub active: bool,
}

impl QuizProgress {
    /// Reset and activate.
    pub fn start(&mut self) {
        *self = Self {
            index: 0,
            score: 0,
            active: true,
        };
    }

    /// The question currently presented, if the quiz is running.
    pub fn current(&self) -> Option<&'static QuizQuestion> {
        if !self.active {
            return None;
        }
        QUESTION_BANK.get(self.index)
    }

    /// Score the answer to the current question and advance.
    pub fn answer(&mut self, text: &str) -> AnswerOutcome {
        let Some(question) = self.current() else {
            return AnswerOutcome::Rejected;
        };
        let Some(choice) = parse_answer(text) else {
            return AnswerOutcome::Rejected;
        };

        if question.is_correct(choice) {
            self.score += 1;
        }
        self.index += 1;

        if self.index >= QUESTION_BANK.len() {
            self.active = false;
            AnswerOutcome::Finished { score: self.score }
        } else {
            AnswerOutcome::Next { index: self.index }
        }
    }
}

/// Render question `index` (0-based) with numbered options.
pub fn render_question(index: usize) -> Option<String> {
    let question = QUESTION_BANK.get(index)?;
    let mut out = format!(
        "Вопрос {}/{}: {}\n\n",
        index + 1,
        QUESTION_BANK.len(),
        question.question
    );
    for (i, option) in question.options.iter().enumerate() {
        out.push_str(&format!("{}) {}\n", i + 1, option));
    }
    out.push_str("\nОтветьте номером варианта (1-4).");
    Some(out)
}

/// Result announcement followed by the recommended courses for the tier.
pub fn render_result(score: u32, courses: &[Course]) -> String {
    let tier = Tier::from_score(score);
    let mut out = format!(
        "Тест завершён! Ваш результат: {score} из {}.\nРекомендуемый уровень: {}.\n\n",
        QUESTION_BANK.len(),
        tier.display_name()
    );

    let recommended = tier.recommend(courses);
    if recommended.is_empty() {
        out.push_str("К сожалению, курсов для этого уровня пока нет.\n");
    } else {
        out.push_str("Рекомендуемые курсы:\n");
        for (i, course) in recommended.iter().enumerate() {
            out.push_str(&format!(
                "{}) {} — {}, {}₽\n",
                i + 1,
                course.name,
                course.teacher,
                course.price_display()
            ));
        }
    }
    out.push_str("\nНапишите 'Выбрать курс', чтобы выбрать курс.");
    out
}
