//! `Database` trait — the persistence gateway used by the conversation core.
//!
//! Every record written through this trait is append-only. Callers on the
//! conversation path treat write failures as non-fatal; read failures are
//! surfaced to the user as a short apology.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::catalog::Course;
use crate::error::DatabaseError;

/// Who authored a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bot => "bot",
        }
    }

    /// Parse a role string from the DB. Unknown values are read as `Bot`.
    pub fn from_db(s: &str) -> Self {
        match s {
            "user" => Self::User,
            _ => Self::Bot,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One persisted message of a conversation.
#[derive(Debug, Clone)]
pub struct ConversationTurn {
    pub user_id: i64,
    pub role: Role,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A stored payment decision.
#[derive(Debug, Clone)]
pub struct Enrollment {
    pub user_id: i64,
    pub name: String,
    pub phone: String,
    pub course_name: String,
    pub paid: bool,
    pub quiz_score: u32,
    pub created_at: DateTime<Utc>,
}

/// Fields of an enrollment about to be written.
#[derive(Debug, Clone, Copy)]
pub struct NewEnrollment<'a> {
    pub user_id: i64,
    pub name: &'a str,
    pub phone: &'a str,
    pub course_name: &'a str,
    pub paid: bool,
    pub quiz_score: u32,
}

/// A free-text question asked outside the scripted flow.
#[derive(Debug, Clone)]
pub struct UserQuestion {
    pub user_id: i64,
    pub name: String,
    pub phone: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A finished placement quiz.
#[derive(Debug, Clone)]
pub struct QuizResult {
    pub user_id: i64,
    pub name: String,
    pub phone: String,
    pub score: u32,
    pub created_at: DateTime<Utc>,
}

/// Backend-agnostic persistence interface.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn init_schema(&self) -> Result<(), DatabaseError>;

    // ── Catalog ─────────────────────────────────────────────────────

    /// All courses in insertion order.
    async fn list_courses(&self) -> Result<Vec<Course>, DatabaseError>;

    /// Insert the given courses if the catalog is empty.
    /// Returns the number of courses inserted.
    async fn seed_courses(&self, courses: &[Course]) -> Result<usize, DatabaseError>;

    // ── Conversation turns ──────────────────────────────────────────

    /// Append one message to a user's history.
    async fn append_turn(&self, user_id: i64, role: Role, text: &str)
    -> Result<(), DatabaseError>;

    /// A user's history, oldest first.
    async fn list_history(&self, user_id: i64) -> Result<Vec<ConversationTurn>, DatabaseError>;

    // ── Quiz results ────────────────────────────────────────────────

    /// Record a finished quiz.
    async fn append_quiz_result(
        &self,
        user_id: i64,
        name: &str,
        phone: &str,
        score: u32,
    ) -> Result<(), DatabaseError>;

    /// A user's quiz results, oldest first.
    async fn list_quiz_results(&self, user_id: i64) -> Result<Vec<QuizResult>, DatabaseError>;

    // ── Enrollments ─────────────────────────────────────────────────

    /// Append a payment decision.
    async fn append_enrollment(&self, enrollment: &NewEnrollment<'_>)
    -> Result<(), DatabaseError>;

    /// All enrollments, oldest first.
    async fn list_enrollments(&self) -> Result<Vec<Enrollment>, DatabaseError>;

    /// The most recent decision of `user_id` for `course_name`, if any.
    async fn latest_enrollment(
        &self,
        user_id: i64,
        course_name: &str,
    ) -> Result<Option<Enrollment>, DatabaseError>;

    // ── Questions ───────────────────────────────────────────────────

    /// Store a free-text question.
    async fn append_question(
        &self,
        user_id: i64,
        name: &str,
        phone: &str,
        text: &str,
    ) -> Result<(), DatabaseError>;

    /// All stored questions, oldest first.
    async fn list_questions(&self) -> Result<Vec<UserQuestion>, DatabaseError>;
}
