//! Test doubles for the `Database` trait.

use async_trait::async_trait;

use crate::catalog::Course;
use crate::error::DatabaseError;
use crate::store::{
    ConversationTurn, Database, Enrollment, NewEnrollment, QuizResult, Role,
    UserQuestion,
};

/// A database whose every operation fails.
pub struct FailingDatabase;

fn unavailable<T>() -> Result<T, DatabaseError> {
    Err(DatabaseError::Query("database unavailable".into()))
}

#[async_trait]
impl Database for FailingDatabase {
    async fn init_schema(&self) -> Result<(), DatabaseError> {
        unavailable()
    }

    async fn list_courses(&self) -> Result<Vec<Course>, DatabaseError> {
        unavailable()
    }

    async fn seed_courses(&self, _courses: &[Course]) -> Result<usize, DatabaseError> {
        unavailable()
    }

    async fn append_turn(
        &self,
        _user_id: i64,
        _role: Role,
        _text: &str,
    ) -> Result<(), DatabaseError> {
        unavailable()
    }

    async fn list_history(&self, _user_id: i64) -> Result<Vec<ConversationTurn>, DatabaseError> {
        unavailable()
    }

    async fn append_quiz_result(
        &self,
        _user_id: i64,
        _name: &str,
        _phone: &str,
        _score: u32,
    ) -> Result<(), DatabaseError> {
        unavailable()
    }

    async fn list_quiz_results(&self, _user_id: i64) -> Result<Vec<QuizResult>, DatabaseError> {
        unavailable()
    }

    async fn append_enrollment(
        &self,
        _enrollment: &NewEnrollment<'_>,
    ) -> Result<(), DatabaseError> {
        unavailable()
    }

    async fn list_enrollments(&self) -> Result<Vec<Enrollment>, DatabaseError> {
        unavailable()
    }

    async fn latest_enrollment(
        &self,
        _user_id: i64,
        _course_name: &str,
    ) -> Result<Option<Enrollment>, DatabaseError> {
        unavailable()
    }

    async fn append_question(
        &self,
        _user_id: i64,
        _name: &str,
        _phone: &str,
        _text: &str,
    ) -> Result<(), DatabaseError> {
        unavailable()
    }

    async fn list_questions(&self) -> Result<Vec<UserQuestion>, DatabaseError> {
        unavailable()
    }
}
