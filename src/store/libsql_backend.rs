//! libSQL backend — async `Database` trait implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use rust_decimal::Decimal;
use tracing::info;

use crate::catalog::Course;
use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::{
    ConversationTurn, Database, Enrollment, NewEnrollment, QuizResult, Role, UserQuestion,
};

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.init_schema().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.init_schema().await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Canonical timestamp format. Fixed width, so lexical order is time order.
fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn row_to_course(row: &libsql::Row) -> Result<Course, DatabaseError> {
    let price_str: String = row
        .get(5)
        .map_err(|e| DatabaseError::Query(format!("courses.price: {e}")))?;
    let price = Decimal::from_str(&price_str).map_err(|e| {
        DatabaseError::Serialization(format!("Invalid course price {price_str:?}: {e}"))
    })?;
    let text = |idx: i32| -> Result<String, DatabaseError> {
        row.get::<String>(idx)
            .map_err(|e| DatabaseError::Query(format!("courses column {idx}: {e}")))
    };
    Ok(Course {
        name: text(0)?,
        level: text(1)?,
        teacher: text(2)?,
        schedule: text(3)?,
        description: text(4)?,
        price,
    })
}

/// Column order matches ENROLLMENT_COLUMNS.
fn row_to_enrollment(row: &libsql::Row) -> Result<Enrollment, DatabaseError> {
    let map = |e: libsql::Error| DatabaseError::Query(format!("enrollments row: {e}"));
    let paid: i64 = row.get(4).map_err(map)?;
    let score: i64 = row.get(5).map_err(map)?;
    let created_str: String = row.get(6).map_err(map)?;
    Ok(Enrollment {
        user_id: row.get(0).map_err(map)?,
        name: row.get(1).map_err(map)?,
        phone: row.get(2).map_err(map)?,
        course_name: row.get(3).map_err(map)?,
        paid: paid != 0,
        quiz_score: u32::try_from(score).unwrap_or(0),
        created_at: parse_datetime(&created_str),
    })
}

const COURSE_COLUMNS: &str = "name, level, teacher, schedule, description, price";

const ENROLLMENT_COLUMNS: &str =
    "user_id, name, phone, course_name, is_paid, quiz_score, created_at";

// ── Trait implementation ────────────────────────────────────────────

#[async_trait]
impl Database for LibSqlBackend {
    async fn init_schema(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    // ── Catalog ─────────────────────────────────────────────────────

    async fn list_courses(&self) -> Result<Vec<Course>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {COURSE_COLUMNS} FROM courses ORDER BY id ASC"),
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_courses: {e}")))?;

        let mut courses = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_courses: {e}")))?
        {
            courses.push(row_to_course(&row)?);
        }
        Ok(courses)
    }

    async fn seed_courses(&self, courses: &[Course]) -> Result<usize, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query("SELECT COUNT(*) FROM courses", ())
            .await
            .map_err(|e| DatabaseError::Query(format!("seed_courses: {e}")))?;
        let existing: i64 = match rows.next().await {
            Ok(Some(row)) => row.get(0).unwrap_or(0),
            _ => 0,
        };
        if existing > 0 {
            return Ok(0);
        }

        for course in courses {
            conn.execute(
                &format!("INSERT INTO courses ({COURSE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
                params![
                    course.name.as_str(),
                    course.level.as_str(),
                    course.teacher.as_str(),
                    course.schedule.as_str(),
                    course.description.as_str(),
                    course.price.to_string(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("seed_courses: {e}")))?;
        }
        info!(count = courses.len(), "Seeded course catalog");
        Ok(courses.len())
    }

    // ── Conversation turns ──────────────────────────────────────────

    async fn append_turn(
        &self,
        user_id: i64,
        role: Role,
        text: &str,
    ) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO conversation_turns (user_id, role, message, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![user_id, role.as_str(), text, now_timestamp()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("append_turn: {e}")))?;
        Ok(())
    }

    async fn list_history(&self, user_id: i64) -> Result<Vec<ConversationTurn>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT role, message, created_at FROM conversation_turns
                 WHERE user_id = ?1 ORDER BY created_at ASC, id ASC",
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_history: {e}")))?;

        let mut turns = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_history: {e}")))?
        {
            let role: String = row.get(0).unwrap_or_default();
            let text: String = row.get(1).unwrap_or_default();
            let created_str: String = row.get(2).unwrap_or_default();
            turns.push(ConversationTurn {
                user_id,
                role: Role::from_db(&role),
                text,
                created_at: parse_datetime(&created_str),
            });
        }
        Ok(turns)
    }

    // ── Quiz results ────────────────────────────────────────────────

    async fn append_quiz_result(
        &self,
        user_id: i64,
        name: &str,
        phone: &str,
        score: u32,
    ) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO quiz_results (user_id, name, phone, score, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![user_id, name, phone, i64::from(score), now_timestamp()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("append_quiz_result: {e}")))?;
        Ok(())
    }

    async fn list_quiz_results(&self, user_id: i64) -> Result<Vec<QuizResult>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT name, phone, score, created_at FROM quiz_results
                 WHERE user_id = ?1 ORDER BY created_at ASC, id ASC",
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_quiz_results: {e}")))?;

        let mut results = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_quiz_results: {e}")))?
        {
            let score: i64 = row.get(2).unwrap_or_default();
            let created_str: String = row.get(3).unwrap_or_default();
            results.push(QuizResult {
                user_id,
                name: row.get(0).unwrap_or_default(),
                phone: row.get(1).unwrap_or_default(),
                score: u32::try_from(score).unwrap_or(0),
                created_at: parse_datetime(&created_str),
            });
        }
        Ok(results)
    }

    // ── Enrollments ─────────────────────────────────────────────────

    async fn append_enrollment(
        &self,
        enrollment: &NewEnrollment<'_>,
    ) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO enrollments
                    (user_id, name, phone, course_name, is_paid, quiz_score, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    enrollment.user_id,
                    enrollment.name,
                    enrollment.phone,
                    enrollment.course_name,
                    i64::from(enrollment.paid),
                    i64::from(enrollment.quiz_score),
                    now_timestamp(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("append_enrollment: {e}")))?;
        Ok(())
    }

    async fn list_enrollments(&self) -> Result<Vec<Enrollment>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {ENROLLMENT_COLUMNS} FROM enrollments ORDER BY created_at ASC, id ASC"),
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_enrollments: {e}")))?;

        let mut enrollments = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_enrollments: {e}")))?
        {
            enrollments.push(row_to_enrollment(&row)?);
        }
        Ok(enrollments)
    }

    async fn latest_enrollment(
        &self,
        user_id: i64,
        course_name: &str,
    ) -> Result<Option<Enrollment>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {ENROLLMENT_COLUMNS} FROM enrollments
                     WHERE user_id = ?1 AND course_name = ?2
                     ORDER BY created_at DESC, id DESC LIMIT 1"
                ),
                params![user_id, course_name],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("latest_enrollment: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_enrollment(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("latest_enrollment: {e}"))),
        }
    }

    // ── Questions ───────────────────────────────────────────────────

    async fn append_question(
        &self,
        user_id: i64,
        name: &str,
        phone: &str,
        text: &str,
    ) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO user_questions (user_id, name, phone, question, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![user_id, name, phone, text, now_timestamp()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("append_question: {e}")))?;
        Ok(())
    }

    async fn list_questions(&self) -> Result<Vec<UserQuestion>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT user_id, name, phone, question, created_at FROM user_questions
                 ORDER BY created_at ASC, id ASC",
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_questions: {e}")))?;

        let mut questions = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_questions: {e}")))?
        {
            let created_str: String = row.get(4).unwrap_or_default();
            questions.push(UserQuestion {
                user_id: row.get(0).unwrap_or_default(),
                name: row.get(1).unwrap_or_default(),
                phone: row.get(2).unwrap_or_default(),
                text: row.get(3).unwrap_or_default(),
                created_at: parse_datetime(&created_str),
            });
        }
        Ok(questions)
    }
}
