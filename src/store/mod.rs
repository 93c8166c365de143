//! Persistence layer — libSQL-backed storage for the catalog, conversation
//! history, quiz results, enrollments and user questions.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::{
    ConversationTurn, Database, Enrollment, NewEnrollment, QuizResult, Role,
    UserQuestion,
};

#[cfg(test)]
pub(crate) mod testing;
