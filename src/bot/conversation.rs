//! `CourseBot` — consumes one inbound message and produces its replies.
//!
//! Each message locks the sender's session for the whole step, so the
//! reminder scheduler never observes a half-applied transition. Commands
//! are answered without touching the session; everything else runs the
//! step handler and records the user/bot turn pair.

use std::sync::Arc;

use crate::bot::command::Command;
use crate::bot::render;
use crate::catalog::Catalog;
use crate::channels::{IncomingMessage, OutgoingMessage};
use crate::quiz::{self, AnswerOutcome};
use crate::reminder::ReminderScheduler;
use crate::session::{SessionRegistry, SessionState, Step};
use crate::store::{Database, NewEnrollment, Role};

/// Telegram's conventional first message.
const START_COMMAND: &str = "/start";

/// Phrase that opens course selection (case-insensitive).
const SELECT_COURSE: &str = "выбрать курс";

const CONFIRM_YES: &str = "да";
const CONFIRM_NO: &str = "нет";

/// The conversation state machine.
pub struct CourseBot {
    catalog: Catalog,
    db: Arc<dyn Database>,
    sessions: Arc<SessionRegistry>,
    reminders: Arc<ReminderScheduler>,
}

impl CourseBot {
    pub fn new(
        catalog: Catalog,
        db: Arc<dyn Database>,
        sessions: Arc<SessionRegistry>,
        reminders: Arc<ReminderScheduler>,
    ) -> Self {
        Self {
            catalog,
            db,
            sessions,
            reminders,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    pub fn reminders(&self) -> &Arc<ReminderScheduler> {
        &self.reminders
    }

    /// Process one inbound message. Replies are returned in send order,
    /// already split into transport-sized units.
    pub async fn handle(&self, message: &IncomingMessage) -> Vec<OutgoingMessage> {
        let user_id = message.user_id;
        let handle = self.sessions.get_or_create(user_id).await;
        let mut state = handle.lock().await;

        if !state.step.is_onboarding() {
            if let Some(command) = Command::parse(&message.text) {
                tracing::debug!(user_id, ?command, "Command received");
                let name = state.name_or_empty().to_string();
                let phone = state.phone_or_empty().to_string();
                drop(state);
                let reply = self.run_command(command, user_id, &name, &phone).await;
                return OutgoingMessage::chunked(user_id, &reply);
            }
        }

        let from = state.step;
        let replies = self.advance(&mut state, message).await;
        if state.step != from {
            tracing::debug!(user_id, from = %from, to = %state.step, "Step changed");
        }
        drop(state);

        self.record_turns(user_id, &message.text, &replies).await;

        replies
            .iter()
            .flat_map(|text| OutgoingMessage::chunked(user_id, text))
            .collect()
    }

    // ── Step handlers ───────────────────────────────────────────────

    async fn advance(&self, state: &mut SessionState, message: &IncomingMessage) -> Vec<String> {
        let text = message.text.trim();
        match state.step {
            Step::New => self.on_new(state, text),
            Step::AwaitingPhone => self.on_phone(state, text),
            Step::TakingQuiz => self.on_quiz_answer(state, message.user_id, text).await,
            Step::Idle => self.on_idle(state, text),
            Step::AwaitingCourseSelection => self.on_course_selection(state, text),
            Step::AwaitingPaymentConfirmation => {
                self.on_payment_confirmation(state, message).await
            }
            Step::PaymentSuccessful => {
                state.move_to(Step::Idle);
                vec![render::RESTART_SELECTION.to_string()]
            }
        }
    }

    fn on_new(&self, state: &mut SessionState, text: &str) -> Vec<String> {
        if text == START_COMMAND {
            return vec![render::WELCOME.to_string()];
        }
        state.name = Some(text.to_string());
        state.move_to(Step::AwaitingPhone);
        vec![render::ask_phone(text)]
    }

    fn on_phone(&self, state: &mut SessionState, text: &str) -> Vec<String> {
        state.phone = Some(text.to_string());
        state.quiz.start();
        state.move_to(Step::TakingQuiz);
        vec![render::QUIZ_INTRO.to_string(), question_text(0)]
    }

    async fn on_quiz_answer(
        &self,
        state: &mut SessionState,
        user_id: i64,
        text: &str,
    ) -> Vec<String> {
        if state.quiz.current().is_none() {
            tracing::warn!(user_id, "Quiz step without a running quiz, restarting");
            state.quiz.start();
            return vec![question_text(0)];
        }

        match state.quiz.answer(text) {
            AnswerOutcome::Rejected => vec![format!(
                "{}\n\n{}",
                render::QUIZ_RETRY,
                question_text(state.quiz.index)
            )],
            AnswerOutcome::Next { index } => vec![question_text(index)],
            AnswerOutcome::Finished { score } => {
                tracing::info!(user_id, score, "Quiz finished");
                if let Err(e) = self
                    .db
                    .append_quiz_result(user_id, state.name_or_empty(), state.phone_or_empty(), score)
                    .await
                {
                    tracing::warn!(user_id, "Failed to persist quiz result: {e}");
                }
                state.move_to(Step::Idle);
                vec![quiz::render_result(score, self.catalog.list_courses())]
            }
        }
    }

    fn on_idle(&self, state: &mut SessionState, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        if lower == SELECT_COURSE {
            if !self.catalog.is_empty() {
                state.move_to(Step::AwaitingCourseSelection);
            }
            return vec![self.catalog.render_selection()];
        }
        if lower.contains("как дела") {
            return vec![render::SMALL_TALK.to_string()];
        }
        vec![render::GREETING.to_string()]
    }

    fn on_course_selection(&self, state: &mut SessionState, text: &str) -> Vec<String> {
        let course = text
            .parse::<usize>()
            .ok()
            .and_then(|n| self.catalog.get(n));
        let Some(course) = course else {
            return vec![render::INVALID_COURSE_NUMBER.to_string()];
        };

        state.selected_course = Some(course.name.clone());
        state.move_to(Step::AwaitingPaymentConfirmation);
        vec![render::course_selected(course)]
    }

    async fn on_payment_confirmation(
        &self,
        state: &mut SessionState,
        message: &IncomingMessage,
    ) -> Vec<String> {
        let user_id = message.user_id;
        let answer = message.text.trim().to_lowercase();
        let paid = match answer.as_str() {
            CONFIRM_YES => true,
            CONFIRM_NO => false,
            _ => return vec![render::CONFIRM_RETRY.to_string()],
        };

        let Some(course_name) = state.selected_course.clone() else {
            tracing::warn!(user_id, "Payment answer without a selected course");
            state.move_to(Step::Idle);
            return vec![render::NO_COURSE_SELECTED.to_string()];
        };

        let enrollment = NewEnrollment {
            user_id,
            name: state.name_or_empty(),
            phone: state.phone_or_empty(),
            course_name: &course_name,
            paid,
            quiz_score: state.quiz.score,
        };
        if let Err(e) = self.db.append_enrollment(&enrollment).await {
            tracing::warn!(user_id, course = %course_name, "Failed to persist enrollment: {e}");
        }

        if paid {
            tracing::info!(user_id, course = %course_name, "Payment confirmed");
            state.move_to(Step::PaymentSuccessful);
            vec![render::PAYMENT_ACCEPTED.to_string()]
        } else {
            tracing::info!(user_id, course = %course_name, "Payment declined");
            self.reminders
                .schedule(user_id, &course_name, message.received_at)
                .await;
            state.move_to(Step::Idle);
            vec![render::PAYMENT_DECLINED.to_string()]
        }
    }

    // ── Commands ────────────────────────────────────────────────────

    async fn run_command(&self, command: Command, user_id: i64, name: &str, phone: &str) -> String {
        match command {
            Command::Courses => self.catalog.render_overview(),
            Command::Teachers => self.catalog.render_teachers(),
            Command::Schedule => self.catalog.render_schedule(),
            Command::History => match self.db.list_history(user_id).await {
                Ok(turns) => render::history(&turns),
                Err(e) => {
                    tracing::warn!(user_id, "Failed to load history: {e}");
                    render::READ_FAILED.to_string()
                }
            },
            Command::Enrollments => match self.db.list_enrollments().await {
                Ok(all) => {
                    let own: Vec<_> = all.iter().filter(|e| e.user_id == user_id).collect();
                    render::enrollments(&own)
                }
                Err(e) => {
                    tracing::warn!(user_id, "Failed to load enrollments: {e}");
                    render::READ_FAILED.to_string()
                }
            },
            Command::Ask(question) if question.is_empty() => render::ASK_USAGE.to_string(),
            Command::Ask(question) => {
                match self.db.append_question(user_id, name, phone, &question).await {
                    Ok(()) => {
                        tracing::info!(user_id, "Question stored");
                        render::ASK_ACCEPTED.to_string()
                    }
                    Err(e) => {
                        tracing::warn!(user_id, "Failed to store question: {e}");
                        render::ASK_FAILED.to_string()
                    }
                }
            }
        }
    }

    // ── Persistence ─────────────────────────────────────────────────

    /// Record the inbound text and the joined reply as two turns.
    async fn record_turns(&self, user_id: i64, inbound: &str, replies: &[String]) {
        if let Err(e) = self.db.append_turn(user_id, Role::User, inbound).await {
            tracing::warn!(user_id, "Failed to persist user turn: {e}");
        }
        let outbound = replies.join("\n\n");
        if let Err(e) = self.db.append_turn(user_id, Role::Bot, &outbound).await {
            tracing::warn!(user_id, "Failed to persist bot turn: {e}");
        }
    }
}

fn question_text(index: usize) -> String {
    quiz::render_question(index).unwrap_or_default()
}
