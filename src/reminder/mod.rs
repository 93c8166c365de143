//! Reminder scheduler — deferred checks after a declined payment.
//!
//! A "нет" decision queues one `ReminderJob`. Jobs are plain data with a due
//! instant; a ticker task calls `run_due` periodically and each due job is
//! re-evaluated against the store and the live session before anything is
//! sent. A later payment does not remove the job: it only silences it when
//! the job comes due.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::{Mutex, mpsc};
use uuid::Uuid;

use crate::channels::OutgoingMessage;
use crate::session::SessionRegistry;
use crate::store::Database;

/// One scheduled reminder check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderJob {
    pub id: Uuid,
    pub user_id: i64,
    /// Course the user declined, by name.
    pub course_name: String,
    /// When the "нет" decision was made.
    pub decided_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
}

/// What a due job decided to say.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderKind {
    /// The declined course is still selected.
    Course(String),
    /// The user has moved on but is still browsing.
    Generic,
}

impl ReminderKind {
    pub fn render(&self) -> String {
        match self {
            Self::Course(name) => format!(
                "Напоминаем о курсе «{name}»: вы ещё не оплатили его. \
                 Напишите 'Выбрать курс', чтобы вернуться к выбору."
            ),
            Self::Generic => "Напоминаем: вы ещё не завершили выбор курса. \
                 Напишите 'Выбрать курс', чтобы продолжить."
                .to_string(),
        }
    }
}

/// Queue of pending reminder checks.
pub struct ReminderScheduler {
    delay: TimeDelta,
    jobs: Mutex<Vec<ReminderJob>>,
    db: Arc<dyn Database>,
    sessions: Arc<SessionRegistry>,
    notify_tx: mpsc::Sender<OutgoingMessage>,
}

impl ReminderScheduler {
    pub fn new(
        delay: Duration,
        db: Arc<dyn Database>,
        sessions: Arc<SessionRegistry>,
        notify_tx: mpsc::Sender<OutgoingMessage>,
    ) -> Self {
        Self {
            delay: TimeDelta::from_std(delay).unwrap_or(TimeDelta::MAX),
            jobs: Mutex::new(Vec::new()),
            db,
            sessions,
            notify_tx,
        }
    }

    /// Queue a check for `(user_id, course_name)` one delay after
    /// `decided_at`. Repeated declines queue independent jobs.
    pub async fn schedule(
        &self,
        user_id: i64,
        course_name: &str,
        decided_at: DateTime<Utc>,
    ) -> Uuid {
        let due_at = decided_at
            .checked_add_signed(self.delay)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let job = ReminderJob {
            id: Uuid::new_v4(),
            user_id,
            course_name: course_name.to_string(),
            decided_at,
            due_at,
        };
        let id = job.id;

        tracing::info!(
            user_id,
            course = %job.course_name,
            due_at = %job.due_at,
            job_id = %id,
            "Reminder scheduled"
        );
        self.jobs.lock().await.push(job);
        id
    }

    /// Drop a pending job. Returns `false` if it already ran or never existed.
    pub async fn cancel(&self, id: Uuid) -> bool {
        let mut jobs = self.jobs.lock().await;
        let before = jobs.len();
        jobs.retain(|j| j.id != id);
        let removed = jobs.len() != before;
        if removed {
            tracing::debug!(job_id = %id, "Reminder cancelled");
        }
        removed
    }

    /// Number of jobs not yet run.
    pub async fn pending(&self) -> usize {
        self.jobs.lock().await.len()
    }

    /// Snapshot of pending jobs in scheduling order.
    pub async fn jobs(&self) -> Vec<ReminderJob> {
        self.jobs.lock().await.clone()
    }

    /// Run every job due at or before `now`. Returns how many reminders
    /// were sent.
    pub async fn run_due(&self, now: DateTime<Utc>) -> usize {
        let due: Vec<ReminderJob> = {
            let mut jobs = self.jobs.lock().await;
            let (due, rest): (Vec<_>, Vec<_>) = jobs.drain(..).partition(|j| j.due_at <= now);
            *jobs = rest;
            due
        };

        let mut sent = 0;
        for job in due {
            let Some(kind) = self.evaluate(&job).await else {
                continue;
            };
            let message = OutgoingMessage::new(job.user_id, kind.render());
            if self.notify_tx.send(message).await.is_err() {
                tracing::warn!(user_id = job.user_id, "Reminder dropped: run loop closed");
                continue;
            }
            sent += 1;
        }
        sent
    }

    /// Decide what, if anything, a due job should say.
    async fn evaluate(&self, job: &ReminderJob) -> Option<ReminderKind> {
        match self.db.latest_enrollment(job.user_id, &job.course_name).await {
            Ok(Some(latest)) if latest.paid => {
                tracing::debug!(user_id = job.user_id, course = %job.course_name, "Course paid, reminder skipped");
                return None;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(user_id = job.user_id, course = %job.course_name, "Reminder check failed: {e}");
                return None;
            }
        }

        let handle = self.sessions.get(job.user_id).await?;
        let state = handle.lock().await;

        if state.selected_course.as_deref() == Some(job.course_name.as_str()) {
            Some(ReminderKind::Course(job.course_name.clone()))
        } else if state.step.accepts_generic_reminder() {
            Some(ReminderKind::Generic)
        } else {
            tracing::debug!(user_id = job.user_id, step = %state.step, "Reminder not applicable");
            None
        }
    }
}

/// Spawn a background task that runs due reminders every `interval`.
pub fn spawn_reminder_ticker(
    scheduler: Arc<ReminderScheduler>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // Skip immediate first tick
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let sent = scheduler.run_due(Utc::now()).await;
            if sent > 0 {
                tracing::info!(sent, "Reminders sent");
            }
        }
    })
}
