//! Run loop — wires the transport, the conversation core and reminders.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;

use crate::bot::CourseBot;
use crate::channels::{Channel, OutgoingMessage};
use crate::error::Error;
use crate::reminder::spawn_reminder_ticker;

/// The running bot.
pub struct App {
    bot: CourseBot,
    channel: Arc<dyn Channel>,
    /// Reminders emitted by the scheduler.
    notify_rx: mpsc::Receiver<OutgoingMessage>,
    reminder_tick: Duration,
}

impl App {
    pub fn new(
        bot: CourseBot,
        channel: Arc<dyn Channel>,
        notify_rx: mpsc::Receiver<OutgoingMessage>,
        reminder_tick: Duration,
    ) -> Self {
        Self {
            bot,
            channel,
            notify_rx,
            reminder_tick,
        }
    }

    /// Run until Ctrl+C or until the inbound stream ends.
    ///
    /// Inbound messages are handled strictly one at a time, in arrival order.
    pub async fn run(self) -> Result<(), Error> {
        let Self {
            bot,
            channel,
            mut notify_rx,
            reminder_tick,
        } = self;

        if let Err(e) = channel.health_check().await {
            tracing::warn!(channel = channel.name(), "Health check failed: {e}");
        }
        let mut message_stream = channel.start().await?;

        let ticker = spawn_reminder_ticker(Arc::clone(bot.reminders()), reminder_tick);

        tracing::info!(
            channel = channel.name(),
            courses = bot.catalog().len(),
            "Course bot ready and listening"
        );

        loop {
            tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl+C received, shutting down...");
                    break;
                }
                Some(reminder) = notify_rx.recv() => {
                    deliver(channel.as_ref(), &reminder).await;
                }
                msg = message_stream.next() => {
                    let Some(message) = msg else {
                        tracing::info!("Inbound stream ended, shutting down...");
                        break;
                    };
                    tracing::debug!(
                        user_id = message.user_id,
                        chars = message.text.chars().count(),
                        "Received message"
                    );
                    for reply in bot.handle(&message).await {
                        deliver(channel.as_ref(), &reply).await;
                    }
                }
            }
        }

        ticker.abort();
        channel.shutdown().await?;
        Ok(())
    }
}

/// Send one unit. Failures are logged and not retried.
async fn deliver(channel: &dyn Channel, message: &OutgoingMessage) {
    if let Err(e) = channel.send(message).await {
        tracing::warn!(
            channel = channel.name(),
            user_id = message.user_id,
            "Failed to send message: {e}"
        );
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use super::*;
    use crate::catalog::{Catalog, default_courses};
    use crate::channels::{IncomingMessage, MessageStream};
    use crate::error::ChannelError;
    use crate::reminder::ReminderScheduler;
    use crate::session::SessionRegistry;
    use crate::store::{Database, LibSqlBackend};

    /// Channel that replays a fixed script and records what was sent.
    struct ScriptedChannel {
        script: Vec<IncomingMessage>,
        sent: Mutex<Vec<OutgoingMessage>>,
        fail_sends_to: Option<i64>,
    }

    #[async_trait]
    impl Channel for ScriptedChannel {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn start(&self) -> Result<MessageStream, ChannelError> {
            Ok(Box::pin(futures::stream::iter(self.script.clone())))
        }

        async fn send(&self, message: &OutgoingMessage) -> Result<(), ChannelError> {
            if self.fail_sends_to == Some(message.user_id) {
                return Err(ChannelError::SendFailed {
                    name: "scripted".into(),
                    reason: "unreachable".into(),
                });
            }
            self.sent.lock().await.push(message.clone());
            Ok(())
        }

        async fn health_check(&self) -> Result<(), ChannelError> {
            Ok(())
        }

        async fn shutdown(&self) -> Result<(), ChannelError> {
            Ok(())
        }
    }

    async fn app_with(
        script: Vec<IncomingMessage>,
        fail_sends_to: Option<i64>,
    ) -> (App, Arc<ScriptedChannel>, mpsc::Sender<OutgoingMessage>) {
        let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let sessions = SessionRegistry::new();
        let (tx, rx) = mpsc::channel(16);
        let reminders = Arc::new(ReminderScheduler::new(
            Duration::from_secs(60),
            Arc::clone(&db),
            Arc::clone(&sessions),
            tx.clone(),
        ));
        let bot = CourseBot::new(Catalog::new(default_courses()), db, sessions, reminders);
        let channel = Arc::new(ScriptedChannel {
            script,
            sent: Mutex::new(Vec::new()),
            fail_sends_to,
        });
        let app = App::new(bot, channel.clone(), rx, Duration::from_secs(3600));
        (app, channel, tx)
    }

    #[tokio::test]
    async fn replies_in_arrival_order_and_stops_at_end_of_stream() {
        let script = vec![IncomingMessage::new(1, "Ann"), IncomingMessage::new(2, "Bob")];
        let (app, channel, _tx) = app_with(script, None).await;

        app.run().await.unwrap();

        let sent = channel.sent.lock().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].user_id, 1);
        assert!(sent[0].text.contains("Ann"));
        assert_eq!(sent[1].user_id, 2);
        assert!(sent[1].text.contains("Bob"));
    }

    #[tokio::test]
    async fn queued_reminders_are_delivered() {
        let (app, channel, tx) = app_with(vec![IncomingMessage::new(1, "Ann")], None).await;
        tx.send(OutgoingMessage::new(9, "напоминание")).await.unwrap();

        app.run().await.unwrap();

        let sent = channel.sent.lock().await;
        assert_eq!(sent[0], OutgoingMessage::new(9, "напоминание"));
        assert_eq!(sent[1].user_id, 1);
    }

    #[tokio::test]
    async fn send_failure_does_not_affect_other_users() {
        let script = vec![IncomingMessage::new(1, "Ann"), IncomingMessage::new(2, "Bob")];
        let (app, channel, _tx) = app_with(script, Some(1)).await;

        app.run().await.unwrap();

        let sent = channel.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].user_id, 2);
    }
}
