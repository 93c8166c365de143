use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use course_bot::app::App;
use course_bot::bot::CourseBot;
use course_bot::catalog::{Catalog, default_courses};
use course_bot::channels::{Channel, CliChannel, TelegramChannel};
use course_bot::config::BotConfig;
use course_bot::reminder::ReminderScheduler;
use course_bot::session::SessionRegistry;
use course_bot::store::{Database, LibSqlBackend};

/// Capacity of the reminder → run loop queue.
const REMINDER_QUEUE: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = BotConfig::from_env().context("Invalid configuration")?;
    let _log_guard = init_tracing(config.log_dir.as_deref());

    eprintln!("🎓 {} v{}", config.name, env!("CARGO_PKG_VERSION"));
    eprintln!("   Database: {}", config.db_path.display());
    eprintln!("   Reminder delay: {}s", config.reminder_delay.as_secs());

    let db: Arc<dyn Database> = Arc::new(
        LibSqlBackend::new_local(&config.db_path)
            .await
            .context("Failed to open database")?,
    );
    db.seed_courses(&default_courses())
        .await
        .context("Failed to seed course catalog")?;
    let catalog = Catalog::load(db.as_ref())
        .await
        .context("Failed to load course catalog")?;

    let sessions = SessionRegistry::new();
    let (notify_tx, notify_rx) = mpsc::channel(REMINDER_QUEUE);
    let reminders = Arc::new(ReminderScheduler::new(
        config.reminder_delay,
        Arc::clone(&db),
        Arc::clone(&sessions),
        notify_tx,
    ));
    let bot = CourseBot::new(catalog, db, sessions, reminders);

    let channel: Arc<dyn Channel> = match config.telegram.clone() {
        Some(telegram) => {
            eprintln!("   Channel: telegram");
            Arc::new(TelegramChannel::new(telegram))
        }
        None => {
            eprintln!("   Channel: cli (set TELEGRAM_BOT_TOKEN for Telegram)");
            eprintln!("   Type a message and press Enter. Ctrl+C to exit.\n");
            Arc::new(CliChannel::new())
        }
    };

    App::new(bot, channel, notify_rx, config.reminder_tick)
        .run()
        .await?;

    Ok(())
}

/// Console logging, plus a daily-rolling file when `log_dir` is set.
/// The returned guard must stay alive for file output to be flushed.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "course-bot.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(file_layer)
        .init();

    guard
}
