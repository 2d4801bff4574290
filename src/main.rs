//! Symptom chat - terminal client for a conversational health assessment
//!
//! Talks to a remote assessment engine over HTTP, one turn at a time, and
//! keeps the local session state the conversation needs.

mod config;
mod engine;
mod runtime;
mod session;
mod terminal;

use config::AppConfig;
use engine::{HttpEngine, LoggingEngine};
use runtime::ProductionController;
use session::UserAction;
use std::sync::Arc;
use terminal::TerminalPresenter;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so they never interleave with the conversation
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "symptom_chat=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(
        engine_url = %config.engine_url,
        timeout_secs = ?config.request_timeout.map(|t| t.as_secs()),
        allow_backtrack = config.allow_backtrack,
        "Configuration loaded"
    );

    let engine = LoggingEngine::new(HttpEngine::new(
        &config.engine_url,
        config.request_timeout,
    )?);
    let presenter = Arc::new(TerminalPresenter::stdout());
    let controller: Arc<ProductionController> = Arc::new(
        ProductionController::new(engine, Arc::clone(&presenter), config.allow_backtrack)
            .with_share_base_url(&config.share_base_url),
    );

    let (actions, inbox) = mpsc::channel(16);
    let run = tokio::spawn(Arc::clone(&controller).run(inbox));

    presenter.print_help();
    actions.send(UserAction::Start).await?;

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    terminal::read_commands(stdin, &presenter, &actions).await?;

    drop(actions);
    run.await?;

    let session = controller.snapshot();
    tracing::info!(
        session_id = ?session.session_id(),
        completed = session.is_completed(),
        flow = ?session.flow(),
        active_symptom = ?session.active_symptom(),
        checkpoints = session.history().len(),
        transcript_entries = session.transcript().len(),
        "Session closed"
    );
    Ok(())
}
