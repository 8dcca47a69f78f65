pub mod cli;
pub mod repl;
pub mod store;

use std::io;

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use study_core::store::AttemptStore;
use study_core::{ChunkedScheduler, ShortAnswerMatcher, StudySession};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Args;
use crate::store::JsonFileStore;

pub fn run() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();

    let content = std::fs::read_to_string(&args.deck)
        .with_context(|| format!("failed to read deck {}", args.deck.display()))?;
    let cards = study_core::parse(&content)
        .with_context(|| format!("failed to parse deck {}", args.deck.display()))?;

    let data_dir = args.data_dir();
    let mut store = JsonFileStore::open(&data_dir)
        .with_context(|| format!("failed to open store in {}", data_dir.display()))?;

    let settings = store
        .load_preferences(&args.user, args.set_id)?
        .unwrap_or_default()
        .merge(&args.settings_update());
    let history = store.load_attempts(args.set_id)?;
    tracing::info!(
        cards = cards.len(),
        attempts = history.len(),
        store = %store.path().display(),
        "loaded practice data"
    );

    let (scheduler_rng, session_rng) = match args.seed {
        Some(seed) => (
            StdRng::seed_from_u64(seed),
            StdRng::seed_from_u64(seed.wrapping_add(1)),
        ),
        None => (StdRng::from_entropy(), StdRng::from_entropy()),
    };
    let mut session = StudySession::new(
        cards,
        history,
        settings,
        ChunkedScheduler::with_rng(settings.scheduler_config(), scheduler_rng),
        ShortAnswerMatcher,
        session_rng,
    )?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    repl::practice(&mut session, &mut store, args.set_id, stdin.lock(), &mut stdout)?;

    store.save_preferences(&args.user, args.set_id, session.settings())?;
    Ok(())
}
