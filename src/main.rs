use clap::Parser;
use linkedin_job_collector::checkpoint::{self, JsonFiles};
use linkedin_job_collector::chrome::ChromeRenderer;
use linkedin_job_collector::config::Cli;
use linkedin_job_collector::interaction::{Console, ConsoleOperator};
use linkedin_job_collector::linkedin::{LinkedIn, LinkedInData};
use linkedin_job_collector::{CollectionSession, Collector, Fanout, SkillVocabulary, Storage};
use std::sync::Arc;
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| {
                "info,html5ever=error,selectors=error,headless_chrome=warn,sqlx=warn".into()
            }),
        )
        .with(ErrorLayer::default())
        .init();

    let cli = Cli::parse();
    let console = Arc::new(Console::stdin());
    let search = cli.search(&*console).await?;
    let search_url = search.url()?;
    let output = search.output_path(&cli.output_dir, &chrono::Local::now());

    let mut storages: Vec<Box<dyn Storage>> =
        vec![Box::new(JsonFiles::new(&cli.checkpoint_dir, &output))];
    if let Some(name) = cli.sqlite.as_deref() {
        storages.push(Box::new(LinkedInData::new(name).await?));
    }

    let mut session = CollectionSession::new(search_url.as_str(), cli.max_jobs)?;
    if let Some(path) = cli.resume.as_ref() {
        info!("Resuming from {}", path.display());
        session.resume(checkpoint::load_jobs(path).await?);
    }

    let skills = SkillVocabulary::load(&cli.skills).await;
    let options = cli.browser_options();
    let renderer = tokio::task::spawn_blocking(move || ChromeRenderer::launch(&options)).await??;

    let mut collector = Collector::new(
        renderer,
        LinkedIn::default(),
        Fanout(storages),
        skills,
        cli.collector_config(),
    )
    .with_operator(ConsoleOperator::new(console));
    let jobs = collector.collect(session).await?;

    info!("Saved {} jobs to {}", jobs.len(), output.display());
    Ok(())
}
