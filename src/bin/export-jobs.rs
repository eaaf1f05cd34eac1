use linkedin_job_collector::linkedin::LinkedInData;
use linkedin_job_collector::Table;

async fn export_jobs(name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let data = LinkedInData::new(name).await?;
    let stored = data.jobs.count().await?;
    let pages = data.checkpoints.count().await?;
    if stored == 0 {
        eprintln!("{}.db holds no jobs", name);
    }

    let jobs = data.load_jobs().await?;
    println!("{}", serde_json::to_string_pretty(&jobs)?);
    eprintln!(
        "Exported {} of {} jobs from {}.db ({} pages checkpointed)",
        jobs.len(),
        stored,
        name,
        pages
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let name = std::env::args()
        .nth(1)
        .ok_or("usage: export-jobs NAME (reads NAME.db)")?;
    export_jobs(&name).await
}
