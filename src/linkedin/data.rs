use futures::TryStreamExt;
use itertools::Itertools;
use sqlx::{sqlite::SqliteConnectOptions, Row, SqlitePool};
use std::collections::BTreeSet;

use super::{JobRecord, RecruiterRecord};
use crate::{utils, CollectorError, Storage, Table};

pub struct JobTable {
    name: String,
    pool: SqlitePool,
}

#[async_trait::async_trait]
impl Table for JobTable {
    type Record<'a> = (usize, &'a JobRecord);

    fn get_name(&self) -> &str {
        self.name.as_str()
    }

    fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn columns(&self) -> &'static str {
        r#"
            id TEXT PRIMARY KEY,
            created_at DATETIME,
            position INTEGER,
            job_title TEXT,
            company TEXT,
            location TEXT,
            company_link TEXT,
            description TEXT,
            skills TEXT,
            recruiters TEXT
        "#
    }

    async fn insert<'a>(&self, (position, job): Self::Record<'a>) -> Result<(), sqlx::Error> {
        let skills = job
            .skills
            .as_ref()
            .map(|s| s.iter().join("|"));
        let recruiters = job
            .recruiters
            .as_ref()
            .and_then(|r| serde_json::to_string(r).ok());

        let mut tx = self.get_pool().begin().await?;
        let query = format!(
            r#"INSERT OR REPLACE INTO {} (
                id,
                position,
                job_title,
                company,
                location,
                company_link,
                description,
                skills,
                recruiters,
                created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            self.name
        );
        sqlx::query(&query)
            .bind(job.key())
            .bind(position as i64)
            .bind(job.title.as_str())
            .bind(job.company.as_str())
            .bind(job.location.as_str())
            .bind(job.company_link.as_deref())
            .bind(job.description.as_deref())
            .bind(skills)
            .bind(recruiters)
            .bind(utils::get_now())
            .execute(&mut tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}

pub struct CheckpointTable {
    name: String,
    pool: SqlitePool,
}

#[async_trait::async_trait]
impl Table for CheckpointTable {
    type Record<'a> = (u32, usize);

    fn get_name(&self) -> &str {
        self.name.as_str()
    }

    fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn columns(&self) -> &'static str {
        "id TEXT PRIMARY KEY, created_at DATETIME, collected INTEGER"
    }

    async fn insert<'a>(&self, (page, collected): Self::Record<'a>) -> Result<(), sqlx::Error> {
        let query = format!(
            "INSERT OR REPLACE INTO {} (id, collected, created_at) VALUES (?, ?, ?)",
            self.name
        );
        sqlx::query(&query)
            .bind(page.to_string())
            .bind(collected as i64)
            .bind(utils::get_now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// SQLite mirror of the collected jobs, in `{name}.db`.
pub struct LinkedInData {
    pub name: String,
    pub jobs: JobTable,
    pub checkpoints: CheckpointTable,
    pool: SqlitePool,
}

impl LinkedInData {
    pub async fn new(name: &str) -> Result<LinkedInData, CollectorError> {
        let opt = SqliteConnectOptions::new()
            .filename(format!("{}.db", name))
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(opt).await?;
        let p = LinkedInData {
            name: name.to_string(),
            jobs: JobTable {
                name: format!("{}_jobs", name),
                pool: pool.clone(),
            },
            checkpoints: CheckpointTable {
                name: format!("{}_checkpoints", name),
                pool: pool.clone(),
            },
            pool,
        };

        p.jobs.create().await?;
        p.checkpoints.create().await?;

        Ok(p)
    }

    /// Stored jobs in collection order.
    pub async fn load_jobs(&self) -> Result<Vec<JobRecord>, CollectorError> {
        let query = format!(
            "SELECT job_title, company, location, company_link, description, skills, recruiters
             FROM {} ORDER BY position",
            self.jobs.get_name()
        );
        let mut rows = sqlx::query(&query).fetch(&self.pool);
        let mut jobs = vec![];
        while let Some(row) = rows.try_next().await? {
            let skills: Option<String> = row.try_get("skills")?;
            let recruiters: Option<String> = row.try_get("recruiters")?;
            jobs.push(JobRecord {
                title: row.try_get("job_title")?,
                company: row.try_get("company")?,
                location: row.try_get("location")?,
                company_link: row.try_get("company_link")?,
                description: row.try_get("description")?,
                skills: skills.map(|s| {
                    s.split('|')
                        .filter(|s| !s.is_empty())
                        .map(ToString::to_string)
                        .collect::<BTreeSet<_>>()
                }),
                recruiters: recruiters
                    .map(|r| serde_json::from_str::<Vec<RecruiterRecord>>(&r))
                    .transpose()?,
            });
        }
        Ok(jobs)
    }

    async fn save(&self, jobs: &[JobRecord]) -> Result<(), CollectorError> {
        for (position, job) in jobs.iter().enumerate() {
            self.jobs.insert((position, job)).await?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Storage for LinkedInData {
    async fn checkpoint(&self, page: u32, jobs: &[JobRecord]) -> Result<(), CollectorError> {
        self.save(jobs).await?;
        self.checkpoints.insert((page, jobs.len())).await?;
        tracing::debug!("Stored page {} in {}.db", page, self.name);
        Ok(())
    }

    async fn finish(&self, jobs: &[JobRecord]) -> Result<(), CollectorError> {
        self.save(jobs).await?;
        tracing::info!("Stored {} jobs in {}.db", jobs.len(), self.name);
        Ok(())
    }
}
