//! Redis-backed grading worker
//!
//! Pops grading jobs from a Redis list, grades them and stores each report
//! under a per-job key (1 hour expiry), publishing it for live subscribers.

use std::time::Duration;

use anyhow::{Context, Result};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::core::{ExecutionReport, ExecutionRequest, TestCase};
use crate::error::GradeError;
use crate::harness::Signature;
use crate::judger::Judger;
use crate::languages::LanguageTable;

/// Redis key constants
pub mod keys {
    /// Grading job queue key
    pub const GRADE_QUEUE: &str = "grader:queue";

    /// Grading result key prefix (for polling)
    pub const GRADE_RESULT_PREFIX: &str = "grader:result:";

    /// Grading result channel (for pub/sub)
    pub const GRADE_RESULT_CHANNEL: &str = "grader:results";
}

const RESULT_EXPIRY_SECS: u64 = 3600; // 1 hour

/// Job received from the queue or read by `grader run`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeJob {
    #[serde(default)]
    pub job_id: String,
    pub source_code: String,
    /// Language name or alias, resolved against the language table
    pub language: String,
    pub test_cases: Vec<TestCase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
}

impl GradeJob {
    pub fn into_request(self, languages: &LanguageTable) -> Result<ExecutionRequest, GradeError> {
        let language = languages.resolve(&self.language)?;
        let mut request = ExecutionRequest::new(self.source_code, language, self.test_cases);
        request.entry_point = self.entry_point;
        request.signature = self.signature;
        Ok(request)
    }
}

/// Stored result: the report tagged with its job id
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeResult {
    pub job_id: String,
    #[serde(flatten)]
    pub report: ExecutionReport,
}

/// Grade one job. Errors that abort grading become a failed report.
pub async fn grade_job(judger: &Judger, job: GradeJob) -> ExecutionReport {
    let job_id = job.job_id.clone();
    let outcome = match job.into_request(judger.languages()) {
        Ok(request) => judger.execute(&request).await,
        Err(e) => Err(e),
    };

    outcome.unwrap_or_else(|e| {
        error!("Failed to grade job {}: {}", job_id, e);
        ExecutionReport::failed(e.to_string())
    })
}

/// Redis connection for the grading queue
pub struct JobQueue {
    client: redis::Client,
    conn: MultiplexedConnection,
}

impl JobQueue {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url).context("Failed to create Redis client")?;
        let conn = get_connection_with_retry(&client).await?;
        info!("Connected to Redis at {}", redis_url);
        Ok(Self { client, conn })
    }

    /// Block and wait for the next job from the queue.
    ///
    /// Malformed jobs are logged and skipped. Reconnects on connection failure.
    pub async fn pop_job(&mut self) -> Result<GradeJob> {
        loop {
            let result: Option<(String, String)> =
                match self.conn.blpop(keys::GRADE_QUEUE, 0.0).await {
                    Ok(res) => res,
                    Err(e) => {
                        warn!("Redis BLPOP failed: {}. Reconnecting...", e);
                        self.reconnect().await?;
                        continue;
                    }
                };

            if let Some((_, job_data)) = result {
                match serde_json::from_str::<GradeJob>(&job_data) {
                    Ok(job) => return Ok(job),
                    Err(e) => {
                        warn!("Failed to parse job data: {}. Data: {}", e, job_data);
                        continue;
                    }
                }
            }
        }
    }

    /// Store a result with a 1-hour expiration and publish it
    pub async fn store_result(&mut self, result: &GradeResult) -> Result<()> {
        let key = result_key(&result.job_id);
        let json = serde_json::to_string(result)?;

        if let Err(e) = self
            .conn
            .set_ex::<_, _, ()>(&key, &json, RESULT_EXPIRY_SECS)
            .await
        {
            warn!("Failed to store result: {}. Reconnecting...", e);
            self.reconnect().await?;
            self.conn
                .set_ex::<_, _, ()>(&key, &json, RESULT_EXPIRY_SECS)
                .await?;
        }

        // There may be no subscribers
        let _ = self
            .conn
            .publish::<_, _, ()>(keys::GRADE_RESULT_CHANNEL, &json)
            .await;

        Ok(())
    }

    async fn reconnect(&mut self) -> Result<()> {
        self.conn = get_connection_with_retry(&self.client).await?;
        Ok(())
    }
}

fn result_key(job_id: &str) -> String {
    format!("{}{}", keys::GRADE_RESULT_PREFIX, job_id)
}

/// Get a Redis connection with retry logic
async fn get_connection_with_retry(client: &redis::Client) -> Result<MultiplexedConnection> {
    loop {
        match client.get_multiplexed_async_connection().await {
            Ok(conn) => return Ok(conn),
            Err(e) => {
                warn!(
                    "Failed to connect to Redis: {}. Retrying in 3 seconds...",
                    e
                );
                tokio::time::sleep(Duration::from_secs(3)).await;
            }
        }
    }
}

/// Consume jobs forever
pub async fn run_worker(judger: &Judger, queue: &mut JobQueue) -> Result<()> {
    info!("Waiting for jobs on {}...", keys::GRADE_QUEUE);

    loop {
        let job = queue.pop_job().await?;
        let job_id = job.job_id.clone();
        info!(
            "Received job: job_id={}, language={}, test_cases={}",
            job_id,
            job.language,
            job.test_cases.len()
        );

        let report = grade_job(judger, job).await;
        info!(
            "Job completed: job_id={}, success={}, passed={}/{}",
            job_id,
            report.success,
            report.passed_count(),
            report.total_count()
        );

        let result = GradeResult { job_id, report };
        if let Err(e) = queue.store_result(&result).await {
            error!("Failed to store result for job {}: {:#}", result.job_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_job() {
        let job: GradeJob = serde_json::from_value(json!({
            "jobId": "42",
            "sourceCode": "def two_sum(nums, target):\n    return [0, 1]",
            "language": "py",
            "testCases": [{"input": {"nums": [2, 7], "target": 9}, "expectedOutput": [0, 1]}],
            "entryPoint": "two_sum"
        }))
        .unwrap();

        let table = LanguageTable::builtin().unwrap();
        let request = job.into_request(&table).unwrap();
        assert_eq!(request.language, crate::languages::Language::Python);
        assert_eq!(request.entry_point.as_deref(), Some("two_sum"));
        assert_eq!(request.test_cases.len(), 1);
        assert!(request.signature.is_none());
    }

    #[test]
    fn test_unknown_language_is_rejected() {
        let job: GradeJob = serde_json::from_value(json!({
            "sourceCode": "puts 1",
            "language": "ruby",
            "testCases": []
        }))
        .unwrap();
        assert_eq!(job.job_id, "");

        let err = job.into_request(&LanguageTable::builtin().unwrap()).unwrap_err();
        assert!(matches!(err, GradeError::UnsupportedLanguage(_)));
    }

    #[test]
    fn test_result_flattens_report() {
        let result = GradeResult {
            job_id: "7".into(),
            report: ExecutionReport::failed("Unsupported language: ruby"),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["jobId"], json!("7"));
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["error"], json!("Unsupported language: ruby"));
        assert_eq!(result_key("7"), "grader:result:7");
    }

    #[tokio::test]
    async fn test_grade_job_reports_fatal_errors() {
        let root = tempfile::tempdir().unwrap();
        let config = crate::config::GraderConfig {
            scratch_dir: root.path().to_path_buf(),
            ..Default::default()
        };
        let judger = Judger::from_config(
            &config,
            std::sync::Arc::new(LanguageTable::builtin().unwrap()),
        )
        .unwrap();
        let job = GradeJob {
            job_id: "1".into(),
            source_code: "print 1".into(),
            language: "cobol".into(),
            test_cases: vec![],
            entry_point: None,
            signature: None,
        };

        let report = grade_job(&judger, job).await;
        assert!(!report.success);
        assert_eq!(report.error.as_deref(), Some("Unsupported language: cobol"));
    }
}
