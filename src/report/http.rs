// src/report/http.rs

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Url};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::errors::{ClustersideError, Result};
use crate::report::StatusReporter;
use crate::types::JobStatus;

/// Posts status updates as JSON to the server's job API.
///
/// An empty endpoint disables delivery: updates are only logged.
#[derive(Debug, Clone)]
pub struct HttpReporter {
    client: Client,
    endpoint: Option<Url>,
    token: Option<String>,
    job_pk: i64,
}

impl HttpReporter {
    pub fn new(endpoint: &str, token: Option<&str>, job_pk: i64) -> Result<Self> {
        let endpoint = if endpoint.trim().is_empty() {
            None
        } else {
            Some(Url::parse(endpoint).map_err(|e| {
                ClustersideError::ConfigError(format!("invalid status url {endpoint:?}: {e}"))
            })?)
        };

        Ok(Self {
            client: Client::new(),
            endpoint,
            token: token.map(str::to_string),
            job_pk,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    async fn post(&self, body: Value) -> Result<()> {
        let Some(endpoint) = &self.endpoint else {
            debug!(%body, "status reporting disabled; not sending");
            return Ok(());
        };

        let mut request = self.client.post(endpoint.clone()).json(&body);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Token {token}"));
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(ClustersideError::Report(format!(
                "server answered HTTP {} to {}",
                response.status(),
                endpoint
            )));
        }
        Ok(())
    }
}

pub(crate) fn status_payload(job_pk: i64, status: &JobStatus) -> Value {
    json!({
        "job": job_pk,
        "status": status.code(),
        "message": status.message(),
    })
}

pub(crate) fn task_complete_payload(job_pk: i64, task_pk: i64) -> Value {
    json!({
        "job": job_pk,
        "task_complete": task_pk,
    })
}

impl StatusReporter for HttpReporter {
    async fn update_status(&self, status: &JobStatus) -> Result<()> {
        info!(job_pk = self.job_pk, status = %status, "reporting status");
        self.post(status_payload(self.job_pk, status)).await
    }

    async fn task_complete(&self, task_pk: i64) -> Result<()> {
        info!(job_pk = self.job_pk, task_pk, "reporting task complete");
        self.post(task_complete_payload(self.job_pk, task_pk)).await
    }
}
