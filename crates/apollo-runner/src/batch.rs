//! Cloud backend: GCP Cloud Batch jobs plus Cloud Scheduler cron entries.
//!
//! `run_job` creates one batch job per invocation and returns as soon as
//! the create call is acknowledged — callers that need completion poll the
//! returned resource name through the Batch API itself. Recurring
//! schedules are not handled in-process: `update_schedule` materializes a
//! Cloud Scheduler entry that POSTs a create-job body back into the Batch
//! API on every cron tick.

use apollo_core::Secret;
use apollo_scheduler::cron::to_five_field;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::error::{Result, RunnerError};
use crate::gcp::GcpTokenSource;
use crate::resources::{parse_cpu_millis, parse_memory_mib};
use crate::types::JobRequest;
use crate::Runner;

const BATCH_API: &str = "https://batch.googleapis.com/v1";
const SCHEDULER_API: &str = "https://cloudscheduler.googleapis.com/v1";

const DEFAULT_DISK_SIZE_GB: i64 = 64;
const DEFAULT_DISK_TYPE: &str = "pd-balanced";
const MACHINE_TYPE: &str = "n1-standard-1";

pub struct CloudBatchRunner {
    http: reqwest::Client,
    tokens: GcpTokenSource,
    project_id: String,
    region: String,
    image: String,
    secrets: Vec<Secret>,
    service_account_email: String,
    persistent_disk_name: String,
    persistent_disk_size_gb: i64,
    persistent_disk_type: String,
}

impl CloudBatchRunner {
    pub fn new(
        project_id: impl Into<String>,
        region: impl Into<String>,
        image: impl Into<String>,
        secrets: Vec<Secret>,
    ) -> Self {
        let http = reqwest::Client::new();
        Self {
            tokens: GcpTokenSource::new(http.clone()),
            http,
            project_id: project_id.into(),
            region: region.into(),
            image: image.into(),
            secrets,
            service_account_email: String::new(),
            persistent_disk_name: String::new(),
            persistent_disk_size_gb: DEFAULT_DISK_SIZE_GB,
            persistent_disk_type: DEFAULT_DISK_TYPE.to_string(),
        }
    }

    /// Service account used for the Cloud Scheduler OIDC target.
    pub fn with_service_account_email(mut self, email: impl Into<String>) -> Self {
        self.service_account_email = email.into();
        self
    }

    /// Attach a persistent disk to every batch job, mounted at
    /// `/mnt/disks/<name>`.
    pub fn with_persistent_disk(mut self, name: impl Into<String>) -> Self {
        self.persistent_disk_name = name.into();
        self
    }

    fn parent(&self) -> String {
        format!("projects/{}/locations/{}", self.project_id, self.region)
    }

    fn job_name(&self, id: &str) -> String {
        format!("{}/jobs/{}", self.parent(), id)
    }

    /// Build the Batch `Job` resource for one execution.
    fn build_job_payload(&self, entrypoint: &str, req: &JobRequest) -> Value {
        // Env union: merged secrets first, override entries second so an
        // override of the same key wins on collision.
        let mut variables = Map::new();
        for secret in &self.secrets {
            variables.insert(secret.key.clone(), Value::String(secret.value.clone()));
        }
        if let Some(overrides) = &req.overrides {
            for pair in &overrides.env {
                variables.insert(pair.name.clone(), Value::String(pair.value.clone()));
            }
        }

        let options = req
            .overrides
            .as_ref()
            .map(|o| o.args.join(" "))
            .unwrap_or_default();

        let resources = req.effective_resources();

        let mut task_spec = json!({
            "computeResource": {
                "cpuMilli": parse_cpu_millis(&resources.cpu).to_string(),
                "memoryMib": parse_memory_mib(&resources.memory).to_string(),
            },
            "maxRunDuration": "86400s",
            "maxRetryCount": 3,
            "runnables": [{
                "container": {
                    "imageUri": self.image,
                    "commands": [entrypoint],
                    "options": options,
                },
                "environment": { "variables": variables },
            }],
        });

        let mut disks = Vec::new();
        if !self.persistent_disk_name.is_empty() {
            task_spec["volumes"] = json!([{
                "deviceName": self.persistent_disk_name,
                "mountPath": format!("/mnt/disks/{}", self.persistent_disk_name),
                "mountOptions": ["rw", "async"],
            }]);
            disks.push(json!({
                "deviceName": self.persistent_disk_name,
                "newDisk": {
                    "type": self.persistent_disk_type,
                    "sizeGb": self.persistent_disk_size_gb.to_string(),
                },
            }));
        }

        json!({
            "taskGroups": [{
                "taskCount": req.effective_task_count().to_string(),
                "taskSpec": task_spec,
            }],
            "allocationPolicy": {
                "instances": [{
                    "policy": {
                        "machineType": MACHINE_TYPE,
                        "disks": disks,
                    },
                }],
            },
            "labels": { "env": "production", "type": "batch" },
            "logsPolicy": { "destination": "CLOUD_LOGGING" },
        })
    }

    /// Build the Cloud Scheduler job that re-creates the batch job on every
    /// cron tick.
    fn build_scheduler_payload(&self, name: &str, five_field_spec: &str) -> Value {
        let create_url = format!("{BATCH_API}/{}/jobs", self.parent());

        let job_config = json!({
            "job_id": name,
            "job": {
                "taskGroups": [{
                    "taskCount": "1",
                    "taskSpec": {
                        "runnables": [{
                            "container": { "imageUri": self.image },
                        }],
                    },
                }],
                "allocationPolicy": {
                    "instances": [{
                        "policy": { "machineType": MACHINE_TYPE },
                    }],
                },
            },
        });

        json!({
            "name": format!("{}/jobs/{}", self.parent(), name),
            "schedule": five_field_spec,
            "timeZone": "UTC",
            "description": "Run Batch Job",
            "httpTarget": {
                "uri": create_url,
                "httpMethod": "POST",
                "headers": { "Content-Type": "application/json" },
                "body": STANDARD.encode(job_config.to_string()),
                "oidcToken": {
                    "serviceAccountEmail": self.service_account_email,
                },
            },
        })
    }

    async fn api_error(resp: reqwest::Response) -> RunnerError {
        let status = resp.status().as_u16();
        let message = resp.text().await.unwrap_or_default();
        RunnerError::Api { status, message }
    }
}

#[async_trait]
impl Runner for CloudBatchRunner {
    async fn run_job(&self, entrypoint: &str, req: &JobRequest) -> Result<String> {
        let token = self.tokens.token().await?;
        let url = format!("{BATCH_API}/{}/jobs", self.parent());
        let payload = self.build_job_payload(entrypoint, req);

        debug!(job = %req.name, "creating batch job");
        let resp = self
            .http
            .post(&url)
            .query(&[("job_id", req.name.as_str())])
            .bearer_auth(&token)
            .json(&payload)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::api_error(resp).await);
        }

        let created: Value = resp.json().await?;
        let name = created
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        info!(job = %req.name, resource = %name, "batch job created");
        Ok(name)
    }

    async fn delete_job(&self, name: &str) -> Result<()> {
        let token = self.tokens.token().await?;
        let url = format!("{BATCH_API}/{}", self.job_name(name));

        let resp = self.http.delete(&url).bearer_auth(&token).send().await?;

        // Absence is success: the job may never have reached the backend.
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        if !resp.status().is_success() {
            return Err(Self::api_error(resp).await);
        }
        info!(job = %name, "batch job deleted");
        Ok(())
    }

    async fn update_schedule(&self, name: &str, spec: &str) -> Result<()> {
        let token = self.tokens.token().await?;
        let five_field = to_five_field(spec);
        let payload = self.build_scheduler_payload(name, &five_field);
        let job_url = format!("{SCHEDULER_API}/{}/jobs/{}", self.parent(), name);

        let existing = self.http.get(&job_url).bearer_auth(&token).send().await?;

        if existing.status() == reqwest::StatusCode::NOT_FOUND {
            let create_url = format!("{SCHEDULER_API}/{}/jobs", self.parent());
            let resp = self
                .http
                .post(&create_url)
                .bearer_auth(&token)
                .json(&payload)
                .send()
                .await?;
            if !resp.status().is_success() {
                return Err(Self::api_error(resp).await);
            }
            info!(job = %name, schedule = %five_field, "scheduler job created");
            return Ok(());
        }
        if !existing.status().is_success() {
            return Err(Self::api_error(existing).await);
        }

        let resp = self
            .http
            .patch(&job_url)
            .bearer_auth(&token)
            .json(&payload)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Self::api_error(resp).await);
        }
        info!(job = %name, schedule = %five_field, "scheduler job updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EnvPair, JobOverrides, Resources};

    fn runner() -> CloudBatchRunner {
        CloudBatchRunner::new(
            "acme-prod",
            "us-central1",
            "gcr.io/acme/rover:latest",
            vec![Secret::new("TOKEN", "abc")],
        )
    }

    fn request() -> JobRequest {
        JobRequest {
            name: "ingest".into(),
            command: "ingest".into(),
            resources: Resources {
                cpu: "500m".into(),
                memory: "1Gi".into(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn resources_are_translated_to_native_units() {
        let payload = runner().build_job_payload("/app/rover", &request());
        let compute = &payload["taskGroups"][0]["taskSpec"]["computeResource"];

        assert_eq!(compute["cpuMilli"], "500");
        assert_eq!(compute["memoryMib"], "1024");
    }

    #[test]
    fn task_count_defaults_to_one_and_clamps_non_positive() {
        let payload = runner().build_job_payload("/app/rover", &request());
        assert_eq!(payload["taskGroups"][0]["taskCount"], "1");

        let mut req = request();
        req.overrides = Some(JobOverrides {
            task_count: -3,
            ..Default::default()
        });
        let payload = runner().build_job_payload("/app/rover", &req);
        assert_eq!(payload["taskGroups"][0]["taskCount"], "1");

        let mut req = request();
        req.overrides = Some(JobOverrides {
            task_count: 4,
            ..Default::default()
        });
        let payload = runner().build_job_payload("/app/rover", &req);
        assert_eq!(payload["taskGroups"][0]["taskCount"], "4");
    }

    #[test]
    fn override_env_wins_over_secret_in_variables() {
        let mut req = request();
        req.overrides = Some(JobOverrides {
            env: vec![EnvPair {
                name: "TOKEN".into(),
                value: "override".into(),
            }],
            ..Default::default()
        });

        let payload = runner().build_job_payload("/app/rover", &req);
        let vars = &payload["taskGroups"][0]["taskSpec"]["runnables"][0]["environment"]["variables"];
        assert_eq!(vars["TOKEN"], "override");
    }

    #[test]
    fn entrypoint_is_the_command_and_override_args_become_options() {
        let mut req = request();
        req.overrides = Some(JobOverrides {
            args: vec!["--fast".into(), "--retries=2".into()],
            ..Default::default()
        });

        let payload = runner().build_job_payload("/app/rover", &req);
        let container = &payload["taskGroups"][0]["taskSpec"]["runnables"][0]["container"];
        assert_eq!(container["commands"][0], "/app/rover");
        assert_eq!(container["options"], "--fast --retries=2");
    }

    #[test]
    fn persistent_disk_is_mounted_when_configured() {
        let payload = runner()
            .with_persistent_disk("scratch")
            .build_job_payload("/app/rover", &request());

        let volume = &payload["taskGroups"][0]["taskSpec"]["volumes"][0];
        assert_eq!(volume["mountPath"], "/mnt/disks/scratch");

        let disk = &payload["allocationPolicy"]["instances"][0]["policy"]["disks"][0];
        assert_eq!(disk["newDisk"]["type"], "pd-balanced");
        assert_eq!(disk["newDisk"]["sizeGb"], "64");
    }

    #[test]
    fn no_volumes_without_a_disk() {
        let payload = runner().build_job_payload("/app/rover", &request());
        assert!(payload["taskGroups"][0]["taskSpec"].get("volumes").is_none());
    }

    #[test]
    fn job_carries_duration_retries_labels_and_logging() {
        let payload = runner().build_job_payload("/app/rover", &request());
        let task_spec = &payload["taskGroups"][0]["taskSpec"];

        assert_eq!(task_spec["maxRunDuration"], "86400s");
        assert_eq!(task_spec["maxRetryCount"], 3);
        assert_eq!(payload["labels"]["env"], "production");
        assert_eq!(payload["labels"]["type"], "batch");
        assert_eq!(payload["logsPolicy"]["destination"], "CLOUD_LOGGING");
    }

    #[test]
    fn scheduler_payload_targets_the_batch_create_url() {
        let payload = runner()
            .with_service_account_email("svc@acme-prod.iam.gserviceaccount.com")
            .build_scheduler_payload("nightly", "0 2 * * *");

        assert_eq!(payload["schedule"], "0 2 * * *");
        assert_eq!(payload["timeZone"], "UTC");
        assert_eq!(
            payload["httpTarget"]["uri"],
            "https://batch.googleapis.com/v1/projects/acme-prod/locations/us-central1/jobs"
        );
        assert_eq!(
            payload["httpTarget"]["oidcToken"]["serviceAccountEmail"],
            "svc@acme-prod.iam.gserviceaccount.com"
        );

        // The POST body is a base64-encoded create-job request.
        let body = payload["httpTarget"]["body"].as_str().unwrap();
        let decoded = String::from_utf8(STANDARD.decode(body).unwrap()).unwrap();
        assert!(decoded.contains(r#""job_id":"nightly""#));
        assert!(decoded.contains("gcr.io/acme/rover:latest"));
    }
}
