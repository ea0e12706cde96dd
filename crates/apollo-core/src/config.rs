use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_PORT: u16 = 6910;
pub const DEFAULT_STORE_DRIVER: &str = "sqlite";
pub const DEFAULT_STORE_PATH: &str = "jobs.db";
pub const DEFAULT_GCP_REGION: &str = "us-central1";

/// Which backend executes jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Spawn containers through the host docker CLI; scheduling is handled
    /// by the in-process cron scheduler.
    Local,
    /// Create GCP Cloud Batch jobs; recurring schedules live in Cloud
    /// Scheduler on the GCP side.
    CloudRun,
}

impl Provider {
    fn from_env(value: &str) -> Self {
        match value {
            "cloudrun" => Provider::CloudRun,
            _ => Provider::Local,
        }
    }
}

/// Contents of `jobs.yml` — the operator-managed workload description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Container entrypoint path, e.g. `/app/rover`.
    #[serde(default)]
    pub cmd: String,
    /// Container image reference used for every job.
    #[serde(default)]
    pub image: String,
    /// Secrets to expose to jobs. A value containing `$` marks an
    /// env-var/provider indirection; anything else is a literal.
    #[serde(default)]
    pub secrets: Vec<SecretConfig>,
    /// Per-job resource defaults, keyed by job name.
    #[serde(default)]
    pub jobs: Vec<JobConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretConfig {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub name: String,
    #[serde(default)]
    pub resources: ResourceConfig,
}

/// Kubernetes-style resource strings (`250m`, `1`, `256Mi`, `2Gi`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConfig {
    #[serde(default)]
    pub cpu: String,
    #[serde(default)]
    pub memory: String,
}

#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    pub driver: String,
    pub path: String,
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub environment: String,
    pub store: StoreConfig,
    pub jobs: JobsConfig,
    pub provider: Provider,
    pub gcp_project_id: String,
    pub gcp_region: String,
    pub gcp_service_account_email: String,
    pub persistent_disk_name: String,
}

impl Config {
    /// Load configuration from the environment plus `jobs.yml`.
    ///
    /// `jobs.yml` is searched at `/app/jobs.yml` first (container image
    /// layout) and `./jobs.yml` second. A missing or malformed file yields
    /// an empty [`JobsConfig`] — the server can still run one-off jobs that
    /// carry their own resources.
    pub fn load() -> Self {
        Self {
            port: env_or("PORT", &DEFAULT_PORT.to_string())
                .parse()
                .unwrap_or(DEFAULT_PORT),
            environment: env_or("ENVIRONMENT", "development"),
            store: StoreConfig {
                driver: env_or("STORE_DRIVER", DEFAULT_STORE_DRIVER),
                path: env_or("STORE_PATH", DEFAULT_STORE_PATH),
            },
            jobs: read_jobs_yaml(),
            provider: Provider::from_env(&env_or("JOBS_PROVIDER", "local")),
            gcp_project_id: env_or("GCP_PROJECT_ID", ""),
            gcp_region: env_or("GCP_REGION", DEFAULT_GCP_REGION),
            gcp_service_account_email: env_or("GCP_SERVICE_ACCOUNT_EMAIL", ""),
            persistent_disk_name: env_or("PERSISTENT_DISK_NAME", ""),
        }
    }

    /// Resource defaults for a named job, falling back to the platform
    /// baseline (`250m` CPU, `256Mi` memory) when the name is unknown.
    pub fn resources_for(&self, job_name: &str) -> ResourceConfig {
        for job in &self.jobs.jobs {
            if job.name == job_name {
                return job.resources.clone();
            }
        }
        ResourceConfig {
            cpu: "250m".to_string(),
            memory: "256Mi".to_string(),
        }
    }
}

/// Read an env var, falling back to `default` when unset or empty.
pub fn env_or(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(v) if !v.is_empty() => v,
        _ => default.to_string(),
    }
}

fn read_jobs_yaml() -> JobsConfig {
    let raw = std::fs::read_to_string("/app/jobs.yml")
        .or_else(|_| std::fs::read_to_string("jobs.yml"));

    let raw = match raw {
        Ok(r) => r,
        Err(_) => return JobsConfig::default(),
    };

    match serde_yaml::from_str(&raw) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("jobs.yml parse failed: {e}");
            JobsConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resources_for_known_job() {
        let config = Config {
            port: DEFAULT_PORT,
            environment: "test".into(),
            store: StoreConfig::default(),
            jobs: JobsConfig {
                cmd: "/app/rover".into(),
                image: "ghcr.io/acme/rover:latest".into(),
                secrets: vec![],
                jobs: vec![JobConfig {
                    name: "report".into(),
                    resources: ResourceConfig {
                        cpu: "1".into(),
                        memory: "2Gi".into(),
                    },
                }],
            },
            provider: Provider::Local,
            gcp_project_id: String::new(),
            gcp_region: DEFAULT_GCP_REGION.into(),
            gcp_service_account_email: String::new(),
            persistent_disk_name: String::new(),
        };

        let res = config.resources_for("report");
        assert_eq!(res.cpu, "1");
        assert_eq!(res.memory, "2Gi");
    }

    #[test]
    fn resources_for_unknown_job_uses_baseline() {
        let config = Config {
            port: DEFAULT_PORT,
            environment: "test".into(),
            store: StoreConfig::default(),
            jobs: JobsConfig::default(),
            provider: Provider::Local,
            gcp_project_id: String::new(),
            gcp_region: DEFAULT_GCP_REGION.into(),
            gcp_service_account_email: String::new(),
            persistent_disk_name: String::new(),
        };

        let res = config.resources_for("anything");
        assert_eq!(res.cpu, "250m");
        assert_eq!(res.memory, "256Mi");
    }

    #[test]
    fn jobs_yaml_shape_parses() {
        let yaml = "
cmd: /app/rover
image: ghcr.io/acme/rover:latest
secrets:
  - name: DATABASE_URL
    value: $DATABASE_URL
  - name: LOG_LEVEL
    value: debug
jobs:
  - name: nightly
    resources:
      cpu: 500m
      memory: 1Gi
";
        let cfg: JobsConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.cmd, "/app/rover");
        assert_eq!(cfg.secrets.len(), 2);
        assert_eq!(cfg.secrets[0].value, "$DATABASE_URL");
        assert_eq!(cfg.jobs[0].resources.memory, "1Gi");
    }
}
