//! Local backend: one `docker run --rm` per execution.

use apollo_core::Secret;
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, RunnerError};
use crate::types::JobRequest;
use crate::Runner;

pub struct LocalRunner {
    image: String,
    secrets: Vec<Secret>,
}

impl LocalRunner {
    pub fn new(image: impl Into<String>, secrets: Vec<Secret>) -> Self {
        Self {
            image: image.into(),
            secrets,
        }
    }

    /// Assemble the docker argv for one execution.
    ///
    /// Flag order is part of the contract: override env entries come after
    /// the merged secrets so an override of the same key wins via the
    /// runtime's last-write-wins, and override args trail everything so
    /// they can extend the workload's own argument list.
    fn build_args(&self, entrypoint: &str, req: &JobRequest) -> Vec<String> {
        let mut args = vec!["run".to_string(), "--rm".to_string()];

        for secret in &self.secrets {
            args.push("-e".to_string());
            args.push(format!("{}={}", secret.key, secret.value));
        }

        if let Some(overrides) = &req.overrides {
            for pair in &overrides.env {
                args.push("-e".to_string());
                args.push(format!("{}={}", pair.name, pair.value));
            }
        }

        let resources = req.effective_resources();
        args.push("--memory".to_string());
        args.push(resources.memory.clone());
        args.push("--cpus".to_string());
        args.push(resources.cpu.clone());

        args.push(self.image.clone());
        args.push(entrypoint.to_string());
        args.push(req.command.clone());

        if !req.args_base64.is_empty() {
            args.push(req.args_base64.clone());
        }

        if let Some(overrides) = &req.overrides {
            args.extend(overrides.args.iter().cloned());
        }

        args
    }
}

#[async_trait]
impl Runner for LocalRunner {
    async fn run_job(&self, entrypoint: &str, req: &JobRequest) -> Result<String> {
        let args = self.build_args(entrypoint, req);
        debug!(job = %req.name, "docker {}", args.join(" "));

        let output = Command::new("docker").args(&args).output().await?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            return Err(RunnerError::Spawn(format!(
                "exit code {code}: {combined}"
            )));
        }
        Ok(combined)
    }

    async fn delete_job(&self, _name: &str) -> Result<()> {
        // One-off containers are ephemeral; nothing to tear down.
        Ok(())
    }

    async fn update_schedule(&self, _name: &str, _spec: &str) -> Result<()> {
        // Scheduling for the local provider lives in the in-process scheduler.
        Ok(())
    }
}
