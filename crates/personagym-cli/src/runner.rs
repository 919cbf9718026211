//! Local scenario runner: start the agents, wait for them, run one evaluation.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use futures::future::try_join_all;
use personagym_core::protocol::normalize_base_url;
use personagym_core::{ErrorBody, EvalError, EvalResponse, Scenario};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// How long to wait for every agent to report healthy.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(30);

const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Options for [`run_scenario`].
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub show_logs: bool,
    pub serve_only: bool,
    pub ready_timeout: Duration,
}

/// Agent processes started by the runner.
///
/// Each agent runs in its own process group so that everything its shell
/// command starts is stopped with it. Dropping this kills the groups.
pub struct AgentProcesses {
    children: Vec<(String, Child)>,
}

impl AgentProcesses {
    /// Start every agent in `scenario` that has a command.
    pub fn spawn(scenario: &Scenario, show_logs: bool) -> Result<Self> {
        let mut agents = Self {
            children: Vec::new(),
        };
        for (name, _, cmd) in scenario.commands() {
            info!(agent = %name, cmd = %cmd, "starting agent");
            let child = spawn_shell(cmd, show_logs)
                .with_context(|| format!("Failed to start {}: {}", name, cmd))?;
            agents.children.push((name, child));
        }
        Ok(agents)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Fail if any agent has already exited.
    pub fn check_alive(&mut self) -> Result<()> {
        for (name, child) in &mut self.children {
            if let Some(status) = child.try_wait()? {
                bail!("{} exited early with {}", name, status);
            }
        }
        Ok(())
    }

    /// Kill every agent's process group and wait for the agent to exit.
    pub async fn shutdown(mut self) {
        for (name, child) in &mut self.children {
            kill_process_group(name, child);
            if let Err(e) = child.kill().await {
                warn!(agent = %name, error = %e, "failed to stop agent");
            }
        }
        self.children.clear();
    }
}

impl Drop for AgentProcesses {
    fn drop(&mut self) {
        for (name, child) in &self.children {
            kill_process_group(name, child);
        }
    }
}

fn spawn_shell(cmd: &str, show_logs: bool) -> std::io::Result<Child> {
    let (stdout, stderr) = if show_logs {
        (Stdio::inherit(), Stdio::inherit())
    } else {
        (Stdio::null(), Stdio::null())
    };

    let mut command = Command::new("sh");
    command
        .arg("-c")
        .arg(cmd)
        .stdin(Stdio::null())
        .stdout(stdout)
        .stderr(stderr)
        .kill_on_drop(true);
    #[cfg(unix)]
    command.process_group(0);
    command.spawn()
}

/// SIGKILL the group led by `child`. A reaped child has no id and is skipped.
#[cfg(unix)]
fn kill_process_group(name: &str, child: &Child) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    if let Some(pid) = child.id() {
        if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            debug!(agent = %name, error = %e, "process group already gone");
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_name: &str, _child: &Child) {}

/// Poll `GET {endpoint}/health` until it answers 2xx or `timeout` passes.
pub async fn wait_ready(
    client: &reqwest::Client,
    endpoint: &str,
    timeout: Duration,
) -> personagym_core::Result<()> {
    let url = format!("{}/health", normalize_base_url(endpoint)?);
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        match client
            .get(&url)
            .timeout(READY_POLL_INTERVAL * 4)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                debug!(url = %url, "agent ready");
                return Ok(());
            }
            Ok(response) => debug!(url = %url, status = %response.status(), "agent not ready"),
            Err(e) => debug!(url = %url, error = %e, "agent not reachable yet"),
        }

        if tokio::time::Instant::now() + READY_POLL_INTERVAL > deadline {
            return Err(EvalError::connectivity(
                url,
                format!("not ready after {:.1}s", timeout.as_secs_f64()),
            ));
        }
        tokio::time::sleep(READY_POLL_INTERVAL).await;
    }
}

/// POST the scenario's evaluation request to its evaluator.
pub async fn request_evaluation(
    client: &reqwest::Client,
    scenario: &Scenario,
) -> Result<EvalResponse> {
    let url = format!("{}/evaluate", normalize_base_url(&scenario.green_agent.endpoint)?);
    info!(url = %url, "requesting evaluation");

    let response = client
        .post(&url)
        .json(&scenario.eval_request())
        .send()
        .await
        .with_context(|| format!("Failed to reach evaluator at {}", url))?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => bail!("evaluation failed ({}): {}: {}", status, body.error, body.message),
            Err(_) => bail!("evaluation failed ({}): {}", status, text),
        }
    }

    response
        .json::<EvalResponse>()
        .await
        .context("Evaluator returned an unreadable report")
}

/// Run the scenario at `path`.
pub async fn run_scenario(path: &std::path::Path, options: RunOptions) -> Result<()> {
    let scenario = Scenario::load(path)
        .with_context(|| format!("Failed to load scenario {}", path.display()))?;

    let mut agents = AgentProcesses::spawn(&scenario, options.show_logs)?;
    info!(started = agents.len(), "agents launched");

    let client = reqwest::Client::new();
    let endpoints: Vec<&str> = std::iter::once(scenario.green_agent.endpoint.as_str())
        .chain(scenario.participants.iter().map(|p| p.endpoint.as_str()))
        .collect();

    let ready = try_join_all(
        endpoints
            .iter()
            .map(|endpoint| wait_ready(&client, endpoint, options.ready_timeout)),
    );
    let outcome = tokio::select! {
        result = ready => result.map(|_| ()).context("Agents did not become ready"),
        _ = tokio::signal::ctrl_c() => Err(anyhow::anyhow!("interrupted")),
    };
    if let Err(e) = outcome {
        agents.shutdown().await;
        return Err(e);
    }
    agents.check_alive()?;
    info!("all agents ready");

    if options.serve_only {
        println!("Agents are running. Press Ctrl-C to stop.");
        tokio::signal::ctrl_c().await.ok();
        agents.shutdown().await;
        return Ok(());
    }

    let result = tokio::select! {
        result = request_evaluation(&client, &scenario) => result,
        _ = tokio::signal::ctrl_c() => Err(anyhow::anyhow!("interrupted")),
    };
    agents.shutdown().await;

    let evaluation = result?;
    println!("{}", evaluation.summary);
    println!();
    println!("{}", serde_json::to_string_pretty(&evaluation.response)?);
    Ok(())
}
