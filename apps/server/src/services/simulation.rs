// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! OpenStudio invocation.
//!
//! Every run gets its own temporary directory seeded from the workflow
//! template, so concurrent requests never share a gbXML path or a `run/`
//! tree. A semaphore bounds how many simulator processes run at once; the
//! child is killed when the request future is dropped.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::process::Command;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::config::Config;

/// Output directory the workflow writes into, relative to the run directory.
const OUTPUT_DIR: &str = "run";
const STDOUT_LOG: &str = "openstudio.log";
const STDERR_LOG: &str = "openstudio.err";
const REPORT_NAMES: [&str; 2] = ["eplustbl.htm", "eplustbl.html"];

/// Simulation failures.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Workflow directory not found: {}", .0.display())]
    WorkflowMissing(PathBuf),

    #[error("Failed to start simulator '{bin}': {source}")]
    Spawn {
        bin: String,
        #[source]
        source: io::Error,
    },

    #[error("Simulator exited with {}", describe_exit(.code))]
    ExternalProcessFailure { code: Option<i32> },

    #[error("eplustbl.htm not found under {}", .0.display())]
    ReportNotFound(PathBuf),

    #[error("Simulation queue closed")]
    QueueClosed,

    #[error("Run directory I/O failed: {0}")]
    Io(#[from] io::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// Where and how the simulator runs.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub simulator_bin: String,
    pub workflow_dir: PathBuf,
    pub workflow_file: String,
    pub gbxml_relative_path: PathBuf,
    pub run_root: Option<PathBuf>,
    pub keep_run_dirs: bool,
}

impl From<&Config> for RunnerConfig {
    fn from(config: &Config) -> Self {
        Self {
            simulator_bin: config.simulator_bin.clone(),
            workflow_dir: config.workflow_dir.clone(),
            workflow_file: config.workflow_file.clone(),
            gbxml_relative_path: config.gbxml_relative_path.clone(),
            run_root: config.run_root.clone(),
            keep_run_dirs: config.keep_run_dirs,
        }
    }
}

/// A finished simulation.
#[derive(Debug, Clone)]
pub struct SimulationOutput {
    pub run_id: Uuid,
    pub report_html: String,
    /// Report location relative to the run directory.
    pub report_path: PathBuf,
    pub queue_time: Duration,
    pub run_time: Duration,
}

/// Runs the simulator, at most `max_concurrent` at a time.
#[derive(Debug)]
pub struct SimulationRunner {
    config: RunnerConfig,
    permits: Semaphore,
    max_concurrent: usize,
}

impl SimulationRunner {
    pub fn new(config: RunnerConfig, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            config,
            permits: Semaphore::new(max_concurrent),
            max_concurrent,
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Simulations that could start right now.
    pub fn available_slots(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Write `gbxml` into a fresh run directory, run the workflow and return
    /// the tabular HTML report.
    pub async fn run(&self, gbxml: &[u8]) -> Result<SimulationOutput, SimulationError> {
        let run_id = Uuid::new_v4();
        let queued_at = Instant::now();
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| SimulationError::QueueClosed)?;
        let queue_time = queued_at.elapsed();

        if !self.config.workflow_dir.is_dir() {
            return Err(SimulationError::WorkflowMissing(
                self.config.workflow_dir.clone(),
            ));
        }

        let run_dir = self.create_run_dir(run_id)?;
        let dir = run_dir.path().to_path_buf();
        tracing::info!(
            run_id = %run_id,
            run_dir = %dir.display(),
            queue_ms = queue_time.as_millis() as u64,
            "Starting simulation"
        );

        let template = self.config.workflow_dir.clone();
        let target = dir.clone();
        tokio::task::spawn_blocking(move || copy_workflow(&template, &target))
            .await
            .map_err(io::Error::other)??;

        let gbxml_path = dir.join(&self.config.gbxml_relative_path);
        if let Some(parent) = gbxml_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&gbxml_path, gbxml).await?;

        let output_dir = dir.join(OUTPUT_DIR);
        match tokio::fs::remove_dir_all(&output_dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let started = Instant::now();
        self.execute(&dir).await?;
        let run_time = started.elapsed();

        let search_root = output_dir.clone();
        let report = tokio::task::spawn_blocking(move || find_report(&search_root))
            .await
            .map_err(io::Error::other)??
            .ok_or_else(|| SimulationError::ReportNotFound(output_dir.clone()))?;
        let report_html = String::from_utf8_lossy(&tokio::fs::read(&report).await?).into_owned();
        let report_path = report.strip_prefix(&dir).unwrap_or(&report).to_path_buf();

        tracing::info!(
            run_id = %run_id,
            elapsed_ms = run_time.as_millis() as u64,
            report = %report_path.display(),
            report_bytes = report_html.len(),
            "Simulation finished"
        );

        if self.config.keep_run_dirs {
            tracing::debug!(run_id = %run_id, run_dir = %dir.display(), "Keeping run directory");
        }

        Ok(SimulationOutput {
            run_id,
            report_html,
            report_path,
            queue_time,
            run_time,
        })
    }

    fn create_run_dir(&self, run_id: Uuid) -> Result<tempfile::TempDir, SimulationError> {
        let prefix = format!("studiox-run-{}-", run_id.simple());
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix).keep(self.config.keep_run_dirs);
        let dir = match &self.config.run_root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        Ok(dir)
    }

    /// `<bin> run -w <workflow>` inside `dir`, output captured to log files.
    async fn execute(&self, dir: &Path) -> Result<(), SimulationError> {
        let stdout = std::fs::File::create(dir.join(STDOUT_LOG))?;
        let stderr = std::fs::File::create(dir.join(STDERR_LOG))?;

        let status = Command::new(&self.config.simulator_bin)
            .arg("run")
            .arg("-w")
            .arg(&self.config.workflow_file)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|source| SimulationError::Spawn {
                bin: self.config.simulator_bin.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            tracing::warn!(
                code = ?status.code(),
                log = %dir.join(STDERR_LOG).display(),
                "Simulator failed"
            );
            Err(SimulationError::ExternalProcessFailure {
                code: status.code(),
            })
        }
    }
}

/// Copy the workflow template into `target`, leaving out a stale output
/// directory.
fn copy_workflow(template: &Path, target: &Path) -> io::Result<()> {
    for entry in std::fs::read_dir(template)? {
        let entry = entry?;
        if entry.file_name() == OUTPUT_DIR {
            continue;
        }
        copy_entry(&entry.path(), &target.join(entry.file_name()))?;
    }
    Ok(())
}

fn copy_entry(source: &Path, target: &Path) -> io::Result<()> {
    if source.is_dir() {
        std::fs::create_dir_all(target)?;
        for entry in std::fs::read_dir(source)? {
            let entry = entry?;
            copy_entry(&entry.path(), &target.join(entry.file_name()))?;
        }
    } else {
        std::fs::copy(source, target)?;
    }
    Ok(())
}

/// Depth-first search for the tabular report; the first match wins.
/// Matching ignores ASCII case. A missing `root` yields `None`.
pub fn find_report(root: &Path) -> io::Result<Option<PathBuf>> {
    if !root.is_dir() {
        return Ok(None);
    }
    let mut stack = vec![root.to_path_buf()];
    while let Some(current) = stack.pop() {
        let mut entries: Vec<_> = std::fs::read_dir(&current)?.collect::<Result<_, _>>()?;
        entries.sort_by_key(|e| e.file_name());
        for entry in entries {
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                stack.push(path);
            } else if is_report_name(&entry.file_name().to_string_lossy()) {
                return Ok(Some(path));
            }
        }
    }
    Ok(None)
}

fn is_report_name(name: &str) -> bool {
    REPORT_NAMES.iter().any(|r| name.eq_ignore_ascii_case(r))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn workflow(root: &Path) -> PathBuf {
        let dir = root.join("workflow");
        fs::create_dir_all(dir.join("gbxmls")).unwrap();
        fs::create_dir_all(dir.join("run")).unwrap();
        fs::write(dir.join("convert.osw"), "{}").unwrap();
        fs::write(dir.join("run").join("eplustbl.htm"), "stale").unwrap();
        dir
    }

    fn runner(root: &Path, bin: &str) -> SimulationRunner {
        SimulationRunner::new(
            RunnerConfig {
                simulator_bin: bin.to_string(),
                workflow_dir: workflow(root),
                workflow_file: "convert.osw".to_string(),
                gbxml_relative_path: PathBuf::from("gbxmls/test.xml"),
                run_root: Some(root.join("runs")),
                keep_run_dirs: false,
            },
            1,
        )
    }

    #[test]
    fn test_report_name_match_is_case_insensitive() {
        assert!(is_report_name("eplustbl.htm"));
        assert!(is_report_name("EPLUSTBL.HTML"));
        assert!(is_report_name("eplusTbl.Htm"));
        assert!(!is_report_name("eplustbl.csv"));
        assert!(!is_report_name("xeplustbl.htm"));
    }

    #[test]
    fn test_find_report_depth_first() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("b").join("reports");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir_all(root.path().join("a")).unwrap();
        fs::write(nested.join("EplusTbl.HTM"), "<html/>").unwrap();
        fs::write(root.path().join("a").join("eplusout.err"), "").unwrap();

        let found = find_report(root.path()).unwrap().unwrap();
        assert_eq!(found, nested.join("EplusTbl.HTM"));
        assert_eq!(find_report(&root.path().join("missing")).unwrap(), None);
    }

    #[test]
    fn test_copy_workflow_skips_output_dir() {
        let root = tempfile::tempdir().unwrap();
        let template = workflow(root.path());
        let target = root.path().join("copy");
        fs::create_dir_all(&target).unwrap();

        copy_workflow(&template, &target).unwrap();
        assert!(target.join("convert.osw").is_file());
        assert!(target.join("gbxmls").is_dir());
        assert!(!target.join("run").exists());
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_process_failure() {
        let root = tempfile::tempdir().unwrap();
        let runner = runner(root.path(), "false");
        let err = runner.run(b"<gbXML/>").await.unwrap_err();
        assert!(matches!(err, SimulationError::ExternalProcessFailure { code: Some(1) }));
        assert_eq!(runner.available_slots(), 1);
    }

    #[tokio::test]
    async fn test_clean_exit_without_report() {
        let root = tempfile::tempdir().unwrap();
        let runner = runner(root.path(), "true");
        let err = runner.run(b"<gbXML/>").await.unwrap_err();
        assert!(matches!(err, SimulationError::ReportNotFound(_)));

        // Temporary run directories are removed afterwards.
        let leftovers = fs::read_dir(root.path().join("runs")).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let root = tempfile::tempdir().unwrap();
        let runner = runner(root.path(), "studiox-no-such-simulator");
        let err = runner.run(b"<gbXML/>").await.unwrap_err();
        assert!(matches!(err, SimulationError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_missing_workflow_dir() {
        let root = tempfile::tempdir().unwrap();
        let mut config = runner(root.path(), "true").config().clone();
        config.workflow_dir = root.path().join("nope");
        let err = SimulationRunner::new(config, 1).run(b"").await.unwrap_err();
        assert!(matches!(err, SimulationError::WorkflowMissing(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_run_returns_report() {
        use std::os::unix::fs::PermissionsExt;

        let root = tempfile::tempdir().unwrap();
        let script = root.path().join("fake-openstudio");
        fs::write(
            &script,
            "#!/bin/sh\n\
             test \"$1\" = run || exit 2\n\
             test -f gbxmls/test.xml || exit 3\n\
             mkdir -p run/ModelToIdf/EnergyPlus-0\n\
             cp gbxmls/test.xml run/ModelToIdf/EnergyPlus-0/EPLUSTBL.HTM\n\
             echo done\n",
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let mut config = runner(root.path(), "true").config().clone();
        config.simulator_bin = script.to_string_lossy().into_owned();
        config.keep_run_dirs = true;
        let runner = SimulationRunner::new(config, 2);

        let output = runner.run(b"<html>report</html>").await.unwrap();
        assert_eq!(output.report_html, "<html>report</html>");
        assert_eq!(
            output.report_path,
            PathBuf::from("run/ModelToIdf/EnergyPlus-0/EPLUSTBL.HTM")
        );

        let runs: Vec<_> = fs::read_dir(root.path().join("runs")).unwrap().collect();
        assert_eq!(runs.len(), 1);
        let run_dir = runs[0].as_ref().unwrap().path();
        let log = fs::read_to_string(run_dir.join(STDOUT_LOG)).unwrap();
        assert_eq!(log.trim(), "done");
    }
}
