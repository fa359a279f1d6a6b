//! Grader configuration stored in `grader.toml`.
//!
//! Every field is optional in the file; CLI flags override what the file sets.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::process::CallLimits;

/// File name looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "grader.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GraderConfig {
    /// Candidate executable to grade.
    pub solution_path: PathBuf,

    /// Text report, overwritten on every run.
    pub report_path: PathBuf,

    /// JSON run summary written beside the text report.
    pub summary_path: PathBuf,

    /// Wall-clock budget for each candidate process, in seconds.
    pub call_timeout_secs: u64,

    /// Candidate stdout beyond this many bytes fails the call; stderr is cut.
    pub output_limit_bytes: usize,
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self {
            solution_path: PathBuf::from("solution"),
            report_path: PathBuf::from("report.txt"),
            summary_path: PathBuf::from("report.json"),
            call_timeout_secs: 10,
            output_limit_bytes: 100_000,
        }
    }
}

/// Values supplied on the command line; `None` keeps the configured value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub solution_path: Option<PathBuf>,
    pub report_path: Option<PathBuf>,
    pub summary_path: Option<PathBuf>,
    pub call_timeout_secs: Option<u64>,
}

impl GraderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.solution_path.as_os_str().is_empty() {
            return Err(anyhow!("solution_path must be non-empty"));
        }
        if self.report_path.as_os_str().is_empty() {
            return Err(anyhow!("report_path must be non-empty"));
        }
        if self.summary_path.as_os_str().is_empty() {
            return Err(anyhow!("summary_path must be non-empty"));
        }
        if self.call_timeout_secs == 0 {
            return Err(anyhow!("call_timeout_secs must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        Ok(())
    }

    pub fn limits(&self) -> CallLimits {
        CallLimits {
            timeout: Duration::from_secs(self.call_timeout_secs),
            output_limit_bytes: self.output_limit_bytes,
        }
    }

    /// Apply CLI overrides, then validate.
    pub fn with_overrides(mut self, overrides: Overrides) -> Result<Self> {
        if let Some(path) = overrides.solution_path {
            self.solution_path = path;
        }
        if let Some(path) = overrides.report_path {
            self.report_path = path;
        }
        if let Some(path) = overrides.summary_path {
            self.summary_path = path;
        }
        if let Some(secs) = overrides.call_timeout_secs {
            self.call_timeout_secs = secs;
        }
        self.validate()?;
        Ok(self)
    }

    /// Resolve relative paths against `base`.
    fn resolve_against(mut self, base: &Path) -> Self {
        self.solution_path = base.join(&self.solution_path);
        self.report_path = base.join(&self.report_path);
        self.summary_path = base.join(&self.summary_path);
        self
    }
}

/// Load config from a TOML file.
///
/// Relative paths inside the file resolve against the file's directory.
pub fn load_config(path: &Path) -> Result<GraderConfig> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: GraderConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(cfg.resolve_against(base))
}

/// Load the explicit config, else `grader.toml` in `workdir`, else defaults.
pub fn discover_config(workdir: &Path, explicit: Option<&Path>) -> Result<GraderConfig> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    let candidate = workdir.join(DEFAULT_CONFIG_FILE);
    if candidate.exists() {
        return load_config(&candidate);
    }
    Ok(GraderConfig::default().resolve_against(workdir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_are_valid() {
        GraderConfig::default().validate().expect("valid defaults");
    }

    #[test]
    fn missing_file_falls_back_to_defaults_in_workdir() {
        let temp = tempdir().expect("tempdir");
        let cfg = discover_config(temp.path(), None).expect("discover");
        assert_eq!(cfg.solution_path, temp.path().join("solution"));
        assert_eq!(cfg.report_path, temp.path().join("report.txt"));
        assert_eq!(cfg.call_timeout_secs, 10);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = tempdir().expect("tempdir");
        fs::write(
            temp.path().join(DEFAULT_CONFIG_FILE),
            "solution_path = \"submissions/tracker.sh\"\ncall_timeout_secs = 3\n",
        )
        .expect("write config");

        let cfg = discover_config(temp.path(), None).expect("discover");
        assert_eq!(
            cfg.solution_path,
            temp.path().join("submissions/tracker.sh")
        );
        assert_eq!(cfg.call_timeout_secs, 3);
        assert_eq!(cfg.output_limit_bytes, 100_000);
        assert_eq!(cfg.summary_path, temp.path().join("report.json"));
    }

    #[test]
    fn rejects_zero_timeout() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("custom.toml");
        fs::write(&path, "call_timeout_secs = 0\n").expect("write config");
        let err = discover_config(temp.path(), Some(&path)).expect_err("invalid");
        assert!(format!("{err:#}").contains("call_timeout_secs"));
    }

    #[test]
    fn overrides_take_precedence() {
        let cfg = GraderConfig::default()
            .with_overrides(Overrides {
                solution_path: Some(PathBuf::from("/tmp/candidate")),
                call_timeout_secs: Some(2),
                ..Overrides::default()
            })
            .expect("overrides");
        assert_eq!(cfg.solution_path, PathBuf::from("/tmp/candidate"));
        assert_eq!(cfg.limits().timeout, Duration::from_secs(2));
        assert_eq!(cfg.report_path, PathBuf::from("report.txt"));
    }
}
