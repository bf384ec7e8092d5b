use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Global configuration loaded from `~/.config/cruncher/config.toml`.
/// CLI flags override these values per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CruncherConfig {
    /// Maximum concurrently running conversion jobs.
    pub max_jobs: usize,
    /// Program token that marks a job as staging-eligible; jobs run by any
    /// other program bypass the buffer tiers.
    pub staging_tool: String,
    /// Allow pre-buffer eviction to delete a staged input while the job
    /// consuming it is still running (the historic behavior). Leave off
    /// unless the conversion tool is known to read its input up front.
    #[serde(default)]
    pub evict_pre_before_job_done: bool,
}

impl Default for CruncherConfig {
    fn default() -> Self {
        Self {
            max_jobs: 10,
            staging_tool: "magick".to_string(),
            evict_pre_before_job_done: false,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("cruncher")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<CruncherConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = CruncherConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: CruncherConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = CruncherConfig::default();
        assert_eq!(cfg.max_jobs, 10);
        assert_eq!(cfg.staging_tool, "magick");
        assert!(!cfg.evict_pre_before_job_done);
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = CruncherConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: CruncherConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.max_jobs, cfg.max_jobs);
        assert_eq!(parsed.staging_tool, cfg.staging_tool);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            max_jobs = 4
            staging_tool = "convert"
            evict_pre_before_job_done = true
        "#;
        let cfg: CruncherConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.max_jobs, 4);
        assert_eq!(cfg.staging_tool, "convert");
        assert!(cfg.evict_pre_before_job_done);
    }

    #[test]
    fn config_toml_missing_optional_field() {
        let toml = r#"
            max_jobs = 2
            staging_tool = "magick"
        "#;
        let cfg: CruncherConfig = toml::from_str(toml).unwrap();
        assert!(!cfg.evict_pre_before_job_done);
    }
}
