use crate::config::Config;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{info, warn};
use std::fs::File;
use std::path::Path;

/// Load, parse and validate a network description from a YAML file
pub fn load_config(config_path: &Path) -> Result<Config> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open configuration file '{}'", config_path.display()))?;

    let config: Config = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse configuration file '{}'", config_path.display()))?;

    config.validate()?;

    Ok(config)
}

/// Apply command-line overrides and validate the result
pub fn apply_cli_overrides(config: &mut Config, rank: Option<usize>, threads: Option<usize>) -> Result<()> {
    if let Some(rank) = rank {
        info!("Overriding rank: {} -> {}", config.general.rank, rank);
    }
    if let Some(threads) = threads {
        info!("Overriding threads per rank: {} -> {}", config.general.threads, threads);
    }
    config.apply_overrides(rank, threads);
    config.validate()?;

    if config.populations.iter().all(|p| p.size == 0) {
        warn!("Configuration creates no nodes");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CONFIG: &str = r#"
general:
  ranks: 2
  threads: 2
  seed: 3
populations:
  - name: exc
    model: iaf_psc_alpha
    size: 40
projections:
  - source: exc
    target: exc
    conn:
      rule: pairwise_bernoulli
      p: 0.1
      allow_autapses: false
"#;

    #[test]
    fn test_load_config() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", CONFIG).unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.general.ranks, 2);
        assert_eq!(config.populations[0].size, 40);
        assert_eq!(config.projections[0].conn.rule, "pairwise_bernoulli");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", CONFIG.replace("target: exc", "target: inh")).unwrap();
        let err = load_config(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("unknown target population 'inh'"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/network.yaml")).unwrap_err();
        assert!(err.to_string().contains("Failed to open configuration file"));
    }

    #[test]
    fn test_apply_overrides() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", CONFIG).unwrap();
        let mut config = load_config(temp_file.path()).unwrap();

        apply_cli_overrides(&mut config, Some(1), Some(4)).unwrap();
        assert_eq!(config.general.rank, 1);
        assert_eq!(config.general.threads, 4);

        assert!(apply_cli_overrides(&mut config, Some(2), None).is_err());
    }
}
