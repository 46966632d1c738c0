use crate::config::CONFIG_FILE_NAME;
use crate::io;
use anyhow::Result;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG: &str = r#"# Benchmine Configuration

[selection]
# Library roots a function may reference and still count as weakly
# self-contained. Omit to use the built-in list.
# allowed_libraries = ["math", "re", "json", "numpy"]
expansion_depth = 2

[complexity]
min_cyclomatic = 4
max_cyclomatic = 10
"#;

/// Write a starter `.benchmine.toml` into `dir`
pub fn init_config(dir: &Path, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    io::write_file(&config_path, DEFAULT_CONFIG)?;
    println!("Created {} configuration file", CONFIG_FILE_NAME);

    Ok(config_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_config_file, BenchmineConfig, DEFAULT_ALLOWED_LIBRARIES};
    use tempfile::TempDir;

    #[test]
    fn test_default_config_parses_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = init_config(dir.path(), false).unwrap();

        let config = load_config_file(&path).unwrap();
        let defaults = BenchmineConfig::default();
        assert_eq!(config.expansion_depth(), defaults.expansion_depth());
        assert_eq!(config.complexity_band(), defaults.complexity_band());
        assert_eq!(config.allowed_libraries(), *DEFAULT_ALLOWED_LIBRARIES);
    }

    #[test]
    fn test_refuses_to_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        init_config(dir.path(), false).unwrap();
        assert!(init_config(dir.path(), false).is_err());
        assert!(init_config(dir.path(), true).is_ok());
    }
}
