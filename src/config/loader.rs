use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use super::core::BenchmineConfig;

pub const CONFIG_FILE_NAME: &str = ".benchmine.toml";
const MAX_TRAVERSAL_DEPTH: usize = 10;

pub(crate) fn read_config_file(path: &Path) -> Result<String, std::io::Error> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Parse and validate config from a TOML string
pub fn parse_and_validate_config(contents: &str) -> Result<BenchmineConfig, String> {
    let config = toml::from_str::<BenchmineConfig>(contents)
        .map_err(|e| format!("Failed to parse {}: {}", CONFIG_FILE_NAME, e))?;

    let band = config.complexity_band();
    if band.min_cyclomatic > band.max_cyclomatic {
        return Err(format!(
            "min_cyclomatic ({}) is greater than max_cyclomatic ({})",
            band.min_cyclomatic, band.max_cyclomatic
        ));
    }
    Ok(config)
}

pub(crate) fn try_load_config_from_path(config_path: &Path) -> Option<BenchmineConfig> {
    let contents = match read_config_file(config_path) {
        Ok(contents) => contents,
        Err(e) => {
            handle_read_error(config_path, &e);
            return None;
        }
    };

    match parse_and_validate_config(&contents) {
        Ok(config) => {
            log::debug!("Loaded config from {}", config_path.display());
            Some(config)
        }
        Err(e) => {
            log::warn!("{}. Using defaults.", e);
            None
        }
    }
}

/// Only log actual errors, not "file not found"
pub(crate) fn handle_read_error(config_path: &Path, error: &std::io::Error) {
    if error.kind() != std::io::ErrorKind::NotFound {
        log::warn!(
            "Failed to read config file {}: {}",
            config_path.display(),
            error
        );
    }
}

/// `start` and its parents, nearest first, at most `max_depth` entries
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Find `.benchmine.toml` in `start` or one of its ancestors
pub fn load_config_from(start: PathBuf) -> BenchmineConfig {
    directory_ancestors(start, MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find_map(|path| try_load_config_from_path(&path))
        .unwrap_or_else(|| {
            log::debug!(
                "No config found after checking {} directories. Using default config.",
                MAX_TRAVERSAL_DEPTH
            );
            BenchmineConfig::default()
        })
}

pub fn load_config() -> BenchmineConfig {
    match std::env::current_dir() {
        Ok(dir) => load_config_from(dir),
        Err(e) => {
            log::warn!(
                "Failed to get current directory: {}. Using default config.",
                e
            );
            BenchmineConfig::default()
        }
    }
}

/// Load an explicitly requested config file. Unlike discovery, a missing or
/// invalid file is an error.
pub fn load_config_file(path: &Path) -> Result<BenchmineConfig> {
    let contents = read_config_file(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    parse_and_validate_config(&contents)
        .map_err(|e| anyhow::anyhow!("{} ({})", e, path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use tempfile::TempDir;

    #[test]
    fn test_directory_ancestors_depth() {
        let dirs: Vec<_> = directory_ancestors(PathBuf::from("/a/b/c"), 2).collect();
        assert_eq!(dirs, vec![PathBuf::from("/a/b/c"), PathBuf::from("/a/b")]);
    }

    #[test]
    fn test_discovers_config_in_parent() {
        let root = TempDir::new().unwrap();
        let nested = root.path().join("pkg").join("sub");
        fs::create_dir_all(&nested).unwrap();
        fs::write(
            root.path().join(CONFIG_FILE_NAME),
            indoc! {"
                [selection]
                expansion_depth = 1
            "},
        )
        .unwrap();

        let config = load_config_from(nested);
        assert_eq!(config.expansion_depth(), 1);
    }

    #[test]
    fn test_invalid_band_is_rejected() {
        let result = parse_and_validate_config(indoc! {"
            [complexity]
            min_cyclomatic = 12
            max_cyclomatic = 3
        "});
        assert!(result.is_err());
    }

    #[test]
    fn test_explicit_file_errors() {
        let dir = TempDir::new().unwrap();
        assert!(load_config_file(&dir.path().join("missing.toml")).is_err());

        let bad = dir.path().join("bad.toml");
        fs::write(&bad, "selection = 3").unwrap();
        assert!(load_config_file(&bad).is_err());
    }
}
