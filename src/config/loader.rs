use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::core::ProfileConfig;
use crate::errors::{Error, Result};

/// File name searched for when no profile path is given
pub const PROFILE_FILE_NAME: &str = "corpuslens.toml";

/// Pure function to read config file contents
pub(crate) fn read_config_file(path: &Path) -> std::result::Result<String, std::io::Error> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Pure function to parse and validate a profile config from a TOML string
pub fn parse_and_validate_config(contents: &str) -> std::result::Result<ProfileConfig, String> {
    let config = toml::from_str::<ProfileConfig>(contents)
        .map_err(|e| format!("Failed to parse profile: {}", e))?;

    if config.language.code.trim().is_empty() {
        return Err("language.code must not be empty".to_string());
    }
    config.thresholds.validate()?;

    if let Some(enabled) = &config.modules.enabled {
        for name in enabled.iter().filter(|name| config.modules.disabled.contains(name)) {
            log::warn!("Module '{}' is both enabled and disabled; it will not run", name);
        }
    }

    Ok(config)
}

/// Reads and parses a profile file. Any failure is a configuration error.
pub fn load_profile_config(path: &Path) -> Result<ProfileConfig> {
    let contents = read_config_file(path).map_err(|e| {
        handle_read_error(path, &e);
        Error::config(
            format!("cannot read {}: {}", path.display(), e),
            Some(path.to_path_buf()),
        )
    })?;

    let config = parse_and_validate_config(&contents)
        .map_err(|message| Error::config(message, Some(path.to_path_buf())))?;
    log::debug!("Loaded profile config from {}", path.display());
    Ok(config)
}

/// Handle file read errors with appropriate logging
pub(crate) fn handle_read_error(config_path: &Path, error: &std::io::Error) {
    // Only log actual errors, not "file not found"
    if error.kind() != std::io::ErrorKind::NotFound {
        log::warn!(
            "Failed to read profile file {}: {}",
            config_path.display(),
            error
        );
    }
}

/// Pure function to generate directory ancestors up to a depth limit
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

/// Finds the nearest `corpuslens.toml` at or above `start`.
pub fn discover_profile_path(start: &Path) -> Option<PathBuf> {
    const MAX_TRAVERSAL_DEPTH: usize = 10;

    let found = directory_ancestors(start.to_path_buf(), MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(PROFILE_FILE_NAME))
        .find(|path| path.is_file());
    if found.is_none() {
        log::debug!(
            "No {} found after checking {} directories",
            PROFILE_FILE_NAME,
            MAX_TRAVERSAL_DEPTH
        );
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_minimal_profile() {
        let config = parse_and_validate_config("[language]\ncode = \"fr\"\n").unwrap();
        assert_eq!(config.language.code, "fr");
        assert!(config.modules.enabled.is_none());
        assert!(config.resources.is_empty());
    }

    #[test]
    fn test_parse_rejects_missing_language() {
        let err = parse_and_validate_config("[modules]\ndisabled = []\n").unwrap_err();
        assert!(err.contains("language"), "{err}");
    }

    #[test]
    fn test_parse_rejects_blank_code_and_bad_thresholds() {
        assert!(parse_and_validate_config("[language]\ncode = \" \"\n").is_err());
        let err = parse_and_validate_config(indoc! {r#"
            [language]
            code = "fr"

            [thresholds.structural]
            min_words = 50
            max_words = 10
        "#})
        .unwrap_err();
        assert!(err.contains("min_words"), "{err}");
    }

    #[test]
    fn test_parse_full_profile() {
        let config = parse_and_validate_config(indoc! {r#"
            [language]
            code = "fr"
            name = "French"

            [tokenization]
            method = "model-based"

            [modules]
            enabled = ["structural", "diversity"]
            disabled = ["diversity"]

            [resources.lexicon]
            path = "lexicon.txt"
            kind = "frequency"
        "#})
        .unwrap();
        assert_eq!(config.language.name.as_deref(), Some("French"));
        assert_eq!(config.modules.disabled, vec!["diversity"]);
        assert_eq!(config.resources["lexicon"].path, PathBuf::from("lexicon.txt"));
    }

    #[test]
    fn test_load_profile_config_missing_file() {
        let err = load_profile_config(Path::new("/nonexistent/fr.toml")).unwrap_err();
        assert!(matches!(err, Error::Config { path: Some(_), .. }));
    }

    #[test]
    fn test_discover_profile_path_walks_up() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join(PROFILE_FILE_NAME), "[language]\ncode = \"fr\"\n").unwrap();
        assert_eq!(
            discover_profile_path(&nested),
            Some(dir.path().join(PROFILE_FILE_NAME))
        );
    }

    #[test]
    fn test_directory_ancestors_respects_depth() {
        let dirs: Vec<_> = directory_ancestors(PathBuf::from("/a/b/c"), 2).collect();
        assert_eq!(dirs, vec![PathBuf::from("/a/b/c"), PathBuf::from("/a/b")]);
    }
}
