//! Differ settings loaded from a TOML file.

use std::path::Path;

use anyhow::Context;
use docsync_delta::DifferConfig;

/// Load differ settings, falling back to defaults when no file is given.
///
/// Missing keys take their default values.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<DifferConfig> {
    let Some(path) = path else {
        return Ok(DifferConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: DifferConfig =
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
    tracing::debug!(path = %path.display(), ?config, "loaded config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn no_file_gives_defaults() {
        assert_eq!(load_config(None).unwrap(), DifferConfig::default());
    }

    #[test]
    fn reads_settings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "text_diff_min_length = 12").unwrap();
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.text_diff_min_length, 12);
        assert!(!config.array_move_detection);
    }

    #[test]
    fn empty_file_gives_defaults() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(load_config(Some(file.path())).unwrap(), DifferConfig::default());
    }

    #[test]
    fn rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "text_diff_min_length = \"many\"").unwrap();
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(err.to_string().starts_with("parsing config"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().starts_with("reading config"));
    }
}
