//! Search configuration files.
//!
//! The file is a JSON object with the fields of `SearchConfig`; missing
//! fields keep their defaults.

use std::fs;
use std::path::Path;

use obstacle_search::SearchConfig;

use crate::error::Result;

/// Loads a configuration file, or the defaults when `path` is None.
///
/// The result is validated before it is returned.
pub fn load_search_config(path: Option<&Path>) -> Result<SearchConfig> {
    let config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            let config: SearchConfig = serde_json::from_str(&content)?;
            log::info!("Loaded search configuration from {}", path.display());
            config
        }
        None => SearchConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RunnerError;
    use obstacle_search::core::MutationOperator;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_without_file() {
        let config = load_search_config(None).unwrap();
        assert_eq!(config.threshold_distance, 3.0);
        assert_eq!(config.spiral.num_points, 3500);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = NamedTempFile::new().unwrap();
        fs::write(
            file.path(),
            r#"{"stagnation_limit": 4, "mutation_operator": "block", "seed": 9,
                "area": {"min": {"x": 0, "y": 0}, "max": {"x": 50, "y": 50}}}"#,
        )
        .unwrap();

        let config = load_search_config(Some(file.path())).unwrap();
        assert_eq!(config.stagnation_limit, 4);
        assert_eq!(config.mutation_operator, MutationOperator::Block);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.area.max.x, 50.0);
        assert_eq!(config.angle_step, 10.0);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), r#"{"round_step": 0}"#).unwrap();
        assert!(matches!(
            load_search_config(Some(file.path())),
            Err(RunnerError::Search(obstacle_search::Error::InvalidConfig(_)))
        ));
    }
}
