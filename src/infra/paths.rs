// src/infra/paths.rs - Config file location
//
// HOCTAP_HOME overrides everything. Otherwise config lives in ~/.hoctap/,
// or ./.hoctap/ when no home directory can be determined.

use std::path::PathBuf;

fn hoctap_home() -> Option<PathBuf> {
    std::env::var_os("HOCTAP_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Configuration directory: $HOCTAP_HOME/ or ~/.hoctap/
pub fn config_dir() -> PathBuf {
    if let Some(home) = hoctap_home() {
        return home;
    }
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".hoctap"))
        .unwrap_or_else(|| PathBuf::from(".hoctap"))
}

/// Config file path
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_is_inside_config_dir() {
        let file = config_file_path();
        assert_eq!(file.parent(), Some(config_dir().as_path()));
        assert_eq!(file.file_name().and_then(|n| n.to_str()), Some("config.toml"));
    }
}
