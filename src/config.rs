//! Loading `config.toml` for the command runner.
//!
//! ```toml
//! [sheet]
//! max_operations = 50000
//! max_expr_depth = 32
//! ```

use directories::ProjectDirs;
use gridcalc_core::SheetConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    sheet: Option<SheetConfig>,
}

/// Load sheet settings from `config_file`, or from the user's config dir.
///
/// Never fails: problems are returned as warnings and defaults are used.
/// A missing default file is not worth a warning, a missing explicit one is.
pub fn load_config(config_file: Option<&PathBuf>) -> (SheetConfig, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let config_path = config_file.cloned().or_else(user_config_path);

    let Some(path) = config_path else {
        return (SheetConfig::default(), warnings);
    };
    if !path.exists() {
        if config_file.is_some() {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
        return (SheetConfig::default(), warnings);
    }

    let config = match read_config(&path) {
        Ok(config) => config,
        Err(warning) => {
            warnings.push(warning);
            SheetConfig::default()
        }
    };
    (config, warnings)
}

fn read_config(path: &Path) -> Result<SheetConfig, String> {
    let meta = std::fs::metadata(path)
        .map_err(|err| format!("Failed to read metadata for {}: {}", path.display(), err))?;
    if meta.len() > MAX_CONFIG_FILE_BYTES {
        return Err(format!(
            "Refusing to read {}: file too large ({} bytes, max {})",
            path.display(),
            meta.len(),
            MAX_CONFIG_FILE_BYTES
        ));
    }
    let content = std::fs::read_to_string(path)
        .map_err(|err| format!("Failed to read {}: {}", path.display(), err))?;
    parse_config(&content).map_err(|err| format!("Failed to parse {}: {}", path.display(), err))
}

fn parse_config(content: &str) -> Result<SheetConfig, toml::de::Error> {
    let file: ConfigFile = toml::from_str(content)?;
    Ok(file.sheet.unwrap_or_default())
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "gridcalc")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}
