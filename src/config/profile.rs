use std::path::{Path, PathBuf};

use crate::error::TokenkeeperError;

use super::types::ClientProfile;

const PROFILE_EXTENSION: &str = "json";

pub fn profile_path(config_dir: &Path, name: &str) -> PathBuf {
    config_dir.join(format!("{name}.{PROFILE_EXTENSION}"))
}

/// Profile names double as file stems, so they cannot contain path components.
fn check_profile_name(config_dir: &Path, name: &str) -> Result<(), TokenkeeperError> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains('\0');
    if valid {
        Ok(())
    } else {
        Err(TokenkeeperError::ConfigError {
            path: config_dir.to_path_buf(),
            detail: format!("invalid profile name '{name}'"),
        })
    }
}

/// Load and validate the profile `<config_dir>/<name>.json`.
pub fn load_profile(config_dir: &Path, name: &str) -> Result<ClientProfile, TokenkeeperError> {
    check_profile_name(config_dir, name)?;
    let path = profile_path(config_dir, name);

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let known = list_profiles(config_dir).unwrap_or_default();
            let known: Vec<&str> = known.iter().map(String::as_str).collect();
            return Err(TokenkeeperError::ProfileNotFound {
                name: name.to_string(),
                suggestion: suggest_profile(name, &known),
            });
        }
        Err(e) => {
            return Err(TokenkeeperError::ConfigError {
                path,
                detail: e.to_string(),
            })
        }
    };

    let profile: ClientProfile =
        serde_json::from_str(&content).map_err(|e| TokenkeeperError::ConfigError {
            path: path.clone(),
            detail: e.to_string(),
        })?;
    profile
        .validate()
        .map_err(|detail| TokenkeeperError::ConfigError { path, detail })?;

    tracing::debug!(profile = name, client_id = %profile.resource, "Loaded profile");
    Ok(profile)
}

/// Names of all `*.json` profiles in the config directory, sorted.
/// A missing directory yields an empty list.
pub fn list_profiles(config_dir: &Path) -> Result<Vec<String>, TokenkeeperError> {
    let entries = match std::fs::read_dir(config_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(TokenkeeperError::ConfigError {
                path: config_dir.to_path_buf(),
                detail: e.to_string(),
            })
        }
    };

    let mut names = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_profile = path.is_file()
            && path.extension().and_then(|e| e.to_str()) == Some(PROFILE_EXTENSION);
        match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) if is_profile => names.push(stem.to_string()),
            _ => tracing::debug!("Ignoring {} in config dir", path.display()),
        }
    }
    names.sort();
    Ok(names)
}

/// Suggest a profile name if the given name is close to a known one (Levenshtein <= 2).
/// Returns None if no match or if multiple profiles are equally close.
pub fn suggest_profile(input: &str, known: &[&str]) -> Option<String> {
    let mut best_dist = usize::MAX;
    let mut best: Option<&str> = None;
    let mut ambiguous = false;

    for &name in known {
        let dist = strsim::levenshtein(input, name);
        if dist < best_dist {
            best_dist = dist;
            best = Some(name);
            ambiguous = false;
        } else if dist == best_dist {
            ambiguous = true;
        }
    }

    if best_dist <= 2 && !ambiguous {
        best.map(str::to_string)
    } else {
        None
    }
}
