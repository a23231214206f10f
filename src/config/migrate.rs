//! Config file upgrades: detect keys that an older config file lacks and
//! write them back with their default values. Existing values are never
//! overwritten.

use super::Config;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

/// Collect dotted paths (`shifts.night`) present in `defaults` but missing
/// in `current`.
fn missing_keys(current: &Mapping, defaults: &Mapping, prefix: &str, out: &mut Vec<String>) {
    for (key, default_val) in defaults {
        let Some(name) = key.as_str() else { continue };
        let dotted = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        };

        match current.get(key) {
            None => out.push(dotted),
            Some(Value::Mapping(cur_map)) => {
                if let Value::Mapping(def_map) = default_val {
                    missing_keys(cur_map, def_map, &dotted, out);
                }
            }
            Some(_) => {}
        }
    }
}

/// Insert every missing key from `defaults` into `current`, recursively.
fn fill_missing(current: &mut Mapping, defaults: &Mapping) {
    for (key, default_val) in defaults {
        match current.get_mut(key) {
            None => {
                current.insert(key.clone(), default_val.clone());
            }
            Some(Value::Mapping(cur_map)) => {
                if let Value::Mapping(def_map) = default_val {
                    fill_missing(cur_map, def_map);
                }
            }
            Some(_) => {}
        }
    }
}

fn read_mapping(path: &Path) -> AppResult<Mapping> {
    let content = fs::read_to_string(path).map_err(|_| AppError::ConfigLoad)?;
    match serde_yaml::from_str::<Value>(&content)? {
        Value::Mapping(m) => Ok(m),
        Value::Null => Ok(Mapping::new()),
        _ => Err(AppError::Config(format!(
            "{} is not a YAML mapping",
            path.display()
        ))),
    }
}

fn default_mapping() -> AppResult<Mapping> {
    match serde_yaml::to_value(Config::default())? {
        Value::Mapping(m) => Ok(m),
        _ => Err(AppError::Other("default config is not a mapping".into())),
    }
}

/// Keys missing from the config file at `path`.
pub fn check_config_file(path: &Path) -> AppResult<Vec<String>> {
    let current = read_mapping(path)?;
    let mut out = Vec::new();
    missing_keys(&current, &default_mapping()?, "", &mut out);
    Ok(out)
}

/// Add the missing keys to the config file at `path`.
/// Returns:
///   Ok(true)  → file updated
///   Ok(false) → nothing to do
pub fn migrate_config_file(path: &Path) -> AppResult<bool> {
    let missing = check_config_file(path)?;
    if missing.is_empty() {
        info("Configuration is up to date.");
        return Ok(false);
    }

    let mut current = read_mapping(path)?;
    fill_missing(&mut current, &default_mapping()?);

    let serialized = serde_yaml::to_string(&Value::Mapping(current))?;
    fs::write(path, serialized).map_err(|_| AppError::ConfigSave)?;

    success(format!(
        "Configuration migrated, added: {}",
        missing.join(", ")
    ));
    Ok(true)
}
