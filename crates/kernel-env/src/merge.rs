//! Layered environment variable merging with PATH-joining semantics.
//!
//! The merge order is fixed: base (ambient process environment), then the
//! interpreter's bin directory prepended to PATH, then activation variables,
//! then user custom variables. For the PATH-like key each layer *joins*
//! (prepend for the bin directory, append for activated/custom); for every
//! other key a later layer overrides an earlier one.

use std::path::Path;

use indexmap::IndexMap;

/// Insertion-ordered environment variable map.
pub type EnvMap = IndexMap<String, String>;

/// Platform path-list delimiter used to join PATH segments.
pub fn path_delimiter() -> char {
    if cfg!(windows) {
        ';'
    } else {
        ':'
    }
}

/// Find the PATH-like key in `env`, matched case-insensitively.
///
/// A well-formed environment carries exactly one such key ("PATH" on unix,
/// commonly "Path" on Windows); the first match wins.
fn find_path_key(env: &EnvMap) -> Option<String> {
    env.keys()
        .find(|k| k.eq_ignore_ascii_case("PATH"))
        .cloned()
}

/// Append `value` onto the PATH-like key of `env`, creating a `PATH` key when
/// none exists.
fn append_to_path(env: &mut EnvMap, value: &str) {
    if value.is_empty() {
        return;
    }
    match find_path_key(env) {
        Some(key) => {
            let joined = match env.get(&key) {
                Some(existing) if !existing.is_empty() => {
                    format!("{}{}{}", existing, path_delimiter(), value)
                }
                _ => value.to_string(),
            };
            env.insert(key, joined);
        }
        None => {
            env.insert("PATH".to_string(), value.to_string());
        }
    }
}

/// Prepend `value` onto the PATH-like key of `env`, creating a `PATH` key
/// when none exists.
fn prepend_to_path(env: &mut EnvMap, value: &str) {
    if value.is_empty() {
        return;
    }
    match find_path_key(env) {
        Some(key) => {
            let joined = match env.get(&key) {
                Some(existing) if !existing.is_empty() => {
                    format!("{}{}{}", value, path_delimiter(), existing)
                }
                _ => value.to_string(),
            };
            env.insert(key, joined);
        }
        None => {
            env.insert("PATH".to_string(), value.to_string());
        }
    }
}

/// Merge one layer into `env`: PATH-like keys append, everything else
/// overrides.
fn apply_layer(env: &mut EnvMap, layer: &EnvMap) {
    for (key, value) in layer {
        if key.eq_ignore_ascii_case("PATH") {
            append_to_path(env, value);
        } else {
            env.insert(key.clone(), value.clone());
        }
    }
}

/// Merge the launch environment layers.
///
/// Precedence (lowest to highest): `base`, `interpreter_bin_dir` (PATH
/// prepend), `activated`, `custom`. Returns `None` only in the degenerate
/// case where every input is absent. Pure function over its inputs.
pub fn merge(
    base: Option<&EnvMap>,
    activated: Option<&EnvMap>,
    custom: Option<&EnvMap>,
    interpreter_bin_dir: Option<&Path>,
) -> Option<EnvMap> {
    if base.is_none() && activated.is_none() && custom.is_none() && interpreter_bin_dir.is_none() {
        return None;
    }

    let mut env = base.cloned().unwrap_or_default();

    if let Some(bin_dir) = interpreter_bin_dir {
        prepend_to_path(&mut env, &bin_dir.to_string_lossy());
    }
    if let Some(activated) = activated {
        apply_layer(&mut env, activated);
    }
    if let Some(custom) = custom {
        apply_layer(&mut env, custom);
    }

    Some(env)
}
