use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::ffi::OsString;
use std::fs;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::Command;

/// What produced an artifact: the subcommand and its parameters.
pub struct Payload {
    pub command: &'static str,
    pub params: Value,
}

impl Payload {
    pub fn new(command: &'static str, params: Value) -> Self {
        Self { command, params }
    }
}

#[derive(Serialize)]
struct Callsite<'a> {
    file: &'a str,
    line: u32,
}

#[derive(Serialize)]
struct Sidecar<'a> {
    code_rev: String,
    version: &'static str,
    command: &'static str,
    callsite: Callsite<'a>,
    params: Value,
    outputs: Vec<String>,
}

/// Write `<artifact>.provenance.json` next to `artifact`.
#[track_caller]
pub fn write_sidecar<P: AsRef<Path>>(artifact: P, payload: Payload) -> Result<PathBuf> {
    let artifact = artifact.as_ref();
    let path = provenance_path(artifact);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating provenance dir {}", parent.display()))?;
        }
    }

    let callsite = Location::caller();
    let doc = Sidecar {
        code_rev: current_git_rev(),
        version: shadowcast::VERSION,
        command: payload.command,
        callsite: Callsite {
            file: callsite.file(),
            line: callsite.line(),
        },
        params: payload.params,
        outputs: vec![artifact.to_string_lossy().into_owned()],
    };
    fs::write(&path, serde_json::to_vec_pretty(&doc)?)
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::debug!(path = %path.display(), "provenance written");
    Ok(path)
}

fn provenance_path(artifact: &Path) -> PathBuf {
    let mut name = artifact
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| OsString::from("scene"));
    name.push(".provenance.json");
    artifact.with_file_name(name)
}

/// Commit the binary was built from, else the checkout it runs in, else "unknown".
pub fn current_git_rev() -> String {
    let baked = option_env!("GIT_COMMIT").filter(|s| !s.is_empty());
    if let Some(rev) = baked {
        return rev.to_string();
    }
    if let Ok(rev) = std::env::var("GIT_COMMIT") {
        if !rev.is_empty() {
            return rev;
        }
    }
    Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn provenance_path_replaces_extension() {
        let derived = provenance_path(Path::new("/tmp/out/scene.json"));
        assert_eq!(derived, Path::new("/tmp/out/scene.provenance.json"));
    }

    #[test]
    fn write_sidecar_records_command_and_outputs() {
        let dir = tempdir().unwrap();
        let artifact = dir.path().join("layout.txt");
        fs::write(&artifact, "800 500\n1 1\n0\n").unwrap();
        let payload = Payload::new("random", json!({"seed": 7}));
        let path = write_sidecar(&artifact, payload).unwrap();
        assert_eq!(path, dir.path().join("layout.provenance.json"));
        let parsed: Value = serde_json::from_slice(&fs::read(path).unwrap()).unwrap();
        assert_eq!(parsed["command"], "random");
        assert_eq!(parsed["params"]["seed"], 7);
        assert_eq!(parsed["outputs"][0], artifact.to_string_lossy().as_ref());
        assert!(parsed["callsite"]["line"].as_u64().unwrap() > 0);
    }
}
