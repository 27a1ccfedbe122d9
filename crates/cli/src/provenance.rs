use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{json, Value};
use std::ffi::OsString;
use std::fs;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::Command;

/// What a run consumed and how it was configured.
pub struct Payload {
    pub params: Value,
    pub inputs: Vec<String>,
    /// Extra artifacts written next to the primary one (WKT dumps).
    pub companions: Vec<String>,
}

impl Payload {
    pub fn new<T: Serialize>(params: &T) -> Result<Self> {
        Ok(Self {
            params: serde_json::to_value(params).context("serializing run params")?,
            inputs: Vec::new(),
            companions: Vec::new(),
        })
    }

    pub fn input(mut self, path: &Path) -> Self {
        self.inputs.push(path.to_string_lossy().into_owned());
        self
    }

    pub fn companion(mut self, path: &Path) -> Self {
        self.companions.push(path.to_string_lossy().into_owned());
        self
    }
}

/// Write `<artifact>.provenance.json` with the git commit, callsite, params,
/// inputs and outputs.
#[track_caller]
pub fn write_sidecar<P: AsRef<Path>>(artifact: P, payload: Payload) -> Result<PathBuf> {
    let artifact = artifact.as_ref();
    let provenance_path = provenance_path(artifact);
    if let Some(parent) = provenance_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating provenance dir {}", parent.display()))?;
        }
    }

    let callsite = Location::caller();
    let mut outputs = vec![artifact.to_string_lossy().into_owned()];
    outputs.extend(payload.companions);
    let doc = json!({
        "code_rev": current_git_rev(),
        "version": areapoly::VERSION,
        "callsite": {
            "file": callsite.file(),
            "line": callsite.line()
        },
        "params": payload.params,
        "inputs": payload.inputs,
        "outputs": outputs
    });
    fs::write(&provenance_path, serde_json::to_vec_pretty(&doc)?)
        .with_context(|| format!("writing {}", provenance_path.display()))?;
    Ok(provenance_path)
}

fn provenance_path(artifact: &Path) -> PathBuf {
    let mut name = artifact
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| OsString::from("artifact"));
    name.push(".provenance.json");
    artifact.with_file_name(name)
}

/// Commit from `GIT_COMMIT` (build time, then run time), else `git rev-parse HEAD`.
pub fn current_git_rev() -> String {
    if let Some(rev) = option_env!("GIT_COMMIT").filter(|s| !s.is_empty()) {
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
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn provenance_path_replaces_extension() {
        let base = Path::new("/tmp/output/report.txt");
        assert_eq!(
            provenance_path(base),
            Path::new("/tmp/output/report.provenance.json")
        );
    }

    #[test]
    fn sidecar_lists_inputs_and_outputs() {
        let dir = tempdir().unwrap();
        let report = dir.path().join("report.txt");
        let wkt = dir.path().join("optimal.wkt");
        fs::write(&report, "Optimal Area Polygonization\n").unwrap();
        let payload = Payload::new(&json!({"algorithm": "local_search"}))
            .unwrap()
            .input(Path::new("points.instance"))
            .companion(&wkt);
        let prov_path = write_sidecar(&report, payload).unwrap();
        let parsed: Value = serde_json::from_slice(&fs::read(prov_path).unwrap()).unwrap();
        assert_eq!(parsed["params"]["algorithm"], "local_search");
        assert_eq!(parsed["inputs"][0], "points.instance");
        assert_eq!(parsed["outputs"][0], report.to_string_lossy().as_ref());
        assert_eq!(parsed["outputs"][1], wkt.to_string_lossy().as_ref());
        assert_eq!(parsed["version"], areapoly::VERSION);
    }
}
