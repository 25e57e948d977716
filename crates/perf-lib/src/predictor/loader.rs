//! Startup loading of the three model artifacts
//!
//! Each artifact is read once, optionally verified against a `.sha256`
//! sidecar, and turned into an immutable [`ModelSet`].

use super::{LinearPredictor, Metric, ModelLoadError, OnnxPredictor, Predictor};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Extension of the optional checksum sidecar (`bte_model.onnx.sha256`)
pub const CHECKSUM_EXTENSION: &str = "sha256";

/// Default directory holding the model artifacts
pub const DEFAULT_MODEL_DIR: &str = "saved_models";

/// Artifact locations for the three metrics
#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub dir: PathBuf,
}

impl Default for ModelPaths {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL_DIR)
    }
}

impl ModelPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Locate the artifact for a metric, preferring ONNX over JSON
    pub fn artifact(&self, metric: Metric) -> Result<PathBuf, ModelLoadError> {
        ["onnx", "json"]
            .iter()
            .map(|ext| self.dir.join(format!("{}.{}", metric.artifact_stem(), ext)))
            .find(|path| path.is_file())
            .ok_or_else(|| ModelLoadError::NotFound {
                metric,
                dir: self.dir.clone(),
            })
    }
}

/// The three loaded models, immutable for the process lifetime
pub struct ModelSet {
    bte: Box<dyn Predictor>,
    bmep: Box<dyn Predictor>,
    brake_power: Box<dyn Predictor>,
}

impl ModelSet {
    pub fn new(
        bte: Box<dyn Predictor>,
        bmep: Box<dyn Predictor>,
        brake_power: Box<dyn Predictor>,
    ) -> Self {
        Self {
            bte,
            bmep,
            brake_power,
        }
    }

    /// Load all three artifacts from a directory
    pub fn load(paths: &ModelPaths) -> Result<Self, ModelLoadError> {
        let bte = load_artifact(&paths.artifact(Metric::Bte)?)?;
        let bmep = load_artifact(&paths.artifact(Metric::Bmep)?)?;
        let brake_power = load_artifact(&paths.artifact(Metric::BrakePower)?)?;

        let set = Self::new(bte, bmep, brake_power);
        info!(
            dir = %paths.dir.display(),
            bte = set.bte.kind(),
            bmep = set.bmep.kind(),
            brake_power = set.brake_power.kind(),
            "Model artifacts loaded"
        );
        Ok(set)
    }

    pub fn get(&self, metric: Metric) -> &dyn Predictor {
        match metric {
            Metric::Bte => self.bte.as_ref(),
            Metric::Bmep => self.bmep.as_ref(),
            Metric::BrakePower => self.brake_power.as_ref(),
        }
    }

    /// Model variant per metric, e.g. `"bte=onnx,bmep=onnx,brake_power=linear"`
    pub fn describe(&self) -> String {
        Metric::ALL
            .iter()
            .map(|m| format!("{}={}", m, self.get(*m).kind()))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl std::fmt::Debug for ModelSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSet")
            .field("models", &self.describe())
            .finish()
    }
}

/// Compute the hex SHA-256 of an artifact
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(CHECKSUM_EXTENSION);
    PathBuf::from(name)
}

fn read(path: &Path) -> Result<Vec<u8>, ModelLoadError> {
    fs::read(path).map_err(|source| ModelLoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Verify the artifact against its sidecar digest, if one exists
///
/// The sidecar may be a bare digest or `sha256sum` output
/// (`<digest>  <file name>`).
fn verify_checksum(path: &Path, bytes: &[u8]) -> Result<(), ModelLoadError> {
    let sidecar = sidecar_path(path);
    if !sidecar.is_file() {
        debug!(path = %path.display(), "No checksum sidecar, skipping verification");
        return Ok(());
    }

    let contents = fs::read_to_string(&sidecar).map_err(|source| ModelLoadError::Io {
        path: sidecar.clone(),
        source,
    })?;
    let expected = contents
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    let actual = compute_checksum(bytes);

    if expected != actual {
        return Err(ModelLoadError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected,
            actual,
        });
    }

    debug!(path = %path.display(), checksum = %actual, "Model checksum validated");
    Ok(())
}

/// Load one artifact, choosing the model variant by extension
pub fn load_artifact(path: &Path) -> Result<Box<dyn Predictor>, ModelLoadError> {
    let bytes = read(path)?;
    verify_checksum(path, &bytes)?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("onnx") => OnnxPredictor::new(&bytes)
            .map(|p| Box::new(p) as Box<dyn Predictor>)
            .map_err(|e| ModelLoadError::Onnx {
                path: path.to_path_buf(),
                message: format!("{:#}", e),
            }),
        Some("json") => LinearPredictor::from_json(&bytes)
            .map(|p| Box::new(p) as Box<dyn Predictor>)
            .map_err(|e| ModelLoadError::Linear {
                path: path.to_path_buf(),
                message: format!("{:#}", e),
            }),
        _ => Err(ModelLoadError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}
