use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error(
        "model {name} not found (looked in {}); place it there or pass --model",
        display_paths(searched)
    )]
    NotFound { name: String, searched: Vec<PathBuf> },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Locates detector model files on the local filesystem.
///
/// Lookup order: cache directory, then the optional bundled directory.
/// Nothing is fetched; a model found in neither place is an error.
pub struct ModelResolver {
    cache_dir: PathBuf,
    bundled_dir: Option<PathBuf>,
}

impl ModelResolver {
    pub fn new(cache_dir: PathBuf, bundled_dir: Option<PathBuf>) -> Self {
        Self {
            cache_dir,
            bundled_dir,
        }
    }

    /// Resolver over the per-user cache directory and the `models/`
    /// directory next to the running executable.
    pub fn user_cache() -> Result<Self, ModelResolveError> {
        Ok(Self::new(model_cache_dir()?, bundled_model_dir()))
    }

    /// Returns the local path of model `name`.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, ModelResolveError> {
        let candidates: Vec<PathBuf> = std::iter::once(&self.cache_dir)
            .chain(self.bundled_dir.as_ref())
            .map(|dir| dir.join(name))
            .collect();

        match candidates.iter().find(|p| p.is_file()) {
            Some(path) => {
                log::debug!("Using model {}", path.display());
                Ok(path.clone())
            }
            None => Err(ModelResolveError::NotFound {
                name: name.to_string(),
                searched: candidates,
            }),
        }
    }
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/FaceCrop/models/`
/// - Linux: `$XDG_CACHE_HOME/FaceCrop/models/` or `~/.cache/FaceCrop/models/`
/// - Windows: `%LOCALAPPDATA%/FaceCrop/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    let base = dirs::data_dir();
    #[cfg(not(target_os = "macos"))]
    let base = dirs::cache_dir();

    base.map(|d| d.join("FaceCrop").join("models"))
        .ok_or(ModelResolveError::NoCacheDir)
}

/// `models/` beside the executable, for packaged installs.
fn bundled_model_dir() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    Some(exe.parent()?.join("models"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_prefers_cached_file() {
        let tmp = TempDir::new().unwrap();
        let bundled_dir = tmp.path().join("bundled");
        fs::create_dir_all(&bundled_dir).unwrap();
        fs::write(bundled_dir.join("model.onnx"), b"bundled").unwrap();
        let cached = tmp.path().join("model.onnx");
        fs::write(&cached, b"cached").unwrap();

        let resolver = ModelResolver::new(tmp.path().to_path_buf(), Some(bundled_dir));
        assert_eq!(resolver.resolve("model.onnx").unwrap(), cached);
    }

    #[test]
    fn test_resolve_falls_back_to_bundled_file() {
        let tmp = TempDir::new().unwrap();
        let bundled_dir = tmp.path().join("bundled");
        fs::create_dir_all(&bundled_dir).unwrap();
        fs::write(bundled_dir.join("model.onnx"), b"bundled").unwrap();

        let resolver = ModelResolver::new(tmp.path().join("cache"), Some(bundled_dir.clone()));
        let path = resolver.resolve("model.onnx").unwrap();
        assert_eq!(path, bundled_dir.join("model.onnx"));
    }

    #[test]
    fn test_missing_model_is_not_fetched() {
        let tmp = TempDir::new().unwrap();
        let cache = tmp.path().join("cache");
        let bundled = tmp.path().join("bundled");
        let resolver = ModelResolver::new(cache.clone(), Some(bundled.clone()));

        let err = resolver.resolve("model.onnx").unwrap_err();

        match &err {
            ModelResolveError::NotFound { name, searched } => {
                assert_eq!(name, "model.onnx");
                assert_eq!(
                    searched,
                    &vec![cache.join("model.onnx"), bundled.join("model.onnx")]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("--model"));
        assert!(!cache.exists());
    }

    #[test]
    fn test_directory_with_model_name_is_not_a_model() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("model.onnx")).unwrap();

        let resolver = ModelResolver::new(tmp.path().to_path_buf(), None);
        assert!(resolver.resolve("model.onnx").is_err());
    }

    #[test]
    fn test_model_cache_dir_is_app_specific() {
        let path = model_cache_dir().unwrap();
        assert!(path.ends_with("FaceCrop/models"));
    }
}
