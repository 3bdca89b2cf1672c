//! Where shadow copies of instrumented files live.
//!
//! Project files are mirrored under `<generated>/internal_src/<path relative
//! to the project root>`, so includes relative to the including file keep
//! resolving. Everything else lands flat in `<generated>/external_include/`.

use std::fs;
use std::path::{Path, PathBuf};

use gcw_config::OutputConfig;

const INTERNAL_DIR: &str = "internal_src";
const EXTERNAL_DIR: &str = "external_include";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    generated: PathBuf,
    project_root: PathBuf,
}

impl OutputLayout {
    /// Layout for a build directory: the generated tree sits inside it and
    /// the project root defaults to its parent.
    #[must_use]
    pub fn for_build_dir(build_dir: &Path, config: &OutputConfig) -> Self {
        let project_root = config.project_root.clone().unwrap_or_else(|| {
            build_dir
                .parent()
                .map_or_else(|| build_dir.to_path_buf(), Path::to_path_buf)
        });
        Self::new(build_dir.join(&config.generated_dir), &project_root)
    }

    #[must_use]
    pub fn new(generated: PathBuf, project_root: &Path) -> Self {
        let project_root =
            fs::canonicalize(project_root).unwrap_or_else(|_| project_root.to_path_buf());
        Self {
            generated,
            project_root,
        }
    }

    #[must_use]
    pub fn generated_dir(&self) -> &Path {
        &self.generated
    }

    #[must_use]
    pub fn internal_root(&self) -> PathBuf {
        self.generated.join(INTERNAL_DIR)
    }

    #[must_use]
    pub fn external_root(&self) -> PathBuf {
        self.generated.join(EXTERNAL_DIR)
    }

    /// Project files, excluding anything already inside the generated tree.
    #[must_use]
    pub fn is_internal(&self, file: &Path) -> bool {
        file.starts_with(&self.project_root) && !file.starts_with(&self.generated)
    }

    /// Shadow location of `file`.
    #[must_use]
    pub fn shadow_path(&self, file: &Path) -> PathBuf {
        if let Ok(relative) = file.strip_prefix(&self.project_root)
            && !file.starts_with(&self.generated)
        {
            return self.internal_root().join(relative);
        }
        let name = file.file_name().unwrap_or(file.as_os_str());
        self.external_root().join(name)
    }

    /// Compiler flags that make the shadow tree win over the originals:
    /// the external header directory and the shadow of every project include
    /// directory first, then the original directories of shadowed files for
    /// quoted includes the shadow tree does not hold.
    #[must_use]
    pub fn include_prefix(&self, include_dirs: &[PathBuf], quote_dirs: &[PathBuf]) -> Vec<String> {
        let mut prefix = vec!["-I".to_string(), self.external_root().display().to_string()];
        for dir in include_dirs {
            let dir = fs::canonicalize(dir).unwrap_or_else(|_| dir.clone());
            if self.is_internal(&dir) {
                prefix.push("-I".to_string());
                prefix.push(self.shadow_path(&dir).display().to_string());
            }
        }
        for dir in quote_dirs {
            prefix.push("-iquote".to_string());
            prefix.push(dir.display().to_string());
        }
        prefix
    }
}
