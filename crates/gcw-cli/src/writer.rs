//! Atomic file replacement.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use tempfile::NamedTempFile;

/// Replace `path` with `contents` through a temporary file in the same
/// directory, so readers never see a partial file.
pub fn write_atomic(path: &Path, contents: &str) -> anyhow::Result<()> {
    let dir = path
        .parent()
        .with_context(|| format!("{} has no parent directory", path.display()))?;
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let mut temp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temporary file in {}", dir.display()))?;
    temp.write_all(contents.as_bytes())
        .with_context(|| format!("failed to write temporary file for {}", path.display()))?;
    temp.persist(path)
        .map_err(|error| error.error)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}

/// Write only when the file is missing or differs, leaving timestamps of
/// unchanged shadows alone. Returns whether anything was written.
pub fn write_if_changed(path: &Path, contents: &str) -> anyhow::Result<bool> {
    if fs::read_to_string(path).is_ok_and(|existing| existing == contents) {
        return Ok(false);
    }
    write_atomic(path, contents)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_atomic_creates_parents_and_replaces() {
        let temp = tempfile::tempdir().expect("tempdir should create");
        let path = temp.path().join("a/b/graph.hpp");

        write_atomic(&path, "first").expect("first write");
        write_atomic(&path, "second").expect("second write");
        assert_eq!(fs::read_to_string(&path).expect("read back"), "second");

        let leftovers = fs::read_dir(path.parent().expect("parent"))
            .expect("list dir")
            .count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn write_if_changed_skips_identical_content() {
        let temp = tempfile::tempdir().expect("tempdir should create");
        let path = temp.path().join("main.cpp");

        assert!(write_if_changed(&path, "int main() {}").expect("write"));
        assert!(!write_if_changed(&path, "int main() {}").expect("no-op"));
        assert!(write_if_changed(&path, "int main() { return 0; }").expect("rewrite"));
    }
}
