use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use pretty_assertions::assert_eq;

fn gcwire(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gcwire"))
        .current_dir(dir)
        .env("GCWIRE_LOG", "error")
        .args(args)
        .output()
        .expect("gcwire should start")
}

fn project() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir should create");
    let root = fs::canonicalize(dir.path()).expect("canonicalize");
    fs::write(
        root.join("graph.hpp"),
        "class Leaf {\n  memory::gc_ptr<Leaf> next_;\n};\n\nclass Tree : public Leaf {\n  Leaf left_;\n};\n",
    )
    .expect("write header");
    fs::write(root.join("main.cpp"), "#include \"graph.hpp\"\nint main() { return 0; }\n")
        .expect("write main");
    (dir, root)
}

#[test]
fn analyze_reports_carriers_as_json() {
    let (_dir, root) = project();
    let output = gcwire(&root, &["analyze", "main.cpp"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be json");
    assert_eq!(report["carriers"], serde_json::json!(["Leaf", "Tree"]));
    assert_eq!(report["inheritance"][0]["base"], "Leaf");
    assert_eq!(fs::read_to_string(root.join("graph.hpp")).expect("read").matches("GC_PTR").count(), 0);
}

#[test]
fn instrument_in_place_is_idempotent() {
    let (_dir, root) = project();
    let first = gcwire(&root, &["instrument", "main.cpp", "--in-place", "--format", "raw"]);
    assert!(first.status.success(), "stderr: {}", String::from_utf8_lossy(&first.stderr));
    let after_first = fs::read_to_string(root.join("graph.hpp")).expect("read");
    assert!(after_first.contains("    Leaf::connectToRoot(rootPtr);\n"));
    assert!(after_first.contains("    left_.connectToRoot(rootPtr);\n"));

    let second = gcwire(&root, &["instrument", "main.cpp", "--in-place"]);
    assert!(second.status.success());
    assert_eq!(fs::read_to_string(root.join("graph.hpp")).expect("read"), after_first);
}

#[test]
fn lint_exits_nonzero_on_violation() {
    let (_dir, root) = project();
    fs::write(
        root.join("bad.cpp"),
        "void f(memory::gc_ptr<int> p) {\n  auto g = [p]() {};\n}\n",
    )
    .expect("write bad");

    let output = gcwire(&root, &["lint", "bad.cpp"]);
    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be json");
    assert_eq!(report["violations"][0]["variable"], "p");
    assert_eq!(report["violations"][0]["line"], 2);
}

#[test]
fn compile_without_source_passes_compiler_status_through() {
    let (_dir, root) = project();
    let ok = gcwire(&root, &["compile", "--compiler", "true", "--", "--version"]);
    assert_eq!(ok.status.code(), Some(0));
    let failed = gcwire(&root, &["compile", "--compiler", "false", "--", "main.o"]);
    assert_eq!(failed.status.code(), Some(1));
}
