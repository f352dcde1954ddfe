use repomap::core::scanner::{FileScanner, ScanOptions};
use std::fs;
use std::path::Path;

fn touch<P: AsRef<Path>>(p: P) {
    let p = p.as_ref();
    fs::create_dir_all(p.parent().unwrap()).unwrap();
    fs::write(p, "# test\n").unwrap();
}

fn scan(root: &Path, options: ScanOptions) -> Vec<String> {
    FileScanner::new(&options).unwrap().scan_directory(root).unwrap()
}

#[test]
fn scanner_returns_sorted_python_files_only() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    touch(root.join("b/mod.py"));
    touch(root.join("a/main.py"));
    touch(root.join("a/readme.txt"));
    touch(root.join("a/native.pyx"));
    touch(root.join("top.py"));

    let files = scan(root, ScanOptions::default());
    assert_eq!(files, vec!["a/main.py", "b/mod.py", "top.py"]);
}

#[test]
fn scanner_skips_output_directory_by_first_component() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    touch(root.join(".repomap/cached.py"));
    touch(root.join("pkg/.repomap/kept.py"));
    touch(root.join("app.py"));

    let files = scan(
        root,
        ScanOptions {
            output_dir: Some(".repomap".to_string()),
            ..ScanOptions::default()
        },
    );
    assert_eq!(files, vec!["app.py", "pkg/.repomap/kept.py"]);
}

#[test]
fn scanner_applies_include_then_exclude_globs() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    touch(root.join("src/app/core.py"));
    touch(root.join("src/app/test_core.py"));
    touch(root.join("scripts/tool.py"));

    let files = scan(
        root,
        ScanOptions {
            include: vec!["src/*".to_string()],
            exclude: vec!["*test_*".to_string()],
            ..ScanOptions::default()
        },
    );
    assert_eq!(files, vec!["src/app/core.py"]);
}

#[test]
fn scanner_honours_root_gitignore_only_by_default() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    fs::write(root.join(".gitignore"), "build/\n*.gen.py\n").unwrap();
    fs::create_dir_all(root.join("pkg")).unwrap();
    fs::write(root.join("pkg/.gitignore"), "local.py\n").unwrap();
    touch(root.join("build/out.py"));
    touch(root.join("pkg/schema.gen.py"));
    touch(root.join("pkg/local.py"));
    touch(root.join("pkg/keep.py"));
    touch(root.join("local.py"));

    let files = scan(root, ScanOptions::default());
    assert_eq!(files, vec!["local.py", "pkg/keep.py", "pkg/local.py"]);

    let nested = scan(
        root,
        ScanOptions {
            nested_gitignore: true,
            ..ScanOptions::default()
        },
    );
    assert_eq!(nested, vec!["local.py", "pkg/keep.py"]);
}

#[test]
fn scanner_rejects_invalid_globs() {
    let options = ScanOptions {
        include: vec!["src/[".to_string()],
        ..ScanOptions::default()
    };
    assert!(FileScanner::new(&options).is_err());
}

#[cfg(unix)]
#[test]
fn scanner_skips_symlinked_files_and_dirs() {
    let dir = tempfile::TempDir::new().unwrap();
    let outside = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    touch(root.join("real.py"));
    touch(outside.path().join("elsewhere.py"));

    std::os::unix::fs::symlink(root.join("real.py"), root.join("link.py")).unwrap();
    std::os::unix::fs::symlink(outside.path(), root.join("linked_dir")).unwrap();

    let files = scan(root, ScanOptions::default());
    assert_eq!(files, vec!["real.py"]);
}
