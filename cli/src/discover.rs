use std::path::Path;
use std::path::PathBuf;

use ignore::WalkBuilder;
use tracing::debug;

/// Extensions scanned when the user does not pass `--ext`.
pub(crate) const DEFAULT_EXTENSIONS: &[&str] = &[
    "c", "cc", "cpp", "cs", "go", "h", "hpp", "java", "js", "jsx", "kt", "php", "py", "rb", "rs",
    "scala", "sh", "swift", "ts", "tsx",
];

/// Collect the files to scan under `roots`, honoring `.gitignore` rules
/// and the extension allow-list. Explicit file arguments bypass the
/// extension filter — the user named them on purpose.
pub(crate) fn discover_files(roots: &[PathBuf], extensions: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for root in roots {
        if root.is_file() {
            files.push(root.clone());
            continue;
        }
        for entry in WalkBuilder::new(root).build().flatten() {
            if !entry.file_type().is_some_and(|file_type| file_type.is_file()) {
                continue;
            }
            if wanted(entry.path(), extensions) {
                files.push(entry.path().to_path_buf());
            }
        }
    }
    files.sort();
    files.dedup();
    debug!(count = files.len(), "discovered files");
    files
}

fn wanted(path: &Path, extensions: &[String]) -> bool {
    let Some(extension) = path.extension().and_then(|extension| extension.to_str()) else {
        return false;
    };
    if extensions.is_empty() {
        DEFAULT_EXTENSIONS
            .iter()
            .any(|allowed| extension.eq_ignore_ascii_case(allowed))
    } else {
        extensions
            .iter()
            .any(|allowed| extension.eq_ignore_ascii_case(allowed))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn walks_directories_and_filters_extensions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "print()").unwrap();
        std::fs::write(dir.path().join("b.md"), "# notes").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/c.java"), "class C {}").unwrap();

        let files = discover_files(&[dir.path().to_path_buf()], &[]);
        let names: Vec<_> = files
            .iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.py", "c.java"]);
    }

    #[test]
    fn explicit_files_bypass_the_extension_filter() {
        let dir = tempfile::tempdir().unwrap();
        let odd = dir.path().join("config.conf");
        std::fs::write(&odd, "secret=1").unwrap();

        let files = discover_files(&[odd.clone()], &[]);
        assert_eq!(files, vec![odd]);
    }

    #[test]
    fn custom_extension_list_replaces_the_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "print()").unwrap();
        std::fs::write(dir.path().join("b.lua"), "print()").unwrap();

        let files = discover_files(&[dir.path().to_path_buf()], &["lua".to_string()]);
        let names: Vec<_> = files
            .iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["b.lua"]);
    }
}
