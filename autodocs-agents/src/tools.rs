//! Repository inspection helpers used by the research agent.
//!
//! Everything here is synchronous filesystem work; async callers go through
//! `spawn_blocking`.

use std::collections::BTreeMap;
use std::path::Path;

/// Listing stops after this many files.
pub const MAX_FILES: usize = 500;

/// Characters of each key file passed to the model.
const KEY_FILE_EXCERPT: usize = 3000;

/// Build, packaging and deployment files worth reading in full.
pub const KEY_FILES: &[&str] = &[
    "Cargo.toml",
    "package.json",
    "requirements.txt",
    "setup.py",
    "pyproject.toml",
    "go.mod",
    "pom.xml",
    "build.gradle",
    "Gemfile",
    "Dockerfile",
    "docker-compose.yml",
    "docker-compose.yaml",
    "Procfile",
    "Makefile",
    ".github/workflows/ci.yml",
    ".gitlab-ci.yml",
    "README.md",
    "src/main.rs",
    "src/lib.rs",
    "app.py",
    "main.py",
    "src/index.ts",
    "src/index.js",
    "main.go",
];

const SKIPPED_DIRS: &[&str] = &["node_modules", "target", "__pycache__", "venv", "dist", "build"];

/// What a scan found.
#[derive(Debug, Clone, Default)]
pub struct RepoScan {
    /// Relative paths, sorted, at most [`MAX_FILES`].
    pub files: Vec<String>,
    /// Total files seen, including those past the cap.
    pub file_count: usize,
    pub languages: BTreeMap<String, usize>,
    pub key_files: Vec<String>,
}

/// Walk a repository. Unreadable directories are skipped, so a missing
/// path gives an empty scan.
pub fn scan_repository(root: &Path) -> RepoScan {
    let mut all = Vec::new();
    walk(root, root, &mut all);
    all.sort();

    let mut languages = BTreeMap::new();
    for file in &all {
        if let Some(lang) = language_for(file) {
            *languages.entry(lang.to_string()).or_insert(0) += 1;
        }
    }

    let key_files = KEY_FILES
        .iter()
        .filter(|name| root.join(name).is_file())
        .map(|name| name.to_string())
        .collect();

    let file_count = all.len();
    all.truncate(MAX_FILES);

    RepoScan {
        files: all,
        file_count,
        languages,
        key_files,
    }
}

fn walk(dir: &Path, root: &Path, result: &mut Vec<String>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        let path = entry.path();
        if file_type.is_dir() {
            let name = path.file_name().unwrap_or_default().to_string_lossy();
            if (name.starts_with('.') && name != ".github") || SKIPPED_DIRS.iter().any(|d| *d == name) {
                continue;
            }
            walk(&path, root, result);
        } else if file_type.is_symlink() && path.is_dir() {
            // Links to directories can loop or leave the repository.
            continue;
        } else if let Ok(rel) = path.strip_prefix(root) {
            result.push(rel.to_string_lossy().replace('\\', "/"));
        }
    }
}

/// Map a file name to a language by extension.
pub fn language_for(file: &str) -> Option<&'static str> {
    let name = file.rsplit('/').next().unwrap_or(file);
    if name == "Dockerfile" {
        return Some("Docker");
    }
    let ext = name.rsplit_once('.')?.1.to_ascii_lowercase();
    let lang = match ext.as_str() {
        "rs" => "Rust",
        "py" => "Python",
        "js" | "mjs" | "cjs" | "jsx" => "JavaScript",
        "ts" | "tsx" => "TypeScript",
        "go" => "Go",
        "java" => "Java",
        "kt" | "kts" => "Kotlin",
        "rb" => "Ruby",
        "php" => "PHP",
        "c" | "h" => "C",
        "cc" | "cpp" | "cxx" | "hpp" => "C++",
        "cs" => "C#",
        "swift" => "Swift",
        "scala" => "Scala",
        "sh" | "bash" => "Shell",
        "html" | "htm" => "HTML",
        "css" | "scss" => "CSS",
        "md" => "Markdown",
        "toml" | "yaml" | "yml" | "json" | "ini" | "cfg" => "Config",
        _ => return None,
    };
    Some(lang)
}

/// Excerpts of the key files found, formatted for a prompt.
pub fn key_file_excerpts(root: &Path, key_files: &[String]) -> String {
    let mut out = String::new();
    for name in key_files {
        let Ok(content) = std::fs::read_to_string(root.join(name)) else {
            continue;
        };
        let excerpt = if content.len() > KEY_FILE_EXCERPT {
            let mut end = KEY_FILE_EXCERPT;
            while !content.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated)", &content[..end])
        } else {
            content
        };
        out.push_str(&format!("\n### {name}\n```\n{excerpt}\n```\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_lists_sorted_files_and_skips_noise() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::create_dir_all(root.join("node_modules/left-pad")).unwrap();
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::write(root.join("src/main.rs"), "fn main() {}").unwrap();
        std::fs::write(root.join("Cargo.toml"), "[package]").unwrap();
        std::fs::write(root.join("Dockerfile"), "FROM rust").unwrap();
        std::fs::write(root.join("node_modules/left-pad/index.js"), "").unwrap();
        std::fs::write(root.join(".git/HEAD"), "ref").unwrap();

        let scan = scan_repository(root);
        assert_eq!(scan.files, vec!["Cargo.toml", "Dockerfile", "src/main.rs"]);
        assert_eq!(scan.file_count, 3);
        assert_eq!(scan.languages.get("Rust"), Some(&1));
        assert_eq!(scan.languages.get("Docker"), Some(&1));
        assert_eq!(scan.key_files, vec!["Cargo.toml", "Dockerfile", "src/main.rs"]);
    }

    #[cfg(unix)]
    #[test]
    fn scan_does_not_follow_directory_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::write(root.join("main.py"), "print()").unwrap();
        std::os::unix::fs::symlink(".", root.join("loop")).unwrap();
        std::os::unix::fs::symlink(".", root.join("again")).unwrap();
        std::os::unix::fs::symlink("/", root.join("host")).unwrap();
        std::os::unix::fs::symlink("main.py", root.join("alias.py")).unwrap();

        let scan = scan_repository(root);
        assert_eq!(scan.files, vec!["alias.py", "main.py"]);
        assert_eq!(scan.file_count, 2);
        assert_eq!(scan.languages.get("Python"), Some(&2));
    }

    #[test]
    fn missing_repository_scans_empty() {
        let scan = scan_repository(Path::new("/definitely/not/a/repo"));
        assert!(scan.files.is_empty());
        assert_eq!(scan.file_count, 0);
        assert!(scan.key_files.is_empty());
    }

    #[test]
    fn language_detection() {
        assert_eq!(language_for("a/b/lib.RS"), Some("Rust"));
        assert_eq!(language_for("web/app.tsx"), Some("TypeScript"));
        assert_eq!(language_for("LICENSE"), None);
        assert_eq!(language_for("deploy/Dockerfile"), Some("Docker"));
    }

    #[test]
    fn excerpts_truncate_long_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("README.md"), "x".repeat(5000)).unwrap();
        let text = key_file_excerpts(dir.path(), &["README.md".to_string()]);
        assert!(text.contains("### README.md"));
        assert!(text.contains("(truncated)"));
        assert!(text.len() < 3200);
    }
}
