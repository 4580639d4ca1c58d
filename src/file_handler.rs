use anyhow::{Context, Result};
use glob::glob;
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions the linter accepts.
const TS_EXTENSIONS: [&str; 4] = ["ts", "tsx", "mts", "cts"];

pub fn is_typescript_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| TS_EXTENSIONS.contains(&ext))
}

fn is_skipped_dir(name: &str) -> bool {
    name == "node_modules" || name.starts_with('.')
}

/// Expands files, directories and glob patterns into a sorted, deduplicated
/// list of TypeScript files. Directory walks never descend into
/// `node_modules` or hidden directories.
pub fn find_typescript_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_typescript_file(path) {
                files.push(path.clone());
            }
        } else if path.is_dir() {
            walk_directory(path, &mut files)?;
        } else {
            expand_glob(path, &mut files)?;
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn walk_directory(root: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = fs::read_dir(&dir)
            .with_context(|| format!("Failed to read directory: {}", dir.display()))?;
        for entry in entries {
            let path = entry.context("Failed to read directory entry")?.path();
            if path.is_dir() {
                let descend = path
                    .file_name()
                    .map_or(false, |name| !is_skipped_dir(&name.to_string_lossy()));
                if descend {
                    pending.push(path);
                }
            } else if is_typescript_file(&path) {
                files.push(path);
            }
        }
    }
    Ok(())
}

fn expand_glob(pattern: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let pattern = pattern.to_str().context("Invalid path")?;
    for entry in glob(pattern).context("Failed to read glob pattern")? {
        let path = entry.context("Failed to process glob entry")?;
        if is_typescript_file(&path) {
            files.push(path);
        }
    }
    Ok(())
}

/// Reads and rewrites source files, optionally keeping a `.bak` copy of the
/// original next to it.
pub struct FileHandler {
    backup_enabled: bool,
}

impl FileHandler {
    pub fn new(backup_enabled: bool) -> Self {
        Self { backup_enabled }
    }

    pub fn read_file(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))
    }

    pub fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        if self.backup_enabled {
            self.back_up(path)?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write file: {}", path.display()))
    }

    fn back_up(&self, path: &Path) -> Result<()> {
        let mut extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_string();
        extension.push_str(".bak");
        let backup = path.with_extension(extension);

        fs::copy(path, &backup)
            .with_context(|| format!("Failed to create backup: {}", backup.display()))?;
        Ok(())
    }
}
