//! Config file discovery
//!
//! Locates config files by filename suffix. The directory to search is
//! always an explicit parameter, never read from ambient process state, so
//! callers (and tests) control exactly what is scanned. A `plow/`
//! subdirectory takes precedence over the directory itself when present.

use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use tokio::fs;

use crate::types::PlowResult;

/// Subdirectory that, when present, holds the config files.
const CONFIG_DIR: &str = "plow";

/// Filename patterns recognized as config files.
const CONFIG_PATTERNS: &[&str] = &["*.plow.js", "*.plow.ts", "*.mjs"];

fn config_matcher() -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in CONFIG_PATTERNS {
        if let Ok(glob) = Glob::new(pattern) {
            builder.add(glob);
        }
    }
    builder.build().unwrap_or_default()
}

/// List config files in `dir`, sorted by name. If `dir` contains a `plow/`
/// subdirectory, only that subdirectory is searched and the returned names
/// keep the `plow/` prefix.
pub async fn find_config_files(dir: &Path) -> PlowResult<Vec<String>> {
    let config_dir = dir.join(CONFIG_DIR);
    let (search_dir, prefix) = if config_dir.is_dir() {
        (config_dir, Some(CONFIG_DIR))
    } else {
        (dir.to_path_buf(), None)
    };

    let matcher = config_matcher();
    let mut files = Vec::new();
    let mut entries = fs::read_dir(&search_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if matcher.is_match(file_name) {
            match prefix {
                Some(prefix) => files.push(format!("{}/{}", prefix, file_name)),
                None => files.push(file_name.to_string()),
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Match a user-provided name against the config files in `dir`. The first
/// discovered file whose name contains `name` wins.
pub async fn match_config_name(dir: &Path, name: &str) -> PlowResult<Option<String>> {
    let files = find_config_files(dir).await?;
    Ok(files.into_iter().find(|file| file.contains(name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), "task(\"t\", () => {}, []);").expect("writes");
    }

    #[tokio::test]
    async fn finds_suffix_matched_files_sorted() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "b.plow.js");
        write(dir.path(), "a.plow.ts");
        write(dir.path(), "c.mjs");
        write(dir.path(), "notes.txt");

        let files = find_config_files(dir.path()).await.expect("lists");
        assert_eq!(files, vec!["a.plow.ts", "b.plow.js", "c.mjs"]);
    }

    #[tokio::test]
    async fn prefers_the_plow_subdirectory() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "outer.plow.js");
        std::fs::create_dir(dir.path().join("plow")).expect("mkdir");
        write(&dir.path().join("plow"), "inner.plow.js");

        let files = find_config_files(dir.path()).await.expect("lists");
        assert_eq!(files, vec!["plow/inner.plow.js"]);
    }

    #[tokio::test]
    async fn empty_directory_yields_no_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let files = find_config_files(dir.path()).await.expect("lists");
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn matches_a_provided_name_by_substring() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "deploy.plow.js");
        write(dir.path(), "test.plow.js");

        let matched = match_config_name(dir.path(), "dep").await.expect("matches");
        assert_eq!(matched.as_deref(), Some("deploy.plow.js"));
        let missing = match_config_name(dir.path(), "nope").await.expect("matches");
        assert!(missing.is_none());
    }
}
