// Cache path utilities.
// Filesystem locations for cached pages and the TUI log file.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

/// Get the base cache directory (~/.cache/contact-scout on Linux).
pub fn cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "contact-scout").map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Log file used while the TUI owns the terminal.
pub fn log_path() -> Option<PathBuf> {
    cache_dir().map(|dir| dir.join("contact-scout.log"))
}

/// Directory holding cached pages below `root`.
pub fn pages_dir(root: &Path) -> PathBuf {
    root.join("pages")
}

/// Path to the cached copy of a page.
pub fn page_path(root: &Path, url: &str) -> PathBuf {
    pages_dir(root).join(format!("{}-{}.json", sanitize_name(host_of(url)), url_hash(url)))
}

fn host_of(url: &str) -> &str {
    let rest = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    rest.split(['/', '?', '#']).next().unwrap_or(rest)
}

/// First 16 hex digits of the BLAKE3 digest; stable across builds.
fn url_hash(url: &str) -> String {
    let digest = blake3::hash(url.as_bytes()).to_hex();
    digest.as_str()[..16].to_string()
}

/// Sanitize a name for use in filesystem paths.
/// Replaces problematic characters with underscores.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}
