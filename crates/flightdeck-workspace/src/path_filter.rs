//! Path denylist, checked before any tracking I/O.

use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use once_cell::sync::Lazy;

/// Directory segments that are never tracked: dependency trees,
/// version-control metadata, build output, caches.
const DENY_SEGMENTS: &[&str] = &[
    "node_modules",
    ".git",
    ".hg",
    ".svn",
    "target",
    "__pycache__",
    ".venv",
    "venv",
    "dist",
    "build",
    ".cache",
    ".idea",
    ".vscode",
];

/// Binary file extensions that are never tracked.
const DENY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "pdf", "zip", "tar", "gz", "bz2", "xz",
    "7z", "exe", "dll", "so", "dylib", "class", "o", "a", "wasm", "woff", "woff2", "ttf", "eot",
    "mp3", "mp4", "avi", "mov", "sqlite", "db",
];

#[allow(clippy::expect_used)]
static DENYLIST: Lazy<GlobSet> = Lazy::new(|| {
    let mut builder = GlobSetBuilder::new();
    for segment in DENY_SEGMENTS {
        for pattern in [format!("**/{segment}/**"), format!("**/{segment}")] {
            builder.add(Glob::new(&pattern).expect("static denylist glob must compile"));
        }
    }
    for extension in DENY_EXTENSIONS {
        builder.add(
            Glob::new(&format!("**/*.{extension}")).expect("static denylist glob must compile"),
        );
    }
    builder.build().expect("static denylist set must compile")
});

/// Whether a path is excluded from tracking.
#[must_use]
pub fn is_denied(path: &Path) -> bool {
    DENYLIST.is_match(path)
}
