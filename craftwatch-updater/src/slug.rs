//! Modrinth project slug inference from jar filenames.
//!
//! Mod jars follow loose naming conventions like
//! `sodium-fabric-0.5.8+mc1.20.1.jar`. The project slug is recovered by
//! stripping loader names and version suffixes; ambiguous names are
//! corrected through a user-supplied overrides map.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// Loader name plus `mc`-prefixed version suffix, e.g. `-fabric-mc1.20.1`.
static LOADER_VERSION_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-_](fabric|forge)?[-_]?mc?\d+(\.\d+)*.*$").expect("hardcoded regex must compile")
});

/// Bare loader name segment, e.g. `-fabric`.
static LOADER_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-_](fabric|forge)\b").expect("hardcoded regex must compile"));

/// Trailing version number, e.g. `-0.91.0+1.20.1`.
static VERSION_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-_]\d+(\.\d+)*.*$").expect("hardcoded regex must compile"));

/// Infer the Modrinth project slug from a jar filename.
///
/// Strips the `.jar` extension, lowercases, removes loader and version
/// suffixes, then applies the overrides map for mods whose filename does
/// not match their project slug.
pub fn infer_slug(filename: &str, overrides: &HashMap<String, String>) -> String {
    let base = filename
        .strip_suffix(".jar")
        .unwrap_or(filename)
        .to_lowercase();

    let base = LOADER_VERSION_SUFFIX.replace(&base, "");
    let base = LOADER_SEGMENT.replace_all(&base, "");
    let base = VERSION_SUFFIX.replace(&base, "").into_owned();

    overrides.get(&base).cloned().unwrap_or(base)
}
