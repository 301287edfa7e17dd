use globset::{Glob, GlobSet, GlobSetBuilder};

/// Builds a `GlobSet` from `.gitignore`-style patterns, matched against paths relative to the
/// tree root.
pub fn build_globset_from_patterns<'a, I>(patterns: I) -> GlobSet
where
    I: IntoIterator<Item = &'a String>,
{
    let mut builder = GlobSetBuilder::new();

    for pattern in patterns {
        let trimmed_pattern = pattern.trim();
        if trimmed_pattern.is_empty() || trimmed_pattern.starts_with('#') {
            continue;
        }

        // "target/" only names directories; the directory itself is enough because ignored
        // directories are never descended into.
        let name = trimmed_pattern
            .strip_suffix('/')
            .unwrap_or(trimmed_pattern);
        match Glob::new(&format!("**/{name}")) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => tracing::warn!("Skipping invalid ignore pattern {:?}: {}", pattern, e),
        }
    }

    builder.build().unwrap_or_else(|e| {
        tracing::error!("Failed to build glob set from patterns: {}", e);
        GlobSet::empty()
    })
}
