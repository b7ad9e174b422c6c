use globset::{GlobSet, GlobSetBuilder};

/// Exclusion patterns for tree enumeration.
///
/// Each pattern `p` is matched against the root-relative path (with `/` separators) in three
/// forms: `p`, `**/p` and `**/p/**`. So `node_modules` hides a top-level `node_modules`, a
/// nested `a/node_modules`, and anything below either. Matching is per glob, never substring:
/// `.env` does not hide `.env.local`.
///
/// Building the matcher cannot fail. A pattern that does not parse is dropped with a warning.
#[derive(Debug, Default)]
pub(super) struct ExcludeMatcher {
    set: Option<GlobSet>,
}

impl ExcludeMatcher {
    pub(super) fn compile(patterns: &[String]) -> Self {
        let mut builder = GlobSetBuilder::new();
        let mut added = 0usize;

        for pattern in patterns {
            if pattern.trim().is_empty() {
                continue;
            }
            let normalized = crate::path_utils::normalize_glob_pattern_for_matching(pattern);
            let forms = [
                format!("**/{normalized}/**"),
                format!("**/{normalized}"),
                normalized,
            ];
            let mut globs = Vec::with_capacity(forms.len());
            for form in &forms {
                match crate::path_utils::build_glob(form) {
                    Ok(glob) => globs.push(glob),
                    Err(err) => {
                        tracing::warn!(pattern, error = %err, "ignoring invalid exclude pattern");
                        globs.clear();
                        break;
                    }
                }
            }
            for glob in globs {
                builder.add(glob);
                added += 1;
            }
        }

        if added == 0 {
            return Self::default();
        }
        match builder.build() {
            Ok(set) => Self { set: Some(set) },
            Err(err) => {
                tracing::warn!(error = %err, "failed to build exclude patterns; nothing is excluded");
                Self::default()
            }
        }
    }

    pub(super) fn is_match(&self, relative: &str) -> bool {
        self.set.as_ref().is_some_and(|set| set.is_match(relative))
    }
}
