use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

const WILDCARD: &str = "*";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern {0:?} has more than one wildcard segment")]
    MultipleWildcards(PathBuf),

    #[error("pattern {0:?} uses '*' inside a segment name; only whole-segment wildcards are supported")]
    PartialWildcard(PathBuf),
}

impl PatternError {
    /// The pattern text that was rejected
    pub fn path(&self) -> &Path {
        match self {
            PatternError::MultipleWildcards(path) | PatternError::PartialWildcard(path) => path,
        }
    }
}

/// Filesystem location with at most one variable directory segment,
/// e.g. `~/.nvm/versions/node/*/bin/claude`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    Literal(PathBuf),
    Wildcard { prefix: PathBuf, suffix: PathBuf },
}

impl PathPattern {
    pub fn parse(path: impl AsRef<Path>) -> Result<Self, PatternError> {
        let path = path.as_ref();
        let mut prefix = PathBuf::new();
        let mut suffix = PathBuf::new();
        let mut seen_wildcard = false;

        for component in path.components() {
            let text = component.as_os_str().to_string_lossy();
            if matches!(component, Component::Normal(_)) && text == WILDCARD {
                if seen_wildcard {
                    return Err(PatternError::MultipleWildcards(path.to_path_buf()));
                }
                seen_wildcard = true;
                continue;
            }
            if text.contains(WILDCARD) {
                return Err(PatternError::PartialWildcard(path.to_path_buf()));
            }

            if seen_wildcard {
                suffix.push(component);
            } else {
                prefix.push(component);
            }
        }

        if seen_wildcard {
            Ok(PathPattern::Wildcard { prefix, suffix })
        } else {
            Ok(PathPattern::Literal(prefix))
        }
    }

    /// Hang a relative pattern off `base` without re-reading `base` for wildcards
    pub fn anchored_at(self, base: &Path) -> Self {
        match self {
            PathPattern::Literal(path) => PathPattern::Literal(base.join(path)),
            PathPattern::Wildcard { prefix, suffix } => PathPattern::Wildcard {
                prefix: base.join(prefix),
                suffix,
            },
        }
    }

    /// Concrete paths this pattern currently stands for.
    ///
    /// A wildcard whose prefix directory does not exist expands to nothing.
    pub fn expand(&self) -> io::Result<Vec<PathBuf>> {
        match self {
            PathPattern::Literal(path) => Ok(vec![path.clone()]),
            PathPattern::Wildcard { prefix, suffix } => {
                if !prefix.is_dir() {
                    return Ok(Vec::new());
                }

                let mut names = fs::read_dir(prefix)?
                    .map(|entry| entry.map(|entry| entry.file_name()))
                    .collect::<io::Result<Vec<_>>>()?;
                names.sort();

                Ok(names
                    .into_iter()
                    .map(|name| {
                        let path = prefix.join(name);
                        if suffix.as_os_str().is_empty() {
                            path
                        } else {
                            path.join(suffix)
                        }
                    })
                    .collect())
            }
        }
    }

    /// Display form with the wildcard restored
    pub fn display(&self) -> String {
        match self {
            PathPattern::Literal(path) => path.display().to_string(),
            PathPattern::Wildcard { prefix, suffix } => {
                prefix.join(WILDCARD).join(suffix).display().to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_literal() {
        let pattern = PathPattern::parse("/usr/local/bin/claude").unwrap();
        assert_eq!(
            pattern,
            PathPattern::Literal(PathBuf::from("/usr/local/bin/claude"))
        );
    }

    #[test]
    fn test_parse_wildcard() {
        let pattern = PathPattern::parse("/home/me/.nvm/versions/node/*/bin/claude").unwrap();
        assert_eq!(
            pattern,
            PathPattern::Wildcard {
                prefix: PathBuf::from("/home/me/.nvm/versions/node"),
                suffix: PathBuf::from("bin/claude"),
            }
        );
    }

    #[test]
    fn test_parse_trailing_separator() {
        let pattern = PathPattern::parse("/opt/tools/*/").unwrap();
        assert_eq!(
            pattern,
            PathPattern::Wildcard {
                prefix: PathBuf::from("/opt/tools"),
                suffix: PathBuf::new(),
            }
        );
    }

    #[test]
    fn test_parse_rejects_multiple_wildcards() {
        let err = PathPattern::parse("/a/*/b/*/c").unwrap_err();
        assert!(matches!(err, PatternError::MultipleWildcards(_)));
    }

    #[test]
    fn test_parse_rejects_partial_wildcard() {
        let err = PathPattern::parse("/a/v*/bin").unwrap_err();
        assert!(matches!(err, PatternError::PartialWildcard(_)));
    }

    #[test]
    fn test_expand_missing_prefix_is_empty() {
        let temp = TempDir::new().unwrap();
        let pattern = PathPattern::parse(temp.path().join("nope/*/bin/claude")).unwrap();
        assert!(pattern.expand().unwrap().is_empty());
    }

    #[test]
    fn test_expand_lists_entries_in_order() {
        let temp = TempDir::new().unwrap();
        let base = temp.path().join("versions/node");
        for version in ["v20.1.0", "v18.0.0"] {
            fs::create_dir_all(base.join(version)).unwrap();
        }

        let pattern = PathPattern::parse(base.join("*/bin/claude")).unwrap();
        assert_eq!(
            pattern.expand().unwrap(),
            vec![
                base.join("v18.0.0/bin/claude"),
                base.join("v20.1.0/bin/claude"),
            ]
        );
    }

    #[test]
    fn test_anchored_at_keeps_star_in_base_literal() {
        let temp = TempDir::new().unwrap();
        let base = temp.path().join("we*rd");
        let node = base.join(".nvm/versions/node");
        fs::create_dir_all(node.join("v20.1.0")).unwrap();

        let pattern = PathPattern::parse(".nvm/versions/node/*/bin/claude")
            .unwrap()
            .anchored_at(&base);

        assert_eq!(
            pattern,
            PathPattern::Wildcard {
                prefix: node.clone(),
                suffix: PathBuf::from("bin/claude"),
            }
        );
        assert_eq!(pattern.expand().unwrap(), vec![node.join("v20.1.0/bin/claude")]);
    }

    #[test]
    fn test_error_names_rejected_path() {
        let err = PathPattern::parse("a/v*/bin").unwrap_err();
        assert_eq!(err.path(), Path::new("a/v*/bin"));
    }

    #[test]
    fn test_display_restores_wildcard() {
        let pattern = PathPattern::parse("/n/*/bin/claude").unwrap();
        assert_eq!(pattern.display(), "/n/*/bin/claude");
    }
}
