//! Injected predicates applied when the package index is iterated.

use super::{DeclaredType, Function, Package};

/// Decides which artifacts show up when collaborators iterate the
/// [`Builder`](super::Builder)'s package index. Filtering never affects
/// registration or resolution, only iteration results.
pub trait ArtifactFilter: Send {
    fn accept_package(&self, _package: &Package) -> bool {
        true
    }

    fn accept_type(&self, _ty: &DeclaredType) -> bool {
        true
    }

    fn accept_function(&self, _function: &Function) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl ArtifactFilter for AcceptAll {}

/// Suppresses packages by name. A pattern ending in `\*` matches the
/// namespace itself and every namespace below it.
#[derive(Debug, Clone, Default)]
pub struct PackageFilter {
    patterns: Vec<String>,
}

impl PackageFilter {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PackageFilter {
            patterns: patterns
                .into_iter()
                .map(|p| p.into().trim_start_matches('\\').to_owned())
                .collect(),
        }
    }

    pub fn excludes(&self, package: &str) -> bool {
        self.patterns.iter().any(|p| match p.strip_suffix("\\*") {
            Some(prefix) => {
                package == prefix
                    || package
                        .strip_prefix(prefix)
                        .is_some_and(|rest| rest.starts_with('\\'))
            }
            None => package == p,
        })
    }
}

impl ArtifactFilter for PackageFilter {
    fn accept_package(&self, package: &Package) -> bool {
        !self.excludes(package.name())
    }
}
