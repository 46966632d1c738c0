use crate::errors::ClassificationResult;
use std::collections::BTreeSet;

pub mod python;

pub use python::PythonScopeResolver;

/// Finds the names a function reads but never binds.
///
/// A resolver is fixed to one language. The source handed in is the text of a
/// single function definition (possibly indented, possibly decorated).
pub trait ScopeResolver: Send + Sync {
    fn unresolved_refs(&self, source: &str) -> ClassificationResult<BTreeSet<String>>;
}

/// Resolver for the only analyzed language
pub fn get_resolver() -> Box<dyn ScopeResolver> {
    Box::new(PythonScopeResolver::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolver_is_object_safe() {
        let resolver = get_resolver();
        let refs = resolver
            .unresolved_refs("def f(x):\n    return os.path.join(x)\n")
            .unwrap();
        assert_eq!(refs.into_iter().collect::<Vec<_>>(), vec!["os"]);
    }
}
