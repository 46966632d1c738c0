use crate::analyzers::python::has_class_or_static_decorator;
use crate::cfg::returns_nonconstant;
use crate::complexity::{cyclomatic_complexity, ComplexityBand};
use crate::core::SelectedFunction;
use rayon::prelude::*;

/// Keep functions that compute a value: not class/static methods, and with a
/// non-constant return on some exit. Survivors are annotated with their
/// cyclomatic complexity.
pub fn filter_returns(functions: &[SelectedFunction]) -> Vec<SelectedFunction> {
    functions
        .par_iter()
        .filter_map(|function| {
            if has_class_or_static_decorator(&function.code) {
                return None;
            }
            match returns_nonconstant(&function.code) {
                Ok(true) => {}
                Ok(false) => return None,
                Err(e) => {
                    log::debug!("Dropping {} in return filter: {}", function.uri, e);
                    return None;
                }
            }
            let complexity = cyclomatic_complexity(&function.code)
                .map_err(|e| log::debug!("No complexity for {}: {}", function.uri, e))
                .ok()?;
            let mut annotated = function.clone();
            annotated.cyclomatic_complexity = Some(complexity);
            Some(annotated)
        })
        .collect()
}

/// Functions with parameters whose complexity falls inside `band`
pub fn select_benchmark_candidates<'a, I>(functions: I, band: ComplexityBand) -> Vec<SelectedFunction>
where
    I: IntoIterator<Item = &'a SelectedFunction>,
{
    functions
        .into_iter()
        .filter(|function| function.arity > 0)
        .filter(|function| {
            function
                .cyclomatic_complexity
                .is_some_and(|cc| band.contains(cc))
        })
        .cloned()
        .collect()
}
