//! Formula parameter resolution
//!
//! Works out which declared formula parameters (and attribute paths through
//! them) a formula expression references. The result is advisory: it feeds
//! dependency and test-input tooling, while syntax and typing are left to a
//! `FormulaCompiler`. Anything that cannot be resolved is left out rather
//! than reported.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::errors::PxError;
use crate::hierarchy::find_attribute;
use crate::model::{Parameter, TableContentUsage};
use crate::ops::ModelStore;

static STRING_LITERAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""(?:[^"\\]|\\.)*""#).unwrap());

static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*").unwrap()
});

/// Lookup context for resolving identifiers
#[derive(Clone, Copy)]
pub struct FormulaContext<'a> {
    pub store: &'a ModelStore,
    /// Project the formula's component belongs to
    pub project: &'a str,
    /// Table usages of the generation holding the formula
    pub table_usages: &'a [TableContentUsage],
}

/// Identifiers in `expression` that refer to `params`
///
/// - a plain parameter name is included as is
/// - `param.attr[.attr...]` is included when every segment resolves as an
///   attribute of the previous segment's datatype
/// - `Enum.value` literals, table usage column accesses, function names and
///   text inside string literals are not parameters
pub fn resolve_parameters(
    expression: &str,
    params: &[Parameter],
    context: &FormulaContext<'_>,
) -> BTreeSet<String> {
    let source = STRING_LITERAL_RE.replace_all(expression, " ");
    let mut found = BTreeSet::new();

    for m in IDENTIFIER_RE.find_iter(&source) {
        let is_call = source[m.end()..].trim_start().starts_with('(');
        let candidate = if is_call {
            // `param.method(..)` still references `param`.
            match m.as_str().rsplit_once('.') {
                Some((receiver, _)) => receiver,
                None => continue,
            }
        } else {
            m.as_str()
        };

        if let Some(identifier) = resolve_identifier(candidate, params, context) {
            found.insert(identifier);
        }
    }
    found
}

fn resolve_identifier(
    candidate: &str,
    params: &[Parameter],
    context: &FormulaContext<'_>,
) -> Option<String> {
    let mut segments = candidate.split('.');
    let first = segments.next()?;

    if context
        .table_usages
        .iter()
        .any(|u| u.structure_usage == first)
    {
        return None;
    }
    if is_enum_literal(candidate, context.store) {
        return None;
    }

    let param = params.iter().find(|p| p.name == first)?;
    let mut datatype = param.datatype.as_str();
    for segment in segments {
        let ty = context.store.find_type(context.project, datatype)?;
        let (_, attribute) = find_attribute(context.store, ty, segment)?;
        datatype = attribute.datatype.as_str();
    }
    Some(candidate.to_string())
}

fn is_enum_literal(candidate: &str, store: &ModelStore) -> bool {
    let Some((enum_name, value)) = candidate.rsplit_once('.') else {
        return false;
    };
    store
        .find_enum(enum_name)
        .is_some_and(|e| e.has_value(value))
}

/// Result of compiling a formula expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    Compiled {
        /// Inferred result datatype
        datatype: String,
        /// Identifiers the compiler saw
        identifiers: Vec<String>,
    },
    Invalid {
        reason: String,
    },
}

/// Expression compiler for formulas
///
/// An `Err` means the compiler itself failed and is propagated unchanged;
/// an invalid expression is an `Ok(CompileOutcome::Invalid)`.
pub trait FormulaCompiler {
    fn compile(&self, expression: &str, params: &[Parameter]) -> Result<CompileOutcome, PxError>;
}
