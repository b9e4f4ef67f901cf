//! Overload resolution for `ForEach`/`LazyForEach` call sites.
//!
//! Accepted shapes:
//! - `(source)`: no generator; legacy only
//! - `(source, generator)`: runtime default key; legacy only
//! - `(source, generator, key)`: the key function is used exactly as written

use ets_ast::{Expr, IterationArg, IterationBlock, ItemGenerator};

use crate::error::{LowerError, LowerErrorKind};
use crate::snippet::{function_arity, is_function};

/// An iteration call with its arguments sorted into roles.
#[derive(Debug)]
pub(crate) struct ResolvedIteration<'a> {
    pub source: &'a Expr,
    pub generator: Option<&'a ItemGenerator>,
    pub key: Option<&'a Expr>,
}

impl ResolvedIteration<'_> {
    /// Whether the key function declares an index parameter.
    pub fn key_has_index(&self) -> bool {
        self.key
            .and_then(|key| function_arity(key.as_str()))
            .is_some_and(|arity| arity > 1)
    }
}

/// Sorts the arguments of an iteration call into source, generator and key.
pub(crate) fn resolve(
    block: &IterationBlock,
    require_key: bool,
) -> Result<ResolvedIteration<'_>, LowerError> {
    let construct = block.kind.as_str();
    let invalid = |detail: String| {
        LowerError::new(LowerErrorKind::InvalidIteration { detail }, block.span)
    };

    let (source, rest) = match block.args.split_first() {
        Some((IterationArg::Expr(source), rest)) => (source, rest),
        Some((IterationArg::Generator(_), _)) => {
            return Err(invalid(format!(
                "the first argument of {construct} must be the data source"
            )))
        }
        None => return Err(invalid(format!("{construct} called without arguments"))),
    };

    let generator = match rest.first() {
        None => None,
        Some(IterationArg::Generator(generator)) => Some(generator),
        Some(IterationArg::Expr(expr)) => {
            return Err(invalid(format!(
                "the second argument of {construct} must be an item generator, found `{}`",
                expr.as_str().trim()
            )))
        }
    };

    let key = match rest.get(1) {
        None => None,
        Some(IterationArg::Expr(key)) if is_function(key.as_str()) => Some(key),
        Some(IterationArg::Expr(key)) if !looks_like_literal(key) => Some(key),
        Some(_) => {
            return Err(invalid(format!(
                "the third argument of {construct} must be a key generator function"
            )))
        }
    };

    if rest.len() > 2 {
        return Err(invalid(format!(
            "{construct} takes at most 3 arguments, found {}",
            block.args.len()
        )));
    }

    if require_key && key.is_none() {
        return Err(LowerError::new(
            LowerErrorKind::MissingKey {
                construct: construct.into(),
            },
            block.span,
        ));
    }

    Ok(ResolvedIteration {
        source,
        generator,
        key,
    })
}

fn looks_like_literal(expr: &Expr) -> bool {
    let text = expr.as_str().trim();
    expr.string_literal().is_some()
        || text.parse::<f64>().is_ok()
        || matches!(text, "true" | "false" | "null" | "undefined")
}
