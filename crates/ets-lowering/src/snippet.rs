//! Structural queries over verbatim expression snippets.
//!
//! Expressions reach the pass as source text. The few places that need structure
//! (identifier sets, function arity, entry options) parse the snippet with swc.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use swc_common::{FileName, SourceMap, Spanned};
use swc_ecma_ast::{Expr, Ident, Lit};
use swc_ecma_parser::{Parser, StringInput, Syntax, TsSyntax};
use swc_ecma_visit::{Visit, VisitWith};

/// A parsed expression together with the offset of its first byte.
pub(crate) struct Snippet<'a> {
    pub text: &'a str,
    pub expr: Box<Expr>,
    base: u32,
}

impl<'a> Snippet<'a> {
    /// Parses `text` as a single TypeScript expression.
    pub fn parse(text: &'a str) -> Option<Self> {
        let cm: Arc<SourceMap> = Default::default();
        let fm = cm.new_source_file(
            FileName::Custom("ets-snippet".into()).into(),
            text.to_string(),
        );
        let syntax = Syntax::Typescript(TsSyntax {
            tsx: false,
            decorators: true,
            ..Default::default()
        });
        let mut parser = Parser::new(syntax, StringInput::from(&*fm), None);
        let expr = parser.parse_expr().ok()?;
        Some(Self {
            text,
            expr,
            base: fm.start_pos.0,
        })
    }

    /// The source text covered by a node of this snippet.
    pub fn slice(&self, node: &impl Spanned) -> &'a str {
        let (start, end) = self.range(node);
        self.text.get(start..end).unwrap_or_default()
    }

    /// Byte range of a node relative to the snippet text.
    pub fn range(&self, node: &impl Spanned) -> (usize, usize) {
        let span = node.span();
        let start = span.lo.0.saturating_sub(self.base) as usize;
        let end = span.hi.0.saturating_sub(self.base) as usize;
        (start.min(self.text.len()), end.min(self.text.len()))
    }
}

struct IdentCollector<'a> {
    names: &'a mut FxHashSet<String>,
}

impl Visit for IdentCollector<'_> {
    fn visit_ident(&mut self, ident: &Ident) {
        self.names.insert(ident.sym.to_string());
    }
}

/// Adds every identifier referenced or bound in `text` to `names`.
///
/// Text that does not parse contributes its word-like tokens instead, which
/// over-approximates but never misses a name.
pub(crate) fn collect_idents(text: &str, names: &mut FxHashSet<String>) {
    match Snippet::parse(text) {
        Some(snippet) => snippet.expr.visit_with(&mut IdentCollector { names }),
        None => {
            for word in text.split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$')) {
                if !word.is_empty() {
                    names.insert(word.to_string());
                }
            }
        }
    }
}

/// Number of declared parameters of an arrow or function expression.
pub(crate) fn function_arity(text: &str) -> Option<usize> {
    let snippet = Snippet::parse(text)?;
    match unparen(&snippet.expr) {
        Expr::Arrow(arrow) => Some(arrow.params.len()),
        Expr::Fn(function) => Some(function.function.params.len()),
        _ => None,
    }
}

/// Whether `text` is an arrow or function expression.
pub(crate) fn is_function(text: &str) -> bool {
    function_arity(text).is_some()
}

pub(crate) fn unparen(expr: &Expr) -> &Expr {
    match expr {
        Expr::Paren(inner) => unparen(&inner.expr),
        other => other,
    }
}

/// The value of a string literal expression.
pub(crate) fn string_value(expr: &Expr) -> Option<String> {
    match unparen(expr) {
        Expr::Lit(Lit::Str(s)) => Some(s.value.to_string_lossy().into_owned()),
        Expr::Tpl(tpl) if tpl.exprs.is_empty() && tpl.quasis.len() == 1 => {
            Some(tpl.quasis[0].raw.to_string())
        }
        _ => None,
    }
}

/// The value of a boolean literal expression.
pub(crate) fn bool_value(expr: &Expr) -> Option<bool> {
    match unparen(expr) {
        Expr::Lit(Lit::Bool(b)) => Some(b.value),
        _ => None,
    }
}

/// Whether `name` is a plain identifier such as `count` or `_id2`.
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// A name that does not clash with anything in `taken`: `base`, then `base_1`, ...
pub(crate) fn fresh_name(base: &str, taken: &FxHashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{base}_{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}
