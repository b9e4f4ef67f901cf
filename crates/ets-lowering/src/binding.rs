//! Two-way binding (`$$`) and link-argument (`$name`) rewriting.

use ets_span::Span;
use rustc_hash::FxHashSet;
use swc_ecma_ast::{Expr as SwcExpr, MemberProp};
use swc_ecma_visit::{Visit, VisitWith};

use crate::compose::Scope;
use crate::error::{LowerError, LowerErrorKind};
use crate::js::{params, Expr, Property};
use crate::printer::print_expr;
use crate::snippet::{collect_idents, fresh_name, is_identifier, Snippet};

const TWO_WAY_PREFIX: &str = "$$";

/// Rewrites every `$$`-marked reference in `text` into a `{ value, changeEvent }` pair.
///
/// Text without a marker is returned unchanged and never parsed.
pub(crate) fn rewrite_two_way(text: &str, scope: &Scope, span: Span) -> Result<String, LowerError> {
    if !text.contains(TWO_WAY_PREFIX) {
        return Ok(text.to_string());
    }
    let Some(snippet) = Snippet::parse(text) else {
        tracing::trace!(text, "two-way marker in unparsable snippet; passed through");
        return Ok(text.to_string());
    };

    let mut finder = ChainFinder {
        by_reference: scope.is_bound(TWO_WAY_PREFIX),
        chains: Vec::new(),
    };
    snippet.expr.visit_with(&mut finder);
    if finder.chains.is_empty() {
        return Ok(text.to_string());
    }

    let mut taken = FxHashSet::default();
    collect_idents(text, &mut taken);
    taken.extend(scope.bindings().map(str::to_string));
    let param = fresh_name("newValue", &taken);

    let mut out = String::with_capacity(text.len() + 64);
    let mut cursor = 0;
    for chain in &finder.chains {
        let (start, end) = snippet.range(chain);
        let marked = &text[start..end];
        let target = &marked[TWO_WAY_PREFIX.len()..];
        resolve(target, chain, scope, span)?;

        out.push_str(&text[cursor..start]);
        out.push_str(&print_expr(&two_way_pair(target, &param)));
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    Ok(out)
}

/// `{ value: <target>, changeEvent: <param> => { <target> = <param>; } }`
pub(crate) fn two_way_pair(target: &str, param: &str) -> Expr {
    Expr::object(vec![
        Property::new("value", Expr::raw(target)),
        Property::new(
            "changeEvent",
            Expr::arrow_inline(
                params([param]),
                vec![Expr::assign(Expr::raw(target), Expr::id(param)).stmt()],
            ),
        ),
    ])
}

/// `$count` as a component argument refers to the caller's wrapper `this.__count`.
///
/// Returns `Ok(None)` for text that is not a link shorthand. Inside a component the
/// name must be one of its wrapped members.
pub(crate) fn link_argument(
    text: &str,
    scope: &Scope,
    span: Span,
) -> Result<Option<Expr>, LowerError> {
    let Some(name) = text.trim().strip_prefix('$') else {
        return Ok(None);
    };
    if name.starts_with('$') || !is_identifier(name) {
        return Ok(None);
    }
    let unresolved = || {
        LowerError::new(
            LowerErrorKind::UnresolvedBinding {
                name: format!("${name}").into(),
            },
            span,
        )
    };
    if !scope.has_member(name) {
        return Err(unresolved());
    }
    match scope.member(name) {
        Some(member) if member.role.is_wrapped() => Ok(Some(Expr::this_prop(member.backing_field()))),
        Some(_) => Err(unresolved()),
        None => Ok(Some(Expr::this_prop(format!("__{name}")))),
    }
}

fn resolve(target: &str, chain: &SwcExpr, scope: &Scope, span: Span) -> Result<(), LowerError> {
    let unresolved = |name: &str| {
        LowerError::new(
            LowerErrorKind::UnresolvedBinding { name: name.into() },
            span,
        )
    };
    let root = chain_root(chain).ok_or_else(|| unresolved(target))?;
    let root = root.trim_start_matches(TWO_WAY_PREFIX);
    if root.is_empty() {
        Err(unresolved(TWO_WAY_PREFIX))
    } else if root == "this" {
        let member = first_member(chain).ok_or_else(|| unresolved("this"))?;
        if scope.has_member(&member) {
            Ok(())
        } else {
            Err(unresolved(&format!("this.{member}")))
        }
    } else if scope.is_bound(root) {
        Ok(())
    } else {
        Err(unresolved(root))
    }
}

fn chain_root(expr: &SwcExpr) -> Option<String> {
    match expr {
        SwcExpr::Ident(ident) => Some(ident.sym.to_string()),
        SwcExpr::Member(member) => chain_root(&member.obj),
        _ => None,
    }
}

/// For `$$this.a.b`, returns `a`.
fn first_member(expr: &SwcExpr) -> Option<String> {
    let SwcExpr::Member(member) = expr else {
        return None;
    };
    match &*member.obj {
        SwcExpr::Ident(_) => match &member.prop {
            MemberProp::Ident(name) => Some(name.sym.to_string()),
            _ => None,
        },
        inner => first_member(inner),
    }
}

/// Finds maximal member chains rooted at a `$$`-prefixed identifier.
struct ChainFinder {
    /// A builder parameter named `$$` is bound: a bare `$$` root is that parameter.
    by_reference: bool,
    chains: Vec<SwcExpr>,
}

impl Visit for ChainFinder {
    fn visit_expr(&mut self, expr: &SwcExpr) {
        let marked = chain_root(expr).is_some_and(|root| {
            root.starts_with(TWO_WAY_PREFIX) && !(self.by_reference && root == TWO_WAY_PREFIX)
        });
        if marked {
            self.chains.push(expr.clone());
            return;
        }
        expr.visit_children_with(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::Scope;
    use pretty_assertions::assert_eq;

    fn scope() -> Scope {
        Scope::for_members(["value", "isOn"])
    }

    #[test]
    fn test_member_binding() {
        let out = rewrite_two_way("$$this.value", &scope(), Span::default()).unwrap();
        assert_eq!(
            out,
            "{ value: this.value, changeEvent: newValue => { this.value = newValue; } }"
        );
    }

    #[test]
    fn test_binding_inside_object_argument() {
        let out = rewrite_two_way(
            "{ type: ToggleType.Switch, isOn: $$this.isOn }",
            &scope(),
            Span::default(),
        )
        .unwrap();
        assert_eq!(
            out,
            "{ type: ToggleType.Switch, isOn: { value: this.isOn, changeEvent: newValue => { this.isOn = newValue; } } }"
        );
    }

    #[test]
    fn test_change_param_avoids_collisions() {
        let scope = scope().with_bindings(["newValue"]);
        let out = rewrite_two_way("$$this.value", &scope, Span::default()).unwrap();
        assert!(out.contains("newValue_1 => { this.value = newValue_1; }"));
    }

    #[test]
    fn test_enclosing_variable_binding() {
        let scope = scope().with_bindings(["item"]);
        let out = rewrite_two_way("$$item.done", &scope, Span::default()).unwrap();
        assert_eq!(
            out,
            "{ value: item.done, changeEvent: newValue => { item.done = newValue; } }"
        );
    }

    #[test]
    fn test_unresolved_binding() {
        let err = rewrite_two_way("$$this.missing", &scope(), Span::default()).unwrap_err();
        assert_eq!(
            err.kind,
            LowerErrorKind::UnresolvedBinding {
                name: "this.missing".into()
            }
        );
        let err = rewrite_two_way("$$ghost", &scope(), Span::default()).unwrap_err();
        assert_eq!(
            err.kind,
            LowerErrorKind::UnresolvedBinding {
                name: "ghost".into()
            }
        );
    }

    #[test]
    fn test_unmarked_text_untouched() {
        let text = "this.price * 1.1";
        assert_eq!(rewrite_two_way(text, &scope(), Span::default()).unwrap(), text);
    }

    #[test]
    fn test_by_reference_parameter_is_plain() {
        let scope = Scope::for_members(["count"]).with_bindings(["$$"]);
        let text = "'Hello' + $$.count";
        assert_eq!(rewrite_two_way(text, &scope, Span::default()).unwrap(), text);

        let out = rewrite_two_way("{ text: $$.label, on: $$this.count }", &scope, Span::default())
            .unwrap();
        assert_eq!(
            out,
            "{ text: $$.label, on: { value: this.count, changeEvent: newValue => { this.count = newValue; } } }"
        );
    }

    #[test]
    fn test_unbound_bare_marker() {
        let err = rewrite_two_way("$$.count", &scope(), Span::default()).unwrap_err();
        assert_eq!(err.kind, LowerErrorKind::UnresolvedBinding { name: "$$".into() });
    }

    #[test]
    fn test_link_argument() {
        let scope = scope();
        let link = |text: &str| link_argument(text, &scope, Span::default());
        assert_eq!(link("$value").unwrap(), Some(Expr::this_prop("__value")));
        assert_eq!(link("$$value").unwrap(), None);
        assert_eq!(link("value").unwrap(), None);
        assert_eq!(link("$a.b").unwrap(), None);

        let global = Scope::global_builder(["label"]);
        assert_eq!(
            link_argument("$label", &global, Span::default()).unwrap(),
            Some(Expr::this_prop("__label"))
        );
    }

    #[test]
    fn test_link_argument_must_name_a_wrapped_member() {
        let err = link_argument("$ghost", &scope(), Span::default()).unwrap_err();
        assert_eq!(err.kind, LowerErrorKind::UnresolvedBinding { name: "$ghost".into() });
    }
}
