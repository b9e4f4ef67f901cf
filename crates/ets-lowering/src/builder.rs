//! Builder, `@Styles` and `@Extend` lowering.

use ets_ast::{
    AttributeCall, BuilderInvocation, CallReceiver, CompositionNode, FunctionDecl,
    Param as SourceParam,
};
use smol_str::SmolStr;
use swc_ecma_ast::{Expr as SwcExpr, Prop, PropOrSpread};

use crate::binding::rewrite_two_way;
use crate::classify::Classified;
use crate::compose::{Rewriter, Scope, UnitFacts};
use crate::error::LowerError;
use crate::js::{Expr, Function, Method, Param, Property, Stmt};
use crate::options::UpdateMode;
use crate::snippet::{is_identifier, unparen, Snippet};

/// Name of the function generated for `@Extend(Target) function name`.
pub(crate) fn extend_name(target: &str, name: &str) -> SmolStr {
    SmolStr::from(format!("__{target}__{name}"))
}

/// Lowers an attribute chain applied to `target`.
///
/// `@Styles` references are inlined with their calls retargeted; `@Extend` functions
/// declared for `target` are called by their generated name.
pub(crate) fn lower_attributes(
    target: &str,
    attrs: &[AttributeCall],
    scope: &Scope,
    unit: &UnitFacts,
) -> Result<Vec<Stmt>, LowerError> {
    let mut out = Vec::with_capacity(attrs.len());
    expand_attributes(target, attrs, scope, unit, &mut Vec::new(), &mut out)?;
    Ok(out)
}

fn expand_attributes(
    target: &str,
    attrs: &[AttributeCall],
    scope: &Scope,
    unit: &UnitFacts,
    expanding: &mut Vec<SmolStr>,
    out: &mut Vec<Stmt>,
) -> Result<(), LowerError> {
    for attr in attrs {
        if attr.args.is_empty() && !expanding.contains(&attr.name) {
            let style = scope
                .styles(&attr.name)
                .or_else(|| unit.global_styles.get(&attr.name).map(Vec::as_slice));
            if let Some(style) = style {
                expanding.push(attr.name.clone());
                expand_attributes(target, style, scope, unit, expanding, out)?;
                expanding.pop();
                continue;
            }
        }

        let args = attr
            .args
            .iter()
            .map(|arg| rewrite_two_way(arg.as_str().trim(), scope, attr.span).map(Expr::raw))
            .collect::<Result<Vec<_>, _>>()?;
        let extended = unit
            .extends
            .contains(&(SmolStr::from(target), attr.name.clone()));
        let call = if extended {
            Expr::id(extend_name(target, &attr.name)).call(args)
        } else {
            Expr::id(target).method(attr.name.clone(), args)
        };
        out.push(call.stmt());
    }
    Ok(())
}

/// Lowers a builder call inside a composition body.
///
/// Calls are bound to the rendering instance. A `@BuilderParam` may hold either a
/// builder function or a value already built by the caller, so its call is guarded.
/// A builder that takes its parameter by reference receives a proxy of getters in
/// place of the argument object.
pub(crate) fn lower_builder_call(
    call: &BuilderInvocation,
    scope: &Scope,
    unit: &UnitFacts,
) -> Result<Stmt, LowerError> {
    let by_reference = match call.receiver {
        CallReceiver::This => scope.builder_by_reference(&call.callee),
        CallReceiver::Free => unit.by_reference_builders.contains(&call.callee),
    };
    let args = match call.args.as_slice() {
        [only] if by_reference => match parameter_proxy(&call.callee, only.as_str().trim()) {
            Some(proxy) => vec![proxy],
            None => {
                tracing::debug!(builder = %call.callee, "by-reference argument is not an object literal");
                vec![Expr::raw(rewrite_two_way(only.as_str().trim(), scope, call.span)?)]
            }
        },
        args => args
            .iter()
            .map(|arg| rewrite_two_way(arg.as_str().trim(), scope, call.span).map(Expr::raw))
            .collect::<Result<Vec<_>, _>>()?,
    };

    let callee = match call.receiver {
        CallReceiver::This => Expr::This.prop(call.callee.clone()),
        CallReceiver::Free => Expr::id(call.callee.clone()),
    };
    let invoke = callee
        .clone()
        .method("bind", vec![Expr::This])
        .call(args)
        .stmt();

    let is_builder_param = call.receiver == CallReceiver::This
        && scope
            .member(&call.callee)
            .is_some_and(Classified::is_builder_param);
    if is_builder_param {
        let guard = Expr::binary(Expr::unary("typeof", callee), "===", Expr::str("function"));
        return Ok(Stmt::if_(guard, vec![invoke]));
    }
    Ok(invoke)
}

/// `b($$: T)`: the builder reads its argument through `$$` and sees later updates.
pub(crate) fn takes_parameter_by_reference(params: &[SourceParam]) -> bool {
    matches!(params, [only] if only.name == "$$")
}

/// `makeBuilderParameterProxy("b", { count: () => (this["__count"] ? this["__count"] : this["count"]) })`
///
/// `None` unless `arg` is an object literal of plain entries.
fn parameter_proxy(builder: &str, arg: &str) -> Option<Expr> {
    let snippet = Snippet::parse(arg)?;
    let SwcExpr::Object(object) = unparen(&snippet.expr) else {
        return None;
    };
    let mut entries = Vec::with_capacity(object.props.len());
    for prop in &object.props {
        let PropOrSpread::Prop(prop) = prop else {
            return None;
        };
        let (key, value) = match &**prop {
            Prop::KeyValue(entry) => (snippet.slice(&entry.key), snippet.slice(&*entry.value)),
            Prop::Shorthand(ident) => (snippet.slice(ident), snippet.slice(ident)),
            _ => return None,
        };
        entries.push(Property::new(key, Expr::arrow_expr(Vec::new(), proxy_getter(value))));
    }
    Some(Expr::id("makeBuilderParameterProxy").call(vec![Expr::str(builder), Expr::object(entries)]))
}

/// Reads a member through its wrapper when the member has one.
fn proxy_getter(value: &str) -> Expr {
    let value = value.trim();
    match value.strip_prefix("this.").filter(|name| is_identifier(name)) {
        Some(name) => {
            let slot = |key: &str| Expr::raw(format!("this[\"{key}\"]"));
            let wrapper = format!("__{name}");
            Expr::cond(slot(&wrapper), slot(&wrapper), slot(name)).paren()
        }
        None => Expr::raw(value).paren(),
    }
}

/// A global `@Builder` function.
pub(crate) fn builder_function(
    decl: &FunctionDecl,
    body: &[CompositionNode],
    rewriter: &mut Rewriter<'_>,
) -> Result<Function, LowerError> {
    let scope = Scope::global_builder(decl.params.iter().map(|p| p.name.clone()));
    Ok(Function {
        name: decl.name.clone(),
        params: builder_params(&decl.params, rewriter.mode()),
        body: rewriter.lower_body(body, &scope)?,
    })
}

/// A `@Builder` or `@LocalBuilder` method of a component.
pub(crate) fn builder_method(
    name: &str,
    params: &[SourceParam],
    body: &[CompositionNode],
    local: bool,
    scope: &Scope,
    rewriter: &mut Rewriter<'_>,
) -> Result<Method, LowerError> {
    let inner = scope
        .enter_dynamic()
        .with_bindings(params.iter().map(|p| p.name.clone()));
    let mut stmts = rewriter.lower_body(body, &inner)?;
    if local && rewriter.mode() == UpdateMode::Partial {
        stmts = within_context(stmts);
    }
    Ok(Method::new(name, builder_params(params, rewriter.mode()), stmts))
}

/// A global `@Extend(Target)` function: its attribute chain applied to `Target`.
pub(crate) fn extend_function(
    decl: &FunctionDecl,
    target: &str,
    attrs: &[AttributeCall],
    unit: &UnitFacts,
) -> Result<Function, LowerError> {
    let scope = Scope::global_builder(decl.params.iter().map(|p| p.name.clone()));
    Ok(Function {
        name: extend_name(target, &decl.name),
        params: plain_params(&decl.params),
        body: lower_attributes(target, attrs, &scope, unit)?,
    })
}

/// Pushes the rendering instance on the shared context stack around `body`; the pop
/// runs even when the body throws.
pub(crate) fn within_context(body: Vec<Stmt>) -> Vec<Stmt> {
    let stack = || Expr::id("PUV2ViewBase").prop("contextStack");
    let guarded = |method: &str, args: Vec<Expr>| {
        Expr::binary(stack(), "&&", stack().method(method, args)).stmt()
    };
    vec![
        guarded("push", vec![Expr::This]),
        Stmt::Try {
            body,
            finalizer: vec![guarded("pop", Vec::new())],
        },
    ]
}

pub(crate) fn plain_params(params: &[SourceParam]) -> Vec<Param> {
    params
        .iter()
        .map(|param| match &param.default {
            Some(default) => Param::with_default(param.name.clone(), Expr::raw(default.as_str().trim())),
            None => Param::new(param.name.clone()),
        })
        .collect()
}

/// Builder parameters; partial mode appends `parent = null` for the rendering instance.
fn builder_params(params: &[SourceParam], mode: UpdateMode) -> Vec<Param> {
    let mut out = plain_params(params);
    if mode == UpdateMode::Partial {
        out.push(Param::with_default("parent", Expr::id("null")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::print_stmts;
    use pretty_assertions::assert_eq;

    fn unit() -> UnitFacts {
        let mut unit = UnitFacts::default();
        unit.global_styles.insert(
            "card".into(),
            vec![
                AttributeCall::new("backgroundColor", ["Color.Red"]),
                AttributeCall::new("card", Vec::<&str>::new()),
            ],
        );
        unit.extends.insert(("Button".into(), "fancy".into()));
        unit
    }

    #[test]
    fn test_styles_inline_and_extend_calls() {
        let attrs = vec![
            AttributeCall::new("card", Vec::<&str>::new()),
            AttributeCall::new("fancy", ["Color.Green"]),
            AttributeCall::new("width", ["200"]),
        ];
        let out = lower_attributes("Button", &attrs, &Scope::for_members(["x"]), &unit()).unwrap();
        assert_eq!(
            print_stmts(&out),
            "Button.backgroundColor(Color.Red);\n\
             Button.card();\n\
             __Button__fancy(Color.Green);\n\
             Button.width(200);\n"
        );
    }

    #[test]
    fn test_extend_only_applies_to_its_target() {
        let attrs = vec![AttributeCall::new("fancy", ["1"])];
        let out = lower_attributes("Text", &attrs, &Scope::for_members(["x"]), &unit()).unwrap();
        assert_eq!(print_stmts(&out), "Text.fancy(1);\n");
    }

    #[test]
    fn test_builder_calls_bind_this() {
        let scope = Scope::for_members(["count"]);
        let unit = UnitFacts::default();
        let method =
            lower_builder_call(&BuilderInvocation::method("header").arg("'x'"), &scope, &unit).unwrap();
        assert_eq!(print_stmts(&[method]), "this.header.bind(this)('x');\n");

        let free = lower_builder_call(&BuilderInvocation::function("footer"), &scope, &unit).unwrap();
        assert_eq!(print_stmts(&[free]), "footer.bind(this)();\n");
    }

    #[test]
    fn test_by_reference_builder_gets_proxy() {
        let mut unit = UnitFacts::default();
        unit.by_reference_builders.insert("comp".into());
        let call = BuilderInvocation::function("comp").arg("{ vis: this.vis, size: 2 * this.w }");
        let out = lower_builder_call(&call, &Scope::for_members(["vis", "w"]), &unit).unwrap();
        assert_eq!(
            print_stmts(&[out]),
            "comp.bind(this)(makeBuilderParameterProxy(\"comp\", { vis: () => (this[\"__vis\"] ? this[\"__vis\"] : this[\"vis\"]), size: () => (2 * this.w) }));\n"
        );

        let plain = BuilderInvocation::function("comp").arg("this.model");
        let out = lower_builder_call(&plain, &Scope::for_members(["model"]), &unit).unwrap();
        assert_eq!(print_stmts(&[out]), "comp.bind(this)(this.model);\n");
    }

    #[test]
    fn test_takes_parameter_by_reference() {
        assert!(takes_parameter_by_reference(&[SourceParam::new("$$")]));
        assert!(!takes_parameter_by_reference(&[SourceParam::new("model")]));
        assert!(!takes_parameter_by_reference(&[
            SourceParam::new("$$"),
            SourceParam::new("extra")
        ]));
    }

    #[test]
    fn test_context_stack_wrapping() {
        let out = within_context(vec![Stmt::Raw("Column.create();".into())]);
        assert_eq!(
            print_stmts(&out),
            "PUV2ViewBase.contextStack && PUV2ViewBase.contextStack.push(this);\n\
             try {\n    Column.create();\n}\n\
             finally {\n    PUV2ViewBase.contextStack && PUV2ViewBase.contextStack.pop();\n}\n"
        );
    }
}
