//! Legacy emission: statements re-run eagerly on every render, children identified by
//! compile-time id strings.

use ets_ast::IterationKind;

use super::emitter::{
    common_create, pop, BuiltinParts, ComponentParts, ConditionalParts, Emitter, GeneratorParts,
    IterationParts,
};
use crate::js::{if_chain, Expr, Param, Stmt};
use crate::options::UpdateMode;

pub(crate) struct LegacyEmitter;

impl Emitter for LegacyEmitter {
    fn mode(&self) -> UpdateMode {
        UpdateMode::Legacy
    }

    fn requires_key(&self) -> bool {
        false
    }

    fn builtin(&self, parts: BuiltinParts) -> Vec<Stmt> {
        let mut stmts = parts.create;
        stmts.extend(parts.children);
        if parts.closes {
            stmts.push(pop(&parts.name));
        }
        stmts
    }

    fn component(&self, parts: ComponentParts) -> Vec<Stmt> {
        let has_common = !parts.common.is_empty();
        let mut stmts = if has_common {
            common_create(parts.common)
        } else {
            Vec::new()
        };

        let construct = |id: Expr, args: Vec<crate::js::Property>| {
            let mut ctor_args = vec![id, Expr::This, Expr::object(args)];
            if let Some(storage) = parts.storage.clone() {
                ctor_args.push(storage);
            }
            Expr::new_(parts.name.clone(), ctor_args)
        };

        if parts.dynamic {
            let child = construct(Expr::id("generateId").call(Vec::new()), parts.args);
            stmts.push(view_create(child));
        } else {
            let earlier = format!("earlierCreatedChild_{}", parts.id.0);
            let find = Expr::cond(
                Expr::binary(Expr::This, "&&", Expr::this_prop("findChildById")).paren(),
                Expr::This.method("findChildById", vec![parts.id.literal()]),
                Expr::undefined(),
            );
            stmts.push(Stmt::Let(earlier.as_str().into(), find));
            stmts.push(Stmt::if_else(
                Expr::binary(Expr::id(earlier.as_str()), "==", Expr::undefined()),
                vec![view_create(construct(parts.id.literal(), parts.args))],
                vec![
                    Expr::id(earlier.as_str())
                        .method("updateWithValueParams", vec![Expr::object(parts.update_args)])
                        .stmt(),
                    Stmt::if_(
                        Expr::unary(
                            "!",
                            Expr::id(earlier.as_str()).method("needsUpdate", Vec::new()),
                        ),
                        vec![Expr::id(earlier.as_str()).method("markStatic", Vec::new()).stmt()],
                    ),
                    view_create(Expr::id(earlier.as_str())),
                ],
            ));
        }

        if has_common {
            stmts.push(pop("__Common__"));
        }
        stmts
    }

    fn conditional(&self, parts: ConditionalParts) -> Vec<Stmt> {
        let mut arms = Vec::new();
        let mut otherwise = None;
        for (tag, (condition, body)) in parts.branches.into_iter().enumerate() {
            let mut branch = vec![Expr::id("If")
                .method("branchId", vec![Expr::raw(tag.to_string())])
                .stmt()];
            branch.extend(body);
            match condition {
                Some(condition) => arms.push((condition, branch)),
                None => otherwise = Some(branch),
            }
        }

        let mut stmts = vec![Expr::id("If").method("create", Vec::new()).stmt()];
        stmts.extend(if_chain(arms, otherwise));
        stmts.push(pop("If"));
        stmts
    }

    fn iteration(&self, parts: IterationParts) -> Vec<Stmt> {
        let name = parts.kind.as_str();
        let source = match parts.kind {
            IterationKind::ForEach => Expr::id("ObservedObject").method("GetRawObject", vec![parts.source]),
            IterationKind::LazyForEach => parts.source,
        };
        let generator = match parts.generator {
            Some(GeneratorParts { item, index, body }) => {
                let params = item
                    .into_iter()
                    .chain(index)
                    .map(Param::new)
                    .collect();
                Expr::arrow(params, body)
            }
            None => Expr::arrow_inline(Vec::new(), Vec::new()),
        };

        let mut args = vec![parts.id.literal(), Expr::This, source, generator];
        args.extend(parts.key);
        vec![
            Expr::id(name).method("create", args).stmt(),
            pop(name),
        ]
    }
}

fn view_create(child: Expr) -> Stmt {
    Expr::id("View").method("create", vec![child]).stmt()
}
