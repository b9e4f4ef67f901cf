//! Partial-update emission: every node's creation runs in a closure registered against
//! a runtime element id, so only closures whose reactive reads changed re-run.

use ets_ast::IterationKind;

use super::emitter::{
    common_create, pop, BuiltinParts, ComponentParts, ConditionalParts, Emitter, GeneratorParts,
    IterationParts,
};
use crate::js::{if_chain, params, Expr, Param, Property, Stmt};
use crate::options::UpdateMode;

pub(crate) struct PartialEmitter;

/// `<receiver>.observeComponentCreation2((elmtId, isInitialRender) => { body }, tag);`
fn observe(receiver: &Expr, body: Vec<Stmt>, tag: Expr) -> Stmt {
    receiver
        .clone()
        .method(
            "observeComponentCreation2",
            vec![Expr::arrow(params(["elmtId", "isInitialRender"]), body), tag],
        )
        .stmt()
}

impl Emitter for PartialEmitter {
    fn mode(&self) -> UpdateMode {
        UpdateMode::Partial
    }

    fn requires_key(&self) -> bool {
        true
    }

    fn builtin(&self, parts: BuiltinParts) -> Vec<Stmt> {
        let mut stmts = vec![observe(&parts.receiver, parts.create, Expr::id(parts.name.clone()))];
        stmts.extend(parts.children);
        if parts.closes {
            stmts.push(pop(&parts.name));
        }
        stmts
    }

    fn component(&self, parts: ComponentParts) -> Vec<Stmt> {
        let receiver = parts.receiver;
        let mut stmts = Vec::new();
        let has_common = !parts.common.is_empty();
        if has_common {
            stmts.push(observe(
                &receiver,
                common_create(parts.common),
                Expr::id("__Common__"),
            ));
        }

        let mut ctor_args = vec![
            receiver.clone(),
            Expr::object(parts.args.clone()),
            parts.storage.unwrap_or_else(Expr::undefined),
            Expr::id("elmtId"),
        ];
        if let Some(extra) = parts.extra_info {
            ctor_args.push(Expr::arrow_inline(Vec::new(), Vec::new()));
            ctor_args.push(extra);
        }
        let base = if parts.is_v2 { "ViewV2" } else { "ViewPU" };

        let initial = vec![
            Stmt::Let("componentCall".into(), Expr::new_(parts.name.clone(), ctor_args)),
            Expr::id(base)
                .method("create", vec![Expr::id("componentCall")])
                .stmt(),
            Stmt::Let(
                "paramsLambda".into(),
                Expr::arrow(Vec::new(), vec![Stmt::ret(Some(Expr::object(parts.args)))]),
            ),
            Expr::assign(
                Expr::id("componentCall").prop("paramsGenerator_"),
                Expr::id("paramsLambda"),
            )
            .stmt(),
        ];
        let update = vec![receiver
            .clone()
            .method(
                "updateStateVarsOfChildByElmtId",
                vec![Expr::id("elmtId"), Expr::object(parts.update_args)],
            )
            .stmt()];

        let body = vec![Stmt::if_else(Expr::id("isInitialRender"), initial, update)];
        let tag = Expr::object(vec![Property::new("name", Expr::str(parts.name.as_str()))]);
        stmts.push(Stmt::Block(vec![observe(&receiver, body, tag)]));

        if has_common {
            stmts.push(pop("__Common__"));
        }
        stmts
    }

    fn conditional(&self, parts: ConditionalParts) -> Vec<Stmt> {
        let receiver = parts.receiver;
        let branch = |tag: usize, body: Vec<Stmt>| {
            vec![receiver
                .clone()
                .method(
                    "ifElseBranchUpdateFunction",
                    vec![Expr::raw(tag.to_string()), Expr::arrow(Vec::new(), body)],
                )
                .stmt()]
        };

        let mut arms = Vec::new();
        let mut otherwise = None;
        let count = parts.branches.len();
        for (tag, (condition, body)) in parts.branches.into_iter().enumerate() {
            match condition {
                Some(condition) => arms.push((condition, branch(tag, body))),
                None => otherwise = Some(branch(tag, body)),
            }
        }
        // The runtime needs a branch to diff against when nothing matched.
        let otherwise = otherwise.unwrap_or_else(|| branch(count, Vec::new()));

        let mut body = vec![Expr::id("If").method("create", Vec::new()).stmt()];
        body.extend(if_chain(arms, Some(otherwise)));
        vec![observe(&receiver, body, Expr::id("If")), pop("If")]
    }

    fn iteration(&self, parts: IterationParts) -> Vec<Stmt> {
        let has_index = parts
            .generator
            .as_ref()
            .is_some_and(|generator| generator.index.is_some());
        let generator = item_generator(parts.generator);

        match parts.kind {
            IterationKind::ForEach => {
                let mut update_args = vec![
                    Expr::id("elmtId"),
                    parts.source,
                    Expr::id("forEachItemGenFunction"),
                ];
                if let Some(key) = parts.key {
                    update_args.push(key);
                    update_args.push(Expr::id(bool_literal(has_index)));
                    update_args.push(Expr::id(bool_literal(parts.key_has_index)));
                }
                let body = vec![
                    Expr::id("ForEach").method("create", Vec::new()).stmt(),
                    Stmt::Const("forEachItemGenFunction".into(), generator),
                    parts
                        .receiver
                        .clone()
                        .method("forEachUpdateFunction", update_args)
                        .stmt(),
                ];
                vec![
                    observe(&parts.receiver, body, Expr::id("ForEach")),
                    pop("ForEach"),
                ]
            }
            IterationKind::LazyForEach => {
                let mut block = vec![Stmt::Const("__lazyForEachItemGenFunction".into(), generator)];
                let mut create_args = vec![
                    parts.id.literal(),
                    parts.receiver,
                    parts.source,
                    Expr::id("__lazyForEachItemGenFunction"),
                ];
                if let Some(key) = parts.key {
                    block.push(Stmt::Const("__lazyForEachItemIdFunc".into(), key));
                    create_args.push(Expr::id("__lazyForEachItemIdFunc"));
                }
                block.push(Expr::id("LazyForEach").method("create", create_args).stmt());
                block.push(pop("LazyForEach"));
                vec![Stmt::Block(block)]
            }
        }
    }
}

/// `(_item, index) => { const item = _item; ... }`
fn item_generator(generator: Option<GeneratorParts>) -> Expr {
    let Some(GeneratorParts { item, index, body }) = generator else {
        return Expr::arrow(params(["_item"]), Vec::new());
    };
    let mut params = vec![Param::new("_item")];
    params.extend(index.map(Param::new));
    let mut stmts = Vec::with_capacity(body.len() + 1);
    if let Some(item) = item {
        stmts.push(Stmt::Const(item, Expr::id("_item")));
    }
    stmts.extend(body);
    Expr::arrow(params, stmts)
}

fn bool_literal(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
