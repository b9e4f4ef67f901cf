//! Assembly of the emitted component class.
//!
//! Three class shapes exist: V1 components in partial mode (`extends ViewPU`), V1
//! components in legacy mode (`extends View`) and `@ComponentV2` components
//! (`extends ViewV2`, partial only). Member contributions come from
//! [`crate::wrapper`]; the render body comes from the composition rewriter.

use std::rc::Rc;

use ets_ast::{ComponentDecl, ComponentKind, MemberDecl, MemberKind, MethodBody, TypeRef};
use rustc_hash::FxHashMap;

use crate::builder::{builder_method, plain_params, takes_parameter_by_reference, within_context};
use crate::classify::{Classified, MemberRole};
use crate::compose::{ComponentScope, Rewriter, Scope};
use crate::error::LowerError;
use crate::js::{Class, Expr, Item, Method, Param, Stmt};
use crate::options::UpdateMode;
use crate::wrapper::{synthesize, synthesize_v2, Synthesized};

/// Lowers one component into its class followed by any top-level registrations.
pub(crate) fn lower_component(
    decl: &ComponentDecl,
    members: Vec<Classified>,
    is_entry: bool,
    rewriter: &mut Rewriter<'_>,
) -> Result<Vec<Item>, LowerError> {
    let kind = decl.kind();
    tracing::debug!(component = %decl.name, mode = %rewriter.mode(), ?kind, "lowering component");
    for member in &members {
        tracing::trace!(component = %decl.name, member = %member.name, role = member.role.name());
    }

    let scope = Scope::component(Rc::new(component_scope(decl, &members)));
    let pairs: Vec<(&MemberDecl, &Classified)> = decl.members.iter().zip(&members).collect();

    let body = match decl.build() {
        Some(nodes) => rewriter.lower_body(nodes, &scope)?,
        None => Vec::new(),
    };
    let methods = methods(&pairs, &scope, rewriter)?;

    let mut items = match (kind, rewriter.mode()) {
        (ComponentKind::ComponentV2, _) => v2_class(decl, &pairs, methods, body, is_entry),
        (_, UpdateMode::Partial) => vec![Item::Class(partial_class(decl, &pairs, methods, body, is_entry))],
        (_, UpdateMode::Legacy) => vec![Item::Class(legacy_class(decl, &pairs, methods, body))],
    };
    items.extend(static_properties(decl));
    Ok(items)
}

fn component_scope(decl: &ComponentDecl, members: &[Classified]) -> ComponentScope {
    let mut styles = FxHashMap::default();
    for (decl, member) in decl.members.iter().zip(members) {
        if let (
            MemberRole::StyleMethod,
            MemberKind::Method {
                body: MethodBody::Attributes(attrs),
                ..
            },
        ) = (&member.role, &decl.kind)
        {
            styles.insert(member.name.clone(), attrs.clone());
        }
    }
    let by_reference_builders = decl
        .members
        .iter()
        .zip(members)
        .filter_map(|(decl, member)| match (&member.role, &decl.kind) {
            (MemberRole::BuilderMethod { .. }, MemberKind::Method { params, .. })
                if takes_parameter_by_reference(params) =>
            {
                Some(member.name.clone())
            }
            _ => None,
        })
        .collect();
    ComponentScope {
        name: decl.name.clone(),
        by_reference_builders,
        members: members
            .iter()
            .filter(|member| !member.is_method_like())
            .map(|member| (member.name.clone(), member.clone()))
            .collect(),
        styles,
    }
}

/// Instance properties, in declaration order.
fn properties<'a>(
    pairs: &'a [(&'a MemberDecl, &'a Classified)],
) -> impl Iterator<Item = &'a Classified> + 'a {
    pairs
        .iter()
        .filter(|(decl, _)| decl.is_property() && !decl.is_static)
        .map(|(_, member)| *member)
}

/// Methods and getters carried over into the class; `build` and style methods are not.
fn methods(
    pairs: &[(&MemberDecl, &Classified)],
    scope: &Scope,
    rewriter: &mut Rewriter<'_>,
) -> Result<Vec<Method>, LowerError> {
    let mut out = Vec::new();
    for (decl, member) in pairs {
        let method = match (&decl.kind, &member.role) {
            (MemberKind::Property { .. }, _) => continue,
            (MemberKind::Method { .. }, MemberRole::Plain) if decl.name == "build" => continue,
            (MemberKind::Method { .. }, MemberRole::StyleMethod | MemberRole::ExtendMethod) => {
                continue
            }
            (
                MemberKind::Method {
                    params,
                    body: MethodBody::Composition(nodes),
                },
                role,
            ) => {
                let local = matches!(role, MemberRole::BuilderMethod { local: true });
                builder_method(&decl.name, params, nodes, local, scope, rewriter)?
            }
            (
                MemberKind::Method {
                    params,
                    body: MethodBody::Statements(body),
                },
                _,
            ) => Method::new(decl.name.clone(), plain_params(params), raw_body(body)),
            (MemberKind::Method { .. }, _) => continue,
            (MemberKind::Getter { body }, _) => Method::getter(decl.name.clone(), raw_body(body)),
        };
        out.push(if decl.is_static {
            method.into_static()
        } else {
            method
        });
    }
    Ok(out)
}

fn raw_body(body: &[ets_ast::Verbatim]) -> Vec<Stmt> {
    body.iter().map(|stmt| Stmt::Raw(stmt.text.clone())).collect()
}

fn partial_class(
    decl: &ComponentDecl,
    pairs: &[(&MemberDecl, &Classified)],
    methods: Vec<Method>,
    body: Vec<Stmt>,
    is_entry: bool,
) -> Class {
    let parts: Vec<Synthesized> = properties(pairs)
        .map(|member| synthesize(member, UpdateMode::Partial))
        .collect();

    let mut ctor = vec![
        Expr::id("super")
            .call(vec![
                Expr::id("parent"),
                Expr::id("__localStorage"),
                Expr::id("elmtId"),
                Expr::id("extraInfo"),
            ])
            .stmt(),
        Stmt::if_(
            Expr::binary(
                Expr::unary("typeof", Expr::id("paramsLambda")),
                "===",
                Expr::str("function"),
            ),
            vec![Expr::assign(Expr::this_prop("paramsGenerator_"), Expr::id("paramsLambda")).stmt()],
        ),
    ];
    ctor.extend(parts.iter().flat_map(|part| part.init.iter().cloned()));
    ctor.push(
        Expr::This
            .method("setInitiallyProvidedValue", vec![Expr::id("params")])
            .stmt(),
    );
    ctor.extend(parts.iter().filter_map(|part| part.watch.clone()));
    ctor.push(Expr::This.method("finalizeConstruction", Vec::new()).stmt());

    let mut cleanup: Vec<Stmt> = parts.iter().filter_map(|part| part.cleanup.clone()).collect();
    cleanup.push(subscriber_delete("id__"));
    cleanup.push(Expr::This.method("aboutToBeDeletedInternal", Vec::new()).stmt());

    let mut members = vec![
        Method::constructor(
            vec![
                Param::new("parent"),
                Param::new("params"),
                Param::new("__localStorage"),
                Param::with_default("elmtId", Expr::raw("-1")),
                Param::with_default("paramsLambda", Expr::undefined()),
                Param::new("extraInfo"),
            ],
            ctor,
        ),
        Method::new(
            "setInitiallyProvidedValue",
            vec![Param::new("params")],
            parts.iter().filter_map(|part| part.initial_params.clone()).collect(),
        ),
        Method::new(
            "updateStateVars",
            vec![Param::new("params")],
            parts.iter().filter_map(|part| part.update_params.clone()).collect(),
        ),
        Method::new(
            "purgeVariableDependenciesOnElmtId",
            vec![Param::new("rmElmtId")],
            parts.iter().filter_map(|part| part.purge.clone()).collect(),
        ),
        Method::new("aboutToBeDeleted", Vec::new(), cleanup),
    ];
    members.extend(parts.into_iter().flat_map(|part| part.accessors));
    members.extend(methods);
    members.extend(dialog_controller(decl, pairs));
    members.extend(render_methods(body));
    if is_entry {
        members.push(entry_name(decl));
    }

    Class {
        name: decl.name.clone(),
        extends: Some("ViewPU".into()),
        members,
    }
}

fn legacy_class(
    decl: &ComponentDecl,
    pairs: &[(&MemberDecl, &Classified)],
    methods: Vec<Method>,
    body: Vec<Stmt>,
) -> Class {
    let parts: Vec<Synthesized> = properties(pairs)
        .map(|member| synthesize(member, UpdateMode::Legacy))
        .collect();

    let mut ctor = vec![Expr::id("super")
        .call(vec![
            Expr::id("compilerAssignedUniqueChildId"),
            Expr::id("parent"),
            Expr::id("localStorage"),
        ])
        .stmt()];
    ctor.extend(parts.iter().flat_map(|part| part.init.iter().cloned()));
    ctor.push(
        Expr::This
            .method("updateWithValueParams", vec![Expr::id("params")])
            .stmt(),
    );
    ctor.extend(parts.iter().filter_map(|part| part.watch.clone()));

    let mut cleanup: Vec<Stmt> = parts.iter().filter_map(|part| part.cleanup.clone()).collect();
    cleanup.push(subscriber_delete("id"));

    let mut members = vec![
        Method::constructor(
            vec![
                Param::new("compilerAssignedUniqueChildId"),
                Param::new("parent"),
                Param::new("params"),
                Param::new("localStorage"),
            ],
            ctor,
        ),
        Method::new(
            "updateWithValueParams",
            vec![Param::new("params")],
            parts.iter().filter_map(|part| part.initial_params.clone()).collect(),
        ),
        Method::new("aboutToBeDeleted", Vec::new(), cleanup),
    ];
    members.extend(parts.into_iter().flat_map(|part| part.accessors));
    members.extend(methods);
    members.extend(dialog_controller(decl, pairs));
    members.push(Method::new("render", Vec::new(), body));

    Class {
        name: decl.name.clone(),
        extends: Some("View".into()),
        members,
    }
}

fn v2_class(
    decl: &ComponentDecl,
    pairs: &[(&MemberDecl, &Classified)],
    methods: Vec<Method>,
    body: Vec<Stmt>,
    is_entry: bool,
) -> Vec<Item> {
    let mut ctor = vec![Expr::id("super")
        .call(vec![Expr::id("parent"), Expr::id("elmtId"), Expr::id("extraInfo")])
        .stmt()];
    let mut update = vec![Stmt::if_(
        Expr::binary(Expr::id("params"), "===", Expr::undefined()),
        vec![Stmt::ret(None)],
    )];
    let mut registrations = Vec::new();

    for (member_decl, member) in pairs {
        if member_decl.is_static {
            continue;
        }
        let part = synthesize_v2(member);
        if member_decl.is_property() {
            ctor.extend(part.init);
            update.extend(part.update_params);
        }
        if !part.decorators.is_empty() {
            let descriptor = if member_decl.is_property() {
                Expr::unary("void", Expr::raw("0"))
            } else {
                Expr::id("null")
            };
            registrations.push(Item::Stmt(
                Expr::id("__decorate")
                    .call(vec![
                        Expr::Array(part.decorators),
                        Expr::id(decl.name.clone()).prop("prototype"),
                        Expr::str(member.name.as_str()),
                        descriptor,
                    ])
                    .stmt(),
            ));
        }
    }
    ctor.push(Expr::This.method("finalizeConstruction", Vec::new()).stmt());

    let mut members = vec![
        Method::constructor(
            vec![
                Param::new("parent"),
                Param::new("params"),
                Param::new("__localStorage"),
                Param::with_default("elmtId", Expr::raw("-1")),
                Param::new("paramsLambda"),
                Param::new("extraInfo"),
            ],
            ctor,
        ),
        Method::new("updateStateVars", vec![Param::new("params")], update),
    ];
    members.extend(methods);
    members.extend(render_methods(body));
    if is_entry {
        members.push(entry_name(decl));
    }

    let mut items = vec![Item::Class(Class {
        name: decl.name.clone(),
        extends: Some("ViewV2".into()),
        members,
    })];
    items.extend(registrations);
    items
}

/// `initialRender` and `rerender`, both run with the instance on the context stack.
fn render_methods(body: Vec<Stmt>) -> [Method; 2] {
    [
        Method::new("initialRender", Vec::new(), within_context(body)),
        Method::new(
            "rerender",
            Vec::new(),
            within_context(vec![Expr::This
                .method("updateDirtyElements", Vec::new())
                .stmt()]),
        ),
    ]
}

fn entry_name(decl: &ComponentDecl) -> Method {
    Method::new(
        "getEntryName",
        Vec::new(),
        vec![Stmt::ret(Some(Expr::str(decl.name.as_str())))],
    )
    .into_static()
}

/// `setController(ctr) { this.controller = ctr; }` for a `@CustomDialog` holding a
/// `CustomDialogController` member.
fn dialog_controller(
    decl: &ComponentDecl,
    pairs: &[(&MemberDecl, &Classified)],
) -> Option<Method> {
    if decl.kind() != ComponentKind::CustomDialog {
        return None;
    }
    let controller = pairs.iter().find(|(member, _)| {
        matches!(member.ty(), Some(TypeRef::Named(name)) if name == "CustomDialogController")
    })?;
    Some(Method::new(
        "setController",
        vec![Param::new("ctr")],
        vec![Expr::assign(Expr::this_prop(controller.0.name.clone()), Expr::id("ctr")).stmt()],
    ))
}

fn subscriber_delete(id_method: &str) -> Stmt {
    Expr::id("SubscriberManager")
        .method("Get", Vec::new())
        .method("delete", vec![Expr::This.method(id_method, Vec::new())])
        .stmt()
}

/// `static x = 1` becomes `X.x = 1;` after the class.
fn static_properties(decl: &ComponentDecl) -> impl Iterator<Item = Item> + '_ {
    decl.members
        .iter()
        .filter(|member| member.is_static && member.is_property())
        .map(|member| {
            let value = member
                .initializer()
                .map_or_else(Expr::undefined, |init| Expr::raw(init.as_str().trim()));
            Item::Stmt(
                Expr::assign(Expr::id(decl.name.clone()).prop(member.name.clone()), value).stmt(),
            )
        })
}
