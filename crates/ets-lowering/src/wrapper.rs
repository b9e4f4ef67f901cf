//! Wrapper synthesis: what each classified member contributes to the emitted class.

use ets_ast::Expr as SourceExpr;

use crate::classify::{Classified, MemberRole, WrapperKind};
use crate::js::{Expr, Method, Param, Stmt};
use crate::options::UpdateMode;

/// Everything one member contributes to a V1 component class.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Synthesized {
    /// Constructor statements: field or wrapper initialisation, provide registration.
    pub init: Vec<Stmt>,
    /// `this.declareWatch(...)`, run after all members are initialised.
    pub watch: Option<Stmt>,
    /// Copy from the caller's params on construction.
    pub initial_params: Option<Stmt>,
    /// Refresh from the caller's params on re-render (partial mode).
    pub update_params: Option<Stmt>,
    /// `purgeVariableDependenciesOnElmtId` body entry (partial mode).
    pub purge: Option<Stmt>,
    /// `aboutToBeDeleted` body entry.
    pub cleanup: Option<Stmt>,
    /// Getter/setter pair over the backing field.
    pub accessors: Vec<Method>,
}

/// Synthesizes the V1 class contributions of a member in the given mode.
pub fn synthesize(member: &Classified, mode: UpdateMode) -> Synthesized {
    let mut out = Synthesized::default();
    let name = member.name.as_str();
    let field = Expr::this_prop(member.backing_field());
    let init = || initial_value(member.initializer.as_ref());
    let params_value = || Expr::id("params").prop(name);

    let wrapper = match (&member.role, mode) {
        (MemberRole::State | MemberRole::Provide { .. }, UpdateMode::Partial) => Some(
            Expr::new_(
                pick(member.wrapper, "ObservedPropertySimplePU", "ObservedPropertyObjectPU"),
                vec![init(), Expr::This, Expr::str(name)],
            ),
        ),
        (MemberRole::State | MemberRole::Provide { .. }, UpdateMode::Legacy) => Some(Expr::new_(
            pick(member.wrapper, "ObservedPropertySimple", "ObservedPropertyObject"),
            vec![init(), Expr::This, Expr::str(name)],
        )),
        (MemberRole::Link, UpdateMode::Partial) => Some(Expr::new_(
            pick(
                member.wrapper,
                "SynchedPropertySimpleTwoWayPU",
                "SynchedPropertyObjectTwoWayPU",
            ),
            vec![params_value(), Expr::This, Expr::str(name)],
        )),
        (MemberRole::Link, UpdateMode::Legacy) => Some(Expr::new_(
            pick(member.wrapper, "SynchedPropertySimpleTwoWay", "SynchedPropertyObjectTwoWay"),
            vec![params_value(), Expr::This, Expr::str(name)],
        )),
        (MemberRole::Prop, UpdateMode::Partial) => Some(Expr::new_(
            pick(
                member.wrapper,
                "SynchedPropertySimpleOneWayPU",
                "SynchedPropertyObjectOneWayPU",
            ),
            vec![params_value(), Expr::This, Expr::str(name)],
        )),
        (MemberRole::Prop, UpdateMode::Legacy) => Some(Expr::new_(
            "SynchedPropertySimpleOneWay",
            vec![params_value(), Expr::This, Expr::str(name)],
        )),
        (MemberRole::ObjectLink, UpdateMode::Partial) => Some(Expr::new_(
            "SynchedPropertyNesedObjectPU",
            vec![params_value(), Expr::This, Expr::str(name)],
        )),
        (MemberRole::ObjectLink, UpdateMode::Legacy) => Some(Expr::new_(
            "SynchedPropertyNesedObject",
            vec![params_value(), Expr::This, Expr::str(name)],
        )),
        (MemberRole::StorageLink { key }, UpdateMode::Partial) => {
            Some(Expr::This.method("createStorageLink", storage_args(key, init(), name)))
        }
        (MemberRole::StorageProp { key }, UpdateMode::Partial) => {
            Some(Expr::This.method("createStorageProp", storage_args(key, init(), name)))
        }
        (MemberRole::LocalStorageLink { key }, UpdateMode::Partial) => {
            Some(Expr::This.method("createLocalStorageLink", storage_args(key, init(), name)))
        }
        (MemberRole::LocalStorageProp { key }, UpdateMode::Partial) => {
            Some(Expr::This.method("createLocalStorageProp", storage_args(key, init(), name)))
        }
        (MemberRole::StorageLink { key }, UpdateMode::Legacy) => Some(
            app_storage().method("setAndLink", vec![literal_or_raw(key), init(), Expr::This]),
        ),
        (MemberRole::StorageProp { key }, UpdateMode::Legacy) => Some(
            app_storage().method("setAndProp", vec![literal_or_raw(key), init(), Expr::This]),
        ),
        (MemberRole::LocalStorageLink { key }, UpdateMode::Legacy) => Some(
            Expr::this_prop("localStorage_")
                .method("setAndLink", vec![literal_or_raw(key), init(), Expr::This]),
        ),
        (MemberRole::LocalStorageProp { key }, UpdateMode::Legacy) => Some(
            Expr::this_prop("localStorage_")
                .method("setAndProp", vec![literal_or_raw(key), init(), Expr::This]),
        ),
        (MemberRole::Consume { .. }, _) => Some(Expr::This.method(
            "initializeConsume",
            vec![Expr::str(member.alias().unwrap_or_default()), Expr::str(name)],
        )),
        _ => None,
    };

    let Some(wrapper) = wrapper else {
        if !member.is_method_like() {
            // Plain fields, builder params and V2-only roles used in a V1 struct.
            out.init.push(Expr::assign(Expr::this_prop(name), init()).stmt());
            out.initial_params = Some(copy_if_provided(name));
        }
        return out;
    };

    out.init.push(Expr::assign(field.clone(), wrapper).stmt());

    if let MemberRole::Provide { .. } = member.role {
        let alias = member.alias().unwrap_or_else(|| member.name.clone());
        let mut register = |key: &str| {
            let mut args = vec![Expr::str(key), field.clone()];
            if mode == UpdateMode::Partial {
                args.push(Expr::id("false"));
            }
            out.init.push(Expr::This.method("addProvidedVar", args).stmt());
        };
        register(alias.as_str());
        if alias != member.name {
            register(member.name.as_str());
        }
    }

    match (&member.role, mode) {
        (MemberRole::State | MemberRole::Provide { .. }, _) => {
            out.initial_params = Some(copy_if_provided(name));
        }
        (MemberRole::Prop, UpdateMode::Partial) => {
            if let Some(default) = &member.initializer {
                out.initial_params = Some(Stmt::if_(
                    Expr::binary(params_value(), "===", Expr::undefined()),
                    vec![field
                        .clone()
                        .method("set", vec![Expr::raw(default.as_str())])
                        .stmt()],
                ));
            }
            out.update_params = Some(field.clone().method("reset", vec![params_value()]).stmt());
        }
        (MemberRole::Prop, UpdateMode::Legacy) => {
            out.initial_params = Some(Expr::assign(Expr::this_prop(name), params_value()).stmt());
        }
        (MemberRole::ObjectLink, UpdateMode::Partial) => {
            out.update_params = Some(field.clone().method("set", vec![params_value()]).stmt());
        }
        (MemberRole::ObjectLink, UpdateMode::Legacy) => {
            out.initial_params = Some(field.clone().method("set", vec![params_value()]).stmt());
        }
        _ => {}
    }

    if let Some(callback) = &member.watch {
        out.watch = Some(
            Expr::This
                .method(
                    "declareWatch",
                    vec![Expr::str(name), Expr::this_prop(callback.clone())],
                )
                .stmt(),
        );
    }

    if mode == UpdateMode::Partial {
        out.purge = Some(
            field
                .clone()
                .method("purgeDependencyOnElmtId", vec![Expr::id("rmElmtId")])
                .stmt(),
        );
    }
    out.cleanup = Some(field.clone().method("aboutToBeDeleted", Vec::new()).stmt());

    out.accessors.push(Method::getter(
        name,
        vec![Stmt::ret(Some(field.clone().method("get", Vec::new())))],
    ));
    out.accessors.push(Method::setter(
        name,
        Param::new("newValue"),
        vec![field.method("set", vec![Expr::id("newValue")]).stmt()],
    ));

    out
}

/// What one member contributes to a `@ComponentV2` class.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SynthesizedV2 {
    /// Constructor statement.
    pub init: Option<Stmt>,
    /// `updateStateVars` entry.
    pub update_params: Option<Stmt>,
    /// Decorator expressions passed to `__decorate`, e.g. `Param` and `Once`.
    pub decorators: Vec<Expr>,
}

/// Synthesizes the V2 class contributions of a member.
pub fn synthesize_v2(member: &Classified) -> SynthesizedV2 {
    let mut out = SynthesizedV2::default();
    let name = member.name.as_str();
    let init = || initial_value(member.initializer.as_ref());
    let in_params = || Expr::binary(Expr::str(name), "in", Expr::id("params"));
    let params_value = || Expr::id("params").prop(name);
    let assign = |value: Expr| Some(Expr::assign(Expr::this_prop(name), value).stmt());

    match &member.role {
        MemberRole::Local => {
            out.init = assign(init());
            out.decorators.push(Expr::id("Local"));
        }
        MemberRole::Param { once } => {
            let guard = Expr::binary(Expr::id("params"), "&&", in_params()).paren();
            out.init = Some(
                Expr::This
                    .method(
                        "initParam",
                        vec![Expr::str(name), Expr::cond(guard, params_value(), init())],
                    )
                    .stmt(),
            );
            if !once {
                out.update_params = Some(Stmt::if_(
                    in_params(),
                    vec![Expr::This
                        .method("updateParam", vec![Expr::str(name), params_value()])
                        .stmt()],
                ));
            }
            out.decorators.push(Expr::id("Param"));
            if *once {
                out.decorators.push(Expr::id("Once"));
            }
        }
        MemberRole::Event => {
            let default = match &member.initializer {
                Some(init) => Expr::raw(init.as_str()),
                None => Expr::arrow_inline(Vec::new(), Vec::new()),
            };
            out.init = assign(Expr::cond(in_params(), params_value(), default));
            out.decorators.push(Expr::id("Event"));
        }
        MemberRole::Provider { .. } | MemberRole::Consumer { .. } => {
            out.init = assign(init());
            let decorator = if matches!(member.role, MemberRole::Provider { .. }) {
                "Provider"
            } else {
                "Consumer"
            };
            let args = match &member.role {
                MemberRole::Provider { alias } | MemberRole::Consumer { alias }
                    if !alias.is_empty() =>
                {
                    vec![Expr::str(alias.as_str())]
                }
                _ => Vec::new(),
            };
            out.decorators.push(Expr::id(decorator).call(args));
        }
        MemberRole::BuilderParam => {
            out.init = assign(Expr::cond(in_params(), params_value(), init()));
        }
        MemberRole::Computed => out.decorators.push(Expr::id("Computed")),
        MemberRole::Monitor { paths } => out.decorators.push(
            Expr::id("Monitor").call(paths.iter().map(literal_or_raw).collect()),
        ),
        _ if member.is_method_like() => {}
        _ => out.init = assign(init()),
    }
    out
}

fn pick(kind: WrapperKind, simple: &'static str, object: &'static str) -> &'static str {
    match kind {
        WrapperKind::Simple => simple,
        WrapperKind::Object => object,
    }
}

fn initial_value(initializer: Option<&SourceExpr>) -> Expr {
    initializer.map_or_else(Expr::undefined, |init| Expr::raw(init.as_str()))
}

fn storage_args(key: &SourceExpr, default: Expr, name: &str) -> Vec<Expr> {
    vec![literal_or_raw(key), default, Expr::str(name)]
}

fn app_storage() -> Expr {
    Expr::id("AppStorage").method("GetOrCreate", Vec::new())
}

/// `if (params.x !== undefined) { this.x = params.x; }`
fn copy_if_provided(name: &str) -> Stmt {
    let value = Expr::id("params").prop(name);
    Stmt::if_(
        Expr::binary(value.clone(), "!==", Expr::undefined()),
        vec![Expr::assign(Expr::this_prop(name), value).stmt()],
    )
}

/// Re-quotes plain string literals with double quotes; anything else stays verbatim.
pub(crate) fn literal_or_raw(expr: &SourceExpr) -> Expr {
    match expr.string_literal() {
        Some(inner) if !inner.contains(['\\', '"']) && !expr.as_str().trim().starts_with('`') => {
            Expr::str(inner)
        }
        _ => Expr::raw(expr.as_str().trim()),
    }
}
