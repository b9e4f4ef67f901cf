//! Start-up code for the `@Entry` component.
//!
//! The entry decorator takes either nothing, an object literal whose fields are known at
//! compile time (`{ routeName: "home", storage: s }`), or an arbitrary expression. The
//! start-up form is chosen by walking [`LADDER`] in order: statically when the fields are
//! known, otherwise as an `if / else if` chain evaluated at runtime.

use ets_ast::{Decorator, Expr as SourceExpr};
use swc_ecma_ast::{Expr as SwcExpr, Prop, PropName, PropOrSpread};

use crate::js::{if_chain, Expr, Property, Stmt};
use crate::options::{RouteMode, UpdateMode};
use crate::snippet::{bool_value, string_value, unparen, Snippet};
use crate::wrapper::literal_or_raw;

/// How the entry component is started.
pub(crate) struct EntryPoint<'a> {
    pub component: &'a str,
    pub mode: UpdateMode,
    pub route: RouteMode,
    /// `{ bundleName, moduleName, pagePath }` for named-route registration.
    pub page_info: Expr,
}

/// The entry metadata as far as it is known.
#[derive(Debug, Default)]
struct Fields {
    route: Option<Expr>,
    storage: Option<Expr>,
    shared: bool,
    /// The whole metadata expression when its shape is only known at runtime.
    whole: Option<Expr>,
}

/// One rung of the start-up decision table.
struct Rung {
    /// Runtime test over the fields of the metadata object `m`.
    guard: fn(&Expr) -> Expr,
    /// The same test over statically known fields.
    holds: fn(&Fields) -> bool,
    start: fn(&EntryPoint<'_>, &Fields) -> Vec<Stmt>,
}

const LADDER: [Rung; 4] = [
    // route name and storage
    Rung {
        guard: |m| and(defined(m, "routeName"), defined(m, "storage")),
        holds: |f| f.route.is_some() && f.storage.is_some(),
        start: |entry, f| entry.register(route_of(f), f.storage.clone()),
    },
    // route name only
    Rung {
        guard: |m| and(defined(m, "routeName"), undefined(m, "storage")),
        holds: |f| f.route.is_some(),
        start: |entry, f| entry.register(route_of(f), None),
    },
    // storage only
    Rung {
        guard: |m| and(undefined(m, "routeName"), defined(m, "storage")),
        holds: |f| f.storage.is_some(),
        start: |entry, f| entry.load(f.storage.clone()),
    },
    // the shared storage flag
    Rung {
        guard: |m| m.clone().prop("useSharedStorage"),
        holds: |f| f.shared,
        start: |entry, _| entry.load(Some(shared_storage())),
    },
];

/// Emits the start-up statements for `decorator` on the entry component.
pub(crate) fn lower_entry(entry: &EntryPoint<'_>, decorator: &Decorator) -> Vec<Stmt> {
    let arg = decorator.first_arg();
    if entry.mode == UpdateMode::Legacy {
        // The legacy runtime has no route registry; any argument is the page's storage.
        let storage = match arg.map(static_fields) {
            Some(Some(fields)) => fields.storage,
            Some(None) => arg.map(|arg| Expr::raw(arg.as_str().trim())),
            None => None,
        };
        return entry.load(storage);
    }

    match arg {
        None => fallback(entry, &Fields::default()),
        Some(arg) => match static_fields(arg) {
            Some(fields) => match LADDER.iter().find(|rung| (rung.holds)(&fields)) {
                Some(rung) => (rung.start)(entry, &fields),
                None => fallback(entry, &fields),
            },
            None => runtime_ladder(entry, Expr::raw(arg.as_str().trim())),
        },
    }
}

fn runtime_ladder(entry: &EntryPoint<'_>, metadata: Expr) -> Vec<Stmt> {
    let fields = Fields {
        route: Some(metadata.clone().prop("routeName")),
        storage: Some(metadata.clone().prop("storage")),
        shared: false,
        whole: Some(metadata.clone()),
    };
    let arms = LADDER
        .iter()
        .map(|rung| (and(metadata.clone(), (rung.guard)(&metadata)), (rung.start)(entry, &fields)))
        .collect();
    if_chain(arms, Some(fallback(entry, &fields)))
        .into_iter()
        .collect()
}

/// No rung applied: start with whatever metadata there is.
fn fallback(entry: &EntryPoint<'_>, fields: &Fields) -> Vec<Stmt> {
    match entry.route {
        RouteMode::Load => entry.load(fields.whole.clone()),
        RouteMode::NamedRoute => entry.register(Expr::str(""), fields.whole.clone()),
    }
}

impl EntryPoint<'_> {
    fn instance(&self, storage: Option<Expr>) -> Expr {
        let mut args = match self.mode {
            UpdateMode::Legacy => vec![Expr::str("1"), Expr::undefined(), Expr::object(Vec::new())],
            UpdateMode::Partial => vec![Expr::undefined(), Expr::object(Vec::new())],
        };
        args.extend(storage);
        Expr::new_(self.component, args)
    }

    fn load(&self, storage: Option<Expr>) -> Vec<Stmt> {
        let load = Expr::id("loadDocument")
            .call(vec![self.instance(storage)])
            .stmt();
        if self.mode == UpdateMode::Legacy {
            return vec![load];
        }
        let processor = || Expr::id("ViewStackProcessor");
        vec![
            processor()
                .method(
                    "StartGetAccessRecordingFor",
                    vec![processor().method("AllocateNewElmetIdForNextComponent", Vec::new())],
                )
                .stmt(),
            load,
            processor().method("StopGetAccessRecording", Vec::new()).stmt(),
        ]
    }

    fn register(&self, route: Expr, storage: Option<Expr>) -> Vec<Stmt> {
        vec![Expr::id("registerNamedRoute")
            .call(vec![
                Expr::arrow_expr(Vec::new(), self.instance(storage)),
                route,
                self.page_info.clone(),
            ])
            .stmt()]
    }
}

/// `{ bundleName: "...", moduleName: "...", pagePath: "..." }`
pub(crate) fn page_info(bundle: &str, module: &str, page: &str) -> Expr {
    Expr::object(vec![
        Property::new("bundleName", Expr::str(bundle)),
        Property::new("moduleName", Expr::str(module)),
        Property::new("pagePath", Expr::str(page)),
    ])
}

/// Reads the fields of an object-literal argument. Returns `None` for anything whose
/// shape is not fully visible: identifiers, calls, spreads, computed keys.
fn static_fields(arg: &SourceExpr) -> Option<Fields> {
    let snippet = Snippet::parse(arg.as_str())?;
    let SwcExpr::Object(object) = unparen(&snippet.expr) else {
        return None;
    };

    let mut fields = Fields::default();
    for prop in &object.props {
        let PropOrSpread::Prop(prop) = prop else {
            return None;
        };
        let (key, value) = match prop.as_ref() {
            Prop::KeyValue(kv) => (prop_key(&kv.key)?, Some(kv.value.as_ref())),
            Prop::Shorthand(ident) => (ident.sym.to_string(), None),
            _ => return None,
        };
        let text = match value {
            Some(value) => snippet.slice(value).trim().to_string(),
            None => key.clone(),
        };
        match key.as_str() {
            "routeName" => {
                fields.route = Some(match value.and_then(string_value) {
                    Some(name) => Expr::str(name),
                    None => Expr::raw(text),
                });
            }
            "storage" => fields.storage = Some(literal_or_raw(&SourceExpr::new(text))),
            "useSharedStorage" => fields.shared = value.and_then(bool_value).unwrap_or(true),
            _ => {}
        }
    }
    Some(fields)
}

fn prop_key(key: &PropName) -> Option<String> {
    match key {
        PropName::Ident(ident) => Some(ident.sym.to_string()),
        PropName::Str(s) => Some(s.value.to_string_lossy().into_owned()),
        _ => None,
    }
}

fn route_of(fields: &Fields) -> Expr {
    fields.route.clone().unwrap_or_else(|| Expr::str(""))
}

fn shared_storage() -> Expr {
    Expr::id("LocalStorage").method("getShared", Vec::new())
}

fn and(left: Expr, right: Expr) -> Expr {
    Expr::binary(left, "&&", right)
}

fn defined(metadata: &Expr, field: &str) -> Expr {
    Expr::binary(metadata.clone().prop(field), "!=", Expr::undefined())
}

fn undefined(metadata: &Expr, field: &str) -> Expr {
    Expr::binary(metadata.clone().prop(field), "==", Expr::undefined())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::print_stmts;
    use pretty_assertions::assert_eq;

    fn entry(mode: UpdateMode, route: RouteMode) -> EntryPoint<'static> {
        EntryPoint {
            component: "Index",
            mode,
            route,
            page_info: page_info("", "", "Index"),
        }
    }

    fn lower(mode: UpdateMode, arg: Option<&str>) -> String {
        let mut decorator = Decorator::new("Entry");
        if let Some(arg) = arg {
            decorator = decorator.with_arg(arg);
        }
        print_stmts(&lower_entry(&entry(mode, RouteMode::Load), &decorator))
    }

    #[test]
    fn test_bare_entry_partial() {
        assert_eq!(
            lower(UpdateMode::Partial, None),
            "ViewStackProcessor.StartGetAccessRecordingFor(ViewStackProcessor.AllocateNewElmetIdForNextComponent());\n\
             loadDocument(new Index(undefined, {}));\n\
             ViewStackProcessor.StopGetAccessRecording();\n"
        );
    }

    #[test]
    fn test_legacy_entry_with_storage() {
        assert_eq!(lower(UpdateMode::Legacy, None), "loadDocument(new Index(\"1\", undefined, {}));\n");
        assert_eq!(
            lower(UpdateMode::Legacy, Some("storage")),
            "loadDocument(new Index(\"1\", undefined, {}, storage));\n"
        );
    }

    #[test]
    fn test_static_route_name() {
        let out = lower(UpdateMode::Partial, Some("{ routeName: 'home', storage: store }"));
        assert_eq!(
            out,
            "registerNamedRoute(() => new Index(undefined, {}, store), \"home\", { bundleName: \"\", moduleName: \"\", pagePath: \"Index\" });\n"
        );
    }

    #[test]
    fn test_static_shared_storage() {
        let out = lower(UpdateMode::Partial, Some("{ useSharedStorage: true }"));
        assert!(out.contains("loadDocument(new Index(undefined, {}, LocalStorage.getShared()));"));
    }

    #[test]
    fn test_runtime_ladder_order() {
        let out = lower(UpdateMode::Partial, Some("storage"));
        let rungs: Vec<_> = out
            .lines()
            .filter(|line| line.starts_with("if") || line.starts_with("else"))
            .collect();
        assert_eq!(
            rungs,
            vec![
                "if (storage && storage.routeName != undefined && storage.storage != undefined) {",
                "else if (storage && storage.routeName != undefined && storage.storage == undefined) {",
                "else if (storage && storage.routeName == undefined && storage.storage != undefined) {",
                "else if (storage && storage.useSharedStorage) {",
                "else {",
            ]
        );
        assert!(out.contains(
            "    registerNamedRoute(() => new Index(undefined, {}, storage.storage), storage.routeName, "
        ));
        assert!(out.contains("    loadDocument(new Index(undefined, {}, storage));"));
    }

    #[test]
    fn test_spread_metadata_is_runtime() {
        let out = lower(UpdateMode::Partial, Some("{ ...options }"));
        assert!(out.starts_with("if ({ ...options } && "));
    }

    #[test]
    fn test_named_route_fallback() {
        let out = print_stmts(&lower_entry(
            &entry(UpdateMode::Partial, RouteMode::NamedRoute),
            &Decorator::new("Entry"),
        ));
        assert!(out.starts_with("registerNamedRoute(() => new Index(undefined, {}), \"\", "));
    }
}
