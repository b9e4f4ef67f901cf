//! Unit-level driver: classifies every component, builds the unit facts, lowers each
//! item in source order and appends the entry start-up code.

use std::path::Path;

use ets_ast::{
    ComponentDecl, ComponentKind, EnumDecl, FunctionDecl, Item as SourceItem, MethodBody,
    SourceUnit,
};
use ets_diagnostics::{Diagnostic, DiagnosticCode};
use ets_span::LineIndex;

use crate::builder::{builder_function, extend_function, plain_params, takes_parameter_by_reference};
use crate::classify::{classify_members, Classified, TypeEnv};
use crate::component::lower_component;
use crate::compose::{ChildFacts, Rewriter, UnitFacts};
use crate::entry::{lower_entry, page_info, EntryPoint};
use crate::error::LowerError;
use crate::js::{Expr, Function, Item, Module, Stmt};
use crate::options::{LowerOptions, UpdateMode};
use crate::printer::print_module;

/// The lowered form of a unit.
#[derive(Debug, Clone)]
pub struct LowerOutput {
    /// The emitted module as IR.
    pub module: Module,
    /// The emitted module as text.
    pub code: String,
    /// The update mode actually used.
    pub mode: UpdateMode,
    /// Non-fatal diagnostics, such as a forced mode switch.
    pub warnings: Vec<Diagnostic>,
}

const PARTIAL_PREAMBLE: &str = r#"if (!("finalizeConstruction" in ViewPU.prototype)) {
    Reflect.set(ViewPU.prototype, "finalizeConstruction", () => { });
}
if (PUV2ViewBase.contextStack === undefined) {
    Reflect.set(PUV2ViewBase, "contextStack", []);
}"#;

const DECORATE_HELPER: &str = r#"var __decorate = (this && this.__decorate) || function (decorators, target, key, desc) {
    var c = arguments.length, r = c < 3 ? target : desc === null ? desc = Object.getOwnPropertyDescriptor(target, key) : desc, d;
    if (typeof Reflect === "object" && typeof Reflect.decorate === "function") r = Reflect.decorate(decorators, target, key, desc);
    else for (var i = decorators.length - 1; i >= 0; i--) if (d = decorators[i]) r = (c < 3 ? d(r) : c > 3 ? d(target, key, r) : d(target, key)) || r;
    return c > 3 && r && Object.defineProperty(target, key, r), r;
};"#;

/// Lowers one source unit.
///
/// Every component is attempted so that all problems of the unit are reported at once;
/// any error means no output for the unit.
pub fn lower_unit(unit: &SourceUnit, options: &LowerOptions) -> Result<LowerOutput, Vec<LowerError>> {
    let file_name = options
        .file_name
        .clone()
        .unwrap_or_else(|| unit.file_name.clone());
    let _span = tracing::debug_span!("lower_unit", unit = %file_name).entered();

    let mut warnings = Vec::new();
    let mode = select_mode(unit, options.mode, &mut warnings);
    tracing::debug!(requested = %options.mode, %mode, "selected update mode");

    let env = TypeEnv {
        enums: unit.enums().map(|decl| decl.name.clone()).collect(),
    };

    let mut errors = Vec::new();
    let mut classified: Vec<Option<Vec<Classified>>> = Vec::new();
    for component in unit.components() {
        match classify_members(&component.members, &env) {
            Ok(members) => classified.push(Some(members)),
            Err(errs) => {
                errors.extend(errs);
                classified.push(None);
            }
        }
    }

    let facts = unit_facts(unit, &file_name, &classified, options, mode);
    let entry = unit.components().find(|component| component.entry().is_some());

    let mut items = preamble(unit, mode, &file_name);
    let mut rewriter = Rewriter::new(&facts, mode);
    let mut classified = classified.into_iter();
    for item in &unit.items {
        let lowered = match item {
            SourceItem::Component(component) => match classified.next().flatten() {
                Some(members) => {
                    let is_entry = entry.is_some_and(|entry| entry.name == component.name);
                    lower_component(component, members, is_entry, &mut rewriter)
                }
                None => continue,
            },
            SourceItem::Function(function) => lower_function(function, &facts, &mut rewriter),
            SourceItem::Enum(decl) => Ok(vec![lower_enum(decl)]),
            SourceItem::Verbatim(text) => Ok(vec![Item::Stmt(Stmt::Raw(text.text.clone()))]),
        };
        match lowered {
            Ok(lowered) => items.extend(lowered),
            Err(err) => errors.push(err),
        }
    }

    if let Some(component) = entry {
        if let Some(decorator) = component.entry() {
            let page = options
                .page_path
                .clone()
                .unwrap_or_else(|| page_stem(&file_name));
            let entry = EntryPoint {
                component: &component.name,
                mode,
                route: options.route,
                page_info: page_info(
                    options.bundle_name.as_deref().unwrap_or_default(),
                    options.module_name.as_deref().unwrap_or_default(),
                    &page,
                ),
            };
            items.extend(lower_entry(&entry, decorator).into_iter().map(Item::Stmt));
        }
    }

    if !errors.is_empty() {
        tracing::debug!(errors = errors.len(), "unit aborted");
        return Err(errors);
    }

    let module = Module { items };
    let code = print_module(&module);
    Ok(LowerOutput {
        module,
        code,
        mode,
        warnings,
    })
}

/// `@ComponentV2` only exists in the partial runtime.
fn select_mode(unit: &SourceUnit, requested: UpdateMode, warnings: &mut Vec<Diagnostic>) -> UpdateMode {
    let v2 = unit
        .components()
        .find(|component| component.kind() == ComponentKind::ComponentV2);
    match (requested, v2) {
        (UpdateMode::Legacy, Some(component)) => {
            warnings.push(Diagnostic::new(
                DiagnosticCode::ModeOverride,
                format!(
                    "'{}' is a @ComponentV2 component; the unit is lowered with partial update",
                    component.name
                ),
                component.span,
            ));
            UpdateMode::Partial
        }
        (mode, _) => mode,
    }
}

fn unit_facts(
    unit: &SourceUnit,
    file_name: &str,
    classified: &[Option<Vec<Classified>>],
    options: &LowerOptions,
    mode: UpdateMode,
) -> UnitFacts {
    let mut facts = UnitFacts {
        file_name: file_name.to_string(),
        containers: options.extra_containers.iter().map(Into::into).collect(),
        line_index: unit.source.as_deref().map(LineIndex::new),
        extra_info: options.extra_info && mode == UpdateMode::Partial,
        ..UnitFacts::default()
    };

    for (component, members) in unit.components().zip(classified) {
        let members = members.as_deref().unwrap_or_default();
        facts
            .components
            .insert(component.name.clone(), child_facts(component, members));
    }

    for function in unit.functions() {
        match (&function.body, extend_target(function)) {
            (MethodBody::Attributes(attrs), None) if function.decorator("Styles").is_some() => {
                facts.global_styles.insert(function.name.clone(), attrs.clone());
            }
            (MethodBody::Attributes(_), Some(target)) => {
                facts.extends.insert((target.into(), function.name.clone()));
            }
            (MethodBody::Composition(_), _) if takes_parameter_by_reference(&function.params) => {
                facts.by_reference_builders.insert(function.name.clone());
            }
            _ => {}
        }
    }
    facts
}

fn child_facts(component: &ComponentDecl, members: &[Classified]) -> ChildFacts {
    ChildFacts {
        is_v2: component.kind() == ComponentKind::ComponentV2,
        roles: members
            .iter()
            .map(|member| (member.name.clone(), member.role.clone()))
            .collect(),
        builder_params: members
            .iter()
            .filter(|member| member.is_builder_param())
            .map(|member| member.name.clone())
            .collect(),
    }
}

/// `@Extend(Text)` and `@AnimatableExtend(Text)` name their target component.
fn extend_target(function: &FunctionDecl) -> Option<&str> {
    function
        .decorator("Extend")
        .or_else(|| function.decorator("AnimatableExtend"))
        .and_then(|decorator| decorator.first_arg())
        .map(|target| target.as_str().trim())
}

fn lower_function(
    function: &FunctionDecl,
    facts: &UnitFacts,
    rewriter: &mut Rewriter<'_>,
) -> Result<Vec<Item>, LowerError> {
    let item = match (&function.body, extend_target(function)) {
        (MethodBody::Composition(body), _) => builder_function(function, body, rewriter)?,
        (MethodBody::Attributes(attrs), Some(target)) => {
            extend_function(function, target, attrs, facts)?
        }
        // Global styles are inlined at their use sites.
        (MethodBody::Attributes(_), None) => return Ok(Vec::new()),
        (MethodBody::Statements(body), _) => Function {
            name: function.name.clone(),
            params: plain_params(&function.params),
            body: body.iter().map(|stmt| Stmt::Raw(stmt.text.clone())).collect(),
        },
    };
    Ok(vec![Item::Function(item)])
}

/// `var E; (function (E) { E[E["A"] = 0] = "A"; })(E || (E = {}));`
fn lower_enum(decl: &EnumDecl) -> Item {
    let name = decl.name.as_str();
    let mut next = Some(0i64);
    let mut body = Vec::with_capacity(decl.members.len());
    for member in &decl.members {
        let key = Expr::str(member.name.as_str());
        let slot = |value: Expr| Expr::raw(format!("{name}[{}]", crate::printer::print_expr(&value)));
        let stmt = match member.value.as_ref().map(|value| value.as_str().trim()) {
            Some(text) if text.starts_with(['"', '\'', '`']) => {
                next = None;
                Expr::assign(slot(key), Expr::raw(text))
            }
            Some(text) => {
                next = text.parse::<i64>().ok().map(|value| value + 1);
                Expr::assign(slot(Expr::assign(slot(key), Expr::raw(text))), Expr::str(member.name.as_str()))
            }
            None => {
                let value = next.unwrap_or_default();
                next = Some(value + 1);
                Expr::assign(
                    slot(Expr::assign(slot(key), Expr::raw(value.to_string()))),
                    Expr::str(member.name.as_str()),
                )
            }
        };
        body.push(stmt.stmt());
    }

    let mut text = format!("var {name};\n(function ({name}) {{\n");
    text.push_str(&indent(&crate::printer::print_stmts(&body)));
    text.push_str(&format!("}})({name} || ({name} = {{}}));"));
    Item::Stmt(Stmt::Raw(text))
}

fn indent(text: &str) -> String {
    text.lines().map(|line| format!("    {line}\n")).collect()
}

fn preamble(unit: &SourceUnit, mode: UpdateMode, file_name: &str) -> Vec<Item> {
    let mut items = Vec::new();
    if unit.components().next().is_none() {
        return items;
    }
    match mode {
        UpdateMode::Partial => {
            items.push(Item::Stmt(Stmt::Raw(PARTIAL_PREAMBLE.to_string())));
            if unit
                .components()
                .any(|component| component.kind() == ComponentKind::ComponentV2)
            {
                items.push(Item::Stmt(Stmt::Raw(DECORATE_HELPER.to_string())));
            }
        }
        UpdateMode::Legacy => {
            items.push(Item::Stmt(Stmt::Let("__generate__Id".into(), Expr::raw("0"))));
            items.push(Item::Function(Function {
                name: "generateId".into(),
                params: Vec::new(),
                body: vec![Stmt::ret(Some(Expr::binary(
                    Expr::str(format!("{}_", page_stem(file_name))),
                    "+",
                    Expr::raw("++__generate__Id"),
                )))],
            }));
        }
    }
    items
}

/// The file name without directories or extensions.
fn page_stem(file_name: &str) -> String {
    let name = Path::new(file_name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(file_name);
    name.split('.').next().unwrap_or(name).to_string()
}
