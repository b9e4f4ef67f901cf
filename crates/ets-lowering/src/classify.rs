//! Member classification.
//!
//! Every member of a component is classified exactly once into a [`MemberRole`]. The
//! rest of the pass matches on the role and never looks at decorator lists again.

use ets_ast::{Decorator, Expr, MemberDecl, TypeRef};
use ets_span::Span;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use crate::error::{LowerError, LowerErrorKind};

/// State-management decorators; a member carries at most one.
const STATE_DECORATORS: &[&str] = &[
    "State",
    "Link",
    "Prop",
    "Provide",
    "Consume",
    "ObjectLink",
    "StorageLink",
    "StorageProp",
    "LocalStorageLink",
    "LocalStorageProp",
    "Local",
    "Param",
    "Event",
    "Provider",
    "Consumer",
];

/// Builder-like decorators; orthogonal to the state axis, but exclusive among themselves.
const BUILDER_DECORATORS: &[&str] = &[
    "Builder",
    "LocalBuilder",
    "BuilderParam",
    "Styles",
    "Extend",
    "AnimatableExtend",
];

/// Which wrapper family backs a reactive member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapperKind {
    /// Value-equality change detection for primitives and enums.
    Simple,
    /// Proxy-based deep observation for everything else.
    Object,
}

/// The reactive role of a component member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberRole {
    Plain,
    State,
    Link,
    Prop,
    Provide { alias: SmolStr },
    Consume { alias: SmolStr },
    ObjectLink,
    StorageLink { key: Expr },
    StorageProp { key: Expr },
    LocalStorageLink { key: Expr },
    LocalStorageProp { key: Expr },
    BuilderParam,
    /// `@Builder` (or `@LocalBuilder` when `local`) method.
    BuilderMethod { local: bool },
    StyleMethod,
    ExtendMethod,
    Event,
    Param { once: bool },
    Local,
    Provider { alias: SmolStr },
    Consumer { alias: SmolStr },
    Computed,
    /// `@Monitor("a", "b.c")` with its verbatim path arguments.
    Monitor { paths: Vec<Expr> },
}

impl MemberRole {
    /// Roles whose storage is a wrapper object in a `__name` backing field.
    pub fn is_wrapped(&self) -> bool {
        matches!(
            self,
            MemberRole::State
                | MemberRole::Link
                | MemberRole::Prop
                | MemberRole::Provide { .. }
                | MemberRole::Consume { .. }
                | MemberRole::ObjectLink
                | MemberRole::StorageLink { .. }
                | MemberRole::StorageProp { .. }
                | MemberRole::LocalStorageLink { .. }
                | MemberRole::LocalStorageProp { .. }
        )
    }

    /// Roles that receive a wrapper reference from the caller rather than a value.
    pub fn takes_reference(&self) -> bool {
        matches!(self, MemberRole::Link)
    }

    /// Roles whose value must come from the caller's argument object.
    pub fn requires_params(&self) -> bool {
        matches!(
            self,
            MemberRole::Link | MemberRole::Prop | MemberRole::ObjectLink | MemberRole::Param { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            MemberRole::Plain => "plain",
            MemberRole::State => "state",
            MemberRole::Link => "link",
            MemberRole::Prop => "prop",
            MemberRole::Provide { .. } => "provide",
            MemberRole::Consume { .. } => "consume",
            MemberRole::ObjectLink => "object-link",
            MemberRole::StorageLink { .. } => "storage-link",
            MemberRole::StorageProp { .. } => "storage-prop",
            MemberRole::LocalStorageLink { .. } => "local-storage-link",
            MemberRole::LocalStorageProp { .. } => "local-storage-prop",
            MemberRole::BuilderParam => "builder-param",
            MemberRole::BuilderMethod { .. } => "builder-method",
            MemberRole::StyleMethod => "style-method",
            MemberRole::ExtendMethod => "extend-method",
            MemberRole::Event => "event",
            MemberRole::Param { .. } => "param",
            MemberRole::Local => "local",
            MemberRole::Provider { .. } => "provider",
            MemberRole::Consumer { .. } => "consumer",
            MemberRole::Computed => "computed",
            MemberRole::Monitor { .. } => "monitor",
        }
    }
}

/// A classified member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub name: SmolStr,
    pub role: MemberRole,
    /// Wrapper family selected from the declared type.
    pub wrapper: WrapperKind,
    /// `@Watch` callback name.
    pub watch: Option<SmolStr>,
    /// Also tagged `@BuilderParam` next to a state decorator.
    pub builder_param: bool,
    pub initializer: Option<Expr>,
    pub span: Span,
}

impl Classified {
    /// `__<name>`
    pub fn backing_field(&self) -> SmolStr {
        SmolStr::from(format!("__{}", self.name))
    }

    pub fn is_builder_param(&self) -> bool {
        self.builder_param || self.role == MemberRole::BuilderParam
    }
}

/// What classification needs to know about the surrounding unit.
#[derive(Debug, Default)]
pub struct TypeEnv {
    /// Enums declared in the unit; references to them count as simple types.
    pub enums: FxHashSet<SmolStr>,
}

impl TypeEnv {
    pub fn is_simple(&self, ty: &TypeRef) -> bool {
        match ty {
            TypeRef::Boolean | TypeRef::Number | TypeRef::String => true,
            TypeRef::Named(name) => self.enums.contains(name),
            TypeRef::Union(types) => {
                let mut saw_value = false;
                for ty in types {
                    match ty {
                        TypeRef::Undefined | TypeRef::Null => {}
                        other if self.is_simple(other) => saw_value = true,
                        _ => return false,
                    }
                }
                saw_value
            }
            _ => false,
        }
    }

    /// Selects the wrapper family for a member.
    ///
    /// Without a declared type a literal initializer decides; anything else is treated
    /// as an object.
    pub fn wrapper_for(&self, ty: Option<&TypeRef>, initializer: Option<&Expr>) -> WrapperKind {
        let simple = match ty {
            Some(ty) => self.is_simple(ty),
            None => initializer.is_some_and(|init| is_primitive_literal(init.as_str())),
        };
        if simple {
            WrapperKind::Simple
        } else {
            WrapperKind::Object
        }
    }
}

fn is_primitive_literal(text: &str) -> bool {
    let text = text.trim();
    let text = text.strip_prefix('-').unwrap_or(text);
    text == "true"
        || text == "false"
        || text.starts_with(['"', '\'', '`'])
        || text.parse::<f64>().is_ok()
}

/// Classifies one member.
pub fn classify(member: &MemberDecl, env: &TypeEnv) -> Result<Classified, LowerError> {
    let state = exclusive(member, STATE_DECORATORS)?;
    let builder = exclusive(member, BUILDER_DECORATORS)?;

    let role = match (state, builder) {
        (Some(decorator), _) => state_role(decorator),
        (None, Some(decorator)) => match decorator.name.as_str() {
            "Builder" => MemberRole::BuilderMethod { local: false },
            "LocalBuilder" => MemberRole::BuilderMethod { local: true },
            "BuilderParam" => MemberRole::BuilderParam,
            "Styles" => MemberRole::StyleMethod,
            _ => MemberRole::ExtendMethod,
        },
        (None, None) => {
            if member.decorator("Computed").is_some() {
                MemberRole::Computed
            } else if let Some(monitor) = member.decorator("Monitor") {
                MemberRole::Monitor {
                    paths: monitor.args.clone(),
                }
            } else {
                MemberRole::Plain
            }
        }
    };

    let role = match role {
        MemberRole::Param { .. } => MemberRole::Param {
            once: member.decorator("Once").is_some(),
        },
        role => role,
    };

    let watch = member
        .decorator("Watch")
        .and_then(Decorator::first_arg)
        .map(|arg| SmolStr::from(arg.string_literal().unwrap_or(arg.as_str())));

    let initializer = member.initializer().cloned();
    let wrapper = env.wrapper_for(member.ty(), initializer.as_ref());

    Ok(Classified {
        name: member.name.clone(),
        builder_param: state.is_some()
            && builder.is_some_and(|decorator| decorator.name == "BuilderParam"),
        role,
        wrapper,
        watch,
        initializer,
        span: member.span,
    })
}

/// Classifies every property, method and getter of a component, collecting all
/// conflicts rather than stopping at the first.
pub fn classify_members(
    members: &[MemberDecl],
    env: &TypeEnv,
) -> Result<Vec<Classified>, Vec<LowerError>> {
    let mut classified = Vec::with_capacity(members.len());
    let mut errors = Vec::new();
    for member in members {
        match classify(member, env) {
            Ok(c) => classified.push(c),
            Err(err) => errors.push(err),
        }
    }
    if errors.is_empty() {
        Ok(classified)
    } else {
        Err(errors)
    }
}

fn exclusive<'a>(
    member: &'a MemberDecl,
    set: &[&str],
) -> Result<Option<&'a Decorator>, LowerError> {
    let mut found: Option<&Decorator> = None;
    for decorator in &member.decorators {
        if !set.contains(&decorator.name.as_str()) {
            continue;
        }
        if let Some(first) = found {
            return Err(LowerError::new(
                LowerErrorKind::ClassificationConflict {
                    member: member.name.clone(),
                    first: first.name.clone(),
                    second: decorator.name.clone(),
                },
                decorator_span(member, decorator),
            ));
        }
        found = Some(decorator);
    }
    Ok(found)
}

fn decorator_span(member: &MemberDecl, decorator: &Decorator) -> Span {
    if decorator.span.is_empty() {
        member.span
    } else {
        decorator.span
    }
}

fn state_role(decorator: &Decorator) -> MemberRole {
    let key = || decorator.first_arg().cloned().unwrap_or_default();
    let alias = || decorator.first_arg().map(alias_text);
    match decorator.name.as_str() {
        "State" => MemberRole::State,
        "Link" => MemberRole::Link,
        "Prop" => MemberRole::Prop,
        "Provide" => MemberRole::Provide {
            alias: alias().unwrap_or_default(),
        },
        "Consume" => MemberRole::Consume {
            alias: alias().unwrap_or_default(),
        },
        "ObjectLink" => MemberRole::ObjectLink,
        "StorageLink" => MemberRole::StorageLink { key: key() },
        "StorageProp" => MemberRole::StorageProp { key: key() },
        "LocalStorageLink" => MemberRole::LocalStorageLink { key: key() },
        "LocalStorageProp" => MemberRole::LocalStorageProp { key: key() },
        "Local" => MemberRole::Local,
        "Param" => MemberRole::Param { once: false },
        "Event" => MemberRole::Event,
        "Provider" => MemberRole::Provider {
            alias: alias().unwrap_or_default(),
        },
        _ => MemberRole::Consumer {
            alias: alias().unwrap_or_default(),
        },
    }
}

/// `@Provide("a")`, `@Provide('a')` and `@Provide(a)` all alias to `a`.
fn alias_text(arg: &Expr) -> SmolStr {
    SmolStr::from(arg.string_literal().unwrap_or(arg.as_str().trim()))
}

impl Classified {
    /// The provide/consume alias, falling back to the member name.
    pub fn alias(&self) -> Option<SmolStr> {
        match &self.role {
            MemberRole::Provide { alias }
            | MemberRole::Consume { alias }
            | MemberRole::Provider { alias }
            | MemberRole::Consumer { alias } => Some(if alias.is_empty() {
                self.name.clone()
            } else {
                alias.clone()
            }),
            _ => None,
        }
    }

    pub fn is_method_like(&self) -> bool {
        matches!(
            self.role,
            MemberRole::BuilderMethod { .. }
                | MemberRole::StyleMethod
                | MemberRole::ExtendMethod
                | MemberRole::Monitor { .. }
                | MemberRole::Computed
        )
    }
}
