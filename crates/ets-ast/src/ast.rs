//! Declaration-level AST for an ETS source unit.
//!
//! The tree is produced by an external front end; this crate only models it. Expressions
//! and plain statements are carried as verbatim source text ([`Expr`], [`Verbatim`]) because
//! the lowering pass never needs to re-parse more than a handful of snippets.

use ets_span::Span;
use smol_str::SmolStr;

use crate::composition::{AttributeCall, CompositionNode};

/// A verbatim expression snippet, e.g. `this.count + 1` or `(item) => item.id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Expr {
    /// The expression text exactly as written.
    pub text: String,
}

impl Expr {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns the text of a single- or double-quoted string literal without its quotes.
    pub fn string_literal(&self) -> Option<&str> {
        let text = self.text.trim();
        let quote = text.chars().next()?;
        if (quote == '"' || quote == '\'' || quote == '`') && text.len() >= 2 && text.ends_with(quote)
        {
            Some(&text[1..text.len() - 1])
        } else {
            None
        }
    }
}

impl From<&str> for Expr {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Expr {
    fn from(text: String) -> Self {
        Self { text }
    }
}

/// A statement or declaration passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Verbatim {
    /// The source text.
    pub text: String,
    /// Where the text came from.
    #[cfg_attr(feature = "serde", serde(default))]
    pub span: Span,
}

impl Verbatim {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            span: Span::default(),
        }
    }
}

/// One compiled source unit (an `.ets` file).
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceUnit {
    /// File name of the unit, e.g. `pages/Index.ets`.
    pub file_name: String,
    /// Original source text, used to turn spans into line/column pairs.
    #[cfg_attr(feature = "serde", serde(default))]
    pub source: Option<String>,
    /// Top-level items in source order.
    pub items: Vec<Item>,
}

impl SourceUnit {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            source: None,
            items: Vec::new(),
        }
    }

    /// Appends an item, builder style.
    pub fn with_item(mut self, item: impl Into<Item>) -> Self {
        self.items.push(item.into());
        self
    }

    /// Iterates over the component declarations of the unit.
    pub fn components(&self) -> impl Iterator<Item = &ComponentDecl> {
        self.items.iter().filter_map(|item| match item {
            Item::Component(component) => Some(component),
            _ => None,
        })
    }

    /// Iterates over the top-level functions of the unit.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDecl> {
        self.items.iter().filter_map(|item| match item {
            Item::Function(function) => Some(function),
            _ => None,
        })
    }

    /// Iterates over the enum declarations of the unit.
    pub fn enums(&self) -> impl Iterator<Item = &EnumDecl> {
        self.items.iter().filter_map(|item| match item {
            Item::Enum(decl) => Some(decl),
            _ => None,
        })
    }

    /// Finds a component declared in this unit by name.
    pub fn component(&self, name: &str) -> Option<&ComponentDecl> {
        self.components().find(|c| c.name == name)
    }
}

/// A top-level item.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "item", rename_all = "snake_case"))]
pub enum Item {
    /// A `struct` decorated with `@Component`, `@ComponentV2` or `@CustomDialog`.
    Component(ComponentDecl),
    /// A top-level function, possibly decorated with `@Builder`, `@Styles`,
    /// `@Extend(...)` or `@AnimatableExtend(...)`.
    Function(FunctionDecl),
    /// An enum declaration.
    Enum(EnumDecl),
    /// Anything else (imports, classes, statements).
    Verbatim(Verbatim),
}

impl From<ComponentDecl> for Item {
    fn from(decl: ComponentDecl) -> Self {
        Item::Component(decl)
    }
}

impl From<FunctionDecl> for Item {
    fn from(decl: FunctionDecl) -> Self {
        Item::Function(decl)
    }
}

impl From<EnumDecl> for Item {
    fn from(decl: EnumDecl) -> Self {
        Item::Enum(decl)
    }
}

impl From<Verbatim> for Item {
    fn from(text: Verbatim) -> Self {
        Item::Verbatim(text)
    }
}

/// A decorator with its verbatim arguments, e.g. `@StorageLink("PropA")`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Decorator {
    /// The decorator name without the `@`.
    pub name: SmolStr,
    /// Call arguments; empty for a bare `@State`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub args: Vec<Expr>,
    /// The decorator's location.
    #[cfg_attr(feature = "serde", serde(default))]
    pub span: Span,
}

impl Decorator {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            span: Span::default(),
        }
    }

    pub fn with_arg(mut self, arg: impl Into<Expr>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// First argument, if any.
    pub fn first_arg(&self) -> Option<&Expr> {
        self.args.first()
    }
}

/// Returns the first decorator called `name`.
pub fn find_decorator<'a>(decorators: &'a [Decorator], name: &str) -> Option<&'a Decorator> {
    decorators.iter().find(|d| d.name == name)
}

/// The flavour of a component struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    /// `@Component`
    Component,
    /// `@ComponentV2`
    ComponentV2,
    /// `@CustomDialog`
    CustomDialog,
}

/// A component struct.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComponentDecl {
    /// The struct name.
    pub name: SmolStr,
    /// Struct-level decorators (`@Component`, `@Entry`, `@Reusable`, ...).
    #[cfg_attr(feature = "serde", serde(default))]
    pub decorators: Vec<Decorator>,
    /// Properties and methods in declaration order, including `build()`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub members: Vec<MemberDecl>,
    /// The struct's location.
    #[cfg_attr(feature = "serde", serde(default))]
    pub span: Span,
}

impl ComponentDecl {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            decorators: vec![Decorator::new("Component")],
            members: Vec::new(),
            span: Span::default(),
        }
    }

    pub fn with_decorator(mut self, decorator: Decorator) -> Self {
        self.decorators.push(decorator);
        self
    }

    pub fn with_member(mut self, member: MemberDecl) -> Self {
        self.members.push(member);
        self
    }

    /// Adds a `build()` method with the given composition body.
    pub fn with_build(self, body: Vec<CompositionNode>) -> Self {
        self.with_member(MemberDecl::method("build", Vec::new(), MethodBody::Composition(body)))
    }

    pub fn decorator(&self, name: &str) -> Option<&Decorator> {
        find_decorator(&self.decorators, name)
    }

    pub fn kind(&self) -> ComponentKind {
        if self.decorator("ComponentV2").is_some() {
            ComponentKind::ComponentV2
        } else if self.decorator("CustomDialog").is_some() {
            ComponentKind::CustomDialog
        } else {
            ComponentKind::Component
        }
    }

    /// The `@Entry` decorator, if this component is a page entry.
    pub fn entry(&self) -> Option<&Decorator> {
        self.decorator("Entry")
    }

    pub fn member(&self, name: &str) -> Option<&MemberDecl> {
        self.members.iter().find(|m| m.name == name)
    }

    /// The composition body of `build()`.
    pub fn build(&self) -> Option<&[CompositionNode]> {
        self.members.iter().find_map(|m| match &m.kind {
            MemberKind::Method {
                body: MethodBody::Composition(nodes),
                ..
            } if m.name == "build" && m.decorators.is_empty() => Some(nodes.as_slice()),
            _ => None,
        })
    }
}

/// A property, method or accessor of a component.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MemberDecl {
    /// The member name.
    pub name: SmolStr,
    /// Decorators in source order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub decorators: Vec<Decorator>,
    /// Whether the member is declared `static`.
    #[cfg_attr(feature = "serde", serde(default, rename = "static"))]
    pub is_static: bool,
    /// What kind of member this is.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub kind: MemberKind,
    /// The member's location.
    #[cfg_attr(feature = "serde", serde(default))]
    pub span: Span,
}

impl MemberDecl {
    /// A property with an optional type and initializer.
    pub fn property(
        name: impl Into<SmolStr>,
        ty: Option<TypeRef>,
        initializer: Option<&str>,
    ) -> Self {
        Self {
            name: name.into(),
            decorators: Vec::new(),
            is_static: false,
            kind: MemberKind::Property {
                ty,
                initializer: initializer.map(Expr::from),
            },
            span: Span::default(),
        }
    }

    pub fn method(name: impl Into<SmolStr>, params: Vec<Param>, body: MethodBody) -> Self {
        Self {
            name: name.into(),
            decorators: Vec::new(),
            is_static: false,
            kind: MemberKind::Method { params, body },
            span: Span::default(),
        }
    }

    pub fn getter(name: impl Into<SmolStr>, body: Vec<Verbatim>) -> Self {
        Self {
            name: name.into(),
            decorators: Vec::new(),
            is_static: false,
            kind: MemberKind::Getter { body },
            span: Span::default(),
        }
    }

    pub fn with_decorator(mut self, decorator: Decorator) -> Self {
        self.decorators.push(decorator);
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn decorator(&self, name: &str) -> Option<&Decorator> {
        find_decorator(&self.decorators, name)
    }

    pub fn is_property(&self) -> bool {
        matches!(self.kind, MemberKind::Property { .. })
    }

    /// Declared type of a property.
    pub fn ty(&self) -> Option<&TypeRef> {
        match &self.kind {
            MemberKind::Property { ty, .. } => ty.as_ref(),
            _ => None,
        }
    }

    /// Initializer of a property.
    pub fn initializer(&self) -> Option<&Expr> {
        match &self.kind {
            MemberKind::Property { initializer, .. } => initializer.as_ref(),
            _ => None,
        }
    }
}

/// The shape of a member.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum MemberKind {
    /// `name: Type = initializer`
    Property {
        /// Declared type, if annotated.
        #[cfg_attr(feature = "serde", serde(default))]
        ty: Option<TypeRef>,
        /// Initializer expression, if any.
        #[cfg_attr(feature = "serde", serde(default))]
        initializer: Option<Expr>,
    },
    /// `name(params) { body }`
    Method {
        /// Parameters in order.
        #[cfg_attr(feature = "serde", serde(default))]
        params: Vec<Param>,
        /// The method body.
        body: MethodBody,
    },
    /// `get name() { body }`
    Getter {
        /// Body statements.
        #[cfg_attr(feature = "serde", serde(default))]
        body: Vec<Verbatim>,
    },
}

/// A function or method parameter; types are erased by the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Param {
    /// The parameter name.
    pub name: SmolStr,
    /// Default value, if any.
    #[cfg_attr(feature = "serde", serde(default))]
    pub default: Option<Expr>,
}

impl Param {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }
}

/// The body of a method or function.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MethodBody {
    /// Ordinary statements, passed through.
    Statements(Vec<Verbatim>),
    /// A composition tree (`build()` and `@Builder` bodies).
    Composition(Vec<CompositionNode>),
    /// A bare attribute chain (`@Styles` and `@Extend` bodies).
    Attributes(Vec<AttributeCall>),
}

/// A top-level function.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FunctionDecl {
    /// The function name.
    pub name: SmolStr,
    /// Decorators in source order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub decorators: Vec<Decorator>,
    /// Parameters in order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub params: Vec<Param>,
    /// The function body.
    pub body: MethodBody,
    /// The function's location.
    #[cfg_attr(feature = "serde", serde(default))]
    pub span: Span,
}

impl FunctionDecl {
    pub fn new(name: impl Into<SmolStr>, params: Vec<Param>, body: MethodBody) -> Self {
        Self {
            name: name.into(),
            decorators: Vec::new(),
            params,
            body,
            span: Span::default(),
        }
    }

    pub fn with_decorator(mut self, decorator: Decorator) -> Self {
        self.decorators.push(decorator);
        self
    }

    pub fn decorator(&self, name: &str) -> Option<&Decorator> {
        find_decorator(&self.decorators, name)
    }
}

/// An enum declaration.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnumDecl {
    /// The enum name.
    pub name: SmolStr,
    /// Members in order.
    pub members: Vec<EnumMember>,
    /// The declaration's location.
    #[cfg_attr(feature = "serde", serde(default))]
    pub span: Span,
}

/// One enum member.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnumMember {
    /// The member name.
    pub name: SmolStr,
    /// Explicit initializer, if any.
    #[cfg_attr(feature = "serde", serde(default))]
    pub value: Option<Expr>,
}

/// A type annotation, reduced to what wrapper selection needs.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TypeRef {
    Boolean,
    Number,
    String,
    Undefined,
    Null,
    Any,
    /// A function type such as `() => void`.
    Function,
    /// An object literal type.
    Object,
    /// A type reference by name: a class, interface or enum.
    Named(SmolStr),
    /// `T[]` or `Array<T>`.
    Array(Box<TypeRef>),
    /// `A | B`.
    Union(Vec<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<SmolStr>) -> Self {
        TypeRef::Named(name.into())
    }
}
