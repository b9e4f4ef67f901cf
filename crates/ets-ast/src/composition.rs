//! The composition tree of `build()` and `@Builder` bodies.

use ets_span::Span;
use smol_str::SmolStr;

use crate::ast::{Expr, Verbatim};

/// One node of a composition body.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "node", rename_all = "snake_case"))]
pub enum CompositionNode {
    /// A framework primitive such as `Column() { ... }` or `Text("hi").fontSize(20)`.
    Builtin(BuiltinInvocation),
    /// A custom component instantiation such as `Child({ count: this.count })`.
    Component(ComponentInvocation),
    /// `if` / `else if` / `else`.
    If(ConditionalBlock),
    /// `ForEach(...)` or `LazyForEach(...)`.
    Iteration(IterationBlock),
    /// A call to a `@Builder` function or method, or to a `@BuilderParam`.
    Builder(BuilderInvocation),
    /// Anything the front end did not recognise; emitted as written.
    Statement(Verbatim),
}

impl CompositionNode {
    pub fn span(&self) -> Span {
        match self {
            CompositionNode::Builtin(node) => node.span,
            CompositionNode::Component(node) => node.span,
            CompositionNode::If(node) => node.span,
            CompositionNode::Iteration(node) => node.span,
            CompositionNode::Builder(node) => node.span,
            CompositionNode::Statement(node) => node.span,
        }
    }

    /// Shorthand for an opaque statement leaf.
    pub fn statement(text: impl Into<String>) -> Self {
        CompositionNode::Statement(Verbatim::new(text))
    }
}

/// A chained attribute call such as `.fontSize(30)`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeCall {
    /// The attribute name.
    pub name: SmolStr,
    /// Verbatim arguments.
    #[cfg_attr(feature = "serde", serde(default))]
    pub args: Vec<Expr>,
    /// The call's location.
    #[cfg_attr(feature = "serde", serde(default))]
    pub span: Span,
}

impl AttributeCall {
    pub fn new<I, E>(name: impl Into<SmolStr>, args: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        Self {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
            span: Span::default(),
        }
    }
}

/// A builtin component invocation.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuiltinInvocation {
    /// The builtin name, e.g. `Column`.
    pub name: SmolStr,
    /// Constructor arguments.
    #[cfg_attr(feature = "serde", serde(default))]
    pub args: Vec<Expr>,
    /// Chained attribute calls in source order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub attributes: Vec<AttributeCall>,
    /// The trailing child block, `None` when the call has no `{ ... }`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub children: Option<Vec<CompositionNode>>,
    /// The invocation's location.
    #[cfg_attr(feature = "serde", serde(default))]
    pub span: Span,
}

impl BuiltinInvocation {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            attributes: Vec::new(),
            children: None,
            span: Span::default(),
        }
    }

    pub fn arg(mut self, arg: impl Into<Expr>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn attr<I, E>(mut self, name: impl Into<SmolStr>, args: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        self.attributes.push(AttributeCall::new(name, args));
        self
    }

    /// Appends a child, opening the child block if needed.
    pub fn child(mut self, node: impl Into<CompositionNode>) -> Self {
        self.children.get_or_insert_with(Vec::new).push(node.into());
        self
    }

    /// Opens an empty child block.
    pub fn with_block(mut self) -> Self {
        self.children.get_or_insert_with(Vec::new);
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

impl From<BuiltinInvocation> for CompositionNode {
    fn from(node: BuiltinInvocation) -> Self {
        CompositionNode::Builtin(node)
    }
}

/// One named property of a component's argument object.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropertyArg {
    /// The property name.
    pub name: SmolStr,
    /// The property value.
    pub value: Expr,
}

/// A custom component invocation.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComponentInvocation {
    /// The component name.
    pub name: SmolStr,
    /// The argument object's properties.
    #[cfg_attr(feature = "serde", serde(default))]
    pub args: Vec<PropertyArg>,
    /// An explicit `LocalStorage` passed as second argument.
    #[cfg_attr(feature = "serde", serde(default))]
    pub storage: Option<Expr>,
    /// Common attributes chained on the component (`.width(100)`).
    #[cfg_attr(feature = "serde", serde(default))]
    pub attributes: Vec<AttributeCall>,
    /// A trailing closure that fills the child's `@BuilderParam`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub trailing: Option<Vec<CompositionNode>>,
    /// The `@BuilderParam` the trailing closure binds to, when the child is declared in
    /// another unit and the front end already resolved it.
    #[cfg_attr(feature = "serde", serde(default))]
    pub trailing_param: Option<SmolStr>,
    /// The invocation's location.
    #[cfg_attr(feature = "serde", serde(default))]
    pub span: Span,
}

impl ComponentInvocation {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            storage: None,
            attributes: Vec::new(),
            trailing: None,
            trailing_param: None,
            span: Span::default(),
        }
    }

    pub fn prop(mut self, name: impl Into<SmolStr>, value: impl Into<Expr>) -> Self {
        self.args.push(PropertyArg {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn attr<I, E>(mut self, name: impl Into<SmolStr>, args: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        self.attributes.push(AttributeCall::new(name, args));
        self
    }

    pub fn trailing(mut self, nodes: Vec<CompositionNode>) -> Self {
        self.trailing = Some(nodes);
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

impl From<ComponentInvocation> for CompositionNode {
    fn from(node: ComponentInvocation) -> Self {
        CompositionNode::Component(node)
    }
}

/// An `if` chain.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConditionalBlock {
    /// Branches in source order; a final `else` has no condition.
    pub branches: Vec<Branch>,
    /// The block's location.
    #[cfg_attr(feature = "serde", serde(default))]
    pub span: Span,
}

impl ConditionalBlock {
    pub fn new() -> Self {
        Self {
            branches: Vec::new(),
            span: Span::default(),
        }
    }

    /// Adds an `if`/`else if` branch.
    pub fn when(mut self, condition: impl Into<Expr>, children: Vec<CompositionNode>) -> Self {
        self.branches.push(Branch {
            condition: Some(condition.into()),
            children,
            span: Span::default(),
        });
        self
    }

    /// Adds the `else` branch.
    pub fn otherwise(mut self, children: Vec<CompositionNode>) -> Self {
        self.branches.push(Branch {
            condition: None,
            children,
            span: Span::default(),
        });
        self
    }
}

impl Default for ConditionalBlock {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ConditionalBlock> for CompositionNode {
    fn from(node: ConditionalBlock) -> Self {
        CompositionNode::If(node)
    }
}

/// One branch of an `if` chain.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Branch {
    /// The predicate; `None` for `else`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub condition: Option<Expr>,
    /// The branch body.
    #[cfg_attr(feature = "serde", serde(default))]
    pub children: Vec<CompositionNode>,
    /// The branch's location.
    #[cfg_attr(feature = "serde", serde(default))]
    pub span: Span,
}

/// Which iteration primitive is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IterationKind {
    ForEach,
    LazyForEach,
}

impl IterationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IterationKind::ForEach => "ForEach",
            IterationKind::LazyForEach => "LazyForEach",
        }
    }
}

/// A `ForEach`/`LazyForEach` call with its raw argument list.
///
/// Arguments are kept exactly as written; the lowering pass resolves which overload
/// the call site uses.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IterationBlock {
    /// `ForEach` or `LazyForEach`.
    pub kind: IterationKind,
    /// Call arguments in order.
    pub args: Vec<IterationArg>,
    /// The call's location.
    #[cfg_attr(feature = "serde", serde(default))]
    pub span: Span,
}

impl IterationBlock {
    pub fn for_each(args: Vec<IterationArg>) -> Self {
        Self {
            kind: IterationKind::ForEach,
            args,
            span: Span::default(),
        }
    }

    pub fn lazy(args: Vec<IterationArg>) -> Self {
        Self {
            kind: IterationKind::LazyForEach,
            args,
            span: Span::default(),
        }
    }
}

impl From<IterationBlock> for CompositionNode {
    fn from(node: IterationBlock) -> Self {
        CompositionNode::Iteration(node)
    }
}

/// One argument of an iteration call.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum IterationArg {
    /// An ordinary expression (the source collection or a key function).
    Expr(Expr),
    /// An arrow function whose body is a composition tree.
    Generator(ItemGenerator),
}

impl IterationArg {
    pub fn expr(text: impl Into<Expr>) -> Self {
        IterationArg::Expr(text.into())
    }

    pub fn generator<I, S>(params: I, body: Vec<CompositionNode>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        IterationArg::Generator(ItemGenerator {
            params: params.into_iter().map(Into::into).collect(),
            body,
            span: Span::default(),
        })
    }
}

/// The item generator of an iteration, `(item, index) => { ... }`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemGenerator {
    /// Parameter names (item, then optionally index).
    #[cfg_attr(feature = "serde", serde(default))]
    pub params: Vec<SmolStr>,
    /// The generated subtree.
    pub body: Vec<CompositionNode>,
    /// The generator's location.
    #[cfg_attr(feature = "serde", serde(default))]
    pub span: Span,
}

/// How a builder callee is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CallReceiver {
    /// `this.name(...)`: a builder method or a `@BuilderParam`.
    This,
    /// `name(...)`: a global builder function.
    #[default]
    Free,
}

/// A builder call inside a composition body.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuilderInvocation {
    /// The callee name.
    pub callee: SmolStr,
    /// Whether the callee was reached through `this`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub receiver: CallReceiver,
    /// Verbatim arguments.
    #[cfg_attr(feature = "serde", serde(default))]
    pub args: Vec<Expr>,
    /// The call's location.
    #[cfg_attr(feature = "serde", serde(default))]
    pub span: Span,
}

impl BuilderInvocation {
    /// `this.callee(...)`
    pub fn method(callee: impl Into<SmolStr>) -> Self {
        Self {
            callee: callee.into(),
            receiver: CallReceiver::This,
            args: Vec::new(),
            span: Span::default(),
        }
    }

    /// `callee(...)`
    pub fn function(callee: impl Into<SmolStr>) -> Self {
        Self {
            callee: callee.into(),
            receiver: CallReceiver::Free,
            args: Vec::new(),
            span: Span::default(),
        }
    }

    pub fn arg(mut self, arg: impl Into<Expr>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl From<BuilderInvocation> for CompositionNode {
    fn from(node: BuilderInvocation) -> Self {
        CompositionNode::Builder(node)
    }
}
