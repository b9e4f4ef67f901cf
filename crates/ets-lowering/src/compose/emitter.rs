//! The emission strategy interface.
//!
//! The driver walks the composition tree once and hands each node's already-lowered
//! pieces to an [`Emitter`]. The two implementations differ only in how those pieces are
//! stitched into create/update/pop instrumentation.

use ets_ast::IterationKind;
use smol_str::SmolStr;

use crate::js::{Expr, Property, Stmt};
use crate::options::UpdateMode;

/// A per-unit sequence number identifying a composition node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct StableId(pub u32);

impl StableId {
    /// The id as the string literal the runtime compares.
    pub fn literal(self) -> Expr {
        Expr::str(self.0.to_string())
    }
}

/// A lowered builtin invocation.
pub(crate) struct BuiltinParts {
    pub name: SmolStr,
    pub receiver: Expr,
    /// `X.create(...)` followed by attribute calls.
    pub create: Vec<Stmt>,
    pub children: Vec<Stmt>,
    /// Whether the builtin is closed with `X.pop()`.
    pub closes: bool,
}

/// A lowered custom component invocation.
pub(crate) struct ComponentParts {
    pub name: SmolStr,
    pub id: StableId,
    pub receiver: Expr,
    /// Constructor argument object.
    pub args: Vec<Property>,
    /// Arguments refreshed on re-render; link arguments are left out.
    pub update_args: Vec<Property>,
    pub storage: Option<Expr>,
    /// Attribute calls retargeted to `__Common__`.
    pub common: Vec<Stmt>,
    /// The child is a `@ComponentV2`.
    pub is_v2: bool,
    /// Created inside a generator or builder; no compile-time id applies.
    pub dynamic: bool,
    /// `{ page, line, col }` for the child constructor.
    pub extra_info: Option<Expr>,
}

/// A lowered conditional block; the else branch, if any, comes last.
pub(crate) struct ConditionalParts {
    pub receiver: Expr,
    pub branches: Vec<(Option<Expr>, Vec<Stmt>)>,
}

/// A lowered item generator.
pub(crate) struct GeneratorParts {
    pub item: Option<SmolStr>,
    pub index: Option<SmolStr>,
    pub body: Vec<Stmt>,
}

/// A lowered iteration.
pub(crate) struct IterationParts {
    pub kind: IterationKind,
    pub id: StableId,
    pub receiver: Expr,
    pub source: Expr,
    pub generator: Option<GeneratorParts>,
    pub key: Option<Expr>,
    pub key_has_index: bool,
}

/// One of the two emission strategies.
pub(crate) trait Emitter {
    fn mode(&self) -> UpdateMode;

    /// Whether iterations must carry an explicit key generator.
    fn requires_key(&self) -> bool;

    fn builtin(&self, parts: BuiltinParts) -> Vec<Stmt>;

    fn component(&self, parts: ComponentParts) -> Vec<Stmt>;

    fn conditional(&self, parts: ConditionalParts) -> Vec<Stmt>;

    fn iteration(&self, parts: IterationParts) -> Vec<Stmt>;
}

/// `__Common__.create(); <attrs>`
pub(crate) fn common_create(common: Vec<Stmt>) -> Vec<Stmt> {
    let mut stmts = vec![Expr::id("__Common__").method("create", Vec::new()).stmt()];
    stmts.extend(common);
    stmts
}

pub(crate) fn pop(name: &str) -> Stmt {
    Expr::id(name).method("pop", Vec::new()).stmt()
}
