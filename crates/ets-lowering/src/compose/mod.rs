//! The composition rewriter.
//!
//! [`Rewriter`] walks a composition body depth-first. For every node it lowers the
//! pieces that do not depend on the update mode (arguments, attributes, bindings,
//! children) and hands them to the unit's [`Emitter`], which produces the create/update/pop
//! statements. The emitter is chosen once per unit.

mod emitter;
mod legacy;
mod partial;
mod scope;

use ets_ast::{
    AttributeCall, BuiltinInvocation, CompositionNode, ComponentInvocation, ConditionalBlock,
    IterationBlock, PropertyArg,
};
use ets_span::{LineIndex, Span};
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use crate::binding::{link_argument, rewrite_two_way};
use crate::builder::{lower_attributes, lower_builder_call};
use crate::classify::MemberRole;
use crate::error::{LowerError, LowerErrorKind};
use crate::iteration;
use crate::js::{Expr, Property, Stmt};
use crate::options::UpdateMode;

pub(crate) use emitter::StableId;
use emitter::{
    BuiltinParts, ComponentParts, ConditionalParts, Emitter, GeneratorParts, IterationParts,
};
use legacy::LegacyEmitter;
use partial::PartialEmitter;
pub(crate) use scope::{ComponentScope, Scope};

/// Id reserved for the entry component in legacy mode; nodes count up from here.
pub(crate) const ENTRY_ID: u32 = 1;

/// Builtins that open a child scope and are closed with `pop()`.
const CONTAINERS: &[&str] = &[
    "Badge",
    "Blank",
    "Button",
    "Column",
    "ColumnSplit",
    "Counter",
    "Flex",
    "FlowItem",
    "FormItem",
    "Grid",
    "GridCol",
    "GridItem",
    "GridRow",
    "List",
    "ListItem",
    "ListItemGroup",
    "Navigation",
    "NavDestination",
    "Navigator",
    "Panel",
    "Refresh",
    "RelativeContainer",
    "Row",
    "RowSplit",
    "Scroll",
    "SideBarContainer",
    "Stack",
    "Swiper",
    "TabContent",
    "Tabs",
    "Text",
    "WaterFlow",
];

/// What a component invocation needs to know about a component declared in the unit.
#[derive(Debug, Default)]
pub(crate) struct ChildFacts {
    pub is_v2: bool,
    pub roles: FxHashMap<SmolStr, MemberRole>,
    /// `@BuilderParam` members in declaration order.
    pub builder_params: Vec<SmolStr>,
}

impl ChildFacts {
    /// The member a trailing closure binds to: the only `@BuilderParam`.
    fn trailing_target(&self) -> Option<SmolStr> {
        match self.builder_params.as_slice() {
            [only] => Some(only.clone()),
            _ => None,
        }
    }
}

/// Unit-wide facts shared by every body of the unit.
#[derive(Debug, Default)]
pub(crate) struct UnitFacts {
    pub file_name: String,
    pub components: FxHashMap<SmolStr, ChildFacts>,
    /// Global `@Styles` functions by name.
    pub global_styles: FxHashMap<SmolStr, Vec<AttributeCall>>,
    /// Global `@Extend(Target)` functions as `(target, name)`.
    pub extends: FxHashSet<(SmolStr, SmolStr)>,
    /// Global `@Builder` functions whose only parameter is `$$`.
    pub by_reference_builders: FxHashSet<SmolStr>,
    pub containers: FxHashSet<SmolStr>,
    pub line_index: Option<LineIndex>,
    pub extra_info: bool,
}

impl UnitFacts {
    fn is_container(&self, name: &str) -> bool {
        CONTAINERS.contains(&name) || self.containers.contains(name)
    }

    /// `{ page: "...", line: N, col: M }` for a node, when positions are known.
    fn extra_info_for(&self, span: Span) -> Option<Expr> {
        if !self.extra_info {
            return None;
        }
        let position = self.line_index.as_ref()?.line_col(span.start)?;
        Some(Expr::object(vec![
            Property::new("page", Expr::str(self.file_name.as_str())),
            Property::new("line", Expr::raw(position.line_number().to_string())),
            Property::new("col", Expr::raw(position.column_number().to_string())),
        ]))
    }
}

/// Walks composition bodies of one unit.
pub(crate) struct Rewriter<'u> {
    unit: &'u UnitFacts,
    emitter: Box<dyn Emitter>,
    last_id: u32,
    frames: Vec<(SmolStr, Span)>,
}

impl<'u> Rewriter<'u> {
    pub fn new(unit: &'u UnitFacts, mode: UpdateMode) -> Self {
        let emitter: Box<dyn Emitter> = match mode {
            UpdateMode::Legacy => Box::new(LegacyEmitter),
            UpdateMode::Partial => Box::new(PartialEmitter),
        };
        Self {
            unit,
            emitter,
            last_id: ENTRY_ID,
            frames: Vec::new(),
        }
    }

    pub fn mode(&self) -> UpdateMode {
        self.emitter.mode()
    }

    /// Lowers one composition body (`build()` or a builder).
    pub fn lower_body(
        &mut self,
        nodes: &[CompositionNode],
        scope: &Scope,
    ) -> Result<Vec<Stmt>, LowerError> {
        tracing::trace!(
            component = scope.component_name().unwrap_or("<global>"),
            nodes = nodes.len(),
            "lowering composition body"
        );
        self.frames.clear();
        let stmts = self.lower_nodes(nodes, scope)?;
        if let Some((name, span)) = self.frames.pop() {
            return Err(imbalance(format!("`{name}` is opened but never closed"), span));
        }
        Ok(stmts)
    }

    fn next_id(&mut self) -> StableId {
        self.last_id += 1;
        StableId(self.last_id)
    }

    fn open(&mut self, name: &str, span: Span) {
        self.frames.push((name.into(), span));
    }

    fn close(&mut self, name: &str, span: Span) -> Result<(), LowerError> {
        match self.frames.pop() {
            Some((open, _)) if open == name => Ok(()),
            Some((open, open_span)) => Err(imbalance(
                format!("`{name}` closes `{open}`"),
                open_span.cover(span),
            )),
            None => Err(imbalance(format!("`{name}` closed but never opened"), span)),
        }
    }

    fn lower_nodes(
        &mut self,
        nodes: &[CompositionNode],
        scope: &Scope,
    ) -> Result<Vec<Stmt>, LowerError> {
        let mut out = Vec::new();
        for node in nodes {
            self.lower_node(node, scope, &mut out)?;
        }
        Ok(out)
    }

    fn lower_node(
        &mut self,
        node: &CompositionNode,
        scope: &Scope,
        out: &mut Vec<Stmt>,
    ) -> Result<(), LowerError> {
        match node {
            CompositionNode::Builtin(builtin) => self.builtin(builtin, scope, out),
            CompositionNode::Component(component) => self.component(component, scope, out),
            CompositionNode::If(block) => self.conditional(block, scope, out),
            CompositionNode::Iteration(block) => self.iteration(block, scope, out),
            CompositionNode::Builder(call) => {
                out.push(lower_builder_call(call, scope, self.unit)?);
                Ok(())
            }
            CompositionNode::Statement(text) => {
                out.push(Stmt::Raw(text.text.clone()));
                Ok(())
            }
        }
    }

    fn builtin(
        &mut self,
        node: &BuiltinInvocation,
        scope: &Scope,
        out: &mut Vec<Stmt>,
    ) -> Result<(), LowerError> {
        // Builtins occupy a slot in the sequence even though no id is printed for them.
        self.next_id();
        self.open(&node.name, node.span);

        let args = node
            .args
            .iter()
            .map(|arg| rewrite_two_way(arg.as_str(), scope, node.span).map(Expr::raw))
            .collect::<Result<Vec<_>, _>>()?;
        let has_children = node.children.as_ref().is_some_and(|c| !c.is_empty());
        let create = match node.name.as_str() {
            "Button" if !args.is_empty() && !has_children => "createWithLabel",
            "Button" => "createWithChild",
            _ => "create",
        };
        let mut create = vec![Expr::id(node.name.clone()).method(create, args).stmt()];
        create.extend(lower_attributes(&node.name, &node.attributes, scope, self.unit)?);

        let children = match &node.children {
            Some(children) => self.lower_nodes(children, scope)?,
            None => Vec::new(),
        };

        out.extend(self.emitter.builtin(BuiltinParts {
            name: node.name.clone(),
            receiver: scope.receiver_expr(),
            create,
            children,
            closes: has_children || self.unit.is_container(&node.name),
        }));
        self.close(&node.name, node.span)
    }

    fn component(
        &mut self,
        node: &ComponentInvocation,
        scope: &Scope,
        out: &mut Vec<Stmt>,
    ) -> Result<(), LowerError> {
        let unit = self.unit;
        let id = self.next_id();
        self.open(&node.name, node.span);
        let child = unit.components.get(&node.name);

        let mut args = Vec::with_capacity(node.args.len() + 1);
        let mut update_args = Vec::with_capacity(node.args.len());
        for arg in &node.args {
            let (value, is_link) = component_arg(arg, child, scope, node.span)?;
            if !is_link {
                update_args.push(Property::new(arg.name.clone(), value.clone()));
            }
            args.push(Property::new(arg.name.clone(), value));
        }

        if let Some(trailing) = &node.trailing {
            let target = node
                .trailing_param
                .clone()
                .or_else(|| child.and_then(ChildFacts::trailing_target))
                .ok_or_else(|| {
                    LowerError::new(
                        LowerErrorKind::UnknownTrailingClosureTarget {
                            component: node.name.clone(),
                        },
                        node.span,
                    )
                })?;
            let body = self.lower_nodes(trailing, &scope.enter_dynamic())?;
            args.push(Property::new(target, Expr::arrow(Vec::new(), body)));
        }

        let common = lower_attributes("__Common__", &node.attributes, scope, unit)?;

        out.extend(self.emitter.component(ComponentParts {
            name: node.name.clone(),
            id,
            receiver: scope.receiver_expr(),
            args,
            update_args,
            storage: node
                .storage
                .as_ref()
                .map(|storage| Expr::raw(storage.as_str().trim())),
            common,
            is_v2: child.is_some_and(|c| c.is_v2),
            dynamic: scope.is_dynamic(),
            extra_info: unit.extra_info_for(node.span),
        }));
        self.close(&node.name, node.span)
    }

    fn conditional(
        &mut self,
        node: &ConditionalBlock,
        scope: &Scope,
        out: &mut Vec<Stmt>,
    ) -> Result<(), LowerError> {
        self.next_id();
        self.open("If", node.span);

        if node.branches.is_empty() {
            return Err(imbalance("conditional block without branches".into(), node.span));
        }
        let last = node.branches.len() - 1;
        let elses: Vec<_> = node
            .branches
            .iter()
            .enumerate()
            .filter(|(_, branch)| branch.condition.is_none())
            .collect();
        match elses.as_slice() {
            [_, (_, second), ..] => {
                return Err(imbalance("conditional block has two else branches".into(), second.span));
            }
            [(position, branch)] if *position != last => {
                return Err(imbalance(
                    "else branch is followed by further branches".into(),
                    branch.span,
                ));
            }
            _ => {}
        }

        let mut branches = Vec::with_capacity(node.branches.len());
        for branch in &node.branches {
            let condition = branch
                .condition
                .as_ref()
                .map(|condition| Expr::raw(condition.as_str().trim()));
            branches.push((condition, self.lower_nodes(&branch.children, scope)?));
        }

        out.extend(self.emitter.conditional(ConditionalParts {
            receiver: scope.receiver_expr(),
            branches,
        }));
        self.close("If", node.span)
    }

    fn iteration(
        &mut self,
        node: &IterationBlock,
        scope: &Scope,
        out: &mut Vec<Stmt>,
    ) -> Result<(), LowerError> {
        let id = self.next_id();
        let name = node.kind.as_str();
        self.open(name, node.span);

        let resolved = iteration::resolve(node, self.emitter.requires_key())?;
        let key_has_index = resolved.key_has_index();
        let generator = match resolved.generator {
            Some(generator) => {
                let inner = scope
                    .enter_dynamic()
                    .with_bindings(generator.params.iter().cloned());
                Some(GeneratorParts {
                    item: generator.params.first().cloned(),
                    index: generator.params.get(1).cloned(),
                    body: self.lower_nodes(&generator.body, &inner)?,
                })
            }
            None => None,
        };

        out.extend(self.emitter.iteration(IterationParts {
            kind: node.kind,
            id,
            receiver: scope.receiver_expr(),
            source: Expr::raw(resolved.source.as_str().trim()),
            key_has_index,
            key: resolved.key.map(|key| Expr::raw(key.as_str().trim())),
            generator,
        }));
        self.close(name, node.span)
    }
}

/// Lowers one property of a component's argument object. The flag reports whether the
/// value is a wrapper reference, which must not be refreshed on re-render.
fn component_arg(
    arg: &PropertyArg,
    child: Option<&ChildFacts>,
    scope: &Scope,
    span: Span,
) -> Result<(Expr, bool), LowerError> {
    if let Some(reference) = link_argument(arg.value.as_str(), scope, span)? {
        return Ok((reference, true));
    }

    let takes_reference = child
        .and_then(|child| child.roles.get(&arg.name))
        .is_some_and(MemberRole::takes_reference);
    if takes_reference {
        let source = arg
            .value
            .as_str()
            .trim()
            .strip_prefix("this.")
            .and_then(|name| scope.member(name))
            .filter(|member| member.role.is_wrapped());
        if let Some(member) = source {
            return Ok((Expr::this_prop(member.backing_field()), true));
        }
    }

    let value = rewrite_two_way(arg.value.as_str().trim(), scope, span)?;
    Ok((Expr::raw(value), false))
}

fn imbalance(detail: String, span: Span) -> LowerError {
    LowerError::new(LowerErrorKind::StructuralImbalance { detail }, span)
}
