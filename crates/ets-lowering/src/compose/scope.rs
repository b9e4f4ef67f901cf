//! The scope threaded through the composition rewrite.

use std::rc::Rc;

use ets_ast::AttributeCall;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use crate::classify::Classified;
use crate::js::Expr;

/// How emitted code reaches the component instance that is rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Receiver {
    /// Inside a component method: `this`.
    This,
    /// Inside a global builder: `(parent ? parent : this)`.
    ParentOrThis,
}

/// What the rewrite knows about the component whose body is being lowered.
#[derive(Debug, Default)]
pub(crate) struct ComponentScope {
    pub name: SmolStr,
    pub members: FxHashMap<SmolStr, Classified>,
    /// `@Styles` methods by name.
    pub styles: FxHashMap<SmolStr, Vec<AttributeCall>>,
    /// `@Builder` methods whose only parameter is `$$`.
    pub by_reference_builders: FxHashSet<SmolStr>,
}

/// Lexical context for one point of the rewrite.
#[derive(Debug, Clone)]
pub(crate) struct Scope {
    receiver: Receiver,
    component: Option<Rc<ComponentScope>>,
    bindings: Vec<SmolStr>,
    /// Inside an item generator, a builder body or a trailing closure.
    dynamic: bool,
}

impl Scope {
    /// The scope of a component's own methods.
    pub fn component(component: Rc<ComponentScope>) -> Self {
        Self {
            receiver: Receiver::This,
            component: Some(component),
            bindings: Vec::new(),
            dynamic: false,
        }
    }

    /// The scope of a global `@Builder` function body.
    pub fn global_builder<I, S>(params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        Self {
            receiver: Receiver::ParentOrThis,
            component: None,
            bindings: params.into_iter().map(Into::into).collect(),
            dynamic: true,
        }
    }

    #[cfg(test)]
    pub fn for_members<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        use crate::classify::{MemberRole, WrapperKind};
        use ets_span::Span;

        let members = names
            .into_iter()
            .map(Into::into)
            .map(|name: SmolStr| {
                let member = Classified {
                    name: name.clone(),
                    role: MemberRole::State,
                    wrapper: WrapperKind::Simple,
                    watch: None,
                    builder_param: false,
                    initializer: None,
                    span: Span::default(),
                };
                (name, member)
            })
            .collect();
        Self::component(Rc::new(ComponentScope {
            name: "Test".into(),
            members,
            ..ComponentScope::default()
        }))
    }

    /// Adds enclosing variables such as builder parameters or item names.
    pub fn with_bindings<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        self.bindings.extend(names.into_iter().map(Into::into));
        self
    }

    /// A child scope for generated closures whose children are created at runtime.
    pub fn enter_dynamic(&self) -> Self {
        Self {
            dynamic: true,
            ..self.clone()
        }
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// The receiver as an expression.
    pub fn receiver_expr(&self) -> Expr {
        match self.receiver {
            Receiver::This => Expr::This,
            Receiver::ParentOrThis => {
                Expr::cond(Expr::id("parent"), Expr::id("parent"), Expr::This).paren()
            }
        }
    }

    pub fn bindings(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(SmolStr::as_str)
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.bindings.iter().any(|b| b == name)
    }

    /// Whether `this.<name>` resolves. Without a known component every name does.
    pub fn has_member(&self, name: &str) -> bool {
        self.component
            .as_ref()
            .map_or(true, |c| c.members.contains_key(name))
    }

    pub fn member(&self, name: &str) -> Option<&Classified> {
        self.component.as_ref()?.members.get(name)
    }

    /// Name of the component being lowered, if any.
    pub fn component_name(&self) -> Option<&str> {
        self.component.as_ref().map(|c| c.name.as_str())
    }

    /// Whether `this.<name>(...)` calls a builder method that takes its parameter by
    /// reference.
    pub fn builder_by_reference(&self, name: &str) -> bool {
        self.component
            .as_ref()
            .is_some_and(|c| c.by_reference_builders.contains(name))
    }

    pub fn styles(&self, name: &str) -> Option<&[AttributeCall]> {
        self.component
            .as_ref()?
            .styles
            .get(name)
            .map(Vec::as_slice)
    }
}
