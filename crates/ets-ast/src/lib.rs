//! Declaration and composition tree for ETS components.
//!
//! This crate is the hand-off point between a front end that parses `.ets` sources and
//! the lowering pass in `ets-lowering`. It models:
//! - top-level items ([`SourceUnit`], [`ComponentDecl`], [`FunctionDecl`], [`EnumDecl`])
//! - component members with their raw decorator lists ([`MemberDecl`], [`Decorator`])
//! - the composition tree of `build()` and builder bodies ([`CompositionNode`])
//!
//! With the `serde` feature enabled, units can be read from the JSON interchange format
//! with [`load_unit`].
//!
//! # Example
//!
//! ```
//! use ets_ast::{BuiltinInvocation, ComponentDecl, Decorator, MemberDecl, SourceUnit, TypeRef};
//!
//! let component = ComponentDecl::new("Counter")
//!     .with_member(
//!         MemberDecl::property("count", Some(TypeRef::Number), Some("0"))
//!             .with_decorator(Decorator::new("State")),
//!     )
//!     .with_build(vec![BuiltinInvocation::new("Text").arg("this.count").into()]);
//!
//! let unit = SourceUnit::new("Counter.ets").with_item(component);
//! assert_eq!(unit.components().count(), 1);
//! ```

mod ast;
mod composition;
mod error;

pub use ast::*;
pub use composition::*;
pub use error::{LoadError, LoadErrorKind};
pub use ets_span::Span;

/// Reads a unit from its JSON interchange form.
#[cfg(feature = "serde")]
pub fn load_unit(json: &str) -> Result<SourceUnit, LoadError> {
    let unit: SourceUnit = serde_json::from_str(json).map_err(|err| {
        LoadError::new(
            LoadErrorKind::Malformed {
                message: err.to_string(),
                line: err.line(),
                column: err.column(),
            },
            Span::default(),
        )
    })?;
    if unit.file_name.trim().is_empty() {
        return Err(LoadError::new(LoadErrorKind::MissingFileName, Span::default()));
    }
    Ok(unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_lookup_skips_builder_methods() {
        let component = ComponentDecl::new("Page")
            .with_member(
                MemberDecl::method(
                    "build",
                    Vec::new(),
                    MethodBody::Composition(vec![CompositionNode::statement("console.log(1)")]),
                )
                .with_decorator(Decorator::new("Builder")),
            )
            .with_build(vec![BuiltinInvocation::new("Row").with_block().into()]);

        let build = component.build().unwrap();
        assert_eq!(build.len(), 1);
        assert!(matches!(&build[0], CompositionNode::Builtin(b) if b.name == "Row"));
    }

    #[test]
    fn test_component_kind() {
        let v2 = ComponentDecl {
            decorators: vec![Decorator::new("ComponentV2")],
            ..ComponentDecl::new("Card")
        };
        assert_eq!(v2.kind(), ComponentKind::ComponentV2);
        assert_eq!(ComponentDecl::new("Card").kind(), ComponentKind::Component);
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(Expr::from("'PropA'").string_literal(), Some("PropA"));
        assert_eq!(Expr::from("\"x\"").string_literal(), Some("x"));
        assert_eq!(Expr::from("this.key").string_literal(), None);
        assert_eq!(Expr::from("'").string_literal(), None);
    }

    #[test]
    fn test_builtin_child_opens_block() {
        let node = BuiltinInvocation::new("Column").child(BuiltinInvocation::new("Text"));
        assert_eq!(node.children.as_ref().map(Vec::len), Some(1));
        assert!(BuiltinInvocation::new("Image").children.is_none());
    }
}
