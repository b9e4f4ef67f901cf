//! Decorator classification and reactive rewrite of ETS components.
//!
//! This crate lowers a declarative component tree into imperative JavaScript for the
//! ArkUI runtime. It handles:
//! - Classifying every component member into a single reactive role
//! - Synthesizing wrapper fields, accessors and lifecycle hooks per role
//! - Rewriting `build()` and builder bodies into create/update/pop sequences, either for
//!   the legacy runtime or for the partial-update runtime
//! - Lowering iteration, two-way bindings, builders, styles and extends
//! - Emitting the start-up code of the `@Entry` component
//!
//! # Example
//!
//! ```
//! use ets_ast::{BuiltinInvocation, ComponentDecl, Decorator, MemberDecl, SourceUnit, TypeRef};
//! use ets_lowering::{lower_unit, LowerOptions};
//!
//! let counter = ComponentDecl::new("Counter")
//!     .with_decorator(Decorator::new("Entry"))
//!     .with_member(
//!         MemberDecl::property("count", Some(TypeRef::Number), Some("0"))
//!             .with_decorator(Decorator::new("State")),
//!     )
//!     .with_build(vec![BuiltinInvocation::new("Text").arg("`${this.count}`").into()]);
//! let unit = SourceUnit::new("Counter.ets").with_item(counter);
//!
//! let output = lower_unit(&unit, &LowerOptions::partial()).unwrap();
//! assert!(output.code.contains("class Counter extends ViewPU {"));
//! assert!(output.code.contains("new ObservedPropertySimplePU(0, this, \"count\")"));
//! ```

mod binding;
mod builder;
mod classify;
mod component;
mod compose;
mod entry;
mod error;
mod iteration;
pub mod js;
mod lower;
mod options;
pub mod printer;
mod snippet;
mod wrapper;

pub use classify::{classify, classify_members, Classified, MemberRole, TypeEnv, WrapperKind};
pub use error::{LowerError, LowerErrorKind};
pub use lower::{lower_unit, LowerOutput};
pub use options::{LowerOptions, RouteMode, UpdateMode};
pub use wrapper::{synthesize, synthesize_v2, Synthesized, SynthesizedV2};
