//! Options controlling how a unit is lowered.

/// Which emission strategy drives the composition rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UpdateMode {
    /// Eager, id-string based re-rendering of whole subtrees.
    Legacy,
    /// Closure-based fine-grained updates keyed by runtime element ids.
    #[default]
    Partial,
}

impl UpdateMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateMode::Legacy => "legacy",
            UpdateMode::Partial => "partial",
        }
    }
}

impl std::fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an entry component without a static route name is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RouteMode {
    /// `loadDocument(new Page(...))`
    #[default]
    Load,
    /// `registerNamedRoute(() => new Page(...), "", { ... })`
    NamedRoute,
}

/// Options for [`crate::lower_unit`].
#[derive(Debug, Clone)]
pub struct LowerOptions {
    /// Requested update mode. Units containing `@ComponentV2` always lower in
    /// [`UpdateMode::Partial`].
    pub mode: UpdateMode,
    /// Overrides the unit's file name for generated ids and `extraInfo`.
    pub file_name: Option<String>,
    /// Entry start-up form when no route name is known.
    pub route: RouteMode,
    /// Bundle name recorded in named-route page info.
    pub bundle_name: Option<String>,
    /// Module name recorded in named-route page info.
    pub module_name: Option<String>,
    /// Page path recorded in named-route page info; defaults to the file stem.
    pub page_path: Option<String>,
    /// Builtins closed with `pop()` in addition to the known containers.
    pub extra_containers: Vec<String>,
    /// Pass `{ page, line, col }` to child component constructors in partial mode.
    pub extra_info: bool,
}

impl Default for LowerOptions {
    fn default() -> Self {
        Self {
            mode: UpdateMode::default(),
            file_name: None,
            route: RouteMode::default(),
            bundle_name: None,
            module_name: None,
            page_path: None,
            extra_containers: Vec::new(),
            extra_info: true,
        }
    }
}

impl LowerOptions {
    pub fn legacy() -> Self {
        Self {
            mode: UpdateMode::Legacy,
            ..Self::default()
        }
    }

    pub fn partial() -> Self {
        Self::default()
    }
}
