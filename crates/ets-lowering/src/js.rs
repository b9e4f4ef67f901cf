//! Output IR: the imperative JavaScript the lowering pass emits.
//!
//! The core hands back ordered statement lists per method rather than text. Anything
//! the pass does not need to look inside (user expressions, plain method bodies) travels
//! as `Raw` and is printed verbatim by [`crate::printer`].

use smol_str::SmolStr;

/// An expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Verbatim source text.
    Raw(String),
    Id(SmolStr),
    This,
    /// A string literal; printed double-quoted.
    Str(String),
    Prop(Box<Expr>, SmolStr),
    Call(Box<Expr>, Vec<Expr>),
    New(Box<Expr>, Vec<Expr>),
    Arrow(Box<Arrow>),
    Object(Vec<Property>),
    Array(Vec<Expr>),
    Binary(Box<Expr>, &'static str, Box<Expr>),
    Cond(Box<Expr>, Box<Expr>, Box<Expr>),
    Paren(Box<Expr>),
    Assign(Box<Expr>, Box<Expr>),
    /// Prefix operator such as `typeof` or `!`.
    Unary(&'static str, Box<Expr>),
}

impl Expr {
    pub fn raw(text: impl Into<String>) -> Self {
        Expr::Raw(text.into())
    }

    pub fn id(name: impl Into<SmolStr>) -> Self {
        Expr::Id(name.into())
    }

    pub fn str(value: impl Into<String>) -> Self {
        Expr::Str(value.into())
    }

    pub fn undefined() -> Self {
        Expr::id("undefined")
    }

    /// `this.<name>`
    pub fn this_prop(name: impl Into<SmolStr>) -> Self {
        Expr::This.prop(name)
    }

    pub fn prop(self, name: impl Into<SmolStr>) -> Self {
        Expr::Prop(Box::new(self), name.into())
    }

    pub fn call(self, args: Vec<Expr>) -> Self {
        Expr::Call(Box::new(self), args)
    }

    /// `<self>.<method>(args)`
    pub fn method(self, method: impl Into<SmolStr>, args: Vec<Expr>) -> Self {
        self.prop(method).call(args)
    }

    pub fn new_(callee: impl Into<SmolStr>, args: Vec<Expr>) -> Self {
        Expr::New(Box::new(Expr::id(callee)), args)
    }

    pub fn binary(left: Expr, op: &'static str, right: Expr) -> Self {
        Expr::Binary(Box::new(left), op, Box::new(right))
    }

    pub fn cond(test: Expr, then: Expr, otherwise: Expr) -> Self {
        Expr::Cond(Box::new(test), Box::new(then), Box::new(otherwise))
    }

    pub fn paren(self) -> Self {
        Expr::Paren(Box::new(self))
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Expr::Assign(Box::new(target), Box::new(value))
    }

    pub fn unary(op: &'static str, operand: Expr) -> Self {
        Expr::Unary(op, Box::new(operand))
    }

    pub fn object(props: Vec<Property>) -> Self {
        Expr::Object(props)
    }

    /// An arrow function with a multi-line block body.
    pub fn arrow(params: Vec<Param>, body: Vec<Stmt>) -> Self {
        Expr::Arrow(Box::new(Arrow {
            params,
            body: ArrowBody::Block(body),
            inline: false,
        }))
    }

    /// An arrow function whose block body is printed on one line.
    pub fn arrow_inline(params: Vec<Param>, body: Vec<Stmt>) -> Self {
        Expr::Arrow(Box::new(Arrow {
            params,
            body: ArrowBody::Block(body),
            inline: true,
        }))
    }

    /// An arrow function with an expression body.
    pub fn arrow_expr(params: Vec<Param>, body: Expr) -> Self {
        Expr::Arrow(Box::new(Arrow {
            params,
            body: ArrowBody::Expr(body),
            inline: true,
        }))
    }

    pub fn stmt(self) -> Stmt {
        Stmt::Expr(self)
    }
}

/// An arrow function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arrow {
    pub params: Vec<Param>,
    pub body: ArrowBody,
    /// Print a block body on a single line.
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrowBody {
    Block(Vec<Stmt>),
    Expr(Expr),
}

/// A formal parameter with an optional default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: SmolStr,
    pub default: Option<Expr>,
}

impl Param {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    pub fn with_default(name: impl Into<SmolStr>, default: Expr) -> Self {
        Self {
            name: name.into(),
            default: Some(default),
        }
    }
}

/// Builds a parameter list from plain names.
pub fn params<I, S>(names: I) -> Vec<Param>
where
    I: IntoIterator<Item = S>,
    S: Into<SmolStr>,
{
    names.into_iter().map(Param::new).collect()
}

/// One `key: value` entry of an object literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub key: SmolStr,
    pub value: Expr,
}

impl Property {
    pub fn new(key: impl Into<SmolStr>, value: Expr) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// A statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Expr(Expr),
    Let(SmolStr, Expr),
    Const(SmolStr, Expr),
    If(If),
    Block(Vec<Stmt>),
    Return(Option<Expr>),
    /// `try { body } finally { finalizer }`
    Try { body: Vec<Stmt>, finalizer: Vec<Stmt> },
    /// Verbatim statement text, printed as written.
    Raw(String),
}

impl Stmt {
    pub fn ret(value: Option<Expr>) -> Self {
        Stmt::Return(value)
    }

    pub fn if_(cond: Expr, then: Vec<Stmt>) -> Self {
        Stmt::If(If {
            cond,
            then,
            otherwise: None,
        })
    }

    pub fn if_else(cond: Expr, then: Vec<Stmt>, otherwise: Vec<Stmt>) -> Self {
        Stmt::If(If {
            cond,
            then,
            otherwise: Some(Box::new(Else::Block(otherwise))),
        })
    }
}

/// An `if` statement; `else if` chains nest through [`Else::If`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct If {
    pub cond: Expr,
    pub then: Vec<Stmt>,
    pub otherwise: Option<Box<Else>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Else {
    If(If),
    Block(Vec<Stmt>),
}

/// Builds an `if / else if / else` chain from ordered arms.
///
/// Returns `None` when there are no conditional arms.
pub fn if_chain(arms: Vec<(Expr, Vec<Stmt>)>, otherwise: Option<Vec<Stmt>>) -> Option<Stmt> {
    let mut tail = otherwise.map(Else::Block);
    for (cond, then) in arms.into_iter().rev() {
        tail = Some(Else::If(If {
            cond,
            then,
            otherwise: tail.map(Box::new),
        }));
    }
    match tail {
        Some(Else::If(head)) => Some(Stmt::If(head)),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Constructor,
    Method,
    Getter,
    Setter,
}

/// A class method or accessor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub name: SmolStr,
    pub kind: MethodKind,
    pub is_static: bool,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
}

impl Method {
    pub fn new(name: impl Into<SmolStr>, params: Vec<Param>, body: Vec<Stmt>) -> Self {
        Self {
            name: name.into(),
            kind: MethodKind::Method,
            is_static: false,
            params,
            body,
        }
    }

    pub fn constructor(params: Vec<Param>, body: Vec<Stmt>) -> Self {
        Self {
            kind: MethodKind::Constructor,
            ..Self::new("constructor", params, body)
        }
    }

    pub fn getter(name: impl Into<SmolStr>, body: Vec<Stmt>) -> Self {
        Self {
            kind: MethodKind::Getter,
            ..Self::new(name, Vec::new(), body)
        }
    }

    pub fn setter(name: impl Into<SmolStr>, param: Param, body: Vec<Stmt>) -> Self {
        Self {
            kind: MethodKind::Setter,
            ..Self::new(name, vec![param], body)
        }
    }

    pub fn into_static(mut self) -> Self {
        self.is_static = true;
        self
    }
}

/// A class declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Class {
    pub name: SmolStr,
    pub extends: Option<SmolStr>,
    pub members: Vec<Method>,
}

/// A function declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: SmolStr,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
}

/// A top-level item of the emitted module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Class(Class),
    Function(Function),
    Stmt(Stmt),
}

/// The lowered form of one source unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Module {
    pub items: Vec<Item>,
}
