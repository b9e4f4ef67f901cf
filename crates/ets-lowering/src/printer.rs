//! Text rendering of the output IR.
//!
//! Layout follows the TypeScript emitter the runtime was built against: four-space
//! indentation, `else` on its own line, short objects and callbacks kept on one line.

use crate::js::{Arrow, ArrowBody, Class, Else, Expr, Function, If, Item, Method, MethodKind, Module, Param, Stmt};

const INDENT: &str = "    ";

/// Renders a whole module, starting with the strict-mode directive.
pub fn print_module(module: &Module) -> String {
    let mut printer = Printer::default();
    printer.line("\"use strict\";");
    for item in &module.items {
        printer.item(item);
    }
    printer.out
}

/// Renders a statement list at indentation level zero.
pub fn print_stmts(stmts: &[Stmt]) -> String {
    let mut printer = Printer::default();
    printer.stmts(stmts);
    printer.out
}

/// Renders a single expression.
pub fn print_expr(expr: &Expr) -> String {
    let mut printer = Printer::default();
    printer.expr(expr);
    printer.out
}

#[derive(Default)]
struct Printer {
    out: String,
    depth: usize,
}

impl Printer {
    fn pad(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
    }

    fn line(&mut self, text: &str) {
        self.pad();
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn item(&mut self, item: &Item) {
        match item {
            Item::Class(class) => self.class(class),
            Item::Function(function) => self.function(function),
            Item::Stmt(stmt) => self.stmt(stmt),
        }
    }

    fn class(&mut self, class: &Class) {
        self.pad();
        self.out.push_str("class ");
        self.out.push_str(&class.name);
        if let Some(base) = &class.extends {
            self.out.push_str(" extends ");
            self.out.push_str(base);
        }
        self.out.push_str(" {\n");
        self.depth += 1;
        for method in &class.members {
            self.method(method);
        }
        self.depth -= 1;
        self.line("}");
    }

    fn method(&mut self, method: &Method) {
        self.pad();
        if method.is_static {
            self.out.push_str("static ");
        }
        match method.kind {
            MethodKind::Getter => self.out.push_str("get "),
            MethodKind::Setter => self.out.push_str("set "),
            MethodKind::Constructor | MethodKind::Method => {}
        }
        self.out.push_str(&method.name);
        self.param_list(&method.params, true);
        self.out.push(' ');
        self.block(&method.body);
        self.out.push('\n');
    }

    fn function(&mut self, function: &Function) {
        self.pad();
        self.out.push_str("function ");
        self.out.push_str(&function.name);
        self.param_list(&function.params, true);
        self.out.push(' ');
        self.block(&function.body);
        self.out.push('\n');
    }

    fn param_list(&mut self, params: &[Param], force_parens: bool) {
        let bare = !force_parens && params.len() == 1 && params[0].default.is_none();
        if !bare {
            self.out.push('(');
        }
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.out.push_str(&param.name);
            if let Some(default) = &param.default {
                self.out.push_str(" = ");
                self.expr(default);
            }
        }
        if !bare {
            self.out.push(')');
        }
    }

    /// Prints `{ ... }` with the opening brace on the current line and the closing
    /// brace at the current depth, without a trailing newline.
    fn block(&mut self, stmts: &[Stmt]) {
        self.out.push_str("{\n");
        self.depth += 1;
        self.stmts(stmts);
        self.depth -= 1;
        self.pad();
        self.out.push('}');
    }

    fn stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Raw(text) => self.raw_lines(text),
            Stmt::If(node) => {
                self.pad();
                self.if_stmt(node);
            }
            _ => {
                self.pad();
                self.stmt_inline(stmt);
                self.out.push('\n');
            }
        }
    }

    /// Prints a statement starting at the current position (no leading padding).
    fn stmt_inline(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(expr) => {
                self.expr(expr);
                self.out.push(';');
            }
            Stmt::Let(name, init) => self.decl("let", name, init),
            Stmt::Const(name, init) => self.decl("const", name, init),
            Stmt::Block(stmts) => self.block(stmts),
            Stmt::Return(value) => {
                self.out.push_str("return");
                if let Some(value) = value {
                    self.out.push(' ');
                    self.expr(value);
                }
                self.out.push(';');
            }
            Stmt::Try { body, finalizer } => {
                self.out.push_str("try ");
                self.block(body);
                self.out.push('\n');
                self.pad();
                self.out.push_str("finally ");
                self.block(finalizer);
            }
            Stmt::If(node) => {
                // `if` inside an inline arrow body
                self.out.push_str("if (");
                self.expr(&node.cond);
                self.out.push_str(") { ");
                for inner in &node.then {
                    self.stmt_inline(inner);
                    self.out.push(' ');
                }
                self.out.push('}');
            }
            Stmt::Raw(text) => self.out.push_str(text.trim()),
        }
    }

    fn decl(&mut self, keyword: &str, name: &str, init: &Expr) {
        self.out.push_str(keyword);
        self.out.push(' ');
        self.out.push_str(name);
        self.out.push_str(" = ");
        self.expr(init);
        self.out.push(';');
    }

    fn if_stmt(&mut self, node: &If) {
        self.out.push_str("if (");
        self.expr(&node.cond);
        self.out.push_str(") ");
        self.block(&node.then);
        self.out.push('\n');
        if let Some(otherwise) = &node.otherwise {
            self.pad();
            self.out.push_str("else ");
            match otherwise.as_ref() {
                Else::If(next) => self.if_stmt(next),
                Else::Block(stmts) => {
                    self.block(stmts);
                    self.out.push('\n');
                }
            }
        }
    }

    /// Prints verbatim text, re-indenting continuation lines relative to the current
    /// depth.
    fn raw_lines(&mut self, text: &str) {
        let text = text.trim_matches('\n');
        let mut lines = text.lines();
        let Some(first) = lines.next() else {
            return;
        };
        self.pad();
        self.out.push_str(first.trim());
        self.out.push('\n');
        let rest: Vec<&str> = lines.collect();
        let common = common_indent(&rest);
        for line in rest {
            if line.trim().is_empty() {
                self.out.push('\n');
                continue;
            }
            self.pad();
            self.out.push_str(line.get(common..).unwrap_or(line.trim_start()));
            self.out.push('\n');
        }
    }

    fn raw_expr(&mut self, text: &str) {
        let text = text.trim();
        let mut lines = text.lines();
        let Some(first) = lines.next() else {
            return;
        };
        self.out.push_str(first);
        let rest: Vec<&str> = lines.collect();
        if rest.is_empty() {
            return;
        }
        // The last line is usually the closing bracket and sits at the base indentation.
        let common = common_indent(&rest);
        for line in rest {
            self.out.push('\n');
            if line.trim().is_empty() {
                continue;
            }
            self.pad();
            self.out.push_str(line.get(common..).unwrap_or(line.trim_start()));
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Raw(text) => self.raw_expr(text),
            Expr::Id(name) => self.out.push_str(name),
            Expr::This => self.out.push_str("this"),
            Expr::Str(value) => self.string(value),
            Expr::Prop(object, name) => {
                self.expr(object);
                self.out.push('.');
                self.out.push_str(name);
            }
            Expr::Call(callee, args) => {
                self.expr(callee);
                self.args(args);
            }
            Expr::New(callee, args) => {
                self.out.push_str("new ");
                self.expr(callee);
                self.args(args);
            }
            Expr::Arrow(arrow) => self.arrow(arrow),
            Expr::Object(props) => self.object(props),
            Expr::Array(items) => {
                self.out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.expr(item);
                }
                self.out.push(']');
            }
            Expr::Binary(left, op, right) => {
                self.expr(left);
                self.out.push(' ');
                self.out.push_str(op);
                self.out.push(' ');
                self.expr(right);
            }
            Expr::Cond(test, then, otherwise) => {
                self.expr(test);
                self.out.push_str(" ? ");
                self.expr(then);
                self.out.push_str(" : ");
                self.expr(otherwise);
            }
            Expr::Paren(inner) => {
                self.out.push('(');
                self.expr(inner);
                self.out.push(')');
            }
            Expr::Assign(target, value) => {
                self.expr(target);
                self.out.push_str(" = ");
                self.expr(value);
            }
            Expr::Unary(op, operand) => {
                self.out.push_str(op);
                if op.chars().all(|c| c.is_ascii_alphabetic()) {
                    self.out.push(' ');
                }
                self.expr(operand);
            }
        }
    }

    fn args(&mut self, args: &[Expr]) {
        self.out.push('(');
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.expr(arg);
        }
        self.out.push(')');
    }

    fn string(&mut self, value: &str) {
        self.out.push('"');
        for c in value.chars() {
            match c {
                '"' => self.out.push_str("\\\""),
                '\\' => self.out.push_str("\\\\"),
                '\n' => self.out.push_str("\\n"),
                '\r' => self.out.push_str("\\r"),
                '\t' => self.out.push_str("\\t"),
                c => self.out.push(c),
            }
        }
        self.out.push('"');
    }

    fn arrow(&mut self, arrow: &Arrow) {
        self.param_list(&arrow.params, false);
        self.out.push_str(" => ");
        match &arrow.body {
            ArrowBody::Expr(body) => {
                if matches!(body, Expr::Object(_)) {
                    self.out.push('(');
                    self.expr(body);
                    self.out.push(')');
                } else {
                    self.expr(body);
                }
            }
            ArrowBody::Block(stmts) if arrow.inline => {
                self.out.push_str("{ ");
                for stmt in stmts {
                    self.stmt_inline(stmt);
                    self.out.push(' ');
                }
                self.out.push('}');
            }
            ArrowBody::Block(stmts) => self.block(stmts),
        }
    }

    fn object(&mut self, props: &[crate::js::Property]) {
        if props.is_empty() {
            self.out.push_str("{}");
            return;
        }
        if !props.iter().any(|p| spans_lines(&p.value)) {
            self.out.push_str("{ ");
            for (i, prop) in props.iter().enumerate() {
                if i > 0 {
                    self.out.push_str(", ");
                }
                self.out.push_str(&prop.key);
                self.out.push_str(": ");
                self.expr(&prop.value);
            }
            self.out.push_str(" }");
            return;
        }
        self.out.push_str("{\n");
        self.depth += 1;
        for (i, prop) in props.iter().enumerate() {
            self.pad();
            self.out.push_str(&prop.key);
            self.out.push_str(": ");
            self.expr(&prop.value);
            if i + 1 < props.len() {
                self.out.push(',');
            }
            self.out.push('\n');
        }
        self.depth -= 1;
        self.pad();
        self.out.push('}');
    }
}

/// Whether an expression prints across several lines.
fn spans_lines(expr: &Expr) -> bool {
    match expr {
        Expr::Raw(text) => text.trim().contains('\n'),
        Expr::Arrow(arrow) => match &arrow.body {
            ArrowBody::Block(_) => !arrow.inline,
            ArrowBody::Expr(body) => spans_lines(body),
        },
        Expr::Object(props) => props.iter().any(|p| spans_lines(&p.value)),
        Expr::Array(items) => items.iter().any(spans_lines),
        Expr::Prop(inner, _) | Expr::Paren(inner) | Expr::Unary(_, inner) => spans_lines(inner),
        Expr::Call(callee, args) | Expr::New(callee, args) => {
            spans_lines(callee) || args.iter().any(spans_lines)
        }
        Expr::Binary(left, _, right) | Expr::Assign(left, right) => {
            spans_lines(left) || spans_lines(right)
        }
        Expr::Cond(a, b, c) => spans_lines(a) || spans_lines(b) || spans_lines(c),
        Expr::Id(_) | Expr::This | Expr::Str(_) => false,
    }
}

fn common_indent(lines: &[&str]) -> usize {
    lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0)
}
