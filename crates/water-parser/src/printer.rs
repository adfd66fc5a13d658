//! Source-like rendering of the AST, used by `water --prettyprint`.
//!
//! Declarations and statements are printed one per line with tab
//! indentation per nesting level; expressions print on a single line.

use std::fmt::{self, Write};

use crate::ast::*;

/// Render a whole program.
pub fn pretty_print(program: &Program<'_>) -> String {
    let mut printer = Printer::default();
    printer.program(program);
    printer.out
}

#[derive(Default)]
struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn line(&mut self, text: impl fmt::Display) {
        for _ in 0..self.indent {
            self.out.push('\t');
        }
        let _ = writeln!(self.out, "{}", text);
    }

    fn open(&mut self, header: impl fmt::Display) {
        self.line(format_args!("{} {{", header));
        self.indent += 1;
    }

    fn close(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        self.line("}");
    }

    fn program(&mut self, program: &Program<'_>) {
        if let Some(package) = &program.package {
            self.line(format_args!("package {};", package));
        }
        for import in program.imports {
            self.line(format_args!("import {};", import.path));
        }
        for decl in program.decls {
            self.decl(decl);
        }
    }

    fn decl(&mut self, decl: &Decl<'_>) {
        match decl {
            Decl::Function(f) => {
                let mut header = format!("{}function {}({})", modifiers(&f.modifiers), f.name, params(f.params));
                if let Some(ret) = &f.return_type {
                    let _ = write!(header, " -> {}", ret);
                }
                if !f.throws.is_empty() {
                    let _ = write!(header, " throws {}", join(f.throws));
                }
                match f.body {
                    FunctionBody::Block(block) => self.block(header, block),
                    FunctionBody::Expr(expr) => self.line(format_args!("{} = {};", header, expr)),
                }
            }
            Decl::Constructor(c) => {
                let mut header = format!("{}constructor({})", modifiers(&c.modifiers), params(c.params));
                if let Some(args) = c.super_args {
                    let _ = write!(header, " : ({})", join(args));
                }
                self.block(header, c.body);
            }
            Decl::Class(c) => {
                let mut header = format!("{}class {}", modifiers(&c.modifiers), c.name);
                if let Some(sup) = &c.superclass {
                    let _ = write!(header, " : {}", sup);
                }
                self.open(header);
                for member in c.members {
                    self.decl(member);
                }
                self.close();
            }
            Decl::Enum(e) => {
                self.open(format_args!("{}enum {}", modifiers(&e.modifiers), e.name));
                if !e.constants.is_empty() {
                    self.line(join(e.constants));
                }
                self.close();
            }
            Decl::Var(v) => self.line(var_decl(v)),
        }
    }

    fn block(&mut self, header: impl fmt::Display, block: &Block<'_>) {
        self.open(header);
        for stmt in block.stmts {
            self.stmt(stmt);
        }
        self.close();
    }

    /// Print a statement used as the body of `if`/`while`/`for`.
    fn body(&mut self, header: String, stmt: &Stmt<'_>) {
        match stmt {
            Stmt::Block(block) => self.block(header, block),
            other => {
                self.line(header);
                self.indent += 1;
                self.stmt(other);
                self.indent -= 1;
            }
        }
    }

    fn stmt(&mut self, stmt: &Stmt<'_>) {
        match stmt {
            Stmt::Block(block) => {
                self.line("{");
                self.indent += 1;
                for s in block.stmts {
                    self.stmt(s);
                }
                self.close();
            }
            Stmt::If(s) => {
                self.body(format!("if ({})", s.condition), &s.then_branch);
                if let Some(else_branch) = &s.else_branch {
                    self.body("else".to_string(), else_branch);
                }
            }
            Stmt::While(s) => self.body(format!("while ({})", s.condition), &s.body),
            Stmt::For(s) => {
                let init = match s.init {
                    ForInit::Var(v) => var_decl(v),
                    ForInit::Expr(e) => format!("{};", e),
                };
                self.body(format!("for ({} {}; {})", init, s.condition, s.update), &s.body);
            }
            Stmt::Return(s) => match s.value {
                Some(value) => self.line(format_args!("return {};", value)),
                None => self.line("return;"),
            },
            Stmt::Throw(s) => self.line(format_args!("throw {};", s.value)),
            Stmt::Try(s) => {
                self.block("try", s.body);
                for catch in s.catches {
                    self.block(format!("catch ({}: {})", catch.binding, catch.ty), catch.body);
                }
                if let Some(finally) = s.finally {
                    self.block("finally", finally);
                }
            }
            Stmt::Var(v) => self.line(var_decl(v)),
            Stmt::Expr(s) => self.line(format_args!("{};", s.expr)),
        }
    }
}

fn modifiers(m: &Modifiers<'_>) -> String {
    let mut out = String::new();
    match m.access {
        Some(Access::Public) => out.push_str("public "),
        Some(Access::Private) => out.push_str("private "),
        None => {}
    }
    if m.is_static() {
        out.push_str("static ");
    }
    out
}

fn params(params: &[Param<'_>]) -> String {
    params
        .iter()
        .map(|p| format!("{}: {}", p.name, p.ty))
        .collect::<Vec<_>>()
        .join(", ")
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
}

fn var_decl(v: &VarDecl<'_>) -> String {
    let mut out = format!(
        "{}{} {}",
        modifiers(&v.modifiers),
        if v.is_const { "const" } else { "var" },
        v.name
    );
    if let Some(ty) = &v.ty {
        let _ = write!(out, ": {}", ty);
    }
    if let Some(init) = v.init {
        let _ = write!(out, " = {}", init);
    }
    out.push(';');
    out
}

impl fmt::Display for Expr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(lit) => match lit.kind {
                LiteralKind::Number(text) => f.write_str(text),
                LiteralKind::String(_) | LiteralKind::Char(_) => f.write_str(lit.token.lexeme),
                LiteralKind::Bool(b) => write!(f, "{}", b),
                LiteralKind::Null => f.write_str("null"),
            },
            Expr::Ident(ident) => f.write_str(ident.name),
            Expr::This(_) => f.write_str("this"),
            Expr::Binary(b) => write!(f, "{} {} {}", b.left, b.op, b.right),
            Expr::Unary(u) => write!(f, "{}{}", u.op, u.operand),
            Expr::Postfix(p) => write!(f, "{}{}", p.operand, p.op),
            Expr::NonNull(n) => write!(f, "{}!", n.operand),
            Expr::Assign(a) => write!(f, "{} {} {}", a.target, a.op, a.value),
            Expr::Call(c) => write!(f, "{}({})", c.name, join(c.args)),
            Expr::MethodCall(m) => write!(
                f,
                "{}{}{}({})",
                m.receiver,
                if m.null_safe { "?." } else { "." },
                m.name,
                join(m.args)
            ),
            Expr::SuperCall(s) => write!(f, "super.{}({})", s.name, join(s.args)),
            Expr::Member(m) => write!(f, "{}{}{}", m.object, if m.null_safe { "?." } else { "." }, m.name),
            Expr::Index(i) => write!(f, "{}{}{}]", i.object, if i.null_safe { "?[" } else { "[" }, i.index),
            Expr::New(n) => write!(f, "new {}({})", n.ty, join(n.args)),
            Expr::NewArray(n) => {
                write!(f, "new {}", n.element)?;
                for size in n.sizes {
                    write!(f, "[{}]", size)?;
                }
                Ok(())
            }
            Expr::Cast(c) => write!(f, "{} as {}", c.expr, c.ty),
            Expr::InstanceOf(i) => write!(f, "{} instanceof {}", i.expr, i.ty),
            Expr::Paren(p) => write!(f, "({})", p.expr),
        }
    }
}
