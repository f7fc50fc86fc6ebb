use std::fmt;

use smol_str::SmolStr;

use crate::parser::lexer::Token;

/// A 1-indexed line/column pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pos {
    pub line: u32,
    pub column: u32,
}

/// The source region an AST node was parsed from. `end` is exclusive: it
/// names the position just past the node's last token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub start: Pos,
    pub end: Pos,
}

impl Location {
    /// The location covering a single token.
    pub fn of(token: &Token) -> Self {
        let start = Pos {
            line: token.line,
            column: token.column,
        };
        let end = Pos {
            line: token.line,
            column: token.column + token.size() as u32,
        };
        Self { start, end }
    }

    /// The location running from the start of `start` to the end of `end`.
    pub fn span(start: Location, end: Location) -> Self {
        Self {
            start: start.start,
            end: end.end,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub loc: Location,
}

/// Statements compare structurally; locations are ignored so that round
/// trips through the pretty printer stay equal.
impl PartialEq for Stmt {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Print(Expr),
    Println(Expr),
    Assign { name: SmolStr, value: Expr },
    LocalAssign { name: SmolStr, value: Expr },
    If(If),
    While(While),
    For(For),
    FuncDecl(FuncDecl),
    Ret(Expr),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct If {
    pub cond: Expr,
    pub then: Vec<Stmt>,
    pub elifs: Vec<Elif>,
    pub else_: Option<Vec<Stmt>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Elif {
    pub cond: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct While {
    pub cond: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct For {
    pub var: SmolStr,
    pub start: Expr,
    pub end: Expr,
    pub step: Option<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub name: SmolStr,
    pub params: Vec<SmolStr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub loc: Location,
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Number(f64),
    String(SmolStr),
    Bool(bool),
    Ident(SmolStr),
    Grouping(Box<Expr>),
    Prefix(PrefixExpr),
    Infix(InfixExpr),
    Call(Call),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrefixExpr {
    pub op: PrefixOp,
    pub expr: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOp {
    Neg,
    Sign,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InfixExpr {
    pub op: InfixOp,
    pub lhs: Box<Expr>,
    pub rhs: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: SmolStr,
    pub args: Vec<Expr>,
}

impl PrefixOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            PrefixOp::Neg => "-",
            PrefixOp::Sign => "+",
            PrefixOp::Not => "~",
        }
    }
}

impl InfixOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            InfixOp::Add => "+",
            InfixOp::Sub => "-",
            InfixOp::Mul => "*",
            InfixOp::Div => "/",
            InfixOp::Mod => "%",
            InfixOp::Pow => "^",
            InfixOp::Eq => "==",
            InfixOp::Ne => "~=",
            InfixOp::Lt => "<",
            InfixOp::Gt => ">",
            InfixOp::Le => "<=",
            InfixOp::Ge => ">=",
            InfixOp::And => "and",
            InfixOp::Or => "or",
        }
    }
}

// The pretty printer below regenerates parseable source text. Reparsing its
// output yields a structurally equal AST.

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.body {
            write_stmt(f, stmt, 0)?;
        }
        Ok(())
    }
}

fn write_block(f: &mut fmt::Formatter<'_>, body: &[Stmt], indent: usize) -> fmt::Result {
    for stmt in body {
        write_stmt(f, stmt, indent)?;
    }
    Ok(())
}

fn write_stmt(f: &mut fmt::Formatter<'_>, stmt: &Stmt, indent: usize) -> fmt::Result {
    let pad = "  ".repeat(indent);
    match &stmt.kind {
        StmtKind::Print(e) => writeln!(f, "{pad}print {e}"),
        StmtKind::Println(e) => writeln!(f, "{pad}println {e}"),
        StmtKind::Assign { name, value } => writeln!(f, "{pad}{name} := {value}"),
        StmtKind::LocalAssign { name, value } => writeln!(f, "{pad}local {name} := {value}"),
        StmtKind::Ret(e) => writeln!(f, "{pad}ret {e}"),
        StmtKind::Expr(e) => writeln!(f, "{pad}{e}"),
        StmtKind::If(if_) => {
            writeln!(f, "{pad}if {} then", if_.cond)?;
            write_block(f, &if_.then, indent + 1)?;
            for elif in &if_.elifs {
                writeln!(f, "{pad}elif {} then", elif.cond)?;
                write_block(f, &elif.body, indent + 1)?;
            }
            if let Some(else_) = &if_.else_ {
                writeln!(f, "{pad}else")?;
                write_block(f, else_, indent + 1)?;
            }
            writeln!(f, "{pad}end")
        }
        StmtKind::While(while_) => {
            writeln!(f, "{pad}while {} do", while_.cond)?;
            write_block(f, &while_.body, indent + 1)?;
            writeln!(f, "{pad}end")
        }
        StmtKind::For(for_) => {
            write!(f, "{pad}for {} := {}, {}", for_.var, for_.start, for_.end)?;
            if let Some(step) = &for_.step {
                write!(f, ", {step}")?;
            }
            writeln!(f, " do")?;
            write_block(f, &for_.body, indent + 1)?;
            writeln!(f, "{pad}end")
        }
        StmtKind::FuncDecl(decl) => {
            write!(f, "{pad}func {}(", decl.name)?;
            for (i, param) in decl.params.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{param}")?;
            }
            writeln!(f, ")")?;
            write_block(f, &decl.body, indent + 1)?;
            writeln!(f, "{pad}end")
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Number(n) => write!(f, "{n}"),
            ExprKind::String(s) => {
                write!(f, "\"")?;
                for c in s.chars() {
                    match c {
                        '\n' => write!(f, "\\n")?,
                        '\t' => write!(f, "\\t")?,
                        '"' => write!(f, "\\\"")?,
                        c => write!(f, "{c}")?,
                    }
                }
                write!(f, "\"")
            }
            ExprKind::Bool(b) => write!(f, "{b}"),
            ExprKind::Ident(name) => write!(f, "{name}"),
            ExprKind::Grouping(inner) => write!(f, "({inner})"),
            ExprKind::Prefix(prefix) => {
                // `--x` would lex as a comment, so keep nested negations apart.
                let sep = match &prefix.expr.kind {
                    ExprKind::Prefix(inner)
                        if prefix.op == PrefixOp::Neg && inner.op == PrefixOp::Neg =>
                    {
                        " "
                    }
                    _ => "",
                };
                write!(f, "{}{sep}{}", prefix.op.symbol(), prefix.expr)
            }
            ExprKind::Infix(infix) => {
                write!(f, "{} {} {}", infix.lhs, infix.op.symbol(), infix.rhs)
            }
            ExprKind::Call(call) => {
                write!(f, "{}(", call.name)?;
                for (i, arg) in call.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}
