//! Expression AST.

use smol_str::SmolStr;

/// A parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(SmolStr),
    /// A free variable reference, resolved at evaluation time.
    Name(SmolStr),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// A call of a name bound in the evaluation's function table.
    Call {
        name: SmolStr,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    /// Operator spelling, used in error messages.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}

/// Collect the ordered, first-occurrence list of names an expression
/// references. Call targets count as dependencies too: whether a name
/// binds as a variable or a callable is only known once it resolves.
pub fn free_names(expr: &Expr) -> Vec<SmolStr> {
    let mut names = Vec::new();
    walk_names(expr, &mut names);
    names
}

fn walk_names(expr: &Expr, names: &mut Vec<SmolStr>) {
    match expr {
        Expr::Name(name) => {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        Expr::Call { name, args } => {
            if !names.contains(name) {
                names.push(name.clone());
            }
            for arg in args {
                walk_names(arg, names);
            }
        }
        Expr::Unary { operand, .. } => walk_names(operand, names),
        Expr::Binary { lhs, rhs, .. } => {
            walk_names(lhs, names);
            walk_names(rhs, names);
        }
        _ => {}
    }
}
