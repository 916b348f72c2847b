//! Expression tree.

use std::collections::BTreeSet;

/// Name bound to the positional argument under test.
pub const IDENTIFIER: &str = "identifier";

/// Literal constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Number (sizes already scaled).
    Number(f64),
    /// String.
    Str(String),
    /// Boolean.
    Bool(bool),
}

/// Prefix operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `-`
    Neg,
}

/// Infix operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `||`
    Or,
    /// `&&`
    And,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `%%`: case-sensitive glob match.
    Glob,
    /// `%^`: case-insensitive prefix match.
    PrefixI,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
}

impl BinaryOp {
    /// Source symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Or => "||",
            Self::And => "&&",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Glob => "%%",
            Self::PrefixI => "%^",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
        }
    }
}

/// Built-in functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    /// `strlen(s)`: character count.
    StrLen,
}

impl Function {
    /// Resolve a call name.
    #[must_use]
    pub fn lookup(name: &str) -> Option<Self> {
        match name {
            "strlen" => Some(Self::StrLen),
            _ => None,
        }
    }

    /// Source name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::StrLen => "strlen",
        }
    }

    /// Required argument count.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::StrLen => 1,
        }
    }
}

/// Parsed filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Constant.
    Literal(Literal),
    /// Field reference or `identifier`.
    Var(String),
    /// Prefix operation.
    Unary(UnaryOp, Box<Expr>),
    /// Infix operation.
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    /// Function call.
    Call(Function, Vec<Expr>),
}

impl Expr {
    /// Every field the expression reads, excluding `identifier`.
    #[must_use]
    pub fn fields(&self) -> BTreeSet<String> {
        let mut fields = BTreeSet::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields(&self, fields: &mut BTreeSet<String>) {
        match self {
            Self::Literal(_) => {}
            Self::Var(name) => {
                if name != IDENTIFIER {
                    fields.insert(name.clone());
                }
            }
            Self::Unary(_, operand) => operand.collect_fields(fields),
            Self::Binary(_, left, right) => {
                left.collect_fields(fields);
                right.collect_fields(fields);
            }
            Self::Call(_, args) => {
                for arg in args {
                    arg.collect_fields(fields);
                }
            }
        }
    }

    /// Rename every field reference through `map`, leaving unknown names alone.
    pub fn rename_fields(&mut self, map: &impl Fn(&str) -> Option<String>) {
        match self {
            Self::Literal(_) => {}
            Self::Var(name) => {
                if name != IDENTIFIER
                    && let Some(renamed) = map(name)
                {
                    *name = renamed;
                }
            }
            Self::Unary(_, operand) => operand.rename_fields(map),
            Self::Binary(_, left, right) => {
                left.rename_fields(map);
                right.rename_fields(map);
            }
            Self::Call(_, args) => {
                for arg in args {
                    arg.rename_fields(map);
                }
            }
        }
    }
}
