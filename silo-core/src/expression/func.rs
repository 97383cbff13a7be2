use crate::Arg;
use std::{
    borrow::Cow,
    fmt::{self, Display, Formatter},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Remainder,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Like,
    NotLike,
    In,
    NotIn,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Addition => "+",
            BinaryOp::Subtraction => "-",
            BinaryOp::Multiplication => "*",
            BinaryOp::Division => "/",
            BinaryOp::Remainder => "%",
            BinaryOp::Equal => "=",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Like => "LIKE",
            BinaryOp::NotLike => "NOT LIKE",
            BinaryOp::In => "IN",
            BinaryOp::NotIn => "NOT IN",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
        }
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FuncKind {
    /// `name(args)`
    Function,
    /// `(lhs OP rhs)`
    Binary(BinaryOp),
    /// `name(params)(args)`, the parameters of aggregates like `quantile(0.9)(x)`.
    Parametric(Vec<Arg>),
}

/// Expression tree node: a function call or an infix operation on its arguments.
///
/// Nodes are immutable values, combinators return a new node.
#[derive(Debug, Clone, PartialEq)]
pub struct F {
    name: Cow<'static, str>,
    args: Vec<Arg>,
    kind: FuncKind,
}

impl F {
    pub fn new(name: impl Into<Cow<'static, str>>, args: Vec<Arg>) -> Self {
        Self {
            name: name.into(),
            args,
            kind: FuncKind::Function,
        }
    }

    pub fn binary(op: BinaryOp, lhs: impl Into<Arg>, rhs: impl Into<Arg>) -> Self {
        Self {
            name: Cow::Borrowed(op.symbol()),
            args: vec![lhs.into(), rhs.into()],
            kind: FuncKind::Binary(op),
        }
    }

    pub fn parametric(
        name: impl Into<Cow<'static, str>>,
        params: Vec<Arg>,
        args: Vec<Arg>,
    ) -> Self {
        Self {
            name: name.into(),
            args,
            kind: FuncKind::Parametric(params),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    pub fn kind(&self) -> &FuncKind {
        &self.kind
    }

    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        self.write_sql(&mut out);
        out
    }

    pub fn write_sql(&self, out: &mut String) {
        let list = |out: &mut String, items: &[Arg]| {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                item.write_sql(out);
            }
        };
        match &self.kind {
            FuncKind::Binary(op) => {
                out.push('(');
                for (i, item) in self.args.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                        out.push_str(op.symbol());
                        out.push(' ');
                    }
                    item.write_sql(out);
                }
                out.push(')');
            }
            FuncKind::Function => {
                out.push_str(&self.name);
                out.push('(');
                list(out, &self.args);
                out.push(')');
            }
            FuncKind::Parametric(params) => {
                out.push_str(&self.name);
                out.push('(');
                list(out, params);
                out.push_str(")(");
                list(out, &self.args);
                out.push(')');
            }
        }
    }

    /// Same call on a function renamed with `suffix`, extra arguments appended.
    /// Operators have no name to extend and are returned unchanged.
    fn with_suffix(&self, suffix: &str, extra: Option<Arg>) -> F {
        if matches!(self.kind, FuncKind::Binary(..)) {
            return self.clone();
        }
        let mut result = self.clone();
        result.name = Cow::Owned(format!("{}{suffix}", self.name));
        result.args.extend(extra);
        result
    }

    /// `toInt32('x')` becomes `toInt32OrZero('x')`
    pub fn or_zero(&self) -> F {
        self.with_suffix("OrZero", None)
    }

    pub fn or_null(&self) -> F {
        self.with_suffix("OrNull", None)
    }

    pub fn or_default(&self) -> F {
        self.with_suffix("OrDefault", None)
    }

    /// Conditional aggregate: `sum(x)` becomes `sumIf(x, cond)`.
    pub fn with_if(&self, cond: impl Into<Arg>) -> F {
        self.with_suffix("If", Some(cond.into()))
    }

    pub fn or_default_if(&self, cond: impl Into<Arg>) -> F {
        self.with_suffix("OrDefaultIf", Some(cond.into()))
    }

    pub fn or_null_if(&self, cond: impl Into<Arg>) -> F {
        self.with_suffix("OrNullIf", Some(cond.into()))
    }

    /// Variant working on UTF-8 code points: `length(s)` becomes `lengthUTF8(s)`.
    pub fn utf8(&self) -> F {
        self.with_suffix("UTF8", None)
    }
}

impl Display for F {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

impl Display for Arg {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}
