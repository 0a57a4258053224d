//! Expression tree nodes and the shared rendering contract
//!
//! Every node renders to SQL text plus the ordered list of bind arguments
//! collected from its children, left to right. Rendering is a pure function
//! of the node's contents: the same tree renders to the same text and
//! arguments every time, and a failing child aborts the whole render.

use crate::builder::{Delete, Insert, Select, Union, Update};
use crate::ident::is_valid_identifier;
use crate::operator::{ArithOp, CompareOp, TimeUnit};
use crate::{Error, Result, Value};

/// Core trait for anything that renders to SQL text plus bind arguments.
///
/// The i-th returned argument corresponds to the i-th `@name` placeholder
/// occurrence in the text, so an execution layer can bind positionally.
pub trait ToSql {
    fn to_sql(&self) -> Result<(String, Vec<Value>)>;
}

/// A possibly qualified identifier, e.g. `users` or `u.first`.
///
/// Validation happens at render time against the process-wide keyword set;
/// each qualifying parent and the name itself must be valid on their own.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    name: String,
    parents: Vec<String>,
}

impl Ident {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parents: Vec::new(),
        }
    }

    /// An identifier qualified by parent segments, rendered `parent.name`.
    pub fn qualified<I, S>(name: impl Into<String>, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            parents: parents.into_iter().map(Into::into).collect(),
        }
    }
}

impl ToSql for Ident {
    fn to_sql(&self) -> Result<(String, Vec<Value>)> {
        for parent in &self.parents {
            if !is_valid_identifier(parent) {
                return Err(Error::invalid_identifier(parent));
            }
        }
        if !is_valid_identifier(&self.name) {
            return Err(Error::invalid_identifier(&self.name));
        }
        let mut segments = self.parents.clone();
        segments.push(self.name.clone());
        Ok((segments.join("."), Vec::new()))
    }
}

/// A CASE expression: optional scrutinee, WHEN/THEN arms, optional ELSE.
#[derive(Debug, Clone, Default)]
pub struct Case {
    scrutinee: Option<Box<Expr>>,
    whens: Vec<(Expr, Expr)>,
    alt: Option<Box<Expr>>,
}

impl Case {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the expression the WHEN arms are compared against.
    pub fn scrutinee(mut self, expr: Expr) -> Self {
        self.scrutinee = Some(Box::new(expr));
        self
    }

    /// Append a WHEN/THEN arm.
    pub fn when(mut self, test: Expr, then: Expr) -> Self {
        self.whens.push((test, then));
        self
    }

    /// Set the ELSE branch.
    pub fn otherwise(mut self, alt: Expr) -> Self {
        self.alt = Some(Box::new(alt));
        self
    }
}

impl ToSql for Case {
    fn to_sql(&self) -> Result<(String, Vec<Value>)> {
        let mut buf = String::from("CASE ");
        let mut args = Vec::new();
        if let Some(scrutinee) = &self.scrutinee {
            let (sql, mut vals) = scrutinee.to_sql()?;
            buf.push_str(&sql);
            buf.push(' ');
            args.append(&mut vals);
        }
        for (i, (test, then)) in self.whens.iter().enumerate() {
            if i > 0 {
                buf.push(' ');
            }
            buf.push_str("WHEN ");
            let (sql, mut vals) = test.to_sql()?;
            buf.push_str(&sql);
            args.append(&mut vals);
            buf.push_str(" THEN ");
            let (sql, mut vals) = then.to_sql()?;
            buf.push_str(&sql);
            args.append(&mut vals);
        }
        if let Some(alt) = &self.alt {
            buf.push_str(" ELSE ");
            let (sql, mut vals) = alt.to_sql()?;
            buf.push_str(&sql);
            args.append(&mut vals);
        }
        buf.push_str(" END");
        Ok((buf, args))
    }
}

/// An immutable SQL expression node.
///
/// Statements are nodes too, which is what lets a finished SELECT appear as
/// a sub-select, a CTE body or a UNION branch.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A column, table or schema reference
    Ident(Ident),
    /// An inline constant
    Literal(Value),
    /// A named bind argument, rendered `@name`
    Arg { name: String, value: Value },
    /// A comma-joined sequence of nodes
    List(Vec<Expr>),
    /// A node given a display name with `AS`
    Alias { inner: Box<Expr>, name: String },
    /// A binary arithmetic operation
    Arith {
        op: ArithOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// An interval literal, e.g. `INTERVAL 7 DAY`
    Interval { count: i64, unit: TimeUnit },
    /// A comparison; `right` is `None` for the unary NULL tests
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Option<Box<Expr>>,
    },
    /// `value BETWEEN low AND high`
    Between {
        value: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
    },
    /// Logical negation of a relational operand
    Not(Box<Expr>),
    /// Logical conjunction of two relational operands
    And { left: Box<Expr>, right: Box<Expr> },
    /// Logical disjunction of two relational operands
    Or { left: Box<Expr>, right: Box<Expr> },
    /// A CASE expression
    Case(Case),
    /// `ANY (inner)`
    Any(Box<Expr>),
    /// `ALL (inner)`
    All(Box<Expr>),
    /// `EXISTS inner`
    Exists(Box<Expr>),
    /// A function call
    Func { name: String, args: Vec<Expr> },
    /// A nested SELECT statement
    Select(Box<Select>),
    /// A nested UNION of two SELECTs
    Union(Box<Union>),
    /// A nested INSERT statement
    Insert(Box<Insert>),
    /// A nested UPDATE statement
    Update(Box<Update>),
    /// A nested DELETE statement
    Delete(Box<Delete>),
}

impl Expr {
    /// A bare identifier node.
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident(Ident::new(name))
    }

    /// A qualified identifier node, e.g. `Expr::qualified("first", ["u"])`
    /// for `u.first`.
    pub fn qualified<I, S>(name: impl Into<String>, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Expr::Ident(Ident::qualified(name, parents))
    }

    /// An inline literal node.
    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    /// A named bind argument. Pass `None` to bind the NULL sentinel.
    pub fn arg(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Expr::Arg {
            name: name.into(),
            value: value.into(),
        }
    }

    /// A comma-joined node list (IN lists, USING column lists, ...).
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Expr>,
    {
        Expr::List(items.into_iter().collect())
    }

    /// An interval literal.
    pub fn interval(count: i64, unit: TimeUnit) -> Self {
        Expr::Interval { count, unit }
    }

    /// A function call node.
    pub fn func<I>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = Expr>,
    {
        Expr::Func {
            name: name.into(),
            args: args.into_iter().collect(),
        }
    }

    /// Give this node a display name. Aliasing an already aliased node is
    /// a no-op returning the original.
    pub fn alias(self, name: impl Into<String>) -> Self {
        match self {
            Expr::Alias { .. } => self,
            inner => Expr::Alias {
                inner: Box::new(inner),
                name: name.into(),
            },
        }
    }

    fn arith(op: ArithOp, left: Expr, right: Expr) -> Self {
        Expr::Arith {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn add(left: Expr, right: Expr) -> Self {
        Self::arith(ArithOp::Add, left, right)
    }

    pub fn subtract(left: Expr, right: Expr) -> Self {
        Self::arith(ArithOp::Subtract, left, right)
    }

    pub fn multiply(left: Expr, right: Expr) -> Self {
        Self::arith(ArithOp::Multiply, left, right)
    }

    pub fn divide(left: Expr, right: Expr) -> Self {
        Self::arith(ArithOp::Divide, left, right)
    }

    pub fn modulo(left: Expr, right: Expr) -> Self {
        Self::arith(ArithOp::Modulo, left, right)
    }

    pub fn bit_and(left: Expr, right: Expr) -> Self {
        Self::arith(ArithOp::BitAnd, left, right)
    }

    pub fn bit_or(left: Expr, right: Expr) -> Self {
        Self::arith(ArithOp::BitOr, left, right)
    }

    pub fn bit_xor(left: Expr, right: Expr) -> Self {
        Self::arith(ArithOp::BitXor, left, right)
    }

    fn compare(op: CompareOp, left: Expr, right: Option<Expr>) -> Self {
        Expr::Compare {
            op,
            left: Box::new(left),
            right: right.map(Box::new),
        }
    }

    pub fn equal(left: Expr, right: Expr) -> Self {
        Self::compare(CompareOp::Equal, left, Some(right))
    }

    pub fn not_equal(left: Expr, right: Expr) -> Self {
        Self::compare(CompareOp::NotEqual, left, Some(right))
    }

    pub fn less_than(left: Expr, right: Expr) -> Self {
        Self::compare(CompareOp::Less, left, Some(right))
    }

    pub fn less_or_equal(left: Expr, right: Expr) -> Self {
        Self::compare(CompareOp::LessOrEqual, left, Some(right))
    }

    pub fn greater_than(left: Expr, right: Expr) -> Self {
        Self::compare(CompareOp::Greater, left, Some(right))
    }

    pub fn greater_or_equal(left: Expr, right: Expr) -> Self {
        Self::compare(CompareOp::GreaterOrEqual, left, Some(right))
    }

    pub fn like(left: Expr, right: Expr) -> Self {
        Self::compare(CompareOp::Like, left, Some(right))
    }

    pub fn not_like(left: Expr, right: Expr) -> Self {
        Self::compare(CompareOp::NotLike, left, Some(right))
    }

    /// `left IN right`; the right operand should be a List or a Select and
    /// is parenthesized on render.
    pub fn in_list(left: Expr, right: Expr) -> Self {
        Self::compare(CompareOp::In, left, Some(right))
    }

    pub fn not_in(left: Expr, right: Expr) -> Self {
        Self::compare(CompareOp::NotIn, left, Some(right))
    }

    pub fn is_null(expr: Expr) -> Self {
        Self::compare(CompareOp::IsNull, expr, None)
    }

    pub fn is_not_null(expr: Expr) -> Self {
        Self::compare(CompareOp::IsNotNull, expr, None)
    }

    /// `value BETWEEN low AND high`
    pub fn between(value: Expr, low: Expr, high: Expr) -> Self {
        Expr::Between {
            value: Box::new(value),
            low: Box::new(low),
            high: Box::new(high),
        }
    }

    pub fn not(operand: Expr) -> Self {
        Expr::Not(Box::new(operand))
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::And {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        Expr::Or {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn any(inner: Expr) -> Self {
        Expr::Any(Box::new(inner))
    }

    pub fn all(inner: Expr) -> Self {
        Expr::All(Box::new(inner))
    }

    pub fn exists(inner: Expr) -> Self {
        Expr::Exists(Box::new(inner))
    }

    /// Whether this node is acceptable in a boolean/relational position
    /// (WHERE, HAVING, a join condition, a NOT/AND/OR operand).
    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            Expr::Compare { .. } | Expr::And { .. } | Expr::Or { .. }
        )
    }

    /// Whether this node may appear as a join source: a Select, an Ident,
    /// or an Alias of one of those.
    pub(crate) fn is_joinable(&self) -> bool {
        match self {
            Expr::Select(_) | Expr::Ident(_) => true,
            Expr::Alias { inner, .. } => inner.is_joinable(),
            _ => false,
        }
    }
}

/// Render `parts` comma-joined into `buf`, appending their arguments in
/// visitation order.
pub(crate) fn write_parts(buf: &mut String, args: &mut Vec<Value>, parts: &[Expr]) -> Result<()> {
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            buf.push_str(", ");
        }
        let (sql, mut vals) = part.to_sql()?;
        buf.push_str(&sql);
        args.append(&mut vals);
    }
    Ok(())
}

/// Render one AND/OR operand, parenthesizing nested connectives: textual
/// AND and OR share precedence, so grouping must stay explicit.
fn logic_operand(operand: &Expr, position: &str) -> Result<(String, Vec<Value>)> {
    if !operand.is_relational() {
        return Err(Error::syntax(format!(
            "{position}: expected a relational expression"
        )));
    }
    let (sql, args) = operand.to_sql()?;
    match operand {
        Expr::And { .. } | Expr::Or { .. } => Ok((format!("({sql})"), args)),
        _ => Ok((sql, args)),
    }
}

impl ToSql for Expr {
    fn to_sql(&self) -> Result<(String, Vec<Value>)> {
        match self {
            Expr::Ident(ident) => ident.to_sql(),
            Expr::Literal(value) => Ok((value.encode_literal()?, Vec::new())),
            Expr::Arg { name, value } => Ok((format!("@{name}"), vec![value.clone()])),
            Expr::List(items) => {
                let mut buf = String::new();
                let mut args = Vec::new();
                write_parts(&mut buf, &mut args, items)?;
                Ok((buf, args))
            }
            Expr::Alias { inner, name } => {
                let (sql, args) = inner.to_sql()?;
                if matches!(inner.as_ref(), Expr::Select(_)) {
                    Ok((format!("({sql}) AS {name}"), args))
                } else {
                    Ok((format!("{sql} AS {name}"), args))
                }
            }
            Expr::Arith { op, left, right } => {
                let (left_sql, mut args) = left.to_sql()?;
                let (right_sql, mut vals) = right.to_sql()?;
                args.append(&mut vals);
                // nested arithmetic keeps its grouping
                let left_sql = match left.as_ref() {
                    Expr::Arith { .. } => format!("({left_sql})"),
                    _ => left_sql,
                };
                let right_sql = match right.as_ref() {
                    Expr::Arith { .. } => format!("({right_sql})"),
                    _ => right_sql,
                };
                Ok((format!("{left_sql} {op} {right_sql}"), args))
            }
            Expr::Interval { count, unit } => {
                Ok((format!("INTERVAL {count} {unit}"), Vec::new()))
            }
            Expr::Compare { op, left, right } => {
                let (left_sql, mut args) = left.to_sql()?;
                if op.is_unary() {
                    return Ok((format!("{left_sql} {}", op.as_str()), args));
                }
                let right = right
                    .as_ref()
                    .ok_or_else(|| Error::syntax(format!("{op}: missing right operand")))?;
                let (right_sql, mut vals) = right.to_sql()?;
                args.append(&mut vals);
                let right_sql = match right.as_ref() {
                    Expr::List(_) | Expr::Select(_) => format!("({right_sql})"),
                    _ => right_sql,
                };
                Ok((format!("{left_sql} {} {right_sql}", op.as_str()), args))
            }
            Expr::Between { value, low, high } => {
                let (value_sql, mut args) = value.to_sql()?;
                let (low_sql, mut vals) = low.to_sql()?;
                args.append(&mut vals);
                let (high_sql, mut vals) = high.to_sql()?;
                args.append(&mut vals);
                Ok((format!("{value_sql} BETWEEN {low_sql} AND {high_sql}"), args))
            }
            Expr::Not(operand) => {
                if !operand.is_relational() {
                    return Err(Error::syntax("not: expected a relational expression"));
                }
                let (sql, args) = operand.to_sql()?;
                Ok((format!("NOT {sql}"), args))
            }
            Expr::And { left, right } => {
                let (left_sql, mut args) = logic_operand(left, "and(left)")?;
                let (right_sql, mut vals) = logic_operand(right, "and(right)")?;
                args.append(&mut vals);
                Ok((format!("{left_sql} AND {right_sql}"), args))
            }
            Expr::Or { left, right } => {
                let (left_sql, mut args) = logic_operand(left, "or(left)")?;
                let (right_sql, mut vals) = logic_operand(right, "or(right)")?;
                args.append(&mut vals);
                Ok((format!("{left_sql} OR {right_sql}"), args))
            }
            Expr::Case(case) => case.to_sql(),
            Expr::Any(inner) => {
                let (sql, args) = inner.to_sql()?;
                Ok((format!("ANY ({sql})"), args))
            }
            Expr::All(inner) => {
                let (sql, args) = inner.to_sql()?;
                Ok((format!("ALL ({sql})"), args))
            }
            Expr::Exists(inner) => {
                let (sql, args) = inner.to_sql()?;
                Ok((format!("EXISTS {sql}"), args))
            }
            Expr::Func { name, args: fargs } => {
                let mut buf = String::new();
                let mut args = Vec::new();
                buf.push_str(name);
                buf.push('(');
                write_parts(&mut buf, &mut args, fargs)?;
                buf.push(')');
                Ok((buf, args))
            }
            Expr::Select(select) => select.to_sql(),
            Expr::Union(union) => union.to_sql(),
            Expr::Insert(insert) => insert.to_sql(),
            Expr::Update(update) => update.to_sql(),
            Expr::Delete(delete) => delete.to_sql(),
        }
    }
}

impl From<Ident> for Expr {
    fn from(ident: Ident) -> Self {
        Expr::Ident(ident)
    }
}

impl From<Case> for Expr {
    fn from(case: Case) -> Self {
        Expr::Case(case)
    }
}

impl From<Select> for Expr {
    fn from(select: Select) -> Self {
        Expr::Select(Box::new(select))
    }
}

impl From<Union> for Expr {
    fn from(union: Union) -> Self {
        Expr::Union(Box::new(union))
    }
}

impl From<Insert> for Expr {
    fn from(insert: Insert) -> Self {
        Expr::Insert(Box::new(insert))
    }
}

impl From<Update> for Expr {
    fn from(update: Update) -> Self {
        Expr::Update(Box::new(update))
    }
}

impl From<Delete> for Expr {
    fn from(delete: Delete) -> Self {
        Expr::Delete(Box::new(delete))
    }
}
