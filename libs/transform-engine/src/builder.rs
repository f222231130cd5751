//! Walks a `sqlparser` expression and builds the executable node tree.

use sqlparser::ast::{
    self, BinaryOperator, CaseWhen, Expr, FunctionArg, FunctionArgExpr, FunctionArguments,
    TrimWhereField, UnaryOperator,
};
use transform_api::schema::{Field, FieldType};
use transform_api::value::{Value, parse_decimal};

use crate::error::CompileError;
use crate::node::{
    ArithOp, Arithmetic, Between, BoxedParser, Case, Cast, CmpOp, ColumnRef, Comparison, Concat,
    ContextParam, InList, IsNull, Like, Literal, Negate, Not, Or, And,
};
use crate::registry::FunctionRegistry;

/// Prefix of a quoted identifier that reads a context parameter, as in
/// `"$ctx.region"`.
const CTX_PREFIX: &str = "$ctx.";

// ═══════════════════════════════════════════════════════════════
//  Tree builder
// ═══════════════════════════════════════════════════════════════

pub struct TreeBuilder<'a> {
    registry: &'a FunctionRegistry,
    fields: &'a [Field],
}

impl<'a> TreeBuilder<'a> {
    pub fn new(registry: &'a FunctionRegistry, fields: &'a [Field]) -> Self {
        Self { registry, fields }
    }

    /// Build the node for `expr`. Children are built left to right before
    /// their parent; the first failure discards everything built so far.
    pub fn build(&self, expr: &Expr) -> Result<BoxedParser, CompileError> {
        Ok(match expr {
            Expr::Value(v) => self.literal(&v.value)?,
            Expr::Identifier(ident) => self.identifier(&ident.value)?,
            Expr::CompoundIdentifier(parts) => {
                let name = parts.iter().map(|p| p.value.as_str()).collect::<Vec<_>>().join(".");
                self.identifier(&name)?
            }
            Expr::Nested(inner) => self.build(inner)?,
            Expr::BinaryOp { left, op, right } => self.binary(left, op, right)?,
            Expr::UnaryOp { op, expr: inner } => self.unary(op, inner)?,
            Expr::IsNull(inner) => Box::new(IsNull::new(self.build(inner)?, false)),
            Expr::IsNotNull(inner) => Box::new(IsNull::new(self.build(inner)?, true)),
            Expr::Between { expr: inner, negated, low, high } => Box::new(Between::new(
                self.build(inner)?,
                self.build(low)?,
                self.build(high)?,
                *negated,
            )),
            Expr::InList { expr: inner, list, negated } => Box::new(InList::new(
                self.build(inner)?,
                self.build_all(list)?,
                *negated,
            )),
            Expr::Like { negated, any: false, expr: inner, pattern, .. } => {
                Box::new(Like::new(self.build(inner)?, self.build(pattern)?, *negated, false))
            }
            Expr::ILike { negated, any: false, expr: inner, pattern, .. } => {
                Box::new(Like::new(self.build(inner)?, self.build(pattern)?, *negated, true))
            }
            Expr::Case { operand, conditions, else_result, .. } => {
                self.case(operand.as_deref(), conditions, else_result.as_deref())?
            }
            Expr::Array(array) => self.call("array", self.build_all(&array.elem)?)?,
            Expr::Function(function) => self.function(function)?,
            Expr::Cast { expr: inner, data_type, .. } => {
                let target = cast_target(data_type).ok_or_else(|| {
                    CompileError::UnsupportedExpression(format!("cast to {data_type}"))
                })?;
                Box::new(Cast::new(self.build(inner)?, target))
            }
            Expr::Substring { expr: inner, substring_from, substring_for, .. } => {
                let mut args = vec![self.build(inner)?];
                // SUBSTRING(s FOR n) starts at 1
                match substring_from {
                    Some(from) => args.push(self.build(from)?),
                    None => args.push(Box::new(Literal::new(Value::Int(1)))),
                }
                if let Some(len) = substring_for {
                    args.push(self.build(len)?);
                }
                self.call("substring", args)?
            }
            Expr::Trim { expr: inner, trim_where, trim_what, trim_characters, .. } => {
                let name = match trim_where {
                    None | Some(TrimWhereField::Both) => "trim",
                    Some(TrimWhereField::Leading) => "ltrim",
                    Some(TrimWhereField::Trailing) => "rtrim",
                };
                let mut args = vec![self.build(inner)?];
                if let Some(what) = trim_what {
                    args.push(self.build(what)?);
                } else if let Some(chars) = trim_characters {
                    args.extend(self.build_all(chars)?);
                }
                self.call(name, args)?
            }
            Expr::Position { expr: needle, r#in } => {
                self.call("locate", vec![self.build(needle)?, self.build(r#in)?])?
            }
            Expr::Ceil { expr: inner, .. } => self.call("ceil", vec![self.build(inner)?])?,
            Expr::Floor { expr: inner, .. } => self.call("floor", vec![self.build(inner)?])?,
            other => return Err(CompileError::UnsupportedExpression(other.to_string())),
        })
    }

    fn build_all(&self, exprs: &[Expr]) -> Result<Vec<BoxedParser>, CompileError> {
        exprs.iter().map(|e| self.build(e)).collect()
    }

    fn call(&self, name: &str, args: Vec<BoxedParser>) -> Result<BoxedParser, CompileError> {
        let factory = self.registry.resolve(name, args.len())?;
        Ok(factory(args))
    }

    fn literal(&self, value: &ast::Value) -> Result<BoxedParser, CompileError> {
        let value = match value {
            ast::Value::Number(text, _) => number(text)?,
            ast::Value::SingleQuotedString(s)
            | ast::Value::DoubleQuotedString(s)
            | ast::Value::EscapedStringLiteral(s)
            | ast::Value::UnicodeStringLiteral(s) => Value::String(s.clone()),
            ast::Value::Boolean(b) => Value::Bool(*b),
            ast::Value::Null => Value::Null,
            ast::Value::Placeholder(p) => {
                let name = p.strip_prefix('$').unwrap_or(p);
                return Ok(Box::new(ContextParam::new(name)));
            }
            other => return Err(CompileError::UnsupportedExpression(other.to_string())),
        };
        Ok(Box::new(Literal::new(value)))
    }

    /// Bind a name to a declared source field: exact match first, then
    /// case-insensitive.
    fn identifier(&self, name: &str) -> Result<BoxedParser, CompileError> {
        if let Some(param) = name.strip_prefix(CTX_PREFIX) {
            return Ok(Box::new(ContextParam::new(param)));
        }
        let index = self
            .fields
            .iter()
            .position(|f| f.name == name)
            .or_else(|| self.fields.iter().position(|f| f.name.eq_ignore_ascii_case(name)))
            .ok_or_else(|| CompileError::UnknownColumn(name.to_string()))?;
        Ok(Box::new(ColumnRef::new(index, self.fields[index].field_type)))
    }

    fn binary(&self, left: &Expr, op: &BinaryOperator, right: &Expr) -> Result<BoxedParser, CompileError> {
        let arith = |op| -> Result<BoxedParser, CompileError> {
            Ok(Box::new(Arithmetic::new(op, self.build(left)?, self.build(right)?)))
        };
        let cmp = |op| -> Result<BoxedParser, CompileError> {
            Ok(Box::new(Comparison::new(op, self.build(left)?, self.build(right)?)))
        };
        match op {
            BinaryOperator::Plus => arith(ArithOp::Add),
            BinaryOperator::Minus => arith(ArithOp::Sub),
            BinaryOperator::Multiply => arith(ArithOp::Mul),
            BinaryOperator::Divide => arith(ArithOp::Div),
            BinaryOperator::Modulo => arith(ArithOp::Mod),
            BinaryOperator::Eq => cmp(CmpOp::Eq),
            BinaryOperator::NotEq => cmp(CmpOp::NotEq),
            BinaryOperator::Lt => cmp(CmpOp::Lt),
            BinaryOperator::LtEq => cmp(CmpOp::LtEq),
            BinaryOperator::Gt => cmp(CmpOp::Gt),
            BinaryOperator::GtEq => cmp(CmpOp::GtEq),
            BinaryOperator::And => Ok(Box::new(And::new(self.build(left)?, self.build(right)?))),
            BinaryOperator::Or => Ok(Box::new(Or::new(self.build(left)?, self.build(right)?))),
            BinaryOperator::StringConcat => {
                Ok(Box::new(Concat::new(self.build(left)?, self.build(right)?)))
            }
            other => Err(CompileError::UnsupportedExpression(format!("operator {other}"))),
        }
    }

    fn unary(&self, op: &UnaryOperator, inner: &Expr) -> Result<BoxedParser, CompileError> {
        match op {
            UnaryOperator::Minus => {
                // -<number> folds into the literal so i64::MIN stays an Int
                if let Expr::Value(v) = inner
                    && let ast::Value::Number(text, _) = &v.value
                {
                    let value = number(&format!("-{text}"))?;
                    return Ok(Box::new(Literal::new(value)));
                }
                Ok(Box::new(Negate::new(self.build(inner)?)))
            }
            UnaryOperator::Plus => self.build(inner),
            UnaryOperator::Not => Ok(Box::new(Not::new(self.build(inner)?))),
            other => Err(CompileError::UnsupportedExpression(format!("operator {other}"))),
        }
    }

    fn case(
        &self,
        operand: Option<&Expr>,
        conditions: &[CaseWhen],
        else_result: Option<&Expr>,
    ) -> Result<BoxedParser, CompileError> {
        let operand = operand.map(|e| self.build(e)).transpose()?;
        let branches = conditions
            .iter()
            .map(|w| Ok((self.build(&w.condition)?, self.build(&w.result)?)))
            .collect::<Result<Vec<_>, CompileError>>()?;
        let otherwise = else_result.map(|e| self.build(e)).transpose()?;
        Ok(Box::new(Case::new(operand, branches, otherwise)))
    }

    fn function(&self, function: &ast::Function) -> Result<BoxedParser, CompileError> {
        let name = function.name.to_string();
        if function.over.is_some() || function.filter.is_some() || !function.within_group.is_empty() {
            return Err(CompileError::UnsupportedExpression(format!("{name}: window or aggregate clause")));
        }
        let args = match &function.args {
            FunctionArguments::None => Vec::new(),
            FunctionArguments::Subquery(_) => {
                return Err(CompileError::UnsupportedExpression(format!("{name}: subquery argument")));
            }
            FunctionArguments::List(list) => {
                if list.duplicate_treatment.is_some() || !list.clauses.is_empty() {
                    return Err(CompileError::UnsupportedExpression(function.to_string()));
                }
                list.args
                    .iter()
                    .map(|arg| match arg {
                        FunctionArg::Unnamed(FunctionArgExpr::Expr(e)) => self.build(e),
                        other => Err(CompileError::UnsupportedExpression(format!("{name}: argument {other}"))),
                    })
                    .collect::<Result<Vec<_>, _>>()?
            }
        };
        self.call(&name, args)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Literal and type helpers
// ═══════════════════════════════════════════════════════════════

/// Integral literals that fit become `Int`, everything else `Decimal`.
fn number(text: &str) -> Result<Value, CompileError> {
    if let Ok(i) = text.parse::<i64>() {
        return Ok(Value::Int(i));
    }
    parse_decimal(text)
        .map(Value::Decimal)
        .ok_or_else(|| CompileError::Parse(format!("invalid number literal '{text}'")))
}

fn cast_target(data_type: &ast::DataType) -> Option<FieldType> {
    let name = data_type.to_string().to_ascii_uppercase();
    if name.starts_with("INTERVAL") {
        return None;
    }
    const TARGETS: &[(&[&str], FieldType)] = &[
        (&["BOOL"], FieldType::Bool),
        (&["INT", "BIGINT", "SMALLINT", "TINYINT", "UINT", "LONG"], FieldType::Int),
        (&["DECIMAL", "NUMERIC", "DEC"], FieldType::Decimal),
        (&["FLOAT", "DOUBLE", "REAL"], FieldType::Float),
        (&["VARCHAR", "CHAR", "TEXT", "STRING", "NVARCHAR"], FieldType::String),
    ];
    TARGETS
        .iter()
        .find(|(prefixes, _)| prefixes.iter().any(|p| name.starts_with(p)))
        .map(|(_, target)| *target)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use sqlparser::dialect::ClickHouseDialect;
    use sqlparser::parser::Parser;
    use transform_api::format::DecodedRows;

    use super::*;
    use crate::error::EvalResult;
    use crate::node::testing::context;
    use crate::registry::registry;

    fn fields() -> Vec<Field> {
        vec![
            Field::new("numeric1"),
            Field::typed("Amount", FieldType::Int),
        ]
    }

    fn build(sql: &str) -> Result<BoxedParser, CompileError> {
        let expr = Parser::new(&ClickHouseDialect {})
            .try_with_sql(sql)
            .and_then(|mut p| p.parse_expr())
            .unwrap_or_else(|e| panic!("{sql}: {e}"));
        let fields = fields();
        TreeBuilder::new(registry(), &fields).build(&expr)
    }

    fn eval_row(sql: &str, row: Vec<Value>) -> EvalResult {
        let node = build(sql).unwrap_or_else(|e| panic!("{sql}: {e}"));
        let params = HashMap::from([("region".to_string(), Value::from("eu"))]);
        let ctx = context().with_params(&params);
        node.evaluate(&DecodedRows::single(row), 0, &ctx)
    }

    fn eval(sql: &str) -> Value {
        eval_row(sql, vec![Value::from("3"), Value::from("4")]).unwrap()
    }

    #[test]
    fn literals_and_folding() {
        assert_eq!(eval("42"), Value::Int(42));
        assert_eq!(eval("-9223372036854775808"), Value::Int(i64::MIN));
        assert_eq!(eval("1.50").to_string(), "1.50");
        assert_eq!(eval("'x'"), Value::from("x"));
        assert_eq!(eval("NULL"), Value::Null);
        assert_eq!(eval("true"), Value::Bool(true));
    }

    #[test]
    fn columns_bind_case_insensitively() {
        assert_eq!(eval("numeric1"), Value::from("3"));
        assert_eq!(eval("amount + 1"), Value::Int(5));
        assert!(matches!(build("missing"), Err(CompileError::UnknownColumn(name)) if name == "missing"));
    }

    #[test]
    fn context_parameters() {
        assert_eq!(eval("\"$ctx.region\""), Value::from("eu"));
        assert_eq!(eval("$region"), Value::from("eu"));
        assert_eq!(eval("$processing_time"), Value::from("2024-03-15 10:30:45"));
    }

    #[test]
    fn operators() {
        assert_eq!(eval("(amount - 1) * 2"), Value::Int(6));
        assert_eq!(eval("amount > 3 AND numeric1 = 3"), Value::Bool(true));
        assert_eq!(eval("NOT amount BETWEEN 1 AND 2"), Value::Bool(true));
        assert_eq!(eval("amount IN (1, 4)"), Value::Bool(true));
        assert_eq!(eval("numeric1 || 'x'"), Value::from("3x"));
        assert_eq!(eval("'abc' LIKE 'a%'"), Value::Bool(true));
        assert_eq!(eval("NULL IS NULL"), Value::Bool(true));
        assert_eq!(eval("CASE WHEN amount > 10 THEN 'big' ELSE 'small' END"), Value::from("small"));
        assert_eq!(eval("CASE amount WHEN 4 THEN 'four' END"), Value::from("four"));
        assert_eq!(eval("CAST(numeric1 AS INT) + 1"), Value::Int(4));
    }

    #[test]
    fn special_forms_map_to_functions() {
        assert_eq!(eval("SUBSTRING('hello' FROM 2 FOR 3)"), Value::from("ell"));
        assert_eq!(eval("TRIM('  x ')"), Value::from("x"));
        assert_eq!(eval("POSITION('l' IN 'hello')"), Value::Int(3));
        assert_eq!(eval("array(1, NULL)"), Value::Array(vec![Value::Int(1), Value::Null]));
    }

    #[test]
    fn function_resolution_errors() {
        assert!(matches!(build("nosuch(1)"), Err(CompileError::UnknownFunction(_))));
        assert!(matches!(build("cbrt(1, 2, 3)"), Err(CompileError::ArityMismatch { given: 3, .. })));
        assert!(matches!(build("upper(numeric1)"), Ok(_)));
    }

    #[test]
    fn runtime_faults_surface_as_errors() {
        assert!(eval_row("amount / 0", vec![Value::from("1"), Value::from("4")]).is_err());
    }
}
