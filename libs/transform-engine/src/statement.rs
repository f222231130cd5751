//! Statement compilation: `SELECT <items> FROM source [WHERE <predicate>]`.

use sqlparser::ast::{SelectItem, SetExpr, Statement};
use sqlparser::dialect::ClickHouseDialect;
use sqlparser::parser::Parser;
use transform_api::schema::Field;

use crate::builder::TreeBuilder;
use crate::error::CompileError;
use crate::node::BoxedParser;
use crate::registry::FunctionRegistry;

/// One projection item: output name and the tree producing it.
pub struct OutputColumn {
    pub name: String,
    pub parser: BoxedParser,
}

/// Executable form of a statement. Immutable, shareable across threads.
pub struct CompiledStatement {
    pub columns: Vec<OutputColumn>,
    pub predicate: Option<BoxedParser>,
}

impl CompiledStatement {
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

/// Parse and compile `sql`.
///
/// Identifiers bind against `source_fields`. An unaliased item takes the
/// name of the sink field at its position, or its own SQL text when the
/// sink declares fewer fields.
pub fn compile(
    sql: &str,
    registry: &FunctionRegistry,
    source_fields: &[Field],
    sink_fields: &[Field],
) -> Result<CompiledStatement, CompileError> {
    let mut statements = Parser::parse_sql(&ClickHouseDialect {}, sql)
        .map_err(|e| CompileError::Parse(e.to_string()))?;
    if statements.len() != 1 {
        return Err(CompileError::InvalidStatement(format!(
            "expected exactly one statement, found {}",
            statements.len()
        )));
    }
    let Statement::Query(query) = statements.remove(0) else {
        return Err(CompileError::InvalidStatement("only SELECT is supported".to_string()));
    };
    if query.with.is_some() || query.order_by.is_some() || query.limit_clause.is_some() {
        return Err(CompileError::InvalidStatement(
            "WITH, ORDER BY and LIMIT are not supported".to_string(),
        ));
    }
    let SetExpr::Select(select) = *query.body else {
        return Err(CompileError::InvalidStatement("expected a plain SELECT".to_string()));
    };
    if select.from.len() > 1 || select.from.iter().any(|t| !t.joins.is_empty()) {
        return Err(CompileError::InvalidStatement("joins are not supported".to_string()));
    }
    if select.having.is_some() || select.distinct.is_some() || has_group_by(&select.group_by) {
        return Err(CompileError::InvalidStatement(
            "GROUP BY, HAVING and DISTINCT are not supported".to_string(),
        ));
    }

    let builder = TreeBuilder::new(registry, source_fields);
    let mut columns = Vec::with_capacity(select.projection.len());
    for (position, item) in select.projection.iter().enumerate() {
        let (expr, alias) = match item {
            SelectItem::UnnamedExpr(expr) => (expr, None),
            SelectItem::ExprWithAlias { expr, alias } => (expr, Some(alias.value.clone())),
            _ => {
                return Err(CompileError::UnsupportedExpression("wildcard projection".to_string()));
            }
        };
        let name = alias
            .or_else(|| sink_fields.get(position).map(|f| f.name.clone()))
            .unwrap_or_else(|| expr.to_string());
        columns.push(OutputColumn { name, parser: builder.build(expr)? });
    }
    let predicate = select.selection.as_ref().map(|e| builder.build(e)).transpose()?;

    tracing::debug!(
        columns = columns.len(),
        filtered = predicate.is_some(),
        "statement compiled"
    );
    Ok(CompiledStatement { columns, predicate })
}

fn has_group_by(group_by: &sqlparser::ast::GroupByExpr) -> bool {
    match group_by {
        sqlparser::ast::GroupByExpr::All(_) => true,
        sqlparser::ast::GroupByExpr::Expressions(exprs, _) => !exprs.is_empty(),
    }
}
