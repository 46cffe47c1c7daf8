//! Relational backend.
//!
//! Compiles to a small SQL predicate tree ([`SqlPredicate`]) that renders to
//! parameterised SQL for a chosen [`Dialect`]. Values never appear in the
//! SQL text; they are returned as ordered bind parameters.
//!
//! Nested objects are stored as owned columns: `Address.City` lives in the
//! column `Address_City`. Collections (arrays of scalars or of embedded
//! objects) have no column in the record's table, so any path through one
//! is rejected.
//!
//! Null handling follows the document backend: `NE` and `NIN` also match
//! rows whose column is null. Pattern operators match case-sensitively in
//! every dialect, like the document backend's `$regex`.

use super::{
    CompileError, CompileResult, CompiledQuery, Operand, Projection, QueryBackend, SortKey,
};
use crate::operators::{ComparisonOp, LogicalOp};
use crate::path::PropertyPath;
use crudql_proto::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator between the segments of a flattened column name.
pub const COLUMN_SEPARATOR: &str = "_";

/// SQL dialect used for quoting and placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// `"ident"`, `$1`.
    #[default]
    Postgres,
    /// `"ident"`, `?1`.
    Sqlite,
    /// `` `ident` ``, `?`.
    MySql,
}

impl Dialect {
    /// Quote an identifier.
    pub fn quote(&self, ident: &str) -> String {
        match self {
            Dialect::Postgres | Dialect::Sqlite => format!("\"{}\"", ident.replace('"', "\"\"")),
            Dialect::MySql => format!("`{}`", ident.replace('`', "``")),
        }
    }

    /// Placeholder for the `n`th (1-based) bind parameter.
    pub fn placeholder(&self, n: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", n),
            Dialect::Sqlite => format!("?{}", n),
            Dialect::MySql => "?".to_string(),
        }
    }

    /// Render a case-sensitive substring match of `column` against `text`.
    ///
    /// SQLite's `LIKE` folds ASCII case, so it uses `GLOB` instead. MySQL
    /// compares against a binary cast to bypass case-insensitive collations.
    fn pattern(&self, w: &mut SqlWriter, column: &str, kind: PatternKind, text: &str) {
        w.column(column);
        match self {
            Dialect::Postgres => {
                w.push(" LIKE ");
                w.bind(Value::String(kind.wrap(&escape_like(text), "%")));
                w.push(" ESCAPE '\\'");
            }
            Dialect::Sqlite => {
                w.push(" GLOB ");
                w.bind(Value::String(kind.wrap(&escape_glob(text), "*")));
            }
            Dialect::MySql => {
                w.push(" LIKE CAST(");
                w.bind(Value::String(kind.wrap(&escape_like(text), "%")));
                w.push(" AS BINARY) ESCAPE '\\\\'");
            }
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
            Dialect::MySql => "mysql",
        })
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "sqlite" => Ok(Dialect::Sqlite),
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            other => Err(format!("unknown SQL dialect '{}'", other)),
        }
    }
}

/// Binary comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `<`
    Lt,
    /// `<=`
    Lte,
}

impl CompareOp {
    /// SQL spelling.
    pub fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
        }
    }
}

/// Where a pattern must occur in a column value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// Anywhere.
    Contains,
    /// At the start.
    Prefix,
    /// At the end.
    Suffix,
}

impl PatternKind {
    fn wrap(&self, escaped: &str, wildcard: &str) -> String {
        match self {
            PatternKind::Contains => format!("{wildcard}{escaped}{wildcard}"),
            PatternKind::Prefix => format!("{escaped}{wildcard}"),
            PatternKind::Suffix => format!("{wildcard}{escaped}"),
        }
    }
}

/// A SQL boolean expression.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlPredicate {
    /// `column op value`
    Compare {
        /// Column name.
        column: String,
        /// Operator.
        op: CompareOp,
        /// Bound value.
        value: Value,
    },
    /// `column IS NULL`
    IsNull(String),
    /// `column IS NOT NULL`
    IsNotNull(String),
    /// `column IN (values)`
    In {
        /// Column name.
        column: String,
        /// Bound values (never empty).
        values: Vec<Value>,
    },
    /// `column NOT IN (values)`
    NotIn {
        /// Column name.
        column: String,
        /// Bound values (never empty).
        values: Vec<Value>,
    },
    /// Case-sensitive match of literal text inside `column`.
    ///
    /// Rendered as `LIKE` or `GLOB` depending on the dialect.
    Pattern {
        /// Column name.
        column: String,
        /// Where the text must occur.
        kind: PatternKind,
        /// Literal text, unescaped.
        text: String,
    },
    /// Conjunction.
    And(Vec<SqlPredicate>),
    /// Disjunction.
    Or(Vec<SqlPredicate>),
    /// Constant truth value.
    Const(bool),
}

/// Rendered SQL with its bind parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlFragment {
    /// SQL text with placeholders.
    pub sql: String,
    /// Parameters, in placeholder order.
    pub params: Vec<Value>,
}

/// One `ORDER BY` term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlOrder {
    /// Column name.
    pub column: String,
    /// Sort descending.
    pub descending: bool,
}

struct SqlWriter {
    dialect: Dialect,
    sql: String,
    params: Vec<Value>,
}

impl SqlWriter {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    fn column(&mut self, name: &str) {
        let quoted = self.dialect.quote(name);
        self.sql.push_str(&quoted);
    }

    fn bind(&mut self, value: Value) {
        self.params.push(value);
        let placeholder = self.dialect.placeholder(self.params.len());
        self.sql.push_str(&placeholder);
    }

    fn bind_list(&mut self, values: &[Value]) {
        self.push("(");
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.bind(value.clone());
        }
        self.push(")");
    }

    fn predicate(&mut self, predicate: &SqlPredicate) {
        match predicate {
            SqlPredicate::Compare { column, op, value } => {
                self.column(column);
                self.push(" ");
                self.push(op.as_sql());
                self.push(" ");
                self.bind(value.clone());
            }
            SqlPredicate::IsNull(column) => {
                self.column(column);
                self.push(" IS NULL");
            }
            SqlPredicate::IsNotNull(column) => {
                self.column(column);
                self.push(" IS NOT NULL");
            }
            SqlPredicate::In { column, values } => {
                self.column(column);
                self.push(" IN ");
                self.bind_list(values);
            }
            SqlPredicate::NotIn { column, values } => {
                self.column(column);
                self.push(" NOT IN ");
                self.bind_list(values);
            }
            SqlPredicate::Pattern { column, kind, text } => {
                let dialect = self.dialect;
                dialect.pattern(self, column, *kind, text);
            }
            SqlPredicate::And(children) => self.junction(" AND ", children, true),
            SqlPredicate::Or(children) => self.junction(" OR ", children, false),
            SqlPredicate::Const(true) => self.push("1 = 1"),
            SqlPredicate::Const(false) => self.push("1 = 0"),
        }
    }

    fn junction(&mut self, separator: &str, children: &[SqlPredicate], empty: bool) {
        if children.is_empty() {
            self.predicate(&SqlPredicate::Const(empty));
            return;
        }
        self.push("(");
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                self.push(separator);
            }
            self.predicate(child);
        }
        self.push(")");
    }

    fn finish(self) -> SqlFragment {
        SqlFragment {
            sql: self.sql,
            params: self.params,
        }
    }
}

impl SqlPredicate {
    /// Render to SQL text and bind parameters.
    pub fn render(&self, dialect: Dialect) -> SqlFragment {
        let mut writer = SqlWriter::new(dialect);
        writer.predicate(self);
        writer.finish()
    }
}

/// Escape LIKE wildcards and the escape character itself.
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Escape `GLOB` metacharacters by wrapping each in a character class.
pub fn escape_glob(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '*' | '?' | '[' => {
                escaped.push('[');
                escaped.push(c);
                escaped.push(']');
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Compiles to SQL predicates.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationalBackend {
    dialect: Dialect,
}

impl RelationalBackend {
    /// Create a backend for `dialect`.
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    /// The dialect this backend renders for.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Column holding the value at `path`.
    pub fn column(path: &PropertyPath) -> String {
        path.join(COLUMN_SEPARATOR)
    }

    /// Render a `SELECT` against `table`.
    pub fn select(&self, table: &str, query: &CompiledQuery<Self>) -> SqlFragment {
        let mut w = SqlWriter::new(self.dialect);
        w.push("SELECT ");
        match &query.projection {
            Some(columns) if !columns.is_empty() => {
                for (i, column) in columns.iter().enumerate() {
                    if i > 0 {
                        w.push(", ");
                    }
                    w.column(column);
                }
            }
            _ => w.push("*"),
        }
        w.push(" FROM ");
        w.column(table);
        self.where_clause(&mut w, query.filter.as_ref());

        if !query.sort.is_empty() {
            w.push(" ORDER BY ");
            for (i, order) in query.sort.iter().enumerate() {
                if i > 0 {
                    w.push(", ");
                }
                w.column(&order.column);
                w.push(if order.descending { " DESC" } else { " ASC" });
            }
        }

        match (query.limit, query.skip) {
            (Some(limit), skip) => {
                w.push(&format!(" LIMIT {}", limit));
                if let Some(skip) = skip {
                    w.push(&format!(" OFFSET {}", skip));
                }
            }
            (None, Some(skip)) => match self.dialect {
                Dialect::Postgres => w.push(&format!(" OFFSET {}", skip)),
                Dialect::Sqlite => w.push(&format!(" LIMIT -1 OFFSET {}", skip)),
                Dialect::MySql => w.push(&format!(" LIMIT {} OFFSET {}", u64::MAX, skip)),
            },
            (None, None) => {}
        }

        w.finish()
    }

    /// Render a `SELECT COUNT(*)` against `table`.
    pub fn count(&self, table: &str, filter: Option<&SqlPredicate>) -> SqlFragment {
        let mut w = SqlWriter::new(self.dialect);
        w.push("SELECT COUNT(*) FROM ");
        w.column(table);
        self.where_clause(&mut w, filter);
        w.finish()
    }

    /// Render a `DELETE` against `table`.
    pub fn delete(&self, table: &str, filter: &SqlPredicate) -> SqlFragment {
        let mut w = SqlWriter::new(self.dialect);
        w.push("DELETE FROM ");
        w.column(table);
        self.where_clause(&mut w, Some(filter));
        w.finish()
    }

    fn where_clause(&self, w: &mut SqlWriter, filter: Option<&SqlPredicate>) {
        if let Some(filter) = filter {
            w.push(" WHERE ");
            w.predicate(filter);
        }
    }
}

impl QueryBackend for RelationalBackend {
    type Predicate = SqlPredicate;
    type Sort = Vec<SqlOrder>;
    type Projection = Vec<String>;

    const NAME: &'static str = "relational";

    fn check_path(&self, path: &PropertyPath) -> CompileResult<()> {
        if path.crosses_collection() {
            return Err(CompileError::CollectionPath {
                backend: Self::NAME,
                field: path.display_name(),
            });
        }
        Ok(())
    }

    fn compile_leaf(
        &self,
        path: &PropertyPath,
        op: ComparisonOp,
        operand: Operand,
    ) -> CompileResult<SqlPredicate> {
        let column = Self::column(path);
        let compare = |op: CompareOp, value: Value| SqlPredicate::Compare {
            column: Self::column(path),
            op,
            value,
        };

        let predicate = match (op, operand) {
            (ComparisonOp::Eq, Operand::Null) => SqlPredicate::IsNull(column),
            (ComparisonOp::Ne, Operand::Null) => SqlPredicate::IsNotNull(column),
            (ComparisonOp::Eq, Operand::Single(v)) => compare(CompareOp::Eq, v),
            (ComparisonOp::Ne, Operand::Single(v)) => SqlPredicate::Or(vec![
                compare(CompareOp::Ne, v),
                SqlPredicate::IsNull(column),
            ]),
            (ComparisonOp::Gt, Operand::Single(v)) => compare(CompareOp::Gt, v),
            (ComparisonOp::Gte, Operand::Single(v)) => compare(CompareOp::Gte, v),
            (ComparisonOp::Lt, Operand::Single(v)) => compare(CompareOp::Lt, v),
            (ComparisonOp::Lte, Operand::Single(v)) => compare(CompareOp::Lte, v),
            (ComparisonOp::In, Operand::Many(values)) if values.is_empty() => {
                SqlPredicate::Const(false)
            }
            (ComparisonOp::In, Operand::Many(values)) => SqlPredicate::In { column, values },
            (ComparisonOp::Nin, Operand::Many(values)) if values.is_empty() => {
                SqlPredicate::Const(true)
            }
            (ComparisonOp::Nin, Operand::Many(values)) => SqlPredicate::Or(vec![
                SqlPredicate::NotIn {
                    column: column.clone(),
                    values,
                },
                SqlPredicate::IsNull(column),
            ]),
            (ComparisonOp::Contains, Operand::Pattern(text)) => SqlPredicate::Pattern {
                column,
                kind: PatternKind::Contains,
                text,
            },
            (ComparisonOp::StartsWith, Operand::Pattern(text)) => SqlPredicate::Pattern {
                column,
                kind: PatternKind::Prefix,
                text,
            },
            (ComparisonOp::EndsWith, Operand::Pattern(text)) => SqlPredicate::Pattern {
                column,
                kind: PatternKind::Suffix,
                text,
            },
            (op, _) => {
                return Err(CompileError::Unsupported {
                    backend: Self::NAME,
                    operator: op,
                })
            }
        };
        Ok(predicate)
    }

    fn compile_group(&self, op: LogicalOp, children: Vec<SqlPredicate>) -> SqlPredicate {
        match op {
            LogicalOp::And => SqlPredicate::And(children),
            LogicalOp::Or => SqlPredicate::Or(children),
        }
    }

    fn compile_sort(&self, keys: &[SortKey]) -> Vec<SqlOrder> {
        keys.iter()
            .map(|k| SqlOrder {
                column: Self::column(&k.path),
                descending: k.descending,
            })
            .collect()
    }

    fn compile_projection(&self, projection: &Projection) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for leaf in projection.selected_leaves() {
            if leaf.crosses_collection() {
                continue;
            }
            let column = Self::column(&leaf);
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
        columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{EntityDef, FieldDef, FieldType, ScalarType, SchemaBundle};
    use crate::compile::QueryCompiler;
    use crate::config::QueryConfig;
    use crudql_proto::{Condition, GroupedCondition, Literal, Query, Sort};
    use pretty_assertions::assert_eq;

    fn schema() -> SchemaBundle {
        let address = EntityDef::new("Address", "City")
            .with_field(FieldDef::new("City", FieldType::scalar(ScalarType::String)))
            .with_field(FieldDef::new("Zip", FieldType::scalar(ScalarType::String)));
        let user = EntityDef::new("User", "Id")
            .with_field(FieldDef::new("Id", FieldType::scalar(ScalarType::Int64)))
            .with_field(FieldDef::new("Name", FieldType::scalar(ScalarType::String)))
            .with_field(FieldDef::new("Age", FieldType::scalar(ScalarType::Int32)))
            .with_field(FieldDef::new("Address", FieldType::embedded("Address")));
        SchemaBundle::new(1).with_entity(address).with_entity(user)
    }

    fn order_schema() -> SchemaBundle {
        let line = EntityDef::new("Line", "Sku")
            .with_field(FieldDef::new("Sku", FieldType::scalar(ScalarType::String)));
        let order = EntityDef::new("Order", "Id")
            .with_field(FieldDef::new("Id", FieldType::scalar(ScalarType::Int64)))
            .with_field(FieldDef::new("Note", FieldType::scalar(ScalarType::String)))
            .with_field(FieldDef::new("Tags", FieldType::array_scalar(ScalarType::String)))
            .with_field(FieldDef::new("Lines", FieldType::array_embedded("Line")));
        SchemaBundle::new(1).with_entity(line).with_entity(order)
    }

    fn render(condition: Condition, dialect: Dialect) -> SqlFragment {
        let schema = schema();
        let config = QueryConfig::default();
        QueryCompiler::new(&schema, &config, RelationalBackend::new(dialect))
            .compile_condition("User", &condition)
            .unwrap()
            .render(dialect)
    }

    #[test]
    fn test_dialect_placeholders() {
        let condition = Condition::leaf("Age", "GT", "18");
        assert_eq!(render(condition.clone(), Dialect::Postgres).sql, "\"Age\" > $1");
        assert_eq!(render(condition.clone(), Dialect::Sqlite).sql, "\"Age\" > ?1");

        let fragment = render(condition, Dialect::MySql);
        assert_eq!(fragment.sql, "`Age` > ?");
        assert_eq!(fragment.params, vec![Value::Int32(18)]);
    }

    #[test]
    fn test_groups_and_numbering() {
        let condition = Condition::grouped(vec![GroupedCondition::or(vec![
            Condition::leaf("Id", "EQ", "1"),
            Condition::leaf("Id", "EQ", "2"),
        ])]);
        let fragment = render(condition, Dialect::Postgres);
        assert_eq!(fragment.sql, "((\"Id\" = $1 OR \"Id\" = $2))");
        assert_eq!(fragment.params, vec![Value::Int64(1), Value::Int64(2)]);
    }

    #[test]
    fn test_null_semantics() {
        assert_eq!(
            render(Condition::null("Name", "EQ"), Dialect::Postgres).sql,
            "\"Name\" IS NULL"
        );
        assert_eq!(
            render(Condition::null("Name", "NE"), Dialect::Postgres).sql,
            "\"Name\" IS NOT NULL"
        );
        assert_eq!(
            render(Condition::leaf("Name", "NE", "Bob"), Dialect::Postgres).sql,
            "(\"Name\" <> $1 OR \"Name\" IS NULL)"
        );
    }

    #[test]
    fn test_set_membership() {
        let fragment = render(
            Condition::multi("Age", "IN", vec![Literal::Integer(1), "2".into()]),
            Dialect::Sqlite,
        );
        assert_eq!(fragment.sql, "\"Age\" IN (?1, ?2)");

        let fragment = render(Condition::multi("Age", "NIN", vec!["3".into()]), Dialect::Sqlite);
        assert_eq!(fragment.sql, "(\"Age\" NOT IN (?1) OR \"Age\" IS NULL)");

        assert_eq!(
            render(Condition::null("Age", "IN"), Dialect::Sqlite).sql,
            "1 = 0"
        );
        assert_eq!(
            render(Condition::null("Age", "NIN"), Dialect::Sqlite).sql,
            "1 = 1"
        );
    }

    #[test]
    fn test_pattern_rendering() {
        let fragment = render(
            Condition::leaf("address.city", "CONTAINS", "ber"),
            Dialect::Postgres,
        );
        assert_eq!(fragment.sql, "\"Address_City\" LIKE $1 ESCAPE '\\'");
        assert_eq!(fragment.params, vec![Value::String("%ber%".into())]);

        let fragment = render(Condition::leaf("Name", "STARTSWITH", "Jo"), Dialect::MySql);
        assert_eq!(fragment.sql, "`Name` LIKE CAST(? AS BINARY) ESCAPE '\\\\'");
        assert_eq!(fragment.params, vec![Value::String("Jo%".into())]);

        let fragment = render(Condition::leaf("Name", "ENDSWITH", "na"), Dialect::Sqlite);
        assert_eq!(fragment.sql, "\"Name\" GLOB ?1");
        assert_eq!(fragment.params, vec![Value::String("*na".into())]);
    }

    #[test]
    fn test_pattern_escaping() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_glob("a*b?[c]"), "a[*]b[?][[]c]");
    }

    #[test]
    fn test_select() {
        let schema = schema();
        let config = QueryConfig::default();
        let backend = RelationalBackend::new(Dialect::Postgres);
        let compiler = QueryCompiler::new(&schema, &config, backend);

        let query = Query::new()
            .with_where(Condition::leaf("Age", "GTE", "21"))
            .with_includes(vec!["Name".into(), "Address".into()])
            .with_order(Sort::desc("Age"))
            .with_order(Sort::asc("Name"))
            .with_limit(10)
            .with_skip(5);
        let compiled = compiler.compile_checked("User", &query).unwrap();
        let fragment = backend.select("users", &compiled);

        assert_eq!(
            fragment.sql,
            "SELECT \"Name\", \"Address_City\", \"Address_Zip\" FROM \"users\" \
             WHERE \"Age\" >= $1 ORDER BY \"Age\" DESC, \"Name\" ASC LIMIT 10 OFFSET 5"
        );
        assert_eq!(fragment.params, vec![Value::Int32(21)]);
    }

    #[test]
    fn test_exclude_projection() {
        let schema = schema();
        let config = QueryConfig::default();
        let compiler = QueryCompiler::new(&schema, &config, RelationalBackend::default());

        let query = Query::new().with_excludes(vec!["Address".into(), "Age".into()]);
        let compiled = compiler.compile_checked("User", &query).unwrap();
        assert_eq!(
            compiled.projection,
            Some(vec!["Id".to_string(), "Name".to_string()])
        );
    }

    #[test]
    fn test_offset_without_limit() {
        let schema = schema();
        let config = QueryConfig::default();
        let backend = RelationalBackend::new(Dialect::Sqlite);
        let compiler = QueryCompiler::new(&schema, &config, backend);

        let compiled = compiler
            .compile_checked("User", &Query::new().with_skip(3))
            .unwrap();
        assert_eq!(
            backend.select("users", &compiled).sql,
            "SELECT * FROM \"users\" LIMIT -1 OFFSET 3"
        );
    }

    #[test]
    fn test_count_and_delete() {
        let backend = RelationalBackend::new(Dialect::Postgres);
        let filter = SqlPredicate::And(vec![SqlPredicate::Compare {
            column: "Name".into(),
            op: CompareOp::Eq,
            value: Value::String("Ada".into()),
        }]);

        assert_eq!(
            backend.count("users", Some(&filter)).sql,
            "SELECT COUNT(*) FROM \"users\" WHERE (\"Name\" = $1)"
        );
        assert_eq!(backend.count("users", None).sql, "SELECT COUNT(*) FROM \"users\"");
        assert_eq!(
            backend.delete("users", &filter).sql,
            "DELETE FROM \"users\" WHERE (\"Name\" = $1)"
        );
    }

    #[test]
    fn test_collection_paths_are_rejected() {
        let schema = order_schema();
        let config = QueryConfig::default();
        let compiler = QueryCompiler::new(&schema, &config, RelationalBackend::default());

        assert_eq!(
            compiler.compile_condition("Order", &Condition::leaf("lines.sku", "EQ", "A")),
            Err(CompileError::CollectionPath {
                backend: "relational",
                field: "Lines.Sku".into(),
            })
        );
        assert!(matches!(
            compiler.compile_condition("Order", &Condition::leaf("Tags", "EQ", "red")),
            Err(CompileError::CollectionPath { .. })
        ));

        let sorted = Query::new().with_order(Sort::asc("Lines.Sku"));
        let err = compiler.compile_checked("Order", &sorted).unwrap_err();
        assert!(!err.is_internal());

        let projected = Query::new().with_includes(vec!["Tags".into()]);
        assert!(compiler.compile_checked("Order", &projected).is_err());
    }

    #[test]
    fn test_projection_skips_collections() {
        let schema = order_schema();
        let config = QueryConfig::default();
        let compiler = QueryCompiler::new(&schema, &config, RelationalBackend::default());

        let query = Query::new().with_excludes(vec!["Id".into()]);
        let compiled = compiler.compile_checked("Order", &query).unwrap();
        assert_eq!(compiled.projection, Some(vec!["Note".to_string()]));

        let query = Query::new().with_includes(vec!["Id".into()]);
        let compiled = compiler.compile_checked("Order", &query).unwrap();
        assert_eq!(compiled.projection, Some(vec!["Id".to_string()]));
    }

    #[test]
    fn test_quoting() {
        assert_eq!(Dialect::Postgres.quote("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(Dialect::MySql.quote("a`b"), "`a``b`");
        assert_eq!("PostgreSQL".parse::<Dialect>(), Ok(Dialect::Postgres));
        assert!("oracle".parse::<Dialect>().is_err());
    }
}
