// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! SQL query composition.
//!
//! Queries are plain strings. Conditions are trees: a __comparison__ joins
//! its operands with an operator, and a __group__ joins parenthesized
//! sub-conditions with an operator. Groups nest freely.
//!
//! # Condition Definitions
//!
//! As definitions, a condition is written `[operands, operator, recursive]`:
//!
//! - `[["A", "B"], "="]` is the comparison `A = B`.
//! - `[["A", "B"]]` is the same comparison, `=` being the default operator.
//! - `[[["A", "B"], "<"], "AND", ":recursive"]` is a group holding the
//!   comparison `A < B`, rendered as `(A < B)`.
//! - `[[[["A", "B"], "<"], [["C", "D"], ">"]], "OR", true]` is a group of
//!   two comparisons, rendered as `(A < B) OR (C > D)`.
//!
//! Any truthy third element marks a group. A group's operands are either a
//! single condition, or a listing of conditions when every operand is itself
//! a list.

use crate::{
    definition::Value,
    generate::{GenerateError, Result},
};

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Operator used when a condition does not name one.
pub const DEFAULT_OPERATOR: &str = "=";

/// Boolean condition tree.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Condition {
    /// Operands joined by operator, e.g., `A = B`.
    Compare { operands: Vec<String>, operator: String },

    /// Parenthesized sub-conditions joined by operator.
    Group { conditions: Vec<Condition>, operator: String },
}

impl Condition {
    pub fn compare(operands: impl IntoIterator<Item = impl Into<String>>, operator: impl Into<String>) -> Self {
        Self::Compare {
            operands: operands.into_iter().map(Into::into).collect(),
            operator: operator.into(),
        }
    }

    pub fn group(conditions: impl IntoIterator<Item = Condition>, operator: impl Into<String>) -> Self {
        Self::Group {
            conditions: conditions.into_iter().collect(),
            operator: operator.into(),
        }
    }

    /// Read condition out of its definition form.
    ///
    /// # Errors
    ///
    /// - Return [`GenerateError::InvalidField`] if the definition does not
    ///   have the shape of a condition.
    pub fn from_value(value: &Value) -> Result<Self> {
        let Value::List(parts) = value else {
            return Err(invalid("condition", value));
        };

        // INVARIANT: A list of scalars is a comparison with default operator.
        let Some(Value::List(operands)) = parts.first() else {
            let operands = parts.iter().map(operand_text).collect::<Result<Vec<_>>>()?;
            return Ok(Self::compare(operands, DEFAULT_OPERATOR));
        };

        let operator = match parts.get(1) {
            Some(value) if value.is_truthy() => operand_text(value)?,
            _ => DEFAULT_OPERATOR.into(),
        };

        let recursive = parts.get(2).is_some_and(Value::is_truthy);
        if !recursive {
            let operands = operands.iter().map(operand_text).collect::<Result<Vec<_>>>()?;
            return Ok(Self::compare(operands, operator));
        }

        let conditions = if operands.iter().all(|operand| matches!(operand, Value::List(_))) {
            operands.iter().map(Self::from_value).collect::<Result<Vec<_>>>()?
        } else {
            vec![Self::from_value(&Value::List(operands.clone()))?]
        };

        Ok(Self::group(conditions, operator))
    }

    /// Read listing of conditions out of its definition form.
    pub fn many_from_value(value: &Value) -> Result<Vec<Self>> {
        match value {
            Value::List(conditions) => conditions.iter().map(Self::from_value).collect(),
            value if !value.is_truthy() => Ok(Vec::new()),
            value => Err(invalid("conditions", value)),
        }
    }

    /// Render condition as infix expression.
    pub fn render(&self) -> String {
        match self {
            Self::Compare { operands, operator } => operands.join(format!(" {operator} ").as_str()),
            Self::Group { conditions, operator } => conditions
                .iter()
                .map(|condition| format!("({})", condition.render()))
                .collect::<Vec<_>>()
                .join(format!(" {operator} ").as_str()),
        }
    }
}

impl Display for Condition {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.render().as_str())
    }
}

fn operand_text(value: &Value) -> Result<String> {
    value.as_text().ok_or_else(|| invalid("operand", value))
}

fn invalid(field: &'static str, value: &Value) -> GenerateError {
    GenerateError::InvalidField {
        what: "sql condition",
        field,
        found: value.to_string(),
    }
}

/// Render WHERE clause out of top-level conditions joined by AND.
///
/// Renders nothing for an empty listing. The clause always ends in a space,
/// so it can be directly followed by further clauses.
pub fn where_clause(conditions: &[Condition]) -> String {
    if conditions.is_empty() {
        return String::new();
    }

    let rendered = conditions.iter().map(Condition::render).collect::<Vec<_>>();
    format!("WHERE {} ", rendered.join(" AND "))
}

/// Compose SELECT statement. No columns means all columns.
pub fn select(
    table: impl AsRef<str>,
    columns: impl IntoIterator<Item = impl AsRef<str>>,
    conditions: &[Condition],
) -> String {
    let columns = columns
        .into_iter()
        .map(|column| column.as_ref().to_owned())
        .collect::<Vec<_>>();
    let columns = match columns.is_empty() {
        true => "*".into(),
        false => columns.join(", "),
    };

    format!(
        "SELECT {columns} FROM {} {}",
        table.as_ref(),
        where_clause(conditions)
    )
    .trim_end()
    .to_owned()
}

/// Compose UPDATE statement out of column assignments.
pub fn update(
    table: impl AsRef<str>,
    assignments: impl IntoIterator<Item = (impl AsRef<str>, impl AsRef<str>)>,
    conditions: &[Condition],
) -> String {
    let assignments = assignments
        .into_iter()
        .map(|(column, value)| format!("{} = {}", column.as_ref(), value.as_ref()))
        .collect::<Vec<_>>();

    format!(
        "UPDATE {} SET {} {}",
        table.as_ref(),
        assignments.join(", "),
        where_clause(conditions)
    )
    .trim_end()
    .to_owned()
}

/// List every base table of a database outside of the system schemas.
pub fn show_tables() -> String {
    "SELECT table_schema || '.' || table_name \
     FROM information_schema.tables \
     WHERE table_type = 'BASE TABLE' \
     AND table_schema NOT IN ('pg_catalog', 'information_schema')"
        .into()
}

/// Turn query into a named subquery.
pub fn subquery(query: impl AsRef<str>, tmp_table: impl AsRef<str>) -> String {
    format!("({}) as {}", query.as_ref(), tmp_table.as_ref())
}

/// Turn query into a count of its rows.
pub fn count(query: impl AsRef<str>) -> String {
    format!("SELECT COUNT(*) FROM {}", subquery(query, "resultset_table"))
}

pub fn show_tables_count() -> String {
    count(show_tables())
}

/// Drop everything the connected user owns.
pub fn drop_owned_current_user() -> String {
    "DROP OWNED BY CURRENT_USER CASCADE".into()
}

/// Count tables, drop everything owned, count tables again.
pub fn drop_owned_queries() -> Vec<String> {
    vec![
        show_tables_count(),
        drop_owned_current_user(),
        show_tables_count(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;

    fn conditions(json: &str) -> Vec<Condition> {
        Condition::many_from_value(&Value::from_arg(json)).unwrap()
    }

    #[test]
    fn where_clause_for_single_comparison() {
        let result = where_clause(&conditions(r#"[[["A", "B"], "="]]"#));
        assert_eq!(result, "WHERE A = B ");
    }

    #[test]
    fn where_clause_for_recursive_condition() {
        let result = where_clause(&conditions(r#"[[[["A", "B"], "<"], "AND", ":recursive"]]"#));
        assert_eq!(result, "WHERE (A < B) ");
    }

    #[test_case(r#"[[["A", "B"]]]"#, "WHERE A = B "; "default operator")]
    #[test_case(r#"[["A", "B"]]"#, "WHERE A = B "; "bare operands")]
    #[test_case(r#"[[["A", "B", "C"], "OR"]]"#, "WHERE A OR B OR C "; "many operands")]
    #[test_case(
        r#"[[[[["A", "B"], "<"], [["C", "D"], ">"]], "OR", true]]"#,
        "WHERE (A < B) OR (C > D) ";
        "group of comparisons"
    )]
    #[test_case(
        r#"[[[[[[["A", "B"], "<"], [["C", "D"], ">"]], "OR", true], [["E", "F"]]], "AND", true]]"#,
        "WHERE ((A < B) OR (C > D)) AND (E = F) ";
        "nested groups"
    )]
    #[test_case(r#"[[["A", "1"]], [["B", "2"], "<>"]]"#, "WHERE A = 1 AND B <> 2 "; "top-level conjunction")]
    #[test_case("[]", ""; "no conditions")]
    #[test]
    fn where_clause_renders(json: &str, expect: &str) {
        pretty_assertions::assert_eq!(where_clause(&conditions(json)), expect);
    }

    #[test]
    fn condition_rejects_nested_lists_as_operands() {
        let result = Condition::from_value(&Value::from_arg(r#"[[["A", ["B"]], "="]]"#));
        assert!(matches!(result, Err(GenerateError::InvalidField { field: "operand", .. })));
    }

    #[test]
    fn select_and_update_statements() {
        let conditions = vec![Condition::compare(["id", "7"], "=")];
        assert_eq!(
            select("users", ["id", "name"], &conditions),
            "SELECT id, name FROM users WHERE id = 7"
        );
        assert_eq!(select("users", Vec::<String>::new(), &[]), "SELECT * FROM users");
        assert_eq!(
            update("users", [("name", "'bob'"), ("age", "3")], &conditions),
            "UPDATE users SET name = 'bob', age = 3 WHERE id = 7"
        );
    }

    #[test]
    fn count_wraps_query_into_subquery() {
        assert_eq!(
            count("SELECT 1"),
            "SELECT COUNT(*) FROM (SELECT 1) as resultset_table"
        );
        assert_eq!(drop_owned_queries().len(), 3);
        assert_eq!(drop_owned_queries()[0], show_tables_count());
    }
}
