// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Queries over listings of JSON rows.
//!
//! Every function here takes a listing of JSON objects, each representing a
//! row of some table, e.g., the output of `psql` piped through a JSON
//! aggregate. Rows are expected to carry `id` and `name` columns, plus an
//! optional `members` column holding further rows with at least an `id`.
//! Anything that is not an object, or lacks a column, simply never matches.

use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Id of first row whose name equals given name.
pub fn id_by_name<'r>(rows: &'r [Value], name: &str) -> Option<&'r Value> {
    rows.iter()
        .find(|row| row.get("name").and_then(Value::as_str) == Some(name))
        .and_then(|row| row.get("id"))
}

/// Ids of members of every row with given id.
pub fn member_ids(rows: &[Value], id: &Value) -> Vec<Value> {
    rows.iter()
        .filter(|row| row.get("id") == Some(id))
        .filter_map(|row| row.get("members").and_then(Value::as_array))
        .flatten()
        .filter_map(|member| member.get("id").cloned())
        .collect()
}

/// Ids of members of given id, recursively.
///
/// Every member id maps to its own tree of member ids. The root id itself is
/// never part of the tree, and no id is visited twice, so cycles terminate.
/// Object keys are ids in textual form.
pub fn member_id_tree(rows: &[Value], id: &Value) -> Map<String, Value> {
    let mut visited = HashSet::new();
    member_id_tree_visit(rows, id, &mut visited)
}

fn member_id_tree_visit(rows: &[Value], id: &Value, visited: &mut HashSet<String>) -> Map<String, Value> {
    visited.insert(id_key(id));

    let mut to_visit: Vec<(String, Value)> = Vec::new();
    for member_id in member_ids(rows, id) {
        let key = id_key(&member_id);
        if !visited.contains(&key) && !to_visit.iter().any(|(seen, _)| *seen == key) {
            to_visit.push((key, member_id));
        }
    }

    let mut tree = Map::new();
    for (key, member_id) in to_visit {
        let subtree = member_id_tree_visit(rows, &member_id, visited);
        tree.insert(key, Value::Object(subtree));
    }

    tree
}

fn id_key(id: &Value) -> String {
    match id {
        Value::String(text) => text.clone(),
        id => id.to_string(),
    }
}

/// Rows where column equals value.
pub fn filter_by_kv<'r>(rows: &'r [Value], column: &str, value: &Value) -> Vec<&'r Value> {
    rows.iter().filter(|row| row.get(column) == Some(value)).collect()
}

/// Rows where textual column matches pattern.
pub fn filter_by_kv_match<'r>(rows: &'r [Value], column: &str, pattern: &Regex) -> Vec<&'r Value> {
    rows.iter()
        .filter(|row| {
            row.get(column)
                .and_then(Value::as_str)
                .is_some_and(|text| pattern.is_match(text))
        })
        .collect()
}

/// Rows holding value in any column.
pub fn filter_by_value<'r>(rows: &'r [Value], value: &Value) -> Vec<&'r Value> {
    rows.iter()
        .filter(|row| {
            row.as_object()
                .is_some_and(|object| object.values().any(|field| field == value))
        })
        .collect()
}

/// Rows with any column name matching pattern.
pub fn filter_by_key_match<'r>(rows: &'r [Value], pattern: &Regex) -> Vec<&'r Value> {
    rows.iter()
        .filter(|row| {
            row.as_object()
                .is_some_and(|object| object.keys().any(|key| pattern.is_match(key)))
        })
        .collect()
}

/// Rows with any textual column matching pattern.
pub fn filter_by_value_match<'r>(rows: &'r [Value], pattern: &Regex) -> Vec<&'r Value> {
    rows.iter()
        .filter(|row| {
            row.as_object().is_some_and(|object| {
                object
                    .values()
                    .filter_map(Value::as_str)
                    .any(|text| pattern.is_match(text))
            })
        })
        .collect()
}

/// Single column of rows where column equals value.
///
/// Without a column to select, whole rows are returned. Rows lacking the
/// selected column yield null.
pub fn select_column_by_kv(rows: &[Value], column: &str, value: &Value, select: Option<&str>) -> Vec<Value> {
    select_column_by(rows, |rows| filter_by_kv(rows, column, value), select)
}

/// Single column of rows kept by filter.
pub fn select_column_by<'r, F>(rows: &'r [Value], filter: F, select: Option<&str>) -> Vec<Value>
where
    F: FnOnce(&'r [Value]) -> Vec<&'r Value>,
{
    let filtered = filter(rows);
    match select {
        Some(select) => filtered
            .into_iter()
            .map(|row| row.get(select).cloned().unwrap_or(Value::Null))
            .collect(),
        None => filtered.into_iter().cloned().collect(),
    }
}

/// Several columns of rows where column equals value.
///
/// Without columns to select, whole rows are returned.
pub fn select_columns_by_kv(rows: &[Value], column: &str, value: &Value, select: Option<&[&str]>) -> Vec<Value> {
    select_columns_by(rows, |rows| filter_by_kv(rows, column, value), select)
}

/// Several columns of rows kept by filter.
pub fn select_columns_by<'r, F>(rows: &'r [Value], filter: F, select: Option<&[&str]>) -> Vec<Value>
where
    F: FnOnce(&'r [Value]) -> Vec<&'r Value>,
{
    let filtered = filter(rows);
    let Some(select) = select else {
        return filtered.into_iter().cloned().collect();
    };

    filtered
        .into_iter()
        .map(|row| {
            let columns = select
                .iter()
                .map(|name| (name.to_string(), row.get(*name).cloned().unwrap_or(Value::Null)))
                .collect::<Map<_, _>>();
            Value::Object(columns)
        })
        .collect()
}

/// Column names of every row. Rows that are not objects have none.
pub fn map_to_keys(rows: &[Value]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            row.as_object()
                .map(|object| object.keys().cloned().collect())
                .unwrap_or_default()
        })
        .collect()
}
