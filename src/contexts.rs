// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Test context expansion.
//!
//! Table driven tests are often written as a handful of __context
//! templates__, each mapping keys to listings of candidate values. Expansion
//! produces one flat mapping per combination of candidates of a template,
//! i.e., the cartesian product of its candidate listings. The products of
//! every template are concatenated in order. Templates are never combined
//! with each other.
//!
//! # Derived Candidates
//!
//! A candidate can be __derived__ from the other values of its mapping.
//! Derived candidates are computed once every plain candidate of the mapping
//! is known, and only see those plain values. There is exactly one
//! substitution pass.
//!
//! In JSON or TOML, a derived candidate is written as `{ format = "..." }`,
//! where every `{key}` placeholder is replaced with the value of `key`.
//! Placeholders of unknown keys are left as is.

use itertools::Itertools;
use regex::{Captures, Regex};
use serde_json::{json, Map, Value};
use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    rc::Rc,
    sync::LazyLock,
};
use tracing::{debug, instrument};

/// One flat combination of candidate values.
pub type Context = Map<String, Value>;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{(\w+)\}").unwrap());

/// Candidate value of a template key.
#[derive(Clone)]
pub enum Candidate {
    /// Plain value.
    Value(Value),

    /// Value computed out of the plain values of the resulting context.
    Derived(Rc<dyn Fn(&Context) -> Value>),
}

impl Candidate {
    pub fn derived(producer: impl Fn(&Context) -> Value + 'static) -> Self {
        Self::Derived(Rc::new(producer))
    }

    /// Derived candidate that fills `{key}` placeholders of a template.
    pub fn format(template: impl Into<String>) -> Self {
        let template = template.into();
        Self::derived(move |context| Value::String(format_context(template.as_str(), context)))
    }

    /// Read candidate out of JSON.
    ///
    /// Objects of the exact shape `{"format": "<template>"}` become derived
    /// candidates. Everything else is a plain value.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Object(object) if object.len() == 1 => match object.get("format") {
                Some(Value::String(template)) => Self::format(template.as_str()),
                _ => Self::Value(value.clone()),
            },
            value => Self::Value(value.clone()),
        }
    }
}

impl Debug for Candidate {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Value(value) => fmt.debug_tuple("Value").field(value).finish(),
            Self::Derived(_) => fmt.write_str("Derived(..)"),
        }
    }
}

impl From<Value> for Candidate {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// Fill `{key}` placeholders with values of context.
///
/// Strings are inserted without quotes, any other value as JSON.
pub fn format_context(template: &str, context: &Context) -> String {
    PLACEHOLDER
        .replace_all(template, |captures: &Captures<'_>| match context.get(&captures[1]) {
            Some(Value::String(text)) => text.clone(),
            Some(value) => value.to_string(),
            None => captures[0].to_string(),
        })
        .into_owned()
}

/// Ordered mapping of keys to candidate listings.
#[derive(Default, Debug, Clone)]
pub struct ContextTemplate {
    entries: Vec<(String, Vec<Candidate>)>,
}

impl ContextTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add key with its candidates. Redefining a key replaces its
    /// candidates in place.
    pub fn with(mut self, key: impl Into<String>, candidates: impl IntoIterator<Item = Candidate>) -> Self {
        let key = key.into();
        let candidates = candidates.into_iter().collect::<Vec<_>>();
        match self.entries.iter_mut().find(|(name, _)| *name == key) {
            Some((_, entry)) => *entry = candidates,
            None => self.entries.push((key, candidates)),
        }
        self
    }

    /// Read template out of JSON object of candidate listings.
    ///
    /// # Errors
    ///
    /// - Return [`ContextError::NotAList`] if any key does not map to a
    ///   list.
    pub fn from_json_map(map: &Map<String, Value>) -> Result<Self> {
        map.iter().try_fold(Self::new(), |template, (key, candidates)| {
            let Value::Array(candidates) = candidates else {
                return Err(ContextError::NotAList { key: key.clone() });
            };
            Ok(template.with(key.as_str(), candidates.iter().map(Candidate::from_json)))
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Every combination of candidates, derived candidates substituted.
    pub fn expand(&self) -> Vec<Context> {
        // INVARIANT: A template without keys yields exactly one empty context.
        if self.entries.is_empty() {
            return vec![Context::new()];
        }

        self.entries
            .iter()
            .map(|(_, candidates)| candidates.iter())
            .multi_cartesian_product()
            .map(|combination| self.substitute(combination))
            .collect()
    }

    fn substitute(&self, combination: Vec<&Candidate>) -> Context {
        let plain = self
            .entries
            .iter()
            .zip(combination.iter())
            .filter_map(|((key, _), candidate)| match candidate {
                Candidate::Value(value) => Some((key.clone(), value.clone())),
                Candidate::Derived(_) => None,
            })
            .collect::<Context>();

        self.entries
            .iter()
            .zip(combination)
            .map(|((key, _), candidate)| {
                let value = match candidate {
                    Candidate::Value(value) => value.clone(),
                    Candidate::Derived(producer) => producer(&plain),
                };
                (key.clone(), value)
            })
            .collect()
    }
}

/// Expand every template, concatenating their contexts in order.
#[instrument(skip(templates), level = "debug")]
pub fn expand(templates: &[ContextTemplate]) -> Vec<Context> {
    let contexts = templates
        .iter()
        .flat_map(ContextTemplate::expand)
        .collect::<Vec<_>>();
    debug!("expand {} template(s) into {} context(s)", templates.len(), contexts.len());
    contexts
}

/// Expand templates read out of JSON objects.
///
/// # Errors
///
/// - Return [`ContextError::NotAList`] if any key does not map to a list.
pub fn expand_json(templates: &[Map<String, Value>]) -> Result<Vec<Context>> {
    let templates = templates
        .iter()
        .map(ContextTemplate::from_json_map)
        .collect::<Result<Vec<_>>>()?;
    Ok(expand(&templates))
}

/// Which role may create which other role.
pub fn sample() -> Vec<ContextTemplate> {
    vec![
        ContextTemplate::new()
            .with("role", [json!("role_3").into(), json!("role_4").into()])
            .with("authenticate_as", [json!("role_1").into(), json!("role_2").into()])
            .with(
                "result",
                [Candidate::format("{authenticate_as} ALLOWED to create {role}")],
            ),
        ContextTemplate::new()
            .with("role", [json!("role_1").into(), json!("role_2").into()])
            .with("authenticate_as", [json!("role_1").into(), json!("role_2").into()])
            .with(
                "result",
                [Candidate::format("{authenticate_as} NOT ALLOWED to create {role}")],
            ),
    ]
}

/// Context expansion error types.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    /// Template key maps to something other than a candidate listing.
    #[error("context template key {key:?} must map to a list of candidates")]
    NotAList { key: String },
}

/// Friendly result alias :3
pub type Result<T, E = ContextError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn templates_concatenate_instead_of_multiplying() -> anyhow::Result<()> {
        let result = expand_json(&[object(json!({"a": [1, 2]})), object(json!({"a": [3]}))])?;
        let expect = vec![
            object(json!({"a": 1})),
            object(json!({"a": 2})),
            object(json!({"a": 3})),
        ];
        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn template_expands_into_cartesian_product() {
        let template = ContextTemplate::new()
            .with("x", [json!(1).into(), json!(2).into()])
            .with("y", [json!("a").into(), json!("b").into(), json!("c").into()]);
        let result = template.expand();
        assert_eq!(result.len(), 6);
        assert_eq!(result[0], object(json!({"x": 1, "y": "a"})));
        assert_eq!(result[5], object(json!({"x": 2, "y": "c"})));
        assert!(result.iter().all(|context| context.keys().map(String::as_str).eq(["x", "y"])));
    }

    #[test]
    fn template_edge_cases() {
        assert_eq!(ContextTemplate::new().expand(), vec![Context::new()]);

        let template = ContextTemplate::new()
            .with("x", [json!(1).into()])
            .with("y", Vec::new());
        assert!(template.expand().is_empty());
    }

    #[test]
    fn derived_candidates_see_plain_values_only() {
        let template = ContextTemplate::new()
            .with("name", [json!("bob").into()])
            .with("greeting", [Candidate::format("hi {name}, {farewell}")])
            .with("farewell", [Candidate::derived(|context| json!(context.len()))]);
        let result = template.expand();
        assert_eq!(
            result,
            vec![object(json!({
                "name": "bob",
                "greeting": "hi bob, {farewell}",
                "farewell": 1,
            }))]
        );
    }

    #[test]
    fn sample_contexts() {
        let result = expand(&sample());
        assert_eq!(result.len(), 8);
        assert_eq!(
            result[0],
            object(json!({
                "role": "role_3",
                "authenticate_as": "role_1",
                "result": "role_1 ALLOWED to create role_3",
            }))
        );
        assert_eq!(result[7]["result"], json!("role_2 NOT ALLOWED to create role_2"));
    }

    #[test]
    fn json_templates_reject_scalars() {
        let result = ContextTemplate::from_json_map(&object(json!({"a": 1})));
        assert!(matches!(result, Err(ContextError::NotAList { key }) if key == "a"));

        let template = ContextTemplate::from_json_map(&object(json!({
            "n": [3],
            "label": [{"format": "n is {n}"}],
        })))
        .unwrap();
        assert_eq!(template.expand()[0]["label"], json!("n is 3"));
    }
}
