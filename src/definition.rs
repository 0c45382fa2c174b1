// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Definitions and their resolution.
//!
//! A __definition__ is the basic building block that every generator in
//! rooomy accepts. It is either a literal listing of values, or a named
//! reference to a __preset__ that produces such a listing when resolved. This
//! lets every generator transparently accept "either a value or the name of
//! something that produces the value", which in turn makes it possible to
//! compose named presets out of other named presets.
//!
//! # Resolution
//!
//! Resolution always yields a flat listing, one level deep:
//!
//! - A literal list resolves to its own elements, unchanged.
//! - A scalar resolves to a one element listing holding the scalar.
//! - A reference to a preset resolves to whatever the preset produces,
//!   wrapped the same way.
//! - A reference to anything else resolves to its own name as literal data.
//!
//! The last rule also covers references that collide with the name of a
//! registered batch generator. Generators need arguments, so they are never
//! invoked during resolution.
//!
//! # Batch Generators
//!
//! A __batch generator definition__ is a definition whose first element names
//! a registered generator, and whose remaining elements are the arguments to
//! pass to it. See [`Registry::batch_from_generator`].

use crate::{
    generate::{self, GenerateError},
    shell::Batch,
};

use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::{Debug, Display, Formatter, Result as FmtResult},
};
use tracing::{debug, instrument, warn};

/// Dynamic definition datum.
///
/// In TOML a reference is written as `{ ref = "name" }`. On the command line
/// a reference is any argument prefixed with a colon, e.g., `:psql-db-sample`.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent value.
    #[default]
    Nil,

    Bool(bool),

    Int(i64),

    Str(String),

    /// Named reference to a preset.
    Ref(Reference),

    List(Vec<Value>),
}

impl Value {
    /// Construct named reference.
    pub fn reference(name: impl Into<String>) -> Self {
        Self::Ref(Reference { name: name.into() })
    }

    /// Construct list out of anything convertible into values.
    pub fn list(values: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }

    /// Parse command line argument into a value.
    ///
    /// - `:name` becomes a reference.
    /// - `nil`, `true`, and `false` become their respective scalars.
    /// - Arguments starting with `[` are parsed as JSON lists.
    /// - Anything else is kept as a string.
    pub fn from_arg(arg: impl AsRef<str>) -> Self {
        let arg = arg.as_ref();
        match arg {
            "nil" => Self::Nil,
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            _ if arg.len() > 1 && arg.starts_with(':') => Self::reference(&arg[1..]),
            _ if arg.starts_with('[') => {
                serde_json::from_str(arg).unwrap_or_else(|_| Self::Str(arg.into()))
            }
            _ => Self::Str(arg.into()),
        }
    }

    /// Parse command line arguments into a single definition.
    ///
    /// A lone argument stands for itself, so `:name` stays a reference that
    /// resolution can follow, and a JSON list stays that list. Several
    /// arguments form a literal list of their parsed values.
    pub fn from_args(args: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        let mut values = args.into_iter().map(Self::from_arg).collect::<Vec<_>>();
        match values.len() {
            1 => values.remove(0),
            _ => Self::List(values),
        }
    }

    /// Nil and false are both treated as "not given".
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Self::Nil | Self::Bool(false))
    }

    /// Textual form of a scalar.
    ///
    /// Returns [`None`] for nil, false, lists, and references.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Str(text) => Some(text.clone()),
            Self::Int(int) => Some(int.to_string()),
            Self::Bool(true) => Some("true".into()),
            _ => None,
        }
    }

    /// Name of reference, or the string itself.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Str(name) => Some(name.as_str()),
            Self::Ref(reference) => Some(reference.name.as_str()),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Nil => fmt.write_str("nil"),
            Self::Bool(flag) => write!(fmt, "{flag}"),
            Self::Int(int) => write!(fmt, "{int}"),
            Self::Str(text) => fmt.write_str(text),
            Self::Ref(reference) => write!(fmt, ":{}", reference.name),
            Self::List(values) => {
                let inner = values.iter().map(ToString::to_string).collect::<Vec<_>>();
                write!(fmt, "[{}]", inner.join(", "))
            }
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Str(text.into())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::Str(text)
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Self::Bool(flag)
    }
}

impl From<i64> for Value {
    fn from(int: i64) -> Self {
        Self::Int(int)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Self::List(values)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Nil)
    }
}

/// Named reference to a preset.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct Reference {
    #[serde(rename = "ref")]
    pub name: String,
}

/// Literal listing or named reference to one.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Definition {
    Literal(Vec<Value>),
    Reference(String),
}

impl From<Value> for Definition {
    fn from(value: Value) -> Self {
        match value {
            Value::List(values) => Self::Literal(values),
            Value::Ref(reference) => Self::Reference(reference.name),
            scalar => Self::Literal(vec![scalar]),
        }
    }
}

impl From<&Value> for Definition {
    fn from(value: &Value) -> Self {
        Self::from(value.clone())
    }
}

/// Zero argument producer of a definition.
pub type Producer = Box<dyn Fn(&Registry) -> Value>;

/// Batch generator taking definition arguments.
pub type Generator = Box<dyn Fn(&Registry, &[Value]) -> generate::Result<Batch>>;

/// Explicit table of named presets and batch generators.
pub struct Registry {
    presets: BTreeMap<String, Producer>,
    generators: BTreeMap<String, Generator>,
}

impl Registry {
    /// Construct registry without any presets or generators.
    pub fn empty() -> Self {
        Self {
            presets: BTreeMap::new(),
            generators: BTreeMap::new(),
        }
    }

    /// Construct registry with built-in generators and sample presets.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        generate::register_builtins(&mut registry);
        registry
    }

    /// Define preset out of a fixed value.
    pub fn define(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let value = value.into();
        self.define_with(name, move |_| value.clone());
    }

    /// Define preset out of a producer.
    ///
    /// Producers receive the registry itself so they can build on top of
    /// other presets.
    pub fn define_with<F>(&mut self, name: impl Into<String>, producer: F)
    where
        F: Fn(&Registry) -> Value + 'static,
    {
        let name = name.into();
        if self.generators.contains_key(&name) {
            warn!("preset {name:?} shadows a batch generator, it will resolve as literal data");
        }

        if self.presets.insert(name.clone(), Box::new(producer)).is_some() {
            debug!("redefine preset {name:?}");
        }
    }

    /// Register named batch generator.
    pub fn register_generator<F>(&mut self, name: impl Into<String>, generator: F)
    where
        F: Fn(&Registry, &[Value]) -> generate::Result<Batch> + 'static,
    {
        self.generators.insert(name.into(), Box::new(generator));
    }

    pub fn is_preset(&self, name: impl AsRef<str>) -> bool {
        self.presets.contains_key(name.as_ref())
    }

    pub fn is_generator(&self, name: impl AsRef<str>) -> bool {
        self.generators.contains_key(name.as_ref())
    }

    /// Names of all presets in sorted order.
    pub fn preset_names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }

    /// Names of all batch generators in sorted order.
    pub fn generator_names(&self) -> impl Iterator<Item = &str> {
        self.generators.keys().map(String::as_str)
    }

    /// Resolve value into a flat listing.
    ///
    /// See [module level](self) documentation for the exact rules.
    pub fn resolve(&self, value: &Value) -> Vec<Value> {
        self.resolve_definition(&Definition::from(value))
    }

    /// Resolve definition into a flat listing.
    pub fn resolve_definition(&self, definition: &Definition) -> Vec<Value> {
        match definition {
            Definition::Literal(values) => values.clone(),
            // INVARIANT: Never invoke generators while resolving.
            Definition::Reference(name) if self.is_generator(name) => {
                vec![Value::Str(name.clone())]
            }
            Definition::Reference(name) => match self.presets.get(name) {
                Some(producer) => match producer(self) {
                    Value::List(values) => values,
                    scalar => vec![scalar],
                },
                None => vec![Value::Str(name.clone())],
            },
        }
    }

    /// Generate batch out of a batch generator definition.
    ///
    /// # Errors
    ///
    /// - Return [`GenerateError::EmptyGenerator`] if definition resolves to
    ///   nothing.
    /// - Return [`GenerateError::UnknownGenerator`] if first element does not
    ///   name a registered generator.
    /// - Return whatever error the generator itself returns.
    #[instrument(skip(self, definition), level = "debug")]
    pub fn batch_from_generator(&self, definition: &Value) -> generate::Result<Batch> {
        let resolved = self.resolve(definition);
        let (head, args) = resolved.split_first().ok_or(GenerateError::EmptyGenerator)?;
        let name = head
            .as_name()
            .ok_or_else(|| GenerateError::UnknownGenerator(head.to_string()))?;
        let generator = self
            .generators
            .get(name)
            .ok_or_else(|| GenerateError::UnknownGenerator(name.into()))?;

        debug!("generate batch through {name:?} with {} argument(s)", args.len());
        generator(self, args)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Registry {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.debug_struct("Registry")
            .field("presets", &self.presets.keys().collect::<Vec<_>>())
            .field("generators", &self.generators.keys().collect::<Vec<_>>())
            .finish()
    }
}
