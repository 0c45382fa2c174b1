// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Shell command tuples and quoting utilities.
//!
//! Every generator in rooomy eventually produces a __command tuple__: a call
//! (the program, or the name of a call on a held connection) followed by
//! positional arguments. A __batch__ is just an ordered listing of command
//! tuples that the batch executor consumes in order.
//!
//! Rendering a command tuple to a shell string joins the call and every
//! non-empty argument with a single space. Nothing is escaped at render time,
//! so generators must quote dynamic fields themselves through [`quote`] or
//! [`escape`].

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Single command tuple.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct Command {
    call: String,
    args: Vec<String>,
}

impl Command {
    /// Construct new command tuple with no arguments.
    pub fn new(call: impl Into<String>) -> Self {
        Self {
            call: call.into(),
            args: Vec::new(),
        }
    }

    /// Append positional argument.
    ///
    /// Empty arguments are dropped so they never leave double spaces behind
    /// in the rendered command.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        let arg = arg.into();
        if !arg.is_empty() {
            self.args.push(arg);
        }
        self
    }

    /// Append listing of positional arguments.
    pub fn args(self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        args.into_iter().fold(self, |command, arg| command.arg(arg))
    }

    /// Append optional positional argument.
    pub fn arg_opt(self, arg: Option<impl Into<String>>) -> Self {
        match arg {
            Some(arg) => self.arg(arg),
            None => self,
        }
    }

    /// Program or call name.
    pub fn call(&self) -> &str {
        self.call.as_str()
    }

    /// Positional arguments.
    pub fn arguments(&self) -> &[String] {
        self.args.as_slice()
    }

    /// Render command tuple as a shell string.
    pub fn render(&self) -> String {
        std::iter::once(self.call.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Display for Command {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.render().as_str())
    }
}

/// Ordered listing of command tuples.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Batch(Vec<Command>);

impl Batch {
    /// Construct new empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append command tuple to end of batch.
    pub fn push(&mut self, command: Command) {
        self.0.push(command);
    }

    /// Append every command tuple of another batch.
    pub fn extend(&mut self, other: Batch) {
        self.0.extend(other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Command> {
        self.0.iter()
    }

    /// Render every command tuple, one per line.
    pub fn render(&self) -> Vec<String> {
        self.0.iter().map(Command::render).collect()
    }
}

impl FromIterator<Command> for Batch {
    fn from_iter<I: IntoIterator<Item = Command>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Batch {
    type Item = Command;
    type IntoIter = std::vec::IntoIter<Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a Command;
    type IntoIter = std::slice::Iter<'a, Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Vec<Command>> for Batch {
    fn from(commands: Vec<Command>) -> Self {
        Self(commands)
    }
}

/// Wrap parameter in double quotes.
///
/// Characters that stay special inside double quotes (`"`, `\`, `$`, and
/// backticks) are backslash escaped.
pub fn quote(param: impl AsRef<str>) -> String {
    let mut quoted = String::with_capacity(param.as_ref().len() + 2);
    quoted.push('"');
    for ch in param.as_ref().chars() {
        if matches!(ch, '"' | '\\' | '$' | '`') {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}

/// Escape parameter so it survives word splitting as one shell word.
///
/// Follows the usual backslash convention: every byte outside the safe set
/// `[A-Za-z0-9_\-.,:+/@]` is prefixed with a backslash, newlines become a
/// quoted `'\n'`, and the empty string becomes `''`.
pub fn escape(param: impl AsRef<str>) -> String {
    let param = param.as_ref();
    if param.is_empty() {
        return "''".into();
    }

    let mut escaped = String::with_capacity(param.len());
    for ch in param.chars() {
        match ch {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '_' | '-' | '.' | ',' | ':' | '+' | '/' | '@' => {
                escaped.push(ch)
            }
            '\n' => escaped.push_str("'\n'"),
            _ => {
                escaped.push('\\');
                escaped.push(ch);
            }
        }
    }

    escaped
}
