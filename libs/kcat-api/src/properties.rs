use std::collections::BTreeMap;

use crate::error::ClientError;

/// Prefix that routes a property to the topic configuration.
pub const TOPIC_PREFIX: &str = "topic.";

/// Passthrough broker client properties, split into global and topic scope.
///
/// Names prefixed with `topic.` land in the topic scope with the prefix
/// removed; everything else is global. Later assignments win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientProperties {
    global: BTreeMap<String, String>,
    topic: BTreeMap<String, String>,
}

impl ClientProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        match name.strip_prefix(TOPIC_PREFIX) {
            Some(topic_name) if !topic_name.is_empty() => {
                self.topic.insert(topic_name.to_string(), value);
            }
            _ => {
                self.global.insert(name, value);
            }
        }
        self
    }

    /// Apply a `name=value` assignment.
    pub fn assign(&mut self, assignment: &str) -> Result<&mut Self, ClientError> {
        let (name, value) = parse_assignment(assignment)?;
        Ok(self.set(name, value))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        let value = match name.strip_prefix(TOPIC_PREFIX) {
            Some(topic_name) => self.topic.get(topic_name),
            None => self.global.get(name),
        };
        value.map(String::as_str)
    }

    /// Set `name` only if it has no value yet.
    pub fn set_default(&mut self, name: &str, value: &str) -> &mut Self {
        if self.get(name).is_none() {
            self.set(name, value);
        }
        self
    }

    pub fn global(&self) -> impl Iterator<Item = (&str, &str)> {
        self.global.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn topic(&self) -> impl Iterator<Item = (&str, &str)> {
        self.topic.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Split `name=value`. The value may itself contain `=`.
pub fn parse_assignment(s: &str) -> Result<(&str, &str), ClientError> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name, value)),
        _ => Err(ClientError::config(format!(
            "expected property=value, not '{s}'"
        ))),
    }
}
