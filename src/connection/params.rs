//! Typed access to rule parameters.
//!
//! Every rule reads the keys it understands through a [`ParamReader`];
//! [`ParamReader::finish`] then rejects whatever was left untouched, so a
//! misspelled or foreign key fails the connect call instead of being
//! silently ignored.

use std::collections::BTreeSet;

use super::error::BuildError;
use super::types::{ConnParams, ParamValue};

pub struct ParamReader<'a> {
    rule: &'a str,
    params: &'a ConnParams,
    used: BTreeSet<&'a str>,
}

impl<'a> ParamReader<'a> {
    pub fn new(rule: &'a str, params: &'a ConnParams) -> Self {
        Self {
            rule,
            params,
            used: BTreeSet::new(),
        }
    }

    pub fn rule(&self) -> &'a str {
        self.rule
    }

    fn take(&mut self, key: &str) -> Option<&'a ParamValue> {
        let (key, value) = self.params.get_key_value(key)?;
        self.used.insert(key.as_str());
        Some(value)
    }

    fn bad(&self, key: &str, reason: impl Into<String>) -> BuildError {
        BuildError::BadParameter {
            rule: self.rule.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn bool_or(&mut self, key: &str, default: bool) -> Result<bool, BuildError> {
        match self.take(key) {
            None => Ok(default),
            Some(ParamValue::Bool(b)) => Ok(*b),
            Some(other) => Err(self.bad(key, format!("expected bool, got {}", other.type_name()))),
        }
    }

    /// Required non-negative integer
    pub fn count(&mut self, key: &str) -> Result<usize, BuildError> {
        match self.take(key) {
            None => Err(self.bad(key, "parameter is required")),
            Some(ParamValue::Int(n)) if *n >= 0 => Ok(*n as usize),
            Some(ParamValue::Int(n)) => Err(self.bad(key, format!("must be non-negative, got {}", n))),
            Some(other) => Err(self.bad(key, format!("expected integer, got {}", other.type_name()))),
        }
    }

    pub fn count_or(&mut self, key: &str, default: usize) -> Result<usize, BuildError> {
        if self.params.contains_key(key) {
            self.count(key)
        } else {
            Ok(default)
        }
    }

    /// Probability in `[0, 1]`; integers are accepted
    pub fn probability_or(&mut self, key: &str, default: f64) -> Result<f64, BuildError> {
        let p = match self.take(key) {
            None => return Ok(default),
            Some(ParamValue::Float(p)) => *p,
            Some(ParamValue::Int(p)) => *p as f64,
            Some(other) => return Err(self.bad(key, format!("expected number, got {}", other.type_name()))),
        };
        if (0.0..=1.0).contains(&p) {
            Ok(p)
        } else {
            Err(self.bad(key, format!("probability must be in [0, 1], got {}", p)))
        }
    }

    pub fn text_or(&mut self, key: &str, default: &'a str) -> Result<&'a str, BuildError> {
        match self.take(key) {
            None => Ok(default),
            Some(ParamValue::Text(s)) => Ok(s.as_str()),
            Some(other) => Err(self.bad(key, format!("expected string, got {}", other.type_name()))),
        }
    }

    /// Fail if any parameter was not consumed by the rule
    pub fn finish(self) -> Result<(), BuildError> {
        let unknown: Vec<String> = self
            .params
            .keys()
            .filter(|key| !self.used.contains(key.as_str()))
            .cloned()
            .collect();
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(BuildError::UnknownParameters {
                rule: self.rule.to_string(),
                keys: unknown,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::types::ConnSpec;

    #[test]
    fn test_typed_reads() {
        let spec = ConnSpec::new("r")
            .with("indegree", 4)
            .with("p", 1)
            .with("allow_autapses", false)
            .with("pool_type", "block");
        let mut reader = ParamReader::new("r", &spec.params);

        assert_eq!(reader.count("indegree"), Ok(4));
        assert_eq!(reader.probability_or("p", 0.5), Ok(1.0));
        assert_eq!(reader.bool_or("allow_autapses", true), Ok(false));
        assert_eq!(reader.bool_or("allow_multapses", true), Ok(true));
        assert_eq!(reader.text_or("pool_type", "random"), Ok("block"));
        assert_eq!(reader.count_or("pool_size", 1), Ok(1));
        assert!(reader.finish().is_ok());
    }

    #[test]
    fn test_unconsumed_keys_are_rejected() {
        let spec = ConnSpec::new("all_to_all").with("indegree", 3).with("allow_autapses", true);
        let mut reader = ParamReader::new("all_to_all", &spec.params);
        reader.bool_or("allow_autapses", true).unwrap();

        match reader.finish() {
            Err(BuildError::UnknownParameters { rule, keys }) => {
                assert_eq!(rule, "all_to_all");
                assert_eq!(keys, vec!["indegree".to_string()]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_bad_values() {
        let spec = ConnSpec::new("r")
            .with("indegree", -1)
            .with("outdegree", 2.5)
            .with("p", 1.5)
            .with("allow_autapses", 1);
        let mut reader = ParamReader::new("r", &spec.params);

        assert!(matches!(reader.count("indegree"), Err(BuildError::BadParameter { .. })));
        assert!(matches!(reader.count("outdegree"), Err(BuildError::BadParameter { .. })));
        assert!(matches!(reader.probability_or("p", 1.0), Err(BuildError::BadParameter { .. })));
        assert!(matches!(reader.bool_or("allow_autapses", true), Err(BuildError::BadParameter { .. })));
        assert!(matches!(reader.count("N"), Err(BuildError::BadParameter { .. })));
    }
}
