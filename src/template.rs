//! Key templates with positional placeholders
//!
//! A template such as `product:{id}:detail:{detail.id}` is filled from an
//! ordered list of candidate values. Placeholder `n` is resolved against
//! candidate `n`: one candidate is consumed per placeholder occurrence, and
//! substituted text is never scanned again.

use serde_json::Value;

use crate::value::{render, resolve};
use crate::{CacheConfig, CacheError, KeyError};

/// Default opening delimiter
pub const DEFAULT_PLACEHOLDER_PREFIX: &str = "{";
/// Default closing delimiter
pub const DEFAULT_PLACEHOLDER_SUFFIX: &str = "}";

/// Substitutes `{path}` placeholders in key templates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderResolver {
    prefix: String,
    suffix: String,
}

impl Default for PlaceholderResolver {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PLACEHOLDER_PREFIX.to_owned(),
            suffix: DEFAULT_PLACEHOLDER_SUFFIX.to_owned(),
        }
    }
}

impl PlaceholderResolver {
    /// Create a resolver with custom delimiters. Neither may be empty.
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Result<Self, CacheError> {
        let (prefix, suffix) = (prefix.into(), suffix.into());
        if prefix.is_empty() || suffix.is_empty() {
            return Err(CacheError::InvalidConfig(
                "placeholder delimiters must not be empty",
            ));
        }
        Ok(Self { prefix, suffix })
    }

    /// Create a resolver from the delimiters in a [`CacheConfig`]
    pub fn from_config(config: &CacheConfig) -> Result<Self, CacheError> {
        Self::new(
            config.placeholder_prefix.as_str(),
            config.placeholder_suffix.as_str(),
        )
    }

    /// Fill every placeholder in `template` from `candidates`, in order.
    ///
    /// Extra candidates are ignored. A template without placeholders is
    /// returned verbatim.
    pub fn substitute(&self, template: &str, candidates: &[Value]) -> Result<String, KeyError> {
        let mut output = String::with_capacity(template.len());
        let mut remaining = candidates.iter();
        let mut offset = 0;

        while let Some(start) = template[offset..].find(&self.prefix) {
            let start = offset + start;
            let body_start = start + self.prefix.len();
            let end = template[body_start..]
                .find(&self.suffix)
                .map(|end| body_start + end)
                .ok_or_else(|| KeyError::MalformedTemplate {
                    template: template.to_owned(),
                    position: start,
                })?;

            let candidate = remaining
                .next()
                .ok_or_else(|| KeyError::InsufficientArguments {
                    template: template.to_owned(),
                    available: candidates.len(),
                })?;

            let resolved = resolve(candidate, &template[body_start..end])?;
            output.push_str(&template[offset..start]);
            output.push_str(&render(resolved));
            offset = end + self.suffix.len();
        }

        output.push_str(&template[offset..]);
        Ok(output)
    }
}
