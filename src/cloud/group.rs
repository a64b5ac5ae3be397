use crate::{Error, ErrorContext, Result};
use std::fmt;

/// A statically declared node group with fixed size bounds.
///
/// Constructed once at startup and never mutated; `0 <= min_size <= max_size`
/// holds for every value of this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    id: String,
    name: String,
    region: String,
    min_size: usize,
    max_size: usize,
}

impl Group {
    pub fn new(id: impl Into<String>, min_size: usize, max_size: usize) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::configuration(
                "group id must not be empty",
                ErrorContext::new().with_source("group"),
            ));
        }
        if min_size > max_size {
            return Err(Error::configuration(
                format!("min size {} exceeds max size {}", min_size, max_size),
                ErrorContext::new().with_group_id(id).with_source("group"),
            ));
        }
        Ok(Self {
            name: id.clone(),
            id,
            region: String::new(),
            min_size,
            max_size,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn min_size(&self) -> usize {
        self.min_size
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Short form used in orchestrator debug output: `id (min:max)`.
    pub fn debug_string(&self) -> String {
        format!("{} ({}:{})", self.id, self.min_size, self.max_size)
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "group: {} min={} max={}",
            self.id, self.min_size, self.max_size
        )
    }
}
