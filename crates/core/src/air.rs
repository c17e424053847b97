use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Version id used when an identifier does not name a version. Zero is a
/// valid id, so absence is never represented by it.
pub const UNSPECIFIED_VERSION: i64 = -1;

/// Structured coordinates of an AIR identifier such as
/// `urn:air:sdxl:lora:civitai:328553@368189.safetensors`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceLocator {
    pub ecosystem: String,
    pub resource_type: String,
    pub source: String,
    pub model_id: i64,
    pub version_id: i64,
    pub format: String,
}

impl ResourceLocator {
    /// The requested version, if the identifier carried one.
    pub fn version(&self) -> Option<i64> {
        if self.version_id == UNSPECIFIED_VERSION {
            None
        } else {
            Some(self.version_id)
        }
    }

    /// The requested format, if the identifier carried one.
    pub fn format(&self) -> Option<&str> {
        if self.format.is_empty() {
            None
        } else {
            Some(&self.format)
        }
    }
}

impl fmt::Display for ResourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "urn:air:{}:{}:{}:{}",
            self.ecosystem, self.resource_type, self.source, self.model_id
        )?;
        if let Some(version) = self.version() {
            write!(f, "@{}", version)?;
        }
        if let Some(format) = self.format() {
            write!(f, ".{}", format)?;
        }
        Ok(())
    }
}

impl FromStr for ResourceLocator {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Parse an AIR identifier.
///
/// Accepts the `urn:air:`, `urn:` and `air:` prefixes (tried in that order),
/// case-insensitively. Every returned field comes from the lower-cased input.
pub fn parse(identifier: &str) -> Result<ResourceLocator, ParseError> {
    let lower = identifier.trim().to_lowercase();

    let uri = if let Some(rest) = lower.strip_prefix("urn:air:") {
        rest
    } else if let Some(rest) = lower.strip_prefix("urn:") {
        rest
    } else if let Some(rest) = lower.strip_prefix("air:") {
        rest
    } else {
        return Err(ParseError::InvalidAir(identifier.to_string()));
    };

    let elements: Vec<&str> = uri.split(':').collect();
    let [ecosystem, resource_type, source, model_part] = elements.as_slice() else {
        return Err(ParseError::InvalidAir(identifier.to_string()));
    };

    let (model_id, version_id, format) = parse_model_part(model_part)?;

    Ok(ResourceLocator {
        ecosystem: ecosystem.to_string(),
        resource_type: resource_type.to_string(),
        source: source.to_string(),
        model_id,
        version_id,
        format,
    })
}

/// Split `model[@version][.format]` into its pieces.
fn parse_model_part(model_part: &str) -> Result<(i64, i64, String), ParseError> {
    let pieces: Vec<&str> = model_part.split('.').collect();
    let (ids, format) = match pieces.as_slice() {
        [ids] => (*ids, ""),
        [ids, format] => (*ids, *format),
        _ => return Err(ParseError::TooManyDots(model_part.to_string())),
    };

    let pieces: Vec<&str> = ids.split('@').collect();
    let (model, version) = match pieces.as_slice() {
        [model] => (*model, None),
        [model, version] => (*model, Some(*version)),
        _ => return Err(ParseError::TooManyAts(model_part.to_string())),
    };

    let model_id = parse_id(model, "model id")?;
    let version_id = match version {
        Some(version) => parse_id(version, "version id")?,
        None => UNSPECIFIED_VERSION,
    };

    Ok((model_id, version_id, format.to_string()))
}

fn parse_id(fragment: &str, field: &'static str) -> Result<i64, ParseError> {
    fragment.parse().map_err(|_| ParseError::InvalidNumber {
        field,
        fragment: fragment.to_string(),
    })
}
