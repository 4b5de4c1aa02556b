//! Event remapping declarations.

use mantle_core::MantleError;
use std::fmt;

/// Where an intercepted event is sent.
///
/// Parsed from the remap syntax `[+]Target[:dataKey]`:
/// a leading `+` also forwards the original event, and a `:dataKey` suffix
/// is added to the new event's payload as its `target` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemapTarget {
    name: String,
    forward_original: bool,
    data_key: Option<String>,
}

impl RemapTarget {
    /// Parse the remap target for events named `source`.
    ///
    /// The raw target must differ from `source`; decorated forms such as
    /// `+Click` or `Click:row` may still name the source event.
    pub fn parse(source: &str, target: &str) -> Result<Self, MantleError> {
        if target == source {
            return Err(MantleError::invalid_argument(format!(
                "remap for `{source}` targets itself"
            )));
        }
        let (forward_original, rest) = match target.strip_prefix('+') {
            Some(rest) => (true, rest),
            None => (false, target),
        };
        let (name, data_key) = match rest.split_once(':') {
            Some((name, key)) => (name, Some(key.to_owned())),
            None => (rest, None),
        };
        if name.is_empty() {
            return Err(MantleError::invalid_argument(format!(
                "remap for `{source}` has no target event name"
            )));
        }
        Ok(Self {
            name: name.to_owned(),
            forward_original,
            data_key,
        })
    }

    /// The name of the emitted event.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the original event is emitted first.
    pub fn forwards_original(&self) -> bool {
        self.forward_original
    }

    /// The value stored as the new event's `target` field.
    pub fn data_key(&self) -> Option<&str> {
        self.data_key.as_deref()
    }
}

impl fmt::Display for RemapTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.forward_original {
            f.write_str("+")?;
        }
        f.write_str(&self.name)?;
        if let Some(key) = &self.data_key {
            write!(f, ":{key}")?;
        }
        Ok(())
    }
}

/// Intercept events named `source` and emit `target` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRemap {
    source: String,
    target: RemapTarget,
}

impl EventRemap {
    /// Parse a remap for events named `source`.
    pub fn new(source: impl Into<String>, target: &str) -> Result<Self, MantleError> {
        let source = source.into();
        if source.is_empty() {
            return Err(MantleError::invalid_argument("remap source event name is empty"));
        }
        let target = RemapTarget::parse(&source, target)?;
        Ok(Self { source, target })
    }

    /// The intercepted event name.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Where intercepted events go.
    pub fn target(&self) -> &RemapTarget {
        &self.target
    }
}

/// The source event name of a preset key such as `onClick`.
///
/// A key is a remap when it starts with `on` followed by a character that is
/// not lowercase; the rest of the key is the event name.
pub fn remap_source(key: &str) -> Option<&str> {
    let source = key.strip_prefix("on")?;
    source
        .chars()
        .next()
        .filter(|c| !c.is_lowercase())
        .map(|_| source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        let target = RemapTarget::parse("Click", "Select").unwrap();
        assert_eq!(target.name(), "Select");
        assert!(!target.forwards_original());
        assert_eq!(target.data_key(), None);
    }

    #[test]
    fn test_parse_forward_and_key() {
        let target = RemapTarget::parse("Click", "+RemoveItem:row").unwrap();
        assert_eq!(target.name(), "RemoveItem");
        assert!(target.forwards_original());
        assert_eq!(target.data_key(), Some("row"));
        assert_eq!(target.to_string(), "+RemoveItem:row");
    }

    #[test]
    fn test_parse_rejects_bad_targets() {
        assert!(RemapTarget::parse("Click", "").is_err());
        assert!(RemapTarget::parse("Click", "+").is_err());
        assert!(RemapTarget::parse("Click", ":key").is_err());
        assert!(RemapTarget::parse("Click", "Click").is_err());
    }

    #[test]
    fn test_parse_decorated_self_target() {
        let annotated = RemapTarget::parse("Click", "Click:row").unwrap();
        assert_eq!(annotated.name(), "Click");
        assert_eq!(annotated.data_key(), Some("row"));

        let doubled = RemapTarget::parse("Click", "+Click").unwrap();
        assert_eq!(doubled.name(), "Click");
        assert!(doubled.forwards_original());
    }

    #[test]
    fn test_remap_source() {
        assert_eq!(remap_source("onClick"), Some("Click"));
        assert_eq!(remap_source("on_close"), Some("_close"));
        assert_eq!(remap_source("online"), None);
        assert_eq!(remap_source("on"), None);
        assert_eq!(remap_source("text"), None);
    }
}
