//! Composite instance-identifier builder.
//!
//! Update records are matched against a composite identifier built from an
//! ordered list of named byte attributes under a scope tag, e.g.
//! `EC\DOCKTYPE_07&DOCKSKU_02&DEVTYPE_01&INST_00`.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum InstanceIdError {
    #[error("Malformed scope name: {0:?}")]
    InvalidScope(String),
    #[error("Malformed attribute key: {0:?}")]
    InvalidKey(String),
    #[error("No attributes supplied for scope {0:?}")]
    NoAttributes(String),
    #[error("Attribute {key} value 0x{value:02X} is outside the known registry")]
    UnknownAttribute { key: &'static str, value: u8 },
}

/// Builds a composite identifier from ordered named byte attributes.
///
/// Attribute order is significant: the rendered identifier lists fields in
/// insertion order, and matching is string-exact.
#[derive(Debug, Clone)]
pub struct InstanceIdBuilder {
    scope: String,
    attrs: Vec<(String, u8)>,
}

impl InstanceIdBuilder {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            attrs: Vec::new(),
        }
    }

    /// Append a named byte attribute.
    pub fn attr(mut self, key: impl Into<String>, value: u8) -> Self {
        self.attrs.push((key.into(), value));
        self
    }

    /// Render the composite identifier.
    ///
    /// Scope and keys must be non-empty uppercase ASCII alphanumerics, and
    /// at least one attribute must be present.
    pub fn build(self) -> Result<String, InstanceIdError> {
        if !Self::is_valid_tag(&self.scope) {
            return Err(InstanceIdError::InvalidScope(self.scope));
        }
        if self.attrs.is_empty() {
            return Err(InstanceIdError::NoAttributes(self.scope));
        }
        let mut fields = Vec::with_capacity(self.attrs.len());
        for (key, value) in &self.attrs {
            if !Self::is_valid_tag(key) {
                return Err(InstanceIdError::InvalidKey(key.clone()));
            }
            fields.push(format!("{key}_{value:02X}"));
        }
        Ok(format!("{}\\{}", self.scope, fields.join("&")))
    }

    fn is_valid_tag(tag: &str) -> bool {
        !tag.is_empty()
            && tag
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_renders_ordered_fields() {
        let id = InstanceIdBuilder::new("EC")
            .attr("DOCKTYPE", 0x07)
            .attr("DOCKSKU", 0x02)
            .attr("DEVTYPE", 0x01)
            .attr("INST", 0x00)
            .build()
            .unwrap();
        assert_eq!(id, "EC\\DOCKTYPE_07&DOCKSKU_02&DEVTYPE_01&INST_00");
    }

    #[test]
    fn test_rejects_malformed_scope() {
        let err = InstanceIdBuilder::new("ec").attr("A", 1).build().unwrap_err();
        assert_eq!(err, InstanceIdError::InvalidScope("ec".to_string()));

        let err = InstanceIdBuilder::new("").attr("A", 1).build().unwrap_err();
        assert_eq!(err, InstanceIdError::InvalidScope(String::new()));
    }

    #[test]
    fn test_rejects_malformed_key() {
        let err = InstanceIdBuilder::new("EC")
            .attr("dock type", 1)
            .build()
            .unwrap_err();
        assert_eq!(err, InstanceIdError::InvalidKey("dock type".to_string()));
    }

    #[test]
    fn test_rejects_empty_attribute_list() {
        let err = InstanceIdBuilder::new("EC").build().unwrap_err();
        assert_eq!(err, InstanceIdError::NoAttributes("EC".to_string()));
    }
}
