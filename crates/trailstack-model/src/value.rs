//! Template values: literals and CloudFormation intrinsic functions.
//!
//! A [`Value`] is anything that may appear as a resource property. Values
//! that depend on other resources are expressed as intrinsics and resolved by
//! the provisioning engine at deploy time, never during synthesis.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Pseudo parameter holding the account the stack deploys into.
pub const PSEUDO_ACCOUNT_ID: &str = "AWS::AccountId";

/// Pseudo parameter holding the region the stack deploys into.
pub const PSEUDO_REGION: &str = "AWS::Region";

/// Pseudo parameter holding the partition (`aws`, `aws-cn`, ...).
pub const PSEUDO_PARTITION: &str = "AWS::Partition";

/// A resource property value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// A plain string.
    Literal(String),
    /// `{"Ref": name}`: a resource's primary identifier or a pseudo parameter.
    Ref(String),
    /// `{"Fn::GetAtt": [logical_id, attribute]}`.
    GetAtt {
        /// Logical id of the referenced resource.
        logical_id: String,
        /// Attribute name, e.g. `Arn`.
        attribute: String,
    },
    /// `{"Fn::Join": [delimiter, parts]}`.
    Join {
        /// Separator placed between parts.
        delimiter: String,
        /// Joined values.
        parts: Vec<Value>,
    },
}

impl Value {
    /// `Ref` to a resource or pseudo parameter.
    #[must_use]
    pub fn reference(name: impl Into<String>) -> Self {
        Self::Ref(name.into())
    }

    /// `Fn::GetAtt` on a resource.
    #[must_use]
    pub fn get_att(logical_id: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::GetAtt {
            logical_id: logical_id.into(),
            attribute: attribute.into(),
        }
    }

    /// The deploying account, as a pseudo parameter.
    #[must_use]
    pub fn account_id() -> Self {
        Self::Ref(PSEUDO_ACCOUNT_ID.to_owned())
    }

    /// The deploying region, as a pseudo parameter.
    #[must_use]
    pub fn region() -> Self {
        Self::Ref(PSEUDO_REGION.to_owned())
    }

    /// The deploying partition, as a pseudo parameter.
    #[must_use]
    pub fn partition() -> Self {
        Self::Ref(PSEUDO_PARTITION.to_owned())
    }

    /// Concatenate values into one.
    ///
    /// Nested empty-delimiter joins are flattened and adjacent literals are
    /// merged, so concatenating only literals yields a single literal.
    ///
    /// # Examples
    ///
    /// ```
    /// use trailstack_model::Value;
    ///
    /// let v = Value::concat(["a".into(), "b".into()]);
    /// assert_eq!(v, Value::Literal("ab".to_owned()));
    /// ```
    #[must_use]
    pub fn concat(parts: impl IntoIterator<Item = Value>) -> Self {
        let mut flat: Vec<Value> = Vec::new();
        for part in parts {
            match part {
                Self::Join { delimiter, parts } if delimiter.is_empty() => flat.extend(parts),
                other => flat.push(other),
            }
        }

        let mut merged: Vec<Value> = Vec::with_capacity(flat.len());
        for part in flat {
            if let Self::Literal(s) = &part {
                if s.is_empty() {
                    continue;
                }
                if let Some(Self::Literal(prev)) = merged.last_mut() {
                    prev.push_str(s);
                    continue;
                }
            }
            merged.push(part);
        }

        match merged.len() {
            0 => Self::Literal(String::new()),
            1 => merged.remove(0),
            _ => Self::Join {
                delimiter: String::new(),
                parts: merged,
            },
        }
    }

    /// The literal string, if resolved.
    #[must_use]
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Self::Literal(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Literal(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Literal(s)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Literal(s) => serializer.serialize_str(s),
            Self::Ref(name) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Ref", name)?;
                map.end()
            }
            Self::GetAtt {
                logical_id,
                attribute,
            } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::GetAtt", &[logical_id, attribute])?;
                map.end()
            }
            Self::Join { delimiter, parts } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::Join", &(delimiter, parts))?;
                map.end()
            }
        }
    }
}
