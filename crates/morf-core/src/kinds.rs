//! Feature and property kinds understood by the learner.
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Representation of a linker fed to the network.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[derive(Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
#[strum(serialize_all = "lowercase")]
pub enum FeatureKind {
    /// Point cloud of atom positions, `[points, channels]`.
    #[default]
    Point,
}

/// Target value learned for a linker.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[derive(Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
#[strum(serialize_all = "lowercase")]
pub enum PropertyKind {
    /// Stiffness from a deformation simulation.
    #[default]
    Stiff,
}

impl FeatureKind {
    pub fn parse(name: &str) -> Result<Self> {
        FeatureKind::from_str(name).map_err(|_| Error::UnknownFeature(name.to_string()))
    }

    /// Helper script that computes this feature from a `.lmpdat` file.
    pub fn script(&self) -> &'static str {
        match self {
            FeatureKind::Point => "calcPoint.py",
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

impl PropertyKind {
    pub fn parse(name: &str) -> Result<Self> {
        PropertyKind::from_str(name).map_err(|_| Error::UnknownProperty(name.to_string()))
    }

    /// Helper script that computes this property from a simulation output.
    pub fn script(&self) -> &'static str {
        match self {
            PropertyKind::Stiff => "calcStiff.py",
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

impl TryFrom<String> for FeatureKind {
    type Error = Error;
    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<FeatureKind> for String {
    fn from(value: FeatureKind) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for PropertyKind {
    type Error = Error;
    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<PropertyKind> for String {
    fn from(value: PropertyKind) -> Self {
        value.to_string()
    }
}
