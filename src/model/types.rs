//! Identifier newtypes and small enums shared across the model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

id_type!(
    /// Identifier of an order.
    OrderId
);
id_type!(
    /// Identifier of a line item.
    LineItemId
);
id_type!(
    /// Identifier of an adjustment.
    AdjustmentId
);
id_type!(
    /// Identifier of an enterprise (distributor, producer or fee owner).
    EnterpriseId
);
id_type!(
    /// Identifier of an enterprise fee definition.
    EnterpriseFeeId
);
id_type!(
    /// Identifier of a tax rate definition.
    TaxRateId
);
id_type!(
    /// Identifier of an order cycle.
    OrderCycleId
);

/// The kind of an adjustment, derived from its originator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    EnterpriseFee,
    Tax,
}

impl AdjustmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentKind::EnterpriseFee => "enterprise_fee",
            AdjustmentKind::Tax => "tax",
        }
    }
}

impl fmt::Display for AdjustmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of an enterprise fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeType {
    Admin,
    Packing,
    Transport,
    Fundraising,
    Sales,
}

impl FeeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeeType::Admin => "admin",
            FeeType::Packing => "packing",
            FeeType::Transport => "transport",
            FeeType::Fundraising => "fundraising",
            FeeType::Sales => "sales",
        }
    }
}

impl fmt::Display for FeeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(FeeType::Admin),
            "packing" => Ok(FeeType::Packing),
            "transport" => Ok(FeeType::Transport),
            "fundraising" => Ok(FeeType::Fundraising),
            "sales" => Ok(FeeType::Sales),
            other => Err(format!("unknown fee type: {}", other)),
        }
    }
}
