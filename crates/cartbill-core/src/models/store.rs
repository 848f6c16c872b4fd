//! Storefronts whose cart screenshots are supported.

use std::fmt;

use serde::{Deserialize, Serialize};

/// E-commerce store named in the bill header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Store {
    #[default]
    Temu,
    Shein,
    Noon,
}

impl Store {
    /// All supported stores, in menu order.
    pub const ALL: [Store; 3] = [Store::Temu, Store::Shein, Store::Noon];

    /// Display label used in the bill header.
    pub fn label(&self) -> &'static str {
        match self {
            Store::Temu => "Temu",
            Store::Shein => "Shein",
            Store::Noon => "Noon",
        }
    }

    /// Parse a store name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.label().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
