//! Food categories and descriptive tags

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closed set of food categories an item can belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FoodCategory {
    Produce,
    Dairy,
    Meat,
    Seafood,
    Bakery,
    Frozen,
    Pantry,
    Beverages,
    Condiments,
    Leftovers,
    #[default]
    Other,
}

impl FoodCategory {
    pub const ALL: [Self; 11] = [
        Self::Produce,
        Self::Dairy,
        Self::Meat,
        Self::Seafood,
        Self::Bakery,
        Self::Frozen,
        Self::Pantry,
        Self::Beverages,
        Self::Condiments,
        Self::Leftovers,
        Self::Other,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Produce => "produce",
            Self::Dairy => "dairy",
            Self::Meat => "meat",
            Self::Seafood => "seafood",
            Self::Bakery => "bakery",
            Self::Frozen => "frozen",
            Self::Pantry => "pantry",
            Self::Beverages => "beverages",
            Self::Condiments => "condiments",
            Self::Leftovers => "leftovers",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for FoodCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FoodCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == needle)
            .ok_or_else(|| format!("unknown food category '{}'", s.trim()))
    }
}

/// Descriptive, multi-valued tags attached to an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemTag {
    Opened,
    Organic,
    Homemade,
    Refrigerated,
    Frozen,
    OnSale,
    Shared,
}

impl ItemTag {
    pub const ALL: [Self; 7] = [
        Self::Opened,
        Self::Organic,
        Self::Homemade,
        Self::Refrigerated,
        Self::Frozen,
        Self::OnSale,
        Self::Shared,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Opened => "opened",
            Self::Organic => "organic",
            Self::Homemade => "homemade",
            Self::Refrigerated => "refrigerated",
            Self::Frozen => "frozen",
            Self::OnSale => "on_sale",
            Self::Shared => "shared",
        }
    }
}

impl fmt::Display for ItemTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str() == needle)
            .ok_or_else(|| format!("unknown item tag '{}'", s.trim()))
    }
}
