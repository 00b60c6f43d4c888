use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyId(pub String);

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which source produced a listing. The two sources are disjoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertySource {
    Local,
    Idx,
}

impl PropertySource {
    pub const fn label(self) -> &'static str {
        match self {
            PropertySource::Local => "local",
            PropertySource::Idx => "idx",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub address: String,
    pub city: String,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub title: String,
    /// Asking price in whole dollars.
    pub price: u64,
    pub location: Location,
    pub bedrooms: u8,
    pub bathrooms: f32,
    pub square_feet: u32,
    pub images: Vec<String>,
    pub source: PropertySource,
}

/// Query sent to a single source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyFilters {
    pub city: Option<String>,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub min_bedrooms: Option<u8>,
    pub limit: Option<usize>,
}

impl PropertyFilters {
    pub fn matches(&self, property: &Property) -> bool {
        if let Some(city) = &self.city {
            if !property.location.city.eq_ignore_ascii_case(city.trim()) {
                return false;
            }
        }
        if self.min_price.is_some_and(|min| property.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| property.price > max) {
            return false;
        }
        if self
            .min_bedrooms
            .is_some_and(|min| property.bedrooms < min)
        {
            return false;
        }
        true
    }
}

/// Caller-facing query; city segments come from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PropertyQuery {
    #[serde(default)]
    pub min_price: Option<u64>,
    #[serde(default)]
    pub max_price: Option<u64>,
    #[serde(default)]
    pub min_bedrooms: Option<u8>,
    #[serde(default)]
    pub limit: Option<usize>,
}
