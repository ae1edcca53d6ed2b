//! The fixed set of data categories shared between lab tabs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::HubError;

/// Kind of data an entry holds
///
/// The set is closed: the hub is created with one list per category and
/// never grows new ones at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Matrices,
    Arrays,
    Scalars,
    Functions,
    Complex,
    Datasets,
    Vectors,
}

impl Category {
    /// Every category, in display order
    pub const ALL: [Category; 7] = [
        Category::Matrices,
        Category::Arrays,
        Category::Scalars,
        Category::Functions,
        Category::Complex,
        Category::Datasets,
        Category::Vectors,
    ];

    /// Category key as used by the tabs (`"matrices"`, `"arrays"`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Matrices => "matrices",
            Category::Arrays => "arrays",
            Category::Scalars => "scalars",
            Category::Functions => "functions",
            Category::Complex => "complex",
            Category::Datasets => "datasets",
            Category::Vectors => "vectors",
        }
    }

    /// Singular noun for messages ("matrix", "array", ...)
    pub fn singular(&self) -> &'static str {
        match self {
            Category::Matrices => "matrix",
            Category::Arrays => "array",
            Category::Scalars => "scalar",
            Category::Functions => "function",
            Category::Complex => "complex number",
            Category::Datasets => "dataset",
            Category::Vectors => "vector",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = HubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| HubError::UnknownCategory(s.to_string()))
    }
}

/// Anything a hub operation accepts as a category
///
/// Tabs address categories either with the typed [`Category`] or with the
/// plain key they got from the UI. Names are validated here, so a bad name
/// is rejected before any state is touched.
pub trait IntoCategory {
    fn into_category(self) -> Result<Category, HubError>;
}

impl IntoCategory for Category {
    fn into_category(self) -> Result<Category, HubError> {
        Ok(self)
    }
}

impl IntoCategory for &Category {
    fn into_category(self) -> Result<Category, HubError> {
        Ok(*self)
    }
}

impl IntoCategory for &str {
    fn into_category(self) -> Result<Category, HubError> {
        self.parse()
    }
}

impl IntoCategory for &String {
    fn into_category(self) -> Result<Category, HubError> {
        self.parse()
    }
}

impl IntoCategory for String {
    fn into_category(self) -> Result<Category, HubError> {
        self.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_categories() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
    }

    #[test]
    fn test_parse_unknown_category() {
        assert_eq!(
            "not-a-real-category".parse::<Category>(),
            Err(HubError::UnknownCategory("not-a-real-category".to_string()))
        );
        // Keys are case sensitive
        assert!("Matrices".parse::<Category>().is_err());
    }

    #[test]
    fn test_serde_uses_lowercase_keys() {
        let json = serde_json::to_string(&Category::Datasets).unwrap();
        assert_eq!(json, "\"datasets\"");
        let back: Category = serde_json::from_str("\"vectors\"").unwrap();
        assert_eq!(back, Category::Vectors);
    }
}
