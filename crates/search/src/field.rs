//! Indexed text fields

use serde::{Deserialize, Serialize};
use std::fmt;

/// A free-text field of an indexed post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    /// Post title
    Title,
    /// Short description
    Description,
    /// Body text
    Body,
    /// Tag list
    Tags,
    /// Category list
    Categories,
}

impl Field {
    /// Every field, in storage order
    pub const ALL: [Field; 5] = [
        Field::Title,
        Field::Description,
        Field::Body,
        Field::Tags,
        Field::Categories,
    ];

    /// Relevance multiplier
    pub fn boost(self) -> f64 {
        match self {
            Field::Title => 3.0,
            Field::Tags | Field::Categories => 2.0,
            Field::Description => 1.5,
            Field::Body => 1.0,
        }
    }

    /// Query-syntax name
    pub fn name(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Description => "description",
            Field::Body => "body",
            Field::Tags => "tags",
            Field::Categories => "categories",
        }
    }

    /// Parse a query-syntax field name (`tag` and `category` are accepted too)
    pub fn from_name(name: &str) -> Option<Field> {
        match name.to_lowercase().as_str() {
            "title" => Some(Field::Title),
            "description" => Some(Field::Description),
            "body" => Some(Field::Body),
            "tags" | "tag" => Some(Field::Tags),
            "categories" | "category" => Some(Field::Categories),
            _ => None,
        }
    }

    /// Position in [`Field::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
