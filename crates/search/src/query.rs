//! Query language
//!
//! ```text
//! rust async            either term (scored, OR)
//! "file storage"        phrase: terms at adjacent positions
//! +rust -java           required / excluded
//! title:rust            restricted to one field
//! -tags:"old news"      modifiers combine
//! ```
//!
//! Parse failures (unbalanced quotes, unknown fields, dangling operators)
//! are never shown to the caller: [`Query::parse_lenient`] falls back to
//! reading the whole input as plain terms.

use crate::field::Field;
use crate::tokenizer::tokenize;
use thiserror::Error;
use tracing::debug;

/// How a clause participates in matching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occur {
    /// Optional; contributes to the score
    Should,
    /// Required
    Must,
    /// Excluded
    MustNot,
}

/// One term or phrase of a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    /// Participation
    pub occur: Occur,
    /// Field restriction, `None` for all fields
    pub field: Option<Field>,
    /// Tokens; more than one means a phrase
    pub terms: Vec<String>,
}

impl Clause {
    /// Check if this clause is a phrase
    pub fn is_phrase(&self) -> bool {
        self.terms.len() > 1
    }
}

/// A parsed query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    /// Clauses in input order
    pub clauses: Vec<Clause>,
}

/// Query syntax error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("query syntax error at byte {position}: {message}")]
pub struct ParseError {
    /// Byte offset in the input
    pub position: usize,
    /// What went wrong
    pub message: String,
}

impl ParseError {
    fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

impl Query {
    /// Parse the query language strictly
    pub fn parse(input: &str) -> Result<Query, ParseError> {
        let chars: Vec<(usize, char)> = input.char_indices().collect();
        let len = chars.len();
        let offset = |i: usize| chars.get(i).map_or(input.len(), |(pos, _)| *pos);
        let mut clauses = Vec::new();
        let mut i = 0;

        while i < len {
            if chars[i].1.is_whitespace() {
                i += 1;
                continue;
            }

            let occur = match chars[i].1 {
                '+' => Occur::Must,
                '-' => Occur::MustNot,
                _ => Occur::Should,
            };
            if occur != Occur::Should {
                i += 1;
                if i >= len || chars[i].1.is_whitespace() {
                    return Err(ParseError::new(offset(i - 1), "operator without a term"));
                }
            }

            let mut field = None;
            let mut j = i;
            while j < len && chars[j].1.is_alphanumeric() {
                j += 1;
            }
            if j > i && j < len && chars[j].1 == ':' {
                let name: String = chars[i..j].iter().map(|(_, c)| *c).collect();
                field = Some(
                    Field::from_name(&name)
                        .ok_or_else(|| ParseError::new(offset(i), format!("unknown field {:?}", name)))?,
                );
                i = j + 1;
                if i >= len || chars[i].1.is_whitespace() {
                    return Err(ParseError::new(offset(j), "field without a value"));
                }
            }

            let text: String = if chars[i].1 == '"' {
                let open = i;
                i += 1;
                let begin = i;
                while i < len && chars[i].1 != '"' {
                    i += 1;
                }
                if i >= len {
                    return Err(ParseError::new(offset(open), "unbalanced quote"));
                }
                let text = chars[begin..i].iter().map(|(_, c)| *c).collect();
                i += 1;
                text
            } else {
                let begin = i;
                while i < len && !chars[i].1.is_whitespace() {
                    if chars[i].1 == '"' {
                        return Err(ParseError::new(offset(i), "quote inside a term"));
                    }
                    i += 1;
                }
                chars[begin..i].iter().map(|(_, c)| *c).collect()
            };

            let terms = tokenize(&text);
            if !terms.is_empty() {
                clauses.push(Clause {
                    occur,
                    field,
                    terms,
                });
            }
        }
        Ok(Query { clauses })
    }

    /// Every token of `input` as an optional term, ignoring all syntax
    pub fn literal(input: &str) -> Query {
        Query {
            clauses: tokenize(input)
                .into_iter()
                .map(|term| Clause {
                    occur: Occur::Should,
                    field: None,
                    terms: vec![term],
                })
                .collect(),
        }
    }

    /// Parse, or read the input literally if it is not valid syntax
    pub fn parse_lenient(input: &str) -> Query {
        match Query::parse(input) {
            Ok(query) => query,
            Err(e) => {
                debug!(error = %e, "query rejected, retrying literally");
                Query::literal(input)
            }
        }
    }

    /// Check if the query has no clauses
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Check if some clause can add a document (not just remove one)
    pub fn has_positive(&self) -> bool {
        self.clauses.iter().any(|c| c.occur != Occur::MustNot)
    }
}
