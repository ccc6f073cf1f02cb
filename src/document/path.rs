//! Typed addresses into the content document
//!
//! A [`Path`] is a list of steps from the root. A step either names a field
//! of the current record or picks one entry of a collection by its id:
//!
//! ```text
//! faqs.list[faq-3].answer
//! └─┬┘ └────┬────┘ └──┬─┘
//! field   entry     field
//! ```

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::EntryId;

/// One step of a path
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Step {
    /// A named field of the current record
    Field(String),

    /// The entry with `id` inside the collection stored under `collection`
    Entry { collection: String, id: EntryId },
}

/// Address of a field or collection entry, starting at the document root
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Path {
    steps: Vec<Step>,
}

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.steps.push(Step::Field(name.into()));
        self
    }

    pub fn entry(mut self, collection: impl Into<String>, id: impl Into<EntryId>) -> Self {
        self.steps.push(Step::Entry {
            collection: collection.into(),
            id: id.into(),
        });
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last(&self) -> Option<&Step> {
        self.steps.last()
    }

    /// Append the steps of `other`
    pub fn join(mut self, other: &Path) -> Self {
        self.steps.extend(other.steps.iter().cloned());
        self
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match step {
                Step::Field(name) => f.write_str(name)?,
                Step::Entry { collection, id } => write!(f, "{}[{}]", collection, id)?,
            }
        }
        Ok(())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsePathError {
    #[error("empty segment in path '{0}'")]
    EmptySegment(String),

    #[error("malformed entry selector '{0}'")]
    BadEntry(String),
}

impl FromStr for Path {
    type Err = ParsePathError;

    /// Parse the dotted text form. Entry ids may not contain `.` or `]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut path = Path::root();
        if s.is_empty() {
            return Ok(path);
        }

        for segment in s.split('.') {
            if segment.is_empty() {
                return Err(ParsePathError::EmptySegment(s.to_string()));
            }
            path = match segment.find('[') {
                None if segment.contains(']') => {
                    return Err(ParsePathError::BadEntry(segment.to_string()))
                }
                None => path.field(segment),
                Some(open) => {
                    let collection = &segment[..open];
                    let id = segment[open + 1..]
                        .strip_suffix(']')
                        .ok_or_else(|| ParsePathError::BadEntry(segment.to_string()))?;
                    if collection.is_empty() || id.is_empty() || id.contains(['[', ']']) {
                        return Err(ParsePathError::BadEntry(segment.to_string()));
                    }
                    path.entry(collection, id)
                }
            };
        }

        Ok(path)
    }
}
