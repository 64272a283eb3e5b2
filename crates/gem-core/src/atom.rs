//! Message arguments passed from the host to a plugin.

use std::fmt;

/// A single message argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    Float(f32),
    Symbol(String),
}

impl Atom {
    pub fn symbol(s: impl Into<String>) -> Self {
        Atom::Symbol(s.into())
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Atom::Float(f) => Some(*f),
            Atom::Symbol(_) => None,
        }
    }
}

impl From<f32> for Atom {
    fn from(f: f32) -> Self {
        Atom::Float(f)
    }
}

impl From<&str> for Atom {
    fn from(s: &str) -> Self {
        Atom::Symbol(s.to_string())
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Float(v) => write!(f, "{v}"),
            Atom::Symbol(s) => f.write_str(s),
        }
    }
}

/// Read a single float argument, e.g. for `width <f>` style messages.
pub fn single_float(selector: &str, args: &[Atom]) -> anyhow::Result<f32> {
    match args {
        [a] => a
            .as_float()
            .ok_or_else(|| anyhow::anyhow!("{selector}: expected a float, got '{a}'")),
        _ => anyhow::bail!("{selector}: expected exactly one float argument"),
    }
}
