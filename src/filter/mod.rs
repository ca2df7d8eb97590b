//! Filters and their capabilities
//!
//! A filter offers any subset of four methods. `input` and `output` are
//! stream transforms and can be chained; `open` and `concat` produce content
//! from arguments and are exclusive within one chain. Which methods a filter
//! offers is declared once through [`Filter::capabilities`] and recorded when
//! the filter joins a [`FilterChain`].

pub mod chain;
pub mod gzip;

pub use chain::{merge_filter_lists, select_filters, select_filters_by, FilterChain, FilterEntry};
pub use gzip::GzipFilter;

use crate::error::{MillError, MillResult};
use crate::hunk::Hunk;
use std::collections::BTreeMap;
use std::fmt;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Options passed through to filter methods
pub type FilterOptions = BTreeMap<String, serde_json::Value>;

/// One of the four filter methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Input,
    Output,
    Open,
    Concat,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
            Self::Open => "open",
            Self::Concat => "concat",
        }
    }

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Set of methods a filter implements
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const NONE: Self = Self(0);

    pub const fn with(self, capability: Capability) -> Self {
        Self(self.0 | capability.bit())
    }

    pub fn contains(self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<Capability> for Capabilities {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter().fold(Self::NONE, Self::with)
    }
}

/// Stream-to-stream filter methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformKind {
    Input,
    Output,
}

impl From<TransformKind> for Capability {
    fn from(kind: TransformKind) -> Self {
        match kind {
            TransformKind::Input => Self::Input,
            TransformKind::Output => Self::Output,
        }
    }
}

/// Argument-to-stream filter methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProducerKind {
    Open,
    Concat,
}

impl From<ProducerKind> for Capability {
    fn from(kind: ProducerKind) -> Self {
        match kind {
            ProducerKind::Open => Self::Open,
            ProducerKind::Concat => Self::Concat,
        }
    }
}

/// Build verbosity, ordered from production to fully unmerged
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DebugLevel {
    /// Production build: everything merged and filtered
    Off,
    /// Sources merged but not minified
    Merge,
    /// Sources served individually
    Full,
}

/// Argument handed to a producer method
#[derive(Debug, Clone)]
pub enum ProducerArg {
    Text(String),
    Path(PathBuf),
    Hunk(Arc<dyn Hunk>),
}

/// A named content transformer.
///
/// Only the methods listed in [`capabilities`](Filter::capabilities) are
/// ever called; the default bodies report the capability as unsupported.
pub trait Filter: Send + Sync {
    fn name(&self) -> &str;

    /// Stable identity used for deduplication and cache keys. Filters whose
    /// output depends on their settings must include them here.
    fn identity(&self) -> String {
        self.name().to_string()
    }

    fn capabilities(&self) -> Capabilities;

    /// Highest debug level at which the filter still runs; `None` runs always
    fn max_debug_level(&self) -> Option<DebugLevel> {
        None
    }

    fn input(
        &self,
        _input: &mut dyn Read,
        _out: &mut dyn Write,
        _options: &FilterOptions,
    ) -> MillResult<()> {
        Err(unsupported(self.name(), Capability::Input))
    }

    fn output(
        &self,
        _input: &mut dyn Read,
        _out: &mut dyn Write,
        _options: &FilterOptions,
    ) -> MillResult<()> {
        Err(unsupported(self.name(), Capability::Output))
    }

    fn open(
        &self,
        _out: &mut dyn Write,
        _args: &[ProducerArg],
        _options: &FilterOptions,
    ) -> MillResult<()> {
        Err(unsupported(self.name(), Capability::Open))
    }

    fn concat(
        &self,
        _out: &mut dyn Write,
        _args: &[ProducerArg],
        _options: &FilterOptions,
    ) -> MillResult<()> {
        Err(unsupported(self.name(), Capability::Concat))
    }
}

fn unsupported(name: &str, capability: Capability) -> MillError {
    MillError::UnsupportedCapability {
        filter: name.to_string(),
        capability: capability.as_str(),
    }
}
