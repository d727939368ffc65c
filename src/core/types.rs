use serde::{Deserialize, Serialize};

/// Which genome of the comparison a file or contig belongs to.
///
/// The target is drawn on the x axis, the query on the y axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Query,
    Target,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Query => write!(f, "query"),
            Self::Target => write!(f, "target"),
        }
    }
}

/// Relative strand of an aligned block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strand {
    #[serde(rename = "+")]
    Forward,
    #[serde(rename = "-")]
    Reverse,
}

impl Strand {
    /// Parse the single-character PAF strand column
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "+" => Some(Self::Forward),
            "-" => Some(Self::Reverse),
            _ => None,
        }
    }

    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            Self::Forward => Self::Reverse,
            Self::Reverse => Self::Forward,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Forward => '+',
            Self::Reverse => '-',
        }
    }
}

impl std::fmt::Display for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Identity bucket used for color-coding and coverage statistics.
///
/// Classes are ordered: a higher class always wins when records overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IdentityClass(pub u8);

impl IdentityClass {
    /// Number of identity classes produced by three thresholds
    pub const COUNT: usize = 4;

    /// Bucket an identity score given three ascending thresholds.
    ///
    /// A score equal to a threshold falls into the class above it.
    pub fn classify(identity: f64, thresholds: &[f64; 3]) -> Self {
        let class = thresholds.iter().filter(|&&t| identity >= t).count();
        #[allow(clippy::cast_possible_truncation)]
        let class = class as u8;
        Self(class)
    }

    /// All classes in ascending order
    pub fn all() -> impl Iterator<Item = Self> {
        (0..Self::COUNT as u8).map(Self)
    }

    /// Key used in JSON outputs ("0".."3")
    pub fn key(self) -> String {
        self.0.to_string()
    }
}

impl std::fmt::Display for IdentityClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
