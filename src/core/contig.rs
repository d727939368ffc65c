use serde::{Deserialize, Serialize};

/// Separator between an original contig name and its 1-based piece number
pub const SPLIT_SEPARATOR: &str = "_###_";

/// Prefix of synthetic rendering blocks made of concatenated tiny contigs
pub const MIX_PREFIX: &str = "###MIX###";

/// Identifier of one piece of an oversized contig: `<original>_###_<n>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SplitContigId {
    pub original: String,
    /// 1-based piece number, increasing along the original contig
    pub piece: u32,
}

impl SplitContigId {
    pub fn new(original: impl Into<String>, piece: u32) -> Self {
        Self {
            original: original.into(),
            piece,
        }
    }

    /// Recognize a split id.
    ///
    /// Returns `None` for ordinary contig names, including names that merely
    /// contain the separator without a valid piece number after it.
    pub fn parse(name: &str) -> Option<Self> {
        let (original, piece) = name.rsplit_once(SPLIT_SEPARATOR)?;
        if original.is_empty() || piece.is_empty() || !piece.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
        let piece: u32 = piece.parse().ok()?;
        if piece == 0 {
            return None;
        }
        Some(Self::new(original, piece))
    }

    /// Name of the original contig for `name`, whether split or not
    pub fn original_name(name: &str) -> &str {
        match name.rsplit_once(SPLIT_SEPARATOR) {
            Some((original, _)) if Self::parse(name).is_some() => original,
            _ => name,
        }
    }
}

impl std::fmt::Display for SplitContigId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.original, SPLIT_SEPARATOR, self.piece)
    }
}

/// A single named contig and its length
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contig {
    pub name: String,
    pub length: u64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub reversed: bool,
}

impl Contig {
    pub fn new(name: impl Into<String>, length: u64) -> Self {
        Self {
            name: name.into(),
            length,
            reversed: false,
        }
    }

    #[must_use]
    pub fn with_reversed(mut self, reversed: bool) -> Self {
        self.reversed = reversed;
        self
    }

    pub fn is_split_piece(&self) -> bool {
        SplitContigId::parse(&self.name).is_some()
    }

    pub fn is_mix_block(&self) -> bool {
        self.name.starts_with(MIX_PREFIX)
    }
}
