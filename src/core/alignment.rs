use serde::{Serialize, Serializer};

use crate::core::types::{IdentityClass, Strand};
use crate::utils::validation::to_f64;

/// One aligned block between a query contig and a target contig, as read
/// from a PAF-like file. Coordinates are contig-local, 0-based, end-exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentRecord {
    pub query_id: String,
    pub query_len: u64,
    pub query_start: u64,
    pub query_end: u64,
    pub strand: Strand,
    pub target_id: String,
    pub target_len: u64,
    pub target_start: u64,
    pub target_end: u64,
    pub match_length: u64,
    pub block_length: u64,
    pub mapping_quality: u8,
    /// Optional trailing columns, kept verbatim
    pub extra: Vec<String>,
}

impl AlignmentRecord {
    /// Fraction of matching bases in the block, in [0, 1]
    pub fn identity(&self) -> f64 {
        if self.block_length == 0 {
            return 0.0;
        }
        (to_f64(self.match_length) / to_f64(self.block_length)).clamp(0.0, 1.0)
    }

    /// Mirror the query side of the record, as if the query contig had been
    /// reverse-complemented. Applying it twice restores the record.
    pub fn reorient_query(&mut self) {
        let (start, end) = (self.query_start, self.query_end);
        self.query_start = self.query_len.saturating_sub(end);
        self.query_end = self.query_len.saturating_sub(start);
        self.strand = self.strand.flipped();
    }

    /// Render the record as one tab-separated line (no newline)
    pub fn to_line(&self) -> String {
        let mut line = format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.query_id,
            self.query_len,
            self.query_start,
            self.query_end,
            self.strand,
            self.target_id,
            self.target_len,
            self.target_start,
            self.target_end,
            self.match_length,
            self.block_length,
            self.mapping_quality,
        );
        for column in &self.extra {
            line.push('\t');
            line.push_str(column);
        }
        line
    }
}

/// A record placed on the global axes: target on x, query on y.
///
/// `x1`/`x2` follow the strand (x1 > x2 for reverse matches), `y1 <= y2`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRecord {
    pub x1: u64,
    pub x2: u64,
    pub y1: u64,
    pub y2: u64,
    pub identity: f64,
    pub class: IdentityClass,
    pub query: String,
    pub target: String,
}

impl ClassifiedRecord {
    /// Euclidean length of the record's bounding diagonal
    pub fn diagonal_length(&self) -> f64 {
        let dx = to_f64(self.x1.abs_diff(self.x2));
        let dy = to_f64(self.y1.abs_diff(self.y2));
        dx.hypot(dy)
    }

    /// Midpoint on the target axis
    pub fn x_mid(&self) -> f64 {
        (to_f64(self.x1) + to_f64(self.x2)) / 2.0
    }

    /// Extent on the target axis as `(start, end)` with `start <= end`
    pub fn x_span(&self) -> (u64, u64) {
        (self.x1.min(self.x2), self.x1.max(self.x2))
    }

    /// True when the match runs the same way on both axes
    pub fn is_forward(&self) -> bool {
        (self.x2 >= self.x1) == (self.y2 >= self.y1)
    }
}

/// Rendered as the compact array `[x1, x2, y1, y2, identity, query, target]`
impl Serialize for ClassifiedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeTuple;
        let mut tuple = serializer.serialize_tuple(7)?;
        tuple.serialize_element(&self.x1)?;
        tuple.serialize_element(&self.x2)?;
        tuple.serialize_element(&self.y1)?;
        tuple.serialize_element(&self.y2)?;
        tuple.serialize_element(&self.identity)?;
        tuple.serialize_element(&self.query)?;
        tuple.serialize_element(&self.target)?;
        tuple.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> AlignmentRecord {
        AlignmentRecord {
            query_id: "ctgA".to_string(),
            query_len: 100,
            query_start: 10,
            query_end: 50,
            strand: Strand::Forward,
            target_id: "chrX".to_string(),
            target_len: 1000,
            target_start: 100,
            target_end: 140,
            match_length: 35,
            block_length: 40,
            mapping_quality: 60,
            extra: vec!["tp:A:P".to_string()],
        }
    }

    #[test]
    fn test_identity() {
        assert!((record().identity() - 0.875).abs() < 1e-12);
    }

    #[test]
    fn test_reorient_query_is_involution() {
        let original = record();
        let mut r = original.clone();
        r.reorient_query();
        assert_eq!((r.query_start, r.query_end), (50, 90));
        assert_eq!(r.strand, Strand::Reverse);
        r.reorient_query();
        assert_eq!(r, original);
    }

    #[test]
    fn test_to_line_keeps_extra_columns() {
        assert_eq!(
            record().to_line(),
            "ctgA\t100\t10\t50\t+\tchrX\t1000\t100\t140\t35\t40\t60\ttp:A:P"
        );
    }

    #[test]
    fn test_classified_geometry() {
        let r = ClassifiedRecord {
            x1: 140,
            x2: 100,
            y1: 10,
            y2: 40,
            identity: 0.5,
            class: IdentityClass(2),
            query: "q".to_string(),
            target: "t".to_string(),
        };
        assert!((r.diagonal_length() - 50.0).abs() < 1e-9);
        assert!((r.x_mid() - 120.0).abs() < 1e-9);
        assert_eq!(r.x_span(), (100, 140));
        assert!(!r.is_forward());

        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, r#"[140,100,10,40,0.5,"q","t"]"#);
    }
}
