//! Query-to-target association report and unmatched contig lists.

use std::collections::HashSet;

use serde::Serialize;

use crate::core::types::{Side, Strand};
use crate::plot::assembler::ParsedAlignment;
use crate::plot::reorder::compute_gravity;

/// The target contig a query contig maps to best
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Association {
    pub query: String,
    /// Anchor target contig, `None` when the query contig has no match
    pub target: Option<String>,
    /// Strand covering the most query bases against the anchor
    pub strand: Option<Strand>,
    /// Query bases covered by matches against the anchor
    pub matched_bases: u64,
}

/// One association per query contig, in query index order
pub fn associations(parsed: &ParsedAlignment) -> Vec<Association> {
    let grouped = parsed.records_by_query();
    let anchors = compute_gravity(parsed);

    parsed
        .query
        .contigs()
        .iter()
        .map(|contig| {
            let Some(anchor) = anchors.iter().find(|a| a.query == contig.name) else {
                return Association {
                    query: contig.name.clone(),
                    target: None,
                    strand: None,
                    matched_bases: 0,
                };
            };

            let (mut forward, mut reverse) = (0u64, 0u64);
            for record in grouped
                .get(contig.name.as_str())
                .into_iter()
                .flatten()
                .filter(|r| r.target == anchor.anchor)
            {
                let span = record.y1.abs_diff(record.y2);
                if record.is_forward() {
                    forward += span;
                } else {
                    reverse += span;
                }
            }
            Association {
                query: contig.name.clone(),
                target: Some(anchor.anchor.clone()),
                strand: Some(if reverse > forward {
                    Strand::Reverse
                } else {
                    Strand::Forward
                }),
                matched_bases: forward + reverse,
            }
        })
        .collect()
}

/// Contigs of one side without any kept alignment record
pub fn unmatched(parsed: &ParsedAlignment, side: Side) -> Vec<String> {
    let matched: HashSet<&str> = parsed
        .records()
        .map(|r| match side {
            Side::Query => r.query.as_str(),
            Side::Target => r.target.as_str(),
        })
        .collect();
    let index = match side {
        Side::Query => &parsed.query,
        Side::Target => &parsed.target,
    };
    index
        .contigs()
        .iter()
        .filter(|c| !matched.contains(c.name.as_str()))
        .map(|c| c.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::contig::Contig;
    use crate::core::index::SequenceIndex;
    use crate::plot::assembler::Assembler;

    fn parsed() -> (tempfile::TempDir, ParsedAlignment) {
        let dir = tempfile::tempdir().unwrap();
        let q = dir.path().join("query.idx");
        let t = dir.path().join("target.idx");
        let paf = dir.path().join("map.paf");
        SequenceIndex::new(
            "Q",
            vec![Contig::new("a", 1000), Contig::new("b", 500), Contig::new("c", 10)],
        )
        .save(&q)
        .unwrap();
        SequenceIndex::new("T", vec![Contig::new("t1", 3000), Contig::new("t2", 3000)])
            .save(&t)
            .unwrap();
        std::fs::write(
            &paf,
            "a\t1000\t0\t600\t-\tt2\t3000\t0\t600\t600\t600\t60\n\
             a\t1000\t600\t800\t+\tt2\t3000\t700\t900\t200\t200\t60\n\
             a\t1000\t0\t50\t+\tt1\t3000\t0\t50\t50\t50\t60\n\
             b\t500\t0\t500\t+\tt1\t3000\t100\t600\t500\t500\t60\n",
        )
        .unwrap();
        let parsed = Assembler::default().parse(&paf, &q, &t).unwrap();
        (dir, parsed)
    }

    #[test]
    fn test_associations() {
        let (_dir, parsed) = parsed();
        let report = associations(&parsed);
        assert_eq!(
            report,
            vec![
                Association {
                    query: "a".to_string(),
                    target: Some("t2".to_string()),
                    strand: Some(Strand::Reverse),
                    matched_bases: 800,
                },
                Association {
                    query: "b".to_string(),
                    target: Some("t1".to_string()),
                    strand: Some(Strand::Forward),
                    matched_bases: 500,
                },
                Association {
                    query: "c".to_string(),
                    target: None,
                    strand: None,
                    matched_bases: 0,
                },
            ]
        );
    }

    #[test]
    fn test_unmatched() {
        let (_dir, parsed) = parsed();
        assert_eq!(unmatched(&parsed, Side::Query), vec!["c"]);
        assert!(unmatched(&parsed, Side::Target).is_empty());
    }
}
