//! FASTA input and output using noodles.
//!
//! Raw sequence files are indexed into a [`SequenceIndex`], split into
//! bounded pieces, or rewritten without filtered-out contigs.
//! Supports both uncompressed and gzip/bgzip compressed input.
//!
//! Supported extensions:
//! - `.fa`, `.fasta`, `.fna` (uncompressed)
//! - `.fa.gz`, `.fasta.gz`, `.fna.gz` (gzip compressed)

use std::collections::HashSet;
use std::ffi::OsStr;
use std::io::Write;
use std::path::Path;

use noodles::fasta;
use tracing::info;

use crate::core::contig::{Contig, SplitContigId};
use crate::core::error::{Error, Result};
use crate::core::index::SequenceIndex;
use crate::utils::fs::{open_reader, write_atomic};
use crate::utils::validation::check_contig_limit;

/// Check if the path has a FASTA extension
pub fn is_fasta_file(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();

    if path_str.ends_with(".fa.gz")
        || path_str.ends_with(".fasta.gz")
        || path_str.ends_with(".fna.gz")
    {
        return true;
    }

    matches!(
        path.extension()
            .and_then(OsStr::to_str)
            .map(str::to_lowercase)
            .as_deref(),
        Some("fa" | "fasta" | "fna")
    )
}

/// Visit every record of a FASTA file as `(name, sequence)`.
///
/// The name is the first word of the definition line.
///
/// # Errors
///
/// Returns `Error::Io` if the file cannot be opened, `Error::Fasta` if a
/// record cannot be parsed, and any error returned by `visit`.
pub fn for_each_record<F>(path: &Path, mut visit: F) -> Result<usize>
where
    F: FnMut(&str, &[u8]) -> Result<()>,
{
    let mut reader = fasta::io::Reader::new(open_reader(path)?);
    let mut count = 0;

    for result in reader.records() {
        let record =
            result.map_err(|e| Error::Fasta(format!("Failed to parse FASTA record: {e}")))?;
        let name = String::from_utf8_lossy(record.name()).to_string();
        visit(&name, record.sequence().as_ref())?;
        count += 1;
    }

    Ok(count)
}

/// Build the contig catalog of a raw sequence file.
///
/// # Errors
///
/// Returns `Error::EmptyContig` for a header without bases, `Error::Fasta`
/// if the file has no sequences or a duplicated name, plus the errors of
/// [`for_each_record`].
pub fn index_fasta(path: &Path, sample_name: &str) -> Result<SequenceIndex> {
    let mut contigs = Vec::new();

    for_each_record(path, |name, sequence| {
        if sequence.is_empty() {
            return Err(Error::EmptyContig(name.to_string()));
        }
        if let Some(msg) = check_contig_limit(contigs.len()) {
            return Err(Error::Fasta(msg));
        }
        contigs.push(Contig::new(name, sequence.len() as u64));
        Ok(())
    })?;

    if contigs.is_empty() {
        return Err(Error::Fasta("No sequences found in FASTA file".to_string()));
    }

    let index = SequenceIndex::try_new(sample_name, contigs)
        .map_err(|name| Error::Fasta(format!("Duplicate sequence name '{name}'")))?;
    info!(
        "Indexed {}: {} contigs, {} bp",
        path.display(),
        index.len(),
        index.total_length()
    );
    Ok(index)
}

/// Build a noodles record from a name and its bases
pub fn make_record(name: &str, sequence: &[u8]) -> fasta::Record {
    fasta::Record::new(
        fasta::record::Definition::new(name.to_owned(), None),
        fasta::record::Sequence::from(sequence.to_vec()),
    )
}

/// Rewrite a FASTA file without the contigs named in `removed`.
///
/// Split pieces are removed together with their original contig.
/// Returns the number of records written.
///
/// # Errors
///
/// Same as [`for_each_record`], plus `Error::Io` on write failure.
pub fn filter_fasta(input: &Path, output: &Path, removed: &HashSet<String>) -> Result<usize> {
    let mut kept = 0;
    write_atomic(output, |w: &mut dyn Write| {
        let mut writer = fasta::io::Writer::new(w);
        for_each_record(input, |name, sequence| {
            if removed.contains(name) || removed.contains(SplitContigId::original_name(name)) {
                return Ok(());
            }
            writer.write_record(&make_record(name, sequence))?;
            kept += 1;
            Ok(())
        })?;
        Ok::<_, Error>(())
    })?;
    Ok(kept)
}
