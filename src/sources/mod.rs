//! Narrow trait seams around the BAM/FASTA readers. The concrete
//! implementations are thin wrappers over `rust-htslib`; everything else in
//! this crate only ever depends on the traits, so tests can supply fakes
//! without touching real index files.

use rust_htslib::bam::record::Cigar;
use rust_htslib::bam::{self, Read as BamRead};
use rust_htslib::faidx;

use crate::errors::{DetectError, Result};
use crate::reads::AlnRecord;

pub trait ReferenceSource: Sync {
    /// 1-based inclusive fetch of `[start, end]` on `chrname`, upper-cased.
    fn fetch(&self, chrname: &str, start: i64, end: i64) -> Result<Vec<u8>>;
    fn chrom_len(&self, chrname: &str) -> Result<i64>;
}

pub trait AlignmentSource {
    /// Visits every primary, non-duplicate alignment overlapping
    /// `[start, end]` (1-based inclusive) on `chrname`, in whatever order
    /// the underlying index yields them.
    fn for_each_record(&mut self, chrname: &str, start: i64, end: i64, visit: &mut dyn FnMut(AlnRecord) -> Result<()>) -> Result<()>;
}

/// An indexed BAM reader is cheap to reopen and is not `Sync`, so each
/// parallel block worker opens its own handle from a shared factory rather
/// than contending over one reader.
pub trait AlignmentSourceFactory: Sync {
    fn open(&self) -> Result<Box<dyn AlignmentSource>>;
}

pub struct BamAlignmentSourceFactory {
    pub path: String,
}

impl AlignmentSourceFactory for BamAlignmentSourceFactory {
    fn open(&self) -> Result<Box<dyn AlignmentSource>> {
        Ok(Box::new(BamAlignmentSource::open(&self.path)?))
    }
}

pub struct FastaReferenceSource {
    reader: faidx::Reader,
}

// rust_htslib::faidx::Reader wraps a raw htslib pointer and is not Sync by
// default; concurrent faidx_fetch_seq64 reads on distinct threads are safe
// (the underlying fai index access is read-only), matching the Sync bound
// `ReferenceSource` requires.
unsafe impl Sync for FastaReferenceSource {}

impl FastaReferenceSource {
    pub fn open(path: &str) -> Result<Self> {
        let reader = faidx::Reader::from_path(path).map_err(|e| {
            DetectError::IoFailure { function: "FastaReferenceSource::open", path: path.to_string(), source: std::io::Error::new(std::io::ErrorKind::Other, e.to_string()) }
        })?;
        Ok(FastaReferenceSource { reader })
    }
}

impl ReferenceSource for FastaReferenceSource {
    fn fetch(&self, chrname: &str, start: i64, end: i64) -> Result<Vec<u8>> {
        // faidx::Reader::fetch_seq is 0-based, end-inclusive.
        let seq = self.reader.fetch_seq(chrname, (start - 1) as usize, (end - 1) as usize).map_err(|e| {
            DetectError::invalid_reference("FastaReferenceSource::fetch", format!("{}:{}-{}: {}", chrname, start, end, e))
        })?;
        Ok(seq.iter().map(|b| b.to_ascii_uppercase()).collect())
    }

    fn chrom_len(&self, chrname: &str) -> Result<i64> {
        self.reader
            .fetch_seq_len(chrname)
            .try_into()
            .map_err(|_| DetectError::invalid_reference("FastaReferenceSource::chrom_len", format!("negative length for {}", chrname)))
    }
}

pub struct BamAlignmentSource {
    reader: bam::IndexedReader,
}

impl BamAlignmentSource {
    pub fn open(path: &str) -> Result<Self> {
        let reader = bam::IndexedReader::from_path(path).map_err(|e| {
            DetectError::IoFailure { function: "BamAlignmentSource::open", path: path.to_string(), source: std::io::Error::new(std::io::ErrorKind::Other, e.to_string()) }
        })?;
        Ok(BamAlignmentSource { reader })
    }
}

impl AlignmentSource for BamAlignmentSource {
    fn for_each_record(&mut self, chrname: &str, start: i64, end: i64, visit: &mut dyn FnMut(AlnRecord) -> Result<()>) -> Result<()> {
        let tid = self.reader.header().tid(chrname.as_bytes()).ok_or_else(|| {
            DetectError::invalid_reference("BamAlignmentSource::for_each_record", format!("unknown contig {}", chrname))
        })?;
        self.reader.fetch((tid, (start - 1).max(0), end)).map_err(|e| {
            DetectError::alignment_corrupt("BamAlignmentSource::for_each_record", format!("fetch failed: {}", e))
        })?;
        let mut record = bam::Record::new();
        loop {
            match self.reader.read(&mut record) {
                None => break,
                Some(Err(e)) => {
                    return Err(DetectError::alignment_corrupt("BamAlignmentSource::for_each_record", format!("malformed record: {}", e)))
                }
                Some(Ok(())) => {}
            }
            if record.is_unmapped() || record.is_secondary() || record.is_duplicate() || record.is_supplementary() {
                continue;
            }
            let cigar: Vec<Cigar> = record.cigar().iter().cloned().collect();
            let md = match record.aux(b"MD") {
                Ok(rust_htslib::bam::record::Aux::String(s)) => Some(s.to_string()),
                _ => None,
            };
            let seq = record.seq().as_bytes();
            let aln = AlnRecord { pos0: record.pos(), cigar, md, seq };
            visit(aln)?;
        }
        Ok(())
    }
}
