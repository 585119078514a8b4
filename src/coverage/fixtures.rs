//! Small coordinate-sorted BAM files with a `.bai` index for provider tests.

use std::fs::File;
use std::io;
use std::num::NonZeroUsize;
use std::path::Path;

use noodles::bam::{self, bai};
use noodles::core::Position;
use noodles::csi::binning_index::index::reference_sequence::bin::Chunk;
use noodles::csi::binning_index::Indexer;
use noodles::sam;
use noodles::sam::alignment::io::Write as _;
use noodles::sam::alignment::record::cigar::op::{Kind, Op};
use noodles::sam::alignment::record::{Flags, MappingQuality};
use noodles::sam::alignment::{Record as _, RecordBuf};
use noodles::sam::header::record::value::{map::ReferenceSequence, Map};

use crate::coverage::threaded::index_path;

pub const CONTIG_LENGTH: usize = 10_000;

/// Header with `chr1` and `chr2`
pub fn header() -> sam::Header {
    let length = NonZeroUsize::new(CONTIG_LENGTH).unwrap();

    sam::Header::builder()
        .add_reference_sequence("chr1", Map::<ReferenceSequence>::new(length))
        .add_reference_sequence("chr2", Map::<ReferenceSequence>::new(length))
        .build()
}

/// A record on `chr1` (or `chr2` for `reference_sequence_id` 1)
pub fn read(
    reference_sequence_id: usize,
    start: usize,
    cigar: &[(Kind, usize)],
    flags: Flags,
    mapping_quality: u8,
) -> RecordBuf {
    RecordBuf::builder()
        .set_flags(flags)
        .set_reference_sequence_id(reference_sequence_id)
        .set_alignment_start(Position::new(start).unwrap())
        .set_mapping_quality(MappingQuality::new(mapping_quality).unwrap())
        .set_cigar(cigar.iter().map(|&(kind, len)| Op::new(kind, len)).collect())
        .build()
}

/// Reads exercising the CIGAR operations and the depth filters: on chr1 two
/// reads over 10-14 (one soft-clipped with an insertion), a duplicate, a
/// deletion read from 12, a spliced read from 20 and a MAPQ 5 read at 30-34;
/// one read on chr2 over 10-59
pub fn sample_reads() -> Vec<RecordBuf> {
    use Kind::{Deletion, Insertion, Match, Skip, SoftClip};

    vec![
        read(0, 10, &[(Match, 5)], Flags::empty(), 60),
        read(
            0,
            10,
            &[(SoftClip, 2), (Match, 3), (Insertion, 1), (Match, 2)],
            Flags::empty(),
            60,
        ),
        read(0, 10, &[(Match, 10)], Flags::DUPLICATE, 60),
        read(0, 12, &[(Match, 3), (Deletion, 2), (Match, 3)], Flags::empty(), 60),
        read(0, 20, &[(Match, 2), (Skip, 5), (Match, 2)], Flags::empty(), 60),
        read(0, 30, &[(Match, 5)], Flags::empty(), 5),
        read(1, 10, &[(Match, 50)], Flags::empty(), 60),
    ]
}

/// Write `records` (already in coordinate order) to `path` and index it as
/// `<path>.bai`
pub fn write_indexed_bam(path: &Path, records: &[RecordBuf]) -> io::Result<()> {
    let header = header();

    let mut writer = bam::io::Writer::new(File::create(path)?);
    writer.write_header(&header)?;
    for record in records {
        writer.write_alignment_record(&header, record)?;
    }
    writer.try_finish()?;
    drop(writer);

    let mut reader = bam::io::reader::Builder.build_from_path(path)?;
    reader.read_header()?;

    let mut indexer = Indexer::default();
    let mut record = bam::Record::default();
    let mut chunk_start = reader.get_ref().virtual_position();

    while reader.read_record(&mut record)? != 0 {
        let chunk_end = reader.get_ref().virtual_position();

        let context = match (
            record.reference_sequence_id().transpose()?,
            record.alignment_start().transpose()?,
            record.alignment_end().transpose()?,
        ) {
            (Some(id), Some(start), Some(end)) => {
                Some((id, start, end, !record.flags().is_unmapped()))
            }
            _ => None,
        };
        indexer.add_record(context, Chunk::new(chunk_start, chunk_end))?;

        chunk_start = chunk_end;
    }

    let index: bai::Index = indexer.build(header.reference_sequences().len());
    bai::write(index_path(path), &index)
}
