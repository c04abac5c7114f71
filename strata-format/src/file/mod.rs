use std::fs::File;
use std::io::{prelude::*, BufReader, Cursor, SeekFrom};

use crate::de::DeserializeOwned;
use crate::footer::{
    BlockFooter, FOOTER_SIZE, FORMAT_VERSION, INDEX_HEADER_SIZE, INDEX_SIGNATURE, MIN_INDEX_ENTRY_SIZE,
};
use crate::{Error, Index, IndexEntry, Result};

mod reader;
mod writer;

pub use self::reader::{ArchiveReader, EntryReader};
pub use self::writer::ArchiveReadWriter;

/// One index block, identified by the offset at which it ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Byte position just past the block's footer. Pass to
    /// [`ArchiveReader::open_at`] to read the archive as of this block.
    pub offset: u64,
    pub block_start: u64,
    pub entry_count: u32,
}

pub(crate) fn read_footer<R: Read + Seek>(reader: &mut R, end: u64) -> Result<BlockFooter> {
    if end < FOOTER_SIZE {
        return Err(Error::InvalidFooter { offset: end });
    }

    reader.seek(SeekFrom::Start(end - FOOTER_SIZE))?;
    let footer = BlockFooter::deserialize_owned(reader)?;

    if !footer.is_valid() {
        return Err(Error::InvalidFooter { offset: end });
    }

    if footer.version != FORMAT_VERSION {
        return Err(Error::UnsupportedVersion(footer.version));
    }

    if footer.block_length > end || footer.block_length < FOOTER_SIZE + footer.index_length {
        return Err(Error::InvalidBlock { offset: end });
    }

    Ok(footer)
}

fn read_block(file: &mut File, end: u64) -> Result<(Snapshot, Vec<IndexEntry>)> {
    let footer = read_footer(file, end)?;
    let block_start = end - footer.block_length;
    let index_start = end - FOOTER_SIZE - footer.index_length;

    let mut buf = vec![0u8; footer.index_length as usize];
    file.seek(SeekFrom::Start(index_start))?;
    file.read_exact(&mut buf)?;

    let actual = crc32fast::hash(&buf);
    if actual != footer.index_crc32 {
        return Err(Error::ChecksumMismatch {
            offset: index_start,
            expected: footer.index_crc32,
            actual,
        });
    }

    let mut cursor = Cursor::new(buf);
    let mut signature = [0u8; 4];
    cursor.read_exact(&mut signature)?;
    if &signature != INDEX_SIGNATURE {
        return Err(Error::InvalidSignature { offset: end });
    }

    let mut version = [0u8; 1];
    cursor.read_exact(&mut version)?;
    if version[0] != FORMAT_VERSION {
        return Err(Error::UnsupportedVersion(version[0]));
    }

    let mut count = [0u8; 4];
    cursor.read_exact(&mut count)?;
    let count = u32::from_le_bytes(count);
    if count != footer.entry_count {
        return Err(Error::InvalidBlock { offset: end });
    }

    let room = footer.index_length.saturating_sub(INDEX_HEADER_SIZE) / MIN_INDEX_ENTRY_SIZE;
    if count as u64 > room {
        return Err(Error::InvalidBlock { offset: end });
    }

    let mut entries = vec![];
    for _ in 0..count {
        let mut entry = IndexEntry::deserialize_owned(&mut cursor)?;
        entry.start += block_start;
        if entry.end() > index_start {
            return Err(Error::InvalidBlock { offset: end });
        }
        entries.push(entry);
    }

    tracing::debug!(
        block_start = format_args!("{:#x}", block_start),
        end = format_args!("{:#x}", end),
        entries = count,
        "read index block"
    );

    let snapshot = Snapshot {
        offset: end,
        block_start,
        entry_count: count,
    };

    Ok((snapshot, entries))
}

/// Walks the chain of blocks backwards from `offset` (0 meaning the end of the
/// file) and returns every entry up to that point in append order.
pub(crate) fn read_index(file: &mut File, offset: u64) -> Result<(Index, Vec<Snapshot>)> {
    let length = file.metadata()?.len();

    let end = match offset {
        0 => length,
        offset if offset > length => return Err(Error::InvalidOffset { offset, length }),
        offset => offset,
    };

    let mut blocks = vec![];
    let mut pos = end;
    while pos > 0 {
        let block = match read_block(file, pos) {
            Err(Error::InvalidFooter { .. }) if pos == offset => {
                return Err(Error::InvalidOffset { offset, length })
            }
            result => result?,
        };
        pos = block.0.block_start;
        blocks.push(block);
    }

    blocks.reverse();

    let mut snapshots = Vec::with_capacity(blocks.len());
    let mut index = Index::default();
    for (snapshot, entries) in blocks {
        snapshots.push(snapshot);
        index.extend(entries);
    }

    Ok((index, snapshots))
}

/// Reads the whole archive through a buffered reader, for callers that only need footers.
pub(crate) fn read_snapshots(file: &mut File) -> Result<Vec<Snapshot>> {
    let length = file.metadata()?.len();
    let mut reader = BufReader::new(file);
    let mut snapshots = vec![];
    let mut pos = length;
    while pos > 0 {
        let footer = read_footer(&mut reader, pos)?;
        let block_start = pos - footer.block_length;
        snapshots.push(Snapshot {
            offset: pos,
            block_start,
            entry_count: footer.entry_count,
        });
        pos = block_start;
    }
    snapshots.reverse();
    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use crate::*;
    use std::io::prelude::*;
    use std::path::Path;

    fn write_entry(writer: &mut ArchiveReadWriter, name: &str, data: &[u8]) {
        writer
            .write_header(Header::new(name, FileMode::new(0o644)))
            .unwrap();
        writer.write_all(data).unwrap();
    }

    fn read_entry(reader: &ArchiveReader, name: &str) -> Vec<u8> {
        let entry = reader.index().find(name).unwrap().clone();
        let mut buf = vec![];
        reader.get(&entry).unwrap().read_to_end(&mut buf).unwrap();
        buf
    }

    fn two_blocks(path: &Path) -> Vec<u64> {
        let mut writer = ArchiveReadWriter::open(path).unwrap();
        write_entry(&mut writer, "a.txt", b"first");
        write_entry(&mut writer, "b.txt", b"second");
        let first = writer.close().unwrap();

        let mut writer = ArchiveReadWriter::open(path).unwrap();
        write_entry(&mut writer, "a.txt", b"replaced");
        writer.write_header(Header::tombstone("b.txt")).unwrap();
        let second = writer.close().unwrap();

        vec![first, second]
    }

    #[test]
    fn empty_file_is_empty_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.strata");
        std::fs::File::create(&path).unwrap();

        let reader = ArchiveReader::open(&path).unwrap();
        assert!(reader.index().is_empty());
        assert!(reader.snapshots().is_empty());
    }

    #[test]
    fn close_without_entries_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nothing.strata");

        let writer = ArchiveReadWriter::open(&path).unwrap();
        assert_eq!(writer.close().unwrap(), 0);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("round.strata");
        two_blocks(&path);

        let reader = ArchiveReader::open(&path).unwrap();
        assert_eq!(reader.index().len(), 4);
        assert_eq!(reader.snapshots().len(), 2);
        assert_eq!(read_entry(&reader, "a.txt"), b"replaced");
        assert!(reader.index().find("b.txt").is_none());

        for entry in reader.index().live().iter() {
            reader.verify(entry).unwrap();
        }
    }

    #[test]
    fn snapshot_offsets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.strata");
        let offsets = two_blocks(&path);

        let reader = ArchiveReader::open_at(&path, offsets[0]).unwrap();
        assert_eq!(reader.offset(), offsets[0]);
        assert_eq!(reader.index().len(), 2);
        assert_eq!(read_entry(&reader, "a.txt"), b"first");
        assert_eq!(read_entry(&reader, "b.txt"), b"second");

        let snapshots = reader.snapshots();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].offset, offsets[0]);
        assert_eq!(snapshots[0].block_start, 0);
        assert_eq!(snapshots[0].entry_count, 2);

        assert_eq!(ArchiveReader::list_snapshots(&path).unwrap().len(), 2);
    }

    #[test]
    fn offset_inside_block_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad-offset.strata");
        let offsets = two_blocks(&path);

        let err = ArchiveReader::open_at(&path, offsets[0] - 1).unwrap_err();
        assert!(matches!(err, Error::InvalidOffset { .. }));

        let err = ArchiveReader::open_at(&path, offsets[1] + 10).unwrap_err();
        assert!(matches!(err, Error::InvalidOffset { .. }));
    }

    #[test]
    fn garbage_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.strata");
        std::fs::write(&path, vec![0x55u8; 64]).unwrap();

        let err = ArchiveReader::open(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidFooter { .. }));
    }

    #[test]
    fn verify_detects_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.strata");
        two_blocks(&path);

        let mut bytes = std::fs::read(&path).unwrap();
        bytes[0] ^= 0xff;
        std::fs::write(&path, bytes).unwrap();

        let reader = ArchiveReader::open(&path).unwrap();
        let entry = reader.index().entries()[0].clone();
        let err = reader.verify(&entry).unwrap_err();
        assert!(matches!(err, Error::ChecksumMismatch { .. }));
    }

    #[test]
    fn pending_entries_are_indexed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pending.strata");

        let mut writer = ArchiveReadWriter::open(&path).unwrap();
        write_entry(&mut writer, "a.txt", b"hello");
        assert!(writer.index().find("a.txt").is_none());

        writer.flush().unwrap();
        let entry = writer.index().find("a.txt").unwrap().clone();
        let mut buf = vec![];
        writer.get(&entry).unwrap().read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"hello");

        let err = writer.write(b"more").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::Other);
    }

    #[test]
    fn commit_keeps_writer_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commit.strata");

        let mut writer = ArchiveReadWriter::open(&path).unwrap();
        write_entry(&mut writer, "a.txt", b"first");
        let first = writer.commit().unwrap();
        assert_eq!(first, std::fs::metadata(&path).unwrap().len());

        let reader = ArchiveReader::open(&path).unwrap();
        assert_eq!(read_entry(&reader, "a.txt"), b"first");

        write_entry(&mut writer, "b.txt", b"second");
        let second = writer.commit().unwrap();
        assert!(second > first);
        assert_eq!(writer.commit().unwrap(), second);

        // Nothing more is written once every entry is committed.
        std::mem::forget(writer);

        let reader = ArchiveReader::open(&path).unwrap();
        assert_eq!(reader.snapshots().len(), 2);
        assert_eq!(read_entry(&reader, "b.txt"), b"second");
    }

    #[test]
    fn oversized_entry_count_is_rejected() {
        use crate::footer::BlockFooter;
        use crate::ser::Serialize;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("count.strata");

        let mut index = b"\xffSTX\x01".to_vec();
        index.extend_from_slice(&u32::MAX.to_le_bytes());

        let footer = BlockFooter::new(u32::MAX, crc32fast::hash(&index), index.len() as u64, index.len() as u64 + 32);
        let mut bytes = index.clone();
        footer.write(&mut bytes).unwrap();
        std::fs::write(&path, &bytes).unwrap();

        let err = ArchiveReader::open(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidBlock { .. }));
    }

    #[test]
    fn drop_finishes_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drop.strata");

        {
            let mut writer = ArchiveReadWriter::open(&path).unwrap();
            write_entry(&mut writer, "a.txt", b"kept");
        }

        let reader = ArchiveReader::open(&path).unwrap();
        assert_eq!(read_entry(&reader, "a.txt"), b"kept");
    }

    #[test]
    fn entry_reader_seeks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seek.strata");

        let mut writer = ArchiveReadWriter::open(&path).unwrap();
        write_entry(&mut writer, "pad.txt", b"0123");
        write_entry(&mut writer, "a.txt", b"abcdefgh");
        writer.close().unwrap();

        let reader = ArchiveReader::open(&path).unwrap();
        let entry = reader.index().find("a.txt").unwrap().clone();
        let mut stream = reader.get(&entry).unwrap();
        assert_eq!(stream.len(), 8);

        let mut buf = [0u8; 3];
        assert_eq!(stream.read_at(&mut buf, 6).unwrap(), 2);
        assert_eq!(&buf[..2], b"gh");
        assert_eq!(stream.position(), 0);

        stream.seek(std::io::SeekFrom::End(-3)).unwrap();
        let mut rest = vec![];
        stream.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"fgh");

        assert!(stream.seek(std::io::SeekFrom::Current(-100)).is_err());
        assert_eq!(stream.read_at(&mut buf, 100).unwrap(), 0);
    }
}
