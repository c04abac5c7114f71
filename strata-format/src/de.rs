use std::io::{Error, ErrorKind, Read, Result};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::footer::BlockFooter;
use crate::{FileMode, Flags, Header, IndexEntry};

pub(crate) trait DeserializeOwned {
    fn deserialize_owned<R: Read>(reader: &mut R) -> Result<Self>
    where
        Self: Sized;
}

impl DeserializeOwned for String {
    fn deserialize_owned<R: Read>(reader: &mut R) -> Result<Self> {
        let len = reader.read_u32::<LittleEndian>()?;
        let mut buf = vec![];
        reader.take(len as u64).read_to_end(&mut buf)?;
        if buf.len() != len as usize {
            return Err(ErrorKind::UnexpectedEof.into());
        }
        String::from_utf8(buf).map_err(|e| Error::new(ErrorKind::InvalidData, e))
    }
}

impl DeserializeOwned for SystemTime {
    fn deserialize_owned<R: Read>(reader: &mut R) -> Result<Self> {
        let secs = reader.read_i64::<LittleEndian>()?;
        let nanos = reader.read_u32::<LittleEndian>()?;
        if nanos >= 1_000_000_000 {
            return Err(Error::new(ErrorKind::InvalidData, "nanoseconds out of range"));
        }

        let time = if secs >= 0 {
            UNIX_EPOCH.checked_add(Duration::new(secs as u64, nanos))
        } else {
            UNIX_EPOCH
                .checked_sub(Duration::from_secs(secs.unsigned_abs()))
                .and_then(|t| t.checked_add(Duration::from_nanos(nanos as u64)))
        };

        time.ok_or_else(|| Error::new(ErrorKind::InvalidData, "timestamp out of range"))
    }
}

impl DeserializeOwned for Header {
    fn deserialize_owned<R: Read>(reader: &mut R) -> Result<Self> {
        let name = String::deserialize_owned(reader)?;
        let mode = FileMode::new(reader.read_u32::<LittleEndian>()?);
        let mod_time = SystemTime::deserialize_owned(reader)?;
        let flags = Flags::from_bits(reader.read_u32::<LittleEndian>()?);

        Ok(Header {
            name,
            mode,
            mod_time,
            flags,
        })
    }
}

impl DeserializeOwned for IndexEntry {
    /// Reads an entry as stored, with `start` still relative to its block.
    fn deserialize_owned<R: Read>(reader: &mut R) -> Result<Self> {
        let header = Header::deserialize_owned(reader)?;
        let start = reader.read_u64::<LittleEndian>()?;
        let size = reader.read_u64::<LittleEndian>()?;
        let crc32 = reader.read_u32::<LittleEndian>()?;

        tracing::trace!(name = %header.name, start, size, "deserialized IndexEntry");

        Ok(IndexEntry {
            header,
            start,
            size,
            crc32,
        })
    }
}

impl DeserializeOwned for BlockFooter {
    fn deserialize_owned<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic_bytes = [0u8; 4];
        reader.read_exact(&mut magic_bytes)?;
        let version = reader.read_u8()?;
        let mut reserved = [0u8; 3];
        reader.read_exact(&mut reserved)?;
        let entry_count = reader.read_u32::<LittleEndian>()?;
        let index_crc32 = reader.read_u32::<LittleEndian>()?;
        let index_length = reader.read_u64::<LittleEndian>()?;
        let block_length = reader.read_u64::<LittleEndian>()?;

        let footer = BlockFooter {
            magic_bytes,
            version,
            entry_count,
            index_crc32,
            index_length,
            block_length,
        };

        tracing::debug!(
            entries = entry_count,
            index_length,
            block_length,
            "deserialized BlockFooter"
        );

        Ok(footer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ser::Serialize;
    use std::io::Cursor;

    #[test]
    fn pre_epoch_time() {
        let t = UNIX_EPOCH - Duration::new(10, 250);
        let mut buf = vec![];
        t.write(&mut buf).unwrap();
        let back = SystemTime::deserialize_owned(&mut Cursor::new(buf)).unwrap();
        assert_eq!(t, back);
    }

    #[test]
    fn truncated_name() {
        let mut buf = vec![];
        "hello".write(&mut buf).unwrap();
        buf.truncate(6);
        let err = String::deserialize_owned(&mut Cursor::new(buf)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
    }
}
