use std::io::{Result, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use byteorder::{LittleEndian, WriteBytesExt};

use crate::footer::{BlockFooter, FORMAT_VERSION, INDEX_SIGNATURE};
use crate::{Header, IndexEntry};

pub(crate) trait Serialize {
    fn write<W: Write>(&self, writer: &mut W) -> Result<()>;
}

impl Serialize for str {
    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LittleEndian>(self.len() as u32)?;
        writer.write_all(self.as_bytes())
    }
}

impl Serialize for SystemTime {
    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        // Seconds are signed so times before the epoch survive; nanos are always forward.
        let (secs, nanos) = match self.duration_since(UNIX_EPOCH) {
            Ok(d) => (d.as_secs() as i64, d.subsec_nanos()),
            Err(e) => {
                let d = e.duration();
                match d.subsec_nanos() {
                    0 => (-(d.as_secs() as i64), 0),
                    n => (-(d.as_secs() as i64) - 1, 1_000_000_000 - n),
                }
            }
        };
        writer.write_i64::<LittleEndian>(secs)?;
        writer.write_u32::<LittleEndian>(nanos)
    }
}

impl Serialize for Header {
    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.name.write(writer)?;
        writer.write_u32::<LittleEndian>(self.mode.bits())?;
        self.mod_time.write(writer)?;
        writer.write_u32::<LittleEndian>(self.flags.bits())
    }
}

/// The entries of one block, with starts stored relative to the block.
pub(crate) struct IndexBlock<'a> {
    pub(crate) entries: &'a [IndexEntry],
    pub(crate) block_start: u64,
}

impl Serialize for IndexBlock<'_> {
    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(INDEX_SIGNATURE)?;
        writer.write_u8(FORMAT_VERSION)?;
        writer.write_u32::<LittleEndian>(self.entries.len() as u32)?;

        for entry in self.entries {
            entry.header.write(writer)?;
            writer.write_u64::<LittleEndian>(entry.start - self.block_start)?;
            writer.write_u64::<LittleEndian>(entry.size)?;
            writer.write_u32::<LittleEndian>(entry.crc32)?;
        }

        Ok(())
    }
}

impl Serialize for BlockFooter {
    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.magic_bytes)?;
        writer.write_u8(self.version)?;
        writer.write_all(&[0u8; 3])?;
        writer.write_u32::<LittleEndian>(self.entry_count)?;
        writer.write_u32::<LittleEndian>(self.index_crc32)?;
        writer.write_u64::<LittleEndian>(self.index_length)?;
        writer.write_u64::<LittleEndian>(self.block_length)
    }
}
