pub(crate) const MAGIC_BYTES: &[u8; 4] = b"\xffSTR";
pub(crate) const INDEX_SIGNATURE: &[u8; 4] = b"\xffSTX";
pub(crate) const FORMAT_VERSION: u8 = 1;
pub(crate) const FOOTER_SIZE: u64 = 32;
/// Signature, version and entry count ahead of the entries of an index.
pub(crate) const INDEX_HEADER_SIZE: u64 = 9;
/// An index entry with an empty name.
pub(crate) const MIN_INDEX_ENTRY_SIZE: u64 = 44;

/// Trailer closing every block. Read backwards from a block's end, it locates the
/// index that precedes it and the start of the block itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BlockFooter {
    pub(crate) magic_bytes: [u8; 4],
    pub(crate) version: u8,
    pub(crate) entry_count: u32,
    pub(crate) index_crc32: u32,
    pub(crate) index_length: u64,
    /// Entry bytes, index and footer together.
    pub(crate) block_length: u64,
}

impl BlockFooter {
    pub(crate) fn new(entry_count: u32, index_crc32: u32, index_length: u64, block_length: u64) -> Self {
        BlockFooter {
            magic_bytes: *MAGIC_BYTES,
            version: FORMAT_VERSION,
            entry_count,
            index_crc32,
            index_length,
            block_length,
        }
    }

    #[inline(always)]
    pub(crate) fn is_valid(&self) -> bool {
        &self.magic_bytes == MAGIC_BYTES
    }
}
