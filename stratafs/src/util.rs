use std::io;

use strata_format::FileMode;

use crate::{File, Filesystem, FsError, FsResult, OpenFlags};

const CHUNK_SIZE: usize = 32 * 1024;

/// Reads until `buf` is full or the file ends. Returns the number of bytes read.
pub fn read_full<F: File + ?Sized>(file: &mut F, buf: &mut [u8]) -> FsResult<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(FsError::Io(e)) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

pub fn read_all<F: File + ?Sized>(file: &mut F) -> FsResult<Vec<u8>> {
    let mut out = vec![];
    let mut chunk = vec![0u8; CHUNK_SIZE];
    loop {
        let n = read_full(file, &mut chunk)?;
        out.extend_from_slice(&chunk[..n]);
        if n < chunk.len() {
            return Ok(out);
        }
    }
}

pub fn write_all<F: File + ?Sized>(file: &mut F, mut buf: &[u8]) -> FsResult<()> {
    while !buf.is_empty() {
        match file.write(buf)? {
            0 => return Err(FsError::Io(io::ErrorKind::WriteZero.into())),
            n => buf = &buf[n..],
        }
    }
    Ok(())
}

/// Appends `len` zero bytes.
pub fn write_zeros<F: File + ?Sized>(file: &mut F, mut len: u64) -> FsResult<()> {
    let chunk = vec![0u8; len.min(CHUNK_SIZE as u64) as usize];
    while len > 0 {
        let n = len.min(chunk.len() as u64) as usize;
        write_all(file, &chunk[..n])?;
        len -= n as u64;
    }
    Ok(())
}

/// Streams the rest of `file` into `dest`.
pub fn copy_to<F: File + ?Sized, W: io::Write>(file: &mut F, mut dest: W) -> FsResult<u64> {
    let mut chunk = vec![0u8; CHUNK_SIZE];
    let mut total = 0;
    loop {
        let n = read_full(file, &mut chunk)?;
        dest.write_all(&chunk[..n])?;
        total += n as u64;
        if n < chunk.len() {
            return Ok(total);
        }
    }
}

pub fn read_file<S: Filesystem + ?Sized>(fs: &S, path: &str) -> FsResult<Vec<u8>> {
    let mut file = fs.open(path)?;
    let data = read_all(&mut *file);
    let closed = file.close();
    let data = data?;
    closed?;
    Ok(data)
}

/// Creates `path` with `data` as its content. The file is closed on every path
/// out of this function.
pub fn write_file<S: Filesystem + ?Sized>(fs: &S, path: &str, data: &[u8], mode: FileMode) -> FsResult<()> {
    let mut file = fs.open_file(
        path,
        OpenFlags::CREATE | OpenFlags::TRUNCATE | OpenFlags::WRITE_ONLY,
        mode,
    )?;
    let written = write_all(&mut *file, data);
    let closed = file.close();
    written?;
    closed
}
