//! Fixed-size chunked stream copy

use std::io::{self, Read, Write};

/// Size of each copy chunk (64KB)
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Which side of a copy failed
#[derive(Debug)]
pub enum CopyError {
    Read(io::Error),
    Write(io::Error),
}

/// Copy `reader` into `writer` until clean end-of-input, one chunk at a time.
///
/// Returns the number of bytes copied. Short writes are resumed from the
/// unwritten remainder of the chunk; a writer that accepts zero bytes is
/// reported as [`io::ErrorKind::WriteZero`].
pub fn copy_chunks<R, W>(reader: &mut R, writer: &mut W, chunk_size: usize) -> Result<u64, CopyError>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    debug_assert!(chunk_size > 0);
    let mut buffer = vec![0u8; chunk_size];
    let mut total = 0u64;

    loop {
        let count = match reader.read(&mut buffer) {
            Ok(0) => return Ok(total),
            Ok(count) => count,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CopyError::Read(e)),
        };

        write_chunk(writer, &buffer[..count]).map_err(CopyError::Write)?;
        total += count as u64;
    }
}

fn write_chunk<W: Write + ?Sized>(writer: &mut W, mut chunk: &[u8]) -> io::Result<()> {
    while !chunk.is_empty() {
        match writer.write(chunk) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "destination accepted no bytes",
                ));
            }
            Ok(written) => chunk = &chunk[written..],
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
