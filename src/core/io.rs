//! VCF text sources
//!
//! Opens plain, gzip or bzip2 VCF files behind a single `BufRead`, and
//! provides a line iterator that reuses its buffer.

use log::debug;
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

/// Default buffer size for BufReader (128KB)
pub const DEFAULT_BUFFER_SIZE: usize = 128 * 1024;

/// Threshold for using memory mapping on plain files (100MB)
pub const MMAP_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Compression format of a VCF file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFormat {
    /// Plain text (uncompressed)
    Plain,
    /// Gzip or BGZF compressed (.gz)
    Gzip,
    /// Bzip2 compressed (.bz2)
    Bzip2,
}

/// Detect compression format from file extension, then magic bytes
pub fn detect_compression(path: &Path) -> io::Result<CompressionFormat> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    if extension == "gz" || extension == "bgz" {
        return Ok(CompressionFormat::Gzip);
    }
    if extension == "bz2" {
        return Ok(CompressionFormat::Bzip2);
    }

    let mut file = File::open(path)?;
    let mut magic = [0u8; 3];
    let bytes_read = file.read(&mut magic)?;

    if bytes_read >= 2 && magic[0] == 0x1f && magic[1] == 0x8b {
        return Ok(CompressionFormat::Gzip);
    }
    // BZ2 magic: "BZh"
    if bytes_read >= 3 && magic[0] == 0x42 && magic[1] == 0x5a && magic[2] == 0x68 {
        return Ok(CompressionFormat::Bzip2);
    }

    Ok(CompressionFormat::Plain)
}

/// Memory-mapped file reader
pub struct MappedReader {
    mmap: Mmap,
    position: usize,
}

impl MappedReader {
    pub fn new(file: &File) -> io::Result<Self> {
        // SAFETY: We assume the file won't be modified while mapped
        let mmap = unsafe { Mmap::map(file)? };
        Ok(Self { mmap, position: 0 })
    }

    fn len(&self) -> usize {
        self.mmap.len()
    }
}

impl Read for MappedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = &self.mmap[self.position..];
        let to_read = std::cmp::min(buf.len(), remaining.len());
        buf[..to_read].copy_from_slice(&remaining[..to_read]);
        self.position += to_read;
        Ok(to_read)
    }
}

impl BufRead for MappedReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        Ok(&self.mmap[self.position..])
    }

    fn consume(&mut self, amt: usize) {
        self.position = std::cmp::min(self.position + amt, self.mmap.len());
    }
}

/// A reader over a VCF file, whatever its compression
pub enum SmartReader {
    /// Buffered plain text
    Buffered(BufReader<File>),
    /// Memory-mapped plain text (large files)
    Mapped(MappedReader),
    /// Gzip/BGZF stream (multi-member aware)
    Gzip(BufReader<flate2::read::MultiGzDecoder<File>>),
    /// Bzip2 stream
    Bzip2(BufReader<bzip2::read::BzDecoder<File>>),
}

impl SmartReader {
    /// Open a file, choosing decompression and buffering automatically
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let format = detect_compression(path)?;
        let file = File::open(path)?;

        match format {
            CompressionFormat::Gzip => {
                let decoder = flate2::read::MultiGzDecoder::new(file);
                Ok(SmartReader::Gzip(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, decoder)))
            }
            CompressionFormat::Bzip2 => {
                let decoder = bzip2::read::BzDecoder::new(file);
                Ok(SmartReader::Bzip2(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, decoder)))
            }
            CompressionFormat::Plain => {
                if file.metadata()?.len() >= MMAP_THRESHOLD {
                    let reader = MappedReader::new(&file)?;
                    debug!("Memory-mapped {} ({} bytes)", path.display(), reader.len());
                    Ok(SmartReader::Mapped(reader))
                } else {
                    Ok(SmartReader::Buffered(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file)))
                }
            }
        }
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self, SmartReader::Mapped(_))
    }

    pub fn compression(&self) -> CompressionFormat {
        match self {
            SmartReader::Buffered(_) | SmartReader::Mapped(_) => CompressionFormat::Plain,
            SmartReader::Gzip(_) => CompressionFormat::Gzip,
            SmartReader::Bzip2(_) => CompressionFormat::Bzip2,
        }
    }
}

impl Read for SmartReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            SmartReader::Buffered(reader) => reader.read(buf),
            SmartReader::Mapped(reader) => reader.read(buf),
            SmartReader::Gzip(reader) => reader.read(buf),
            SmartReader::Bzip2(reader) => reader.read(buf),
        }
    }
}

impl BufRead for SmartReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self {
            SmartReader::Buffered(reader) => reader.fill_buf(),
            SmartReader::Mapped(reader) => reader.fill_buf(),
            SmartReader::Gzip(reader) => reader.fill_buf(),
            SmartReader::Bzip2(reader) => reader.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            SmartReader::Buffered(reader) => reader.consume(amt),
            SmartReader::Mapped(reader) => reader.consume(amt),
            SmartReader::Gzip(reader) => reader.consume(amt),
            SmartReader::Bzip2(reader) => reader.consume(amt),
        }
    }
}

/// Open a VCF file (plain, .gz or .bz2)
pub fn open_vcf<P: AsRef<Path>>(path: P) -> io::Result<SmartReader> {
    SmartReader::open(path)
}

/// Line iterator that reuses a buffer to avoid allocations
pub struct LineIterator<R: BufRead> {
    reader: R,
    buffer: String,
}

impl<R: BufRead> LineIterator<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: String::with_capacity(1024),
        }
    }

    /// Read the next line into the internal buffer
    /// Returns None at EOF, Some(Ok(&str)) on success, Some(Err) on error
    pub fn next_line(&mut self) -> Option<io::Result<&str>> {
        self.buffer.clear();
        match self.reader.read_line(&mut self.buffer) {
            Ok(0) => None, // EOF
            Ok(_) => {
                if self.buffer.ends_with('\n') {
                    self.buffer.pop();
                    if self.buffer.ends_with('\r') {
                        self.buffer.pop();
                    }
                }
                Some(Ok(&self.buffer))
            }
            Err(e) => Some(Err(e)),
        }
    }

    /// Give back the underlying reader
    pub fn into_inner(self) -> R {
        self.reader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_detect_plain() -> io::Result<()> {
        let mut temp = NamedTempFile::new()?;
        writeln!(temp, "##fileformat=VCFv4.2")?;
        temp.flush()?;
        assert_eq!(detect_compression(temp.path())?, CompressionFormat::Plain);
        Ok(())
    }

    #[test]
    fn test_open_gzip_by_magic() -> io::Result<()> {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let mut temp = NamedTempFile::new()?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"##fileformat=VCFv4.2\n#CHROM\n")?;
        temp.write_all(&encoder.finish()?)?;
        temp.flush()?;

        let reader = open_vcf(temp.path())?;
        assert_eq!(reader.compression(), CompressionFormat::Gzip);

        let mut lines = LineIterator::new(reader);
        assert_eq!(lines.next_line().unwrap()?, "##fileformat=VCFv4.2");
        assert_eq!(lines.next_line().unwrap()?, "#CHROM");
        assert!(lines.next_line().is_none());
        Ok(())
    }

    #[test]
    fn test_smart_reader_small_plain_is_buffered() -> io::Result<()> {
        let mut temp = NamedTempFile::new()?;
        writeln!(temp, "small file content")?;
        temp.flush()?;

        let reader = SmartReader::open(temp.path())?;
        assert!(!reader.is_mapped());
        Ok(())
    }

    #[test]
    fn test_line_iterator_strips_crlf() -> io::Result<()> {
        let data: &[u8] = b"line1\r\nline2\nline3";
        let mut iter = LineIterator::new(BufReader::new(data));

        assert_eq!(iter.next_line().unwrap()?, "line1");
        assert_eq!(iter.next_line().unwrap()?, "line2");
        assert_eq!(iter.next_line().unwrap()?, "line3");
        assert!(iter.next_line().is_none());
        Ok(())
    }

    #[test]
    fn test_mapped_reader_len() -> io::Result<()> {
        let mut temp = NamedTempFile::new()?;
        temp.write_all(b"test content")?;
        temp.flush()?;

        let file = File::open(temp.path())?;
        let reader = MappedReader::new(&file)?;

        assert_eq!(reader.len(), 12);
        Ok(())
    }
}
