//! Gzip + token-level XML reader shared by every entity decoder (spec
//! §4.1).
//!
//! Grounded on the `ReleasesReader` wrapper in `disco-quick`: a thin
//! owner of a `quick_xml::Reader` that the per-entity state machines
//! drive one [`quick_xml::events::Event`] at a time, keeping peak memory
//! at one record's depth regardless of file size.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::Result;

/// Counts bytes read from the underlying compressed file, independent of
/// how many decompressed bytes the XML reader has consumed. Used only
/// for the byte-based progress signal (SPEC_FULL.md, Supplemented
/// Features) — never for correctness.
struct CountingReader<R> {
    inner: R,
    count: u64,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count += n as u64;
        Ok(n)
    }
}

pub struct DumpReader {
    reader: Reader<BufReader<GzDecoder<CountingReader<File>>>>,
    buf: Vec<u8>,
    compressed_len: u64,
}

impl DumpReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let compressed_len = file.metadata()?.len();
        let counting = CountingReader { inner: file, count: 0 };
        let gz = GzDecoder::new(counting);
        let mut reader = Reader::from_reader(BufReader::new(gz));
        reader.config_mut().trim_text(true);
        Ok(Self {
            reader,
            buf: Vec::with_capacity(8 * 1024),
            compressed_len,
        })
    }

    /// Compressed bytes consumed from disk so far.
    #[must_use]
    pub fn bytes_read(&self) -> u64 {
        self.reader.get_ref().get_ref().get_ref().count
    }

    #[must_use]
    pub const fn compressed_len(&self) -> u64 {
        self.compressed_len
    }

    /// Reads the next XML token. Returns an owned event so callers aren't
    /// tied to the lifetime of the internal scratch buffer.
    pub fn read_event(&mut self) -> Result<Event<'static>> {
        self.buf.clear();
        let ev = self.reader.read_event_into(&mut self.buf)?;
        Ok(ev.into_owned())
    }
}

/// Reads an attribute's value by local name from a start/empty tag event,
/// returning `None` if absent or not valid UTF-8.
pub fn find_attr(e: &quick_xml::events::BytesStart<'_>, name: &str) -> Option<String> {
    e.attributes().flatten().find_map(|a| {
        if a.key.as_ref() == name.as_bytes() {
            a.unescape_value().ok().map(|v| v.into_owned())
        } else {
            None
        }
    })
}
