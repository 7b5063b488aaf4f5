//! Opening save and game files as decoded text.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use encoding_rs::{Encoding, UTF_8};
use encoding_rs_io::{DecodeReaderBytes, DecodeReaderBytesBuilder};

/// How to turn the bytes of a source into text.
#[derive(Debug, Clone, Copy)]
pub struct SourceOptions {
    /// Melted saves are UTF-8; game data files are usually `WINDOWS_1252`.
    /// Invalid sequences become U+FFFD either way.
    pub encoding: &'static Encoding,
}

impl Default for SourceOptions {
    fn default() -> Self {
        SourceOptions { encoding: UTF_8 }
    }
}

impl SourceOptions {
    pub fn with_encoding(encoding: &'static Encoding) -> Self {
        SourceOptions { encoding }
    }
}

/// Resolves a WHATWG label such as `"utf-8"` or `"windows-1252"`.
pub fn encoding_by_label(label: &str) -> Option<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
}

/// A buffered, decoding reader over any byte source.
pub type DecodedReader<R> = BufReader<DecodeReaderBytes<R, Vec<u8>>>;

/// Wraps `reader` so that it yields valid UTF-8.
pub fn decode_reader<R: Read>(reader: R, options: &SourceOptions) -> DecodedReader<R> {
    BufReader::new(
        DecodeReaderBytesBuilder::new()
            .encoding(Some(options.encoding))
            .build(reader),
    )
}

/// Opens a file for streaming, line-oriented reading.
pub fn open_source(path: &Path, options: &SourceOptions) -> io::Result<DecodedReader<File>> {
    let file = File::open(path)?;
    log::debug!(
        "Opened {} as {}",
        path.display(),
        options.encoding.name()
    );
    Ok(decode_reader(file, options))
}

/// Reads a whole (small) file into a string.
pub fn read_source(path: &Path, options: &SourceOptions) -> io::Result<String> {
    let mut contents = String::new();
    open_source(path, options)?.read_to_string(&mut contents)?;
    Ok(contents)
}
