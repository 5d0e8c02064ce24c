//! Line sources and the parse driver loop.

use std::collections::VecDeque;
use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, trace};

use super::error::ParseError;
use super::parsers::{CaptionsParser, ParseContext};
use super::types::ParsedCaptions;

/// Handle for cancelling a running parse.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the parse.
    ///
    /// The driver stops before the next line and returns what was committed.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Split text on CRLF, LF or CR.
///
/// A trailing terminator yields a final empty line.
pub fn split_lines(text: &str) -> SplitLines<'_> {
    SplitLines { rest: Some(text) }
}

/// Iterator returned by [`split_lines`].
#[derive(Debug, Clone)]
pub struct SplitLines<'a> {
    rest: Option<&'a str>,
}

impl<'a> Iterator for SplitLines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let rest = self.rest?;
        match rest.find(['\r', '\n']) {
            Some(index) => {
                let skip = if rest[index..].starts_with("\r\n") { 2 } else { 1 };
                self.rest = Some(&rest[index + skip..]);
                Some(&rest[..index])
            }
            None => {
                self.rest = None;
                Some(rest)
            }
        }
    }
}

/// Whether `encoding` names UTF-8.
pub fn is_supported_encoding(encoding: &str) -> bool {
    matches!(
        encoding.trim().to_ascii_lowercase().as_str(),
        "utf-8" | "utf8" | "unicode-1-1-utf-8"
    )
}

/// Incremental UTF-8 decoder that yields trimmed lines.
///
/// Chunks may split characters and CRLF pairs. Invalid sequences decode
/// to U+FFFD.
#[derive(Debug, Default)]
struct LineDecoder {
    bytes: Vec<u8>,
    text: String,
    after_cr: bool,
}

impl LineDecoder {
    fn push(&mut self, chunk: &[u8], out: &mut VecDeque<String>) {
        self.bytes.extend_from_slice(chunk);
        loop {
            match std::str::from_utf8(&self.bytes) {
                Ok(text) => {
                    self.text.push_str(text);
                    self.bytes.clear();
                    break;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    self.text
                        .push_str(&String::from_utf8_lossy(&self.bytes[..valid]));
                    match err.error_len() {
                        Some(len) => {
                            self.text.push(char::REPLACEMENT_CHARACTER);
                            self.bytes.drain(..valid + len);
                        }
                        None => {
                            self.bytes.drain(..valid);
                            break;
                        }
                    }
                }
            }
        }
        self.drain_lines(out);
    }

    fn drain_lines(&mut self, out: &mut VecDeque<String>) {
        if self.text.is_empty() {
            return;
        }
        let bytes = self.text.as_bytes();
        let mut start = 0;
        let mut i = 0;
        if self.after_cr && bytes[0] == b'\n' {
            start = 1;
            i = 1;
        }
        self.after_cr = false;

        while i < bytes.len() {
            match bytes[i] {
                b'\n' => {
                    out.push_back(self.text[start..i].trim().to_string());
                    start = i + 1;
                }
                b'\r' => {
                    out.push_back(self.text[start..i].trim().to_string());
                    if bytes.get(i + 1) == Some(&b'\n') {
                        i += 1;
                    } else if i + 1 == bytes.len() {
                        self.after_cr = true;
                    }
                    start = i + 1;
                }
                _ => {}
            }
            i += 1;
        }
        self.text.drain(..start);
    }

    fn finish(&mut self, out: &mut VecDeque<String>) {
        if !self.bytes.is_empty() {
            self.text.push(char::REPLACEMENT_CHARACTER);
            self.bytes.clear();
        }
        out.push_back(std::mem::take(&mut self.text).trim().to_string());
    }
}

const READ_CHUNK: usize = 8 * 1024;

/// Lines decoded from a UTF-8 byte stream.
pub struct ByteLines<R> {
    reader: R,
    decoder: LineDecoder,
    ready: VecDeque<String>,
    buffer: Vec<u8>,
    done: bool,
}

impl<R: Read> ByteLines<R> {
    /// Fails with `LoadFail` for anything but UTF-8.
    pub fn new(reader: R, encoding: &str) -> Result<Self, ParseError> {
        if !is_supported_encoding(encoding) {
            return Err(ParseError::load_fail(format!(
                "unsupported encoding `{}`",
                encoding
            )));
        }
        Ok(Self {
            reader,
            decoder: LineDecoder::default(),
            ready: VecDeque::new(),
            buffer: vec![0; READ_CHUNK],
            done: false,
        })
    }
}

impl<R: Read> Iterator for ByteLines<R> {
    type Item = Result<String, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(line) = self.ready.pop_front() {
                return Some(Ok(line));
            }
            if self.done {
                return None;
            }
            match self.reader.read(&mut self.buffer) {
                Ok(0) => {
                    self.decoder.finish(&mut self.ready);
                    self.done = true;
                }
                Ok(n) => self.decoder.push(&self.buffer[..n], &mut self.ready),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.done = true;
                    return Some(Err(ParseError::load_fail(format!("read failed: {}", err))));
                }
            }
        }
    }
}

/// Feed every line (plus a final empty line) through `parser`.
///
/// Cancellation is checked before each line. A strict-mode diagnostic or a
/// line source failure cancels the run and is returned as `Err`.
pub fn drive<I, S>(
    lines: I,
    parser: &mut dyn CaptionsParser,
    ctx: &mut ParseContext<'_>,
    cancel: Option<&CancelHandle>,
) -> Result<ParsedCaptions, ParseError>
where
    I: IntoIterator<Item = Result<S, ParseError>>,
    S: AsRef<str>,
{
    parser.init(ctx);
    let mut count = 0;

    for line in lines {
        if cancel.is_some_and(CancelHandle::is_cancelled) {
            debug!(lines = count, "Parse cancelled by caller");
            return Ok(finish(parser, ctx, true));
        }

        let line = match line {
            Ok(line) => line,
            Err(err) => {
                parser.finish(true);
                return Err(err);
            }
        };
        count += 1;

        let mut text = line.as_ref();
        if count == 1 {
            text = text.trim_start_matches('\u{feff}');
        }
        trace!(line = count, "{}", text);

        if let Err(err) = parser.parse(text, count, ctx) {
            parser.finish(true);
            return Err(err);
        }
    }

    if let Err(err) = parser.parse("", count + 1, ctx) {
        parser.finish(true);
        return Err(err);
    }
    Ok(finish(parser, ctx, false))
}

fn finish(
    parser: &mut dyn CaptionsParser,
    ctx: &mut ParseContext<'_>,
    cancelled: bool,
) -> ParsedCaptions {
    let mut result = parser.finish(cancelled);
    result.errors = ctx.take_errors();
    debug!(
        cues = result.cues.len(),
        regions = result.regions.len(),
        cancelled,
        "Parse finished"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn splits_all_terminators() {
        let lines: Vec<_> = split_lines("a\r\nb\nc\rd").collect();
        assert_eq!(lines, vec!["a", "b", "c", "d"]);
        let lines: Vec<_> = split_lines("a\n").collect();
        assert_eq!(lines, vec!["a", ""]);
        let lines: Vec<_> = split_lines("").collect();
        assert_eq!(lines, vec![""]);
        let lines: Vec<_> = split_lines("a\r\rb").collect();
        assert_eq!(lines, vec!["a", "", "b"]);
    }

    #[test]
    fn decoder_handles_split_chunks() {
        let mut decoder = LineDecoder::default();
        let mut out = VecDeque::new();
        let text = "  é one\r\ntwo\rthree".as_bytes();
        // split inside the two-byte 'é' and between CR and LF
        decoder.push(&text[..3], &mut out);
        decoder.push(&text[3..9], &mut out);
        decoder.push(&text[9..10], &mut out);
        decoder.push(&text[10..], &mut out);
        decoder.finish(&mut out);
        let lines: Vec<_> = out.into_iter().collect();
        assert_eq!(lines, vec!["é one", "two", "three"]);
    }

    #[test]
    fn decoder_replaces_invalid_bytes() {
        let mut decoder = LineDecoder::default();
        let mut out = VecDeque::new();
        decoder.push(b"a\xffb\n", &mut out);
        decoder.finish(&mut out);
        assert_eq!(out.pop_front().as_deref(), Some("a\u{fffd}b"));
        assert_eq!(out.pop_front().as_deref(), Some(""));
    }

    #[test]
    fn byte_lines_reject_unknown_encoding() {
        let err = ByteLines::new(Cursor::new(Vec::new()), "latin1").err().unwrap();
        assert_eq!(err.kind, crate::captions::error::ParseErrorKind::LoadFail);
        assert!(ByteLines::new(Cursor::new(Vec::new()), " UTF-8 ").is_ok());
    }

    #[test]
    fn byte_lines_from_reader() {
        let lines: Vec<String> = ByteLines::new(Cursor::new(b"WEBVTT\n\n x \n".to_vec()), "utf-8")
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(lines, vec!["WEBVTT", "", "x", ""]);
    }

    #[test]
    fn cancel_handle_is_shared() {
        let handle = CancelHandle::new();
        let clone = handle.clone();
        assert!(!clone.is_cancelled());
        handle.cancel();
        assert!(clone.is_cancelled());
    }
}
