//! Caption parsing module.
//!
//! Parses WebVTT, SRT and SSA/ASS into one caption model, and tokenizes
//! cue markup.
//!
//! # Components
//!
//! - **types**: Core data structures (Cue, Region, ParsedCaptions)
//! - **parsers**: Line-driven state machines per format
//! - **stream**: Line sources, UTF-8 byte decoding and the driver loop
//! - **tokenize**: Cue text markup tree
//! - **timing**: Timestamp codecs
//!
//! # Usage
//!
//! ```ignore
//! use captions_core::captions::{parse_file, CaptionsReader, ParseOptions};
//!
//! let captions = parse_file("movie.vtt", &ParseOptions::default())?;
//!
//! let captions = CaptionsReader::new(ParseOptions::default().collect_errors(true))
//!     .on_cue(|cue| println!("{}", cue.text))
//!     .read_text(&content)?;
//! ```

mod error;
pub mod parsers;
pub mod stream;
pub mod timing;
pub mod tokenize;
mod types;
pub mod units;

use std::fs;
use std::io::Read;
use std::path::Path;

use tracing::debug;

pub use error::{CaptionsError, ParseError, ParseErrorKind, SettingScope};
pub use parsers::{
    BuiltinParser, CaptionsParser, ParseCallbacks, ParseContext, ParseOptions, ParserFactory,
};
pub use stream::{split_lines, CancelHandle};
pub use tokenize::{tokenize_cue, tokenize_text, CueElement, CueNode, TagKind};
pub use types::{
    CaptionsFormat, Cue, CueAlign, HeaderMetadata, LineAlign, OrderedMap, ParsedCaptions,
    PositionAlign, Presentation, Region, RegionScroll, WritingMode,
};

use stream::{drive, ByteLines};

/// Parse caption text held in memory.
pub fn parse_text(text: &str, options: &ParseOptions) -> Result<ParsedCaptions, CaptionsError> {
    CaptionsReader::new(options.clone()).read_text(text)
}

/// Parse captions from an iterator of already-split lines.
pub fn parse_line_stream<I, S>(lines: I, options: &ParseOptions) -> Result<ParsedCaptions, CaptionsError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    CaptionsReader::new(options.clone()).read_lines(lines)
}

/// Parse captions from a byte stream in the given encoding.
///
/// Only UTF-8 is supported. Read failures and unsupported encodings
/// surface as a `LoadFail` diagnostic.
pub fn parse_byte_stream<R: Read>(
    reader: R,
    encoding: &str,
    options: &ParseOptions,
) -> Result<ParsedCaptions, CaptionsError> {
    CaptionsReader::new(options.clone()).read_bytes(reader, encoding)
}

/// Parse a caption file from disk.
///
/// The format comes from the file extension, falling back to content
/// detection. A caller-supplied parser factory still takes precedence.
pub fn parse_file(
    path: impl AsRef<Path>,
    options: &ParseOptions,
) -> Result<ParsedCaptions, CaptionsError> {
    let path = path.as_ref();

    let content = fs::read_to_string(path).map_err(|e| CaptionsError::read(path, e))?;

    let format =
        CaptionsFormat::from_extension(path).unwrap_or_else(|| CaptionsFormat::detect(&content));
    debug!(path = %path.display(), format = format.extension(), "Parsing caption file");

    let options = ParseOptions {
        format,
        ..options.clone()
    };
    parse_text(&content, &options)
}

/// Configurable parse run: options, event callbacks and cancellation.
///
/// Callbacks fire as soon as each entity is finalized.
#[derive(Debug, Default)]
pub struct CaptionsReader<'a> {
    options: ParseOptions,
    callbacks: ParseCallbacks<'a>,
    cancel: Option<CancelHandle>,
}

impl<'a> CaptionsReader<'a> {
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            callbacks: ParseCallbacks::default(),
            cancel: None,
        }
    }

    pub fn on_header_metadata(mut self, callback: impl FnMut(&HeaderMetadata) + 'a) -> Self {
        self.callbacks.on_header_metadata = Some(Box::new(callback));
        self
    }

    pub fn on_cue(mut self, callback: impl FnMut(&Cue) + 'a) -> Self {
        self.callbacks.on_cue = Some(Box::new(callback));
        self
    }

    pub fn on_region(mut self, callback: impl FnMut(&Region) + 'a) -> Self {
        self.callbacks.on_region = Some(Box::new(callback));
        self
    }

    /// Observe lenient-mode diagnostics as they happen.
    pub fn on_error(mut self, callback: impl FnMut(&ParseError) + 'a) -> Self {
        self.callbacks.on_error = Some(Box::new(callback));
        self
    }

    pub fn with_cancel(mut self, handle: CancelHandle) -> Self {
        self.cancel = Some(handle);
        self
    }

    pub fn read_text(self, text: &str) -> Result<ParsedCaptions, CaptionsError> {
        self.run(split_lines(text).map(Ok))
    }

    pub fn read_lines<I, S>(self, lines: I) -> Result<ParsedCaptions, CaptionsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.run(lines.into_iter().map(Ok))
    }

    pub fn read_bytes<R: Read>(
        self,
        reader: R,
        encoding: &str,
    ) -> Result<ParsedCaptions, CaptionsError> {
        let lines = ByteLines::new(reader, encoding)?;
        self.run(lines)
    }

    fn run<I, S>(self, lines: I) -> Result<ParsedCaptions, CaptionsError>
    where
        I: IntoIterator<Item = Result<S, ParseError>>,
        S: AsRef<str>,
    {
        let Self {
            options,
            callbacks,
            cancel,
        } = self;

        debug!(
            format = options.format.extension(),
            strict = options.strict,
            collect_errors = options.collect_errors,
            "Starting caption parse"
        );

        let mut ctx = ParseContext::new(options.strict, options.collect_errors, callbacks);
        let mut parser = options.create_parser();
        let result = drive(lines, parser.as_mut(), &mut ctx, cancel.as_ref())?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    fn collecting() -> ParseOptions {
        ParseOptions::default().collect_errors(true)
    }

    #[test]
    fn minimal_webvtt_document() {
        let result = parse_text("WEBVTT\n\n00:00 --> 00:02\nHello", &collecting()).unwrap();
        assert_eq!(result.cues.len(), 1);
        let cue = &result.cues[0];
        assert_eq!(cue.start_time, 0.0);
        assert_eq!(cue.end_time, 2.0);
        assert_eq!(cue.text, "Hello");
        assert_eq!(result.errors, Some(vec![]));
    }

    #[test]
    fn cues_share_their_region_instance() {
        let text = "WEBVTT\n\nREGION\nid:foo\nwidth:40%\n\nREGION\nid:bar\nlines:2\n\n\
                    00:00.000 --> 00:01.000 region:foo\nOne\n\n\
                    00:01.000 --> 00:02.000 region:bar\nTwo\n";
        let result = parse_text(text, &collecting()).unwrap();
        assert_eq!(result.regions.len(), 2);
        assert_eq!(result.cues.len(), 2);

        let foo = result.region("foo").unwrap();
        let bar = result.region("bar").unwrap();
        assert_eq!(foo.width, 40.0);
        assert_eq!(bar.lines, 2);
        assert!(result.cues[0].is_in_region(foo));
        assert!(result.cues[1].is_in_region(bar));
        assert!(!result.cues[0].is_in_region(bar));
    }

    #[test]
    fn subrip_document() {
        let options = ParseOptions::new(CaptionsFormat::Srt);
        let result = parse_text("1\n00:00:12,720 --> 00:00:15,120\nText", &options).unwrap();
        assert_eq!(result.cues.len(), 1);
        assert_eq!(result.cues[0].id, "1");
        assert!((result.cues[0].start_time - 12.72).abs() < 1e-9);
        assert!((result.cues[0].end_time - 15.12).abs() < 1e-9);
        assert!(result.errors.is_none());
    }

    #[test]
    fn percentage_line_and_bad_line_value() {
        let text = "WEBVTT\n\n00:00.000 --> 00:01.000 line:50%\nA\n\n00:01.000 --> 00:02.000 line:NaN\nB\n";
        let result = parse_text(text, &collecting()).unwrap();
        assert_eq!(result.cues.len(), 2);
        assert!(!result.cues[0].snap_to_lines);
        assert_eq!(result.cues[0].line, Some(50.0));
        assert!(result.cues[1].snap_to_lines);
        assert_eq!(result.cues[1].line, None);

        let errors = result.errors.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ParseErrorKind::BadSettingValue);
        assert_eq!(errors[0].line, 6);
    }

    #[test]
    fn errors_are_none_unless_collected() {
        let text = "WEBVTT\n\n00:00.000 --> 00:01.000 bogus:1\nA\n";
        let result = parse_text(text, &ParseOptions::default()).unwrap();
        assert!(result.errors.is_none());
        assert_eq!(result.cues.len(), 1);

        let result = parse_text(text, &collecting()).unwrap();
        let errors = result.errors.unwrap();
        assert_eq!(errors[0].kind, ParseErrorKind::UnknownSetting);
    }

    #[test]
    fn strict_mode_returns_first_error() {
        let options = ParseOptions::default().strict(true);
        let err = parse_text("not a caption file\n", &options).unwrap_err();
        let parse_err = err.parse_error().unwrap();
        assert_eq!(parse_err.kind, ParseErrorKind::BadSignature);
        assert_eq!(parse_err.line, 1);

        let text = "WEBVTT\n\n00:02.000 --> 00:01.000\nA\n";
        let err = parse_text(text, &options).unwrap_err();
        assert_eq!(err.parse_error().unwrap().kind, ParseErrorKind::BadTimestamp);
    }

    #[test]
    fn lenient_mode_reports_missing_signature() {
        let text = "Captions\n\n00:00.000 --> 00:01.000\nA\n";
        let mut seen = Vec::new();
        let result = CaptionsReader::new(ParseOptions::default())
            .on_error(|e| seen.push(e.kind))
            .read_text(text)
            .unwrap();
        assert_eq!(result.cues.len(), 1);
        assert_eq!(seen, vec![ParseErrorKind::BadSignature]);
    }

    #[test]
    fn callbacks_fire_per_entity() {
        let text = "WEBVTT\nKind: captions\n\nREGION\nid:r\n\n00:00.000 --> 00:01.000\nA\n\n00:01.000 --> 00:02.000\nB\n";
        let mut cues = Vec::new();
        let mut regions = Vec::new();
        let mut kinds = Vec::new();
        CaptionsReader::new(ParseOptions::default())
            .on_cue(|cue| cues.push(cue.text.clone()))
            .on_region(|region| regions.push(region.id.clone()))
            .on_header_metadata(|meta| kinds.push(meta.get("Kind").map(str::to_string)))
            .read_text(text)
            .unwrap();
        assert_eq!(cues, vec!["A", "B"]);
        assert_eq!(regions, vec!["r"]);
        assert_eq!(kinds, vec![Some("captions".to_string())]);
    }

    #[test]
    fn cancellation_keeps_committed_entities() {
        let handle = CancelHandle::new();
        let trigger = handle.clone();
        let text = "WEBVTT\n\n00:00.000 --> 00:01.000\nA\n\n00:01.000 --> 00:02.000\nB\n\n00:02.000 --> 00:03.000\nC\n";
        let result = CaptionsReader::new(ParseOptions::default())
            .on_cue(move |_| trigger.cancel())
            .with_cancel(handle)
            .read_text(text)
            .unwrap();
        assert_eq!(result.cues.len(), 1);
        assert_eq!(result.cues[0].text, "A");
    }

    #[test]
    fn line_stream_input() {
        let lines = vec!["WEBVTT", "", "00:01.000 --> 00:02.000", "Hi"];
        let result = parse_line_stream(lines, &ParseOptions::default()).unwrap();
        assert_eq!(result.cues.len(), 1);
        assert_eq!(result.cues[0].text, "Hi");
    }

    #[test]
    fn byte_stream_input() {
        let bytes = "\u{feff}WEBVTT\r\n\r\n00:01.000 --> 00:02.000\r\n  Grüße  \r\n".as_bytes();
        let result = parse_byte_stream(Cursor::new(bytes), "UTF-8", &collecting()).unwrap();
        assert_eq!(result.cues.len(), 1);
        assert_eq!(result.cues[0].text, "Grüße");
        assert_eq!(result.errors, Some(vec![]));
    }

    #[test]
    fn byte_stream_rejects_encoding() {
        let err = parse_byte_stream(Cursor::new(Vec::new()), "shift_jis", &collecting()).unwrap_err();
        assert_eq!(err.parse_error().unwrap().kind, ParseErrorKind::LoadFail);
    }

    #[test]
    fn byte_stream_read_failure() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk gone"))
            }
        }
        let err = parse_byte_stream(Broken, "utf-8", &ParseOptions::default()).unwrap_err();
        assert_eq!(err.parse_error().unwrap().kind, ParseErrorKind::LoadFail);
    }

    #[test]
    fn custom_parser_factory() {
        let factory: ParserFactory = Arc::new(|| -> Box<dyn CaptionsParser> {
            Box::new(BuiltinParser::for_format(CaptionsFormat::Srt))
        });
        let options = ParseOptions::new(CaptionsFormat::Vtt).with_factory(factory);
        let result = parse_text("1\n00:00:01,000 --> 00:00:02,000\nHi", &options).unwrap();
        assert_eq!(result.cues.len(), 1);
    }

    #[test]
    fn parse_file_uses_extension() {
        let mut file = NamedTempFile::with_suffix(".srt").unwrap();
        file.write_all(b"1\n00:00:01,000 --> 00:00:04,000\nHello, world!\n")
            .unwrap();
        let result = parse_file(file.path(), &ParseOptions::default()).unwrap();
        assert_eq!(result.cues.len(), 1);
        assert_eq!(result.cues[0].text, "Hello, world!");
    }

    #[test]
    fn parse_file_detects_content() {
        let mut file = NamedTempFile::with_suffix(".txt").unwrap();
        file.write_all(
            b"[Script Info]\nTitle: Demo\n\n[V4+ Styles]\n\
              Format: Name, Fontname, Fontsize, Alignment\n\
              Style: Default,Arial,20,2\n\n[Events]\n\
              Format: Layer, Start, End, Style, Name, Text\n\
              Dialogue: 0,0:00:01.00,0:00:04.00,Default,,Hello, world!\n",
        )
        .unwrap();
        let result = parse_file(file.path(), &ParseOptions::default()).unwrap();
        assert_eq!(result.cues.len(), 1);
        assert_eq!(result.cues[0].text, "Hello, world!");
        assert_eq!(result.metadata.get("Title"), Some("Demo"));
    }

    #[test]
    fn parse_file_missing() {
        let err = parse_file("/nonexistent/captions.vtt", &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, CaptionsError::ReadError { .. }));
    }

    #[test]
    fn result_serializes_to_json() {
        let result = parse_text("WEBVTT\n\n00:00.000 --> 00:01.000\nHi", &collecting()).unwrap();
        let json = result.to_json().unwrap();
        assert!(json.contains("\"text\": \"Hi\""));
    }
}
