//! Caption parsers.
//!
//! Every parser is a line-at-a-time state machine behind [`CaptionsParser`].
//! The built-in formats are dispatched through [`BuiltinParser`]; callers
//! can plug in their own through [`ParseOptions::parser_factory`].

mod context;
mod settings;
mod srt;
mod ssa;
mod vtt;

pub use context::{ParseCallbacks, ParseContext};
pub use settings::{apply_cue_settings, apply_region_settings};
pub use ssa::{SsaColor, SsaParser};
pub use vtt::{Dialect, TextParser};

use std::fmt;
use std::sync::Arc;

use crate::captions::error::ParseError;
use crate::captions::types::{CaptionsFormat, ParsedCaptions};

/// A line-driven caption parser.
///
/// The driver calls [`init`](Self::init) once, [`parse`](Self::parse) for
/// every input line plus a final empty line, then [`finish`](Self::finish).
pub trait CaptionsParser {
    /// Prepare for a run.
    fn init(&mut self, _ctx: &ParseContext<'_>) {}

    /// Consume one line. `line_number` is 1-based.
    ///
    /// Returns `Err` only when the context is strict.
    fn parse(
        &mut self,
        line: &str,
        line_number: usize,
        ctx: &mut ParseContext<'_>,
    ) -> Result<(), ParseError>;

    /// Return everything committed so far. Open cues and regions are dropped.
    fn finish(&mut self, cancelled: bool) -> ParsedCaptions;
}

/// Creates a fresh parser for each run.
pub type ParserFactory = Arc<dyn Fn() -> Box<dyn CaptionsParser> + Send + Sync>;

/// Parse run options.
#[derive(Clone, Default)]
pub struct ParseOptions {
    /// Built-in format to parse.
    pub format: CaptionsFormat,
    /// Overrides `format` when set.
    pub parser_factory: Option<ParserFactory>,
    /// Stop at the first diagnostic.
    pub strict: bool,
    /// Keep diagnostics in [`ParsedCaptions::errors`].
    pub collect_errors: bool,
}

impl fmt::Debug for ParseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseOptions")
            .field("format", &self.format)
            .field("parser_factory", &self.parser_factory.is_some())
            .field("strict", &self.strict)
            .field("collect_errors", &self.collect_errors)
            .finish()
    }
}

impl ParseOptions {
    pub fn new(format: CaptionsFormat) -> Self {
        Self {
            format,
            ..Default::default()
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn collect_errors(mut self, collect: bool) -> Self {
        self.collect_errors = collect;
        self
    }

    pub fn with_factory(mut self, factory: ParserFactory) -> Self {
        self.parser_factory = Some(factory);
        self
    }

    /// Build the parser for these options.
    pub fn create_parser(&self) -> Box<dyn CaptionsParser> {
        match &self.parser_factory {
            Some(factory) => (factory.as_ref())(),
            None => Box::new(BuiltinParser::for_format(self.format)),
        }
    }
}

/// The built-in parsers.
#[derive(Debug)]
pub enum BuiltinParser {
    /// WebVTT and SRT.
    Text(TextParser),
    /// SSA and ASS.
    SubStation(SsaParser),
}

impl BuiltinParser {
    pub fn for_format(format: CaptionsFormat) -> Self {
        match format {
            CaptionsFormat::Vtt => Self::Text(TextParser::new(Dialect::WebVtt)),
            CaptionsFormat::Srt => Self::Text(TextParser::new(Dialect::SubRip)),
            CaptionsFormat::Ssa | CaptionsFormat::Ass => Self::SubStation(SsaParser::new()),
        }
    }
}

impl CaptionsParser for BuiltinParser {
    fn init(&mut self, ctx: &ParseContext<'_>) {
        match self {
            Self::Text(parser) => parser.init(ctx),
            Self::SubStation(parser) => parser.init(ctx),
        }
    }

    fn parse(
        &mut self,
        line: &str,
        line_number: usize,
        ctx: &mut ParseContext<'_>,
    ) -> Result<(), ParseError> {
        match self {
            Self::Text(parser) => parser.parse(line, line_number, ctx),
            Self::SubStation(parser) => parser.parse(line, line_number, ctx),
        }
    }

    fn finish(&mut self, cancelled: bool) -> ParsedCaptions {
        match self {
            Self::Text(parser) => parser.finish(cancelled),
            Self::SubStation(parser) => parser.finish(cancelled),
        }
    }
}
