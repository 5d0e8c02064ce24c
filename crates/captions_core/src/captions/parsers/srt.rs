//! SubRip dialect of the block parser.
//!
//! ```text
//! 1
//! 00:00:01,000 --> 00:00:04,000
//! Hello, world!
//! ```
//!
//! No signature, no settings, comma decimal separator. The index line is
//! kept as the cue id. Tokens after the end time open the cue text.

use crate::captions::error::ParseError;

use super::context::ParseContext;
use super::vtt::{append_text, Block, TextParser};

impl TextParser {
    pub(super) fn parse_subrip_line(
        &mut self,
        line: &str,
        line_number: usize,
        ctx: &mut ParseContext<'_>,
    ) -> Result<(), ParseError> {
        if line.is_empty() {
            self.commit_open(ctx);
            self.block = Block::None;
        } else if self.block == Block::Cue {
            if let Some(cue) = self.cue.as_mut() {
                append_text(cue, line);
            }
        } else if line.contains("-->") {
            self.parse_timing(line, line_number, ctx)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::captions::error::ParseErrorKind;
    use crate::captions::parsers::context::{ParseCallbacks, ParseContext};
    use crate::captions::parsers::vtt::{Dialect, TextParser};
    use crate::captions::parsers::CaptionsParser;
    use crate::captions::types::ParsedCaptions;

    fn run(text: &str) -> ParsedCaptions {
        let mut ctx = ParseContext::new(false, true, ParseCallbacks::default());
        let mut parser = TextParser::new(Dialect::SubRip);
        parser.init(&ctx);
        let lines: Vec<&str> = text.lines().collect();
        for (i, line) in lines.iter().enumerate() {
            parser.parse(line, i + 1, &mut ctx).unwrap();
        }
        parser.parse("", lines.len() + 1, &mut ctx).unwrap();
        let mut result = parser.finish(false);
        result.errors = ctx.take_errors();
        result
    }

    #[test]
    fn single_cue_with_index_id() {
        let result = run("1\n00:00:12,720 --> 00:00:15,120\nText");
        assert_eq!(result.cues.len(), 1);
        let cue = &result.cues[0];
        assert_eq!(cue.id, "1");
        assert!((cue.start_time - 12.72).abs() < 0.0001);
        assert!((cue.end_time - 15.12).abs() < 0.0001);
        assert_eq!(cue.text, "Text");
        assert_eq!(result.errors, Some(vec![]));
    }

    #[test]
    fn multiple_cues_and_multiline_text() {
        let content = "1\n00:00:01,000 --> 00:00:04,000\nHello, world!\n\n2\n00:00:05,000 --> 00:00:08,000\nThis is a test.\nWith multiple lines.\n";
        let result = run(content);
        assert_eq!(result.cues.len(), 2);
        assert_eq!(result.cues[1].id, "2");
        assert_eq!(result.cues[1].text, "This is a test.\nWith multiple lines.");
    }

    #[test]
    fn trailing_tokens_become_text() {
        let result = run("1\n00:00:01,000 --> 00:00:02,000  X1:10   line:0\nHi");
        assert_eq!(result.cues[0].line, None);
        assert_eq!(result.cues[0].text, "X1:10 line:0\nHi");
        assert_eq!(result.errors, Some(vec![]));
    }

    #[test]
    fn no_signature_needed_and_text_may_contain_arrows() {
        let result = run("00:00:01,000 --> 00:00:02,000\na --> b");
        assert_eq!(result.cues[0].text, "a --> b");
    }

    #[test]
    fn bad_timestamp() {
        let result = run("1\n00:00:1,000 --> 00:00:02,000\nHi\n\n2\n00:00:03,000 --> 00:00:04,000\nOk");
        assert_eq!(result.cues.len(), 1);
        let errors = result.errors.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ParseErrorKind::BadTimestamp);
        assert_eq!(errors[0].line, 2);
    }
}
