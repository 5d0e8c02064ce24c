//! Per-run parser context: error policy and event callbacks.

use tracing::warn;

use crate::captions::error::ParseError;
use crate::captions::types::{Cue, HeaderMetadata, Region};

type Callback<'a, T> = Box<dyn FnMut(&T) + 'a>;

/// Event callbacks fired as entities are finalized.
#[derive(Default)]
pub struct ParseCallbacks<'a> {
    pub on_header_metadata: Option<Callback<'a, HeaderMetadata>>,
    pub on_cue: Option<Callback<'a, Cue>>,
    pub on_region: Option<Callback<'a, Region>>,
    pub on_error: Option<Callback<'a, ParseError>>,
}

impl std::fmt::Debug for ParseCallbacks<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseCallbacks")
            .field("on_header_metadata", &self.on_header_metadata.is_some())
            .field("on_cue", &self.on_cue.is_some())
            .field("on_region", &self.on_region.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// State shared between the driver and a parser for one run.
///
/// Diagnostics are only built when something will observe them: error
/// collection, strict mode, or an error callback.
#[derive(Debug)]
pub struct ParseContext<'a> {
    strict: bool,
    diagnostics: bool,
    errors: Option<Vec<ParseError>>,
    callbacks: ParseCallbacks<'a>,
}

impl<'a> ParseContext<'a> {
    pub fn new(strict: bool, collect_errors: bool, callbacks: ParseCallbacks<'a>) -> Self {
        let diagnostics = strict || collect_errors || callbacks.on_error.is_some();
        Self {
            strict,
            diagnostics,
            errors: collect_errors.then(Vec::new),
            callbacks,
        }
    }

    /// Context with no callbacks and no diagnostics.
    pub fn silent() -> Self {
        Self::new(false, false, ParseCallbacks::default())
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Route a diagnostic through the error policy.
    ///
    /// The error is only constructed when diagnostics are enabled. Strict
    /// mode returns it as `Err`; lenient mode reports it and continues.
    pub fn report(&mut self, build: impl FnOnce() -> ParseError) -> Result<(), ParseError> {
        if !self.diagnostics {
            return Ok(());
        }
        let error = build();

        if let Some(errors) = self.errors.as_mut() {
            errors.push(error.clone());
        }

        if self.strict {
            return Err(error);
        }

        warn!(line = error.line, kind = %error.kind, "{}", error.reason);
        if let Some(callback) = self.callbacks.on_error.as_mut() {
            callback(&error);
        }
        Ok(())
    }

    pub fn emit_metadata(&mut self, metadata: &HeaderMetadata) {
        if let Some(callback) = self.callbacks.on_header_metadata.as_mut() {
            callback(metadata);
        }
    }

    pub fn emit_cue(&mut self, cue: &Cue) {
        if let Some(callback) = self.callbacks.on_cue.as_mut() {
            callback(cue);
        }
    }

    pub fn emit_region(&mut self, region: &Region) {
        if let Some(callback) = self.callbacks.on_region.as_mut() {
            callback(region);
        }
    }

    /// Take the collected errors (`None` when collection is off).
    pub fn take_errors(&mut self) -> Option<Vec<ParseError>> {
        self.errors.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn silent_context_never_builds_errors() {
        let mut ctx = ParseContext::silent();
        let built = Cell::new(false);
        ctx.report(|| {
            built.set(true);
            ParseError::load_fail("x")
        })
        .unwrap();
        assert!(!built.get());
        assert!(ctx.take_errors().is_none());
    }

    #[test]
    fn strict_returns_error_and_collects() {
        let mut ctx = ParseContext::new(true, true, ParseCallbacks::default());
        let err = ctx.report(|| ParseError::bad_start_time("x", 2)).unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(ctx.take_errors().map(|e| e.len()), Some(1));
    }

    #[test]
    fn lenient_calls_error_callback() {
        let seen = Cell::new(0);
        let callbacks = ParseCallbacks {
            on_error: Some(Box::new(|_: &ParseError| seen.set(seen.get() + 1))),
            ..Default::default()
        };
        let mut ctx = ParseContext::new(false, false, callbacks);
        assert!(ctx.report(|| ParseError::bad_end_time("x", 1)).is_ok());
        assert!(ctx.take_errors().is_none());
        drop(ctx);
        assert_eq!(seen.get(), 1);
    }
}
