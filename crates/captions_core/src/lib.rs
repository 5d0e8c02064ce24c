//! Captions Core - timed caption parsing and layout
//!
//! Parses WebVTT, SRT and SSA/ASS caption files into one cue/region model
//! and positions cue boxes on a display surface without overlaps. There
//! are no rendering or UI dependencies; callers supply text measurements.

pub mod captions;
pub mod config;
pub mod layout;
pub mod logging;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }

    #[test]
    fn parse_then_layout() {
        use captions::{parse_text, ParseOptions};
        use layout::{LayoutBox, LayoutMeasurer, OverlayLayout, RegionMetrics};

        struct OneLine;
        impl LayoutMeasurer for OneLine {
            fn cue_extent(&self, _cue: &captions::Cue, _available: f64) -> f64 {
                24.0
            }
            fn line_height(&self, _cue: &captions::Cue) -> f64 {
                24.0
            }
            fn region_metrics(
                &self,
                _region: &captions::Region,
                cues: &[&captions::Cue],
            ) -> RegionMetrics {
                RegionMetrics {
                    cue_heights: vec![24.0; cues.len()],
                    line_height: 24.0,
                    ..Default::default()
                }
            }
        }

        let text = "WEBVTT\n\n00:00.000 --> 00:05.000\nTop\n\n\
                    00:00.000 --> 00:05.000\nBottom\n\n\
                    00:01.000 --> 00:05.000\nAlso bottom\n";
        let parsed = parse_text(text, &ParseOptions::default()).unwrap();
        assert_eq!(parsed.cues.len(), 3);

        let container = LayoutBox::new(0.0, 0.0, 1280.0, 720.0);
        let mut overlay = OverlayLayout::new(container);
        let placements = overlay.layout(2.0, &parsed.cues, &OneLine);
        assert_eq!(placements.len(), 3);
        for (i, a) in placements.iter().enumerate() {
            assert!(a.rect.is_within(&container));
            for b in &placements[i + 1..] {
                assert!(!a.rect.collides_with(&b.rect));
            }
        }
    }
}
