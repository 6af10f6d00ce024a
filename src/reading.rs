//! Reading time estimate and scroll-driven progress tracking.
//!
//! Everything here is synchronous and does no I/O: it runs inside the scroll
//! handler on every sample.

use crate::config;

/// Whitespace-separated word count.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Minutes to read `word_count` words, never less than one.
pub fn reading_time_minutes(word_count: usize, words_per_minute: u32) -> u32 {
    let wpm = words_per_minute.max(1) as usize;
    word_count.div_ceil(wpm).max(1) as u32
}

/// Scroll completion percentage clamped to `0..=100`. A document that fits
/// in the viewport counts as fully read.
pub fn clamp_progress(scroll_top: f64, document_height: f64, viewport_height: f64) -> f64 {
    let scrollable = document_height - viewport_height;
    if scrollable <= 0.0 {
        return 100.0;
    }
    let progress = scroll_top / scrollable * 100.0;
    if progress.is_nan() {
        return 0.0;
    }
    progress.clamp(0.0, 100.0)
}

/// A heading's position in the laid-out document.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionOffset {
    pub id: String,
    pub offset: f64,
}

/// Pick the active section: the last entry (in document order) whose offset
/// is at or above `scroll_y + lookahead`.
pub fn active_section(sections: &[SectionOffset], scroll_y: f64, lookahead: f64) -> Option<&str> {
    let position = scroll_y + lookahead;
    sections
        .iter()
        .rev()
        .find(|s| s.offset <= position)
        .map(|s| s.id.as_str())
}

/// One scroll event's measurements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollSample {
    pub scroll_y: f64,
    pub document_height: f64,
    pub viewport_height: f64,
}

/// What changed as a result of a scroll sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollUpdate {
    pub progress: f64,
    /// Set only when the active section differs from the previous sample.
    pub section_changed: Option<Option<String>>,
    pub show_floating_actions: bool,
}

/// Per-view progress state.
#[derive(Debug, Clone)]
pub struct ReadingTracker {
    sections: Vec<SectionOffset>,
    lookahead: f64,
    floating_offset: f64,
    progress: f64,
    active: Option<String>,
}

impl ReadingTracker {
    pub fn new(sections: Vec<SectionOffset>, lookahead: f64, floating_offset: f64) -> Self {
        Self {
            sections,
            lookahead,
            floating_offset,
            progress: 0.0,
            active: None,
        }
    }

    pub fn from_config(sections: Vec<SectionOffset>, reading: &config::Reading) -> Self {
        Self::new(
            sections,
            reading.section_lookahead_px,
            reading.floating_actions_offset_px,
        )
    }

    /// Replace section offsets after a re-layout. The active section is
    /// recomputed on the next sample.
    pub fn set_sections(&mut self, sections: Vec<SectionOffset>) {
        self.sections = sections;
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn active_section(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn on_scroll(&mut self, sample: ScrollSample) -> ScrollUpdate {
        self.progress = clamp_progress(
            sample.scroll_y,
            sample.document_height,
            sample.viewport_height,
        );

        let next = active_section(&self.sections, sample.scroll_y, self.lookahead);
        let section_changed = if next != self.active.as_deref() {
            let next = next.map(str::to_string);
            self.active = next.clone();
            Some(next)
        } else {
            None
        };

        ScrollUpdate {
            progress: self.progress,
            section_changed,
            show_floating_actions: sample.scroll_y > self.floating_offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sections(offsets: &[f64]) -> Vec<SectionOffset> {
        offsets
            .iter()
            .enumerate()
            .map(|(i, o)| SectionOffset {
                id: format!("section-{}", i + 1),
                offset: *o,
            })
            .collect()
    }

    #[test]
    fn reading_time_boundaries() {
        assert_eq!(reading_time_minutes(0, 200), 1);
        assert_eq!(reading_time_minutes(200, 200), 1);
        assert_eq!(reading_time_minutes(201, 200), 2);
        assert_eq!(reading_time_minutes(1000, 200), 5);
    }

    #[test]
    fn word_count_ignores_extra_whitespace() {
        assert_eq!(count_words("  one\ttwo \n three  "), 3);
        assert_eq!(count_words(""), 0);
    }

    #[test]
    fn progress_is_clamped() {
        let cases = [(-50.0, 0.0), (0.0, 0.0), (600.0, 50.0), (1200.0, 100.0), (5000.0, 100.0)];
        for (scroll, expected) in cases {
            assert_eq!(clamp_progress(scroll, 2000.0, 800.0), expected, "scroll={scroll}");
        }
    }

    #[test]
    fn short_document_is_fully_read() {
        assert_eq!(clamp_progress(0.0, 500.0, 800.0), 100.0);
        assert_eq!(clamp_progress(0.0, 800.0, 800.0), 100.0);
    }

    #[test]
    fn active_section_uses_lookahead() {
        let toc = sections(&[100.0, 500.0, 900.0]);
        assert_eq!(active_section(&toc, 450.0, 150.0), Some("section-2"));
        assert_eq!(active_section(&toc, 0.0, 150.0), Some("section-1"));
        assert_eq!(active_section(&toc, 800.0, 150.0), Some("section-3"));
        assert_eq!(active_section(&toc, -100.0, 150.0), None);
        assert_eq!(active_section(&[], 1000.0, 150.0), None);
    }

    #[test]
    fn tracker_reports_section_changes_once() {
        let mut tracker = ReadingTracker::new(sections(&[100.0, 500.0, 900.0]), 150.0, 300.0);
        let sample = |y| ScrollSample {
            scroll_y: y,
            document_height: 2000.0,
            viewport_height: 800.0,
        };

        let first = tracker.on_scroll(sample(450.0));
        assert_eq!(first.section_changed, Some(Some("section-2".to_string())));
        assert!(first.show_floating_actions);

        let again = tracker.on_scroll(sample(460.0));
        assert_eq!(again.section_changed, None);
        assert_eq!(tracker.active_section(), Some("section-2"));

        let top = tracker.on_scroll(sample(-200.0));
        assert_eq!(top.section_changed, Some(None));
        assert!(!top.show_floating_actions);
        assert_eq!(tracker.progress(), 0.0);
    }

    #[test]
    fn from_config_uses_configured_lookahead() {
        let reading = config::Reading {
            section_lookahead_px: 0.0,
            ..Default::default()
        };
        let mut tracker = ReadingTracker::from_config(sections(&[100.0, 500.0]), &reading);
        let update = tracker.on_scroll(ScrollSample {
            scroll_y: 450.0,
            document_height: 2000.0,
            viewport_height: 800.0,
        });
        assert_eq!(update.section_changed, Some(Some("section-1".to_string())));
    }
}
