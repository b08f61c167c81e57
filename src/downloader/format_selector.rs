// Format selection policy
//
// Maps quality presets to yt-dlp format selector expressions and owns the
// fixed fallback sequence used when a selector does not resolve. The
// expressions are opaque to us; we only order them and hand them over.

use super::models::QualityPreset;

/// Progressive fallback expressions, most specific first. Walked in order
/// when the primary selector fails with "format not available".
pub const FALLBACK_FORMATS: [&str; 4] = ["best[ext=mp4]", "best[ext=webm]", "best", "worst"];

pub struct FormatSelector;

impl FormatSelector {
    /// Primary selector for a preset. Deterministic and distinct per preset.
    pub fn primary(quality: QualityPreset) -> &'static str {
        match quality {
            QualityPreset::Best => {
                "bestvideo[ext=mp4]+bestaudio[ext=m4a]/bestvideo+bestaudio/best[ext=mp4]/best"
            }
            QualityPreset::Worst => "worst[ext=mp4]/worst",
            QualityPreset::P720 => {
                "bestvideo[height<=720][ext=mp4]+bestaudio[ext=m4a]/bestvideo[height<=720]+bestaudio/best[height<=720][ext=mp4]/best[height<=720]"
            }
            QualityPreset::P480 => {
                "bestvideo[height<=480][ext=mp4]+bestaudio[ext=m4a]/bestvideo[height<=480]+bestaudio/best[height<=480][ext=mp4]/best[height<=480]"
            }
            QualityPreset::Audio => "bestaudio[ext=m4a]/bestaudio/best",
        }
    }
}

/// Ordered attempt plan for one download job: the primary selector followed
/// by the fixed fallbacks, with already-tried expressions skipped.
pub struct FallbackPlan {
    attempts: Vec<&'static str>,
    next: usize,
}

impl FallbackPlan {
    pub fn new(quality: QualityPreset) -> Self {
        let primary = FormatSelector::primary(quality);
        let mut attempts = vec![primary];
        for fallback in FALLBACK_FORMATS {
            if !attempts.contains(&fallback) {
                attempts.push(fallback);
            }
        }
        Self { attempts, next: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.attempts.len() - self.next
    }
}

impl Iterator for FallbackPlan {
    type Item = &'static str;

    fn next(&mut self) -> Option<&'static str> {
        let selector = self.attempts.get(self.next).copied();
        if selector.is_some() {
            self.next += 1;
        }
        selector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const ALL_PRESETS: [QualityPreset; 5] = [
        QualityPreset::Best,
        QualityPreset::Worst,
        QualityPreset::P720,
        QualityPreset::P480,
        QualityPreset::Audio,
    ];

    #[test]
    fn primary_selectors_are_distinct() {
        let selectors: HashSet<&str> = ALL_PRESETS
            .iter()
            .map(|&q| FormatSelector::primary(q))
            .collect();
        assert_eq!(selectors.len(), ALL_PRESETS.len());
    }

    #[test]
    fn audio_primary_targets_audio_only() {
        assert!(FormatSelector::primary(QualityPreset::Audio).starts_with("bestaudio"));
    }

    #[test]
    fn plan_is_primary_then_fixed_fallbacks() {
        let plan = FallbackPlan::new(QualityPreset::P720);
        let attempts: Vec<&str> = plan.collect();
        assert_eq!(attempts.len(), 5);
        assert_eq!(attempts[0], FormatSelector::primary(QualityPreset::P720));
        assert_eq!(
            &attempts[1..],
            &["best[ext=mp4]", "best[ext=webm]", "best", "worst"]
        );
    }

    #[test]
    fn plan_never_repeats_an_expression() {
        for &quality in &ALL_PRESETS {
            let attempts: Vec<&str> = FallbackPlan::new(quality).collect();
            let unique: HashSet<&str> = attempts.iter().copied().collect();
            assert_eq!(attempts.len(), unique.len(), "duplicate for {:?}", quality);
        }
    }

    #[test]
    fn remaining_counts_down() {
        let mut plan = FallbackPlan::new(QualityPreset::Best);
        assert_eq!(plan.remaining(), 5);
        let first = plan.next().unwrap();
        assert_eq!(first, FormatSelector::primary(QualityPreset::Best));
        assert_eq!(plan.remaining(), 4);
    }
}
