//! Best-effort recovery of structured metrics from free-form analyst
//! report text.
//!
//! The report generator is an upstream system this client does not control,
//! so every pattern tolerates drift: labels are matched case-insensitively,
//! values need not immediately follow their label, and a pattern that does
//! not match simply leaves its field absent. Extraction never fails.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Structured metrics recovered from one report.
///
/// Each field is independent; absence means the pattern was not found,
/// which is an expected outcome rather than an error. Values are kept as
/// the strings the report carried (an `85%` confidence stays `"85%"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedMetrics {
    pub current_price: Option<String>,
    pub recommendation: Option<String>,
    pub price_target: Option<String>,
    pub confidence: Option<String>,
    pub rsi: Option<String>,
    pub pe_ratio: Option<String>,
}

impl ExtractedMetrics {
    pub fn is_empty(&self) -> bool {
        self.current_price.is_none()
            && self.recommendation.is_none()
            && self.price_target.is_none()
            && self.confidence.is_none()
            && self.rsi.is_none()
            && self.pe_ratio.is_none()
    }
}

/// Cleanup applied to a raw capture before it is stored.
#[derive(Debug, Clone, Copy)]
enum PostProcess {
    /// Keep the capture as-is.
    Verbatim,
    /// Drop thousands separators from a dollar amount.
    Amount,
    /// Strip bracket wrappers and surrounding whitespace.
    Label,
}

impl PostProcess {
    fn apply(self, raw: &str) -> String {
        match self {
            PostProcess::Verbatim => raw.to_string(),
            PostProcess::Amount => raw.replace(',', ""),
            PostProcess::Label => raw.replace(['[', ']'], "").trim().to_string(),
        }
    }
}

/// One metric entry: alternative patterns tried in order, first capture
/// wins, then post-processing.
struct MetricRule {
    patterns: Vec<Regex>,
    post: PostProcess,
}

impl MetricRule {
    fn new(patterns: &[&str], post: PostProcess) -> Self {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(&format!("(?i){p}")).expect("valid metric pattern"))
            .collect();
        Self { patterns, post }
    }

    fn capture(&self, text: &str) -> Option<String> {
        self.patterns.iter().find_map(|re| {
            re.captures(text)
                .and_then(|caps| caps.get(1))
                .map(|m| self.post.apply(m.as_str()))
        })
    }
}

/// Compiled extraction table for the six headline metrics, plus
/// heading-delimited section recovery.
pub struct ReportExtractor {
    current_price: MetricRule,
    recommendation: MetricRule,
    price_target: MetricRule,
    confidence: MetricRule,
    rsi: MetricRule,
    pe_ratio: MetricRule,
    heading: Regex,
}

impl ReportExtractor {
    pub fn new() -> Self {
        Self {
            current_price: MetricRule::new(
                &[r"Current Price:.*\$([\d,]+\.?\d*)"],
                PostProcess::Amount,
            ),
            // The heading-marked variant is preferred; plain label is the
            // fallback for reports that skip the markdown heading.
            recommendation: MetricRule::new(
                &[r"## RECOMMENDATION:\s*(.*)", r"RECOMMENDATION:\s*(.*)"],
                PostProcess::Label,
            ),
            price_target: MetricRule::new(
                &[r"Price Target:.*\$([\d,]+\.?\d*)"],
                PostProcess::Amount,
            ),
            confidence: MetricRule::new(
                &[r"Confidence(?: Level)?:.*?(\d+%?)"],
                PostProcess::Verbatim,
            ),
            rsi: MetricRule::new(&[r"RSI:.*?([\d.]+)"], PostProcess::Verbatim),
            pe_ratio: MetricRule::new(&[r"P/E Ratio:.*?([\d.]+)"], PostProcess::Verbatim),
            heading: Regex::new(r"#{1,3} ").expect("valid heading pattern"),
        }
    }

    /// Attempt all six metrics independently against the full text.
    ///
    /// Total: any input (empty, binary-ish, pattern-free prose) yields a
    /// record, with unmatched fields absent.
    pub fn extract(&self, report: &str) -> ExtractedMetrics {
        ExtractedMetrics {
            current_price: self.current_price.capture(report),
            recommendation: self.recommendation.capture(report),
            price_target: self.price_target.capture(report),
            confidence: self.confidence.capture(report),
            rsi: self.rsi.capture(report),
            pe_ratio: self.pe_ratio.capture(report),
        }
    }

    /// Return the narrative text following the first occurrence of
    /// `header`, cut at the next markdown heading (levels 1-3), or the rest
    /// of the document when no heading follows. Empty string when the
    /// header is absent.
    pub fn section(&self, report: &str, header: &str) -> String {
        let Some(idx) = report.find(header) else {
            return String::new();
        };
        let rest = &report[idx + header.len()..];
        let end = self
            .heading
            .find(rest)
            .map(|m| m.start())
            .unwrap_or(rest.len());
        rest[..end].trim().to_string()
    }
}

impl Default for ReportExtractor {
    fn default() -> Self {
        Self::new()
    }
}
