use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Samples above this are treated as gaps between passes.
pub const DEFAULT_THRESHOLD: f64 = 500.0;

/// Inclusive index span `[start, end]` into the source trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
}

impl Segment {
    /// `0` for a reversed span (`end < start`), which a deserialized value
    /// may carry.
    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.end - self.start + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// Empty when the span is reversed or runs past the end of `values`.
    pub fn slice<'a>(&self, values: &'a [f64]) -> &'a [f64] {
        values.get(self.start..=self.end).unwrap_or(&[])
    }
}

/// Maximal runs of `values` that are at or below `threshold`.
///
/// NaN never compares `<=`, so it always splits runs.
pub fn segments(values: &[f64], threshold: f64) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut start = None;
    for (i, &v) in values.iter().enumerate() {
        match (v <= threshold, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                out.push(Segment { start: s, end: i - 1 });
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        out.push(Segment {
            start: s,
            end: values.len() - 1,
        });
    }
    out
}

/// How to treat a trace that does not contain exactly two passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentPolicy {
    /// Anything other than two qualifying segments is an error.
    #[default]
    ExactlyTwo,
    /// Take the first two qualifying segments, ignore the rest.
    FirstTwo,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub threshold: f64,
    /// Runs shorter than this are noise, not passes.
    pub min_segment_len: usize,
    pub policy: SegmentPolicy,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            min_segment_len: 2,
            policy: SegmentPolicy::ExactlyTwo,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SegmentationError {
    #[error("expected two passes in rotation trace, found {found}")]
    Ambiguous { found: usize },
}

/// The two passes of one ballbar circuit, both in the same angular sense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedRotation {
    /// First pass, index-reversed.
    pub clockwise: Vec<f64>,
    /// Second pass, in acquisition order.
    pub counterclockwise: Vec<f64>,
    pub clockwise_span: Segment,
    pub counterclockwise_span: Segment,
}

#[derive(Debug, Clone, Default)]
pub struct SegmentClassifier {
    config: ClassifierConfig,
}

impl SegmentClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Runs long enough to count as a pass.
    pub fn qualifying_segments(&self, values: &[f64]) -> Vec<Segment> {
        let min_len = self.config.min_segment_len.max(1);
        segments(values, self.config.threshold)
            .into_iter()
            .filter(|s| s.len() >= min_len)
            .collect()
    }

    /// Splits `values` into the clockwise and counterclockwise passes.
    ///
    /// The earlier pass is clockwise and is reversed so that both outputs run
    /// in the same angular direction.
    pub fn classify(&self, values: &[f64]) -> Result<ClassifiedRotation, SegmentationError> {
        let found = self.qualifying_segments(values);
        debug!(
            "rotation trace of {} samples has {} qualifying segments",
            values.len(),
            found.len()
        );

        let (cw, ccw) = match (self.config.policy, found.as_slice()) {
            (_, [cw, ccw]) => (*cw, *ccw),
            (SegmentPolicy::FirstTwo, [cw, ccw, rest @ ..]) => {
                warn!(
                    "ignoring {} extra segments after index {}",
                    rest.len(),
                    ccw.end
                );
                (*cw, *ccw)
            }
            _ => return Err(SegmentationError::Ambiguous { found: found.len() }),
        };

        let mut clockwise = cw.slice(values).to_vec();
        clockwise.reverse();
        Ok(ClassifiedRotation {
            clockwise,
            counterclockwise: ccw.slice(values).to_vec(),
            clockwise_span: cw,
            counterclockwise_span: ccw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ClassifierConfig, Segment, SegmentClassifier, SegmentPolicy, SegmentationError, segments,
    };

    const TWO_PASSES: [f64; 22] = [
        1000.0, 1000.0, 1000.0, 1010.0, 9997.0, 1000.0, 140.0, 121.0, 123.0, 33.0, 122.0, 1002.0,
        1008.0, 1120.0, 110.0, 100.0, 133.0, 110.0, 1000.0, 1000.0, 1000.0, 1002.0,
    ];

    #[test]
    fn two_pass_trace_is_split_and_oriented() {
        let out = SegmentClassifier::default()
            .classify(&TWO_PASSES)
            .expect("two passes");

        assert_eq!(out.clockwise, vec![122.0, 33.0, 123.0, 121.0, 140.0]);
        assert_eq!(out.counterclockwise, vec![110.0, 100.0, 133.0, 110.0]);
        assert_eq!(out.clockwise_span, Segment { start: 6, end: 10 });
        assert_eq!(out.counterclockwise_span, Segment { start: 14, end: 17 });
    }

    #[test]
    fn spans_use_positions_not_values() {
        // The same value appears in both passes and before them.
        let trace = [7.0, 900.0, 7.0, 8.0, 900.0, 8.0, 7.0];
        let found = segments(&trace, 500.0);
        assert_eq!(
            found,
            vec![
                Segment { start: 0, end: 0 },
                Segment { start: 2, end: 3 },
                Segment { start: 5, end: 6 },
            ]
        );

        let out = SegmentClassifier::default().classify(&trace).unwrap();
        assert_eq!(out.clockwise, vec![8.0, 7.0]);
        assert_eq!(out.counterclockwise, vec![8.0, 7.0]);
        assert_eq!(out.counterclockwise_span, Segment { start: 5, end: 6 });
    }

    #[test]
    fn runs_touching_the_ends() {
        let trace = [1.0, 2.0, 600.0, 3.0, 4.0];
        let out = SegmentClassifier::default().classify(&trace).unwrap();
        assert_eq!(out.clockwise, vec![2.0, 1.0]);
        assert_eq!(out.counterclockwise, vec![3.0, 4.0]);
    }

    #[test]
    fn threshold_is_inclusive_and_nan_is_a_gap() {
        assert_eq!(
            segments(&[500.0, 500.1, 500.0], 500.0),
            vec![Segment { start: 0, end: 0 }, Segment { start: 2, end: 2 }]
        );
        assert_eq!(
            segments(&[1.0, f64::NAN, 2.0], 500.0),
            vec![Segment { start: 0, end: 0 }, Segment { start: 2, end: 2 }]
        );
        assert!(segments(&[], 500.0).is_empty());
        assert!(segments(&[f64::NAN; 3], 500.0).is_empty());
    }

    #[test]
    fn wrong_pass_count_is_ambiguous() {
        let classifier = SegmentClassifier::default();

        assert_eq!(
            classifier.classify(&[1000.0; 6]),
            Err(SegmentationError::Ambiguous { found: 0 })
        );
        assert_eq!(
            classifier.classify(&[1.0, 2.0, 3.0]),
            Err(SegmentationError::Ambiguous { found: 1 })
        );
        assert_eq!(
            classifier.classify(&[1.0, 2.0, 900.0, 3.0, 4.0, 900.0, 5.0, 6.0]),
            Err(SegmentationError::Ambiguous { found: 3 })
        );
    }

    #[test]
    fn single_sample_runs_do_not_qualify() {
        let trace = [1.0, 900.0, 2.0, 3.0, 900.0, 4.0, 900.0, 5.0, 6.0];
        let out = SegmentClassifier::default().classify(&trace).unwrap();
        assert_eq!(out.clockwise_span, Segment { start: 2, end: 3 });
        assert_eq!(out.counterclockwise_span, Segment { start: 7, end: 8 });
    }

    #[test]
    fn first_two_policy_ignores_extra_passes() {
        let classifier = SegmentClassifier::new(ClassifierConfig {
            policy: SegmentPolicy::FirstTwo,
            ..ClassifierConfig::default()
        });
        let trace = [1.0, 2.0, 900.0, 3.0, 4.0, 900.0, 5.0, 6.0];
        let out = classifier.classify(&trace).unwrap();
        assert_eq!(out.clockwise, vec![2.0, 1.0]);
        assert_eq!(out.counterclockwise, vec![3.0, 4.0]);

        assert_eq!(
            classifier.classify(&[1.0, 2.0]),
            Err(SegmentationError::Ambiguous { found: 1 })
        );
    }

    #[test]
    fn custom_threshold() {
        let classifier = SegmentClassifier::new(ClassifierConfig {
            threshold: 125.0,
            ..ClassifierConfig::default()
        });
        let out = classifier.classify(&TWO_PASSES[6..18]).unwrap();
        assert_eq!(out.clockwise, vec![122.0, 33.0, 123.0, 121.0]);
        assert_eq!(out.counterclockwise, vec![110.0, 100.0]);
    }

    #[test]
    fn reversed_span_is_empty() {
        let seg: Segment = serde_json::from_str(r#"{"start": 7, "end": 3}"#).expect("json");
        assert!(seg.is_empty());
        assert_eq!(seg.len(), 0);
        assert!(seg.slice(&[0.0; 10]).is_empty());

        let seg = Segment { start: 2, end: 2 };
        assert!(!seg.is_empty());
        assert_eq!(seg.len(), 1);
        assert_eq!(seg.slice(&[1.0, 2.0, 3.0]), &[3.0]);
        assert!(Segment { start: 2, end: 5 }.slice(&[1.0, 2.0, 3.0]).is_empty());
    }
}
