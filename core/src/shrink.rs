use serde::Serialize;

use crate::config::ScanConfig;

/// Position on the payload-reduction ladder for one upstream attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttemptTier {
    /// Full content up to the configured byte cap.
    Full,
    /// Caps halved after a transient upstream failure.
    Halved,
    /// One of the contiguous line-range slices, halved caps.
    Slice { index: usize, total: usize },
}

/// One planned attempt: the tier, its budgets, and the 1-based inclusive
/// line range to send (`None` = the whole file).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptSpec {
    pub tier: AttemptTier,
    pub byte_cap: usize,
    pub max_output_tokens: u32,
    pub lines: Option<(usize, usize)>,
}

/// Build the attempt ladder for a file of `line_count` lines.
///
/// The ladder is bounded at `2 + slice_count` rungs and never shrinks
/// below `min_byte_cap`: when halving would cross the floor, the ladder
/// ends after the full-content rung and the caller reports failure
/// instead of sending a near-empty payload.
pub fn plan_attempts(config: &ScanConfig, line_count: usize) -> Vec<AttemptSpec> {
    let mut plan = vec![AttemptSpec {
        tier: AttemptTier::Full,
        byte_cap: config.byte_cap,
        max_output_tokens: config.max_output_tokens,
        lines: None,
    }];

    let halved_cap = config.byte_cap / 2;
    if halved_cap < config.min_byte_cap {
        return plan;
    }
    let halved_tokens = (config.max_output_tokens / 2).max(1);
    plan.push(AttemptSpec {
        tier: AttemptTier::Halved,
        byte_cap: halved_cap,
        max_output_tokens: halved_tokens,
        lines: None,
    });

    let ranges = slice_ranges(line_count, config.slice_count);
    let total = ranges.len();
    for (index, range) in ranges.into_iter().enumerate() {
        plan.push(AttemptSpec {
            tier: AttemptTier::Slice { index, total },
            byte_cap: halved_cap,
            max_output_tokens: halved_tokens,
            lines: Some(range),
        });
    }
    plan
}

/// Contiguous 1-based line ranges covering the whole file. Short files
/// get fewer, never empty, slices.
pub fn slice_ranges(line_count: usize, slices: usize) -> Vec<(usize, usize)> {
    if line_count == 0 {
        return Vec::new();
    }
    let slices = slices.clamp(1, line_count);
    let base = line_count / slices;
    let remainder = line_count % slices;
    let mut ranges = Vec::with_capacity(slices);
    let mut start = 1;
    for index in 0..slices {
        let len = base + usize::from(index < remainder);
        ranges.push((start, start + len - 1));
        start += len;
    }
    ranges
}
