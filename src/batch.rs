//! Token-bounded batching of subtitle segments for translation requests.

use serde::Serialize;

use crate::subtitle::Segment;

/// Delimiter placed between segment texts inside one translation batch
pub const SEGMENT_DELIMITER: &str = "|";

/// Token cost of one delimiter between two batched segments
const DELIMITER_TOKENS: usize = 1;

/// Approximate token count: one token per four characters, rounded up
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// An ordered run of segments translated together
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    segments: Vec<Segment>,
    token_count: usize,
}

impl Group {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Estimated tokens including delimiters
    pub fn token_count(&self) -> usize {
        self.token_count
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn joined_text(&self) -> String {
        self.segments
            .iter()
            .map(|segment| segment.text.as_str())
            .collect::<Vec<_>>()
            .join(SEGMENT_DELIMITER)
    }
}

/// Partition `segments` in order into groups whose estimated token cost stays
/// within `max_tokens`. A segment is never split; one that exceeds the budget
/// on its own becomes a single-member group.
pub fn group_segments_by_token_length(segments: &[Segment], max_tokens: usize) -> Vec<Group> {
    let mut groups = Vec::new();
    let mut current: Vec<Segment> = Vec::new();
    let mut current_tokens = 0;

    for segment in segments {
        let segment_tokens = estimate_tokens(&segment.text);
        let delimiter = if current.is_empty() { 0 } else { DELIMITER_TOKENS };

        if current_tokens + delimiter + segment_tokens <= max_tokens {
            current.push(segment.clone());
            current_tokens += delimiter + segment_tokens;
        } else {
            if !current.is_empty() {
                groups.push(Group {
                    segments: std::mem::take(&mut current),
                    token_count: current_tokens,
                });
            }
            current.push(segment.clone());
            current_tokens = segment_tokens;
        }
    }

    if !current.is_empty() {
        groups.push(Group {
            segments: current,
            token_count: current_tokens,
        });
    }

    groups
}
