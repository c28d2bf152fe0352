//! SRT block model: splitting raw subtitle text into blocks, parsing blocks
//! into segments and segments into timed chunks.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SubtransError};

const TIMERANGE_SEPARATOR: &str = "-->";

/// One parsed subtitle block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub id: u32,
    /// Raw timerange line, e.g. `00:00:01,000 --> 00:00:02,500`
    pub timestamp: String,
    pub text: String,
}

/// A segment with its timerange parsed, ready for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub index: String,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub text: String,
}

impl Segment {
    pub fn to_srt_block(&self) -> String {
        format!("{}\n{}\n{}", self.id, self.timestamp, self.text)
    }
}

impl TryFrom<&Segment> for Chunk {
    type Error = SubtransError;

    fn try_from(segment: &Segment) -> Result<Self> {
        let (start, end) = parse_timestamp(&segment.timestamp)?;
        Ok(Self {
            index: segment.id.to_string(),
            start,
            end,
            text: segment.text.clone(),
        })
    }
}

/// Split raw subtitle text on blank-line boundaries (`\r\n\r\n` or `\n\n`)
pub fn split_blocks(content: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = content;

    loop {
        let crlf = rest.find("\r\n\r\n").map(|pos| (pos, 4));
        let lf = rest.find("\n\n").map(|pos| (pos, 2));
        let next = match (crlf, lf) {
            (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
            (a, b) => a.or(b),
        };

        match next {
            Some((pos, len)) => {
                blocks.push(&rest[..pos]);
                rest = &rest[pos + len..];
            }
            None => {
                blocks.push(rest);
                return blocks;
            }
        }
    }
}

/// Parse one SRT block: index line, timerange line, then one or more text lines
pub fn parse_segment(block: &str) -> Result<Segment> {
    let mut lines = block.trim().lines().map(|line| line.trim_end_matches('\r'));

    let index_line = lines
        .next()
        .filter(|line| !line.trim().is_empty())
        .ok_or_else(|| SubtransError::SubtitleParse("empty subtitle block".to_string()))?;
    let id = index_line.trim().parse::<u32>().map_err(|e| {
        SubtransError::SubtitleParse(format!("invalid subtitle index '{}': {}", index_line.trim(), e))
    })?;

    let timestamp = lines
        .next()
        .map(|line| line.trim().to_string())
        .ok_or_else(|| SubtransError::SubtitleParse(format!("subtitle {} has no timerange line", id)))?;

    let text = lines.collect::<Vec<_>>().join("\n");

    Ok(Segment { id, timestamp, text })
}

/// Parse a timerange line into its start and end times
pub fn parse_timestamp(raw: &str) -> Result<(NaiveTime, NaiveTime)> {
    let (start, end) = raw.split_once(TIMERANGE_SEPARATOR).ok_or_else(|| {
        SubtransError::SubtitleParse(format!("timerange '{}' is missing '{}'", raw, TIMERANGE_SEPARATOR))
    })?;

    Ok((parse_srt_time(start)?, parse_srt_time(end)?))
}

fn parse_srt_time(raw: &str) -> Result<NaiveTime> {
    let normalized = raw.trim().replace(',', ".");
    NaiveTime::parse_from_str(&normalized, "%H:%M:%S%.f")
        .map_err(|e| SubtransError::SubtitleParse(format!("invalid time '{}': {}", raw.trim(), e)))
}

/// Parse a block straight into a renderable chunk
pub fn parse_chunk(block: &str) -> Result<Chunk> {
    let segment = parse_segment(block)?;
    Chunk::try_from(&segment)
}

/// Parse a whole SRT document, skipping blank blocks
pub fn parse_srt(content: &str) -> Result<Vec<Segment>> {
    split_blocks(content)
        .into_iter()
        .filter(|block| !block.trim().is_empty())
        .map(parse_segment)
        .collect()
}

/// Format a time in SRT format (HH:MM:SS,mmm)
pub fn format_srt_time(time: NaiveTime) -> String {
    time.format("%H:%M:%S,%3f").to_string()
}
