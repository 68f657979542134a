use std::ops::Range;

/// One image as the packer sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PackItem {
    pub height: u32,
    /// Planned gap band above this image.
    pub gap_before: bool,
}

/// A contiguous run of images rendered into one output file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentPlan {
    /// Indices into the full image list.
    pub range: Range<usize>,
    /// Realized pixel height: member heights plus the gap bands kept inside the segment.
    pub height: u32,
    /// Realized gap flag per member. Always `false` for the first member.
    pub gaps: Vec<bool>,
}

impl SegmentPlan {
    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// Greedy single-pass packing under `max_height`.
///
/// Walks images in order and closes the current segment when the next image (plus its gap)
/// would overflow it. Closed segments are never reopened or rebalanced. An image taller than
/// `max_height` is placed alone rather than split, and a gap flagged on the image that opens a
/// segment is dropped since the file boundary already separates it. An item that adds no rows
/// never closes a segment.
pub fn pack_segments(items: &[PackItem], max_height: u32, gap_height: u32) -> Vec<SegmentPlan> {
    let max = u64::from(max_height);
    let mut segments = Vec::new();
    let mut start = 0usize;
    let mut current = 0u64;
    let mut gaps = Vec::new();

    for (i, item) in items.iter().enumerate() {
        let opens_segment = i == start;
        let gap = if item.gap_before && !opens_segment {
            u64::from(gap_height)
        } else {
            0
        };
        let needed = gap + u64::from(item.height);

        if !opens_segment && needed > 0 && current + needed > max {
            segments.push(close(start..i, current, std::mem::take(&mut gaps)));
            start = i;
            current = u64::from(item.height);
            gaps.push(false);
            continue;
        }

        current += needed;
        gaps.push(gap > 0);
    }

    if start < items.len() {
        segments.push(close(start..items.len(), current, gaps));
    }
    segments
}

fn close(range: Range<usize>, height: u64, gaps: Vec<bool>) -> SegmentPlan {
    debug_assert_eq!(range.len(), gaps.len());
    SegmentPlan {
        range,
        height: u32::try_from(height).unwrap_or(u32::MAX),
        gaps,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/packer.rs"]
mod tests;
