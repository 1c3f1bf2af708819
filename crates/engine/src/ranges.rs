//! Line-range algebra: merging, numbering, and snippet reconstruction.
//!
//! Pure functions over document text and the 1-based inclusive
//! [`LineRange`]s the oracle returns.

use promptfit_core::oracle::LineRange;

/// Merge overlapping or adjacent ranges into a minimal covering set.
///
/// Ranges are sorted by start line; a range whose start falls at or before
/// the previous range's end + 1 is folded into it. Idempotent.
pub fn merge_ranges(mut ranges: Vec<LineRange>) -> Vec<LineRange> {
    if ranges.is_empty() {
        return ranges;
    }

    ranges.sort_by_key(|r| r.start_line);

    let mut merged: Vec<LineRange> = Vec::with_capacity(ranges.len());
    for current in ranges {
        match merged.last_mut() {
            Some(last) if current.start_line <= last.end_line + 1 => {
                last.end_line = last.end_line.max(current.end_line);
            }
            _ => merged.push(current),
        }
    }
    merged
}

/// Render content with 1-based line numbers, one `N line` pair per line.
///
/// This is the form the range-variant oracle sees, so the line numbers it
/// returns map directly back onto the original content.
pub fn number_lines(content: &str) -> String {
    content
        .lines()
        .enumerate()
        .map(|(i, line)| format!("{} {}", i + 1, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the replacement content for a document from its merged ranges.
///
/// Each selected span is preceded by a `# ... (lines A-B) ...` marker;
/// spans appear in their original relative order. Ranges are clamped to
/// the document's actual line count; ranges that fall entirely past the
/// end are skipped.
pub fn build_range_content(original: &str, ranges: &[LineRange]) -> String {
    let lines: Vec<&str> = original.lines().collect();
    let mut parts: Vec<String> = vec!["# Snippets from the original file:\n".to_string()];

    for range in ranges {
        let start = range.start_line.max(1);
        let end = range.end_line.min(lines.len());
        if start > lines.len() || start > end {
            continue;
        }
        parts.push(format!("\n# ... (lines {}-{}) ...\n", start, end));
        for line in &lines[start - 1..end] {
            parts.push((*line).to_string());
        }
    }

    parts.join("\n")
}
