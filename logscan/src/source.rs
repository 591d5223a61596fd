use std::ops::{Range, RangeInclusive};

/// A harness log held in memory, split into 0-based lines.
///
/// Line text excludes the `\n` terminator and a trailing `\r`. Byte ranges
/// are kept alongside so diagnostics can point back into the original text.
#[derive(Debug, Clone)]
pub struct LogSource {
    text: String,
    lines: Vec<Range<usize>>,
}

impl LogSource {
    pub fn new(text: String) -> Self {
        let mut lines = Vec::new();
        let mut start = 0;
        for (idx, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                lines.push(start..trim_cr(&text, start, idx));
                start = idx + 1;
            }
        }
        if start < text.len() {
            lines.push(start..trim_cr(&text, start, text.len()));
        }
        LogSource { text, lines }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Text of a single line, or `None` past the end of the log.
    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(|range| &self.text[range.clone()])
    }

    pub fn lines(&self) -> impl ExactSizeIterator<Item = &str> + DoubleEndedIterator {
        self.lines.iter().map(|range| &self.text[range.clone()])
    }

    /// Byte span covering the given inclusive line range, clamped to the log.
    pub fn span(&self, lines: RangeInclusive<usize>) -> Range<usize> {
        let Some(last_index) = self.lines.len().checked_sub(1) else {
            return 0..0;
        };
        let first = (*lines.start()).min(last_index);
        let last = (*lines.end()).clamp(first, last_index);
        self.lines[first].start..self.lines[last].end
    }
}

fn trim_cr(text: &str, start: usize, end: usize) -> usize {
    if end > start && text.as_bytes()[end - 1] == b'\r' {
        end - 1
    } else {
        end
    }
}
