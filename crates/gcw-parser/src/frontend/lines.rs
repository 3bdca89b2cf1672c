//! Byte offset to 1-based line/column conversion.

use gcw_core::Location;

/// Start offsets of every line of a text.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    #[must_use]
    pub fn new(text: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { starts }
    }

    /// Location of the byte at `offset`. Columns count bytes.
    #[must_use]
    pub fn location(&self, offset: usize) -> Location {
        let line = self.starts.partition_point(|&start| start <= offset).max(1);
        let column = offset - self.starts[line - 1] + 1;
        Location::new(to_u32(line), to_u32(column))
    }
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locations_are_one_based_bytes() {
        let index = LineIndex::new("ab\né}\n");
        assert_eq!(index.location(0), Location::new(1, 1));
        assert_eq!(index.location(1), Location::new(1, 2));
        assert_eq!(index.location(3), Location::new(2, 1));
        // 'é' is two bytes, so the brace sits at byte column 3.
        assert_eq!(index.location(5), Location::new(2, 3));
    }
}
