//! Text edits and the old-to-new offset mapping they induce
//!
//! Edits are applied in order, each in the coordinates of the text the
//! previous edits produced. A [`ChangeSet`] composes them into the list of
//! byte ranges that survived every edit unchanged, which is what the
//! incremental parser needs to decide whether an old subtree still fits.

use thiserror::Error;

/// Replace `old_len` bytes at `start` with `new_len` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edit {
    pub start: usize,
    pub old_len: usize,
    pub new_len: usize,
}

impl Edit {
    pub fn new(start: usize, old_len: usize, new_len: usize) -> Self {
        Self {
            start,
            old_len,
            new_len,
        }
    }

    pub fn insert(at: usize, len: usize) -> Self {
        Self::new(at, 0, len)
    }

    pub fn delete(start: usize, len: usize) -> Self {
        Self::new(start, len, 0)
    }

    pub fn old_end(&self) -> usize {
        self.start + self.old_len
    }

    pub fn new_end(&self) -> usize {
        self.start + self.new_len
    }

    /// Apply the edit to `text`, taking the inserted bytes from `with`.
    pub fn apply_to(&self, text: &[u8], with: &[u8]) -> Result<Vec<u8>, EditError> {
        if self.old_end() > text.len() {
            return Err(EditError::OutOfBounds {
                start: self.start,
                end: self.old_end(),
                len: text.len(),
            });
        }
        if with.len() != self.new_len {
            return Err(EditError::LengthMismatch {
                expected: self.new_len,
                actual: with.len(),
            });
        }
        let mut out = Vec::with_capacity(text.len() - self.old_len + self.new_len);
        out.extend_from_slice(&text[..self.start]);
        out.extend_from_slice(with);
        out.extend_from_slice(&text[self.old_end()..]);
        Ok(out)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("edit {start}..{end} is outside the text of length {len}")]
    OutOfBounds { start: usize, end: usize, len: usize },
    #[error("edits produce {expected} bytes but the new text has {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Segment {
    old_start: usize,
    new_start: usize,
    len: usize,
}

impl Segment {
    fn old_end(&self) -> usize {
        self.old_start + self.len
    }

    fn new_end(&self) -> usize {
        self.new_start + self.len
    }
}

/// Unchanged byte ranges between an old text and the text after a list of
/// edits, sorted by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChangeSet {
    segments: Vec<Segment>,
    old_len: usize,
    new_len: usize,
}

impl ChangeSet {
    pub fn new(old_len: usize) -> Self {
        let segments = if old_len > 0 {
            vec![Segment {
                old_start: 0,
                new_start: 0,
                len: old_len,
            }]
        } else {
            Vec::new()
        };
        Self {
            segments,
            old_len,
            new_len: old_len,
        }
    }

    pub fn from_edits(old_len: usize, edits: &[Edit]) -> Result<Self, EditError> {
        let mut changes = Self::new(old_len);
        for edit in edits {
            changes.apply(edit)?;
        }
        Ok(changes)
    }

    pub fn new_len(&self) -> usize {
        self.new_len
    }

    pub fn is_identity(&self) -> bool {
        self.old_len == self.new_len
            && match self.segments.as_slice() {
                [] => self.old_len == 0,
                [only] => only.old_start == 0 && only.new_start == 0 && only.len == self.old_len,
                _ => false,
            }
    }

    pub fn apply(&mut self, edit: &Edit) -> Result<(), EditError> {
        if edit.old_end() > self.new_len {
            return Err(EditError::OutOfBounds {
                start: edit.start,
                end: edit.old_end(),
                len: self.new_len,
            });
        }
        let removed_end = edit.old_end();
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        for segment in &self.segments {
            if segment.new_end() <= edit.start {
                segments.push(*segment);
                continue;
            }
            if segment.new_start >= removed_end {
                segments.push(Segment {
                    new_start: segment.new_start - edit.old_len + edit.new_len,
                    ..*segment
                });
                continue;
            }
            if segment.new_start < edit.start {
                segments.push(Segment {
                    len: edit.start - segment.new_start,
                    ..*segment
                });
            }
            if segment.new_end() > removed_end {
                let skipped = removed_end - segment.new_start;
                segments.push(Segment {
                    old_start: segment.old_start + skipped,
                    new_start: edit.new_end(),
                    len: segment.len - skipped,
                });
            }
        }
        self.segments = segments;
        self.new_len = self.new_len - edit.old_len + edit.new_len;
        Ok(())
    }

    /// Whether the old range `start..end` survived unchanged. `end` may be
    /// one past the old text, meaning the range also saw end of input; then
    /// the range must still end the new text.
    pub fn untouched(&self, start: usize, end: usize) -> bool {
        if end <= start {
            return false;
        }
        let Some(segment) = self.segment_containing(start) else {
            return false;
        };
        if end <= segment.old_end() {
            return true;
        }
        end == self.old_len + 1
            && segment.old_end() == self.old_len
            && segment.new_end() == self.new_len
    }

    /// New offset of an old offset that starts something inside an
    /// unchanged range.
    pub fn map_start(&self, old: usize) -> Option<usize> {
        let segment = self.segment_containing(old)?;
        Some(segment.new_start + (old - segment.old_start))
    }

    /// Monotonic old-to-new mapping. Offsets inside changed ranges map to
    /// the start of the next unchanged range.
    pub fn to_new(&self, old: usize) -> usize {
        let at = self.segments.partition_point(|s| s.old_end() < old);
        match self.segments.get(at) {
            Some(segment) if segment.old_start <= old => segment.new_start + (old - segment.old_start),
            Some(segment) => segment.new_start,
            None => self.new_len,
        }
    }

    fn segment_containing(&self, old: usize) -> Option<&Segment> {
        let at = self.segments.partition_point(|s| s.old_end() <= old);
        self.segments
            .get(at)
            .filter(|s| s.old_start <= old && old < s.old_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_identity() {
        let changes = ChangeSet::new(10);
        assert!(changes.is_identity());
        assert_eq!(changes.map_start(3), Some(3));
        assert!(changes.untouched(0, 11));
    }

    #[test]
    fn test_insert_splits_segment() {
        let changes = ChangeSet::from_edits(10, &[Edit::insert(4, 2)]).unwrap();
        assert_eq!(changes.new_len(), 12);
        assert_eq!(changes.map_start(3), Some(3));
        assert_eq!(changes.map_start(4), Some(6));
        assert!(changes.untouched(0, 4));
        assert!(!changes.untouched(3, 5));
        assert!(changes.untouched(4, 11));
    }

    #[test]
    fn test_sequential_edits_use_updated_coordinates() {
        // "abcdefghij" -> delete "cd" -> "abefghij" -> insert "XY" at 4 -> "abefXYghij"
        let changes = ChangeSet::from_edits(10, &[Edit::delete(2, 2), Edit::insert(4, 2)]).unwrap();
        assert_eq!(changes.new_len(), 10);
        assert_eq!(changes.map_start(4), Some(2));
        assert_eq!(changes.map_start(6), Some(6));
        assert_eq!(changes.map_start(2), None);
        assert!(!changes.untouched(4, 7));
    }

    #[rstest]
    #[case::end_of_input_kept(Edit::insert(0, 1), true)]
    #[case::end_of_input_moved(Edit::insert(10, 1), false)]
    #[case::tail_deleted(Edit::delete(9, 1), false)]
    fn test_lookahead_at_end_of_input(#[case] edit: Edit, #[case] untouched: bool) {
        let changes = ChangeSet::from_edits(10, &[edit]).unwrap();
        assert_eq!(changes.untouched(5, 11), untouched);
    }

    #[test]
    fn test_map_start_at_segment_boundary() {
        let changes = ChangeSet::from_edits(10, &[Edit::new(4, 2, 3)]).unwrap();
        assert_eq!(changes.map_start(4), None);
        assert_eq!(changes.map_start(6), Some(7));
        assert_eq!(changes.to_new(5), 7);
    }

    #[test]
    fn test_out_of_bounds_edit() {
        let err = ChangeSet::from_edits(4, &[Edit::delete(3, 2)]).unwrap_err();
        assert_eq!(
            err,
            EditError::OutOfBounds {
                start: 3,
                end: 5,
                len: 4
            }
        );
    }

    #[test]
    fn test_apply_to_text() {
        let text = Edit::new(1, 2, 1).apply_to(b"abcd", b"X").unwrap();
        assert_eq!(text, b"aXd");
    }
}
