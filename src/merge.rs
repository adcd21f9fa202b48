//! Sorted-stream cursor used by the final multi-way merge-join.

use crate::errors::ExtractError;

/// Cursor over a key-sorted stream of `(key, value)` rows.
///
/// The driving stream of a merge-join calls [`SortedCursor::advance_to`] with
/// each of its keys in ascending order; the cursor advances past smaller keys
/// and reports the value only on an exact match. Keys absent from this stream
/// are simply reported as `None`, never skipped past.
pub struct SortedCursor<K, V, I>
where
    I: Iterator<Item = Result<(K, V), ExtractError>>,
{
    iter: I,
    current: Option<(K, V)>,
}

impl<K, V, I> SortedCursor<K, V, I>
where
    K: Ord,
    I: Iterator<Item = Result<(K, V), ExtractError>>,
{
    pub fn new(mut iter: I) -> Result<Self, ExtractError> {
        let current = iter.next().transpose()?;
        Ok(Self { iter, current })
    }

    /// Advance while the cursor's key is behind `key`; return the value when
    /// the cursor lands exactly on `key`.
    pub fn advance_to(&mut self, key: &K) -> Result<Option<&V>, ExtractError> {
        while let Some((current_key, _)) = &self.current {
            if current_key >= key {
                break;
            }
            self.current = self.iter.next().transpose()?;
        }
        match &self.current {
            Some((current_key, value)) if current_key == key => Ok(Some(value)),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(rows: Vec<(i64, &'static str)>) -> SortedCursor<i64, &'static str, impl Iterator<Item = Result<(i64, &'static str), ExtractError>>> {
        SortedCursor::new(rows.into_iter().map(Ok)).unwrap()
    }

    #[test]
    fn reports_matches_and_gaps() {
        let mut cursor = cursor(vec![(2, "two"), (5, "five"), (9, "nine")]);

        assert_eq!(cursor.advance_to(&1).unwrap(), None);
        assert_eq!(cursor.advance_to(&2).unwrap(), Some(&"two"));
        // Skips past 5 without losing 9.
        assert_eq!(cursor.advance_to(&7).unwrap(), None);
        assert_eq!(cursor.advance_to(&9).unwrap(), Some(&"nine"));
        assert_eq!(cursor.advance_to(&10).unwrap(), None);
    }

    #[test]
    fn repeated_queries_for_same_key_stay_on_match() {
        let mut cursor = cursor(vec![(3, "three")]);
        assert_eq!(cursor.advance_to(&3).unwrap(), Some(&"three"));
        assert_eq!(cursor.advance_to(&3).unwrap(), Some(&"three"));
    }

    #[test]
    fn empty_stream_always_misses() {
        let mut cursor = cursor(vec![]);
        assert_eq!(cursor.advance_to(&1).unwrap(), None);
    }
}
