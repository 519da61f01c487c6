//! Per-item results of a batch fan-out.

use serde::{Deserialize, Serialize};

use crate::types::outcome::Outcome;

/// One input identifier paired with its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem<I> {
    pub id: I,
    pub outcome: Outcome,
}

impl<I> BatchItem<I> {
    pub const fn new(id: I, outcome: Outcome) -> Self {
        Self { id, outcome }
    }
}

/// Ordered batch result. Always one item per input, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchResult<I> {
    items: Vec<BatchItem<I>>,
}

impl<I> BatchResult<I> {
    pub const fn new(items: Vec<BatchItem<I>>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BatchItem<I>> {
        self.items.iter()
    }

    pub fn successes(&self) -> impl Iterator<Item = &BatchItem<I>> {
        self.items.iter().filter(|item| item.outcome.is_success())
    }

    pub fn failures(&self) -> impl Iterator<Item = &BatchItem<I>> {
        self.items.iter().filter(|item| item.outcome.is_failure())
    }

    pub fn success_count(&self) -> usize {
        self.successes().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn into_items(self) -> Vec<BatchItem<I>> {
        self.items
    }
}

impl<I> IntoIterator for BatchResult<I> {
    type Item = BatchItem<I>;
    type IntoIter = std::vec::IntoIter<BatchItem<I>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, I> IntoIterator for &'a BatchResult<I> {
    type Item = &'a BatchItem<I>;
    type IntoIter = std::slice::Iter<'a, BatchItem<I>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::types::outcome::{Failure, FailureOrigin, Payload};

    #[test]
    fn counts_split_successes_and_failures() {
        let result = BatchResult::new(vec![
            BatchItem::new(1, Outcome::success(200, Payload::Text("ok".into()))),
            BatchItem::new(
                2,
                Outcome::failure(Failure::new(ErrorKind::NotFound, "gone", FailureOrigin::Response)),
            ),
            BatchItem::new(3, Outcome::success(200, Payload::Text("ok".into()))),
        ]);

        assert_eq!(result.len(), 3);
        assert_eq!(result.success_count(), 2);
        assert_eq!(result.failure_count(), 1);
        let ids: Vec<_> = result.iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
