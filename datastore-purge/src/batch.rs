use crate::Key;
use std::mem;

/// Accumulates keys in enumeration order and cuts them into batches of at most `capacity`
pub struct Batcher<K: Key> {
  capacity: usize,
  batch: Vec<K>,
  emitted: usize,
}

impl<K> Batcher<K>
where
  K: Key,
{
  pub fn new(capacity: usize) -> Self {
    let capacity = capacity.max(1);

    Batcher {
      capacity,
      batch: Vec::with_capacity(capacity),
      emitted: 0,
    }
  }

  /// Append `key`, returning the batch once it is full
  #[must_use]
  pub fn push(&mut self, key: K) -> Option<Vec<K>> {
    self.batch.push(key);

    if self.batch.len().ge(&self.capacity) {
      self.emitted += 1;
      Some(mem::replace(
        &mut self.batch,
        Vec::with_capacity(self.capacity),
      ))
    } else {
      None
    }
  }

  /// The trailing partial batch. An empty batch is only returned when nothing was emitted at all, so an empty enumeration still submits exactly once
  #[must_use]
  pub fn finish(self) -> Option<Vec<K>> {
    let Batcher { batch, emitted, .. } = self;

    if batch.is_empty() && emitted.gt(&0) {
      None
    } else {
      Some(batch)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use itertools::Itertools;

  fn batch_sizes(count: usize, capacity: usize) -> Vec<usize> {
    let mut batcher = Batcher::new(capacity);
    let mut sizes = (0..count)
      .filter_map(|key| batcher.push(key))
      .map(|batch| batch.len())
      .collect_vec();

    sizes.extend(batcher.finish().map(|batch| batch.len()));

    sizes
  }

  #[test]
  fn it_cuts_full_batches_and_a_remainder() {
    assert_eq!(batch_sizes(1200, 500), vec![500, 500, 200]);
  }

  #[test]
  fn it_submits_one_empty_batch_for_nothing() {
    assert_eq!(batch_sizes(0, 500), vec![0]);
  }

  #[test]
  fn it_does_not_trail_an_empty_batch() {
    assert_eq!(batch_sizes(500, 500), vec![500]);
    assert_eq!(batch_sizes(1000, 500), vec![500, 500]);
  }

  #[test]
  fn it_produces_ceil_n_over_capacity_batches() {
    for count in [1, 499, 501, 999, 2345] {
      let sizes = batch_sizes(count, 500);

      assert_eq!(sizes.len(), (count + 499) / 500);
      assert_eq!(sizes.iter().sum::<usize>(), count);
      assert!(sizes[..sizes.len() - 1].iter().all(|size| size.eq(&500)));
    }
  }

  #[test]
  fn it_preserves_enumeration_order() {
    let mut batcher = Batcher::new(3);
    let batches = (0..7).filter_map(|key| batcher.push(key)).collect_vec();

    assert_eq!(batches, vec![vec![0, 1, 2], vec![3, 4, 5]]);
    assert_eq!(batcher.finish(), Some(vec![6]));
  }
}
