use crate::blocksplit_assert_moderate;
use crate::containers::KeyedVec;
use crate::containers::StorageKey;

/// Merges provisional block labels into canonical block ids.
///
/// Labels are handed out by [`BlockUnionFind::new_block`]. When two labels are merged, the
/// numerically smaller label always becomes the representative, so the final labelling only
/// depends on the sequence of [`BlockUnionFind::union`] calls and never on iteration order of
/// some other structure.
#[derive(Clone, Debug, Default)]
pub struct BlockUnionFind {
    representative: Vec<usize>,
}

impl BlockUnionFind {
    /// Create a union-find with the labels `0..num_blocks` already handed out.
    pub fn with_blocks(num_blocks: usize) -> Self {
        BlockUnionFind {
            representative: (0..num_blocks).collect(),
        }
    }

    /// Hand out a fresh label which is its own representative.
    pub fn new_block(&mut self) -> usize {
        let block = self.representative.len();
        self.representative.push(block);
        block
    }

    /// The number of labels handed out so far, merged or not.
    pub fn num_labels(&self) -> usize {
        self.representative.len()
    }

    /// The canonical label of `block`. Compresses the path from `block` to its root.
    pub fn find(&mut self, mut block: usize) -> usize {
        let mut root = block;
        while self.representative[root] != root {
            root = self.representative[root];
        }

        while self.representative[block] != block {
            let next = self.representative[block];
            self.representative[block] = root;
            block = next;
        }

        root
    }

    /// Merge the sets of `a` and `b`; the smaller of the two roots becomes the representative,
    /// which is returned.
    pub fn union(&mut self, a: usize, b: usize) -> usize {
        let a = self.find(a);
        let b = self.find(b);

        let (root, child) = if a <= b { (a, b) } else { (b, a) };
        self.representative[child] = root;

        blocksplit_assert_moderate!(self.representative[root] == root);
        root
    }

    /// Replace every label in `labels` by a dense id in `0..k`, numbered in order of first
    /// appearance. Returns `k`.
    ///
    /// Labels which were handed out but do not occur in `labels` do not receive an id, so every
    /// id in `0..k` is used by at least one entry.
    pub fn renumber_contiguous<Key: StorageKey>(
        &mut self,
        labels: &mut KeyedVec<Key, Option<usize>>,
    ) -> usize {
        let mut dense_id: Vec<Option<usize>> = vec![None; self.representative.len()];
        let mut num_dense = 0;

        for label in labels.iter_mut() {
            if let Some(block) = label {
                let root = self.find(*block);
                let id = *dense_id[root].get_or_insert_with(|| {
                    num_dense += 1;
                    num_dense - 1
                });
                *block = id;
            }
        }

        num_dense
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smaller_label_becomes_representative() {
        let mut union_find = BlockUnionFind::default();
        let blocks: Vec<usize> = (0..4).map(|_| union_find.new_block()).collect();

        assert_eq!(union_find.union(blocks[3], blocks[1]), 1);
        assert_eq!(union_find.union(blocks[1], blocks[2]), 1);
        assert_eq!(union_find.find(blocks[3]), 1);
        assert_eq!(union_find.find(blocks[0]), 0);
    }

    #[test]
    fn renumbering_follows_first_appearance_and_has_no_gaps() {
        let mut union_find = BlockUnionFind::with_blocks(5);
        let _ = union_find.union(4, 2);

        let mut labels: KeyedVec<usize, Option<usize>> =
            [Some(4), None, Some(3), Some(2), Some(0)].into_iter().collect();
        let num_blocks = union_find.renumber_contiguous(&mut labels);

        assert_eq!(num_blocks, 3);
        assert_eq!(
            labels.iter().copied().collect::<Vec<_>>(),
            vec![Some(0), None, Some(1), Some(0), Some(2)]
        );
    }

    #[test]
    fn same_union_sequence_gives_same_labelling() {
        let unions = [(5, 1), (2, 7), (7, 5), (3, 6), (0, 6)];

        let run = || {
            let mut union_find = BlockUnionFind::with_blocks(8);
            for (a, b) in unions {
                let _ = union_find.union(a, b);
            }
            let mut labels: KeyedVec<usize, Option<usize>> = (0..8).map(Some).collect();
            let num_blocks = union_find.renumber_contiguous(&mut labels);
            (num_blocks, labels)
        };

        let (first_count, first) = run();
        for _ in 0..10 {
            let (count, labels) = run();
            assert_eq!(count, first_count);
            assert_eq!(labels, first);
        }
        assert_eq!(first_count, 3);
    }
}
