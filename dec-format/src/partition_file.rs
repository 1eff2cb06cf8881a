use std::io::Read;

use crate::reader::Error;
use crate::reader::PartitionFileReader;

/// How the node ids in a partition file are counted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Indexing {
    #[default]
    ZeroBased,
    OneBased,
}

/// A block for (some of) the nodes of a graph, as computed by an external partitioner.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PartitionFile {
    /// The block of every node, indexed from `0` regardless of the [`Indexing`] of the file.
    /// Nodes which are not listed in the file have no block.
    pub node_blocks: Vec<Option<usize>>,
    /// The number of distinct blocks; blocks are numbered `0..num_blocks` in order of first
    /// appearance.
    pub num_blocks: usize,
}

impl PartitionFile {
    /// Parse a partition file with one `<node> <block>` pair per line.
    ///
    /// # Example
    /// ```
    /// use dec_format::Indexing;
    /// use dec_format::PartitionFile;
    ///
    /// let source = "1 5\n2 5\n3 2\n";
    /// let partition =
    ///     PartitionFile::parse(source.as_bytes(), Indexing::OneBased).expect("valid partition");
    ///
    /// assert_eq!(partition.num_blocks, 2);
    /// assert_eq!(partition.node_blocks, vec![Some(0), Some(0), Some(1)]);
    /// ```
    pub fn parse(source: impl Read, indexing: Indexing) -> Result<PartitionFile, Error> {
        PartitionFileReader::new(source, indexing).read()
    }

    /// The block of `node`, if it has one.
    pub fn block_of(&self, node: usize) -> Option<usize> {
        self.node_blocks.get(node).copied().flatten()
    }
}
