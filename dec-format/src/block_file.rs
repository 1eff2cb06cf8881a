use std::io::Read;
use std::io::Write;

use crate::reader::BlockFileReader;
use crate::reader::Error;
use crate::writer::BlockFileWriter;

/// The contents of a block assignment file.
///
/// Constraints are referred to by name. Blocks are numbered from `1` in the file and from `0` in
/// this structure, i.e. `blocks[0]` holds the constraints listed under `BLOCK 1`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockFile {
    /// Whether the decomposition refers to the presolved constraint system. [`None`] when the file
    /// does not say.
    pub presolved: Option<bool>,
    /// The constraints of every block.
    pub blocks: Vec<Vec<String>>,
    /// The constraints listed in the `MASTERCONSS` section.
    pub master_constraints: Vec<String>,
    /// Whether constraints which are not listed anywhere belong to the master. Otherwise they
    /// are left open for detection.
    pub constraints_default_master: bool,
}

impl BlockFile {
    /// The number of blocks declared by the file.
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Parse a block assignment file.
    ///
    /// Parsing stops at the first malformed line; the error reports its line number and the
    /// offending token.
    ///
    /// # Example
    /// ```
    /// use dec_format::BlockFile;
    ///
    /// let source = r#"
    /// \ two independent knapsacks linked by a capacity constraint
    /// PRESOLVED 0
    /// NBLOCKS
    /// 2
    /// BLOCK 1
    /// knapsack_a
    /// BLOCK 2
    /// knapsack_b
    /// MASTERCONSS
    /// capacity
    /// "#;
    ///
    /// let file = BlockFile::parse(source.as_bytes()).expect("valid block file");
    ///
    /// assert_eq!(file.presolved, Some(false));
    /// assert_eq!(file.num_blocks(), 2);
    /// assert_eq!(file.blocks[0], vec!["knapsack_a".to_owned()]);
    /// assert_eq!(file.blocks[1], vec!["knapsack_b".to_owned()]);
    /// assert_eq!(file.master_constraints, vec!["capacity".to_owned()]);
    /// ```
    pub fn parse(source: impl Read) -> Result<BlockFile, Error> {
        BlockFileReader::new(source).read()
    }

    /// Write the file in the format accepted by [`BlockFile::parse`].
    ///
    /// # Example
    /// ```
    /// use dec_format::BlockFile;
    ///
    /// let file = BlockFile {
    ///     presolved: Some(false),
    ///     blocks: vec![vec!["a".to_owned()], vec!["b".to_owned(), "c".to_owned()]],
    ///     master_constraints: vec!["link".to_owned()],
    ///     constraints_default_master: false,
    /// };
    ///
    /// let mut output: Vec<u8> = Vec::new();
    /// file.write(&mut output).expect("writing to a vector succeeds");
    ///
    /// let expected = "
    /// PRESOLVED
    /// 0
    /// NBLOCKS
    /// 2
    /// BLOCK 1
    /// a
    /// BLOCK 2
    /// b
    /// c
    /// MASTERCONSS
    /// link
    /// ";
    /// assert_eq!(std::str::from_utf8(&output).unwrap(), expected.trim_start());
    /// ```
    pub fn write(&self, sink: impl Write) -> std::io::Result<()> {
        let mut writer = BlockFileWriter::new(sink);

        if let Some(presolved) = self.presolved {
            writer.write_presolved(presolved)?;
        }
        if self.constraints_default_master {
            writer.write_constraints_default_master()?;
        }
        writer.write_num_blocks(self.blocks.len())?;
        for (index, constraints) in self.blocks.iter().enumerate() {
            writer.write_block(index, constraints)?;
        }
        if !self.master_constraints.is_empty() {
            writer.write_master_constraints(&self.master_constraints)?;
        }

        writer.flush()
    }
}
