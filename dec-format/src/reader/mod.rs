//! Implements the parsing of block assignment files and partition files.
//!
//! See [`BlockFileReader`] and [`PartitionFileReader`], or the convenience functions
//! [`crate::BlockFile::parse`] and [`crate::PartitionFile::parse`].

mod error;
mod parser;

use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;

pub use error::Error;
use parser::LineParser;
use parser::Token;

use crate::BlockFile;
use crate::Indexing;
use crate::PartitionFile;

/// The section of a block file the reader is in; constraint names are added to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Section {
    Header,
    Block(usize),
    Master,
}

/// A keyword whose value may be given on the line after the keyword.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PendingValue {
    NumBlocks,
    Presolved,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Keyword {
    Presolved,
    NumBlocks,
    Block,
    MasterConstraints,
    ConstraintsDefaultMaster,
}

impl Keyword {
    fn parse(text: &str) -> Option<Keyword> {
        match text.to_ascii_uppercase().as_str() {
            "PRESOLVED" => Some(Keyword::Presolved),
            "NBLOCKS" => Some(Keyword::NumBlocks),
            "BLOCK" => Some(Keyword::Block),
            "MASTERCONSS" => Some(Keyword::MasterConstraints),
            "CONSDEFAULTMASTER" => Some(Keyword::ConstraintsDefaultMaster),
            _ => None,
        }
    }
}

/// Reads a block assignment file line by line.
///
/// Keywords (`PRESOLVED`, `NBLOCKS`, `BLOCK`, `MASTERCONSS`, `CONSDEFAULTMASTER`) are only
/// recognised as the first token of a line and are matched case-insensitively. Inside a `BLOCK`
/// or `MASTERCONSS` section, a line holding a single token is a constraint name unless it is
/// exactly `MASTERCONSS`, so constraints named like keywords survive a write and parse. The
/// values of `PRESOLVED` and `NBLOCKS` may be on the same line as the keyword or on the next
/// non-empty line. Every other token is a constraint name and is added to the current section.
/// Empty lines are ignored and `\` starts a comment.
#[derive(Debug)]
pub struct BlockFileReader<R> {
    source: BufReader<R>,
    buffer: String,
    line_nr: usize,

    file: BlockFile,
    num_blocks: Option<usize>,
    section: Section,
    pending: Option<(PendingValue, usize)>,
}

impl<R: Read> BlockFileReader<R> {
    pub fn new(source: R) -> Self {
        BlockFileReader {
            source: BufReader::new(source),
            buffer: String::new(),
            line_nr: 0,
            file: BlockFile::default(),
            num_blocks: None,
            section: Section::Header,
            pending: None,
        }
    }

    /// Read the complete file. Stops at the first error.
    pub fn read(mut self) -> Result<BlockFile, Error> {
        loop {
            self.buffer.clear();
            let read_bytes = self.source.read_line(&mut self.buffer)?;
            if read_bytes == 0 {
                break;
            }
            self.line_nr += 1;

            let line = std::mem::take(&mut self.buffer);
            let result = self.parse_line(&line);
            self.buffer = line;
            result?;
        }

        if let Some((keyword, line_nr)) = self.pending {
            return Err(Error::ParseError {
                line_nr,
                token: keyword_name(keyword).to_owned(),
                reason: "unexpected end of file: expected a value".to_owned(),
                span: (0, 0),
            });
        }

        Ok(self.file)
    }

    fn parse_line(&mut self, line: &str) -> Result<(), Error> {
        let mut parser = LineParser::new(line, self.line_nr);
        let Some(first) = parser.next_token() else {
            return Ok(());
        };

        if let Some((keyword, _)) = self.pending.take() {
            self.set_value(&parser, keyword, first)?;
        } else if let Some(keyword) = self.keyword(first, parser.is_at_end()) {
            self.apply_keyword(&mut parser, keyword, first)?;
        } else {
            self.add_constraint(&parser, first)?;
        }

        while let Some(token) = parser.next_token() {
            match self.pending.take() {
                Some((keyword, _)) => self.set_value(&parser, keyword, token)?,
                None => self.add_constraint(&parser, token)?,
            }
        }

        Ok(())
    }

    /// The keyword `first`, the first token of a line, stands for.
    fn keyword(&self, first: Token<'_>, alone: bool) -> Option<Keyword> {
        if alone && self.section != Section::Header {
            return (first.text == "MASTERCONSS").then_some(Keyword::MasterConstraints);
        }

        Keyword::parse(first.text)
    }

    fn apply_keyword<'src>(
        &mut self,
        parser: &mut LineParser<'src>,
        keyword: Keyword,
        token: Token<'src>,
    ) -> Result<(), Error> {
        match keyword {
            Keyword::Presolved => self.pending = Some((PendingValue::Presolved, self.line_nr)),
            Keyword::NumBlocks => self.pending = Some((PendingValue::NumBlocks, self.line_nr)),
            Keyword::Block => {
                let Some(index) = parser.next_token() else {
                    return Err(
                        parser.error(token, "expected a block number after BLOCK".to_owned())
                    );
                };
                self.section = Section::Block(self.block_index(parser, index)?);
                parser.expect_end()?;
            }
            Keyword::MasterConstraints => {
                self.section = Section::Master;
                parser.expect_end()?;
            }
            Keyword::ConstraintsDefaultMaster => {
                self.file.constraints_default_master = match parser.next_token() {
                    Some(value) => parser.flag(value)?,
                    None => true,
                };
            }
        }

        Ok(())
    }

    fn set_value(
        &mut self,
        parser: &LineParser<'_>,
        keyword: PendingValue,
        token: Token<'_>,
    ) -> Result<(), Error> {
        match keyword {
            PendingValue::Presolved => self.file.presolved = Some(parser.flag(token)?),
            PendingValue::NumBlocks => {
                if self.num_blocks.is_some() {
                    return Err(parser.error(token, "NBLOCKS is given twice".to_owned()));
                }
                let num_blocks = parser.unsigned(token, "the number of blocks")?;
                self.num_blocks = Some(num_blocks);
                self.file.blocks = vec![Vec::new(); num_blocks];
            }
        }

        Ok(())
    }

    /// Convert the 1-based block number in `token` to a 0-based index.
    fn block_index(&self, parser: &LineParser<'_>, token: Token<'_>) -> Result<usize, Error> {
        let Some(num_blocks) = self.num_blocks else {
            return Err(parser.error(token, "BLOCK before NBLOCKS".to_owned()));
        };

        let number = parser.unsigned(token, "a block number")?;
        if number == 0 || number > num_blocks {
            return Err(parser.error(
                token,
                format!("block number out of range: expected 1..={num_blocks}"),
            ));
        }

        Ok(number - 1)
    }

    fn add_constraint(&mut self, parser: &LineParser<'_>, token: Token<'_>) -> Result<(), Error> {
        match self.section {
            Section::Header => Err(parser.error(
                token,
                "expected a keyword; constraint names must follow BLOCK or MASTERCONSS".to_owned(),
            )),
            Section::Block(index) => {
                self.file.blocks[index].push(token.text.to_owned());
                Ok(())
            }
            Section::Master => {
                self.file.master_constraints.push(token.text.to_owned());
                Ok(())
            }
        }
    }
}

fn keyword_name(keyword: PendingValue) -> &'static str {
    match keyword {
        PendingValue::NumBlocks => "NBLOCKS",
        PendingValue::Presolved => "PRESOLVED",
    }
}

/// Reads a partition file: one `<node> <block>` pair per line.
///
/// Node ids follow the given [`Indexing`]; block ids are arbitrary labels and are renumbered
/// densely in order of first appearance. Empty lines and lines starting with `%` or `#` are
/// ignored.
#[derive(Debug)]
pub struct PartitionFileReader<R> {
    source: BufReader<R>,
    indexing: Indexing,
}

impl<R: Read> PartitionFileReader<R> {
    pub fn new(source: R, indexing: Indexing) -> Self {
        PartitionFileReader {
            source: BufReader::new(source),
            indexing,
        }
    }

    /// Read the complete file. Stops at the first error.
    pub fn read(mut self) -> Result<PartitionFile, Error> {
        let mut buffer = String::new();
        let mut line_nr = 0;

        let mut node_blocks: Vec<Option<usize>> = Vec::new();
        let mut labels: Vec<usize> = Vec::new();

        loop {
            buffer.clear();
            if self.source.read_line(&mut buffer)? == 0 {
                break;
            }
            line_nr += 1;

            let trimmed = buffer.trim_start();
            if trimmed.starts_with('%') || trimmed.starts_with('#') {
                continue;
            }

            let mut parser = LineParser::new(&buffer, line_nr);
            let Some(node_token) = parser.next_token() else {
                continue;
            };
            let node = parser.unsigned(node_token, "a node id")?;
            let node = match self.indexing {
                Indexing::ZeroBased => node,
                Indexing::OneBased if node > 0 => node - 1,
                Indexing::OneBased => {
                    return Err(parser.error(node_token, "node ids are 1-based".to_owned()))
                }
            };

            let Some(block_token) = parser.next_token() else {
                return Err(parser.error(node_token, "expected a block id after the node".to_owned()));
            };
            let label = parser.unsigned(block_token, "a block id")?;
            parser.expect_end()?;

            let block = match labels.iter().position(|&known| known == label) {
                Some(block) => block,
                None => {
                    labels.push(label);
                    labels.len() - 1
                }
            };

            if node >= node_blocks.len() {
                node_blocks.resize(node + 1, None);
            }
            if node_blocks[node].is_some() {
                return Err(parser.error(node_token, "node is assigned twice".to_owned()));
            }
            node_blocks[node] = Some(block);
        }

        Ok(PartitionFile {
            node_blocks,
            num_blocks: labels.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<BlockFile, Error> {
        BlockFileReader::new(source.as_bytes()).read()
    }

    #[test]
    fn values_on_the_same_line_as_their_keyword() {
        let file = parse("presolved 1\nnblocks 1\nblock 1\na b\nc\n").expect("valid block file");

        assert_eq!(file.presolved, Some(true));
        assert_eq!(
            file.blocks,
            vec![vec!["a".to_owned(), "b".to_owned(), "c".to_owned()]]
        );
        assert!(file.master_constraints.is_empty());
    }

    #[test]
    fn consdefaultmaster_without_value_is_enabled() {
        let file = parse("NBLOCKS 1\nCONSDEFAULTMASTER\nBLOCK 1\na\n").expect("valid block file");

        assert!(file.constraints_default_master);
    }

    #[test]
    fn block_out_of_range_reports_line_and_token() {
        let error = parse("NBLOCKS 2\nBLOCK 1\na\nBLOCK 3\nb\n").unwrap_err();

        match error {
            Error::ParseError {
                line_nr,
                token,
                span,
                ..
            } => {
                assert_eq!(line_nr, 4);
                assert_eq!(token, "3");
                assert_eq!(span, (6, 7));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn names_before_any_section_are_rejected() {
        let error = parse("\\ header\nc0\nNBLOCKS 1\n").unwrap_err();

        assert_eq!(error.line_nr(), Some(2));
    }

    #[test]
    fn block_before_nblocks_is_rejected() {
        let error = parse("BLOCK 1\nc0\n").unwrap_err();

        assert_eq!(error.line_nr(), Some(1));
    }

    #[test]
    fn missing_value_at_end_of_file() {
        let error = parse("NBLOCKS 1\nPRESOLVED\n\n").unwrap_err();

        assert_eq!(error.line_nr(), Some(2));
    }

    #[test]
    fn single_keyword_tokens_inside_a_section_are_names() {
        let source = "NBLOCKS 2\nBLOCK 1\nblock\nPRESOLVED\nNBLOCKS\n\
                      BLOCK 2\nmasterconss\nMASTERCONSS\nConsDefaultMaster\n";
        let file = parse(source).expect("valid block file");

        assert_eq!(
            file.blocks,
            vec![
                vec!["block".to_owned(), "PRESOLVED".to_owned(), "NBLOCKS".to_owned()],
                vec!["masterconss".to_owned()],
            ]
        );
        assert_eq!(file.master_constraints, vec!["ConsDefaultMaster".to_owned()]);
        assert!(!file.constraints_default_master);
    }

    #[test]
    fn keywords_are_only_recognised_at_the_start_of_a_line() {
        let file = parse("NBLOCKS 1\nBLOCK 1\na block MASTERCONSS\n").expect("valid block file");

        assert_eq!(
            file.blocks,
            vec![vec!["a".to_owned(), "block".to_owned(), "MASTERCONSS".to_owned()]]
        );
        assert!(file.master_constraints.is_empty());
    }

    #[test]
    fn invalid_number_of_blocks() {
        let error = parse("NBLOCKS\ntwo\n").unwrap_err();

        match error {
            Error::ParseError { line_nr, token, .. } => {
                assert_eq!(line_nr, 2);
                assert_eq!(token, "two");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn partition_blocks_are_renumbered_by_first_appearance() {
        let source = "% hypergraph partition\n1 7\n2 3\n4 7\n";
        let partition = PartitionFileReader::new(source.as_bytes(), Indexing::OneBased)
            .read()
            .expect("valid partition file");

        assert_eq!(partition.num_blocks, 2);
        assert_eq!(
            partition.node_blocks,
            vec![Some(0), Some(1), None, Some(0)]
        );
    }

    #[test]
    fn partition_node_zero_is_invalid_when_one_based() {
        let error = PartitionFileReader::new("0 1\n".as_bytes(), Indexing::OneBased)
            .read()
            .unwrap_err();

        assert_eq!(error.line_nr(), Some(1));
    }

    #[test]
    fn partition_node_assigned_twice() {
        let error = PartitionFileReader::new("0 1\n1 1\n0 2\n".as_bytes(), Indexing::ZeroBased)
            .read()
            .unwrap_err();

        match error {
            Error::ParseError { line_nr, token, .. } => {
                assert_eq!(line_nr, 3);
                assert_eq!(token, "0");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
