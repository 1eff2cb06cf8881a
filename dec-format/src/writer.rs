//! Implements the writing of block assignment files.
//!
//! See [`BlockFileWriter`], or the convenience function [`crate::BlockFile::write`].

use std::io::BufWriter;
use std::io::Write;

/// Writes the sections of a block assignment file.
///
/// Every keyword and every value is written on its own line. Blocks are passed with their
/// 0-based index and written with the 1-based numbering of the format. Writing a constraint name
/// which [`is_writable_name`] rejects fails with [`std::io::ErrorKind::InvalidInput`].
#[derive(Debug)]
pub struct BlockFileWriter<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> BlockFileWriter<W> {
    pub fn new(sink: W) -> Self {
        BlockFileWriter {
            writer: BufWriter::new(sink),
        }
    }

    pub fn write_presolved(&mut self, presolved: bool) -> std::io::Result<()> {
        writeln!(self.writer, "PRESOLVED")?;
        writeln!(self.writer, "{}", u8::from(presolved))
    }

    pub fn write_constraints_default_master(&mut self) -> std::io::Result<()> {
        writeln!(self.writer, "CONSDEFAULTMASTER")
    }

    pub fn write_num_blocks(&mut self, num_blocks: usize) -> std::io::Result<()> {
        writeln!(self.writer, "NBLOCKS")?;
        writeln!(self.writer, "{num_blocks}")
    }

    /// Write the block with 0-based index `index`.
    pub fn write_block(
        &mut self,
        index: usize,
        constraints: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> std::io::Result<()> {
        writeln!(self.writer, "BLOCK {}", index + 1)?;
        self.write_names(constraints)
    }

    pub fn write_master_constraints(
        &mut self,
        constraints: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> std::io::Result<()> {
        writeln!(self.writer, "MASTERCONSS")?;
        self.write_names(constraints)
    }

    /// Flush the underlying buffer. Dropping the writer also flushes, but ignores errors.
    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }

    fn write_names(
        &mut self,
        constraints: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> std::io::Result<()> {
        for name in constraints {
            let name = name.as_ref();
            if !is_writable_name(name) {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("constraint name '{name}' cannot be written to a block file"),
                ));
            }
            writeln!(self.writer, "{name}")?;
        }
        Ok(())
    }
}

/// Whether `name` can be listed in a block file and is read back as the same name.
///
/// Names are written one per line, so every name except `MASTERCONSS` survives, provided it is
/// a single token and does not contain the comment character `\`.
pub fn is_writable_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(|c: char| c.is_whitespace() || c == '\\')
        && name != "MASTERCONSS"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BlockFile;

    #[test]
    fn written_files_are_parsed_back() {
        let file = BlockFile {
            presolved: Some(true),
            blocks: vec![
                vec!["a".to_owned()],
                vec![],
                vec!["b".to_owned(), "c".to_owned()],
            ],
            master_constraints: vec!["d".to_owned()],
            constraints_default_master: true,
        };

        let mut output = Vec::new();
        file.write(&mut output).expect("writing to a vector succeeds");

        assert_eq!(
            BlockFile::parse(output.as_slice()).expect("valid block file"),
            file
        );
    }

    #[test]
    fn names_spelled_like_keywords_are_parsed_back() {
        let file = BlockFile {
            presolved: Some(false),
            blocks: vec![
                vec!["block".to_owned(), "BLOCK".to_owned()],
                vec!["Presolved".to_owned(), "NBLOCKS".to_owned()],
            ],
            master_constraints: vec!["masterconss".to_owned(), "CONSDEFAULTMASTER".to_owned()],
            constraints_default_master: false,
        };

        let mut output = Vec::new();
        file.write(&mut output).expect("writing to a vector succeeds");

        assert_eq!(
            BlockFile::parse(output.as_slice()).expect("valid block file"),
            file
        );
    }

    #[test]
    fn names_the_format_cannot_carry_are_refused() {
        for name in ["a\\b", "two words", "", "MASTERCONSS"] {
            let file = BlockFile {
                blocks: vec![vec![name.to_owned()]],
                ..Default::default()
            };

            let error = file.write(Vec::new()).unwrap_err();
            assert_eq!(error.kind(), std::io::ErrorKind::InvalidInput);
        }
    }
}
