use crate::error::Result;
use crate::types::RawBlock;
use regex::Regex;
use std::io::BufRead;

/// Streams message blocks out of a concatenated mailbox.
///
/// A line matching the separator closes the current block and opens the next
/// one. Text before the first separator is emitted as a block of its own
/// unless it is blank. The final block is emitted at end of input.
pub struct MboxSplitter<R> {
    reader: R,
    separator: Regex,
    pending_separator: Option<String>,
    next_index: usize,
    done: bool,
}

impl<R: BufRead> MboxSplitter<R> {
    pub fn new(reader: R, separator: Regex) -> Self {
        Self {
            reader,
            separator,
            pending_separator: None,
            next_index: 0,
            done: false,
        }
    }

    fn is_separator(&self, line: &[u8]) -> bool {
        let text = String::from_utf8_lossy(line);
        self.separator
            .is_match(text.trim_end_matches(['\r', '\n']))
    }

    fn read_block(&mut self) -> Result<Option<RawBlock>> {
        let mut bytes = Vec::new();
        let opened_by = self.pending_separator.take();
        let mut line = Vec::new();

        loop {
            line.clear();
            let read = self.reader.read_until(b'\n', &mut line)?;
            if read == 0 {
                self.done = true;
                break;
            }
            if self.is_separator(&line) {
                let text = String::from_utf8_lossy(&line);
                self.pending_separator = Some(text.trim_end_matches(['\r', '\n']).to_string());
                break;
            }
            bytes.extend_from_slice(&line);
        }

        let block = RawBlock {
            index: self.next_index,
            separator: opened_by,
            bytes,
        };
        // A leading separator produces an empty preamble; skip it silently.
        if block.is_blank() && block.separator.is_none() {
            return Ok(None);
        }
        self.next_index += 1;
        Ok(Some(block))
    }
}

impl<R: BufRead> Iterator for MboxSplitter<R> {
    type Item = Result<RawBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match self.read_block() {
                Ok(Some(block)) => return Some(Ok(block)),
                Ok(None) => continue,
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MboxConfig;
    use pretty_assertions::assert_eq;

    fn split(input: &str, config: &MboxConfig) -> Vec<RawBlock> {
        let regex = config.separator_regex().unwrap();
        MboxSplitter::new(input.as_bytes(), regex)
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn splits_on_separator_and_keeps_last_block() {
        let input = "From 1@xxx Mon Jan  1 00:00:00 1996\nSubject: one\n\nbody one\nFrom 2@xxx\nSubject: two\n\nbody two\n";
        let blocks = split(input, &MboxConfig::numbered_separator());
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].index, 0);
        assert_eq!(blocks[0].text(), "Subject: one\n\nbody one\n");
        assert_eq!(
            blocks[0].separator.as_deref(),
            Some("From 1@xxx Mon Jan  1 00:00:00 1996")
        );
        assert_eq!(blocks[1].text(), "Subject: two\n\nbody two\n");
        assert_eq!(blocks[1].index, 1);
    }

    #[test]
    fn body_lines_that_do_not_match_stay_in_block() {
        let input = "From 1@xxx\nSubject: a\n\nFrom the desk of Bob\n>From quoted\n";
        let blocks = split(input, &MboxConfig::numbered_separator());
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].text().contains("From the desk of Bob"));
    }

    #[test]
    fn preamble_before_first_separator_is_a_block() {
        let input = "Subject: stray\n\nno separator\nFrom bob@example.com Tue\nSubject: b\n\nx\n";
        let blocks = split(input, &MboxConfig::default());
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].separator, None);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(split("", &MboxConfig::default()).is_empty());
        assert!(split("\n\n", &MboxConfig::default()).is_empty());
    }

    #[test]
    fn invalid_utf8_is_kept_byte_exact() {
        let mut input = b"From a@b\nSubject: caf".to_vec();
        input.extend_from_slice(&[0xe9, b'\n']);
        let regex = MboxConfig::default().separator_regex().unwrap();
        let blocks: Vec<RawBlock> = MboxSplitter::new(&input[..], regex)
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].bytes, b"Subject: caf\xe9\n".to_vec());
    }
}
