//! Line Framer (§4.A): splits an arbitrarily-segmented byte stream into
//! ASCII-decimal sample records.

/// Accumulates bytes until a line terminator and parses each complete line
/// as a `u8` sample. Malformed lines are silently skipped — no error, no
/// effect on the sample index, matching the original's
/// `int(line.strip())` inside a bare `except ValueError: continue`.
#[derive(Debug, Default)]
pub struct LineFramer {
    pending: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed newly-read bytes in and drain every complete, parseable line as
    /// a sample. Bytes after the last terminator are kept for the next call.
    ///
    /// CR, LF, and CRLF are all valid terminators (§4.A), matching Python's
    /// `bytes.splitlines()` used by the original tool.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<u8> {
        self.pending.extend_from_slice(chunk);
        let mut samples = Vec::new();

        loop {
            let Some(term) = self.pending.iter().position(|&b| b == b'\n' || b == b'\r') else {
                break;
            };
            // a lone CR not followed by LF is itself a terminator; a CRLF
            // pair is consumed as one terminator.
            let consumed_through = if self.pending[term] == b'\r'
                && self.pending.get(term + 1) == Some(&b'\n')
            {
                term + 1
            } else {
                term
            };
            let line = self.pending[..term].to_vec();
            self.pending.drain(..=consumed_through);

            if let Some(sample) = Self::parse_line(&line) {
                samples.push(sample);
            }
        }

        samples
    }

    fn parse_line(line: &[u8]) -> Option<u8> {
        let text = std::str::from_utf8(line).ok()?.trim();
        if text.is_empty() {
            return None;
        }
        let value: u32 = text.parse().ok()?;
        u8::try_from(value).ok()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_lf_terminated_lines() {
        let mut framer = LineFramer::new();
        assert_eq!(framer.feed(b"1\n2\n3\n"), vec![1, 2, 3]);
    }

    #[test]
    fn parses_crlf_terminated_lines() {
        let mut framer = LineFramer::new();
        assert_eq!(framer.feed(b"10\r\n20\r\n"), vec![10, 20]);
    }

    #[test]
    fn splits_arbitrarily_across_feeds() {
        let mut framer = LineFramer::new();
        assert_eq!(framer.feed(b"1"), Vec::<u8>::new());
        assert_eq!(framer.feed(b"23\n4"), vec![123]);
        assert_eq!(framer.feed(b"5\n"), vec![45]);
    }

    #[test]
    fn skips_malformed_lines_silently() {
        let mut framer = LineFramer::new();
        assert_eq!(framer.feed(b"abc\n256\n-1\n5\n"), vec![5]);
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let mut framer = LineFramer::new();
        assert_eq!(framer.feed(b"  42  \n"), vec![42]);
    }

    #[test]
    fn parses_bare_cr_terminated_lines() {
        let mut framer = LineFramer::new();
        assert_eq!(framer.feed(b"7\r8\r9\r"), vec![7, 8, 9]);
    }

    #[test]
    fn mixed_terminators_all_parse() {
        let mut framer = LineFramer::new();
        assert_eq!(framer.feed(b"1\r2\n3\r\n4"), vec![1, 2, 3]);
        assert_eq!(framer.feed(b"\r"), vec![4]);
    }
}
