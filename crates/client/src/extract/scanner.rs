//! Incremental, early-exit metadata scanning over a streamed body.

use super::{Field, PageMeta, find_ranked};

/// Streaming scanner that accumulates lines and resolves fields as they appear.
///
/// Scanning stops only when every field is settled from its preferred source
/// or `budget` bytes have been consumed. Tags after `</head>` still count.
#[derive(Debug)]
pub struct MetaScanner {
    buffer: String,
    partial: Vec<u8>,
    consumed: usize,
    budget: usize,
    found: [Option<(usize, String)>; 5],
}

impl MetaScanner {
    pub fn new(budget: usize) -> Self {
        Self {
            buffer: String::new(),
            partial: Vec::new(),
            consumed: 0,
            budget,
            found: Default::default(),
        }
    }

    /// Feed the next chunk of the body. Returns `true` once no more input is wanted.
    pub fn push(&mut self, chunk: &[u8]) -> bool {
        if self.is_done() {
            return true;
        }

        let take = chunk.len().min(self.budget - self.consumed);
        self.consumed += take;
        self.partial.extend_from_slice(&chunk[..take]);

        // newline bytes never sit inside a multi-byte UTF-8 sequence
        if let Some(pos) = self.partial.iter().rposition(|&b| b == b'\n') {
            let complete: Vec<u8> = self.partial.drain(..=pos).collect();
            self.scan(&String::from_utf8_lossy(&complete));
        }

        self.is_done()
    }

    fn budget_exhausted(&self) -> bool {
        self.consumed >= self.budget
    }

    fn settled(&self, field: Field) -> bool {
        matches!(self.found[field.index()], Some((0, _)))
    }

    /// Whether scanning has finished.
    pub fn is_done(&self) -> bool {
        self.budget_exhausted() || Field::ALL.iter().all(|&f| self.settled(f))
    }

    /// Bytes taken from the stream so far.
    pub fn bytes_consumed(&self) -> usize {
        self.consumed
    }

    fn scan(&mut self, text: &str) {
        self.buffer.push_str(text);
        let lowered = text.to_ascii_lowercase();

        for field in Field::ALL {
            if self.settled(field) || !field.hints().iter().any(|hint| lowered.contains(hint)) {
                continue;
            }
            self.resolve(field);
        }
    }

    fn resolve(&mut self, field: Field) {
        let Some((rank, value)) = find_ranked(&self.buffer, field) else {
            return;
        };
        let slot = &mut self.found[field.index()];
        if slot.as_ref().is_none_or(|(current, _)| rank < *current) {
            *slot = Some((rank, value));
        }
    }

    /// Flush the trailing partial line and return what was found.
    pub fn finish(mut self) -> PageMeta {
        if !self.partial.is_empty() {
            let rest = std::mem::take(&mut self.partial);
            self.scan(&String::from_utf8_lossy(&rest));
        }

        // catch tags whose hint landed on a different line than the tag end
        for field in Field::ALL {
            if !self.settled(field) {
                self.resolve(field);
            }
        }

        let mut meta = PageMeta::default();
        for field in Field::ALL {
            if let Some((_, value)) = self.found[field.index()].take() {
                meta.set(field, value);
            }
        }
        meta
    }
}
