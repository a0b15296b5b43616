//! Accumulates a message as chunks arrive and re-segments the running text.

use super::{cache, ParsedMessage, SegmentCache};
use std::sync::Arc;

pub struct MessageStream {
    raw: String,
    cache: Option<Arc<SegmentCache>>,
}

impl MessageStream {
    /// Stream backed by the process-wide cache.
    pub fn new() -> Self {
        Self {
            raw: String::new(),
            cache: None,
        }
    }

    pub fn with_cache(cache: Arc<SegmentCache>) -> Self {
        Self {
            raw: String::new(),
            cache: Some(cache),
        }
    }

    /// Appends `chunk` and returns the segmentation of everything so far.
    pub fn push(&mut self, chunk: &str) -> ParsedMessage {
        self.raw.push_str(chunk);
        self.current()
    }

    pub fn current(&self) -> ParsedMessage {
        let cache = match &self.cache {
            Some(cache) => cache.as_ref(),
            None => cache::global(),
        };
        ParsedMessage::from_segments(cache.get_or_parse(&self.raw))
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl Default for MessageStream {
    fn default() -> Self {
        Self::new()
    }
}
