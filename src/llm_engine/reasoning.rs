//! Splitting `<think>...</think>` segments out of model output

use super::provider::StreamEvent;

/// Tag reasoning models wrap their chain of thought in
pub const REASONING_TAG: &str = "think";

/// Model output with the reasoning separated from the answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub reasoning: Option<String>,
}

/// Remove every complete `<tag>...</tag>` segment from `raw`.
///
/// Segments are joined with a newline in the reasoning channel. An opening tag
/// that is never closed is left in the text.
pub fn extract_reasoning(raw: &str, tag: &str) -> ExtractedText {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);

    let mut text = String::new();
    let mut segments = Vec::new();
    let mut rest = raw;

    while let Some(start) = rest.find(&open) {
        let inner = &rest[start + open.len()..];
        let Some(end) = inner.find(&close) else {
            break;
        };
        text.push_str(&rest[..start]);
        segments.push(inner[..end].trim());
        rest = &inner[end + close.len()..];
    }

    if segments.is_empty() {
        return ExtractedText {
            text: raw.to_string(),
            reasoning: None,
        };
    }

    text.push_str(rest);
    ExtractedText {
        text: text.trim().to_string(),
        reasoning: Some(segments.join("\n")),
    }
}

/// Incremental version of [`extract_reasoning`] for streamed output.
///
/// Tags may be split across chunks; a trailing fragment that could still turn
/// into a tag is held back until the next chunk or [`finish`](Self::finish).
#[derive(Debug)]
pub struct ReasoningExtractor {
    open: String,
    close: String,
    in_reasoning: bool,
    buffer: String,
    /// Everything emitted so far, split the same way as the events
    text: String,
    segments: Vec<String>,
}

impl ReasoningExtractor {
    pub fn new(tag: &str) -> Self {
        Self {
            open: format!("<{}>", tag),
            close: format!("</{}>", tag),
            in_reasoning: false,
            buffer: String::new(),
            text: String::new(),
            segments: Vec::new(),
        }
    }

    fn event(&mut self, text: &str) -> Option<StreamEvent> {
        if text.is_empty() {
            None
        } else if self.in_reasoning {
            if let Some(segment) = self.segments.last_mut() {
                segment.push_str(text);
            }
            Some(StreamEvent::Reasoning(text.to_string()))
        } else {
            self.text.push_str(text);
            Some(StreamEvent::Text(text.to_string()))
        }
    }

    /// Feed one raw delta, returning whatever can be emitted safely
    pub fn push(&mut self, delta: &str) -> Vec<StreamEvent> {
        self.buffer.push_str(delta);
        let mut events = Vec::new();

        loop {
            let tag = if self.in_reasoning { &self.close } else { &self.open };

            if let Some(idx) = self.buffer.find(tag.as_str()) {
                let tag_len = tag.len();
                let before: String = self.buffer.drain(..idx).collect();
                events.extend(self.event(&before));
                self.buffer.drain(..tag_len);
                self.in_reasoning = !self.in_reasoning;
                if self.in_reasoning {
                    self.segments.push(String::new());
                }
                continue;
            }

            // Hold back the longest suffix that is a prefix of the tag
            let held = (1..tag.len())
                .rev()
                .find(|&k| self.buffer.ends_with(&tag[..k]))
                .unwrap_or(0);
            let emit_len = self.buffer.len() - held;
            let ready: String = self.buffer.drain(..emit_len).collect();
            events.extend(self.event(&ready));
            break;
        }

        events
    }

    /// Flush held-back text at end of stream
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let rest = std::mem::take(&mut self.buffer);
        self.event(&rest).into_iter().collect()
    }

    /// The answer and reasoning exactly as emitted, shaped like [`extract_reasoning`].
    ///
    /// An unclosed segment counts as reasoning, matching what the events reported.
    pub fn extracted(&self) -> ExtractedText {
        if self.segments.is_empty() {
            return ExtractedText {
                text: self.text.clone(),
                reasoning: None,
            };
        }

        let segments: Vec<&str> = self.segments.iter().map(|s| s.trim()).collect();
        ExtractedText {
            text: self.text.trim().to_string(),
            reasoning: Some(segments.join("\n")),
        }
    }
}
