// Server-Sent Events decoding for streaming component responses

//! # SSE Accumulator
//!
//! Streaming endpoints answer either with SSE framing (`data: <json>` lines,
//! the convention of LLM chat APIs) or with plain chunked text. The
//! accumulator detects the framing heuristically: once any buffered content
//! starts with `data:` (or SSE text has already been captured) the stream is
//! treated as SSE for its remainder.
//!
//! For SSE streams, every complete `data: ` line except the literal
//! `data: [DONE]` terminator is parsed as JSON and a text fragment is
//! extracted by probing, in order: `choices[0].delta.content` (OpenAI
//! style), `content` (Anthropic style), `response` (Ollama style).
//! Fragments concatenate into the running text.

use serde_json::Value;
use tracing::debug;

/// Extract the delta text carried by one decoded SSE payload
///
/// Empty fragments are treated as absent so the next probe gets a chance.
fn extract_delta_text(json: &Value) -> Option<&str> {
    let probes = [
        json.pointer("/choices/0/delta/content"),
        json.get("content"),
        json.get("response"),
    ];
    probes
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .find(|text| !text.is_empty())
}

/// Incremental decoder for one streaming response
///
/// Feed raw chunks with [`push_chunk`](Self::push_chunk); partial lines stay
/// buffered until their terminating newline arrives in a later chunk.
#[derive(Debug, Default)]
pub struct SseAccumulator {
    buffer: String,
    text: String,
}

impl SseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the stream has been recognized as SSE-framed
    pub fn is_sse(&self) -> bool {
        !self.text.is_empty() || self.buffer.trim_start().starts_with("data:")
    }

    /// The full text accumulated so far
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Feed one raw chunk; returns `true` when new text was extracted
    ///
    /// Non-SSE content accumulates in the buffer without being consumed, so
    /// a stream whose `data:` prefix arrives split across chunks is still
    /// recognized.
    pub fn push_chunk(&mut self, chunk: &str) -> bool {
        self.buffer.push_str(chunk);
        if !self.is_sse() {
            return false;
        }

        let mut appended = false;
        while let Some(newline) = self.buffer.find('\n') {
            let line = self.buffer[..newline].trim().to_string();
            self.buffer.drain(..=newline);

            let payload = match line.strip_prefix("data: ") {
                Some(p) if p != "[DONE]" => p,
                _ => continue,
            };
            match serde_json::from_str::<Value>(payload) {
                Ok(json) => {
                    if let Some(fragment) = extract_delta_text(&json) {
                        self.text.push_str(fragment);
                        appended = true;
                    }
                }
                Err(e) => debug!("skipping undecodable SSE payload: {e}"),
            }
        }
        appended
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_delta_accumulation() {
        let mut acc = SseAccumulator::new();
        assert!(acc.push_chunk("data: {\"choices\":[{\"delta\":{\"content\":\"He\"}}]}\n"));
        assert_eq!(acc.text(), "He");
        assert!(acc.push_chunk("data: {\"choices\":[{\"delta\":{\"content\":\"llo\"}}]}\n"));
        assert_eq!(acc.text(), "Hello");
        assert!(!acc.push_chunk("data: [DONE]\n"));
        assert_eq!(acc.text(), "Hello");
    }

    #[test]
    fn test_line_split_across_chunks() {
        let mut acc = SseAccumulator::new();
        assert!(!acc.push_chunk("data: {\"content\":"));
        assert!(acc.push_chunk("\"partial\"}\n"));
        assert_eq!(acc.text(), "partial");
    }

    #[test]
    fn test_content_and_response_probes() {
        let mut acc = SseAccumulator::new();
        acc.push_chunk("data: {\"content\":\"a\"}\n");
        acc.push_chunk("data: {\"response\":\"b\"}\n");
        assert_eq!(acc.text(), "ab");
    }

    #[test]
    fn test_delta_probe_order() {
        // choices[0].delta.content wins over a sibling top-level content
        let mut acc = SseAccumulator::new();
        acc.push_chunk(
            "data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}],\"content\":\"ignored\"}\n",
        );
        assert_eq!(acc.text(), "x");
    }

    #[test]
    fn test_empty_delta_falls_through() {
        let mut acc = SseAccumulator::new();
        acc.push_chunk("data: {\"choices\":[{\"delta\":{\"content\":\"\"}}],\"response\":\"r\"}\n");
        assert_eq!(acc.text(), "r");
    }

    #[test]
    fn test_plain_text_never_becomes_sse() {
        let mut acc = SseAccumulator::new();
        assert!(!acc.push_chunk("hello "));
        assert!(!acc.push_chunk("world\n"));
        assert!(!acc.is_sse());
        assert_eq!(acc.text(), "");
    }

    #[test]
    fn test_undecodable_payload_skipped() {
        let mut acc = SseAccumulator::new();
        assert!(!acc.push_chunk("data: not-json\n"));
        assert!(acc.is_sse());
        assert!(acc.push_chunk("data: {\"content\":\"ok\"}\n"));
        assert_eq!(acc.text(), "ok");
    }
}
