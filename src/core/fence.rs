//! Removes the markdown code fence a model may wrap around a JSON reply.
//!
//! This is text surgery only. The result is not parsed or validated, and a
//! fence marker inside the payload itself is not recognized as such.

const FENCE: &str = "```";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FenceState<'a> {
    AwaitingOpenFence(&'a str),
    InBody(&'a str),
    Done(&'a str),
}

impl<'a> FenceState<'a> {
    fn step(self) -> Self {
        match self {
            FenceState::AwaitingOpenFence(text) => {
                if !text.starts_with(FENCE) {
                    return FenceState::Done(text);
                }
                // Drop the opening fence line, language tag included.
                let body = match text.find('\n') {
                    Some(pos) => &text[pos + 1..],
                    None => &text[FENCE.len()..],
                };
                FenceState::InBody(body)
            }
            FenceState::InBody(body) => {
                let body = match body.strip_suffix(FENCE) {
                    Some(rest) => rest.strip_suffix('\n').unwrap_or(rest),
                    None => body,
                };
                FenceState::Done(body.trim())
            }
            done @ FenceState::Done(_) => done,
        }
    }
}

/// Returns `raw` with an enclosing triple-backtick fence removed.
///
/// Text that does not start with a fence is returned unchanged, untrimmed.
pub fn strip_code_fence(raw: &str) -> &str {
    let mut state = FenceState::AwaitingOpenFence(raw);
    loop {
        match state.step() {
            FenceState::Done(text) => return text,
            next => state = next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_fence_is_removed() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn test_unfenced_text_is_unchanged() {
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1}\n"), "  {\"a\":1}\n");
    }

    #[test]
    fn test_missing_closing_fence_only_strips_opening() {
        assert_eq!(strip_code_fence("```\n{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn test_fence_without_line_break_drops_three_chars() {
        assert_eq!(strip_code_fence("```{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```"), "");
    }

    #[test]
    fn test_multiline_body_and_crlf() {
        let raw = "```json\r\n{\r\n  \"NIK\": \"3171\",\r\n  \"Name\": \"BUDI\"\r\n}\r\n```";
        assert_eq!(
            strip_code_fence(raw),
            "{\r\n  \"NIK\": \"3171\",\r\n  \"Name\": \"BUDI\"\r\n}"
        );
    }

    #[test]
    fn test_closing_fence_without_line_break() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}```"), "{\"a\":1}");
    }

    #[test]
    fn test_surrounding_whitespace_trimmed_inside_fence() {
        assert_eq!(strip_code_fence("```json\n\n  {\"a\":1}  \n\n```"), "{\"a\":1}");
    }

    #[test]
    fn test_backticks_inside_payload_are_kept_when_not_at_end() {
        let raw = "```json\n{\"code\":\"```x```\",\"b\":2}\n```";
        assert_eq!(strip_code_fence(raw), "{\"code\":\"```x```\",\"b\":2}");
    }
}
