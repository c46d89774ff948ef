mod gemini;
mod gemini_types;
mod http_client;
mod traits;

pub use gemini::GeminiProvider;
pub use http_client::{PROVIDER_TIMEOUT_SECS, build_provider_client};
pub use traits::{MessageRole, Provider, ProviderMessage};

/// Scrub API keys out of upstream error text before it reaches logs.
///
/// Gemini puts the key in a `key=` query parameter, which the API happily
/// echoes back in some error payloads.
pub fn sanitize_api_error(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find("key=") {
        let (head, tail) = rest.split_at(idx);
        out.push_str(head);
        out.push_str("key=REDACTED");
        let value_start = "key=".len();
        let value_len = tail[value_start..]
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(tail.len() - value_start);
        rest = &tail[value_start + value_len..];
    }
    out.push_str(rest);
    out
}
