use chrono::Utc;
use rand::Rng;

/// Captions longer than this after sanitization fall back to no caption.
pub const MAX_CAPTION_LEN: usize = 50;

/// Reduces a raw caption to the form the image service accepts: trimmed,
/// alphanumeric-plus-space only, spaces encoded as `%20`. Returns `None` when
/// nothing usable remains or the encoded text exceeds [`MAX_CAPTION_LEN`].
pub fn sanitize_caption(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect();
    let encoded = cleaned.replace(' ', "%20");
    if encoded.is_empty() || encoded.len() > MAX_CAPTION_LEN {
        None
    } else {
        Some(encoded)
    }
}

/// Monotonic source of cache-busting tokens so repeated slots never reuse a
/// cached image. Seeded from wall-clock millis plus jitter in production;
/// tests inject a fixed seed.
#[derive(Debug)]
pub struct TokenSource {
    next: u64,
}

impl TokenSource {
    pub fn new() -> Self {
        let millis = Utc::now().timestamp_millis().max(0) as u64;
        Self {
            next: millis + rand::rng().random_range(0..1_000),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self { next: seed }
    }

    pub fn next_token(&mut self) -> u64 {
        let token = self.next;
        self.next += 1;
        token
    }
}

impl Default for TokenSource {
    fn default() -> Self {
        Self::new()
    }
}

/// The ordered image URLs for one slideshow session, plus the raw caption
/// that produced them. Construction is pure; no network I/O happens here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlPlan {
    pub caption: String,
    pub urls: Vec<String>,
}

impl UrlPlan {
    pub fn build(
        endpoint: &str,
        width: u32,
        height: u32,
        total_images: u32,
        caption: &str,
        tokens: &mut TokenSource,
    ) -> Self {
        let base = match sanitize_caption(caption) {
            Some(text) => format!("{endpoint}/cat/says/{text}"),
            None => format!("{endpoint}/cat"),
        };
        let urls = (0..total_images)
            .map(|_| {
                format!(
                    "{base}?width={width}&height={height}&r={}",
                    tokens.next_token()
                )
            })
            .collect();
        Self {
            caption: caption.to_string(),
            urls,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_punctuation_and_encodes_spaces() {
        assert_eq!(
            sanitize_caption("hello world!!").as_deref(),
            Some("hello%20world")
        );
    }

    #[test]
    fn trims_before_sanitizing() {
        assert_eq!(sanitize_caption("  cat  ").as_deref(), Some("cat"));
    }

    #[test]
    fn rejects_captions_with_nothing_usable() {
        assert_eq!(sanitize_caption(""), None);
        assert_eq!(sanitize_caption("   "), None);
        assert_eq!(sanitize_caption("!!!???"), None);
    }

    #[test]
    fn rejects_overlong_captions_after_encoding() {
        // 26 chars separated by spaces encodes past the 50-char cap.
        let raw = "a b c d e f g h i j k l m n o p q r s t u v w x y z";
        assert_eq!(sanitize_caption(raw), None);
        assert!(sanitize_caption("a".repeat(50).as_str()).is_some());
        assert_eq!(sanitize_caption("a".repeat(51).as_str()), None);
    }

    #[test]
    fn plan_embeds_caption_and_unique_tokens() {
        let mut tokens = TokenSource::with_seed(100);
        let plan = UrlPlan::build("https://cataas.com", 400, 400, 3, "hi cat", &mut tokens);

        assert_eq!(plan.caption, "hi cat");
        assert_eq!(
            plan.urls,
            vec![
                "https://cataas.com/cat/says/hi%20cat?width=400&height=400&r=100",
                "https://cataas.com/cat/says/hi%20cat?width=400&height=400&r=101",
                "https://cataas.com/cat/says/hi%20cat?width=400&height=400&r=102",
            ]
        );
    }

    #[test]
    fn plan_without_caption_uses_plain_base() {
        let mut tokens = TokenSource::with_seed(7);
        let plan = UrlPlan::build("https://cataas.com", 320, 240, 1, "", &mut tokens);
        assert_eq!(
            plan.urls,
            vec!["https://cataas.com/cat?width=320&height=240&r=7"]
        );
    }

    #[test]
    fn unsanitizable_caption_falls_back_to_plain_base() {
        let mut tokens = TokenSource::with_seed(1);
        let plan = UrlPlan::build("https://cataas.com", 400, 400, 1, "!!!", &mut tokens);
        assert!(plan.urls[0].starts_with("https://cataas.com/cat?"));
        // The raw caption is still carried for the history record.
        assert_eq!(plan.caption, "!!!");
    }

    #[test]
    fn tokens_are_monotonic() {
        let mut tokens = TokenSource::new();
        let a = tokens.next_token();
        let b = tokens.next_token();
        assert!(b > a);
    }
}
