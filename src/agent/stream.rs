//! Incremental rendering of a finished reply.

use std::time::Duration;

use futures::Stream;

/// Successive prefixes of `text`, growing one character at a time.
///
/// Yields exactly one item per character; the last item is `text` itself.
pub fn prefixes(text: &str) -> impl Iterator<Item = &str> + '_ {
    text.char_indices().map(move |(i, c)| &text[..i + c.len_utf8()])
}

/// Stream the prefixes of `text`, pausing `delay` before each one after the first.
pub fn prefix_stream(text: String, delay: Duration) -> impl Stream<Item = String> + Send + 'static {
    async_stream::stream! {
        for (i, prefix) in prefixes(&text).enumerate() {
            if i > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            yield prefix.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn prefixes_grow_to_full_text() {
        let items: Vec<&str> = prefixes("héllo").collect();
        assert_eq!(items, ["h", "hé", "hél", "héll", "héllo"]);
    }

    #[test]
    fn empty_text_has_no_prefixes() {
        assert_eq!(prefixes("").count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stream_yields_each_prefix() {
        let items: Vec<String> = prefix_stream("abc".into(), Duration::from_millis(30))
            .collect()
            .await;
        assert_eq!(items, ["a", "ab", "abc"]);
    }
}
