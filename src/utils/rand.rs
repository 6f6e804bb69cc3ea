//! Webhook secret generation and checks.

use rand::distributions::{Alphanumeric, DistString};

/// Telegram accepts secret tokens of 1 to 256 characters.
pub const MAX_SECRET_TOKEN_LEN: usize = 256;

/// Generates a random alphanumeric string of the specified length.
#[must_use]
pub fn gen_rand_str(len: usize) -> String {
    Alphanumeric.sample_string(&mut rand::thread_rng(), len)
}

/// Whether `token` is usable as `secret_token` in `setWebhook`
/// (`A-Z`, `a-z`, `0-9`, `_` and `-` only).
#[must_use]
pub fn is_valid_secret_token(token: &str) -> bool {
    (1..=MAX_SECRET_TOKEN_LEN).contains(&token.len())
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_gen_rand_str_length() {
        assert!(gen_rand_str(0).is_empty());
        assert_eq!(gen_rand_str(32).len(), 32);
    }

    #[test]
    fn test_gen_rand_str_is_valid_secret() {
        for _ in 0..20 {
            assert!(is_valid_secret_token(&gen_rand_str(32)));
        }
    }

    #[test]
    fn test_gen_rand_str_uniqueness_multiple() {
        let set: HashSet<String> = (0..100).map(|_| gen_rand_str(16)).collect();
        assert_eq!(set.len(), 100);
    }

    #[test]
    fn test_secret_token_allows_dash_and_underscore() {
        assert!(is_valid_secret_token("abc_DEF-123"));
    }

    #[test]
    fn test_secret_token_rejects_bad_input() {
        assert!(!is_valid_secret_token(""));
        assert!(!is_valid_secret_token("has space"));
        assert!(!is_valid_secret_token("sırr"));
        assert!(!is_valid_secret_token(&"a".repeat(MAX_SECRET_TOKEN_LEN + 1)));
    }
}
