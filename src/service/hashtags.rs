//! Hashtag extraction

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HASHTAG: Regex = Regex::new(r"#([A-Za-z0-9_]+)").expect("hashtag pattern is valid");
}

/// Extract hashtags from `text`, in order of appearance
///
/// A hashtag is `#` followed by one or more ASCII word characters. The
/// leading `#` is stripped; case and duplicates are kept.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    HASHTAG
        .captures_iter(text)
        .map(|captures| captures[1].to_string())
        .collect()
}
