//! Literal, global replacement of resource references with their payloads.

use crate::{Error, Result};
use aho_corasick::{AhoCorasick, MatchKind};

/// Replace every literal occurrence of each `(reference, payload)` pair.
///
/// References are plain strings, never patterns. The text is walked once from
/// left to right: at each step the earliest occurrence of any reference wins,
/// the longest reference on ties, and inserted payloads are not rescanned.
/// Empty references are ignored.
pub fn replace_literal<K, V>(text: &str, pairs: &[(K, V)]) -> Result<String>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let (references, payloads): (Vec<&str>, Vec<&str>) = pairs
        .iter()
        .map(|(k, v)| (k.as_ref(), v.as_ref()))
        .filter(|(k, _)| !k.is_empty())
        .unzip();
    if references.is_empty() {
        return Ok(text.to_string());
    }

    let matcher = AhoCorasick::builder()
        .match_kind(MatchKind::LeftmostLongest)
        .build(&references)
        .map_err(|e| Error::Substitution(format!("cannot build reference matcher: {}", e)))?;
    Ok(matcher.replace_all(text, &payloads))
}
