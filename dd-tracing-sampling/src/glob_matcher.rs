// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

/// Number of match results remembered per pattern
const MATCH_CACHE_SIZE: usize = 256;

/// A backtracking glob matcher for sampling-rule patterns.
///
/// The pattern language supports `*` (any run of characters, including the
/// empty one) and `?` (exactly one character); matching is case insensitive.
/// Results are memoized in an LRU cache since the same service and operation
/// names recur on virtually every trace.
pub struct GlobMatcher {
    /// The original glob pattern
    pattern: String,
    /// Lowercased pattern the matching runs against
    pattern_lower: String,
    /// Previously matched subjects and their results
    cache: Mutex<LruCache<String, bool>>,
}

impl fmt::Debug for GlobMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobMatcher")
            .field("pattern", &self.pattern)
            .finish()
    }
}

impl Clone for GlobMatcher {
    fn clone(&self) -> Self {
        // Each clone starts with an empty cache of its own
        GlobMatcher::new(&self.pattern)
    }
}

impl GlobMatcher {
    pub fn new(pattern: &str) -> Self {
        let cache_size = NonZeroUsize::new(MATCH_CACHE_SIZE).unwrap();
        GlobMatcher {
            pattern: pattern.to_string(),
            pattern_lower: pattern.to_lowercase(),
            cache: Mutex::new(LruCache::new(cache_size)),
        }
    }

    /// Returns the original pattern
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether `subject` matches the pattern, ignoring case.
    pub fn matches(&self, subject: &str) -> bool {
        let subject_lower = subject.to_lowercase();

        if let Some(&hit) = self.cache.lock().unwrap().get(&subject_lower) {
            return hit;
        }

        let matched = glob_match(self.pattern_lower.as_bytes(), subject_lower.as_bytes());
        self.cache.lock().unwrap().put(subject_lower, matched);
        matched
    }
}

/// Iterative glob match with single-star backtracking.
fn glob_match(pattern: &[u8], subject: &[u8]) -> bool {
    let mut p = 0;
    let mut s = 0;
    // Position to resume from when a match attempt past a `*` fails
    let mut star_p = None;
    let mut star_s = 0;

    while s < subject.len() {
        if p < pattern.len() && (pattern[p] == b'?' || pattern[p] == subject[s]) {
            p += 1;
            s += 1;
        } else if p < pattern.len() && pattern[p] == b'*' {
            // Tentatively let the star match nothing
            star_p = Some(p);
            star_s = s;
            p += 1;
        } else if let Some(sp) = star_p {
            // Backtrack: the star swallows one more subject character
            p = sp + 1;
            star_s += 1;
            s = star_s;
        } else {
            return false;
        }
    }

    // Only trailing stars may remain unconsumed
    while p < pattern.len() && pattern[p] == b'*' {
        p += 1;
    }
    p == pattern.len()
}
