//! Character-overlap similarity.
//!
//! The metric counts characters shared by both strings: find the longest
//! common substring, then recurse into the pieces left and right of it.
//! Unlike edit distance it rewards partial and rearranged overlaps, which is
//! what domain names and page titles look like next to a company name.

/// Number of characters shared by `a` and `b` under the recursive
/// longest-common-substring scheme.
///
/// Ties between equally long anchors resolve differently depending on
/// which string is scanned first, so both orders are scored and the
/// better one is kept. The result does not depend on argument order.
pub fn similar_chars(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    symmetric_common(&a, &b)
}

/// Similarity of `a` and `b` as a percentage of their combined length.
pub fn similarity_percent(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 0.0;
    }
    (symmetric_common(&a, &b) * 2) as f64 * 100.0 / total as f64
}

fn symmetric_common(a: &[char], b: &[char]) -> usize {
    common(a, b).max(common(b, a))
}

fn common(a: &[char], b: &[char]) -> usize {
    let Some((pos_a, pos_b, len)) = longest_common(a, b) else {
        return 0;
    };

    len + common(&a[..pos_a], &b[..pos_b]) + common(&a[pos_a + len..], &b[pos_b + len..])
}

/// First longest common substring as `(start_in_a, start_in_b, len)`.
fn longest_common(a: &[char], b: &[char]) -> Option<(usize, usize, usize)> {
    let mut best: Option<(usize, usize, usize)> = None;

    for i in 0..a.len() {
        for j in 0..b.len() {
            let len = a[i..]
                .iter()
                .zip(&b[j..])
                .take_while(|(x, y)| x == y)
                .count();
            if len > best.map_or(0, |(_, _, l)| l) {
                best = Some((i, j, len));
            }
        }
    }

    best
}
