//! Ratcliff/Obershelp string similarity.

/// Similarity ratio `2*M/T` in `[0, 1]`, where `M` is the number of
/// characters in recursively matched longest common substrings and `T` the
/// total character count of both strings.
///
/// Two empty strings are identical (`1.0`).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let Some((ia, ib, len)) = longest_common_substring(a, b) else {
        return 0;
    };
    len + matching_chars(&a[..ia], &b[..ib]) + matching_chars(&a[ia + len..], &b[ib + len..])
}

/// Leftmost longest common substring as `(start_a, start_b, len)`.
fn longest_common_substring(a: &[char], b: &[char]) -> Option<(usize, usize, usize)> {
    if a.is_empty() || b.is_empty() {
        return None;
    }
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for i in 1..=a.len() {
        for j in 1..=b.len() {
            cur[j] = if a[i - 1] == b[j - 1] { prev[j - 1] + 1 } else { 0 };
            if cur[j] > best.2 {
                best = (i - cur[j], j - cur[j], cur[j]);
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    (best.2 > 0).then_some(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_and_disjoint() {
        assert!((ratio("electricity", "electricity") - 1.0).abs() < f64::EPSILON);
        assert!(ratio("abc", "xyz").abs() < f64::EPSILON);
        assert!((ratio("", "") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_match() {
        // "heat" matches 4 of 4 + 12 chars: 2*4/16
        let r = ratio("heat", "heat_central");
        assert!((r - 0.5).abs() < 1e-12);
        assert!(ratio("heat_bus", "heat_central") > ratio("heat_bus", "electricity"));
    }
}
