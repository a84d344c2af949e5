/// Length of the longest common subsequence of `a` and `b`, counted in chars.
pub fn lcs_len(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    lcs_len_chars(&a, &b)
}

/// `2 * LCS / (len(a) + len(b))`, in `[0, 1]`.
///
/// Two empty strings are identical (`1.0`); one empty string shares nothing
/// with a non-empty one (`0.0`). Lengths are Unicode scalar values, so CJK
/// subtitles compare glyph by glyph rather than byte by byte.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    similarity_chars(&a, &b)
}

pub(crate) fn similarity_chars(a: &[char], b: &[char]) -> f64 {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return 1.0,
        (true, false) | (false, true) => return 0.0,
        (false, false) => {}
    }
    let common = lcs_len_chars(a, b);
    (2 * common) as f64 / (a.len() + b.len()) as f64
}

pub(crate) fn lcs_len_chars(a: &[char], b: &[char]) -> usize {
    // Rows span the shorter sequence.
    let (outer, inner) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    if inner.is_empty() {
        return 0;
    }

    let mut prev = vec![0usize; inner.len() + 1];
    let mut curr = vec![0usize; inner.len() + 1];
    for &outer_char in outer {
        for (j, &inner_char) in inner.iter().enumerate() {
            curr[j + 1] = if outer_char == inner_char {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[inner.len()]
}
