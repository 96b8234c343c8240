//! Position-wise union of found bit strings and score vectors.
//!
//! Both operators treat a missing position as `'0'` / `0`, so operands of
//! different lengths are zero-extended at the tail. Each operator is
//! commutative, associative and idempotent, with the empty operand as
//! identity; folding members in any order gives one result.

/// OR of two `'0'`/`'1'` strings. Any character other than `'1'` reads as `'0'`.
#[must_use]
pub fn union_bits(a: &str, b: &str) -> String {
    if a.is_empty() {
        return b.to_string();
    }
    if b.is_empty() {
        return a.to_string();
    }
    let (a, b) = (a.as_bytes(), b.as_bytes());
    (0..a.len().max(b.len()))
        .map(|i| {
            let set = a.get(i) == Some(&b'1') || b.get(i) == Some(&b'1');
            if set { '1' } else { '0' }
        })
        .collect()
}

/// Max of two score vectors.
#[must_use]
pub fn union_scores(a: &[u32], b: &[u32]) -> Vec<u32> {
    if a.is_empty() {
        return b.to_vec();
    }
    if b.is_empty() {
        return a.to_vec();
    }
    (0..a.len().max(b.len()))
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0);
            let y = b.get(i).copied().unwrap_or(0);
            x.max(y)
        })
        .collect()
}

/// Number of unfound positions.
#[must_use]
pub fn count_missing(bits: &str) -> usize {
    bits.bytes().filter(|b| *b != b'1').count()
}

#[must_use]
pub fn count_found(bits: &str) -> usize {
    bits.bytes().filter(|b| *b == b'1').count()
}
