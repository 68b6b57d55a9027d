use std::cmp::Ordering;

/// Natural ("alphanumeric") string ordering: runs of ASCII digits compare by numeric value,
/// everything else compares by character. `Shape_9` sorts before `Shape_10`.
///
/// Ties between numerically equal runs with different zero padding are broken by run length,
/// then the whole strings are compared bytewise so the order stays total.
pub fn alphanumeric_cmp(a: &str, b: &str) -> Ordering {
    let (ab, bb) = (a.as_bytes(), b.as_bytes());
    let (mut i, mut j) = (0usize, 0usize);

    while i < ab.len() && j < bb.len() {
        let (ca, cb) = (ab[i], bb[j]);
        if ca.is_ascii_digit() && cb.is_ascii_digit() {
            let si = i;
            while i < ab.len() && ab[i].is_ascii_digit() {
                i += 1;
            }
            let sj = j;
            while j < bb.len() && bb[j].is_ascii_digit() {
                j += 1;
            }
            let ord = cmp_digit_runs(&ab[si..i], &bb[sj..j]);
            if ord != Ordering::Equal {
                return ord;
            }
        } else {
            if ca != cb {
                return ca.cmp(&cb);
            }
            i += 1;
            j += 1;
        }
    }

    (ab.len() - i)
        .cmp(&(bb.len() - j))
        .then_with(|| ab.cmp(bb))
}

fn cmp_digit_runs(a: &[u8], b: &[u8]) -> Ordering {
    let trim = |s: &[u8]| -> usize { s.iter().take_while(|&&c| c == b'0').count() };
    let (a_sig, b_sig) = (&a[trim(a)..], &b[trim(b)..]);
    a_sig
        .len()
        .cmp(&b_sig.len())
        .then_with(|| a_sig.cmp(b_sig))
        .then_with(|| a.len().cmp(&b.len()))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/sort.rs"]
mod tests;
