//! Selection of the PINs used to cover a payment amount
//!
//! Candidates are ordered by ascending balance and accumulated greedily. When the greedy pass needs
//! more PINs than a payment form accepts, every combination of up to [MAX_PINS_PER_PAYMENT] PINs is
//! searched for the smallest total that still covers the amount.

use log::debug;

use crate::MAX_PINS_PER_PAYMENT;

/// Returns at most [MAX_PINS_PER_PAYMENT] `(pin, balance)` pairs whose balances sum to at least
/// `amount`, or an empty vector when no such set exists or `amount` is zero. PINs with nothing left
/// on them are never chosen.
///
/// Callers are expected to pass only unlocked PINs.
pub fn find_pins_for_amount(amount: u64, candidates: &[(String, u64)]) -> Vec<(String, u64)> {
    if amount == 0 {
        return vec![];
    }

    let mut sorted: Vec<(String, u64)> = candidates
        .iter()
        .filter(|(_, balance)| *balance > 0)
        .cloned()
        .collect();
    sorted.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

    let mut greedy = vec![];
    let mut total: u64 = 0;
    for (pin, balance) in &sorted {
        if total >= amount {
            break;
        }
        greedy.push((pin.clone(), *balance));
        total = total.saturating_add(*balance);
    }

    if total < amount {
        debug!("Available balance {total} does not cover {amount}");
        return vec![];
    }
    if greedy.len() <= MAX_PINS_PER_PAYMENT {
        return greedy;
    }

    debug!(
        "Greedy selection needs {} PINs, searching combinations of up to {MAX_PINS_PER_PAYMENT}",
        greedy.len()
    );
    match best_combination(amount, &sorted) {
        Some(indices) => indices.into_iter().map(|i| sorted[i].clone()).collect(),
        None => vec![],
    }
}

/// Exhaustive search over index combinations of size 1 through [MAX_PINS_PER_PAYMENT]. The first
/// combination reaching the smallest covering total wins.
fn best_combination(amount: u64, sorted: &[(String, u64)]) -> Option<Vec<usize>> {
    let n = sorted.len();
    let mut best: Option<(u64, Vec<usize>)> = None;

    for r in 1..=MAX_PINS_PER_PAYMENT.min(n) {
        let mut indices: Vec<usize> = (0..r).collect();
        loop {
            let total = indices
                .iter()
                .fold(0u64, |acc, i| acc.saturating_add(sorted[*i].1));
            if total >= amount && best.as_ref().map_or(true, |(t, _)| total < *t) {
                best = Some((total, indices.clone()));
            }
            if !next_combination(&mut indices, n) {
                break;
            }
        }
    }

    best.map(|(_, indices)| indices)
}

/// Advances `indices` to the next combination in lexicographic order. Returns false once the last
/// combination has been visited.
fn next_combination(indices: &mut [usize], n: usize) -> bool {
    let r = indices.len();
    let mut i = r;
    while i > 0 {
        i -= 1;
        if indices[i] < n - r + i {
            indices[i] += 1;
            for j in i + 1..r {
                indices[j] = indices[j - 1] + 1;
            }
            return true;
        }
    }
    false
}

#[test]
fn next_combination_visits_all() {
    let mut indices = vec![0, 1];
    let mut count = 1;
    while next_combination(&mut indices, 4) {
        count += 1;
    }
    assert_eq!(count, 6);
    assert_eq!(indices, vec![2, 3]);
}
