//! Ordered three-way diff between an incoming and a stored collection.

use std::cmp::Ordering;

/// Reconcile `stored` against `incoming`.
///
/// `incoming` is sorted once by `cmp`; each stored element is then looked up
/// by binary search. A match calls `update(incoming, stored)` and consumes the
/// incoming element; a miss calls `delete(stored)`. Whatever incoming elements
/// remain are passed to `add`, in sorted order.
///
/// Apart from the initial sort, runs in O(S log I + I). Matched elements are
/// taken out of their slot rather than removed, so nothing is shifted.
/// Duplicate incoming keys are not detected: one of them matches, the others
/// are added.
pub fn reconcile<T, C, A, U, D>(
    mut incoming: Vec<T>,
    stored: Vec<T>,
    mut cmp: C,
    mut add: A,
    mut update: U,
    mut delete: D,
) where
    C: FnMut(&T, &T) -> Ordering,
    A: FnMut(T),
    U: FnMut(T, T),
    D: FnMut(T),
{
    incoming.sort_by(&mut cmp);

    let mut taken = vec![false; incoming.len()];
    let matches: Vec<(Option<usize>, T)> = stored
        .into_iter()
        .map(|existing| {
            let pos = free_match(&incoming, &taken, &existing, &mut cmp);
            if let Some(pos) = pos {
                taken[pos] = true;
            }
            (pos, existing)
        })
        .collect();

    let mut slots: Vec<Option<T>> = incoming.into_iter().map(Some).collect();
    for (pos, existing) in matches {
        match pos.and_then(|pos| slots[pos].take()) {
            Some(item) => update(item, existing),
            None => delete(existing),
        }
    }

    slots.into_iter().flatten().for_each(&mut add);
}

/// First untaken element of sorted `incoming` equal to `key`.
fn free_match<T, C>(incoming: &[T], taken: &[bool], key: &T, cmp: &mut C) -> Option<usize>
where
    C: FnMut(&T, &T) -> Ordering,
{
    let start = incoming.partition_point(|item| cmp(item, key) == Ordering::Less);
    incoming[start..]
        .iter()
        .take_while(|item| cmp(item, key) == Ordering::Equal)
        .zip(&taken[start..])
        .position(|(_, used)| !used)
        .map(|offset| start + offset)
}
