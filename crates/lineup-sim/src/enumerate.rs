// Exhaustive lineup enumeration.
//
// Two nested stages: every 9-player subset of the roster in lexicographic
// order, then every batting order of that subset by in-place swapping.
// Visitors return `ControlFlow::Break` to stop; the break unwinds both
// stages and nothing else is visited.

use std::ops::ControlFlow;

use crate::error::RosterError;
use crate::lineup::Lineup;
use crate::player::LINEUP_SIZE;

/// Orderings of a single 9-player subset (9!).
pub const ORDERINGS_PER_SUBSET: u128 = 362_880;

/// Number of distinct ordered lineups from a roster of `roster_size`.
/// Saturates at `u128::MAX`.
pub fn lineup_count(roster_size: usize) -> u128 {
    binomial(roster_size, LINEUP_SIZE).saturating_mul(ORDERINGS_PER_SUBSET)
}

fn binomial(n: usize, k: usize) -> u128 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut acc = 1u128;
    for i in 0..k {
        match acc.checked_mul((n - i) as u128) {
            Some(product) => acc = product / (i + 1) as u128,
            None => return u128::MAX,
        }
    }
    acc
}

// ---------------------------------------------------------------------------
// Combinations
// ---------------------------------------------------------------------------

/// Visit every size-`k` subset of `0..n` in lexicographic order.
pub fn for_each_combination<F>(n: usize, k: usize, mut visit: F) -> ControlFlow<()>
where
    F: FnMut(&[usize]) -> ControlFlow<()>,
{
    if k > n {
        return ControlFlow::Continue(());
    }
    let mut chosen = vec![0; k];
    combine(n, 0, 0, &mut chosen, &mut visit)
}

fn combine<F>(n: usize, depth: usize, start: usize, chosen: &mut [usize], visit: &mut F) -> ControlFlow<()>
where
    F: FnMut(&[usize]) -> ControlFlow<()>,
{
    let k = chosen.len();
    if depth == k {
        return visit(chosen);
    }
    // Leave room for the slots still to fill.
    for s in start..=n - (k - depth) {
        chosen[depth] = s;
        combine(n, depth + 1, s + 1, chosen, visit)?;
    }
    ControlFlow::Continue(())
}

// ---------------------------------------------------------------------------
// Permutations
// ---------------------------------------------------------------------------

/// Visit every ordering of `items` by recursive swapping. `items` is back in
/// its original order when this returns, whether or not it stopped early.
pub fn for_each_permutation<F>(items: &mut [usize], mut visit: F) -> ControlFlow<()>
where
    F: FnMut(&[usize]) -> ControlFlow<()>,
{
    permute(items, 0, &mut visit)
}

fn permute<F>(items: &mut [usize], i: usize, visit: &mut F) -> ControlFlow<()>
where
    F: FnMut(&[usize]) -> ControlFlow<()>,
{
    if i == items.len() {
        return visit(items);
    }
    for j in i..items.len() {
        items.swap(i, j);
        let flow = permute(items, i + 1, visit);
        items.swap(i, j);
        flow?;
    }
    ControlFlow::Continue(())
}

// ---------------------------------------------------------------------------
// Lineups
// ---------------------------------------------------------------------------

/// Visit every ordered lineup from a roster of `roster_size` players.
///
/// Fails up front, before any visit, when the roster cannot fill a lineup.
/// Returns `ControlFlow::Break` when the visitor stopped the enumeration.
pub fn for_each_lineup<F>(roster_size: usize, mut visit: F) -> Result<ControlFlow<()>, RosterError>
where
    F: FnMut(Lineup) -> ControlFlow<()>,
{
    if roster_size < LINEUP_SIZE {
        return Err(RosterError::TooFewPlayers {
            have: roster_size,
            need: LINEUP_SIZE,
        });
    }

    let flow = for_each_combination(roster_size, LINEUP_SIZE, |subset| {
        let mut order = [0usize; LINEUP_SIZE];
        order.copy_from_slice(subset);
        for_each_permutation(&mut order, |perm| {
            let mut slots = [0usize; LINEUP_SIZE];
            slots.copy_from_slice(perm);
            visit(Lineup::from_distinct(slots))
        })
    });
    Ok(flow)
}
