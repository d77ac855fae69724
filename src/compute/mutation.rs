//! Placement of mutant offspring into empty slots.
//!
//! Every mutant founds a new lineage in a slot that was empty at the start of
//! the step. When there are more mutants than empty slots, the mutants that
//! get placed are picked uniformly at random and the rest are dropped.

use rand::Rng;
use rand::seq::index;

use crate::schema::TraitBounds;

use super::mutate_trait;

/// Outcome of one round of mutant placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Placement {
    /// New lineages founded.
    pub founders: u64,
    /// Mutants discarded for lack of empty slots.
    pub dropped: u64,
}

/// Reusable buffers for mutant placement.
#[derive(Debug, Default)]
pub struct MutationScratch {
    /// `(slot, cumulative mutant count)` for every slot that produced mutants.
    parents: Vec<(usize, u64)>,
    chosen: Vec<usize>,
    vacancies: Vec<usize>,
}

impl MutationScratch {
    pub fn with_capacity(slots: usize) -> Self {
        Self {
            parents: Vec::with_capacity(slots),
            chosen: Vec::with_capacity(slots),
            vacancies: Vec::with_capacity(slots),
        }
    }
}

/// Slot arrays read and written while placing mutants.
pub struct MutationBuffers<'a> {
    /// Counts at the start of the step.
    pub counts: &'a [u64],
    /// Traits at the start of the step.
    pub traits: &'a [f64],
    /// Mutants produced by each slot this step.
    pub mutants: &'a [u64],
    /// Counts after birth and death, adjusted in place.
    pub next_counts: &'a mut [u64],
    /// Traits after the step, written for founded slots.
    pub next_traits: &'a mut [f64],
}

/// Assign mutants to the slots that were empty at the start of the step.
///
/// Parents are listed grouped by slot index, one entry per mutant. Empty slots
/// are filled in index order, pairing each with the next parent in the list.
/// The founder gets a count of 1 and a mutated copy of its parent's trait; the
/// parent's count loses that individual.
///
/// The parent list is kept as cumulative counts per slot, so only the parents
/// that actually found a lineage are materialized.
pub fn place_mutants<R: Rng + ?Sized>(
    buffers: MutationBuffers<'_>,
    mutation_effect: f64,
    bounds: TraitBounds,
    scratch: &mut MutationScratch,
    rng: &mut R,
) -> Placement {
    let MutationBuffers {
        counts,
        traits,
        mutants,
        next_counts,
        next_traits,
    } = buffers;

    scratch.parents.clear();
    let mut total = 0u64;
    for (slot, &n) in mutants.iter().enumerate() {
        if n > 0 {
            total = total.saturating_add(n);
            scratch.parents.push((slot, total));
        }
    }
    if total == 0 {
        return Placement::default();
    }

    scratch.vacancies.clear();
    scratch
        .vacancies
        .extend(counts.iter().enumerate().filter(|&(_, &n)| n == 0).map(|(i, _)| i));
    let open = scratch.vacancies.len();

    scratch.chosen.clear();
    if total > open as u64 {
        let length = usize::try_from(total).unwrap_or(usize::MAX);
        scratch.chosen.extend(
            index::sample(rng, length, open)
                .into_iter()
                .map(|i| parent_of(&scratch.parents, i as u64)),
        );
    } else {
        let mut start = 0u64;
        for &(slot, end) in &scratch.parents {
            scratch
                .chosen
                .extend(std::iter::repeat_n(slot, (end - start) as usize));
            start = end;
        }
    }

    for (&parent, &slot) in scratch.chosen.iter().zip(&scratch.vacancies) {
        next_traits[slot] = mutate_trait(traits[parent], mutation_effect, bounds, rng);
        next_counts[slot] = 1;
        // The parent produced at least this many births, so its count stays positive.
        next_counts[parent] -= 1;
    }

    let founders = scratch.chosen.len() as u64;
    Placement {
        founders,
        dropped: total - founders,
    }
}

/// Slot of the parent at position `index` of the grouped parent list.
fn parent_of(parents: &[(usize, u64)], index: u64) -> usize {
    let pos = parents.partition_point(|&(_, end)| end <= index);
    parents[pos].0
}
