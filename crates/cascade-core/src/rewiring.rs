//! Tie Adjuster
//!
//! Couples behavioral correctness to topology. Each timestep one active
//! individual is picked; if it acted incorrectly it stops observing one of the
//! active neighbors that misled it, and a random individual observes someone
//! new in exchange. All selections are uniform, and any selection from an
//! empty candidate set leaves the network untouched.

use rand::seq::{IteratorRandom, SliceRandom};
use rand::Rng;

use crate::config::RewiringPolicy;
use crate::network::Network;
use crate::SimRng;

/// What the break phase did this timestep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieAdjustment {
    /// Nobody was active
    NoActive,
    /// The picked individual behaved correctly
    AdjusterCorrect { adjuster: usize },
    /// The picked individual was wrong but observed no active neighbor
    NoActiveNeighbor { adjuster: usize },
    /// The tie `adjuster -> neighbor` was removed
    Broken { adjuster: usize, neighbor: usize },
}

impl TieAdjustment {
    pub fn broke_tie(&self) -> bool {
        matches!(self, TieAdjustment::Broken { .. })
    }
}

/// What the formation phase did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TieFormation {
    pub former: usize,
    /// `None` when the former already observes everyone
    pub target: Option<usize>,
}

/// Combined report for one timestep of rewiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rewiring {
    pub adjustment: TieAdjustment,
    pub formation: Option<TieFormation>,
}

impl Rewiring {
    pub fn tie_formed(&self) -> bool {
        self.formation.is_some_and(|f| f.target.is_some())
    }
}

/// Picks an active individual and, if it was wrong, removes its tie to one
/// uniformly chosen active neighbor.
pub fn break_tie(
    network: &mut Network,
    states: &[bool],
    correct_behavior: &[bool],
    rng: &mut SimRng,
) -> TieAdjustment {
    let actives: Vec<usize> = (0..states.len()).filter(|&i| states[i]).collect();
    let Some(&adjuster) = actives.choose(rng) else {
        return TieAdjustment::NoActive;
    };
    if correct_behavior[adjuster] {
        return TieAdjustment::AdjusterCorrect { adjuster };
    }

    let misleading: Vec<usize> = network.neighbors(adjuster).filter(|&j| states[j]).collect();
    let Some(&neighbor) = misleading.choose(rng) else {
        return TieAdjustment::NoActiveNeighbor { adjuster };
    };
    network.remove_tie(adjuster, neighbor);
    TieAdjustment::Broken { adjuster, neighbor }
}

/// A uniformly chosen individual observes a uniformly chosen individual it
/// does not yet observe.
pub fn form_tie(network: &mut Network, rng: &mut SimRng) -> TieFormation {
    let former = rng.gen_range(0..network.size());
    let target = network.non_neighbors(former).choose(rng);
    if let Some(target) = target {
        network.add_tie(former, target);
    }
    TieFormation { former, target }
}

/// Break phase followed by a formation only when a tie was actually broken,
/// so the number of ties never changes.
pub fn adjust_tie(
    network: &mut Network,
    states: &[bool],
    correct_behavior: &[bool],
    rng: &mut SimRng,
) -> Rewiring {
    let adjustment = break_tie(network, states, correct_behavior, rng);
    let formation = if adjustment.broke_tie() {
        Some(form_tie(network, rng))
    } else {
        None
    };
    if let TieAdjustment::Broken { adjuster, neighbor } = adjustment {
        tracing::trace!(adjuster, neighbor, ?formation, "rewired");
    }
    Rewiring {
        adjustment,
        formation,
    }
}

/// Picks a former, then forms a tie with probability `connect_prob`.
/// Returns `None` when the coin declines.
pub fn make_tie(network: &mut Network, connect_prob: f64, rng: &mut SimRng) -> Option<TieFormation> {
    let former = rng.gen_range(0..network.size());
    if !rng.gen_bool(connect_prob) {
        return None;
    }
    let target = network.non_neighbors(former).choose(rng);
    if let Some(target) = target {
        network.add_tie(former, target);
    }
    Some(TieFormation { former, target })
}

/// Applies the configured rewiring policy for one timestep.
pub fn rewire(
    policy: RewiringPolicy,
    connect_prob: f64,
    network: &mut Network,
    states: &[bool],
    correct_behavior: &[bool],
    rng: &mut SimRng,
) -> Rewiring {
    match policy {
        RewiringPolicy::AdjustTie => adjust_tie(network, states, correct_behavior, rng),
        RewiringPolicy::BreakAndMake => {
            let adjustment = break_tie(network, states, correct_behavior, rng);
            let formation = make_tie(network, connect_prob, rng);
            Rewiring {
                adjustment,
                formation,
            }
        }
    }
}
