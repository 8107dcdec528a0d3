//! Death conditions for organisms.
//!
//! Organisms are removed from the roster when:
//! - their error count exceeds `organism_death_rate`,
//! - they go more than `kill_if_no_child` ticks without reproducing,
//! - or population-pressure culling picks them.

use fungera_types::Organism;

use crate::config::OrganismConfig;

/// Why an organism was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeathCause {
    /// Too many faults.
    Errors,
    /// No successful reproduction for too long.
    Stagnation,
    /// Selected by population-pressure culling.
    Culled,
}

impl core::fmt::Display for DeathCause {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Errors => write!(f, "errors"),
            Self::Stagnation => write!(f, "stagnation"),
            Self::Culled => write!(f, "culled"),
        }
    }
}

/// Check whether an organism meets a threshold death condition.
///
/// Returns `Some(cause)` if the organism must die, `None` if it lives.
/// This only inspects state; releasing memory is the caller's job.
pub const fn check_death(organism: &Organism, config: &OrganismConfig) -> Option<DeathCause> {
    if organism.errors > config.organism_death_rate {
        return Some(DeathCause::Errors);
    }
    if organism.stagnation > config.kill_if_no_child {
        return Some(DeathCause::Stagnation);
    }
    None
}

#[cfg(test)]
mod tests {
    use fungera_types::Vec2;

    use super::*;

    fn organism() -> Organism {
        Organism::new(Vec2::ZERO, Vec2::splat(2), None)
    }

    #[test]
    fn healthy_organism_lives() {
        assert_eq!(check_death(&organism(), &OrganismConfig::default()), None);
    }

    #[test]
    fn threshold_is_exclusive() {
        let config = OrganismConfig::default();
        let mut org = organism();
        org.errors = config.organism_death_rate;
        assert_eq!(check_death(&org, &config), None);
        org.errors = config.organism_death_rate.saturating_add(1);
        assert_eq!(check_death(&org, &config), Some(DeathCause::Errors));
    }

    #[test]
    fn stagnation_kills() {
        let config = OrganismConfig {
            kill_if_no_child: 10,
            ..OrganismConfig::default()
        };
        let mut org = organism();
        org.stagnation = 11;
        assert_eq!(check_death(&org, &config), Some(DeathCause::Stagnation));
    }

    #[test]
    fn errors_take_precedence_in_reporting() {
        let config = OrganismConfig {
            organism_death_rate: 0,
            kill_if_no_child: 0,
            ..OrganismConfig::default()
        };
        let mut org = organism();
        org.errors = 1;
        org.stagnation = 1;
        assert_eq!(check_death(&org, &config), Some(DeathCause::Errors));
    }
}
