//! Coaches: message picking, launch-time selection and the favorites roster.

mod roster;
mod selection;

pub use roster::CoachRoster;
pub use selection::{bootstrap_coach, ChosenCoach, CoachSource};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::api::Coach;
use crate::timer::SessionType;

pub const FALLBACK_PHASE_MESSAGE: &str = "Keep going!";
pub const FALLBACK_START_MESSAGE: &str = "Let's begin!";

impl Coach {
    /// Message pool for a phase: focus messages while focusing, break
    /// messages for either break.
    pub fn messages_for(&self, phase: SessionType) -> &[String] {
        if phase.is_break() {
            &self.break_messages
        } else {
            &self.focus_messages
        }
    }

    pub fn random_message<R: Rng + ?Sized>(&self, phase: SessionType, rng: &mut R) -> String {
        self.messages_for(phase)
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| FALLBACK_PHASE_MESSAGE.to_string())
    }

    pub fn random_start_message<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        self.session_start_messages
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| FALLBACK_START_MESSAGE.to_string())
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::coach;
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Mcg128Xsl64;

    #[test]
    fn picks_from_phase_pool() {
        let mut rng = Mcg128Xsl64::seed_from_u64(7);
        let zeus = coach(1, "Zeus");
        assert_eq!(zeus.random_message(SessionType::Focus, &mut rng), "Zeus: focus");
        assert_eq!(zeus.random_message(SessionType::LongBreak, &mut rng), "Zeus: rest");
        assert_eq!(zeus.random_start_message(&mut rng), "Zeus: begin");
    }

    #[test]
    fn empty_pools_fall_back() {
        let mut rng = Mcg128Xsl64::seed_from_u64(7);
        let mut hermes = coach(2, "Hermes");
        hermes.focus_messages.clear();
        hermes.session_start_messages.clear();
        assert_eq!(
            hermes.random_message(SessionType::Focus, &mut rng),
            FALLBACK_PHASE_MESSAGE
        );
        assert_eq!(hermes.random_start_message(&mut rng), FALLBACK_START_MESSAGE);
    }
}
