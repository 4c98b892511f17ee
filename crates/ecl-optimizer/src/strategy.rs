//! Optimizer strategy state machine.

/// Controls how aggressively the greedy ancestor search accepts
/// candidates.
///
/// A run starts in [`Default`](OptimizerStrategy::Default) and advances
/// one state per threshold (`Default` to `ScoreBoost1` to `ScoreBoost2`)
/// as acceptances accumulate, so long runs gradually favor closing out
/// the work set over clause quality. [`Lossy`](OptimizerStrategy::Lossy)
/// is never entered by advancement; callers select it up front to trade
/// a bounded false-positive rate for fewer clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptimizerStrategy {
    /// Accept candidates on their unadjusted fitness score.
    #[default]
    Default,
    /// First relaxation: boost every candidate score by 0.1.
    ScoreBoost1,
    /// Second relaxation: boost every candidate score by 0.2.
    ScoreBoost2,
    /// Tolerate a configured false-positive rate in ancestor clauses.
    Lossy,
}

impl OptimizerStrategy {
    /// The amount added to every candidate's fitness score.
    pub fn score_boost(&self) -> f64 {
        match self {
            OptimizerStrategy::Default | OptimizerStrategy::Lossy => 0.0,
            OptimizerStrategy::ScoreBoost1 => 0.1,
            OptimizerStrategy::ScoreBoost2 => 0.2,
        }
    }

    /// Number of accepted clauses after which the run moves to the next
    /// state, or `None` for terminal states.
    pub fn advance_after(&self) -> Option<usize> {
        match self {
            OptimizerStrategy::Default | OptimizerStrategy::ScoreBoost1 => Some(10),
            OptimizerStrategy::ScoreBoost2 | OptimizerStrategy::Lossy => None,
        }
    }

    /// The state entered after [`advance_after`](Self::advance_after)
    /// acceptances. Terminal states return themselves.
    pub fn next(&self) -> OptimizerStrategy {
        match self {
            OptimizerStrategy::Default => OptimizerStrategy::ScoreBoost1,
            OptimizerStrategy::ScoreBoost1 => OptimizerStrategy::ScoreBoost2,
            OptimizerStrategy::ScoreBoost2 => OptimizerStrategy::ScoreBoost2,
            OptimizerStrategy::Lossy => OptimizerStrategy::Lossy,
        }
    }

    /// Whether ancestor clauses may carry false positives.
    pub fn is_lossy(&self) -> bool {
        matches!(self, OptimizerStrategy::Lossy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advancement_chain() {
        let s = OptimizerStrategy::default();
        assert_eq!(s, OptimizerStrategy::Default);
        assert_eq!(s.next(), OptimizerStrategy::ScoreBoost1);
        assert_eq!(s.next().next(), OptimizerStrategy::ScoreBoost2);
        // Terminal states stay put.
        assert_eq!(s.next().next().next(), OptimizerStrategy::ScoreBoost2);
        assert_eq!(OptimizerStrategy::Lossy.next(), OptimizerStrategy::Lossy);
    }

    #[test]
    fn test_score_boosts_increase() {
        assert!(OptimizerStrategy::Default.score_boost() < OptimizerStrategy::ScoreBoost1.score_boost());
        assert!(OptimizerStrategy::ScoreBoost1.score_boost() < OptimizerStrategy::ScoreBoost2.score_boost());
    }

    #[test]
    fn test_only_lossy_is_lossy() {
        assert!(OptimizerStrategy::Lossy.is_lossy());
        assert!(!OptimizerStrategy::Default.is_lossy());
        assert!(!OptimizerStrategy::ScoreBoost2.is_lossy());
    }

    #[test]
    fn test_terminal_states_never_advance() {
        assert_eq!(OptimizerStrategy::ScoreBoost2.advance_after(), None);
        assert_eq!(OptimizerStrategy::Lossy.advance_after(), None);
    }
}
