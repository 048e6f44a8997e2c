use crate::types::{Action, Position};

/// Decision oracle consulted by the bridge: given an encoded observation,
/// return exactly one discrete action. Implementations used in live
/// sessions must be deterministic.
pub trait ActionPolicy {
    fn select_action(&mut self, observation: &[u8]) -> Action;
}

/// Deterministic stand-in for a learned model. Reads the agent and target
/// cells from the flat observation header and takes the first action in
/// enumeration order that reduces Manhattan distance.
#[derive(Debug, Default)]
pub struct GreedyPolicy;

impl ActionPolicy for GreedyPolicy {
    fn select_action(&mut self, observation: &[u8]) -> Action {
        if observation.len() < 4 {
            tracing::warn!(len = observation.len(), "Observation too short, defaulting");
            return Action::Right;
        }
        let agent = Position::new(observation[0] as i32, observation[1] as i32);
        let target = Position::new(observation[2] as i32, observation[3] as i32);

        let distance = agent.distance(&target);
        for action in Action::ALL {
            if action.apply(agent).distance(&target) < distance {
                return action;
            }
        }
        Action::Right
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(agent: (u8, u8), target: (u8, u8)) -> Vec<u8> {
        vec![agent.0, agent.1, target.0, target.1]
    }

    #[test]
    fn test_greedy_moves_toward_target() {
        let mut policy = GreedyPolicy;
        assert_eq!(policy.select_action(&obs((2, 5), (6, 5))), Action::Right);
        assert_eq!(policy.select_action(&obs((6, 5), (2, 5))), Action::Left);
        assert_eq!(policy.select_action(&obs((5, 6), (5, 2))), Action::Up);
        assert_eq!(policy.select_action(&obs((5, 2), (5, 6))), Action::Down);
    }

    #[test]
    fn test_greedy_prefers_enumeration_order_on_diagonals() {
        let mut policy = GreedyPolicy;
        // Both Right and Down reduce distance; Right comes first.
        assert_eq!(policy.select_action(&obs((2, 2), (5, 5))), Action::Right);
        // Both Up and Left reduce distance; Up comes first.
        assert_eq!(policy.select_action(&obs((5, 5), (2, 2))), Action::Up);
    }

    #[test]
    fn test_greedy_is_deterministic() {
        let mut policy = GreedyPolicy;
        let observation = obs((3, 3), (7, 1));
        let first = policy.select_action(&observation);
        for _ in 0..10 {
            assert_eq!(policy.select_action(&observation), first);
        }
    }
}
