//! Legal status transitions
//!
//! The transition table is expressed as an exhaustive match over the source
//! status, so adding a status variant forces this table to be revisited.

use tempo_domain::{ActivityStatus, Result, TempoError};

/// Statuses reachable from `from` in a single transition.
///
/// `completed -> paused` is the administrative revert; `cancelled` is
/// reachable from every non-terminal status and is strictly terminal.
pub fn allowed_targets(from: ActivityStatus) -> &'static [ActivityStatus] {
    use ActivityStatus as S;
    match from {
        S::Next => &[S::InProgress, S::Cancelled],
        S::InProgress => &[S::Paused, S::Completed, S::Cancelled],
        S::Paused => &[S::InProgress, S::Completed, S::Cancelled],
        S::Completed => &[S::Paused],
        S::Cancelled => &[],
    }
}

/// Check transition legality. Self-transitions are always rejected.
pub fn check_transition(from: ActivityStatus, to: ActivityStatus) -> Result<()> {
    if allowed_targets(from).contains(&to) {
        Ok(())
    } else {
        Err(TempoError::InvalidTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ActivityStatus as S;

    const ALL: [ActivityStatus; 5] = [S::Next, S::InProgress, S::Paused, S::Completed, S::Cancelled];

    #[test]
    fn table_matches_lifecycle_rules() {
        let legal = [
            (S::Next, S::InProgress),
            (S::Paused, S::InProgress),
            (S::InProgress, S::Paused),
            (S::InProgress, S::Completed),
            (S::Paused, S::Completed),
            (S::Next, S::Cancelled),
            (S::InProgress, S::Cancelled),
            (S::Paused, S::Cancelled),
            (S::Completed, S::Paused),
        ];

        for from in ALL {
            for to in ALL {
                let expected = legal.contains(&(from, to));
                assert_eq!(
                    check_transition(from, to).is_ok(),
                    expected,
                    "transition {from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn self_transitions_are_rejected() {
        for status in ALL {
            let err = check_transition(status, status).expect_err("self transition must fail");
            assert!(matches!(err, TempoError::InvalidTransition { .. }));
        }
    }

    #[test]
    fn cancelled_is_strictly_terminal() {
        assert!(allowed_targets(S::Cancelled).is_empty());
    }
}
