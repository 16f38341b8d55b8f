// libs/opd-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::models::{OpdError, TokenStatus};

/// Token status state machine. The queue only ever moves forward:
/// waiting -> in-progress -> completed, or waiting -> cancelled.
pub struct TokenLifecycleService;

impl TokenLifecycleService {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_status_transition(
        &self,
        current_status: &TokenStatus,
        new_status: &TokenStatus,
    ) -> Result<(), OpdError> {
        debug!(
            "Validating status transition from {} to {}",
            current_status, new_status
        );

        let valid_transitions = self.get_valid_transitions(current_status);

        if !valid_transitions.contains(new_status) {
            warn!(
                "Invalid status transition attempted: {} -> {}",
                current_status, new_status
            );
            return Err(OpdError::InvalidStatusTransition(*current_status));
        }

        Ok(())
    }

    pub fn get_valid_transitions(&self, current_status: &TokenStatus) -> Vec<TokenStatus> {
        match current_status {
            TokenStatus::Waiting => vec![TokenStatus::InProgress, TokenStatus::Cancelled],
            TokenStatus::InProgress => vec![TokenStatus::Completed],
            // Terminal states - no transitions allowed
            TokenStatus::Completed => vec![],
            TokenStatus::Cancelled => vec![],
        }
    }
}

impl Default for TokenLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn waiting_can_be_called_or_cancelled() {
        let lifecycle = TokenLifecycleService::new();
        assert!(lifecycle
            .validate_status_transition(&TokenStatus::Waiting, &TokenStatus::InProgress)
            .is_ok());
        assert!(lifecycle
            .validate_status_transition(&TokenStatus::Waiting, &TokenStatus::Cancelled)
            .is_ok());
    }

    #[test]
    fn in_progress_can_only_complete() {
        let lifecycle = TokenLifecycleService::new();
        assert!(lifecycle
            .validate_status_transition(&TokenStatus::InProgress, &TokenStatus::Completed)
            .is_ok());
        assert_matches!(
            lifecycle.validate_status_transition(&TokenStatus::InProgress, &TokenStatus::Waiting),
            Err(OpdError::InvalidStatusTransition(TokenStatus::InProgress))
        );
        assert_matches!(
            lifecycle.validate_status_transition(&TokenStatus::InProgress, &TokenStatus::Cancelled),
            Err(OpdError::InvalidStatusTransition(TokenStatus::InProgress))
        );
    }

    #[test]
    fn terminal_states_never_move() {
        let lifecycle = TokenLifecycleService::new();
        for terminal in [TokenStatus::Completed, TokenStatus::Cancelled] {
            for next in [
                TokenStatus::Waiting,
                TokenStatus::InProgress,
                TokenStatus::Completed,
                TokenStatus::Cancelled,
            ] {
                assert!(lifecycle
                    .validate_status_transition(&terminal, &next)
                    .is_err());
            }
        }
    }

    #[test]
    fn never_moves_backward() {
        let lifecycle = TokenLifecycleService::new();
        assert!(lifecycle
            .validate_status_transition(&TokenStatus::Completed, &TokenStatus::Waiting)
            .is_err());
        assert!(lifecycle
            .validate_status_transition(&TokenStatus::InProgress, &TokenStatus::Waiting)
            .is_err());
    }
}
