//! CLI interaction state machine.
//!
//! Transitions are table-driven; anything not present in the table is
//! rejected and the current state is left unchanged. The confirmation
//! dialog remembers the single state it was entered from and always returns
//! there on resolution. It is not reentrant.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CliState {
    #[default]
    MainMenu,
    AddingTask,
    UpdatingTask,
    DeletingTask,
    ConfirmationDialog,
    Exiting,
}

impl CliState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CliState::MainMenu => "main_menu",
            CliState::AddingTask => "adding_task",
            CliState::UpdatingTask => "updating_task",
            CliState::DeletingTask => "deleting_task",
            CliState::ConfirmationDialog => "confirmation_dialog",
            CliState::Exiting => "exiting",
        }
    }
}

/// Legal transitions, excluding the confirmation dialog (which may be
/// entered from any other state and returns to its recorded origin).
const TRANSITIONS: &[(CliState, CliState)] = &[
    (CliState::MainMenu, CliState::AddingTask),
    (CliState::AddingTask, CliState::MainMenu),
    (CliState::MainMenu, CliState::UpdatingTask),
    (CliState::UpdatingTask, CliState::MainMenu),
    (CliState::MainMenu, CliState::DeletingTask),
    (CliState::DeletingTask, CliState::MainMenu),
    (CliState::MainMenu, CliState::Exiting),
];

#[derive(Debug, Clone, Default)]
pub struct StateMachine {
    current: CliState,
    dialog_return: Option<CliState>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> CliState {
        self.current
    }

    /// Attempt a table transition. On rejection the state is unchanged.
    pub fn transition(&mut self, to: CliState) -> Result<()> {
        if to == CliState::ConfirmationDialog {
            return self.enter_confirmation();
        }
        let allowed = TRANSITIONS
            .iter()
            .any(|(from, target)| *from == self.current && *target == to);
        if !allowed {
            return Err(Error::InvalidTransition {
                from: self.current.as_str(),
                to: to.as_str(),
            });
        }
        self.current = to;
        Ok(())
    }

    /// Enter the confirmation dialog, recording where to return. Nested
    /// confirmations are rejected.
    pub fn enter_confirmation(&mut self) -> Result<()> {
        if self.current == CliState::ConfirmationDialog {
            return Err(Error::InvalidTransition {
                from: CliState::ConfirmationDialog.as_str(),
                to: CliState::ConfirmationDialog.as_str(),
            });
        }
        self.dialog_return = Some(self.current);
        self.current = CliState::ConfirmationDialog;
        Ok(())
    }

    /// Leave the confirmation dialog (accept or cancel both return to the
    /// recorded prior state).
    pub fn resolve_confirmation(&mut self) -> Result<CliState> {
        if self.current != CliState::ConfirmationDialog {
            return Err(Error::InvalidTransition {
                from: self.current.as_str(),
                to: CliState::ConfirmationDialog.as_str(),
            });
        }
        let back = self.dialog_return.take().unwrap_or_default();
        self.current = back;
        Ok(back)
    }

    pub fn in_confirmation(&self) -> bool {
        self.current == CliState::ConfirmationDialog
    }

    /// Replace the state wholesale (snapshot restore).
    pub fn restore(&mut self, state: CliState) {
        self.current = state;
        self.dialog_return = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_main_menu() {
        let machine = StateMachine::new();
        assert_eq!(machine.current(), CliState::MainMenu);
    }

    #[test]
    fn table_transitions_round_trip() {
        let mut machine = StateMachine::new();
        machine.transition(CliState::AddingTask).expect("enter");
        machine.transition(CliState::MainMenu).expect("leave");
        assert_eq!(machine.current(), CliState::MainMenu);
    }

    #[test]
    fn missing_transition_is_rejected_and_state_unchanged() {
        let mut machine = StateMachine::new();
        machine.transition(CliState::AddingTask).expect("enter");
        let err = machine
            .transition(CliState::DeletingTask)
            .expect_err("not in table");
        assert!(matches!(err, Error::InvalidTransition { .. }));
        assert_eq!(machine.current(), CliState::AddingTask);
    }

    #[test]
    fn confirmation_returns_to_origin() {
        let mut machine = StateMachine::new();
        machine.transition(CliState::DeletingTask).expect("enter");
        machine.enter_confirmation().expect("dialog");
        assert!(machine.in_confirmation());

        let back = machine.resolve_confirmation().expect("resolve");
        assert_eq!(back, CliState::DeletingTask);
        assert_eq!(machine.current(), CliState::DeletingTask);
    }

    #[test]
    fn nested_confirmation_is_rejected() {
        let mut machine = StateMachine::new();
        machine.enter_confirmation().expect("dialog");
        let err = machine.enter_confirmation().expect_err("nested");
        assert!(matches!(err, Error::InvalidTransition { .. }));
        assert!(machine.in_confirmation());
    }

    #[test]
    fn resolve_outside_dialog_is_rejected() {
        let mut machine = StateMachine::new();
        assert!(machine.resolve_confirmation().is_err());
    }
}
