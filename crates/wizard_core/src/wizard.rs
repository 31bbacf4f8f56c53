//! Wizard state machine
//!
//! [`WizardMachine`] owns the single [`WizardState`] of a wizard session. All
//! changes go through its transition methods (or [`WizardMachine::dispatch`]),
//! so updates apply in call order and a transition never sees a half-applied
//! update.
//!
//! The step gate is derived: [`WizardMachine::validate_current_step`] only
//! reads state. Error-map changes that follow from validation are applied by
//! the explicit [`WizardMachine::sync_step_errors`] transition.

use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

use crate::types::{DataKey, WizardData, WizardStep, WizardUpdate};

/// Field name → message
pub type ErrorMap = BTreeMap<DataKey, String>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WizardState {
    pub current_step: WizardStep,
    pub data: WizardData,
    pub errors: ErrorMap,
    pub is_completed: bool,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WizardError {
    #[error("Step index {0} is out of range (0-{max})", max = WizardStep::LAST_INDEX)]
    StepOutOfRange(usize),

    #[error("The wizard can only be completed from the last step (currently on {0})")]
    NotOnLastStep(WizardStep),
}

/// Result of the step gate for the current step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepCheck {
    Ready,
    Missing(DataKey),
}

impl StepCheck {
    pub fn is_ready(self) -> bool {
        self == StepCheck::Ready
    }
}

/// Every wizard transition as a value, applied by [`WizardMachine::dispatch`]
#[derive(Debug, Clone, PartialEq)]
pub enum WizardAction {
    SetStep(WizardStep),
    NextStep,
    PrevStep,
    SetData(WizardData),
    UpdateData(WizardUpdate),
    SetError { field: DataKey, message: String },
    ClearError(DataKey),
    SyncStepErrors,
    Reset,
    Complete,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WizardMachine {
    state: WizardState,
}

impl WizardMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn current_step(&self) -> WizardStep {
        self.state.current_step
    }

    pub fn data(&self) -> &WizardData {
        &self.state.data
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.state.errors
    }

    pub fn error(&self, field: DataKey) -> Option<&str> {
        self.state.errors.get(&field).map(String::as_str)
    }

    pub fn is_completed(&self) -> bool {
        self.state.is_completed
    }

    /// Jump to any step; dependent actions must still check the gate
    pub fn set_step(&mut self, step: WizardStep) {
        debug!(from = %self.state.current_step, to = %step, "wizard: set step");
        self.state.current_step = step;
        self.state.errors.clear();
    }

    pub fn set_step_index(&mut self, index: usize) -> Result<(), WizardError> {
        let step = WizardStep::from_index(index).ok_or(WizardError::StepOutOfRange(index))?;
        self.set_step(step);
        Ok(())
    }

    /// Advance if the current step's data is present; returns whether it moved
    pub fn next_step(&mut self) -> bool {
        match self.validate_current_step() {
            StepCheck::Ready => {
                let next = self.state.current_step.next();
                debug!(from = %self.state.current_step, to = %next, "wizard: next step");
                self.state.current_step = next;
                self.state.errors.clear();
                true
            }
            StepCheck::Missing(key) => {
                debug!(step = %self.state.current_step, missing = %key, "wizard: step gate closed");
                self.state
                    .errors
                    .entry(key)
                    .or_insert_with(|| key.missing_message().to_string());
                false
            }
        }
    }

    /// Go back one step; no-op on the first step
    pub fn prev_step(&mut self) -> bool {
        match self.state.current_step.prev() {
            Some(prev) => {
                debug!(from = %self.state.current_step, to = %prev, "wizard: previous step");
                self.state.current_step = prev;
                self.state.errors.clear();
                true
            }
            None => false,
        }
    }

    /// Shallow-merge `update` into the wizard data and clear all errors
    pub fn update_wizard_data(&mut self, update: WizardUpdate) {
        self.state.data.merge(update);
        self.state.errors.clear();
    }

    /// Replace the wizard data wholesale; errors are left as they are
    pub fn set_wizard_data(&mut self, data: WizardData) {
        self.state.data = data;
    }

    pub fn set_error(&mut self, field: DataKey, message: impl Into<String>) {
        self.state.errors.insert(field, message.into());
    }

    pub fn clear_error(&mut self, field: DataKey) {
        self.state.errors.remove(&field);
    }

    pub fn reset_wizard(&mut self) {
        debug!("wizard: reset");
        self.state = WizardState::default();
    }

    /// Mark the wizard finished; only allowed on the last step
    pub fn complete_wizard(&mut self) -> Result<(), WizardError> {
        if !self.state.current_step.is_last() {
            return Err(WizardError::NotOnLastStep(self.state.current_step));
        }
        if !self.state.is_completed {
            debug!("wizard: completed");
            self.state.is_completed = true;
        }
        Ok(())
    }

    /// Step gate for the current step, computed from state on every call
    pub fn validate_current_step(&self) -> StepCheck {
        match self.state.current_step.required_key() {
            Some(key) if !self.state.data.has(key) => StepCheck::Missing(key),
            _ => StepCheck::Ready,
        }
    }

    pub fn can_proceed(&self) -> bool {
        self.validate_current_step().is_ready()
    }

    /// Bring the error map in line with the step gate.
    ///
    /// Sets the missing field's error unless one is already recorded, and
    /// drops errors for fields whose data is now present. Returns whether the
    /// map changed.
    pub fn sync_step_errors(&mut self) -> bool {
        let data = &self.state.data;
        let before = self.state.errors.len();
        self.state.errors.retain(|key, _| !data.has(*key));
        let mut changed = self.state.errors.len() != before;

        if let StepCheck::Missing(key) = self.validate_current_step() {
            if !self.state.errors.contains_key(&key) {
                self.state
                    .errors
                    .insert(key, key.missing_message().to_string());
                changed = true;
            }
        }

        changed
    }

    /// Apply one action; returns whether it took effect
    pub fn dispatch(&mut self, action: WizardAction) -> bool {
        match action {
            WizardAction::SetStep(step) => {
                self.set_step(step);
                true
            }
            WizardAction::NextStep => self.next_step(),
            WizardAction::PrevStep => self.prev_step(),
            WizardAction::SetData(data) => {
                self.set_wizard_data(data);
                true
            }
            WizardAction::UpdateData(update) => {
                self.update_wizard_data(update);
                true
            }
            WizardAction::SetError { field, message } => {
                self.set_error(field, message);
                true
            }
            WizardAction::ClearError(field) => {
                self.clear_error(field);
                true
            }
            WizardAction::SyncStepErrors => self.sync_step_errors(),
            WizardAction::Reset => {
                self.reset_wizard();
                true
            }
            WizardAction::Complete => self.complete_wizard().is_ok(),
        }
    }
}
