use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitState {
    Idle,
    Submitting,
    Succeeded,
}

impl fmt::Display for SubmitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubmitState::Idle => "idle",
            SubmitState::Submitting => "submitting",
            SubmitState::Succeeded => "succeeded",
        };
        f.write_str(name)
    }
}

/// An add-to-cart button: its label, enabled flag and position in the submit cycle.
///
/// Transitions return `false` and leave the control untouched when called from the wrong state,
/// which is what keeps a disabled control from submitting twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitControl {
    state: SubmitState,
    original_label: String,
    label: String,
    enabled: bool,
    success_style: bool,
}

impl SubmitControl {
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            state: SubmitState::Idle,
            original_label: label.clone(),
            label,
            enabled: true,
            success_style: false,
        }
    }

    pub fn state(&self) -> SubmitState {
        self.state
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn original_label(&self) -> &str {
        &self.original_label
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn has_success_style(&self) -> bool {
        self.success_style
    }

    /// `Idle -> Submitting`
    pub fn begin(&mut self, adding_label: &str) -> bool {
        if self.state != SubmitState::Idle || !self.enabled {
            return false;
        }
        self.state = SubmitState::Submitting;
        self.enabled = false;
        self.label = adding_label.to_string();
        true
    }

    /// `Submitting -> Succeeded`; the control stays disabled until [`reset`](Self::reset).
    pub fn succeed(&mut self, added_label: &str) -> bool {
        if self.state != SubmitState::Submitting {
            return false;
        }
        self.state = SubmitState::Succeeded;
        self.label = added_label.to_string();
        self.success_style = true;
        true
    }

    /// `Submitting -> Failed -> Idle`, restoring the original label at once.
    pub fn fail(&mut self) -> bool {
        if self.state != SubmitState::Submitting {
            return false;
        }
        self.restore();
        true
    }

    /// `Succeeded -> Idle`
    pub fn reset(&mut self) -> bool {
        if self.state != SubmitState::Succeeded {
            return false;
        }
        self.restore();
        true
    }

    fn restore(&mut self) {
        self.state = SubmitState::Idle;
        self.label = self.original_label.clone();
        self.enabled = true;
        self.success_style = false;
    }
}
