//! Conversation steps and per-user session state.

use serde::{Deserialize, Serialize};

use crate::quiz::QuizProgress;

/// Position of a session within the scripted conversation.
///
/// Onboarding runs New → AwaitingPhone → TakingQuiz → Idle; the purchase
/// loop runs Idle → AwaitingCourseSelection → AwaitingPaymentConfirmation →
/// (PaymentSuccessful →) Idle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    #[default]
    New,
    AwaitingPhone,
    TakingQuiz,
    Idle,
    AwaitingCourseSelection,
    AwaitingPaymentConfirmation,
    PaymentSuccessful,
}

impl Step {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: Step) -> bool {
        use Step::*;
        matches!(
            (self, target),
            (New, AwaitingPhone)
                | (AwaitingPhone, TakingQuiz)
                | (TakingQuiz, Idle)
                | (Idle, AwaitingCourseSelection)
                | (AwaitingCourseSelection, AwaitingPaymentConfirmation)
                | (AwaitingPaymentConfirmation, PaymentSuccessful)
                | (AwaitingPaymentConfirmation, Idle)
                | (PaymentSuccessful, Idle)
        )
    }

    /// Steps before the quiz is finished. Commands are not intercepted here.
    pub fn is_onboarding(&self) -> bool {
        matches!(self, Self::New | Self::AwaitingPhone | Self::TakingQuiz)
    }

    /// Steps in which a declined course may still be nudged with a generic
    /// reminder.
    pub fn accepts_generic_reminder(&self) -> bool {
        matches!(self, Self::Idle | Self::AwaitingCourseSelection)
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::New => "new",
            Self::AwaitingPhone => "awaiting_phone",
            Self::TakingQuiz => "taking_quiz",
            Self::Idle => "idle",
            Self::AwaitingCourseSelection => "awaiting_course_selection",
            Self::AwaitingPaymentConfirmation => "awaiting_payment_confirmation",
            Self::PaymentSuccessful => "payment_successful",
        };
        write!(f, "{s}")
    }
}

/// Live state of one user's conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub step: Step,
    /// Display name given during onboarding.
    pub name: Option<String>,
    /// Contact phone given during onboarding.
    pub phone: Option<String>,
    /// Name of the selected course. Set only from course selection onward.
    pub selected_course: Option<String>,
    pub quiz: QuizProgress,
}

impl SessionState {
    /// Move to `target`. Staying in the current step is always allowed.
    pub fn move_to(&mut self, target: Step) {
        if self.step == target {
            return;
        }
        if !self.step.can_transition_to(target) {
            tracing::warn!(from = %self.step, to = %target, "Unexpected step transition");
        }
        self.step = target;
    }

    pub fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn phone_or_empty(&self) -> &str {
        self.phone.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transitions() {
        use Step::*;
        let transitions = [
            (New, AwaitingPhone),
            (AwaitingPhone, TakingQuiz),
            (TakingQuiz, Idle),
            (Idle, AwaitingCourseSelection),
            (AwaitingCourseSelection, AwaitingPaymentConfirmation),
            (AwaitingPaymentConfirmation, PaymentSuccessful),
            (AwaitingPaymentConfirmation, Idle),
            (PaymentSuccessful, Idle),
        ];
        for (from, to) in transitions {
            assert!(
                from.can_transition_to(to),
                "{from} should transition to {to}"
            );
        }
    }

    #[test]
    fn invalid_transitions() {
        use Step::*;
        // Skip the quiz
        assert!(!AwaitingPhone.can_transition_to(Idle));
        // Select without onboarding
        assert!(!New.can_transition_to(AwaitingCourseSelection));
        // Pay without selecting
        assert!(!Idle.can_transition_to(AwaitingPaymentConfirmation));
        // Back into onboarding
        assert!(!Idle.can_transition_to(New));
        // Self-transition
        assert!(!TakingQuiz.can_transition_to(TakingQuiz));
    }

    #[test]
    fn onboarding_steps() {
        use Step::*;
        assert!(New.is_onboarding());
        assert!(AwaitingPhone.is_onboarding());
        assert!(TakingQuiz.is_onboarding());
        assert!(!Idle.is_onboarding());
        assert!(!PaymentSuccessful.is_onboarding());
    }

    #[test]
    fn display_matches_serde() {
        use Step::*;
        let steps = [
            New,
            AwaitingPhone,
            TakingQuiz,
            Idle,
            AwaitingCourseSelection,
            AwaitingPaymentConfirmation,
            PaymentSuccessful,
        ];
        for step in steps {
            let display = format!("{step}");
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(format!("\"{display}\""), json, "Display and serde should match for {step:?}");
        }
    }

    #[test]
    fn default_state_is_new_and_empty() {
        let state = SessionState::default();
        assert_eq!(state.step, Step::New);
        assert!(state.name.is_none());
        assert!(state.selected_course.is_none());
        assert!(!state.quiz.active);
    }

    #[test]
    fn move_to_same_step_is_noop() {
        let mut state = SessionState {
            step: Step::TakingQuiz,
            ..Default::default()
        };
        state.move_to(Step::TakingQuiz);
        assert_eq!(state.step, Step::TakingQuiz);
        state.move_to(Step::Idle);
        assert_eq!(state.step, Step::Idle);
    }
}
