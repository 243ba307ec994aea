//! Add wizard: the four-step dialog that collects one plan entry
//!
//! ```text
//! AwaitingDate -> AwaitingClass -> AwaitingTitle -> AwaitingNote -> complete
//! ```
//!
//! The wizard is pure: it never talks to the store. On completion it hands
//! back the finished [`PlanEntry`] and the caller decides what happens to the
//! session.

use chrono::NaiveDateTime;
use planstore::PlanEntry;
use tracing::debug;

use crate::date;
use crate::messages;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardState {
    AwaitingDate,
    AwaitingClass,
    AwaitingTitle,
    AwaitingNote,
}

/// Outcome of feeding one reply into the wizard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Input rejected, state unchanged; send the prompt again
    Reprompt(&'static str),
    /// Input accepted, moved to the next state; send the next prompt
    Advanced(&'static str),
    /// Last field collected
    Complete(PlanEntry),
}

/// Per-conversation dialog progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardSession {
    state: WizardState,
    date: String,
    class: String,
    title: String,
}

impl Default for WizardSession {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardSession {
    /// Start a session waiting for the date
    pub fn new() -> Self {
        Self {
            state: WizardState::AwaitingDate,
            date: String::new(),
            class: String::new(),
            title: String::new(),
        }
    }

    /// First prompt of the dialog
    pub fn prompt() -> &'static str {
        messages::ASK_DATE
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Feed one non-command reply; `now` stamps the entry and resolves "today"
    pub fn advance(&mut self, text: &str, now: NaiveDateTime) -> Step {
        debug!(state = ?self.state, "advance: called");
        match self.state {
            WizardState::AwaitingDate => match date::normalize_at(text, now.date()) {
                Some(d) => {
                    self.date = d;
                    self.state = WizardState::AwaitingClass;
                    Step::Advanced(messages::ASK_CLASS)
                }
                None => {
                    debug!("advance: invalid date, staying in AwaitingDate");
                    Step::Reprompt(messages::BAD_DATE)
                }
            },
            WizardState::AwaitingClass => {
                let class = text.trim();
                if class.is_empty() {
                    return Step::Reprompt(messages::EMPTY_CLASS);
                }
                self.class = class.to_string();
                self.state = WizardState::AwaitingTitle;
                Step::Advanced(messages::ASK_TITLE)
            }
            WizardState::AwaitingTitle => {
                let title = text.trim();
                if title.is_empty() {
                    return Step::Reprompt(messages::EMPTY_TITLE);
                }
                self.title = title.to_string();
                self.state = WizardState::AwaitingNote;
                Step::Advanced(messages::ASK_NOTE)
            }
            WizardState::AwaitingNote => {
                let entry = PlanEntry::new(now, &self.date, &self.class, &self.title, text.trim());
                debug!(date = %entry.date(), class = %entry.class(), "advance: entry complete");
                Step::Complete(entry)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 10, 20)
            .unwrap()
            .and_hms_opt(19, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_full_dialog() {
        let mut session = WizardSession::new();
        assert_eq!(session.state(), WizardState::AwaitingDate);

        assert_eq!(session.advance("2025-10-21", now()), Step::Advanced(messages::ASK_CLASS));
        assert_eq!(session.advance(" 8A ", now()), Step::Advanced(messages::ASK_TITLE));
        assert_eq!(session.advance("Photosynthesis", now()), Step::Advanced(messages::ASK_NOTE));
        assert_eq!(session.state(), WizardState::AwaitingNote);

        match session.advance("intro lab http://y.test", now()) {
            Step::Complete(entry) => {
                assert_eq!(entry.date(), "2025-10-21");
                assert_eq!(entry.class(), "8A");
                assert_eq!(entry.title(), "Photosynthesis");
                assert_eq!(entry.note(), "intro lab http://y.test");
                assert_eq!(entry.links(), "http://y.test");
                assert_eq!(entry.timestamp(), "2025-10-20T19:00:00");
            }
            other => panic!("expected Complete, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_date_reprompts_in_place() {
        let mut session = WizardSession::new();
        let before = session.clone();
        assert_eq!(session.advance("banana", now()), Step::Reprompt(messages::BAD_DATE));
        assert_eq!(session, before);
    }

    #[test]
    fn test_today_resolves_against_now() {
        let mut session = WizardSession::new();
        session.advance("today", now());
        assert_eq!(session.date(), "2025-10-20");
    }

    #[test]
    fn test_empty_class_and_title_rejected() {
        let mut session = WizardSession::new();
        session.advance("21.10.2025", now());
        assert_eq!(session.advance("   ", now()), Step::Reprompt(messages::EMPTY_CLASS));
        assert_eq!(session.state(), WizardState::AwaitingClass);

        session.advance("8A", now());
        assert_eq!(session.advance("", now()), Step::Reprompt(messages::EMPTY_TITLE));
        assert_eq!(session.state(), WizardState::AwaitingTitle);
    }

    #[test]
    fn test_empty_note_allowed() {
        let mut session = WizardSession::new();
        session.advance("21.10.2025", now());
        session.advance("8A", now());
        session.advance("Cells", now());
        match session.advance("  ", now()) {
            Step::Complete(entry) => {
                assert_eq!(entry.note(), "");
                assert_eq!(entry.links(), "");
            }
            other => panic!("expected Complete, got {other:?}"),
        }
    }

    #[test]
    fn test_complete_keeps_state_for_retry() {
        let mut session = WizardSession::new();
        session.advance("21.10.2025", now());
        session.advance("8A", now());
        session.advance("Cells", now());
        assert!(matches!(session.advance("first try", now()), Step::Complete(_)));
        assert_eq!(session.state(), WizardState::AwaitingNote);
        assert!(matches!(session.advance("second try", now()), Step::Complete(_)));
    }
}
