//! User-facing reply texts

use planstore::StoreError;

pub const USAGE: &str = "Hi! I keep a diary of lesson plans.\n\
\n\
Commands:\n\
/add - add a plan (date, class, title, note)\n\
/plan - show plans (today / by date / by class)\n\
/cancel - abort adding a plan\n\
\n\
Examples:\n\
/plan\n\
/plan 2025-10-21\n\
/plan 8A\n\
/plan 2025-10-21 8A";

pub const ASK_DATE: &str = "Enter the date (YYYY-MM-DD, DD.MM.YYYY or \"today\"):";
pub const BAD_DATE: &str = "Could not understand the date. Format: YYYY-MM-DD or DD.MM.YYYY:";
pub const ASK_CLASS: &str = "Class/group? (for example: 8A, IB HL, IGCSE-1)";
pub const EMPTY_CLASS: &str = "The class cannot be empty. Class/group?";
pub const ASK_TITLE: &str = "Short title (topic):";
pub const EMPTY_TITLE: &str = "The title cannot be empty. Short title (topic):";
pub const ASK_NOTE: &str = "Note/plan and (optionally) links:";
pub const SAVED: &str = "Great, saved ✅";
pub const CANCELLED: &str = "Cancelled.";

pub const PLANS_HEADER: &str = "Plans:";
pub const NOTHING_FOUND: &str = "Nothing found.";
pub const UNTITLED: &str = "(untitled)";

fn describe(err: &StoreError) -> &'static str {
    if err.is_auth() {
        "the spreadsheet rejected the bot's credentials"
    } else if err.is_unavailable() {
        "the spreadsheet is unavailable"
    } else {
        "the spreadsheet returned an error"
    }
}

/// Reply when appending the finished entry failed
pub fn save_failed(err: &StoreError) -> String {
    format!(
        "Could not save the plan: {}. Send the note again to retry, or /cancel.",
        describe(err)
    )
}

/// Reply when fetching rows for /plan failed
pub fn query_failed(err: &StoreError) -> String {
    format!("Could not load plans: {}. Please try again later.", describe(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_lists_commands() {
        for command in ["/add", "/plan", "/cancel"] {
            assert!(USAGE.contains(command), "usage should mention {command}");
        }
    }

    #[test]
    fn test_failure_messages_classify_errors() {
        let auth = StoreError::Auth("invalid_grant".to_string());
        assert!(save_failed(&auth).contains("credentials"));

        let down = StoreError::ApiError {
            status: 503,
            message: "backend down".to_string(),
        };
        assert!(query_failed(&down).contains("unavailable"));
        assert!(!query_failed(&down).contains("backend down"));
    }
}
