//! Display orderings for task lists.
//!
//! The dashboard and the focus list use different orderings. The dashboard
//! ranks priorities by urgency; the focus list compares the raw priority text
//! in descending byte order, which puts MEDIUM before LOW before HIGH.

use crate::types::Task;
use chrono::NaiveDate;

/// Dashboard ordering: priority rank, then due date (missing dates compare as
/// `today`). Stable.
pub fn dashboard_order(tasks: &mut [Task], today: NaiveDate) {
    tasks.sort_by_key(|t| (t.priority.rank(), t.due_date.unwrap_or(today)));
}

/// Focus list: pending tasks only, raw priority text descending, then due date
/// ascending with missing dates first. Stable.
pub fn focus_order(tasks: Vec<Task>) -> Vec<Task> {
    let mut pending: Vec<Task> = tasks.into_iter().filter(|t| t.is_pending()).collect();
    pending.sort_by(|a, b| {
        b.priority
            .as_str()
            .cmp(a.priority.as_str())
            .then_with(|| a.due_date.cmp(&b.due_date))
    });
    pending
}
