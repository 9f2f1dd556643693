//! Productivity statistics for the dashboard.
//!
//! Everything here is a pure computation over a user's already-loaded tasks.

use crate::motivation::{MessagePicker, pick_message};
use crate::ordering::dashboard_order;
use crate::types::Task;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;

/// Placeholder until focus time is actually tracked.
pub const AVG_FOCUS_MINUTES: u32 = 45;

/// Window for "recently completed" tasks, in hours.
pub const RECENT_WINDOW_HOURS: i64 = 24;

/// Snapshot of a user's task statistics.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub completed_count: usize,
    pub pending_count: usize,
    pub total_tasks: usize,
    pub tasks_completed_today: usize,
    pub tasks_completed_week: usize,
    pub overdue_tasks: usize,
    pub avg_focus_minutes: u32,
    /// Pending tasks due today or tomorrow, earliest first.
    pub reminders: Vec<Task>,
    /// Tasks completed within the last day.
    pub recent_completed: Vec<Task>,
    pub notifications: Vec<String>,
    pub motivational_message: &'static str,
}

/// Monday of the week containing `today`.
pub fn week_start(today: NaiveDate) -> NaiveDate {
    today - Duration::days(i64::from(today.weekday().num_days_from_monday()))
}

/// Compute the dashboard snapshot for `tasks` as of `now`.
pub fn summarize(
    tasks: &[Task],
    now: DateTime<Utc>,
    picker: &dyn MessagePicker,
) -> DashboardSummary {
    let today = now.date_naive();
    let monday = week_start(today);
    let tomorrow = today + Duration::days(1);
    let recent_cutoff = now - Duration::hours(RECENT_WINDOW_HOURS);

    let completed: Vec<&Task> = tasks.iter().filter(|t| t.is_completed()).collect();
    let pending: Vec<&Task> = tasks.iter().filter(|t| t.is_pending()).collect();

    let completed_on = |pred: &dyn Fn(NaiveDate) -> bool| {
        completed
            .iter()
            .filter(|t| t.completed_at.is_some_and(|at| pred(at.date_naive())))
            .count()
    };
    let tasks_completed_today = completed_on(&|date| date == today);
    let tasks_completed_week = completed_on(&|date| date >= monday);

    let overdue_tasks = pending
        .iter()
        .filter(|t| t.due_date.is_some_and(|due| due < today))
        .count();

    let mut reminders: Vec<Task> = pending
        .iter()
        .filter(|t| t.due_date.is_some_and(|due| due >= today && due <= tomorrow))
        .map(|t| (*t).clone())
        .collect();
    reminders.sort_by_key(|t| t.due_date);

    let recent_completed: Vec<Task> = completed
        .iter()
        .filter(|t| t.completed_at.is_some_and(|at| at >= recent_cutoff))
        .map(|t| (*t).clone())
        .collect();

    let notifications =
        build_notifications(overdue_tasks, reminders.len(), recent_completed.len());

    DashboardSummary {
        completed_count: completed.len(),
        pending_count: pending.len(),
        total_tasks: tasks.len(),
        tasks_completed_today,
        tasks_completed_week,
        overdue_tasks,
        avg_focus_minutes: AVG_FOCUS_MINUTES,
        reminders,
        recent_completed,
        notifications,
        motivational_message: pick_message(picker),
    }
}

/// Notification lines in fixed order: overdue, due soon, recently completed.
pub fn build_notifications(overdue: usize, due_soon: usize, recent: usize) -> Vec<String> {
    let mut notifications = Vec::new();
    if overdue > 0 {
        notifications.push(format!("You have {} overdue task(s).", overdue));
    }
    if due_soon > 0 {
        notifications.push(format!("You have {} task(s) due soon.", due_soon));
    }
    if recent > 0 {
        notifications.push(format!(
            "Great job! You completed {} task(s) recently!",
            recent
        ));
    }
    notifications
}

/// Summary plus the user's tasks in dashboard order.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    #[serde(flatten)]
    pub summary: DashboardSummary,
    pub tasks: Vec<Task>,
}

pub fn dashboard_view(
    mut tasks: Vec<Task>,
    now: DateTime<Utc>,
    picker: &dyn MessagePicker,
) -> DashboardView {
    let summary = summarize(&tasks, now, picker);
    dashboard_order(&mut tasks, now.date_naive());
    DashboardView { summary, tasks }
}
