//! Page rendering.

use super::forms::{RegisterForm, TaskFormValues};
use super::templates::{self, fill};
use crate::error::{AppError, ErrorKind};
use crate::stats::DashboardSummary;
use crate::types::{Category, DATE_FORMAT, Priority, Task, User};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use chrono::NaiveDate;
use tracing::error;

/// Escape HTML special characters (and template braces).
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
        .replace('{', "&#123;")
        .replace('}', "&#125;")
}

fn nav_html(user: Option<&User>) -> String {
    match user {
        Some(user) => format!(
            r#"<a href="/tasks/dashboard/">Dashboard</a>
        <a href="/tasks/tasks/">Focus</a>
        <a href="/tasks/tasks/add/">Add Task</a>
        <a href="/pages/about/">About</a>
        <span class="stat-label">{}</span>
        <a href="/tasks/logout/">Log out</a>"#,
            html_escape(&user.username)
        ),
        None => r#"<a href="/pages/welcome/">Welcome</a>
        <a href="/pages/about/">About</a>
        <a href="/tasks/login/">Log in</a>
        <a href="/tasks/register/">Register</a>"#
            .to_string(),
    }
}

/// Wrap page content in the base layout.
pub fn page(title: &str, user: Option<&User>, content: &str) -> Html<String> {
    Html(fill(
        templates::BASE_TEMPLATE,
        &[
            ("title", &html_escape(title)),
            ("nav", &nav_html(user)),
            ("content", content),
        ],
    ))
}

fn message_html(class: &str, text: &str) -> String {
    format!(
        r#"<div class="message {}">{}</div>"#,
        class,
        html_escape(text)
    )
}

fn error_message(err: Option<&AppError>) -> String {
    err.map(|e| message_html("message-error", &e.message))
        .unwrap_or_default()
}

pub fn welcome_page() -> Html<String> {
    page("Welcome", None, templates::WELCOME_TEMPLATE)
}

pub fn home_page(user: Option<&User>) -> Html<String> {
    page("Home", user, templates::HOME_TEMPLATE)
}

pub fn about_page(user: Option<&User>) -> Html<String> {
    page("About", user, templates::ABOUT_TEMPLATE)
}

pub fn register_page(form: &RegisterForm, err: Option<&AppError>) -> Html<String> {
    let content = fill(
        templates::REGISTER_TEMPLATE,
        &[
            ("message", &error_message(err)),
            ("username", &html_escape(&form.username)),
            ("email", &html_escape(&form.email)),
        ],
    );
    page("Register", None, &content)
}

pub fn login_page(username: &str, next: &str, err: Option<&AppError>) -> Html<String> {
    let content = fill(
        templates::LOGIN_TEMPLATE,
        &[
            ("message", &error_message(err)),
            ("next", &html_escape(next)),
            ("username", &html_escape(username)),
        ],
    );
    page("Log in", None, &content)
}

fn priority_badge(priority: &Priority) -> String {
    let class = match priority {
        Priority::High => "badge-high",
        Priority::Medium => "badge-medium",
        Priority::Low => "badge-low",
        Priority::Other(_) => "badge-pending",
    };
    format!(
        r#"<span class="badge {}">{}</span>"#,
        class,
        html_escape(priority.label())
    )
}

fn format_due(due: Option<NaiveDate>) -> String {
    due.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn categories_html(categories: &[Category]) -> String {
    categories
        .iter()
        .map(|c| format!(r#"<span class="tag">{}</span>"#, html_escape(&c.title)))
        .collect::<Vec<_>>()
        .join("")
}

/// Task table with per-row actions.
fn task_table(tasks: &[Task], today: NaiveDate) -> String {
    if tasks.is_empty() {
        return r#"<div class="empty-state">No tasks yet</div>"#.to_string();
    }

    let mut html = String::from(concat!(
        "<table><thead><tr>",
        "<th>Task</th><th>Priority</th><th>Due</th><th>Status</th><th></th>",
        "</tr></thead><tbody>",
    ));

    for task in tasks {
        let title_class = if task.is_overdue(today) { "overdue" } else { "" };
        let status_badge = if task.is_completed() {
            "badge-success"
        } else {
            "badge-pending"
        };
        let complete_link = if task.is_pending() {
            format!(
                r#"<a href="/tasks/tasks/complete/{}/">Complete</a>"#,
                task.id
            )
        } else {
            String::new()
        };

        html.push_str(&format!(
            r#"<tr>
                <td><span class="{title_class}">{title}</span> {categories}</td>
                <td>{priority}</td>
                <td>{due}</td>
                <td><span class="badge {status_badge}">{status}</span></td>
                <td class="actions">
                    {complete_link}
                    <a href="/tasks/tasks/edit/{id}/">Edit</a>
                    <form method="post" action="/tasks/tasks/delete/{id}/" style="display:inline">
                        <button type="submit" class="btn-link">Delete</button>
                    </form>
                </td>
            </tr>"#,
            title_class = title_class,
            title = html_escape(&task.title),
            categories = categories_html(&task.categories),
            priority = priority_badge(&task.priority),
            due = format_due(task.due_date),
            status_badge = status_badge,
            status = task.status.label(),
            complete_link = complete_link,
            id = task.id,
        ));
    }

    html.push_str("</tbody></table>");
    html
}

fn reminders_html(reminders: &[Task]) -> String {
    if reminders.is_empty() {
        return r#"<div class="empty-state">Nothing due in the next day</div>"#.to_string();
    }
    let items: String = reminders
        .iter()
        .map(|t| {
            format!(
                r#"<li><strong>{}</strong> - due {}</li>"#,
                html_escape(&t.title),
                format_due(t.due_date)
            )
        })
        .collect();
    format!("<ul>{}</ul>", items)
}

fn notifications_html(notifications: &[String]) -> String {
    notifications
        .iter()
        .map(|n| message_html("message-info", n))
        .collect()
}

pub fn dashboard_page(
    user: &User,
    summary: &DashboardSummary,
    tasks: &[Task],
    today: NaiveDate,
) -> Html<String> {
    let content = fill(
        templates::DASHBOARD_TEMPLATE,
        &[
            ("motivational_message", &html_escape(summary.motivational_message)),
            ("notifications", &notifications_html(&summary.notifications)),
            ("total_tasks", &summary.total_tasks.to_string()),
            ("pending_count", &summary.pending_count.to_string()),
            ("completed_count", &summary.completed_count.to_string()),
            ("tasks_completed_today", &summary.tasks_completed_today.to_string()),
            ("tasks_completed_week", &summary.tasks_completed_week.to_string()),
            ("overdue_tasks", &summary.overdue_tasks.to_string()),
            ("avg_focus_minutes", &summary.avg_focus_minutes.to_string()),
            ("reminders", &reminders_html(&summary.reminders)),
            ("tasks", &task_table(tasks, today)),
        ],
    );
    page("Dashboard", Some(user), &content)
}

pub fn task_list_page(user: &User, tasks: &[Task], today: NaiveDate) -> Html<String> {
    let content = fill(
        templates::TASK_LIST_TEMPLATE,
        &[("tasks", &task_table(tasks, today))],
    );
    page("Focus Mode", Some(user), &content)
}

fn priority_options(selected: &str) -> String {
    let selected = if selected.trim().is_empty() {
        Priority::default().as_str().to_string()
    } else {
        selected.trim().to_uppercase()
    };
    Priority::CHOICES
        .iter()
        .map(|p| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                p.as_str(),
                if p.as_str() == selected { " selected" } else { "" },
                p.label()
            )
        })
        .collect::<Vec<_>>()
        .join("\n            ")
}

fn category_options(categories: &[Category], values: &TaskFormValues) -> String {
    if categories.is_empty() {
        return r#"<div class="empty-state">No categories yet</div>"#.to_string();
    }
    categories
        .iter()
        .map(|c| {
            format!(
                r#"<label><input type="checkbox" name="categories" value="{}"{}> {}</label>"#,
                c.id,
                if values.is_category_selected(c.id) {
                    " checked"
                } else {
                    ""
                },
                html_escape(&c.title)
            )
        })
        .collect::<Vec<_>>()
        .join("\n        ")
}

/// Create or edit form. `action` is the POST target.
pub fn task_form_page(
    user: &User,
    heading: &str,
    action: &str,
    values: &TaskFormValues,
    categories: &[Category],
    err: Option<&AppError>,
) -> Html<String> {
    let content = fill(
        templates::TASK_FORM_TEMPLATE,
        &[
            ("heading", &html_escape(heading)),
            ("message", &error_message(err)),
            ("action", &html_escape(action)),
            ("priority_options", &priority_options(&values.priority)),
            ("category_options", &category_options(categories, values)),
            ("title", &html_escape(&values.title)),
            ("description", &html_escape(&values.description)),
            ("due_date", &html_escape(&values.due_date)),
            ("new_category", &html_escape(&values.new_category)),
        ],
    );
    page(heading, Some(user), &content)
}

fn error_page(heading: &str, message: &str, user: Option<&User>) -> Html<String> {
    let content = fill(
        templates::ERROR_TEMPLATE,
        &[
            ("heading", &html_escape(heading)),
            ("message", &html_escape(message)),
        ],
    );
    page(heading, user, &content)
}

/// Render an error as a page, with the signed-in navigation when `user` is
/// known.
pub fn error_response(err: &AppError, user: Option<&User>) -> Response {
    match err.kind() {
        ErrorKind::NotFound => (
            StatusCode::NOT_FOUND,
            error_page("Not Found", &err.message, user),
        )
            .into_response(),
        ErrorKind::Validation => (
            StatusCode::BAD_REQUEST,
            error_page("Invalid Request", &err.message, user),
        )
            .into_response(),
        ErrorKind::Unauthenticated => (
            StatusCode::UNAUTHORIZED,
            error_page("Login Required", &err.message, user),
        )
            .into_response(),
        ErrorKind::Internal => {
            error!(code = ?err.code, "Request failed: {}", err.message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_page(
                    "Server Error",
                    "Something went wrong. Please try again.",
                    user,
                ),
            )
                .into_response()
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error_response(&self, None)
    }
}

/// An error raised while serving a signed-in user.
#[derive(Debug)]
pub struct UserError {
    user: User,
    error: AppError,
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        error_response(&self.error, Some(&self.user))
    }
}

pub type UserResult<T> = Result<T, UserError>;

/// Attach the signed-in user to an error so its page keeps their navigation.
pub trait ForUser<T> {
    fn for_user(self, user: &User) -> UserResult<T>;
}

impl<T, E: Into<AppError>> ForUser<T> for Result<T, E> {
    fn for_user(self, user: &User) -> UserResult<T> {
        self.map_err(|e| UserError {
            user: user.clone(),
            error: e.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppResult;
    use crate::types::TaskStatus;
    use chrono::Utc;

    #[test]
    fn escapes_markup_and_braces() {
        assert_eq!(
            html_escape(r#"<b>"x" & 'y' {{z}}</b>"#),
            "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39; &#123;&#123;z&#125;&#125;&lt;/b&gt;"
        );
    }

    #[test]
    fn task_titles_cannot_inject_placeholders() {
        let user = User {
            id: 1,
            username: "u".to_string(),
            email: None,
            password_hash: String::new(),
            created_at: Utc::now(),
        };
        let values = TaskFormValues {
            title: "{{description}}".to_string(),
            description: "secret".to_string(),
            ..Default::default()
        };
        let Html(body) = task_form_page(&user, "Edit", "/x/", &values, &[], None);
        assert!(body.contains("&#123;&#123;description&#125;&#125;"));
    }

    #[test]
    fn task_table_marks_overdue_and_offers_complete() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let task = Task {
            id: 42,
            user_id: 1,
            title: "Late".to_string(),
            description: String::new(),
            due_date: NaiveDate::from_ymd_opt(2024, 6, 1),
            status: TaskStatus::Pending,
            priority: Priority::High,
            categories: vec![],
            created_at: Utc::now(),
            completed_at: None,
            notified: false,
        };
        let html = task_table(&[task], today);
        assert!(html.contains(r#"class="overdue""#));
        assert!(html.contains("/tasks/tasks/complete/42/"));
        assert!(html.contains("badge-high"));
    }

    #[test]
    fn priority_options_select_current_value() {
        let html = priority_options("low");
        assert!(html.contains(r#"<option value="LOW" selected>Low</option>"#));
        assert!(priority_options("").contains(r#"<option value="MEDIUM" selected>"#));
    }

    #[test]
    fn not_found_maps_to_404() {
        let response = AppError::task_not_found(9).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_credentials_map_to_401() {
        let response = AppError::invalid_credentials().into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn error_page_keeps_signed_in_nav() {
        let user = User {
            id: 1,
            username: "alice".to_string(),
            email: None,
            password_hash: String::new(),
            created_at: Utc::now(),
        };
        let Html(anonymous) = error_page("Not Found", "gone", None);
        assert!(anonymous.contains("/tasks/register/"));

        let Html(signed_in) = error_page("Not Found", "gone", Some(&user));
        assert!(signed_in.contains("/tasks/logout/"));
        assert!(!signed_in.contains("/tasks/register/"));

        let result: AppResult<()> = Err(AppError::task_not_found(9));
        let response = result.for_user(&user).unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
