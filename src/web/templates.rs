//! HTML templates for the web pages.
//!
//! Templates are embedded at compile time using `include_str!` and filled in
//! by replacing `{{name}}` placeholders.

/// Page layout with navigation. Placeholders: `title`, `nav`, `content`.
pub const BASE_TEMPLATE: &str = include_str!("templates/base.html");

/// Public landing page.
pub const WELCOME_TEMPLATE: &str = include_str!("templates/welcome.html");

pub const HOME_TEMPLATE: &str = include_str!("templates/home.html");

pub const ABOUT_TEMPLATE: &str = include_str!("templates/about.html");

/// Account registration form.
pub const REGISTER_TEMPLATE: &str = include_str!("templates/register.html");

/// Login form.
pub const LOGIN_TEMPLATE: &str = include_str!("templates/login.html");

/// Dashboard with statistics, reminders and the ordered task table.
pub const DASHBOARD_TEMPLATE: &str = include_str!("templates/dashboard.html");

/// Focus list of pending tasks.
pub const TASK_LIST_TEMPLATE: &str = include_str!("templates/task_list.html");

/// Create/edit task form.
pub const TASK_FORM_TEMPLATE: &str = include_str!("templates/task_form.html");

/// Error page body.
pub const ERROR_TEMPLATE: &str = include_str!("templates/error.html");

/// Fill `{{key}}` placeholders in order.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in values {
        out = out.replace(&format!("{{{{{}}}}}", key), value);
    }
    out
}
