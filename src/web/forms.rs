//! Form payloads and their validation.

use crate::auth::{validate_email, validate_new_password, validate_username};
use crate::db::categories::CATEGORY_TITLE_MAX_LEN;
use crate::error::{AppError, AppResult};
use crate::types::{DATE_FORMAT, Priority, Task, TaskInput, parse_date};
use serde::Deserialize;

/// Longest accepted task title.
pub const TASK_TITLE_MAX_LEN: usize = 200;

/// Raw task form fields, kept as submitted so the form can be re-rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFormValues {
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub priority: String,
    pub categories: Vec<String>,
    pub new_category: String,
}

impl TaskFormValues {
    /// Collect fields from urlencoded pairs. `categories` may repeat.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut values = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "title" => values.title = value,
                "description" => values.description = value,
                "due_date" => values.due_date = value,
                "priority" => values.priority = value,
                "categories" => values.categories.push(value),
                "new_category" => values.new_category = value,
                _ => {}
            }
        }
        values
    }

    /// Pre-fill from an existing task.
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            due_date: task
                .due_date
                .map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            priority: task.priority.as_str().to_string(),
            categories: task.categories.iter().map(|c| c.id.to_string()).collect(),
            new_category: String::new(),
        }
    }

    pub fn is_category_selected(&self, category_id: i64) -> bool {
        let id = category_id.to_string();
        self.categories.iter().any(|c| c.trim() == id)
    }

    /// Validate into a `TaskInput`.
    pub fn to_input(&self) -> AppResult<TaskInput> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppError::missing_field("title"));
        }
        if title.chars().count() > TASK_TITLE_MAX_LEN {
            return Err(AppError::invalid_value(
                "title",
                format!("Title must be at most {} characters.", TASK_TITLE_MAX_LEN),
            ));
        }

        let due_date = match self.due_date.trim() {
            "" => None,
            raw => Some(
                parse_date(raw)
                    .ok_or_else(|| AppError::invalid_value("due_date", "Enter a valid date."))?,
            ),
        };

        let priority = match self.priority.trim() {
            "" => Priority::default(),
            raw => {
                let priority = Priority::parse(&raw.to_uppercase());
                if !priority.is_known() {
                    return Err(AppError::invalid_value(
                        "priority",
                        format!("{} is not one of the available choices.", raw),
                    ));
                }
                priority
            }
        };

        let category_ids = self
            .categories
            .iter()
            .map(|raw| {
                raw.trim().parse::<i64>().map_err(|_| {
                    AppError::invalid_value("categories", format!("Invalid category: {}", raw))
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        let new_category = match self.new_category.trim() {
            "" => None,
            name if name.chars().count() > CATEGORY_TITLE_MAX_LEN => {
                return Err(AppError::invalid_value(
                    "new_category",
                    format!(
                        "Category must be at most {} characters.",
                        CATEGORY_TITLE_MAX_LEN
                    ),
                ));
            }
            name => Some(name.to_string()),
        };

        Ok(TaskInput {
            title: title.to_string(),
            description: self.description.clone(),
            due_date,
            priority,
            category_ids,
            new_category,
        })
    }
}

/// Registration form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

/// Validated registration fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub email: Option<String>,
    pub password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> AppResult<Registration> {
        let username = self.username.trim();
        validate_username(username)?;

        let email = Some(self.email.trim()).filter(|e| !e.is_empty());
        validate_email(email)?;

        validate_new_password(&self.password1, &self.password2)?;

        Ok(Registration {
            username: username.to_string(),
            email: email.map(str::to_string),
            password: self.password1.clone(),
        })
    }
}

/// Login form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: String,
}

/// Query string of the login page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

/// Accept only local absolute paths as post-login redirect targets.
///
/// Browsers drop tabs and newlines inside URLs, so a target containing any
/// control character is refused outright.
pub fn safe_next(next: &str) -> Option<&str> {
    let next = next.trim();
    if next.chars().any(char::is_control) {
        return None;
    }
    let is_local = next.starts_with('/') && !next.starts_with("//") && !next.contains('\\');
    is_local.then_some(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn collects_repeated_categories() {
        let values = TaskFormValues::from_pairs(pairs(&[
            ("title", "Write report"),
            ("categories", "1"),
            ("categories", "3"),
            ("csrf", "ignored"),
        ]));
        assert_eq!(values.title, "Write report");
        assert_eq!(values.categories, vec!["1", "3"]);
        assert!(values.is_category_selected(3));
        assert!(!values.is_category_selected(2));
    }

    #[test]
    fn defaults_apply_for_optional_fields() {
        let input = TaskFormValues::from_pairs(pairs(&[("title", "  Call mom  ")]))
            .to_input()
            .unwrap();
        assert_eq!(input.title, "Call mom");
        assert_eq!(input.description, "");
        assert_eq!(input.due_date, None);
        assert_eq!(input.priority, Priority::Medium);
        assert!(input.category_ids.is_empty());
        assert_eq!(input.new_category, None);
    }

    #[test]
    fn parses_all_fields() {
        let input = TaskFormValues::from_pairs(pairs(&[
            ("title", "Ship"),
            ("description", "v1"),
            ("due_date", "2024-06-11"),
            ("priority", "high"),
            ("categories", "5"),
            ("new_category", " Work "),
        ]))
        .to_input()
        .unwrap();
        assert_eq!(input.due_date, parse_date("2024-06-11"));
        assert_eq!(input.priority, Priority::High);
        assert_eq!(input.category_ids, vec![5]);
        assert_eq!(input.new_category.as_deref(), Some("Work"));
    }

    #[test]
    fn missing_title_is_rejected() {
        let err = TaskFormValues::from_pairs(pairs(&[("title", "   ")]))
            .to_input()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingRequiredField);
        assert_eq!(err.field.as_deref(), Some("title"));
    }

    #[test]
    fn bad_values_are_rejected() {
        let bad = [
            ("due_date", "tomorrow"),
            ("priority", "URGENT"),
            ("categories", "abc"),
        ];
        for (field, value) in bad {
            let err = TaskFormValues::from_pairs(pairs(&[("title", "x"), (field, value)]))
                .to_input()
                .unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidFieldValue, "{}", field);
            assert_eq!(err.field.as_deref(), Some(field));
        }
    }

    #[test]
    fn register_form_validates() {
        let form = RegisterForm {
            username: "alice".to_string(),
            email: "".to_string(),
            password1: "tr0ub4dor&3".to_string(),
            password2: "tr0ub4dor&3".to_string(),
        };
        let reg = form.validate().unwrap();
        assert_eq!(reg.username, "alice");
        assert_eq!(reg.email, None);

        let mismatch = RegisterForm {
            password2: "different".to_string(),
            ..form
        };
        assert!(mismatch.validate().is_err());
    }

    #[test]
    fn safe_next_accepts_local_paths_only() {
        assert_eq!(safe_next("/tasks/tasks/"), Some("/tasks/tasks/"));
        assert_eq!(safe_next("//evil.example"), None);
        assert_eq!(safe_next("https://evil.example"), None);
        assert_eq!(safe_next(""), None);
        assert_eq!(safe_next("/\\evil.example"), None);
        assert_eq!(safe_next("/\t/evil.example"), None);
        assert_eq!(safe_next("/\n/evil.example"), None);
        assert_eq!(safe_next("/\r\n/evil.example"), None);
    }
}
