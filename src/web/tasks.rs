//! Task pages: dashboard, focus list and the task mutations.
//!
//! Every handler here requires a signed-in user and only ever touches that
//! user's tasks; a task id owned by someone else behaves like a missing one.

use super::forms::TaskFormValues;
use super::render::{self, ForUser, UserResult};
use super::server::AppState;
use super::session::CurrentUser;
use super::DASHBOARD_PATH;
use crate::error::{AppError, AppResult, ErrorKind};
use crate::ordering::focus_order;
use crate::stats::{DashboardView, dashboard_view};
use crate::types::{Task, User};
use axum::extract::{Form, Path, State};
use axum::response::{Html, IntoResponse, Json, Redirect, Response};
use chrono::Utc;

const ADD_TASK_PATH: &str = "/tasks/tasks/add/";

fn edit_task_path(task_id: i64) -> String {
    format!("/tasks/tasks/edit/{}/", task_id)
}

fn load_owned_task(state: &AppState, task_id: i64, user: &User) -> AppResult<Task> {
    state
        .db
        .get_task(task_id, user.id)?
        .ok_or_else(|| AppError::task_not_found(task_id))
}

fn load_view(state: &AppState, user: &User) -> AppResult<DashboardView> {
    let tasks = state.db.list_tasks(user.id)?;
    Ok(dashboard_view(tasks, Utc::now(), state.picker.as_ref()))
}

pub async fn dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> UserResult<Html<String>> {
    let view = load_view(&state, &user).for_user(&user)?;
    let today = Utc::now().date_naive();
    Ok(render::dashboard_page(&user, &view.summary, &view.tasks, today))
}

/// JSON form of the dashboard.
pub async fn api_dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<DashboardView>> {
    Ok(Json(load_view(&state, &user)?))
}

/// Focus list of pending tasks.
pub async fn task_list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> UserResult<Html<String>> {
    let tasks = focus_order(state.db.list_tasks(user.id).for_user(&user)?);
    Ok(render::task_list_page(&user, &tasks, Utc::now().date_naive()))
}

/// Render the task form, optionally with a validation message.
fn form_page(
    state: &AppState,
    user: &User,
    heading: &str,
    action: &str,
    values: &TaskFormValues,
    err: Option<&AppError>,
) -> AppResult<Html<String>> {
    let categories = state.db.list_categories(user.id)?;
    Ok(render::task_form_page(user, heading, action, values, &categories, err))
}

/// Redirect to the dashboard on success; re-render the form on validation
/// failure.
fn finish_submit(
    state: &AppState,
    user: &User,
    heading: &str,
    action: &str,
    values: &TaskFormValues,
    result: AppResult<Task>,
) -> AppResult<Response> {
    match result {
        Ok(_) => Ok(Redirect::to(DASHBOARD_PATH).into_response()),
        Err(e) if e.kind() == ErrorKind::Validation => {
            Ok(form_page(state, user, heading, action, values, Some(&e))?.into_response())
        }
        Err(e) => Err(e),
    }
}

pub async fn add_form(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> UserResult<Html<String>> {
    form_page(
        &state,
        &user,
        "Add Task",
        ADD_TASK_PATH,
        &TaskFormValues::default(),
        None,
    )
    .for_user(&user)
}

pub async fn add_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(pairs): Form<Vec<(String, String)>>,
) -> UserResult<Response> {
    let values = TaskFormValues::from_pairs(pairs);
    let result = values
        .to_input()
        .and_then(|input| Ok(state.db.create_task(user.id, &input)?));
    finish_submit(&state, &user, "Add Task", ADD_TASK_PATH, &values, result).for_user(&user)
}

pub async fn edit_form(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<i64>,
) -> UserResult<Html<String>> {
    let task = load_owned_task(&state, task_id, &user).for_user(&user)?;
    form_page(
        &state,
        &user,
        "Edit Task",
        &edit_task_path(task_id),
        &TaskFormValues::from_task(&task),
        None,
    )
    .for_user(&user)
}

pub async fn edit_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<i64>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> UserResult<Response> {
    // Ownership first, so another user's id is a 404 even with a bad form.
    load_owned_task(&state, task_id, &user).for_user(&user)?;

    let values = TaskFormValues::from_pairs(pairs);
    let result = values
        .to_input()
        .and_then(|input| Ok(state.db.update_task(task_id, user.id, &input)?));
    finish_submit(
        &state,
        &user,
        "Edit Task",
        &edit_task_path(task_id),
        &values,
        result,
    )
    .for_user(&user)
}

pub async fn delete_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<i64>,
) -> UserResult<Redirect> {
    state.db.delete_task(task_id, user.id).for_user(&user)?;
    Ok(Redirect::to(DASHBOARD_PATH))
}

pub async fn complete_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<i64>,
) -> UserResult<Redirect> {
    state.db.complete_task(task_id, user.id).for_user(&user)?;
    Ok(Redirect::to(DASHBOARD_PATH))
}
