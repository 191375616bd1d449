use crate::{
    auth::AuthenticatedUserId,
    error::AppError,
    models::{BulkAction, BulkUpdateRequest, BulkUpdateResponse, Task, TaskInput, TaskQuery, TaskStats, TaskUpdate},
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

const TASK_COLUMNS: &str =
    "id, title, description, completed, priority, due_date, category, created_at, updated_at, user_id";

/// Retrieves a list of tasks for the authenticated user.
///
/// Supports filtering by `completed`, `priority` (case-insensitive) and a
/// `search` term matched against title and description. Filters combine
/// conjunctively. Results are always ordered by creation date, newest
/// first, and each task carries the derived `is_overdue` flag.
///
/// ## Query Parameters:
/// - `completed` (optional): `true` or `false`.
/// - `priority` (optional): `low`, `medium`, or `high` in any casing.
/// - `search` (optional): substring to look for in titles and descriptions.
///
/// ## Responses:
/// - `200 OK`: JSON array of `Task` objects.
/// - `401 Unauthorized`: missing or invalid token.
/// - `500 Internal Server Error`: store failure.
#[get("")]
#[allow(unused_assignments)]
pub async fn get_tasks(
    pool: web::Data<PgPool>,
    query_params: web::Query<TaskQuery>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let AuthenticatedUserId(user_id) = user;

    // Base query selects the owner's tasks; filter predicates are appended
    // dynamically. The owner predicate is always first and never optional.
    let mut sql = format!("SELECT {} FROM tasks WHERE user_id = $1", TASK_COLUMNS);
    let mut param_count = 2;

    if query_params.completed.is_some() {
        sql.push_str(&format!(" AND completed = ${}", param_count));
        param_count += 1;
    }
    if query_params.priority.is_some() {
        sql.push_str(&format!(" AND priority = ${}", param_count));
        param_count += 1;
    }
    if query_params.search.is_some() {
        sql.push_str(&format!(
            " AND (title ILIKE ${} OR description ILIKE ${})",
            param_count,
            param_count + 1
        ));
        param_count += 2;
    }

    sql.push_str(" ORDER BY created_at DESC");

    let mut query_builder = sqlx::query_as::<_, Task>(&sql).bind(user_id);

    if let Some(completed) = query_params.completed {
        query_builder = query_builder.bind(completed);
    }
    if let Some(priority) = query_params.priority {
        query_builder = query_builder.bind(priority);
    }
    if let Some(search) = &query_params.search {
        let search_pattern = format!("%{}%", search);
        query_builder = query_builder.bind(search_pattern.clone());
        query_builder = query_builder.bind(search_pattern);
    }

    let tasks: Vec<Task> = query_builder
        .fetch_all(&**pool)
        .await?
        .into_iter()
        .map(Task::with_overdue)
        .collect();

    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new task owned by the authenticated user.
///
/// The title is trimmed and must be non-empty; priority defaults to medium.
/// The task starts out not completed, with `created_at`/`updated_at` set to
/// now.
///
/// ## Request Body:
/// `{ title, description?, priority?, due_date?, category? }`
///
/// ## Responses:
/// - `201 Created`: the created `Task`.
/// - `401 Unauthorized`: missing or invalid token.
/// - `422 Unprocessable Entity`: validation failure (e.g. blank title).
/// - `500 Internal Server Error`: store failure.
#[post("")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    task_data: web::Json<TaskInput>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = Task::new(task_data.into_inner(), user.0);

    let sql = format!(
        "INSERT INTO tasks (id, title, description, completed, priority, due_date, category, user_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING {}",
        TASK_COLUMNS
    );
    let created = sqlx::query_as::<_, Task>(&sql)
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.completed)
        .bind(task.priority)
        .bind(task.due_date)
        .bind(&task.category)
        .bind(task.user_id)
        .fetch_one(&**pool)
        .await?;

    log::info!("task {} created by user {}", created.id, user.0);

    Ok(HttpResponse::Created().json(created.with_overdue()))
}

/// Retrieves a specific task by its ID.
///
/// The lookup is owner-scoped: a task that does not exist and a task owned
/// by another user produce the same 404.
#[get("/{id}")]
pub async fn get_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let sql = format!("SELECT {} FROM tasks WHERE id = $1 AND user_id = $2", TASK_COLUMNS);
    let task = sqlx::query_as::<_, Task>(&sql)
        .bind(task_id.into_inner())
        .bind(user.0)
        .fetch_optional(&**pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    Ok(HttpResponse::Ok().json(task.with_overdue()))
}

/// Updates an existing task owned by the authenticated user.
///
/// Accepts any subset of mutable fields; omitted fields keep their stored
/// values. A supplied title is trimmed and validated like on creation.
/// `updated_at` is refreshed on every successful update.
///
/// ## Responses:
/// - `200 OK`: the updated `Task`.
/// - `401 Unauthorized`: missing or invalid token.
/// - `404 Not Found`: task absent or owned by another user.
/// - `422 Unprocessable Entity`: validation failure.
/// - `500 Internal Server Error`: store failure.
#[put("/{id}")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    task_data: web::Json<TaskUpdate>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let sql = format!(
        "UPDATE tasks \
         SET title = COALESCE($1, title), \
             description = COALESCE($2, description), \
             completed = COALESCE($3, completed), \
             priority = COALESCE($4, priority), \
             due_date = COALESCE($5, due_date), \
             category = COALESCE($6, category), \
             updated_at = NOW() \
         WHERE id = $7 AND user_id = $8 \
         RETURNING {}",
        TASK_COLUMNS
    );
    let updated = sqlx::query_as::<_, Task>(&sql)
        .bind(task_data.title.as_deref().map(str::trim))
        .bind(&task_data.description)
        .bind(task_data.completed)
        .bind(task_data.priority)
        .bind(task_data.due_date)
        .bind(&task_data.category)
        .bind(task_id.into_inner())
        .bind(user.0)
        .fetch_optional(&**pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    Ok(HttpResponse::Ok().json(updated.with_overdue()))
}

/// Deletes a task by its ID, if owned by the authenticated user.
///
/// ## Responses:
/// - `204 No Content`: deleted.
/// - `404 Not Found`: task absent or owned by another user.
#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
        .bind(task_id.into_inner())
        .bind(user.0)
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Task not found".into()));
    }

    Ok(HttpResponse::NoContent().finish())
}

/// Computes aggregate statistics over the authenticated user's tasks.
///
/// Returns total/completed/pending counts, the completion rate (0 when the
/// user has no tasks) and a per-priority breakdown. A single aggregate
/// query supplies every count, so the numbers always describe one snapshot
/// even under concurrent mutations.
#[get("/stats")]
pub async fn get_task_stats(
    pool: web::Data<PgPool>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let (total, completed, high, medium, low): (i64, i64, i64, i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), \
                COUNT(*) FILTER (WHERE completed), \
                COUNT(*) FILTER (WHERE priority = 'high'), \
                COUNT(*) FILTER (WHERE priority = 'medium'), \
                COUNT(*) FILTER (WHERE priority = 'low') \
         FROM tasks WHERE user_id = $1",
    )
    .bind(user.0)
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(TaskStats::from_counts(total, completed, high, medium, low)))
}

/// Applies one action to a set of the authenticated user's tasks.
///
/// Ids not owned by the caller (or nonexistent) are silently skipped; the
/// returned count covers only rows actually affected. The whole operation
/// runs in a single transaction.
///
/// ## Request Body:
/// `{ task_ids: [uuid], action: "complete" | "incomplete" | "delete" }`
///
/// ## Responses:
/// - `200 OK`: `{ message, updated_count }`.
/// - `401 Unauthorized`: missing or invalid token.
/// - `422 Unprocessable Entity`: missing fields or unrecognized action;
///   nothing has been mutated.
/// - `500 Internal Server Error`: store failure (transaction rolled back).
#[post("/bulk-update")]
pub async fn bulk_update_tasks(
    pool: web::Data<PgPool>,
    body: web::Json<BulkUpdateRequest>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let request = body.into_inner();

    // Validate before touching the store.
    if request.task_ids.is_empty() || request.action.trim().is_empty() {
        return Err(AppError::ValidationError(
            "task_ids and action are required".into(),
        ));
    }
    let action: BulkAction = request.action.parse().map_err(AppError::ValidationError)?;

    let mut tx = pool.begin().await?;

    let affected = match action {
        BulkAction::Complete => {
            sqlx::query(
                "UPDATE tasks SET completed = TRUE, updated_at = NOW() \
                 WHERE user_id = $1 AND id = ANY($2)",
            )
            .bind(user.0)
            .bind(&request.task_ids)
            .execute(&mut *tx)
            .await?
            .rows_affected()
        }
        BulkAction::Incomplete => {
            sqlx::query(
                "UPDATE tasks SET completed = FALSE, updated_at = NOW() \
                 WHERE user_id = $1 AND id = ANY($2)",
            )
            .bind(user.0)
            .bind(&request.task_ids)
            .execute(&mut *tx)
            .await?
            .rows_affected()
        }
        BulkAction::Delete => {
            sqlx::query("DELETE FROM tasks WHERE user_id = $1 AND id = ANY($2)")
                .bind(user.0)
                .bind(&request.task_ids)
                .execute(&mut *tx)
                .await?
                .rows_affected()
        }
    };

    tx.commit().await?;

    log::info!(
        "bulk update: {} tasks {} by user {}",
        affected,
        action.past_tense(),
        user.0
    );

    Ok(HttpResponse::Ok().json(BulkUpdateResponse {
        message: format!("{} tasks {} successfully", affected, action.past_tense()),
        updated_count: affected,
    }))
}
