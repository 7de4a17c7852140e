/// Task model and database operations
///
/// Every read and write is scoped by `owner_id`: a task that exists under a
/// different owner is indistinguishable from one that doesn't exist. That
/// keeps other users' task ids from leaking through probing.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     completed BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT tasks_title_not_empty CHECK (length(title) > 0)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// A single task owned by one user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID (UUID v4)
    pub id: Uuid,

    /// Owning user; ownership is exclusive and non-transferable
    pub owner_id: Uuid,

    /// Title, always non-empty
    pub title: String,

    /// Free-form description, empty string when not provided
    pub description: String,

    /// Completion flag
    pub completed: bool,

    /// When the task was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    /// Owning user
    pub owner_id: Uuid,

    /// Title (validated non-empty before it gets here)
    pub title: String,

    /// Description; defaults to the empty string
    pub description: String,
}

/// Partial update for a task
///
/// Only `Some` fields are written; everything else stays untouched. An
/// update with no fields at all is a no-op.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    /// New title
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New completion flag
    pub completed: Option<bool>,
}

impl UpdateTask {
    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.completed.is_none()
    }
}

impl Task {
    /// Creates a new task for the given owner
    pub async fn create<'e>(db: impl PgExecutor<'e>, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (owner_id, title, description)
            VALUES ($1, $2, $3)
            RETURNING id, owner_id, title, description, completed, created_at
            "#,
        )
        .bind(data.owner_id)
        .bind(data.title)
        .bind(data.description)
        .fetch_one(db)
        .await?;

        Ok(task)
    }

    /// Lists all tasks owned by `owner_id`, newest-created first
    pub async fn list_by_owner<'e>(
        db: impl PgExecutor<'e>,
        owner_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, owner_id, title, description, completed, created_at
            FROM tasks
            WHERE owner_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(db)
        .await
    }

    /// Finds a task by id, scoped to its owner
    ///
    /// Returns None both when the id doesn't exist and when it belongs to
    /// someone else.
    pub async fn find_by_owner<'e>(
        db: impl PgExecutor<'e>,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, owner_id, title, description, completed, created_at
            FROM tasks
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(db)
        .await
    }

    /// Applies a partial update to an owned task
    ///
    /// Builds the SET clause from the fields that are present; an empty
    /// update reads the task back unchanged. Concurrent updates to the same
    /// row are last-write-wins.
    ///
    /// # Returns
    ///
    /// The updated task, or None under the same rule as [`Task::find_by_owner`]
    pub async fn update_by_owner<'e, E>(
        db: E,
        id: Uuid,
        owner_id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        if data.is_empty() {
            return Self::find_by_owner(db, id, owner_id).await;
        }

        let mut sets = Vec::new();
        let mut bind_count = 2;

        if data.title.is_some() {
            bind_count += 1;
            sets.push(format!("title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            sets.push(format!("description = ${}", bind_count));
        }
        if data.completed.is_some() {
            bind_count += 1;
            sets.push(format!("completed = ${}", bind_count));
        }

        let query = format!(
            "UPDATE tasks SET {} WHERE id = $1 AND owner_id = $2 \
             RETURNING id, owner_id, title, description, completed, created_at",
            sets.join(", ")
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id).bind(owner_id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(completed) = data.completed {
            q = q.bind(completed);
        }

        q.fetch_optional(db).await
    }

    /// Deletes an owned task
    ///
    /// Not idempotent: once the row is gone a second delete reports false,
    /// which callers surface as not-found.
    ///
    /// # Returns
    ///
    /// True if a row was deleted, false under the same rule as
    /// [`Task::find_by_owner`]
    pub async fn delete_by_owner<'e>(
        db: impl PgExecutor<'e>,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM tasks
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .execute(db)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_task_is_empty() {
        assert!(UpdateTask::default().is_empty());

        let update = UpdateTask {
            completed: Some(true),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_task_serialization_shape() {
        let task = Task {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: "buy milk".to_string(),
            description: String::new(),
            completed: false,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&task).expect("Should serialize");
        assert_eq!(json["title"], "buy milk");
        assert_eq!(json["description"], "");
        assert_eq!(json["completed"], false);
    }
}
