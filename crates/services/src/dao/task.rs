use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use tracing::info;
use workhub_db::models::{Comment, Task, TaskPriority, TaskStatus, TaskType};

use super::base::{BaseDao, DaoError, DaoResult, Transactions};

pub struct TaskDao {
    pub base: BaseDao<Task>,
    comments: BaseDao<Comment>,
    tx: Transactions,
}

/// Fields accepted when creating a task.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub task_type: TaskType,
    pub assignee_id: Option<ObjectId>,
    pub sprint_id: Option<ObjectId>,
    pub epic_id: Option<ObjectId>,
    pub due_date: Option<DateTime>,
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub task_type: Option<TaskType>,
    pub assignee_id: Option<ObjectId>,
    pub sprint_id: Option<ObjectId>,
    pub epic_id: Option<ObjectId>,
    pub due_date: Option<DateTime>,
}

impl TaskDao {
    pub fn new(db: &Database, tx: Transactions) -> Self {
        Self {
            base: BaseDao::new(db, Task::COLLECTION),
            comments: BaseDao::new(db, Comment::COLLECTION),
            tx,
        }
    }

    pub async fn create(
        &self,
        project_id: ObjectId,
        reporter_id: ObjectId,
        new_task: NewTask,
    ) -> DaoResult<Task> {
        let now = DateTime::now();
        let task = Task {
            id: None,
            project_id,
            title: new_task.title,
            description: new_task.description,
            status: new_task.status,
            priority: new_task.priority,
            task_type: new_task.task_type,
            assignee_id: new_task.assignee_id,
            reporter_id: Some(reporter_id),
            sprint_id: new_task.sprint_id,
            epic_id: new_task.epic_id,
            due_date: new_task.due_date,
            created_by: reporter_id,
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&task).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find(&self, task_id: ObjectId) -> DaoResult<Task> {
        self.base.find_by_id(task_id).await
    }

    pub async fn find_by_project(
        &self,
        project_id: ObjectId,
        status: Option<TaskStatus>,
        sprint_id: Option<ObjectId>,
    ) -> DaoResult<Vec<Task>> {
        let mut filter = doc! { "project_id": project_id };
        if let Some(status) = status {
            filter.insert("status", bson::to_bson(&status)?);
        }
        if let Some(sprint_id) = sprint_id {
            filter.insert("sprint_id", sprint_id);
        }
        self.base
            .find_many(filter, Some(doc! { "created_at": 1 }))
            .await
    }

    pub async fn update(&self, task_id: ObjectId, changes: TaskChanges) -> DaoResult<bool> {
        let mut update = bson::Document::new();
        if let Some(title) = changes.title {
            update.insert("title", title);
        }
        if let Some(description) = changes.description {
            update.insert("description", description);
        }
        if let Some(status) = changes.status {
            update.insert("status", bson::to_bson(&status)?);
        }
        if let Some(priority) = changes.priority {
            update.insert("priority", bson::to_bson(&priority)?);
        }
        if let Some(task_type) = changes.task_type {
            update.insert("task_type", bson::to_bson(&task_type)?);
        }
        if let Some(assignee_id) = changes.assignee_id {
            update.insert("assignee_id", assignee_id);
        }
        if let Some(sprint_id) = changes.sprint_id {
            update.insert("sprint_id", sprint_id);
        }
        if let Some(epic_id) = changes.epic_id {
            update.insert("epic_id", epic_id);
        }
        if let Some(due_date) = changes.due_date {
            update.insert("due_date", due_date);
        }

        if update.is_empty() {
            return Ok(false);
        }

        self.base
            .update_by_id(task_id, doc! { "$set": update })
            .await
    }

    /// Deletes the task with its comments and detaches any tasks that
    /// pointed at it as their epic, in one transaction.
    pub async fn delete(&self, task_id: ObjectId) -> DaoResult<()> {
        let now = DateTime::now();
        let mut session = self.tx.begin().await?;

        let deleted = self
            .base
            .collection()
            .delete_one(doc! { "_id": task_id })
            .session(&mut session)
            .await?;
        if deleted.deleted_count == 0 {
            return Err(DaoError::NotFound);
        }

        self.base
            .collection()
            .update_many(
                doc! { "epic_id": task_id },
                doc! { "$set": { "epic_id": null, "updated_at": now } },
            )
            .session(&mut session)
            .await?;
        let comments = self
            .comments
            .collection()
            .delete_many(doc! { "task_id": task_id })
            .session(&mut session)
            .await?;

        self.tx.commit(&mut session).await?;
        info!(%task_id, comments = comments.deleted_count, "Task deleted");
        Ok(())
    }
}
