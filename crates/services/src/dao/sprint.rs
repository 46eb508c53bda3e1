use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use tracing::info;
use workhub_db::models::{Sprint, SprintStatus, Task};

use super::base::{BaseDao, DaoError, DaoResult, Transactions};

pub struct SprintDao {
    pub base: BaseDao<Sprint>,
    tasks: BaseDao<Task>,
    tx: Transactions,
}

impl SprintDao {
    pub fn new(db: &Database, tx: Transactions) -> Self {
        Self {
            base: BaseDao::new(db, Sprint::COLLECTION),
            tasks: BaseDao::new(db, Task::COLLECTION),
            tx,
        }
    }

    pub async fn create(
        &self,
        project_id: ObjectId,
        name: String,
        goal: Option<String>,
        start_date: Option<DateTime>,
        end_date: Option<DateTime>,
        created_by: ObjectId,
    ) -> DaoResult<Sprint> {
        let now = DateTime::now();
        let sprint = Sprint {
            id: None,
            project_id,
            name,
            goal,
            start_date,
            end_date,
            status: SprintStatus::Planned,
            created_by,
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&sprint).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find_in_project(
        &self,
        project_id: ObjectId,
        sprint_id: ObjectId,
    ) -> DaoResult<Sprint> {
        self.base
            .find_one(doc! { "_id": sprint_id, "project_id": project_id })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn find_by_project(&self, project_id: ObjectId) -> DaoResult<Vec<Sprint>> {
        self.base
            .find_many(
                doc! { "project_id": project_id },
                Some(doc! { "start_date": 1, "created_at": 1 }),
            )
            .await
    }

    /// Moves the sprint's tasks back to the backlog and deletes the sprint
    /// in one transaction.
    pub async fn delete(&self, project_id: ObjectId, sprint_id: ObjectId) -> DaoResult<u64> {
        let now = DateTime::now();
        let mut session = self.tx.begin().await?;

        let detached = self
            .tasks
            .collection()
            .update_many(
                doc! { "project_id": project_id, "sprint_id": sprint_id },
                doc! { "$set": { "sprint_id": null, "updated_at": now } },
            )
            .session(&mut session)
            .await?;

        let deleted = self
            .base
            .collection()
            .delete_one(doc! { "_id": sprint_id, "project_id": project_id })
            .session(&mut session)
            .await?;

        if deleted.deleted_count == 0 {
            return Err(DaoError::NotFound);
        }

        self.tx.commit(&mut session).await?;
        info!(%sprint_id, detached = detached.modified_count, "Sprint deleted");
        Ok(detached.modified_count)
    }
}
