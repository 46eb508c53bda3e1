use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use workhub_db::models::{Project, ProjectState};

use super::base::{BaseDao, DaoError, DaoResult};

pub struct ProjectDao {
    pub base: BaseDao<Project>,
}

impl ProjectDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Project::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        name: String,
        description: Option<String>,
        owner_id: ObjectId,
        organization_id: Option<ObjectId>,
        members: Vec<ObjectId>,
    ) -> DaoResult<Project> {
        let now = DateTime::now();
        let project = Project {
            id: None,
            name,
            description,
            owner_id,
            organization_id,
            members,
            state: ProjectState::Active,
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&project).await?;
        self.base.find_by_id(id).await
    }

    /// Loads a project including soft-deleted ones; access checks decide
    /// what a deleted project means for the caller.
    pub async fn find_any(&self, project_id: ObjectId) -> DaoResult<Project> {
        self.base.find_by_id(project_id).await
    }

    pub async fn find_active(&self, project_id: ObjectId) -> DaoResult<Project> {
        self.base
            .find_one(doc! { "_id": project_id, "deleted_at": null })
            .await?
            .ok_or(DaoError::NotFound)
    }

    /// Projects the user can see: owned, explicitly shared, or belonging to
    /// one of the given organizations.
    pub async fn find_visible(
        &self,
        user_id: ObjectId,
        organization_ids: &[ObjectId],
    ) -> DaoResult<Vec<Project>> {
        self.base
            .find_many(
                doc! {
                    "deleted_at": null,
                    "$or": [
                        { "owner_id": user_id },
                        { "members": user_id },
                        { "organization_id": { "$in": organization_ids.to_vec() } },
                    ],
                },
                Some(doc! { "updated_at": -1 }),
            )
            .await
    }

    pub async fn update(
        &self,
        project_id: ObjectId,
        name: Option<String>,
        description: Option<String>,
    ) -> DaoResult<bool> {
        let mut update = bson::Document::new();
        if let Some(name) = name {
            update.insert("name", name);
        }
        if let Some(description) = description {
            update.insert("description", description);
        }

        if update.is_empty() {
            return Ok(false);
        }

        self.base
            .update_one(
                doc! { "_id": project_id, "deleted_at": null },
                doc! { "$set": update },
            )
            .await
    }

    pub async fn add_member(&self, project_id: ObjectId, user_id: ObjectId) -> DaoResult<bool> {
        self.base
            .update_one(
                doc! { "_id": project_id, "deleted_at": null },
                doc! { "$addToSet": { "members": user_id } },
            )
            .await
    }

    pub async fn remove_member(&self, project_id: ObjectId, user_id: ObjectId) -> DaoResult<bool> {
        self.base
            .update_one(
                doc! { "_id": project_id, "deleted_at": null },
                doc! { "$pull": { "members": user_id } },
            )
            .await
    }

    pub async fn soft_delete(&self, project_id: ObjectId) -> DaoResult<bool> {
        self.base.soft_delete(project_id).await
    }
}
