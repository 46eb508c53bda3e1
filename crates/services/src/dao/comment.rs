use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use workhub_db::models::Comment;

use super::base::{BaseDao, DaoError, DaoResult};

pub struct CommentDao {
    pub base: BaseDao<Comment>,
}

impl CommentDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Comment::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        task_id: ObjectId,
        author_id: ObjectId,
        content: String,
        parent_comment_id: Option<ObjectId>,
    ) -> DaoResult<Comment> {
        // Replies must stay on the same task as their parent
        if let Some(parent_id) = parent_comment_id {
            self.base
                .find_one(doc! { "_id": parent_id, "task_id": task_id })
                .await?
                .ok_or(DaoError::NotFound)?;
        }

        let now = DateTime::now();
        let comment = Comment {
            id: None,
            task_id,
            author_id,
            content,
            parent_comment_id,
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&comment).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find_by_task(&self, task_id: ObjectId) -> DaoResult<Vec<Comment>> {
        self.base
            .find_many(doc! { "task_id": task_id }, Some(doc! { "created_at": 1 }))
            .await
    }
}
