use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use workhub_db::models::{GlobalRole, User};

use super::base::{BaseDao, DaoError, DaoResult};

pub struct UserDao {
    pub base: BaseDao<User>,
}

/// Lowercases and trims an email address. Every email that reaches the
/// database or an equality check goes through here.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl UserDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, User::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        email: &str,
        username: String,
        display_name: String,
        password_hash: String,
        role: GlobalRole,
    ) -> DaoResult<User> {
        let now = DateTime::now();
        let user = User {
            id: None,
            email: normalize_email(email),
            username,
            display_name,
            avatar: None,
            password_hash: Some(password_hash),
            role,
            last_active_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let id = self.base.insert_one(&user).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find_active(&self, user_id: ObjectId) -> DaoResult<User> {
        self.base
            .find_one(doc! { "_id": user_id, "deleted_at": null })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn find_by_email(&self, email: &str) -> DaoResult<User> {
        self.base
            .find_one(doc! { "email": normalize_email(email), "deleted_at": null })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn find_by_username(&self, username: &str) -> DaoResult<User> {
        self.base
            .find_one(doc! { "username": username, "deleted_at": null })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn touch(&self, user_id: ObjectId) -> DaoResult<bool> {
        self.base
            .update_by_id(user_id, doc! { "$set": { "last_active_at": DateTime::now() } })
            .await
    }
}
