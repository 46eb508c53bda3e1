use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use workhub_db::models::{DocType, Document};

use super::base::{BaseDao, DaoResult};

pub struct DocumentDao {
    pub base: BaseDao<Document>,
}

#[derive(Debug, Clone, Default)]
pub struct NewDocument {
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    pub doc_type: DocType,
    pub tags: Vec<String>,
    pub collaborators: Vec<ObjectId>,
    pub is_public: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub doc_type: Option<DocType>,
    pub tags: Option<Vec<String>>,
    pub collaborators: Option<Vec<ObjectId>>,
    pub is_public: Option<bool>,
}

impl DocumentDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Document::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        owner_id: ObjectId,
        project_id: Option<ObjectId>,
        new_document: NewDocument,
    ) -> DaoResult<Document> {
        let now = DateTime::now();
        let document = Document {
            id: None,
            project_id,
            owner_id,
            title: new_document.title,
            content: new_document.content,
            summary: new_document.summary,
            doc_type: new_document.doc_type,
            tags: new_document.tags,
            collaborators: new_document.collaborators,
            is_public: new_document.is_public,
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&document).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find(&self, document_id: ObjectId) -> DaoResult<Document> {
        self.base.find_by_id(document_id).await
    }

    /// Candidate set for listing: public, owned, shared, or inside one of
    /// the given projects. The caller still filters per document.
    pub async fn find_candidates(
        &self,
        user_id: ObjectId,
        project_ids: &[ObjectId],
    ) -> DaoResult<Vec<Document>> {
        self.base
            .find_many(
                doc! {
                    "$or": [
                        { "is_public": true },
                        { "owner_id": user_id },
                        { "collaborators": user_id },
                        { "project_id": { "$in": project_ids.to_vec() } },
                    ],
                },
                Some(doc! { "updated_at": -1 }),
            )
            .await
    }

    pub async fn update(&self, document_id: ObjectId, changes: DocumentChanges) -> DaoResult<bool> {
        let mut update = bson::Document::new();
        if let Some(title) = changes.title {
            update.insert("title", title);
        }
        if let Some(content) = changes.content {
            update.insert("content", content);
        }
        if let Some(summary) = changes.summary {
            update.insert("summary", summary);
        }
        if let Some(doc_type) = changes.doc_type {
            update.insert("doc_type", bson::to_bson(&doc_type)?);
        }
        if let Some(tags) = changes.tags {
            update.insert("tags", tags);
        }
        if let Some(collaborators) = changes.collaborators {
            update.insert("collaborators", collaborators);
        }
        if let Some(is_public) = changes.is_public {
            update.insert("is_public", is_public);
        }

        if update.is_empty() {
            return Ok(false);
        }

        self.base
            .update_by_id(document_id, doc! { "$set": update })
            .await
    }

    pub async fn delete(&self, document_id: ObjectId) -> DaoResult<bool> {
        let deleted = self.base.hard_delete(doc! { "_id": document_id }).await?;
        Ok(deleted > 0)
    }
}
