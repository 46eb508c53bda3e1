use mongodb::{Database, IndexModel, options::IndexOptions};
use tracing::info;

use crate::models::{
    Comment, Document, Organization, OrganizationInvitation, OrganizationMember, Project, Sprint,
    Task, User,
};

pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    // Users
    create_indexes(
        db,
        User::COLLECTION,
        vec![
            index_unique(bson::doc! { "email": 1 }),
            index_unique(bson::doc! { "username": 1 }),
        ],
    )
    .await?;

    // Organizations
    create_indexes(
        db,
        Organization::COLLECTION,
        vec![index(bson::doc! { "created_by": 1 })],
    )
    .await?;

    // Organization Members
    create_indexes(
        db,
        OrganizationMember::COLLECTION,
        vec![
            index_unique(bson::doc! { "organization_id": 1, "user_id": 1 }),
            index(bson::doc! { "user_id": 1 }),
        ],
    )
    .await?;

    // Organization Invitations: one pending invitation per (organization, email)
    create_indexes(
        db,
        OrganizationInvitation::COLLECTION,
        vec![
            index_unique(bson::doc! { "token": 1 }),
            index_unique_partial(
                bson::doc! { "organization_id": 1, "email": 1 },
                bson::doc! { "status": "pending" },
            ),
            index(bson::doc! { "organization_id": 1, "status": 1 }),
        ],
    )
    .await?;

    // Projects
    create_indexes(
        db,
        Project::COLLECTION,
        vec![
            index(bson::doc! { "owner_id": 1, "deleted_at": 1 }),
            index(bson::doc! { "organization_id": 1, "deleted_at": 1 }),
            index(bson::doc! { "members": 1 }),
        ],
    )
    .await?;

    // Tasks
    create_indexes(
        db,
        Task::COLLECTION,
        vec![
            index(bson::doc! { "project_id": 1, "status": 1 }),
            index(bson::doc! { "sprint_id": 1 }),
            index(bson::doc! { "assignee_id": 1 }),
        ],
    )
    .await?;

    // Sprints
    create_indexes(
        db,
        Sprint::COLLECTION,
        vec![index(bson::doc! { "project_id": 1, "start_date": 1 })],
    )
    .await?;

    // Documents
    create_indexes(
        db,
        Document::COLLECTION,
        vec![
            index(bson::doc! { "project_id": 1 }),
            index(bson::doc! { "owner_id": 1 }),
            index(bson::doc! { "collaborators": 1 }),
            index(bson::doc! { "is_public": 1 }),
        ],
    )
    .await?;

    // Comments
    create_indexes(
        db,
        Comment::COLLECTION,
        vec![index(bson::doc! { "task_id": 1, "created_at": 1 })],
    )
    .await?;

    info!("All indexes ensured");
    Ok(())
}

fn index(keys: bson::Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

fn index_unique(keys: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

fn index_unique_partial(keys: bson::Document, filter: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(
            IndexOptions::builder()
                .unique(true)
                .partial_filter_expression(filter)
                .build(),
        )
        .build()
}

async fn create_indexes(
    db: &Database,
    collection: &str,
    indexes: Vec<IndexModel>,
) -> Result<(), mongodb::error::Error> {
    db.collection::<bson::Document>(collection)
        .create_indexes(indexes)
        .await?;
    info!(collection, "Indexes created");
    Ok(())
}
