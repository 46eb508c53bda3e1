use std::sync::Arc;

use bson::oid::ObjectId;
use tracing::debug;
use workhub_db::models::{Document, OrgRole, Organization, Project, Task};

use super::error::{AccessError, AccessResult};
use super::{AccessMode, Principal, ProjectAccess, rules};
use crate::dao::{
    base::DaoError, document::DocumentDao, organization::OrganizationDao, project::ProjectDao,
    task::TaskDao,
};

/// Loads the records a permission decision needs and applies [`rules`].
pub struct AccessResolver {
    organizations: Arc<OrganizationDao>,
    projects: Arc<ProjectDao>,
    tasks: Arc<TaskDao>,
    documents: Arc<DocumentDao>,
}

impl AccessResolver {
    pub fn new(
        organizations: Arc<OrganizationDao>,
        projects: Arc<ProjectDao>,
        tasks: Arc<TaskDao>,
        documents: Arc<DocumentDao>,
    ) -> Self {
        Self {
            organizations,
            projects,
            tasks,
            documents,
        }
    }

    // -- Organizations --

    /// The caller's role in the organization, or `None` without a membership row.
    pub async fn resolve_org_role(
        &self,
        user_id: ObjectId,
        organization_id: ObjectId,
    ) -> AccessResult<Option<OrgRole>> {
        Ok(self
            .organizations
            .member_role(organization_id, user_id)
            .await?)
    }

    async fn load_organization(&self, organization_id: ObjectId) -> AccessResult<Organization> {
        self.organizations
            .find(organization_id)
            .await
            .map_err(AccessError::missing("Organization"))
    }

    /// Any membership row is enough. Missing organization is NotFound,
    /// missing membership is Forbidden.
    pub async fn require_member(
        &self,
        principal: &Principal,
        organization_id: ObjectId,
    ) -> AccessResult<(Organization, OrgRole)> {
        let organization = self.load_organization(organization_id).await?;
        match self.resolve_org_role(principal.user_id, organization_id).await? {
            Some(role) => Ok((organization, role)),
            None => {
                debug!(user_id = %principal.user_id, %organization_id, "Not an organization member");
                Err(AccessError::forbidden("You are not a member of this organization"))
            }
        }
    }

    pub async fn require_owner(
        &self,
        principal: &Principal,
        organization_id: ObjectId,
    ) -> AccessResult<Organization> {
        let (organization, role) = self.require_member(principal, organization_id).await?;
        if role != OrgRole::Owner {
            debug!(user_id = %principal.user_id, %organization_id, %role, "Owner role required");
            return Err(AccessError::forbidden(
                "Only the organization owner can perform this action",
            ));
        }
        Ok(organization)
    }

    pub async fn require_owner_or_admin(
        &self,
        principal: &Principal,
        organization_id: ObjectId,
    ) -> AccessResult<(Organization, OrgRole)> {
        let (organization, role) = self.require_member(principal, organization_id).await?;
        if !role.is_owner_or_admin() {
            debug!(user_id = %principal.user_id, %organization_id, %role, "Owner or admin role required");
            return Err(AccessError::forbidden(
                "Only organization owners and admins can perform this action",
            ));
        }
        Ok((organization, role))
    }

    // -- Projects --

    async fn role_for_project(
        &self,
        principal: &Principal,
        project: &Project,
    ) -> AccessResult<Option<OrgRole>> {
        match project.organization_id {
            Some(organization_id) => {
                self.resolve_org_role(principal.user_id, organization_id)
                    .await
            }
            None => Ok(None),
        }
    }

    async fn load_project(&self, project_id: ObjectId) -> AccessResult<Option<Project>> {
        match self.projects.find_any(project_id).await {
            Ok(project) => Ok(Some(project)),
            Err(DaoError::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn resolve_project_access(
        &self,
        principal: &Principal,
        project_id: ObjectId,
    ) -> AccessResult<ProjectAccess> {
        let Some(project) = self.load_project(project_id).await? else {
            return Ok(ProjectAccess::NotFound);
        };
        let role = self.role_for_project(principal, &project).await?;
        Ok(rules::project_access(principal, &project, role))
    }

    /// Loads the project if the caller holds `mode` on it.
    pub async fn authorize_project(
        &self,
        principal: &Principal,
        project_id: ObjectId,
        mode: AccessMode,
    ) -> AccessResult<Project> {
        let project = self
            .load_project(project_id)
            .await?
            .ok_or(AccessError::NotFound("Project"))?;
        let role = self.role_for_project(principal, &project).await?;
        let access = rules::project_access(principal, &project, role);
        if let Err(e) = access.require(mode) {
            debug!(user_id = %principal.user_id, %project_id, ?access, ?mode, "Project access denied");
            return Err(e);
        }
        Ok(project)
    }

    /// Gate for creating a project, standalone or inside an organization.
    pub async fn authorize_project_creation(
        &self,
        principal: &Principal,
        organization_id: Option<ObjectId>,
    ) -> AccessResult<()> {
        let organization = match organization_id {
            None => None,
            Some(organization_id) => {
                self.organizations
                    .find(organization_id)
                    .await
                    .map_err(|e| match e {
                        DaoError::NotFound => {
                            AccessError::InvalidReference("organization does not exist".to_string())
                        }
                        other => other.into(),
                    })?;
                Some(
                    self.resolve_org_role(principal.user_id, organization_id)
                        .await?,
                )
            }
        };

        if !rules::can_create_project(principal, organization) {
            debug!(user_id = %principal.user_id, ?organization_id, "Project creation denied");
            return Err(match organization_id {
                None => AccessError::forbidden(
                    "Only owners and admins can create projects outside an organization",
                ),
                Some(_) => AccessError::forbidden(
                    "Only the organization owner can create projects in this organization",
                ),
            });
        }
        Ok(())
    }

    // -- Tasks --

    async fn load_task_with_project(&self, task_id: ObjectId) -> AccessResult<(Task, Project)> {
        let task = self
            .tasks
            .find(task_id)
            .await
            .map_err(AccessError::missing("Task"))?;
        let project = self
            .load_project(task.project_id)
            .await?
            .ok_or(AccessError::NotFound("Project"))?;
        Ok((task, project))
    }

    /// Whether the caller may view or edit the task. NotFound when the task
    /// or its parent project is missing or deleted.
    pub async fn resolve_task_access(
        &self,
        principal: &Principal,
        task_id: ObjectId,
        mode: AccessMode,
    ) -> AccessResult<bool> {
        let (_, project) = self.load_task_with_project(task_id).await?;
        let role = self.role_for_project(principal, &project).await?;
        rules::task_access(principal, &project, role, mode)
    }

    pub async fn authorize_task(
        &self,
        principal: &Principal,
        task_id: ObjectId,
        mode: AccessMode,
    ) -> AccessResult<(Task, Project)> {
        let (task, project) = self.load_task_with_project(task_id).await?;
        let role = self.role_for_project(principal, &project).await?;
        if !rules::task_access(principal, &project, role, mode)? {
            debug!(user_id = %principal.user_id, %task_id, ?mode, "Task access denied");
            return Err(match mode {
                AccessMode::View => AccessError::forbidden("You do not have access to this task"),
                AccessMode::Edit => AccessError::forbidden(
                    "Only the project owner or organization owners and admins can modify tasks",
                ),
            });
        }
        Ok((task, project))
    }

    pub async fn authorize_task_creation(
        &self,
        principal: &Principal,
        project_id: ObjectId,
    ) -> AccessResult<Project> {
        let project = self
            .load_project(project_id)
            .await?
            .ok_or(AccessError::NotFound("Project"))?;
        let role = self.role_for_project(principal, &project).await?;
        if !rules::can_create_task(principal, &project, role)? {
            debug!(user_id = %principal.user_id, %project_id, "Task creation denied");
            return Err(AccessError::forbidden(
                "Only the project owner or organization owners and admins can create tasks",
            ));
        }
        Ok(project)
    }

    // -- Documents --

    async fn document_parent(
        &self,
        principal: &Principal,
        document: &Document,
    ) -> AccessResult<Option<(Project, Option<OrgRole>)>> {
        let Some(project_id) = document.project_id else {
            return Ok(None);
        };
        let Some(project) = self.load_project(project_id).await? else {
            return Ok(None);
        };
        let role = self.role_for_project(principal, &project).await?;
        Ok(Some((project, role)))
    }

    /// Whether `document` is visible to the caller. Used for listings where
    /// the document is already loaded.
    pub async fn document_visible(
        &self,
        principal: &Principal,
        document: &Document,
    ) -> AccessResult<bool> {
        let parent = self.document_parent(principal, document).await?;
        Ok(rules::document_access(
            principal,
            document,
            parent.as_ref().map(|(p, r)| (p, *r)),
            AccessMode::View,
        ))
    }

    pub async fn resolve_document_access(
        &self,
        principal: &Principal,
        document_id: ObjectId,
        mode: AccessMode,
    ) -> AccessResult<bool> {
        let document = self
            .documents
            .find(document_id)
            .await
            .map_err(AccessError::missing("Document"))?;
        let parent = self.document_parent(principal, &document).await?;
        Ok(rules::document_access(
            principal,
            &document,
            parent.as_ref().map(|(p, r)| (p, *r)),
            mode,
        ))
    }

    pub async fn authorize_document(
        &self,
        principal: &Principal,
        document_id: ObjectId,
        mode: AccessMode,
    ) -> AccessResult<Document> {
        let document = self
            .documents
            .find(document_id)
            .await
            .map_err(AccessError::missing("Document"))?;
        let parent = self.document_parent(principal, &document).await?;
        let allowed = rules::document_access(
            principal,
            &document,
            parent.as_ref().map(|(p, r)| (p, *r)),
            mode,
        );
        if !allowed {
            debug!(user_id = %principal.user_id, %document_id, ?mode, "Document access denied");
            return Err(match mode {
                AccessMode::View => {
                    AccessError::forbidden("You do not have access to this document")
                }
                AccessMode::Edit => AccessError::forbidden(
                    "Only the document owner or organization owner can modify this document",
                ),
            });
        }
        Ok(document)
    }

    /// Gate for creating a document; returns the parent project if any.
    pub async fn authorize_document_creation(
        &self,
        principal: &Principal,
        project_id: Option<ObjectId>,
    ) -> AccessResult<Option<Project>> {
        let parent = match project_id {
            None => None,
            Some(project_id) => {
                let project = self
                    .load_project(project_id)
                    .await?
                    .filter(|p| !p.is_deleted())
                    .ok_or(AccessError::NotFound("Project"))?;
                let role = self.role_for_project(principal, &project).await?;
                Some((project, role))
            }
        };

        if !rules::can_create_document(principal, parent.as_ref().map(|(p, r)| (p, *r))) {
            debug!(user_id = %principal.user_id, ?project_id, "Document creation denied");
            return Err(match project_id {
                None => AccessError::forbidden(
                    "Only owners and admins can create documents outside a project",
                ),
                Some(_) => AccessError::forbidden(
                    "Only the project owner or organization owner can create documents in this project",
                ),
            });
        }
        Ok(parent.map(|(p, _)| p))
    }
}
