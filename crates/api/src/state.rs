use mongodb::{Client, Database};
use std::sync::Arc;
use workhub_config::Settings;
use workhub_services::{
    AccessResolver, AuthService, DisabledMailer, InvitationService, InviteMailer,
    OrganizationService, SmtpMailer, TaskGenerator,
    dao::{
        base::Transactions, comment::CommentDao, document::DocumentDao,
        organization::OrganizationDao, project::ProjectDao, sprint::SprintDao, task::TaskDao,
        user::UserDao,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: Settings,
    pub auth: Arc<AuthService>,
    pub users: Arc<UserDao>,
    pub organizations: Arc<OrganizationDao>,
    pub projects: Arc<ProjectDao>,
    pub tasks: Arc<TaskDao>,
    pub sprints: Arc<SprintDao>,
    pub documents: Arc<DocumentDao>,
    pub comments: Arc<CommentDao>,
    pub access: Arc<AccessResolver>,
    pub organization_service: Arc<OrganizationService>,
    pub invitations: Arc<InvitationService>,
    pub task_generator: TaskGenerator,
}

impl AppState {
    pub fn new(client: Client, db: Database, settings: Settings) -> anyhow::Result<Self> {
        let tx = Transactions::new(client, settings.database.use_transactions);

        let auth = Arc::new(AuthService::new(settings.jwt.clone()));
        let users = Arc::new(UserDao::new(&db));
        let organizations = Arc::new(OrganizationDao::new(&db, tx.clone()));
        let projects = Arc::new(ProjectDao::new(&db));
        let tasks = Arc::new(TaskDao::new(&db, tx.clone()));
        let sprints = Arc::new(SprintDao::new(&db, tx));
        let documents = Arc::new(DocumentDao::new(&db));
        let comments = Arc::new(CommentDao::new(&db));

        let access = Arc::new(AccessResolver::new(
            organizations.clone(),
            projects.clone(),
            tasks.clone(),
            documents.clone(),
        ));

        let mailer: Arc<dyn InviteMailer> = match SmtpMailer::from_settings(&settings.smtp)? {
            Some(mailer) => Arc::new(mailer),
            None => Arc::new(DisabledMailer),
        };

        let organization_service =
            Arc::new(OrganizationService::new(organizations.clone(), access.clone()));
        let invitations = Arc::new(InvitationService::new(
            organizations.clone(),
            users.clone(),
            access.clone(),
            mailer,
            settings.app.public_url.clone(),
            settings.invitation.ttl_days,
        ));
        let task_generator = TaskGenerator::new(&settings.ai);

        Ok(Self {
            db,
            settings,
            auth,
            users,
            organizations,
            projects,
            tasks,
            sprints,
            documents,
            comments,
            access,
            organization_service,
            invitations,
            task_generator,
        })
    }
}
