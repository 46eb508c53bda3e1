//! Permission matrix checks against the pure rule layer. No database.

use bson::{DateTime, oid::ObjectId};
use workhub_db::models::{
    DocType, Document, GlobalRole, OrgRole, OrganizationSettings, Project, ProjectState,
};
use workhub_services::access::rules;
use workhub_services::{AccessError, AccessMode, Principal, ProjectAccess};

const ALL_ORG_ROLES: [Option<OrgRole>; 4] = [
    None,
    Some(OrgRole::Member),
    Some(OrgRole::Admin),
    Some(OrgRole::Owner),
];

const ALL_GLOBAL_ROLES: [GlobalRole; 3] = [GlobalRole::Member, GlobalRole::Owner, GlobalRole::Admin];

fn principal(role: GlobalRole) -> Principal {
    Principal::new(ObjectId::new(), "someone@example.com", role)
}

fn project(owner_id: ObjectId, organization_id: Option<ObjectId>) -> Project {
    let now = DateTime::now();
    Project {
        id: Some(ObjectId::new()),
        name: "Roadmap".to_string(),
        description: None,
        owner_id,
        organization_id,
        members: Vec::new(),
        state: ProjectState::Active,
        created_at: now,
        updated_at: now,
    }
}

fn deleted(mut project: Project) -> Project {
    project.state = ProjectState::Deleted { at: DateTime::now() };
    project
}

fn document(owner_id: ObjectId, project_id: Option<ObjectId>) -> Document {
    let now = DateTime::now();
    Document {
        id: Some(ObjectId::new()),
        project_id,
        owner_id,
        title: "Notes".to_string(),
        content: String::new(),
        summary: None,
        doc_type: DocType::Note,
        tags: Vec::new(),
        collaborators: Vec::new(),
        is_public: false,
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn deleted_project_is_not_found_for_everyone_but_global_admin() {
    let org_id = ObjectId::new();
    for global in ALL_GLOBAL_ROLES {
        let caller = principal(global);
        // Even the owner and the org OWNER lose access once deleted
        let owned = deleted(project(caller.user_id, Some(org_id)));
        for role in ALL_ORG_ROLES {
            let access = rules::project_access(&caller, &owned, role);
            if global == GlobalRole::Admin {
                assert_eq!(access, ProjectAccess::View);
            } else {
                assert_eq!(access, ProjectAccess::NotFound, "{global:?} / {role:?}");
            }
        }
    }
}

#[test]
fn deleted_project_is_never_editable() {
    let admin = principal(GlobalRole::Admin);
    let owned = deleted(project(admin.user_id, None));
    assert!(rules::project_access(&admin, &owned, None).require(AccessMode::Edit).is_err());
    assert!(matches!(
        rules::task_access(&admin, &owned, None, AccessMode::Edit),
        Err(AccessError::NotFound(_))
    ));
}

#[test]
fn project_owner_always_has_owner_access() {
    let org_id = ObjectId::new();
    for global in ALL_GLOBAL_ROLES {
        let caller = principal(global);
        for organization in [None, Some(org_id)] {
            let owned = project(caller.user_id, organization);
            for role in ALL_ORG_ROLES {
                assert_eq!(
                    rules::project_access(&caller, &owned, role),
                    ProjectAccess::Owner
                );
            }
        }
    }
}

#[test]
fn stranger_cannot_view_standalone_project() {
    let stranger = principal(GlobalRole::Member);
    let p = project(ObjectId::new(), None);
    assert_eq!(rules::project_access(&stranger, &p, None), ProjectAccess::Forbidden);

    // A stray org role is ignored when the project has no organization
    assert_eq!(
        rules::project_access(&stranger, &p, Some(OrgRole::Owner)),
        ProjectAccess::Forbidden
    );
}

#[test]
fn explicit_member_and_global_admin_can_view() {
    let member = principal(GlobalRole::Member);
    let mut p = project(ObjectId::new(), None);
    p.members.push(member.user_id);
    assert_eq!(rules::project_access(&member, &p, None), ProjectAccess::View);

    let admin = principal(GlobalRole::Admin);
    assert_eq!(rules::project_access(&admin, &p, None), ProjectAccess::View);
}

#[test]
fn org_roles_on_org_project() {
    let p = project(ObjectId::new(), Some(ObjectId::new()));
    let caller = principal(GlobalRole::Member);

    assert_eq!(rules::project_access(&caller, &p, None), ProjectAccess::Forbidden);
    assert_eq!(
        rules::project_access(&caller, &p, Some(OrgRole::Member)),
        ProjectAccess::View
    );
    assert_eq!(
        rules::project_access(&caller, &p, Some(OrgRole::Admin)),
        ProjectAccess::View
    );
    assert_eq!(
        rules::project_access(&caller, &p, Some(OrgRole::Owner)),
        ProjectAccess::Owner
    );
}

#[test]
fn org_admin_edits_tasks_but_not_project_or_documents() {
    let org_id = ObjectId::new();
    let p = project(ObjectId::new(), Some(org_id));
    let admin = principal(GlobalRole::Member);
    let role = Some(OrgRole::Admin);

    assert!(rules::task_access(&admin, &p, role, AccessMode::Edit).unwrap());
    assert!(rules::can_create_task(&admin, &p, role).unwrap());
    assert!(rules::project_access(&admin, &p, role).require(AccessMode::Edit).is_err());

    let d = document(ObjectId::new(), p.id);
    assert!(rules::document_access(&admin, &d, Some((&p, role)), AccessMode::View));
    assert!(!rules::document_access(&admin, &d, Some((&p, role)), AccessMode::Edit));
    assert!(!rules::can_create_document(&admin, Some((&p, role))));
}

#[test]
fn org_member_views_but_never_edits_tasks() {
    let p = project(ObjectId::new(), Some(ObjectId::new()));
    let member = principal(GlobalRole::Member);
    let role = Some(OrgRole::Member);

    assert!(rules::task_access(&member, &p, role, AccessMode::View).unwrap());
    assert!(!rules::task_access(&member, &p, role, AccessMode::Edit).unwrap());
    assert!(!rules::can_create_task(&member, &p, role).unwrap());
}

#[test]
fn explicit_project_member_views_tasks_only() {
    let mut p = project(ObjectId::new(), None);
    let member = principal(GlobalRole::Member);
    p.members.push(member.user_id);

    assert!(rules::task_access(&member, &p, None, AccessMode::View).unwrap());
    assert!(!rules::task_access(&member, &p, None, AccessMode::Edit).unwrap());
}

#[test]
fn task_view_on_deleted_project_is_not_found() {
    let member = principal(GlobalRole::Member);
    let p = deleted(project(member.user_id, None));
    assert!(matches!(
        rules::task_access(&member, &p, None, AccessMode::View),
        Err(AccessError::NotFound(_))
    ));

    let admin = principal(GlobalRole::Admin);
    assert!(rules::task_access(&admin, &p, None, AccessMode::View).unwrap());
}

#[test]
fn project_creation_gate() {
    for global in ALL_GLOBAL_ROLES {
        let caller = principal(global);
        assert_eq!(
            rules::can_create_project(&caller, None),
            global != GlobalRole::Member,
            "standalone as {global:?}"
        );
        for role in ALL_ORG_ROLES {
            assert_eq!(
                rules::can_create_project(&caller, Some(role)),
                role == Some(OrgRole::Owner),
                "in org as {global:?} / {role:?}"
            );
        }
    }
}

#[test]
fn document_owner_always_has_full_access() {
    let owner = principal(GlobalRole::Member);
    let d = document(owner.user_id, None);
    assert!(rules::document_access(&owner, &d, None, AccessMode::View));
    assert!(rules::document_access(&owner, &d, None, AccessMode::Edit));
}

#[test]
fn public_and_shared_documents_are_view_only() {
    let reader = principal(GlobalRole::Member);
    let mut d = document(ObjectId::new(), None);
    assert!(!rules::document_access(&reader, &d, None, AccessMode::View));

    d.is_public = true;
    assert!(rules::document_access(&reader, &d, None, AccessMode::View));
    assert!(!rules::document_access(&reader, &d, None, AccessMode::Edit));

    d.is_public = false;
    d.collaborators.push(reader.user_id);
    assert!(rules::document_access(&reader, &d, None, AccessMode::View));
    assert!(!rules::document_access(&reader, &d, None, AccessMode::Edit));
}

#[test]
fn global_admin_has_no_bypass_on_private_standalone_documents() {
    let admin = principal(GlobalRole::Admin);
    let d = document(ObjectId::new(), None);
    assert!(!rules::document_access(&admin, &d, None, AccessMode::View));
}

#[test]
fn org_owner_edits_documents_in_org_projects() {
    let p = project(ObjectId::new(), Some(ObjectId::new()));
    let d = document(ObjectId::new(), p.id);
    let owner = principal(GlobalRole::Member);
    let role = Some(OrgRole::Owner);

    assert!(rules::document_access(&owner, &d, Some((&p, role)), AccessMode::Edit));
    assert!(rules::can_create_document(&owner, Some((&p, role))));

    let gone = deleted(p);
    assert!(!rules::document_access(&owner, &d, Some((&gone, role)), AccessMode::Edit));
    assert!(!rules::document_access(&owner, &d, Some((&gone, role)), AccessMode::View));
}

#[test]
fn standalone_document_creation_needs_owner_or_admin() {
    assert!(!rules::can_create_document(&principal(GlobalRole::Member), None));
    assert!(rules::can_create_document(&principal(GlobalRole::Owner), None));
    assert!(rules::can_create_document(&principal(GlobalRole::Admin), None));
}

#[test]
fn invite_gate_follows_member_invite_setting() {
    let closed = OrganizationSettings::default();
    let open = OrganizationSettings {
        allow_member_invite: true,
        ..Default::default()
    };

    assert!(rules::can_invite(Some(OrgRole::Owner), &closed));
    assert!(rules::can_invite(Some(OrgRole::Admin), &closed));
    assert!(!rules::can_invite(Some(OrgRole::Member), &closed));
    assert!(rules::can_invite(Some(OrgRole::Member), &open));
    assert!(!rules::can_invite(None, &open));
}

#[test]
fn role_names_parse_case_insensitively() {
    assert_eq!("OWNER".parse::<OrgRole>().unwrap(), OrgRole::Owner);
    assert_eq!("Admin".parse::<OrgRole>().unwrap(), OrgRole::Admin);
    assert_eq!("member".parse::<GlobalRole>().unwrap(), GlobalRole::Member);
    assert!("superuser".parse::<OrgRole>().is_err());
    assert!(!OrgRole::Owner.is_assignable());
}
