use crate::fixtures::test_app::TestApp;
use serde_json::Value;

#[tokio::test]
async fn creator_becomes_sole_owner() {
    let app = TestApp::spawn().await;
    let alice = app.register_user("alice@acme.test", "alice", Some("owner")).await;
    let org_id = app.create_organization(&alice.access_token, "Acme").await;

    let resp = app
        .auth_get(&format!("/api/organization/{}/member", org_id), &alice.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await.unwrap();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["user_id"], alice.id.as_str());
    assert_eq!(items[0]["role"], "owner");

    let org: Value = app
        .auth_get(&format!("/api/organization/{}", org_id), &alice.access_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(org["role"], "owner");
}

#[tokio::test]
async fn global_member_cannot_create_organization() {
    let app = TestApp::spawn().await;
    let bob = app.register_user("bob@example.com", "bob", None).await;

    let resp = app
        .auth_post("/api/organization", &bob.access_token)
        .json(&serde_json::json!({ "name": "Nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn missing_organization_is_404_and_non_member_is_403() {
    let app = TestApp::spawn().await;
    let seeded = app.seed_organization("gate").await;

    let resp = app
        .auth_get(
            &format!("/api/organization/{}", bson::oid::ObjectId::new().to_hex()),
            &seeded.owner.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    let resp = app
        .auth_get(
            &format!("/api/organization/{}", seeded.org_id),
            &seeded.outsider.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app
        .auth_get("/api/organization/not-an-id", &seeded.owner.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn only_owner_updates_or_deletes_organization() {
    let app = TestApp::spawn().await;
    let seeded = app.seed_organization("upd").await;
    let path = format!("/api/organization/{}", seeded.org_id);

    for token in [&seeded.admin.access_token, &seeded.member.access_token] {
        let resp = app
            .auth_put(&path, token)
            .json(&serde_json::json!({ "name": "Hijacked" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 403);

        let resp = app.auth_delete(&path, token).send().await.unwrap();
        assert_eq!(resp.status().as_u16(), 403);
    }

    let resp = app
        .auth_put(&path, &seeded.owner.access_token)
        .json(&serde_json::json!({ "name": "Renamed", "settings": { "allow_member_invite": true } }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let org: Value = resp.json().await.unwrap();
    assert_eq!(org["name"], "Renamed");
    assert_eq!(org["settings"]["allow_member_invite"], true);

    let resp = app.auth_delete(&path, &seeded.owner.access_token).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 204);
    assert_eq!(app.membership_count(&seeded.org_id).await, 0);

    let resp = app.auth_get(&path, &seeded.owner.access_token).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn deleting_organization_soft_deletes_its_projects() {
    let app = TestApp::spawn().await;
    let seeded = app.seed_organization("cascade").await;
    let project_id = app
        .create_project(&seeded.owner.access_token, "Board", Some(&seeded.org_id))
        .await;

    app.auth_delete(
        &format!("/api/organization/{}", seeded.org_id),
        &seeded.owner.access_token,
    )
    .send()
    .await
    .unwrap();

    let resp = app
        .auth_get(&format!("/api/project/{}", project_id), &seeded.owner.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn owner_removes_member_but_owner_row_is_protected() {
    let app = TestApp::spawn().await;
    let seeded = app.seed_organization("remove").await;
    let members = format!("/api/organization/{}/member", seeded.org_id);

    let resp = app
        .auth_delete(&format!("{}/{}", members, seeded.member.id), &seeded.owner.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);
    assert_eq!(app.membership_count(&seeded.org_id).await, 2);

    // Owner cannot remove themselves
    let resp = app
        .auth_delete(&format!("{}/{}", members, seeded.owner.id), &seeded.owner.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    // Admin cannot remove anyone: the route requires OWNER
    let resp = app
        .auth_delete(&format!("{}/{}", members, seeded.owner.id), &seeded.admin.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    // Removing someone who is not a member
    let resp = app
        .auth_delete(&format!("{}/{}", members, seeded.outsider.id), &seeded.owner.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
    assert_eq!(app.membership_count(&seeded.org_id).await, 2);
}

#[tokio::test]
async fn role_updates_only_touch_admin_and_member() {
    let app = TestApp::spawn().await;
    let seeded = app.seed_organization("roles").await;
    let members = format!("/api/organization/{}/member", seeded.org_id);

    let resp = app
        .auth_put(&format!("{}/{}", members, seeded.member.id), &seeded.owner.access_token)
        .json(&serde_json::json!({ "role": "ADMIN" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let member: Value = resp.json().await.unwrap();
    assert_eq!(member["role"], "admin");

    // Granting OWNER is a validation error
    let resp = app
        .auth_put(&format!("{}/{}", members, seeded.member.id), &seeded.owner.access_token)
        .json(&serde_json::json!({ "role": "owner" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    // Changing the OWNER's role is blocked like removing them, whatever the new role
    for role in ["member", "admin", "owner"] {
        let resp = app
            .auth_put(&format!("{}/{}", members, seeded.owner.id), &seeded.owner.access_token)
            .json(&serde_json::json!({ "role": role }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 403, "role {}", role);
        let body: Value = resp.json().await.unwrap();
        assert!(body["message"].as_str().unwrap().contains("owner cannot be removed"));
    }

    // ADMIN may not change roles
    let resp = app
        .auth_put(&format!("{}/{}", members, seeded.member.id), &seeded.admin.access_token)
        .json(&serde_json::json!({ "role": "member" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn members_can_leave_but_owner_cannot() {
    let app = TestApp::spawn().await;
    let seeded = app.seed_organization("leave").await;
    let leave = format!("/api/organization/{}/member/leave", seeded.org_id);

    let resp = app.auth_post(&leave, &seeded.member.access_token).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let resp = app.auth_post(&leave, &seeded.owner.access_token).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app.auth_post(&leave, &seeded.outsider.access_token).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn organization_list_shows_memberships_only() {
    let app = TestApp::spawn().await;
    let one = app.seed_organization("one").await;
    let two = app.seed_organization("two").await;

    let orgs: Vec<Value> = app
        .auth_get("/api/organization", &one.member.access_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(orgs.len(), 1);
    assert_eq!(orgs[0]["id"], one.org_id.as_str());
    assert_ne!(orgs[0]["id"], two.org_id.as_str());
}
