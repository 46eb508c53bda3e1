use crate::fixtures::test_app::TestApp;
use serde_json::Value;

#[tokio::test]
async fn invite_and_accept_flow() {
    let app = TestApp::spawn().await;
    let alice = app.register_user("alice@acme.test", "alice", Some("owner")).await;
    let org_id = app.create_organization(&alice.access_token, "Acme").await;

    let resp = app.invite(&alice.access_token, &org_id, "b@example.com", "member").await;
    assert_eq!(resp.status().as_u16(), 201);
    let created: Value = resp.json().await.unwrap();
    let token = created["token"].as_str().unwrap().to_string();
    assert_eq!(created["email_sent"], false);
    assert!(created["invite_link"].as_str().unwrap().ends_with(&format!("/invite/{}", token)));
    assert_eq!(created["invitation"]["status"], "pending");
    assert_eq!(created["invitation"]["role"], "member");

    // Details are public
    let resp = reqwest::Client::new()
        .get(app.url(&format!("/api/invitation/{}", token)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let details: Value = resp.json().await.unwrap();
    assert_eq!(details["organization_name"], "Acme");
    assert_eq!(details["email"], "b@example.com");

    let bob = app.register_user("B@Example.com", "bob", None).await;
    let resp = app.accept_invitation(&bob.access_token, &token).await;
    assert_eq!(resp.status().as_u16(), 200);
    let org: Value = resp.json().await.unwrap();
    assert_eq!(org["id"], org_id.as_str());

    assert_eq!(app.membership_count(&org_id).await, 2);
    assert_eq!(app.invitation_status(&token).await, "accepted");

    let members: Value = app
        .auth_get(&format!("/api/organization/{}/member", org_id), &bob.access_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let bob_row = members["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["user_id"] == bob.id.as_str())
        .cloned()
        .unwrap();
    assert_eq!(bob_row["role"], "member");
    assert_eq!(bob_row["invited_by"], alice.id.as_str());

    // A used invitation cannot be accepted again
    let resp = app.accept_invitation(&bob.access_token, &token).await;
    assert_eq!(resp.status().as_u16(), 409);
    assert_eq!(app.membership_count(&org_id).await, 2);
}

#[tokio::test]
async fn invitation_expires_seven_days_after_creation() {
    let app = TestApp::spawn().await;
    let seeded = app.seed_organization("ttl").await;

    let resp = app
        .invite(&seeded.owner.access_token, &seeded.org_id, "ttl@example.com", "member")
        .await;
    assert_eq!(resp.status().as_u16(), 201);
    let created: Value = resp.json().await.unwrap();

    let parse = |v: &Value| chrono::DateTime::parse_from_rfc3339(v.as_str().unwrap()).unwrap();
    let created_at = parse(&created["invitation"]["created_at"]);
    let expires_at = parse(&created["invitation"]["expires_at"]);
    assert_eq!(expires_at - created_at, chrono::Duration::days(7));

    let token = created["token"].as_str().unwrap();
    let details: Value = app
        .client
        .get(app.url(&format!("/api/invitation/{}", token)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(parse(&details["expires_at"]), expires_at);
}

#[tokio::test]
async fn invitation_lifetime_follows_configuration() {
    let app = TestApp::spawn_with_settings(|s| s.invitation.ttl_days = 2).await;
    let owner = app.register_user("alice@acme.test", "alice", Some("owner")).await;
    let org_id = app.create_organization(&owner.access_token, "Acme").await;

    let created: Value = app
        .invite(&owner.access_token, &org_id, "short@example.com", "member")
        .await
        .json()
        .await
        .unwrap();

    let parse = |v: &Value| chrono::DateTime::parse_from_rfc3339(v.as_str().unwrap()).unwrap();
    let lifetime = parse(&created["invitation"]["expires_at"]) - parse(&created["invitation"]["created_at"]);
    assert_eq!(lifetime, chrono::Duration::days(2));
}

#[tokio::test]
async fn duplicate_pending_invite_and_existing_member_conflict() {
    let app = TestApp::spawn().await;
    let seeded = app.seed_organization("dupe").await;

    app.invite_ok(&seeded.owner.access_token, &seeded.org_id, "new@example.com", "member")
        .await;
    let resp = app
        .invite(&seeded.owner.access_token, &seeded.org_id, "NEW@example.com", "admin")
        .await;
    assert_eq!(resp.status().as_u16(), 409);

    let resp = app
        .invite(&seeded.owner.access_token, &seeded.org_id, &seeded.member.email, "member")
        .await;
    assert_eq!(resp.status().as_u16(), 409);
}

#[tokio::test]
async fn owner_role_cannot_be_invited() {
    let app = TestApp::spawn().await;
    let seeded = app.seed_organization("ownerinv").await;

    let resp = app
        .invite(&seeded.owner.access_token, &seeded.org_id, "x@example.com", "owner")
        .await;
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn wrong_email_cannot_accept() {
    let app = TestApp::spawn().await;
    let seeded = app.seed_organization("wrong").await;
    let token = app
        .invite_ok(&seeded.owner.access_token, &seeded.org_id, "b@example.com", "member")
        .await;

    let resp = app.accept_invitation(&seeded.outsider.access_token, &token).await;
    assert_eq!(resp.status().as_u16(), 403);
    let body: Value = resp.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("different email address"));

    assert_eq!(app.membership_count(&seeded.org_id).await, 3);
    assert_eq!(app.invitation_status(&token).await, "pending");
}

#[tokio::test]
async fn expired_invitation_is_gone_then_used() {
    let app = TestApp::spawn().await;
    let seeded = app.seed_organization("expiry").await;
    let token = app
        .invite_ok(&seeded.owner.access_token, &seeded.org_id, &seeded.outsider.email, "member")
        .await;
    app.backdate_invitation(&token).await;

    let resp = app.accept_invitation(&seeded.outsider.access_token, &token).await;
    assert_eq!(resp.status().as_u16(), 410);
    assert_eq!(app.invitation_status(&token).await, "expired");
    assert_eq!(app.membership_count(&seeded.org_id).await, 3);

    let resp = app
        .client
        .get(app.url(&format!("/api/invitation/{}", token)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);

    // The expired row no longer blocks a fresh invite
    let fresh = app
        .invite_ok(&seeded.owner.access_token, &seeded.org_id, &seeded.outsider.email, "member")
        .await;
    assert_ne!(fresh, token);
}

#[tokio::test]
async fn stale_pending_invite_is_replaced_on_reinvite() {
    let app = TestApp::spawn().await;
    let seeded = app.seed_organization("reinvite").await;
    let token = app
        .invite_ok(&seeded.owner.access_token, &seeded.org_id, "late@example.com", "member")
        .await;
    app.backdate_invitation(&token).await;

    let resp = app
        .invite(&seeded.owner.access_token, &seeded.org_id, "late@example.com", "member")
        .await;
    assert_eq!(resp.status().as_u16(), 201);
    assert_eq!(app.invitation_status(&token).await, "expired");
}

#[tokio::test]
async fn unknown_token_is_not_found() {
    let app = TestApp::spawn().await;
    let user = app.register_user("nobody@example.com", "nobody", None).await;

    let resp = app.accept_invitation(&user.access_token, "deadbeef").await;
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn only_owner_cancels_and_only_within_organization() {
    let app = TestApp::spawn().await;
    let seeded = app.seed_organization("cancel").await;
    let other = app.seed_organization("othercancel").await;

    let resp = app
        .invite(&seeded.owner.access_token, &seeded.org_id, "c@example.com", "member")
        .await;
    let created: Value = resp.json().await.unwrap();
    let invitation_id = created["invitation"]["id"].as_str().unwrap().to_string();

    let resp = app
        .auth_delete(
            &format!("/api/organization/{}/invitation/{}", seeded.org_id, invitation_id),
            &seeded.admin.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    // Owner of another organization, addressing the invitation through it
    let resp = app
        .auth_delete(
            &format!("/api/organization/{}/invitation/{}", other.org_id, invitation_id),
            &other.owner.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    let resp = app
        .auth_delete(
            &format!("/api/organization/{}/invitation/{}", seeded.org_id, invitation_id),
            &seeded.owner.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let token = created["token"].as_str().unwrap();
    let resp = app
        .client
        .get(app.url(&format!("/api/invitation/{}", token)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn members_invite_only_when_allowed() {
    let app = TestApp::spawn().await;
    let seeded = app.seed_organization("memberinv").await;

    let resp = app
        .invite(&seeded.member.access_token, &seeded.org_id, "m1@example.com", "member")
        .await;
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app
        .invite(&seeded.outsider.access_token, &seeded.org_id, "m1@example.com", "member")
        .await;
    assert_eq!(resp.status().as_u16(), 403);

    // Admins may invite regardless of the setting
    let resp = app
        .invite(&seeded.admin.access_token, &seeded.org_id, "a1@example.com", "admin")
        .await;
    assert_eq!(resp.status().as_u16(), 201);

    let resp = app
        .auth_put(&format!("/api/organization/{}", seeded.org_id), &seeded.owner.access_token)
        .json(&serde_json::json!({ "settings": { "allow_member_invite": true } }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = app
        .invite(&seeded.member.access_token, &seeded.org_id, "m1@example.com", "member")
        .await;
    assert_eq!(resp.status().as_u16(), 201);
}

#[tokio::test]
async fn invitation_list_is_for_owners_and_admins() {
    let app = TestApp::spawn().await;
    let seeded = app.seed_organization("listinv").await;
    let token = app
        .invite_ok(&seeded.owner.access_token, &seeded.org_id, "l@example.com", "member")
        .await;
    app.backdate_invitation(&token).await;

    let path = format!("/api/organization/{}/invitation", seeded.org_id);
    let resp = app.auth_get(&path, &seeded.admin.access_token).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let invitations: Vec<Value> = resp.json().await.unwrap();

    // Two accepted seed invitations plus the stale one
    assert_eq!(invitations.len(), 3);
    let stale = invitations
        .iter()
        .find(|i| i["email"] == "l@example.com")
        .unwrap();
    assert_eq!(stale["status"], "expired");
    assert_eq!(app.invitation_status(&token).await, "expired");

    let resp = app.auth_get(&path, &seeded.member.access_token).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}
