//! Integration tests for role commands against a mock Discord API.

use std::time::Duration;

use mockito::Server;
use svxnotify_core::roles::{REPLY_ADDED, REPLY_REMOVED};
use svxnotify_core::{DiscordRoles, RoleError, RoleToggle};

const GUILD: u64 = 900;
const ROLE: u64 = 984735416341114910;

fn toggle_for(server: &Server) -> RoleToggle<DiscordRoles> {
    let roles = DiscordRoles::new(server.url(), GUILD, "bot-token", Duration::from_secs(10)).unwrap();
    RoleToggle::new(roles, ROLE)
}

#[tokio::test]
async fn on_command_puts_member_role() {
    let mut server = Server::new_async().await;
    let put = server
        .mock("PUT", format!("/guilds/{GUILD}/members/12/roles/{ROLE}").as_str())
        .match_header("authorization", "Bot bot-token")
        .with_status(204)
        .create_async()
        .await;

    let reply = toggle_for(&server).handle_message(12, "!svx on").await.unwrap();

    assert_eq!(reply.as_deref(), Some(REPLY_ADDED));
    put.assert_async().await;
}

#[tokio::test]
async fn off_command_deletes_member_role() {
    let mut server = Server::new_async().await;
    let delete = server
        .mock("DELETE", format!("/guilds/{GUILD}/members/12/roles/{ROLE}").as_str())
        .match_header("authorization", "Bot bot-token")
        .with_status(204)
        .create_async()
        .await;

    let reply = toggle_for(&server).handle_message(12, "!svx off").await.unwrap();

    assert_eq!(reply.as_deref(), Some(REPLY_REMOVED));
    delete.assert_async().await;
}

#[tokio::test]
async fn rejected_change_surfaces_status() {
    let mut server = Server::new_async().await;
    let _put = server
        .mock("PUT", format!("/guilds/{GUILD}/members/12/roles/{ROLE}").as_str())
        .with_status(403)
        .with_body(r#"{"message": "Missing Permissions"}"#)
        .create_async()
        .await;

    let err = toggle_for(&server).handle_message(12, "!svx on").await.unwrap_err();

    assert!(matches!(err, RoleError::Rejected { status: 403, .. }));
}

#[tokio::test]
async fn chat_without_command_makes_no_request() {
    let mut server = Server::new_async().await;
    let any = server
        .mock("PUT", mockito::Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let reply = toggle_for(&server).handle_message(12, "god morgon").await.unwrap();

    assert_eq!(reply, None);
    any.assert_async().await;
}
