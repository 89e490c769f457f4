use std::path::Path;
use std::sync::Arc;

use adminctl::{
    cloud::{CloudApi, CloudClient},
    connector::{ConnectError, ConnectOptions, LoginApi, SessionConnector, SessionSource},
    credential::{Credential, CredentialOrigin},
    credential_file::CredentialFileStore,
    http_utils::ApiError,
    prompt::ScriptedPrompter,
    resolver::CredentialResolver,
    secret::{EnvelopeProtector, Secret, SecretProtector},
    session_context::{
        Namespace, SessionContext, KEY_AUTHORIZATION_TOKEN, KEY_SESSION_TOKEN,
    },
    vault::{VaultApi, VaultClient},
    vsphere::{VSphereApi, VSphereClient},
};
use reqwest::StatusCode;
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{basic_auth, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const VAULT_LOGON: &str = "/PasswordVault/API/auth/CyberArk/Logon";

fn protector() -> Arc<dyn SecretProtector> {
    Arc::new(EnvelopeProtector::from_key([7u8; 32]))
}

fn connector<A: LoginApi>(api: A, directory: &Path) -> SessionConnector<A> {
    let protector = protector();
    let resolver =
        CredentialResolver::standard(Arc::clone(&protector), Arc::new(ScriptedPrompter::new()));
    SessionConnector::new(api, resolver, protector, directory)
}

fn login_options(server: &MockServer, identity: &str, secret: &str) -> ConnectOptions {
    ConnectOptions {
        server: Some(server.uri()),
        identity: Some(identity.to_string()),
        secret: Some(secret.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn vault_login_caches_token_and_credential() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(VAULT_LOGON))
        .and(body_partial_json(json!({
            "username": "alice",
            "password": "s3cret",
            "concurrentSession": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("tok-123")))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let connector = connector(VaultApi::default(), dir.path());
    let mut context = SessionContext::new();

    let session = connector
        .connect(&mut context, &login_options(&server, "alice", "s3cret"))
        .await
        .unwrap();
    assert_eq!(session.source(), SessionSource::LoggedIn);
    assert_eq!(session.token().expose(), "tok-123");
    assert_eq!(
        context
            .token(Namespace::Vault, KEY_AUTHORIZATION_TOKEN)
            .map(|t| t.expose()),
        Some("tok-123")
    );
    assert_eq!(
        context.credential(Namespace::Vault).map(|c| c.identity()),
        Some("alice")
    );

    // Same server, no new secret: the cached token is reused without a request.
    let again = connector
        .connect(
            &mut context,
            &ConnectOptions {
                server: Some(server.uri()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(again.source(), SessionSource::Cached);
    assert_eq!(again.token().expose(), "tok-123");
}

#[tokio::test]
async fn failed_login_writes_nothing_to_the_context() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(VAULT_LOGON))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "ErrorCode": "PASWS013E",
            "ErrorMessage": "Authentication failure."
        })))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let connector = connector(VaultApi::default(), dir.path());
    let mut context = SessionContext::new();

    let error = connector
        .connect(&mut context, &login_options(&server, "alice", "wrong"))
        .await
        .unwrap_err();
    match error {
        ConnectError::Api(ApiError::Http { status, message }) => {
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(message, "Authentication failure.");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(context
        .token(Namespace::Vault, KEY_AUTHORIZATION_TOKEN)
        .is_none());
    assert!(context.credential(Namespace::Vault).is_none());
}

#[tokio::test]
async fn supplied_token_skips_authentication() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("unused")))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let connector = connector(VaultApi::default(), dir.path());
    let mut context = SessionContext::new();

    let envelope = protector().protect("from-envelope").unwrap();
    for (raw, expected) in [(envelope.as_str(), "from-envelope"), ("plain-token", "plain-token")] {
        let session = connector
            .connect(
                &mut context,
                &ConnectOptions {
                    server: Some(server.uri()),
                    token: Some(raw.to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(session.source(), SessionSource::Supplied);
        assert_eq!(session.token().expose(), expected);
    }
}

#[tokio::test]
async fn later_login_replaces_earlier_token() {
    let server = MockServer::start().await;
    for (user, token) in [("alice", "first"), ("bob", "second")] {
        Mock::given(method("POST"))
            .and(path(VAULT_LOGON))
            .and(body_partial_json(json!({ "username": user })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(token)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let dir = tempdir().unwrap();
    let connector = connector(VaultApi::default(), dir.path());
    let mut context = SessionContext::new();

    connector
        .connect(&mut context, &login_options(&server, "alice", "a"))
        .await
        .unwrap();
    connector
        .connect(&mut context, &login_options(&server, "bob", "b"))
        .await
        .unwrap();

    assert_eq!(
        context
            .token(Namespace::Vault, KEY_AUTHORIZATION_TOKEN)
            .map(|t| t.expose()),
        Some("second")
    );
    assert_eq!(
        context.credential(Namespace::Vault).map(|c| c.identity()),
        Some("bob")
    );
}

#[tokio::test]
async fn missing_server_is_reported_before_any_request() {
    let dir = tempdir().unwrap();
    let connector = connector(VaultApi::default(), dir.path());
    let mut context = SessionContext::new();

    let error = connector
        .connect(&mut context, &ConnectOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(error, ConnectError::Context(_)));
}

#[tokio::test]
async fn saved_credential_file_is_used_for_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/session"))
        .and(basic_auth("administrator@vsphere.local", "from-disk"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!("vmware-session")))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let store = CredentialFileStore::new(dir.path(), protector());
    store
        .save(
            Some(&server.uri()),
            &Credential::new(
                "administrator@vsphere.local",
                Secret::plain("from-disk"),
                CredentialOrigin::Explicit,
            ),
        )
        .unwrap();

    let connector = connector(VSphereApi, dir.path());
    let mut context = SessionContext::new();
    let session = connector
        .connect(
            &mut context,
            &ConnectOptions {
                server: Some(server.uri()),
                identity: Some("administrator@vsphere.local".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(session.token().expose(), "vmware-session");
    assert_eq!(
        context.credential(Namespace::VSphere).map(|c| c.origin()),
        Some(CredentialOrigin::DiskFile)
    );
}

#[tokio::test]
async fn cloud_login_reads_token_from_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/sessions"))
        .and(header("Accept", "application/*+xml;version=36.0"))
        .and(basic_auth("alice@acme", "pw"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-vcloud-authorization", "cloud-tok")
                .set_body_string("<Session/>"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let connector = connector(CloudApi::new(None, Some("acme")), dir.path());
    let mut context = SessionContext::new();

    let session = connector
        .connect(&mut context, &login_options(&server, "alice", "pw"))
        .await
        .unwrap();
    assert_eq!(session.token().expose(), "cloud-tok");
    assert_eq!(
        context
            .token(Namespace::Cloud, KEY_SESSION_TOKEN)
            .map(|t| t.expose()),
        Some("cloud-tok")
    );
}

#[tokio::test]
async fn cloud_login_without_token_header_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<Session/>"))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let connector = connector(CloudApi::default(), dir.path());
    let mut context = SessionContext::new();

    let error = connector
        .connect(&mut context, &login_options(&server, "alice", "pw"))
        .await
        .unwrap_err();
    assert!(matches!(error, ConnectError::Api(ApiError::MissingToken)));
    assert!(context.token(Namespace::Cloud, KEY_SESSION_TOKEN).is_none());
}

fn query_page(page: u32, names: &[&str], has_next: bool) -> String {
    let link = if has_next {
        format!(
            r#"<Link rel="nextPage" href="https://vcd/api/query?type=vm&amp;page={}"/>"#,
            page + 1
        )
    } else {
        String::new()
    };
    let records: String = names
        .iter()
        .map(|n| format!(r#"<VMRecord name="{}" status="POWERED_ON"/>"#, n))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><QueryResultRecords xmlns="http://www.vmware.com/vcloud/v1.5" page="{}" pageSize="2">{}{}</QueryResultRecords>"#,
        page, link, records
    )
}

#[tokio::test]
async fn cloud_query_collects_pages_in_order() {
    let server = MockServer::start().await;
    let pages: [(&str, &[&str], bool); 3] = [
        ("1", &["vm-a", "vm-b"], true),
        ("2", &["vm-c", "vm-d"], true),
        ("3", &["vm-e"], false),
    ];
    for (page, names, has_next) in pages {
        Mock::given(method("GET"))
            .and(path("/api/query"))
            .and(query_param("type", "vm"))
            .and(query_param("format", "records"))
            .and(query_param("page", page))
            .and(header("x-vcloud-authorization", "cloud-tok"))
            .respond_with(ResponseTemplate::new(200).set_body_string(query_page(
                page.parse().unwrap(),
                names,
                has_next,
            )))
            .expect(1)
            .mount(&server)
            .await;
    }

    let dir = tempdir().unwrap();
    let connector = connector(CloudApi::default(), dir.path());
    let mut context = SessionContext::new();
    let session = connector
        .connect(
            &mut context,
            &ConnectOptions {
                server: Some(server.uri()),
                token: Some("cloud-tok".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let records = CloudClient::new(&session).query("vm", None, 2).await.unwrap();
    let names: Vec<&str> = records
        .0
        .iter()
        .map(|r| r.attributes["name"].as_str())
        .collect();
    assert_eq!(names, vec!["vm-a", "vm-b", "vm-c", "vm-d", "vm-e"]);
}

#[tokio::test]
async fn vsphere_lists_vms_with_session_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/vcenter/vm"))
        .and(query_param("names", "db-01"))
        .and(header("vmware-api-session-id", "sess-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"vm": "vm-42", "name": "db-01", "power_state": "POWERED_ON", "cpu_count": 2, "memory_size_MiB": 4096}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let connector = connector(VSphereApi, dir.path());
    let mut context = SessionContext::new();
    let session = connector
        .connect(
            &mut context,
            &ConnectOptions {
                server: Some(server.uri()),
                token: Some("sess-9".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let vms = VSphereClient::new(&session)
        .list_vms(&["db-01".to_string()])
        .await
        .unwrap();
    assert_eq!(vms.0.len(), 1);
    assert_eq!(vms.0[0].vm, "vm-42");
}

#[tokio::test]
async fn vault_batch_get_reports_partial_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/PasswordVault/API/Accounts/12_1"))
        .and(header("Authorization", "tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "12_1",
            "name": "svc-backup",
            "safeName": "Ops"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/PasswordVault/API/Accounts/12_2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let connector = connector(VaultApi::default(), dir.path());
    let mut context = SessionContext::new();
    let session = connector
        .connect(
            &mut context,
            &ConnectOptions {
                server: Some(server.uri()),
                token: Some("tok".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let outcome = VaultClient::new(&session)
        .get_accounts(&["12_1".to_string(), "12_2".to_string()])
        .await;
    assert_eq!(outcome.succeeded(), 1);
    assert_eq!(outcome.failed(), 1);
    assert!(outcome.has_failures());

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["items"][0]["value"]["name"], "svc-backup");
    assert_eq!(json["items"][1]["error"], "404 Not Found");
}

#[tokio::test]
async fn vault_search_follows_next_link() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/PasswordVault/API/Accounts"))
        .and(query_param("offset", "0"))
        .and(query_param("search", "backup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"id": "1_1"}, {"id": "1_2"}],
            "count": 3,
            "nextLink": "api/accounts?offset=2&limit=2"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/PasswordVault/API/Accounts"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"id": "1_3"}],
            "count": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let connector = connector(VaultApi::default(), dir.path());
    let mut context = SessionContext::new();
    let session = connector
        .connect(
            &mut context,
            &ConnectOptions {
                server: Some(server.uri()),
                token: Some("tok".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let accounts = VaultClient::new(&session)
        .search_accounts(Some("backup"), 2)
        .await
        .unwrap();
    let ids: Vec<&str> = accounts.0.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["1_1", "1_2", "1_3"]);
}

#[tokio::test]
async fn release_logs_off_only_sessions_it_opened() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(VAULT_LOGON))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("fresh")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/PasswordVault/API/Auth/Logoff"))
        .and(header("Authorization", "fresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/PasswordVault/API/Auth/Logoff"))
        .and(header("Authorization", "someone-elses"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let connector = connector(VaultApi::default(), dir.path());
    let mut context = SessionContext::new();

    let supplied = connector
        .connect(
            &mut context,
            &ConnectOptions {
                server: Some(server.uri()),
                token: Some("someone-elses".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    connector.release(&supplied).await;

    let opened = connector
        .connect(&mut context, &login_options(&server, "alice", "pw"))
        .await
        .unwrap();
    connector.release(&opened).await;

    let logoffs = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == "/PasswordVault/API/Auth/Logoff")
        .count();
    assert_eq!(logoffs, 1);
}

#[tokio::test]
async fn cached_token_is_not_shared_with_another_identity() {
    let server = MockServer::start().await;
    for (user, secret, token) in [("alice", "a", "alice-tok"), ("bob", "from-disk", "bob-tok")] {
        Mock::given(method("POST"))
            .and(path(VAULT_LOGON))
            .and(body_partial_json(json!({ "username": user, "password": secret })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(token)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let dir = tempdir().unwrap();
    CredentialFileStore::new(dir.path(), protector())
        .save(
            Some(&server.uri()),
            &Credential::new("bob", Secret::plain("from-disk"), CredentialOrigin::Explicit),
        )
        .unwrap();

    let connector = connector(VaultApi::default(), dir.path());
    let mut context = SessionContext::new();
    connector
        .connect(&mut context, &login_options(&server, "alice", "a"))
        .await
        .unwrap();

    let for_bob = ConnectOptions {
        server: Some(server.uri()),
        identity: Some("bob".to_string()),
        ..Default::default()
    };
    let session = connector.connect(&mut context, &for_bob).await.unwrap();
    assert_eq!(session.source(), SessionSource::LoggedIn);
    assert_eq!(session.token().expose(), "bob-tok");

    // Asking for bob again, or for nobody in particular, reuses bob's session.
    let again = connector.connect(&mut context, &for_bob).await.unwrap();
    assert_eq!(again.source(), SessionSource::Cached);
    assert_eq!(again.token().expose(), "bob-tok");
    let anyone = connector
        .connect(
            &mut context,
            &ConnectOptions {
                server: Some(server.uri()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(anyone.token().expose(), "bob-tok");
}

#[tokio::test]
async fn end_session_requires_a_token_and_never_logs_in() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(VAULT_LOGON))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("unwanted")))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/PasswordVault/API/Auth/Logoff"))
        .and(header("Authorization", "from-login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let connector = connector(VaultApi::default(), dir.path());
    let mut context = SessionContext::new();

    for token in [None, Some("   ")] {
        let error = connector
            .end_session(
                &mut context,
                &ConnectOptions {
                    token: token.map(str::to_string),
                    ..login_options(&server, "alice", "pw")
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(error, ConnectError::TokenRequired));
    }

    connector
        .end_session(
            &mut context,
            &ConnectOptions {
                server: Some(server.uri()),
                token: Some("from-login".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn account_ids_are_escaped_in_the_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/PasswordVault/API/Accounts/12%2F3%3Fx"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "12/3?x" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/PasswordVault/API/Accounts/12%2F3%3Fx/Password/Retrieve"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("pw")))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let connector = connector(VaultApi::default(), dir.path());
    let mut context = SessionContext::new();
    let session = connector
        .connect(
            &mut context,
            &ConnectOptions {
                server: Some(server.uri()),
                token: Some("tok".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let client = VaultClient::new(&session);
    let account = client.get_account("12/3?x").await.unwrap();
    assert_eq!(account.id, "12/3?x");
    let password = client.retrieve_password("12/3?x", None).await.unwrap();
    assert_eq!(password.expose(), "pw");
}
