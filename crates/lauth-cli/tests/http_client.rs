//! End-to-end tests of the HTTP admin client against a live `lauth-api`
//! server bound to an ephemeral port.

use std::net::SocketAddr;
use std::sync::mpsc;
use std::time::Duration;

use lauth_api::state::{AppConfig, AppState};
use lauth_cli::client::HttpAdminClient;
use lauth_core::{ExtraData, LicenseKey, Timestamp};
use lauth_crypto::SecretToken;
use lauth_registry::{AdminError, LicenseAdmin, LicenseLookup, NewLicense};
use lauth_state::{LicenseEventKind, LicenseStatus};

const TOKEN: &str = "cli-test-token";

fn spawn_server() -> SocketAddr {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async move {
            let config = AppConfig {
                admin_token: Some(SecretToken::new(TOKEN)),
                ..AppConfig::default()
            };
            let app = lauth_api::app(AppState::with_config(config));
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });
    rx.recv_timeout(Duration::from_secs(10)).unwrap()
}

fn client(addr: SocketAddr, token: Option<&str>) -> HttpAdminClient {
    let token = token.map(SecretToken::new);
    HttpAdminClient::new(&format!("http://{addr}/"), token.as_ref(), Duration::from_secs(5))
        .unwrap()
}

fn future(days: i64) -> Timestamp {
    Timestamp::now().plus_secs(days * 86_400)
}

#[test]
fn full_lifecycle_over_http() {
    let addr = spawn_server();
    let admin = client(addr, Some(TOKEN));

    let created = admin
        .create_license(NewLicense {
            expiration_date: Some(future(30)),
            extra_data: Some(ExtraData::from_json_text(r#"{"seats":3}"#).unwrap()),
        })
        .unwrap();
    assert_eq!(created.status, LicenseStatus::Active);
    assert_eq!(created.extra_data.as_ref().unwrap().as_str(), r#"{"seats":3}"#);

    let key = created.key.clone();
    let target = future(60);
    let extended = admin.extend_license(&key, target).unwrap();
    assert_eq!(
        extended.expiration_date.map(|t| t.to_iso8601()),
        Some(target.to_iso8601())
    );
    assert!(extended.expiration_date > created.expiration_date);

    let err = admin.extend_license(&key, future(10)).unwrap_err();
    assert!(matches!(err, AdminError::InvalidExtension(_)));

    let revoked = admin.revoke_license(&key).unwrap();
    assert_eq!(revoked.status, LicenseStatus::Revoked);
    let again = admin.revoke_license(&key).unwrap();
    assert_eq!(again.revoked_at, revoked.revoked_at);

    let err = admin.extend_license(&key, future(90)).unwrap_err();
    assert_eq!(err, AdminError::AlreadyRevoked(key.clone()));

    assert_eq!(admin.get_license(&key).unwrap().status, LicenseStatus::Revoked);
    assert_eq!(admin.list_licenses(Some(LicenseStatus::Revoked)).unwrap().len(), 1);
    assert!(admin.list_licenses(Some(LicenseStatus::Active)).unwrap().is_empty());

    let kinds: Vec<&str> = admin
        .license_history(&key)
        .unwrap()
        .iter()
        .map(|e| match e.kind {
            LicenseEventKind::Created { .. } => "created",
            LicenseEventKind::Extended { .. } => "extended",
            LicenseEventKind::Revoked => "revoked",
        })
        .collect();
    assert_eq!(kinds, ["created", "extended", "revoked"]);
}

#[test]
fn unknown_key_is_not_found() {
    let addr = spawn_server();
    let admin = client(addr, Some(TOKEN));
    let key = LicenseKey::parse("00000000-00000000-00000000-00000000").unwrap();
    assert_eq!(admin.revoke_license(&key).unwrap_err(), AdminError::NotFound(key.clone()));
    assert_eq!(admin.get_license(&key).unwrap_err(), AdminError::NotFound(key));
}

#[test]
fn reserved_characters_in_keys_never_reach_another_license() {
    let addr = spawn_server();
    let admin = client(addr, Some(TOKEN));
    let issued = admin.create_license(NewLicense::default()).unwrap().key;
    let (prefix, rest) = issued.as_str().split_once('-').unwrap();

    let lookalikes = [
        format!("{prefix}%2D{rest}"),
        "a/b".to_string(),
        "a?b".to_string(),
        "a#b".to_string(),
        "..".to_string(),
        format!("{}/../{}", issued, issued),
    ];
    for raw in lookalikes {
        let key = LicenseKey::parse(&raw).unwrap();
        assert_eq!(
            admin.revoke_license(&key).unwrap_err(),
            AdminError::NotFound(key.clone()),
            "revoke {raw}"
        );
        assert_eq!(
            admin.get_license(&key).unwrap_err(),
            AdminError::NotFound(key),
            "get {raw}"
        );
    }

    assert_eq!(admin.get_license(&issued).unwrap().status, LicenseStatus::Active);
}

#[test]
fn missing_token_is_rejected() {
    let addr = spawn_server();
    let err = client(addr, None).list_licenses(None).unwrap_err();
    assert!(matches!(err, AdminError::Internal(m) if m.contains("credentials")));
}
