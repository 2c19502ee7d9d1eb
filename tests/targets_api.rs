mod common;

use common::*;
use sso_session::application_impl::HttpTargetService;
use sso_session::application_port::*;
use sso_session::domain_model::*;
use sso_session::gate::*;
use sso_session::settings::parse_settings;
use sso_session::system::System;
use std::time::Duration;

const HOUR: Duration = Duration::from_secs(3600);

fn new_target(first: &str, last: &str) -> NewTarget {
    NewTarget {
        first_name: first.to_string(),
        last_name: last.to_string(),
        dob: None,
    }
}

#[tokio::test]
async fn anonymous_request_is_sent_and_rejected_with_detail() {
    let h = legacy(HOUR);
    let targets = HttpTargetService::new(h.api.clone());

    let err = targets.list().await.unwrap_err();

    // The fake answers "Not authenticated" only when no Authorization header arrived.
    match err {
        ApiError::Authorization { status, detail } => {
            assert_eq!(status, 401);
            assert_eq!(detail, "Not authenticated");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn crud_with_session() {
    let h = legacy(HOUR);
    h.session.login("alice", "pw").await.unwrap();
    let targets = HttpTargetService::new(h.api.clone());

    let ada = targets.create(new_target("Ada", "Lovelace")).await.unwrap();
    targets.create(new_target("Alan", "Turing")).await.unwrap();

    let all = targets.list().await.unwrap();
    assert_eq!(all.len(), 2);
    let found = search_targets(&all, "ADA love");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, ada.id);

    assert_eq!(targets.get(&ada.id).await.unwrap(), ada);
    targets.delete(&ada.id).await.unwrap();

    let err = targets.get(&ada.id).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "Target not found");
}

#[tokio::test]
async fn incomplete_target_never_reaches_server() {
    let h = legacy(HOUR);
    h.session.login("alice", "pw").await.unwrap();
    let targets = HttpTargetService::new(h.api.clone());

    let err = targets.create(new_target("Ada", " ")).await.unwrap_err();

    assert!(matches!(err, ApiError::InvalidInput(_)));
    assert!(h.idp.state().list_targets().is_empty());
}

#[tokio::test]
async fn system_wires_settings_end_to_end() {
    let idp = spawn_idp(idp_config(HOUR), "api");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("system1.toml");
    std::fs::write(
        &path,
        format!(
            r#"
[log]
filter = "info"

[session]
auth_base_url = "{base}"
profile = "legacy"

[store]
backend = "memory"

[api]
base_url = "{base}"
"#,
            base = idp.base_url()
        ),
    )
    .unwrap();

    let settings = parse_settings(path.to_str()).unwrap();
    let system = System::try_new(&settings).await.unwrap();

    assert_eq!(
        system.gate.check("/targets").await,
        GateDecision::Redirect {
            to: "/login".into(),
            from: "/targets".into()
        }
    );

    system.session.login("alice", "pw").await.unwrap();
    assert_eq!(system.gate.check("/targets").await, GateDecision::Allow);
    assert!(system.targets.list().await.unwrap().is_empty());

    let watcher = system.spawn_watcher().await;
    assert!(watcher.is_authenticated());
    watcher.shutdown().await;
    assert_eq!(system.poll_interval(), Duration::from_secs(60));
}
