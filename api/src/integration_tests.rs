//! HTTP integration tests
//!
//! Drive the full router (auth middleware, handlers, services) over the
//! in-memory repositories. Each test bootstraps its own administrator.
//!
//! Run with: cargo test integration_tests

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{http::StatusCode, routing::post, Router};
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::{json, Value};

    use crate::config::Config;
    use crate::handlers;
    use crate::test_utils::{
        test_process, InMemoryAuditLogRepository, InMemoryLookupRepository,
        InMemoryPartyRepository, InMemoryPermissionRepository, InMemoryProcessImportRepository,
        InMemoryProcessRepository, InMemoryProfileRepository, InMemoryResponsibleRepository,
        InMemoryUserRepository,
    };
    use crate::{build_router, AppState, Repositories};

    const BOOTSTRAP_TOKEN: &str = "test-bootstrap-token";

    struct Harness {
        server: TestServer,
        admin_key: String,
        processes: InMemoryProcessRepository,
        audit_logs: InMemoryAuditLogRepository,
    }

    fn server_with(
        processes: InMemoryProcessRepository,
    ) -> (TestServer, InMemoryAuditLogRepository) {
        let parties = InMemoryPartyRepository::new();
        let lookups = InMemoryLookupRepository::new();
        let responsibles = InMemoryResponsibleRepository::new();
        let audit_logs = InMemoryAuditLogRepository::new();

        let repos = Repositories {
            processes: Arc::new(processes.clone()),
            parties: Arc::new(parties.clone()),
            lookups: Arc::new(lookups.clone()),
            responsibles: Arc::new(responsibles.clone()),
            profiles: Arc::new(InMemoryProfileRepository::new()),
            permissions: Arc::new(InMemoryPermissionRepository::new()),
            users: Arc::new(InMemoryUserRepository::new()),
            audit_logs: Arc::new(audit_logs.clone()),
            importer: Arc::new(InMemoryProcessImportRepository::new(
                processes,
                parties,
                lookups,
                responsibles,
            )),
        };

        let state = AppState::new(repos, Config::for_tests());
        let public = Router::new().route("/bootstrap", post(handlers::bootstrap));
        let server = TestServer::new(build_router(state, public)).unwrap();

        (server, audit_logs)
    }

    async fn harness_with(processes: InMemoryProcessRepository) -> Harness {
        let (server, audit_logs) = server_with(processes.clone());

        let response = server
            .post("/bootstrap")
            .json(&json!({
                "token": BOOTSTRAP_TOKEN,
                "name": "Admin",
                "email": "admin@anpd.gov.br",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let admin_key = response.json::<Value>()["api_key"]
            .as_str()
            .unwrap()
            .to_string();

        Harness {
            server,
            admin_key,
            processes,
            audit_logs,
        }
    }

    async fn harness() -> Harness {
        harness_with(InMemoryProcessRepository::new()).await
    }

    /// Create a profile with the given grants and a user on it; returns the key
    async fn user_with_grants(h: &Harness, profile: &str, grants: Value) -> String {
        let response = h
            .server
            .post("/profiles")
            .authorization_bearer(&h.admin_key)
            .json(&json!({ "name": profile }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let profile_id = response.json::<Value>()["id"].as_str().unwrap().to_string();

        h.server
            .put(&format!("/profiles/{}/permissions", profile_id))
            .authorization_bearer(&h.admin_key)
            .json(&json!({ "permissions": grants }))
            .await
            .assert_status_ok();

        let response = h
            .server
            .post("/users")
            .authorization_bearer(&h.admin_key)
            .json(&json!({
                "name": format!("{} user", profile),
                "email": format!("{}@anpd.gov.br", profile.to_lowercase()),
                "profile_id": profile_id,
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Value>()["api_key"]
            .as_str()
            .unwrap()
            .to_string()
    }

    fn csv_form(content: &str) -> MultipartForm {
        MultipartForm::new().add_part(
            "file",
            Part::bytes(content.as_bytes().to_vec())
                .file_name("processos.csv")
                .mime_type("text/csv"),
        )
    }

    #[tokio::test]
    async fn health_is_public() {
        let (server, _) = server_with(InMemoryProcessRepository::new());
        let response = server.get("/health").await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "ok");
    }

    #[tokio::test]
    async fn bootstrap_works_once() {
        let h = harness().await;
        assert!(h.admin_key.starts_with("ak-"));
        assert_eq!(h.admin_key.len(), 3 + 64);

        let again = h
            .server
            .post("/bootstrap")
            .json(&json!({
                "token": BOOTSTRAP_TOKEN,
                "name": "Other",
                "email": "other@anpd.gov.br",
            }))
            .await;
        again.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn bootstrap_rejects_wrong_token() {
        let (server, _) = server_with(InMemoryProcessRepository::new());
        let response = server
            .post("/bootstrap")
            .json(&json!({
                "token": "guess",
                "name": "Admin",
                "email": "admin@anpd.gov.br",
            }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn protected_routes_require_a_valid_key() {
        let h = harness().await;

        h.server
            .get("/processes")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        h.server
            .get("/processes")
            .authorization_bearer("ak-not-a-real-key")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        h.server
            .get("/processes")
            .authorization_bearer(&h.admin_key)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn me_returns_effective_grants() {
        let h = harness().await;

        let response = h.server.get("/me").authorization_bearer(&h.admin_key).await;
        response.assert_status_ok();

        let body = response.json::<Value>();
        assert_eq!(body["email"], "admin@anpd.gov.br");
        assert!(body.get("api_key_hash").is_none());
        assert_eq!(
            body["permissions"],
            json!([{ "action": "manage", "resource": "*" }])
        );
    }

    #[tokio::test]
    async fn missing_permission_is_forbidden() {
        let h = harness().await;
        let reader = user_with_grants(
            &h,
            "Leitura",
            json!([{ "action": "read", "resource": "process" }]),
        )
        .await;

        h.server
            .get("/processes")
            .authorization_bearer(&reader)
            .await
            .assert_status_ok();

        h.server
            .post("/processes")
            .authorization_bearer(&reader)
            .json(&json!({ "number": "00261.000001/2024-11" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        h.server
            .get("/users")
            .authorization_bearer(&reader)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn permission_changes_apply_immediately() {
        let h = harness().await;
        let key = user_with_grants(
            &h,
            "Analista",
            json!([{ "action": "read", "resource": "process" }]),
        )
        .await;

        h.server
            .get("/dashboard")
            .authorization_bearer(&key)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let profiles = h
            .server
            .get("/profiles")
            .authorization_bearer(&h.admin_key)
            .await
            .json::<Value>();
        let profile_id = profiles
            .as_array()
            .unwrap()
            .iter()
            .find(|p| p["name"] == "Analista")
            .unwrap()["id"]
            .as_str()
            .unwrap()
            .to_string();

        h.server
            .post(&format!("/profiles/{}/permissions", profile_id))
            .authorization_bearer(&h.admin_key)
            .json(&json!({ "action": "read", "resource": "dashboard" }))
            .await
            .assert_status(StatusCode::CREATED);

        h.server
            .get("/dashboard")
            .authorization_bearer(&key)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn deactivated_user_loses_access() {
        let h = harness().await;
        let key = user_with_grants(
            &h,
            "Temporario",
            json!([{ "action": "read", "resource": "process" }]),
        )
        .await;

        let me = h.server.get("/me").authorization_bearer(&key).await;
        let user_id = me.json::<Value>()["id"].as_str().unwrap().to_string();

        h.server
            .delete(&format!("/users/{}", user_id))
            .authorization_bearer(&h.admin_key)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        h.server
            .get("/processes")
            .authorization_bearer(&key)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn users_cannot_deactivate_themselves() {
        let h = harness().await;

        let me = h.server.get("/me").authorization_bearer(&h.admin_key).await;
        let user_id = me.json::<Value>()["id"].as_str().unwrap().to_string();

        h.server
            .delete(&format!("/users/{}", user_id))
            .authorization_bearer(&h.admin_key)
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        h.server
            .patch(&format!("/users/{}", user_id))
            .authorization_bearer(&h.admin_key)
            .json(&json!({ "active": false }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        // Other fields of the own record can still change
        h.server
            .patch(&format!("/users/{}", user_id))
            .authorization_bearer(&h.admin_key)
            .json(&json!({ "name": "Admin Renomeado", "active": true }))
            .await
            .assert_status_ok();

        h.server
            .get("/me")
            .authorization_bearer(&h.admin_key)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn rotated_key_replaces_old_one() {
        let h = harness().await;

        let me = h.server.get("/me").authorization_bearer(&h.admin_key).await;
        let user_id = me.json::<Value>()["id"].as_str().unwrap().to_string();

        let response = h
            .server
            .post(&format!("/users/{}/rotate-key", user_id))
            .authorization_bearer(&h.admin_key)
            .await;
        response.assert_status_ok();
        let new_key = response.json::<Value>()["api_key"]
            .as_str()
            .unwrap()
            .to_string();

        h.server
            .get("/me")
            .authorization_bearer(&h.admin_key)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        h.server
            .get("/me")
            .authorization_bearer(&new_key)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn process_lifecycle() {
        let h = harness().await;

        let situation = h
            .server
            .post("/situations")
            .authorization_bearer(&h.admin_key)
            .json(&json!({ "name": "Em análise" }))
            .await;
        situation.assert_status(StatusCode::CREATED);
        let situation_id = situation.json::<Value>()["id"].as_str().unwrap().to_string();

        let created = h
            .server
            .post("/processes")
            .authorization_bearer(&h.admin_key)
            .json(&json!({
                "number": "  00261.000001/2024-11 ",
                "situation_id": situation_id,
                "received_at": "2024-02-10",
            }))
            .await;
        created.assert_status(StatusCode::CREATED);
        let body = created.json::<Value>();
        assert_eq!(body["number"], "00261.000001/2024-11");
        assert_eq!(body["open"], true);
        let id = body["id"].as_str().unwrap().to_string();

        // Duplicate number
        h.server
            .post("/processes")
            .authorization_bearer(&h.admin_key)
            .json(&json!({ "number": "00261.000001/2024-11" }))
            .await
            .assert_status(StatusCode::CONFLICT);

        // Unknown reference
        h.server
            .post("/processes")
            .authorization_bearer(&h.admin_key)
            .json(&json!({
                "number": "00261.000002/2024-11",
                "complainant_id": uuid::Uuid::new_v4(),
            }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        // Closing before receiving
        h.server
            .patch(&format!("/processes/{}", id))
            .authorization_bearer(&h.admin_key)
            .json(&json!({ "closed_at": "2024-01-01" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let closed = h
            .server
            .patch(&format!("/processes/{}", id))
            .authorization_bearer(&h.admin_key)
            .json(&json!({ "closed_at": "2024-03-01" }))
            .await;
        closed.assert_status_ok();
        assert_eq!(closed.json::<Value>()["open"], false);

        let list = h
            .server
            .get("/processes")
            .add_query_param("situation_id", &situation_id)
            .authorization_bearer(&h.admin_key)
            .await
            .json::<Value>();
        assert_eq!(list["total"], 1);
        assert_eq!(list["limit"], 20);

        // Explicit nulls reopen and unassign; omitted fields stay
        let reopened = h
            .server
            .patch(&format!("/processes/{}", id))
            .authorization_bearer(&h.admin_key)
            .json(&json!({ "closed_at": null, "situation_id": null }))
            .await;
        reopened.assert_status_ok();
        let body = reopened.json::<Value>();
        assert_eq!(body["open"], true);
        assert_eq!(body["closed_at"], Value::Null);
        assert_eq!(body["situation_id"], Value::Null);
        assert_eq!(body["received_at"], "2024-02-10");

        h.server
            .delete(&format!("/processes/{}", id))
            .authorization_bearer(&h.admin_key)
            .await
            .assert_status_ok();

        let list = h
            .server
            .get("/processes")
            .authorization_bearer(&h.admin_key)
            .await
            .json::<Value>();
        assert_eq!(list["total"], 0);

        let inactive = h
            .server
            .get(&format!("/processes/{}", id))
            .authorization_bearer(&h.admin_key)
            .await;
        inactive.assert_status_ok();
        assert_eq!(inactive.json::<Value>()["active"], false);

        h.server
            .get(&format!("/processes/{}", uuid::Uuid::new_v4()))
            .authorization_bearer(&h.admin_key)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_process_number_is_bad_request() {
        let h = harness().await;
        let response = h
            .server
            .post("/processes")
            .authorization_bearer(&h.admin_key)
            .json(&json!({ "number": "   " }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "Validation error");
    }

    #[tokio::test]
    async fn lookup_names_are_unique_per_kind() {
        let h = harness().await;

        h.server
            .post("/entry-channels")
            .authorization_bearer(&h.admin_key)
            .json(&json!({ "name": "Ouvidoria" }))
            .await
            .assert_status(StatusCode::CREATED);

        h.server
            .post("/entry-channels")
            .authorization_bearer(&h.admin_key)
            .json(&json!({ "name": "ouvidoria" }))
            .await
            .assert_status(StatusCode::CONFLICT);

        // Same name under another kind is fine
        h.server
            .post("/referrals")
            .authorization_bearer(&h.admin_key)
            .json(&json!({ "name": "Ouvidoria" }))
            .await
            .assert_status(StatusCode::CREATED);

        let channels = h
            .server
            .get("/entry-channels")
            .authorization_bearer(&h.admin_key)
            .await
            .json::<Value>();
        assert_eq!(channels.as_array().unwrap().len(), 1);
        assert_eq!(channels[0]["kind"], "entry_channel");
    }

    #[tokio::test]
    async fn parties_are_scoped_by_route() {
        let h = harness().await;

        let created = h
            .server
            .post("/controllers")
            .authorization_bearer(&h.admin_key)
            .json(&json!({ "name": "Empresa Exemplo Ltda" }))
            .await;
        created.assert_status(StatusCode::CREATED);
        let id = created.json::<Value>()["id"].as_str().unwrap().to_string();

        h.server
            .get(&format!("/controllers/{}", id))
            .authorization_bearer(&h.admin_key)
            .await
            .assert_status_ok();

        h.server
            .get(&format!("/complainants/{}", id))
            .authorization_bearer(&h.admin_key)
            .await
            .assert_status(StatusCode::NOT_FOUND);

        h.server
            .post("/complainants")
            .authorization_bearer(&h.admin_key)
            .json(&json!({ "name": "Fulano", "email": "not-an-email" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn import_counts_rows() {
        let processes = InMemoryProcessRepository::new().with_process(test_process("100"));
        let h = harness_with(processes).await;

        let csv = "Número;Requerente;Situação;Data de entrada\n\
                   100;Maria;Em análise;01/02/2024\n\
                   101;Maria;Em análise;02/02/2024\n\
                   102;João;Arquivado;31/02/2024\n\
                   103;;;\n";

        let response = h
            .server
            .post("/processes/import")
            .authorization_bearer(&h.admin_key)
            .multipart(csv_form(csv))
            .await;
        response.assert_status_ok();

        let report = response.json::<Value>();
        assert_eq!(report["total"], 4);
        assert_eq!(report["imported"], 2);
        assert_eq!(report["skipped"], 1);
        assert_eq!(report["failed"], 1);
        assert_eq!(report["dry_run"], false);
        assert_eq!(report["errors"].as_array().unwrap().len(), 2);

        assert!(h.processes.contains_number("101"));
        assert!(h.processes.contains_number("103"));
        assert!(!h.processes.contains_number("102"));

        let situations = h
            .server
            .get("/situations")
            .authorization_bearer(&h.admin_key)
            .await
            .json::<Value>();
        assert_eq!(situations.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn dry_run_import_writes_nothing() {
        let h = harness().await;

        let response = h
            .server
            .post("/processes/import?dry_run=true")
            .authorization_bearer(&h.admin_key)
            .multipart(csv_form("numero,situacao\n200,Nova\n200,Nova\n"))
            .await;
        response.assert_status_ok();

        let report = response.json::<Value>();
        assert_eq!(report["dry_run"], true);
        assert_eq!(report["imported"], 1);
        assert_eq!(report["skipped"], 1);
        assert!(!h.processes.contains_number("200"));
    }

    #[tokio::test]
    async fn import_applies_registry_name_limits() {
        let h = harness().await;
        let long = "x".repeat(300);

        let response = h
            .server
            .post("/processes/import")
            .authorization_bearer(&h.admin_key)
            .multipart(csv_form(&format!(
                "numero;situacao;requerido\n1;{long};{long}\n2;Em análise;Banco\n"
            )))
            .await;
        response.assert_status_ok();

        let report = response.json::<Value>();
        assert_eq!(report["imported"], 1);
        assert_eq!(report["failed"], 1);
        assert_eq!(report["errors"][0]["line"], 2);
        assert!(!h.processes.contains_number("1"));

        let situations = h
            .server
            .get("/situations")
            .authorization_bearer(&h.admin_key)
            .await
            .json::<Value>();
        let situations = situations.as_array().unwrap();
        assert_eq!(situations.len(), 1);
        assert_eq!(situations[0]["name"], "Em análise");
    }

    #[tokio::test]
    async fn oversized_import_is_rejected() {
        let h = harness().await;
        let limit = Config::for_tests().import_max_bytes;

        let mut csv = String::from("numero\n");
        while csv.len() <= limit {
            csv.push_str("00261.000001/2024-11\n");
        }

        h.server
            .post("/processes/import")
            .authorization_bearer(&h.admin_key)
            .multipart(csv_form(&csv))
            .await
            .assert_status(StatusCode::PAYLOAD_TOO_LARGE);

        assert!(!h.processes.contains_number("00261.000001/2024-11"));
    }

    #[tokio::test]
    async fn import_without_number_column_is_rejected() {
        let h = harness().await;

        let response = h
            .server
            .post("/processes/import")
            .authorization_bearer(&h.admin_key)
            .multipart(csv_form("requerente;situacao\nMaria;Nova\n"))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "Import error");
    }

    #[tokio::test]
    async fn dashboard_summarizes_processes() {
        let mut open = test_process("1");
        open.received_at = chrono::NaiveDate::from_ymd_opt(2024, 5, 2);
        let mut closed = test_process("2");
        closed.received_at = chrono::NaiveDate::from_ymd_opt(2024, 5, 3);
        closed.closed_at = chrono::NaiveDate::from_ymd_opt(2024, 6, 1);

        let processes = InMemoryProcessRepository::new()
            .with_process(open)
            .with_process(closed);
        let h = harness_with(processes).await;

        let response = h
            .server
            .get("/dashboard")
            .add_query_param("year", 2024)
            .authorization_bearer(&h.admin_key)
            .await;
        response.assert_status_ok();

        let summary = response.json::<Value>();
        assert_eq!(summary["total"], 2);
        assert_eq!(summary["open"], 1);
        assert_eq!(summary["closed"], 1);
        assert_eq!(summary["received_by_month"][4]["count"], 2);
        assert_eq!(summary["by_situation"][0]["label"], "Não informado");
    }

    #[tokio::test]
    async fn writes_are_audited() {
        let h = harness().await;

        let created = h
            .server
            .post("/processes")
            .authorization_bearer(&h.admin_key)
            .json(&json!({ "number": "00261.000077/2024-00" }))
            .await;
        created.assert_status(StatusCode::CREATED);

        // Entries are written in the background
        for _ in 0..50 {
            if h.audit_logs.len() >= 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let logs = h
            .server
            .get("/audit-logs")
            .add_query_param("resource", "process")
            .authorization_bearer(&h.admin_key)
            .await
            .json::<Value>();
        let logs = logs.as_array().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0]["action"], "create");
        assert_eq!(logs[0]["details"]["number"], "00261.000077/2024-00");
    }
}
