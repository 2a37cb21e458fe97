use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use tower::ServiceExt;

use vitrine::api::AppState;
use vitrine::config::Config;
use vitrine::entities::{lojistas, tickets};

async fn spawn_app() -> (Router, Arc<AppState>) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    // Cheap hashing params to keep the suite fast.
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let state = vitrine::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    let app = vitrine::api::router(state.clone()).await;

    (app, state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    let request = if let Some(body) = body {
        builder
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap()
    } else {
        builder.body(Body::empty()).unwrap()
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };

    (status, json)
}

async fn lojista_row(state: &Arc<AppState>, email: &str) -> lojistas::Model {
    lojistas::Entity::find()
        .filter(lojistas::Column::Email.eq(email))
        .one(&state.store().conn)
        .await
        .unwrap()
        .expect("lojista row")
}

/// Register a lojista and redeem its verification token.
async fn register_verified_lojista(
    app: &Router,
    state: &Arc<AppState>,
    email: &str,
    senha: &str,
) {
    let (status, _) = send(
        app,
        "POST",
        "/api/auth/registrar-lojista",
        None,
        Some(serde_json::json!({
            "nome": "Maria Teste",
            "email": email,
            "senha": senha,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let token = lojista_row(state, email)
        .await
        .token_verificacao
        .expect("verification token");

    let (status, _) = send(
        app,
        "GET",
        &format!("/api/auth/verificar-email?token={token}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

fn totp_code(secret_base32: &str) -> String {
    let secret_bytes = totp_rs::Secret::Encoded(secret_base32.to_string())
        .to_bytes()
        .unwrap();
    let totp = totp_rs::TOTP::new(
        totp_rs::Algorithm::SHA1,
        6,
        1,
        30,
        secret_bytes,
        Some("Vitrine".to_string()),
        "test".to_string(),
    )
    .unwrap();
    totp.generate_current().unwrap()
}

#[tokio::test]
async fn scenario_a_first_admin_is_master_and_logs_in() {
    let (app, _state) = spawn_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/setup",
        None,
        Some(serde_json::json!({"email": "a@x.com", "password": "secret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "active");

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({"email": "a@x.com", "password": "secret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "admin");
    assert_eq!(body["data"]["email"], "a@x.com");
}

#[tokio::test]
async fn scenario_b_second_admin_awaits_approval() {
    let (app, _state) = spawn_app().await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/setup",
        None,
        Some(serde_json::json!({"email": "first@x.com", "password": "secret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/setup",
        None,
        Some(serde_json::json!({"email": "second@x.com", "password": "secret2"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "pending");
    let second_id = body["data"]["id"].as_i64().unwrap();

    // Duplicate email is a conflict, not a second pending row.
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/setup",
        None,
        Some(serde_json::json!({"email": "second@x.com", "password": "other99"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Pending admin with correct credentials gets a distinct 403.
    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({"email": "second@x.com", "password": "secret2"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("approval"));

    // Wrong credentials stay generic even for pending accounts.
    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({"email": "second@x.com", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    // An active admin approves, then login succeeds.
    let (_, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({"email": "first@x.com", "password": "secret1"})),
    )
    .await;
    let master_token = body["data"]["token"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/admins/{second_id}"),
        Some(&master_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "active");

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({"email": "second@x.com", "password": "secret2"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn scenario_c_login_gated_on_email_verification() {
    let (app, state) = spawn_app().await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/registrar-lojista",
        None,
        Some(serde_json::json!({
            "nome": "Loja da Maria",
            "email": "maria@x.com",
            "senha": "senha123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login-lojista",
        None,
        Some(serde_json::json!({"email": "maria@x.com", "senha": "senha123"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["email_nao_verificado"], true);
    assert_eq!(body["email"], "maria@x.com");

    let token = lojista_row(&state, "maria@x.com")
        .await
        .token_verificacao
        .unwrap();

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/auth/verificar-email?token={token}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The token is single use; "already used" and "never existed" look alike.
    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/auth/verificar-email?token={token}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login-lojista",
        None,
        Some(serde_json::json!({"email": "maria@x.com", "senha": "senha123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["token"].is_string());
}

#[tokio::test]
async fn scenario_d_two_factor_step_up() {
    let (app, state) = spawn_app().await;
    register_verified_lojista(&app, &state, "loja2fa@x.com", "senha123").await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/auth/login-lojista",
        None,
        Some(serde_json::json!({"email": "loja2fa@x.com", "senha": "senha123"})),
    )
    .await;
    let session = body["data"]["token"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "POST", "/api/2fa/generate", Some(&session), None).await;
    assert_eq!(status, StatusCode::OK);
    let secret = body["data"]["secret"].as_str().unwrap().to_string();
    assert!(body["data"]["otpauth_url"]
        .as_str()
        .unwrap()
        .starts_with("otpauth://totp/"));

    let (status, _) = send(
        &app,
        "POST",
        "/api/2fa/enable",
        Some(&session),
        Some(serde_json::json!({"code": totp_code(&secret)})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Login now withholds the session token and demands the step-up.
    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login-lojista",
        None,
        Some(serde_json::json!({"email": "loja2fa@x.com", "senha": "senha123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["require2FA"], true);
    assert!(body["data"]["token"].is_null());
    let temp_token = body["data"]["tempToken"].as_str().unwrap().to_string();

    // A wrong code is rejected without consuming the partial token.
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/verify-login-2fa",
        None,
        Some(serde_json::json!({"tempToken": temp_token, "code": "000000"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/verify-login-2fa",
        None,
        Some(serde_json::json!({"tempToken": temp_token, "code": totp_code(&secret)})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["token"].is_string());
}

#[tokio::test]
async fn partial_tokens_are_rejected_outside_the_step_up() {
    let (app, state) = spawn_app().await;
    register_verified_lojista(&app, &state, "parcial@x.com", "senha123").await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/auth/login-lojista",
        None,
        Some(serde_json::json!({"email": "parcial@x.com", "senha": "senha123"})),
    )
    .await;
    let session = body["data"]["token"].as_str().unwrap().to_string();

    let (_, body) = send(&app, "POST", "/api/2fa/generate", Some(&session), None).await;
    let secret = body["data"]["secret"].as_str().unwrap().to_string();
    send(
        &app,
        "POST",
        "/api/2fa/enable",
        Some(&session),
        Some(serde_json::json!({"code": totp_code(&secret)})),
    )
    .await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/auth/login-lojista",
        None,
        Some(serde_json::json!({"email": "parcial@x.com", "senha": "senha123"})),
    )
    .await;
    let temp_token = body["data"]["tempToken"].as_str().unwrap().to_string();

    // Well-formed and unexpired, but partial: every protected endpoint and
    // the identity endpoint treat it as not authenticated.
    let (status, _) = send(&app, "GET", "/api/notificacoes", Some(&temp_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "POST", "/api/2fa/generate", Some(&temp_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, "GET", "/api/auth/me", Some(&temp_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].is_null());

    // A full session token cannot complete the step-up either.
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/verify-login-2fa",
        None,
        Some(serde_json::json!({"tempToken": session, "code": totp_code(&secret)})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn scenario_e_security_report_locks_and_ticket_resolution_unlocks() {
    let (app, state) = spawn_app().await;
    register_verified_lojista(&app, &state, "vitima@x.com", "senha123").await;

    // Password reset issues the security-report token via the
    // password-change notice.
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/redefinir-senha",
        None,
        Some(serde_json::json!({"email": "vitima@x.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let reset_token = lojista_row(&state, "vitima@x.com")
        .await
        .token_redefinicao
        .expect("reset token");

    // Policy check happens before any state is touched.
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/nova-senha",
        None,
        Some(serde_json::json!({"token": reset_token, "senha": "abc"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/nova-senha",
        None,
        Some(serde_json::json!({"token": reset_token, "senha": "senhanova1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let row = lojista_row(&state, "vitima@x.com").await;
    assert!(row.token_redefinicao.is_none());
    let security_token = row.security_token.expect("security token");

    // Browser-navigated link: the response is a redirect, not JSON.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/auth/security-report?token={security_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers().get("location").unwrap().to_str().unwrap();
    assert!(location.ends_with("/conta-bloqueada"));

    let row = lojista_row(&state, "vitima@x.com").await;
    assert!(row.bloqueado);
    assert!(row.security_token.is_none());

    let open_tickets = tickets::Entity::find()
        .filter(tickets::Column::LojistaId.eq(row.id))
        .filter(tickets::Column::Tipo.eq("compromisso_conta"))
        .filter(tickets::Column::Status.eq("aberto"))
        .all(&state.store().conn)
        .await
        .unwrap();
    assert_eq!(open_tickets.len(), 1);
    let ticket_id = open_tickets[0].id;

    // Second use of the same token: 400, nothing duplicated.
    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/auth/security-report?token={security_token}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Lockout wins over a correct password.
    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login-lojista",
        None,
        Some(serde_json::json!({"email": "vitima@x.com", "senha": "senhanova1"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["data"].is_null());

    // Resolving the compromise ticket is the one path that unlocks.
    let (_, body) = send(
        &app,
        "POST",
        "/api/auth/setup",
        None,
        Some(serde_json::json!({"email": "suporte@x.com", "password": "admin123"})),
    )
    .await;
    assert_eq!(body["data"]["status"], "active");

    let (_, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({"email": "suporte@x.com", "password": "admin123"})),
    )
    .await;
    let admin_token = body["data"]["token"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/tickets/{ticket_id}/resolver"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "resolvido");

    let row = lojista_row(&state, "vitima@x.com").await;
    assert!(!row.bloqueado);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login-lojista",
        None,
        Some(serde_json::json!({"email": "vitima@x.com", "senha": "senhanova1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn lockout_applies_even_mid_step_up() {
    let (app, state) = spawn_app().await;
    register_verified_lojista(&app, &state, "trancada@x.com", "senha123").await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/auth/login-lojista",
        None,
        Some(serde_json::json!({"email": "trancada@x.com", "senha": "senha123"})),
    )
    .await;
    let session = body["data"]["token"].as_str().unwrap().to_string();

    let (_, body) = send(&app, "POST", "/api/2fa/generate", Some(&session), None).await;
    let secret = body["data"]["secret"].as_str().unwrap().to_string();
    send(
        &app,
        "POST",
        "/api/2fa/enable",
        Some(&session),
        Some(serde_json::json!({"code": totp_code(&secret)})),
    )
    .await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/auth/login-lojista",
        None,
        Some(serde_json::json!({"email": "trancada@x.com", "senha": "senha123"})),
    )
    .await;
    let temp_token = body["data"]["tempToken"].as_str().unwrap().to_string();

    // Lock lands between password check and 2FA completion.
    let row = lojista_row(&state, "trancada@x.com").await;
    let mut active: lojistas::ActiveModel = row.into();
    active.bloqueado = Set(true);
    active.update(&state.store().conn).await.unwrap();

    // Correct password + valid code still cannot mint a session token.
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/verify-login-2fa",
        None,
        Some(serde_json::json!({"tempToken": temp_token, "code": totp_code(&secret)})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login-lojista",
        None,
        Some(serde_json::json!({"email": "trancada@x.com", "senha": "senha123"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The session token issued before the lock stops working immediately.
    let (status, _) = send(&app, "GET", "/api/notificacoes", Some(&session), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn anti_enumeration_responses_are_identical() {
    let (app, state) = spawn_app().await;
    register_verified_lojista(&app, &state, "existe@x.com", "senha123").await;

    let (status_hit, body_hit) = send(
        &app,
        "POST",
        "/api/auth/redefinir-senha",
        None,
        Some(serde_json::json!({"email": "existe@x.com"})),
    )
    .await;
    let (status_miss, body_miss) = send(
        &app,
        "POST",
        "/api/auth/redefinir-senha",
        None,
        Some(serde_json::json!({"email": "ninguem@x.com"})),
    )
    .await;
    assert_eq!(status_hit, StatusCode::OK);
    assert_eq!(status_hit, status_miss);
    assert_eq!(body_hit, body_miss);

    let (status_hit, body_hit) = send(
        &app,
        "POST",
        "/api/auth/reenviar-verificacao",
        None,
        Some(serde_json::json!({"email": "existe@x.com"})),
    )
    .await;
    let (status_miss, body_miss) = send(
        &app,
        "POST",
        "/api/auth/reenviar-verificacao",
        None,
        Some(serde_json::json!({"email": "ninguem@x.com"})),
    )
    .await;
    assert_eq!(status_hit, StatusCode::OK);
    assert_eq!(status_hit, status_miss);
    assert_eq!(body_hit, body_miss);

    let (status_hit, body_hit) = send(
        &app,
        "POST",
        "/api/auth/forgot-password-admin",
        None,
        Some(serde_json::json!({"email": "admin@x.com"})),
    )
    .await;
    let (status_miss, body_miss) = send(
        &app,
        "POST",
        "/api/auth/forgot-password-admin",
        None,
        Some(serde_json::json!({"email": "outro@x.com"})),
    )
    .await;
    assert_eq!(status_hit, StatusCode::OK);
    assert_eq!(status_hit, status_miss);
    assert_eq!(body_hit, body_miss);
}

#[tokio::test]
async fn admin_reset_tokens_are_single_use() {
    let (app, state) = spawn_app().await;

    send(
        &app,
        "POST",
        "/api/auth/setup",
        None,
        Some(serde_json::json!({"email": "chefe@x.com", "password": "antiga1"})),
    )
    .await;

    send(
        &app,
        "POST",
        "/api/auth/forgot-password-admin",
        None,
        Some(serde_json::json!({"email": "chefe@x.com"})),
    )
    .await;

    let admin = vitrine::entities::admins::Entity::find()
        .filter(vitrine::entities::admins::Column::Email.eq("chefe@x.com"))
        .one(&state.store().conn)
        .await
        .unwrap()
        .unwrap();
    let reset_token = admin.reset_token.expect("reset token");

    // Too-short password rejected before the token is consumed.
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/reset-password-admin",
        None,
        Some(serde_json::json!({"token": reset_token, "password": "abc"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/reset-password-admin",
        None,
        Some(serde_json::json!({"token": reset_token, "password": "novasenha1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Redeemed once; the same token never works again.
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/reset-password-admin",
        None,
        Some(serde_json::json!({"token": reset_token, "password": "outrasenha1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({"email": "chefe@x.com", "password": "antiga1"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({"email": "chefe@x.com", "password": "novasenha1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn emails_are_case_insensitive() {
    let (app, state) = spawn_app().await;
    register_verified_lojista(&app, &state, "caixa@x.com", "senha123").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login-lojista",
        None,
        Some(serde_json::json!({"email": "CAIXA@X.COM", "senha": "senha123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Same address with different casing is still a duplicate.
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/registrar-lojista",
        None,
        Some(serde_json::json!({
            "nome": "Outra Loja",
            "email": "Caixa@x.com",
            "senha": "senha456",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}
