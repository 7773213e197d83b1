// ABOUTME: Integration tests for the request gate and its endpoint catalog
// ABOUTME: Checks allow/deny against the role table for every declared route and that denials never hit the network
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 College Fee Client Contributors
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use college_fee_client::{
    client::{ApiRequest, ClientError},
    constants::permissions,
    guard::{DenyReason, GateDecision, RefreshMode, RequestGate},
    models::Role,
    permissions::{role_permissions, Access, EndpointCatalog, Resource, Verb},
    session::{decode_session, Session},
};
use common::{MockBackend, TestClaims, TestClient};
use http::Method;
use serde_json::{json, Value};

fn session_for(claims: &TestClaims) -> Session {
    decode_session(Some(&common::mint_token(claims))).expect("minted token decodes")
}

fn claims_for(role: Role) -> TestClaims {
    match role {
        Role::Admin => TestClaims::admin(),
        Role::Finance => TestClaims::finance(),
        Role::Hod => TestClaims::hod(),
        _ => TestClaims::student(),
    }
}

fn expected_decision(role: Role, extra: &[&str], verb: Verb, resource: Resource, access: Access) -> bool {
    let holds = |p: &str| role_permissions(role).contains(&p) || extra.contains(&p);
    if role == Role::Student && resource == Resource::Students {
        return verb == Verb::Get && holds(permissions::VIEW_OWN_DATA);
    }
    match access {
        Access::Public => true,
        Access::Permission(p) => holds(p),
        Access::AnyOf(ps) => ps.iter().any(|p| holds(*p)),
    }
}

#[test]
fn test_every_declared_endpoint_follows_the_role_table() {
    common::init_test_logging();
    let gate = RequestGate::default();
    let extras: [&[&'static str]; 3] = [
        &[],
        &[permissions::VIEW_PAYMENTS],
        &[permissions::CREATE_STUDENT, permissions::MANAGE_REPORTS],
    ];

    for role in Role::ALL {
        for extra in extras {
            let mut claims = claims_for(role).with_permissions(extra);
            if role == Role::Student {
                claims.permissions.push(permissions::VIEW_OWN_DATA);
            }
            let session = session_for(&claims);
            let token_extra: Vec<&str> = claims.permissions.clone();

            for endpoint in gate.catalog().endpoints() {
                let path = endpoint.render(&["7"]);
                let method = endpoint.verb.as_method();
                let resolved = gate.catalog().resolve(&method, &path).unwrap();
                assert_eq!(resolved, endpoint, "{path} resolved to another route");

                let decision = gate.check(Some(&session), &method, &path);
                if endpoint.access == Access::Public {
                    assert_eq!(decision, GateDecision::Bypass, "{endpoint}");
                    continue;
                }
                let allowed = expected_decision(
                    role,
                    &token_extra,
                    endpoint.verb,
                    endpoint.resource,
                    endpoint.access,
                );
                assert_eq!(
                    decision.is_permitted(),
                    allowed,
                    "{role} with {token_extra:?} on {endpoint}: {decision:?}"
                );
            }
        }
    }
}

#[test]
fn test_anonymous_callers_only_reach_public_routes() {
    let gate = RequestGate::default();
    for endpoint in gate.catalog().endpoints() {
        let path = endpoint.render(&["7"]);
        let decision = gate.check(None, &endpoint.verb.as_method(), &path);
        match endpoint.access {
            Access::Public => assert_eq!(decision, GateDecision::Bypass),
            access => assert_eq!(
                decision,
                GateDecision::Deny(DenyReason::Anonymous {
                    required: access.describe()
                }),
                "{endpoint}"
            ),
        }
    }
}

#[test]
fn test_student_scope_overrides_token_permissions() {
    let gate = RequestGate::default();
    let student = session_for(&TestClaims::student().with_permissions(&[
        permissions::VIEW_OWN_DATA,
        permissions::CREATE_STUDENT,
        permissions::VIEW_ALL,
    ]));

    assert_eq!(
        gate.check(Some(&student), &Method::GET, "/students/"),
        GateDecision::Allow
    );
    assert_eq!(
        gate.check(Some(&student), &Method::GET, "/students/99/"),
        GateDecision::Allow
    );
    assert_eq!(
        gate.check(Some(&student), &Method::POST, "/students/"),
        GateDecision::Deny(DenyReason::StudentScope)
    );
    assert_eq!(
        gate.check(Some(&student), &Method::DELETE, "/students/42/"),
        GateDecision::Deny(DenyReason::StudentScope)
    );

    let without_own_data = session_for(&TestClaims::student().with_permissions(&[]));
    // Role table still grants view_own_data
    assert_eq!(
        gate.check(Some(&without_own_data), &Method::GET, "/students/"),
        GateDecision::Allow
    );
}

#[test]
fn test_token_permissions_extend_the_role_table() {
    let gate = RequestGate::default();
    let hod = session_for(&TestClaims::hod());
    assert!(!gate
        .check(Some(&hod), &Method::POST, "/payments/offline/")
        .is_permitted());

    let hod_with_grant =
        session_for(&TestClaims::hod().with_permissions(&[permissions::MANAGE_PAYMENTS]));
    assert_eq!(
        gate.check(Some(&hod_with_grant), &Method::POST, "/payments/offline/"),
        GateDecision::Allow
    );
}

#[test]
fn test_auth_paths_and_undeclared_routes() {
    let gate = RequestGate::new(EndpointCatalog::empty());
    assert_eq!(
        gate.check(None, &Method::POST, "/auth/token/refresh/"),
        GateDecision::Bypass
    );
    assert_eq!(
        gate.check(None, &Method::GET, "/students/"),
        GateDecision::Deny(DenyReason::Undeclared)
    );

    let admin = session_for(&TestClaims::admin());
    let standard = RequestGate::default();
    assert_eq!(
        standard.check(Some(&admin), &Method::GET, "/not/a/route/"),
        GateDecision::Deny(DenyReason::Undeclared)
    );
    assert_eq!(
        standard.check(Some(&admin), &Method::GET, "/students/?page=2&search=rao"),
        GateDecision::Allow
    );
}

#[tokio::test]
async fn test_admin_may_record_offline_payment() {
    let backend = MockBackend::start().await;
    let pair = backend.valid_pair(&TestClaims::admin());
    let harness = TestClient::new(backend.base_url(), RefreshMode::Independent, Some(&pair));

    let body: Value = harness
        .client
        .post_json(
            "/payments/offline/",
            &json!({ "invoice": 7, "amount": "15000.00", "mode": "cash" }),
        )
        .await
        .unwrap();

    assert_eq!(body["method"], "POST");
    assert_eq!(body["path"], "/api/payments/offline/");
    assert_eq!(backend.data_calls(), 1);
    assert_eq!(
        backend.authorizations(),
        vec![Some(format!("Bearer {}", pair.access_token))]
    );
}

#[tokio::test]
async fn test_local_denial_never_reaches_the_backend() {
    let backend = MockBackend::start().await;
    let pair = backend.valid_pair(&TestClaims::student());
    let harness = TestClient::new(backend.base_url(), RefreshMode::Independent, Some(&pair));

    let err = harness
        .client
        .send(ApiRequest::post("/students/").json_value(json!({ "usn": "1XX21CS099" })))
        .await
        .unwrap_err();
    assert!(err.is_local_denial(), "{err:?}");
    assert!(matches!(
        err,
        ClientError::LocalAuthorization {
            reason: DenyReason::StudentScope,
            ..
        }
    ));

    let err = harness
        .client
        .get_json::<Value>("/reports/collections/")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::LocalAuthorization {
            reason: DenyReason::MissingPermission { .. },
            ..
        }
    ));

    let err = harness
        .client
        .get_json::<Value>("/undeclared/")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::UndeclaredEndpoint { .. }));

    assert_eq!(backend.data_calls(), 0);
    assert_eq!(backend.refresh_calls(), 0);
    assert!(harness.navigator.visits().is_empty());
}

#[tokio::test]
async fn test_student_reads_student_list_through_the_guard() {
    let backend = MockBackend::start().await;
    let pair = backend.valid_pair(&TestClaims::student());
    let harness = TestClient::new(backend.base_url(), RefreshMode::Independent, Some(&pair));

    let body: Value = harness.client.get_json("/students/").await.unwrap();
    assert_eq!(body["path"], "/api/students/");
    assert_eq!(backend.data_calls(), 1);
}

#[tokio::test]
async fn test_anonymous_request_is_denied_locally() {
    let backend = MockBackend::start().await;
    let harness = TestClient::new(backend.base_url(), RefreshMode::Independent, None);

    let err = harness
        .client
        .get_json::<Value>("/invoices/")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::LocalAuthorization {
            reason: DenyReason::Anonymous { .. },
            ..
        }
    ));
    assert_eq!(backend.data_calls(), 0);
}

#[test]
fn test_malformed_tokens_are_anonymous() {
    let samples = [
        "",
        ".",
        "..",
        "a.b.c",
        "header.%%%%.sig",
        "eyJhbGciOiJIUzI1NiJ9.bm90IGpzb24.sig",
        "eyJhbGciOiJIUzI1NiJ9.eyJyb2xlIjoiYWRtaW4ifQ.sig",
        "eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOjEsInJvbGUiOiJqYW5pdG9yIn0.sig",
        "\u{1F600}.\u{1F600}.\u{1F600}",
    ];
    let gate = RequestGate::default();
    for token in samples {
        let session = decode_session(Some(token));
        assert!(session.is_none(), "{token:?} decoded");
        assert!(!gate
            .check(session.as_ref(), &Method::GET, "/students/")
            .is_permitted());
    }
}
