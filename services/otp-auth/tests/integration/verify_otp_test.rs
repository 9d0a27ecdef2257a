use std::sync::Arc;
use std::time::Duration as StdDuration;

use portal_otp_auth::domain::types::OtpState;
use portal_otp_auth::error::OtpAuthError;
use portal_otp_auth::usecase::check_auth::CheckAuthInput;
use portal_otp_auth::usecase::request_otp::RequestOtpInput;
use portal_otp_auth::usecase::verify_otp::VerifyOtpInput;

use portal_otp_auth::usecase::CredentialCore;

use crate::helpers::{
    DEVICE, Harness, ManualClock, OTHER_DEVICE, RecordingNotifier, StubAuthorizer,
    SwitchableEntropy, t0, test_settings,
};

fn verify(code: &str, device: &str) -> VerifyOtpInput {
    VerifyOtpInput {
        code: Some(code.to_owned()),
        device_id: Some(device.to_owned()),
        caller_address: Some("192.168.1.57".to_owned()),
    }
}

fn check(device: &str) -> CheckAuthInput {
    CheckAuthInput {
        device_id: Some(device.to_owned()),
        token: None,
    }
}

async fn issue(h: &Harness, email: &str) -> String {
    h.core
        .request_otp(RequestOtpInput {
            email: email.to_owned(),
        })
        .await
        .unwrap();
    h.last_code()
}

#[tokio::test]
async fn should_walk_issue_reject_verify_reuse_scenario() {
    let h = Harness::new();
    let code = issue(&h, "a@b.com").await;

    let wrong = if code == "000000" { "999999" } else { "000000" };
    let result = h.core.verify_otp(verify(wrong, DEVICE)).await;
    assert!(
        matches!(result, Err(OtpAuthError::InvalidCode)),
        "expected InvalidCode, got {result:?}"
    );
    assert!(h.core.session_snapshot().is_empty());

    let out = h.core.verify_otp(verify(&code, DEVICE)).await.unwrap();
    assert_eq!(out.token.len(), 43);
    assert_eq!(out.address, "a@b.com");
    assert_eq!(out.expires_in_secs, 3600);
    assert!(out.router_granted);

    let sessions = h.core.session_snapshot();
    assert_eq!(sessions.len(), 1, "exactly one session for the device");
    assert_eq!(sessions[0].device_id, DEVICE);
    assert_eq!(sessions[0].token, out.token);
    assert_eq!(sessions[0].source_otp, code);

    let auth = h.core.check_auth(check(DEVICE)).unwrap();
    assert!(auth.authenticated);
    assert_eq!(auth.address.as_deref(), Some("a@b.com"));

    let result = h.core.verify_otp(verify(&code, DEVICE)).await;
    assert!(
        matches!(result, Err(OtpAuthError::AlreadyUsed)),
        "expected AlreadyUsed, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_reuse_from_any_device() {
    let h = Harness::new();
    let code = issue(&h, "a@b.com").await;
    h.core.verify_otp(verify(&code, DEVICE)).await.unwrap();

    for device in [DEVICE, OTHER_DEVICE, "de:ad:be:ef:00:01"] {
        let result = h.core.verify_otp(verify(&code, device)).await;
        assert!(
            matches!(result, Err(OtpAuthError::AlreadyUsed)),
            "expected AlreadyUsed for {device}, got {result:?}"
        );
    }
    assert!(!h.core.check_auth(check(OTHER_DEVICE)).unwrap().authenticated);

    let otp = &h.core.otp_snapshot()[0];
    assert_eq!(otp.claimed_by.as_deref(), Some(DEVICE));
}

#[tokio::test]
async fn should_require_code_and_device() {
    let h = Harness::new();
    let code = issue(&h, "a@b.com").await;

    let cases = [
        (None, Some(DEVICE.to_owned())),
        (Some(code.clone()), None),
        (Some("  ".to_owned()), Some(DEVICE.to_owned())),
        (Some(code.clone()), Some(String::new())),
    ];
    for (code, device_id) in cases {
        let result = h
            .core
            .verify_otp(VerifyOtpInput {
                code,
                device_id,
                caller_address: None,
            })
            .await;
        assert!(
            matches!(result, Err(OtpAuthError::MissingInput)),
            "expected MissingInput, got {result:?}"
        );
    }

    assert!(h.core.session_snapshot().is_empty());
    // The code was never claimed.
    h.core.verify_otp(verify(&code, DEVICE)).await.unwrap();
}

#[tokio::test]
async fn should_report_expired_before_sweep_and_create_no_session() {
    let h = Harness::new();
    let code = issue(&h, "a@b.com").await;
    h.clock.advance_secs(301);

    let result = h.core.verify_otp(verify(&code, DEVICE)).await;
    assert!(
        matches!(result, Err(OtpAuthError::Expired)),
        "expected Expired, got {result:?}"
    );
    assert!(h.core.session_snapshot().is_empty());
    assert!(h.grants.lock().unwrap().is_empty(), "router never asked");

    // The failed claim swept the code away afterwards.
    let result = h.core.verify_otp(verify(&code, DEVICE)).await;
    assert!(
        matches!(result, Err(OtpAuthError::InvalidCode)),
        "expected InvalidCode once swept, got {result:?}"
    );
}

#[tokio::test]
async fn should_accept_code_at_exact_validity_edge() {
    let h = Harness::new();
    let code = issue(&h, "a@b.com").await;
    h.clock.advance_secs(300);

    h.core.verify_otp(verify(&code, DEVICE)).await.unwrap();
    assert!(h.core.check_auth(check(DEVICE)).unwrap().authenticated);
}

#[tokio::test]
async fn should_forward_device_and_caller_to_router() {
    let h = Harness::new();
    let code = issue(&h, "a@b.com").await;
    h.core.verify_otp(verify(&code, DEVICE)).await.unwrap();

    let grants = h.grants.lock().unwrap().clone();
    assert_eq!(
        grants,
        vec![(DEVICE.to_owned(), Some("192.168.1.57".to_owned()))]
    );
}

#[tokio::test]
async fn should_keep_session_when_router_refuses() {
    let h = Harness::with(test_settings(), RecordingNotifier::ok(), StubAuthorizer::failing());
    let code = issue(&h, "a@b.com").await;

    let out = h.core.verify_otp(verify(&code, DEVICE)).await.unwrap();
    assert!(!out.router_granted, "router outcome is reported");
    assert!(!out.token.is_empty(), "token is still issued");

    h.clock.advance_secs(1800);
    let auth = h.core.check_auth(check(DEVICE)).unwrap();
    assert!(auth.authenticated, "router failure must not revoke the session");
    assert_eq!(auth.expires_in_secs, Some(1800));

    assert_eq!(h.core.otp_snapshot()[0].state, OtpState::Used);
}

#[tokio::test(start_paused = true)]
async fn should_keep_session_when_router_times_out() {
    let h = Harness::with(
        test_settings(),
        RecordingNotifier::ok(),
        StubAuthorizer::slow(StdDuration::from_secs(30)),
    );
    let code = issue(&h, "a@b.com").await;

    let out = h.core.verify_otp(verify(&code, DEVICE)).await.unwrap();
    assert!(!out.router_granted);
    assert!(h.core.check_auth(check(DEVICE)).unwrap().authenticated);
}

#[tokio::test]
async fn should_overwrite_session_on_second_verification() {
    let h = Harness::new();
    let first_code = issue(&h, "a@b.com").await;
    let second_code = issue(&h, "c@d.com").await;

    let first = h.core.verify_otp(verify(&first_code, DEVICE)).await.unwrap();
    h.clock.advance_secs(120);
    let second = h.core.verify_otp(verify(&second_code, DEVICE)).await.unwrap();
    assert_ne!(first.token, second.token);

    let sessions = h.core.session_snapshot();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].token, second.token);
    assert_eq!(sessions[0].address, "c@d.com");
    assert_eq!(sessions[0].source_otp, second_code);

    let stale = h
        .core
        .check_auth(CheckAuthInput {
            device_id: Some(DEVICE.to_owned()),
            token: Some(first.token),
        })
        .unwrap();
    assert!(!stale.authenticated, "old token is invalidated");

    let fresh = h
        .core
        .check_auth(CheckAuthInput {
            device_id: Some(DEVICE.to_owned()),
            token: Some(second.token),
        })
        .unwrap();
    assert!(fresh.authenticated);
    assert_eq!(fresh.expires_in_secs, Some(3600));
}

#[tokio::test]
async fn should_keep_code_claimable_when_token_cannot_be_drawn() {
    let notifier = RecordingNotifier::ok();
    let sent = notifier.sent_handle();
    let entropy = Arc::new(SwitchableEntropy::default());
    let core = CredentialCore::with_sources(
        test_settings(),
        notifier,
        StubAuthorizer::ok(),
        ManualClock::at(t0()),
        entropy.clone(),
    );
    core.request_otp(RequestOtpInput {
        email: "a@b.com".to_owned(),
    })
    .await
    .unwrap();
    let code = crate::helpers::last_code(&sent);

    entropy.set_failing(true);
    let result = core.verify_otp(verify(&code, DEVICE)).await;
    assert!(
        matches!(result, Err(OtpAuthError::Unavailable(_))),
        "expected Unavailable, got {result:?}"
    );
    assert_eq!(core.otp_snapshot()[0].state, OtpState::Active);
    assert!(core.otp_snapshot()[0].claimed_by.is_none());
    assert!(core.session_snapshot().is_empty());

    entropy.set_failing(false);
    let out = core.verify_otp(verify(&code, DEVICE)).await.unwrap();
    assert_eq!(out.address, "a@b.com");
    assert_eq!(core.otp_snapshot()[0].state, OtpState::Used);
}
