//! Unit tests for `AppError` display format.

use registrar_notify::AppError;

#[test]
fn display_uses_kind_prefix() {
    let cases = [
        (AppError::Config("x".into()), "config: x"),
        (AppError::Template("x".into()), "template: x"),
        (AppError::Gateway("x".into()), "gateway: x"),
        (AppError::Validation("x".into()), "validation: x"),
        (AppError::Parse("x".into()), "parse: x"),
        (AppError::Io("x".into()), "io: x"),
    ];
    for (err, expected) in cases {
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn toml_errors_become_config_errors() {
    let err: AppError = toml::from_str::<toml::Value>("= broken")
        .expect_err("invalid toml")
        .into();
    assert!(err.to_string().starts_with("config: invalid config:"), "{err}");
}

#[test]
fn json_errors_become_parse_errors() {
    let err: AppError = serde_json::from_str::<serde_json::Value>("{")
        .expect_err("invalid json")
        .into();
    assert!(matches!(err, AppError::Parse(_)));
}

#[test]
fn io_errors_become_io_errors() {
    let err: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert_eq!(err.to_string(), "io: gone");
}

#[test]
fn error_implements_std_error_trait() {
    fn assert_error<E: std::error::Error>(_: &E) {}
    let err = AppError::Gateway("timeout".into());
    assert_error(&err);
    assert!(format!("{err:?}").contains("Gateway"));
}

#[test]
fn rejection_displays_reason_and_exposes_payload() {
    let payload = serde_json::json!({ "status": 400, "message": "Invalid device" });
    let err = AppError::GatewayRejected {
        reason: "status 400: Invalid device".into(),
        response: payload.clone(),
    };
    assert_eq!(err.to_string(), "gateway: status 400: Invalid device");
    assert_eq!(err.gateway_response(), Some(&payload));
    assert!(AppError::Gateway("down".into()).gateway_response().is_none());
}
