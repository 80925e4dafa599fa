use velarium::error::VelariumError;

#[test]
fn error_constructors_group_1() {
    assert!(matches!(
        VelariumError::config("x"),
        VelariumError::Config { .. }
    ));
    assert!(matches!(
        VelariumError::auth("x"),
        VelariumError::Auth { .. }
    ));
    assert!(matches!(
        VelariumError::store("x"),
        VelariumError::Store { .. }
    ));
    assert!(matches!(
        VelariumError::subscription("x"),
        VelariumError::Subscription { .. }
    ));
}

#[test]
fn error_constructors_group_2() {
    let ser = VelariumError::Serialization {
        message: "s".into(),
    };
    assert!(matches!(ser, VelariumError::Serialization { .. }));
    assert!(matches!(VelariumError::io("x"), VelariumError::Io { .. }));
    assert!(matches!(
        VelariumError::network("x"),
        VelariumError::Network { .. }
    ));
    assert!(matches!(VelariumError::web("x"), VelariumError::Web { .. }));
}

#[test]
fn error_constructors_group_3() {
    assert!(matches!(
        VelariumError::validation("f", "m"),
        VelariumError::Validation { .. }
    ));
    assert!(matches!(
        VelariumError::generic("x"),
        VelariumError::Generic { .. }
    ));
}

#[test]
fn error_display_formats() {
    assert_eq!(
        VelariumError::auth("no session").to_string(),
        "Authentication error: no session"
    );
    assert_eq!(
        VelariumError::store("put rejected").to_string(),
        "Store error: put rejected"
    );
    assert_eq!(
        VelariumError::subscription("stream closed").to_string(),
        "Subscription error: stream closed"
    );
}

#[test]
fn error_from_conversions() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    assert!(matches!(
        VelariumError::from(io),
        VelariumError::Io { .. }
    ));

    let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    assert!(matches!(
        VelariumError::from(json),
        VelariumError::Serialization { .. }
    ));
}
