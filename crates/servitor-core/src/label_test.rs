use crate::{Label, ParseError};

#[test]
fn test_parse_full_identifier() {
    let label: Label = "com.example.worker".parse().unwrap();
    assert_eq!("com", label.qualifier);
    assert_eq!("example", label.organization);
    assert_eq!("worker", label.application);
    assert_eq!("com.example.worker", label.qualified_name());
}

#[test]
fn test_parse_application_only() {
    let label: Label = "worker".parse().unwrap();
    assert_eq!("worker", label.qualified_name());
}

#[test]
fn test_parse_invalid() {
    assert_eq!(
        Err(ParseError::InvalidIdentifier("a.b".to_owned())),
        "a.b".parse::<Label>()
    );
    assert!("".parse::<Label>().is_err());
}

#[test]
fn test_dbus_name() {
    let label: Label = "de.skycoder42.echoservice".parse().unwrap();
    assert_eq!(
        "de.skycoder42.echoservice.systemd-service",
        label.dbus_name()
    );

    let label: Label = "echoservice".parse().unwrap();
    assert_eq!("echoservice.systemd-service", label.dbus_name());
}
