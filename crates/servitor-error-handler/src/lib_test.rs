use std::io;

use servitor_core::{CommandError, Label};

use crate::{ErrorHandler, ErrorSink};

#[test]
fn test_sink_keeps_source() {
    let sink = ErrorSink::from(CommandError::UnknownCommand("flush".to_owned()));
    assert_eq!(
        "No handler is registered for command flush",
        sink.report().to_string()
    );

    let sink = ErrorSink::from_error(Box::new(io::Error::other("disk on fire")));
    assert!(sink.report().to_string().contains("disk on fire"));
}

#[test]
fn test_install_once() {
    let handler = ErrorHandler::new(Label::new("io", "servitor", "error-test"))
        .with_write_to_stderr(true)
        .with_log(true);
    handler.clone().install().unwrap();

    let second = handler.clone().install().unwrap_err();
    assert_eq!(
        "Unable to install error handler: a handler is already installed",
        second.to_string()
    );
    assert!(handler.install().is_err());
}
