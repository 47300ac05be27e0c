use tracing::Level;

use super::LogLevel;

#[test]
fn test_parse() {
    assert_eq!(LogLevel(Level::DEBUG), "debug".parse().unwrap());
    assert_eq!(LogLevel(Level::WARN), " WARN ".parse().unwrap());
    assert!("loud".parse::<LogLevel>().is_err());
    assert_eq!("trace", LogLevel(Level::TRACE).to_string());
}
