pub mod call_in;
#[cfg(unix)]
pub mod standard;
#[cfg(target_os = "linux")]
pub mod systemd;
#[cfg(windows)]
pub mod windows;
