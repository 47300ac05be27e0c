pub mod call_in;
pub mod standard;
#[cfg(target_os = "linux")]
pub mod systemd;
#[cfg(windows)]
pub mod windows;

/// Stops the process after the service paused. `SIGCONT` resumes it.
#[cfg(unix)]
pub(crate) fn suspend_process() {
    use tap::TapFallible;
    use tracing::{error, info};

    info!("Service paused, stopping the process");
    signal_hook::low_level::raise(signal_hook::consts::signal::SIGSTOP)
        .tap_err(|e| error!("Error stopping the process: {e:?}"))
        .ok();
}
