#![cfg(unix)]

use std::{
    io::{BufRead, BufReader, Lines},
    path::Path,
    process::{Child, ChildStdout, Command, Stdio},
    thread,
    time::{Duration, Instant},
};

use integration_tests::{EXIT_CODE_VAR, FAIL_START_VAR, PID_FILE_VAR};
use servitor::config::CONFIG_FILE_VAR;
use nix::{
    sys::signal::{Signal, kill},
    unistd::Pid,
};

const TIMEOUT: Duration = Duration::from_secs(10);

struct RunningService {
    child: Child,
    output: Lines<BufReader<ChildStdout>>,
}

impl RunningService {
    fn spawn(pid_file: &Path, envs: &[(&str, &str)]) -> Self {
        let mut child = Command::new(assert_cmd::cargo::cargo_bin("test_service"))
            .args(["--backend", "standard"])
            .env(PID_FILE_VAR, pid_file)
            .env(CONFIG_FILE_VAR, pid_file.with_extension("toml"))
            .envs(envs.iter().copied())
            .stdout(Stdio::piped())
            .spawn()
            .unwrap();
        let output = BufReader::new(child.stdout.take().unwrap()).lines();
        Self { child, output }
    }

    fn expect_line(&mut self, expected: &str) {
        let line = self.output.next().unwrap().unwrap();
        assert_eq!(expected, line);
    }

    fn signal(&self, signal: Signal) {
        kill(Pid::from_raw(self.child.id() as i32), signal).unwrap();
    }

    fn wait_until_suspended(&self) {
        #[cfg(target_os = "linux")]
        {
            let stat = format!("/proc/{}/stat", self.child.id());
            let start = Instant::now();
            // The state follows the parenthesized command name
            while !std::fs::read_to_string(&stat)
                .unwrap()
                .rsplit(')')
                .next()
                .is_some_and(|rest| rest.trim_start().starts_with('T'))
            {
                assert!(start.elapsed() < TIMEOUT, "service was not suspended");
                thread::sleep(Duration::from_millis(20));
            }
        }
        #[cfg(not(target_os = "linux"))]
        thread::sleep(Duration::from_millis(500));
    }

    fn wait(mut self) -> i32 {
        let start = Instant::now();
        loop {
            if let Some(status) = self.child.try_wait().unwrap() {
                return status.code().unwrap();
            }
            if start.elapsed() > TIMEOUT {
                self.child.kill().ok();
                panic!("service did not exit in time");
            }
            thread::sleep(Duration::from_millis(50));
        }
    }
}

#[test]
fn test_signals_drive_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("test_service.pid");
    let mut service = RunningService::spawn(&pid_file, &[(EXIT_CODE_VAR, "3")]);

    service.expect_line("start");
    assert!(pid_file.exists());

    service.signal(Signal::SIGHUP);
    service.expect_line("reload");
    service.signal(Signal::SIGUSR1);
    service.expect_line("usr1");
    service.signal(Signal::SIGTERM);
    service.expect_line("stop");

    assert_eq!(3, service.wait());
    assert!(!pid_file.exists());
}

#[test]
fn test_pause_suspends_process() {
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("test_service.pid");
    let mut service = RunningService::spawn(&pid_file, &[]);

    service.expect_line("start");
    service.signal(Signal::SIGTSTP);
    service.expect_line("pause");
    service.wait_until_suspended();
    service.signal(Signal::SIGCONT);
    service.expect_line("resume");
    service.signal(Signal::SIGINT);
    service.expect_line("stop");

    assert_eq!(0, service.wait());
}

#[test]
fn test_stop_command() {
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("test_service.pid");
    let mut service = RunningService::spawn(&pid_file, &[(EXIT_CODE_VAR, "5")]);
    service.expect_line("start");

    let mut controller = Command::new(assert_cmd::cargo::cargo_bin("test_service"))
        .args(["--backend", "standard", "stop"])
        .env(PID_FILE_VAR, &pid_file)
        .env(CONFIG_FILE_VAR, pid_file.with_extension("toml"))
        .spawn()
        .unwrap();

    service.expect_line("stop");
    assert_eq!(5, service.wait());
    assert!(controller.wait().unwrap().success());
}

#[test]
fn test_stop_command_without_instance() {
    let dir = tempfile::tempdir().unwrap();

    assert_cmd::Command::cargo_bin("test_service")
        .unwrap()
        .args(["--backend", "standard", "stop"])
        .env(PID_FILE_VAR, dir.path().join("test_service.pid"))
        .env(CONFIG_FILE_VAR, dir.path().join("test_service.toml"))
        .timeout(TIMEOUT)
        .assert()
        .failure();
}

#[test]
fn test_failed_start() {
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("test_service.pid");
    let service = RunningService::spawn(&pid_file, &[(FAIL_START_VAR, "1")]);

    assert_eq!(1, service.wait());
    assert!(!pid_file.exists());
}
