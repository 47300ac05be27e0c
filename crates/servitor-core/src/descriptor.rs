use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

const SYSTEMD_UNIT_SUFFIX: &str = ".service";

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum BackendKind {
    Standard,
    Systemd,
    Windows,
    CallIn,
}

impl BackendKind {
    /// Backend a service started without an explicit choice runs under.
    pub fn detect() -> Self {
        #[cfg(windows)]
        return BackendKind::Windows;

        #[cfg(target_os = "linux")]
        if std::env::var_os("NOTIFY_SOCKET").is_some()
            || std::env::var_os("INVOCATION_ID").is_some()
        {
            return BackendKind::Systemd;
        }

        #[cfg(not(windows))]
        BackendKind::Standard
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, Serialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum BusScope {
    User,
    System,
}

impl BusScope {
    /// The system bus for root, the session bus for everyone else.
    pub fn detect() -> Self {
        #[cfg(unix)]
        if nix::unistd::geteuid().is_root() {
            return BusScope::System;
        }
        #[cfg(unix)]
        return BusScope::User;

        #[cfg(not(unix))]
        BusScope::System
    }
}

impl<'de> Deserialize<'de> for BusScope {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let val = String::deserialize(deserializer)?;
        BusScope::from_str(&val).map_err(serde::de::Error::custom)
    }
}

/// Identifies a service for a controller. Every platform address is derived from it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ServiceDescriptor {
    service_id: String,
    backend: BackendKind,
}

impl ServiceDescriptor {
    pub fn new(service_id: impl Into<String>, backend: BackendKind) -> Self {
        Self {
            service_id: service_id.into(),
            backend,
        }
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    pub fn service_name(&self) -> &str {
        match self.backend {
            BackendKind::Systemd => self
                .service_id
                .strip_suffix(SYSTEMD_UNIT_SUFFIX)
                .unwrap_or(&self.service_id),
            BackendKind::CallIn => self
                .service_id
                .rsplit('.')
                .next()
                .unwrap_or(&self.service_id),
            BackendKind::Standard | BackendKind::Windows => &self.service_id,
        }
    }

    pub fn unit_name(&self) -> String {
        if self.service_id.ends_with(SYSTEMD_UNIT_SUFFIX) {
            self.service_id.clone()
        } else {
            format!("{}{SYSTEMD_UNIT_SUFFIX}", self.service_id)
        }
    }

    /// Slash separated class path of a call-in component.
    pub fn class_path(&self) -> String {
        self.service_id.replace('.', "/")
    }
}

#[cfg(test)]
#[path = "./descriptor_test.rs"]
mod descriptor_test;
