use std::str::FromStr;

use thiserror::Error;

const DBUS_SUFFIX: &str = "systemd-service";

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Label {
    pub qualifier: String,
    pub organization: String,
    pub application: String,
}

impl Label {
    pub fn new(
        qualifier: impl Into<String>,
        organization: impl Into<String>,
        application: impl Into<String>,
    ) -> Self {
        Self {
            qualifier: qualifier.into(),
            organization: organization.into(),
            application: application.into(),
        }
    }

    /// Dotted name made from the non-empty identifier parts.
    pub fn qualified_name(&self) -> String {
        [&self.qualifier, &self.organization, &self.application]
            .into_iter()
            .filter(|part| !part.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Well-known bus name a running instance registers its control channel under.
    pub fn dbus_name(&self) -> String {
        format!("{}.{DBUS_SUFFIX}", self.qualified_name())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error(
        "Identifier {0} was not in the correct format. Identifiers should be formatted as '{{qualifier}}.{{organization}}.{{application}}' or '{{application}}'."
    )]
    InvalidIdentifier(String),
}

impl FromStr for Label {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<_> = s.split('.').collect();
        match parts.as_slice() {
            [application] if !application.is_empty() => Ok(Label {
                application: application.to_string(),
                ..Default::default()
            }),
            [qualifier, organization, application] if !application.is_empty() => {
                Ok(Label::new(*qualifier, *organization, *application))
            }
            _ => Err(ParseError::InvalidIdentifier(s.to_owned())),
        }
    }
}

#[cfg(test)]
#[path = "./label_test.rs"]
mod label_test;
