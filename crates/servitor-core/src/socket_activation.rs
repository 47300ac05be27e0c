use std::collections::HashMap;

/// First descriptor number handed over by the service manager.
pub const LISTEN_FDS_START: i32 = 3;

/// Pre-opened listening descriptors grouped by socket name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SocketActivationTable {
    sockets: HashMap<String, Vec<i32>>,
    first: Option<i32>,
}

impl SocketActivationTable {
    /// Builds the table from descriptor names in the order they were passed, numbering the
    /// descriptors from [`LISTEN_FDS_START`]. Unnamed sockets get an empty name.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self::from_descriptors(names.into_iter().zip(LISTEN_FDS_START..))
    }

    pub fn from_descriptors<I, S>(descriptors: I) -> Self
    where
        I: IntoIterator<Item = (Option<S>, i32)>,
        S: Into<String>,
    {
        let mut table = Self::default();
        for (name, fd) in descriptors {
            table.first.get_or_insert(fd);
            table
                .sockets
                .entry(name.map(Into::into).unwrap_or_default())
                .or_default()
                .push(fd);
        }
        table
    }

    /// Descriptors registered under `name`. Without a name, the first descriptor if any.
    pub fn lookup(&self, name: Option<&str>) -> Vec<i32> {
        match name {
            None => self.first.into_iter().collect(),
            Some(name) => self.sockets.get(name).cloned().unwrap_or_default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_none()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sockets.keys().map(String::as_str)
    }
}

#[cfg(test)]
#[path = "./socket_activation_test.rs"]
mod socket_activation_test;
