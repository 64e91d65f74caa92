//! Branded identifier newtypes.
//!
//! All identifiers on the wire are UUID strings. Newtypes keep a
//! connection id from being passed where a project id is expected, and
//! give each id kind a single place for generation and parsing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::CoreError;

macro_rules! branded_id {
    ($(#[doc = $doc:literal])* $name:ident, $kind:literal) => {
        $(#[doc = $doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random id.
            #[must_use]
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            /// The underlying UUID.
            #[must_use]
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self).map_err(|_| CoreError::InvalidId {
                    kind: $kind,
                    value: s.to_owned(),
                })
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

branded_id! {
    /// Identifies one live WebSocket connection. Generated at accept time,
    /// never reused while the connection is registered.
    ConnectionId, "connection"
}

branded_id! {
    /// Identifies a project for scoped subscriptions. Parsing a client- or
    /// caller-supplied string through [`FromStr`] is the validity check for
    /// project-id tokens.
    ProjectId, "project"
}

branded_id! {
    /// Identifies a query whose processing progress is being reported.
    QueryId, "query"
}

branded_id! {
    /// Identifies an external integration (GitHub, Slack, Jira, ...).
    IntegrationId, "integration"
}
