use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Canonical provider identifiers used in logs and envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Yahoo,
    Static,
    /// Synthetic offline fundamentals; never real market data.
    Mock,
}

impl ProviderId {
    pub const ALL: [Self; 3] = [Self::Yahoo, Self::Static, Self::Mock];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yahoo => "yahoo",
            Self::Static => "static",
            Self::Mock => "mock",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "yahoo" => Ok(Self::Yahoo),
            "static" => Ok(Self::Static),
            "mock" => Ok(Self::Mock),
            other => Err(ValidationError::InvalidSource {
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_providers_case_insensitively() {
        assert_eq!(" Yahoo ".parse::<ProviderId>(), Ok(ProviderId::Yahoo));
        assert_eq!("STATIC".parse::<ProviderId>(), Ok(ProviderId::Static));
        assert_eq!("mock".parse::<ProviderId>(), Ok(ProviderId::Mock));
        assert_eq!(ProviderId::Mock.to_string(), "mock");
        assert!(matches!(
            "polygon".parse::<ProviderId>(),
            Err(ValidationError::InvalidSource { .. })
        ));
    }
}
