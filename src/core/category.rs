//! Subscription channels a viewer can bind to

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::RelayError;

/// The closed set of overlay channels. New channels are added here and
/// nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Chat,
    Notification,
    EmoteWall,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Chat, Category::Notification, Category::EmoteWall];

    /// Integer discriminator carried by the generic wire form
    pub fn code(self) -> u8 {
        match self {
            Category::Chat => 0,
            Category::Notification => 1,
            Category::EmoteWall => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            Category::Chat => "chat",
            Category::Notification => "notification",
            Category::EmoteWall => "emotewall",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Case-insensitive match on the category name
impl FromStr for Category {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| RelayError::InvalidCategory(s.to_string()))
    }
}

// On the wire the category travels as its integer code
impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u8::deserialize(deserializer)?;
        Category::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown category code {}", code)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("chat".parse::<Category>().unwrap(), Category::Chat);
        assert_eq!("CHAT".parse::<Category>().unwrap(), Category::Chat);
        assert_eq!("Notification".parse::<Category>().unwrap(), Category::Notification);
        assert_eq!("emoteWall".parse::<Category>().unwrap(), Category::EmoteWall);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!("bogus".parse::<Category>().is_err());
        assert!("".parse::<Category>().is_err());
        assert!("0".parse::<Category>().is_err());
    }

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(Category::Chat.code(), 0);
        assert_eq!(Category::Notification.code(), 1);
        assert_eq!(Category::EmoteWall.code(), 2);
        for category in Category::ALL {
            assert_eq!(Category::from_code(category.code()), Some(category));
        }
        assert_eq!(Category::from_code(7), None);
    }

    #[test]
    fn test_serde_uses_code() {
        assert_eq!(serde_json::to_string(&Category::Notification).unwrap(), "1");
        assert_eq!(serde_json::from_str::<Category>("2").unwrap(), Category::EmoteWall);
        assert!(serde_json::from_str::<Category>("9").is_err());
    }
}
