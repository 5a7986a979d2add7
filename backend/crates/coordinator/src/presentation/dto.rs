//! API DTOs (Data Transfer Objects)

use crate::application::Intent;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Query for GET /lfcs/{fc}
#[derive(Debug, Clone, Deserialize)]
pub struct LfcsQuery {
    #[serde(default)]
    pub lfcs: Option<String>,
}

/// Query for GET /cancel/{id}
#[derive(Debug, Clone, Deserialize)]
pub struct CancelQuery {
    #[serde(default)]
    pub kill: Option<String>,
}

/// Control message sent by a device over the push channel
///
/// Scalar fields are accepted as strings or numbers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundMessage {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id0: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub request: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub part1: Option<String>,
    #[serde(default, rename = "friendCode", deserialize_with = "lenient_string")]
    pub friend_code: Option<String>,
    #[serde(default, rename = "defoID0", deserialize_with = "lenient_string")]
    pub defo_id0: Option<String>,
}

impl InboundMessage {
    /// The id0 and the single intent of this message
    ///
    /// `request` wins over `part1`, which wins over `friendCode`. A message
    /// without an id0 carries nothing.
    pub fn into_intent(self) -> Option<(String, Intent)> {
        let id0 = self.id0?;
        let defo_id0 = self.defo_id0.as_deref() == Some("yes");

        let intent = match (self.request.as_deref(), self.part1, self.friend_code) {
            (Some("bruteforce"), _, _) => Intent::Bruteforce,
            (Some("cancel"), _, _) => Intent::Cancel,
            (_, Some(part1), _) => Intent::Part1 { part1, defo_id0 },
            (_, None, Some(friend_code)) => Intent::FriendCode {
                friend_code,
                defo_id0,
            },
            (_, None, None) => Intent::Query,
        };

        Some((id0, intent))
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent(json: &str) -> Option<(String, Intent)> {
        serde_json::from_str::<InboundMessage>(json)
            .unwrap()
            .into_intent()
    }

    #[test]
    fn test_request_wins_over_payloads() {
        let (_, got) = intent(r#"{"id0":"x","request":"bruteforce","part1":"AAAA"}"#).unwrap();
        assert_eq!(got, Intent::Bruteforce);
    }

    #[test]
    fn test_unknown_request_falls_through() {
        let (_, got) = intent(r#"{"id0":"x","request":"dance","friendCode":"1"}"#).unwrap();
        assert_eq!(
            got,
            Intent::FriendCode {
                friend_code: "1".into(),
                defo_id0: false
            }
        );
    }

    #[test]
    fn test_numeric_friend_code_and_defo_flag() {
        let (id0, got) = intent(r#"{"id0":"x","friendCode":309237645312,"defoID0":"yes"}"#).unwrap();
        assert_eq!(id0, "x");
        assert_eq!(
            got,
            Intent::FriendCode {
                friend_code: "309237645312".into(),
                defo_id0: true
            }
        );
    }

    #[test]
    fn test_missing_id0_and_plain_query() {
        assert!(intent(r#"{"part1":"AAAA"}"#).is_none());
        assert!(intent(r#"{"id0":null}"#).is_none());
        assert_eq!(intent(r#"{"id0":"x"}"#).unwrap().1, Intent::Query);
    }
}
