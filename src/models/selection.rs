use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What a configuration blocks: individual apps, whole categories and web domains.
///
/// Tokens are opaque to the engine; only the blocking provider interprets them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSelection {
    #[serde(default)]
    pub application_tokens: BTreeSet<String>,
    #[serde(default)]
    pub category_tokens: BTreeSet<String>,
    #[serde(default)]
    pub web_domain_tokens: BTreeSet<String>,
}

impl AppSelection {
    pub fn total_item_count(&self) -> usize {
        self.application_tokens.len() + self.category_tokens.len() + self.web_domain_tokens.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_item_count() {
        let selection = AppSelection {
            application_tokens: ["a".to_string(), "b".to_string()].into(),
            category_tokens: ["social".to_string()].into(),
            web_domain_tokens: BTreeSet::new(),
        };
        assert_eq!(selection.total_item_count(), 3);
        assert_eq!(AppSelection::default().total_item_count(), 0);
    }

    #[test]
    fn test_missing_fields_decode_as_empty() {
        let selection: AppSelection =
            serde_json::from_str(r#"{"applicationTokens": ["x"]}"#).unwrap();
        assert_eq!(selection.total_item_count(), 1);
    }
}
