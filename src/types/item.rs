//! Stage-0 content items and id arithmetic.
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Fixed-width id suffix: `-YYYY-MM-DD-<ed>-iNNNN`.
const ID_SUFFIX_LEN: usize = 19;

/// One content item of the rebuilt corpus (article, ad, page, image).
///
/// Everything besides the fields below (regions, OCR coordinates, ...) is
/// ignored on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub tp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ft: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lg: Option<String>,
}

/// Collection (newspaper) acronym: everything before the fixed-width suffix.
pub fn collection_of(id: &str) -> Result<&str, Error> {
    id.len()
        .checked_sub(ID_SUFFIX_LEN)
        .and_then(|cut| id.get(..cut))
        .filter(|c| !c.is_empty())
        .ok_or_else(|| Error::Custom(format!("malformed content item id: {id}")))
}

/// Publication year, taken from the fixed-width suffix.
pub fn year_of(id: &str) -> Result<&str, Error> {
    let n = id.len();
    n.checked_sub(18)
        .zip(n.checked_sub(14))
        .and_then(|(start, end)| id.get(start..end))
        .ok_or_else(|| Error::Custom(format!("malformed content item id: {id}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_arithmetic() {
        let id = "luxzeit1858-1859-01-01-a-i0001";
        assert_eq!(collection_of(id).unwrap(), "luxzeit1858");
        assert_eq!(year_of(id).unwrap(), "1859");
    }

    #[test]
    fn test_short_id_rejected() {
        assert!(collection_of("i0001").is_err());
        assert!(year_of("i0001").is_err());
    }

    #[test]
    fn test_ignores_extra_fields() {
        let line = r#"{"id":"gazette-1900-01-02-a-i0017","tp":"ar","ft":"text","lg":null,"pp":[1,2]}"#;
        let item: ContentItem = serde_json::from_str(line).unwrap();
        assert_eq!(item.tp, "ar");
        assert_eq!(item.lg, None);
    }
}
