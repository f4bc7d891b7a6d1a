//! Emoji identity used as the binding lookup key.

use serde::{Deserialize, Serialize};

/// Emoji identity: the custom emoji's numeric id when it has one, otherwise
/// its literal unicode text.
///
/// This is the only legal key into role binding lookup.
///
/// # Examples
///
/// ```
/// use rolebot_core::EmojiKey;
///
/// let custom = EmojiKey::from_parts(Some(661410527309856827), Some("wave"));
/// assert_eq!(custom, Some(EmojiKey::Custom(661410527309856827)));
///
/// let unicode = EmojiKey::from_parts(None, Some("🎮"));
/// assert_eq!(unicode.map(|e| e.to_string()), Some("🎮".to_string()));
/// ```
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, derive_more::Display,
)]
pub enum EmojiKey {
    /// Guild custom emoji, keyed by id
    #[display("{}", _0)]
    Custom(u64),
    /// Standard unicode emoji, keyed by its text
    #[display("{}", _0)]
    Unicode(String),
}

impl EmojiKey {
    /// Derive the key from a gateway emoji payload.
    ///
    /// Returns `None` when neither an id nor a non-empty name is present.
    pub fn from_parts(id: Option<u64>, name: Option<&str>) -> Option<Self> {
        match (id, name) {
            (Some(id), _) => Some(Self::Custom(id)),
            (None, Some(name)) if !name.is_empty() => Some(Self::Unicode(name.to_string())),
            _ => None,
        }
    }

    /// Decode the stored text form produced by `Display`.
    ///
    /// All-digit strings are custom emoji ids.
    pub fn from_stored(value: &str) -> Self {
        if !value.is_empty()
            && value.bytes().all(|b| b.is_ascii_digit())
            && let Ok(id) = value.parse::<u64>()
        {
            return Self::Custom(id);
        }
        Self::Unicode(value.to_string())
    }

    /// Parse operator input: `<:name:id>`, `<a:name:id>`, a bare id, or a
    /// unicode emoji.
    pub fn parse_mention(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        if let Some(inner) = input.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
            let id = inner.rsplit(':').next()?;
            return id.parse::<u64>().ok().map(Self::Custom);
        }
        Some(Self::from_stored(input))
    }

    /// Whether this is a guild custom emoji.
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_wins_over_name() {
        assert_eq!(
            EmojiKey::from_parts(Some(5), Some("blob")),
            Some(EmojiKey::Custom(5))
        );
    }

    #[test]
    fn test_missing_parts() {
        assert_eq!(EmojiKey::from_parts(None, None), None);
        assert_eq!(EmojiKey::from_parts(None, Some("")), None);
    }

    #[test]
    fn test_stored_form() {
        assert_eq!(EmojiKey::from_stored("123"), EmojiKey::Custom(123));
        assert_eq!(
            EmojiKey::from_stored("1️⃣"),
            EmojiKey::Unicode("1️⃣".to_string())
        );
        let key = EmojiKey::Custom(987);
        assert_eq!(EmojiKey::from_stored(&key.to_string()), key);
    }

    #[test]
    fn test_parse_mention() {
        assert_eq!(
            EmojiKey::parse_mention("<:wave:42>"),
            Some(EmojiKey::Custom(42))
        );
        assert_eq!(
            EmojiKey::parse_mention("<a:party:77>"),
            Some(EmojiKey::Custom(77))
        );
        assert_eq!(EmojiKey::parse_mention("<:broken:x>"), None);
        assert_eq!(
            EmojiKey::parse_mention(" 🐍 "),
            Some(EmojiKey::Unicode("🐍".to_string()))
        );
        assert_eq!(EmojiKey::parse_mention("  "), None);
    }
}
