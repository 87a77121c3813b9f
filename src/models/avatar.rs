//! Avatar state as an explicit sum type.
//!
//! The database stores three interdependent columns (`avatar_type`,
//! `avatar_url`, `avatar_filename`). Exactly one payload column is meaningful
//! at a time; modeling the state as an enum makes inconsistent combinations
//! unrepresentable in the rest of the code.

/// Route under which locally stored avatar files are served.
pub const AVATAR_ROUTE: &str = "/static/uploads/avatars";

/// Prefix that marks an embedded base64 image rather than an external URL.
pub const DATA_URI_PREFIX: &str = "data:image/";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Avatar {
    /// No avatar set. Stored as discriminator `url` with both payloads null.
    #[default]
    None,
    /// External URL, stored verbatim.
    Url(String),
    /// Base64 data URI, stored verbatim.
    Base64(String),
    /// File inside the uploads directory.
    Local(String),
}

impl Avatar {
    /// Rebuild the union from the three database columns.
    ///
    /// Rows written by older tooling occasionally disagree with their
    /// discriminator; the populated payload wins so a stale tag never hides
    /// an avatar that exists.
    #[must_use]
    pub fn from_columns(
        avatar_type: &str,
        avatar_url: Option<String>,
        avatar_filename: Option<String>,
    ) -> Self {
        match avatar_type {
            "local" => match avatar_filename {
                Some(filename) if !filename.is_empty() => Self::Local(filename),
                _ => Self::None,
            },
            "base64" => match avatar_url {
                Some(url) if !url.is_empty() => Self::Base64(url),
                _ => Self::None,
            },
            _ => match avatar_url {
                Some(url) if url.starts_with(DATA_URI_PREFIX) => Self::Base64(url),
                Some(url) if !url.is_empty() => Self::Url(url),
                _ => Self::None,
            },
        }
    }

    /// Classify a client-supplied string: data URIs become `Base64`,
    /// everything else is treated as an external URL.
    #[must_use]
    pub fn from_input(input: &str) -> Self {
        if input.is_empty() {
            Self::None
        } else if input.starts_with(DATA_URI_PREFIX) {
            Self::Base64(input.to_string())
        } else {
            Self::Url(input.to_string())
        }
    }

    /// Decompose into `(avatar_type, avatar_url, avatar_filename)` columns.
    /// The empty state maps to discriminator `url` with null payloads.
    #[must_use]
    pub fn to_columns(&self) -> (&'static str, Option<String>, Option<String>) {
        match self {
            Self::None => ("url", None, None),
            Self::Url(url) => ("url", Some(url.clone()), None),
            Self::Base64(data) => ("base64", Some(data.clone()), None),
            Self::Local(filename) => ("local", None, Some(filename.clone())),
        }
    }

    /// Externally visible URL for display. Pure; no filesystem access.
    ///
    /// Local files resolve against the serving host when one is supplied,
    /// otherwise to a root-relative path. The host form is scheme-relative
    /// so the browser reuses whatever scheme the page was served over. URL
    /// and base64 payloads are returned verbatim. No avatar yields `None`.
    #[must_use]
    pub fn display_url(&self, request_host: Option<&str>) -> Option<String> {
        match self {
            Self::None => None,
            Self::Url(url) | Self::Base64(url) => Some(url.clone()),
            Self::Local(filename) => Some(request_host.map_or_else(
                || format!("{AVATAR_ROUTE}/{filename}"),
                |host| format!("//{host}{AVATAR_ROUTE}/{filename}"),
            )),
        }
    }

    /// Filename of the backing file, if the avatar is stored locally.
    #[must_use]
    pub fn local_filename(&self) -> Option<&str> {
        match self {
            Self::Local(filename) => Some(filename),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_round_trip() {
        for avatar in [
            Avatar::None,
            Avatar::Url("https://x/y.png".into()),
            Avatar::Base64("data:image/png;base64,AAAA".into()),
            Avatar::Local("avatar_1_20250101_120000_abcd1234.jpg".into()),
        ] {
            let (ty, url, filename) = avatar.to_columns();
            assert_eq!(Avatar::from_columns(ty, url, filename), avatar);
        }
    }

    #[test]
    fn at_most_one_payload_column() {
        for avatar in [
            Avatar::None,
            Avatar::Url("https://x/y.png".into()),
            Avatar::Base64("data:image/png;base64,AAAA".into()),
            Avatar::Local("a.jpg".into()),
        ] {
            let (_, url, filename) = avatar.to_columns();
            assert!(url.is_none() || filename.is_none());
        }
    }

    #[test]
    fn input_classification() {
        assert_eq!(
            Avatar::from_input("https://x/y.png"),
            Avatar::Url("https://x/y.png".into())
        );
        assert!(matches!(
            Avatar::from_input("data:image/png;base64,AAAA"),
            Avatar::Base64(_)
        ));
        assert_eq!(Avatar::from_input(""), Avatar::None);
    }

    #[test]
    fn display_url_variants() {
        assert_eq!(Avatar::None.display_url(None), None);
        assert_eq!(
            Avatar::Url("https://x/y.png".into()).display_url(Some("example.com")),
            Some("https://x/y.png".into())
        );
        assert_eq!(
            Avatar::Local("a.jpg".into()).display_url(None),
            Some("/static/uploads/avatars/a.jpg".into())
        );
        assert_eq!(
            Avatar::Local("a.jpg".into()).display_url(Some("example.com")),
            Some("//example.com/static/uploads/avatars/a.jpg".into())
        );
    }

    #[test]
    fn stale_discriminator_prefers_populated_payload() {
        let avatar = Avatar::from_columns("url", Some("data:image/png;base64,AA".into()), None);
        assert!(matches!(avatar, Avatar::Base64(_)));
        assert_eq!(Avatar::from_columns("local", None, None), Avatar::None);
    }
}
