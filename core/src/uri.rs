//! Minimal URI value.
//!
//! Splits a reference into scheme, authority, path, query and fragment using
//! the generic RFC 3986 component boundaries. No percent-decoding, no
//! normalization beyond lowercasing scheme and host, and no validation:
//! anything that does not fit a component ends up in the path.

use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Uri {
    scheme: String,
    user_info: String,
    host: String,
    port: Option<u16>,
    path: String,
    query: String,
    fragment: String,
}

impl Uri {
    pub fn parse(raw: &str) -> Self {
        let mut uri = Uri::default();

        let rest = match raw.split_once('#') {
            Some((rest, fragment)) => {
                uri.fragment = fragment.to_string();
                rest
            }
            None => raw,
        };
        let rest = match rest.split_once('?') {
            Some((rest, query)) => {
                uri.query = query.to_string();
                rest
            }
            None => rest,
        };

        let rest = match rest.find(':') {
            Some(i) if i > 0 && !rest[..i].contains('/') => {
                uri.scheme = rest[..i].to_ascii_lowercase();
                &rest[i + 1..]
            }
            _ => rest,
        };

        let path = match rest.strip_prefix("//") {
            Some(after) => {
                let end = after.find('/').unwrap_or(after.len());
                uri.set_authority(&after[..end]);
                &after[end..]
            }
            None => rest,
        };
        uri.path = path.to_string();
        uri
    }

    fn set_authority(&mut self, authority: &str) {
        let host_port = match authority.rsplit_once('@') {
            Some((user_info, host_port)) => {
                self.user_info = user_info.to_string();
                host_port
            }
            None => authority,
        };

        // The port follows the last colon, unless that colon is inside an
        // IPv6 literal.
        let (host, port) = match host_port.rfind(':') {
            Some(i) if !host_port[i..].contains(']') => {
                (&host_port[..i], host_port[i + 1..].parse::<u16>().ok())
            }
            _ => (host_port, None),
        };
        self.host = host.to_ascii_lowercase();
        self.port = port;
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn user_info(&self) -> &str {
        &self.user_info
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// `[user-info@]host[:port]`, or empty without a host.
    pub fn authority(&self) -> String {
        if self.host.is_empty() {
            return String::new();
        }
        let mut authority = String::new();
        if !self.user_info.is_empty() {
            authority.push_str(&self.user_info);
            authority.push('@');
        }
        authority.push_str(&self.host_with_port());
        authority
    }

    /// The value a `host` header takes for this URI.
    pub fn host_with_port(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{port}", self.host),
            None => self.host.clone(),
        }
    }
}

impl From<&str> for Uri {
    fn from(raw: &str) -> Self {
        Uri::parse(raw)
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.scheme.is_empty() {
            write!(f, "{}:", self.scheme)?;
        }
        if !self.host.is_empty() {
            write!(f, "//{}", self.authority())?;
        }
        f.write_str(&self.path)?;
        if !self.query.is_empty() {
            write!(f, "?{}", self.query)?;
        }
        if !self.fragment.is_empty() {
            write!(f, "#{}", self.fragment)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_uri() {
        let uri = Uri::parse("HTTPS://user:pw@Example.COM:8443/a/b?x=1#top");
        assert_eq!(uri.scheme(), "https");
        assert_eq!(uri.user_info(), "user:pw");
        assert_eq!(uri.host(), "example.com");
        assert_eq!(uri.port(), Some(8443));
        assert_eq!(uri.path(), "/a/b");
        assert_eq!(uri.query(), "x=1");
        assert_eq!(uri.fragment(), "top");
        assert_eq!(uri.to_string(), "https://user:pw@example.com:8443/a/b?x=1#top");
    }

    #[test]
    fn scheme_relative() {
        let uri = Uri::parse("//some-host.here/some/uri/here");
        assert_eq!(uri.scheme(), "");
        assert_eq!(uri.host(), "some-host.here");
        assert_eq!(uri.path(), "/some/uri/here");
        assert_eq!(uri.host_with_port(), "some-host.here");
    }

    #[test]
    fn relative_path_has_no_authority() {
        let uri = Uri::parse("some/uri/here");
        assert_eq!(uri.host(), "");
        assert_eq!(uri.authority(), "");
        assert_eq!(uri.path(), "some/uri/here");
        assert_eq!(uri.to_string(), "some/uri/here");
    }

    #[test]
    fn ipv6_host() {
        let uri = Uri::parse("http://[::1]:8080/");
        assert_eq!(uri.host(), "[::1]");
        assert_eq!(uri.port(), Some(8080));

        let bare = Uri::parse("http://[::1]/");
        assert_eq!(bare.host(), "[::1]");
        assert_eq!(bare.port(), None);
    }

    #[test]
    fn colon_in_path_is_not_a_scheme() {
        let uri = Uri::parse("/a:b");
        assert_eq!(uri.scheme(), "");
        assert_eq!(uri.path(), "/a:b");
    }
}
