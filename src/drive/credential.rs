//! Session cookie with a rotating sub-token.
//!
//! The cookie is kept as an ordered list of `;`-separated segments. Named
//! fields can be updated in place; everything else (spacing, unnamed
//! fragments, sibling order) is preserved, so [`SessionCookie::to_string`]
//! reproduces the text it was parsed from, apart from the rotated value.

use std::fmt;

/// One `;`-separated piece of a cookie string.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// `<prefix><value>` where `prefix` is everything up to and including `=`.
    Field {
        prefix: String,
        name: String,
        value: String,
    },
    /// A fragment without `=`, kept verbatim.
    Raw(String),
}

impl Segment {
    fn parse(piece: &str) -> Self {
        match piece.split_once('=') {
            Some((name_part, value)) if !name_part.trim().is_empty() => Self::Field {
                prefix: format!("{name_part}="),
                name: name_part.trim().to_string(),
                value: value.to_string(),
            },
            _ => Self::Raw(piece.to_string()),
        }
    }
}

/// Structured session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    segments: Vec<Segment>,
}

impl SessionCookie {
    #[must_use]
    pub fn parse(cookie: &str) -> Self {
        let segments = if cookie.is_empty() {
            Vec::new()
        } else {
            cookie.split(';').map(Segment::parse).collect()
        };
        Self { segments }
    }

    /// Current value of the field `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.segments.iter().find_map(|s| match s {
            Segment::Field { name: n, value, .. } if n == name => Some(value.trim()),
            _ => None,
        })
    }

    /// Set field `name` to `value`, appending it if absent.
    ///
    /// Returns `true` if the cookie changed.
    pub fn set(&mut self, name: &str, value: &str) -> bool {
        for segment in &mut self.segments {
            if let Segment::Field { name: n, value: v, .. } = segment {
                if n == name {
                    if v.trim() == value {
                        return false;
                    }
                    *v = value.to_string();
                    return true;
                }
            }
        }
        let prefix = if self.segments.is_empty() {
            format!("{name}=")
        } else {
            format!(" {name}=")
        };
        self.segments.push(Segment::Field {
            prefix,
            name: name.to_string(),
            value: value.to_string(),
        });
        true
    }

    /// Apply the `name` field of `Set-Cookie` header values, if any carries it.
    ///
    /// Only the named field is touched. Returns `true` if it changed.
    pub fn rotate<S: AsRef<str>>(&mut self, name: &str, set_cookies: &[S]) -> bool {
        let Some(new_value) = set_cookies
            .iter()
            .filter_map(|header| directive_value(header.as_ref(), name))
            .next_back()
        else {
            return false;
        };
        self.set(name, new_value)
    }
}

/// Value of `name` in one `Set-Cookie` header (`name=value; Path=/; ...`).
fn directive_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|piece| piece.split_once('='))
        .find(|(n, _)| n.trim() == name)
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
}

impl fmt::Display for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            match segment {
                Segment::Field { prefix, value, .. } => write!(f, "{prefix}{value}")?,
                Segment::Raw(raw) => f.write_str(raw)?,
            }
        }
        Ok(())
    }
}
