//! Author/committer/tagger identity lines.

use std::fmt;

use lode_types::ObjectKind;

use crate::error::{RepoError, RepoResult};

/// A person plus a moment: `name <email> epoch ±zzzz`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub email: String,
    /// Seconds since the epoch.
    pub when: i64,
    /// Timezone offset in minutes east of UTC.
    pub offset_minutes: i32,
}

impl Signature {
    /// Create a signature at an explicit moment.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        when: i64,
        offset_minutes: i32,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            when,
            offset_minutes,
        }
    }

    /// Parse the value part of an identity header line.
    pub fn parse(kind: ObjectKind, value: &str) -> RepoResult<Self> {
        let parse_err = |reason: &str| RepoError::Parse {
            kind,
            reason: format!("bad signature: {reason}"),
        };

        let open = value.find('<').ok_or_else(|| parse_err("missing <"))?;
        let close = value[open..]
            .find('>')
            .map(|i| open + i)
            .ok_or_else(|| parse_err("missing >"))?;

        let name = value[..open].trim_end().to_string();
        let email = value[open + 1..close].to_string();

        let rest = value[close + 1..].trim();
        let (when, zone) = rest
            .split_once(' ')
            .ok_or_else(|| parse_err("missing timestamp or timezone"))?;
        let when: i64 = when.parse().map_err(|_| parse_err("bad timestamp"))?;

        if zone.len() != 5 || !zone.is_ascii() {
            return Err(parse_err("bad timezone"));
        }
        let sign = match &zone[..1] {
            "+" => 1,
            "-" => -1,
            _ => return Err(parse_err("bad timezone sign")),
        };
        let hours: i32 = zone[1..3].parse().map_err(|_| parse_err("bad timezone"))?;
        let minutes: i32 = zone[3..5].parse().map_err(|_| parse_err("bad timezone"))?;

        Ok(Self {
            name,
            email,
            when,
            offset_minutes: sign * (hours * 60 + minutes),
        })
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.offset_minutes < 0 { '-' } else { '+' };
        let abs = self.offset_minutes.unsigned_abs();
        write!(
            f,
            "{} <{}> {} {}{:02}{:02}",
            self.name,
            self.email,
            self.when,
            sign,
            abs / 60,
            abs % 60
        )
    }
}
