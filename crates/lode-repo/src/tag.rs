//! Annotated tag objects.
//!
//! Canonical form: `object`, `type` and `tag` lines, an optional `tagger`
//! identity, a blank line, then the message.

use lode_types::{ObjectId, ObjectKind};

use crate::error::{RepoError, RepoResult};
use crate::signature::Signature;
use crate::source::WriteBuffer;

/// A named, annotated pointer at another object.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tag {
    target: Option<(ObjectId, ObjectKind)>,
    name: String,
    tagger: Option<Signature>,
    message: String,
}

impl Tag {
    /// The tagged object and its kind, once set.
    pub fn target(&self) -> Option<(ObjectId, ObjectKind)> {
        self.target
    }

    /// Point the tag at an object.
    pub fn set_target(&mut self, id: ObjectId, kind: ObjectKind) {
        self.target = Some((id, kind));
    }

    /// The tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the tag name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The tagger identity, if recorded.
    pub fn tagger(&self) -> Option<&Signature> {
        self.tagger.as_ref()
    }

    /// Set the tagger identity.
    pub fn set_tagger(&mut self, sig: Signature) {
        self.tagger = Some(sig);
    }

    /// The tag message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Replace the tag message.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    pub(crate) fn parse(data: &[u8]) -> RepoResult<Self> {
        let parse_err = |reason: &str| RepoError::Parse {
            kind: ObjectKind::Tag,
            reason: reason.to_string(),
        };

        let text = std::str::from_utf8(data).map_err(|_| parse_err("tag is not UTF-8"))?;
        let (headers, message) = match text.split_once("\n\n") {
            Some((h, m)) => (h, m.to_string()),
            None => (text.trim_end_matches('\n'), String::new()),
        };

        let mut object = None;
        let mut kind = None;
        let mut tag = Self::default();
        for line in headers.lines() {
            if line.starts_with(' ') {
                continue;
            }
            let (key, value) = line
                .split_once(' ')
                .ok_or_else(|| parse_err("malformed header line"))?;
            match key {
                "object" => {
                    object =
                        Some(ObjectId::from_hex(value).map_err(|_| parse_err("bad object id"))?);
                }
                "type" => {
                    let parsed = ObjectKind::parse_name(value);
                    if !parsed.is_loose() {
                        return Err(parse_err("bad target type"));
                    }
                    kind = Some(parsed);
                }
                "tag" => tag.name = value.to_string(),
                "tagger" => tag.tagger = Some(Signature::parse(ObjectKind::Tag, value)?),
                _ => {}
            }
        }

        match (object, kind) {
            (Some(id), Some(kind)) => tag.target = Some((id, kind)),
            _ => return Err(parse_err("missing object or type header")),
        }
        if tag.name.is_empty() {
            return Err(parse_err("missing tag header"));
        }

        tag.message = message;
        Ok(tag)
    }

    pub(crate) fn serialize(&self, buf: &mut WriteBuffer) -> RepoResult<()> {
        let (id, kind) = self.target.ok_or(RepoError::Incomplete("target"))?;
        if self.name.is_empty() {
            return Err(RepoError::Incomplete("name"));
        }

        write!(buf, "object {}\n", id.to_hex());
        write!(buf, "type {}\n", kind);
        write!(buf, "tag {}\n", self.name);
        if let Some(tagger) = &self.tagger {
            write!(buf, "tagger {tagger}\n");
        }
        write!(buf, "\n{}", self.message);
        Ok(())
    }
}
