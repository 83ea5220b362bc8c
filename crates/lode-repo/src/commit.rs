//! Commit objects.
//!
//! Canonical form: a `tree` line, zero or more `parent` lines, `author`
//! and `committer` identity lines, a blank line, then the free-form
//! message. Unknown header lines (and their indented continuations) are
//! tolerated on parse and dropped on re-serialization.

use lode_types::{ObjectId, ObjectKind};

use crate::error::{RepoError, RepoResult};
use crate::signature::Signature;
use crate::source::WriteBuffer;

/// A snapshot plus its ancestry and authorship.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Commit {
    tree: Option<ObjectId>,
    parents: Vec<ObjectId>,
    author: Option<Signature>,
    committer: Option<Signature>,
    message: String,
}

impl Commit {
    /// The id of the root tree, once set.
    pub fn tree(&self) -> Option<ObjectId> {
        self.tree
    }

    /// Point the commit at a root tree.
    pub fn set_tree(&mut self, id: ObjectId) {
        self.tree = Some(id);
    }

    /// Parent commit ids, in recorded order.
    pub fn parents(&self) -> &[ObjectId] {
        &self.parents
    }

    /// Append a parent commit.
    pub fn add_parent(&mut self, id: ObjectId) {
        self.parents.push(id);
    }

    /// The author identity, once set.
    pub fn author(&self) -> Option<&Signature> {
        self.author.as_ref()
    }

    /// Set the author identity.
    pub fn set_author(&mut self, sig: Signature) {
        self.author = Some(sig);
    }

    /// The committer identity, once set.
    pub fn committer(&self) -> Option<&Signature> {
        self.committer.as_ref()
    }

    /// Set the committer identity.
    pub fn set_committer(&mut self, sig: Signature) {
        self.committer = Some(sig);
    }

    /// The commit message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Replace the commit message.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    pub(crate) fn parse(data: &[u8]) -> RepoResult<Self> {
        let parse_err = |reason: &str| RepoError::Parse {
            kind: ObjectKind::Commit,
            reason: reason.to_string(),
        };

        let text =
            std::str::from_utf8(data).map_err(|_| parse_err("commit is not UTF-8"))?;
        let (headers, message) = match text.split_once("\n\n") {
            Some((h, m)) => (h, m.to_string()),
            None => (text.trim_end_matches('\n'), String::new()),
        };

        let mut commit = Self::default();
        for line in headers.lines() {
            if line.starts_with(' ') {
                // Continuation of a multi-line header we do not track.
                continue;
            }
            let (key, value) = line
                .split_once(' ')
                .ok_or_else(|| parse_err("malformed header line"))?;
            match key {
                "tree" => {
                    commit.tree = Some(
                        ObjectId::from_hex(value).map_err(|_| parse_err("bad tree id"))?,
                    );
                }
                "parent" => {
                    commit.parents.push(
                        ObjectId::from_hex(value).map_err(|_| parse_err("bad parent id"))?,
                    );
                }
                "author" => commit.author = Some(Signature::parse(ObjectKind::Commit, value)?),
                "committer" => {
                    commit.committer = Some(Signature::parse(ObjectKind::Commit, value)?)
                }
                _ => {}
            }
        }

        if commit.tree.is_none() {
            return Err(parse_err("missing tree header"));
        }
        if commit.author.is_none() || commit.committer.is_none() {
            return Err(parse_err("missing identity headers"));
        }

        commit.message = message;
        Ok(commit)
    }

    pub(crate) fn serialize(&self, buf: &mut WriteBuffer) -> RepoResult<()> {
        let tree = self.tree.ok_or(RepoError::Incomplete("tree"))?;
        let author = self.author.as_ref().ok_or(RepoError::Incomplete("author"))?;
        let committer = self
            .committer
            .as_ref()
            .ok_or(RepoError::Incomplete("committer"))?;

        write!(buf, "tree {}\n", tree.to_hex());
        for parent in &self.parents {
            write!(buf, "parent {}\n", parent.to_hex());
        }
        write!(buf, "author {author}\n");
        write!(buf, "committer {committer}\n");
        write!(buf, "\n{}", self.message);
        Ok(())
    }
}
