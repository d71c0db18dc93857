//! Database-name codec.
//!
//! The Source addresses this bridge with strings of the form
//! `<name>[/<suffix>][;<uuid>]`:
//!
//! - `<name>` is the index name on our side.
//! - `<suffix>` (after the first `/`) is a Source-side routing hint such as a
//!   vbucket number; the bridge ignores it.
//! - `<uuid>` (after the first `;`) is the bucket UUID the Source expects
//!   this target to currently own. Absent means "do not verify".
//!
//! Splitting is single-pass on the first `/` and first `;`.

/// A parsed Source-supplied database string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseRef {
    index: String,
    suffix: Option<String>,
    uuid: Option<String>,
}

impl DatabaseRef {
    /// Parse a database string. Parsing never fails; empty segments are kept
    /// as empty strings so a malformed name surfaces as a missing index
    /// downstream rather than a protocol error.
    pub fn parse(database: &str) -> Self {
        let (head, uuid) = match database.split_once(';') {
            Some((head, uuid)) => (head, Some(uuid.to_string())),
            None => (database, None),
        };
        let (index, suffix) = match head.split_once('/') {
            Some((index, suffix)) => (index.to_string(), Some(suffix.to_string())),
            None => (head.to_string(), None),
        };
        Self {
            index,
            suffix,
            uuid,
        }
    }

    /// The index name addressed by this database string.
    pub fn index(&self) -> &str {
        &self.index
    }

    /// The routing suffix after `/`, if any. Carried for logging only.
    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    /// The bucket UUID the Source expects, if it supplied one.
    pub fn expected_uuid(&self) -> Option<&str> {
        self.uuid.as_deref()
    }

    /// The database name with the UUID stripped, as echoed back in
    /// `db_name` responses.
    pub fn name_without_uuid(&self) -> String {
        match &self.suffix {
            Some(suffix) => format!("{}/{}", self.index, suffix),
            None => self.index.clone(),
        }
    }
}

impl std::fmt::Display for DatabaseRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name_without_uuid())
    }
}
