//! Checksum domains and entry identity

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::fault::Fault;

/// Longest accepted table or application name
pub const MAX_NAME_LEN: usize = 40;

/// The six resource categories, in scan order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecksumDomain {
    CfeCore,
    OsCodeSegment,
    EepromTable,
    MemoryTable,
    TablesTable,
    AppTable,
}

impl ChecksumDomain {
    /// Round-robin order used by the background scan
    pub const SCAN_ORDER: [ChecksumDomain; 6] = [
        ChecksumDomain::CfeCore,
        ChecksumDomain::OsCodeSegment,
        ChecksumDomain::EepromTable,
        ChecksumDomain::MemoryTable,
        ChecksumDomain::TablesTable,
        ChecksumDomain::AppTable,
    ];

    /// Position in [`Self::SCAN_ORDER`]
    pub fn index(self) -> usize {
        match self {
            ChecksumDomain::CfeCore => 0,
            ChecksumDomain::OsCodeSegment => 1,
            ChecksumDomain::EepromTable => 2,
            ChecksumDomain::MemoryTable => 3,
            ChecksumDomain::TablesTable => 4,
            ChecksumDomain::AppTable => 5,
        }
    }

    /// The domain scanned after this one, `None` after the last
    pub fn next(self) -> Option<ChecksumDomain> {
        Self::SCAN_ORDER.get(self.index() + 1).copied()
    }

    /// Human-readable label used in event text
    pub fn label(self) -> &'static str {
        match self {
            ChecksumDomain::CfeCore => "cFE Core",
            ChecksumDomain::OsCodeSegment => "OS code segment",
            ChecksumDomain::EepromTable => "Eeprom",
            ChecksumDomain::MemoryTable => "Memory",
            ChecksumDomain::TablesTable => "Table",
            ChecksumDomain::AppTable => "App",
        }
    }

    /// Entries are resolved by name (Tables, Apps)
    pub fn is_named(self) -> bool {
        matches!(self, ChecksumDomain::TablesTable | ChecksumDomain::AppTable)
    }

    /// Exactly one implicit entry (cFE core, OS code segment)
    pub fn is_single_entry(self) -> bool {
        matches!(self, ChecksumDomain::CfeCore | ChecksumDomain::OsCodeSegment)
    }
}

impl fmt::Display for ChecksumDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// State of one entry
///
/// `Undefined` is never stored; it is what a lookup reports for an index or
/// name that does not resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    #[default]
    Empty,
    Enabled,
    Disabled,
    Undefined,
}

impl EntryState {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryState::Empty => "empty",
            EntryState::Enabled => "enabled",
            EntryState::Disabled => "disabled",
            EntryState::Undefined => "undefined",
        }
    }

    /// Enabled or Disabled, i.e. a slot that is in use
    pub fn is_active(self) -> bool {
        matches!(self, EntryState::Enabled | EntryState::Disabled)
    }
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounded resource name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntryName(String);

impl EntryName {
    pub fn new(name: impl Into<String>) -> Result<Self, Fault> {
        let name = name.into();
        if name.len() > MAX_NAME_LEN {
            return Err(Fault::InvalidEntry(format!(
                "name '{}' exceeds {} bytes",
                name, MAX_NAME_LEN
            )));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<String> for EntryName {
    type Error = Fault;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        EntryName::new(value)
    }
}

impl From<EntryName> for String {
    fn from(name: EntryName) -> Self {
        name.0
    }
}

impl fmt::Display for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a command addresses an entry: by index for range domains, by name for
/// named domains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryRef {
    Index(u16),
    Name(String),
}

impl EntryRef {
    /// Reference to the implicit entry of a single-entry domain
    pub fn implicit() -> Self {
        EntryRef::Index(0)
    }
}

impl fmt::Display for EntryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryRef::Index(index) => write!(f, "entry {}", index),
            EntryRef::Name(name) => f.write_str(name),
        }
    }
}

impl From<u16> for EntryRef {
    fn from(index: u16) -> Self {
        EntryRef::Index(index)
    }
}

impl From<&str> for EntryRef {
    fn from(name: &str) -> Self {
        EntryRef::Name(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_order_is_consistent_with_index() {
        for (position, domain) in ChecksumDomain::SCAN_ORDER.iter().enumerate() {
            assert_eq!(domain.index(), position);
        }
    }

    #[test]
    fn test_next_stops_after_apps() {
        assert_eq!(ChecksumDomain::CfeCore.next(), Some(ChecksumDomain::OsCodeSegment));
        assert_eq!(ChecksumDomain::TablesTable.next(), Some(ChecksumDomain::AppTable));
        assert_eq!(ChecksumDomain::AppTable.next(), None);
    }

    #[test]
    fn test_domain_shapes() {
        assert!(ChecksumDomain::CfeCore.is_single_entry());
        assert!(!ChecksumDomain::EepromTable.is_single_entry());
        assert!(ChecksumDomain::AppTable.is_named());
        assert!(!ChecksumDomain::MemoryTable.is_named());
    }

    #[test]
    fn test_domain_serde_names() {
        let json = serde_json::to_string(&ChecksumDomain::EepromTable).unwrap();
        assert_eq!(json, "\"eeprom_table\"");
        let parsed: ChecksumDomain = serde_json::from_str("\"app_table\"").unwrap();
        assert_eq!(parsed, ChecksumDomain::AppTable);
    }

    #[test]
    fn test_entry_name_bound() {
        assert!(EntryName::new("CS.DefTablesTbl").is_ok());
        assert!(EntryName::new("x".repeat(MAX_NAME_LEN)).is_ok());
        assert!(EntryName::new("x".repeat(MAX_NAME_LEN + 1)).is_err());

        let too_long = format!("\"{}\"", "y".repeat(MAX_NAME_LEN + 1));
        assert!(serde_json::from_str::<EntryName>(&too_long).is_err());
    }

    #[test]
    fn test_entry_ref_untagged() {
        let index: EntryRef = serde_json::from_str("3").unwrap();
        assert_eq!(index, EntryRef::Index(3));
        let name: EntryRef = serde_json::from_str("\"SC.RTS_TBL\"").unwrap();
        assert_eq!(name, EntryRef::Name("SC.RTS_TBL".into()));
    }

    #[test]
    fn test_entry_state_activity() {
        assert!(EntryState::Enabled.is_active());
        assert!(EntryState::Disabled.is_active());
        assert!(!EntryState::Empty.is_active());
        assert!(!EntryState::Undefined.is_active());
    }
}
