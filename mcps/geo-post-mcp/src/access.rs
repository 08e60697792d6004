//! Table-level access control

/// Tables callers may read
///
/// Built once from settings; exact, case-sensitive names in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    tables: Vec<String>,
}

impl AllowList {
    pub fn new<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for table in tables {
            let table = table.into();
            if !unique.contains(&table) {
                unique.push(table);
            }
        }
        Self { tables: unique }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.iter().any(|t| t == name)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.tables
    }
}

/// The single authorization check. No trimming, no case folding.
pub fn is_table_allowed(name: &str, allowed: &AllowList) -> bool {
    allowed.contains(name)
}
