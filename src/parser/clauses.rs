use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;

/// A scored query section. `Keywords` is not a syntactic clause; it holds the
/// fixed-vocabulary keyword set scanned from the whole query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClauseKind {
    /// SELECT list.
    Select,
    /// FROM clause including join chains.
    From,
    /// WHERE conditions.
    Where,
    /// GROUP BY columns.
    GroupBy,
    /// ORDER BY columns.
    OrderBy,
    /// HAVING conditions.
    Having,
    /// SQL keywords found anywhere in the query text.
    Keywords,
}

impl ClauseKind {
    /// The six syntactic clauses, in extraction order.
    pub const CLAUSES: [ClauseKind; 6] = [
        ClauseKind::Select,
        ClauseKind::From,
        ClauseKind::Where,
        ClauseKind::GroupBy,
        ClauseKind::OrderBy,
        ClauseKind::Having,
    ];

    /// Every scored section, including `Keywords`.
    pub const ALL: [ClauseKind; 7] = [
        ClauseKind::Select,
        ClauseKind::From,
        ClauseKind::Where,
        ClauseKind::GroupBy,
        ClauseKind::OrderBy,
        ClauseKind::Having,
        ClauseKind::Keywords,
    ];

    /// Canonical display name (`GROUP BY`, `KEYWORDS`, ...).
    pub fn name(&self) -> &'static str {
        match self {
            ClauseKind::Select => "SELECT",
            ClauseKind::From => "FROM",
            ClauseKind::Where => "WHERE",
            ClauseKind::GroupBy => "GROUP BY",
            ClauseKind::OrderBy => "ORDER BY",
            ClauseKind::Having => "HAVING",
            ClauseKind::Keywords => "KEYWORDS",
        }
    }
}

impl fmt::Display for ClauseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Raw clause text per clause. A missing key means the clause is absent from
/// the query, which callers must distinguish from present-but-empty.
pub type ClauseMap = BTreeMap<ClauseKind, String>;

/// Split a query into its clauses with ordered, non-overlapping boundary
/// patterns: SELECT ends at FROM; FROM ends at WHERE/GROUP BY/ORDER BY/HAVING
/// or end of string; and so on down to HAVING, which runs to the end.
///
/// Matching is case-insensitive and tolerates embedded newlines. Constructs
/// outside the six known clauses fold into the nearest preceding clause.
pub fn extract_clauses(query: &str) -> ClauseMap {
    let patterns: [(ClauseKind, &str); 6] = [
        (ClauseKind::Select, r"(?is)\bselect\b\s+(.*?)\s+\bfrom\b"),
        (
            ClauseKind::From,
            r"(?is)\bfrom\b\s+(.*?)(?:\s+\bwhere\b|\s+\bgroup\s+by\b|\s+\border\s+by\b|\s+\bhaving\b|$)",
        ),
        (
            ClauseKind::Where,
            r"(?is)\bwhere\b\s+(.*?)(?:\s+\bgroup\s+by\b|\s+\border\s+by\b|\s+\bhaving\b|$)",
        ),
        (
            ClauseKind::GroupBy,
            r"(?is)\bgroup\s+by\b\s+(.*?)(?:\s+\border\s+by\b|\s+\bhaving\b|$)",
        ),
        (
            ClauseKind::OrderBy,
            r"(?is)\border\s+by\b\s+(.*?)(?:\s+\bhaving\b|$)",
        ),
        (ClauseKind::Having, r"(?is)\bhaving\b\s+(.*?)$"),
    ];

    let mut clauses = ClauseMap::new();
    for (kind, pattern) in patterns {
        let boundary = Regex::new(pattern).unwrap();
        if let Some(caps) = boundary.captures(query) {
            clauses.insert(kind, caps[1].trim().to_string());
        }
    }
    clauses
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_all_six_clauses() {
        let clauses = extract_clauses(
            "select ten from hoc_sinh where tuoi > 18 group by lop order by ten having count(*) > 1",
        );
        assert_eq!(clauses.get(&ClauseKind::Select).map(String::as_str), Some("ten"));
        assert_eq!(clauses.get(&ClauseKind::From).map(String::as_str), Some("hoc_sinh"));
        assert_eq!(clauses.get(&ClauseKind::Where).map(String::as_str), Some("tuoi > 18"));
        assert_eq!(clauses.get(&ClauseKind::GroupBy).map(String::as_str), Some("lop"));
        assert_eq!(clauses.get(&ClauseKind::OrderBy).map(String::as_str), Some("ten"));
        assert_eq!(
            clauses.get(&ClauseKind::Having).map(String::as_str),
            Some("count(*) > 1")
        );
    }

    #[test]
    fn missing_clauses_are_absent_not_empty() {
        let clauses = extract_clauses("select ten from hoc_sinh");
        assert!(clauses.contains_key(&ClauseKind::Select));
        assert!(clauses.contains_key(&ClauseKind::From));
        assert!(!clauses.contains_key(&ClauseKind::Where));
        assert!(!clauses.contains_key(&ClauseKind::GroupBy));
    }

    #[test]
    fn tolerates_embedded_newlines() {
        let clauses = extract_clauses("SELECT ten\nFROM hoc_sinh\nWHERE tuoi > 18");
        assert_eq!(
            clauses.get(&ClauseKind::Where).map(String::as_str),
            Some("tuoi > 18")
        );
    }
}
