use std::collections::HashMap;

use regex::Regex;

use crate::schema::catalog::Schema;

/// Per-query mapping from alias token to the table name it stands for.
pub type AliasMap = HashMap<String, String>;

/// Outcome of rewriting alias prefixes in a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasRewrite {
    /// Query text with every resolvable `alias.` prefix replaced by `table.`.
    pub query: String,
    /// Dotted prefixes that are neither a registered alias nor a known table.
    /// Surfaced so callers can count them; the text is left untouched.
    pub unresolved: Vec<String>,
}

/// Clause keywords that can follow a table reference but never act as its alias.
const NON_ALIAS_TOKENS: &[&str] = &[
    "where", "group", "order", "having", "on", "join", "left", "right", "inner", "outer", "full",
    "cross", "as", "select", "limit", "union", "intersect", "except", "and", "or",
];

/// Scan a normalized query for `FROM <table> [AS] [alias]` and
/// `JOIN <table> [AS] [alias]` occurrences and collect the alias map.
///
/// A redefined alias keeps its last definition; malformed input never panics.
pub fn extract_aliases(query: &str) -> AliasMap {
    let reference = Regex::new(
        r"(?i)\b(?:from|join)\s+([\p{L}_][\p{L}\p{N}_]*)(?:\s+(?:as\s+)?([\p{L}_][\p{L}\p{N}_]*))?",
    )
    .unwrap();

    let mut aliases = AliasMap::new();
    for caps in reference.captures_iter(query) {
        let table = caps[1].to_lowercase();
        if NON_ALIAS_TOKENS.contains(&table.as_str()) {
            continue;
        }
        if let Some(alias) = caps.get(2) {
            let alias = alias.as_str().to_lowercase();
            if !NON_ALIAS_TOKENS.contains(&alias.as_str()) {
                aliases.insert(alias, table);
            }
        }
    }
    aliases
}

/// Replace every `alias.` prefix with the aliased table name.
///
/// Only exact alias tokens bounded by non-identifier characters are
/// rewritten, so substrings of longer identifiers stay intact. A prefix that
/// is neither in the map nor a known schema table is reported as unresolved
/// and left as-is; processing always continues.
pub fn rewrite_aliases(query: &str, aliases: &AliasMap, schema: &Schema) -> AliasRewrite {
    let prefix = Regex::new(r"\b([\p{L}_][\p{L}\p{N}_]*)\.").unwrap();

    let mut unresolved: Vec<String> = Vec::new();
    let rewritten = prefix
        .replace_all(query, |caps: &regex::Captures| {
            let token = &caps[1];
            if let Some(table) = aliases.get(token) {
                format!("{table}.")
            } else {
                if !schema.has_table(token) && !unresolved.iter().any(|u| u == token) {
                    unresolved.push(token.to_string());
                }
                format!("{token}.")
            }
        })
        .into_owned();

    AliasRewrite {
        query: rewritten,
        unresolved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::catalog::Schema;

    #[test]
    fn extract_aliases_handles_bare_and_as_forms() {
        let aliases = extract_aliases("select * from hoc_sinh t1 join lop as t2 on t1.x = t2.y");
        assert_eq!(aliases.get("t1").map(String::as_str), Some("hoc_sinh"));
        assert_eq!(aliases.get("t2").map(String::as_str), Some("lop"));
    }

    #[test]
    fn extract_aliases_skips_clause_keywords() {
        let aliases = extract_aliases("select * from hoc_sinh where tuoi > 18");
        assert!(aliases.is_empty());
    }

    #[test]
    fn extract_aliases_last_definition_wins() {
        let aliases = extract_aliases("select * from hoc_sinh t join lop t on 1 = 1");
        assert_eq!(aliases.get("t").map(String::as_str), Some("lop"));
    }

    #[test]
    fn rewrite_with_empty_map_leaves_text_unchanged() {
        let schema = Schema::empty("db");
        let query = "select ten from hoc_sinh";
        let rewrite = rewrite_aliases(query, &AliasMap::new(), &schema);
        assert_eq!(rewrite.query, query);
    }

    #[test]
    fn rewrite_respects_token_boundaries() {
        let mut aliases = AliasMap::new();
        aliases.insert("t".to_string(), "hoc_sinh".to_string());
        let schema = Schema::empty("db");
        let rewrite = rewrite_aliases("select t.ten, t2.x, cat.y from z", &aliases, &schema);
        assert!(rewrite.query.starts_with("select hoc_sinh.ten, t2.x, cat.y"));
        assert_eq!(rewrite.unresolved, vec!["t2".to_string(), "cat".to_string()]);
    }
}
