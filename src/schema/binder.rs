use regex::Regex;

use crate::parser::normalize::canonical_token;
use crate::schema::catalog::Schema;

/// Tokens that look like identifiers but never name a column.
const NON_COLUMN_TOKENS: &[&str] = &[
    "and", "or", "not", "in", "exists", "like", "between", "is", "null", "asc", "desc", "distinct",
    "select", "from", "where", "group", "order", "by", "having", "on", "join", "left", "right",
    "inner", "outer", "full", "cross", "as", "case", "when", "then", "else", "end", "limit",
    "offset", "union", "intersect", "except", "count", "sum", "avg", "min", "max",
    "count_distinct",
];

/// Binds bare and alias-qualified column references against one schema.
///
/// Binding requires an exact, non-ambiguous match: a column name carried by
/// more than one table is left unresolved rather than guessed.
pub struct SchemaBinder<'a> {
    schema: &'a Schema,
}

impl<'a> SchemaBinder<'a> {
    /// Bind against `schema`.
    pub fn new(schema: &'a Schema) -> Self {
        SchemaBinder { schema }
    }

    /// Resolve a column reference to canonical `table.column` form.
    ///
    /// `table.column` with a known table is kept (canonicalized) when the
    /// table carries the column. A bare column, or one qualified by an
    /// unknown prefix (an alias the resolver could not map), is matched by
    /// suffix against the whole catalog and bound only when exactly one
    /// table carries it.
    pub fn bind_reference(&self, reference: &str) -> Option<String> {
        let (prefix, column) = match reference.rsplit_once('.') {
            Some((prefix, column)) => (Some(prefix), column),
            None => (None, reference),
        };
        let column_canonical = canonical_token(column);
        if column_canonical.is_empty() {
            return None;
        }

        let candidates = self.schema.tables_with_column(column);
        if let Some(prefix) = prefix {
            if self.schema.has_table(prefix) {
                let table = canonical_token(prefix);
                return candidates
                    .iter()
                    .any(|candidate| *candidate == table)
                    .then(|| format!("{table}.{column_canonical}"));
            }
        }
        match candidates {
            [table] => Some(format!("{table}.{column_canonical}")),
            _ => None,
        }
    }

    /// Rewrite every identifier token of an expression fragment to its bound
    /// `table.column` form where one exists, leaving quoted literals, SQL
    /// keywords, and unresolvable references untouched.
    pub fn qualify_expression(&self, text: &str) -> String {
        let mut out = String::new();
        let mut rest = text;
        loop {
            match rest.find(|c| c == '\'' || c == '"') {
                None => {
                    out.push_str(&self.qualify_segment(rest));
                    break;
                }
                Some(position) => {
                    let quote = rest[position..].chars().next().unwrap();
                    out.push_str(&self.qualify_segment(&rest[..position]));
                    let tail = &rest[position + 1..];
                    match tail.find(quote) {
                        Some(end) => {
                            out.push(quote);
                            out.push_str(&tail[..end]);
                            out.push(quote);
                            rest = &tail[end + 1..];
                        }
                        None => {
                            // Unbalanced quote: keep the remainder verbatim.
                            out.push(quote);
                            out.push_str(tail);
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    fn qualify_segment(&self, segment: &str) -> String {
        let token = Regex::new(r"[\p{L}_][\p{L}\p{N}_]*(?:\.[\p{L}_][\p{L}\p{N}_]*)?").unwrap();
        token
            .replace_all(segment, |caps: &regex::Captures| {
                let matched = &caps[0];
                if NON_COLUMN_TOKENS.contains(&matched.to_lowercase().as_str()) {
                    return matched.to_string();
                }
                self.bind_reference(matched)
                    .unwrap_or_else(|| matched.to_string())
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::catalog::SchemaRecord;

    fn schema() -> Schema {
        Schema::from_record(SchemaRecord {
            db_id: "truong_hoc".to_string(),
            table_names: vec!["hoc_sinh".to_string(), "lop".to_string()],
            column_names: vec![
                (-1, "*".to_string()),
                (0, "ten_hoc_sinh".to_string()),
                (0, "tuoi".to_string()),
                (0, "ten".to_string()),
                (1, "ten".to_string()),
                (1, "ten_lop".to_string()),
            ],
            column_types: Vec::new(),
            foreign_keys: Vec::new(),
            primary_keys: Vec::new(),
        })
        .unwrap()
    }

    #[test]
    fn bare_column_binds_when_unique() {
        let schema = schema();
        let binder = SchemaBinder::new(&schema);
        assert_eq!(
            binder.bind_reference("tuoi").as_deref(),
            Some("hoc sinh.tuoi")
        );
    }

    #[test]
    fn ambiguous_column_stays_unresolved() {
        let schema = schema();
        let binder = SchemaBinder::new(&schema);
        assert_eq!(binder.bind_reference("ten"), None);
        assert_eq!(binder.bind_reference("t9.ten"), None);
    }

    #[test]
    fn unknown_prefix_falls_back_to_suffix_match() {
        let schema = schema();
        let binder = SchemaBinder::new(&schema);
        assert_eq!(
            binder.bind_reference("t1.tuoi").as_deref(),
            Some("hoc sinh.tuoi")
        );
    }

    #[test]
    fn qualify_expression_skips_quoted_literals_and_keywords() {
        let schema = schema();
        let binder = SchemaBinder::new(&schema);
        assert_eq!(
            binder.qualify_expression("tuoi > 18 and ten_lop = 'tuoi cao'"),
            "hoc sinh.tuoi > 18 and lop.ten lop = 'tuoi cao'"
        );
    }
}
