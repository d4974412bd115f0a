use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;

use crate::parser::clauses::{ClauseKind, ClauseMap};
use crate::parser::normalize::{aggregate_inner, canonical_token, contains_aggregate};
use crate::schema::binder::SchemaBinder;

/// Normalized atomic tokens per clause. Two component sets are compared by
/// exact string-set intersection; both sides must be built by this module so
/// normalization is applied identically.
pub type ComponentSets = BTreeMap<ClauseKind, BTreeSet<String>>;

/// Fixed keyword vocabulary scanned for the KEYWORDS component.
pub const SQL_KEYWORDS: &[&str] = &[
    "left join",
    "right join",
    "inner join",
    "outer join",
    "join",
    "union",
    "intersect",
    "except",
    "with",
    "count",
    "sum",
    "avg",
    "max",
    "min",
    "case",
    "when",
    "then",
    "end",
    "and",
    "or",
    "not",
    "in",
    "exists",
    "like",
    "between",
    "is null",
    "null",
    "asc",
    "desc",
    "limit",
    "offset",
];

/// Decompose extracted clause text into per-clause component sets, binding
/// column references through the schema. `query` is the full (alias-resolved)
/// query text, scanned for the KEYWORDS vocabulary.
pub fn extract_components(clauses: &ClauseMap, query: &str, binder: &SchemaBinder) -> ComponentSets {
    let mut sets = ComponentSets::new();
    for (kind, text) in clauses {
        let components = match kind {
            ClauseKind::Select => select_components(text, binder),
            ClauseKind::From => from_components(text),
            ClauseKind::Where => condition_components(text, binder),
            ClauseKind::GroupBy => column_list_components(text, binder),
            ClauseKind::OrderBy => order_by_components(text, binder),
            ClauseKind::Having => having_components(text, binder),
            ClauseKind::Keywords => continue,
        };
        sets.insert(*kind, components);
    }
    sets.insert(ClauseKind::Keywords, keyword_components(query));
    sets
}

/// SELECT items: split on top-level commas, strip `AS` aliases, and unwrap
/// aggregate calls so the underlying column still earns credit when only the
/// aggregate differs.
fn select_components(text: &str, binder: &SchemaBinder) -> BTreeSet<String> {
    let mut set = BTreeSet::new();
    for part in split_top_level_commas(text) {
        let stripped = strip_select_alias(&part);
        let item = stripped
            .strip_prefix("distinct ")
            .map(str::to_string)
            .unwrap_or(stripped);
        let expr = aggregate_inner(&item).unwrap_or(item);
        let bound = binder.qualify_expression(&expr);
        let token = canonical_token(&bound);
        if !token.is_empty() {
            set.insert(token);
        }
    }
    set
}

/// FROM tables: split on JOIN variants and commas, then take the leading
/// token of each fragment (the canonical table name after alias resolution).
fn from_components(text: &str) -> BTreeSet<String> {
    let join = Regex::new(r"(?i)\b(?:left|right|inner|outer|full|cross)?\s*join\b").unwrap();
    let mut set = BTreeSet::new();
    for segment in join.split(text) {
        for fragment in split_top_level_commas(segment) {
            if let Some(first) = fragment.split_whitespace().next() {
                if !first.eq_ignore_ascii_case("on") {
                    set.insert(canonical_token(first));
                }
            }
        }
    }
    set
}

/// WHERE conditions: each top-level AND/OR fragment is one atomic token.
fn condition_components(text: &str, binder: &SchemaBinder) -> BTreeSet<String> {
    split_top_level_keywords(text, &["and", "or"])
        .iter()
        .map(|fragment| canonical_token(&binder.qualify_expression(fragment)))
        .filter(|token| !token.is_empty())
        .collect()
}

/// HAVING conditions: aggregate-bearing fragments stay whole; plain
/// comparisons contribute their left-hand column reference.
fn having_components(text: &str, binder: &SchemaBinder) -> BTreeSet<String> {
    let lhs = Regex::new(
        r"^([\p{L}_][\p{L}\p{N}_]*(?:\.[\p{L}_][\p{L}\p{N}_]*)?)\s*(?:=|!=|<>|<=|>=|<|>)",
    )
    .unwrap();
    let mut set = BTreeSet::new();
    for fragment in split_top_level_keywords(text, &["and", "or"]) {
        let token = if contains_aggregate(&fragment) {
            canonical_token(&binder.qualify_expression(&fragment))
        } else if let Some(caps) = lhs.captures(&fragment) {
            canonical_token(&binder.qualify_expression(&caps[1]))
        } else {
            canonical_token(&fragment)
        };
        if !token.is_empty() {
            set.insert(token);
        }
    }
    set
}

/// GROUP BY entries: top-level comma split, bound and canonicalized.
fn column_list_components(text: &str, binder: &SchemaBinder) -> BTreeSet<String> {
    split_top_level_commas(text)
        .iter()
        .map(|part| canonical_token(&binder.qualify_expression(part)))
        .filter(|token| !token.is_empty())
        .collect()
}

/// ORDER BY entries: like GROUP BY with trailing ASC/DESC stripped.
fn order_by_components(text: &str, binder: &SchemaBinder) -> BTreeSet<String> {
    let direction = Regex::new(r"(?i)\s+(?:asc|desc)\s*$").unwrap();
    split_top_level_commas(text)
        .iter()
        .map(|part| {
            let stripped = direction.replace(part, "");
            canonical_token(&binder.qualify_expression(&stripped))
        })
        .filter(|token| !token.is_empty())
        .collect()
}

fn keyword_components(query: &str) -> BTreeSet<String> {
    SQL_KEYWORDS
        .iter()
        .filter(|keyword| keyword_pattern(keyword).is_match(query))
        .map(|keyword| keyword.to_string())
        .collect()
}

fn keyword_pattern(keyword: &str) -> Regex {
    let escaped = keyword
        .split(' ')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    Regex::new(&format!(r"(?i)\b{escaped}\b")).unwrap()
}

fn strip_select_alias(part: &str) -> String {
    let alias = Regex::new(r"(?i)\s+as\s+").unwrap();
    let result = alias
        .splitn(part, 2)
        .next()
        .unwrap_or(part)
        .trim()
        .to_string();
    result
}

/// Split on commas that sit outside parentheses and quotes.
pub fn split_top_level_commas(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for ch in text.chars() {
        match ch {
            '\'' | '"' => match quote {
                Some(open) if open == ch => quote = None,
                None => quote = Some(ch),
                Some(_) => {}
            },
            '(' if quote.is_none() => depth += 1,
            ')' if quote.is_none() => depth = depth.saturating_sub(1),
            ',' if depth == 0 && quote.is_none() => {
                push_part(&mut parts, &mut current);
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }
    push_part(&mut parts, &mut current);
    parts
}

/// Split on standalone keyword tokens (case-insensitive) outside parentheses.
pub fn split_top_level_keywords(text: &str, separators: &[&str]) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for token in text.split_whitespace() {
        let lower = token.to_lowercase();
        if depth == 0 && separators.contains(&lower.as_str()) {
            push_part(&mut parts, &mut current);
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(token);
        }
        depth += token.matches('(').count();
        depth = depth.saturating_sub(token.matches(')').count());
    }
    push_part(&mut parts, &mut current);
    parts
}

fn push_part(parts: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        parts.push(trimmed.to_string());
    }
    current.clear();
}
