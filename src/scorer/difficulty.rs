use std::fmt;

use regex::Regex;
use serde::Serialize;

use crate::parser::normalize::contains_aggregate;

/// Structural complexity label of a gold query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Single-table lookup with at most a simple filter.
    Easy,
    /// Grouping, ordering, aggregation, or a plain join.
    Medium,
    /// Join combined with aggregation or a complex filter.
    Hard,
    /// Subqueries, set operations, windows, CTEs, or join+aggregation+HAVING.
    Extra,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
            Difficulty::Extra => write!(f, "extra"),
        }
    }
}

/// Boolean structural features probed from the query text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StructuralFeatures {
    /// Any JOIN keyword.
    pub has_join: bool,
    /// A SELECT opening inside parentheses.
    pub has_subquery: bool,
    /// UNION, INTERSECT, or EXCEPT.
    pub has_set_op: bool,
    /// A window function (`OVER (`).
    pub has_window: bool,
    /// A WITH common table expression.
    pub has_cte: bool,
    /// An aggregate function call.
    pub has_aggregation: bool,
    /// GROUP BY present.
    pub has_group_by: bool,
    /// ORDER BY present.
    pub has_order_by: bool,
    /// HAVING present.
    pub has_having: bool,
    /// WHERE present.
    pub has_where: bool,
    /// WHERE present with at least two distinct operator keywords.
    pub complex_where: bool,
}

/// Operator keywords counted toward `complex_where`.
const WHERE_OPERATORS: &[&str] = &[
    "and", "or", "in", "not in", "exists", "not exists", "like", "between",
];

/// Probe the structural features of a query.
pub fn features(query: &str) -> StructuralFeatures {
    let matches = |pattern: &str| Regex::new(pattern).unwrap().is_match(query);

    let has_where = matches(r"(?i)\bwhere\b");
    let operator_kinds = WHERE_OPERATORS
        .iter()
        .filter(|operator| {
            let escaped = operator
                .split(' ')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+");
            matches(&format!(r"(?i)\b{escaped}\b"))
        })
        .count();

    StructuralFeatures {
        has_join: matches(r"(?i)\bjoin\b"),
        has_subquery: matches(r"(?i)\(\s*select\b"),
        has_set_op: matches(r"(?i)\b(?:union|intersect|except)\b"),
        has_window: matches(r"(?i)\bover\s*\("),
        has_cte: matches(r"(?i)\bwith\b"),
        has_aggregation: contains_aggregate(query),
        has_group_by: matches(r"(?i)\bgroup\s+by\b"),
        has_order_by: matches(r"(?i)\border\s+by\b"),
        has_having: matches(r"(?i)\bhaving\b"),
        has_where,
        complex_where: has_where && operator_kinds >= 2,
    }
}

/// Classify a gold query's difficulty.
///
/// The decision table is checked in order and the first match wins;
/// reordering the checks changes the outcome for queries satisfying several
/// predicates at once.
pub fn classify(query: &str) -> Difficulty {
    let f = features(query);
    if f.has_subquery
        || f.has_set_op
        || f.has_window
        || f.has_cte
        || (f.has_join && f.has_aggregation && f.has_having)
    {
        Difficulty::Extra
    } else if (f.has_join && (f.has_aggregation || f.complex_where))
        || (f.has_aggregation && f.has_group_by && f.has_having)
    {
        Difficulty::Hard
    } else if f.has_group_by || f.has_order_by || f.has_aggregation || (f.has_join && !f.has_aggregation) {
        Difficulty::Medium
    } else {
        Difficulty::Easy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lookup_is_easy() {
        assert_eq!(classify("select * from hoc_sinh"), Difficulty::Easy);
        assert_eq!(
            classify("select ten from hoc_sinh where tuoi > 18"),
            Difficulty::Easy
        );
    }

    #[test]
    fn aggregation_with_grouping_is_medium() {
        assert_eq!(
            classify("select count(*) from hoc_sinh group by lop"),
            Difficulty::Medium
        );
    }

    #[test]
    fn join_with_aggregation_is_hard() {
        assert_eq!(
            classify("select count(*) from a join b on a.x = b.y"),
            Difficulty::Hard
        );
    }

    #[test]
    fn subquery_outranks_everything_else() {
        assert_eq!(
            classify("select ten from hoc_sinh where tuoi > (select avg(tuoi) from hoc_sinh)"),
            Difficulty::Extra
        );
    }

    #[test]
    fn aggregate_names_inside_identifiers_do_not_count() {
        // `diem_min` contains "min" but is not an aggregate call.
        assert_eq!(
            classify("select diem_min from hoc_sinh"),
            Difficulty::Easy
        );
    }
}
