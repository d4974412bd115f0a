use sqleval::parser::alias::{extract_aliases, rewrite_aliases, AliasMap};
use sqleval::parser::normalize::{canonical_token, normalize};

mod support;

#[test]
fn normalization_is_idempotent() {
    let inputs = [
        "SELECT COUNT ( * ) FROM hoc_sinh ;",
        "select t1.ten_hoc_sinh\nFROM hoc_sinh AS t1\tWHERE  t1.tuoi > 18",
        "SELECT tuo\u{0302}\u{0309}i FROM hoc_sinh",
        "SELECT SUM( tuoi ) , MAX (tuoi) FROM hoc_sinh",
    ];
    for input in inputs {
        let once = normalize(input);
        assert_eq!(normalize(&once), once, "normalize not stable for {input:?}");
    }
}

#[test]
fn normalization_collapses_lexical_variants() {
    assert_eq!(
        normalize("SELECT  ten\nFROM   hoc_sinh;"),
        normalize("select ten from hoc_sinh")
    );
    assert_eq!(normalize("COUNT ( tuoi )"), "count(tuoi)");
    // Precomposed and decomposed diacritics compare equal after NFC.
    assert_eq!(
        normalize("select tu\u{1ED5}i from t"),
        normalize("select tuo\u{0302}\u{0309}i from t")
    );
}

#[test]
fn canonical_token_treats_underscore_and_space_as_one_form() {
    assert_eq!(canonical_token("ten_hoc_sinh"), canonical_token("ten hoc sinh"));
    assert_eq!(
        canonical_token("hoc_sinh.ten_hoc_sinh"),
        "hoc sinh.ten hoc sinh"
    );
}

#[test]
fn alias_extraction_covers_from_and_join_chains() {
    let query = normalize(
        "SELECT t1.ten_hoc_sinh, t2.ten_lop FROM hoc_sinh AS t1 JOIN lop t2 ON t1.lop_id = t2.lop_id",
    );
    let aliases = extract_aliases(&query);
    assert_eq!(aliases.get("t1").map(String::as_str), Some("hoc_sinh"));
    assert_eq!(aliases.get("t2").map(String::as_str), Some("lop"));
}

#[test]
fn alias_extraction_never_treats_clause_keywords_as_aliases() {
    let aliases = extract_aliases("select * from hoc_sinh where tuoi > 18 order by tuoi");
    assert!(aliases.is_empty());
}

#[test]
fn conflicting_alias_redefinition_keeps_last_and_does_not_crash() {
    let aliases = extract_aliases("select * from hoc_sinh t join lop t on 1 = 1");
    assert_eq!(aliases.len(), 1);
    assert_eq!(aliases.get("t").map(String::as_str), Some("lop"));
}

#[test]
fn rewriting_with_no_aliases_is_a_no_op() {
    let schema = support::student_schema();
    let query = normalize("SELECT hoc_sinh.ten_hoc_sinh FROM hoc_sinh WHERE hoc_sinh.tuoi > 18");
    let rewrite = rewrite_aliases(&query, &AliasMap::new(), &schema);
    assert_eq!(rewrite.query, query);
    assert!(rewrite.unresolved.is_empty());
}

#[test]
fn rewriting_replaces_alias_prefixes_with_table_names() {
    let schema = support::student_schema();
    let query = normalize("SELECT t1.ten_hoc_sinh FROM hoc_sinh t1 WHERE t1.tuoi > 18");
    let aliases = extract_aliases(&query);
    let rewrite = rewrite_aliases(&query, &aliases, &schema);
    assert_eq!(
        rewrite.query,
        "select hoc_sinh.ten_hoc_sinh from hoc_sinh t1 where hoc_sinh.tuoi > 18"
    );
    assert!(rewrite.unresolved.is_empty());
}

#[test]
fn unresolved_alias_prefixes_are_surfaced_not_dropped() {
    let schema = support::student_schema();
    let query = normalize("SELECT t9.ten_hoc_sinh FROM hoc_sinh WHERE t9.tuoi > 18");
    let rewrite = rewrite_aliases(&query, &extract_aliases(&query), &schema);
    assert_eq!(rewrite.unresolved, vec!["t9".to_string()]);
    // Text is left intact for best-effort downstream processing.
    assert!(rewrite.query.contains("t9.ten_hoc_sinh"));
}

#[test]
fn rewriting_only_touches_exact_alias_tokens() {
    let schema = support::student_schema();
    let query = "select t.tuoi, cat.tuoi from hoc_sinh t";
    let aliases = extract_aliases(query);
    let rewrite = rewrite_aliases(query, &aliases, &schema);
    assert!(rewrite.query.contains("hoc_sinh.tuoi"));
    assert!(rewrite.query.contains("cat.tuoi"));
}
