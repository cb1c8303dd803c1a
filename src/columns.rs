use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::kobo::asset::{Asset, Label};

lazy_static! {
    static ref NON_ALNUM: Regex = Regex::new("[^0-9a-zA-Z_]+").unwrap();
    static ref UNDERSCORES: Regex = Regex::new("_+").unwrap();
}

/// The two rename mappings built from the form definition, kept as
/// explicitly ordered (key, value) pairs in survey order.  All lookups
/// scan front to back and the first match wins, so renaming is
/// deterministic even for the substring fallback rules.  Duplicate keys
/// keep their first occurrence.
#[derive(Debug, Default, PartialEq)]
pub struct FieldMappings {
    /// internal reference name → short machine identifier
    pub reference_to_id: Vec<(String, String)>,
    /// human-readable label text → short machine identifier
    pub label_to_id: Vec<(String, String)>,
}

impl FieldMappings {
    pub fn from_asset(asset: &Asset) -> FieldMappings {
        let mut mappings = FieldMappings::default();
        for question in asset.survey() {
            let (name, autoname) = match (&question.name, &question.autoname) {
                (Some(n), Some(a)) if !n.is_empty() && !a.is_empty() => (n, a),
                _ => continue,
            };
            push_unique(&mut mappings.reference_to_id, name, autoname);
            match &question.label {
                Some(Label::Text(text)) => {
                    if !text.is_empty() {
                        push_unique(&mut mappings.label_to_id, text, autoname);
                    }
                }
                // the export uses the first translation
                Some(Label::Translations(items)) => {
                    if let Some(Some(text)) = items.first() {
                        if !text.is_empty() {
                            push_unique(&mut mappings.label_to_id, text, autoname);
                        }
                    }
                }
                // every non-empty translation, in language-key order
                Some(Label::PerLanguage(by_language)) => {
                    for text in by_language.values().flatten() {
                        if !text.is_empty() {
                            push_unique(&mut mappings.label_to_id, text, autoname);
                        }
                    }
                }
                None => {}
            }
        }
        mappings
    }
}

fn push_unique(pairs: &mut Vec<(String, String)>, key: &str, value: &str) {
    if !pairs.iter().any(|(k, _)| k == key) {
        pairs.push((key.to_string(), value.to_string()));
    }
}

fn exact<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Find the form's short identifier for one raw export column name, or
/// `None` when nothing matched.  First rule that matches wins, no
/// backtracking:
///   1. exact label match
///   2. exact reference-name match
///   3. a reference name contained in the raw name
///   4. a label containing the raw name, or contained in it
pub fn lookup_identifier<'a>(raw: &str, mappings: &'a FieldMappings) -> Option<&'a str> {
    if let Some(id) = exact(&mappings.label_to_id, raw) {
        return Some(id);
    }
    if let Some(id) = exact(&mappings.reference_to_id, raw) {
        return Some(id);
    }
    if let Some((_, id)) = mappings
        .reference_to_id
        .iter()
        .find(|(reference, _)| raw.contains(reference.as_str()))
    {
        return Some(id);
    }
    if let Some((_, id)) = mappings
        .label_to_id
        .iter()
        .find(|(label, _)| raw.contains(label.as_str()) || label.contains(raw))
    {
        return Some(id);
    }
    None
}

/// Map one raw export column name to the form's short identifier,
/// keeping the raw name when nothing matched.
pub fn reconcile<'a>(raw: &'a str, mappings: &'a FieldMappings) -> &'a str {
    lookup_identifier(raw, mappings).unwrap_or(raw)
}

/// Make a name safe as a database column: trim, squash every run of
/// characters outside `[0-9a-zA-Z_]` to one underscore, lowercase,
/// collapse repeated underscores, strip them from the ends.  Idempotent.
pub fn sanitize(name: &str) -> String {
    let squashed = NON_ALNUM.replace_all(name.trim(), "_").to_lowercase();
    let collapsed = UNDERSCORES.replace_all(&squashed, "_");
    collapsed.trim_matches('_').to_string()
}

/// Disambiguate duplicate names by column order: the first occurrence
/// keeps the bare name, later ones get `_1`, `_2`, ...
pub fn dedup(names: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    names
        .into_iter()
        .map(|name| {
            let count = seen.entry(name.clone()).or_insert(0);
            let out = if *count == 0 {
                name.clone()
            } else {
                format!("{}_{}", name, count)
            };
            *count += 1;
            out
        })
        .collect()
}

/// The full rename pass applied to an export header: reconcile each raw
/// name, sanitize the result, then disambiguate duplicates.
pub fn canonical_columns(raw: &[String], mappings: &FieldMappings) -> Vec<String> {
    dedup(
        raw.iter()
            .map(|column| sanitize(reconcile(column, mappings)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(xs: &[(&str, &str)]) -> Vec<(String, String)> {
        xs.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn inventory_mappings() -> FieldMappings {
        FieldMappings {
            reference_to_id: pairs(&[
                ("respondent", "respondent"),
                ("stock", "stock_count"),
                ("site", "site_id"),
            ]),
            label_to_id: pairs(&[
                ("What is your name?", "name"),
                ("Stock Count", "stock_count"),
                ("Site", "site_id"),
            ]),
        }
    }

    #[test]
    fn exact_label_match() {
        let m = inventory_mappings();
        assert_eq!(reconcile("What is your name?", &m), "name");
        assert_eq!(reconcile("Stock Count", &m), "stock_count");
    }

    #[test]
    fn exact_reference_match() {
        let m = inventory_mappings();
        assert_eq!(reconcile("respondent", &m), "respondent");
    }

    #[test]
    fn label_match_wins_over_reference_match() {
        // "Site" is both a label and close to the reference "site";
        // rule order makes the label mapping decide
        let m = FieldMappings {
            reference_to_id: pairs(&[("Site", "from_reference")]),
            label_to_id: pairs(&[("Site", "from_label")]),
        };
        assert_eq!(reconcile("Site", &m), "from_label");
    }

    #[test]
    fn reference_substring_match() {
        let m = inventory_mappings();
        // grouped export columns come back as "group/field"
        assert_eq!(reconcile("intro/respondent", &m), "respondent");
        assert_eq!(reconcile("inventory/stock", &m), "stock_count");
    }

    #[test]
    fn label_substring_match_both_directions() {
        let m = FieldMappings {
            reference_to_id: vec![],
            label_to_id: pairs(&[("How many crates arrived this week?", "crates")]),
        };
        // raw contained in label
        assert_eq!(reconcile("How many crates arrived", &m), "crates");
        // label contained in raw
        assert_eq!(
            reconcile("How many crates arrived this week? (count)", &m),
            "crates"
        );
    }

    #[test]
    fn first_match_wins_among_substring_candidates() {
        let m = FieldMappings {
            reference_to_id: pairs(&[("stock", "first"), ("stock_b", "second")]),
            label_to_id: vec![],
        };
        assert_eq!(reconcile("warehouse/stock_b", &m), "first");
    }

    #[test]
    fn no_match_keeps_raw_name() {
        let m = inventory_mappings();
        assert_eq!(lookup_identifier("_submission_time", &m), None);
        assert_eq!(reconcile("_submission_time", &m), "_submission_time");
    }

    // a field whose identifier equals its raw name is still a match,
    // not a kept-as-is column
    #[test]
    fn identity_mapping_is_a_match() {
        let m = inventory_mappings();
        assert_eq!(lookup_identifier("respondent", &m), Some("respondent"));
    }

    #[test]
    fn sanitize_cases() {
        assert_eq!(sanitize("  What is your name?  "), "what_is_your_name");
        assert_eq!(sanitize("Stock Count"), "stock_count");
        assert_eq!(sanitize("a - b -- c"), "a_b_c");
        assert_eq!(sanitize("__already_safe__"), "already_safe");
        assert_eq!(sanitize("Prix (€/kg)"), "prix_kg");
        assert_eq!(sanitize("???"), "");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for name in ["  What is your name?  ", "a - b -- c", "_x_", "plain"] {
            let once = sanitize(name);
            assert_eq!(sanitize(&once), once);
        }
    }

    #[test]
    fn dedup_by_column_order() {
        let names = vec!["x".to_string(), "x".to_string(), "x".to_string()];
        assert_eq!(dedup(names), vec!["x", "x_1", "x_2"]);
    }

    #[test]
    fn dedup_leaves_distinct_names_alone() {
        let names = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        assert_eq!(dedup(names), vec!["a", "b", "a_1"]);
    }

    #[test]
    fn full_rename_pass() {
        let m = FieldMappings {
            reference_to_id: pairs(&[("respondent", "name"), ("stock", "stock_count")]),
            label_to_id: pairs(&[
                ("What is your name?", "name"),
                ("Stock Count", "stock_count"),
            ]),
        };
        let raw = vec![
            "What is your name?".to_string(),
            "Stock Count".to_string(),
            "_submission_time".to_string(),
        ];
        assert_eq!(
            canonical_columns(&raw, &m),
            vec!["name", "stock_count", "submission_time"]
        );
    }

    #[test]
    fn full_rename_pass_disambiguates_collisions() {
        // two unmatched raw names that sanitize to the same thing
        let m = FieldMappings::default();
        let raw = vec!["Total (kg)".to_string(), "Total [kg]".to_string()];
        assert_eq!(canonical_columns(&raw, &m), vec!["total_kg", "total_kg_1"]);
    }
}
