//! Resource name → agent identifier mapping.
//!
//! `apps-es-1` becomes label `APPS_ES_1` and store id `apps_es_1`. The
//! mapping folds every non-alphanumeric character to `_`, so it is only
//! injective over names that differ in more than punctuation; callers check
//! for collisions with `check_distinct_labels`.

use crate::error::{GenerateError, Result};
use std::collections::BTreeMap;

/// Label identifier (without the leading `@`).
pub fn label_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Plugin `@id` and buffer directory name.
pub fn store_id(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Synthetic tag failed deliveries are re-emitted under.
pub fn retry_tag(name: &str) -> String {
    format!("retry_{}", store_id(name))
}

/// Fail if two distinct `(kind, name)` entries map to the same label.
/// Repeats of the exact same entry are ignored.
pub fn check_distinct_labels<'a>(
    entries: impl IntoIterator<Item = (&'static str, &'a str)>,
) -> Result<()> {
    let mut seen: BTreeMap<String, (&'static str, &str)> = BTreeMap::new();
    for (kind, name) in entries {
        let label = label_name(name);
        if let Some(&(prev_kind, prev)) = seen.get(&label) {
            if (prev_kind, prev) != (kind, name) {
                return Err(GenerateError::LabelCollision {
                    first: format!("{} {}", prev_kind, prev),
                    second: format!("{} {}", kind, name),
                    label,
                });
            }
            continue;
        }
        seen.insert(label, (kind, name));
    }
    Ok(())
}

/// Fail if two outputs would render the same plugin `@id`, which is also
/// their buffer directory. Each entry is an output name and whether it gets
/// a retry store (`retry_<id>`) next to its main store.
pub fn check_distinct_store_ids<'a>(
    outputs: impl IntoIterator<Item = (&'a str, bool)>,
) -> Result<()> {
    let mut seen: BTreeMap<String, &str> = BTreeMap::new();
    for (name, with_retry) in outputs {
        let mut ids = vec![store_id(name)];
        if with_retry {
            ids.push(retry_tag(name));
        }
        for id in ids {
            if let Some(prev) = seen.get(&id) {
                return Err(GenerateError::StoreIdCollision {
                    first: prev.to_string(),
                    second: name.to_string(),
                    id,
                });
            }
            seen.insert(id, name);
        }
    }
    Ok(())
}

/// Kubernetes DNS-1123 label: lowercase alphanumerics and `-`, starting and
/// ending alphanumeric, at most 63 characters. Namespaces and secret names
/// are spliced into paths, so nothing else may reach the document.
pub fn is_dns1123_label(name: &str) -> bool {
    let alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    !name.is_empty()
        && name.len() <= 63
        && name.starts_with(alnum)
        && name.ends_with(alnum)
        && name.chars().all(|c| alnum(c) || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_names_are_upper_snake() {
        assert_eq!(label_name("apps-es-1"), "APPS_ES_1");
        assert_eq!(label_name("apps-pipeline"), "APPS_PIPELINE");
        assert_eq!(label_name("secureforward-receiver"), "SECUREFORWARD_RECEIVER");
        assert_eq!(label_name("my.output/x"), "MY_OUTPUT_X");
        assert_eq!(label_name("default"), "DEFAULT");
    }

    #[test]
    fn store_ids_are_lower_snake() {
        assert_eq!(store_id("Apps-ES-1"), "apps_es_1");
        assert_eq!(retry_tag("infra-es"), "retry_infra_es");
    }

    #[test]
    fn distinct_labels_pass() {
        let entries = [("output", "a"), ("output", "b"), ("output", "a-b"), ("pipeline", "ab")];
        assert!(check_distinct_labels(entries).is_ok());
    }

    #[test]
    fn punctuation_only_difference_collides() {
        let err = check_distinct_labels([("output", "es-1"), ("output", "es_1")]).unwrap_err();
        assert_eq!(
            err,
            GenerateError::LabelCollision {
                first: "output es-1".to_string(),
                second: "output es_1".to_string(),
                label: "ES_1".to_string(),
            }
        );
    }

    #[test]
    fn case_only_difference_collides() {
        assert!(check_distinct_labels([("pipeline", "Apps"), ("pipeline", "apps")]).is_err());
    }

    #[test]
    fn pipeline_and_output_share_label_namespace() {
        assert!(check_distinct_labels([("pipeline", "es"), ("output", "es")]).is_err());
        assert!(check_distinct_labels([("built-in label", "INGRESS"), ("pipeline", "ingress")]).is_err());
    }

    #[test]
    fn dns1123_labels() {
        let longest = "a".repeat(63);
        let too_long = "a".repeat(64);
        for ok in ["a", "ns-1", "project1-namespace", "0abc", longest.as_str()] {
            assert!(is_dns1123_label(ok), "{}", ok);
        }
        for bad in [
            "",
            "-ns",
            "ns-",
            "Ns",
            "ns_1",
            "ns.1",
            "x'",
            "ns\n</source>",
            "a,b",
            too_long.as_str(),
        ] {
            assert!(!is_dns1123_label(bad), "{:?}", bad);
        }
    }

    #[test]
    fn retry_store_of_one_output_clashes_with_another_output() {
        let err = check_distinct_store_ids([("a", true), ("retry-a", true)]).unwrap_err();
        assert_eq!(
            err,
            GenerateError::StoreIdCollision {
                first: "a".to_string(),
                second: "retry-a".to_string(),
                id: "retry_a".to_string(),
            }
        );

        // forward outputs have no retry store.
        assert!(check_distinct_store_ids([("a", false), ("retry-a", false)]).is_ok());
        assert!(check_distinct_store_ids([("es-1", true), ("es-2", true)]).is_ok());
    }
}
