//! Named-placeholder templates for the static parts of the document.
//!
//! Placeholders look like `__NAME__` (upper snake case between double
//! underscores). We avoid `format!()` because the agent config is full of
//! `{}` from embedded Ruby expressions (e.g. `"#{ENV['X'] || 'y'}"`).
//!
//! Two substitution modes:
//! - inline: the placeholder sits inside other text and is replaced as-is
//! - block: the placeholder is alone on its line; each line of the value is
//!   re-indented to the placeholder's indentation, and an empty value drops
//!   the line entirely
//!
//! Substitution is single pass, so values containing `__X__` are never
//! expanded again.

use crate::error::{GenerateError, Result};
use regex::{Captures, Regex};
use std::collections::{BTreeMap, BTreeSet};

const PLACEHOLDER_RE: &str = r"__([A-Z][A-Z0-9]*(?:_[A-Z0-9]+)*)__";

#[derive(Debug, Clone)]
pub struct Template {
    name: &'static str,
    text: &'static str,
    placeholders: BTreeSet<&'static str>,
    re: Regex,
}

impl Template {
    /// Parse `text` and check it uses exactly the `expected` placeholders.
    pub fn parse(name: &'static str, text: &'static str, expected: &[&str]) -> Result<Self> {
        let re = Regex::new(PLACEHOLDER_RE).map_err(|e| GenerateError::Template {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

        let placeholders: BTreeSet<&'static str> = re
            .captures_iter(text)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect();
        let expected: BTreeSet<&str> = expected.iter().copied().collect();

        if let Some(missing) = expected.iter().find(|p| !placeholders.contains(**p)) {
            return Err(GenerateError::Template {
                name: name.to_string(),
                reason: format!("missing placeholder __{}__", missing),
            });
        }
        if let Some(extra) = placeholders.iter().find(|p| !expected.contains(**p)) {
            return Err(GenerateError::Template {
                name: name.to_string(),
                reason: format!("undeclared placeholder __{}__", extra),
            });
        }

        Ok(Template {
            name,
            text,
            placeholders,
            re,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Render with a value for every placeholder. Supplying too few or
    /// unknown values is an error.
    pub fn render(&self, values: &[(&str, &str)]) -> Result<String> {
        let mut lookup: BTreeMap<&str, &str> = BTreeMap::new();
        for (key, value) in values {
            if !self.placeholders.contains(*key) {
                return Err(self.error(format!("no placeholder __{}__", key)));
            }
            lookup.insert(*key, *value);
        }
        if let Some(missing) = self.placeholders.iter().find(|p| !lookup.contains_key(**p)) {
            return Err(self.error(format!("no value for __{}__", missing)));
        }

        let mut out = String::with_capacity(self.text.len());
        for line in self.text.lines() {
            let body = line.trim_start();
            let indent = &line[..line.len() - body.len()];

            if let Some(key) = self.block_placeholder(body) {
                let value = lookup.get(key).copied().unwrap_or_default();
                for value_line in value.lines() {
                    if !value_line.is_empty() {
                        out.push_str(indent);
                        out.push_str(value_line);
                    }
                    out.push('\n');
                }
                continue;
            }

            let replaced = self.re.replace_all(line, |caps: &Captures| {
                caps.get(1)
                    .and_then(|m| lookup.get(m.as_str()))
                    .copied()
                    .unwrap_or_default()
                    .to_string()
            });
            out.push_str(&replaced);
            out.push('\n');
        }
        Ok(out)
    }

    /// Render a template that has no placeholders.
    pub fn text(&self) -> Result<String> {
        self.render(&[])
    }

    fn block_placeholder<'a>(&self, body: &'a str) -> Option<&'a str> {
        let caps = self.re.captures(body.trim_end())?;
        let whole = caps.get(0)?;
        if whole.start() == 0 && whole.end() == body.trim_end().len() {
            caps.get(1).map(|m| m.as_str())
        } else {
            None
        }
    }

    fn error(&self, reason: String) -> GenerateError {
        GenerateError::Template {
            name: self.name.to_string(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "<label @__LABEL__>\n  <match **>\n    __STORES__\n  </match>\n</label>\n";

    #[test]
    fn inline_and_block_substitution() {
        let t = Template::parse("sample", SAMPLE, &["LABEL", "STORES"]).unwrap();
        let out = t
            .render(&[("LABEL", "APPS"), ("STORES", "<store>\n  @type null\n</store>")])
            .unwrap();
        assert_eq!(
            out,
            "<label @APPS>\n  <match **>\n    <store>\n      @type null\n    </store>\n  </match>\n</label>\n"
        );
    }

    #[test]
    fn empty_block_value_drops_line() {
        let t = Template::parse("sample", SAMPLE, &["LABEL", "STORES"]).unwrap();
        let out = t.render(&[("LABEL", "X"), ("STORES", "")]).unwrap();
        assert_eq!(out, "<label @X>\n  <match **>\n  </match>\n</label>\n");
    }

    #[test]
    fn values_are_not_re_expanded() {
        let t = Template::parse("sample", "a __A__ b __B__\n", &["A", "B"]).unwrap();
        let out = t.render(&[("A", "__B__"), ("B", "x")]).unwrap();
        assert_eq!(out, "a __B__ b x\n");
    }

    #[test]
    fn ruby_expressions_are_not_placeholders() {
        let text = "log_level \"#{ENV['LOG_LEVEL'] || 'warn'}\"\nremove_keys _SOURCE_REALTIME_TIMESTAMP,__REALTIME_TIMESTAMP,CONTAINER_ID\n";
        let t = Template::parse("static", text, &[]).unwrap();
        assert_eq!(t.text().unwrap(), text);
    }

    #[test]
    fn placeholder_set_is_checked_at_parse() {
        let err = Template::parse("sample", SAMPLE, &["LABEL"]).unwrap_err();
        assert!(matches!(err, GenerateError::Template { .. }));
        assert!(err.to_string().contains("undeclared placeholder __STORES__"));

        let err = Template::parse("sample", SAMPLE, &["LABEL", "STORES", "EXTRA"]).unwrap_err();
        assert!(err.to_string().contains("missing placeholder __EXTRA__"));
    }

    #[test]
    fn render_checks_values() {
        let t = Template::parse("sample", SAMPLE, &["LABEL", "STORES"]).unwrap();
        assert!(t.render(&[("LABEL", "X")]).is_err());
        assert!(
            t.render(&[("LABEL", "X"), ("STORES", ""), ("OTHER", "y")])
                .is_err()
        );
    }
}
