//! Ordered substitution table for known malformed model output
//!
//! Each rule is a named, deterministic rewrite. The built-in rules are
//! idempotent: running the table over its own output changes nothing.
//! Extra literal or regex rules can be appended from a TOML file:
//!
//! ```toml
//! [[rule]]
//! name = "drop-serif-ids"
//! pattern = { regex = '\sserif:id="[^"]*"', replace = "" }
//!
//! [[rule]]
//! name = "nbsp-entity"
//! literal = { from = "&nbsp;", to = "&#160;" }
//! ```

use super::extract::tag_end;
use crate::core::constants::svg::VOID_ELEMENTS;
use anyhow::{Context, Result};
use regex::{Captures, Regex};
use serde::Deserialize;
use std::borrow::Cow;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

static BARE_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\s[A-Za-z_:][-A-Za-z0-9_:.]*)=([^"'\s<>]+)"#).expect("valid attribute regex")
});

static EMPTY_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s+[A-Za-z_:][-A-Za-z0-9_:.]*=(?:""|'')"#).expect("valid attribute regex")
});

static AMPERSAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#x[0-9A-Fa-f]+;|#[0-9]+;|[A-Za-z_][A-Za-z0-9._-]*;)?").expect("valid entity regex")
});

static VOID_OPEN_TAG: LazyLock<Regex> = LazyLock::new(|| {
    let names = VOID_ELEMENTS.join("|");
    Regex::new(&format!(r"<({})(\s[^<>]*)?>", names)).expect("valid void element regex")
});

/// Errors raised while loading user-defined rules
#[derive(Debug, Error)]
pub enum SubstitutionError {
    #[error("Failed to parse substitution rules: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Rule '{name}' has an invalid regex: {source}")]
    InvalidRegex {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("Rule '{0}' must define exactly one of `literal` or `pattern`")]
    AmbiguousRule(String),

    #[error("Rule '{0}' has an empty `from` value")]
    EmptyLiteral(String),
}

/// How a rule rewrites text
#[derive(Debug, Clone)]
enum Rewrite {
    Literal { from: String, to: String },
    Pattern { regex: Regex, replace: String },
    StripInvalidXmlChars,
    QuoteBareAttributeValues,
    EscapeBareAmpersands,
    CloseVoidElements,
}

/// A named rewrite rule
#[derive(Debug, Clone)]
pub struct SubstitutionRule {
    name: String,
    rewrite: Rewrite,
}

impl SubstitutionRule {
    /// Replace every occurrence of `from` with `to`
    pub fn literal(name: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rewrite: Rewrite::Literal {
                from: from.into(),
                to: to.into(),
            },
        }
    }

    /// Regex replacement; `replace` may reference groups as `$1` or `${name}`
    pub fn pattern(
        name: impl Into<String>,
        regex: &str,
        replace: impl Into<String>,
    ) -> Result<Self, SubstitutionError> {
        let name = name.into();
        let regex = Regex::new(regex).map_err(|source| SubstitutionError::InvalidRegex {
            name: name.clone(),
            source,
        })?;
        Ok(Self {
            name,
            rewrite: Rewrite::Pattern {
                regex,
                replace: replace.into(),
            },
        })
    }

    fn builtin(name: &str, rewrite: Rewrite) -> Self {
        Self {
            name: name.to_string(),
            rewrite,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Apply the rule, borrowing the input when nothing changes
    pub fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match &self.rewrite {
            Rewrite::Literal { from, to } => {
                if from.is_empty() || !text.contains(from.as_str()) {
                    Cow::Borrowed(text)
                } else {
                    Cow::Owned(text.replace(from.as_str(), to))
                }
            }
            Rewrite::Pattern { regex, replace } => regex.replace_all(text, replace.as_str()),
            Rewrite::StripInvalidXmlChars => {
                if text.chars().all(is_valid_xml_char) {
                    Cow::Borrowed(text)
                } else {
                    Cow::Owned(text.chars().filter(|&c| is_valid_xml_char(c)).collect())
                }
            }
            Rewrite::QuoteBareAttributeValues => quote_bare_attribute_values(text),
            Rewrite::EscapeBareAmpersands => AMPERSAND.replace_all(text, |caps: &Captures| {
                if caps.get(1).is_some() {
                    caps[0].to_string()
                } else {
                    "&amp;".to_string()
                }
            }),
            Rewrite::CloseVoidElements => close_void_elements(text),
        }
    }
}

/// Result of running a table over some text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substituted {
    pub text: String,
    /// Names of the rules that changed the text, in table order
    pub applied: Vec<String>,
}

/// Ordered list of substitution rules
#[derive(Debug, Clone)]
pub struct SubstitutionTable {
    rules: Vec<SubstitutionRule>,
}

impl Default for SubstitutionTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SubstitutionTable {
    /// The built-in rules, in application order
    pub fn builtin() -> Self {
        Self {
            rules: vec![
                SubstitutionRule::literal("nbsp", "\u{a0}", " "),
                SubstitutionRule::builtin("invalid-xml-chars", Rewrite::StripInvalidXmlChars),
                SubstitutionRule::builtin("unquoted-attributes", Rewrite::QuoteBareAttributeValues),
                SubstitutionRule::builtin(
                    "empty-attributes",
                    Rewrite::Pattern {
                        regex: EMPTY_ATTRIBUTE.clone(),
                        replace: String::new(),
                    },
                ),
                SubstitutionRule::builtin("bare-ampersands", Rewrite::EscapeBareAmpersands),
                SubstitutionRule::builtin("unclosed-void-elements", Rewrite::CloseVoidElements),
            ],
        }
    }

    /// A table with no rules
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule after the existing ones
    pub fn push(&mut self, rule: SubstitutionRule) {
        self.rules.push(rule);
    }

    /// Built-in rules followed by the rules defined in a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read substitution rules from {}", path.display()))?;
        let mut table = Self::builtin();
        table
            .extend_from_toml(&content)
            .with_context(|| format!("Invalid substitution rules in {}", path.display()))?;
        Ok(table)
    }

    /// Append rules parsed from TOML text
    pub fn extend_from_toml(&mut self, content: &str) -> Result<(), SubstitutionError> {
        let file: RuleFile = toml::from_str(content)?;
        for entry in file.rules {
            let rule = match (entry.literal, entry.pattern) {
                (Some(literal), None) => {
                    if literal.from.is_empty() {
                        return Err(SubstitutionError::EmptyLiteral(entry.name));
                    }
                    SubstitutionRule::literal(entry.name, literal.from, literal.to)
                }
                (None, Some(pattern)) => {
                    SubstitutionRule::pattern(entry.name, &pattern.regex, pattern.replace)?
                }
                _ => return Err(SubstitutionError::AmbiguousRule(entry.name)),
            };
            self.rules.push(rule);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.name())
    }

    /// Run every rule in order
    pub fn apply(&self, text: &str) -> Substituted {
        let mut current = text.to_string();
        let mut applied = Vec::new();
        for rule in &self.rules {
            if let Cow::Owned(rewritten) = rule.apply(&current) {
                if rewritten != current {
                    applied.push(rule.name.clone());
                    current = rewritten;
                }
            }
        }
        Substituted {
            text: current,
            applied,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(default, rename = "rule")]
    rules: Vec<RuleSpec>,
}

#[derive(Debug, Deserialize)]
struct RuleSpec {
    name: String,
    literal: Option<LiteralSpec>,
    pattern: Option<PatternSpec>,
}

#[derive(Debug, Deserialize)]
struct LiteralSpec {
    from: String,
    #[serde(default)]
    to: String,
}

#[derive(Debug, Deserialize)]
struct PatternSpec {
    regex: String,
    #[serde(default)]
    replace: String,
}

/// XML 1.0 Char production
fn is_valid_xml_char(c: char) -> bool {
    matches!(
        c as u32,
        0x09 | 0x0A | 0x0D | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x10000..=0x10FFFF
    )
}

/// `transform=scale(2)` becomes `transform="scale(2)"`
///
/// Only the inside of start tags is rewritten; text content, comments and
/// CDATA keep any `name=value` they contain. A trailing `/` directly before
/// `>` belongs to a self-closing tag, not to the value.
fn quote_bare_attribute_values(text: &str) -> Cow<'_, str> {
    let bytes = text.as_bytes();
    let mut out = String::new();
    let mut last = 0;
    let mut cursor = 0;

    while let Some(found) = text[cursor..].find('<') {
        let at = cursor + found;
        let starts_element = bytes
            .get(at + 1)
            .is_some_and(|b| b.is_ascii_alphabetic() || matches!(b, b'_' | b':'));
        if !starts_element {
            cursor = at + 1;
            continue;
        }

        let end = tag_end(bytes, at)
            .map(|end| end + 1)
            .or_else(|| text[at + 1..].find('<').map(|next| at + 1 + next))
            .unwrap_or(text.len());
        let tag = &text[at..end];

        for caps in BARE_ATTRIBUTE.captures_iter(tag) {
            let (Some(whole), Some(name), Some(value)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            let mut value_str = value.as_str();
            let mut suffix = "";
            if tag[whole.end()..].starts_with('>') {
                if let Some(stripped) = value_str.strip_suffix('/') {
                    value_str = stripped;
                    suffix = "/";
                }
            }
            if value_str.is_empty() {
                continue;
            }
            out.push_str(&text[last..at + whole.start()]);
            out.push_str(name.as_str());
            out.push_str("=\"");
            out.push_str(value_str);
            out.push('"');
            out.push_str(suffix);
            last = at + whole.end();
        }
        cursor = end;
    }

    if last == 0 {
        return Cow::Borrowed(text);
    }
    out.push_str(&text[last..]);
    Cow::Owned(out)
}

/// `<animate ...>` with no matching end tag becomes `<animate .../>`
///
/// An open tag keeps its form when its end tag appears before the next
/// open tag of the same element.
fn close_void_elements(text: &str) -> Cow<'_, str> {
    let mut out = String::new();
    let mut last = 0;

    for caps in VOID_OPEN_TAG.captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let tag = whole.as_str();
        if tag.ends_with("/>") {
            continue;
        }
        let name = name.as_str();
        let rest = &text[whole.end()..];
        let next_close = find_tag(rest, &format!("</{}", name));
        let next_open = find_tag(rest, &format!("<{}", name));
        let closed = match (next_close, next_open) {
            (Some(close), Some(open)) => close < open,
            (Some(_), None) => true,
            _ => false,
        };
        if closed {
            continue;
        }
        out.push_str(&text[last..whole.start()]);
        out.push_str(tag[..tag.len() - 1].trim_end());
        out.push_str("/>");
        last = whole.end();
    }

    if last == 0 && out.is_empty() {
        return Cow::Borrowed(text);
    }
    out.push_str(&text[last..]);
    Cow::Owned(out)
}

/// Offset of `prefix` followed by whitespace, `>` or `/`
fn find_tag(haystack: &str, prefix: &str) -> Option<usize> {
    let mut cursor = 0;
    while let Some(found) = haystack[cursor..].find(prefix) {
        let at = cursor + found;
        let boundary = haystack[at + prefix.len()..].chars().next();
        if matches!(boundary, None | Some('>' | '/')) || boundary.is_some_and(char::is_whitespace) {
            return Some(at);
        }
        cursor = at + prefix.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn rule(name: &str) -> SubstitutionRule {
        SubstitutionTable::builtin()
            .rules
            .into_iter()
            .find(|r| r.name == name)
            .unwrap()
    }

    #[test]
    fn test_builtin_order() {
        let table = SubstitutionTable::builtin();
        let names: Vec<&str> = table.names().collect();
        assert_eq!(
            names,
            [
                "nbsp",
                "invalid-xml-chars",
                "unquoted-attributes",
                "empty-attributes",
                "bare-ampersands",
                "unclosed-void-elements"
            ]
        );
    }

    #[test]
    fn test_quote_bare_attribute_values() {
        let r = rule("unquoted-attributes");
        assert_eq!(
            r.apply(r#"<g transform=scale(1.2) id="head">"#),
            r#"<g transform="scale(1.2)" id="head">"#
        );
        assert_eq!(r.apply("<rect x=5 y=6/>"), r#"<rect x="5" y="6"/>"#);
        assert_eq!(
            r.apply("<use xlink:href=#eye>"),
            r##"<use xlink:href="#eye">"##
        );
    }

    #[test]
    fn test_text_content_not_quoted() {
        let r = rule("unquoted-attributes");
        let text = "<svg><text>set x=5 now</text><!-- y=2 --><style><![CDATA[a b=c]]></style></svg>";
        assert!(matches!(r.apply(text), Cow::Borrowed(_)));
        assert_eq!(
            r.apply("<svg><rect width=10/><text>w=10</text></svg>"),
            r#"<svg><rect width="10"/><text>w=10</text></svg>"#
        );
    }

    #[test]
    fn test_quoted_values_untouched() {
        let r = rule("unquoted-attributes");
        let text = r#"<a href="x?a=b" title='t'><g class="c"/></a>"#;
        assert!(matches!(r.apply(text), Cow::Borrowed(_)));
    }

    #[test]
    fn test_empty_attributes_removed() {
        let r = rule("empty-attributes");
        assert_eq!(
            r.apply(r#"<animate attributeName="x" from="" to='' dur="1s"/>"#),
            r#"<animate attributeName="x" dur="1s"/>"#
        );
    }

    #[test]
    fn test_bare_ampersands_escaped() {
        let r = rule("bare-ampersands");
        assert_eq!(
            r.apply("<text>Tom & Jerry &amp; &#169; &#xA9; &lt;</text>"),
            "<text>Tom &amp; Jerry &amp; &#169; &#xA9; &lt;</text>"
        );
    }

    #[test]
    fn test_unclosed_void_elements() {
        let r = rule("unclosed-void-elements");
        assert_eq!(
            r.apply(r#"<circle><animate attributeName="r" dur="1s"></circle>"#),
            r#"<circle><animate attributeName="r" dur="1s"/></circle>"#
        );
        assert_eq!(
            r.apply(r#"<linearGradient><stop offset="0"><stop offset="1"></stop></linearGradient>"#),
            r#"<linearGradient><stop offset="0"/><stop offset="1"></stop></linearGradient>"#
        );
    }

    #[test]
    fn test_paired_void_elements_kept() {
        let r = rule("unclosed-void-elements");
        let text = r#"<animate dur="1s"><desc>d</desc></animate><set to="1" /><settings>"#;
        assert!(matches!(r.apply(text), Cow::Borrowed(_)));
    }

    #[test]
    fn test_invalid_chars_stripped() {
        let r = rule("invalid-xml-chars");
        assert_eq!(r.apply("<g>\u{7}a\u{c}b\tc</g>"), "<g>ab\tc</g>");
    }

    #[test]
    fn test_table_reports_applied_rules() {
        let table = SubstitutionTable::builtin();
        let result = table.apply("<svg>\u{a0}<rect width=10 fill=\"\"/></svg>");
        assert_eq!(result.text, r#"<svg> <rect width="10"/></svg>"#);
        assert_eq!(result.applied, ["nbsp", "unquoted-attributes", "empty-attributes"]);
    }

    #[test]
    fn test_table_is_idempotent() {
        let table = SubstitutionTable::builtin();
        let messy = "<svg width=100\u{a0}height=\"\">\
                     <g transform=translate(5,5)><stop offset=\"0\">\
                     <text>A & B</text><animate attributeName=\"r\" dur=\"1s\"></g></svg>";
        let once = table.apply(messy);
        let twice = table.apply(&once.text);
        assert_eq!(twice.text, once.text);
        assert!(twice.applied.is_empty());
    }

    #[test]
    fn test_extend_from_toml() {
        let mut table = SubstitutionTable::builtin();
        table
            .extend_from_toml(
                r#"
                [[rule]]
                name = "strip-comments"
                pattern = { regex = '(?s)<!--.*?-->', replace = "" }

                [[rule]]
                name = "nbsp-entity"
                literal = { from = "&nbsp;", to = "&#160;" }
                "#,
            )
            .unwrap();
        assert_eq!(table.len(), 8);
        let result = table.apply("<svg><!-- note --><text>a&nbsp;b</text></svg>");
        assert_eq!(result.text, "<svg><text>a&#160;b</text></svg>");
        assert_eq!(result.applied, ["strip-comments", "nbsp-entity"]);
    }

    #[test]
    fn test_rule_must_be_literal_or_pattern() {
        let mut table = SubstitutionTable::empty();
        let err = table
            .extend_from_toml("[[rule]]\nname = \"nothing\"\n")
            .unwrap_err();
        assert!(matches!(err, SubstitutionError::AmbiguousRule(name) if name == "nothing"));
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let mut table = SubstitutionTable::empty();
        let err = table
            .extend_from_toml("[[rule]]\nname = \"bad\"\npattern = { regex = \"(\" }\n")
            .unwrap_err();
        assert!(matches!(err, SubstitutionError::InvalidRegex { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [[rule]]
            name = "serif-ids"
            pattern = {{ regex = '\sserif:id="[^"]*"', replace = "" }}
            "#
        )
        .unwrap();
        file.flush().unwrap();

        let table = SubstitutionTable::load(file.path()).unwrap();
        assert_eq!(table.names().last(), Some("serif-ids"));
        let result = table.apply(r#"<g id="a" serif:id="Auge links"/>"#);
        assert_eq!(result.text, r#"<g id="a"/>"#);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(SubstitutionTable::load("/nonexistent/rules.toml").is_err());
    }
}
