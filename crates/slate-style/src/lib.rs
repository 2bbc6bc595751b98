//! # Slate Style
//!
//! Selector parsing, a minimal stylesheet AST, and theme custom properties
//! for the Slate UI engine.
//!
//! ## Design Goals
//!
//! 1. **Simple selectors**: parse compound selectors of tag, `#id`, `.class`,
//!    and `[attr]`/`[attr=value]` parts — the forms delegated handler maps use
//! 2. **Stylesheet AST**: parse basic rules `selector { prop: value; }`
//! 3. **Theme properties**: resolve `--custom-property` declarations on
//!    `:root` into spacing and duration values for overlay sizing math

use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while parsing selectors or stylesheets.
#[derive(Error, Debug, Clone)]
pub enum StyleError {
    #[error("Unexpected end of input")]
    UnexpectedEof,

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Unsupported selector: {0}")]
    UnsupportedSelector(String),
}

// ==================== Selectors ====================

/// An attribute matcher inside a selector: `[name]` or `[name=value]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrMatcher {
    pub name: String,
    /// None means presence-only matching.
    pub value: Option<String>,
}

/// A parsed compound simple selector.
///
/// Combinators (descendant, `>`, `+`, `~`) are not supported: delegated
/// dispatch matches one element at a time while walking the ancestor chain,
/// so only per-element tests are needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<AttrMatcher>,
    raw: String,
}

impl Selector {
    /// Parse a selector string.
    pub fn parse(input: &str) -> Result<Self, StyleError> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err(StyleError::ParseError("empty selector".into()));
        }
        if raw.chars().any(|c| matches!(c, ' ' | '>' | '+' | '~' | ',')) {
            return Err(StyleError::UnsupportedSelector(raw.to_string()));
        }

        let mut sel = Selector {
            tag: None,
            id: None,
            classes: Vec::new(),
            attrs: Vec::new(),
            raw: raw.to_string(),
        };

        let mut chars = raw.chars().peekable();

        // Leading tag name, if any.
        if matches!(chars.peek(), Some(c) if c.is_ascii_alphabetic() || *c == '*') {
            let mut tag = String::new();
            while let Some(&c) = chars.peek() {
                if c == '#' || c == '.' || c == '[' {
                    break;
                }
                tag.push(c);
                chars.next();
            }
            if tag != "*" {
                sel.tag = Some(tag.to_ascii_lowercase());
            }
        }

        while let Some(c) = chars.next() {
            match c {
                '#' => {
                    let ident = take_ident(&mut chars);
                    if ident.is_empty() {
                        return Err(StyleError::ParseError(format!("bad id in '{raw}'")));
                    }
                    sel.id = Some(ident);
                }
                '.' => {
                    let ident = take_ident(&mut chars);
                    if ident.is_empty() {
                        return Err(StyleError::ParseError(format!("bad class in '{raw}'")));
                    }
                    sel.classes.push(ident);
                }
                '[' => {
                    let mut inner = String::new();
                    let mut closed = false;
                    for cc in chars.by_ref() {
                        if cc == ']' {
                            closed = true;
                            break;
                        }
                        inner.push(cc);
                    }
                    if !closed {
                        return Err(StyleError::UnexpectedEof);
                    }
                    sel.attrs.push(parse_attr_matcher(&inner, raw)?);
                }
                _ => {
                    return Err(StyleError::ParseError(format!(
                        "unexpected '{c}' in selector '{raw}'"
                    )));
                }
            }
        }

        if sel.tag.is_none() && sel.id.is_none() && sel.classes.is_empty() && sel.attrs.is_empty() {
            return Err(StyleError::ParseError(format!("empty selector '{raw}'")));
        }

        Ok(sel)
    }

    /// The original selector text.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Test this selector against element data supplied by the caller.
    ///
    /// `classes` is the element's space-separated class attribute.
    pub fn matches_parts(
        &self,
        tag: Option<&str>,
        id: Option<&str>,
        classes: Option<&str>,
        attr: impl Fn(&str) -> Option<String>,
    ) -> bool {
        if let Some(ref want) = self.tag {
            match tag {
                Some(t) if t.eq_ignore_ascii_case(want) => {}
                _ => return false,
            }
        }
        if let Some(ref want) = self.id {
            if id != Some(want.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let Some(class_attr) = classes else {
                return false;
            };
            for want in &self.classes {
                if !class_attr.split_whitespace().any(|c| c == want) {
                    return false;
                }
            }
        }
        for matcher in &self.attrs {
            match attr(&matcher.name) {
                Some(actual) => {
                    if let Some(ref want) = matcher.value {
                        if &actual != want {
                            return false;
                        }
                    }
                }
                None => return false,
            }
        }
        true
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

fn take_ident(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut ident = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            ident.push(c);
            chars.next();
        } else {
            break;
        }
    }
    ident
}

fn parse_attr_matcher(inner: &str, raw: &str) -> Result<AttrMatcher, StyleError> {
    let inner = inner.trim();
    if inner.is_empty() {
        return Err(StyleError::ParseError(format!("empty attr in '{raw}'")));
    }
    match inner.split_once('=') {
        Some((name, value)) => {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            Ok(AttrMatcher {
                name: name.trim().to_string(),
                value: Some(value.to_string()),
            })
        }
        None => Ok(AttrMatcher {
            name: inner.to_string(),
            value: None,
        }),
    }
}

// ==================== Stylesheet AST ====================

/// A parsed stylesheet AST.
#[derive(Debug, Default, Clone)]
pub struct StylesheetAst {
    pub rules: Vec<RuleAst>,
}

/// A parsed rule AST.
#[derive(Debug, Clone)]
pub struct RuleAst {
    pub selector: String,
    pub declarations: Vec<DeclarationAst>,
}

/// A parsed declaration AST.
#[derive(Debug, Clone)]
pub struct DeclarationAst {
    pub property: String,
    pub value: String,
    pub important: bool,
}

/// Parse a stylesheet into an AST.
///
/// Notes:
/// - This is not a full CSS parser.
/// - It does not support nested rules (`@media`, `@supports`).
/// - It attempts to be robust for the editor's chrome stylesheets.
pub fn parse_stylesheet(css: &str) -> Result<StylesheetAst, StyleError> {
    let mut out = StylesheetAst::default();

    let mut current_selector = String::new();
    let mut current_property = String::new();
    let mut current_value = String::new();
    let mut current_decls: Vec<DeclarationAst> = Vec::new();

    let mut in_block = false;
    let mut in_value = false;

    let mut chars = css.chars().peekable();
    while let Some(c) = chars.next() {
        // Very small comment skipper: /* ... */
        if c == '/' && chars.peek() == Some(&'*') {
            chars.next();
            while let Some(cc) = chars.next() {
                if cc == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    break;
                }
            }
            continue;
        }

        if !in_block {
            if c == '{' {
                in_block = true;
                current_selector = current_selector.trim().to_string();
                current_property.clear();
                current_value.clear();
                current_decls.clear();
                in_value = false;
            } else {
                current_selector.push(c);
            }
            continue;
        }

        // In block
        if c == '}' {
            flush_decl(&mut current_property, &mut current_value, &mut current_decls);
            let selector = current_selector.trim().to_string();
            if !selector.is_empty() && !current_decls.is_empty() {
                out.rules.push(RuleAst {
                    selector,
                    declarations: current_decls.clone(),
                });
            }

            // reset for next rule
            in_block = false;
            current_selector.clear();
            current_property.clear();
            current_value.clear();
            current_decls.clear();
            in_value = false;
            continue;
        }

        if !in_value {
            if c == ':' {
                in_value = true;
            } else {
                current_property.push(c);
            }
            continue;
        }

        // In value
        if c == ';' {
            flush_decl(&mut current_property, &mut current_value, &mut current_decls);
            in_value = false;
            continue;
        }

        current_value.push(c);
    }

    if in_block {
        // Unclosed block.
        return Err(StyleError::UnexpectedEof);
    }

    Ok(out)
}

fn flush_decl(
    current_property: &mut String,
    current_value: &mut String,
    decls: &mut Vec<DeclarationAst>,
) {
    let property = current_property.trim();
    let value_raw = current_value.trim();
    if property.is_empty() || value_raw.is_empty() {
        current_property.clear();
        current_value.clear();
        return;
    }

    let (value, important) = strip_important(value_raw);
    decls.push(DeclarationAst {
        property: property.to_string(),
        value: value.to_string(),
        important,
    });

    current_property.clear();
    current_value.clear();
}

fn strip_important(value: &str) -> (&str, bool) {
    let lower = value.to_ascii_lowercase();
    if let Some(idx) = lower.rfind("!important") {
        let before = value[..idx].trim_end();
        (before, true)
    } else {
        (value, false)
    }
}

// ==================== Theme ====================

/// Theme custom properties resolved from `:root` rules.
///
/// The overlay layer reads spacing and transition timings from here so the
/// chrome stylesheet stays the single source of truth for those values.
#[derive(Debug, Default, Clone)]
pub struct Theme {
    vars: HashMap<String, String>,
}

impl Theme {
    /// Create an empty theme.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a theme from every `--custom-property` declared on `:root`.
    pub fn from_stylesheet(ast: &StylesheetAst) -> Self {
        let mut vars = HashMap::new();
        for rule in &ast.rules {
            if rule.selector != ":root" {
                continue;
            }
            for decl in &rule.declarations {
                if let Some(name) = decl.property.strip_prefix("--") {
                    vars.insert(name.to_string(), decl.value.clone());
                }
            }
        }
        tracing::debug!(count = vars.len(), "Theme custom properties resolved");
        Self { vars }
    }

    /// Set a variable directly (used by tests and config overrides).
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Raw variable lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(|s| s.as_str())
    }

    /// Resolve a pixel length (`"20px"`, `"20"`), falling back when missing
    /// or malformed.
    pub fn length_px(&self, name: &str, fallback: f64) -> f64 {
        match self.vars.get(name) {
            Some(v) => parse_px(v).unwrap_or(fallback),
            None => fallback,
        }
    }

    /// Resolve a duration (`"150ms"`, `"0.15s"`), falling back when missing
    /// or malformed.
    pub fn duration(&self, name: &str, fallback: Duration) -> Duration {
        match self.vars.get(name).and_then(|v| parse_duration(v)) {
            Some(d) => d,
            None => fallback,
        }
    }

    /// Resolve a unitless scale factor.
    pub fn scale(&self, name: &str, fallback: f64) -> f64 {
        match self.vars.get(name) {
            Some(v) => v.trim().parse().unwrap_or(fallback),
            None => fallback,
        }
    }
}

fn parse_px(value: &str) -> Option<f64> {
    let v = value.trim();
    let v = v.strip_suffix("px").unwrap_or(v);
    v.trim().parse().ok()
}

fn parse_duration(value: &str) -> Option<Duration> {
    let v = value.trim();
    if let Some(ms) = v.strip_suffix("ms") {
        let ms: f64 = ms.trim().parse().ok()?;
        return Some(Duration::from_secs_f64(ms / 1000.0));
    }
    if let Some(s) = v.strip_suffix('s') {
        let s: f64 = s.trim().parse().ok()?;
        return Some(Duration::from_secs_f64(s));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tag_selector() {
        let sel = Selector::parse("button").unwrap();
        assert_eq!(sel.tag.as_deref(), Some("button"));
        assert!(sel.id.is_none());
        assert!(sel.classes.is_empty());
    }

    #[test]
    fn parse_compound_selector() {
        let sel = Selector::parse("li.tab[data-asset-id]").unwrap();
        assert_eq!(sel.tag.as_deref(), Some("li"));
        assert_eq!(sel.classes, vec!["tab".to_string()]);
        assert_eq!(sel.attrs.len(), 1);
        assert_eq!(sel.attrs[0].name, "data-asset-id");
        assert!(sel.attrs[0].value.is_none());
    }

    #[test]
    fn parse_attr_value_selector() {
        let sel = Selector::parse("[data-kind=\"layer\"]").unwrap();
        assert_eq!(sel.attrs[0].value.as_deref(), Some("layer"));
    }

    #[test]
    fn reject_combinators() {
        assert!(matches!(
            Selector::parse(".panel .row"),
            Err(StyleError::UnsupportedSelector(_))
        ));
        assert!(matches!(
            Selector::parse("ul > li"),
            Err(StyleError::UnsupportedSelector(_))
        ));
    }

    #[test]
    fn matches_parts_classes_and_attrs() {
        let sel = Selector::parse(".tab.active[data-tab=sprites]").unwrap();
        let attrs: HashMap<&str, &str> = [("data-tab", "sprites")].into_iter().collect();
        let lookup = |name: &str| attrs.get(name).map(|v| v.to_string());

        assert!(sel.matches_parts(Some("li"), None, Some("tab active"), lookup));
        assert!(!sel.matches_parts(Some("li"), None, Some("tab"), lookup));
    }

    #[test]
    fn parse_simple_stylesheet() {
        let css = r#"
            body { color: black; }
            .container { width: 100%; height: 10px !important; }
        "#;
        let ast = parse_stylesheet(css).unwrap();
        assert_eq!(ast.rules.len(), 2);
        assert_eq!(ast.rules[0].selector, "body");
        assert_eq!(ast.rules[0].declarations.len(), 1);
        assert_eq!(ast.rules[1].selector, ".container");
        assert_eq!(ast.rules[1].declarations.len(), 2);
        assert!(ast.rules[1].declarations[1].important);
    }

    #[test]
    fn parse_with_comments() {
        let css = r#"
            /* comment */
            body { color: black; /* inside */ width: 10px; }
        "#;
        let ast = parse_stylesheet(css).unwrap();
        assert_eq!(ast.rules.len(), 1);
        assert_eq!(ast.rules[0].declarations.len(), 2);
    }

    #[test]
    fn unclosed_block_is_error() {
        let css = "body { color: black;";
        let err = parse_stylesheet(css).unwrap_err();
        assert!(matches!(err, StyleError::UnexpectedEof));
    }

    #[test]
    fn theme_from_root_rule() {
        let css = r#"
            :root {
                --menu-margin: 20px;
                --menu-close-ms: 150ms;
                --panel-scale: 1.25;
            }
            .menu { color: black; }
        "#;
        let ast = parse_stylesheet(css).unwrap();
        let theme = Theme::from_stylesheet(&ast);

        assert_eq!(theme.length_px("menu-margin", 0.0), 20.0);
        assert_eq!(
            theme.duration("menu-close-ms", Duration::ZERO),
            Duration::from_millis(150)
        );
        assert_eq!(theme.scale("panel-scale", 1.0), 1.25);
    }

    #[test]
    fn theme_fallbacks() {
        let theme = Theme::new();
        assert_eq!(theme.length_px("missing", 12.0), 12.0);
        assert_eq!(
            theme.duration("missing", Duration::from_millis(150)),
            Duration::from_millis(150)
        );
    }
}
