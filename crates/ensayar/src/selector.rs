//! Selector abstraction for addressing DOM elements.
//!
//! Selectors describe *what* to find; all waiting and retrying lives in the
//! action driver. Each variant knows how to render itself as a JavaScript
//! expression evaluating to the matched element (or `null`), plus the
//! probe/count/interaction wrappers built on top of that expression.

use serde::{Deserialize, Serialize};

/// Selector for locating an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// CSS selector (e.g. `#email`, `[type="submit"]`)
    Css(String),
    /// Deepest element whose own text contains the needle.
    ///
    /// The depth rule matters: without it every ancestor up to `<html>`
    /// also "contains" the text and a click would land on the wrong node.
    Text(String),
    /// First element matching the CSS selector whose text contains the needle
    CssWithText {
        /// Base CSS selector
        css: String,
        /// Text content to match
        text: String,
    },
    /// Descendant lookup scoped to a text-matched host.
    ///
    /// The catalog-card pattern: "the details button inside the card whose
    /// text contains this title".
    DescendantOfText {
        /// CSS selector for candidate hosts
        scope: String,
        /// Text the host must contain
        text: String,
        /// CSS selector resolved inside the matched host
        descendant: String,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create a CSS selector filtered by text content
    #[must_use]
    pub fn css_with_text(css: impl Into<String>, text: impl Into<String>) -> Self {
        Self::CssWithText {
            css: css.into(),
            text: text.into(),
        }
    }

    /// Create a descendant selector scoped to a text-matched host
    #[must_use]
    pub fn within_text(
        scope: impl Into<String>,
        text: impl Into<String>,
        descendant: impl Into<String>,
    ) -> Self {
        Self::DescendantOfText {
            scope: scope.into(),
            text: text.into(),
            descendant: descendant.into(),
        }
    }

    /// JavaScript expression evaluating to the matched element or `null`
    #[must_use]
    pub fn to_element_js(&self) -> String {
        match self {
            Self::Css(s) => format!("document.querySelector({s:?})"),
            Self::Text(t) => format!(
                "(() => {{ \
                 const hit = Array.from(document.querySelectorAll('*')).filter(el => \
                 el.textContent.includes({t:?}) && \
                 !Array.from(el.children).some(c => c.textContent.includes({t:?}))); \
                 return hit.length ? hit[0] : null; }})()"
            ),
            Self::CssWithText { css, text } => format!(
                "(Array.from(document.querySelectorAll({css:?})).find(el => \
                 el.textContent.includes({text:?})) || null)"
            ),
            Self::DescendantOfText {
                scope,
                text,
                descendant,
            } => format!(
                "(() => {{ \
                 const host = Array.from(document.querySelectorAll({scope:?})).find(el => \
                 el.textContent.includes({text:?})); \
                 return host ? host.querySelector({descendant:?}) : null; }})()"
            ),
        }
    }

    /// JavaScript expression counting matches
    #[must_use]
    pub fn to_count_js(&self) -> String {
        match self {
            Self::Css(s) => format!("document.querySelectorAll({s:?}).length"),
            Self::Text(t) => format!(
                "Array.from(document.querySelectorAll('*')).filter(el => \
                 el.textContent.includes({t:?}) && \
                 !Array.from(el.children).some(c => c.textContent.includes({t:?}))).length"
            ),
            Self::CssWithText { css, text } => format!(
                "Array.from(document.querySelectorAll({css:?})).filter(el => \
                 el.textContent.includes({text:?})).length"
            ),
            Self::DescendantOfText { .. } => {
                format!("({} ? 1 : 0)", self.to_element_js())
            }
        }
    }

    /// JavaScript returning a `{found, visible, text}` probe object
    #[must_use]
    pub fn to_probe_js(&self) -> String {
        format!(
            "(() => {{ \
             const el = {expr}; \
             if (!el) {{ return {{ found: false, visible: false, text: '' }}; }} \
             const style = window.getComputedStyle(el); \
             const visible = style.display !== 'none' && style.visibility !== 'hidden' \
             && el.getClientRects().length > 0; \
             return {{ found: true, visible, text: (el.textContent || '').trim() }}; }})()",
            expr = self.to_element_js()
        )
    }

    /// JavaScript clicking the element; returns whether it resolved
    #[must_use]
    pub fn to_click_js(&self) -> String {
        format!(
            "(() => {{ \
             const el = {expr}; \
             if (!el) {{ return false; }} \
             el.click(); \
             return true; }})()",
            expr = self.to_element_js()
        )
    }

    /// JavaScript filling the element and dispatching input/change events
    #[must_use]
    pub fn to_fill_js(&self, value: &str) -> String {
        format!(
            "(() => {{ \
             const el = {expr}; \
             if (!el) {{ return false; }} \
             el.focus(); \
             el.value = {value:?}; \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
             return true; }})()",
            expr = self.to_element_js()
        )
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css={s}"),
            Self::Text(t) => write!(f, "text={t}"),
            Self::CssWithText { css, text } => write!(f, "css={css}[has-text={text}]"),
            Self::DescendantOfText {
                scope,
                text,
                descendant,
            } => write!(f, "css={scope}[has-text={text}] >> css={descendant}"),
        }
    }
}

/// Result of a one-shot element probe
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementProbe {
    /// Whether the selector resolved
    pub found: bool,
    /// Whether the element is rendered and visible
    pub visible: bool,
    /// Trimmed text content
    #[serde(default)]
    pub text: String,
}

impl ElementProbe {
    /// Probe for an absent element
    #[must_use]
    pub fn absent() -> Self {
        Self::default()
    }

    /// Probe for a visible element with the given text
    #[must_use]
    pub fn visible(text: impl Into<String>) -> Self {
        Self {
            found: true,
            visible: true,
            text: text.into(),
        }
    }

    /// Probe for an element present in the DOM but not rendered
    #[must_use]
    pub fn hidden(text: impl Into<String>) -> Self {
        Self {
            found: true,
            visible: false,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_element_js() {
        let sel = Selector::css("#email");
        assert_eq!(sel.to_element_js(), "document.querySelector(\"#email\")");
    }

    #[test]
    fn test_text_deepest_match() {
        let sel = Selector::text("Register");
        let js = sel.to_element_js();
        // Ancestors containing the text through a child must be excluded.
        assert!(js.contains("!Array.from(el.children).some"));
        assert!(js.contains("\"Register\""));
    }

    #[test]
    fn test_quotes_are_escaped() {
        let sel = Selector::css_with_text(".card", "say \"hi\"");
        let js = sel.to_element_js();
        assert!(js.contains("\\\"hi\\\""));
    }

    #[test]
    fn test_descendant_count_is_binary() {
        let sel = Selector::within_text(".allGames .allGames-info", "Random title", ".details-button");
        let js = sel.to_count_js();
        assert!(js.ends_with("? 1 : 0)"));
    }

    #[test]
    fn test_fill_dispatches_events() {
        let sel = Selector::css("[name=\"title\"]");
        let js = sel.to_fill_js("Random title");
        assert!(js.contains("new Event('input'"));
        assert!(js.contains("new Event('change'"));
        assert!(js.contains("\"Random title\""));
    }

    #[test]
    fn test_display_is_stable() {
        assert_eq!(Selector::css("form").to_string(), "css=form");
        assert_eq!(Selector::text("Logout").to_string(), "text=Logout");
        assert_eq!(
            Selector::css_with_text("nav", "All games").to_string(),
            "css=nav[has-text=All games]"
        );
    }

    #[test]
    fn test_probe_roundtrip() {
        let probe: ElementProbe =
            serde_json::from_str(r#"{"found":true,"visible":false,"text":"Login"}"#).unwrap();
        assert_eq!(probe, ElementProbe::hidden("Login"));
    }
}
