use crate::errors::{FlowError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Location strategy for one interactive element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum By {
    Id,
    Css,
    XPath,
}

/// Strategy + selector pair identifying one element on a page.
///
/// Defined once per field at page-definition time and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    pub by: By,
    pub selector: String,
}

impl Locator {
    pub fn id(selector: impl Into<String>) -> Self {
        Self {
            by: By::Id,
            selector: selector.into(),
        }
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Self {
            by: By::Css,
            selector: selector.into(),
        }
    }

    pub fn xpath(selector: impl Into<String>) -> Self {
        Self {
            by: By::XPath,
            selector: selector.into(),
        }
    }

    /// CSS form of this locator, when it has one. Id locators are rewritten
    /// as attribute selectors so ids are never interpolated unescaped.
    pub fn as_css(&self) -> Option<String> {
        match self.by {
            By::Id => Some(format!("[id=\"{}\"]", self.selector)),
            By::Css => Some(self.selector.clone()),
            By::XPath => None,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.by {
            By::Id => write!(f, "id={}", self.selector),
            By::Css => write!(f, "css={}", self.selector),
            By::XPath => write!(f, "xpath={}", self.selector),
        }
    }
}

/// Named collection of locators for one page.
///
/// Field names must be unique within a page; registering a duplicate is a
/// programmer error and panics at page-definition time.
#[derive(Debug, Clone, Default)]
pub struct FieldSet {
    page: &'static str,
    fields: HashMap<String, Locator>,
}

impl FieldSet {
    pub fn new(page: &'static str) -> Self {
        Self {
            page,
            fields: HashMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, locator: Locator) -> Self {
        let name = name.into();
        let previous = self.fields.insert(name.clone(), locator);
        assert!(
            previous.is_none(),
            "duplicate field '{}' on page '{}'",
            name,
            self.page
        );
        self
    }

    pub fn get(&self, name: &str) -> Result<&Locator> {
        self.fields
            .get(name)
            .ok_or_else(|| FlowError::UnknownField(format!("{}.{}", self.page, name)))
    }

    pub fn page(&self) -> &'static str {
        self.page
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_locators_become_attribute_selectors() {
        let locator = Locator::id("username-1205");
        assert_eq!(locator.as_css().unwrap(), "[id=\"username-1205\"]");
    }

    #[test]
    fn xpath_has_no_css_form() {
        let locator = Locator::xpath("//div[contains(@class,'um-field-error')]");
        assert!(locator.as_css().is_none());
    }

    #[test]
    fn display_names_the_strategy() {
        assert_eq!(Locator::id("um-submit-btn").to_string(), "id=um-submit-btn");
        assert_eq!(Locator::css(".error").to_string(), "css=.error");
    }

    #[test]
    fn field_set_lookup() {
        let fields = FieldSet::new("login")
            .with("identifier", Locator::id("username-1205"))
            .with("password", Locator::id("user_password-1205"));
        assert_eq!(fields.len(), 2);
        assert_eq!(
            fields.get("identifier").unwrap(),
            &Locator::id("username-1205")
        );
    }

    #[test]
    fn unknown_field_is_an_error() {
        let fields = FieldSet::new("login").with("identifier", Locator::id("username-1205"));
        let err = fields.get("missing").unwrap_err();
        assert!(matches!(err, FlowError::UnknownField(name) if name == "login.missing"));
    }

    #[test]
    #[should_panic(expected = "duplicate field 'identifier' on page 'login'")]
    fn duplicate_field_panics() {
        let _ = FieldSet::new("login")
            .with("identifier", Locator::id("a"))
            .with("identifier", Locator::id("b"));
    }
}
