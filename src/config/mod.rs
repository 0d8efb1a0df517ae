use std::{borrow::Cow, io::ErrorKind, path::Path, time::Duration};

use anyhow::Context;
use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;
use validator::{Validate, ValidationError};

use crate::listing::Field;


/// Everything the scraper needs to know about the job portal and the run.
#[derive(Debug, Deserialize, Validate)]
#[serde(default)]
pub(crate) struct Config {
    #[validate]
    pub(crate) site: SiteConfig,
    #[validate]
    pub(crate) browser: BrowserConfig,
    pub(crate) output: OutputConfig,
    /// How each listing column is read from a result card.
    #[validate(custom = "validate_fields")]
    pub(crate) fields: Vec<FieldSpec>,
}


/// Where the portal lives and how its result pages are laid out.
#[derive(Debug, Deserialize, Validate)]
#[serde(default)]
pub(crate) struct SiteConfig {
    pub(crate) home_url: Url,
    /// The search box on the home page.
    #[validate(custom = "validate_selector")]
    pub(crate) search_input: String,
    /// The label holding the total number of results, e.g. "1 - 20 of 47".
    #[validate(custom = "validate_selector")]
    pub(crate) results_count: String,
    /// One element per job listing on a results page.
    #[validate(custom = "validate_selector")]
    pub(crate) card: String,
    /// Query pairs appended to the search URL before paging through it.
    pub(crate) query_filters: Vec<(String, String)>,
    #[validate(range(min = 1))]
    pub(crate) page_size: usize,
}


#[derive(Debug, Deserialize, Validate)]
#[serde(default)]
pub(crate) struct BrowserConfig {
    pub(crate) headless: bool,
    pub(crate) sandbox: bool,
    pub(crate) user_agent: Option<String>,
    /// Upper bound on waiting for an element to appear.
    #[validate(range(min = 1))]
    pub(crate) wait_timeout_secs: u64,
    /// Chrome is dropped after this long without traffic. Keep it well above
    /// the time a user may spend answering prompts.
    #[validate(range(min = 1))]
    pub(crate) idle_timeout_secs: u64,
}


#[derive(Debug, Deserialize)]
#[serde(default)]
pub(crate) struct OutputConfig {
    pub(crate) path: String,
    /// Drop listings identical to one already collected.
    pub(crate) dedupe: bool,
}


/// How to read one listing column from a result card.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub(crate) struct FieldSpec {
    #[serde(rename = "name")]
    pub(crate) field: Field,
    /// CSS selector scoped to the card.
    pub(crate) locator: String,
    /// Read this attribute instead of the element's text.
    #[serde(default)]
    pub(crate) attribute: Option<String>,
    /// Value used when the card has no element matching `locator`.
    #[serde(default)]
    pub(crate) default: Option<String>,
}


impl FieldSpec {
    fn new(field: Field, locator: &str) -> Self {
        Self { field, locator: locator.to_string(), attribute: None, default: None }
    }

    fn with_attribute(mut self, attribute: &str) -> Self {
        self.attribute = Some(attribute.to_string());
        self
    }

    pub(crate) fn default_value(&self) -> &str {
        self.default.as_deref().unwrap_or(self.field.fallback())
    }
}


impl Default for Config {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            browser: BrowserConfig::default(),
            output: OutputConfig::default(),
            fields: default_fields(),
        }
    }
}


impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            home_url: Url::parse("https://www.naukri.com/").expect("Default home URL should be valid"),
            search_input: "input.suggestor-input".to_string(),
            results_count: ".styles_h1-wrapper__mHVA1 .styles_count-string__DlPaZ".to_string(),
            card: "div[class*='srp-jobtuple-wrapper']".to_string(),
            query_filters: vec![
                ("jobAge".to_string(), "3".to_string()),
                ("experience".to_string(), "0".to_string()),
            ],
            page_size: 20,
        }
    }
}


impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: true,
            user_agent: Some(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36"
                    .to_string(),
            ),
            wait_timeout_secs: 10,
            idle_timeout_secs: 600,
        }
    }
}


impl BrowserConfig {
    pub(crate) fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub(crate) fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}


impl Default for OutputConfig {
    fn default() -> Self {
        Self { path: "job_listings.csv".to_string(), dedupe: false }
    }
}


pub(crate) fn default_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new(Field::Title, "a.title"),
        FieldSpec::new(Field::Reference, "a.title").with_attribute("href"),
        FieldSpec::new(Field::Company, "a.comp-name"),
        FieldSpec::new(Field::Experience, "span.expwdth"),
        FieldSpec::new(Field::Salary, "span.sal-wrap"),
        FieldSpec::new(Field::Location, "span.locwdth"),
        FieldSpec::new(Field::Description, "span.job-desc"),
        FieldSpec::new(Field::Skills, "ul.tags-gt"),
        FieldSpec::new(Field::Posted, "span.job-post-day"),
    ]
}


impl Config {
    /// Reads and validates `path`, falling back to the built-in portal layout
    /// when the file does not exist.
    pub(crate) fn load(path: &Path) -> anyhow::Result<Self> {
        let config = match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text).with_context(|| format!("Failed to read {}", path.display()))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("{} not found, using the built-in configuration", path.display());
                let config = Self::default();
                config.validate()?;
                config
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to open {}", path.display())),
        };
        Ok(config)
    }

    pub(crate) fn parse(text: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}


fn validation_error(code: &'static str, message: String) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Owned(message));
    error
}


fn validate_selector(locator: &str) -> Result<(), ValidationError> {
    scraper::Selector::parse(locator)
        .map(|_| ())
        .map_err(|e| validation_error("selector", format!("`{locator}` is not a CSS selector: {e:?}")))
}


fn validate_fields(fields: &[FieldSpec]) -> Result<(), ValidationError> {
    let mut seen = FxHashSet::default();
    for spec in fields {
        if !seen.insert(spec.field) {
            return Err(validation_error(
                "duplicate_field",
                format!("`{}` is configured more than once", spec.field.header()),
            ));
        }
        validate_selector(&spec.locator)?;
    }
    if let Some(missing) = Field::ALL.iter().find(|field| !seen.contains(*field)) {
        return Err(validation_error(
            "missing_field",
            format!("`{}` has no locator", missing.header()),
        ));
    }
    Ok(())
}
