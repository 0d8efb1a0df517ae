use std::fmt::Write;

use fxhash::FxHashSet;
use serde::{Deserialize, Serialize, Serializer};


/// The fixed set of columns every job listing carries, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub(crate) enum Field {
    #[serde(rename = "Title")]
    Title,
    #[serde(rename = "Reference")]
    Reference,
    #[serde(rename = "Company")]
    Company,
    #[serde(rename = "Experience")]
    Experience,
    #[serde(rename = "Salary")]
    Salary,
    #[serde(rename = "Location")]
    Location,
    #[serde(rename = "Job Description")]
    Description,
    #[serde(rename = "Skills Required")]
    Skills,
    #[serde(rename = "Posted Date")]
    Posted,
}


impl Field {
    pub(crate) const ALL: [Field; 9] = [
        Field::Title,
        Field::Reference,
        Field::Company,
        Field::Experience,
        Field::Salary,
        Field::Location,
        Field::Description,
        Field::Skills,
        Field::Posted,
    ];

    /// Column name used in the CSV header and in configuration files.
    pub(crate) const fn header(self) -> &'static str {
        match self {
            Field::Title => "Title",
            Field::Reference => "Reference",
            Field::Company => "Company",
            Field::Experience => "Experience",
            Field::Salary => "Salary",
            Field::Location => "Location",
            Field::Description => "Job Description",
            Field::Skills => "Skills Required",
            Field::Posted => "Posted Date",
        }
    }

    /// Value substituted when a card has no element for this field and the
    /// configuration does not name one.
    pub(crate) const fn fallback(self) -> &'static str {
        match self {
            Field::Skills => "",
            _ => "N/A",
        }
    }
}


/// One job listing as harvested from a result card.
///
/// Field order here is the CSV column order and must follow [`Field::ALL`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub(crate) struct Record {
    #[serde(rename = "Title")]
    pub(crate) title: String,
    #[serde(rename = "Reference")]
    pub(crate) reference: String,
    #[serde(rename = "Company")]
    pub(crate) company: String,
    #[serde(rename = "Experience")]
    pub(crate) experience: String,
    #[serde(rename = "Salary")]
    pub(crate) salary: String,
    #[serde(rename = "Location")]
    pub(crate) location: String,
    #[serde(rename = "Job Description")]
    pub(crate) description: String,
    /// One entry per line of the card's skill tag block.
    #[serde(rename = "Skills Required", serialize_with = "serialize_bracketed")]
    pub(crate) skills: Vec<String>,
    #[serde(rename = "Posted Date")]
    pub(crate) posted: String,
}


impl Record {
    pub(crate) fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Reference => &mut self.reference,
            Field::Company => &mut self.company,
            Field::Experience => &mut self.experience,
            Field::Salary => &mut self.salary,
            Field::Location => &mut self.location,
            Field::Description => &mut self.description,
            Field::Posted => &mut self.posted,
            Field::Skills => {
                self.skills = value
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(String::from)
                    .collect();
                return;
            }
        };
        *slot = value;
    }
}


/// Renders a list the way it appears in the skills column: `['Python', 'SQL']`.
///
/// Items holding a single quote are wrapped in double quotes instead.
pub(crate) fn bracketed(items: &[String]) -> String {
    let mut out = String::from("[");
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let quote = if item.contains('\'') && !item.contains('"') { '"' } else { '\'' };
        let escaped = if quote == '\'' { item.replace('\'', "\\'") } else { item.clone() };
        let _ = write!(out, "{quote}{escaped}{quote}");
    }
    out.push(']');
    out
}


fn serialize_bracketed<S: Serializer>(items: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&bracketed(items))
}


/// Drops records identical to one seen earlier, keeping the first occurrence.
pub(crate) fn drop_duplicates(records: Vec<Record>) -> Vec<Record> {
    let mut seen = FxHashSet::default();
    let mut kept = Vec::with_capacity(records.len());
    for record in records {
        if seen.insert(record.clone()) {
            kept.push(record);
        }
    }
    kept
}
