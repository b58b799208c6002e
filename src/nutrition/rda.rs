//! RDA percentage calculation
//!
//! Percent-of-RDA per 100 g and per serve, for any number of demographic
//! categories at once. Missing reference values are not errors: they
//! yield 0 in every column.

use serde::{Deserialize, Serialize};

use super::catalog;
use super::units::per_serve;

pub const DEMOGRAPHIC_COUNT: usize = 15;

/// ICMR-NIN demographic category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Demographic {
    #[serde(rename = "Infant [0-6 Mo.]")]
    Infant0To6Months,
    #[serde(rename = "Infant [7-12 Mo.]")]
    Infant7To12Months,
    #[serde(rename = "Children [1-3 Yrs.]")]
    Children1To3,
    #[serde(rename = "Children [4-6 Yrs.]")]
    Children4To6,
    #[serde(rename = "Children [7-9 Yrs.]")]
    Children7To9,
    #[serde(rename = "10-12 Yrs. [Boys]")]
    Boys10To12,
    #[serde(rename = "10-12 Yrs. [Girls]")]
    Girls10To12,
    #[serde(rename = "13-15 Yrs. [Boys]")]
    Boys13To15,
    #[serde(rename = "13-15 Yrs. [Girls]")]
    Girls13To15,
    #[serde(rename = "16-18 Yrs. [Boys]")]
    Boys16To18,
    #[serde(rename = "16-18 Yrs. [Girls]")]
    Girls16To18,
    #[serde(rename = "Male [Sedentary]")]
    MaleSedentary,
    #[serde(rename = "Female [Sedentary]")]
    FemaleSedentary,
    #[serde(rename = "Female [Pregnant]")]
    FemalePregnant,
    #[serde(rename = "Female [Lactating]")]
    FemaleLactating,
}

impl Demographic {
    /// All categories in table order
    pub const ALL: [Demographic; DEMOGRAPHIC_COUNT] = [
        Demographic::Infant0To6Months,
        Demographic::Infant7To12Months,
        Demographic::Children1To3,
        Demographic::Children4To6,
        Demographic::Children7To9,
        Demographic::Boys10To12,
        Demographic::Girls10To12,
        Demographic::Boys13To15,
        Demographic::Girls13To15,
        Demographic::Boys16To18,
        Demographic::Girls16To18,
        Demographic::MaleSedentary,
        Demographic::FemaleSedentary,
        Demographic::FemalePregnant,
        Demographic::FemaleLactating,
    ];

    /// Column position in the RDA table
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn label(&self) -> &'static str {
        match self {
            Demographic::Infant0To6Months => "Infant [0-6 Mo.]",
            Demographic::Infant7To12Months => "Infant [7-12 Mo.]",
            Demographic::Children1To3 => "Children [1-3 Yrs.]",
            Demographic::Children4To6 => "Children [4-6 Yrs.]",
            Demographic::Children7To9 => "Children [7-9 Yrs.]",
            Demographic::Boys10To12 => "10-12 Yrs. [Boys]",
            Demographic::Girls10To12 => "10-12 Yrs. [Girls]",
            Demographic::Boys13To15 => "13-15 Yrs. [Boys]",
            Demographic::Girls13To15 => "13-15 Yrs. [Girls]",
            Demographic::Boys16To18 => "16-18 Yrs. [Boys]",
            Demographic::Girls16To18 => "16-18 Yrs. [Girls]",
            Demographic::MaleSedentary => "Male [Sedentary]",
            Demographic::FemaleSedentary => "Female [Sedentary]",
            Demographic::FemalePregnant => "Female [Pregnant]",
            Demographic::FemaleLactating => "Female [Lactating]",
        }
    }

    /// Parse a category label, ignoring case and surrounding whitespace
    pub fn from_label(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|d| d.label().eq_ignore_ascii_case(s))
    }

    /// Parse a list of labels, reporting the first unknown one
    pub fn parse_list<S: AsRef<str>>(labels: &[S]) -> Result<Vec<Self>, String> {
        labels
            .iter()
            .map(|l| {
                Self::from_label(l.as_ref())
                    .ok_or_else(|| format!("Unknown RDA category: {}", l.as_ref()))
            })
            .collect()
    }
}

/// Reference intake for a nutrient (any alias) in a category
pub fn rda_value(nutrient: &str, category: Demographic) -> Option<f64> {
    catalog::lookup(nutrient).and_then(|n| n.rda_for(category))
}

/// The three export columns for one nutrient and one category
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RdaPercentage {
    pub category: Demographic,
    /// 0 when the category has no reference value
    pub rda_value: f64,
    pub per_100g_pct: f64,
    pub per_serve_pct: f64,
}

fn percent_of(value: f64, rda: f64) -> f64 {
    if rda > 0.0 { value / rda * 100.0 } else { 0.0 }
}

pub fn rda_percentage(
    nutrient: &str,
    category: Demographic,
    per_100g: f64,
    serve_size: f64,
) -> RdaPercentage {
    let rda = rda_value(nutrient, category).unwrap_or(0.0);
    RdaPercentage {
        category,
        rda_value: rda,
        per_100g_pct: percent_of(per_100g, rda),
        per_serve_pct: percent_of(per_serve(per_100g, serve_size), rda),
    }
}

/// One entry per selected category, in the order given
pub fn rda_percentages(
    nutrient: &str,
    categories: &[Demographic],
    per_100g: f64,
    serve_size: f64,
) -> Vec<RdaPercentage> {
    categories
        .iter()
        .map(|c| rda_percentage(nutrient, *c, per_100g, serve_size))
        .collect()
}

/// %RDA report row for a blended nutrient total
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutrientRda {
    pub nutrient: String,
    pub per_100g: f64,
    pub per_serve: f64,
    pub categories: Vec<RdaPercentage>,
}

impl NutrientRda {
    pub fn new(nutrient: &str, per_100g: f64, categories: &[Demographic], serve_size: f64) -> Self {
        Self {
            nutrient: nutrient.to_string(),
            per_100g,
            per_serve: per_serve(per_100g, serve_size),
            categories: rda_percentages(nutrient, categories, per_100g, serve_size),
        }
    }
}
