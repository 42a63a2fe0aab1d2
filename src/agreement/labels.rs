//! Qualitative reading scales. Presentation only; the numbers are untouched.
//!
//! ICC follows Koo & Li (2016), CCC follows McBride (2005).

pub const UNDEFINED_LABEL: &str = "undefined";

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum IccLabel {
    Weak,
    Moderate,
    Good,
    Excellent,
}

impl IccLabel {
    pub fn classify(value: f64) -> Self {
        if value < 0.50 {
            Self::Weak
        } else if value < 0.75 {
            Self::Moderate
        } else if value < 0.90 {
            Self::Good
        } else {
            Self::Excellent
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weak => "weak",
            Self::Moderate => "moderate",
            Self::Good => "good",
            Self::Excellent => "excellent",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CccLabel {
    Poor,
    Moderate,
    Substantial,
    AlmostPerfect,
}

impl CccLabel {
    pub fn classify(value: f64) -> Self {
        if value < 0.90 {
            Self::Poor
        } else if value < 0.95 {
            Self::Moderate
        } else if value < 0.99 {
            Self::Substantial
        } else {
            Self::AlmostPerfect
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Poor => "poor",
            Self::Moderate => "moderate",
            Self::Substantial => "substantial",
            Self::AlmostPerfect => "almost perfect",
        }
    }
}

pub fn icc_label(value: Option<f64>) -> &'static str {
    value.map_or(UNDEFINED_LABEL, |value| IccLabel::classify(value).as_str())
}

pub fn ccc_label(value: Option<f64>) -> &'static str {
    value.map_or(UNDEFINED_LABEL, |value| CccLabel::classify(value).as_str())
}
