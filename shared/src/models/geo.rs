//! Geography data
//!
//! Administrative units consumed from the external geography provider
//! for the cascading province → district → ward picker. Shapes only;
//! fetching them is the shell's concern.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Province {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct District {
    pub code: String,
    pub name: String,
    pub province_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ward {
    pub code: String,
    pub name: String,
    pub district_code: String,
}
