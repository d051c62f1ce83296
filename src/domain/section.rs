use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub name: String,
    pub subject_id: String,
    pub department_id: String,
    /// Teacher record id of the class teacher, if one is assigned.
    #[serde(default)]
    pub class_teacher_id: Option<String>,
}

/// A scheduling assignment. Having an entry grants the teacher access to the
/// section whether or not they are its class teacher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableEntry {
    pub id: String,
    #[serde(default)]
    pub teacher_id: Option<String>,
    #[serde(default)]
    pub section_id: Option<String>,
}
