use std::collections::{BTreeSet, HashMap};

use crate::domain::{Section, TimetableEntry};

/// Sections a teacher may act on: those where they are class teacher plus
/// every section they appear in on the timetable.
///
/// Timetable entries with a missing teacher or section reference are
/// skipped. An empty `teacher_id` matches nothing.
pub fn accessible_sections(
    teacher_id: &str,
    sections: &[Section],
    timetable: &[TimetableEntry],
) -> BTreeSet<String> {
    if teacher_id.is_empty() {
        return BTreeSet::new();
    }

    let as_class_teacher = sections
        .iter()
        .filter(|section| section.class_teacher_id.as_deref() == Some(teacher_id))
        .map(|section| section.id.clone());

    let from_timetable = timetable
        .iter()
        .filter(|entry| entry.teacher_id.as_deref() == Some(teacher_id))
        .filter_map(|entry| entry.section_id.clone())
        .filter(|section_id| !section_id.is_empty());

    as_class_teacher.chain(from_timetable).collect()
}

/// [`accessible_sections`] precomputed for every teacher in one snapshot.
#[derive(Debug, Clone, Default)]
pub struct SectionMembershipIndex {
    by_teacher: HashMap<String, BTreeSet<String>>,
}

impl SectionMembershipIndex {
    pub fn build(sections: &[Section], timetable: &[TimetableEntry]) -> Self {
        let mut by_teacher: HashMap<String, BTreeSet<String>> = HashMap::new();

        for section in sections {
            if let Some(teacher_id) = section.class_teacher_id.as_deref().filter(|t| !t.is_empty()) {
                by_teacher
                    .entry(teacher_id.to_string())
                    .or_default()
                    .insert(section.id.clone());
            }
        }

        for entry in timetable {
            let (Some(teacher_id), Some(section_id)) = (&entry.teacher_id, &entry.section_id) else {
                continue;
            };
            if teacher_id.is_empty() || section_id.is_empty() {
                continue;
            }
            by_teacher
                .entry(teacher_id.clone())
                .or_default()
                .insert(section_id.clone());
        }

        Self { by_teacher }
    }

    pub fn sections_for(&self, teacher_id: &str) -> BTreeSet<String> {
        self.by_teacher.get(teacher_id).cloned().unwrap_or_default()
    }

    pub fn teaches(&self, teacher_id: &str, section_id: &str) -> bool {
        self.by_teacher
            .get(teacher_id)
            .map(|sections| sections.contains(section_id))
            .unwrap_or(false)
    }
}
