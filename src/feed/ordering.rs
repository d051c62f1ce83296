use crate::domain::Notice;

/// Sorts newest first by publication date. The sort is stable, so notices
/// sharing a timestamp keep their snapshot order.
pub fn order_newest_first(notices: &mut [&Notice]) {
    notices.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Owned variant of [`order_newest_first`]; the input is left untouched.
pub fn newest_first(notices: &[Notice]) -> Vec<Notice> {
    let mut refs: Vec<&Notice> = notices.iter().collect();
    order_newest_first(&mut refs);
    refs.into_iter().cloned().collect()
}
