use std::cmp::Ordering;

/// Orders by `score` descending, then by team name ascending. Every ranked
/// table in the crate uses this so that repeated calls on the same input
/// produce the same order.
pub fn desc_then_name<S: PartialOrd>(a: (S, &str), b: (S, &str)) -> Ordering {
    b.0.partial_cmp(&a.0)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.1.cmp(b.1))
}

/// Float variant that also orders NaN deterministically (after every number).
pub fn desc_f64_then_name(a: (f64, &str), b: (f64, &str)) -> Ordering {
    match (a.0.is_nan(), b.0.is_nan()) {
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        _ => {}
    }
    b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1))
}

/// First and last element of an already ranked table.
pub fn top_and_bottom<T>(ranked: &[T]) -> Option<(&T, &T)> {
    Some((ranked.first()?, ranked.last()?))
}
