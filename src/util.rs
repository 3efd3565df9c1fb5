pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// `part / total` as a whole percentage, rounded half away from zero
pub fn percent(part: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (part.min(total) as f64 / total as f64) * 100.0;
    pct.round() as u8
}

pub fn clamp_score(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Share of the reference's characters reproduced at the same position, as a
/// percentage. Extra trailing characters count against the response.
pub fn char_accuracy(reference: &str, response: &str) -> u8 {
    let expected: Vec<char> = reference.trim().chars().collect();
    let actual: Vec<char> = response.trim().chars().collect();
    let longest = expected.len().max(actual.len());
    if longest == 0 {
        return 100;
    }
    let matching = expected
        .iter()
        .zip(actual.iter())
        .filter(|(a, b)| a.eq_ignore_ascii_case(b))
        .count();
    percent(matching, longest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[10., 20., 30., 15., 22.]), Some(19.4));
        assert_eq!(mean(&[15., 7., 55., 12., 4.]), Some(18.6));
    }

    #[test]
    fn test_mean_empty_slice() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_percent_rounds_half_up() {
        assert_eq!(percent(5, 8), 63);
        assert_eq!(percent(4, 8), 50);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
    }

    #[test]
    fn test_percent_edges() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(9, 8), 100);
    }

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_score(-3.0), 0);
        assert_eq!(clamp_score(72.5), 73);
        assert_eq!(clamp_score(140.0), 100);
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("  two   words "), 2);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn test_char_accuracy() {
        assert_eq!(char_accuracy("hello", "hello"), 100);
        assert_eq!(char_accuracy("hello", "Hello"), 100);
        assert_eq!(char_accuracy("hello", "help"), 60);
        assert_eq!(char_accuracy("hi", "hi there"), 25);
        assert_eq!(char_accuracy("", ""), 100);
    }
}
