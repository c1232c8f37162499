//! Comparison of objective answers, tolerant of letter-vs-text answers.

/// Lower-cased, trimmed, internal whitespace collapsed to single spaces.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// True when the student's answer names the same thing as the canonical one.
///
/// Either side may be an option letter (`A`, `B`, ...) or the option's text.
/// A blank student answer never matches.
pub fn matches(student_raw: &str, correct_raw: &str, options: &[String]) -> bool {
    let student = normalize(student_raw);
    let correct = normalize(correct_raw);

    if student.is_empty() {
        return false;
    }
    if student == correct {
        return true;
    }
    if options.is_empty() {
        return false;
    }

    if let Some(option) = option_for_letter(&correct, options) {
        if normalize(option) == student {
            return true;
        }
    }

    if let Some(option) = option_for_letter(&student, options) {
        if normalize(option) == correct {
            return true;
        }
    }

    false
}

/// Maps `a` to the first option, `b` to the second, and so on.
fn option_for_letter<'a>(normalized: &str, options: &'a [String]) -> Option<&'a String> {
    let mut chars = normalized.chars();
    let letter = chars.next()?;
    if chars.next().is_some() || !letter.is_ascii_lowercase() {
        return None;
    }

    let index = (letter as u8 - b'a') as usize;
    options.get(index)
}
