/// Parse one line of child stdout as a progress percentage.
///
/// Accepts `<number>`, `<number>%` and `<number> %`. Anything else is
/// ordinary diagnostic output and yields `None`. Values are clamped to
/// `[0, 100]`; non-finite values are ignored.
pub fn parse_progress_line(line: &str) -> Option<f64> {
    let text = line.trim();
    let text = text.strip_suffix('%').map(str::trim_end).unwrap_or(text);
    let value: f64 = text.parse().ok()?;
    value.is_finite().then(|| value.clamp(0.0, 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_and_percent_forms() {
        assert_eq!(parse_progress_line("10"), Some(10.0));
        assert_eq!(parse_progress_line("55.5 %"), Some(55.5));
        assert_eq!(parse_progress_line("55.5%"), Some(55.5));
        assert_eq!(parse_progress_line("  7.25 %\r"), Some(7.25));
    }

    #[test]
    fn diagnostics_are_not_progress() {
        for line in ["bad", "", "%", "done: 50", "50 % complete", "1e"] {
            assert_eq!(parse_progress_line(line), None, "{line:?}");
        }
    }

    #[test]
    fn out_of_range_is_clamped() {
        assert_eq!(parse_progress_line("-3"), Some(0.0));
        assert_eq!(parse_progress_line("100.0001 %"), Some(100.0));
    }

    #[test]
    fn non_finite_is_ignored() {
        assert_eq!(parse_progress_line("NaN"), None);
        assert_eq!(parse_progress_line("inf %"), None);
    }
}
