//! Version direction for installed sites

use std::cmp::Ordering;

/// How an installed site relates to its target version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateDirection {
    /// Already on the target
    Current,
    /// Target is newer (or `latest`): plain update
    Forward,
    /// Running version is newer than the target: forced update
    Downgrade,
}

/// Compare `current` against `target`
pub fn direction(current: &str, target: &str) -> UpdateDirection {
    if target.eq_ignore_ascii_case("latest") {
        return UpdateDirection::Forward;
    }
    match compare_versions(current, target) {
        Ordering::Greater => UpdateDirection::Downgrade,
        Ordering::Equal => UpdateDirection::Current,
        Ordering::Less => UpdateDirection::Forward,
    }
}

/// Segment-wise numeric comparison, missing segments count as zero
///
/// The numeric release prefix decides first. On a tie, a pre-release
/// suffix (`6.5-RC1`) sorts before the plain release and two suffixes
/// compare as strings. Without a numeric prefix the whole strings compare.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.trim(), b.trim());
    let (Some((x, a_suffix)), Some((y, b_suffix))) = (split_release(a), split_release(b)) else {
        return a.cmp(b);
    };

    let len = x.len().max(y.len());
    let release = (0..len)
        .map(|i| {
            let l = x.get(i).copied().unwrap_or(0);
            let r = y.get(i).copied().unwrap_or(0);
            l.cmp(&r)
        })
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal);

    release.then_with(|| match (a_suffix.is_empty(), b_suffix.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a_suffix.cmp(b_suffix),
    })
}

/// Numeric segments of the leading release and whatever follows them
fn split_release(version: &str) -> Option<(Vec<u64>, &str)> {
    let end = version
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(version.len());
    let (release, suffix) = version.split_at(end);
    let release = release.trim_end_matches('.');
    if release.is_empty() {
        return None;
    }
    let segments = release
        .split('.')
        .map(|s| s.parse().ok())
        .collect::<Option<Vec<u64>>>()?;
    Some((segments, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downgrade_and_forward() {
        assert_eq!(direction("6.4", "6.2"), UpdateDirection::Downgrade);
        assert_eq!(direction("6.2", "6.4"), UpdateDirection::Forward);
    }

    #[test]
    fn test_current() {
        assert_eq!(direction("6.4", "6.4"), UpdateDirection::Current);
        assert_eq!(direction("6.4.0", "6.4"), UpdateDirection::Current);
    }

    #[test]
    fn test_latest_is_always_forward() {
        assert_eq!(direction("6.4.2", "latest"), UpdateDirection::Forward);
        assert_eq!(direction("6.4.2", "LATEST"), UpdateDirection::Forward);
    }

    #[test]
    fn test_numeric_not_lexical() {
        assert_eq!(compare_versions("6.10", "6.9"), Ordering::Greater);
        assert_eq!(direction("6.10", "6.9"), UpdateDirection::Downgrade);
    }

    #[test]
    fn test_prerelease_suffix_breaks_ties() {
        assert_eq!(compare_versions("6.5-RC1", "6.5-RC2"), Ordering::Less);
        assert_eq!(compare_versions("6.5-RC1", "6.5"), Ordering::Less);
        assert_eq!(compare_versions("6.5", "6.5-beta"), Ordering::Greater);
    }

    #[test]
    fn test_prerelease_compares_release_numerically() {
        assert_eq!(compare_versions("6.10-RC1", "6.9"), Ordering::Greater);
        assert_eq!(direction("6.10-RC1", "6.9"), UpdateDirection::Downgrade);
        assert_eq!(direction("6.9", "6.10-RC1"), UpdateDirection::Forward);
    }

    #[test]
    fn test_non_numeric_versions_compare_as_strings() {
        assert_eq!(compare_versions("nightly", "trunk"), Ordering::Less);
    }
}
