//! Keyword polarity over headline text.
//!
//! Keywords match on whole words (phrases match as consecutive words), so
//! `beat` does not fire inside `beats` and `sec` does not fire inside `second`.
//! Each keyword counts at most once per title.

pub const POSITIVE_KEYWORDS: &[&str] = &[
    "beat",
    "beats",
    "above expectations",
    "raises guidance",
    "upgrade",
    "upgraded",
    "initiated with buy",
    "outperform",
    "acquisition",
    "approved",
    "approval",
    "positive",
];

pub const NEGATIVE_KEYWORDS: &[&str] = &[
    "miss",
    "misses",
    "below expectations",
    "lowers guidance",
    "downgrade",
    "downgraded",
    "sell rating",
    "lawsuit",
    "sec",
    "investigation",
    "recall",
    "warning",
    "negative",
    "disappointing",
];

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn contains_phrase(title_words: &[String], keyword: &str) -> bool {
    let phrase: Vec<&str> = keyword.split(' ').collect();
    title_words
        .windows(phrase.len())
        .any(|window| window.iter().zip(&phrase).all(|(w, p)| w == p))
}

pub fn title_score(title: &str) -> i32 {
    let title_words = words(title);
    let hits = |keywords: &[&str]| {
        keywords
            .iter()
            .filter(|k| contains_phrase(&title_words, k))
            .count() as i32
    };
    hits(POSITIVE_KEYWORDS) - hits(NEGATIVE_KEYWORDS)
}

/// Net keyword hits summed across all titles.
pub fn raw_score<'a>(titles: impl IntoIterator<Item = &'a str>) -> i32 {
    titles.into_iter().map(title_score).sum()
}

/// Maps the raw sum onto -2..=2: `>= 3` → 2, `>= 1` → 1, `0` → 0, `<= -3` → -2, else -1.
pub fn bucket(raw: i32) -> i32 {
    match raw {
        r if r >= 3 => 2,
        r if r >= 1 => 1,
        0 => 0,
        r if r <= -3 => -2,
        _ => -1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_each_matching_keyword() {
        assert_eq!(title_score("Company beats estimates and raises guidance"), 2);
    }

    #[test]
    fn no_keywords_scores_zero() {
        let raw = raw_score(["Company to present at investor conference"]);
        assert_eq!(raw, 0);
        assert_eq!(bucket(raw), 0);
    }

    #[test]
    fn matching_is_case_insensitive_and_whole_word() {
        assert_eq!(title_score("SEC opens INVESTIGATION into accounting"), -2);
        assert_eq!(title_score("Second quarter sector review"), 0);
        assert_eq!(title_score("Analyst upgraded; stock beat consensus"), 2);
    }

    #[test]
    fn sums_across_titles() {
        let titles = [
            "Drugmaker wins FDA approval",
            "Shares slide after earnings miss",
            "Broker downgrade follows disappointing outlook",
        ];
        assert_eq!(raw_score(titles), 1 - 1 - 2);
    }

    #[test]
    fn bucketing_thresholds() {
        assert_eq!(bucket(5), 2);
        assert_eq!(bucket(3), 2);
        assert_eq!(bucket(2), 1);
        assert_eq!(bucket(1), 1);
        assert_eq!(bucket(0), 0);
        assert_eq!(bucket(-1), -1);
        assert_eq!(bucket(-2), -1);
        assert_eq!(bucket(-3), -2);
        assert_eq!(bucket(-9), -2);
    }
}
