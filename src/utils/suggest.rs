fn normalize(value: &str) -> Vec<char> {
    value
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a == b {
        return 0;
    }
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn score(input: &[char], candidate: &[char]) -> Option<usize> {
    if input.is_empty() || candidate.is_empty() {
        return None;
    }
    if input == candidate {
        return Some(0);
    }
    let (a, b): (String, String) = (input.iter().collect(), candidate.iter().collect());
    if a.contains(&b) || b.contains(&a) {
        return Some(1);
    }
    Some(levenshtein(input, candidate))
}

fn max_distance(len: usize) -> usize {
    match len {
        0 => 0,
        1..=4 => 1,
        5..=8 => 2,
        n => ((n as f32) * 0.35).floor().max(3.0) as usize,
    }
}

/// Closest candidates to a mistyped name, best first.
pub fn suggest<'a, I>(input: &str, candidates: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let needle = normalize(input);
    let allowed = max_distance(needle.len());
    if allowed == 0 {
        return Vec::new();
    }
    let mut scored: Vec<(usize, &str)> = candidates
        .into_iter()
        .filter_map(|candidate| {
            score(&needle, &normalize(candidate))
                .filter(|s| *s <= allowed)
                .map(|s| (s, candidate))
        })
        .collect();
    scored.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then_with(|| a.1.len().cmp(&b.1.len()))
            .then_with(|| a.1.cmp(b.1))
    });
    scored.dedup_by(|a, b| a.1 == b.1);
    scored
        .into_iter()
        .take(limit.max(1))
        .map(|(_, name)| name.to_string())
        .collect()
}

/// `Did you mean: a, b?` hint, when anything is close enough.
pub fn did_you_mean<'a, I>(input: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let matches = suggest(input, candidates, 3);
    if matches.is_empty() {
        None
    } else {
        Some(format!("Did you mean: {}?", matches.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOOLS: &[&str] = &["search_identities", "search_roles", "get_identity", "get_entitlement"];

    #[test]
    fn finds_near_misses() {
        assert_eq!(
            suggest("search_identites", TOOLS.iter().copied(), 3),
            vec!["search_identities".to_string()]
        );
        assert_eq!(
            suggest("getidentity", TOOLS.iter().copied(), 1),
            vec!["get_identity".to_string()]
        );
    }

    #[test]
    fn no_hint_for_unrelated_names() {
        assert!(did_you_mean("bogus_tool", TOOLS.iter().copied()).is_none());
        assert!(did_you_mean("", TOOLS.iter().copied()).is_none());
    }
}
