use crate::role::Role;

/// The number of prior entries any single role call is shown, regardless of
/// how long the shared log has grown (§4.8's memory discipline).
pub const RELEVANT_SLICE_SIZE: usize = 5;

/// One append-only entry in the shared message log. `keywords` are the
/// terms a later relevance lookup matches against; `role` is the role that
/// produced it.
#[derive(Debug, Clone)]
pub struct MemoryEntry {
    pub role: Role,
    pub phase: &'static str,
    pub text: String,
    pub keywords: Vec<String>,
}

/// Append-only shared log every role phase writes to and reads a filtered
/// slice from. Never truncated; the bound is enforced at read time by
/// [`MessageLog::relevant_to`], not by discarding old entries.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    entries: Vec<MemoryEntry>,
}

impl MessageLog {
    pub fn new() -> Self {
        MessageLog::default()
    }

    pub fn push(&mut self, entry: MemoryEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `N` most-relevant prior entries for `role`, per the substring
    /// relevance predicate over `task_keywords` plus the role's own tag.
    /// Ties are broken by insertion order (most recent first), matching the
    /// determinism surface's "stable order of insertion" tie-break rule.
    pub fn relevant_to(&self, role: Role, task_keywords: &[String]) -> Vec<&MemoryEntry> {
        let mut scored: Vec<(usize, usize, &MemoryEntry)> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(idx, entry)| {
                let score = relevance_score(entry, role, task_keywords);
                (score > 0).then_some((score, idx, entry))
            })
            .collect();

        // Highest score first; within equal scores, most-recently-inserted
        // first (higher index first) -- a stable, deterministic tie-break.
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));
        scored.into_iter().take(RELEVANT_SLICE_SIZE).map(|(_, _, entry)| entry).collect()
    }
}

fn relevance_score(entry: &MemoryEntry, role: Role, task_keywords: &[String]) -> usize {
    let mut score = 0;
    if entry.role == role {
        score += 1;
    }
    for keyword in task_keywords {
        if entry.keywords.iter().any(|k| k.eq_ignore_ascii_case(keyword))
            || entry.text.to_lowercase().contains(&keyword.to_lowercase())
        {
            score += 1;
        }
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(role: Role, text: &str, keywords: &[&str]) -> MemoryEntry {
        MemoryEntry {
            role,
            phase: "test",
            text: text.to_string(),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn never_returns_more_than_the_slice_size() {
        let mut log = MessageLog::new();
        for i in 0..20 {
            log.push(entry(Role::Planner, &format!("entry about ping {i}"), &["ping"]));
        }
        let slice = log.relevant_to(Role::Planner, &["ping".to_string()]);
        assert_eq!(slice.len(), RELEVANT_SLICE_SIZE);
    }

    #[test]
    fn unrelated_entries_are_excluded() {
        let mut log = MessageLog::new();
        log.push(entry(Role::Tester, "unrelated note about billing", &["billing"]));
        let slice = log.relevant_to(Role::Planner, &["ping".to_string()]);
        assert!(slice.is_empty());
    }

    #[test]
    fn ties_break_by_most_recent_insertion() {
        let mut log = MessageLog::new();
        log.push(entry(Role::Planner, "first ping note", &["ping"]));
        log.push(entry(Role::Planner, "second ping note", &["ping"]));
        let slice = log.relevant_to(Role::Planner, &["ping".to_string()]);
        assert_eq!(slice[0].text, "second ping note");
    }
}
