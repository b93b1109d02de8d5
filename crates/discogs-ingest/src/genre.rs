//! Genre/Style Manager: two-pass-per-file name resolution (spec §4.5).
//!
//! Genres and styles share one namespace (invariant 3), and the same
//! manager instance is reused across the masters pass and the releases
//! pass — `reset` clears the collected-name set between files but keeps
//! the memoized name→id map, since a genre seen while processing masters
//! is still the same row when releases reference it later.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use discogs_core::model::GenreId;
use discogs_core::Repository;

use crate::error::Result;

#[derive(Default)]
struct GenreState {
    collected: HashSet<String>,
    memoized: HashMap<String, GenreId>,
}

/// Collects genre/style names across a pass, upserts the new ones once,
/// and resolves names back to ids for the association-emitting pass.
pub struct GenreManager {
    state: Mutex<GenreState>,
}

impl GenreManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GenreState::default()),
        }
    }

    /// Merges `genres` and `styles` into the internal collected-name set.
    pub fn collect_names(&self, genres: &[String], styles: &[String]) {
        let mut state = self.state.lock().expect("genre manager mutex poisoned");
        state.collected.extend(genres.iter().cloned());
        state.collected.extend(styles.iter().cloned());
    }

    /// Upserts every collected name not already memoized, then folds the
    /// resulting ids into the memoization map.
    pub fn batch_upsert_missing(&self, repo: &dyn Repository) -> Result<()> {
        let missing: Vec<String> = {
            let state = self.state.lock().expect("genre manager mutex poisoned");
            state
                .collected
                .iter()
                .filter(|name| !state.memoized.contains_key(*name))
                .cloned()
                .collect()
        };

        if missing.is_empty() {
            return Ok(());
        }

        repo.upsert_genres(&missing)?;
        let ids = repo.genre_ids_by_names(&missing)?;

        let mut state = self.state.lock().expect("genre manager mutex poisoned");
        state.memoized.extend(ids);
        Ok(())
    }

    /// Resolves a record's genre/style names to their memoized ids,
    /// skipping any name that somehow still isn't memoized (it would
    /// have been upserted in the prior step; absence here means a
    /// genuinely dropped/empty name never collected).
    #[must_use]
    pub fn resolve(&self, genres: &[String], styles: &[String]) -> Vec<(String, GenreId)> {
        let state = self.state.lock().expect("genre manager mutex poisoned");
        genres
            .iter()
            .chain(styles.iter())
            .filter_map(|name| state.memoized.get(name).map(|id| (name.clone(), *id)))
            .collect()
    }

    /// Clears the collected-name set between the masters and releases
    /// passes, preserving the memoized id map.
    pub fn reset(&self) {
        let mut state = self.state.lock().expect("genre manager mutex poisoned");
        state.collected.clear();
    }
}

impl Default for GenreManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_merges_genres_and_styles() {
        let manager = GenreManager::new();
        manager.collect_names(&["Electronic".to_string()], &["Techno".to_string()]);
        let state = manager.state.lock().unwrap();
        assert!(state.collected.contains("Electronic"));
        assert!(state.collected.contains("Techno"));
    }

    #[test]
    fn test_reset_clears_collected_not_memoized() {
        let manager = GenreManager::new();
        manager.collect_names(&["Electronic".to_string()], &[]);
        {
            let mut state = manager.state.lock().unwrap();
            state.memoized.insert("Electronic".to_string(), GenreId::new(1));
        }
        manager.reset();
        let state = manager.state.lock().unwrap();
        assert!(state.collected.is_empty());
        assert!(state.memoized.contains_key("Electronic"));
    }

    #[test]
    fn test_resolve_skips_unmemoized_names() {
        let manager = GenreManager::new();
        {
            let mut state = manager.state.lock().unwrap();
            state.memoized.insert("Electronic".to_string(), GenreId::new(1));
        }
        let resolved = manager.resolve(&["Electronic".to_string(), "Unknown".to_string()], &[]);
        assert_eq!(resolved, vec![("Electronic".to_string(), GenreId::new(1))]);
    }
}
