//! Layout Selector: picks the slide layout for each content section.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use rand_core::{OsRng, RngCore};
use tracing::debug;

use crate::config::DeckSettings;
use crate::deck::template::DeckTemplate;

/// Layout used when no eligible set is available or selection is disabled.
pub const FALLBACK_LAYOUT: usize = 1;

/// Where the eligible content-layout set comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutPolicy {
    /// Always the fallback layout.
    Fixed,
    /// Detected from the template's placeholders.
    AutoDetect,
    /// A configured allow-list, used as-is. Indices the template lacks fail to
    /// render and go through the assembler's fallback.
    Configured(Vec<usize>),
}

impl LayoutPolicy {
    pub fn from_settings(settings: &DeckSettings) -> Self {
        if !settings.use_random_layouts {
            Self::Fixed
        } else if settings.auto_detect_layouts {
            Self::AutoDetect
        } else {
            Self::Configured(settings.content_layouts.clone())
        }
    }
}

/// Eligible layout sets keyed by template layout count.
///
/// Two templates with the same number of layouts share an entry. Entries are
/// never evicted for the life of the process.
#[derive(Debug, Default)]
pub struct LayoutCache {
    entries: RwLock<HashMap<usize, Arc<[usize]>>>,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached set for `template`, detecting it on first use.
    pub fn get_or_detect(&self, template: &DeckTemplate) -> Arc<[usize]> {
        let key = template.layout_count();

        if let Some(hit) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Arc::clone(hit);
        }

        let detected: Arc<[usize]> = template.content_layout_indices().into();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        // A concurrent request may have filled the slot; keep the first value.
        let entry = entries.entry(key).or_insert(detected);
        debug!("Cached content layouts for {} layouts: {:?}", key, entry);
        Arc::clone(entry)
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
pub struct LayoutSelector {
    policy: LayoutPolicy,
    cache: LayoutCache,
}

impl LayoutSelector {
    pub fn new(policy: LayoutPolicy) -> Self {
        Self {
            policy,
            cache: LayoutCache::new(),
        }
    }

    pub fn from_settings(settings: &DeckSettings) -> Self {
        Self::new(LayoutPolicy::from_settings(settings))
    }

    pub fn policy(&self) -> &LayoutPolicy {
        &self.policy
    }

    /// The eligible set for `template` under the current policy. May be empty.
    pub fn eligible(&self, template: &DeckTemplate) -> Arc<[usize]> {
        match &self.policy {
            LayoutPolicy::Fixed => Arc::from(vec![FALLBACK_LAYOUT]),
            LayoutPolicy::AutoDetect => self.cache.get_or_detect(template),
            LayoutPolicy::Configured(allowed) => Arc::from(allowed.as_slice()),
        }
    }

    /// Chooses a layout index for one content section.
    ///
    /// Uniform over the eligible set; the fallback layout when the set is empty.
    pub fn select(&self, template: &DeckTemplate) -> usize {
        let eligible = self.eligible(template);
        if eligible.is_empty() {
            return FALLBACK_LAYOUT;
        }
        eligible[uniform_index(&mut OsRng, eligible.len())]
    }
}

/// Index in `0..len` with no modulo bias: draws from the incomplete top range of
/// `u64` are rejected and redrawn. `len` must be non-zero.
fn uniform_index<R: RngCore>(rng: &mut R, len: usize) -> usize {
    let len = len as u64;
    let limit = u64::MAX - (u64::MAX % len + 1) % len;
    loop {
        let draw = rng.next_u64();
        if draw <= limit {
            return (draw % len) as usize;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::template::test_support::{four_layout_template, layout};
    use crate::deck::template::PlaceholderKind;

    #[test]
    fn test_policy_from_settings() {
        let mut settings = DeckSettings::default();
        assert_eq!(LayoutPolicy::from_settings(&settings), LayoutPolicy::AutoDetect);

        settings.auto_detect_layouts = false;
        assert_eq!(
            LayoutPolicy::from_settings(&settings),
            LayoutPolicy::Configured(vec![1, 2, 3, 4, 7, 8, 9])
        );

        settings.use_random_layouts = false;
        assert_eq!(LayoutPolicy::from_settings(&settings), LayoutPolicy::Fixed);
    }

    #[test]
    fn test_select_stays_within_detected_set() {
        let template = four_layout_template();
        let selector = LayoutSelector::new(LayoutPolicy::AutoDetect);

        let mut seen = [false; 4];
        for _ in 0..1000 {
            let index = selector.select(&template);
            assert!(index == 1 || index == 3, "selected ineligible layout {index}");
            seen[index] = true;
        }
        assert!(seen[1] && seen[3]);
    }

    struct Sequence(Vec<u64>);

    impl RngCore for Sequence {
        fn next_u32(&mut self) -> u32 {
            self.next_u64() as u32
        }

        fn next_u64(&mut self) -> u64 {
            self.0.remove(0)
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for byte in dest {
                *byte = self.next_u64() as u8;
            }
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    #[test]
    fn test_uniform_index_redraws_from_biased_tail() {
        // 2^64 leaves remainder 1 over three buckets, so u64::MAX is redrawn.
        let mut rng = Sequence(vec![u64::MAX, 4]);
        assert_eq!(uniform_index(&mut rng, 3), 1);
        assert!(rng.0.is_empty());

        let mut rng = Sequence(vec![u64::MAX - 1]);
        assert_eq!(uniform_index(&mut rng, 3), 2);
    }

    #[test]
    fn test_uniform_index_single_choice() {
        let mut rng = Sequence(vec![u64::MAX]);
        assert_eq!(uniform_index(&mut rng, 1), 0);
    }

    #[test]
    fn test_fixed_policy_always_uses_fallback() {
        let template = four_layout_template();
        let selector = LayoutSelector::new(LayoutPolicy::Fixed);
        assert!((0..50).all(|_| selector.select(&template) == FALLBACK_LAYOUT));
    }

    #[test]
    fn test_empty_eligible_set_uses_fallback() {
        use PlaceholderKind::*;
        let template = DeckTemplate::from_layouts(vec![
            layout(0, &[(0, CenterTitle)]),
            layout(1, &[(0, Title)]),
        ]);
        let selector = LayoutSelector::new(LayoutPolicy::AutoDetect);
        assert!(selector.eligible(&template).is_empty());
        assert_eq!(selector.select(&template), FALLBACK_LAYOUT);
    }

    #[test]
    fn test_configured_list_is_used_verbatim() {
        let template = four_layout_template();
        let selector = LayoutSelector::new(LayoutPolicy::Configured(vec![2, 7]));
        assert_eq!(&*selector.eligible(&template), &[2, 7]);
        assert!((0..50).all(|_| matches!(selector.select(&template), 2 | 7)));
    }

    #[test]
    fn test_empty_configured_list_uses_fallback() {
        let template = four_layout_template();
        let selector = LayoutSelector::new(LayoutPolicy::Configured(Vec::new()));
        assert_eq!(selector.select(&template), FALLBACK_LAYOUT);
    }

    #[test]
    fn test_cache_is_keyed_by_layout_count() {
        use PlaceholderKind::*;
        let first = four_layout_template();
        // Same layout count, different eligibility.
        let second = DeckTemplate::from_layouts(vec![
            layout(0, &[(0, CenterTitle)]),
            layout(1, &[(0, Title)]),
            layout(2, &[(0, Title), (1, Body)]),
            layout(3, &[(0, Title)]),
        ]);
        assert_eq!(second.content_layout_indices(), vec![2]);

        let selector = LayoutSelector::new(LayoutPolicy::AutoDetect);
        assert_eq!(&*selector.eligible(&first), &[1, 3]);
        // The entry computed for the first template is reused.
        assert_eq!(&*selector.eligible(&second), &[1, 3]);
        assert_eq!(selector.cache.len(), 1);
    }

    #[test]
    fn test_cache_is_shared_across_threads() {
        let selector = Arc::new(LayoutSelector::new(LayoutPolicy::AutoDetect));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let selector = Arc::clone(&selector);
                std::thread::spawn(move || {
                    let template = four_layout_template();
                    selector.select(&template)
                })
            })
            .collect();
        for handle in handles {
            let index = handle.join().unwrap();
            assert!(index == 1 || index == 3);
        }
        assert_eq!(selector.cache.len(), 1);
    }
}
