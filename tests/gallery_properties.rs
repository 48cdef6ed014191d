use std::collections::HashSet;

use pexgal::gallery::{GalleryState, LoadOutcome, merge};
use pexgal::source::{FetchError, Photo};
use proptest::prelude::*;

fn photo(id: u8) -> Photo {
    Photo::new(format!("m{id}"), format!("o{id}"))
}

fn batch() -> impl Strategy<Value = Vec<Photo>> {
    prop::collection::vec(0u8..40, 0..12).prop_map(|ids| ids.into_iter().map(photo).collect())
}

proptest! {
    #[test]
    fn merge_keeps_prefix_and_stays_unique(current in batch(), incoming in batch()) {
        let current = merge(&[], current);
        let merged = merge(&current, incoming.clone());

        prop_assert_eq!(&merged[..current.len()], &current[..]);
        let urls: HashSet<&str> = merged.iter().map(|p| p.full_url.as_str()).collect();
        prop_assert_eq!(urls.len(), merged.len());
        for p in &incoming {
            prop_assert!(urls.contains(p.full_url.as_str()));
        }
    }

    #[test]
    fn merge_preserves_incoming_order(incoming in batch()) {
        let merged = merge(&[], incoming.clone());
        let mut expected = Vec::new();
        let mut seen = HashSet::new();
        for p in incoming {
            if seen.insert(p.full_url.clone()) {
                expected.push(p);
            }
        }
        prop_assert_eq!(merged, expected);
    }

    #[test]
    fn pages_advance_once_per_completion(pages in prop::collection::vec(prop::option::of(batch()), 1..8)) {
        let mut gallery = GalleryState::new();
        let mut expected = Vec::new();
        for (i, page) in pages.iter().enumerate() {
            let request = gallery.begin_load().unwrap();
            prop_assert_eq!(gallery.begin_load(), None);
            prop_assert_eq!(request.page(), u32::try_from(i + 1).unwrap());

            let result = page
                .clone()
                .ok_or_else(|| FetchError::Transport("refused".to_string()));
            let outcome = gallery.finish_load(request, result);
            if let Some(photos) = page {
                expected = merge(&expected, photos.clone());
                prop_assert!(
                    matches!(outcome, LoadOutcome::Appended { .. }),
                    "expected an append, got {:?}",
                    outcome
                );
            } else {
                prop_assert!(
                    matches!(outcome, LoadOutcome::Failed(_)),
                    "expected a failure, got {:?}",
                    outcome
                );
            }
            prop_assert!(!gallery.is_loading());
        }
        prop_assert_eq!(gallery.photos(), &expected[..]);
        prop_assert_eq!(gallery.next_page(), u32::try_from(pages.len() + 1).unwrap());
    }
}
