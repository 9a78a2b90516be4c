use engine::model::{LoadStatus, Theme};
use engine::resolver::{fallback_locator, parse_indirection_body};
use engine::status::LoadStatusTracker;
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Op {
    MarkLoading,
    MarkLoaded,
    MarkError,
    Release,
    Demote,
}

fn op_strategy() -> impl Strategy<Value = (Op, Theme)> {
    let op = prop_oneof![
        Just(Op::MarkLoading),
        Just(Op::MarkLoaded),
        Just(Op::MarkError),
        Just(Op::Release),
        Just(Op::Demote),
    ];
    let theme = prop_oneof![Just(Theme::Light), Just(Theme::Dark)];
    (op, theme)
}

#[cfg(test)]
mod tracker_property_tests {
    use super::*;

    proptest! {
        #[test]
        fn test_should_attempt_matches_status(ops in prop::collection::vec(op_strategy(), 0..64)) {
            let mut tracker = LoadStatusTracker::new();

            for (op, theme) in ops {
                let other = match theme {
                    Theme::Light => Theme::Dark,
                    Theme::Dark => Theme::Light,
                };
                let before = tracker.status(theme);
                let other_before = tracker.status(other);

                let result = match op {
                    Op::MarkLoading => tracker.mark_loading(theme),
                    Op::MarkLoaded => tracker.mark_loaded(theme),
                    Op::MarkError => tracker.mark_error(theme),
                    Op::Release => tracker.release(theme),
                    Op::Demote => tracker.demote(theme),
                };

                // Property: a refused transition leaves the status untouched
                if result.is_err() {
                    prop_assert_eq!(tracker.status(theme), before);
                }
                // Property: themes never affect each other
                prop_assert_eq!(tracker.status(other), other_before);

                for theme in Theme::ALL {
                    let expected = matches!(
                        tracker.status(theme),
                        LoadStatus::Unloaded | LoadStatus::Error
                    );
                    prop_assert_eq!(tracker.should_attempt(theme), expected);
                }
            }
        }

        #[test]
        fn test_loading_only_entered_when_attempt_allowed(ops in prop::collection::vec(op_strategy(), 0..64)) {
            let mut tracker = LoadStatusTracker::new();

            for (op, theme) in ops {
                let allowed = tracker.should_attempt(theme);
                if let Op::MarkLoading = op {
                    prop_assert_eq!(tracker.mark_loading(theme).is_ok(), allowed);
                } else {
                    let _ = match op {
                        Op::MarkLoaded => tracker.mark_loaded(theme),
                        Op::MarkError => tracker.mark_error(theme),
                        Op::Release => tracker.release(theme),
                        _ => tracker.demote(theme),
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod fallback_property_tests {
    use super::*;

    proptest! {
        #[test]
        fn test_fallback_never_empty(
            base in "https?://[a-z]{1,12}\\.example\\.com/?",
            path in ".*"
        ) {
            let locator = fallback_locator(&base, &path);
            prop_assert!(!locator.is_empty());
            prop_assert!(locator.starts_with("http"));
        }

        #[test]
        fn test_fallback_is_deterministic(path in "(/[a-zA-Z0-9 %._-]{0,10}){0,5}") {
            let base = "https://cdn.example.com";
            prop_assert_eq!(fallback_locator(base, &path), fallback_locator(base, &path));
        }

        #[test]
        fn test_encoded_and_plain_paths_agree(segment in "[a-zA-Z0-9 ]{1,16}") {
            let base = "https://cdn.example.com";
            let plain = format!("/videos/{segment}.mp4");
            let encoded = format!("/videos/{}.mp4", urlencoding::encode(&segment));
            prop_assert_eq!(fallback_locator(base, &plain), fallback_locator(base, &encoded));
        }

        #[test]
        fn test_arbitrary_bodies_never_yield_empty_url(body in ".*") {
            if let Ok(url) = parse_indirection_body("/videos/light.mp4", &body) {
                prop_assert!(!url.trim().is_empty());
            }
        }
    }
}
