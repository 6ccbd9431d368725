//! Property-based tests for the abstract model and naming.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use std::collections::HashSet;

use proptest::prelude::*;

use repostate::core::naming::{fully_qualified_ref, generate_unique_ref, head_ref};
use repostate::core::state::{get_content, get_lines, Commit, LINE_SEPARATOR};
use repostate::core::types::BranchName;

/// Lines that survive the content encoding: no blank-line separator and no
/// newline at either end.
fn encodable_line() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,:;!?\\-\n]{0,24}".prop_filter("must be encodable", |line| {
        !line.contains(LINE_SEPARATOR) && !line.starts_with('\n') && !line.ends_with('\n')
    })
}

/// Strategy for generating valid branch names.
fn valid_branch_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,15}(/[a-z][a-z0-9_-]{0,15}){0,2}"
}

/// Commit messages that git keeps byte for byte.
fn message() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9 ,.]{0,30}[A-Za-z0-9.]".prop_map(|m| m.trim().to_string())
}

proptest! {
    #[test]
    fn content_round_trips(lines in prop::collection::vec(encodable_line(), 1..8)) {
        let content = get_content(&lines);
        prop_assert_eq!(get_lines(&content), lines);
    }

    #[test]
    fn line_count_is_separator_count_plus_one(lines in prop::collection::vec(encodable_line(), 1..8)) {
        let content = get_content(&lines);
        prop_assert_eq!(content.matches(LINE_SEPARATOR).count() + 1, lines.len());
    }

    #[test]
    fn encodable_commits_validate(
        lines in prop::collection::vec(encodable_line(), 1..5),
        message in message(),
    ) {
        let commit = Commit::new(lines.clone(), message);
        prop_assert!(commit.validate().is_ok());
        prop_assert_eq!(Commit::from_content(&commit.content(), commit.message.clone()), commit);
    }

    #[test]
    fn unique_refs_keep_base_and_differ(name in valid_branch_name()) {
        let base = BranchName::new(name.clone()).unwrap();
        let a = generate_unique_ref(&base);
        let b = generate_unique_ref(&base);

        prop_assert_ne!(&a, &b);
        let prefix = format!("{name}-");
        prop_assert!(a.as_str().starts_with(&prefix));
        prop_assert_eq!(a.as_str().len(), name.len() + 1 + 36);
    }

    #[test]
    fn ref_forms_agree(name in valid_branch_name()) {
        let base = BranchName::new(name.clone()).unwrap();
        prop_assert_eq!(head_ref(&base), format!("heads/{name}"));
        let fq = fully_qualified_ref(&base);
        prop_assert_eq!(fq.as_str(), format!("refs/{}", head_ref(&base)));
    }
}

#[test]
fn unique_refs_do_not_repeat_in_bulk() {
    let base = BranchName::new("fixture").unwrap();
    let names: HashSet<_> = (0..10_000).map(|_| generate_unique_ref(&base)).collect();
    assert_eq!(names.len(), 10_000);
}
