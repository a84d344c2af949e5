use crate::{DEFAULT_SIMILARITY_THRESHOLD, Deduplicator, TextError, deduplicate, lcs_len, similarity};

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

const SAMPLES: &[&str] = &[
    "",
    "a",
    "abc",
    "xyz",
    "abcd",
    "hello world",
    "hello wrld",
    "你好吗",
    "你好",
    "我很好，谢谢",
    "我很好,谢谢",
    "ab",
    "ba",
];

#[test]
fn identical_strings_score_one() {
    for sample in SAMPLES {
        assert_close(similarity(sample, sample), 1.0);
    }
}

#[test]
fn similarity_is_symmetric() {
    for a in SAMPLES {
        for b in SAMPLES {
            assert_close(similarity(a, b), similarity(b, a));
        }
    }
}

#[test]
fn similarity_stays_in_unit_interval_and_is_one_only_for_equal() {
    for a in SAMPLES {
        for b in SAMPLES {
            let score = similarity(a, b);
            assert!((0.0..=1.0).contains(&score));
            if a != b {
                assert!(score < 1.0, "{a:?} vs {b:?} scored {score}");
            }
        }
    }
}

#[test]
fn empty_inputs_follow_edge_rules() {
    assert_close(similarity("", ""), 1.0);
    assert_close(similarity("", "x"), 0.0);
    assert_close(similarity("x", ""), 0.0);
}

#[test]
fn disjoint_strings_score_zero() {
    assert_close(similarity("abc", "xyz"), 0.0);
}

#[test]
fn partial_overlap_uses_lcs_ratio() {
    // LCS("abcd", "abd") = 3 -> 6 / 7
    assert_close(similarity("abcd", "abd"), 6.0 / 7.0);
    assert_eq!(lcs_len("ABCBDAB", "BDCABA"), 4);
}

#[test]
fn multibyte_text_is_compared_per_char() {
    // 3 chars vs 2 chars sharing "你好": 2 * 2 / 5
    assert_close(similarity("你好吗", "你好"), 0.8);
    assert_eq!(lcs_len("你好吗", "你们好"), 2);
}

#[test]
fn dedup_empty_input_is_empty() {
    let lines: [&str; 0] = [];
    assert!(deduplicate(&lines, DEFAULT_SIMILARITY_THRESHOLD).is_empty());
}

#[test]
fn dedup_single_line_is_kept() {
    assert_eq!(deduplicate(&["a"], DEFAULT_SIMILARITY_THRESHOLD), vec!["a"]);
}

#[test]
fn dedup_collapses_identical_repeats() {
    let lines = ["你好吗", "你好吗", "你好吗"];
    assert_eq!(deduplicate(&lines, 0.8), vec!["你好吗"]);
}

#[test]
fn dedup_compares_only_with_last_emitted_line() {
    let lines = ["ab", "xy", "ab"];
    assert_eq!(deduplicate(&lines, 0.5), vec!["ab", "xy", "ab"]);
}

#[test]
fn dedup_drops_line_scoring_exactly_threshold() {
    // similarity("你好吗", "你好") == 0.8, which is not below 0.8.
    assert_eq!(deduplicate(&["你好吗", "你好"], 0.8), vec!["你好吗"]);
    // similarity("abcd", "abce") == 0.75
    assert_eq!(deduplicate(&["abcd", "abce"], 0.75), vec!["abcd"]);
    assert_eq!(deduplicate(&["abcd", "abce"], 0.76), vec!["abcd", "abce"]);
}

#[test]
fn dropped_line_never_becomes_the_anchor() {
    // The second line is dropped (0.9 against the first). The third scores 0.9
    // against the dropped line but only 0.8 against the kept one, so it is kept.
    let lines = ["abcdefghij", "abcdefghiX", "abcdefghXY"];
    assert_eq!(deduplicate(&lines, 0.85), vec!["abcdefghij", "abcdefghXY"]);

    // A return to the kept line after a dropped variant is still a duplicate.
    let lines = ["abcdefghij", "abcdefghiX", "abcdefghij"];
    assert_eq!(deduplicate(&lines, 0.85), vec!["abcdefghij"]);
}

#[test]
fn dedup_output_is_order_preserving_subsequence() {
    let lines = [
        "第一句", "第一句", "第一勾", "第二句话", "第二句话", "", "第三", "第一句",
    ];
    for threshold in [0.0, 0.3, 0.5, 0.8, 1.0] {
        let output = deduplicate(&lines, threshold);
        assert!(output.len() <= lines.len());
        assert_eq!(output.first().map(String::as_str), Some(lines[0]));
        let mut cursor = lines.iter();
        for kept in &output {
            assert!(
                cursor.any(|line| *line == kept.as_str()),
                "{kept:?} is out of order for threshold {threshold}"
            );
        }
    }
}

#[test]
fn zero_threshold_keeps_only_first_line() {
    assert_eq!(deduplicate(&["a", "b", "c"], 0.0), vec!["a"]);
}

#[test]
fn threshold_of_one_drops_only_exact_repeats() {
    assert_eq!(
        deduplicate(&["abc", "abc", "abd", "abd", "abc"], 1.0),
        vec!["abc", "abd", "abc"]
    );
}

#[test]
fn deduplicator_tracks_counts() {
    let mut dedup = Deduplicator::new(0.8).unwrap();
    assert_eq!(dedup.push("hello".into()), Some("hello".into()));
    assert_eq!(dedup.push("hello".into()), None);
    assert_eq!(dedup.push("goodbye".into()), Some("goodbye".into()));
    assert_eq!(dedup.seen(), 3);
    assert_eq!(dedup.emitted(), 2);
}

#[test]
fn deduplicator_rejects_out_of_range_threshold() {
    assert_eq!(
        Deduplicator::new(1.5).unwrap_err(),
        TextError::InvalidThreshold { value: 1.5 }
    );
    assert!(Deduplicator::new(-0.1).is_err());
    assert!(Deduplicator::new(f64::NAN).is_err());
}
