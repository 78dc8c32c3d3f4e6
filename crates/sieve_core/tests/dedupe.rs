use pretty_assertions::assert_eq;
use sieve_core::dedupe;

fn has_no_domination(values: &[String]) -> bool {
    values.iter().enumerate().all(|(i, a)| {
        values
            .iter()
            .enumerate()
            .all(|(j, b)| i == j || (a != b && !b.contains(a.as_str())))
    })
}

#[test]
fn exact_duplicates_collapse() {
    assert_eq!(dedupe(["b", "a", "b", "a"]), vec!["a", "b"]);
}

#[test]
fn truncated_config_is_dominated_by_complete_one() {
    let input = vec![
        "vless://id@host:443?type=ws&path=/x#name".to_string(),
        "vless://id@host:443?type=ws".to_string(),
        "trojan://pw@other:443".to_string(),
    ];
    assert_eq!(
        dedupe(input),
        vec![
            "trojan://pw@other:443".to_string(),
            "vless://id@host:443?type=ws&path=/x#name".to_string(),
        ]
    );
}

#[test]
fn domination_chains_keep_only_the_longest() {
    assert_eq!(dedupe(["ab", "abc", "abcd", "zz"]), vec!["abcd", "zz"]);
}

#[test]
fn output_is_sorted_subset_without_domination() {
    let input: Vec<String> = [
        "ss://aaa", "ss://aaab", "vmess://q", "ss://aaa", "hy2://x@y:1", "y:1", "q",
        "trojan://k@h:2", "k@h",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    let out = dedupe(input.clone());
    assert!(out.windows(2).all(|w| w[0] < w[1]));
    assert!(out.iter().all(|v| input.contains(v)));
    assert!(has_no_domination(&out));
}

#[test]
fn dedupe_is_idempotent() {
    let first = dedupe(["abc", "bc", "xyz", "xy", "xyz", "m"]);
    let second = dedupe(first.clone());
    assert_eq!(first, second);
}
