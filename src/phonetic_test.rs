use super::*;

#[test]
fn accent_shows_the_double_c_split() {
    assert_eq!(metaphone("accent").unwrap(), "AKSNT");
}

#[test]
fn knight_drops_silent_k_and_turns_gh_into_f() {
    assert_eq!(metaphone("Knight").unwrap(), "NFT");
}

#[test]
fn leading_vowel_is_kept_once() {
    assert_eq!(metaphone("Ann").unwrap(), "AN");
}

#[test]
fn is_case_insensitive() {
    assert_eq!(metaphone("ACCENT").unwrap(), metaphone("accent").unwrap());
}

#[test]
fn multi_word_input_codes_each_word_separately() {
    assert_eq!(metaphone("Ann Knight").unwrap(), "AN NFT");
}

#[test]
fn non_letter_non_space_input_is_not_eligible() {
    assert!(!is_soundex_eligible("ACME-NET"));
    assert!(metaphone("ACME-NET").is_none());
}

#[test]
fn whitespace_only_input_is_eligible_but_codes_empty() {
    assert!(is_soundex_eligible("   "));
    assert_eq!(metaphone("   ").unwrap(), "");
}

#[test]
fn code_never_exceeds_five_characters() {
    let code = metaphone("Worcestershire").unwrap();
    assert!(code.len() <= 5);
}
