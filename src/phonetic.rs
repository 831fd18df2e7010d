//! Metaphone phonetic coding for SOUNDEX-style indexing (§4.3).
//!
//! Faithful port of the classical Phillips/Parker Metaphone algorithm
//! (Gary A. Parker, C Gazette, June/July 1991; placed in the public
//! domain by the author). The per-letter rule table and the coding
//! bitset below follow that implementation letter for letter.

const MAX_METAPH: usize = 5;

// Bit flags packed per letter, A=index 0 .. Z=index 25.
const VOWEL: u8 = 1; // A E I O U
const SAME: u8 = 2; // F J L M N R
const VARSON: u8 = 4; // C G P S T
const FRONTV: u8 = 8; // E I Y
const NOGHF: u8 = 16; // B D H

#[rustfmt::skip]
const CODES: [u8; 26] = [
    1, 16, 4, 16, 9, 2, 4, 16, 9, 2, 0, 2, 2, 2, 1, 4, 0, 2, 4, 4, 1, 0, 0, 0, 8, 0,
];

fn code_of(b: u8) -> u8 {
    CODES[(b - b'A') as usize]
}

fn is_vowel(b: u8) -> bool {
    b != 0 && code_of(b) & VOWEL != 0
}

fn is_same(b: u8) -> bool {
    b != 0 && code_of(b) & SAME != 0
}

fn is_varson(b: u8) -> bool {
    b != 0 && code_of(b) & VARSON != 0
}

fn is_frontv(b: u8) -> bool {
    b != 0 && code_of(b) & FRONTV != 0
}

fn is_noghf(b: u8) -> bool {
    b != 0 && code_of(b) & NOGHF != 0
}

/// Is `input` eligible for Metaphone/SOUNDEX indexing? Only letters and
/// whitespace are allowed (§4.3); anything else disqualifies the whole
/// value.
pub fn is_soundex_eligible(input: &str) -> bool {
    !input.is_empty() && input.chars().all(|c| c.is_ascii_alphabetic() || c.is_whitespace())
}

/// Metaphone-code `input`, one space-separated code per whitespace-
/// delimited word. Returns `None` when `input` is not soundex-eligible.
pub fn metaphone(input: &str) -> Option<String> {
    if !is_soundex_eligible(input) {
        return None;
    }
    let codes: Vec<String> = input
        .split_whitespace()
        .map(metaphone_word)
        .filter(|code| !code.is_empty())
        .collect();
    Some(codes.join(" "))
}

fn at(letters: &[u8], i: isize) -> u8 {
    if i < 0 || i as usize >= letters.len() {
        0
    } else {
        letters[i as usize]
    }
}

fn metaphone_word(word: &str) -> String {
    let mut letters: Vec<u8> = word
        .bytes()
        .filter(|b| b.is_ascii_alphabetic())
        .map(|b| b.to_ascii_uppercase())
        .collect();
    if letters.is_empty() {
        return String::new();
    }

    let mut start = 0usize;
    match letters[0] {
        b'P' | b'K' | b'G' if at(&letters, 1) == b'N' => start = 1,
        b'A' if at(&letters, 1) == b'E' => start = 1,
        b'W' if at(&letters, 1) == b'R' => start = 1,
        b'W' if at(&letters, 1) == b'H' => {
            letters[1] = letters[0];
            start = 1;
        }
        b'X' => letters[0] = b'S',
        _ => {}
    }

    let n_end = letters.len() as isize - 1;
    let n_start = start as isize;
    let mut out = Vec::with_capacity(MAX_METAPH);
    let mut ks_flag = false;

    let mut i = n_start;
    while i <= n_end && out.len() < MAX_METAPH {
        let cur = at(&letters, i);
        let prev = at(&letters, i - 1);
        let next = at(&letters, i + 1);
        let next2 = at(&letters, i + 2);
        let next3 = at(&letters, i + 3);

        if ks_flag {
            ks_flag = false;
            out.push(cur);
            i += 1;
            continue;
        }

        if prev == cur && cur != b'C' {
            i += 1;
            continue;
        }

        if is_same(cur) || (i == n_start && is_vowel(cur)) {
            out.push(cur);
        } else {
            match cur {
                b'B' => {
                    if i < n_end || prev != b'M' {
                        out.push(b'B');
                    }
                }
                b'C' => {
                    if prev != b'S' || !is_frontv(next) {
                        if next == b'I' && next2 == b'A' {
                            out.push(b'X');
                        } else if is_frontv(next) {
                            out.push(b'S');
                        } else if next == b'H' {
                            out.push(if (i == n_start && !is_vowel(next2)) || prev == b'S' {
                                b'K'
                            } else {
                                b'X'
                            });
                        } else {
                            out.push(b'K');
                        }
                    }
                }
                b'D' => {
                    out.push(if next == b'G' && is_frontv(next2) { b'J' } else { b'T' });
                }
                b'G' => {
                    let prev4 = at(&letters, i - 4);
                    let prev3 = at(&letters, i - 3);
                    if (next != b'H' || is_vowel(next2))
                        && (next != b'N' || (i + 1 < n_end && (next2 != b'E' || next3 != b'D')))
                        && (prev != b'D' || !is_frontv(next))
                    {
                        out.push(if is_frontv(next) && next2 != b'G' { b'J' } else { b'K' });
                    } else if next == b'H' && !is_noghf(prev3) && prev4 != b'H' {
                        out.push(b'F');
                    }
                }
                b'H' => {
                    if !is_varson(prev) && (!is_vowel(prev) || is_vowel(next)) {
                        out.push(b'H');
                    }
                }
                b'K' => {
                    if prev != b'C' {
                        out.push(b'K');
                    }
                }
                b'P' => out.push(if next == b'H' { b'F' } else { b'P' }),
                b'Q' => out.push(b'K'),
                b'S' => {
                    out.push(
                        if next == b'H' || (next == b'I' && (next2 == b'O' || next2 == b'A')) {
                            b'X'
                        } else {
                            b'S'
                        },
                    );
                }
                b'T' => {
                    if next == b'I' && (next2 == b'O' || next2 == b'A') {
                        out.push(b'X');
                    } else if next == b'H' {
                        out.push(b'O');
                    } else if !(next == b'C' && next2 == b'H') {
                        out.push(b'T');
                    }
                }
                b'V' => out.push(b'F'),
                b'W' | b'Y' => {
                    if is_vowel(next) {
                        out.push(cur);
                    }
                }
                b'X' => {
                    if i == n_start {
                        out.push(b'S');
                    } else {
                        out.push(b'K');
                        ks_flag = true;
                    }
                }
                b'Z' => out.push(b'S'),
                _ => {}
            }
        }
        i += 1;
    }

    String::from_utf8(out).expect("metaphone codes are always ASCII uppercase letters")
}

#[cfg(test)]
#[path = "phonetic_test.rs"]
mod phonetic_test;
