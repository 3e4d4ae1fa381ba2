//! proptest strategies for identifiers and registry statuses.

use proptest::prelude::*;

/// Exactly 14 ASCII digits
pub fn canonical_cnpj_strategy() -> impl Strategy<Value = String> {
    "[0-9]{14}"
}

/// The canonical digits with arbitrary punctuation and spaces interleaved
pub fn decorated_cnpj_strategy() -> impl Strategy<Value = (String, String)> {
    (
        canonical_cnpj_strategy(),
        prop::collection::vec("[ ./\\-a-zA-Z]{0,2}", 15),
    )
        .prop_map(|(digits, noise)| {
            let mut decorated = String::new();
            for (digit, filler) in digits.chars().zip(noise.iter()) {
                decorated.push_str(filler);
                decorated.push(digit);
            }
            decorated.push_str(&noise[14]);
            (digits, decorated)
        })
}

/// Digit strings of any length other than 14
pub fn wrong_length_digits_strategy() -> impl Strategy<Value = String> {
    prop_oneof!["[0-9]{0,13}", "[0-9]{15,30}"]
}

/// Numeric codes, labels in mixed case, and free text
pub fn raw_status_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("2".to_string()),
        Just("08".to_string()),
        Just(" ativa ".to_string()),
        Just("Suspensa".to_string()),
        "[A-Za-z ]{0,20}",
    ]
}
