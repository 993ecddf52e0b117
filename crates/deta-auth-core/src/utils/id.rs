// Key generation for stores that assign keys on insert.

/// Length of store-assigned keys.
pub const KEY_LENGTH: usize = 12;

const KEY_ALPHABET: [char; 36] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i',
    'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// Generate a lowercase alphanumeric key of `KEY_LENGTH` characters.
pub fn generate_key() -> String {
    nanoid::nanoid!(KEY_LENGTH, &KEY_ALPHABET)
}
