//! Reversible opaque identifiers (Hashids v1 scheme).
//!
//! A `Hashids` value is built once from `{salt, min_length, alphabet}` and is
//! immutable afterwards. Reconfiguring means building a new value through one
//! of the `with_*` constructors, so a half-applied configuration can never be
//! observed by a concurrent reader.

use thiserror::Error;

pub const DEFAULT_ALPHABET: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ1234567890";

const DEFAULT_SEPARATORS: &str = "cfhistuCFHISTU";
const MIN_ALPHABET_LENGTH: usize = 16;
const SEPARATOR_RATIO: f64 = 3.5;
const GUARD_RATIO: f64 = 12.0;
const HEX_CHUNK_LEN: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashidError {
    #[error("alphabet must contain at least 16 unique characters, got {0}")]
    AlphabetTooShort(usize),

    #[error("alphabet cannot contain spaces")]
    AlphabetContainsSpace,
}

#[derive(Debug, Clone)]
pub struct Hashids {
    salt: String,
    salt_chars: Vec<char>,
    min_length: usize,
    source_alphabet: String,
    alphabet: Vec<char>,
    separators: Vec<char>,
    guards: Vec<char>,
}

impl Hashids {
    pub fn new(salt: &str, min_length: usize, alphabet: &str) -> Result<Self, HashidError> {
        let mut unique: Vec<char> = Vec::with_capacity(alphabet.len());
        for c in alphabet.chars() {
            if !unique.contains(&c) {
                unique.push(c);
            }
        }

        if unique.contains(&' ') {
            return Err(HashidError::AlphabetContainsSpace);
        }
        if unique.len() < MIN_ALPHABET_LENGTH {
            return Err(HashidError::AlphabetTooShort(unique.len()));
        }

        let salt_chars: Vec<char> = salt.chars().collect();

        // Separators are the default separator symbols present in the
        // alphabet, and never take part in the number encoding itself.
        let mut separators: Vec<char> = DEFAULT_SEPARATORS
            .chars()
            .filter(|c| unique.contains(c))
            .collect();
        let mut symbols: Vec<char> = unique
            .into_iter()
            .filter(|c| !separators.contains(c))
            .collect();

        consistent_shuffle(&mut separators, &salt_chars);

        if separators.is_empty()
            || symbols.len() as f64 / separators.len() as f64 > SEPARATOR_RATIO
        {
            let mut wanted = (symbols.len() as f64 / SEPARATOR_RATIO).ceil() as usize;
            if wanted == 1 {
                wanted = 2;
            }

            if wanted > separators.len() {
                let diff = wanted - separators.len();
                separators.extend(symbols.drain(..diff));
            } else {
                separators.truncate(wanted);
            }
        }

        consistent_shuffle(&mut symbols, &salt_chars);

        let guard_count = (symbols.len() as f64 / GUARD_RATIO).ceil() as usize;
        let guards: Vec<char> = if symbols.len() < 3 {
            separators.drain(..guard_count).collect()
        } else {
            symbols.drain(..guard_count).collect()
        };

        Ok(Self {
            salt: salt.to_string(),
            salt_chars,
            min_length,
            source_alphabet: alphabet.to_string(),
            alphabet: symbols,
            separators,
            guards,
        })
    }

    /// Same configuration with a different salt.
    pub fn with_salt(&self, salt: &str) -> Result<Self, HashidError> {
        Self::new(salt, self.min_length, &self.source_alphabet)
    }

    /// Same configuration with a different minimum output length.
    pub fn with_min_length(&self, min_length: usize) -> Result<Self, HashidError> {
        Self::new(&self.salt, min_length, &self.source_alphabet)
    }

    /// Same configuration with a different alphabet.
    pub fn with_alphabet(&self, alphabet: &str) -> Result<Self, HashidError> {
        Self::new(&self.salt, self.min_length, alphabet)
    }

    pub fn salt(&self) -> &str {
        &self.salt
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    /// Encode a list of numbers. An empty list encodes to an empty string.
    pub fn encode(&self, numbers: &[u64]) -> String {
        if numbers.is_empty() {
            return String::new();
        }

        let mut alphabet = self.alphabet.clone();
        let numbers_hash: u64 = numbers
            .iter()
            .enumerate()
            .map(|(i, n)| n % (i as u64 + 100))
            .sum();

        let lottery = alphabet[(numbers_hash % alphabet.len() as u64) as usize];
        let mut ret = vec![lottery];

        for (i, &number) in numbers.iter().enumerate() {
            let key = self.shuffle_key(lottery, &alphabet);
            consistent_shuffle(&mut alphabet, &key);

            let last = hash(number, &alphabet);
            let first = last[0] as u64;
            ret.extend_from_slice(&last);

            if i + 1 < numbers.len() {
                let reduced = number % (first + i as u64);
                let index = reduced % self.separators.len() as u64;
                ret.push(self.separators[index as usize]);
            }
        }

        if ret.len() < self.min_length {
            let index = (numbers_hash + ret[0] as u64) % self.guards.len() as u64;
            ret.insert(0, self.guards[index as usize]);

            if ret.len() < self.min_length {
                let index = (numbers_hash + ret[2] as u64) % self.guards.len() as u64;
                ret.push(self.guards[index as usize]);
            }
        }

        let half = alphabet.len() / 2;
        while ret.len() < self.min_length {
            let key = alphabet.clone();
            consistent_shuffle(&mut alphabet, &key);

            let mut padded = Vec::with_capacity(ret.len() + alphabet.len());
            padded.extend_from_slice(&alphabet[half..]);
            padded.extend_from_slice(&ret);
            padded.extend_from_slice(&alphabet[..half]);
            ret = padded;

            let excess = ret.len().saturating_sub(self.min_length);
            if excess > 0 {
                let start = excess / 2;
                ret = ret[start..start + self.min_length].to_vec();
            }
        }

        ret.into_iter().collect()
    }

    /// Decode a hash produced by this configuration.
    ///
    /// Never fails loudly: anything that is not an exact encoding under this
    /// salt and alphabet (garbage, tampering) yields `None`.
    ///
    /// Separation between two configurations is only probabilistic here. A
    /// hash from another salt of the same length can re-encode cleanly to
    /// some large number. Identifiers at the HTTP boundary go through
    /// [`Hashids::decode_id`], which also requires one key that fits an
    /// `i32`, and the deployed connections differ in minimum length.
    pub fn decode(&self, hash: &str) -> Option<Vec<u64>> {
        if hash.is_empty() {
            return None;
        }

        let chars: Vec<char> = hash.chars().collect();
        let parts: Vec<&[char]> = chars.split(|c| self.guards.contains(c)).collect();
        let id_part = if parts.len() == 2 || parts.len() == 3 {
            parts[1]
        } else {
            parts[0]
        };

        let (&lottery, rest) = id_part.split_first()?;
        let mut alphabet = self.alphabet.clone();
        let mut numbers = Vec::new();

        for chunk in rest.split(|c| self.separators.contains(c)) {
            let key = self.shuffle_key(lottery, &alphabet);
            consistent_shuffle(&mut alphabet, &key);
            numbers.push(unhash(chunk, &alphabet)?);
        }

        // Only accept what this configuration would have produced itself.
        if self.encode(&numbers) == hash {
            Some(numbers)
        } else {
            None
        }
    }

    /// Encode a single primary key. Negative keys have no encoding.
    pub fn encode_id(&self, id: i32) -> String {
        u64::try_from(id)
            .map(|n| self.encode(&[n]))
            .unwrap_or_default()
    }

    /// Decode a hash that must carry exactly one key fitting an `i32`.
    pub fn decode_id(&self, hash: &str) -> Option<i32> {
        match self.decode(hash)?.as_slice() {
            [n] => i32::try_from(*n).ok(),
            _ => None,
        }
    }

    /// Encode an even-length hexadecimal string.
    pub fn encode_hex(&self, hex: &str) -> Option<String> {
        if hex.is_empty() || hex.len() % 2 != 0 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        // A leading `1` on every chunk keeps its leading zeroes.
        let numbers = hex
            .as_bytes()
            .chunks(HEX_CHUNK_LEN)
            .map(|chunk| {
                let digits = std::str::from_utf8(chunk).ok()?;
                u64::from_str_radix(&format!("1{digits}"), 16).ok()
            })
            .collect::<Option<Vec<u64>>>()?;

        Some(self.encode(&numbers))
    }

    pub fn decode_hex(&self, hash: &str) -> Option<String> {
        let numbers = self.decode(hash)?;
        let mut hex = String::new();
        for n in numbers {
            let digits = format!("{n:x}");
            hex.push_str(digits.strip_prefix('1')?);
        }
        Some(hex)
    }

    fn shuffle_key(&self, lottery: char, alphabet: &[char]) -> Vec<char> {
        std::iter::once(lottery)
            .chain(self.salt_chars.iter().copied())
            .chain(alphabet.iter().copied())
            .take(alphabet.len())
            .collect()
    }
}

fn consistent_shuffle(alphabet: &mut [char], salt: &[char]) {
    if salt.is_empty() || alphabet.len() < 2 {
        return;
    }

    let mut v = 0usize;
    let mut p = 0usize;
    for i in (1..alphabet.len()).rev() {
        v %= salt.len();
        let integer = salt[v] as usize;
        p += integer;
        let j = (integer + v + p) % i;
        alphabet.swap(i, j);
        v += 1;
    }
}

fn hash(mut number: u64, alphabet: &[char]) -> Vec<char> {
    let base = alphabet.len() as u64;
    let mut out = Vec::new();
    loop {
        out.push(alphabet[(number % base) as usize]);
        number /= base;
        if number == 0 {
            break;
        }
    }
    out.reverse();
    out
}

fn unhash(input: &[char], alphabet: &[char]) -> Option<u64> {
    let base = alphabet.len() as u64;
    input.iter().try_fold(0u64, |acc, c| {
        let position = alphabet.iter().position(|a| a == c)? as u64;
        acc.checked_mul(base)?.checked_add(position)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec(salt: &str, min_length: usize) -> Hashids {
        Hashids::new(salt, min_length, DEFAULT_ALPHABET).unwrap()
    }

    #[test]
    fn single_id_round_trip() {
        let h = codec("this is my salt", 0);
        for n in [0u64, 1, 2, 99, 100, 12345, 1_000_000, u32::MAX as u64, u64::MAX] {
            let encoded = h.encode(&[n]);
            assert_eq!(h.decode(&encoded), Some(vec![n]), "round trip failed for {n}");
        }
    }

    #[test]
    fn multiple_numbers_round_trip() {
        let h = codec("this is my salt", 10);
        let numbers = vec![683, 94108, 123, 5, 0];
        let encoded = h.encode(&numbers);
        assert_eq!(h.decode(&encoded), Some(numbers));
    }

    #[test]
    fn output_respects_min_length() {
        for min_length in [0usize, 1, 8, 20, 64] {
            let h = codec("padding", min_length);
            for n in 0..300u64 {
                let encoded = h.encode(&[n]);
                assert!(
                    encoded.chars().count() >= min_length,
                    "{encoded} shorter than {min_length}"
                );
                assert_eq!(h.decode(&encoded), Some(vec![n]));
            }
        }
    }

    #[test]
    fn encoding_is_deterministic() {
        let a = codec("same salt", 8);
        let b = codec("same salt", 8);
        assert_eq!(a.encode(&[42]), b.encode(&[42]));
        assert_ne!(a.encode(&[42]), a.encode(&[43]));
    }

    #[test]
    fn output_only_uses_alphabet_symbols() {
        let h = codec("symbols", 12);
        for n in 0..200u64 {
            assert!(h.encode(&[n]).chars().all(|c| DEFAULT_ALPHABET.contains(c)));
        }
    }

    #[test]
    fn foreign_salt_does_not_decode_ids() {
        let main = codec("main connection", 8);
        let users = codec("users connection", 12);
        let sample = (0..5_000i32)
            .chain((0..2_000).map(|n| n * 1_000_003))
            .chain([i32::MAX - 1, i32::MAX]);
        for id in sample {
            let from_main = main.encode_id(id);
            let from_users = users.encode_id(id);
            assert_eq!(main.decode_id(&from_main), Some(id));
            assert_eq!(users.decode_id(&from_users), Some(id));
            assert_eq!(users.decode_id(&from_main), None, "main hash {from_main} decoded as user");
            assert_eq!(main.decode_id(&from_users), None, "user hash {from_users} decoded as main");
        }
    }

    #[test]
    fn garbage_input_decodes_to_none() {
        let h = codec("garbage", 8);
        assert_eq!(h.decode(""), None);
        assert_eq!(h.decode("!!!!!!!!"), None);
        assert_eq!(h.decode("abc"), None);
        assert_eq!(h.decode("   "), None);
        assert_eq!(h.decode_id("not-an-id"), None);
    }

    #[test]
    fn tampered_hash_decodes_to_none() {
        let h = codec("tamper", 10);
        let encoded = h.encode(&[777]);
        let mut chars: Vec<char> = encoded.chars().collect();
        let last = chars.len() - 1;
        chars[last] = if chars[last] == 'a' { 'b' } else { 'a' };
        let tampered: String = chars.into_iter().collect();
        assert_eq!(h.decode(&tampered), None);
    }

    #[test]
    fn decode_id_requires_single_i32() {
        let h = codec("ids", 8);
        assert_eq!(h.decode_id(&h.encode_id(17)), Some(17));
        assert_eq!(h.decode_id(&h.encode(&[1, 2])), None);
        assert_eq!(h.decode_id(&h.encode(&[i32::MAX as u64 + 1])), None);
    }

    #[test]
    fn negative_id_has_no_encoding() {
        let h = codec("ids", 8);
        assert_eq!(h.encode_id(-1), "");
    }

    #[test]
    fn empty_input_encodes_to_empty_string() {
        let h = codec("empty", 8);
        assert_eq!(h.encode(&[]), "");
    }

    #[test]
    fn hex_round_trip_keeps_leading_zeroes() {
        let h = codec("hex", 0);
        for hex in ["deadbeef", "00ff", "0000", "0123456789abcdef0123", "507f1f77bcf86cd799439011"] {
            let encoded = h.encode_hex(hex).unwrap();
            assert_eq!(h.decode_hex(&encoded).as_deref(), Some(hex));
        }
    }

    #[test]
    fn invalid_hex_is_rejected() {
        let h = codec("hex", 0);
        assert_eq!(h.encode_hex(""), None);
        assert_eq!(h.encode_hex("abc"), None);
        assert_eq!(h.encode_hex("zz"), None);
    }

    #[test]
    fn short_alphabet_is_rejected() {
        let err = Hashids::new("", 0, "abcdefghij").unwrap_err();
        assert_eq!(err, HashidError::AlphabetTooShort(10));
    }

    #[test]
    fn duplicate_symbols_do_not_count_towards_alphabet_length() {
        let err = Hashids::new("", 0, "aabbccddeeffgghhiijj").unwrap_err();
        assert_eq!(err, HashidError::AlphabetTooShort(10));
    }

    #[test]
    fn space_in_alphabet_is_rejected() {
        let err = Hashids::new("", 0, "abcdefghijklmnop qrstuvwxyz").unwrap_err();
        assert_eq!(err, HashidError::AlphabetContainsSpace);
    }

    #[test]
    fn custom_alphabet_round_trip() {
        let h = Hashids::new("custom", 6, "0123456789abcdef").unwrap();
        for n in [0u64, 7, 4096, 987_654_321] {
            let encoded = h.encode(&[n]);
            assert!(encoded.chars().all(|c| "0123456789abcdef".contains(c)));
            assert_eq!(h.decode(&encoded), Some(vec![n]));
        }
    }

    #[test]
    fn with_salt_builds_independent_codec() {
        let original = codec("first", 8);
        let before = original.encode(&[9]);
        let resalted = original.with_salt("second").unwrap();

        assert_eq!(resalted.salt(), "second");
        assert_eq!(resalted.min_length(), 8);
        assert_eq!(original.encode(&[9]), before);
        assert_ne!(resalted.encode(&[9]), before);
        assert_eq!(resalted.decode(&before), None);
    }

    #[test]
    fn with_min_length_and_alphabet_rebuild() {
        let original = codec("rebuild", 4);
        let longer = original.with_min_length(16).unwrap();
        assert!(longer.encode(&[1]).chars().count() >= 16);

        assert!(original.with_alphabet("short").is_err());
        let hex = original.with_alphabet("0123456789abcdef").unwrap();
        assert_eq!(hex.decode(&hex.encode(&[5])), Some(vec![5]));
    }
}
