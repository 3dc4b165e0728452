use std::hash::BuildHasher;

use twox_hash::XxHash64;

const DEFINITION_SEED: u64 = 0xdeadbeef;

/// An implementation of [`BuildHasher`] that hands out xxhash64 hashers with a
/// fixed seed. Registry lookups are keyed by small `(key, kind)` pairs, so we
/// trade DoS resistance for a cheaper hash.
#[derive(Default, Debug, Clone, Copy)]
pub struct BuildSeededHasher;

impl BuildHasher for BuildSeededHasher {
    type Hasher = XxHash64;

    fn build_hasher(&self) -> Self::Hasher {
        XxHash64::with_seed(DEFINITION_SEED)
    }
}

/// Convert a string into dot notation, ex: "This is a String." becomes
/// "this.is.a.string".
///
/// Every space separated segment is camel cased and the segments are joined
/// with `.`. Blank input produces an empty string.
///
/// When `normalize_case` is set the result is split again on `.` and run back
/// through the same routine, which forces segments that already contained dots
/// through camel casing as well: "this.Is.A string" becomes "this.Is.A.string"
/// without normalization and "this.is.a.string" with it.
pub fn dot_notation(input: &str, normalize_case: bool) -> String {
    if input.trim().is_empty() {
        return String::new();
    }
    let segments: Vec<&str> = input.split(' ').collect();
    let mut result = String::with_capacity(input.len());
    for (index, segment) in segments.iter().enumerate() {
        if segment.trim().is_empty() {
            continue;
        }
        result.push_str(&camel_case(segment));
        if index < segments.len() - 1 {
            result.push('.');
        }
    }
    if result.ends_with('.') {
        result.pop();
    }
    if normalize_case {
        dot_notation(&result.replace('.', " "), false)
    } else {
        result
    }
}

/// Lower the leading run of upper case characters in `name`, leaving the
/// character that starts the next word alone: "StringThing" becomes
/// "stringThing" and "HTTPServer" becomes "httpServer". Names that do not start
/// with an upper case character are returned untouched.
pub fn camel_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    match chars.first() {
        Some(first) if first.is_uppercase() => {}
        _ => return name.to_string(),
    }

    let mut lowered = 0;
    for index in 0..chars.len() {
        if index == 1 && !chars[index].is_uppercase() {
            break;
        }
        let next = chars.get(index + 1);
        if index > 0 {
            if let Some(next) = next {
                if !next.is_uppercase() {
                    // A space after the run still belongs to the current word.
                    if *next == ' ' {
                        lowered = index + 1;
                    }
                    break;
                }
            }
        }
        lowered = index + 1;
    }

    let mut result = String::with_capacity(name.len());
    for (index, c) in chars.into_iter().enumerate() {
        if index < lowered {
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}
