// Department and municipality identifiers.
//
// The same code shows up zero padded ("05") and unpadded ("5") in the same
// dataset, so every comparison goes through `normalize` and the dual path
// match of `CodeMatch`.

use std::collections::HashSet;
use std::fmt::Display;

use log::debug;

/// Maximum number of departments a multi-department report accepts.
pub const MAX_DEPARTMENTS: usize = 3;

/// Canonical form of a code: trimmed, leading zeros removed, `"0"` when
/// nothing is left.
///
/// ```
/// use congreso_report::normalize;
/// assert_eq!(normalize("011"), "11");
/// assert_eq!(normalize(11), "11");
/// assert_eq!(normalize("  000 "), "0");
/// ```
pub fn normalize<C: Display>(code: C) -> String {
    let s = code.to_string();
    let stripped = s.trim().trim_start_matches('0');
    if stripped.is_empty() {
        "0".to_string()
    } else {
        stripped.to_string()
    }
}

/// Two codes are equivalent when their normalized forms match or their
/// trimmed raw forms match. A blank second code is never equivalent.
pub fn equivalent<A: Display, B: Display>(a: A, b: B) -> bool {
    CodeMatch::new(a).matches(&b.to_string())
}

/// A requested code, prepared once for matching against many records.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct CodeMatch {
    raw: String,
    normalized: String,
}

impl CodeMatch {
    pub fn new<C: Display>(code: C) -> CodeMatch {
        let raw = code.to_string().trim().to_string();
        let normalized = normalize(&raw);
        CodeMatch { raw, normalized }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Single relation over both paths: a record matching through the
    /// normalized form and the raw form is still one match.
    ///
    /// A blank record code never matches.
    pub fn matches(&self, candidate: &str) -> bool {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return false;
        }
        candidate == self.raw || normalize(candidate) == self.normalized
    }
}

/// The department codes of a multi-department request.
///
/// Codes are trimmed, blanks dropped, deduplicated and capped at
/// [`MAX_DEPARTMENTS`], keeping the first occurrences in request order.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct DepartmentCodes(Vec<String>);

impl DepartmentCodes {
    /// Parses a comma separated list such as `"05,11, 76"`.
    pub fn parse(list: &str) -> DepartmentCodes {
        DepartmentCodes::from_codes(list.split(','))
    }

    pub fn from_codes<I, S>(codes: I) -> DepartmentCodes
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen: HashSet<String> = HashSet::new();
        let mut res: Vec<String> = Vec::new();
        for c in codes {
            let c = c.as_ref().trim();
            if c.is_empty() || seen.contains(c) {
                continue;
            }
            seen.insert(c.to_string());
            res.push(c.to_string());
            if res.len() == MAX_DEPARTMENTS {
                break;
            }
        }
        debug!("DepartmentCodes::from_codes: kept {:?}", res);
        DepartmentCodes(res)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn matchers(&self) -> Vec<CodeMatch> {
        self.0.iter().map(CodeMatch::new).collect()
    }
}

/// Lenient integer parsing for year parameters.
///
/// Leading whitespace, an optional sign and the leading digits are read;
/// anything without leading digits is treated as an absent year.
pub fn parse_year(s: &str) -> Option<i32> {
    let t = s.trim();
    let (sign, rest) = match t.as_bytes().first() {
        Some(b'-') => (-1, &t[1..]),
        Some(b'+') => (1, &t[1..]),
        _ => (1, t),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<i32>().ok().map(|y| sign * y)
}
