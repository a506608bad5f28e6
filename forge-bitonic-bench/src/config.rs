use serde::{Deserialize, Serialize};

/// A benchmark profile with preset sizes, runs, and warmup.
///
/// Every size is a power of two; the bitonic network rejects anything else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchProfile {
    pub name: String,
    pub sizes: Vec<usize>,
    pub runs: u32,
    pub warmup: u32,
}

/// 2^20 / 3 runs / 1 warmup.
pub fn quick_profile() -> BenchProfile {
    BenchProfile {
        name: "quick".to_string(),
        sizes: vec![1 << 20],
        runs: 3,
        warmup: 1,
    }
}

/// 2^16 + 2^20 + 2^22 / 10 runs / 3 warmup.
pub fn standard_profile() -> BenchProfile {
    BenchProfile {
        name: "standard".to_string(),
        sizes: vec![1 << 16, 1 << 20, 1 << 22],
        runs: 10,
        warmup: 3,
    }
}

/// 2^16 through 2^24 in steps of four / 30 runs / 3 warmup.
pub fn thorough_profile() -> BenchProfile {
    BenchProfile {
        name: "thorough".to_string(),
        sizes: vec![1 << 16, 1 << 18, 1 << 20, 1 << 22, 1 << 24],
        runs: 30,
        warmup: 3,
    }
}

/// Lookup a profile by name.
pub fn get_profile(name: &str) -> Option<BenchProfile> {
    match name {
        "quick" => Some(quick_profile()),
        "standard" => Some(standard_profile()),
        "thorough" => Some(thorough_profile()),
        _ => None,
    }
}

fn parse_count(s: &str, original: &str) -> Result<usize, String> {
    s.replace('_', "")
        .parse::<usize>()
        .map_err(|e| format!("Invalid size '{}': {}", original, e))
}

/// Parse a human-readable element count.
///
/// Supports:
/// - "2^20" -> 1_048_576
/// - "64K" or "64k" -> 65_536
/// - "1M" or "1m" -> 1_048_576
/// - "1_048_576" or "1048576"
///
/// Suffixes are binary. Sizes that are not a power of two are rejected here so the
/// CLI fails before any data is generated.
pub fn parse_size(s: &str) -> Result<usize, String> {
    let s = s.trim();

    let size = if let Some((base, exp)) = s.split_once('^') {
        if base.trim() != "2" {
            return Err(format!("Invalid size '{}': only powers of 2 are supported", s));
        }
        let exp: u32 = exp
            .trim()
            .parse()
            .map_err(|e| format!("Invalid size '{}': {}", s, e))?;
        1usize
            .checked_shl(exp)
            .ok_or_else(|| format!("Invalid size '{}': exponent too large", s))?
    } else if let Some(prefix) = s.strip_suffix('M').or_else(|| s.strip_suffix('m')) {
        parse_count(prefix, s)?
            .checked_mul(1 << 20)
            .ok_or_else(|| format!("Invalid size '{}': overflow", s))?
    } else if let Some(prefix) = s.strip_suffix('K').or_else(|| s.strip_suffix('k')) {
        parse_count(prefix, s)?
            .checked_mul(1 << 10)
            .ok_or_else(|| format!("Invalid size '{}': overflow", s))?
    } else {
        parse_count(s, s)?
    };

    if size < 2 || !size.is_power_of_two() {
        return Err(format!(
            "Invalid size '{}': {} is not a power of two >= 2",
            s, size
        ));
    }
    Ok(size)
}

/// Parse a list of size strings.
pub fn parse_sizes(raw: &[String]) -> Result<Vec<usize>, String> {
    raw.iter().map(|s| parse_size(s)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size_exponent() {
        assert_eq!(parse_size("2^20").unwrap(), 1 << 20);
        assert_eq!(parse_size("2^1").unwrap(), 2);
        assert_eq!(parse_size(" 2 ^ 10 ").unwrap(), 1024);
    }

    #[test]
    fn test_parse_size_binary_suffixes() {
        assert_eq!(parse_size("64K").unwrap(), 65_536);
        assert_eq!(parse_size("64k").unwrap(), 65_536);
        assert_eq!(parse_size("1M").unwrap(), 1_048_576);
        assert_eq!(parse_size("16m").unwrap(), 16 << 20);
    }

    #[test]
    fn test_parse_size_raw() {
        assert_eq!(parse_size("1048576").unwrap(), 1 << 20);
        assert_eq!(parse_size("1_048_576").unwrap(), 1 << 20);
        assert_eq!(parse_size("  4096  ").unwrap(), 4096);
    }

    #[test]
    fn test_parse_size_rejects_non_power_of_two() {
        assert!(parse_size("1000000").is_err());
        assert!(parse_size("3K").is_err());
        assert!(parse_size("1").is_err());
        assert!(parse_size("0").is_err());
    }

    #[test]
    fn test_parse_size_invalid() {
        assert!(parse_size("abc").is_err());
        assert!(parse_size("").is_err());
        assert!(parse_size("3^4").is_err());
        assert!(parse_size("2^64").is_err());
        assert!(parse_size("1.5M").is_err());
    }

    #[test]
    fn test_parse_sizes_multiple() {
        let input = vec!["1M".to_string(), "2^12".to_string(), "64K".to_string()];
        assert_eq!(parse_sizes(&input).unwrap(), vec![1 << 20, 1 << 12, 1 << 16]);
    }

    #[test]
    fn test_parse_sizes_with_invalid() {
        let input = vec!["1M".to_string(), "bad".to_string()];
        assert!(parse_sizes(&input).is_err());
    }

    #[test]
    fn test_profiles_use_power_of_two_sizes() {
        for p in [quick_profile(), standard_profile(), thorough_profile()] {
            assert!(p.sizes.iter().all(|s| s.is_power_of_two()), "{}", p.name);
            for w in p.sizes.windows(2) {
                assert!(w[0] < w[1], "{} sizes should be ascending", p.name);
            }
        }
    }

    #[test]
    fn test_get_profile() {
        assert_eq!(get_profile("quick").unwrap().runs, 3);
        assert_eq!(get_profile("standard").unwrap().warmup, 3);
        assert_eq!(get_profile("thorough").unwrap().runs, 30);
        assert!(get_profile("unknown").is_none());
    }
}
