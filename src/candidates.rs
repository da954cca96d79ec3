//! Candidate URL plan for one month's report.
//!
//! The portal has renamed its report files a few times over the years,
//! so each month maps to an ordered list of candidate URLs. The list is
//! built from pure template functions and tried strictly in order; the
//! first URL that answers 200 wins.

/// Prefix indices observed in the portal's historical file naming.
const TIER2_PREFIXES: std::ops::RangeInclusive<u32> = 1..=9;

/// Candidates before this index are tried back to back; the rest get a
/// politeness pause before each attempt.
pub const UNPACED_CANDIDATES: usize = 2;

/// The current naming convention.
fn primary_url(files_base: &str, year: i32, month: u32) -> String {
    format!("{files_base}/{year}_{month:02}_02.pdf")
}

/// Same name with a single-digit suffix, used by some months.
fn tier1_url(files_base: &str, year: i32, month: u32) -> String {
    format!("{files_base}/{year}_{month:02}_2.pdf")
}

/// Older months carry a numeric prefix of unknown meaning.
fn tier2_url(files_base: &str, index: u32, year: i32, month: u32) -> String {
    format!("{files_base}/{index}_{year}_{month:02}_2.pdf")
}

/// All candidate URLs for a month, in the order they should be tried.
pub fn candidate_urls(files_base: &str, year: i32, month: u32) -> Vec<String> {
    let mut urls = Vec::with_capacity(UNPACED_CANDIDATES + TIER2_PREFIXES.count());
    urls.push(primary_url(files_base, year, month));
    urls.push(tier1_url(files_base, year, month));
    urls.extend(TIER2_PREFIXES.map(|i| tier2_url(files_base, i, year, month)));
    urls
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.fenabrave.org.br/portal/files";

    #[test]
    fn test_candidate_order() {
        let urls = candidate_urls(BASE, 2024, 3);
        assert_eq!(urls.len(), 11);
        assert_eq!(urls[0], format!("{BASE}/2024_03_02.pdf"));
        assert_eq!(urls[1], format!("{BASE}/2024_03_2.pdf"));
        assert_eq!(urls[2], format!("{BASE}/1_2024_03_2.pdf"));
        assert_eq!(urls[10], format!("{BASE}/9_2024_03_2.pdf"));
    }

    #[test]
    fn test_month_is_zero_padded() {
        let urls = candidate_urls(BASE, 2019, 12);
        assert_eq!(urls[0], format!("{BASE}/2019_12_02.pdf"));
    }
}
