//! Item number lists as clinicians type them: "1, 2, 3-6".

/// Split an item list into inclusive `(start, end)` ranges; a single number
/// is `(n, n)`. Blank input yields nothing, and tokens that are neither a
/// number nor an ascending `a-b` range are skipped. Ranges are never
/// expanded, so their width costs nothing.
pub fn parse_item_ranges(s: &str) -> Vec<(u32, u32)> {
    let mut ranges = Vec::new();
    for token in s.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if let Some((start, end)) = token.split_once('-') {
            let parsed = (start.trim().parse::<u32>(), end.trim().parse::<u32>());
            if let (Ok(start), Ok(end)) = parsed {
                if start <= end {
                    ranges.push((start, end));
                }
            }
        } else if let Ok(n) = token.parse::<u32>() {
            ranges.push((n, n));
        }
    }
    ranges
}

/// First item outside `min..=max`, if any. Blank lists are always valid.
pub fn items_within(s: &str, min: u32, max: u32) -> Result<(), u32> {
    for (start, end) in parse_item_ranges(s) {
        if start < min {
            return Err(start);
        }
        if end > max {
            return Err(end);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item_ranges() {
        assert_eq!(parse_item_ranges("1, 2, 3-6"), vec![(1, 1), (2, 2), (3, 6)]);
        assert_eq!(parse_item_ranges("  "), Vec::<(u32, u32)>::new());
        assert_eq!(parse_item_ranges("4,x, 7 - 8,"), vec![(4, 4), (7, 8)]);
        assert_eq!(parse_item_ranges("9-7"), Vec::<(u32, u32)>::new());
    }

    #[test]
    fn test_items_within() {
        assert_eq!(items_within("", 12, 24), Ok(()));
        assert_eq!(items_within("12, 20-24", 12, 24), Ok(()));
        assert_eq!(items_within("12, 25", 12, 24), Err(25));
        assert_eq!(items_within("3", 12, 24), Err(3));
        assert_eq!(items_within("20-30", 12, 24), Err(30));
    }

    #[test]
    fn test_huge_range_is_rejected_without_expanding() {
        assert_eq!(items_within("1-4294967295", 1, 11), Err(4294967295));
        assert_eq!(parse_item_ranges("0-4294967295"), vec![(0, u32::MAX)]);
    }
}
