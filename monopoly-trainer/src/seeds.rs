use anyhow::{Context, Result, bail};

const DEFAULT_SEED: u64 = 1337;
const MAX_RANGE_SEEDS: u64 = 10_000;

/// Resolve CLI seed tokens into a deduplicated, ordered seed list.
///
/// Accepts literal integers (negative values use their magnitude) and
/// inclusive ranges written `start..end`. An empty list resolves to the
/// default seed.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut pending: Vec<u64> = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        if let Some((start, end)) = token.split_once("..") {
            let range =
                parse_range(start, end).with_context(|| format!("bad seed range: {token}"))?;
            pending.extend(range);
            continue;
        }

        if let Ok(value) = token.parse::<i64>() {
            pending.push(value.unsigned_abs());
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            pending.push(value);
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    let mut deduped: Vec<u64> = Vec::with_capacity(pending.len());
    for seed in pending {
        if !deduped.contains(&seed) {
            deduped.push(seed);
        }
    }

    if deduped.is_empty() {
        deduped.push(DEFAULT_SEED);
    }

    Ok(deduped)
}

fn parse_range(start: &str, end: &str) -> Result<Vec<u64>> {
    let start: u64 = start.trim().parse()?;
    let end: u64 = end.trim().parse()?;
    if end < start {
        bail!("range end {end} is below start {start}");
    }
    if end - start >= MAX_RANGE_SEEDS {
        bail!("range spans more than {MAX_RANGE_SEEDS} seeds");
    }
    Ok((start..=end).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn resolves_numeric_and_negative_seeds() {
        let seeds = resolve_seed_inputs(&tokens(&["42", "-7", "42"])).unwrap();
        assert_eq!(seeds, vec![42, 7]);
    }

    #[test]
    fn expands_inclusive_ranges() {
        let seeds = resolve_seed_inputs(&tokens(&["3..5", "4"])).unwrap();
        assert_eq!(seeds, vec![3, 4, 5]);
        assert!(resolve_seed_inputs(&tokens(&["5..3"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["0..20000"])).is_err());
    }

    #[test]
    fn empty_input_uses_default() {
        assert_eq!(resolve_seed_inputs(&[]).unwrap(), vec![DEFAULT_SEED]);
    }

    #[test]
    fn rejects_garbage() {
        let err = resolve_seed_inputs(&tokens(&["banana"])).unwrap_err();
        assert!(err.to_string().contains("banana"));
    }
}
