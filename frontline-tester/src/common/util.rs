use anyhow::{Context, Result, bail};

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Parse comma-separated numeric seeds. Hex literals (`0x...`) are accepted.
pub fn parse_seeds(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds = Vec::with_capacity(tokens.len());
    for token in tokens {
        let seed = if let Some(hex) = token.strip_prefix("0x") {
            u64::from_str_radix(hex, 16)
        } else {
            token.parse::<u64>()
        }
        .with_context(|| format!("invalid seed `{token}`"))?;
        if !seeds.contains(&seed) {
            seeds.push(seed);
        }
    }
    if seeds.is_empty() {
        bail!("at least one seed is required");
    }
    Ok(seeds)
}
