use crate::error::CoreError;

/// A trading pair encoded as `BASE_QUOTE` (e.g. `BTC_USDT`).
///
/// Base and quote are derived by splitting on the first `_` rather than
/// hard-coded, so new markets can be added without touching this module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    raw: String,
    base: String,
    quote: String,
}

impl Symbol {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let (base, quote) = raw.split_once('_').ok_or_else(|| {
            CoreError::InvalidArgument(format!(
                "symbol {:?} is not in BASE_QUOTE form",
                raw
            ))
        })?;
        if base.is_empty() || quote.is_empty() {
            return Err(CoreError::InvalidArgument(format!(
                "symbol {:?} has an empty base or quote",
                raw
            )));
        }
        Ok(Self {
            raw: raw.to_string(),
            base: base.to_string(),
            quote: quote.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_base_and_quote() {
        let s = Symbol::parse("BTC_USDT").unwrap();
        assert_eq!(s.base(), "BTC");
        assert_eq!(s.quote(), "USDT");
        assert_eq!(s.as_str(), "BTC_USDT");
    }

    #[test]
    fn supports_arbitrary_pairs_not_just_btc_usdt() {
        let s = Symbol::parse("ETH_DAI").unwrap();
        assert_eq!(s.base(), "ETH");
        assert_eq!(s.quote(), "DAI");
    }

    #[test]
    fn rejects_missing_separator() {
        assert!(Symbol::parse("BTCUSDT").is_err());
    }

    #[test]
    fn rejects_empty_side() {
        assert!(Symbol::parse("_USDT").is_err());
        assert!(Symbol::parse("BTC_").is_err());
    }
}
