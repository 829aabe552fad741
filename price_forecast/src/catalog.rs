//! Fixed symbol catalog: the BIST-50 constituents traded on Borsa Istanbul

/// Symbols a forecast can be requested for
pub const BIST50_SYMBOLS: [&str; 50] = [
    "AEFES.IS", "AKBNK.IS", "ALARK.IS", "ARCLK.IS", "ASELS.IS", "ASTOR.IS", "BIMAS.IS",
    "BRSAN.IS", "CCOLA.IS", "CIMSA.IS", "DOAS.IS", "EKGYO.IS", "ENJSA.IS", "ENKAI.IS",
    "EREGL.IS", "FROTO.IS", "GARAN.IS", "GUBRF.IS", "HALKB.IS", "ISCTR.IS", "KCHOL.IS",
    "KOZAA.IS", "KOZAL.IS", "MGROS.IS", "ODAS.IS", "PETKM.IS", "PGSUS.IS", "SAHOL.IS",
    "SISE.IS", "SOKM.IS", "TAVHL.IS", "TCELL.IS", "THYAO.IS", "TKFEN.IS", "TOASO.IS",
    "TRKCM.IS", "TUPRS.IS", "VAKBN.IS", "YKBNK.IS", "ZOREN.IS", "DOHOL.IS", "KRDMD.IS",
    "SASA.IS", "ULKER.IS", "VESTL.IS", "TTKOM.IS", "TSKB.IS", "HEKTS.IS", "MAVI.IS",
    "OYAKC.IS",
];

/// The default catalog as owned strings
pub fn default_symbols() -> Vec<String> {
    BIST50_SYMBOLS.iter().map(|s| s.to_string()).collect()
}

/// Case-insensitive lookup; returns the catalog spelling
pub fn find_symbol<'a>(catalog: &'a [String], symbol: &str) -> Option<&'a str> {
    catalog
        .iter()
        .find(|s| s.eq_ignore_ascii_case(symbol.trim()))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_unique() {
        let mut symbols = default_symbols();
        symbols.sort();
        symbols.dedup();
        assert_eq!(symbols.len(), 50);
    }

    #[test]
    fn test_find_symbol_ignores_case() {
        let catalog = default_symbols();
        assert_eq!(find_symbol(&catalog, "thyao.is"), Some("THYAO.IS"));
        assert_eq!(find_symbol(&catalog, "AAPL"), None);
    }
}
