use std::collections::HashMap;

pub const DEFAULT_IMAGE_URL: &str = "https://assets.coingecko.com/coins/images/1/small/bitcoin.png";

lazy_static::lazy_static! {
    static ref COIN_IMAGES: HashMap<&'static str, &'static str> = HashMap::from([
        ("bitcoin", "https://assets.coingecko.com/coins/images/1/small/bitcoin.png"),
        ("ethereum", "https://assets.coingecko.com/coins/images/279/small/ethereum.png"),
        ("binancecoin", "https://assets.coingecko.com/coins/images/825/small/bnb-icon2_2x.png"),
        ("ripple", "https://assets.coingecko.com/coins/images/44/small/xrp-symbol-white-128.png"),
        ("cardano", "https://assets.coingecko.com/coins/images/975/small/cardano.png"),
        ("solana", "https://assets.coingecko.com/coins/images/4128/small/solana.png"),
        ("dogecoin", "https://assets.coingecko.com/coins/images/5/small/dogecoin.png"),
        ("polkadot", "https://assets.coingecko.com/coins/images/12171/small/polkadot.png"),
        (
            "matic-network",
            "https://assets.coingecko.com/coins/images/4713/small/matic-token-icon.png",
        ),
        (
            "stellar",
            "https://assets.coingecko.com/coins/images/100/small/Stellar_symbol_black_RGB.png",
        ),
    ]);
}

/// Image URL for a CoinGecko coin id, or the default logo for unknown ids
pub fn image_for(coin_id: &str) -> &'static str {
    COIN_IMAGES.get(coin_id).copied().unwrap_or(DEFAULT_IMAGE_URL)
}
