#![allow(unused)]
use bdk_spend::{ConfirmationStatus, Utxo};
use bitcoin::Txid;
use std::str::FromStr;

pub const WPKH_ADDR: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";
pub const WSH_ADDR: &str = "bc1qrp33g0q5c5txsp9arysrx4k6zdkfs4nce4xj0gdcccefvpysxf3qccfmv3";
pub const TR_ADDR: &str = "bc1p5d7rjq7g6rdk2yhzks9smlaqtedr4dekq08ge8ztwac72sfr9rusxg3297";
pub const PKH_ADDR: &str = "1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2";

// Esplora `/address/:address/utxo` response of a wallet holding four outputs, one of them tiny
// and one still unconfirmed.
const ESPLORA_UTXOS: &str = r#"[
    {
        "txid": "8192e8e20088c5f052fc7351b86b8f5a8b2b4e8b2a2a3bd2f3e1b8a4d63e6b10",
        "vout": 0,
        "status": {
            "confirmed": true,
            "block_height": 781001,
            "block_hash": "00000000000000000002a7c4c1e48d76c5a37902165a270156b7a8d72728a054",
            "block_time": 1678130000
        },
        "value": 8000
    },
    {
        "txid": "ebd9813ecebc57ff8f30797de7c205e3c7498ca950ea4341ee51a685ff2fa30a",
        "vout": 1,
        "status": {
            "confirmed": true,
            "block_height": 781050,
            "block_hash": "000000000000000000036b5cf2e3e1ab76d3e0bd1cb3b7c2b33e3e6bb0a3d2f1",
            "block_time": 1678160000
        },
        "value": 120000
    },
    {
        "txid": "65d92ddff6b6dc72c89624a6491997714b90f6004f928d875bc0fd53f264fa85",
        "vout": 3,
        "status": { "confirmed": false },
        "value": 45000
    },
    {
        "txid": "65d92ddff6b6dc72c89624a6491997714b90f6004f928d875bc0fd53f264fa85",
        "vout": 4,
        "status": { "confirmed": false },
        "value": 250
    }
]"#;

pub fn get_esplora_utxos() -> Vec<Utxo> {
    serde_json::from_str(ESPLORA_UTXOS).unwrap()
}

pub fn utxo(value: u64, index: u32) -> Utxo {
    Utxo {
        txid: Txid::from_str(&format!("{:064x}", index)).unwrap(),
        vout: 0,
        value,
        status: ConfirmationStatus::default(),
    }
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
