//! Generate key material for a bridge deployment.
//!
//! Prints, as `.env` lines for the attestor plus the values the bridge is
//! instantiated with:
//! - the verifier signing key and its address (`InstantiateMsg.verifier`)
//! - the amount decryption key and its encryption key (`InstantiateMsg.encryption_key`)

use common::DecryptionKey;
use cosmic_attestor::AttestationSigner;
use rand::rngs::OsRng;

fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let signer = AttestationSigner::generate(&mut OsRng)?;
    let decryption = DecryptionKey::generate(&mut OsRng);
    let encryption_key = decryption.encryption_key();

    println!("# Attestor (keep secret)");
    println!("ATTESTOR_SIGNING_KEY={}", signer.to_hex());
    println!("ATTESTOR_DECRYPTION_KEY={}", hex::encode(decryption.to_bytes()));
    println!();
    println!("# Bridge instantiation");
    println!("# verifier: {}", signer.address());
    println!("# encryption_key (hex): {}", encryption_key.to_hex());
    println!("# encryption_key (base64): {}", encryption_key.to_binary().to_base64());
    Ok(())
}
