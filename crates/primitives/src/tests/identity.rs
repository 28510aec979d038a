use rand::thread_rng;

use super::*;

#[test]
fn test_sign_and_verify() {
    let key_pair = KeyPair::generate(&mut thread_rng());

    let signature = key_pair.sign(b"prove it");

    assert!(key_pair.public_key().verify(b"prove it", &signature));
    assert!(!key_pair.public_key().verify(b"prove it!", &signature));
}

#[test]
fn test_verify_rejects_foreign_key() {
    let signer = KeyPair::generate(&mut thread_rng());
    let other = KeyPair::generate(&mut thread_rng());

    let signature = signer.sign(b"message");

    assert!(!other.public_key().verify(b"message", &signature));
}

#[test]
fn test_verify_rejects_flipped_signature_byte() {
    let key_pair = KeyPair::generate(&mut thread_rng());

    let mut bytes = key_pair.sign(b"message").to_bytes();
    bytes[0] ^= 0x01;

    assert!(!key_pair
        .public_key()
        .verify(b"message", &Signature::from_bytes(bytes)));
}

#[test]
fn test_key_pair_public_key_matches_private() {
    let private_key = PrivateKey::random(&mut thread_rng());
    let key_pair = KeyPair::from_private_key(private_key.clone());

    assert_eq!(*key_pair.public_key(), private_key.public_key());
}

#[test]
fn test_public_key_base58_round_trip() {
    let public_key = *KeyPair::generate(&mut thread_rng()).public_key();

    let encoded = public_key.to_string();
    let decoded: PublicKey = encoded.parse().unwrap();

    assert_eq!(decoded, public_key);
    assert_eq!(decoded.as_bytes(), public_key.as_bytes());
}

#[test]
fn test_public_key_rejects_short_input() {
    let encoded = bs58::encode([7_u8; 16]).into_string();

    let err = encoded.parse::<PublicKey>().unwrap_err();

    assert!(matches!(err, InvalidPublicKey::Length(16)));
}

#[test]
fn test_public_key_rejects_invalid_point() {
    // Not every 32-byte string decompresses to a point on the curve.
    let mut bytes = [0_u8; PUBLIC_KEY_LEN];
    bytes[0] = 2;

    assert!(matches!(
        PublicKey::from_bytes(&bytes),
        Err(InvalidPublicKey::Point)
    ));
}

#[test]
fn test_public_key_try_from_slice_length() {
    assert!(matches!(
        PublicKey::try_from_slice(&[0_u8; 31]),
        Err(InvalidPublicKey::Length(31))
    ));
}

#[test]
fn test_public_key_serde_as_string() {
    let public_key = *KeyPair::generate(&mut thread_rng()).public_key();

    let json = serde_json::to_value(public_key).unwrap();
    assert_eq!(json, serde_json::Value::String(public_key.to_string()));

    let decoded: PublicKey = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, public_key);
}

#[test]
fn test_private_key_debug_is_redacted() {
    let key_pair = KeyPair::generate(&mut thread_rng());

    let rendered = format!("{:?}", key_pair.private_key());

    assert_eq!(rendered, "PrivateKey(<redacted>)");
}

#[test]
fn test_signature_try_from_slice() {
    assert!(Signature::try_from_slice(&[0_u8; SIGNATURE_LEN]).is_some());
    assert!(Signature::try_from_slice(&[0_u8; SIGNATURE_LEN - 1]).is_none());
}
