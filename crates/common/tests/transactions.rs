use ethtx_common::{
    Address, H256, U256,
    errors::TxError,
    types::{
        EIP1559Transaction, EIP2930Transaction, LegacyTransaction, LocalSigner, Transaction,
        TxFieldData, TxKind, TxType,
    },
};
use ethtx_crypto::RecoveryId;
use ethtx_rlp::{constants::RLP_EMPTY_LIST, encode::encode_length};
use hex_literal::hex;

const PRIVATE_KEY: [u8; 32] = [0x46; 32];

fn signer() -> LocalSigner {
    LocalSigner::from_slice(&PRIVATE_KEY).unwrap()
}

fn fields(json: &str) -> TxFieldData {
    serde_json::from_str(json).unwrap()
}

fn simple_legacy(chain_id: Option<&str>) -> LegacyTransaction {
    let mut fields = fields(
        r#"{
            "nonce": "0",
            "gasPrice": "20000000000",
            "gasLimit": "21000",
            "to": "0x0000000000000000000000000000000000000001",
            "value": "1000000000000000000",
            "data": ""
        }"#,
    );
    fields.chain_id = chain_id.map(str::to_string);
    LegacyTransaction::from_field_data(&fields).unwrap()
}

#[test]
fn legacy_eip155_reference_vector() {
    let tx = simple_legacy(Some("1")).sign_with(&signer()).unwrap();
    assert_eq!(tx.v(), Some(U256::from(38)));
    assert_eq!(tx.recovery_id().unwrap(), RecoveryId::ODD);
    assert_eq!(
        tx.serialize().as_ref(),
        hex!("f86c808504a817c800825208940000000000000000000000000000000000000001880de0b6b3a76400008026a0d6041012be2ea138cea626bff8462a05bf04ddd1e0200c6195d1f98c54263a9da050aeee93b08a49ffd220b77627cad45edad3ca90bd6fed75441176284f7f6a80")
    );
    assert_eq!(
        tx.hash().unwrap(),
        H256(hex!("2820bf854eb392d9614004be73d6aa7329cf453d7e9cb6b7a6dbccdea568b9b3"))
    );
}

#[test]
fn legacy_unprotected_reference_vector() {
    let tx = simple_legacy(None).sign_with(&signer()).unwrap();
    assert_eq!(tx.v(), Some(U256::from(27)));
    assert_eq!(tx.chain_id(), None);
    assert_eq!(
        tx.serialize().as_ref(),
        hex!("f86c808504a817c800825208940000000000000000000000000000000000000001880de0b6b3a7640000801ba08d345833cfd3cafe001adaec8035ad118e8dc82e9e3397c48ecfe771b0ae1ff1a033d984418978280eb7781a21365d1b8744f4e0d6fa22863873d637efba11bcb7")
    );
    assert_eq!(
        tx.hash().unwrap(),
        H256(hex!("8b0aac23fedc919de9efc015ba4b218d6a37126b97bfd315eb9aa34c2f4237c8"))
    );
}

#[test]
fn fee_market_reference_vector() {
    let tx = EIP1559Transaction::from_field_data(&fields(
        r#"{
            "chainId": "1",
            "nonce": "0",
            "maxPriorityFeePerGas": "1000000000",
            "maxFeePerGas": "20000000000",
            "gasLimit": "21000",
            "to": "0x3535353535353535353535353535353535353535",
            "value": "1000000000000000000",
            "accessList": []
        }"#,
    ))
    .unwrap();
    assert_eq!(
        tx.signing_message().as_ref(),
        hex!("02f00180843b9aca008504a817c800825208943535353535353535353535353535353535353535880de0b6b3a764000080c0")
    );

    let signed = tx.sign_with(&signer()).unwrap();
    assert_eq!(signed.v(), Some(U256::one()));
    assert_eq!(
        signed.serialize().as_ref(),
        hex!("02f8730180843b9aca008504a817c800825208943535353535353535353535353535353535353535880de0b6b3a764000080c001a0b3d7e5d4775918a0ec38e4f9da6263f69c2072c0e177ff9aa274575bfba17d04a062182875ae92e4de08aaf8ea1a43d3ea0d836745788801cdc79ccc473a76dfd9")
    );
    assert_eq!(
        signed.hash().unwrap(),
        H256(hex!("fa109002a68309c6973db528fd253fc26fa067234090c821d0664d30d281fd22"))
    );
}

#[test]
fn access_list_reference_vector() {
    let tx = EIP2930Transaction::from_field_data(&fields(
        r#"{
            "type": "0x01",
            "chainId": "0x1",
            "nonce": "3",
            "gasPrice": "20000000000",
            "gasLimit": "21000",
            "to": "0x3535353535353535353535353535353535353535",
            "value": "1000000000000000000",
            "data": "0xabcd",
            "accessList": [{
                "address": "0x3535353535353535353535353535353535353535",
                "storageKeys": [
                    "0x0000000000000000000000000000000000000000000000000000000000000000",
                    "0x0000000000000000000000000000000000000000000000000000000000000001"
                ]
            }]
        }"#,
    ))
    .unwrap();
    assert_eq!(
        tx.signing_hash(),
        H256(hex!("2e348d4308ae50badcbc84f7f81cf90c847e305f7d4101d4b7a9ea48656b9f64"))
    );

    let signed = tx.sign_with(&signer()).unwrap();
    // r has a leading zero byte and must be written as 31 bytes
    assert_eq!(
        signed.serialize().as_ref(),
        hex!("01f8cb01038504a817c800825208943535353535353535353535353535353535353535880de0b6b3a764000082abcdf85bf859943535353535353535353535353535353535353535f842a00000000000000000000000000000000000000000000000000000000000000000a00000000000000000000000000000000000000000000000000000000000000001019f416e114ca3c17dcf9dc8611dc89680c7d6b30db48bd322ff3bb4cf618e8108a071c4ddff6d587ec7d9299bead16c248550965bb2b04d2628f03c7a9e7616b162")
    );
    assert_eq!(
        signed.hash().unwrap(),
        H256(hex!("bb0253d4636eed366859fdd56de1edf3d6fea477fd441cc8fe788aef45aac261"))
    );
    assert_eq!(signed.sender().unwrap(), signer().address);
}

#[test]
fn access_list_hash_from_hive() {
    let tx = EIP2930Transaction::from_field_data(&fields(
        r#"{
            "chainId": "3503995874084926",
            "nonce": "7",
            "gasPrice": "0x2dbf1f9a",
            "gasLimit": "0x186a0",
            "to": "0x7dcd17433742f4c0ca53122ab541d0ba67fc27df",
            "value": "2",
            "data": "0xdb5306248e0313e7656d6974",
            "accessList": [{
                "address": "0x7dcd17433742f4c0ca53122ab541d0ba67fc27df",
                "storageKeys": [
                    "0x0000000000000000000000000000000000000000000000000000000000000000",
                    "0xa3d07a7d68fbd49ec2f8e6befdd86c885f86c272819f6f345f365dec35ae6707"
                ]
            }]
        }"#,
    ))
    .unwrap()
    .with_signature(
        U256::zero(),
        U256::from_dec_str(
            "75813812796588349127366022588733264074091236448495248199152066031778895768879",
        )
        .unwrap(),
        U256::from_dec_str(
            "25476208226281085290728123165613764315157904411823916642262684106502155457829",
        )
        .unwrap(),
    )
    .unwrap();
    assert_eq!(
        tx.hash().unwrap(),
        H256(hex!("a0762610d794acddd2dca15fb7c437ada3611c886f3bea675d53d8da8a6c41b2"))
    );
}

#[test]
fn decode_legacy_with_large_chain_id() {
    let encoded = hex!("f86d80843baa0c4082f618946177843db3138ae69679a54b95cf345ed759450d870aa87bee538000808360306ba0151ccc02146b9b11adf516e6787b59acae3e76544fdcd75e77e67c6b598ce65da064c5dd5aae2fbb535830ebbdad0234975cd7ece3562013b63ea18cc0df6c97d4");
    let tx = Transaction::from_serialized_bytes(&encoded).unwrap();
    assert_eq!(tx.tx_type(), TxType::Legacy);
    assert_eq!(tx.chain_id(), Some(U256::from(3151908)));
    assert_eq!(tx.v(), Some(U256::from(6303851)));
    assert_eq!(tx.recovery_id().unwrap(), RecoveryId::EVEN);
    assert_eq!(tx.gas_limit(), U256::from(63000));
    assert_eq!(
        tx.to(),
        TxKind::Call(Address::from(hex!("6177843db3138ae69679a54b95cf345ed759450d")))
    );
    assert_eq!(tx.value(), U256::from(3_000_000_000_000_000u64));
    assert_eq!(tx.serialize().as_ref(), encoded);

    // a hint for another chain conflicts with the one in v
    assert!(matches!(
        Transaction::from_serialized_bytes_with_chain_id(&encoded, Some(U256::one())),
        Err(TxError::MalformedFields(_))
    ));
}

#[test]
fn decode_fee_market_body() {
    let body = hex!("f86c8330182480114e82f618946177843db3138ae69679a54b95cf345ed759450d870aa87bee53800080c080a0151ccc02146b9b11adf516e6787b59acae3e76544fdcd75e77e67c6b598ce65da064c5dd5aae2fbb535830ebbdad0234975cd7ece3562013b63ea18cc0df6c97d4");
    let mut encoded = vec![0x02];
    encoded.extend_from_slice(&body);

    let tx = EIP1559Transaction::from_serialized_bytes(&encoded).unwrap();
    assert_eq!(tx.chain_id(), U256::from(3151908));
    assert_eq!(tx.max_priority_fee_per_gas(), U256::from(17));
    assert_eq!(tx.max_fee_per_gas(), U256::from(78));
    assert_eq!(tx.v(), Some(U256::zero()));
    assert!(tx.access_list().is_empty());
    assert_eq!(tx.serialize().as_ref(), encoded.as_slice());

    // the bare body is a legacy shaped list with the wrong arity
    assert!(matches!(
        Transaction::from_serialized_bytes(&body),
        Err(TxError::MalformedFields(_))
    ));
}

#[test]
fn round_trip_from_field_data() {
    let samples = [
        r#"{"nonce": "1", "gasPrice": "7", "gasLimit": "21000", "data": "0x6080"}"#,
        r#"{"type": "1", "chainId": "5", "gasPrice": "7", "gasLimit": "21000",
            "to": "0x0000000000000000000000000000000000000001",
            "accessList": [{"address": "0x0000000000000000000000000000000000000002", "storageKeys": []}]}"#,
        r#"{"maxFeePerGas": "0x10", "maxPriorityFeePerGas": "0x10", "gasLimit": "0x1",
            "value": "0xffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff"}"#,
    ];
    for sample in samples {
        let tx = Transaction::from_field_data(&fields(sample)).unwrap();
        let decoded = Transaction::from_serialized_bytes(&tx.serialize()).unwrap();
        assert_eq!(decoded, tx);

        let signed = tx.sign_with(&signer()).unwrap();
        let decoded = Transaction::from_serialized_bytes(&signed.serialize()).unwrap();
        assert_eq!(decoded, signed);
        assert_eq!(decoded.sender().unwrap(), signer().address);
    }
}

#[test]
fn tampered_transaction_fails_verification() {
    let signed = simple_legacy(Some("1")).sign_with(&signer()).unwrap();
    let mut bytes = signed.serialize().to_vec();
    // bump the nonce value from 0x80 (zero) to 0x01
    assert_eq!(bytes[2], 0x80);
    bytes[2] = 0x01;
    let tampered = Transaction::from_serialized_bytes(&bytes).unwrap();
    assert!(matches!(
        tampered.verify_signature(Some(&signer().public_key)),
        Err(TxError::SignatureMismatch(_))
    ));
    assert_ne!(tampered.sender().unwrap(), signer().address);
}

#[test]
fn non_canonical_encodings_are_invalid_format() {
    // the nonce written as 0x0001
    let padded_nonce = hex!("cb8200018080808080808080");
    assert!(matches!(
        LegacyTransaction::from_serialized_bytes(&padded_nonce),
        Err(TxError::InvalidFormat(msg)) if msg.contains("nonce")
    ));
    // a single byte below 0x80 wrapped in a string header
    let wrapped_byte = hex!("ca81018080808080808080");
    assert!(matches!(
        LegacyTransaction::from_serialized_bytes(&wrapped_byte),
        Err(TxError::InvalidFormat(_))
    ));
    // a short list written in long form
    let long_form = hex!("f809808080808080808080");
    assert!(matches!(
        LegacyTransaction::from_serialized_bytes(&long_form),
        Err(TxError::InvalidFormat(_))
    ));
    // trailing bytes after the list
    let trailing = hex!("c980808080808080808000");
    assert!(matches!(
        LegacyTransaction::from_serialized_bytes(&trailing),
        Err(TxError::MalformedFields(_))
    ));
}

/// `depth` lists, each holding only the next one.
fn nested_lists(depth: usize) -> Vec<u8> {
    let mut headers = Vec::new();
    let mut payload_len = 1;
    for _ in 1..depth {
        let mut header = Vec::new();
        encode_length(payload_len, &mut header);
        payload_len += header.len();
        headers.push(header);
    }
    let mut encoded: Vec<u8> = headers.into_iter().rev().flatten().collect();
    encoded.push(RLP_EMPTY_LIST);
    encoded
}

#[test]
fn deeply_nested_lists_are_malformed() {
    let legacy = nested_lists(200_000);
    assert!(matches!(
        Transaction::from_serialized_bytes(&legacy),
        Err(TxError::MalformedFields(_))
    ));

    let mut fee_market = vec![u8::from(TxType::EIP1559)];
    fee_market.extend_from_slice(&nested_lists(200_000));
    assert!(matches!(
        Transaction::from_serialized_bytes(&fee_market),
        Err(TxError::MalformedFields(_))
    ));
}

#[test]
fn oversized_lengths_are_malformed() {
    // eight length bytes claiming a 2^64 - 1 byte list
    let huge_list = hex!("ffffffffffffffffff");
    assert!(matches!(
        Transaction::from_serialized_bytes(&huge_list),
        Err(TxError::MalformedFields(_))
    ));
    // a list claiming more bytes than follow it
    let short_list = hex!("f9ffff8080");
    assert!(matches!(
        Transaction::from_serialized_bytes(&short_list),
        Err(TxError::MalformedFields(_))
    ));
    // the length bytes themselves are cut off
    let truncated = hex!("02fb0102");
    assert!(matches!(
        Transaction::from_serialized_bytes(&truncated),
        Err(TxError::MalformedFields(_))
    ));
}

#[test]
fn signatures_agree_with_k256() {
    use k256::ecdsa::{Signature, VerifyingKey, signature::hazmat::PrehashVerifier};

    let signed = simple_legacy(Some("1")).sign_with(&signer()).unwrap();
    let signature = signed.signature().copied().unwrap();
    let mut compact = [0u8; 64];
    compact[..32].copy_from_slice(&signature.r.to_big_endian());
    compact[32..].copy_from_slice(&signature.s.to_big_endian());

    let mut sec1 = vec![0x04];
    sec1.extend_from_slice(signer().public_key.as_bytes());
    let verifying_key = VerifyingKey::from_sec1_bytes(&sec1).unwrap();
    assert!(
        verifying_key
            .verify_prehash(
                signed.signing_hash().as_bytes(),
                &Signature::from_slice(&compact).unwrap()
            )
            .is_ok()
    );
}
