use bitvec::prelude::{BitVec, Lsb0};
use frame_metadata::{
    v14::{
        ExtrinsicMetadata, PalletCallMetadata, PalletMetadata, RuntimeMetadataV14,
        SignedExtensionMetadata,
    },
    v15::{self, CustomMetadata, OuterEnums, RuntimeMetadataV15},
    RuntimeMetadata, RuntimeMetadataPrefixed, META_RESERVED,
};
use num_bigint::BigUint;
use parity_scale_codec::{Decode, Encode};
use primitive_types::H256;
use scale_info::{meta_type, MetaType, Type, TypeDefPrimitive, TypeInfo};
use sp_core::{sr25519, Pair};
use sp_core_hashing::blake2_256;
use std::{
    boxed::Box,
    collections::BTreeMap,
    marker::PhantomData,
    string::{String, ToString},
    vec::Vec,
};

use crate::compacts::{compact_len, get_compact, put_compact};
use crate::error::{
    CallError, EncodeError, EnvelopeError, EraError, LookupError, MetadataError, ParserError,
    RegistryError, SignatureError, Ss58Error, TransactionError,
};
use crate::metadata::TypedError;
use crate::ss58;
use crate::types::TypeDescriptor;
use crate::{
    apply_signature, build_signing_payload, build_unsigned, decode_call_all, decode_transaction,
    decode_transaction_hex, encode_call, tx_hash, ChainSpecs, Era, EraConfig, Metadata,
    NamedArgs, SignatureScheme, SignerAddress, TxFormat, TxOptions, Value,
};

type Balance = u128;

#[derive(TypeInfo)]
struct Runtime;

#[derive(Clone, Encode, TypeInfo)]
pub struct AccountId20(pub [u8; 20]);

#[derive(Encode, TypeInfo)]
pub struct AccountId32(pub [u8; 32]);

#[derive(Encode, TypeInfo)]
pub enum MultiAddress {
    Id(AccountId32),
    Index(#[codec(compact)] u32),
    Raw(Vec<u8>),
    Address32([u8; 32]),
    Address20([u8; 20]),
}

#[derive(Encode, TypeInfo)]
pub enum MultiSignature {
    Ed25519([u8; 64]),
    Sr25519([u8; 64]),
    Ecdsa([u8; 65]),
}

#[derive(Encode, TypeInfo)]
pub struct CheckMortality(u8);

#[derive(Encode, TypeInfo)]
pub struct CheckNonce(#[codec(compact)] u64);

#[derive(Encode, TypeInfo)]
pub struct ChargeTransactionPayment(#[codec(compact)] u128);

type Extra = (CheckMortality, CheckNonce, ChargeTransactionPayment);

#[derive(TypeInfo)]
pub struct UncheckedExtrinsic<Address, Call, Signature, Extra>(
    Vec<u8>,
    PhantomData<(Address, Call, Signature, Extra)>,
);

#[derive(Encode, TypeInfo)]
#[allow(non_camel_case_types)]
pub enum SystemCall {
    #[codec(index = 0)]
    remark { remark: Vec<u8> },
    #[codec(index = 7)]
    set_pair(u8, u16),
}

#[derive(Encode, TypeInfo)]
#[allow(non_camel_case_types)]
pub enum BalancesCall {
    #[codec(index = 0)]
    transfer {
        dest: AccountId20,
        #[codec(compact)]
        value: Balance,
    },
    #[codec(index = 3)]
    transfer_keep_alive {
        dest: MultiAddress,
        #[codec(compact)]
        value: Balance,
    },
}

#[derive(Encode, TypeInfo)]
pub struct Vote(pub u8);

#[derive(Encode, TypeInfo)]
pub enum AccountVote {
    Standard { vote: Vote, balance: Balance },
    Split { aye: Balance, nay: Balance },
}

#[derive(Encode, TypeInfo)]
#[allow(non_camel_case_types)]
pub enum DemocracyCall {
    #[codec(index = 2)]
    vote {
        #[codec(compact)]
        ref_index: u32,
        vote: AccountVote,
    },
}

#[derive(Encode, TypeInfo)]
#[allow(non_camel_case_types)]
pub enum UtilityCall {
    #[codec(index = 0)]
    batch { calls: Vec<RuntimeCall> },
}

/// 256-bit unsigned integer, little endian.
#[derive(Encode)]
pub struct Wide(pub [u8; 32]);

impl TypeInfo for Wide {
    type Identity = Self;
    fn type_info() -> Type {
        TypeDefPrimitive::U256.into()
    }
}

#[derive(Encode, TypeInfo)]
pub struct Loop {
    inner: Box<Loop>,
}

mod first {
    use parity_scale_codec::Encode;
    use scale_info::TypeInfo;

    #[derive(Encode, TypeInfo)]
    pub struct Id(pub u8);
}

mod second {
    use parity_scale_codec::Encode;
    use scale_info::TypeInfo;

    #[derive(Encode, TypeInfo)]
    pub struct Id(pub u16);
}

#[derive(Encode, TypeInfo)]
#[allow(non_camel_case_types)]
pub enum KitchenCall {
    #[codec(index = 0)]
    kitchen_sink {
        flag: bool,
        memo: Option<String>,
        text: String,
        pair: (u16, i32),
        weights: [u32; 3],
        bits: BitVec<u8, Lsb0>,
        big: Wide,
        signed: i64,
        nothing: (),
    },
    #[codec(index = 1)]
    endless { inner: Loop },
    #[codec(index = 2)]
    ids { first: first::Id, second: second::Id },
    #[codec(index = 3)]
    toggle { maybe: Option<bool> },
    #[codec(index = 4)]
    units { units: Vec<()> },
}

#[derive(Encode, TypeInfo)]
pub enum RuntimeCall {
    #[codec(index = 0)]
    System(SystemCall),
    #[codec(index = 10)]
    Balances(BalancesCall),
    #[codec(index = 14)]
    Democracy(DemocracyCall),
    #[codec(index = 26)]
    Utility(UtilityCall),
    #[codec(index = 40)]
    Kitchen(KitchenCall),
}

fn pallet_v14(name: &'static str, index: u8, calls: Option<MetaType>) -> PalletMetadata {
    PalletMetadata {
        name,
        storage: None,
        calls: calls.map(|ty| PalletCallMetadata { ty }),
        event: None,
        constants: Vec::new(),
        error: None,
        index,
    }
}

fn pallets_v14() -> Vec<PalletMetadata> {
    vec![
        pallet_v14("System", 0, Some(meta_type::<SystemCall>())),
        pallet_v14("Timestamp", 3, None),
        pallet_v14("Balances", 10, Some(meta_type::<BalancesCall>())),
        pallet_v14("Democracy", 14, Some(meta_type::<DemocracyCall>())),
        pallet_v14("Utility", 26, Some(meta_type::<UtilityCall>())),
        pallet_v14("Kitchen", 40, Some(meta_type::<KitchenCall>())),
    ]
}

fn signed_extension_v14(
    identifier: &'static str,
    ty: MetaType,
    additional_signed: MetaType,
) -> SignedExtensionMetadata {
    SignedExtensionMetadata {
        identifier,
        ty,
        additional_signed,
    }
}

fn runtime_metadata_v14(pallets: Vec<PalletMetadata>) -> RuntimeMetadataV14 {
    RuntimeMetadataV14::new(
        pallets,
        ExtrinsicMetadata {
            ty: meta_type::<UncheckedExtrinsic<MultiAddress, RuntimeCall, MultiSignature, Extra>>(),
            version: 4,
            signed_extensions: vec![
                signed_extension_v14("CheckSpecVersion", meta_type::<()>(), meta_type::<u32>()),
                signed_extension_v14("CheckTxVersion", meta_type::<()>(), meta_type::<u32>()),
                signed_extension_v14("CheckGenesis", meta_type::<()>(), meta_type::<[u8; 32]>()),
                signed_extension_v14(
                    "CheckMortality",
                    meta_type::<CheckMortality>(),
                    meta_type::<[u8; 32]>(),
                ),
                signed_extension_v14("CheckNonce", meta_type::<CheckNonce>(), meta_type::<()>()),
                signed_extension_v14(
                    "ChargeTransactionPayment",
                    meta_type::<ChargeTransactionPayment>(),
                    meta_type::<()>(),
                ),
            ],
        },
        meta_type::<Runtime>(),
    )
}

fn metadata_v14_bytes() -> Vec<u8> {
    RuntimeMetadataPrefixed(
        META_RESERVED,
        RuntimeMetadata::V14(runtime_metadata_v14(pallets_v14())),
    )
    .encode()
}

fn metadata() -> Metadata {
    Metadata::parse(&metadata_v14_bytes()).unwrap()
}

fn pallet_v15(name: &'static str, index: u8, calls: Option<MetaType>) -> v15::PalletMetadata {
    v15::PalletMetadata {
        name,
        storage: None,
        calls: calls.map(|ty| v15::PalletCallMetadata { ty }),
        event: None,
        constants: Vec::new(),
        error: None,
        index,
        docs: Vec::new(),
    }
}

fn metadata_v15_bytes() -> Vec<u8> {
    let runtime_metadata = RuntimeMetadataV15::new(
        vec![
            pallet_v15("System", 0, Some(meta_type::<SystemCall>())),
            pallet_v15("Balances", 10, Some(meta_type::<BalancesCall>())),
        ],
        v15::ExtrinsicMetadata {
            version: 4,
            address_ty: meta_type::<MultiAddress>(),
            call_ty: meta_type::<RuntimeCall>(),
            signature_ty: meta_type::<MultiSignature>(),
            extra_ty: meta_type::<Extra>(),
            signed_extensions: Vec::new(),
        },
        meta_type::<Runtime>(),
        Vec::new(),
        OuterEnums {
            call_enum_ty: meta_type::<RuntimeCall>(),
            event_enum_ty: meta_type::<()>(),
            error_enum_ty: meta_type::<()>(),
        },
        CustomMetadata {
            map: BTreeMap::new(),
        },
    );
    RuntimeMetadataPrefixed(META_RESERVED, RuntimeMetadata::V15(runtime_metadata)).encode()
}

fn specs() -> ChainSpecs {
    ChainSpecs {
        base58prefix: 42,
        era: EraConfig::default(),
    }
}

const ALICE_PUBLIC: &str = "d43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d";
const ALICE_SS58: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";

fn alice() -> SignerAddress {
    SignerAddress(hex::decode(ALICE_PUBLIC).unwrap())
}

fn genesis_hash() -> H256 {
    H256::repeat_byte(0xe1)
}

fn options(nonce: u64, tip: u128, era: Era) -> TxOptions {
    TxOptions {
        nonce,
        tip,
        era,
        spec_version: 9111,
        transaction_version: 7,
        genesis_hash: genesis_hash(),
        block_hash: if era.is_immortal() {
            genesis_hash()
        } else {
            H256::repeat_byte(0x5b)
        },
        signer: alice(),
        era_config: EraConfig::default(),
    }
}

fn args(set: Vec<(&str, Value)>) -> NamedArgs {
    set.into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

fn transfer_args(dest: [u8; 20], value: u128) -> NamedArgs {
    args(vec![
        ("dest", Value::unnamed_composite(vec![Value::Bytes(dest.to_vec())])),
        ("value", Value::U128(value)),
    ])
}

#[test]
fn compact_width_classes() {
    let known: [(u64, usize); 7] = [
        (0, 1),
        (63, 1),
        (64, 2),
        (16383, 2),
        (16384, 4),
        ((1 << 30) - 1, 4),
        (1 << 30, 5),
    ];
    for (value, width) in known {
        let mut out = Vec::new();
        put_compact(value, &mut out);
        assert_eq!(out.len(), width, "value {value}");
        assert_eq!(compact_len(out[0]), width, "value {value}");
        let mut position = 0;
        assert_eq!(get_compact::<u64>(&out, &mut position).unwrap(), value);
        assert_eq!(position, width);
    }
}

#[test]
fn compact_rejects_non_canonical() {
    // zero in two-byte mode
    let mut position = 0;
    assert_eq!(
        get_compact::<u32>(&[0b0000_0001, 0], &mut position),
        Err(ParserError::NoCompact { position: 0 })
    );
    assert_eq!(position, 0);

    // does not fit into `u8`
    let mut position = 0;
    assert!(get_compact::<u8>(&[0x01, 0x04], &mut position).is_err());

    let mut position = 0;
    assert_eq!(
        get_compact::<u32>(&[], &mut position),
        Err(ParserError::DataTooShort {
            position: 0,
            minimal_length: 1
        })
    );
}

#[test]
fn metadata_parses() {
    let metadata = metadata();
    assert_eq!(metadata.version(), 14);
    assert_eq!(metadata.pallets().len(), 6);
    assert_eq!(metadata.extrinsic().version, 4);
    let identifiers: Vec<&str> = metadata
        .extrinsic()
        .signed_extensions
        .iter()
        .map(|ext| ext.identifier.as_str())
        .collect();
    assert_eq!(
        identifiers,
        vec![
            "CheckSpecVersion",
            "CheckTxVersion",
            "CheckGenesis",
            "CheckMortality",
            "CheckNonce",
            "ChargeTransactionPayment"
        ]
    );
    let timestamp = metadata.pallet_by_name("Timestamp").unwrap();
    assert!(timestamp.calls.is_empty());
    assert_eq!(timestamp.call_ty, None);
}

#[test]
fn metadata_truncated() {
    let bytes = metadata_v14_bytes();
    assert_eq!(
        Metadata::parse(&bytes[..bytes.len() / 2]),
        Err(MetadataError::Undecodable { version: 14 })
    );
}

#[test]
fn metadata_unsupported_version() {
    let mut bytes = metadata_v14_bytes();
    bytes[4] = 13;
    assert_eq!(
        Metadata::parse(&bytes),
        Err(MetadataError::UnsupportedVersion(13))
    );
}

#[test]
fn metadata_not_metadata() {
    assert_eq!(
        Metadata::parse(b"definitely not metadata"),
        Err(MetadataError::NoMagic)
    );
    assert_eq!(Metadata::parse(b"meta"), Err(MetadataError::TooShort));
    assert_eq!(Metadata::from_hex("0xzz"), Err(MetadataError::Hex));
}

#[test]
fn metadata_trailing_data() {
    let mut bytes = metadata_v14_bytes();
    let len = bytes.len();
    bytes.push(0);
    assert_eq!(
        Metadata::parse(&bytes),
        Err(MetadataError::SomeDataNotUsed { from: len })
    );
}

#[test]
fn metadata_opaque_and_hex() {
    let bytes = metadata_v14_bytes();
    let opaque = bytes.encode();
    assert_eq!(Metadata::parse(&opaque).unwrap(), metadata());

    let hex_metadata = format!("0x{}", hex::encode(&bytes));
    assert_eq!(Metadata::from_hex(&hex_metadata).unwrap(), metadata());
}

#[test]
fn metadata_duplicate_pallet_index() {
    let mut pallets = pallets_v14();
    pallets.push(pallet_v14("Impostor", 10, None));
    let runtime_metadata = runtime_metadata_v14(pallets);
    assert_eq!(
        Metadata::from_runtime_metadata(14, &runtime_metadata),
        Err(MetadataError::DuplicatePalletIndex(10))
    );
}

#[test]
fn metadata_duplicate_pallet_name() {
    let mut pallets = pallets_v14();
    pallets.push(pallet_v14("Balances", 11, None));
    let runtime_metadata = runtime_metadata_v14(pallets);
    assert_eq!(
        Metadata::from_runtime_metadata(14, &runtime_metadata),
        Err(MetadataError::DuplicatePalletName(String::from("Balances")))
    );
}

#[test]
fn metadata_v15() {
    let metadata_v15 = Metadata::parse(&metadata_v15_bytes()).unwrap();
    assert_eq!(metadata_v15.version(), 15);
    assert_eq!(metadata_v15.pallets().len(), 2);

    let call_args = transfer_args([7; 20], 1_000_000);
    assert_eq!(
        encode_call("Balances", "transfer", &call_args, &metadata_v15).unwrap(),
        encode_call("Balances", "transfer", &call_args, &metadata()).unwrap()
    );

    let unsigned = build_unsigned(
        encode_call("Balances", "transfer", &call_args, &metadata_v15).unwrap(),
        options(1, 0, Era::Immortal),
        &metadata_v15,
    )
    .unwrap();
    let decoded = decode_transaction(&unsigned.encode(), &metadata_v15).unwrap();
    assert_eq!(decoded.format, TxFormat::Unsigned);
    assert_eq!(decoded.call.named_args(), call_args);
}

#[test]
fn resolve_call_by_names() {
    let metadata = metadata();
    let descriptor = metadata.resolve_call("Balances", "transfer").unwrap();
    assert_eq!(descriptor.pallet_index, 10);
    assert_eq!(descriptor.call_index, 0);
    let arg_names: Vec<&str> = descriptor.args.iter().map(|arg| arg.name.as_str()).collect();
    assert_eq!(arg_names, vec!["dest", "value"]);

    let descriptor = metadata.resolve_call("Democracy", "vote").unwrap();
    assert_eq!(descriptor.pallet_index, 14);
    assert_eq!(descriptor.call_index, 2);

    // names are case-sensitive
    assert_eq!(
        metadata.resolve_call("balances", "transfer"),
        Err(LookupError::UnknownPallet {
            pallet: String::from("balances")
        })
    );
}

#[test]
fn unknown_call() {
    assert_eq!(
        encode_call("Balances", "doesNotExist", &NamedArgs::new(), &metadata()),
        Err(CallError::Lookup(LookupError::UnknownCall {
            pallet: String::from("Balances"),
            call: String::from("doesNotExist")
        }))
    );
}

#[test]
fn resolve_types_by_names() {
    let metadata = metadata();

    let (_, descriptor) = metadata.resolve_type("AccountId20").unwrap();
    assert!(matches!(descriptor, TypeDescriptor::Struct(fields) if fields.len() == 1));

    let (id_short, _) = metadata.resolve_type("AccountId20").unwrap();
    let (id_full, _) = metadata
        .resolve_type("substrate_tx::tests::AccountId20")
        .unwrap();
    assert_eq!(id_short, id_full);

    let (_, descriptor) = metadata.resolve_type("[u8; 20]").unwrap();
    assert!(matches!(descriptor, TypeDescriptor::FixedArray { len: 20, .. }));

    // call argument type name
    let (_, descriptor) = metadata.resolve_type("Balance").unwrap();
    assert!(matches!(descriptor, TypeDescriptor::Compact(_)));

    let (_, descriptor) = metadata.resolve_type("Option<bool>").unwrap();
    assert!(matches!(descriptor, TypeDescriptor::Option(_)));

    assert_eq!(
        metadata.resolve_type("Id"),
        Err(LookupError::AmbiguousType {
            name: String::from("Id")
        })
    );
    assert!(metadata.resolve_type("substrate_tx::tests::first::Id").is_ok());

    assert_eq!(
        metadata.resolve_type("NoSuchType"),
        Err(LookupError::UnknownType {
            name: String::from("NoSuchType")
        })
    );
}

#[test]
fn encode_and_decode_values() {
    let metadata = metadata();

    assert_eq!(
        metadata.encode_value("u16", &Value::U16(513)).unwrap(),
        vec![1, 2]
    );
    assert_eq!(
        metadata.encode_value("Balance", &Value::U128(5)).unwrap(),
        vec![20]
    );
    assert_eq!(
        metadata
            .encode_value("Vec<u8>", &Value::Bytes(vec![1, 2, 3]))
            .unwrap(),
        vec![12, 1, 2, 3]
    );
    // same bytes, given as a sequence of integers
    assert_eq!(
        metadata
            .encode_value(
                "Vec<u8>",
                &Value::Sequence(vec![Value::U8(1), Value::U8(2), Value::U8(3)])
            )
            .unwrap(),
        vec![12, 1, 2, 3]
    );
    assert_eq!(
        metadata.decode_value("Vec<u8>", &[12, 1, 2, 3]).unwrap(),
        Value::Bytes(vec![1, 2, 3])
    );

    let big: BigUint = BigUint::from(1u8) << 255u32;
    let encoded = metadata
        .encode_value("u256", &Value::U256(big.clone()))
        .unwrap();
    assert_eq!(encoded.len(), 32);
    assert_eq!(encoded[31], 0x80);
    assert_eq!(
        metadata.decode_value("u256", &encoded).unwrap(),
        Value::U256(big)
    );
}

#[test]
fn codec_errors() {
    let metadata = metadata();

    assert!(matches!(
        metadata.encode_value("u8", &Value::U16(256)),
        Err(TypedError::Codec(EncodeError::IntegerOutOfRange { ty: "u8", .. }))
    ));
    assert!(matches!(
        metadata.encode_value("Balance", &Value::I8(-1)),
        Err(TypedError::Codec(EncodeError::IntegerOutOfRange { ty: "u128", .. }))
    ));
    assert!(matches!(
        metadata.encode_value("[u8; 20]", &Value::Bytes(vec![0; 19])),
        Err(TypedError::Codec(EncodeError::ArrayLengthMismatch {
            expected: 20,
            found: 19,
            ..
        }))
    ));
    assert!(matches!(
        metadata.encode_value("bool", &Value::U8(1)),
        Err(TypedError::Codec(EncodeError::UnexpectedValue { .. }))
    ));
    assert!(matches!(
        metadata.encode_value("NoSuchType", &Value::U8(1)),
        Err(TypedError::Lookup(LookupError::UnknownType { .. }))
    ));

    assert_eq!(
        metadata.decode_value("bool", &[2]),
        Err(TypedError::Codec(ParserError::TypeFailure {
            position: 0,
            ty: "bool"
        }))
    );
    assert_eq!(
        metadata.decode_value("u16", &[1]),
        Err(TypedError::Codec(ParserError::DataTooShort {
            position: 0,
            minimal_length: 2
        }))
    );
    assert_eq!(
        metadata.decode_value("u16", &[1, 2, 3]),
        Err(TypedError::Codec(ParserError::SomeDataNotUsedBlob { from: 2 }))
    );
}

#[test]
fn call_matches_derived_encoding() {
    let metadata = metadata();

    let encoded = encode_call("Balances", "transfer", &transfer_args([7; 20], 10), &metadata).unwrap();
    let expected = RuntimeCall::Balances(BalancesCall::transfer {
        dest: AccountId20([7; 20]),
        value: 10,
    })
    .encode();
    assert_eq!(encoded, expected);

    // bare bytes are accepted for newtype
    let encoded = encode_call(
        "Balances",
        "transfer",
        &args(vec![
            ("dest", Value::Bytes(vec![7; 20])),
            ("value", Value::U64(10)),
        ]),
        &metadata,
    )
    .unwrap();
    assert_eq!(encoded, expected);
}

#[test]
fn enum_argument_uses_declared_index() {
    let metadata = metadata();
    let encoded = encode_call(
        "Democracy",
        "vote",
        &args(vec![
            ("ref_index", Value::U32(7)),
            (
                "vote",
                Value::named_variant(
                    "Split",
                    vec![("aye", Value::U128(10)), ("nay", Value::U128(5))],
                ),
            ),
        ]),
        &metadata,
    )
    .unwrap();
    let expected = RuntimeCall::Democracy(DemocracyCall::vote {
        ref_index: 7,
        vote: AccountVote::Split { aye: 10, nay: 5 },
    })
    .encode();
    assert_eq!(encoded, expected);
    assert_eq!(&encoded[..3], &[14, 2, 28]);

    let error = encode_call(
        "Democracy",
        "vote",
        &args(vec![
            ("ref_index", Value::U32(7)),
            ("vote", Value::unnamed_variant("Abstain", vec![])),
        ]),
        &metadata,
    )
    .unwrap_err();
    assert!(matches!(
        error,
        CallError::ArgumentType {
            error: EncodeError::UnknownVariant { .. },
            ..
        }
    ));
}

#[test]
fn nested_calls() {
    let metadata = metadata();
    let call_args = args(vec![(
        "calls",
        Value::Sequence(vec![
            Value::unnamed_variant(
                "Balances",
                vec![Value::named_variant(
                    "transfer",
                    vec![
                        (
                            "dest",
                            Value::unnamed_composite(vec![Value::Bytes(vec![7; 20])]),
                        ),
                        ("value", Value::U128(10)),
                    ],
                )],
            ),
            Value::unnamed_variant(
                "System",
                vec![Value::named_variant(
                    "remark",
                    vec![("remark", Value::Bytes(b"hi".to_vec()))],
                )],
            ),
        ]),
    )]);
    let encoded = encode_call("Utility", "batch", &call_args, &metadata).unwrap();
    let expected = RuntimeCall::Utility(UtilityCall::batch {
        calls: vec![
            RuntimeCall::Balances(BalancesCall::transfer {
                dest: AccountId20([7; 20]),
                value: 10,
            }),
            RuntimeCall::System(SystemCall::remark {
                remark: b"hi".to_vec(),
            }),
        ],
    })
    .encode();
    assert_eq!(encoded, expected);

    let decoded = decode_call_all(&encoded, &metadata).unwrap();
    assert_eq!(decoded.pallet, "Utility");
    assert_eq!(decoded.call, "batch");
    assert_eq!(decoded.named_args(), call_args);
}

#[test]
fn kitchen_sink() {
    let metadata = metadata();
    let bits = vec![true, false, true, true, false, false, false, false, true];
    let mut big = [0u8; 32];
    big[0] = 0x2a;
    big[31] = 0x01;

    let call_args = args(vec![
        ("flag", Value::Bool(true)),
        (
            "memo",
            Value::Option(Some(Box::new(Value::Str(String::from("lunch"))))),
        ),
        ("text", Value::Str(String::from("Ünïcödé"))),
        (
            "pair",
            Value::unnamed_composite(vec![Value::U16(300), Value::I32(-5)]),
        ),
        (
            "weights",
            Value::Sequence(vec![Value::U32(1), Value::U32(2), Value::U32(3)]),
        ),
        ("bits", Value::BitSequence(bits.to_vec())),
        ("big", Value::U256(BigUint::from_bytes_le(&big))),
        ("signed", Value::I64(-1_000_000_000_000)),
        ("nothing", Value::unnamed_composite(vec![])),
    ]);
    let encoded = encode_call("Kitchen", "kitchen_sink", &call_args, &metadata).unwrap();
    let expected = RuntimeCall::Kitchen(KitchenCall::kitchen_sink {
        flag: true,
        memo: Some(String::from("lunch")),
        text: String::from("Ünïcödé"),
        pair: (300, -5),
        weights: [1, 2, 3],
        bits: bits.iter().copied().collect::<BitVec<u8, Lsb0>>(),
        big: Wide(big),
        signed: -1_000_000_000_000,
        nothing: (),
    })
    .encode();
    assert_eq!(encoded, expected);

    let decoded = decode_call_all(&encoded, &metadata).unwrap();
    assert_eq!(decoded.named_args(), call_args);
}

#[test]
fn option_bool_single_byte() {
    let metadata = metadata();
    for (maybe, byte) in [(None, 0), (Some(true), 1), (Some(false), 2)] {
        let call_args = args(vec![("maybe", Value::from(maybe.map(Value::Bool)))]);
        let encoded = encode_call("Kitchen", "toggle", &call_args, &metadata).unwrap();
        assert_eq!(encoded, vec![40, 3, byte]);
        assert_eq!(
            decode_call_all(&encoded, &metadata).unwrap().named_args(),
            call_args
        );
    }
    assert_eq!(
        decode_call_all(&[40, 3, 3], &metadata),
        Err(ParserError::UnexpectedOptionVariant { position: 2 })
    );
}

#[test]
fn unnamed_call_arguments() {
    let metadata = metadata();
    let call_args = args(vec![("0", Value::U8(1)), ("1", Value::U16(2))]);
    let encoded = encode_call("System", "set_pair", &call_args, &metadata).unwrap();
    assert_eq!(encoded, vec![0, 7, 1, 2, 0]);
    assert_eq!(
        decode_call_all(&encoded, &metadata).unwrap().named_args(),
        call_args
    );
}

#[test]
fn cyclic_type_rejected() {
    assert!(matches!(
        decode_call_all(&[40, 1, 0, 0], &metadata()),
        Err(ParserError::Registry(RegistryError::CyclicMetadata { .. }))
    ));
}

#[test]
fn call_decoding_errors() {
    let metadata = metadata();
    assert_eq!(
        decode_call_all(&[99, 0], &metadata),
        Err(ParserError::PalletNotFound(99))
    );
    assert_eq!(
        decode_call_all(&[10, 9], &metadata),
        Err(ParserError::CallNotFound {
            pallet: String::from("Balances"),
            index: 9
        })
    );
    assert_eq!(
        decode_call_all(&[3, 0], &metadata),
        Err(ParserError::CallNotFound {
            pallet: String::from("Timestamp"),
            index: 0
        })
    );
}

#[test]
fn argument_errors() {
    let metadata = metadata();

    let mut call_args = transfer_args([7; 20], 10);
    call_args.remove("value");
    assert_eq!(
        encode_call("Balances", "transfer", &call_args, &metadata),
        Err(CallError::MissingArgument {
            name: String::from("value")
        })
    );

    let mut call_args = transfer_args([7; 20], 10);
    call_args.insert(String::from("memo"), Value::Bool(true));
    assert_eq!(
        encode_call("Balances", "transfer", &call_args, &metadata),
        Err(CallError::UnexpectedArgument {
            name: String::from("memo")
        })
    );

    let mut call_args = transfer_args([7; 20], 10);
    call_args.insert(String::from("value"), Value::Str(String::from("lots")));
    let error = encode_call("Balances", "transfer", &call_args, &metadata).unwrap_err();
    assert!(matches!(
        error,
        CallError::ArgumentType { ref name, error: EncodeError::UnexpectedValue { .. } } if name == "value"
    ));
}

#[test]
fn transfer_unsigned_scenario() {
    let metadata = metadata();
    let dest = [0x42; 20];
    let call = encode_call(
        "Balances",
        "transfer",
        &transfer_args(dest, 2_500_000_000_000_000),
        &metadata,
    )
    .unwrap();
    let unsigned = build_unsigned(call, options(14, 0, Era::Immortal), &metadata).unwrap();
    let encoded = unsigned.encode();
    assert_eq!(encoded[0], 0x04);

    let decoded = decode_transaction(&encoded, &metadata).unwrap();
    assert_eq!(decoded.format, TxFormat::Unsigned);
    assert_eq!(decoded.call.pallet, "Balances");
    assert_eq!(decoded.call.call, "transfer");
    assert_eq!(
        decoded.call.arg("dest").unwrap().unwrap_newtype().as_bytes(),
        Some(dest.to_vec())
    );
    assert_eq!(
        decoded.call.arg("value"),
        Some(&Value::U128(2_500_000_000_000_000))
    );
    assert_eq!(decoded.era, Era::Immortal);
    assert_eq!(decoded.nonce, 14);
    assert_eq!(decoded.tip, 0);
    assert_eq!(decoded.spec_version, Some(9111));
    assert_eq!(decoded.transaction_version, Some(7));
    assert_eq!(decoded.genesis_hash, Some(genesis_hash()));
    assert_eq!(decoded.block_hash, Some(genesis_hash()));
    assert_eq!(decoded.version, Some(4));
    assert_eq!(decoded.signer(), Some(alice()));
    assert_eq!(
        decoded.signer_ss58(&specs()).unwrap().as_deref(),
        Some(ALICE_SS58)
    );
}

#[test]
fn signing_payload_round_trip() {
    let metadata = metadata();
    let call_args = transfer_args([0x42; 20], 2_500_000_000_000_000);
    let call = encode_call("Balances", "transfer", &call_args, &metadata).unwrap();
    let era = Era::mortal(64, 1000, &EraConfig::default());
    let unsigned = build_unsigned(call, options(3, 100, era), &metadata).unwrap();
    let payload = build_signing_payload(&unsigned);

    let decoded = decode_transaction(&payload.encode(), &metadata).unwrap();
    assert_eq!(decoded.format, TxFormat::SigningPayload);
    assert_eq!(decoded.call.pallet, "Balances");
    assert_eq!(decoded.call.call, "transfer");
    assert_eq!(decoded.call.named_args(), call_args);
    assert_eq!(decoded.era, era);
    assert_eq!(decoded.nonce, 3);
    assert_eq!(decoded.tip, 100);
    assert_eq!(decoded.block_hash, Some(H256::repeat_byte(0x5b)));
    assert_eq!(decoded.address, None);
    assert_eq!(decoded.signer(), None);
}

#[test]
fn signed_round_trip() {
    let metadata = metadata();
    let pair = sr25519::Pair::from_string("//Alice", None).unwrap();
    let public = pair.public();
    let signer = SignerAddress(AsRef::<[u8]>::as_ref(&public).to_vec());
    assert_eq!(signer, alice());

    let call_args = transfer_args([0x42; 20], 2_500_000_000_000_000);
    let call = encode_call("Balances", "transfer", &call_args, &metadata).unwrap();
    let era = Era::mortal(64, 1000, &EraConfig::default());
    let unsigned = build_unsigned(call, options(261, 10_000_000, era), &metadata).unwrap();

    let message = build_signing_payload(&unsigned).message();
    let signature = pair.sign(&message);
    assert!(sr25519::Pair::verify(&signature, &message, &public));
    let signature_bytes = AsRef::<[u8]>::as_ref(&signature).to_vec();

    let signed = apply_signature(
        &unsigned,
        SignatureScheme::Sr25519,
        &signature_bytes,
        &signer,
        &metadata,
    )
    .unwrap();
    let encoded = signed.encode();
    let mut position = 0;
    let length = get_compact::<u32>(&encoded, &mut position).unwrap() as usize;
    assert_eq!(length, encoded.len() - position);
    assert_eq!(encoded[position], 0x84);

    let decoded = decode_transaction(&encoded, &metadata).unwrap();
    assert_eq!(decoded.format, TxFormat::Signed);
    assert_eq!(decoded.call.named_args(), call_args);
    assert_eq!(decoded.era, unsigned.era);
    assert_eq!(decoded.nonce, unsigned.nonce);
    assert_eq!(decoded.tip, unsigned.tip);
    assert_eq!(
        decoded.signature,
        Some(Value::unnamed_variant(
            "Sr25519",
            vec![Value::Bytes(signature_bytes)]
        ))
    );
    assert_eq!(
        decoded.signer_ss58(&specs()).unwrap().as_deref(),
        Some(ALICE_SS58)
    );

    assert_eq!(signed.hash(), tx_hash(&encoded));
    assert_eq!(signed.hash(), H256(blake2_256(&encoded)));
    assert_eq!(
        decode_transaction_hex(&signed.to_hex(), &metadata).unwrap(),
        decoded
    );
}

#[test]
fn formats_never_cross_match() {
    let metadata = metadata();
    let call = encode_call(
        "Balances",
        "transfer",
        &transfer_args([0x42; 20], 5),
        &metadata,
    )
    .unwrap();
    let unsigned = build_unsigned(call, options(0, 0, Era::Immortal), &metadata).unwrap();
    let payload = build_signing_payload(&unsigned);
    let signed = apply_signature(
        &unsigned,
        SignatureScheme::Ed25519,
        &[1; 64],
        &alice(),
        &metadata,
    )
    .unwrap();

    for (bytes, format) in [
        (payload.encode(), TxFormat::SigningPayload),
        (unsigned.encode(), TxFormat::Unsigned),
        (signed.encode(), TxFormat::Signed),
    ] {
        let decoded = decode_transaction(&bytes, &metadata).unwrap();
        assert_eq!(decoded.format, format);
        assert_eq!(decoded.call.call, "transfer");
    }
}

#[test]
fn unknown_format() {
    let error = decode_transaction(&[0xff, 0xff, 0xff], &metadata()).unwrap_err();
    match error {
        TransactionError::Format(format_error) => {
            let formats: Vec<TxFormat> = format_error
                .attempts
                .iter()
                .map(|(format, _)| *format)
                .collect();
            assert_eq!(
                formats,
                vec![TxFormat::Signed, TxFormat::Unsigned, TxFormat::SigningPayload]
            );
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(
        decode_transaction_hex("0xzz", &metadata()),
        Err(TransactionError::Hex)
    );
}

#[test]
fn signed_with_unknown_call_is_terminal() {
    let metadata = metadata();
    let unsigned = build_unsigned(vec![99, 0], options(0, 0, Era::Immortal), &metadata).unwrap();
    let signed = apply_signature(
        &unsigned,
        SignatureScheme::Sr25519,
        &[0; 64],
        &alice(),
        &metadata,
    )
    .unwrap();
    assert_eq!(
        decode_transaction(&signed.encode(), &metadata),
        Err(TransactionError::Call {
            format: TxFormat::Signed,
            error: ParserError::PalletNotFound(99)
        })
    );
}

#[test]
fn signature_length_checked() {
    let metadata = metadata();
    let call = encode_call("Balances", "transfer", &transfer_args([1; 20], 1), &metadata).unwrap();
    let unsigned = build_unsigned(call, options(0, 0, Era::Immortal), &metadata).unwrap();
    assert_eq!(
        apply_signature(&unsigned, SignatureScheme::Sr25519, &[0; 63], &alice(), &metadata),
        Err(SignatureError::InvalidSignatureLength {
            scheme: SignatureScheme::Sr25519,
            expected: 64,
            found: 63
        })
    );

    let signed = apply_signature(&unsigned, SignatureScheme::Ecdsa, &[3; 65], &alice(), &metadata)
        .unwrap();
    let decoded = decode_transaction(&signed.encode(), &metadata).unwrap();
    assert_eq!(
        decoded.signature,
        Some(Value::unnamed_variant("Ecdsa", vec![Value::Bytes(vec![3; 65])]))
    );
}

#[test]
fn hash_tracks_every_field() {
    let metadata = metadata();
    let signed_hash = |nonce: u64, tip: u128, era: Era, value: u128| {
        let call =
            encode_call("Balances", "transfer", &transfer_args([9; 20], value), &metadata).unwrap();
        let unsigned = build_unsigned(call, options(nonce, tip, era), &metadata).unwrap();
        apply_signature(&unsigned, SignatureScheme::Sr25519, &[5; 64], &alice(), &metadata)
            .unwrap()
            .hash()
    };
    let mortal = Era::mortal(64, 1000, &EraConfig::default());
    let base = signed_hash(1, 0, mortal, 100);
    assert_eq!(base, signed_hash(1, 0, mortal, 100));
    assert_ne!(base, signed_hash(2, 0, mortal, 100));
    assert_ne!(base, signed_hash(1, 1, mortal, 100));
    assert_ne!(
        base,
        signed_hash(1, 0, Era::mortal(128, 1000, &EraConfig::default()), 100)
    );
    assert_ne!(base, signed_hash(1, 0, mortal, 101));
}

#[test]
fn long_payload_is_hashed() {
    let metadata = metadata();
    let short = encode_call(
        "System",
        "remark",
        &args(vec![("remark", Value::Bytes(vec![0; 10]))]),
        &metadata,
    )
    .unwrap();
    let unsigned = build_unsigned(short, options(0, 0, Era::Immortal), &metadata).unwrap();
    let payload = build_signing_payload(&unsigned);
    assert_eq!(payload.message(), payload.encode());

    let long = encode_call(
        "System",
        "remark",
        &args(vec![("remark", Value::Bytes(vec![0; 300]))]),
        &metadata,
    )
    .unwrap();
    let unsigned = build_unsigned(long, options(0, 0, Era::Immortal), &metadata).unwrap();
    let payload = build_signing_payload(&unsigned);
    assert!(payload.encode().len() > 256);
    assert_eq!(payload.message(), blake2_256(&payload.encode()).to_vec());
    assert!(payload.to_hex().starts_with("0x0000b104"));
}

#[test]
fn envelope_errors() {
    let metadata = metadata();
    let call = encode_call("Balances", "transfer", &transfer_args([1; 20], 1), &metadata).unwrap();

    let mut bad_hash = options(0, 0, Era::Immortal);
    bad_hash.block_hash = H256::repeat_byte(1);
    assert_eq!(
        build_unsigned(call.to_vec(), bad_hash, &metadata),
        Err(EnvelopeError::ImmortalHashMismatch)
    );

    assert_eq!(
        build_unsigned(call.to_vec(), options(0, 0, Era::Mortal(100, 0)), &metadata),
        Err(EnvelopeError::Era(EraError::PeriodNotPowerOfTwo { period: 100 }))
    );

    let mut short_signer = options(0, 0, Era::Immortal);
    short_signer.signer = SignerAddress(vec![0; 20]);
    assert!(matches!(
        build_unsigned(call, short_signer, &metadata),
        Err(EnvelopeError::Address(EncodeError::ArrayLengthMismatch {
            expected: 32,
            found: 20,
            ..
        }))
    ));
}

#[test]
fn era_normalization() {
    let config = EraConfig::default();
    assert_eq!(Era::mortal(0, 12345, &config), Era::Immortal);
    assert_eq!(Era::mortal(1, 12345, &config), Era::Immortal);
    assert_eq!(Era::mortal(1000, 12345, &config), Era::Mortal(1024, 57));
    assert_eq!(Era::mortal(2, 12345, &config), Era::Mortal(4, 1));
    assert_eq!(Era::mortal(1 << 20, 5, &config), Era::Mortal(1 << 16, 0));
    // phase is quantized for long periods
    assert_eq!(Era::mortal(10000, 50001, &config), Era::Mortal(16384, 848));

    let narrow = EraConfig::new(8, 256).unwrap();
    assert_eq!(Era::mortal(1000, 300, &narrow), Era::Mortal(256, 44));
    assert_eq!(Era::mortal(2, 300, &narrow), Era::Mortal(8, 4));

    assert_eq!(
        EraConfig::new(3, 256),
        Err(EraError::InvalidBounds { min: 3, max: 256 })
    );
    assert_eq!(
        EraConfig::new(256, 8),
        Err(EraError::InvalidBounds { min: 256, max: 8 })
    );
}

#[test]
fn era_encoding() {
    assert_eq!(Era::Immortal.encode(), vec![0]);
    assert_eq!(Era::Mortal(64, 61).encode(), vec![0xd5, 0x03]);
    assert_eq!(
        Era::decode(&mut &[0xd5, 0x03][..]).unwrap(),
        Era::Mortal(64, 61)
    );
    assert_eq!(Era::decode(&mut &[0][..]).unwrap(), Era::Immortal);

    let era = Era::Mortal(64, 61);
    assert_eq!(era.birth(1000), 957);
    assert_eq!(era.death(1000), 1021);
    assert_eq!(Era::Immortal.birth(1000), 0);
    assert_eq!(Era::Immortal.death(1000), u64::MAX);

    let config = EraConfig::default();
    assert_eq!(
        Era::Mortal(2, 0).check(&config),
        Err(EraError::PeriodOutOfBounds {
            period: 2,
            min: 4,
            max: 65536
        })
    );
    assert_eq!(
        Era::Mortal(64, 64).check(&config),
        Err(EraError::PhaseTooLarge {
            phase: 64,
            period: 64
        })
    );
}

#[test]
fn chain_specs_codec() {
    let chain_specs = ChainSpecs {
        base58prefix: 42,
        era: EraConfig::new(4, 1024).unwrap(),
    };
    assert_eq!(
        ChainSpecs::decode(&mut &chain_specs.encode()[..]).unwrap(),
        chain_specs
    );
    let damaged = (42u16, 3u64, 1024u64).encode();
    assert!(ChainSpecs::decode(&mut &damaged[..]).is_err());
}

#[test]
fn ss58_addresses() {
    let alice_public = hex::decode(ALICE_PUBLIC).unwrap();
    assert_eq!(ss58::encode(&alice_public, 42).unwrap(), ALICE_SS58);
    assert_eq!(ss58::decode(ALICE_SS58).unwrap(), (alice_public.to_vec(), 42));

    let two_byte = ss58::encode(&alice_public, 2000).unwrap();
    assert_eq!(ss58::decode(&two_byte).unwrap(), (alice_public.to_vec(), 2000));

    assert_eq!(
        ss58::encode(&alice_public, 16384),
        Err(Ss58Error::InvalidPrefix)
    );
    assert_eq!(ss58::encode(&[0; 20], 42), Err(Ss58Error::BadLength));

    let damaged = format!("{}Z", &ALICE_SS58[..ALICE_SS58.len() - 1]);
    assert_eq!(ss58::decode(&damaged), Err(Ss58Error::InvalidChecksum));
    assert_eq!(ss58::decode("0OIl"), Err(Ss58Error::BadBase58));

    assert_eq!(SignerAddress::from_ss58(ALICE_SS58, &specs()).unwrap(), alice());
    let polkadot = ChainSpecs {
        base58prefix: 0,
        era: EraConfig::default(),
    };
    assert_eq!(
        SignerAddress::from_ss58(ALICE_SS58, &polkadot),
        Err(Ss58Error::PrefixMismatch {
            expected: 0,
            found: 42
        })
    );
    assert_eq!(alice().to_ss58(&specs()).unwrap(), ALICE_SS58);
}

#[test]
fn metadata_shared_between_threads() {
    let metadata = std::sync::Arc::new(metadata());
    let handles: Vec<_> = (0..4u8)
        .map(|i| {
            let metadata = std::sync::Arc::clone(&metadata);
            std::thread::spawn(move || {
                let call_args = transfer_args([i; 20], i as u128);
                let call = encode_call("Balances", "transfer", &call_args, &metadata).unwrap();
                let decoded = decode_call_all(&call, &metadata).unwrap();
                assert_eq!(decoded.named_args(), call_args);
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn mortal_phase_must_be_quantized() {
    let metadata = metadata();
    let call = encode_call("Balances", "transfer", &transfer_args([1; 20], 1), &metadata).unwrap();

    // period 8192 keeps phase in steps of 2
    assert_eq!(
        build_unsigned(call.to_vec(), options(0, 0, Era::Mortal(8192, 1)), &metadata),
        Err(EnvelopeError::Era(EraError::PhaseNotQuantized {
            phase: 1,
            period: 8192
        }))
    );
    assert_eq!(
        Era::Mortal(65536, 17).check(&EraConfig::default()),
        Err(EraError::PhaseNotQuantized {
            phase: 17,
            period: 65536
        })
    );

    let unsigned = build_unsigned(call, options(0, 0, Era::Mortal(8192, 2)), &metadata).unwrap();
    let signed = apply_signature(
        &unsigned,
        SignatureScheme::Sr25519,
        &[2; 64],
        &alice(),
        &metadata,
    )
    .unwrap();
    let decoded = decode_transaction(&signed.encode(), &metadata).unwrap();
    assert_eq!(decoded.era, unsigned.era);
    assert_eq!(decoded.era, Era::Mortal(8192, 2));

    let payload = decode_transaction(&build_signing_payload(&unsigned).encode(), &metadata).unwrap();
    assert_eq!(payload.era, unsigned.era);
}

#[test]
fn chain_era_bounds_applied() {
    let metadata = metadata();
    let call = encode_call("Balances", "transfer", &transfer_args([1; 20], 1), &metadata).unwrap();
    let narrow = EraConfig::new(8, 256).unwrap();

    let mut too_long = options(0, 0, Era::Mortal(1024, 0));
    too_long.era_config = narrow;
    assert_eq!(
        build_unsigned(call.to_vec(), too_long, &metadata),
        Err(EnvelopeError::Era(EraError::PeriodOutOfBounds {
            period: 1024,
            min: 8,
            max: 256
        }))
    );

    let mut fits = options(0, 0, Era::mortal(1024, 300, &narrow));
    fits.era_config = narrow;
    let unsigned = build_unsigned(call, fits, &metadata).unwrap();
    assert_eq!(unsigned.era, Era::Mortal(256, 44));
}

#[test]
fn zero_size_elements() {
    let metadata = metadata();
    let call_args = args(vec![(
        "units",
        Value::Sequence(vec![
            Value::unnamed_composite(vec![]),
            Value::unnamed_composite(vec![]),
            Value::unnamed_composite(vec![]),
        ]),
    )]);
    let encoded = encode_call("Kitchen", "units", &call_args, &metadata).unwrap();
    let expected = RuntimeCall::Kitchen(KitchenCall::units {
        units: vec![(), (), ()],
    })
    .encode();
    assert_eq!(encoded, expected);
    assert_eq!(encoded, vec![40, 4, 12]);
    assert_eq!(
        decode_call_all(&encoded, &metadata).unwrap().named_args(),
        call_args
    );

    // 2^30 - 1 units announced in a few bytes
    let huge = [40, 4, 0xfe, 0xff, 0xff, 0xff];
    assert_eq!(
        decode_call_all(&huge, &metadata),
        Err(ParserError::DataTooShort {
            position: 6,
            minimal_length: (1 << 30) - 1
        })
    );
    assert!(matches!(
        decode_transaction(&huge, &metadata),
        Err(TransactionError::Format(_))
    ));
}
