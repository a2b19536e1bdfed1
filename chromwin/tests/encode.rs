extern crate chromwin;

use chromwin::encode::decode;
use chromwin::encode::encode;
use chromwin::encode::encode_str;
use chromwin::encode::from_indices;
use chromwin::SymbolSet;
use chromwin::UnknownSymbol;

const ACGT: &[char] = &['A', 'C', 'G', 'T'];

#[test]
fn test_acgt() {
    let ohe = encode_str::<u8>("ACGT", 'N', Some(ACGT)).unwrap();
    assert_eq!(ohe.sum(), 4);
    for i in 0..4 {
        assert_eq!(ohe[[i, i]], 1);
    }
}

#[test]
fn test_roundtrip() {
    let sequences = ["GATTACA", "TTTTTTTTTT", "CGCGATATATCG", "A"];
    for seq in sequences {
        let ohe = encode_str::<f32>(seq, 'N', Some(ACGT)).unwrap();
        let decoded = decode(ohe.view());
        assert!(decoded.iter().all(Option::is_some));
        assert_eq!(from_indices::<f32>(&decoded, 4), ohe);
    }
}

#[test]
fn test_ignore_in_alphabet() {
    let ohe = encode_str::<f32>("ANCN", 'N', Some(&['A', 'C', 'G', 'T', 'N'][..])).unwrap();
    assert_eq!(ohe.dim(), (4, 4));
    assert_eq!(decode(ohe.view()), vec![Some(0), None, Some(1), None]);
}

#[test]
fn test_unknown_symbol() {
    let err = encode_str::<f32>("ACXT", 'N', Some(ACGT)).unwrap_err();
    assert_eq!(
        err,
        UnknownSymbol {
            symbol: "'X'".into(),
            position: 2
        }
    );
}

#[test]
fn test_inferred_alphabet() {
    let words = ["the", "cat", "-", "sat", "the"];
    let ohe = encode::<i32, _>(&words, &"-", None).unwrap();
    // cat, sat, the
    assert_eq!(ohe.dim(), (3, 5));
    assert_eq!(decode(ohe.view()), vec![Some(2), Some(0), None, Some(1), Some(2)]);

    let set = SymbolSet::infer(&words, "-");
    assert_eq!(set.symbols(), &["cat", "sat", "the"]);
    assert_eq!(set.channel(&"sat"), Some(1));
}
