use super::*;

extern crate std;
use std::vec::Vec as StdVec;

fn all_source_words() -> impl Iterator<Item = SourceWord> {
    (0u8..64).map(|value| {
        let mut word = [0; DATA_BITS];
        for (index, bit) in word.iter_mut().enumerate() {
            *bit = (value >> (DATA_BITS - 1 - index)) & 1;
        }
        word
    })
}

#[test]
fn test_generator_is_systematic() -> Result<(), CodecError> {
    let code = HammingCode::new()?;
    let expected: Matrix<DATA_BITS, BLOCK_BITS> = [
        [1, 0, 0, 0, 0, 0, 1, 0, 0, 1],
        [0, 1, 0, 0, 0, 0, 0, 0, 1, 1],
        [0, 0, 1, 0, 0, 0, 1, 1, 1, 0],
        [0, 0, 0, 1, 0, 0, 1, 1, 0, 0],
        [0, 0, 0, 0, 1, 0, 0, 1, 1, 1],
        [0, 0, 0, 0, 0, 1, 0, 1, 0, 1],
    ];
    assert_eq!(code.generator(), &expected);
    for (row, identity_row) in code.generator().iter().zip(gf2::identity::<DATA_BITS>().iter()) {
        assert_eq!(&row[..DATA_BITS], identity_row);
    }
    Ok(())
}

#[test]
fn test_parity_check_layout() -> Result<(), CodecError> {
    let code = HammingCode::new()?;
    let expected: Matrix<PARITY_BITS, BLOCK_BITS> = [
        [1, 0, 1, 1, 0, 0, 1, 0, 0, 0],
        [0, 0, 1, 1, 1, 1, 0, 1, 0, 0],
        [0, 1, 1, 0, 1, 0, 0, 0, 1, 0],
        [1, 1, 0, 0, 1, 1, 0, 0, 0, 1],
    ];
    assert_eq!(code.parity_check(), &expected);
    for (row, identity_row) in code.parity_check().iter().zip(gf2::identity::<PARITY_BITS>().iter()) {
        assert_eq!(&row[DATA_BITS..], identity_row);
    }
    Ok(())
}

#[test]
fn test_generator_rows_have_zero_syndrome() -> Result<(), CodecError> {
    let code = HammingCode::new()?;
    for row in code.generator() {
        assert_eq!(code.syndrome(row), [0; PARITY_BITS]);
    }
    Ok(())
}

#[test]
fn test_singular_seed_rejected() {
    let mut seed = SEED_GENERATOR;
    seed[1] = seed[0];
    let err = HammingCode::from_seed(&seed).unwrap_err();
    assert!(matches!(err, CodecError::Seed(Gf2Error::Singular(_))));
}

#[test]
fn test_encode_known_words() -> Result<(), CodecError> {
    let code = HammingCode::new()?;
    assert_eq!(code.encode(&[0, 1, 1, 0, 1, 1])?, [0, 1, 1, 0, 1, 1, 1, 1, 1, 1, 0]);
    assert_eq!(code.encode(&[0, 0, 0, 0, 0, 0])?, [0; CODEWORD_BITS]);
    assert_eq!(code.encode(&[1, 0, 1, 1, 0, 1])?, [1, 0, 1, 1, 0, 1, 1, 1, 1, 0, 1]);
    assert_eq!(code.encode(&[1, 1, 1, 1, 1, 0])?, [1, 1, 1, 1, 1, 0, 1, 1, 1, 1, 1]);
    assert_eq!(code.encode(&[1, 1, 0, 0, 0, 1])?, [1, 1, 0, 0, 0, 1, 1, 1, 1, 1, 1]);
    Ok(())
}

#[test]
fn test_encode_length_error() -> Result<(), CodecError> {
    let code = HammingCode::new()?;
    assert_eq!(
        code.encode(&[0, 0]),
        Err(CodecError::Length { expected: 6, found: 2 })
    );
    assert_eq!(
        code.encode(&[0, 1, 1, 0, 0, 0, 1, 1]),
        Err(CodecError::Length { expected: 6, found: 8 })
    );
    Ok(())
}

#[test]
fn test_encode_length_checked_before_bits() -> Result<(), CodecError> {
    let code = HammingCode::new()?;
    assert_eq!(
        code.encode(&[2, 0]),
        Err(CodecError::Length { expected: 6, found: 2 })
    );
    assert_eq!(
        code.encode(&[0, 0, 3, 0, 0, 0]),
        Err(CodecError::InvalidBit { index: 2, value: 3 })
    );
    Ok(())
}

#[test]
fn test_codewords_have_even_weight() -> Result<(), CodecError> {
    let code = HammingCode::new()?;
    for word in all_source_words() {
        let encoded = code.encode(&word)?;
        assert_eq!(gf2::parity(&encoded), 0);
    }
    Ok(())
}

#[test]
fn test_round_trip_all_words() -> Result<(), CodecError> {
    let code = HammingCode::new()?;
    for word in all_source_words() {
        let encoded = code.encode(&word)?;
        assert_eq!(code.decode(&encoded), (Some(word), DecodeStatus::Valid));
    }
    Ok(())
}

#[test]
fn test_single_bit_errors_corrected() -> Result<(), CodecError> {
    let code = HammingCode::new()?;
    for word in all_source_words() {
        let encoded = code.encode(&word)?;
        for position in 0..CODEWORD_BITS {
            let mut corrupted = encoded;
            corrupted[position] ^= 1;
            assert_eq!(
                code.decode(&corrupted),
                (Some(word), DecodeStatus::Corrected),
                "word {word:?} bit {position}"
            );
        }
    }
    Ok(())
}

#[test]
fn test_parity_bit_only() -> Result<(), CodecError> {
    let code = HammingCode::new()?;
    let mut encoded = code.encode(&[1, 0, 1, 1, 0, 1])?;
    encoded[BLOCK_BITS] ^= 1;
    assert_eq!(
        code.decode(&encoded),
        (Some([1, 0, 1, 1, 0, 1]), DecodeStatus::Corrected)
    );
    assert_eq!(
        code.decode(&[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]),
        (Some([0; DATA_BITS]), DecodeStatus::Corrected)
    );
    Ok(())
}

#[test]
fn test_double_bit_errors_detected() -> Result<(), CodecError> {
    let code = HammingCode::new()?;
    for word in all_source_words() {
        let encoded = code.encode(&word)?;
        for first in 0..CODEWORD_BITS {
            for second in (first + 1)..CODEWORD_BITS {
                let mut corrupted = encoded;
                corrupted[first] ^= 1;
                corrupted[second] ^= 1;
                assert_eq!(
                    code.decode(&corrupted),
                    (None, DecodeStatus::Uncorrectable),
                    "word {word:?} bits {first} {second}"
                );
            }
        }
    }
    Ok(())
}

#[test]
fn test_decode_card_fixtures() -> Result<(), CodecError> {
    let code = HammingCode::new()?;
    let valid: StdVec<(CodeWord, SourceWord)> = std::vec![
        ([0, 1, 1, 0, 1, 1, 1, 1, 1, 1, 0], [0, 1, 1, 0, 1, 1]),
        ([0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0], [0, 0, 0, 0, 0, 0]),
        ([1, 0, 1, 1, 0, 1, 1, 1, 1, 0, 1], [1, 0, 1, 1, 0, 1]),
        ([1, 1, 1, 1, 1, 0, 1, 1, 1, 1, 1], [1, 1, 1, 1, 1, 0]),
    ];
    for (encoded, data) in valid {
        assert_eq!(code.decode(&encoded), (Some(data), DecodeStatus::Valid));
    }

    let corrected: StdVec<(CodeWord, SourceWord)> = std::vec![
        ([1, 1, 1, 1, 1, 0, 1, 1, 0, 1, 1], [1, 1, 1, 1, 1, 0]),
        ([0, 0, 1, 0, 1, 1, 1, 1, 1, 1, 0], [0, 1, 1, 0, 1, 1]),
        ([1, 1, 0, 0, 0, 1, 0, 1, 1, 1, 1], [1, 1, 0, 0, 0, 1]),
    ];
    for (encoded, data) in corrected {
        assert_eq!(code.decode(&encoded), (Some(data), DecodeStatus::Corrected));
    }

    let uncorrectable: [CodeWord; 4] = [
        [1, 1, 0, 1, 1, 0, 1, 1, 0, 0, 1],
        [1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 1],
        [1, 1, 1, 0, 0, 1, 1, 1, 0, 1, 1],
        [0, 1, 0, 0, 1, 1, 1, 1, 1, 1, 1],
    ];
    for encoded in uncorrectable {
        assert_eq!(code.decode(&encoded), (None, DecodeStatus::Uncorrectable));
    }
    Ok(())
}

#[test]
fn test_syndrome_without_matching_column() -> Result<(), CodecError> {
    let code = HammingCode::new()?;
    let encoded = [1, 1, 0, 1, 1, 0, 1, 1, 0, 0, 1];
    let mut block = [0; BLOCK_BITS];
    block.copy_from_slice(&encoded[..BLOCK_BITS]);
    let syndrome = code.syndrome(&block);
    assert_eq!(syndrome, [1, 1, 0, 1]);
    assert!((0..BLOCK_BITS).all(|index| gf2::column(code.parity_check(), index) != Some(syndrome)));
    assert_eq!(gf2::parity(&encoded), 1);
    assert_eq!(code.decode(&encoded), (None, DecodeStatus::Uncorrectable));
    Ok(())
}

#[test]
fn test_decode_rejects_malformed_input() -> Result<(), CodecError> {
    let code = HammingCode::new()?;
    assert_eq!(code.decode(&[0, 1, 1]), (None, DecodeStatus::Uncorrectable));
    assert_eq!(
        code.decode(&[0, 1, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0]),
        (None, DecodeStatus::Uncorrectable)
    );
    assert_eq!(
        code.decode(&[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2]),
        (None, DecodeStatus::Uncorrectable)
    );
    Ok(())
}

#[test]
fn test_gf2_products() {
    let matrix: Matrix<2, 3> = [[1, 1, 0], [0, 1, 1]];
    assert_eq!(gf2::mul_vec(&matrix, &[1, 1, 1]), [0, 0]);
    assert_eq!(gf2::mul_vec(&matrix, &[1, 0, 0]), [1, 0]);
    assert_eq!(gf2::vec_mul(&[1, 1], &matrix), [1, 0, 1]);
    assert_eq!(gf2::transpose(&matrix), [[1, 0], [1, 1], [0, 1]]);
    assert_eq!(gf2::column(&matrix, 2), Some([0, 1]));
    assert_eq!(gf2::column(&matrix, 3), None);
    assert_eq!(gf2::dot(&[1, 1, 1], &[1, 1, 1]), 1);
    assert_eq!(gf2::parity(&[1, 1, 0, 1]), 1);
}

#[test]
fn test_to_systematic_swaps_rows() -> Result<(), Gf2Error> {
    let matrix: Matrix<2, 3> = [[0, 1, 1], [1, 1, 0]];
    assert_eq!(gf2::to_systematic(matrix)?, [[1, 0, 1], [0, 1, 1]]);
    Ok(())
}
