#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic, clippy::float_cmp)]
//! End-to-end tests for writing, appending and reading BinFiles on disk

use binfile_format::ndarray::{Array, ArrayD, IxDyn, array};
use binfile_format::num_complex::Complex;
use binfile_format::{
    BinFile, BinFileError, ElementType, Extended, FormatError, Header, OpenError, OpenMode, Sample,
};
use pretty_assertions::assert_eq;
use std::path::Path;
use tempfile::tempdir;

fn write_all(path: &Path, samples: &[Sample]) {
    let mut file = BinFile::create(path).expect("create file");
    for sample in samples {
        file.write(sample).expect("write sample");
    }
    file.close().expect("close file");
}

fn read_all(path: &Path) -> Vec<Sample> {
    let mut file = BinFile::open(path, OpenMode::IN).expect("open for reading");
    file.samples().collect::<Result<_, _>>().expect("read samples")
}

fn stored_header(path: &Path) -> Header {
    let mut raw = std::fs::File::open(path).expect("open raw");
    Header::read(&mut raw).expect("parse header")
}

#[test]
fn float64_matrix_scenario() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("f.bin");

    let first = array![[1.0f64, 2.0], [3.0, 4.0], [5.0, 6.0]];
    let second = array![[7.0f64, 8.0], [9.0, 10.0], [11.0, 12.0]];

    let mut out = BinFile::open(&path, OpenMode::OUT).unwrap();
    out.write(&Sample::from(first.clone())).unwrap();
    out.write(&Sample::from(second.clone())).unwrap();
    out.close().unwrap();

    let mut input = BinFile::open(&path, OpenMode::IN).unwrap();
    let header = input.header().unwrap().clone();
    assert_eq!(header.element_type, ElementType::Float64);
    assert_eq!(header.rank(), 2);
    assert_eq!(header.extents, vec![3, 2]);
    assert_eq!(header.sample_count, 2);

    assert_eq!(input.read_at(0).unwrap(), Sample::from(first));
    assert_eq!(input.read_at(1).unwrap(), Sample::from(second));
    assert!(matches!(
        input.read_at(2),
        Err(BinFileError::Index { index: 2 })
    ));

    let file_len = std::fs::metadata(&path).unwrap().len();
    assert_eq!(file_len, header.expected_file_len());
    assert_eq!(file_len, 36 + 2 * 48);
}

#[test]
fn every_element_type_round_trips() {
    let dir = tempdir().expect("tempdir");

    let samples: Vec<Vec<Sample>> = vec![
        vec![
            Sample::from(array![true, false, true]),
            Sample::from(array![false, false, true]),
        ],
        vec![Sample::from(array![[i8::MIN, -1], [0, i8::MAX]])],
        vec![Sample::from(array![i16::MIN, 0, i16::MAX])],
        vec![Sample::from(array![[[i32::MIN]], [[i32::MAX]]])],
        vec![Sample::from(array![i64::MIN, -7, i64::MAX])],
        vec![Sample::from(array![0u8, 128, 255])],
        vec![Sample::from(array![[0u16, u16::MAX]])],
        vec![Sample::from(array![1u32, u32::MAX])],
        vec![Sample::from(array![u64::MAX, 0])],
        vec![Sample::from(array![f32::MIN_POSITIVE, -0.0, f32::INFINITY])],
        vec![Sample::from(array![[f64::EPSILON, f64::MAX], [-1.0, 1e-300]])],
        vec![Sample::from(array![
            Extended::from_f64(1.0),
            Extended::from_f64(-2.5),
            Extended::from_f64(1e300)
        ])],
        vec![Sample::from(array![Complex::new(1.0f32, -1.0), Complex::new(0.0, 3.5)])],
        vec![Sample::from(array![[Complex::new(1.0f64, 2.0)], [Complex::new(-3.0, 4.0)]])],
        vec![Sample::from(array![Complex::new(
            Extended::from_f64(0.5),
            Extended::from_f64(-0.25)
        )])],
    ];

    for (ty, group) in ElementType::ALL.iter().zip(&samples) {
        let path = dir.path().join(format!("{ty}.bin"));
        write_all(&path, group);

        let header = stored_header(&path);
        assert_eq!(header.element_type, *ty);
        assert_eq!(header.element_size as usize, ty.byte_size());
        assert_eq!(header.sample_count, group.len() as u64);
        assert_eq!(&read_all(&path), group, "{ty}");
    }
}

#[test]
fn every_rank_round_trips() {
    let dir = tempdir().expect("tempdir");
    let shapes: [&[usize]; 4] = [&[5], &[2, 3], &[2, 1, 4], &[1, 2, 3, 2]];

    for shape in shapes {
        let path = dir.path().join(format!("rank{}.bin", shape.len()));
        let count: usize = shape.iter().product();
        let samples: Vec<Sample> = (0..3)
            .map(|k| {
                let values = (0..count).map(|i| (k * 100 + i) as i32).collect();
                Sample::from(ArrayD::from_shape_vec(IxDyn(shape), values).unwrap())
            })
            .collect();

        write_all(&path, &samples);
        assert_eq!(read_all(&path), samples);

        let mut file = BinFile::open(&path, OpenMode::IN).unwrap();
        for (i, expected) in samples.iter().enumerate().rev() {
            assert_eq!(&file.read_at(i as u64).unwrap(), expected);
        }
    }
}

#[test]
fn schema_is_locked_after_first_write() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("locked.bin");
    let mut file = BinFile::create(&path).unwrap();
    file.write(&Sample::from(array![[1u8, 2], [3, 4]])).unwrap();
    let before = std::fs::read(&path).unwrap();

    let wrong_rank = file.write(&Sample::from(array![1u8, 2, 3, 4]));
    assert!(matches!(
        wrong_rank,
        Err(BinFileError::Dimension {
            found: 1,
            expected: 2
        })
    ));

    let wrong_extent = file.write(&Sample::from(array![[1u8, 2, 3], [4, 5, 6]]));
    assert!(matches!(
        wrong_extent,
        Err(BinFileError::Dimension {
            found: 3,
            expected: 2
        })
    ));

    let wrong_type = file.write(&Sample::from(array![[1u16, 2], [3, 4]]));
    assert!(matches!(
        wrong_type,
        Err(BinFileError::Type {
            found: ElementType::UInt16,
            expected: ElementType::UInt8
        })
    ));

    assert_eq!(std::fs::read(&path).unwrap(), before);
    assert_eq!(file.len(), 1);
    assert_eq!(file.position(), 1);
}

#[test]
fn append_extends_existing_file() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("append.bin");
    let initial: Vec<Sample> = (0..3u32).map(|i| Sample::from(array![i, i * 10])).collect();
    write_all(&path, &initial);

    let extra: Vec<Sample> = (3..5u32).map(|i| Sample::from(array![i, i * 10])).collect();
    {
        let mut file = BinFile::open(&path, OpenMode::OUT | OpenMode::APPEND).unwrap();
        assert_eq!(file.len(), 3);
        assert_eq!(file.position(), 3);
        for sample in &extra {
            file.write(sample).unwrap();
        }
    }

    assert_eq!(stored_header(&path).sample_count, 5);
    let all = read_all(&path);
    assert_eq!(&all[..3], &initial[..]);
    assert_eq!(&all[3..], &extra[..]);
}

#[test]
fn append_with_read_write_mode() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("rwa.bin");
    write_all(&path, &[Sample::from(array![1.0f32])]);

    let mut file = BinFile::open_str(&path, "rwa").unwrap();
    assert_eq!(file.position(), 1);
    file.write(&Sample::from(array![2.0f32])).unwrap();
    assert_eq!(file.read_array::<f32>(0).unwrap(), array![1.0f32].into_dyn());
    assert_eq!(file.read_array::<f32>(1).unwrap(), array![2.0f32].into_dyn());
    file.close().unwrap();

    assert_eq!(stored_header(&path).sample_count, 2);
}

#[test]
fn append_to_missing_file_creates_it() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("fresh.bin");
    {
        let mut file = BinFile::open(&path, OpenMode::OUT | OpenMode::APPEND).unwrap();
        assert!(file.header().is_none());
        file.write(&Sample::from(array![7i64])).unwrap();
    }
    assert_eq!(read_all(&path), vec![Sample::from(array![7i64])]);
}

#[test]
fn read_plus_append_is_rejected_without_touching_disk() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("never.bin");

    let err = BinFile::open(&path, OpenMode::IN | OpenMode::APPEND).unwrap_err();
    assert!(matches!(err, BinFileError::Open(OpenError::InvalidFlags(_))));
    assert!(!path.exists());

    let err = BinFile::open_str(&path, "a").unwrap_err();
    assert!(matches!(err, BinFileError::Open(OpenError::InvalidFlags(_))));
    assert!(!path.exists());
}

#[test]
fn read_plus_append_does_not_modify_existing_file() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("existing.bin");
    write_all(&path, &[Sample::from(array![1u8, 2])]);
    let before = std::fs::read(&path).unwrap();

    assert!(BinFile::open_str(&path, "ra").is_err());
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[test]
fn opening_missing_or_corrupt_file_for_reading_fails() {
    let dir = tempdir().expect("tempdir");

    let missing = dir.path().join("missing.bin");
    let err = BinFile::open(&missing, OpenMode::IN).unwrap_err();
    assert!(matches!(err, BinFileError::Open(OpenError::CannotRead { .. })));

    let garbage = dir.path().join("garbage.bin");
    std::fs::write(&garbage, [0xFFu8; 64]).unwrap();
    let err = BinFile::open(&garbage, OpenMode::IN).unwrap_err();
    match err {
        BinFileError::Open(OpenError::CannotRead { source, .. }) => {
            assert!(matches!(
                *source,
                BinFileError::Format(FormatError::InvalidType(_))
            ));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let short = dir.path().join("short.bin");
    std::fs::write(&short, [11u8, 0, 0]).unwrap();
    let err = BinFile::open(&short, OpenMode::IN).unwrap_err();
    match err {
        BinFileError::Open(OpenError::CannotRead { source, .. }) => {
            assert!(matches!(*source, BinFileError::Format(FormatError::Truncated)));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn rewriting_a_sample_keeps_the_count() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("rewrite.bin");
    let samples: Vec<Sample> = (0..3i16).map(|i| Sample::from(array![[i, i], [i, i]])).collect();
    write_all(&path, &samples);
    let len_before = std::fs::metadata(&path).unwrap().len();

    {
        let mut file = BinFile::open(&path, OpenMode::IN | OpenMode::OUT).unwrap();
        // Read-write without append starts at the first sample
        assert_eq!(file.position(), 0);
        file.seek(1).unwrap();
        file.write(&Sample::from(array![[9i16, 8], [7, 6]])).unwrap();
        assert_eq!(file.len(), 3);

        // Shape stays locked for rewrites
        assert!(file.write(&Sample::from(array![1i16, 2])).is_err());
    }

    assert_eq!(std::fs::metadata(&path).unwrap().len(), len_before);
    assert_eq!(stored_header(&path).sample_count, 3);
    let all = read_all(&path);
    assert_eq!(all[0], samples[0]);
    assert_eq!(all[1], Sample::from(array![[9i16, 8], [7, 6]]));
    assert_eq!(all[2], samples[2]);
}

#[test]
fn read_write_without_append_overwrites_from_start() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("overwrite.bin");
    write_all(
        &path,
        &[Sample::from(array![1u8]), Sample::from(array![2u8])],
    );

    {
        let mut file = BinFile::open_str(&path, "rw").unwrap();
        file.write(&Sample::from(array![10u8])).unwrap();
        file.write(&Sample::from(array![20u8])).unwrap();
        file.write(&Sample::from(array![30u8])).unwrap();
        assert_eq!(file.len(), 3);
    }

    assert_eq!(
        read_all(&path),
        vec![
            Sample::from(array![10u8]),
            Sample::from(array![20u8]),
            Sample::from(array![30u8])
        ]
    );
}

#[test]
fn drop_persists_sample_count() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("dropped.bin");
    {
        let mut file = BinFile::create(&path).unwrap();
        for i in 0..4u64 {
            file.write(&Sample::from(array![i])).unwrap();
        }
        // Before close the header still holds the initial count
        assert_eq!(stored_header(&path).sample_count, 0);
    }
    assert_eq!(stored_header(&path).sample_count, 4);
}

#[test]
fn non_standard_layouts_are_stored_row_major() {
    use binfile_format::ndarray::ShapeBuilder;

    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("layout.bin");

    let fortran = Array::from_shape_vec((2, 3).f(), vec![1.0f64, 4.0, 2.0, 5.0, 3.0, 6.0]).unwrap();
    let base = array![[1.0f64, 4.0], [2.0, 5.0], [3.0, 6.0]];
    let transposed = base.t().to_owned();
    write_all(&path, &[Sample::from(fortran), Sample::from(transposed)]);

    let expected = array![[1.0f64, 2.0, 3.0], [4.0, 5.0, 6.0]].into_dyn();
    let mut file = BinFile::open(&path, OpenMode::IN).unwrap();
    assert_eq!(file.read_array::<f64>(0).unwrap(), expected);
    assert_eq!(file.read_array::<f64>(1).unwrap(), expected);

    let raw = std::fs::read(&path).unwrap();
    let header = stored_header(&path);
    let first = &raw[header.sample_byte_offset(0) as usize..header.sample_byte_offset(1) as usize];
    let values: Vec<f64> = first
        .chunks_exact(8)
        .map(|c| f64::from_ne_bytes(c.try_into().unwrap()))
        .collect();
    assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
}

#[test]
fn typed_read_rejects_other_element_types() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("typed.bin");
    write_all(&path, &[Sample::from(array![1i32, 2])]);

    let mut file = BinFile::open(&path, OpenMode::IN).unwrap();
    assert!(matches!(
        file.read_array::<f32>(0),
        Err(BinFileError::Type {
            found: ElementType::Float32,
            expected: ElementType::Int32
        })
    ));
    assert_eq!(file.read_array::<i32>(0).unwrap(), array![1i32, 2].into_dyn());
}

#[test]
fn empty_write_session_leaves_empty_file() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("empty.bin");
    BinFile::create(&path).unwrap().close().unwrap();
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
    assert!(BinFile::open(&path, OpenMode::IN).is_err());
}

/// Raw header bytes for a uint8 rank-1 file, no sample data
fn oversized_header(extent: u64, count: u64) -> Vec<u8> {
    let mut raw = Vec::new();
    raw.extend_from_slice(&ElementType::UInt8.tag().to_ne_bytes());
    raw.extend_from_slice(&1u32.to_ne_bytes());
    raw.extend_from_slice(&1u32.to_ne_bytes());
    raw.extend_from_slice(&extent.to_ne_bytes());
    raw.extend_from_slice(&count.to_ne_bytes());
    raw
}

#[test]
fn reading_sample_larger_than_file_fails() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("huge.bin");
    std::fs::write(&path, oversized_header(1 << 63, 1)).unwrap();

    let mut file = BinFile::open(&path, OpenMode::IN).unwrap();
    assert_eq!(file.header().unwrap().sample_size(), 1 << 63);
    assert!(matches!(
        file.read_at(0),
        Err(BinFileError::Format(FormatError::Truncated))
    ));
    assert!(matches!(
        file.read(),
        Err(BinFileError::Format(FormatError::Truncated))
    ));
}

#[test]
fn reading_past_addressable_offsets_fails() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("overflow.bin");
    std::fs::write(&path, oversized_header(1 << 63, 4)).unwrap();

    let mut file = BinFile::open(&path, OpenMode::IN).unwrap();
    assert!(matches!(
        file.read_at(3),
        Err(BinFileError::Format(FormatError::Truncated))
    ));
}
