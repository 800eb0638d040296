mod common;

use std::fs;

use approx::assert_relative_eq;
use synthset_camera::projection::lifted_projection_matrix;
use synthset_export::{
    idr::{export_idr, CAMERAS_NPZ},
    nsvf::{export_nsvf, NsvfAddressing, NsvfOptions, PoseEncoding},
    ExportError,
};
use synthset_io::{
    matrix::read_matrix_txt, npz::read_npz, png::read_image_size, record::Dataset,
};
use synthset_linalg::{flatten_rows, Mat4, IDENTITY4};

#[test]
fn test_nsvf_plain() -> Result<(), Box<dyn std::error::Error>> {
    let batch = tempfile::tempdir()?;
    let out = tempfile::tempdir()?;
    common::write_batch(batch.path(), 3, &[1])?;

    let dataset = Dataset::from_batch(batch.path())?;
    let report = export_nsvf(&dataset, out.path(), &NsvfOptions::default())?;
    assert_eq!(report.written, vec!["0", "2"]);
    assert_eq!(report.skipped, vec![1]);
    assert_eq!(report.split, None);

    assert_eq!(
        fs::read(out.path().join("bbox.txt"))?,
        fs::read(batch.path().join("bounding_box.txt"))?
    );
    let k: Mat4 = read_matrix_txt(out.path().join("intrinsics.txt"))?;
    assert_eq!(k[0], [100.0, 0.0, 2.0, 0.0]);
    assert_eq!(k[3], [0.0, 0.0, 0.0, 1.0]);

    let pose: Mat4 = read_matrix_txt(out.path().join("pose").join("2.txt"))?;
    let expected = lifted_projection_matrix(&common::K, &common::view_extrinsics(2));
    for (v, e) in pose.iter().flatten().zip(expected.iter().flatten()) {
        assert_relative_eq!(v, e, epsilon = 1e-9);
    }

    // the masked RGBA image is copied by default
    assert_eq!(
        fs::read(out.path().join("rgb").join("0.png"))?,
        fs::read(batch.path().join("000_masked_0001.png"))?
    );
    assert!(!out.path().join("rgb").join("1.png").exists());
    Ok(())
}

#[test]
fn test_nsvf_split() -> Result<(), Box<dyn std::error::Error>> {
    let batch = tempfile::tempdir()?;
    let out = tempfile::tempdir()?;
    common::write_batch(batch.path(), 10, &[])?;

    let dataset = Dataset::from_batch(batch.path())?;
    let options = NsvfOptions {
        addressing: NsvfAddressing::Split { fraction: 0.7 },
        seed: Some(3),
        ..Default::default()
    };
    let report = export_nsvf(&dataset, out.path(), &options)?;
    let split = report.split.ok_or("no split reported")?;
    assert_eq!(split.fraction, 0.7);
    assert_eq!(split.train.len(), 7);
    assert_eq!(split.test.len(), 3);
    assert!(split.train.is_disjoint(&split.test));

    let names = fs::read_dir(out.path().join("pose"))?
        .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(names.iter().filter(|n| n.starts_with("0_")).count(), 7);
    assert_eq!(names.iter().filter(|n| n.starts_with("1_")).count(), 3);
    for index in &split.train {
        assert!(out
            .path()
            .join("rgb")
            .join(format!("0_{index:03}.png"))
            .is_file());
    }
    Ok(())
}

#[test]
fn test_nsvf_split_covers_written_views() -> Result<(), Box<dyn std::error::Error>> {
    let batch = tempfile::tempdir()?;
    let out = tempfile::tempdir()?;
    common::write_batch(batch.path(), 10, &[1, 4, 8])?;

    let dataset = Dataset::from_batch(batch.path())?;
    let options = NsvfOptions {
        addressing: NsvfAddressing::Split { fraction: 0.5 },
        seed: Some(11),
        ..Default::default()
    };
    let report = export_nsvf(&dataset, out.path(), &options)?;
    let split = report.split.ok_or("no split reported")?;
    assert_eq!(report.written.len(), 7);
    assert_eq!(report.skipped, vec![1, 4, 8]);
    assert_eq!(split.train.len() + split.test.len(), report.written.len());
    for index in [1, 4, 8] {
        assert!(!split.train.contains(&index) && !split.test.contains(&index));
    }
    Ok(())
}

#[test]
fn test_nsvf_camera_to_world_singular_intrinsics() -> Result<(), Box<dyn std::error::Error>> {
    let batch = tempfile::tempdir()?;
    let out = tempfile::tempdir()?;
    common::write_batch(batch.path(), 4, &[])?;
    // positive but numerically singular focal lengths
    fs::write(
        batch.path().join("camera_intrinsics.txt"),
        "1e-7 0 2 0\n0 1e-7 1 0\n0 0 1 0\n0 0 0 1\n",
    )?;

    let dataset = Dataset::from_batch(batch.path())?;
    let options = NsvfOptions {
        addressing: NsvfAddressing::Split { fraction: 0.5 },
        seed: Some(1),
        pose_encoding: PoseEncoding::CameraToWorld,
        ..Default::default()
    };
    assert!(matches!(
        export_nsvf(&dataset, out.path(), &options),
        Err(ExportError::NoCompleteViews(_))
    ));
    assert!(!out.path().join("pose").exists());
    Ok(())
}

#[test]
fn test_nsvf_camera_to_world() -> Result<(), Box<dyn std::error::Error>> {
    let batch = tempfile::tempdir()?;
    let out = tempfile::tempdir()?;
    common::write_batch(batch.path(), 1, &[])?;

    let dataset = Dataset::from_batch(batch.path())?;
    let options = NsvfOptions {
        pose_encoding: PoseEncoding::CameraToWorld,
        ..Default::default()
    };
    export_nsvf(&dataset, out.path(), &options)?;

    let pose: Mat4 = read_matrix_txt(out.path().join("pose").join("0.txt"))?;
    let expected = common::view_extrinsics(0).camera_to_world();
    for (v, e) in pose.iter().flatten().zip(expected.iter().flatten()) {
        assert_relative_eq!(v, e, epsilon = 1e-9);
    }
    Ok(())
}

#[test]
fn test_nsvf_needs_bounding_box() -> Result<(), Box<dyn std::error::Error>> {
    let batch = tempfile::tempdir()?;
    let out = tempfile::tempdir()?;
    common::write_batch(batch.path(), 2, &[])?;
    fs::remove_file(batch.path().join("bounding_box.txt"))?;

    let dataset = Dataset::from_batch(batch.path())?;
    assert!(matches!(
        export_nsvf(&dataset, out.path(), &NsvfOptions::default()),
        Err(ExportError::DatasetIo(_))
    ));
    Ok(())
}

#[test]
fn test_idr() -> Result<(), Box<dyn std::error::Error>> {
    let batch = tempfile::tempdir()?;
    let out = tempfile::tempdir()?;
    common::write_batch(batch.path(), 3, &[2])?;

    let dataset = Dataset::from_batch(batch.path())?;
    let report = export_idr(&dataset, out.path())?;
    assert_eq!(report.written, vec![0, 1]);
    assert_eq!(report.skipped, vec![2]);
    assert!(report.normalized);

    let arrays = read_npz(out.path().join(CAMERAS_NPZ))?;
    assert_eq!(
        arrays.keys().cloned().collect::<Vec<_>>(),
        vec!["scale_mat_0", "scale_mat_1", "world_mat_0", "world_mat_1"]
    );

    let world = &arrays["world_mat_1"];
    assert_eq!(world.shape, vec![4, 4]);
    let expected = flatten_rows(&lifted_projection_matrix(
        &common::K,
        &common::view_extrinsics(1),
    ));
    for (v, e) in world.as_f64().ok_or("world_mat is not f64")?.iter().zip(expected.iter()) {
        assert_relative_eq!(v, e, epsilon = 1e-12);
    }

    let scale = arrays["scale_mat_0"].as_f64().ok_or("scale_mat is not f64")?;
    assert_relative_eq!(scale[0], 1.0 / 3f64.sqrt(), epsilon = 1e-12);
    assert_eq!(scale[15], 1.0);

    assert_eq!(read_image_size(out.path().join("image").join("001.png"))?, common::SIZE);
    assert!(out.path().join("mask").join("000.png").is_file());
    assert!(!out.path().join("image").join("002.png").exists());
    Ok(())
}

#[test]
fn test_idr_identity_scale_without_normalization() -> Result<(), Box<dyn std::error::Error>> {
    let batch = tempfile::tempdir()?;
    let out = tempfile::tempdir()?;
    common::write_batch(batch.path(), 1, &[])?;
    fs::remove_file(batch.path().join("normalization_matrix.json"))?;

    let dataset = Dataset::from_batch(batch.path())?;
    let report = export_idr(&dataset, out.path())?;
    assert!(!report.normalized);

    let arrays = read_npz(out.path().join(CAMERAS_NPZ))?;
    assert_eq!(
        arrays["scale_mat_0"].as_f64(),
        Some(flatten_rows(&IDENTITY4).as_slice())
    );
    Ok(())
}

#[test]
fn test_idr_without_masks() -> Result<(), Box<dyn std::error::Error>> {
    let batch = tempfile::tempdir()?;
    let out = tempfile::tempdir()?;
    common::write_batch(batch.path(), 2, &[])?;
    for index in 0..2 {
        fs::remove_file(batch.path().join(format!("{index:03}_mask_0001.png")))?;
    }

    let dataset = Dataset::from_batch(batch.path())?;
    assert!(matches!(
        export_idr(&dataset, out.path()),
        Err(ExportError::NoCompleteViews(_))
    ));
    Ok(())
}
