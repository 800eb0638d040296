mod common;

use std::fs;

use approx::assert_relative_eq;
use synthset_export::colmap::{
    export_colmap, read_cameras_txt, read_images_txt, read_points3d_txt, CameraModelId,
    ColmapOptions, InMemoryRegistry, PoseSource, SparseLayout,
};
use synthset_io::record::Dataset;
use synthset_linalg::quat::quaternion_to_rotation_matrix;

#[test]
fn test_colmap_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
    let batch = tempfile::tempdir()?;
    let out = tempfile::tempdir()?;
    common::write_batch(batch.path(), 3, &[])?;

    let dataset = Dataset::from_batch(batch.path())?;
    let mut registry = InMemoryRegistry::default();
    let report = export_colmap(
        &dataset,
        out.path(),
        &ColmapOptions::default(),
        Some(&mut registry),
    )?;
    assert_eq!(report.exported, vec![(0, 0), (1, 1), (2, 2)]);
    assert!(report.skipped.is_empty());
    assert_eq!(report.image_size, common::SIZE);

    let sparse = out.path().join("sparse").join("0");
    let cameras = read_cameras_txt(sparse.join("cameras.txt"))?;
    assert_eq!(cameras.len(), 1);
    assert_eq!(cameras[0].camera_id, 1);
    assert_eq!(cameras[0].model_id, CameraModelId::CameraModelOpenCV);
    assert_eq!((cameras[0].width, cameras[0].height), (4, 2));
    assert_eq!(
        cameras[0].params,
        vec![100.0, 100.0, 2.0, 1.0, 0.0, 0.0, 0.0, 0.0]
    );

    let images = read_images_txt(sparse.join("images.txt"))?;
    assert_eq!(images.len(), 3);
    for (index, image) in images.iter().enumerate() {
        let expected = common::view_extrinsics(index as u32);
        assert_eq!(image.image_id, index as u32);
        assert_eq!(image.camera_id, 1);
        assert_eq!(image.name, format!("{index:03}.png"));
        assert!(image.points2d.is_empty());

        let r = quaternion_to_rotation_matrix(&image.rotation);
        for (row, expected_row) in r.iter().zip(expected.rotation.iter()) {
            for (v, e) in row.iter().zip(expected_row.iter()) {
                assert_relative_eq!(v, e, epsilon = 1e-9);
            }
        }
        for (t, e) in image.translation.iter().zip(expected.translation.iter()) {
            assert_relative_eq!(t, e, epsilon = 1e-9);
        }

        assert!(out.path().join("images").join(&image.name).is_file());
        assert!(out
            .path()
            .join("masks")
            .join(format!("{}.png", image.name))
            .is_file());
    }

    assert!(read_points3d_txt(sparse.join("points3D.txt"))?.is_empty());

    // registry ids are the file ids
    assert_eq!(registry.cameras.keys().copied().collect::<Vec<_>>(), vec![1]);
    for image in &images {
        assert_eq!(
            registry.images.get(&image.image_id),
            Some(&(1, image.name.clone()))
        );
    }
    Ok(())
}

#[test]
fn test_colmap_skips_view_without_projection() -> Result<(), Box<dyn std::error::Error>> {
    let batch = tempfile::tempdir()?;
    let out = tempfile::tempdir()?;
    common::write_batch(batch.path(), 3, &[1])?;

    let dataset = Dataset::from_batch(batch.path())?;
    let options = ColmapOptions {
        pose_source: PoseSource::Projection,
        ..Default::default()
    };
    let report = export_colmap(&dataset, out.path(), &options, None)?;
    assert_eq!(report.exported, vec![(0, 0), (2, 1)]);
    assert_eq!(report.skipped, vec![1]);

    let sparse = out.path().join("sparse").join("0");
    let text = fs::read_to_string(sparse.join("images.txt"))?;
    let blocks = text.lines().filter(|l| !l.starts_with('#')).collect::<Vec<_>>();
    assert_eq!(blocks.len(), 4);
    assert!(blocks[0].ends_with(" 1 000.png"));
    assert_eq!(blocks[1], "");
    assert!(blocks[2].ends_with(" 1 002.png"));
    assert_eq!(blocks[3], "");

    // K⁻¹·P recovers the written pose
    let images = read_images_txt(sparse.join("images.txt"))?;
    let expected = common::view_extrinsics(2);
    for (t, e) in images[1].translation.iter().zip(expected.translation.iter()) {
        assert_relative_eq!(t, e, epsilon = 1e-9);
    }

    assert_eq!(fs::read_to_string(sparse.join("points3D.txt"))?, "");
    assert!(!out.path().join("images").join("001.png").exists());
    Ok(())
}

#[test]
fn test_colmap_layout_and_first_id() -> Result<(), Box<dyn std::error::Error>> {
    let batch = tempfile::tempdir()?;
    let out = tempfile::tempdir()?;
    common::write_batch(batch.path(), 2, &[])?;

    let dataset = Dataset::from_batch(batch.path())?;
    let options = ColmapOptions {
        first_image_id: 1,
        camera_id: 3,
        sparse_layout: SparseLayout::ManuallyCreated,
        ..Default::default()
    };
    let report = export_colmap(&dataset, out.path(), &options, None)?;
    assert_eq!(report.exported, vec![(0, 1), (1, 2)]);
    assert_eq!(
        report.sparse_dir,
        out.path().join("sparse").join("manually_created")
    );

    let images = read_images_txt(report.sparse_dir.join("images.txt"))?;
    assert!(images.iter().all(|image| image.camera_id == 3));
    Ok(())
}

#[test]
fn test_colmap_needs_intrinsics() -> Result<(), Box<dyn std::error::Error>> {
    let batch = tempfile::tempdir()?;
    let out = tempfile::tempdir()?;
    common::write_batch(batch.path(), 1, &[])?;
    fs::remove_file(batch.path().join("camera_intrinsics.txt"))?;

    let dataset = Dataset::from_batch(batch.path())?;
    assert!(export_colmap(&dataset, out.path(), &ColmapOptions::default(), None).is_err());
    Ok(())
}

#[test]
fn test_colmap_creates_masks_dir_without_masks() -> Result<(), Box<dyn std::error::Error>> {
    let batch = tempfile::tempdir()?;
    let out = tempfile::tempdir()?;
    common::write_batch(batch.path(), 2, &[])?;
    for index in 0..2 {
        fs::remove_file(batch.path().join(format!("{index:03}_mask_0001.png")))?;
    }

    let dataset = Dataset::from_batch(batch.path())?;
    let report = export_colmap(&dataset, out.path(), &ColmapOptions::default(), None)?;
    assert_eq!(report.exported.len(), 2);
    let masks = out.path().join("masks");
    assert!(masks.is_dir());
    assert_eq!(fs::read_dir(&masks)?.count(), 0);
    Ok(())
}
