use std::path::Path;

use synthset_camera::{
    normalization_matrix, projection_matrix, BoundingBox, CameraIntrinsic, Extrinsics, ImageSize,
};
use synthset_io::{
    bbox::{write_bounding_box, write_normalization_matrix},
    intrinsics::{write_intrinsics, IntrinsicsSchema},
    matrix::{write_matrix_json, write_matrix_txt},
    png::{write_image_png_mono8, write_image_png_rgb8, write_image_png_rgba8},
};
use synthset_linalg::transforms::axis_angle_to_rotation_matrix;

pub const SIZE: ImageSize = ImageSize {
    width: 4,
    height: 2,
};

pub const K: CameraIntrinsic = CameraIntrinsic {
    fx: 100.0,
    fy: 100.0,
    cx: 2.0,
    cy: 1.0,
};

/// A camera turned about the y axis, four units from the origin.
pub fn view_extrinsics(index: u32) -> Extrinsics {
    let rotation = axis_angle_to_rotation_matrix(&[0.0, 1.0, 0.0], 0.3 * index as f64)
        .unwrap_or(synthset_linalg::IDENTITY3);
    Extrinsics {
        rotation,
        translation: [0.1 * index as f64, -0.25, 4.0],
    }
}

/// Write a batch of `n` views; views in `without_projection` get no projection files.
pub fn write_batch(
    dir: &Path,
    n: u32,
    without_projection: &[u32],
) -> Result<(), Box<dyn std::error::Error>> {
    let pixels = (SIZE.width * SIZE.height) as usize;
    for index in 0..n {
        let prefix = format!("{index:03}");
        let value = index as u8;
        write_image_png_rgb8(
            dir.join(format!("{prefix}_render.png")),
            SIZE,
            &vec![value; pixels * 3],
        )?;
        write_image_png_mono8(
            dir.join(format!("{prefix}_mask_0001.png")),
            SIZE,
            &vec![255; pixels],
        )?;
        write_image_png_rgba8(
            dir.join(format!("{prefix}_masked_0001.png")),
            SIZE,
            &vec![value; pixels * 4],
        )?;

        let rt = view_extrinsics(index);
        write_matrix_txt(
            dir.join(format!("{prefix}_camera_extrinsics.txt")),
            &rt.matrix34(),
        )?;
        if !without_projection.contains(&index) {
            let p = projection_matrix(&K, &rt);
            write_matrix_txt(dir.join(format!("{prefix}_camera_projection_matrix.txt")), &p)?;
            write_matrix_json(dir.join(format!("{prefix}_camera_projection_matrix.json")), &p)?;
        }
    }

    write_intrinsics(
        dir.join("camera_intrinsics.txt"),
        &K,
        IntrinsicsSchema::Full4x4,
        None,
    )?;
    let bbox = BoundingBox::new([-1.0; 3], [1.0; 3]);
    write_bounding_box(dir.join("bounding_box.txt"), &bbox)?;
    write_normalization_matrix(
        dir.join("normalization_matrix.json"),
        &normalization_matrix(&bbox, true),
    )?;
    Ok(())
}
