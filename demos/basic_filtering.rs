use denoise_core::PointCloud;
use denoise_filters::{radius_outlier_removal, RadiusOutlierParams};
use denoise_spatial::IndexKind;

fn main() {
    // A dense 10 x 10 x 10 lattice with spacing 0.05 plus a few stray points
    let mut points = Vec::new();
    for i in 0..10 {
        for j in 0..10 {
            for k in 0..10 {
                points.push([i as f32 * 0.05, j as f32 * 0.05, k as f32 * 0.05]);
            }
        }
    }
    points.extend_from_slice(&[[3.0, 0.0, 0.0], [0.0, -2.5, 1.0], [4.0, 4.0, 4.0]]);
    let cloud = PointCloud::from_points(&points);
    println!("Original cloud: {} points", cloud.len());

    for index in [IndexKind::KdTree, IndexKind::Grid] {
        let params = RadiusOutlierParams::new(0.08, 6).with_index(index);
        match radius_outlier_removal(&cloud, &params) {
            Ok(result) => {
                println!(
                    "{}: kept {} points, rejected {:?}",
                    index,
                    result.kept_count(),
                    result.rejected
                );
                let aabb = result.kept.aabb();
                println!("  bounding box: min={:?}, max={:?}", aabb.min, aabb.max);
            }
            Err(e) => eprintln!("{}: {}", index, e),
        }
    }
}
