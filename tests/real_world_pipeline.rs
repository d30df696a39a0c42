//! Real-world-style integration tests: a lidar-like street scene with
//! scattered noise, run through the filter and through the file pipeline
//! the way a user would, plus a large-cloud scaling check.

use denoise_core::{Colors, PointCloud};
use denoise_filters::{radius_outlier_removal, RadiusOutlierParams};
use denoise_io::{read_cloud, write_cloud};
use denoise_spatial::IndexKind;
use radius_denoise::{run, DenoiseConfig};
use rand::prelude::*;
use std::time::Instant;

// ────────────────── helpers ──────────────────

/// Dense ground and obstacle returns followed by sparse noise. Returns the
/// cloud and the number of leading "structure" points.
fn build_street_scene(seed: u64) -> (PointCloud, usize) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut points = Vec::new();

    // Ground: ~20 pts / m² over 20 m x 20 m, z ≈ 0 with small noise
    for _ in 0..8_000 {
        points.push([
            rng.gen_range(-10.0f32..10.0),
            rng.gen_range(-10.0f32..10.0),
            rng.gen_range(-0.02f32..0.02),
        ]);
    }

    // Three box-like obstacles
    let centers = [[3.0f32, 2.0, 1.0], [-4.0, -3.0, 0.8], [6.0, -5.0, 1.5]];
    for center in &centers {
        for _ in 0..1_000 {
            points.push([
                center[0] + rng.gen_range(-0.5f32..0.5),
                center[1] + rng.gen_range(-0.5f32..0.5),
                center[2] + rng.gen_range(-0.5f32..0.5),
            ]);
        }
    }
    let structure = points.len();

    // Isolated noise well above the scene
    for _ in 0..200 {
        points.push([
            rng.gen_range(-15.0f32..15.0),
            rng.gen_range(-15.0f32..15.0),
            rng.gen_range(5.0f32..30.0),
        ]);
    }

    (PointCloud::from_points(&points), structure)
}

// ────────────────── Test 1: street scene ──────────────────

#[test]
fn test_street_scene_noise_removal() {
    let (scene, structure) = build_street_scene(42);
    assert_eq!(scene.len(), 11_200);

    for kind in [IndexKind::KdTree, IndexKind::Grid] {
        let t = Instant::now();
        let params = RadiusOutlierParams::new(0.5, 4).with_index(kind);
        let result = radius_outlier_removal(&scene, &params).unwrap();
        let elapsed = t.elapsed();

        let noise_kept = result.kept_indices.iter().filter(|&&i| i >= structure).count();
        let structure_kept = result.kept_count() - noise_kept;

        assert!(
            noise_kept <= 10,
            "{}: {} noise points survived",
            kind,
            noise_kept
        );
        assert!(
            structure_kept as f64 / structure as f64 > 0.95,
            "{}: only {} of {} structure points kept",
            kind,
            structure_kept,
            structure
        );

        // Surviving points never include non-finite coordinates.
        assert!(result.kept.iter_points().all(|p| p.iter().all(|v| v.is_finite())));

        println!(
            "{:>6}: kept {} / {} (noise kept {}) in {:.2?}",
            kind,
            result.kept_count(),
            scene.len(),
            noise_kept,
            elapsed
        );
    }
}

// ────────────────── Test 2: file pipeline with attributes ──────────────────

#[test]
fn test_file_pipeline_real_world_fields() {
    let (scene, structure) = build_street_scene(7);
    let mut rng = StdRng::seed_from_u64(77);
    let n = scene.len();
    let mut channel = || (0..n).map(|_| rng.gen()).collect::<Vec<u8>>();
    let colors = Colors {
        r: channel(),
        g: channel(),
        b: channel(),
    };
    let intensity: Vec<f32> = (0..n).map(|i| (i % 256) as f32).collect();
    let scene = scene.with_colors(colors).with_intensity(intensity);

    let dir = tempfile::tempdir().unwrap();
    for (input_name, output_name) in [
        ("scan.las", "clean.pcd"),
        ("scan.pcd", "clean.ply"),
        ("scan.ply", "clean.las"),
    ] {
        let input = dir.path().join(input_name);
        let output = dir.path().join("out").join(output_name);
        write_cloud(&input, &scene).unwrap();

        let mut config = DenoiseConfig::new(&input, &output);
        config.radius = 0.5;
        config.min_neighbors = 4;
        config.keep_statistics = true;
        let summary = run(&config).unwrap();

        assert_eq!(summary.total_points, n, "{}", input_name);
        assert!(summary.rejected_points >= 190, "{}", input_name);
        assert!(summary.kept_points as f64 > structure as f64 * 0.95, "{}", input_name);

        let kept = read_cloud(&output).unwrap();
        assert_eq!(kept.len(), summary.kept_points, "{}", output_name);
        assert!(kept.colors.is_some(), "{} lost colors", output_name);
        assert!(kept.intensity.is_some(), "{} lost intensity", output_name);

        let rejected = read_cloud(summary.rejected_output.as_ref().unwrap()).unwrap();
        assert_eq!(rejected.len(), summary.rejected_points);
        assert_eq!(kept.len() + rejected.len(), n);
    }
}

// ────────────────── Test 3: large cloud scaling ──────────────────

#[test]
#[ignore] // too heavy for default CI; run with: cargo test -- --ignored
fn test_large_cloud_scaling() {
    let n = 2_000_000;
    let mut rng = StdRng::seed_from_u64(12345);

    println!("=== Large Cloud Scaling ({:.1}M points) ===", n as f64 / 1e6);

    let t_gen = Instant::now();
    let x: Vec<f32> = (0..n).map(|_| rng.gen_range(-100.0f32..100.0)).collect();
    let y: Vec<f32> = (0..n).map(|_| rng.gen_range(-100.0f32..100.0)).collect();
    let z: Vec<f32> = (0..n).map(|_| rng.gen_range(-2.0f32..20.0)).collect();
    let cloud = PointCloud::from_xyz(x, y, z);
    println!("  Generation:  {:>8.2?}", t_gen.elapsed());

    for kind in [IndexKind::KdTree, IndexKind::Grid] {
        let t = Instant::now();
        let params = RadiusOutlierParams::new(0.5, 2).with_index(kind);
        let result = radius_outlier_removal(&cloud, &params).unwrap();
        assert_eq!(result.total(), n);
        println!(
            "  {:<7}      {:>8.2?}  ({} -> {} pts)",
            kind,
            t.elapsed(),
            n,
            result.kept_count()
        );
    }

    println!("  Total:       {:>8.2?}", t_gen.elapsed());
}
