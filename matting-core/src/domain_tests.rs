//! Crate-level regression tests.
//!
//! Unlike the unit tests living alongside each module, these exercise
//! the pipeline end to end on small, literal inputs chosen to pin down
//! observable behavior: output range, known-pixel clamping, and the
//! handful of invariants that only make sense once every stage is wired
//! together. If one of these starts failing, something broke at a
//! module boundary even though the unit tests still pass.

use crate::{Image, Mask, MattingPipeline, PipelineRequest, PipelineStatus, Trimap, TrimapInput};

fn gradient_image(h: usize, w: usize) -> Image {
    let mut data = vec![0.0; h * w * 3];
    for y in 0..h {
        for x in 0..w {
            let base = (y * w + x) * 3;
            let t = x as f64 / (w.max(2) - 1) as f64;
            data[base] = t;
            data[base + 1] = 1.0 - t;
            data[base + 2] = 0.5;
        }
    }
    Image::from_vec(data, h, w).unwrap()
}

fn mask_from_fn(h: usize, w: usize, f: impl Fn(usize, usize) -> f64) -> Mask {
    let mut data = vec![0.0; h * w];
    for y in 0..h {
        for x in 0..w {
            data[y * w + x] = f(y, x);
        }
    }
    Mask::from_vec(data, h, w).unwrap()
}

#[test]
fn pure_foreground_4x4_has_no_unknown_and_alpha_is_exactly_one() {
    let h = 4;
    let w = 4;
    let image = gradient_image(h, w);
    let mask = mask_from_fn(h, w, |_, _| 1.0);
    let pipeline = MattingPipeline::new().erode_structure_size(0);
    let response = pipeline
        .run(&PipelineRequest::new(image, TrimapInput::Mask(mask)))
        .unwrap();
    assert_eq!(response.unknown_pixels, 0);
    assert!(response.alpha.as_slice().iter().all(|&v| v == 1.0));
    assert_eq!(response.status, PipelineStatus::Converged);
}

#[test]
fn pure_background_4x4_has_no_unknown_and_alpha_is_exactly_zero() {
    let h = 4;
    let w = 4;
    let image = gradient_image(h, w);
    let mask = mask_from_fn(h, w, |_, _| 0.0);
    let pipeline = MattingPipeline::new().erode_structure_size(0);
    let response = pipeline
        .run(&PipelineRequest::new(image, TrimapInput::Mask(mask)))
        .unwrap();
    assert_eq!(response.unknown_pixels, 0);
    assert!(response.alpha.as_slice().iter().all(|&v| v == 0.0));
}

#[test]
fn bipartite_step_8x8_keeps_known_sides_clamped() {
    let h = 8;
    let w = 8;
    let image = gradient_image(h, w);
    let mask = mask_from_fn(h, w, |_, x| if x < w / 2 { 1.0 } else { 0.0 });
    let pipeline = MattingPipeline::new().erode_structure_size(0);
    let response = pipeline
        .run(&PipelineRequest::new(image, TrimapInput::Mask(mask)))
        .unwrap();

    let alpha = response.alpha.as_slice();
    for y in 0..h {
        assert!(alpha[y * w] > 0.9, "left edge should stay near foreground");
        assert!(alpha[y * w + w - 1] < 0.1, "right edge should stay near background");
    }
    assert!(alpha.iter().all(|&v| (0.0..=1.0).contains(&v)));
}

#[test]
fn soft_edge_8x8_produces_fractional_alpha_in_the_transition_band() {
    let h = 8;
    let w = 8;
    let image = gradient_image(h, w);
    // A wide low-confidence band in the middle columns, forced unknown.
    let mask = mask_from_fn(h, w, |_, x| {
        if x < 3 {
            1.0
        } else if x > 4 {
            0.0
        } else {
            0.5
        }
    });
    let trimap = Trimap::from_raw(mask.as_slice().to_vec(), h, w).unwrap();
    let pipeline = MattingPipeline::new();
    let response = pipeline
        .run(&PipelineRequest::new(image, TrimapInput::Trimap(trimap)))
        .unwrap();

    let alpha = response.alpha.as_slice();
    let has_fractional = alpha.iter().any(|&v| v > 0.01 && v < 0.99);
    assert!(has_fractional, "transition band should not collapse to pure 0/1");
}

#[test]
fn gradient_blend_16x16_stays_within_unit_range_and_converges() {
    let h = 16;
    let w = 16;
    let image = gradient_image(h, w);
    let mask = mask_from_fn(h, w, |_, x| 1.0 - (x as f64 / (w - 1) as f64));
    let pipeline = MattingPipeline::new();
    let response = pipeline
        .run(&PipelineRequest::new(image, TrimapInput::Mask(mask)))
        .unwrap();
    assert_eq!(response.status, PipelineStatus::Converged);
    assert!(response.alpha.as_slice().iter().all(|&v| (0.0..=1.0).contains(&v)));
    assert!(response
        .foreground
        .as_slice()
        .iter()
        .all(|&v| (0.0..=1.0).contains(&v)));
}

#[test]
fn entropy_band_widens_a_narrow_trimap_on_a_64x64_image() {
    let h = 64;
    let w = 64;
    let image = gradient_image(h, w);
    // A crisp vertical boundary with only true 0/1 values: under
    // threshold mode this would leave zero unknown pixels, but entropy
    // mode must still open a band around the label boundary.
    let mask = mask_from_fn(h, w, |_, x| if x < w / 2 { 1.0 } else { 0.0 });
    let pipeline = MattingPipeline::new().use_entropy(true);
    let response = pipeline
        .run(&PipelineRequest::new(image, TrimapInput::Mask(mask)))
        .unwrap();
    assert!(
        response.unknown_pixels > 0,
        "entropy mode must open an uncertainty band even around a crisp boundary"
    );
}

#[test]
fn fully_known_trimap_matches_input_exactly_without_invoking_the_solver() {
    let h = 4;
    let w = 4;
    let image = gradient_image(h, w);
    let mut raw = vec![0.0; h * w];
    for (i, v) in raw.iter_mut().enumerate() {
        *v = if i % 3 == 0 { 1.0 } else { 0.0 };
    }
    let trimap = Trimap::from_raw(raw.clone(), h, w).unwrap();
    let pipeline = MattingPipeline::new();
    let response = pipeline
        .run(&PipelineRequest::new(image, TrimapInput::Trimap(trimap)))
        .unwrap();
    assert_eq!(response.alpha.as_slice(), raw.as_slice());
}

#[test]
fn rerunning_the_same_request_is_deterministic() {
    let h = 12;
    let w = 12;
    let image = gradient_image(h, w);
    let mask = mask_from_fn(h, w, |_, x| if x < 6 { 1.0 } else { 0.0 });
    let pipeline = MattingPipeline::new();
    let request = PipelineRequest::new(image, TrimapInput::Mask(mask));

    let first = pipeline.run(&request).unwrap();
    let second = pipeline.run(&request).unwrap();

    let max_diff = first
        .alpha
        .as_slice()
        .iter()
        .zip(second.alpha.as_slice())
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max);
    assert!(max_diff < 1e-9, "identical requests should solve identically");
}

#[test]
fn progress_reaches_one_hundred_percent_on_success() {
    let h = 4;
    let w = 4;
    let image = gradient_image(h, w);
    let mask = mask_from_fn(h, w, |_, _| 1.0);
    let pipeline = MattingPipeline::new().erode_structure_size(0);
    let request = PipelineRequest::new(image, TrimapInput::Mask(mask));

    let mut last = 0u8;
    pipeline
        .run_with_progress(&request, |p| last = p)
        .unwrap();
    assert_eq!(last, 100);
}
