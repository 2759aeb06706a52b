//! Stage orchestration: trimap -> Laplacian -> alpha -> foreground.
//!
//! [`Pipeline`] is the internal engine behind [`crate::api::MattingPipeline`];
//! it owns the per-run progress/cancellation bookkeeping so the public
//! builder can stay a thin, cloneable configuration object.

use std::sync::Arc;

use crate::api::{CancelToken, MattingError, Parameters, PipelineRequest, PipelineResponse, PipelineStatus, TrimapInput};
use crate::cache::LaplacianCache;
use crate::foreground::ForegroundSolver;
use crate::laplacian::LaplacianBuilder;
use crate::solver::MattingSolver;
use crate::trimap::TrimapBuilder;
use crate::types::Trimap;

/// Progress checkpoints emitted over the life of one [`Pipeline::run`]
/// call, as percent-complete.
const PROGRESS_TRIMAP_START: u8 = 5;
const PROGRESS_TRIMAP_DONE: u8 = 10;
const PROGRESS_LAPLACIAN_DONE: u8 = 30;
const PROGRESS_ALPHA_DONE: u8 = 70;
const PROGRESS_FOREGROUND_DONE: u8 = 90;
const PROGRESS_DONE: u8 = 100;

pub struct Pipeline {
    params: Parameters,
    cache: Arc<LaplacianCache>,
}

impl Pipeline {
    pub fn new(params: Parameters, cache: Arc<LaplacianCache>) -> Self {
        Self { params, cache }
    }

    #[tracing::instrument(level = "debug", skip(self, request, on_progress))]
    pub fn run(
        &self,
        request: &PipelineRequest,
        mut on_progress: impl FnMut(u8),
    ) -> Result<PipelineResponse, MattingError> {
        let image = &request.image;
        let cancel = request.cancel.clone().unwrap_or_default();

        on_progress(PROGRESS_TRIMAP_START);
        check_cancelled(&cancel)?;

        let trimap = self.resolve_trimap(&request.prior, image.height(), image.width());
        on_progress(PROGRESS_TRIMAP_DONE);
        check_cancelled(&cancel)?;

        let unknown_pixels = trimap.unknown_count();
        let refine_mask: Vec<bool> = (0..image.height() * image.width())
            .map(|i| !trimap.is_known(i))
            .collect();
        let refine_mask_opt = if unknown_pixels == 0 {
            None
        } else {
            Some(refine_mask.as_slice())
        };

        let laplacian = match self.cache.get(
            image.height(),
            image.width(),
            self.params.eps,
            self.params.win_rad,
            refine_mask_opt,
        ) {
            Some(cached) => cached,
            None => {
                let builder = LaplacianBuilder::new(self.params.eps, self.params.win_rad)?;
                let built = builder.build(image, refine_mask_opt)?;
                self.cache.insert(
                    image.height(),
                    image.width(),
                    self.params.eps,
                    self.params.win_rad,
                    refine_mask_opt,
                    built.clone(),
                );
                built
            }
        };
        on_progress(PROGRESS_LAPLACIAN_DONE);
        check_cancelled(&cancel)?;

        let solver = MattingSolver::new(self.params.trimap_confidence)?;
        let (alpha, status) = match solver.solve(&laplacian, &trimap) {
            Ok(alpha) => (alpha, PipelineStatus::Converged),
            Err(MattingError::SolverFallback { alpha }) => {
                tracing::debug!("alpha solve degraded to the clamped prior trimap");
                (
                    crate::types::Alpha::new(alpha, image.height(), image.width()),
                    PipelineStatus::Degraded,
                )
            }
            Err(other) => return Err(other),
        };
        on_progress(PROGRESS_ALPHA_DONE);
        check_cancelled(&cancel)?;

        let fg_solver = ForegroundSolver::new(self.params.lambda)?;
        let foreground = fg_solver.solve(image, &alpha)?;
        on_progress(PROGRESS_FOREGROUND_DONE);
        check_cancelled(&cancel)?;

        on_progress(PROGRESS_DONE);

        Ok(PipelineResponse {
            alpha,
            foreground,
            status,
            unknown_pixels,
        })
    }

    fn resolve_trimap(&self, prior: &TrimapInput, height: usize, width: usize) -> Trimap {
        match prior {
            TrimapInput::Trimap(t) => t.clone(),
            TrimapInput::Mask(mask) => {
                debug_assert_eq!(mask.height(), height);
                debug_assert_eq!(mask.width(), width);
                let builder = TrimapBuilder::new()
                    .erode_structure_size(self.params.erode_structure_size);
                if self.params.use_entropy {
                    // band_ratio/mid_band were already validated by the
                    // builder at construction time.
                    let builder = builder
                        .band_ratio(self.params.band_ratio)
                        .expect("validated at Parameters construction")
                        .mid_band(self.params.mid_band)
                        .expect("validated at Parameters construction");
                    builder.build_entropy(mask)
                } else {
                    let builder = builder
                        .thresholds(self.params.foreground_threshold, self.params.background_threshold)
                        .expect("validated at Parameters construction");
                    builder.build_threshold(mask)
                }
            }
        }
    }
}

fn check_cancelled(cancel: &CancelToken) -> Result<(), MattingError> {
    if cancel.is_cancelled() {
        Err(MattingError::Cancelled)
    } else {
        Ok(())
    }
}
